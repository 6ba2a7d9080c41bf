use ndarray::Array1;
use rayon::prelude::*;

use crate::structs::bounds::Bounds;
use crate::structs::vertex::Vertex;

/// A scalar function of a parameter vector
///
/// Implemented for every `Fn(&Array1<f64>) -> f64`, so closures can be passed
/// directly. Implementations must not rely on being called a specific number
/// of times; the optimizer does its own counting.
pub trait Objective {
    fn evaluate(&self, x: &Array1<f64>) -> f64;
}

impl<F> Objective for F
where
    F: Fn(&Array1<f64>) -> f64,
{
    fn evaluate(&self, x: &Array1<f64>) -> f64 {
        self(x)
    }
}

enum Dispatch<'a> {
    Sequential(&'a dyn Objective),
    Parallel(&'a (dyn Objective + Sync)),
}

/// Budgeted, bounds-guarded access to an [Objective]
///
/// Owned by one optimizer run. Every point is projected into the bounds before
/// the objective sees it, every call increments the evaluation counter, and no
/// call is made once `budget` evaluations have been spent. The best vertex ever
/// produced is kept so that it survives an interrupted iteration.
pub struct Evaluator<'a> {
    objective: Dispatch<'a>,
    bounds: &'a Bounds,
    budget: usize,
    nfev: usize,
    nan_count: usize,
    best: Option<Vertex>,
}

impl<'a> Evaluator<'a> {
    pub fn new(objective: &'a dyn Objective, bounds: &'a Bounds, budget: usize) -> Self {
        Self::with_dispatch(Dispatch::Sequential(objective), bounds, budget)
    }

    /// Like [Evaluator::new], but batches are evaluated on the rayon thread pool
    pub fn parallel(objective: &'a (dyn Objective + Sync), bounds: &'a Bounds, budget: usize) -> Self {
        Self::with_dispatch(Dispatch::Parallel(objective), bounds, budget)
    }

    fn with_dispatch(objective: Dispatch<'a>, bounds: &'a Bounds, budget: usize) -> Self {
        Evaluator {
            objective,
            bounds,
            budget,
            nfev: 0,
            nan_count: 0,
            best: None,
        }
    }

    /// Number of objective calls made so far
    pub fn nfev(&self) -> usize {
        self.nfev
    }

    pub fn budget(&self) -> usize {
        self.budget
    }

    pub fn remaining(&self) -> usize {
        self.budget - self.nfev
    }

    pub fn is_exhausted(&self) -> bool {
        self.nfev >= self.budget
    }

    /// Number of evaluations that returned NaN
    pub(crate) fn nan_count(&self) -> usize {
        self.nan_count
    }

    /// Best vertex evaluated so far
    pub fn best(&self) -> Option<&Vertex> {
        self.best.as_ref()
    }

    /// Evaluate one point, or return `None` if the budget is spent
    pub fn evaluate(&mut self, mut point: Array1<f64>) -> Option<Vertex> {
        if self.is_exhausted() {
            return None;
        }
        self.bounds.project_mut(&mut point);
        let value = match &self.objective {
            Dispatch::Sequential(objective) => objective.evaluate(&point),
            Dispatch::Parallel(objective) => objective.evaluate(&point),
        };
        self.nfev += 1;
        Some(self.record(point, value, self.nfev))
    }

    /// Evaluate as many of `points` as the budget allows, in order
    ///
    /// The returned vertices are a prefix of `points`; a shorter result means
    /// the budget ran out.
    pub fn evaluate_batch(&mut self, points: Vec<Array1<f64>>) -> Vec<Vertex> {
        let take = points.len().min(self.remaining());
        let mut points: Vec<Array1<f64>> = points.into_iter().take(take).collect();
        points
            .iter_mut()
            .for_each(|point| self.bounds.project_mut(point));

        let values: Vec<f64> = match &self.objective {
            Dispatch::Sequential(objective) => points.iter().map(|p| objective.evaluate(p)).collect(),
            Dispatch::Parallel(objective) => {
                points.par_iter().map(|p| objective.evaluate(p)).collect()
            }
        };

        let first = self.nfev;
        self.nfev += values.len();
        points
            .into_iter()
            .zip(values)
            .enumerate()
            .map(|(i, (point, value))| self.record(point, value, first + i + 1))
            .collect()
    }

    fn record(&mut self, point: Array1<f64>, value: f64, index: usize) -> Vertex {
        if value.is_nan() {
            self.nan_count += 1;
            tracing::warn!("Objective returned NaN at evaluation {}, treated as +inf", index);
        }
        let vertex = Vertex::new(point, value, index);
        let improved = match &self.best {
            Some(best) => vertex.value() < best.value(),
            None => true,
        };
        if improved {
            self.best = Some(vertex.clone());
        }
        vertex
    }
}
