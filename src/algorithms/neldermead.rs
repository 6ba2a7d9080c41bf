use ndarray::Array1;

use crate::algorithms::{Outcome, Status};
use crate::error::ConfigError;
use crate::routines::convergence::{Criterion, StageMonitor};
use crate::routines::objective::{Evaluator, Objective};
use crate::routines::output::{Action, IterationLog, IterationRecord};
use crate::routines::settings::Config;
use crate::structs::bounds::Bounds;
use crate::structs::simplex::Simplex;

/// Bound-constrained Nelder-Mead simplex minimizer
///
/// A run goes through `INIT -> ITERATING -> CONVERGED | BUDGET_EXCEEDED`:
/// the configuration is validated, the initial simplex is built and scored,
/// and the classical reflect / expand / contract / shrink rule is applied until
/// every convergence stage of [Config::final_simplex] has been met or the
/// evaluation budget is spent.
///
/// ```
/// use ndarray::{array, Array1};
/// use nmcore::prelude::*;
///
/// let bounds = Bounds::from_ranges(&[(5.0, 10.0)]).unwrap();
/// let config = Config::new(1).with_max_evaluations(200);
/// let outcome = NelderMead::new(config)
///     .minimize(&|x: &Array1<f64>| x[0] * x[0], &bounds, &array![5.0])
///     .unwrap();
/// assert!(outcome.converged());
/// assert_eq!(outcome.point()[0], 5.0);
/// ```
#[derive(Debug, Clone)]
pub struct NelderMead {
    config: Config,
}

impl NelderMead {
    pub fn new(config: Config) -> Self {
        NelderMead { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Minimize `objective` inside `bounds`, starting from `start`
    ///
    /// Fails before any evaluation if the configuration, the bounds and the
    /// starting point are inconsistent. Running out of evaluations is not an
    /// error, see [Status::BudgetExceeded].
    pub fn minimize(
        &self,
        objective: &dyn Objective,
        bounds: &Bounds,
        start: &Array1<f64>,
    ) -> Result<Outcome, ConfigError> {
        let step = self.config.validate(bounds, start)?;
        let evaluator = Evaluator::new(objective, bounds, self.config.budget());
        Ok(Run::new(&self.config, bounds, evaluator, step).fit(start))
    }

    /// Same as [NelderMead::minimize], but the initial simplex, restarts and
    /// shrinks are evaluated in parallel. The outcome is identical.
    pub fn minimize_par(
        &self,
        objective: &(dyn Objective + Sync),
        bounds: &Bounds,
        start: &Array1<f64>,
    ) -> Result<Outcome, ConfigError> {
        let step = self.config.validate(bounds, start)?;
        let evaluator = Evaluator::parallel(objective, bounds, self.config.budget());
        Ok(Run::new(&self.config, bounds, evaluator, step).fit(start))
    }
}

/// State of one optimization, alive for the duration of a single call
struct Run<'a> {
    config: &'a Config,
    bounds: &'a Bounds,
    evaluator: Evaluator<'a>,
    step: Array1<f64>,
    stages: &'static [Criterion],
    stage: usize,
    monitor: StageMonitor,
    iteration: usize,
    log: IterationLog,
}

impl<'a> Run<'a> {
    fn new(config: &'a Config, bounds: &'a Bounds, evaluator: Evaluator<'a>, step: Array1<f64>) -> Self {
        let stages = config.final_simplex.stages();
        Run {
            config,
            bounds,
            evaluator,
            step,
            stages,
            stage: 0,
            monitor: StageMonitor::new(stages[0], config.dimension),
            iteration: 0,
            log: IterationLog::new(),
        }
    }

    fn fit(mut self, start: &Array1<f64>) -> Outcome {
        let span = tracing::debug_span!("neldermead", dim = self.config.dimension);
        let _enter = span.enter();

        let mut simplex = self.initialize(start);
        let mut collapsed = false;

        let status = loop {
            if self.monitor.check(&simplex, self.config.tolerance) {
                if self.stage + 1 == self.stages.len() {
                    collapsed = simplex.is_collapsed();
                    break Status::Converged;
                }
                self.next_stage();
                match self.restart(&simplex) {
                    Some(restarted) => {
                        simplex = restarted;
                        self.record(&simplex, Action::Restart);
                        continue;
                    }
                    None => break Status::BudgetExceeded,
                }
            }

            if self.evaluator.is_exhausted() {
                break Status::BudgetExceeded;
            }

            self.iteration += 1;
            let action = self.iterate(&mut simplex);
            simplex.order();
            match action {
                Some(action) => self.record(&simplex, action),
                None => break Status::BudgetExceeded,
            }
        };

        let best = self
            .evaluator
            .best()
            .cloned()
            .unwrap_or_else(|| simplex.best().clone());

        tracing::debug!(
            "{} after {} evaluations ({} iterations), best value {:e}",
            status,
            self.evaluator.nfev(),
            self.iteration,
            best.value()
        );
        if collapsed {
            tracing::debug!("Simplex collapsed to a single point");
        }

        let value = best.value();
        Outcome::new(
            best.into_point(),
            value,
            self.evaluator.nfev(),
            self.evaluator.nan_count(),
            self.iteration,
            status,
            collapsed,
            self.log,
        )
    }

    /// Build and score the initial simplex
    ///
    /// The budget covers the `n + 1` evaluations, this is checked by
    /// [Config::validate].
    fn initialize(&mut self, start: &Array1<f64>) -> Simplex {
        if !self.bounds.is_feasible(&start.view()) {
            tracing::warn!("Starting point {} is outside the bounds and is projected", start);
        }
        let start = self.bounds.project(&start.view());
        let points = self.config.init_simplex.build(&start, &self.step, self.bounds);
        let simplex = Simplex::from_scored(self.evaluator.evaluate_batch(points));
        tracing::debug!(
            "Initial simplex ({:?}) scored, best value {:e}",
            self.config.init_simplex,
            simplex.best().value()
        );
        simplex
    }

    fn next_stage(&mut self) {
        self.stage += 1;
        self.monitor = StageMonitor::new(self.stages[self.stage], self.config.dimension);
        tracing::debug!(
            "Stage {} met after {} evaluations, continuing with {:?}",
            self.stage - 1,
            self.evaluator.nfev(),
            self.monitor.criterion()
        );
    }

    /// Rebuild the simplex around its best vertex, whose value is reused
    ///
    /// Returns `None` if the budget runs out before the new vertices are scored.
    fn restart(&mut self, simplex: &Simplex) -> Option<Simplex> {
        let best = simplex.best().clone();
        let points = self.config.init_simplex.build(best.point(), &self.step, self.bounds);
        let n = points.len() - 1;

        let scored = self.evaluator.evaluate_batch(points.into_iter().skip(1).collect());
        if scored.len() < n {
            return None;
        }
        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(best);
        vertices.extend(scored);
        Some(Simplex::from_scored(vertices))
    }

    /// Apply one Nelder-Mead update to the ordered simplex
    ///
    /// Returns `None` if the budget ran out part way; the simplex then holds
    /// whatever was scored.
    fn iterate(&mut self, simplex: &mut Simplex) -> Option<Action> {
        let centroid = simplex.centroid();
        let best = simplex.best().value();
        let second_worst = simplex.second_worst().value();
        let worst = simplex.worst().value();

        let reflected = self.evaluator.evaluate(simplex.reflect(&centroid, self.bounds))?;

        if reflected.value() < best {
            let expanded = simplex.expand(&centroid, reflected.point(), self.bounds);
            let Some(expanded) = self.evaluator.evaluate(expanded) else {
                simplex.replace_worst(reflected);
                return None;
            };
            if expanded.value() < reflected.value() {
                simplex.replace_worst(expanded);
                return Some(Action::Expand);
            }
            simplex.replace_worst(reflected);
            return Some(Action::Reflect);
        }

        if reflected.value() < second_worst {
            simplex.replace_worst(reflected);
            return Some(Action::Reflect);
        }

        if reflected.value() < worst {
            let contracted = simplex.contract_outside(&centroid, reflected.point(), self.bounds);
            let contracted = self.evaluator.evaluate(contracted)?;
            if contracted.value() <= reflected.value() {
                simplex.replace_worst(contracted);
                return Some(Action::ContractOutside);
            }
        } else {
            let contracted = simplex.contract_inside(&centroid, self.bounds);
            let contracted = self.evaluator.evaluate(contracted)?;
            if contracted.value() < worst {
                simplex.replace_worst(contracted);
                return Some(Action::ContractInside);
            }
        }

        let n = simplex.dim();
        let shrunk = self.evaluator.evaluate_batch(simplex.shrink(self.bounds));
        let complete = shrunk.len() == n;
        simplex.replace_shrunk(shrunk);
        complete.then_some(Action::Shrink)
    }

    fn record(&mut self, simplex: &Simplex, action: Action) {
        tracing::trace!(
            iteration = self.iteration,
            stage = self.stage,
            nfev = self.evaluator.nfev(),
            best = simplex.best().value(),
            "{}",
            action
        );
        if self.config.trace {
            self.log.push(IterationRecord {
                iteration: self.iteration,
                stage: self.stage,
                nfev: self.evaluator.nfev(),
                best: simplex.best().value(),
                worst: simplex.worst().value(),
                action,
            });
        }
    }
}
