use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::structs::bounds::Bounds;

/// Relative perturbation used on an axis whose configured step is zero
const PERTURBATION_PERCENTAGE: f64 = 0.008;
/// Perturbation used on an axis whose step and coordinate are both zero
const PERTURBATION_AT_ZERO: f64 = 0.00025;

/// How the initial simplex is built from the starting point and the step sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InitSimplex {
    /// The starting point plus one step along each axis
    #[default]
    RightAngle,
    /// A regular simplex (equal edge lengths in step units), Spendley, Hext & Himsworth
    Regular,
}

impl TryFrom<i32> for InitSimplex {
    type Error = ConfigError;

    fn try_from(selector: i32) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(InitSimplex::RightAngle),
            1 => Ok(InitSimplex::Regular),
            other => Err(ConfigError::UnknownInitSimplex(other)),
        }
    }
}

impl InitSimplex {
    /// The `n + 1` vertices of the initial simplex around `start`
    ///
    /// Vertex 0 is `start` itself. A perturbation that would leave the box is
    /// mirrored to the other side of `start`, and every vertex is finally
    /// projected into `bounds`.
    pub fn build(&self, start: &Array1<f64>, step: &Array1<f64>, bounds: &Bounds) -> Vec<Array1<f64>> {
        let n = start.len();
        let step = effective_step(start, step);

        let mut vertices = Vec::with_capacity(n + 1);
        vertices.push(bounds.project(&start.view()));

        let (diagonal, off_diagonal) = match self {
            InitSimplex::RightAngle => (1.0, 0.0),
            InitSimplex::Regular => regular_coefficients(n),
        };

        for j in 0..n {
            let mut vertex = start.clone();
            for i in 0..n {
                let scale = if i == j { diagonal } else { off_diagonal };
                vertex[i] = perturb(start[i], step[i] * scale, bounds, i);
            }
            bounds.project_mut(&mut vertex);
            vertices.push(vertex);
        }
        vertices
    }
}

/// Multipliers `(p, q)` of the regular simplex of dimension `n`
fn regular_coefficients(n: usize) -> (f64, f64) {
    let n = n as f64;
    let root = (n + 1.0).sqrt();
    let denominator = n * std::f64::consts::SQRT_2;
    ((n - 1.0 + root) / denominator, (root - 1.0) / denominator)
}

/// Replace zero steps with a small perturbation relative to the coordinate
fn effective_step(start: &Array1<f64>, step: &Array1<f64>) -> Array1<f64> {
    Array1::from_shape_fn(start.len(), |i| {
        if step[i] != 0.0 {
            step[i]
        } else if start[i] == 0.0 {
            PERTURBATION_AT_ZERO
        } else {
            PERTURBATION_PERCENTAGE * start[i].abs()
        }
    })
}

/// Move `x` by `delta` on axis `i`, staying inside the box
///
/// Tries `x + delta`, then the mirrored `x - delta`. When the box is narrower
/// than the step on both sides, the bound farther from `x` is used, so the
/// coordinate only stays at `x` on a fixed axis.
fn perturb(x: f64, delta: f64, bounds: &Bounds, i: usize) -> f64 {
    let (lo, hi) = (bounds.lower()[i], bounds.upper()[i]);
    let inside = |v: f64| (lo..=hi).contains(&v);
    let (forward, backward) = (x + delta, x - delta);
    if inside(forward) {
        forward
    } else if inside(backward) {
        backward
    } else if hi - x >= x - lo {
        hi
    } else {
        lo
    }
}

/// Step sizes of the initial simplex, either one value for every axis or one
/// value per axis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Step {
    Uniform(f64),
    PerAxis(Vec<f64>),
}

impl Default for Step {
    fn default() -> Self {
        Step::Uniform(1.2)
    }
}

impl Step {
    /// Expand to one finite step per axis
    pub fn resolve(&self, n: usize) -> Result<Array1<f64>, ConfigError> {
        let step = match self {
            Step::Uniform(value) => Array1::from_elem(n, *value),
            Step::PerAxis(values) => {
                if values.len() != n {
                    return Err(ConfigError::DimensionMismatch {
                        what: "step",
                        expected: n,
                        got: values.len(),
                    });
                }
                Array1::from(values.clone())
            }
        };
        if let Some((index, &value)) = step.iter().enumerate().find(|(_, s)| !s.is_finite()) {
            return Err(ConfigError::InvalidStep { index, value });
        }
        Ok(step)
    }
}
