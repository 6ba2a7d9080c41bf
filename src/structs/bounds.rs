use ndarray::{Array1, ArrayView1};

use crate::error::{ConfigError, Result};

/// Box constraints on the parameters of a problem
///
/// Each parameter `i` is limited to `[lower[i], upper[i]]`. Infinite limits are
/// allowed and leave that side of the parameter unconstrained.
#[derive(Debug, Clone, PartialEq)]
pub struct Bounds {
    lower: Array1<f64>,
    upper: Array1<f64>,
}

impl Bounds {
    /// Create bounds from the lower and upper limits
    ///
    /// Fails if the limits have different lengths, are empty, or if any
    /// `lower[i] > upper[i]` (NaN limits are rejected as well).
    pub fn new(lower: Array1<f64>, upper: Array1<f64>) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(ConfigError::DimensionMismatch {
                what: "upper bounds",
                expected: lower.len(),
                got: upper.len(),
            });
        }
        if lower.is_empty() {
            return Err(ConfigError::EmptyBounds);
        }
        for (index, (&lo, &hi)) in lower.iter().zip(upper.iter()).enumerate() {
            // Written so that NaN on either side fails the check
            if !(lo <= hi) {
                return Err(ConfigError::InvalidBounds {
                    index,
                    lower: lo,
                    upper: hi,
                });
            }
        }
        Ok(Bounds { lower, upper })
    }

    /// Create bounds from `(lower, upper)` pairs, one per parameter
    pub fn from_ranges(ranges: &[(f64, f64)]) -> Result<Self> {
        let lower = ranges.iter().map(|&(lo, _)| lo).collect::<Array1<f64>>();
        let upper = ranges.iter().map(|&(_, hi)| hi).collect::<Array1<f64>>();
        Bounds::new(lower, upper)
    }

    /// Bounds of dimension `n` that do not constrain any parameter
    pub fn unbounded(n: usize) -> Result<Self> {
        Bounds::new(
            Array1::from_elem(n, f64::NEG_INFINITY),
            Array1::from_elem(n, f64::INFINITY),
        )
    }

    /// Number of parameters
    pub fn dim(&self) -> usize {
        self.lower.len()
    }

    pub fn lower(&self) -> &Array1<f64> {
        &self.lower
    }

    pub fn upper(&self) -> &Array1<f64> {
        &self.upper
    }

    /// `true` if parameter `i` can only take a single value
    pub fn is_fixed(&self, i: usize) -> bool {
        self.lower[i] == self.upper[i]
    }

    /// Clamp every coordinate of `point` into the box
    pub fn project(&self, point: &ArrayView1<f64>) -> Array1<f64> {
        let mut projected = point.to_owned();
        self.project_mut(&mut projected);
        projected
    }

    /// Clamp every coordinate of `point` into the box, in place
    pub fn project_mut(&self, point: &mut Array1<f64>) {
        point
            .iter_mut()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .for_each(|(x, (&lo, &hi))| *x = x.clamp(lo, hi));
    }

    /// `true` if `point` has the right dimension and lies inside the box
    pub fn is_feasible(&self, point: &ArrayView1<f64>) -> bool {
        point.len() == self.dim()
            && point
                .iter()
                .zip(self.lower.iter().zip(self.upper.iter()))
                .all(|(&x, (&lo, &hi))| lo <= x && x <= hi)
    }
}
