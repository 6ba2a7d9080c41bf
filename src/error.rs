//! Configuration errors for the simplex optimizer.
//!
//! A run that exhausts its evaluation budget is not an error, it is reported
//! through [crate::algorithms::Status::BudgetExceeded]. The variants below are
//! only raised for malformed input, before the objective is ever called.

use thiserror::Error;

/// Errors raised while validating bounds, configuration and starting point.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Bounds with zero parameters.
    #[error("bounds must contain at least one parameter")]
    EmptyBounds,

    /// Two inputs that must share the problem dimension do not.
    #[error("{what} has {got} elements, expected {expected}")]
    DimensionMismatch {
        /// Which input is inconsistent
        what: &'static str,
        /// Dimension of the problem
        expected: usize,
        /// Dimension found
        got: usize,
    },

    /// A lower bound exceeds its upper bound, or one of them is NaN.
    #[error("invalid bounds at index {index}: lower ({lower}) > upper ({upper})")]
    InvalidBounds {
        /// Parameter index
        index: usize,
        /// Lower limit
        lower: f64,
        /// Upper limit
        upper: f64,
    },

    /// Tolerance must be positive and finite.
    #[error("tolerance must be positive and finite, got {0}")]
    InvalidTolerance(f64),

    /// The evaluation budget cannot cover the initial simplex.
    #[error("evaluation budget {budget} is too small, at least {required} evaluations are required")]
    InvalidBudget {
        /// Configured budget
        budget: usize,
        /// Evaluations needed to score the initial simplex
        required: usize,
    },

    /// A step size is NaN or infinite.
    #[error("step size at index {index} must be finite, got {value}")]
    InvalidStep {
        /// Parameter index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// A starting coordinate is NaN or infinite.
    #[error("starting point coordinate {index} must be finite, got {value}")]
    NonFiniteStart {
        /// Parameter index
        index: usize,
        /// Offending value
        value: f64,
    },

    /// Unknown legacy `initsimplex` selector.
    #[error("unknown initial simplex selector {0}, expected 0 or 1")]
    UnknownInitSimplex(i32),

    /// Unknown legacy `finalsimplex` selector.
    #[error("unknown final simplex selector {0}, expected 0, 1 or 2")]
    UnknownFinalSimplex(i32),
}

impl ConfigError {
    /// Returns `true` for errors caused by the bounds themselves.
    pub fn is_bounds_error(&self) -> bool {
        matches!(
            self,
            ConfigError::EmptyBounds | ConfigError::InvalidBounds { .. }
        )
    }

    /// Returns `true` when inputs disagree on the problem dimension.
    pub fn is_dimension_error(&self) -> bool {
        matches!(self, ConfigError::DimensionMismatch { .. })
    }
}

/// A specialized `Result` for validation.
pub type Result<T> = std::result::Result<T, ConfigError>;
