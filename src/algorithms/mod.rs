use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::routines::objective::Objective;
use crate::routines::output::IterationLog;
use crate::routines::settings::Config;
use crate::structs::bounds::Bounds;

pub mod neldermead;

pub use neldermead::NelderMead;

/// Terminal status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    /// The convergence test of the last stage was met
    Converged,
    /// The evaluation budget ran out first; the point returned is the best seen
    BudgetExceeded,
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Converged => write!(f, "Converged"),
            Status::BudgetExceeded => write!(f, "Maximum evaluations reached"),
        }
    }
}

/// Result of one optimizer run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outcome {
    point: Array1<f64>,
    value: f64,
    nfev: usize,
    nan_evaluations: usize,
    iterations: usize,
    status: Status,
    collapsed: bool,
    log: IterationLog,
}

impl Outcome {
    pub(crate) fn new(
        point: Array1<f64>,
        value: f64,
        nfev: usize,
        nan_evaluations: usize,
        iterations: usize,
        status: Status,
        collapsed: bool,
        log: IterationLog,
    ) -> Self {
        Self {
            point,
            value,
            nfev,
            nan_evaluations,
            iterations,
            status,
            collapsed,
            log,
        }
    }

    /// Best point found, always inside the bounds
    pub fn point(&self) -> &Array1<f64> {
        &self.point
    }

    /// Objective value at [Outcome::point]
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Number of objective evaluations
    pub fn nfev(&self) -> usize {
        self.nfev
    }

    /// Number of evaluations where the objective returned NaN, ranked as `+inf`
    pub fn nan_evaluations(&self) -> usize {
        self.nan_evaluations
    }

    /// Evaluation count, negated when the run did not converge
    pub fn signed_nfev(&self) -> i64 {
        match self.status {
            Status::Converged => self.nfev as i64,
            Status::BudgetExceeded => -(self.nfev as i64),
        }
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }

    /// `true` if convergence was declared because the simplex collapsed to a
    /// single point, typically against the bounds
    pub fn collapsed(&self) -> bool {
        self.collapsed
    }

    /// Per-iteration records, empty unless [Config::trace] was set
    pub fn log(&self) -> &IterationLog {
        &self.log
    }
}

/// Minimize `objective` inside `bounds`, starting from `start`
///
/// Convenience wrapper around [NelderMead::minimize].
pub fn optimize(
    objective: &dyn Objective,
    bounds: &Bounds,
    config: &Config,
    start: &Array1<f64>,
) -> Result<Outcome, ConfigError> {
    NelderMead::new(config.clone()).minimize(objective, bounds, start)
}
