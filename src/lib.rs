//! Bound-constrained Nelder-Mead simplex minimizer
//!
//! The optimizer minimizes a scalar [routines::objective::Objective] inside a box
//! ([structs::bounds::Bounds]) from a starting point, under a hard budget of
//! objective evaluations. Convergence is tested in stages selected by
//! [routines::convergence::FinalSimplex]; the initial simplex is selected by
//! [routines::initialization::InitSimplex].

pub mod algorithms;
pub mod error;
pub mod routines;
pub mod structs;

pub mod prelude {
    pub use crate::algorithms::{optimize, NelderMead, Outcome, Status};
    pub use crate::error::ConfigError;
    pub use crate::routines::convergence::{Criterion, FinalSimplex};
    pub use crate::routines::initialization::{InitSimplex, Step};
    pub use crate::routines::logger::setup_log;
    pub use crate::routines::objective::Objective;
    pub use crate::routines::output::{Action, IterationLog, IterationRecord};
    pub use crate::routines::settings::{Config, Log, Settings};
    pub use crate::structs::bounds::Bounds;
}
