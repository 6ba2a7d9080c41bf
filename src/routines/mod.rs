// Routines for convergence
pub mod convergence;
// Routines for initialization
pub mod initialization;
// Routines for logging
pub mod logger;
// Routines for objective evaluation
pub mod objective;
// Routines for output
pub mod output;
// Routines for settings
pub mod settings;
