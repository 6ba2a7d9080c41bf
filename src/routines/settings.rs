use config::Config as eConfig;
use eyre::{Result, WrapErr};
use ndarray::Array1;
use serde_derive::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::routines::convergence::FinalSimplex;
use crate::routines::initialization::{InitSimplex, Step};
use crate::structs::bounds::Bounds;

/// Evaluations allowed per squared dimension when no budget is given
const DEFAULT_EVALUATIONS_PER_DIM2: usize = 1024;

/// Settings of a single optimizer run
///
/// Build one with [Config::new] and the `with_*` methods, or deserialize it from
/// the `[optimizer]` table of a settings file (see [Settings::read]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Number of parameters
    pub dimension: usize,
    /// Stopping threshold of the convergence criteria
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// Maximum number of objective evaluations, defaults to `1024 * n^2`
    #[serde(default)]
    pub max_evaluations: Option<usize>,
    #[serde(default)]
    pub init_simplex: InitSimplex,
    #[serde(default)]
    pub final_simplex: FinalSimplex,
    /// Edge lengths of the initial simplex
    #[serde(default)]
    pub step: Step,
    /// Record every iteration in the outcome
    #[serde(default)]
    pub trace: bool,
}

impl Config {
    pub fn new(dimension: usize) -> Self {
        Config {
            dimension,
            tolerance: default_tolerance(),
            max_evaluations: None,
            init_simplex: InitSimplex::default(),
            final_simplex: FinalSimplex::default(),
            step: Step::default(),
            trace: false,
        }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = Some(max_evaluations);
        self
    }

    pub fn with_init_simplex(mut self, init_simplex: InitSimplex) -> Self {
        self.init_simplex = init_simplex;
        self
    }

    pub fn with_final_simplex(mut self, final_simplex: FinalSimplex) -> Self {
        self.final_simplex = final_simplex;
        self
    }

    pub fn with_step(mut self, step: Vec<f64>) -> Self {
        self.step = Step::PerAxis(step);
        self
    }

    pub fn with_uniform_step(mut self, step: f64) -> Self {
        self.step = Step::Uniform(step);
        self
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// The evaluation budget, explicit or derived from the dimension
    pub fn budget(&self) -> usize {
        self.max_evaluations
            .unwrap_or(DEFAULT_EVALUATIONS_PER_DIM2 * self.dimension * self.dimension)
    }

    /// Check the configuration against the bounds and the starting point
    ///
    /// Returns the per-axis step sizes on success.
    pub fn validate(&self, bounds: &Bounds, start: &Array1<f64>) -> Result<Array1<f64>, ConfigError> {
        let n = self.dimension;
        if n == 0 {
            return Err(ConfigError::EmptyBounds);
        }
        if bounds.dim() != n {
            return Err(ConfigError::DimensionMismatch {
                what: "bounds",
                expected: n,
                got: bounds.dim(),
            });
        }
        if start.len() != n {
            return Err(ConfigError::DimensionMismatch {
                what: "starting point",
                expected: n,
                got: start.len(),
            });
        }
        if let Some((index, &value)) = start.iter().enumerate().find(|(_, x)| !x.is_finite()) {
            return Err(ConfigError::NonFiniteStart { index, value });
        }
        if !(self.tolerance > 0.0 && self.tolerance.is_finite()) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        let budget = self.budget();
        if budget < n + 1 {
            return Err(ConfigError::InvalidBudget {
                budget,
                required: n + 1,
            });
        }
        self.step.resolve(n)
    }
}

/// Contents of a settings file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub optimizer: Config,
    #[serde(default)]
    pub log: Log,
}

/// Logging settings, see [crate::routines::logger::setup_log]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Log {
    /// Filter directive, e.g. `info` or `nmcore=trace`
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file, truncated when logging starts
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for Log {
    fn default() -> Self {
        Log {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Settings {
    /// Read settings from a TOML file
    ///
    /// Values can be overridden by environment variables prefixed with `NMCORE_`,
    /// using `__` between nested keys, e.g. `NMCORE_OPTIMIZER__TOLERANCE=1e-6`.
    pub fn read(path: &str) -> Result<Settings> {
        let parsed = eConfig::builder()
            .add_source(config::File::with_name(path).format(config::FileFormat::Toml))
            .add_source(
                config::Environment::with_prefix("NMCORE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .wrap_err_with(|| format!("Unable to read settings from {}", path))?;

        let settings: Settings = parsed
            .try_deserialize()
            .wrap_err("Invalid settings")?;
        Ok(settings)
    }

    /// Serialize the settings as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// *********************************
// Default values for deserializing
// *********************************
fn default_tolerance() -> f64 {
    1e-8
}

fn default_log_level() -> String {
    "info".to_string()
}
