use std::fs::File;
use std::io::Write;

use csv::WriterBuilder;
use eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};

/// The simplex update performed in one iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Reflect,
    Expand,
    ContractOutside,
    ContractInside,
    Shrink,
    /// The simplex was rebuilt around the best vertex to start the next stage
    Restart,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Reflect => write!(f, "reflect"),
            Action::Expand => write!(f, "expand"),
            Action::ContractOutside => write!(f, "contract outside"),
            Action::ContractInside => write!(f, "contract inside"),
            Action::Shrink => write!(f, "shrink"),
            Action::Restart => write!(f, "restart"),
        }
    }
}

/// Summary of one iteration
/// - `iteration`: the iteration number, starting at 1
/// - `stage`: index of the convergence stage being run
/// - `nfev`: evaluations spent after the iteration
/// - `best`, `worst`: the extreme values of the simplex after the update
/// - `action`: the update that was applied
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: usize,
    pub stage: usize,
    pub nfev: usize,
    pub best: f64,
    pub worst: f64,
    pub action: Action,
}

/// Ordered records of every iteration of a run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IterationLog {
    records: Vec<IterationRecord>,
}

impl IterationLog {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    pub fn records(&self) -> &[IterationRecord] {
        &self.records
    }

    pub fn push(&mut self, record: IterationRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of iterations that applied `action`
    pub fn count(&self, action: Action) -> usize {
        self.records.iter().filter(|r| r.action == action).count()
    }

    /// Write the records as CSV, with a header row
    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
        for record in &self.records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the records as CSV to `path`, replacing any existing file
    pub fn write_to_path(&self, path: &str) -> Result<()> {
        tracing::debug!("Writing {} iterations to {}", self.len(), path);
        let file = File::create(path).wrap_err_with(|| format!("Unable to create {}", path))?;
        self.write(file)
    }
}
