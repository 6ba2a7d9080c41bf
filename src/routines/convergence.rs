use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::structs::simplex::{norm, Simplex};

/// Strictness of the convergence test
///
/// A tier is an ordered list of [Criterion] stages. Each stage runs until its
/// criterion holds; the simplex is then rebuilt around the best vertex and the
/// next stage starts. Every tier begins with the same stage, so a stricter tier
/// always spends at least as many evaluations as a looser one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalSimplex {
    /// [Criterion::ValueSpread] only
    Loose,
    /// [Criterion::ValueSpread], then [Criterion::Geometric]
    #[default]
    Standard,
    /// [Criterion::ValueSpread], [Criterion::Geometric], then [Criterion::Sustained]
    Strict,
}

impl TryFrom<i32> for FinalSimplex {
    type Error = ConfigError;

    fn try_from(selector: i32) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(FinalSimplex::Loose),
            1 => Ok(FinalSimplex::Standard),
            2 => Ok(FinalSimplex::Strict),
            other => Err(ConfigError::UnknownFinalSimplex(other)),
        }
    }
}

impl FinalSimplex {
    pub fn stages(&self) -> &'static [Criterion] {
        const STAGES: [Criterion; 3] = [
            Criterion::ValueSpread,
            Criterion::Geometric,
            Criterion::Sustained,
        ];
        match self {
            FinalSimplex::Loose => &STAGES[..1],
            FinalSimplex::Standard => &STAGES[..2],
            FinalSimplex::Strict => &STAGES[..],
        }
    }
}

/// Stopping rule of one stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
    /// `f_worst - f_best <= tol`, independent of any constant offset of the
    /// objective
    ValueSpread,
    /// [Criterion::ValueSpread] and every vertex within
    /// `tol * max(1, ‖x_best‖)` of the best one
    Geometric,
    /// [Criterion::Geometric] on `n + 1` consecutive checks
    Sustained,
}

impl Criterion {
    /// Number of consecutive successful checks needed in dimension `n`
    pub fn confirmations(&self, n: usize) -> usize {
        match self {
            Criterion::Sustained => n + 1,
            _ => 1,
        }
    }

    /// Whether the simplex passes a single check of this criterion
    pub fn holds(&self, simplex: &Simplex, tolerance: f64) -> bool {
        let best = simplex.best();
        let spread_ok = simplex.value_spread() <= tolerance;
        match self {
            Criterion::ValueSpread => spread_ok,
            Criterion::Geometric | Criterion::Sustained => {
                spread_ok && simplex.size() <= tolerance * norm(best.point()).max(1.0)
            }
        }
    }
}

/// Tracks the consecutive checks of the active stage
#[derive(Debug, Clone)]
pub struct StageMonitor {
    criterion: Criterion,
    required: usize,
    streak: usize,
}

impl StageMonitor {
    pub fn new(criterion: Criterion, n: usize) -> Self {
        StageMonitor {
            criterion,
            required: criterion.confirmations(n),
            streak: 0,
        }
    }

    pub fn criterion(&self) -> Criterion {
        self.criterion
    }

    /// Check the ordered simplex, returning `true` once the stage is complete
    ///
    /// A collapsed simplex completes any stage at once.
    pub fn check(&mut self, simplex: &Simplex, tolerance: f64) -> bool {
        if simplex.is_collapsed() {
            return true;
        }
        if self.criterion.holds(simplex, tolerance) {
            self.streak += 1;
        } else {
            self.streak = 0;
        }
        self.streak >= self.required
    }
}
