//! Gate report types.

use serde::Serialize;

/// Which gate produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Checkpoint {
    Input,
    Output,
}

impl Checkpoint {
    pub fn label(self) -> &'static str {
        match self {
            Checkpoint::Input => "input",
            Checkpoint::Output => "output",
        }
    }
}

/// One pass/fail predicate within a checkpoint.
#[derive(Debug, Clone, Serialize)]
pub struct GateCheck {
    /// Stable check identifier (e.g. `min_row_count`, `not_null:precio`).
    pub name: String,
    pub passed: bool,
    /// Human-readable outcome, including the observed numbers.
    pub detail: String,
}

/// Result of one checkpoint: all checks run, the checkpoint passes only when
/// every check passes.
#[derive(Debug, Clone, Serialize)]
pub struct GateReport {
    pub checkpoint: Checkpoint,
    pub checks: Vec<GateCheck>,
}

impl GateReport {
    pub fn passed(&self) -> bool {
        self.checks.iter().all(|check| check.passed)
    }

    /// The specific failing checks, for reporting which threshold or columns
    /// broke the run.
    pub fn failed_checks(&self) -> impl Iterator<Item = &GateCheck> {
        self.checks.iter().filter(|check| !check.passed)
    }
}
