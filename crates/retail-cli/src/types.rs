//! Result types produced by a pipeline run.

use std::path::PathBuf;

use retail_validate::GateReport;

/// Everything the summary printer needs about a finished (or aborted) run.
#[derive(Debug)]
pub struct RunReport {
    pub environment: String,
    pub output_path: PathBuf,
    pub outcome: RunOutcome,
    pub counts: StageCounts,
    pub gates: Vec<GateReport>,
}

impl RunReport {
    /// True when the run stopped at a quality checkpoint.
    #[must_use]
    pub fn gate_failed(&self) -> bool {
        matches!(
            self.outcome,
            RunOutcome::InputGateFailed | RunOutcome::OutputGateFailed
        )
    }
}

/// Terminal state of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The full pipeline ran and the dataset was written.
    Written,
    /// The full pipeline ran but writing was skipped on request.
    DryRun,
    /// The input quality checkpoint failed before any transformation.
    InputGateFailed,
    /// The output quality checkpoint failed; nothing was written.
    OutputGateFailed,
}

impl RunOutcome {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            RunOutcome::Written => "written",
            RunOutcome::DryRun => "dry run",
            RunOutcome::InputGateFailed => "input gate failed",
            RunOutcome::OutputGateFailed => "output gate failed",
        }
    }
}

/// Row counts observed after each stage, in pipeline order.
#[derive(Debug, Default, Clone, Copy)]
pub struct StageCounts {
    pub ingested: usize,
    pub deduplicated: usize,
    pub date_filtered: usize,
    pub category_filtered: usize,
    pub unioned: usize,
    pub written: usize,
}
