//! Data-quality gates.
//!
//! Two checkpoints guard the pipeline: the input gate before any
//! transformation and the output gate before the write. A gate failure is a
//! reported outcome, never an error: every check in a checkpoint runs, the
//! checkpoint fails when any check fails, and the orchestrator decides to
//! stop based on the report.

mod checks;
mod report;

pub use checks::{run_input_gate, run_output_gate};
pub use report::{Checkpoint, GateCheck, GateReport};
