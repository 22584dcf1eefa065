//! Library components of the retail pipeline CLI.

pub mod logging;
pub mod pipeline;
pub mod types;
