//! Input collaborator: reads the configured raw dataset into a `DataFrame`.

mod reader;

pub use reader::{file_basename, read_input};
