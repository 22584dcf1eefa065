//! Shared utilities for the retail pipeline crates.

mod polars;

pub use polars::{
    any_to_f64, any_to_string, column_names, float_column, format_numeric, has_column,
    opt_string_column, parse_f64, row_key, set_f64_column, set_string_column, string_column,
};
