//! Transformation stages for the retail batch pipeline.
//!
//! Every stage is a pure transformation: it borrows the input `DataFrame`
//! and produces a new one, never mutating in place. The orchestrator in
//! `retail-cli` composes them in a fixed order.

pub mod dates;
pub mod dedupe;
pub mod derive;
pub mod fill;
pub mod filters;
pub mod projection;

pub use dates::{INPUT_DATE_FORMAT, parse_date_column, parse_iso_date};
pub use dedupe::dedupe_rows;
pub use derive::{derive_flags, derive_total, normalize_units};
pub use fill::fill_nulls;
pub use filters::{
    MATCH_ALL_SENTINEL, filter_by_category, filter_by_condition_union, filter_by_date_range,
};
pub use projection::rename_and_order;
