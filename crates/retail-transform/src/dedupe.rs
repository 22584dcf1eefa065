//! Exact-row deduplication over all columns.

use std::collections::BTreeSet;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};

use retail_common::{column_names, row_key};
use retail_model::Result;

/// Drops rows whose full column tuple was already seen, keeping the first
/// occurrence. Idempotent: deduplicating twice equals deduplicating once.
pub fn dedupe_rows(df: &DataFrame) -> Result<DataFrame> {
    if df.height() == 0 {
        return Ok(df.clone());
    }
    let columns = column_names(df);
    let mut seen = BTreeSet::new();
    let mut keep = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        keep.push(seen.insert(row_key(df, &columns, idx)));
    }
    let mask = BooleanChunked::from_slice("dedupe".into(), &keep);
    Ok(df.filter(&mask)?)
}
