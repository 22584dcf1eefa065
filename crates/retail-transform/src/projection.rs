//! Projection stage: rename columns and select the final output layout.

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use tracing::debug;

use retail_common::has_column;
use retail_model::{PipelineError, Result};

/// Renames every column present in `rename` (columns absent from the map
/// keep their name), then selects exactly the columns in `order`, dropping
/// everything else.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumn`] when a name in `order` does not
/// exist after renaming.
pub fn rename_and_order(
    df: &DataFrame,
    rename: &BTreeMap<String, String>,
    order: &[String],
) -> Result<DataFrame> {
    let mut out = df.clone();
    for (original, new_name) in rename {
        if has_column(&out, original) {
            out.rename(original, new_name.as_str().into())?;
            debug!(from = %original, to = %new_name, "column renamed");
        }
    }
    for name in order {
        if !has_column(&out, name) {
            return Err(PipelineError::MissingColumn(name.clone()));
        }
    }
    Ok(out.select(order.iter().map(String::as_str))?)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn test_df() -> DataFrame {
        let cols: Vec<Column> = vec![
            Series::new("qty".into(), vec![1.0, 2.0]).into_column(),
            Series::new("price".into(), vec![3.0, 4.0]).into_column(),
            Series::new("extra".into(), vec!["a", "b"]).into_column(),
        ];
        DataFrame::new(cols).unwrap()
    }

    fn rename_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(from, to)| ((*from).to_string(), (*to).to_string()))
            .collect()
    }

    #[test]
    fn renames_then_selects_in_order_dropping_the_rest() {
        let rename = rename_map(&[("qty", "quantity")]);
        let order = vec!["quantity".to_string(), "price".to_string()];
        let projected = rename_and_order(&test_df(), &rename, &order).unwrap();
        assert_eq!(
            retail_common::column_names(&projected),
            vec!["quantity", "price"]
        );
        assert_eq!(projected.height(), 2);
    }

    #[test]
    fn unmapped_columns_keep_their_names() {
        let rename = rename_map(&[]);
        let order = vec!["price".to_string(), "qty".to_string()];
        let projected = rename_and_order(&test_df(), &rename, &order).unwrap();
        assert_eq!(
            retail_common::column_names(&projected),
            vec!["price", "qty"]
        );
    }

    #[test]
    fn rename_entries_for_absent_columns_are_ignored() {
        let rename = rename_map(&[("ghost", "phantom"), ("qty", "quantity")]);
        let order = vec!["quantity".to_string()];
        assert!(rename_and_order(&test_df(), &rename, &order).is_ok());
    }

    #[test]
    fn ordering_a_missing_column_fails() {
        let rename = rename_map(&[("qty", "quantity")]);
        // "qty" no longer exists under its original name.
        let order = vec!["qty".to_string(), "price".to_string()];
        let err = rename_and_order(&test_df(), &rename, &order).unwrap_err();
        match err {
            PipelineError::MissingColumn(name) => assert_eq!(name, "qty"),
            other => panic!("expected MissingColumn, got {other}"),
        }
    }
}
