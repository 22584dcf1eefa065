//! Null-handling stage: config-driven default values for text and numeric
//! columns.

use polars::prelude::{AnyValue, DataFrame};
use tracing::debug;

use retail_common::{any_to_f64, any_to_string, has_column, set_f64_column, set_string_column};
use retail_model::{NumberFillRule, Result, TextFillRule};

/// Replaces nulls in the configured text columns with the text default and
/// nulls in the configured numeric columns with the numeric default.
///
/// Configured columns absent from the table are skipped silently; non-null
/// values are never altered.
pub fn fill_nulls(
    df: &DataFrame,
    text: &TextFillRule,
    number: &NumberFillRule,
) -> Result<DataFrame> {
    let mut out = df.clone();
    let mut filled_columns = 0usize;
    for column in &text.columns {
        if !has_column(&out, column) {
            continue;
        }
        fill_text_column(&mut out, column, &text.value)?;
        filled_columns += 1;
    }
    for column in &number.columns {
        if !has_column(&out, column) {
            continue;
        }
        fill_number_column(&mut out, column, number.value)?;
        filled_columns += 1;
    }
    debug!(rows = out.height(), filled_columns, "nulls filled");
    Ok(out)
}

fn fill_text_column(df: &mut DataFrame, name: &str, fill: &str) -> Result<()> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        if matches!(value, AnyValue::Null) {
            values.push(fill.to_string());
        } else {
            values.push(any_to_string(value));
        }
    }
    set_string_column(df, name, values)?;
    Ok(())
}

fn fill_number_column(df: &mut DataFrame, name: &str, fill: f64) -> Result<()> {
    let column = df.column(name)?;
    let mut values = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        let value = column.get(idx).unwrap_or(AnyValue::Null);
        if matches!(value, AnyValue::Null) {
            values.push(Some(fill));
        } else {
            values.push(any_to_f64(value));
        }
    }
    set_f64_column(df, name, values)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn rules() -> (TextFillRule, NumberFillRule) {
        (
            TextFillRule {
                columns: vec!["producto".to_string(), "ausente".to_string()],
                value: "DESCONOCIDO".to_string(),
            },
            NumberFillRule {
                columns: vec!["cantidad".to_string()],
                value: 0.0,
            },
        )
    }

    fn test_df() -> DataFrame {
        let cols: Vec<Column> = vec![
            Series::new("producto".into(), vec![Some("leche"), None]).into_column(),
            Series::new("cantidad".into(), vec![Some(2.5), None]).into_column(),
            Series::new("pais".into(), vec![None::<&str>, Some("AR")]).into_column(),
        ];
        DataFrame::new(cols).unwrap()
    }

    #[test]
    fn fills_nulls_in_configured_columns() {
        let (text, number) = rules();
        let filled = fill_nulls(&test_df(), &text, &number).unwrap();
        let products = retail_common::opt_string_column(&filled, "producto").unwrap();
        let amounts = retail_common::float_column(&filled, "cantidad").unwrap();
        assert_eq!(
            products,
            vec![Some("leche".to_string()), Some("DESCONOCIDO".to_string())]
        );
        assert_eq!(amounts, vec![Some(2.5), Some(0.0)]);
    }

    #[test]
    fn non_null_values_are_untouched() {
        let (text, number) = rules();
        let filled = fill_nulls(&test_df(), &text, &number).unwrap();
        let products = retail_common::string_column(&filled, "producto").unwrap();
        let amounts = retail_common::float_column(&filled, "cantidad").unwrap();
        assert_eq!(products[0], "leche");
        assert_eq!(amounts[0], Some(2.5));
    }

    #[test]
    fn unconfigured_columns_keep_their_nulls() {
        let (text, number) = rules();
        let filled = fill_nulls(&test_df(), &text, &number).unwrap();
        let countries = retail_common::opt_string_column(&filled, "pais").unwrap();
        assert_eq!(countries[0], None);
    }

    #[test]
    fn absent_configured_columns_are_skipped_silently() {
        // "ausente" is configured but not in the table; no error.
        let (text, number) = rules();
        assert!(fill_nulls(&test_df(), &text, &number).is_ok());
    }
}
