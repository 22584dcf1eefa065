//! Date-column parsing.
//!
//! The raw feed carries dates as textual digits in year-month-day order
//! without separators (`yyyyMMdd`). This stage validates every value and
//! rewrites the column in canonical ISO form, which the date-range filter
//! and the partitioned writer then share.

use chrono::NaiveDate;
use polars::prelude::{DataFrame, NamedFrom, Series};

use retail_common::opt_string_column;
use retail_model::{ISO_DATE_FORMAT, PipelineError, Result};

/// External representation of the raw date column.
pub const INPUT_DATE_FORMAT: &str = "%Y%m%d";

/// Parses an already-canonicalized ISO date value.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).ok()
}

/// Rewrites `column` from `yyyyMMdd` text to ISO `YYYY-MM-DD` text.
///
/// Null values are missing data, not malformed data: they survive the parse
/// and are later excluded by the date-range filter.
///
/// # Errors
///
/// Returns [`PipelineError::Parse`] for the first non-null value that is not
/// a valid `yyyyMMdd` date.
pub fn parse_date_column(df: &DataFrame, column: &str) -> Result<DataFrame> {
    let values = opt_string_column(df, column)?;
    let mut parsed: Vec<Option<String>> = Vec::with_capacity(values.len());
    for (row, value) in values.iter().enumerate() {
        match value {
            None => parsed.push(None),
            Some(raw) => {
                let date = NaiveDate::parse_from_str(raw, INPUT_DATE_FORMAT).map_err(|_| {
                    PipelineError::Parse {
                        column: column.to_string(),
                        value: raw.clone(),
                        row,
                        format: "yyyyMMdd",
                    }
                })?;
                parsed.push(Some(date.format(ISO_DATE_FORMAT).to_string()));
            }
        }
    }
    let mut out = df.clone();
    out.with_column(Series::new(column.into(), parsed))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn date_df(values: Vec<Option<&str>>) -> DataFrame {
        let cols: Vec<Column> = vec![Series::new("fecha".into(), values).into_column()];
        DataFrame::new(cols).unwrap()
    }

    #[test]
    fn rewrites_compact_dates_as_iso() {
        let df = date_df(vec![Some("20240115"), Some("20241231")]);
        let parsed = parse_date_column(&df, "fecha").unwrap();
        let values = retail_common::string_column(&parsed, "fecha").unwrap();
        assert_eq!(values, vec!["2024-01-15", "2024-12-31"]);
    }

    #[test]
    fn nulls_survive_the_parse() {
        let df = date_df(vec![Some("20240115"), None]);
        let parsed = parse_date_column(&df, "fecha").unwrap();
        let values = retail_common::opt_string_column(&parsed, "fecha").unwrap();
        assert_eq!(values, vec![Some("2024-01-15".to_string()), None]);
    }

    #[test]
    fn malformed_value_is_a_parse_error() {
        let df = date_df(vec![Some("20240115"), Some("2024-01-15")]);
        let err = parse_date_column(&df, "fecha").unwrap_err();
        match err {
            PipelineError::Parse { column, value, row, .. } => {
                assert_eq!(column, "fecha");
                assert_eq!(value, "2024-01-15");
                assert_eq!(row, 1);
            }
            other => panic!("expected Parse error, got {other}"),
        }
    }

    #[test]
    fn impossible_calendar_date_is_rejected() {
        let df = date_df(vec![Some("20240230")]);
        assert!(parse_date_column(&df, "fecha").is_err());
    }

    #[test]
    fn input_is_not_mutated() {
        let df = date_df(vec![Some("20240115")]);
        let _ = parse_date_column(&df, "fecha").unwrap();
        let values = retail_common::string_column(&df, "fecha").unwrap();
        assert_eq!(values, vec!["20240115"]);
    }
}
