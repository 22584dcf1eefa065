//! Filter stage: date range, categorical equality, and the rule-based
//! inclusion filter over two condition sets.

use std::collections::BTreeSet;

use polars::prelude::{BooleanChunked, DataFrame, NewChunkedArray};
use tracing::debug;

use retail_common::{column_names, opt_string_column};
use retail_model::{DerivedColumnRule, PipelineError, Result};

use crate::dates::parse_iso_date;

/// Category filter sentinel: keep every row.
pub const MATCH_ALL_SENTINEL: &str = "TODOS";

/// Keeps rows whose ISO date in `column` falls within `[start, end]`
/// inclusive. Null dates never match.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] when either bound is not a valid
/// `YYYY-MM-DD` date.
pub fn filter_by_date_range(
    df: &DataFrame,
    column: &str,
    start: &str,
    end: &str,
) -> Result<DataFrame> {
    let start = parse_iso_date(start).ok_or_else(|| {
        PipelineError::Config(format!("start date '{start}' is not a YYYY-MM-DD date"))
    })?;
    let end = parse_iso_date(end).ok_or_else(|| {
        PipelineError::Config(format!("end date '{end}' is not a YYYY-MM-DD date"))
    })?;

    let values = opt_string_column(df, column)?;
    let keep: Vec<bool> = values
        .iter()
        .map(|value| {
            value
                .as_deref()
                .and_then(parse_iso_date)
                .is_some_and(|date| date >= start && date <= end)
        })
        .collect();
    let filtered = apply_mask(df, &keep)?;
    debug!(input = df.height(), kept = filtered.height(), "date filter");
    Ok(filtered)
}

/// Keeps rows equal to `value` in `column`, case-sensitively. The sentinel
/// `TODOS` (uppercased) returns the table unchanged.
pub fn filter_by_category(df: &DataFrame, column: &str, value: &str) -> Result<DataFrame> {
    if value.trim().to_uppercase() == MATCH_ALL_SENTINEL {
        debug!(input = df.height(), "category filter skipped (match-all)");
        return Ok(df.clone());
    }
    let values = opt_string_column(df, column)?;
    let keep: Vec<bool> = values
        .iter()
        .map(|candidate| candidate.as_deref() == Some(value))
        .collect();
    let filtered = apply_mask(df, &keep)?;
    debug!(input = df.height(), kept = filtered.height(), "category filter");
    Ok(filtered)
}

/// Filters independently by each rule's condition set and concatenates the
/// matches. A row matching both condition sets appears twice; that
/// duplication is part of the contract and must not be collapsed here (the
/// pipeline's duplicate removal already happened upstream).
///
/// # Errors
///
/// Returns [`PipelineError::SchemaMismatch`] when the two filtered branches
/// disagree on column names or order.
pub fn filter_by_condition_union(
    df: &DataFrame,
    rule1: &DerivedColumnRule,
    rule2: &DerivedColumnRule,
) -> Result<DataFrame> {
    let left = filter_by_membership(df, &rule1.source, &rule1.condition_set())?;
    let right = filter_by_membership(df, &rule2.source, &rule2.condition_set())?;

    let left_columns = column_names(&left);
    let right_columns = column_names(&right);
    if left_columns != right_columns {
        return Err(PipelineError::SchemaMismatch {
            left: left_columns,
            right: right_columns,
        });
    }
    let union = left.vstack(&right)?;
    debug!(
        input = df.height(),
        left = left.height(),
        right = right.height(),
        union = union.height(),
        "condition union filter"
    );
    Ok(union)
}

/// Keeps rows whose uppercased `column` value is a member of `conditions`.
fn filter_by_membership(
    df: &DataFrame,
    column: &str,
    conditions: &BTreeSet<String>,
) -> Result<DataFrame> {
    let values = opt_string_column(df, column)?;
    let keep: Vec<bool> = values
        .iter()
        .map(|value| {
            value
                .as_deref()
                .is_some_and(|value| conditions.contains(&value.to_uppercase()))
        })
        .collect();
    apply_mask(df, &keep)
}

fn apply_mask(df: &DataFrame, keep: &[bool]) -> Result<DataFrame> {
    let mask = BooleanChunked::from_slice("filter".into(), keep);
    Ok(df.filter(&mask)?)
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn test_df(columns: Vec<(&str, Vec<Option<&str>>)>) -> DataFrame {
        let cols: Vec<Column> = columns
            .into_iter()
            .map(|(name, values)| Series::new(name.into(), values).into_column())
            .collect();
        DataFrame::new(cols).unwrap()
    }

    fn rule(source: &str, conditions: &[&str], name: &str) -> DerivedColumnRule {
        DerivedColumnRule {
            source: source.to_string(),
            conditions: conditions.iter().map(|c| (*c).to_string()).collect(),
            name: name.to_string(),
        }
    }

    #[test]
    fn date_range_is_inclusive() {
        let df = test_df(vec![(
            "fecha",
            vec![
                Some("2023-12-31"),
                Some("2024-01-01"),
                Some("2024-01-20"),
                Some("2024-01-31"),
                Some("2024-02-01"),
            ],
        )]);
        let filtered =
            filter_by_date_range(&df, "fecha", "2024-01-01", "2024-01-31").unwrap();
        let values = retail_common::string_column(&filtered, "fecha").unwrap();
        assert_eq!(values, vec!["2024-01-01", "2024-01-20", "2024-01-31"]);
    }

    #[test]
    fn null_dates_are_excluded() {
        let df = test_df(vec![("fecha", vec![Some("2024-01-15"), None])]);
        let filtered =
            filter_by_date_range(&df, "fecha", "2024-01-01", "2024-01-31").unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn bad_bounds_are_config_errors() {
        let df = test_df(vec![("fecha", vec![Some("2024-01-15")])]);
        let err = filter_by_date_range(&df, "fecha", "tomorrow", "2024-01-31").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn category_filter_is_case_sensitive_equality() {
        let df = test_df(vec![(
            "pais",
            vec![Some("AR"), Some("ar"), Some("CL"), None],
        )]);
        let filtered = filter_by_category(&df, "pais", "AR").unwrap();
        assert_eq!(filtered.height(), 1);
    }

    #[test]
    fn match_all_sentinel_returns_input_unchanged() {
        let df = test_df(vec![
            ("pais", vec![Some("AR"), Some("CL"), None]),
            ("producto", vec![Some("x"), Some("y"), Some("z")]),
        ]);
        for sentinel in ["TODOS", "todos", "Todos"] {
            let filtered = filter_by_category(&df, "pais", sentinel).unwrap();
            assert_eq!(filtered, df);
        }
    }

    #[test]
    fn condition_union_matches_case_insensitively() {
        let df = test_df(vec![(
            "tipo_entrega",
            vec![Some("express"), Some("NORMAL"), Some("retiro"), None],
        )]);
        let union = filter_by_condition_union(
            &df,
            &rule("tipo_entrega", &["EXPRESS"], "f1"),
            &rule("tipo_entrega", &["NORMAL"], "f2"),
        )
        .unwrap();
        let values = retail_common::string_column(&union, "tipo_entrega").unwrap();
        assert_eq!(values, vec!["express", "NORMAL"]);
    }

    #[test]
    fn row_matching_both_condition_sets_appears_twice() {
        let df = test_df(vec![(
            "tipo_entrega",
            vec![Some("EXPRESS"), Some("RETIRO")],
        )]);
        let union = filter_by_condition_union(
            &df,
            &rule("tipo_entrega", &["EXPRESS"], "f1"),
            &rule("tipo_entrega", &["EXPRESS", "NORMAL"], "f2"),
        )
        .unwrap();
        // The EXPRESS row matches both branches; the concatenation keeps both
        // copies on purpose.
        let values = retail_common::string_column(&union, "tipo_entrega").unwrap();
        assert_eq!(values, vec!["EXPRESS", "EXPRESS"]);
    }

    #[test]
    fn union_row_count_can_exceed_input() {
        let df = test_df(vec![("tipo_entrega", vec![Some("EXPRESS")])]);
        let union = filter_by_condition_union(
            &df,
            &rule("tipo_entrega", &["EXPRESS"], "f1"),
            &rule("tipo_entrega", &["EXPRESS"], "f2"),
        )
        .unwrap();
        assert_eq!(union.height(), 2);
    }
}
