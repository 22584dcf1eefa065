//! Gate check implementations.

use std::collections::BTreeSet;

use polars::prelude::DataFrame;
use tracing::{info, warn};

use retail_common::column_names;
use retail_model::{InputQuality, OutputQuality};

use crate::report::{Checkpoint, GateCheck, GateReport};

/// Input checkpoint: minimum row count and required-column presence. Both
/// checks always run; the checkpoint is the AND of their results.
pub fn run_input_gate(df: &DataFrame, rules: &InputQuality) -> GateReport {
    let mut checks = Vec::with_capacity(2);

    let rows = df.height();
    let min = rules.min_expected_rows;
    checks.push(check(
        "min_row_count",
        rows >= min,
        format!("{rows} rows (minimum {min})"),
    ));

    let actual: BTreeSet<String> = column_names(df).into_iter().collect();
    let missing: Vec<&String> = rules
        .required_columns
        .iter()
        .filter(|column| !actual.contains(*column))
        .collect();
    checks.push(check(
        "required_columns",
        missing.is_empty(),
        if missing.is_empty() {
            "all required columns present".to_string()
        } else {
            format!("missing columns: {missing:?}")
        },
    ));

    finish(Checkpoint::Input, checks)
}

/// Output checkpoint: zero nulls in every configured column. A configured
/// column absent from the table fails its check (its null count cannot be
/// verified).
pub fn run_output_gate(df: &DataFrame, rules: &OutputQuality) -> GateReport {
    let mut checks = Vec::with_capacity(rules.not_nulls.len());
    for column in &rules.not_nulls {
        let name = format!("not_null:{column}");
        match df.column(column) {
            Err(_) => checks.push(check(&name, false, format!("column '{column}' not found"))),
            Ok(series) => {
                let nulls = series.null_count();
                checks.push(check(
                    &name,
                    nulls == 0,
                    format!("column '{column}' has {nulls} null values"),
                ));
            }
        }
    }
    finish(Checkpoint::Output, checks)
}

fn check(name: &str, passed: bool, detail: String) -> GateCheck {
    GateCheck {
        name: name.to_string(),
        passed,
        detail,
    }
}

fn finish(checkpoint: Checkpoint, checks: Vec<GateCheck>) -> GateReport {
    let report = GateReport { checkpoint, checks };
    for failed in report.failed_checks() {
        warn!(
            checkpoint = checkpoint.label(),
            check = %failed.name,
            detail = %failed.detail,
            "data-quality check failed"
        );
    }
    if report.passed() {
        info!(checkpoint = checkpoint.label(), "data-quality gate passed");
    }
    report
}

#[cfg(test)]
mod tests {
    use polars::prelude::{Column, IntoColumn, NamedFrom, Series};

    use super::*;

    fn test_df(rows: usize, with_nulls: bool) -> DataFrame {
        let countries: Vec<Option<String>> = (0..rows)
            .map(|idx| {
                if with_nulls && idx == 0 {
                    None
                } else {
                    Some("AR".to_string())
                }
            })
            .collect();
        let amounts: Vec<Option<f64>> = (0..rows).map(|idx| Some(idx as f64)).collect();
        let cols: Vec<Column> = vec![
            Series::new("pais".into(), countries).into_column(),
            Series::new("cantidad".into(), amounts).into_column(),
        ];
        DataFrame::new(cols).unwrap()
    }

    fn input_rules(min: usize, required: &[&str]) -> InputQuality {
        InputQuality {
            min_expected_rows: min,
            required_columns: required.iter().map(|c| (*c).to_string()).collect(),
        }
    }

    #[test]
    fn input_gate_passes_at_exact_threshold() {
        let report = run_input_gate(&test_df(3, false), &input_rules(3, &["pais"]));
        assert!(report.passed());
    }

    #[test]
    fn input_gate_fails_below_threshold_but_runs_all_checks() {
        let report = run_input_gate(&test_df(2, false), &input_rules(3, &["pais", "ghost"]));
        assert!(!report.passed());
        // Both checks ran and both failed.
        assert_eq!(report.checks.len(), 2);
        assert_eq!(report.failed_checks().count(), 2);
    }

    #[test]
    fn input_gate_reports_the_missing_columns() {
        let report = run_input_gate(&test_df(5, false), &input_rules(1, &["pais", "ghost"]));
        let failed: Vec<_> = report.failed_checks().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "required_columns");
        assert!(failed[0].detail.contains("ghost"));
    }

    #[test]
    fn output_gate_passes_with_zero_nulls() {
        let report = run_output_gate(
            &test_df(3, false),
            &OutputQuality {
                not_nulls: vec!["pais".to_string(), "cantidad".to_string()],
            },
        );
        assert!(report.passed());
    }

    #[test]
    fn output_gate_fails_on_any_null_and_names_the_column() {
        let report = run_output_gate(
            &test_df(3, true),
            &OutputQuality {
                not_nulls: vec!["pais".to_string(), "cantidad".to_string()],
            },
        );
        assert!(!report.passed());
        let failed: Vec<_> = report.failed_checks().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].name, "not_null:pais");
        assert!(failed[0].detail.contains("1 null"));
    }

    #[test]
    fn output_gate_fails_when_a_configured_column_is_absent() {
        let report = run_output_gate(
            &test_df(3, false),
            &OutputQuality {
                not_nulls: vec!["total".to_string()],
            },
        );
        assert!(!report.passed());
    }

    #[test]
    fn empty_not_null_set_passes_trivially() {
        let report = run_output_gate(&test_df(3, true), &OutputQuality { not_nulls: vec![] });
        assert!(report.passed());
    }
}
