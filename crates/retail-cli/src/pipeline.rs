//! Pipeline orchestration: composes the stage crates in a fixed order.
//!
//! Stage order: ingest, dedupe, date parse, input quality gate, date filter,
//! category filter, condition union, flag derivation, null filling, unit
//! normalization, total derivation, projection, output quality gate, write.
//!
//! Quality-gate failures are outcomes, not errors: the run stops, nothing is
//! written, and the report carries the failed checks. Only broken inputs,
//! bad configuration, and I/O problems surface as `Err`.

use std::time::Instant;

use tracing::{info, info_span, warn};

use retail_ingest::read_input;
use retail_model::{PipelineConfig, Result};
use retail_output::write_partitioned;
use retail_transform::{
    dedupe_rows, derive_flags, derive_total, fill_nulls, filter_by_category,
    filter_by_condition_union, filter_by_date_range, normalize_units, parse_date_column,
    rename_and_order,
};
use retail_validate::{run_input_gate, run_output_gate};

use crate::types::{RunOutcome, RunReport, StageCounts};

/// Execute one configured run end to end.
///
/// With `dry_run` set, every stage including the output gate runs but
/// nothing is written to disk.
///
/// # Errors
///
/// Propagates stage errors ([`retail_model::PipelineError`]): unreadable or
/// empty input, unparseable dates, missing columns, write failures.
pub fn run_pipeline(config: &PipelineConfig, dry_run: bool) -> Result<RunReport> {
    let run_span = info_span!("pipeline", environment = %config.environment.name);
    let _run_guard = run_span.enter();
    let started = Instant::now();

    let params = &config.run_parameters;
    let output_path = params.output_base_path.join(&config.environment.name);
    let mut counts = StageCounts::default();
    let mut gates = Vec::new();

    let report = |outcome, counts, gates| RunReport {
        environment: config.environment.name.clone(),
        output_path: output_path.clone(),
        outcome,
        counts,
        gates,
    };

    // Ingest and canonicalize before any quality decision is made.
    let ingest_span = info_span!("ingest", path = %config.input_data.file_path.display());
    let raw = ingest_span.in_scope(|| read_input(&config.input_data, &config.additional_fields.file))?;
    counts.ingested = raw.height();

    let deduped = dedupe_rows(&raw)?;
    counts.deduplicated = deduped.height();

    let dated = parse_date_column(&deduped, &params.date_filter_column)?;

    let input_gate = run_input_gate(&dated, &config.data_quality.input);
    let input_passed = input_gate.passed();
    gates.push(input_gate);
    if !input_passed {
        warn!("input quality gate failed, stopping before transformation");
        return Ok(report(RunOutcome::InputGateFailed, counts, gates));
    }

    let filter_span = info_span!("filter");
    let filtered = filter_span.in_scope(|| -> Result<_> {
        let in_range =
            filter_by_date_range(&dated, &params.date_filter_column, &params.start_date, &params.end_date)?;
        counts.date_filtered = in_range.height();

        let in_category = filter_by_category(
            &in_range,
            &params.country_filter_column,
            &params.country_filter_value,
        )?;
        counts.category_filtered = in_category.height();

        let unioned =
            filter_by_condition_union(&in_category, &config.derived_cols.col1, &config.derived_cols.col2)?;
        counts.unioned = unioned.height();
        Ok(unioned)
    })?;

    let transform_span = info_span!("transform");
    let shaped = transform_span.in_scope(|| -> Result<_> {
        let flagged = derive_flags(&filtered, &config.derived_cols.col1, &config.derived_cols.col2)?;
        let filled = fill_nulls(&flagged, &config.data_filling.text, &config.data_filling.number)?;
        let normalized = normalize_units(&filled, &config.unit_conversion)?;
        let totaled = derive_total(
            &normalized,
            &config.unit_conversion.quantity.new_name,
            &config.unit_conversion.price.new_name,
            &config.additional_fields.total,
        )?;
        rename_and_order(
            &totaled,
            &config.columns_config.columns_rename,
            &config.columns_config.columns_order,
        )
    })?;

    let output_gate = run_output_gate(&shaped, &config.data_quality.output);
    let output_passed = output_gate.passed();
    gates.push(output_gate);
    if !output_passed {
        warn!("output quality gate failed, nothing written");
        return Ok(report(RunOutcome::OutputGateFailed, counts, gates));
    }

    counts.written = shaped.height();
    if dry_run {
        info!(rows = shaped.height(), "dry run, skipping write");
        return Ok(report(RunOutcome::DryRun, counts, gates));
    }

    write_partitioned(&shaped, &output_path, &params.partition_columns, params.output_format)?;
    info!(
        rows = shaped.height(),
        output = %output_path.display(),
        duration_ms = started.elapsed().as_millis(),
        "pipeline complete"
    );
    Ok(report(RunOutcome::Written, counts, gates))
}
