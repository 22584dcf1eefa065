use anyhow::{Context, Result};
use comfy_table::Table;
use tracing::info;

use retail_cli::pipeline::run_pipeline;
use retail_cli::types::RunReport;
use retail_model::PipelineConfig;

use crate::cli::{CheckArgs, RunArgs};
use crate::summary::apply_table_style;

pub fn run_command(args: &RunArgs) -> Result<RunReport> {
    let config = PipelineConfig::from_yaml_file(&args.config)
        .with_context(|| format!("load configuration {}", args.config.display()))?;
    info!(
        config = %args.config.display(),
        environment = %config.environment.name,
        dry_run = args.dry_run,
        "starting run"
    );
    let report = run_pipeline(&config, args.dry_run)?;
    Ok(report)
}

pub fn check_command(args: &CheckArgs) -> Result<()> {
    let config = PipelineConfig::from_yaml_file(&args.config)
        .with_context(|| format!("load configuration {}", args.config.display()))?;

    let params = &config.run_parameters;
    let mut table = Table::new();
    table.set_header(vec!["Parameter", "Value"]);
    apply_table_style(&mut table);
    table.add_row(vec!["Environment".to_string(), config.environment.name.clone()]);
    table.add_row(vec![
        "Input".to_string(),
        config.input_data.file_path.display().to_string(),
    ]);
    table.add_row(vec![
        "Schema columns".to_string(),
        config.input_data.schema.len().to_string(),
    ]);
    table.add_row(vec![
        "Date window".to_string(),
        format!(
            "{} .. {} on {}",
            params.start_date, params.end_date, params.date_filter_column
        ),
    ]);
    table.add_row(vec![
        "Category filter".to_string(),
        format!(
            "{} = {}",
            params.country_filter_column, params.country_filter_value
        ),
    ]);
    table.add_row(vec![
        "Partitioning".to_string(),
        params.partition_columns.join(", "),
    ]);
    table.add_row(vec![
        "Output".to_string(),
        format!(
            "{} ({})",
            params
                .output_base_path
                .join(&config.environment.name)
                .display(),
            params.output_format.extension()
        ),
    ]);
    println!("{table}");
    println!("Configuration is valid.");
    Ok(())
}
