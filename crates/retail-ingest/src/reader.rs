//! CSV reader driven by the configured format, options, and fixed schema.
//!
//! Every row is tagged with its originating file's base name (any leading
//! directory path stripped) in the configured additional column, so the
//! provenance survives multi-file input.

use std::path::{Path, PathBuf};

use polars::prelude::{Column, DataFrame, IntoColumn, NamedFrom, Series};
use tracing::{debug, info};

use retail_common::parse_f64;
use retail_model::{ColumnType, InputConfig, PipelineError, Result};

struct ReadOptions {
    header: bool,
    delimiter: u8,
}

fn parse_options(input: &InputConfig) -> Result<ReadOptions> {
    let header = match input.options.get("header").map(|v| v.trim().to_lowercase()) {
        None => true,
        Some(value) if value == "true" => true,
        Some(value) if value == "false" => false,
        Some(value) => {
            return Err(PipelineError::Config(format!(
                "input_data.options.header: expected 'true' or 'false', got '{value}'"
            )));
        }
    };
    let delimiter = match input.options.get("delimiter") {
        None => b',',
        Some(value) if value.len() == 1 => value.as_bytes()[0],
        Some(value) => {
            return Err(PipelineError::Config(format!(
                "input_data.options.delimiter: expected a single character, got '{value}'"
            )));
        }
    };
    Ok(ReadOptions { header, delimiter })
}

/// Base name of a path with any leading directories stripped.
pub fn file_basename(path: &Path) -> String {
    path.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Read the configured input into a single `DataFrame`.
///
/// `input.file_path` may be one data file or a directory of them; multiple
/// files are concatenated. Columns are typed from the configured schema
/// (number columns become nullable `Float64`, everything else stays text;
/// date columns stay text until the date-parse stage). `file_column` is
/// appended with each row's source file base name.
///
/// # Errors
///
/// Fails with [`PipelineError::Config`] for an unsupported format, bad
/// reader options, or an empty/missing input location; read errors from the
/// underlying files propagate.
pub fn read_input(input: &InputConfig, file_column: &str) -> Result<DataFrame> {
    if !input.file_format.eq_ignore_ascii_case("csv") {
        return Err(PipelineError::Config(format!(
            "input_data.file_format: unsupported format '{}'",
            input.file_format
        )));
    }
    let options = parse_options(input)?;
    let files = resolve_files(&input.file_path)?;

    let mut combined: Option<DataFrame> = None;
    for path in &files {
        let df = read_csv_file(path, &options, input, file_column)?;
        debug!(file = %path.display(), rows = df.height(), "loaded input file");
        match combined.as_mut() {
            Some(acc) => {
                acc.vstack_mut(&df)?;
            }
            None => combined = Some(df),
        }
    }
    let combined = combined.ok_or_else(|| {
        PipelineError::Config(format!(
            "input_data.file_path: no input files at {}",
            input.file_path.display()
        ))
    })?;
    info!(
        files = files.len(),
        rows = combined.height(),
        "input loaded"
    );
    Ok(combined)
}

fn resolve_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(PipelineError::Config(format!(
            "input_data.file_path: {} does not exist",
            path.display()
        )));
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = std::fs::read_dir(path)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|candidate| {
            candidate.is_file()
                && candidate
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_csv_file(
    path: &Path,
    options: &ReadOptions,
    input: &InputConfig,
    file_column: &str,
) -> Result<DataFrame> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(options.header)
        .delimiter(options.delimiter)
        .flexible(true)
        .from_path(path)?;

    let headers: Vec<String> = if options.header {
        reader.headers()?.iter().map(|h| h.trim().to_string()).collect()
    } else {
        // Headerless files take the configured schema order.
        input.schema.iter().map(|spec| spec.name.clone()).collect()
    };

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in reader.records() {
        let record = record?;
        for (idx, column) in cells.iter_mut().enumerate() {
            let value = record.get(idx).map(str::trim).unwrap_or_default();
            if value.is_empty() {
                column.push(None);
            } else {
                column.push(Some(value.to_string()));
            }
        }
    }
    let height = cells.first().map_or(0, Vec::len);

    let mut columns: Vec<Column> = Vec::with_capacity(headers.len() + 1);
    for (name, values) in headers.iter().zip(cells) {
        columns.push(typed_column(name, values, input));
    }
    let basename = file_basename(path);
    columns.push(Series::new(file_column.into(), vec![basename; height]).into_column());

    Ok(DataFrame::new(columns)?)
}

fn typed_column(name: &str, values: Vec<Option<String>>, input: &InputConfig) -> Column {
    let column_type = input
        .schema
        .iter()
        .find(|spec| spec.name == name)
        .map_or(ColumnType::Text, |spec| spec.column_type);
    match column_type {
        ColumnType::Number => {
            let floats: Vec<Option<f64>> = values
                .iter()
                .map(|value| value.as_deref().and_then(parse_f64))
                .collect();
            Series::new(name.into(), floats).into_column()
        }
        // Date columns stay text; the pipeline parses and canonicalizes them.
        ColumnType::Text | ColumnType::Date => Series::new(name.into(), values).into_column(),
    }
}
