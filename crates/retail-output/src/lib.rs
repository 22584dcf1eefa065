//! Output collaborator: persists the final table partitioned by the
//! configured columns.
//!
//! Write semantics are full overwrite: whatever exists at the destination is
//! replaced, never merged. The physical layout is one directory level per
//! partition column (`column=value/`), with the partition columns dropped
//! from the file payloads.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::{BooleanChunked, CsvWriter, DataFrame, NewChunkedArray, ParquetWriter, SerWriter};
use tracing::{debug, info};

use retail_common::string_column;
use retail_model::{OutputFormat, PipelineError, Result};

/// Directory name for rows whose partition value is null or empty.
const DEFAULT_PARTITION: &str = "__HIVE_DEFAULT_PARTITION__";

/// Write `df` to `dest`, laid out by `partition_columns`, replacing any
/// existing content at the destination.
///
/// # Errors
///
/// Returns [`PipelineError::MissingColumn`] when a partition column is not
/// in the table, and [`PipelineError::Write`] when any file cannot be
/// produced.
pub fn write_partitioned(
    df: &DataFrame,
    dest: &Path,
    partition_columns: &[String],
    format: OutputFormat,
) -> Result<()> {
    for column in partition_columns {
        if !retail_common::has_column(df, column) {
            return Err(PipelineError::MissingColumn(column.clone()));
        }
    }

    // Full overwrite: prior contents of the target location are replaced.
    if dest.exists() {
        fs::remove_dir_all(dest)?;
    }
    fs::create_dir_all(dest)?;

    if partition_columns.is_empty() {
        let path = dest.join(format!("part-00000.{}", format.extension()));
        write_file(df, &path, format)?;
        info!(dest = %dest.display(), rows = df.height(), partitions = 1, "dataset written");
        return Ok(());
    }

    let mut partition_values: Vec<Vec<String>> = Vec::with_capacity(partition_columns.len());
    for column in partition_columns {
        partition_values.push(string_column(df, column)?);
    }

    let mut groups: BTreeMap<Vec<String>, Vec<bool>> = BTreeMap::new();
    for idx in 0..df.height() {
        let key: Vec<String> = partition_values
            .iter()
            .map(|values| values[idx].clone())
            .collect();
        groups.entry(key).or_insert_with(|| vec![false; df.height()])[idx] = true;
    }

    let partition_count = groups.len();
    for (key, mask) in groups {
        let mask = BooleanChunked::from_slice("partition".into(), &mask);
        let mut part = df.filter(&mask)?;
        for column in partition_columns {
            part = part.drop(column)?;
        }

        let mut dir = dest.to_path_buf();
        for (column, value) in partition_columns.iter().zip(&key) {
            dir = dir.join(format!("{column}={}", partition_dir_value(value)));
        }
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("part-00000.{}", format.extension()));
        debug!(path = %path.display(), rows = part.height(), "writing partition");
        write_file(&part, &path, format)?;
    }
    info!(
        dest = %dest.display(),
        rows = df.height(),
        partitions = partition_count,
        "dataset written"
    );
    Ok(())
}

/// Path-safe rendition of a partition value.
fn partition_dir_value(value: &str) -> String {
    if value.is_empty() {
        return DEFAULT_PARTITION.to_string();
    }
    value
        .chars()
        .map(|ch| if matches!(ch, '/' | '\\' | '=') { '_' } else { ch })
        .collect()
}

fn write_file(df: &DataFrame, path: &Path, format: OutputFormat) -> Result<()> {
    let write = || -> std::result::Result<(), Box<dyn std::error::Error>> {
        let file = fs::File::create(path)?;
        let mut payload = df.clone();
        match format {
            OutputFormat::Parquet => {
                ParquetWriter::new(file).finish(&mut payload)?;
            }
            OutputFormat::Csv => {
                CsvWriter::new(file).include_header(true).finish(&mut payload)?;
            }
        }
        Ok(())
    };
    write().map_err(|err| PipelineError::Write {
        path: PathBuf::from(path),
        reason: err.to_string(),
    })
}
