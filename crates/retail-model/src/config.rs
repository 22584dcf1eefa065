//! Typed view over the declarative pipeline configuration.
//!
//! The YAML document drives every stage of the pipeline: filter columns and
//! bounds, derivation rules, fill values, unit-conversion parameters, the
//! final column layout, and the data-quality thresholds. All of it is
//! deserialized eagerly into this module's structs and validated once at
//! startup; stages never reach back into an untyped document.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::error::{PipelineError, Result};

/// External representation of the date-filter bounds.
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Root configuration document for one pipeline run.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub environment: EnvironmentConfig,
    pub input_data: InputConfig,
    pub run_parameters: RunParameters,
    pub derived_cols: DerivedColumns,
    pub data_filling: DataFilling,
    pub unit_conversion: UnitConversion,
    pub columns_config: ColumnsConfig,
    pub additional_fields: AdditionalFields,
    pub data_quality: DataQuality,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Environment name; appended to the output base path and carried in the
    /// run span.
    pub name: String,
}

/// Where and how to read the raw dataset.
#[derive(Debug, Clone, Deserialize)]
pub struct InputConfig {
    /// A single data file or a directory of data files.
    pub file_path: PathBuf,
    /// Format identifier. Only `csv` is supported.
    pub file_format: String,
    /// Reader options (`header`, `delimiter`).
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    /// Fixed input schema; the pipeline performs no schema inference.
    pub schema: Vec<ColumnSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Number,
    /// Textual digits in year-month-day order without separators (yyyyMMdd);
    /// parsed into canonical ISO form by the pipeline.
    Date,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RunParameters {
    pub date_filter_column: String,
    /// Inclusive lower bound, `YYYY-MM-DD`.
    pub start_date: String,
    /// Inclusive upper bound, `YYYY-MM-DD`.
    pub end_date: String,
    pub country_filter_column: String,
    /// Category value to keep; the sentinel `TODOS` keeps every row.
    pub country_filter_value: String,
    pub partition_columns: Vec<String>,
    pub output_base_path: PathBuf,
    #[serde(default)]
    pub output_format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Parquet,
    Csv,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Parquet => "parquet",
            OutputFormat::Csv => "csv",
        }
    }
}

/// The two condition-set rules shared by the inclusion filter and the
/// flag-derivation step.
#[derive(Debug, Clone, Deserialize)]
pub struct DerivedColumns {
    pub col1: DerivedColumnRule,
    pub col2: DerivedColumnRule,
}

/// (source column, condition set, output flag column).
#[derive(Debug, Clone, Deserialize)]
pub struct DerivedColumnRule {
    pub source: String,
    pub conditions: Vec<String>,
    pub name: String,
}

impl DerivedColumnRule {
    /// Deduplicated, uppercased membership set. Matching is case-insensitive
    /// and order never matters.
    pub fn condition_set(&self) -> BTreeSet<String> {
        self.conditions
            .iter()
            .map(|value| value.trim().to_uppercase())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataFilling {
    pub text: TextFillRule,
    pub number: NumberFillRule,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextFillRule {
    pub columns: Vec<String>,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NumberFillRule {
    pub columns: Vec<String>,
    pub value: f64,
}

/// Conditional quantity/price rescale triggered by a unit-column value.
///
/// When `unit.name` (uppercased) equals `unit.value`, quantity is multiplied
/// by `unit.factor` and price divided by it (rounded to 2 decimals); the
/// normalized unit column is always set to `unit.new_value`.
#[derive(Debug, Clone, Deserialize)]
pub struct UnitConversion {
    pub quantity: ColumnOutput,
    pub price: ColumnOutput,
    pub unit: UnitRule,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnOutput {
    pub name: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UnitRule {
    pub name: String,
    pub new_name: String,
    /// Trigger value, compared against the uppercased unit column.
    pub value: String,
    /// Normalized unit label written to every output row.
    pub new_value: String,
    pub factor: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnsConfig {
    /// Original name -> final name. Columns absent from the map keep their
    /// name.
    #[serde(default)]
    pub columns_rename: BTreeMap<String, String>,
    /// Exact final column selection and order.
    pub columns_order: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdditionalFields {
    /// Column the reader fills with the source file's base name.
    pub file: String,
    /// Derived total column (normalized quantity x normalized price).
    pub total: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataQuality {
    pub input: InputQuality,
    pub output: OutputQuality,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InputQuality {
    pub min_expected_rows: usize,
    pub required_columns: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputQuality {
    /// Columns that must contain zero nulls after transformation.
    pub not_nulls: Vec<String>,
}

impl PipelineConfig {
    /// Load and validate a configuration document from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the document cannot be parsed
    /// (serde names the missing or malformed key) or fails validation, and
    /// [`PipelineError::Io`] when the file cannot be read.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|err| PipelineError::Config(format!("{}: {err}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Eager validation of everything the stages rely on, so that a bad
    /// document fails before any data is read.
    pub fn validate(&self) -> Result<()> {
        require_non_empty(&self.environment.name, "environment.name")?;
        if !self.input_data.file_format.eq_ignore_ascii_case("csv") {
            return Err(PipelineError::Config(format!(
                "input_data.file_format: unsupported format '{}' (only 'csv' is supported)",
                self.input_data.file_format
            )));
        }
        if self.input_data.schema.is_empty() {
            return Err(PipelineError::Config(
                "input_data.schema: at least one column must be declared".to_string(),
            ));
        }

        let (start, end) = self.run_parameters.date_bounds()?;
        if start > end {
            return Err(PipelineError::Config(format!(
                "run_parameters: start_date {start} is after end_date {end}"
            )));
        }
        let date_column = &self.run_parameters.date_filter_column;
        let declared_as_date = self.input_data.schema.iter().any(|spec| {
            spec.name == *date_column && spec.column_type == ColumnType::Date
        });
        if !declared_as_date {
            return Err(PipelineError::Config(format!(
                "input_data.schema: run_parameters.date_filter_column '{date_column}' must be declared with type 'date'"
            )));
        }
        require_non_empty(
            &self.run_parameters.country_filter_column,
            "run_parameters.country_filter_column",
        )?;
        require_non_empty(
            &self.run_parameters.country_filter_value,
            "run_parameters.country_filter_value",
        )?;

        validate_rule(&self.derived_cols.col1, "derived_cols.col1")?;
        validate_rule(&self.derived_cols.col2, "derived_cols.col2")?;

        if self.unit_conversion.unit.factor == 0.0 {
            return Err(PipelineError::Config(
                "unit_conversion.unit.factor: must be non-zero (price is divided by it)"
                    .to_string(),
            ));
        }
        require_non_empty(&self.unit_conversion.unit.value, "unit_conversion.unit.value")?;
        require_non_empty(
            &self.unit_conversion.unit.new_value,
            "unit_conversion.unit.new_value",
        )?;

        if self.columns_config.columns_order.is_empty() {
            return Err(PipelineError::Config(
                "columns_config.columns_order: must list at least one column".to_string(),
            ));
        }
        require_non_empty(&self.additional_fields.file, "additional_fields.file")?;
        require_non_empty(&self.additional_fields.total, "additional_fields.total")?;
        Ok(())
    }
}

impl RunParameters {
    /// Parse the inclusive filter bounds from their `YYYY-MM-DD` form.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when either bound is not a valid
    /// ISO date.
    pub fn date_bounds(&self) -> Result<(NaiveDate, NaiveDate)> {
        let start = parse_iso_bound(&self.start_date, "run_parameters.start_date")?;
        let end = parse_iso_bound(&self.end_date, "run_parameters.end_date")?;
        Ok((start, end))
    }
}

fn parse_iso_bound(value: &str, key: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), ISO_DATE_FORMAT).map_err(|_| {
        PipelineError::Config(format!("{key}: '{value}' is not a YYYY-MM-DD date"))
    })
}

fn validate_rule(rule: &DerivedColumnRule, key: &str) -> Result<()> {
    require_non_empty(&rule.source, &format!("{key}.source"))?;
    require_non_empty(&rule.name, &format!("{key}.name"))?;
    if rule.conditions.is_empty() {
        return Err(PipelineError::Config(format!(
            "{key}.conditions: must list at least one value"
        )));
    }
    Ok(())
}

fn require_non_empty(value: &str, key: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PipelineError::Config(format!("{key}: must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
environment:
  name: dev
input_data:
  file_path: data/sales
  file_format: csv
  options:
    header: "true"
    delimiter: ","
  schema:
    - { name: fecha, type: date }
    - { name: pais, type: text }
    - { name: tipo_entrega, type: text }
    - { name: producto, type: text }
    - { name: cantidad, type: number }
    - { name: precio, type: number }
    - { name: unidad, type: text }
run_parameters:
  date_filter_column: fecha
  start_date: "2024-01-01"
  end_date: "2024-01-31"
  country_filter_column: pais
  country_filter_value: TODOS
  partition_columns: [pais]
  output_base_path: output/sales
  output_format: parquet
derived_cols:
  col1:
    source: tipo_entrega
    conditions: [EXPRESS, URGENTE]
    name: flag_express
  col2:
    source: tipo_entrega
    conditions: [NORMAL, PROGRAMADA]
    name: flag_normal
data_filling:
  text:
    columns: [producto, unidad]
    value: DESCONOCIDO
  number:
    columns: [cantidad, precio]
    value: 0.0
unit_conversion:
  quantity:
    name: cantidad
    new_name: cantidad_normalizada
  price:
    name: precio
    new_name: precio_normalizado
  unit:
    name: unidad
    new_name: unidad_normalizada
    value: KG
    new_value: G
    factor: 1000
columns_config:
  columns_rename:
    pais: country
  columns_order: [country, producto, cantidad_normalizada, precio_normalizado, total]
additional_fields:
  file: archivo_origen
  total: total
data_quality:
  input:
    min_expected_rows: 3
    required_columns: [fecha, pais, cantidad, precio]
  output:
    not_nulls: [country, total]
"#;

    fn sample_config() -> PipelineConfig {
        serde_yaml::from_str(SAMPLE).expect("sample config parses")
    }

    #[test]
    fn sample_config_validates() {
        let config = sample_config();
        config.validate().expect("sample config is valid");
        let (start, end) = config.run_parameters.date_bounds().unwrap();
        assert_eq!(start.to_string(), "2024-01-01");
        assert_eq!(end.to_string(), "2024-01-31");
    }

    #[test]
    fn condition_set_dedupes_and_uppercases() {
        let rule = DerivedColumnRule {
            source: "tipo_entrega".to_string(),
            conditions: vec![
                "express".to_string(),
                "EXPRESS".to_string(),
                " urgente ".to_string(),
            ],
            name: "flag".to_string(),
        };
        let set = rule.condition_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("EXPRESS"));
        assert!(set.contains("URGENTE"));
    }

    #[test]
    fn missing_key_is_config_error_naming_the_key() {
        let broken = SAMPLE.replace("  date_filter_column: fecha\n", "");
        let err = serde_yaml::from_str::<PipelineConfig>(&broken).unwrap_err();
        assert!(err.to_string().contains("date_filter_column"));
    }

    #[test]
    fn unparseable_bound_fails_validation() {
        let mut config = sample_config();
        config.run_parameters.start_date = "01/02/2024".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("run_parameters.start_date"));
    }

    #[test]
    fn inverted_bounds_fail_validation() {
        let mut config = sample_config();
        config.run_parameters.start_date = "2024-02-01".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("after end_date"));
    }

    #[test]
    fn unsupported_format_fails_validation() {
        let mut config = sample_config();
        config.input_data.file_format = "avro".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("file_format"));
    }

    #[test]
    fn zero_factor_fails_validation() {
        let mut config = sample_config();
        config.unit_conversion.unit.factor = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("factor"));
    }

    #[test]
    fn date_column_must_be_declared_as_date() {
        let mut config = sample_config();
        config.run_parameters.date_filter_column = "pais".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("type 'date'"));
    }

    #[test]
    fn output_format_defaults_to_parquet() {
        let trimmed = SAMPLE.replace("  output_format: parquet\n", "");
        let config: PipelineConfig = serde_yaml::from_str(&trimmed).unwrap();
        assert_eq!(config.run_parameters.output_format, OutputFormat::Parquet);
        assert_eq!(config.run_parameters.output_format.extension(), "parquet");
    }
}
