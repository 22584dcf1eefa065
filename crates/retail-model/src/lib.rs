//! Data model for the retail batch pipeline.
//!
//! Holds the typed configuration contract (deserialized once from YAML and
//! validated eagerly) and the shared error taxonomy. No pipeline logic lives
//! here.

pub mod config;
pub mod error;

pub use config::{
    AdditionalFields, ColumnOutput, ColumnSpec, ColumnType, ColumnsConfig, DataFilling,
    DataQuality, DerivedColumnRule, DerivedColumns, EnvironmentConfig, ISO_DATE_FORMAT,
    InputConfig, InputQuality, NumberFillRule, OutputFormat, OutputQuality, PipelineConfig,
    RunParameters, TextFillRule, UnitConversion, UnitRule,
};
pub use error::{PipelineError, Result};
