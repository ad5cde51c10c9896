use clap::ValueEnum;
use exposure_core::AggregationConfig;
use serde::{Deserialize, Serialize};

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawExposureConfig {
    #[serde(default)]
    pub aggregation: RawAggregationConfig,

    #[serde(default)]
    pub output: RawOutputConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAggregationConfig {
    /// Emit facts at all
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawOutputConfig {
    pub format: Option<OutputFormat>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExposureConfig {
    #[serde(default)]
    pub aggregation: AggregationConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

/// How aggregated facts are printed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}
