use super::types::{
    ExposureConfig, OutputConfig, RawAggregationConfig, RawExposureConfig, RawOutputConfig,
};
use anyhow::Result;
use directories::ProjectDirs;
use exposure_core::AggregationConfig;
use std::fmt;
use std::path::{Path, PathBuf};

/// Env var that relocates the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "EXPOSURE_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

/// Layer a configured value was taken from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    #[default]
    Default,
    User,
    Project,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "default"),
            Self::User => write!(f, "user config"),
            Self::Project => write!(f, "project config"),
        }
    }
}

/// Where each effective value came from
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigSources {
    pub aggregation_enabled: ConfigSource,
    pub output_format: ConfigSource,
}

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<ExposureConfig> {
        Ok(Self::load_with_sources()?.0)
    }

    /// Load merged configuration along with the layer behind each value
    pub fn load_with_sources() -> Result<(ExposureConfig, ConfigSources)> {
        let mut layers = Vec::new();

        // Layer 1: User config
        if let Some(user_path) = Self::user_config_path()
            && user_path.exists()
        {
            layers.push((ConfigSource::User, Self::read_raw(&user_path)?));
        }

        // Layer 2: Project config
        let project_path = Self::project_config_path();
        if project_path.exists() {
            layers.push((ConfigSource::Project, Self::read_raw(&project_path)?));
        }

        Ok(Self::resolve(layers))
    }

    /// Merge layers in order, later layers winning, and finalize
    fn resolve(layers: Vec<(ConfigSource, RawExposureConfig)>) -> (ExposureConfig, ConfigSources) {
        let mut raw = RawExposureConfig::default();
        let mut sources = ConfigSources::default();
        for (source, layer) in layers {
            if layer.aggregation.enabled.is_some() {
                sources.aggregation_enabled = source;
            }
            if layer.output.format.is_some() {
                sources.output_format = source;
            }
            raw = Self::merge_raw(raw, layer);
        }
        (Self::finalize(raw), sources)
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "exposure").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Relocated by the EXPOSURE_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        match Self::project_config_override() {
            Some(dir) => dir.join("config.toml"),
            None => PathBuf::from(".exposure/config.toml"),
        }
    }

    /// Project config directory set through the environment, if any
    pub fn project_config_override() -> Option<PathBuf> {
        std::env::var_os(PROJECT_CONFIG_DIR_ENV).map(PathBuf::from)
    }

    fn read_raw(path: &Path) -> Result<RawExposureConfig> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawExposureConfig, overlay: RawExposureConfig) -> RawExposureConfig {
        RawExposureConfig {
            aggregation: RawAggregationConfig {
                enabled: overlay.aggregation.enabled.or(base.aggregation.enabled),
            },
            output: RawOutputConfig {
                format: overlay.output.format.or(base.output.format),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawExposureConfig) -> ExposureConfig {
        let defaults = ExposureConfig::default();
        ExposureConfig {
            aggregation: AggregationConfig {
                enabled: raw
                    .aggregation
                    .enabled
                    .unwrap_or(defaults.aggregation.enabled),
            },
            output: OutputConfig {
                format: raw.output.format.unwrap_or(defaults.output.format),
            },
        }
    }

    /// Load config from a specific path (for testing)
    #[cfg(test)]
    pub fn load_from_path(path: &Path) -> Result<ExposureConfig> {
        if path.exists() {
            Ok(Self::finalize(Self::read_raw(path)?))
        } else {
            Ok(ExposureConfig::default())
        }
    }
}
