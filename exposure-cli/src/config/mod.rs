mod loader;
mod types;

pub use loader::{ConfigLoader, ConfigSources, PROJECT_CONFIG_DIR_ENV};
pub use types::{ExposureConfig, OutputFormat};
