//! Aggregation configuration

use serde::{Deserialize, Serialize};

/// Configuration for personalization fact aggregation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationConfig {
    /// Whether automatic personalization aggregation runs at all (default: true)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
        }
    }
}

impl AggregationConfig {
    /// Configuration with aggregation switched off
    #[must_use]
    pub fn disabled() -> Self {
        Self { enabled: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        assert!(AggregationConfig::default().enabled);
        assert!(!AggregationConfig::disabled().enabled);
    }

    #[test]
    fn test_missing_field_uses_default() {
        let config: AggregationConfig = serde_json::from_str("{}").unwrap();
        assert!(config.enabled);
    }
}
