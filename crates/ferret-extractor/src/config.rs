//! Configuration for the extraction engines

use ferret_domain::IndicatorTypeTable;
use serde::{Deserialize, Serialize};

/// Configuration for the extraction engines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Additional attempts after a failed storage call
    pub max_retries: u32,

    /// Number of sources whose filter sets stay cached
    pub source_filter_cache_size: usize,

    /// Indicator kinds to search for and their database type ids
    pub indicator_types: IndicatorTypeTable,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.source_filter_cache_size == 0 {
            return Err("source_filter_cache_size must be greater than 0".to_string());
        }
        if self.indicator_types.is_empty() {
            return Err("indicator_types must name at least one kind".to_string());
        }
        if self.indicator_types.kinds().is_empty() {
            return Err("indicator_types names no supported indicator kind".to_string());
        }
        Ok(())
    }
}

impl Default for ExtractorConfig {
    /// Production defaults: 3 retries, 5 cached sources, every kind
    fn default() -> Self {
        Self {
            max_retries: 3,
            source_filter_cache_size: 5,
            indicator_types: IndicatorTypeTable::default(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
