//! Configuration for the Extractor

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the Extractor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Model identifier passed to the completion service
    pub model: String,

    /// Sampling temperature (0.0-1.0)
    pub temperature: f64,

    /// Attempts per batch before falling back to empty records (>= 1)
    pub max_retries: u32,

    /// Notes per completion call (>= 1)
    pub batch_size: usize,

    /// Pause between consecutive batches (seconds, >= 0)
    pub rate_limit_delay_secs: f64,

    /// Output token budget per completion call
    pub max_output_tokens: u32,
}

impl ExtractorConfig {
    /// Get the inter-batch delay as a Duration
    pub fn rate_limit_delay(&self) -> Duration {
        Duration::from_secs_f64(self.rate_limit_delay_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model cannot be empty".to_string());
        }
        if !(0.0..=1.0).contains(&self.temperature) {
            return Err(format!(
                "temperature {} out of range [0.0, 1.0]",
                self.temperature
            ));
        }
        if self.max_retries == 0 {
            return Err("max_retries must be at least 1".to_string());
        }
        if self.batch_size == 0 {
            return Err("batch_size must be at least 1".to_string());
        }
        if !self.rate_limit_delay_secs.is_finite() || self.rate_limit_delay_secs < 0.0 {
            return Err("rate_limit_delay_secs must be a non-negative number".to_string());
        }
        if self.max_output_tokens == 0 {
            return Err("max_output_tokens must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    /// Defaults matching the hosted Fireworks deployment
    fn default() -> Self {
        Self {
            model: "accounts/fireworks/models/llama4-maverick-instruct-basic".to_string(),
            temperature: 0.0,
            max_retries: 3,
            batch_size: 5,
            rate_limit_delay_secs: 0.5,
            max_output_tokens: 4096,
        }
    }
}
