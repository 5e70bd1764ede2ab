use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{ConfidenceThresholds, MatchingConfig, ScoreRanges};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub vector_store: VectorStoreSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VectorStoreSettings {
    pub url: String,
    pub api_key: Option<String>,
    pub collection: String,
    pub vector_name: Option<String>,
    pub timeout_secs: Option<u64>,
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_frq_weight")]
    pub frq_weight: f64,
    #[serde(default = "default_quant_weight")]
    pub quant_weight: f64,
    #[serde(default = "default_high_threshold")]
    pub high_threshold: f64,
    #[serde(default = "default_medium_threshold")]
    pub medium_threshold: f64,
    /// Answer ranges for q1..q3; each defaults to 1-10
    #[serde(default)]
    pub score_ranges: ScoreRanges,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            frq_weight: default_frq_weight(),
            quant_weight: default_quant_weight(),
            high_threshold: default_high_threshold(),
            medium_threshold: default_medium_threshold(),
            score_ranges: ScoreRanges::default(),
        }
    }
}

fn default_frq_weight() -> f64 { 0.7 }
fn default_quant_weight() -> f64 { 0.3 }
fn default_high_threshold() -> f64 { 0.8 }
fn default_medium_threshold() -> f64 { 0.6 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl MatchingSettings {
    /// Default matching config for runs that do not supply their own
    pub fn to_matching_config(&self) -> MatchingConfig {
        MatchingConfig {
            frq_weight: self.frq_weight,
            quant_weight: self.quant_weight,
            confidence_thresholds: ConfidenceThresholds {
                high: self.high_threshold,
                medium: self.medium_threshold,
            },
            score_ranges: self.score_ranges,
        }
    }
}

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with COHORT_)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., COHORT__SERVER__PORT -> server.port
            .add_source(environment())
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("COHORT")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}
