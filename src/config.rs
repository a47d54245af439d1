use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use validator::Validate;

use crate::models::{RankingWeights, TieBreak};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Settings {
    pub server: ServerSettings,
    #[serde(default)]
    #[validate(nested)]
    pub search: SearchSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SearchSettings {
    #[serde(default = "default_limit")]
    #[validate(range(min = 1))]
    pub default_limit: usize,
    #[serde(default = "default_max_limit")]
    #[validate(range(min = 1))]
    pub max_limit: usize,
    #[serde(default)]
    pub tie_break: TieBreak,
    #[serde(default = "default_highly_rated")]
    pub highly_rated_threshold: f64,
    #[serde(default)]
    pub weights: WeightsConfig,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            max_limit: default_max_limit(),
            tie_break: TieBreak::default(),
            highly_rated_threshold: default_highly_rated(),
            weights: WeightsConfig::default(),
        }
    }
}

fn default_limit() -> usize { 20 }
fn default_max_limit() -> usize { 100 }
fn default_highly_rated() -> f64 { 4.5 }

#[derive(Debug, Clone, Deserialize)]
pub struct WeightsConfig {
    #[serde(default = "default_specialty_weight")]
    pub specialty: f64,
    #[serde(default = "default_location_weight")]
    pub location: f64,
    #[serde(default = "default_name_weight")]
    pub name: f64,
    #[serde(default = "default_availability_weight")]
    pub availability: f64,
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            specialty: default_specialty_weight(),
            location: default_location_weight(),
            name: default_name_weight(),
            availability: default_availability_weight(),
        }
    }
}

impl From<&WeightsConfig> for RankingWeights {
    fn from(config: &WeightsConfig) -> Self {
        RankingWeights {
            specialty: config.specialty,
            location: config.location,
            name: config.name,
            availability: config.availability,
        }
    }
}

fn default_specialty_weight() -> f64 { 0.45 }
fn default_location_weight() -> f64 { 0.30 }
fn default_name_weight() -> f64 { 0.15 }
fn default_availability_weight() -> f64 { 0.10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_size")]
    pub l1_cache_size: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1_cache_size: default_cache_size(),
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_size() -> u64 { 1000 }
fn default_cache_ttl() -> u64 { 60 }

/// Seed data for the in-memory backend
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogSettings {
    pub seed_path: Option<String>,
}

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

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MEDMATCH__)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080_i64)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MEDMATCH__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("MEDMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("MEDMATCH")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Self>()?
            .validated()
    }

    /// Reject values the service cannot run with, such as a zero result limit
    pub fn validated(self) -> Result<Self, ConfigError> {
        self.validate()
            .map_err(|e| ConfigError::Message(format!("invalid settings: {}", e)))?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_default_weights() {
        let weights = WeightsConfig::default();
        assert_eq!(weights.specialty, 0.45);
        assert_eq!(weights.location, 0.30);
        assert_eq!(weights.name, 0.15);
        assert_eq!(weights.availability, 0.10);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "json");
    }

    #[test]
    fn test_parse_search_section() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                host = "127.0.0.1"
                port = 9000

                [search]
                tie_break = "original"
                max_limit = 50
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.search.tie_break, TieBreak::Original);
        assert_eq!(settings.search.max_limit, 50);
        assert_eq!(settings.search.default_limit, 20);
        assert_eq!(settings.cache.ttl_secs, 60);
        assert!(settings.catalog.seed_path.is_none());
        assert!(settings.validated().is_ok());
    }

    #[test]
    fn test_zero_max_limit_rejected() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                host = "127.0.0.1"
                port = 9000

                [search]
                max_limit = 0
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        let err = settings.validated().unwrap_err();
        assert!(matches!(err, ConfigError::Message(_)));
    }
}
