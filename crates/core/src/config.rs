//! # Configuration Management
//!
//! Hierarchical configuration for the integrity gate, loaded from multiple
//! sources in order of precedence:
//!
//! 1. **Environment variables** (highest precedence, prefix `INTEGRITY_`)
//! 2. **Environment-specific TOML file** (e.g. `config/production.toml`)
//! 3. **Default TOML file** (`config/default.toml`, lowest precedence)
//!
//! ```rust
//! use integrity_core::Config;
//!
//! let config = Config::load().expect("failed to load configuration");
//! let theta = config.scoring.theta;
//! ```
//!
//! The environment is selected by the `APP_ENV` variable: `development`
//! (default), `testing`, or `production`.

use config::{ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::env;

/// Top-level configuration, grouped by subsystem.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub retrieval: RetrievalConfig,
    pub scoring: ScoringConfig,
    pub pipeline: PipelineConfig,
    pub cors: CorsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body size, in bytes.
    pub max_body_bytes: usize,
    /// Graceful shutdown grace period, in seconds.
    pub shutdown_grace_seconds: u64,
}

/// On-disk layout. All paths are relative to `working_root` unless absolute,
/// matching the persisted layout named in the external-interfaces design
/// (`events.jsonl`, `query_lineage.jsonl`, `vault/`, an opaque index dir).
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub working_root: String,
    pub events_file: String,
    pub lineage_file: String,
    pub vault_dir: String,
    pub index_dir: String,
}

impl StorageConfig {
    pub fn events_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.working_root).join(&self.events_file)
    }

    pub fn lineage_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.working_root).join(&self.lineage_file)
    }

    pub fn vault_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.working_root).join(&self.vault_dir)
    }

    pub fn index_path(&self) -> std::path::PathBuf {
        std::path::Path::new(&self.working_root).join(&self.index_dir)
    }
}

/// Retrieval adapter tuning: default result count, over-fetch factor, and
/// the query-augmentation boost factor `B`.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    pub default_k: usize,
    pub overfetch_factor: usize,
    pub boost_factor: usize,
}

/// Scoring thresholds and the trust/red-flag tables.
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringConfig {
    /// Θ: the per-signal quarantine threshold.
    pub theta: f64,
    /// Q: the minimum count of sub-threshold signals to trigger quarantine.
    pub quorum: usize,
    /// Known-good/known-bad source prefixes, longest-match wins.
    pub trust_table: HashMap<String, f64>,
    /// Red-flag keyword phrases grouped by semantic category.
    pub red_flag_categories: HashMap<String, Vec<String>>,
    /// Path to the golden corpus used by the semantic-drift scorer.
    pub golden_corpus_path: String,
    /// Reserved weights for a future weighted-scoring mode. Never read by
    /// the 2-of-4 aggregator.
    pub reserved_weights: SignalWeights,
}

/// Reserved, currently-unused per-signal weights.
#[derive(Debug, Deserialize, Clone)]
pub struct SignalWeights {
    pub trust: f64,
    pub red_flag: f64,
    pub anomaly: f64,
    pub semantic_drift: f64,
}

/// Pipeline-level behavior: deadlines and demonstration gates.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    pub deadline_seconds: u64,
    pub enable_unsafe_endpoint: bool,
    pub enable_demo_reset: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub allow_credentials: bool,
}

impl Config {
    /// Load configuration from `config/default.{toml,yaml}`, an
    /// environment-specific overlay, then environment variables
    /// (`INTEGRITY_SERVER_PORT`, etc.), and validate the result.
    pub fn load() -> Result<Self, ConfigError> {
        let environment = env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            .add_source(Environment::with_prefix("INTEGRITY").separator("__"));

        let built = builder.build()?;
        let mut loaded: Config = built.try_deserialize()?;
        loaded.validate(&environment)?;
        Ok(loaded)
    }

    /// Validate invariants that hold regardless of environment, then
    /// apply stricter production-only checks.
    fn validate(&mut self, environment: &str) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.scoring.theta) {
            return Err(ConfigError::Message(format!(
                "scoring.theta must be in [0,1] (got {})",
                self.scoring.theta
            )));
        }

        if self.scoring.quorum == 0 || self.scoring.quorum > 4 {
            return Err(ConfigError::Message(format!(
                "scoring.quorum must be in [1,4] (got {})",
                self.scoring.quorum
            )));
        }

        if self.pipeline.deadline_seconds < 30 {
            return Err(ConfigError::Message(
                "pipeline.deadline_seconds must be at least 30".to_string(),
            ));
        }

        if self.retrieval.overfetch_factor < 3 {
            return Err(ConfigError::Message(
                "retrieval.overfetch_factor must be at least 3 when excluding quarantined docs".to_string(),
            ));
        }

        if environment == "production" {
            self.validate_production_security()?;
        }

        Ok(())
    }

    /// Refuse to start in production with demonstration-only surfaces
    /// enabled or a wildcard CORS origin.
    fn validate_production_security(&self) -> Result<(), ConfigError> {
        if self.pipeline.enable_demo_reset {
            return Err(ConfigError::Message(
                "production deployment must not enable pipeline.enable_demo_reset".to_string(),
            ));
        }

        if self.cors.allowed_origins.iter().any(|o| o == "*") {
            return Err(ConfigError::Message(
                "production deployment must not use a wildcard CORS origin".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8080,
                max_body_bytes: 1_048_576,
                shutdown_grace_seconds: 10,
            },
            storage: StorageConfig {
                working_root: "./data".into(),
                events_file: "events.jsonl".into(),
                lineage_file: "query_lineage.jsonl".into(),
                vault_dir: "vault".into(),
                index_dir: "index".into(),
            },
            retrieval: RetrievalConfig {
                default_k: 5,
                overfetch_factor: 3,
                boost_factor: 3,
            },
            scoring: ScoringConfig {
                theta: 0.5,
                quorum: 2,
                trust_table: HashMap::new(),
                red_flag_categories: HashMap::new(),
                golden_corpus_path: "./data/golden".into(),
                reserved_weights: SignalWeights {
                    trust: 0.25,
                    red_flag: 0.35,
                    anomaly: 0.15,
                    semantic_drift: 0.25,
                },
            },
            pipeline: PipelineConfig {
                deadline_seconds: 30,
                enable_unsafe_endpoint: false,
                enable_demo_reset: false,
            },
            cors: CorsConfig {
                allowed_origins: vec!["http://localhost:3000".into()],
                allowed_methods: vec!["GET".into(), "POST".into()],
                allowed_headers: vec!["content-type".into()],
                allow_credentials: false,
            },
        }
    }

    #[test]
    fn rejects_theta_out_of_range() {
        let mut config = sample_config();
        config.scoring.theta = 1.5;
        assert!(config.validate("development").is_err());
    }

    #[test]
    fn rejects_short_deadline() {
        let mut config = sample_config();
        config.pipeline.deadline_seconds = 5;
        assert!(config.validate("development").is_err());
    }

    #[test]
    fn rejects_demo_reset_in_production() {
        let mut config = sample_config();
        config.pipeline.enable_demo_reset = true;
        assert!(config.validate("production").is_err());
    }

    #[test]
    fn rejects_wildcard_cors_in_production() {
        let mut config = sample_config();
        config.cors.allowed_origins = vec!["*".into()];
        assert!(config.validate("production").is_err());
    }

    #[test]
    fn accepts_defaults_in_development() {
        let mut config = sample_config();
        assert!(config.validate("development").is_ok());
    }
}
