// Copyright 2025 Perfdash Ingest Contributors
// SPDX-License-Identifier: Apache-2.0

//! Ingestion configuration.
//!
//! Configuration is read from TOML and layered under environment overrides
//! prefixed with `PERFDASH_INGEST`, e.g.
//! `PERFDASH_INGEST_LOGGING__LEVEL=debug`.
//!
//! ```toml
//! [logging]
//! level = "info"
//! json = false
//!
//! [[tests]]
//! name = "load_latency"
//! job = "ci-perf-load"
//! artifact_prefix = "APIResponsiveness"
//! kind = "responsiveness"
//! ```

use crate::dispatch::TestDescription;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "PERFDASH_INGEST";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// Two tests share a name
    #[error("Duplicate test description: {0}")]
    DuplicateTest(String),

    /// A required field is empty
    #[error("Empty {field} in test description {test:?}")]
    EmptyField {
        /// Name of the empty field.
        field: &'static str,
        /// Test the description belongs to.
        test: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Top-level ingestion configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Registered tests.
    pub tests: Vec<TestDescription>,
}

impl IngestConfig {
    /// Load from a TOML file, with process environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()).format(FileFormat::Toml))
            .add_source(env_source(None));
        Self::finish(builder.build()?)
    }

    /// Load from TOML text, with process environment overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        Self::from_sources(toml, None)
    }

    /// Load from TOML text, with overrides taken from `env` instead of the
    /// process environment when given.
    pub fn from_sources(toml: &str, env: Option<HashMap<String, String>>) -> Result<Self> {
        let builder = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .add_source(env_source(env));
        Self::finish(builder.build()?)
    }

    fn finish(config: Config) -> Result<Self> {
        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Check test descriptions for empty fields and duplicate names.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for test in &self.tests {
            if test.name.is_empty() {
                return Err(ConfigError::EmptyField {
                    field: "name",
                    test: test.name.clone(),
                });
            }
            if test.job.is_empty() {
                return Err(ConfigError::EmptyField {
                    field: "job",
                    test: test.name.clone(),
                });
            }
            if !seen.insert(test.name.as_str()) {
                return Err(ConfigError::DuplicateTest(test.name.clone()));
            }
        }
        Ok(())
    }
}

fn env_source(env: Option<HashMap<String, String>>) -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .source(env)
}
