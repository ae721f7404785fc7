//! Configuration for the pipeline server
//!
//! Loaded from a TOML file: a `[pipeline]` section identifying the pipeline
//! instance and an optional `[server]` section for the HTTP surface.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Top-level configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineConfig {
    pub pipeline: PipelineSection,
    #[serde(default)]
    pub server: ServerSection,
}

/// Pipeline identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PipelineSection {
    /// Pipeline identifier (must match [a-zA-Z0-9._-]+)
    pub id: String,
    /// Description of what this pipeline does
    pub description: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    /// Port the invoke endpoint listens on (default: 8080)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("Invalid pipeline ID format: {0}")]
    InvalidPipelineId(String),
}

impl PipelineConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: PipelineConfig = toml::from_str(&content)?;

        validate_pipeline_id(&config.pipeline.id)?;

        Ok(config)
    }

    /// Create a test configuration for unit testing
    #[cfg(test)]
    pub fn test_config() -> Self {
        let toml_content = r#"
[pipeline]
id = "test-pipeline"
description = "A test pipeline"

[server]
port = 9090
"#;
        toml::from_str(toml_content).expect("Test config should parse")
    }
}

/// Validate pipeline ID format.
fn validate_pipeline_id(pipeline_id: &str) -> Result<(), ConfigError> {
    let valid_chars = pipeline_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-');

    if pipeline_id.is_empty() || !valid_chars {
        return Err(ConfigError::InvalidPipelineId(format!(
            "Pipeline ID '{pipeline_id}' must match pattern [a-zA-Z0-9._-]+"
        )));
    }

    Ok(())
}
