use crate::apply::{Applicator, ApplyOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use weft_parser::{ParseOptions, Parser};

pub const DEFAULT_CONFIG_NAME: &str = "weft.config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Engine configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Parser limits
    #[serde(default)]
    pub parse: ParseOptions,

    /// Mutation application behaviour
    #[serde(default)]
    pub apply: ApplyOptions,

    /// Path used to seed node ids
    #[serde(default = "default_document_path")]
    pub document_path: String,
}

fn default_document_path() -> String {
    "<anonymous>".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parse: ParseOptions::default(),
            apply: ApplyOptions::default(),
            document_path: default_document_path(),
        }
    }
}

impl EngineConfig {
    /// Load config from a directory, falling back to defaults when the
    /// directory has no config file
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
            path: config_path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Invalid {
            path: config_path,
            source,
        })
    }

    pub fn with_document_path(mut self, path: impl Into<String>) -> Self {
        self.document_path = path.into();
        self
    }

    pub fn parser(&self) -> Parser {
        Parser::new(self.parse.clone()).with_path(&self.document_path)
    }

    pub fn applicator(&self) -> Applicator {
        Applicator::new(self.parser(), self.apply.clone())
    }
}
