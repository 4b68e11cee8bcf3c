//! Configuration loading
//!
//! Settings come from CLI flags and environment variables, with an optional
//! `.qna.toml` file as a fallback. The resolved `Config` is built once at
//! startup and passed into constructors; there is no global lookup.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::db::Database;

/// Find a config file by walking up the directory tree, then checking global config.
///
/// Search order:
/// 1. Current directory and parent directories (walking up to root)
/// 2. Global config at ~/.config/qna/
///
/// Returns the path if found, None otherwise.
fn find_config_file(filename: &str) -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let candidate = current.join(filename);
        if candidate.exists() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent.to_path_buf(),
            None => break,
        }
    }

    if let Some(config_dir) = dirs::config_dir() {
        let global_path = config_dir.join("qna").join(filename);
        if global_path.exists() {
            return Some(global_path);
        }
    }

    None
}

/// File-backed configuration (from .qna.toml)
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub server: ServerSection,
    #[serde(default)]
    pub database: DatabaseSection,
}

/// LLM configuration section
#[derive(Debug, Deserialize)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
}

/// Server configuration section
#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Database configuration section
#[derive(Debug, Default, Deserialize)]
pub struct DatabaseSection {
    pub path: Option<PathBuf>,
}

// Default value functions
fn default_model() -> String {
    "gemini-2.5-flash-preview-05-20".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
        }
    }
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

impl FileConfig {
    /// Load config from .qna.toml
    ///
    /// Search order:
    /// 1. Walk up directory tree from cwd looking for .qna.toml
    /// 2. Check ~/.config/qna/.qna.toml (global fallback)
    /// 3. Fall back to defaults
    pub fn load() -> Result<Self> {
        if let Some(config_path) = find_config_file(".qna.toml") {
            tracing::debug!("Loading config from: {}", config_path.display());
            return Self::load_from_path(&config_path);
        }

        tracing::debug!("No .qna.toml found, using defaults");
        Ok(Self::default())
    }

    /// Load from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: FileConfig = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Resolved runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key; query handling fails with 503 when absent
    pub gemini_api_key: Option<String>,
    /// Gemini model name
    pub model: String,
    /// Port to listen on
    pub port: u16,
    /// History database location
    pub database_path: PathBuf,
}

impl Config {
    /// Resolve CLI/env overrides on top of the optional file config
    pub fn resolve(
        api_key: Option<String>,
        model: Option<String>,
        port: Option<u16>,
        database_path: Option<PathBuf>,
    ) -> Result<Self> {
        let file = FileConfig::load()?;

        let database_path = match database_path.or(file.database.path) {
            Some(path) => path,
            None => Database::default_path()?,
        };

        Ok(Self {
            gemini_api_key: api_key.filter(|key| !key.is_empty()),
            model: model.unwrap_or(file.llm.model),
            port: port.unwrap_or(file.server.port),
            database_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_config_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.llm.model, default_model());
        assert!(config.database.path.is_none());
    }

    #[test]
    fn file_config_sections_parse() {
        let config: FileConfig = toml::from_str(
            r#"
            [llm]
            model = "gemini-other"

            [server]
            port = 9000

            [database]
            path = "/tmp/qna-test/history.db"
            "#,
        )
        .unwrap();

        assert_eq!(config.llm.model, "gemini-other");
        assert_eq!(config.server.port, 9000);
        assert_eq!(
            config.database.path,
            Some(PathBuf::from("/tmp/qna-test/history.db"))
        );
    }

    #[test]
    fn empty_api_key_counts_as_missing() {
        let config = Config::resolve(
            Some(String::new()),
            Some("gemini-test".to_string()),
            Some(9000),
            Some(PathBuf::from("/tmp/qna-test/history.db")),
        )
        .unwrap();

        assert!(config.gemini_api_key.is_none());
        assert_eq!(config.port, 9000);
    }
}
