//! Data-directory configuration, loaded from `osint.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::corpus::TextResolver;
use crate::search::fuzzy::DEFAULT_THRESHOLD;

pub const CONFIG_FILE: &str = "osint.toml";

/// Engine configuration. Every field has a default; a missing file means
/// all defaults. The `language` must stay stable for the lifetime of one
/// index directory, it decides the tokenizer on both sides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestConfig {
    /// Index directory, relative to the data dir.
    pub index_dir: String,
    /// Curated text payloads, preferred over the cache.
    pub text_store: String,
    /// Raw download cache, fallback.
    pub text_cache: String,
    /// Two-letter stemming language code; `None` = unstemmed.
    pub language: Option<String>,
    /// Default minimum fuzzy score for rerank survival.
    pub fuzzy_threshold: f32,
}

impl Default for QuestConfig {
    fn default() -> Self {
        Self {
            index_dir: "index".into(),
            text_store: "text_store".into(),
            text_cache: "text_cache".into(),
            language: None,
            fuzzy_threshold: DEFAULT_THRESHOLD,
        }
    }
}

impl QuestConfig {
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.is_file() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn index_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.index_dir)
    }

    /// Builds the curated-text handle for this data dir.
    pub fn resolver(&self, data_dir: &Path) -> TextResolver {
        TextResolver::new(
            data_dir.join(&self.text_store),
            data_dir.join(&self.text_cache),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let config = QuestConfig::load(dir.path()).unwrap();
        assert_eq!(config.index_dir, "index");
        assert_eq!(config.fuzzy_threshold, DEFAULT_THRESHOLD);
        assert!(config.language.is_none());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(CONFIG_FILE),
            "language = \"fr\"\nfuzzy_threshold = 55.0\n",
        )
        .unwrap();
        let config = QuestConfig::load(dir.path()).unwrap();
        assert_eq!(config.language.as_deref(), Some("fr"));
        assert_eq!(config.fuzzy_threshold, 55.0);
        assert_eq!(config.text_store, "text_store");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "language = [").unwrap();
        assert!(QuestConfig::load(dir.path()).is_err());
    }
}
