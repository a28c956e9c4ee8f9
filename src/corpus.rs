//! Corpus loading and curated-text resolution.
//!
//! The corpus is the JSON entity dump produced by one build cycle of the
//! upstream content model. The [`TextResolver`] is the explicit handle that
//! maps a linked-source name to its curated payload, preferring the curated
//! store over the raw download cache.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::model::types::{Entity, EntityKind};

/// Immutable set of entity records from one build cycle.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entities: Vec<Entity>,
}

impl Corpus {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("read corpus {}", path.display()))?;
        let entities: Vec<Entity> = serde_json::from_str(&raw)
            .with_context(|| format!("parse corpus {}", path.display()))?;
        Ok(Self { entities })
    }

    pub fn from_entities(entities: Vec<Entity>) -> Self {
        Self { entities }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(move |e| e.kind == kind)
    }

    /// Base names of identity entities, consulted by the encoder's
    /// org-vs-ident de-duplication rule.
    pub fn ident_names(&self) -> HashSet<String> {
        self.of_kind(EntityKind::Ident)
            .map(|e| e.name.clone())
            .collect()
    }

    /// Canonical URL declared on the source entity of that name, if any.
    pub fn source_url(&self, name: &str) -> Option<&str> {
        self.of_kind(EntityKind::Source)
            .find(|e| e.name == name)
            .and_then(|e| e.url.as_deref())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

/// Why a linked source contributed no text.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// No curated payload in either the store or the cache. Recoverable:
    /// the source contributes empty text.
    #[error("no curated text for source '{0}'")]
    Missing(String),
    /// A payload file exists but cannot be read as JSON. Recoverable,
    /// treated as empty, but worth a warning.
    #[error("unreadable payload for source '{name}'")]
    Malformed {
        name: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Resolves a linked-source name to its curated JSON payload.
///
/// Caller-constructed with explicit paths; no process-wide state. Lookup
/// order is store first (curated by the analyst), cache second (raw
/// download).
#[derive(Debug, Clone)]
pub struct TextResolver {
    store: PathBuf,
    cache: PathBuf,
}

impl TextResolver {
    pub fn new(store: PathBuf, cache: PathBuf) -> Self {
        Self { store, cache }
    }

    pub fn resolve(&self, name: &str) -> Result<serde_json::Value, ResolveError> {
        let path = self.locate(name).ok_or_else(|| ResolveError::Missing(name.into()))?;
        let raw =
            fs::read_to_string(&path).map_err(|_| ResolveError::Missing(name.into()))?;
        serde_json::from_str(&raw).map_err(|source| ResolveError::Malformed {
            name: name.into(),
            source,
        })
    }

    fn locate(&self, name: &str) -> Option<PathBuf> {
        let file = format!("{name}.json");
        let stored = self.store.join(&file);
        if stored.is_file() {
            return Some(stored);
        }
        let cached = self.cache.join(&file);
        cached.is_file().then_some(cached)
    }
}
