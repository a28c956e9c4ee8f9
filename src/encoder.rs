//! Turns one entity record into a facet-tagged indexable document.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::corpus::{Corpus, ResolveError, TextResolver};
use crate::model::types::{Entity, EntityKind};

/// Query-time boost applied to title matches relative to body text.
pub const TITLE_BOOST: f32 = 5.0;

/// Flat document shape handed to the index store. One per entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndexDocument {
    /// Qualified entity name; upsert key.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Content blocks joined with blank lines.
    pub content: String,
    /// Curated source text, indexed as ordinary free text.
    pub text: String,
    /// Facet terms, lowercase.
    pub etype: String,
    pub cats: Vec<String>,
    pub country: Option<String>,
    /// Stored-only slots for result assembly.
    pub filepath: String,
    pub data: String,
    pub payloads: Vec<String>,
    pub urls: Vec<String>,
}

/// Encodes `entity` into its indexable document.
///
/// Returns `None` when the de-duplication rule applies: an org whose base
/// name collides with an ident is the same real-world actor and is skipped.
/// Unresolvable or malformed source payloads are logged and contribute
/// nothing; encoding itself never fails.
pub fn encode(
    entity: &Entity,
    corpus: &Corpus,
    resolver: &TextResolver,
    ident_names: &HashSet<String>,
) -> Option<IndexDocument> {
    if entity.kind == EntityKind::Org && ident_names.contains(&entity.name) {
        debug!(
            entity = %entity.qualified_name(),
            "skipping org shadowed by ident of the same name"
        );
        return None;
    }

    let mut doc = IndexDocument {
        id: entity.qualified_name(),
        title: entity.display_title().to_string(),
        description: entity.description.clone(),
        content: entity.content.join("\n\n"),
        etype: entity.kind.prefix().to_string(),
        cats: entity
            .cats
            .iter()
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect(),
        country: entity.country.as_ref().map(|c| c.trim().to_lowercase()),
        filepath: entity.filepath(),
        ..IndexDocument::default()
    };

    let mut texts = Vec::new();
    for source in &entity.sources {
        match resolver.resolve(source) {
            Ok(payload) => {
                if let Some(text) = payload_text(&payload) {
                    texts.push(text);
                }
                if let Some(url) = payload["url"]
                    .as_str()
                    .or_else(|| corpus.source_url(source))
                {
                    doc.urls.push(url.to_string());
                }
                doc.payloads.push(payload.to_string());
            }
            Err(err @ ResolveError::Missing(_)) => {
                debug!(entity = %doc.id, source, "{err}");
            }
            Err(err @ ResolveError::Malformed { .. }) => {
                warn!(entity = %doc.id, source, "{err}");
            }
        }
    }
    doc.text = texts.join("\n\n");

    doc.data = [
        doc.title.as_str(),
        doc.description.as_str(),
        doc.content.as_str(),
        doc.text.as_str(),
    ]
    .iter()
    .filter(|s| !s.is_empty())
    .copied()
    .collect::<Vec<_>>()
    .join("\n");

    Some(doc)
}

/// Curated payloads minimally carry `text`; richer kinds add a `title`.
fn payload_text(payload: &serde_json::Value) -> Option<String> {
    let text = payload["text"].as_str()?;
    match payload["title"].as_str() {
        Some(title) if !title.is_empty() => Some(format!("{title}\n{text}")),
        _ => Some(text.to_string()),
    }
}
