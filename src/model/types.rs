//! Entity records produced by one build cycle of the upstream catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Entity kinds understood by the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Org,
    Ident,
    Event,
    Source,
    Relation,
    Link,
    Quote,
}

impl EntityKind {
    /// Prefix used in qualified names and document anchors.
    pub fn prefix(self) -> &'static str {
        match self {
            EntityKind::Org => "org",
            EntityKind::Ident => "ident",
            EntityKind::Event => "event",
            EntityKind::Source => "source",
            EntityKind::Relation => "relation",
            EntityKind::Link => "link",
            EntityKind::Quote => "quote",
        }
    }

    pub fn all() -> [EntityKind; 7] {
        [
            EntityKind::Org,
            EntityKind::Ident,
            EntityKind::Event,
            EntityKind::Source,
            EntityKind::Relation,
            EntityKind::Link,
            EntityKind::Quote,
        ]
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "org" => Ok(EntityKind::Org),
            "ident" => Ok(EntityKind::Ident),
            "event" => Ok(EntityKind::Event),
            "source" => Ok(EntityKind::Source),
            "relation" => Ok(EntityKind::Relation),
            "link" => Ok(EntityKind::Link),
            "quote" => Ok(EntityKind::Quote),
            other => Err(format!("unknown entity kind: {other}")),
        }
    }
}

/// One entity record as exported by the upstream content model.
///
/// Records are immutable from the engine's point of view; a build cycle
/// hands the full set over at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Base name, unique within a kind (e.g. `acme`, `john-doe`).
    pub name: String,
    pub kind: EntityKind,
    /// Human label; falls back to `name` for display.
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cats: Vec<String>,
    #[serde(default)]
    pub country: Option<String>,
    /// Free-text body blocks from the authoring document.
    #[serde(default)]
    pub content: Vec<String>,
    /// Names of linked source entities whose curated text gets indexed along.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Canonical URL, set on source-kind entities.
    #[serde(default)]
    pub url: Option<String>,
    /// Authoring document, used to build the result link path.
    #[serde(default)]
    pub docname: Option<String>,
}

impl Entity {
    /// Deterministic identifier, e.g. `ident--john-doe`. Upsert key for the
    /// index store.
    pub fn qualified_name(&self) -> String {
        format!("{}--{}", self.kind.prefix(), self.name)
    }

    pub fn display_title(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }

    /// Location reference for consumers rendering result links.
    pub fn filepath(&self) -> String {
        let doc = self.docname.as_deref().unwrap_or("index");
        format!("{doc}.html#{}", self.qualified_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_names_are_prefixed_and_stable() {
        let e = Entity {
            name: "acme".into(),
            kind: EntityKind::Org,
            label: Some("ACME Corp".into()),
            description: String::new(),
            cats: vec![],
            country: None,
            content: vec![],
            sources: vec![],
            url: None,
            docname: None,
        };
        assert_eq!(e.qualified_name(), "org--acme");
        assert_eq!(e.qualified_name(), e.qualified_name());
        assert_eq!(e.display_title(), "ACME Corp");
        assert_eq!(e.filepath(), "index.html#org--acme");
    }

    #[test]
    fn kind_round_trips_through_str() {
        for kind in EntityKind::all() {
            assert_eq!(kind.prefix().parse::<EntityKind>().unwrap(), kind);
        }
        assert!("sock-puppet".parse::<EntityKind>().is_err());
    }
}
