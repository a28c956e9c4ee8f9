//! Durable facetable inverted index over tantivy.
//!
//! Single writer during a build cycle, many readers once the writer has
//! committed. That discipline is a caller contract; the store itself does
//! not enforce it.

use std::path::{Path, PathBuf};

use anyhow::Result;
use tantivy::schema::{
    Field, IndexRecordOption, Schema, Term, TextFieldIndexing, TextOptions, STORED, STRING,
};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};
use tantivy::{doc, Index, IndexReader, IndexWriter};
use thiserror::Error;

use crate::encoder::IndexDocument;

/// Tokenizer name used when a stemming language is configured.
const STEM_TOKENIZER: &str = "stem";
const WRITER_BUDGET_BYTES: usize = 50_000_000;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("index unavailable at {path}")]
    Unavailable {
        path: PathBuf,
        #[source]
        source: tantivy::TantivyError,
    },
    #[error("cannot prepare index directory {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("index schema missing field '{0}'")]
    Schema(&'static str),
}

#[derive(Clone, Copy)]
pub struct Fields {
    pub id: Field,
    pub title: Field,
    pub description: Field,
    pub content: Field,
    pub text: Field,
    pub etype: Field,
    pub cats: Field,
    pub country: Field,
    pub filepath: Field,
    pub data: Field,
    pub payload: Field,
    pub url: Field,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct IndexStats {
    pub doc_count: u64,
    /// Opstamp of the last commit; stands in for a last-document id.
    pub last_opstamp: u64,
}

pub struct SearchIndex {
    pub index: Index,
    writer: IndexWriter,
    pub fields: Fields,
}

impl SearchIndex {
    /// Create-or-open, idempotent. `language` must match across the build
    /// and search sides of one index path.
    pub fn open_or_create(path: &Path, language: Option<&str>) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let stem = stemmer_for(language);
        let unavailable = |source| StoreError::Unavailable {
            path: path.to_path_buf(),
            source,
        };
        let index = if path.join("meta.json").exists() {
            Index::open_in_dir(path).map_err(unavailable)?
        } else {
            Index::create_in_dir(path, build_schema(stem.is_some())).map_err(unavailable)?
        };
        register_tokenizers(&index, stem);

        let writer = index.writer(WRITER_BUDGET_BYTES).map_err(unavailable)?;
        let fields = fields_from_schema(&index.schema())?;

        Ok(Self {
            index,
            writer,
            fields,
        })
    }

    /// Insert or atomically replace the document sharing `doc.id`.
    pub fn upsert(&mut self, doc: &IndexDocument) -> Result<()> {
        self.writer
            .delete_term(Term::from_field_text(self.fields.id, &doc.id));
        let mut d = doc! {
            self.fields.id => doc.id.clone(),
            self.fields.title => doc.title.clone(),
            self.fields.description => doc.description.clone(),
            self.fields.content => doc.content.clone(),
            self.fields.text => doc.text.clone(),
            self.fields.etype => doc.etype.clone(),
            self.fields.filepath => doc.filepath.clone(),
            self.fields.data => doc.data.clone(),
        };
        for cat in &doc.cats {
            d.add_text(self.fields.cats, cat);
        }
        if let Some(country) = &doc.country {
            d.add_text(self.fields.country, country);
        }
        for payload in &doc.payloads {
            d.add_text(self.fields.payload, payload);
        }
        for url in &doc.urls {
            d.add_text(self.fields.url, url);
        }
        self.writer.add_document(d)?;
        Ok(())
    }

    /// Flush to durable storage. Deletes and adds from [`upsert`] become
    /// visible to readers atomically here.
    pub fn commit(&mut self) -> Result<()> {
        self.writer.commit()?;
        Ok(())
    }

    pub fn reader(&self) -> Result<IndexReader> {
        Ok(self.index.reader()?)
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let doc_count = self.reader()?.searcher().num_docs();
        let last_opstamp = self.index.load_metas()?.opstamp;
        Ok(IndexStats {
            doc_count,
            last_opstamp,
        })
    }
}

/// Read-side stats for an already-built index.
pub fn read_stats(path: &Path) -> Result<IndexStats, StoreError> {
    let unavailable = |source| StoreError::Unavailable {
        path: path.to_path_buf(),
        source,
    };
    let index = Index::open_in_dir(path).map_err(unavailable)?;
    let doc_count = index
        .reader()
        .map(|r| r.searcher().num_docs())
        .map_err(unavailable)?;
    let last_opstamp = index.load_metas().map_err(unavailable)?.opstamp;
    Ok(IndexStats {
        doc_count,
        last_opstamp,
    })
}

pub fn build_schema(stemmed: bool) -> Schema {
    let mut schema_builder = Schema::builder();
    let indexing = TextFieldIndexing::default()
        .set_tokenizer(if stemmed { STEM_TOKENIZER } else { "default" })
        .set_index_option(IndexRecordOption::WithFreqsAndPositions);
    let body = TextOptions::default().set_indexing_options(indexing);
    let body_stored = body.clone().set_stored();
    schema_builder.add_text_field("id", STRING | STORED);
    schema_builder.add_text_field("title", body_stored.clone());
    schema_builder.add_text_field("description", body_stored.clone());
    schema_builder.add_text_field("content", body_stored);
    schema_builder.add_text_field("text", body);
    schema_builder.add_text_field("etype", STRING | STORED);
    schema_builder.add_text_field("cats", STRING | STORED);
    schema_builder.add_text_field("country", STRING | STORED);
    schema_builder.add_text_field("filepath", STORED);
    schema_builder.add_text_field("data", STORED);
    schema_builder.add_text_field("payload", STORED);
    schema_builder.add_text_field("url", STORED);
    schema_builder.build()
}

pub fn fields_from_schema(schema: &Schema) -> Result<Fields, StoreError> {
    let get = |name: &'static str| {
        schema
            .get_field(name)
            .map_err(|_| StoreError::Schema(name))
    };
    Ok(Fields {
        id: get("id")?,
        title: get("title")?,
        description: get("description")?,
        content: get("content")?,
        text: get("text")?,
        etype: get("etype")?,
        cats: get("cats")?,
        country: get("country")?,
        filepath: get("filepath")?,
        data: get("data")?,
        payload: get("payload")?,
        url: get("url")?,
    })
}

/// Registers the stemming analyzer when configured. Readers and writers
/// both go through here so query parsing tokenizes like indexing did.
pub fn register_tokenizers(index: &Index, stem: Option<Language>) {
    if let Some(language) = stem {
        let analyzer = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(Stemmer::new(language))
            .build();
        index.tokenizers().register(STEM_TOKENIZER, analyzer);
    }
}

/// Maps a two-letter language code to a stemmer language. Unknown codes
/// disable stemming with a warning.
pub fn stemmer_for(code: Option<&str>) -> Option<Language> {
    let code = code?.trim().to_ascii_lowercase();
    let language = match code.as_str() {
        "ar" => Language::Arabic,
        "da" => Language::Danish,
        "de" => Language::German,
        "el" => Language::Greek,
        "en" => Language::English,
        "es" => Language::Spanish,
        "fi" => Language::Finnish,
        "fr" => Language::French,
        "hu" => Language::Hungarian,
        "it" => Language::Italian,
        "nl" => Language::Dutch,
        "no" => Language::Norwegian,
        "pt" => Language::Portuguese,
        "ro" => Language::Romanian,
        "ru" => Language::Russian,
        "sv" => Language::Swedish,
        "ta" => Language::Tamil,
        "tr" => Language::Turkish,
        other => {
            tracing::warn!(language = other, "no stemmer for language, indexing unstemmed");
            return None;
        }
    };
    Some(language)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn doc(id: &str, title: &str) -> IndexDocument {
        IndexDocument {
            id: id.into(),
            title: title.into(),
            etype: "ident".into(),
            data: title.into(),
            ..IndexDocument::default()
        }
    }

    #[test]
    fn upsert_replaces_instead_of_duplicating() -> Result<()> {
        let dir = TempDir::new().unwrap();
        let mut index = SearchIndex::open_or_create(dir.path(), None)?;
        index.upsert(&doc("ident--alice", "Alice"))?;
        index.upsert(&doc("ident--bob", "Bob"))?;
        index.commit()?;
        assert_eq!(index.stats()?.doc_count, 2);

        // Same identifier, twice more: count must not move.
        index.upsert(&doc("ident--alice", "Alice"))?;
        index.commit()?;
        index.upsert(&doc("ident--alice", "Alice Example"))?;
        index.commit()?;
        let stats = index.stats()?;
        assert_eq!(stats.doc_count, 2);
        assert!(stats.last_opstamp > 0);
        Ok(())
    }

    #[test]
    fn open_is_idempotent_across_handles() -> Result<()> {
        let dir = TempDir::new().unwrap();
        {
            let mut index = SearchIndex::open_or_create(dir.path(), None)?;
            index.upsert(&doc("org--acme", "ACME"))?;
            index.commit()?;
        }
        let reopened = SearchIndex::open_or_create(dir.path(), None)?;
        assert_eq!(reopened.stats()?.doc_count, 1);
        assert_eq!(read_stats(dir.path())?.doc_count, 1);
        Ok(())
    }

    #[test]
    fn read_stats_reports_unavailable_for_missing_index() {
        let dir = TempDir::new().unwrap();
        let err = read_stats(&dir.path().join("nowhere")).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable { .. }));
    }
}
