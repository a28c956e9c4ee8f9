//! Boolean/faceted query execution and relevance scoring.

use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use tantivy::collector::TopDocs;
use tantivy::query::{
    AllQuery, BooleanQuery, FuzzyTermQuery, Occur, Query, QueryParser, TermQuery,
};
use tantivy::schema::{IndexRecordOption, Term, Value};
use tantivy::{Index, IndexReader, TantivyDocument};

use crate::encoder::TITLE_BOOST;
use crate::index::{fields_from_schema, register_tokenizers, stemmer_for, Fields, StoreError};

/// Facet filters; an empty set is a wildcard. Matching is case-insensitive,
/// values are folded here.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub types: HashSet<String>,
    pub cats: HashSet<String>,
    pub countries: HashSet<String>,
}

impl SearchFilters {
    pub fn is_empty(&self) -> bool {
        self.types.is_empty() && self.cats.is_empty() && self.countries.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct SearchResult {
    pub rank: usize,
    pub id: String,
    /// Location reference for rendering a result link.
    pub filepath: String,
    pub title: String,
    pub description: String,
    pub etype: String,
    /// Categories joined with a comma.
    pub cats: String,
    pub country: String,
    /// Full stored text; fuzzy scoring and excerpting run over this.
    pub data: String,
    /// Raw JSON payloads of resolved sources.
    pub payloads: Vec<String>,
    pub urls: Vec<String>,
    /// Relevance percentage in [0,100], page-normalized.
    pub score: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuzzy_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub combined_score: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_match: Option<bool>,
}

pub struct SearchClient {
    reader: IndexReader,
    fields: Fields,
    index: Index,
}

impl SearchClient {
    /// Opens the index read-only. `language` must match the build side.
    pub fn open(index_path: &Path, language: Option<&str>) -> Result<Self, StoreError> {
        let unavailable = |source| StoreError::Unavailable {
            path: index_path.to_path_buf(),
            source,
        };
        let index = Index::open_in_dir(index_path).map_err(unavailable)?;
        register_tokenizers(&index, stemmer_for(language));
        let fields = fields_from_schema(&index.schema())?;
        let reader = index.reader().map_err(unavailable)?;
        Ok(Self {
            reader,
            fields,
            index,
        })
    }

    /// Executes one bounded search. Free text is OR-combined and parsed
    /// leniently; each non-empty facet ANDs an OR of its exact terms onto
    /// the chain. `offset` is a window start into the ranked matches.
    ///
    /// With `fuzzy_candidates`, every free-text token also contributes
    /// edit-distance term queries, so a misspelled query still fetches a
    /// page for the reranker to score.
    pub fn search(
        &self,
        free_text: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
        fuzzy_candidates: bool,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let searcher = self.reader.searcher();

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        if !free_text.trim().is_empty() {
            clauses.push((Occur::Must, self.text_query(free_text, fuzzy_candidates)));
        }
        for (field, values) in [
            (self.fields.etype, &filters.types),
            (self.fields.cats, &filters.cats),
            (self.fields.country, &filters.countries),
        ] {
            if values.is_empty() {
                continue;
            }
            let terms = values
                .iter()
                .map(|value| {
                    (
                        Occur::Should,
                        Box::new(TermQuery::new(
                            Term::from_field_text(field, &value.to_lowercase()),
                            IndexRecordOption::Basic,
                        )) as Box<dyn Query>,
                    )
                })
                .collect();
            clauses.push((Occur::Must, Box::new(BooleanQuery::new(terms))));
        }

        let q: Box<dyn Query> = if clauses.is_empty() {
            Box::new(AllQuery)
        } else if clauses.len() == 1 {
            clauses.pop().expect("one clause").1
        } else {
            Box::new(BooleanQuery::new(clauses))
        };

        let top_docs = searcher.search(&q, &TopDocs::with_limit(limit).and_offset(offset))?;
        let max_score = top_docs
            .iter()
            .map(|(score, _)| *score)
            .fold(0.0_f32, f32::max);

        let mut results = Vec::with_capacity(top_docs.len());
        for (rank, (score, addr)) in top_docs.into_iter().enumerate() {
            let doc: TantivyDocument = searcher.doc(addr)?;
            let first = |field| {
                doc.get_first(field)
                    .and_then(|v| v.as_str())
                    .unwrap_or("")
                    .to_string()
            };
            let all = |field| {
                doc.get_all(field)
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            };
            let relevance = if max_score > 0.0 {
                (score / max_score * 100.0).clamp(0.0, 100.0)
            } else {
                0.0
            };
            results.push(SearchResult {
                rank: rank + 1,
                id: first(self.fields.id),
                filepath: first(self.fields.filepath),
                title: first(self.fields.title),
                description: first(self.fields.description),
                etype: first(self.fields.etype),
                cats: all(self.fields.cats).join(","),
                country: first(self.fields.country),
                data: first(self.fields.data),
                payloads: all(self.fields.payload),
                urls: all(self.fields.url),
                score: relevance,
                fuzzy_score: None,
                combined_score: None,
                token_match: None,
            });
        }
        Ok(results)
    }

    /// Relevance query over the human-text fields, title boosted. A parse
    /// failure degrades to whatever terms the lenient parser extracted.
    fn text_query(&self, free_text: &str, fuzzy_candidates: bool) -> Box<dyn Query> {
        let text_fields = vec![
            self.fields.title,
            self.fields.description,
            self.fields.content,
            self.fields.text,
        ];
        let mut parser = QueryParser::for_index(&self.index, text_fields.clone());
        parser.set_field_boost(self.fields.title, TITLE_BOOST);
        let (parsed, errors) = parser.parse_query_lenient(free_text);
        for error in errors {
            tracing::warn!(query = free_text, %error, "lenient query parse");
        }
        if !fuzzy_candidates {
            return parsed;
        }

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = vec![(Occur::Should, parsed)];
        for token in free_text.split_whitespace() {
            let token = token
                .trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase();
            let distance = match token.chars().count() {
                0..=2 => continue,
                3..=4 => 1,
                _ => 2,
            };
            for field in &text_fields {
                let term = Term::from_field_text(*field, &token);
                clauses.push((
                    Occur::Should,
                    Box::new(FuzzyTermQuery::new(term, distance, true)),
                ));
            }
        }
        Box::new(BooleanQuery::new(clauses))
    }
}
