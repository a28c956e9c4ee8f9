//! Search service façade: drives the encoder over a corpus into the store,
//! runs queries through the planner and the optional fuzzy reranker.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::config::QuestConfig;
use crate::corpus::{Corpus, TextResolver};
use crate::encoder;
use crate::hooks::BuildHook;
use crate::index::{read_stats, IndexStats, SearchIndex};
use crate::search::{fuzzy, SearchClient, SearchFilters, SearchResult};

/// Per-kind outcome of one build cycle.
#[derive(Debug, Default, Clone, Serialize)]
pub struct BuildReport {
    /// Indexed document counts keyed by entity kind prefix.
    pub indexed: BTreeMap<String, usize>,
    pub skipped: usize,
    pub failed: usize,
}

impl BuildReport {
    pub fn total_indexed(&self) -> usize {
        self.indexed.values().sum()
    }
}

pub struct SearchService {
    data_dir: PathBuf,
    config: QuestConfig,
    hooks: Vec<Box<dyn BuildHook>>,
}

impl SearchService {
    pub fn new(data_dir: PathBuf, config: QuestConfig) -> Self {
        Self {
            data_dir,
            config,
            hooks: Vec::new(),
        }
    }

    /// Registers a build observer; invocation order is registration order.
    pub fn register_hook(&mut self, hook: Box<dyn BuildHook>) {
        self.hooks.push(hook);
    }

    /// Encodes every corpus entity and upserts it into the store. Per-entity
    /// failures are logged and counted, never abort the cycle. Writer is
    /// exclusive for the duration; do not search the same path concurrently.
    pub fn build_index(&mut self, corpus: &Corpus, resolver: &TextResolver) -> Result<BuildReport> {
        let index_path = self.config.index_path(&self.data_dir);
        let mut index = SearchIndex::open_or_create(&index_path, self.config.language.as_deref())
            .context("open index for build")?;

        let ident_names = corpus.ident_names();
        let mut report = BuildReport::default();

        for entity in corpus.iter() {
            match encoder::encode(entity, corpus, resolver, &ident_names) {
                Some(doc) => {
                    if let Err(error) = index.upsert(&doc) {
                        warn!(entity = %doc.id, %error, "upsert failed, skipping entity");
                        report.failed += 1;
                        continue;
                    }
                    *report
                        .indexed
                        .entry(entity.kind.prefix().to_string())
                        .or_default() += 1;
                    for hook in &mut self.hooks {
                        hook.entity_encoded(entity);
                    }
                }
                None => {
                    report.skipped += 1;
                    for hook in &mut self.hooks {
                        hook.entity_skipped(entity);
                    }
                }
            }
        }

        index.commit().context("commit index")?;

        for (kind, count) in &report.indexed {
            info!(kind, count, "indexed");
        }
        info!(
            total = report.total_indexed(),
            skipped = report.skipped,
            failed = report.failed,
            "build cycle done"
        );
        for hook in &mut self.hooks {
            hook.build_finished(&report);
        }
        Ok(report)
    }

    /// One bounded search. With `use_fuzzy` the planner over-fetches
    /// misspelling candidates and the reranker re-scores the page; without
    /// it the planner output passes through untouched.
    pub fn search(
        &self,
        free_text: &str,
        filters: &SearchFilters,
        limit: usize,
        offset: usize,
        use_fuzzy: bool,
        fuzzy_threshold: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let index_path = self.config.index_path(&self.data_dir);
        let client = SearchClient::open(&index_path, self.config.language.as_deref())?;
        let results = client.search(free_text, filters, limit, offset, use_fuzzy)?;
        if !use_fuzzy {
            return Ok(results);
        }
        let threshold = fuzzy_threshold.unwrap_or(self.config.fuzzy_threshold);
        Ok(fuzzy::rerank(results, free_text, threshold))
    }

    pub fn stats(&self) -> Result<IndexStats> {
        let index_path = self.config.index_path(&self.data_dir);
        Ok(read_stats(&index_path)?)
    }
}
