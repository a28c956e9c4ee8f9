//! Search and retrieval engine for an OSINT entity catalog.
//!
//! Entities (orgs, idents, events, sources, relations, links, quotes) are
//! encoded into facet-tagged documents, upserted into a persistent tantivy
//! index, and queried with free text plus type/category/country filters.
//! An optional fuzzy pass re-scores the fetched page with blended
//! string-similarity metrics so typos and reordered words still match.

pub mod config;
pub mod corpus;
pub mod encoder;
pub mod hooks;
pub mod index;
pub mod model;
pub mod search;
pub mod service;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "oqs",
    version,
    about = "Faceted and fuzzy search over an OSINT entity catalog"
)]
pub struct Cli {
    /// Data directory holding osint.toml, the index, and the text stores
    #[arg(long, default_value = ".", global = true)]
    pub data_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build the search index from an entity dump
    Build {
        /// JSON entity dump produced by the build cycle
        corpus: PathBuf,
    },
    /// Search the index
    Search {
        /// Free-text query; empty matches everything the facets allow
        #[arg(default_value = "")]
        query: String,

        /// Entity types to accept, comma-separated
        #[arg(long)]
        types: Option<String>,

        /// Categories to accept, comma-separated
        #[arg(long)]
        cats: Option<String>,

        /// Country codes to accept, comma-separated
        #[arg(long)]
        countries: Option<String>,

        /// Maximum number of results
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Window start into the ranked matches
        #[arg(long, default_value_t = 0)]
        offset: usize,

        /// Re-score the page with blended string similarity
        #[arg(long)]
        fuzzy: bool,

        /// Minimum fuzzy score (0-100) for a result to survive
        #[arg(long)]
        threshold: Option<f32>,

        /// Base URL prepended to result links
        #[arg(long, default_value = "http://127.0.0.1:8000/")]
        home: String,

        /// Emit results as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },
    /// Print index statistics
    Stats,
    /// Generate shell completions to stdout
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}
