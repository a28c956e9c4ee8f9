//! Query execution and fuzzy re-ranking.

pub mod fuzzy;
pub mod query;

pub use fuzzy::DEFAULT_THRESHOLD;
pub use query::{SearchClient, SearchFilters, SearchResult};
