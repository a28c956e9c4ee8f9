//! Fuzzy re-scoring over an already-fetched result page.
//!
//! Pure pass: never touches the index, cost is bounded by the page it is
//! given. Five similarity metrics blend into one score; results under the
//! caller's threshold drop out.

use std::collections::HashSet;

use itertools::Itertools;
use strsim::{jaro_winkler, normalized_levenshtein};

use crate::search::query::SearchResult;

pub const DEFAULT_THRESHOLD: f32 = 70.0;

const WEIGHT_WEIGHTED: f64 = 0.35;
const WEIGHT_TOKEN_SET: f64 = 0.25;
const WEIGHT_TOKEN_SORT: f64 = 0.15;
const WEIGHT_PARTIAL: f64 = 0.15;
const WEIGHT_JACCARD: f64 = 0.10;
const TOKEN_MATCH_BONUS: f64 = 10.0;

/// Breakdown of one result's fuzzy scoring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzyScore {
    pub token_set: f64,
    pub token_sort: f64,
    pub weighted: f64,
    pub partial: f64,
    pub jaccard: f64,
    /// Blended score in [0,100], token-match bonus applied and clamped.
    pub blended: f64,
    /// True iff every query token appears verbatim in the content.
    pub token_match: bool,
}

fn tokens(s: &str) -> Vec<String> {
    s.split_whitespace().map(str::to_lowercase).collect()
}

/// Best-match windows of `k` consecutive content tokens; the whole content
/// when it is shorter than the query.
fn windows<'a>(content: &'a [String], k: usize) -> Box<dyn Iterator<Item = &'a [String]> + 'a> {
    if content.len() <= k {
        Box::new(std::iter::once(content))
    } else {
        Box::new(content.windows(k))
    }
}

/// Overlap ratio over deduplicated tokens, order and duplication ignored:
/// each query token is matched against its closest content token.
pub fn token_set_similarity(query: &[String], content: &[String]) -> f64 {
    let q: HashSet<&String> = query.iter().collect();
    let c: HashSet<&String> = content.iter().collect();
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    let sum: f64 = q
        .iter()
        .map(|qt| {
            c.iter()
                .map(|ct| normalized_levenshtein(qt, ct))
                .fold(0.0, f64::max)
        })
        .sum();
    sum / q.len() as f64 * 100.0
}

/// Ratio after sorting both token sequences, best window wins.
pub fn token_sort_similarity(query: &[String], content: &[String]) -> f64 {
    if query.is_empty() || content.is_empty() {
        return 0.0;
    }
    let sorted_query = query.iter().sorted().join(" ");
    windows(content, query.len())
        .map(|w| normalized_levenshtein(&sorted_query, &w.iter().sorted().join(" ")))
        .fold(0.0, f64::max)
        * 100.0
}

/// General-purpose blend of edit distance and Jaro-Winkler over the best
/// content window.
pub fn weighted_similarity(query: &[String], content: &[String]) -> f64 {
    if query.is_empty() || content.is_empty() {
        return 0.0;
    }
    let joined_query = query.join(" ");
    windows(content, query.len())
        .map(|w| {
            let joined = w.join(" ");
            0.5 * normalized_levenshtein(&joined_query, &joined)
                + 0.5 * jaro_winkler(&joined_query, &joined)
        })
        .fold(0.0, f64::max)
        * 100.0
}

/// Best substring-match ratio: the query string against every equal-length
/// content slice starting at a token boundary.
pub fn partial_similarity(query: &[String], content: &[String]) -> f64 {
    if query.is_empty() || content.is_empty() {
        return 0.0;
    }
    let needle = query.join(" ");
    let haystack: Vec<char> = content.join(" ").chars().collect();
    let needle_len = needle.chars().count();

    let mut starts = vec![0usize];
    let mut offset = 0;
    for token in content {
        offset += token.chars().count() + 1;
        if offset < haystack.len() {
            starts.push(offset);
        }
    }

    starts
        .into_iter()
        .map(|start| {
            let end = (start + needle_len).min(haystack.len());
            let slice: String = haystack[start..end].iter().collect();
            normalized_levenshtein(&needle, &slice)
        })
        .fold(0.0, f64::max)
        * 100.0
}

/// |Q ∩ C| / |Q ∪ C| × 100 over deduplicated tokens; 0 if either is empty.
pub fn jaccard_similarity(query: &[String], content: &[String]) -> f64 {
    let q: HashSet<&String> = query.iter().collect();
    let c: HashSet<&String> = content.iter().collect();
    if q.is_empty() || c.is_empty() {
        return 0.0;
    }
    let intersection = q.intersection(&c).count() as f64;
    let union = q.union(&c).count() as f64;
    intersection / union * 100.0
}

/// Scores one lowercase query against one result's stored content.
pub fn score(query: &str, content: &str) -> FuzzyScore {
    let q = tokens(query);
    let c = tokens(content);

    let token_set = token_set_similarity(&q, &c);
    let token_sort = token_sort_similarity(&q, &c);
    let weighted = weighted_similarity(&q, &c);
    let partial = partial_similarity(&q, &c);
    let jaccard = jaccard_similarity(&q, &c);

    let content_set: HashSet<&String> = c.iter().collect();
    let token_match = !q.is_empty() && q.iter().all(|t| content_set.contains(t));

    let mut blended = WEIGHT_WEIGHTED * weighted
        + WEIGHT_TOKEN_SET * token_set
        + WEIGHT_TOKEN_SORT * token_sort
        + WEIGHT_PARTIAL * partial
        + WEIGHT_JACCARD * jaccard;
    if token_match {
        blended += TOKEN_MATCH_BONUS;
    }
    blended = blended.min(100.0);

    FuzzyScore {
        token_set,
        token_sort,
        weighted,
        partial,
        jaccard,
        blended,
        token_match,
    }
}

/// Re-scores a fetched page. Results scoring under `threshold` drop out;
/// survivors get `fuzzy_score`, `combined_score`, and `token_match` set and
/// are re-sorted by `(combined_score, token_match)` descending, token match
/// breaking ties.
pub fn rerank(results: Vec<SearchResult>, query: &str, threshold: f32) -> Vec<SearchResult> {
    let query = query.to_lowercase();
    let mut survivors: Vec<SearchResult> = results
        .into_iter()
        .filter_map(|mut result| {
            let scored = score(&query, &result.data.to_lowercase());
            if (scored.blended as f32) < threshold {
                return None;
            }
            // Weight of the fuzzy side grows with its own confidence.
            let fuzzy_weight = 0.3 + scored.blended / 100.0 * 0.2;
            let combined =
                f64::from(result.score) * (1.0 - fuzzy_weight) + scored.blended * fuzzy_weight;
            result.fuzzy_score = Some(scored.blended as f32);
            result.combined_score = Some(combined as f32);
            result.token_match = Some(scored.token_match);
            Some(result)
        })
        .collect();

    survivors.sort_by(|a, b| {
        b.combined_score
            .partial_cmp(&a.combined_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| b.token_match.cmp(&a.token_match))
    });
    for (rank, result) in survivors.iter_mut().enumerate() {
        result.rank = rank + 1;
    }
    survivors
}
