use std::collections::HashSet;
use std::path::Path;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;

use osint_quest_search::config::QuestConfig;
use osint_quest_search::corpus::Corpus;
use osint_quest_search::search::{SearchFilters, SearchResult};
use osint_quest_search::service::SearchService;
use osint_quest_search::{Cli, Commands};

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Commands::Build { corpus } => run_build(&cli.data_dir, &corpus),
        Commands::Search {
            query,
            types,
            cats,
            countries,
            limit,
            offset,
            fuzzy,
            threshold,
            home,
            json,
        } => {
            let filters = SearchFilters {
                types: parse_filter(types.as_deref()),
                cats: parse_filter(cats.as_deref()),
                countries: parse_filter(countries.as_deref()),
            };
            run_search(
                &cli.data_dir,
                &query,
                &filters,
                limit,
                offset,
                fuzzy,
                threshold,
                &home,
                json,
            )
        }
        Commands::Stats => run_stats(&cli.data_dir),
        Commands::Completions { shell } => {
            clap_complete::generate(
                shell,
                &mut Cli::command(),
                "oqs",
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Comma-separated CLI filter values, folded to lowercase.
fn parse_filter(raw: Option<&str>) -> HashSet<String> {
    raw.map(|s| {
        s.split(',')
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect()
    })
    .unwrap_or_default()
}

fn run_build(data_dir: &Path, corpus_path: &Path) -> Result<()> {
    let config = QuestConfig::load(data_dir)?;
    let corpus = Corpus::load(corpus_path)?;
    let resolver = config.resolver(data_dir);
    let mut service = SearchService::new(data_dir.to_path_buf(), config);
    let report = service.build_index(&corpus, &resolver)?;

    println!("Indexed {} documents", report.total_indexed());
    for (kind, count) in &report.indexed {
        println!("  {kind}: {count}");
    }
    if report.skipped > 0 {
        println!("  skipped: {}", report.skipped);
    }
    if report.failed > 0 {
        println!("  {}", format!("failed: {}", report.failed).red());
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_search(
    data_dir: &Path,
    query: &str,
    filters: &SearchFilters,
    limit: usize,
    offset: usize,
    fuzzy: bool,
    threshold: Option<f32>,
    home: &str,
    json: bool,
) -> Result<()> {
    let config = QuestConfig::load(data_dir)?;
    let service = SearchService::new(data_dir.to_path_buf(), config);
    let results = service.search(query, filters, limit, offset, fuzzy, threshold)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
        return Ok(());
    }

    println!("\n=== Results for: '{query}' ===");
    println!("Found {}\n", results.len());
    for result in &results {
        print_result(result, query, home);
    }
    Ok(())
}

fn print_result(result: &SearchResult, query: &str, home: &str) {
    println!(
        "[{}] {}",
        result.rank,
        result.title.bold()
    );
    println!("   URL: {home}{}", result.filepath);
    let mut score_line = format!("   Score: {:.0}%", result.score);
    if let (Some(fuzzy), Some(combined)) = (result.fuzzy_score, result.combined_score) {
        score_line += &format!(" | Fuzzy: {fuzzy:.1} | Combined: {combined:.1}");
    }
    println!("{score_line}");
    println!(
        "   Type: {} | Cats: {} | Country: {}",
        result.etype.cyan(),
        result.cats,
        result.country
    );
    let excerpt = excerpt(query, &result.data, 60);
    if !excerpt.is_empty() {
        println!("   Data: ...{excerpt}...");
    }
    println!();
}

/// Context window around each matched query word in the stored text.
fn excerpt(query: &str, data: &str, span: usize) -> String {
    let haystack: Vec<char> = data.chars().collect();
    let lower: String = data.to_lowercase();
    let lower_chars: Vec<char> = lower.chars().collect();
    let mut out = String::new();
    for word in query.split_whitespace() {
        let needle: Vec<char> = word.to_lowercase().chars().collect();
        if needle.is_empty() {
            continue;
        }
        let hit = lower_chars
            .windows(needle.len())
            .position(|window| window == needle.as_slice());
        if let Some(idx) = hit {
            let end = (idx + span).min(haystack.len());
            let start = idx.saturating_sub(span).min(end);
            if !out.is_empty() {
                out.push_str("...");
            }
            let slice: String = haystack[start..end].iter().collect();
            out.push_str(&slice.replace('\n', " "));
        }
    }
    out
}

fn run_stats(data_dir: &Path) -> Result<()> {
    let config = QuestConfig::load(data_dir)?;
    let service = SearchService::new(data_dir.to_path_buf(), config);
    let stats = service.stats()?;
    println!("Documents: {}", stats.doc_count);
    println!("Last opstamp: {}", stats.last_opstamp);
    Ok(())
}
