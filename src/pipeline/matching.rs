// The end-to-end matching run.
//
// Sequence: load catalog CSV -> normalize/split titles -> embed catalog
// (cache-aware) -> load occupation CSV -> normalize/split/dedupe the
// occupation texts -> embed the unique keys (cache-aware) -> precompute
// key -> best-match mapping -> annotate every row through the memoizing
// matcher -> write the augmented CSV.
//
// Ordering matters in one place: the catalog must be fully embedded
// before the matcher exists, because the matcher's fallback path (a key
// the batch pass never saw) matches against the in-memory catalog matrix.
// `Matcher::new` refuses an unembedded catalog for exactly this reason.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::data::clean;
use crate::data::table::Table;
use crate::embedding::store::EmbeddingStore;
use crate::embedding::traits::TextEmbedder;
use crate::matching::catalog::Catalog;
use crate::matching::engine::Matcher;
use crate::matching::similarity;
use crate::text::compound::CompoundSplitter;

/// Corpus id (and cache file stem) of the catalog embedding matrix.
pub const CATALOG_CORPUS: &str = "catalog";
/// Corpus id of the deduplicated occupation embedding matrix.
pub const OCCUPATIONS_CORPUS: &str = "occupations";

/// Occupation fields per input row the pipeline will process.
pub const MAX_OCCUPATION_COLUMNS: usize = 4;

/// How many weakest below-threshold keys the summary keeps as examples.
const WEAKEST_SAMPLE: usize = 10;

/// Everything a matching run needs to know about its files and columns.
pub struct MatchJob {
    pub catalog_path: PathBuf,
    pub input_path: PathBuf,
    pub output_path: PathBuf,
    /// Catalog column holding the classification code
    pub catalog_code_column: String,
    /// Catalog column holding the canonical title
    pub catalog_title_column: String,
    /// Input columns holding raw occupation text (at most four)
    pub occupation_columns: Vec<String>,
    /// Optional machine-readable run summary
    pub summary_json: Option<PathBuf>,
}

/// Counts and samples from one matching run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub rows: usize,
    pub catalog_entries: usize,
    pub occupation_columns: Vec<String>,
    pub unique_keys: usize,
    /// Processed cells with a confident match
    pub matched: usize,
    /// Processed cells whose best similarity fell below the threshold
    pub below_threshold: usize,
    /// Processed cells that were empty or the missing-value marker
    pub empty: usize,
    pub threshold: f32,
    /// The below-threshold keys with the lowest scores, worst first
    pub weakest_unmatched: Vec<(String, f32)>,
}

/// Run the matching pipeline end to end.
pub async fn run(
    job: &MatchJob,
    threshold: f32,
    splitter: Option<CompoundSplitter>,
    embedder: Arc<dyn TextEmbedder>,
    store: &EmbeddingStore,
) -> Result<RunSummary> {
    if job.occupation_columns.is_empty() {
        anyhow::bail!("No occupation columns configured");
    }
    if job.occupation_columns.len() > MAX_OCCUPATION_COLUMNS {
        anyhow::bail!(
            "At most {} occupation columns are supported, got {}",
            MAX_OCCUPATION_COLUMNS,
            job.occupation_columns.len()
        );
    }

    // --- Catalog ---
    let mut catalog_table = Table::read(&job.catalog_path)?;
    clean::clean_table(&mut catalog_table);
    let code_idx = require_column(&catalog_table, &job.catalog_code_column, "catalog")?;
    let title_idx = require_column(&catalog_table, &job.catalog_title_column, "catalog")?;

    let catalog_rows: Vec<(String, String)> = catalog_table
        .rows
        .iter()
        .map(|row| (row[code_idx].clone(), row[title_idx].clone()))
        .collect();
    let mut catalog = Catalog::from_rows(catalog_rows, splitter.as_ref())?;
    info!(entries = catalog.len(), "Catalog loaded");

    println!("Embedding catalog ({} titles)...", catalog.len());
    let catalog_matrix = store
        .load_or_embed(CATALOG_CORPUS, &catalog.processed_titles(), embedder.as_ref())
        .await?;
    catalog.attach_embeddings(catalog_matrix)?;

    // --- Occupations ---
    let mut input = Table::read(&job.input_path)?;
    let occupation_indexes: Vec<usize> = job
        .occupation_columns
        .iter()
        .map(|name| require_column(&input, name, "input"))
        .collect::<Result<_>>()?;
    info!(rows = input.len(), "Occupation input loaded");

    let catalog_entries = catalog.len();
    let matcher = Matcher::new(catalog, embedder.clone(), splitter, threshold)?;

    // Deduplicate, preserving first-seen order: the order fixes the row
    // layout of the persisted occupation matrix.
    let mut unique_keys: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for row in &input.rows {
        for &idx in &occupation_indexes {
            if let Some(key) = matcher.prepare_key(Some(&row[idx])).as_str() {
                if seen.insert(key.to_string()) {
                    unique_keys.push(key.to_string());
                }
            }
        }
    }
    info!(unique = unique_keys.len(), "Deduplicated occupation texts");

    // --- Batch embedding pass + precomputed mapping ---
    let mut mapping: HashMap<String, (usize, f32)> = HashMap::new();
    if !unique_keys.is_empty() {
        println!("Embedding occupations ({} unique)...", unique_keys.len());
        let query_matrix = store
            .load_or_embed(OCCUPATIONS_CORPUS, &unique_keys, embedder.as_ref())
            .await?;
        for (key, vector) in unique_keys.iter().zip(&query_matrix) {
            if let Some(hit) = similarity::best_match(vector, matcher.catalog().entries()) {
                mapping.insert(key.clone(), hit);
            }
        }
    }
    let mut matcher = matcher.with_precomputed(mapping);

    // --- Annotate rows ---
    println!("Matching {} rows...", input.len());
    let mut summary = RunSummary {
        rows: input.len(),
        catalog_entries,
        occupation_columns: job.occupation_columns.clone(),
        unique_keys: unique_keys.len(),
        matched: 0,
        below_threshold: 0,
        empty: 0,
        threshold,
        weakest_unmatched: Vec::new(),
    };
    let mut unmatched: HashMap<String, f32> = HashMap::new();

    for (column_name, &idx) in job.occupation_columns.iter().zip(&occupation_indexes) {
        let cells: Vec<String> = input.rows.iter().map(|row| row[idx].clone()).collect();

        let mut codes = Vec::with_capacity(cells.len());
        let mut titles = Vec::with_capacity(cells.len());
        let mut scores = Vec::with_capacity(cells.len());

        for cell in &cells {
            let key = matcher.prepare_key(Some(cell));
            let result = matcher.get_top_match(Some(cell)).await?;

            if result.is_match() {
                summary.matched += 1;
            } else if result.similarity.is_nan() {
                summary.empty += 1;
            } else {
                summary.below_threshold += 1;
                if let Some(key) = key.as_str() {
                    unmatched.entry(key.to_string()).or_insert(result.similarity);
                }
            }

            codes.push(result.matched_code.clone().unwrap_or_default());
            titles.push(result.matched_title.clone().unwrap_or_default());
            scores.push(if result.similarity.is_nan() {
                String::new()
            } else {
                format!("{:.4}", result.similarity)
            });
        }

        let prefix = column_prefix(column_name, job.occupation_columns.len());
        input.add_column(&format!("{prefix}matched_code"), codes)?;
        input.add_column(&format!("{prefix}matched_title"), titles)?;
        input.add_column(&format!("{prefix}similarity_score"), scores)?;
    }

    let mut weakest: Vec<(String, f32)> = unmatched.into_iter().collect();
    weakest.sort_by(|a, b| a.1.total_cmp(&b.1));
    weakest.truncate(WEAKEST_SAMPLE);
    summary.weakest_unmatched = weakest;

    // --- Output ---
    input.write(&job.output_path)?;
    info!(path = %job.output_path.display(), "Wrote matched output");

    if let Some(summary_path) = &job.summary_json {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(summary_path, json)
            .with_context(|| format!("Failed to write summary {}", summary_path.display()))?;
    }

    Ok(summary)
}

/// The header prefix for the appended match columns. With a single
/// occupation column the original unprefixed names are kept.
fn column_prefix(column_name: &str, column_count: usize) -> String {
    if column_count == 1 {
        String::new()
    } else {
        format!("{column_name}_")
    }
}

fn require_column(table: &Table, name: &str, what: &str) -> Result<usize> {
    table.column_index(name).ok_or_else(|| {
        anyhow::anyhow!(
            "The {} file has no column '{}' (found: {})",
            what,
            name,
            table.headers.join(", ")
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_column_keeps_unprefixed_names() {
        assert_eq!(column_prefix("occupation", 1), "");
    }

    #[test]
    fn multiple_columns_get_prefixes() {
        assert_eq!(column_prefix("occupation_2", 3), "occupation_2_");
    }
}
