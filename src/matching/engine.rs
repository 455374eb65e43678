// The match engine: per-run memoization around normalize -> embed -> argmax.
//
// Every distinct normalized key is embedded and matched at most once per
// run. The usual path resolves through the precomputed mapping built from
// the batch embedding pass; the fallback path (a key that never went
// through that pass) embeds on the fly against the catalog matrix already
// in memory. The catalog must therefore be fully embedded before the
// first `get_top_match` call — construction enforces that ordering.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

use crate::embedding::traits::TextEmbedder;
use crate::matching::catalog::Catalog;
use crate::matching::similarity;
use crate::text::compound::CompoundSplitter;
use crate::text::normalize::NormalizedKey;

/// The outcome of matching one occupation text. Code and title are absent
/// when the input was empty or the best similarity fell below the
/// threshold; the score itself is preserved either way, so "no confident
/// match" stays distinguishable from "no computation happened"
/// (`similarity.is_nan()` for the latter).
#[derive(Debug, Clone, PartialEq)]
pub struct MatchResult {
    pub matched_code: Option<String>,
    pub matched_title: Option<String>,
    pub similarity: f32,
}

impl MatchResult {
    /// The result for empty/missing input: nothing was computed.
    pub fn empty() -> Self {
        Self {
            matched_code: None,
            matched_title: None,
            similarity: f32::NAN,
        }
    }

    /// Whether a confident match was found.
    pub fn is_match(&self) -> bool {
        self.matched_code.is_some()
    }
}

/// Matches occupation texts against the catalog, memoizing per normalized
/// key. One instance per pipeline run; the memo cache is never invalidated
/// within a run.
pub struct Matcher {
    catalog: Catalog,
    embedder: Arc<dyn TextEmbedder>,
    splitter: Option<CompoundSplitter>,
    threshold: f32,
    /// Key -> (catalog index, similarity), from the batch embedding pass.
    precomputed: HashMap<String, (usize, f32)>,
    /// Per-run memo cache.
    cache: HashMap<String, MatchResult>,
}

impl Matcher {
    /// Build a matcher over a fully embedded catalog. Fails fast if any
    /// catalog entry is missing its embedding, because the fallback path
    /// depends on the matrix being in memory.
    pub fn new(
        catalog: Catalog,
        embedder: Arc<dyn TextEmbedder>,
        splitter: Option<CompoundSplitter>,
        threshold: f32,
    ) -> Result<Self> {
        if let Some(entry) = catalog.entries().iter().find(|e| e.embedding.is_empty()) {
            anyhow::bail!(
                "Catalog entry '{}' has no embedding; embed the catalog before matching",
                entry.canonical_title
            );
        }
        Ok(Self {
            catalog,
            embedder,
            splitter,
            threshold,
            precomputed: HashMap::new(),
            cache: HashMap::new(),
        })
    }

    /// Install the key -> best-match mapping produced by the batch
    /// embedding pass over the deduplicated occupation corpus.
    pub fn with_precomputed(mut self, mapping: HashMap<String, (usize, f32)>) -> Self {
        self.precomputed = mapping;
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Reduce a raw field to its lookup key: normalize, then optionally
    /// decompose. Catalog titles went through the identical steps.
    pub fn prepare_key(&self, raw: Option<&str>) -> NormalizedKey {
        let key = NormalizedKey::from_raw(raw);
        match (&self.splitter, key.as_str()) {
            (Some(splitter), Some(text)) => NormalizedKey::Text(splitter.split(text)),
            _ => key,
        }
    }

    /// Resolve the best catalog match for a raw occupation text.
    ///
    /// Resolution order: empty sentinel, memo cache, precomputed mapping,
    /// on-the-fly embedding. Every path writes the cache before returning,
    /// so each distinct key costs at most one embedding computation per run.
    pub async fn get_top_match(&mut self, raw: Option<&str>) -> Result<MatchResult> {
        let Some(key) = self.prepare_key(raw).as_str().map(str::to_string) else {
            return Ok(MatchResult::empty());
        };

        if let Some(cached) = self.cache.get(&key) {
            return Ok(cached.clone());
        }

        if let Some(&(index, score)) = self.precomputed.get(&key) {
            let result = self.thresholded(index, score);
            self.cache.insert(key, result.clone());
            return Ok(result);
        }

        // Fallback: a key the batch pass never saw. Embed it now against
        // the catalog matrix already in memory.
        debug!(key, "Key missing from precomputed mapping, embedding on the fly");
        let vectors = self
            .embedder
            .embed_batch(std::slice::from_ref(&key))
            .await
            .with_context(|| format!("Failed to embed occupation '{key}'"))?;
        let query = vectors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Embedder returned no vector for '{key}'"))?;

        let result = match similarity::best_match(&query, self.catalog.entries()) {
            Some((index, score)) => self.thresholded(index, score),
            None => MatchResult::empty(),
        };
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    /// Apply the inclusive threshold: at or above keeps code and title,
    /// below masks them but preserves the score verbatim.
    fn thresholded(&self, index: usize, score: f32) -> MatchResult {
        if score >= self.threshold {
            let entry = &self.catalog.entries()[index];
            MatchResult {
                matched_code: Some(entry.code.clone()),
                matched_title: Some(entry.canonical_title.clone()),
                similarity: score,
            }
        } else {
            MatchResult {
                matched_code: None,
                matched_title: None,
                similarity: score,
            }
        }
    }
}
