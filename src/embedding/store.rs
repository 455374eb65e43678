// Persistent on-disk cache of embedding matrices, one file per corpus.
//
// Embedding a few thousand catalog titles takes minutes on CPU; loading
// the persisted matrix takes milliseconds. The cache is purely an
// I/O-cost optimization: there is no versioning or checksum, and the
// store never detects that the underlying text corpus changed. Whoever
// edits the corpus is responsible for deleting the matching cache file
// (`berufmatch clear-cache`). This is a documented limitation, not a bug.
//
// File layout: 4-byte magic, u32 dimension, u32 row count, then
// rows * dimension little-endian f32 values. Files are written to a
// temporary sibling and renamed into place, so a crash mid-write never
// leaves a partial matrix behind.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use super::traits::TextEmbedder;

const MAGIC: &[u8; 4] = b"BMAT";
const HEADER_LEN: usize = 12;

/// Persisted embedding matrices keyed by corpus id, plus the batching
/// policy for computing matrices that are not cached yet.
pub struct EmbeddingStore {
    cache_dir: PathBuf,
    batch_size: usize,
}

impl EmbeddingStore {
    pub fn new(cache_dir: impl Into<PathBuf>, batch_size: usize) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            batch_size: batch_size.max(1),
        }
    }

    /// The cache file backing a corpus id.
    pub fn matrix_path(&self, corpus_id: &str) -> PathBuf {
        self.cache_dir.join(format!("{corpus_id}.emb"))
    }

    /// Return the matrix for `corpus_id`, loading it from disk when a
    /// cache file exists and computing + persisting it otherwise.
    ///
    /// On a cache hit the embedder is never invoked. On a miss, texts are
    /// embedded in sequential batches and the complete matrix is persisted
    /// atomically before returning — an embedding failure leaves no cache
    /// file behind.
    pub async fn load_or_embed(
        &self,
        corpus_id: &str,
        texts: &[String],
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<Vec<f32>>> {
        let path = self.matrix_path(corpus_id);

        if path.exists() {
            let matrix = read_matrix(&path)?;
            if matrix.len() != texts.len() {
                anyhow::bail!(
                    "Embedding cache {} holds {} rows but the corpus has {} entries.\n\
                     The corpus changed since the cache was written; run \
                     `berufmatch clear-cache` and retry.",
                    path.display(),
                    matrix.len(),
                    texts.len()
                );
            }
            info!(
                corpus = corpus_id,
                rows = matrix.len(),
                "Loaded embeddings from cache"
            );
            return Ok(matrix);
        }

        let matrix = self.embed_all(corpus_id, texts, embedder).await?;
        write_matrix(&path, &matrix)?;
        info!(
            corpus = corpus_id,
            rows = matrix.len(),
            path = %path.display(),
            "Computed and persisted embeddings"
        );
        Ok(matrix)
    }

    /// Embed every text in sequential batches with a progress bar.
    async fn embed_all(
        &self,
        corpus_id: &str,
        texts: &[String],
        embedder: &dyn TextEmbedder,
    ) -> Result<Vec<Vec<f32>>> {
        let pb = ProgressBar::new(texts.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("  Embedding [{bar:30}] {pos}/{len} ({eta})")
                .expect("valid template"),
        );

        let mut matrix: Vec<Vec<f32>> = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.batch_size) {
            let vectors = embedder
                .embed_batch(batch)
                .await
                .with_context(|| format!("Embedding batch failed for corpus '{corpus_id}'"))?;
            if vectors.len() != batch.len() {
                anyhow::bail!(
                    "Embedder returned {} vectors for a batch of {}",
                    vectors.len(),
                    batch.len()
                );
            }
            matrix.extend(vectors);
            pb.inc(batch.len() as u64);
        }
        pb.finish_and_clear();

        debug!(corpus = corpus_id, rows = matrix.len(), "Embedding done");
        Ok(matrix)
    }

    /// Delete every persisted matrix. Returns the number of files removed.
    pub fn clear(&self) -> Result<usize> {
        if !self.cache_dir.exists() {
            return Ok(0);
        }
        let mut removed = 0;
        for entry in fs::read_dir(&self.cache_dir)
            .with_context(|| format!("Failed to read cache dir {}", self.cache_dir.display()))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|e| e == "emb") {
                fs::remove_file(&path)
                    .with_context(|| format!("Failed to remove {}", path.display()))?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Read a persisted matrix. Any structural problem (bad magic, truncated
/// payload) is fatal — a half-readable cache must never silently produce
/// wrong matches.
pub fn read_matrix(path: &Path) -> Result<Vec<Vec<f32>>> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read embedding cache {}", path.display()))?;

    if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
        anyhow::bail!(
            "{} is not an embedding cache file (bad header)",
            path.display()
        );
    }

    let dim = u32::from_le_bytes(bytes[4..8].try_into().expect("4 bytes")) as usize;
    let rows = u32::from_le_bytes(bytes[8..12].try_into().expect("4 bytes")) as usize;
    let expected = HEADER_LEN + rows * dim * 4;
    if bytes.len() != expected {
        anyhow::bail!(
            "Embedding cache {} is truncated: expected {} bytes, found {}",
            path.display(),
            expected,
            bytes.len()
        );
    }

    // pod_collect_to_vec copies, which also fixes up alignment
    let flat: Vec<f32> = bytemuck::pod_collect_to_vec(&bytes[HEADER_LEN..]);
    Ok(flat.chunks(dim.max(1)).map(|row| row.to_vec()).collect())
}

/// Atomically persist a matrix: write to a `.tmp` sibling, then rename.
pub fn write_matrix(path: &Path, matrix: &[Vec<f32>]) -> Result<()> {
    let dim = matrix.first().map(Vec::len).unwrap_or(0);
    for (i, row) in matrix.iter().enumerate() {
        if row.len() != dim {
            anyhow::bail!(
                "Refusing to persist a ragged matrix: row {} has dim {}, expected {}",
                i,
                row.len(),
                dim
            );
        }
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create cache dir {}", parent.display()))?;
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + matrix.len() * dim * 4);
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&(dim as u32).to_le_bytes());
    bytes.extend_from_slice(&(matrix.len() as u32).to_le_bytes());
    for row in matrix {
        bytes.extend_from_slice(bytemuck::cast_slice(row.as_slice()));
    }

    let tmp = path.with_extension("emb.tmp");
    fs::write(&tmp, &bytes).with_context(|| format!("Failed to write {}", tmp.display()))?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", tmp.display()))?;
    Ok(())
}
