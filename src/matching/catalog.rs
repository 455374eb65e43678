// The classification catalog — the fixed reference set occupations are
// matched against. Loaded once per run, immutable thereafter.

use anyhow::Result;
use tracing::warn;

use crate::text::compound::CompoundSplitter;
use crate::text::normalize::NormalizedKey;

/// One catalog row: classification code, the canonical title as published,
/// and the processed title actually fed to the embedder. The embedding is
/// attached after the (cached) embedding pass.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub code: String,
    pub canonical_title: String,
    pub processed_title: String,
    pub embedding: Vec<f32>,
}

/// The full catalog. Entries keep their input order, which is also the
/// row order of the persisted embedding matrix.
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Build a catalog from (code, title) rows, deriving each processed
    /// title with the same normalization (and optional decomposition) that
    /// queries get. Rows with an empty or missing title are skipped with a
    /// warning — they could never be matched anyway.
    pub fn from_rows(
        rows: Vec<(String, String)>,
        splitter: Option<&CompoundSplitter>,
    ) -> Result<Self> {
        let mut entries = Vec::with_capacity(rows.len());
        for (code, title) in rows {
            let key = NormalizedKey::from_raw(Some(&title));
            let Some(normalized) = key.as_str() else {
                warn!(code, "Catalog row has an empty title, skipping");
                continue;
            };
            let processed_title = match splitter {
                Some(splitter) => splitter.split(normalized),
                None => normalized.to_string(),
            };
            entries.push(CatalogEntry {
                code,
                canonical_title: title,
                processed_title,
                embedding: Vec::new(),
            });
        }

        if entries.is_empty() {
            anyhow::bail!("Catalog is empty: no rows with a usable title");
        }

        Ok(Self { entries })
    }

    /// The processed titles in entry order — the embedding corpus.
    pub fn processed_titles(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.processed_title.clone())
            .collect()
    }

    /// Attach the embedding matrix computed (or cache-loaded) for
    /// `processed_titles()`. Row order must match entry order.
    pub fn attach_embeddings(&mut self, matrix: Vec<Vec<f32>>) -> Result<()> {
        if matrix.len() != self.entries.len() {
            anyhow::bail!(
                "Embedding matrix has {} rows but the catalog has {} entries",
                matrix.len(),
                self.entries.len()
            );
        }
        let dim = matrix.first().map(Vec::len).unwrap_or(0);
        for (entry, row) in self.entries.iter_mut().zip(matrix) {
            if row.len() != dim {
                anyhow::bail!(
                    "Inconsistent embedding dimension in catalog matrix: {} vs {}",
                    row.len(),
                    dim
                );
            }
            entry.embedding = row;
        }
        Ok(())
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_are_normalized_like_queries() {
        let catalog = Catalog::from_rows(
            vec![("12345".to_string(), "  Bäcker/in ".to_string())],
            None,
        )
        .unwrap();
        assert_eq!(catalog.get(0).unwrap().processed_title, "bäcker/in");
        assert_eq!(catalog.get(0).unwrap().canonical_title, "  Bäcker/in ");
    }

    #[test]
    fn empty_titles_are_skipped() {
        let catalog = Catalog::from_rows(
            vec![
                ("1".to_string(), "".to_string()),
                ("2".to_string(), "Elektriker".to_string()),
            ],
            None,
        )
        .unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get(0).unwrap().code, "2");
    }

    #[test]
    fn all_empty_catalog_is_an_error() {
        let result = Catalog::from_rows(vec![("1".to_string(), " ".to_string())], None);
        assert!(result.is_err());
    }

    #[test]
    fn attach_rejects_row_count_mismatch() {
        let mut catalog =
            Catalog::from_rows(vec![("1".to_string(), "Bäcker".to_string())], None).unwrap();
        let result = catalog.attach_embeddings(vec![vec![1.0], vec![2.0]]);
        assert!(result.is_err());
    }
}
