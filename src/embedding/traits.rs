// Text embedder trait — the swap-ready abstraction.
//
// One operation: an ordered batch of strings in, one fixed-length vector
// per string out. The matching engine never sees the model behind it,
// which is what makes the engine testable with stub embeddings.

use anyhow::Result;
use async_trait::async_trait;

/// Trait for converting text into fixed-length vectors. Implementations
/// must be deterministic for a fixed model: the same string always maps
/// to the same vector.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    /// The dimension every returned vector has.
    fn dimension(&self) -> usize;

    /// Embed a batch of texts, returning vectors in input order.
    /// An empty batch returns an empty matrix.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
