#![allow(dead_code)]

// Shared test fixtures: a deterministic, offline stand-in for the ONNX
// sentence embedder.
//
// The stub hashes character trigrams into a fixed-width histogram, so
// lexically close strings ("bäcker" / "bäckerin") land close in cosine
// space while unrelated strings ("astronaut") land far away. That is
// enough signal to exercise thresholding, caching, and the pipeline
// without any model on disk.

use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use berufmatch::embedding::traits::TextEmbedder;

pub const STUB_DIM: usize = 256;

pub struct StubEmbedder {
    /// Number of embed_batch invocations
    calls: AtomicUsize,
    /// Total strings embedded across all calls
    texts_embedded: AtomicUsize,
}

impl StubEmbedder {
    pub fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            texts_embedded: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn texts_embedded(&self) -> usize {
        self.texts_embedded.load(Ordering::SeqCst)
    }

    /// The vector the stub produces for a given text. Deterministic.
    pub fn vector_for(text: &str) -> Vec<f32> {
        let mut v = vec![0.0_f32; STUB_DIM];
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < 3 {
            v[(fnv1a(text.as_bytes()) as usize) % STUB_DIM] += 1.0;
            return v;
        }
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            v[(fnv1a(trigram.as_bytes()) as usize) % STUB_DIM] += 1.0;
        }
        v
    }
}

#[async_trait]
impl TextEmbedder for StubEmbedder {
    fn dimension(&self) -> usize {
        STUB_DIM
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.texts_embedded.fetch_add(texts.len(), Ordering::SeqCst);
        Ok(texts.iter().map(|t| Self::vector_for(t)).collect())
    }
}

/// FNV-1a, inlined so the stub stays deterministic across runs and
/// platforms (std's DefaultHasher makes no such promise).
fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
