// Integration tests for the matching engine against the stub embedder:
// the worked example from the design discussion (Bäcker/Elektriker
// catalog), cache-hit accounting, and the persistent store.

mod common;

use std::sync::Arc;

use berufmatch::embedding::store::EmbeddingStore;
use berufmatch::matching::catalog::Catalog;
use berufmatch::matching::engine::Matcher;
use berufmatch::matching::similarity::cosine_similarity;

use common::StubEmbedder;

fn embedded_catalog() -> Catalog {
    let mut catalog = Catalog::from_rows(
        vec![
            ("12345".to_string(), "Bäcker".to_string()),
            ("67890".to_string(), "Elektriker".to_string()),
        ],
        None,
    )
    .unwrap();
    let matrix = catalog
        .processed_titles()
        .iter()
        .map(|t| StubEmbedder::vector_for(t))
        .collect();
    catalog.attach_embeddings(matrix).unwrap();
    catalog
}

#[test]
fn stub_space_behaves_like_an_embedding_space() {
    // Sanity-check the fixture itself: inflected forms are close,
    // unrelated words are far. The engine tests below rely on this.
    let baecker = StubEmbedder::vector_for("bäcker");
    let baeckerin = StubEmbedder::vector_for("bäckerin");
    let astronaut = StubEmbedder::vector_for("astronaut");

    assert!(cosine_similarity(&baecker, &baeckerin) >= 0.7);
    assert!(cosine_similarity(&baecker, &astronaut) < 0.3);
}

#[tokio::test]
async fn baeckerin_matches_the_baecker_entry() {
    let embedder = Arc::new(StubEmbedder::new());
    let mut matcher = Matcher::new(embedded_catalog(), embedder, None, 0.7).unwrap();

    let result = matcher.get_top_match(Some("bäckerin")).await.unwrap();

    assert_eq!(result.matched_code.as_deref(), Some("12345"));
    assert_eq!(result.matched_title.as_deref(), Some("Bäcker"));
    assert!(result.similarity >= 0.7, "got {}", result.similarity);
}

#[tokio::test]
async fn astronaut_gets_no_code_but_a_real_score() {
    let embedder = Arc::new(StubEmbedder::new());
    let mut matcher = Matcher::new(embedded_catalog(), embedder, None, 0.7).unwrap();

    let result = matcher.get_top_match(Some("astronaut")).await.unwrap();

    assert!(result.matched_code.is_none());
    assert!(result.matched_title.is_none());
    assert!(
        !result.similarity.is_nan() && result.similarity < 0.7,
        "no-match must still report the best similarity, got {}",
        result.similarity
    );
}

#[tokio::test]
async fn each_distinct_key_is_embedded_at_most_once() {
    let embedder = Arc::new(StubEmbedder::new());
    let mut matcher = Matcher::new(embedded_catalog(), embedder.clone(), None, 0.7).unwrap();

    for raw in [
        "Bäckerin",
        "bäckerin",
        " bäckerin ",
        "Astronaut",
        "astronaut",
        "Bäckerin",
    ] {
        matcher.get_top_match(Some(raw)).await.unwrap();
    }

    assert_eq!(
        embedder.texts_embedded(),
        2,
        "six lookups over two distinct keys must embed exactly two strings"
    );
}

#[tokio::test]
async fn store_cache_hit_never_touches_the_embedder() {
    let dir = tempfile::tempdir().unwrap();
    let store = EmbeddingStore::new(dir.path(), 2);
    let corpus: Vec<String> = ["bäcker", "elektriker", "maler"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    let first_embedder = StubEmbedder::new();
    let matrix = store
        .load_or_embed("catalog", &corpus, &first_embedder)
        .await
        .unwrap();
    assert_eq!(matrix.len(), 3);
    assert_eq!(first_embedder.texts_embedded(), 3);
    // batch_size 2 over 3 texts = 2 batches
    assert_eq!(first_embedder.calls(), 2);

    let second_embedder = StubEmbedder::new();
    let reloaded = store
        .load_or_embed("catalog", &corpus, &second_embedder)
        .await
        .unwrap();
    assert_eq!(
        second_embedder.calls(),
        0,
        "a cache hit must not invoke the embedding model"
    );

    // Round trip is bit-identical
    for (row, expect) in reloaded.iter().zip(&matrix) {
        for (a, b) in row.iter().zip(expect.iter()) {
            assert_eq!(a.to_bits(), b.to_bits());
        }
    }
}

#[tokio::test]
async fn changed_corpus_size_is_a_loud_error_not_a_silent_recompute() {
    let dir = tempfile::tempdir().unwrap();
    let store = EmbeddingStore::new(dir.path(), 8);
    let embedder = StubEmbedder::new();

    let corpus: Vec<String> = vec!["bäcker".to_string()];
    store
        .load_or_embed("catalog", &corpus, &embedder)
        .await
        .unwrap();

    let grown: Vec<String> = vec!["bäcker".to_string(), "maler".to_string()];
    let err = store
        .load_or_embed("catalog", &grown, &embedder)
        .await
        .unwrap_err();
    assert!(
        err.to_string().contains("clear-cache"),
        "error must point at the remedy, got: {err}"
    );
    assert_eq!(
        embedder.texts_embedded(),
        1,
        "the stale cache must not be recomputed behind the caller's back"
    );
}
