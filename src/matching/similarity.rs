// Cosine similarity and brute-force nearest-entry search.
//
// The catalog is hundreds to low thousands of entries, so a dense linear
// scan per query is both the simplest and a sufficiently fast approach —
// no approximate index is warranted at this scale.

use crate::matching::catalog::CatalogEntry;

/// Cosine similarity between two vectors, in [-1, 1].
///
/// Returns 0.0 for mismatched or empty inputs — those are never a
/// confident match. Accumulates in f64 for stability.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f64;
    let mut norm_a = 0.0_f64;
    let mut norm_b = 0.0_f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        dot += x as f64 * y as f64;
        norm_a += x as f64 * x as f64;
        norm_b += y as f64 * y as f64;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    (dot / (norm_a.sqrt() * norm_b.sqrt())) as f32
}

/// Find the catalog entry most similar to the query vector.
///
/// Linear argmax over all entries; on an exact tie the lowest index wins
/// (first-seen max). Returns `None` only for an empty catalog slice.
pub fn best_match(query: &[f32], entries: &[CatalogEntry]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (index, entry) in entries.iter().enumerate() {
        let score = cosine_similarity(query, &entry.embedding);
        match best {
            // Strict > keeps the earlier index on ties
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((index, score)),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(embedding: Vec<f32>) -> CatalogEntry {
        CatalogEntry {
            code: "0".to_string(),
            canonical_title: String::new(),
            processed_title: String::new(),
            embedding,
        }
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = vec![0.3_f32, -0.4, 0.5];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = vec![1.0_f32, 0.0];
        let b = vec![0.0_f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let a = vec![1.0_f32, 2.0];
        let b = vec![-1.0_f32, -2.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let a = vec![0.0_f32, 0.0];
        let b = vec![1.0_f32, 1.0];
        assert_eq!(cosine_similarity(&a, &b), 0.0);
    }

    #[test]
    fn mismatched_dimensions_score_zero() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn best_match_picks_the_closest_entry() {
        let entries = vec![
            entry(vec![0.0, 1.0]),
            entry(vec![1.0, 0.0]),
            entry(vec![0.7, 0.7]),
        ];
        let (index, score) = best_match(&[1.0, 0.0], &entries).unwrap();
        assert_eq!(index, 1);
        assert!((score - 1.0).abs() < 1e-6);
    }

    #[test]
    fn ties_go_to_the_lowest_index() {
        let entries = vec![
            entry(vec![1.0, 0.0]),
            entry(vec![1.0, 0.0]),
            entry(vec![2.0, 0.0]), // same direction, same cosine
        ];
        let (index, _) = best_match(&[1.0, 0.0], &entries).unwrap();
        assert_eq!(index, 0, "first-seen max must win exact ties");
    }

    #[test]
    fn empty_catalog_has_no_match() {
        assert!(best_match(&[1.0, 0.0], &[]).is_none());
    }
}
