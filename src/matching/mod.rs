// Semantic matching — catalog, cosine similarity, and the match engine.

pub mod catalog;
pub mod engine;
pub mod similarity;
