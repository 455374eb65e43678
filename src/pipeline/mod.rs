// Pipeline orchestration — wiring catalog, embeddings, and matching
// into the end-to-end CSV run.

pub mod matching;
