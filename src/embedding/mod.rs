// Sentence embeddings — trait-based abstraction over the vector backend.
//
// The TextEmbedder trait defines the interface. SentenceEmbedder implements
// it with a local ONNX model; tests substitute a deterministic stub so the
// whole matching engine runs offline.

pub mod download;
pub mod onnx;
pub mod store;
pub mod traits;
