// Berufmatch: semantic occupation coding against a classification catalog.
//
// This is the library root. Each module corresponds to a major subsystem
// of the matching pipeline.

pub mod config;
pub mod data;
pub mod embedding;
pub mod matching;
pub mod output;
pub mod pipeline;
pub mod status;
pub mod text;
