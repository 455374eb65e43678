use std::env;
use std::path::PathBuf;

use anyhow::Result;

/// Default minimum cosine similarity for a confident match. The boundary is
/// inclusive: a score exactly at the threshold counts as a match.
pub const DEFAULT_THRESHOLD: f32 = 0.7;

/// Default number of strings per embedding batch. Batching only affects
/// throughput and memory, never the resulting vectors.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. CLI flags
/// override these values where a corresponding flag exists.
pub struct Config {
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Directory holding the persisted embedding matrices
    pub cache_dir: PathBuf,
    /// Minimum similarity for a confident match (inclusive)
    pub threshold: f32,
    /// Strings per embedding batch
    pub batch_size: usize,
    /// Decompose compound occupation words before embedding
    pub split_compounds: bool,
    /// Restrict compound decomposition to noun segments
    pub nouns_only: bool,
    /// Drop dictionary-unknown segments from decomposed output
    pub mask_unknown: bool,
    /// Word-list file backing the compound splitter (required when
    /// split_compounds is on)
    pub dictionary_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the compound dictionary, which has
    /// no sensible built-in and must be pointed at a word list explicitly.
    pub fn load() -> Result<Self> {
        let threshold = match env::var("BERUFMATCH_THRESHOLD") {
            Ok(raw) => raw
                .parse::<f32>()
                .map_err(|_| anyhow::anyhow!("BERUFMATCH_THRESHOLD is not a number: {raw}"))?,
            Err(_) => DEFAULT_THRESHOLD,
        };

        let batch_size = match env::var("BERUFMATCH_BATCH_SIZE") {
            Ok(raw) => raw
                .parse::<usize>()
                .map_err(|_| anyhow::anyhow!("BERUFMATCH_BATCH_SIZE is not a number: {raw}"))?,
            Err(_) => DEFAULT_BATCH_SIZE,
        };

        let model_dir = env::var("BERUFMATCH_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| crate::embedding::download::default_model_dir());

        let cache_dir = env::var("BERUFMATCH_CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_cache_dir());

        Ok(Self {
            model_dir,
            cache_dir,
            threshold,
            batch_size,
            split_compounds: env_flag("BERUFMATCH_SPLIT_COMPOUNDS", false),
            nouns_only: env_flag("BERUFMATCH_NOUNS_ONLY", false),
            mask_unknown: env_flag("BERUFMATCH_MASK_UNKNOWN", true),
            dictionary_path: env::var("BERUFMATCH_DICT").map(PathBuf::from).ok(),
        })
    }

    /// Check that the embedding model files are on disk.
    /// Call this before any operation that needs the ONNX embedder.
    pub fn require_model(&self) -> Result<()> {
        if !crate::embedding::download::model_files_present(&self.model_dir) {
            anyhow::bail!(
                "Embedding model files not found in {}\n\
                 Run `berufmatch download-model` to download them.",
                self.model_dir.display()
            );
        }
        Ok(())
    }

    /// Check that a compound dictionary is configured when splitting is on.
    pub fn require_dictionary(&self) -> Result<&PathBuf> {
        self.dictionary_path.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "Compound splitting is enabled but no dictionary is configured.\n\
                 Set BERUFMATCH_DICT or pass --dictionary <word list file>."
            )
        })
    }
}

/// Returns the default directory for persisted embedding matrices.
/// Uses the platform data directory: ~/.local/share/berufmatch/cache/ on Linux.
pub fn default_cache_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("berufmatch")
        .join("cache")
}

/// Parse a boolean env flag. Accepts 1/true/yes and 0/false/no.
fn env_flag(name: &str, default: bool) -> bool {
    match env::var(name).as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_dir_is_under_berufmatch() {
        let dir = default_cache_dir();
        let path_str = dir.to_string_lossy();
        assert!(
            path_str.contains("berufmatch") && path_str.contains("cache"),
            "Expected path containing berufmatch/cache, got: {path_str}"
        );
    }

    #[test]
    fn env_flag_defaults_apply() {
        assert!(env_flag("BERUFMATCH_TEST_FLAG_UNSET", true));
        assert!(!env_flag("BERUFMATCH_TEST_FLAG_UNSET", false));
    }
}
