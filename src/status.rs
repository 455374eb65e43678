// System status display — model files, embedding cache files and ages.

use std::fs;

use anyhow::Result;
use chrono::{DateTime, Local};

use crate::config::Config;
use crate::embedding::download;

/// Display model and cache status to the terminal.
pub fn show(config: &Config) -> Result<()> {
    if download::model_files_present(&config.model_dir) {
        println!("Model: {} (present)", config.model_dir.display());
    } else {
        println!("Model: not downloaded");
        println!("  Run `berufmatch download-model` to fetch it.");
    }

    if !config.cache_dir.exists() {
        println!("Embedding cache: empty ({})", config.cache_dir.display());
        return Ok(());
    }

    let mut cache_files: Vec<_> = fs::read_dir(&config.cache_dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "emb"))
        .collect();
    cache_files.sort_by_key(|e| e.file_name());

    if cache_files.is_empty() {
        println!("Embedding cache: empty ({})", config.cache_dir.display());
    } else {
        println!("Embedding cache: {}", config.cache_dir.display());
        for entry in cache_files {
            let meta = entry.metadata()?;
            let written: String = meta
                .modified()
                .ok()
                .map(|t| {
                    let local: DateTime<Local> = t.into();
                    local.format("%Y-%m-%d %H:%M").to_string()
                })
                .unwrap_or_else(|| "unknown".to_string());
            println!(
                "  {} ({}, written {})",
                entry.file_name().to_string_lossy(),
                format_bytes(meta.len()),
                written
            );
        }
        println!("\nCache files are never invalidated automatically.");
        println!("If a corpus changed, run `berufmatch clear-cache`.");
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
