use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;

use berufmatch::config::Config;
use berufmatch::data::clean;
use berufmatch::data::table::Table;
use berufmatch::embedding::onnx::SentenceEmbedder;
use berufmatch::embedding::store::EmbeddingStore;
use berufmatch::pipeline::matching::MatchJob;
use berufmatch::text::compound::{CompoundDictionary, CompoundSplitter};

/// Berufmatch: semantic occupation coding.
///
/// Maps free-text German occupation descriptions onto the entries of a
/// fixed classification catalog using sentence-embedding similarity.
#[derive(Parser)]
#[command(name = "berufmatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Match an occupation CSV against a classification catalog
    Match {
        /// Catalog CSV (one row per classification entry)
        #[arg(long)]
        catalog: PathBuf,

        /// Occupation input CSV
        #[arg(long)]
        input: PathBuf,

        /// Augmented output CSV
        #[arg(long)]
        output: PathBuf,

        /// Catalog column holding the classification code
        #[arg(long, default_value = "code")]
        catalog_code_col: String,

        /// Catalog column holding the canonical title
        #[arg(long, default_value = "title")]
        catalog_title_col: String,

        /// Input column holding occupation text (repeat for up to four)
        #[arg(long = "occupation-col", default_value = "occupation")]
        occupation_cols: Vec<String>,

        /// Minimum similarity for a confident match (inclusive)
        #[arg(long)]
        threshold: Option<f32>,

        /// Strings per embedding batch
        #[arg(long)]
        batch_size: Option<usize>,

        /// Decompose compound occupation words before embedding
        #[arg(long)]
        split_compounds: bool,

        /// Keep only noun segments when decomposing
        #[arg(long)]
        nouns_only: bool,

        /// Keep dictionary-unknown segments instead of dropping them
        #[arg(long)]
        keep_unknown: bool,

        /// Word-list file for the compound splitter
        #[arg(long)]
        dictionary: Option<PathBuf>,

        /// Also write a machine-readable run summary to this path
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Trim column names and string cells of a CSV
    Clean {
        /// Input CSV
        #[arg(long)]
        input: PathBuf,

        /// Cleaned output CSV
        #[arg(long)]
        output: PathBuf,
    },

    /// Check a CSV for umlaut presence and encoding damage
    Check {
        /// CSV file to scan
        #[arg(long)]
        input: PathBuf,
    },

    /// Download the ONNX sentence embedding model (~470 MB)
    DownloadModel,

    /// Show model and embedding-cache status
    Status,

    /// Delete all persisted embedding matrices
    ClearCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("berufmatch=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Match {
            catalog,
            input,
            output,
            catalog_code_col,
            catalog_title_col,
            occupation_cols,
            threshold,
            batch_size,
            split_compounds,
            nouns_only,
            keep_unknown,
            dictionary,
            summary_json,
        } => {
            let mut config = Config::load()?;
            if let Some(threshold) = threshold {
                config.threshold = threshold;
            }
            if let Some(batch_size) = batch_size {
                config.batch_size = batch_size;
            }
            config.split_compounds = config.split_compounds || split_compounds;
            config.nouns_only = config.nouns_only || nouns_only;
            if keep_unknown {
                config.mask_unknown = false;
            }
            if dictionary.is_some() {
                config.dictionary_path = dictionary;
            }
            config.require_model()?;

            let splitter = if config.split_compounds {
                let dict_path = config.require_dictionary()?;
                let dict = CompoundDictionary::load(dict_path)?;
                Some(CompoundSplitter::new(
                    dict,
                    config.nouns_only,
                    config.mask_unknown,
                ))
            } else {
                None
            };

            let embedder = Arc::new(SentenceEmbedder::load(&config.model_dir)?);
            let store = EmbeddingStore::new(config.cache_dir.clone(), config.batch_size);

            let job = MatchJob {
                catalog_path: catalog,
                input_path: input,
                output_path: output.clone(),
                catalog_code_column: catalog_code_col,
                catalog_title_column: catalog_title_col,
                occupation_columns: occupation_cols,
                summary_json,
            };

            let summary = berufmatch::pipeline::matching::run(
                &job,
                config.threshold,
                splitter,
                embedder,
                &store,
            )
            .await?;

            berufmatch::output::terminal::display_run_summary(&summary);
            println!("{}", format!("Output written to {}", output.display()).bold());
        }

        Commands::Clean { input, output } => {
            let mut table = Table::read(&input)?;
            clean::clean_table(&mut table);
            table.write(&output)?;
            println!(
                "Cleaned {} rows. Output written to {}",
                table.len(),
                output.display()
            );
        }

        Commands::Check { input } => {
            let table = Table::read(&input)?;
            let report = clean::diagnose(&table);
            berufmatch::output::terminal::display_encoding_report(
                &input.display().to_string(),
                &report,
            );
        }

        Commands::DownloadModel => {
            let config = Config::load()?;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", config.model_dir.display());

            berufmatch::embedding::download::download_model(&config.model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `berufmatch match`.");
        }

        Commands::Status => {
            let config = Config::load()?;
            berufmatch::status::show(&config)?;
        }

        Commands::ClearCache => {
            let config = Config::load()?;
            let store = EmbeddingStore::new(config.cache_dir.clone(), config.batch_size);
            let removed = store.clear()?;
            if removed == 0 {
                println!("Embedding cache is already empty.");
            } else {
                println!("Removed {removed} cached embedding matrices.");
            }
        }
    }

    Ok(())
}
