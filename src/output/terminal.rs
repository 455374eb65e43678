// Colored terminal output for run summaries and encoding reports.
//
// This module handles all terminal-specific formatting. The main.rs
// command handlers delegate here.

use colored::Colorize;

use crate::data::clean::EncodingReport;
use crate::output::truncate_chars;
use crate::pipeline::matching::RunSummary;

/// Display the summary of a matching run.
pub fn display_run_summary(summary: &RunSummary) {
    println!("\n{}", "=== Matching Summary ===".bold());
    println!("  Rows processed:    {}", summary.rows);
    println!("  Catalog entries:   {}", summary.catalog_entries);
    println!(
        "  Occupation fields: {}",
        summary.occupation_columns.join(", ")
    );
    println!("  Unique texts:      {}", summary.unique_keys);
    println!();

    let processed = summary.matched + summary.below_threshold + summary.empty;
    println!(
        "  {} {} of {} cells",
        "Matched:".green().bold(),
        summary.matched,
        processed
    );
    println!(
        "  {} {} (best similarity under {:.2})",
        "Below threshold:".yellow(),
        summary.below_threshold,
        summary.threshold
    );
    println!("  {} {}", "Empty/missing:".dimmed(), summary.empty);

    if !summary.weakest_unmatched.is_empty() {
        println!("\n  {}", "Weakest unmatched texts:".dimmed());
        for (key, score) in &summary.weakest_unmatched {
            println!("    {:>6.4}  {}", score, truncate_chars(key, 40));
        }
    }
    println!();
}

/// Display an encoding diagnosis for a CSV file.
pub fn display_encoding_report(path: &str, report: &EncodingReport) {
    println!("\n{}", format!("=== Encoding Check: {path} ===").bold());
    println!("  Cells scanned:   {}", report.total_cells);
    println!("  With umlauts:    {}", report.umlaut_cells);
    println!("  With mojibake:   {}", report.mojibake_cells);

    if report.has_mojibake() {
        println!(
            "\n  {} The file contains UTF-8-as-Latin-1 artifacts (e.g. \"BÃ¤cker\").",
            "Warning:".yellow().bold()
        );
        println!("  Re-export the file as UTF-8 before matching.");
    } else if report.umlauts_missing() {
        println!(
            "\n  {} No umlauts found in any cell. For German occupation data",
            "Warning:".yellow().bold()
        );
        println!("  this usually means an earlier export destroyed them.");
    } else {
        println!("\n  {}", "Encoding looks sane.".green());
    }
    println!();
}
