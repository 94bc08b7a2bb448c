//! Output formatting and styling module.
//!
//! All user-facing status lines go through here so the styling stays
//! consistent: classification decisions, moves, collision skips, cleanup and
//! undo actions, and the final summary.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

/// Manages all CLI output with consistent styling and formatting.
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use mediabot::output::OutputFormatter;
    /// OutputFormatter::success("Moved: a.mkv → Movies/a.mkv");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark, to stderr.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    /// Prints a regular message without styling.
    pub fn plain(message: &str) {
        println!("{}", message);
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Prints a preview-mode notice.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {}", message).yellow());
    }

    /// Creates a progress bar for a known number of steps.
    ///
    /// The bar hides itself when stderr is not a terminal.
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// Prints the per-destination move table after the scan.
    ///
    /// ```no_run
    /// use mediabot::output::OutputFormatter;
    /// OutputFormatter::summary_table(&[("Series", 3), ("Movies", 1)], 4, false);
    /// ```
    pub fn summary_table(rows: &[(&str, usize)], total: usize, preview: bool) {
        Self::header(if preview { "SUMMARY (preview)" } else { "SUMMARY" });

        let width = rows
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("Destination".len());

        println!(
            "{:<width$} | {}",
            "Destination".bold(),
            "Items".bold(),
            width = width
        );
        println!("{}", "-".repeat(width + 10));

        for (name, count) in rows {
            println!(
                "{:<width$} | {} {}",
                name,
                count.to_string().green(),
                item_word(*count),
                width = width
            );
        }

        println!("{}", "-".repeat(width + 10));
        println!(
            "{:<width$} | {} {}",
            "Total moved".bold(),
            total.to_string().green().bold(),
            item_word(total),
            width = width
        );
    }
}

fn item_word(count: usize) -> &'static str {
    if count == 1 { "item" } else { "items" }
}
