//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking della ricerca.
//!
//! ## Responsabilità:
//! - Progress bar con `indicatif` sul set di strategie
//! - Statistiche della ricerca (strategie provate/fallite, miglior risultato)
//! - Riepilogo finale
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:12] [=========>------------] 4/9 (44%) skip=5: 480.20 KB
//! ```

use crate::file_manager::FileManager;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress bar over the strategy set
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar for `total_strategies` candidates
    pub fn new(total_strategies: u64) -> Self {
        let bar = ProgressBar::new(total_strategies);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Record one completed strategy with a status message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Aggregate statistics of one search run
#[derive(Debug, Default)]
pub struct SearchStats {
    pub strategies_tried: usize,
    pub strategies_failed: usize,
    pub baseline_size_kb: f64,
    pub best_size_kb: f64,
}

impl SearchStats {
    pub fn new(baseline_size_kb: f64) -> Self {
        Self {
            baseline_size_kb,
            best_size_kb: baseline_size_kb,
            ..Default::default()
        }
    }

    pub fn record(&mut self, success: bool, size_kb: f64) {
        self.strategies_tried += 1;
        if success {
            if size_kb < self.best_size_kb {
                self.best_size_kb = size_kb;
            }
        } else {
            self.strategies_failed += 1;
        }
    }

    /// How much the winner improves on the baseline, as a percentage
    pub fn improvement_percent(&self) -> f64 {
        if self.baseline_size_kb > 0.0 {
            (self.baseline_size_kb - self.best_size_kb) / self.baseline_size_kb * 100.0
        } else {
            0.0
        }
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Tried: {} strategies | Failed: {} | Best: {} ({:.2}% below baseline)",
            self.strategies_tried,
            self.strategies_failed,
            FileManager::format_kb(self.best_size_kb),
            self.improvement_percent()
        )
    }
}
