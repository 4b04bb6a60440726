//! # File Utilities Module
//!
//! Questo modulo raccoglie le operazioni sui file usate in tutta la pipeline.
//!
//! ## Responsabilità:
//! - Dimensione file in KB (l'unità della ricerca)
//! - Riconoscimento estensione GIF
//! - Formattazione human-readable delle dimensioni

use crate::error::CompressError;
use std::path::Path;

/// File operations shared across the pipeline
pub struct FileManager;

impl FileManager {
    /// Get the size of a file in KB
    pub fn file_size_kb(path: &Path) -> Result<f64, CompressError> {
        let metadata = std::fs::metadata(path)?;
        Ok(metadata.len() as f64 / 1024.0)
    }

    /// Check if a path carries a GIF extension
    pub fn is_gif(path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case("gif"))
            .unwrap_or(false)
    }

    /// Format a size in KB as a human-readable string
    pub fn format_kb(size_kb: f64) -> String {
        if size_kb >= 1024.0 {
            format!("{:.2} MB", size_kb / 1024.0)
        } else {
            format!("{:.2} KB", size_kb)
        }
    }
}
