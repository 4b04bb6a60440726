//! # Error Types Module
//!
//! Questo modulo definisce i tipi di errore custom dell'applicazione.
//!
//! ## Categorie di errori:
//! - `Io`: Errori di I/O (file non trovati, permessi, etc.)
//! - `Decode` / `Encode`: Errori di lettura/scrittura GIF
//! - `InputNotFound`: File di input inesistente
//! - `MissingDependency`: gifsicle non installato
//! - `ExternalTool`: gifsicle uscito con codice non-zero
//!
//! Il mancato raggiungimento della dimensione target NON è un errore:
//! viene riportato come esito degradato in `CompressionOutcome`.

/// Custom error types for GIF compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF decode error: {0}")]
    Decode(String),

    #[error("GIF encode error: {0}")]
    Encode(String),

    #[error("Input file not found: {0}")]
    InputNotFound(String),

    #[error("Dependency missing: {0}")]
    MissingDependency(String),

    #[error("External optimizer failed: {0}")]
    ExternalTool(String),
}
