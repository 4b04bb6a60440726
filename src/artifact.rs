//! # Temporary Artifact Lifecycle Module
//!
//! Ogni risultato intermedio della ricerca è un file temporaneo. Questo
//! modulo lo incapsula in un handle di ownership esplicito:
//!
//! - Drop dell'handle = il file viene eliminato
//! - `persist()` consuma l'handle e promuove il file a output definitivo
//!
//! Di tutti gli artifact prodotti durante una run ne sopravvive esattamente
//! uno (il migliore); tutti gli altri vengono recuperati dal Drop lungo
//! qualsiasi percorso di uscita, cancellazione inclusa.

use crate::error::CompressError;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

/// Owned handle to an intermediate GIF artifact on disk.
///
/// The underlying file lives in the system temp namespace with a unique
/// name, so concurrent workers never collide. Dropping the handle removes
/// the file.
#[derive(Debug)]
pub struct TempArtifact {
    file: NamedTempFile,
}

impl TempArtifact {
    /// Create a new empty artifact in the temp namespace
    pub fn create() -> Result<Self, CompressError> {
        let file = NamedTempFile::with_suffix(".gif")?;
        Ok(Self { file })
    }

    /// Path of the artifact while it is alive
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Current size of the artifact in KB
    pub fn size_kb(&self) -> Result<f64, CompressError> {
        let metadata = std::fs::metadata(self.file.path())?;
        Ok(metadata.len() as f64 / 1024.0)
    }

    /// Promote the artifact to its final location, consuming the handle.
    ///
    /// Rename first; temp directories often live on a different filesystem
    /// than the destination, so fall back to copy-and-discard.
    pub fn persist(self, dest: &Path) -> Result<(), CompressError> {
        match self.file.persist(dest) {
            Ok(_) => Ok(()),
            Err(persist_error) => {
                debug!(
                    "Rename to {} failed ({}), copying instead",
                    dest.display(),
                    persist_error.error
                );
                std::fs::copy(persist_error.file.path(), dest)?;
                // persist_error.file is dropped here and cleans itself up
                Ok(())
            }
        }
    }
}
