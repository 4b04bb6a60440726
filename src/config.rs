//! # Configuration Management Module
//!
//! Questo modulo gestisce la configurazione dell'applicazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con i parametri della ricerca
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `target_size_kb`: Dimensione target del file in KB (default: 500.0)
//! - `min_frame_percent`: Percentuale minima di frame da conservare (1-100, default: 10)
//! - `workers`: Numero di worker paralleli (default: 4)
//!
//! I path di input/output non fanno parte della configurazione: vengono
//! passati al motore di compressione per ogni run.
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     target_size_kb: 300.0,
//!     workers: 8,
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for GIF compression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Target file size in KB
    pub target_size_kb: f64,
    /// Minimum percentage of original frames to keep (1-100)
    pub min_frame_percent: u32,
    /// Number of parallel workers
    pub workers: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_size_kb: 500.0,
            min_frame_percent: 10,
            workers: 4,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.target_size_kb.is_finite() || self.target_size_kb <= 0.0 {
            return Err(anyhow::anyhow!("Target size must be a positive number of KB"));
        }

        if self.min_frame_percent == 0 || self.min_frame_percent > 100 {
            return Err(anyhow::anyhow!("Minimum frame percentage must be between 1 and 100"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &PathBuf) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &PathBuf) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
