//! # GIF Compressor Library
//!
//! Questo è il modulo principale della libreria che espone le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom
//! - `artifact`: Handle di ownership per i file temporanei
//! - `frames`: Probe metadati e estrazione sottoinsiemi di frame
//! - `gifsicle`: Capability dell'ottimizzatore esterno + adapter gifsicle
//! - `strategy`: Generazione delle strategie di sottocampionamento
//! - `search`: Stato condiviso e cancellazione cooperativa
//! - `worker`: Esecuzione di una singola strategia
//! - `compressor`: Orchestratore della ricerca parallela
//! - `progress`: Progress tracking e statistiche
//! - `platform`: Risoluzione cross-platform dei comandi esterni
//! - `file_manager`: Utilità sui file
//!
//! ## Utilizzo:
//! ```ignore
//! use gif_compressor::{Config, GifCompressor};
//!
//! let engine = GifCompressor::new(Config::default());
//! let outcome = engine.run(&input, &output).await?;
//! ```

pub mod artifact;
pub mod compressor;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod frames;
pub mod gifsicle;
pub mod platform;
pub mod progress;
pub mod search;
pub mod strategy;
pub mod worker;

pub use compressor::{CompressionOutcome, GifCompressor};
pub use config::Config;
pub use error::CompressError;
pub use gifsicle::{Gifsicle, RasterOptimizer};
pub use strategy::Strategy;
