//! # GIF Compressor - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Creazione della configurazione e avvio del motore di compressione
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (input, output, target, min-frames, threads)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose)
//! 3. Valida che il file di input esista
//! 4. Risolve il numero di worker (0 = numero di core)
//! 5. Avvia `GifCompressor` e riporta l'esito
//!
//! Il processo esce con codice non-zero solo per condizioni fatali (input
//! mancante, gifsicle assente, baseline fallita). Un target non raggiunto è
//! un successo degradato: messaggio di avviso, exit code 0.
//!
//! ## Esempio di utilizzo:
//! ```bash
//! gif-compress big.gif small.gif --target 500 --min-frames 10 --threads 8
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

use gif_compressor::file_manager::FileManager;
use gif_compressor::{Config, GifCompressor};

#[derive(Parser)]
#[command(name = "gif-compress")]
#[command(about = "Compress an animated GIF to a target size, preserving colors and dimensions")]
struct Args {
    /// Input GIF file
    input: PathBuf,

    /// Output GIF file
    output: PathBuf,

    /// Target file size in KB
    #[arg(long, default_value_t = 500.0)]
    target: f64,

    /// Minimum percentage of the original frames to keep
    #[arg(long = "min-frames", default_value_t = 10)]
    min_frames: u32,

    /// Number of parallel workers (0 = number of CPU cores)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    if !args.input.exists() {
        return Err(anyhow::anyhow!(
            "Input file does not exist: {}",
            args.input.display()
        ));
    }

    if !FileManager::is_gif(&args.input) {
        warn!(
            "Input {} does not carry a .gif extension, trying anyway",
            args.input.display()
        );
    }

    // Create the output directory if needed
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
            info!("Created output directory: {}", parent.display());
        }
    }

    let workers = if args.threads == 0 {
        num_cpus::get()
    } else {
        args.threads
    };

    let config = Config {
        target_size_kb: args.target,
        min_frame_percent: args.min_frames,
        workers,
    };
    config.validate()?;

    info!(
        "Compressing '{}' into '{}' (target: {} KB, workers: {})",
        args.input.display(),
        args.output.display(),
        args.target,
        workers
    );

    let start_time = std::time::Instant::now();
    let engine = GifCompressor::new(config);
    let outcome = engine.run(&args.input, &args.output).await?;

    info!(
        "✅ Done in {:.1}s: {} -> {}",
        start_time.elapsed().as_secs_f64(),
        FileManager::format_kb(outcome.original_size_kb),
        FileManager::format_kb(outcome.final_size_kb)
    );

    if !outcome.target_met {
        warn!(
            "Target of {} KB was not reached; the best achievable result was kept",
            args.target
        );
    }

    Ok(())
}
