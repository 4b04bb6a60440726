//! # Compression Engine Main Orchestrator
//!
//! Orchestratore principale della ricerca: corto-circuiti economici prima,
//! poi la baseline, poi il fan-out parallelo delle strategie.
//!
//! ## Responsabilità:
//! - Copia verbatim quando l'input è già sotto il target
//! - Ottimizzazione baseline (nessun frame drop, nessun lossy)
//! - Pool di worker limitato da un semaforo, un task per strategia
//! - Consumo dei risultati in ordine di completamento, con stop anticipato
//!   al primo risultato che soddisfa il target
//! - Riduzione finale al candidato più piccolo, baseline inclusa
//! - Promozione del vincitore al path di output; ogni altro artifact viene
//!   recuperato dal proprio handle
//!
//! ## Nota sul non determinismo:
//! "il primo risultato adeguato vince e ferma la ricerca" è una gara: quale
//! strategia vincente venga scelta può variare tra run equivalenti. È una
//! scelta deliberata (risultato adeguato più veloce, non migliore
//! possibile) e i test ne tengono conto usando configurazioni
//! deterministiche.

use crate::artifact::TempArtifact;
use crate::config::Config;
use crate::error::CompressError;
use crate::file_manager::FileManager;
use crate::frames;
use crate::gifsicle::{Gifsicle, RasterOptimizer};
use crate::progress::{ProgressManager, SearchStats};
use crate::search::SearchState;
use crate::strategy::{self, Strategy};
use crate::worker::{self, StrategyResult};
use futures::stream::FuturesUnordered;
use futures::{FutureExt, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task;
use tracing::{debug, info, warn};

/// Final report of one compression run
#[derive(Debug, Clone, Copy)]
pub struct CompressionOutcome {
    pub original_size_kb: f64,
    pub final_size_kb: f64,
    /// False means degraded success: best effort saved, target not reached
    pub target_met: bool,
    /// The frame-drop strategy that produced the output, if any beat the
    /// baseline
    pub winning_strategy: Option<Strategy>,
}

/// Main compression engine
pub struct GifCompressor {
    config: Config,
    optimizer: Arc<dyn RasterOptimizer>,
}

impl GifCompressor {
    /// Create an engine backed by the gifsicle executable
    pub fn new(config: Config) -> Self {
        Self::with_optimizer(config, Arc::new(Gifsicle))
    }

    /// Create an engine with an injected optimizer capability
    pub fn with_optimizer(config: Config, optimizer: Arc<dyn RasterOptimizer>) -> Self {
        Self { config, optimizer }
    }

    /// Compress `input` into `output`, aiming for the configured target
    /// size. Never fails just because the target is out of reach: that is
    /// reported as `target_met: false` on the outcome.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<CompressionOutcome, CompressError> {
        if !input.exists() {
            return Err(CompressError::InputNotFound(input.display().to_string()));
        }

        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let target_kb = self.config.target_size_kb;
        let original_size = FileManager::file_size_kb(input)?;
        info!("Original size: {}", FileManager::format_kb(original_size));

        // Already small enough: byte-identical copy, no decoding, no tools
        if original_size <= target_kb {
            info!("Input is already at or under the target, copying verbatim");
            tokio::fs::copy(input, output).await?;
            return Ok(CompressionOutcome {
                original_size_kb: original_size,
                final_size_kb: original_size,
                target_met: true,
                winning_strategy: None,
            });
        }

        self.optimizer.check_available().await?;

        // Baseline: full optimization without dropping anything. Failure
        // here is fatal: there is nothing to fall back to.
        let baseline = TempArtifact::create()?;
        let baseline_size = self
            .optimizer
            .optimize(input, baseline.path(), None)
            .await?;
        info!("Baseline optimization: {}", FileManager::format_kb(baseline_size));

        if baseline_size <= target_kb {
            baseline.persist(output)?;
            info!("Baseline already meets the target");
            return Ok(CompressionOutcome {
                original_size_kb: original_size,
                final_size_kb: baseline_size,
                target_met: true,
                winning_strategy: None,
            });
        }

        let metadata = {
            let path = input.to_path_buf();
            task::spawn_blocking(move || frames::probe(&path))
                .await
                .map_err(|e| CompressError::Decode(format!("probe task failed: {e}")))??
        };
        info!("Original frame count: {}", metadata.frame_count);

        let strategies = strategy::generate(metadata.frame_count, self.config.min_frame_percent);
        let worker_count = self.config.workers.min(strategies.len()).max(1);
        info!(
            "🔧 Trying {} strategies with {} parallel workers",
            strategies.len(),
            worker_count
        );

        let progress = ProgressManager::new(strategies.len() as u64);
        let search = Arc::new(SearchState::new());
        search.update_best(baseline_size);
        let semaphore = Arc::new(Semaphore::new(worker_count));
        let input_path = Arc::new(input.to_path_buf());

        let mut in_flight: FuturesUnordered<task::JoinHandle<StrategyResult>> =
            FuturesUnordered::new();

        for candidate in strategies {
            let semaphore = Arc::clone(&semaphore);
            let optimizer = Arc::clone(&self.optimizer);
            let search = Arc::clone(&search);
            let input_path = Arc::clone(&input_path);

            in_flight.push(tokio::spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => return StrategyResult::failed(candidate),
                };
                worker::run_strategy(
                    &input_path,
                    candidate,
                    target_kb,
                    optimizer.as_ref(),
                    &search,
                )
                .await
            }));
        }

        let mut stats = SearchStats::new(baseline_size);
        let mut best_size = baseline_size;
        let mut best_artifact = baseline;
        let mut winning_strategy: Option<Strategy> = None;

        // Results arrive in completion order, not submission order
        while let Some(joined) = in_flight.next().await {
            let result = match joined {
                Ok(result) => result,
                Err(e) => {
                    warn!("Strategy task failed to run: {e}");
                    continue;
                }
            };

            stats.record(result.success, result.size_kb);
            progress.update(&describe(&result));

            let Some(artifact) = result.artifact else {
                continue;
            };

            if result.size_kb < best_size {
                best_size = result.size_kb;
                best_artifact = artifact;
                winning_strategy = Some(result.strategy);
            }

            if result.size_kb <= target_kb {
                info!(
                    "Target met by skip={} at {}, stopping the search",
                    result.strategy.skip,
                    FileManager::format_kb(result.size_kb)
                );
                search.mark_found();
                break;
            }
        }

        // Fold in whatever had already completed when the search stopped
        while let Some(Some(joined)) = in_flight.next().now_or_never() {
            let Ok(result) = joined else { continue };
            stats.record(result.success, result.size_kb);
            if let Some(artifact) = result.artifact {
                if result.size_kb < best_size {
                    best_size = result.size_kb;
                    best_artifact = artifact;
                    winning_strategy = Some(result.strategy);
                }
            }
        }

        // Abandoned workers observe the found flag at their next check and
        // their artifacts are reclaimed when the detached tasks finish
        drop(in_flight);

        progress.finish(&stats.format_summary());

        best_artifact.persist(output)?;
        let final_size = FileManager::file_size_kb(output)?;

        match winning_strategy {
            Some(s) => debug!("Winner: skip={} delay={}ms", s.skip, s.delay_ms),
            None => debug!("No strategy beat the baseline"),
        }

        let target_met = final_size <= target_kb;
        if !target_met {
            warn!(
                "Could not reach the {} target; best achievable was {} (saved anyway)",
                FileManager::format_kb(target_kb),
                FileManager::format_kb(final_size)
            );
            warn!("Allowing fewer colors or a smaller canvas would compress further");
        }

        Ok(CompressionOutcome {
            original_size_kb: original_size,
            final_size_kb: final_size,
            target_met,
            winning_strategy,
        })
    }
}

fn describe(result: &StrategyResult) -> String {
    if result.success {
        format!(
            "skip={}: {}",
            result.strategy.skip,
            FileManager::format_kb(result.size_kb)
        )
    } else {
        format!("skip={}: failed", result.strategy.skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::BoxFuture;
    use image::codecs::gif::{GifEncoder, Repeat};
    use image::{Delay, Frame, Rgba, RgbaImage};
    use std::fs::File;
    use std::io::BufWriter;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    fn write_noisy_gif(path: &Path, frame_count: usize, size: u32) {
        let file = File::create(path).unwrap();
        let mut encoder = GifEncoder::new_with_speed(BufWriter::new(file), 10);
        encoder.set_repeat(Repeat::Infinite).unwrap();

        let frames = (0..frame_count).map(|i| {
            let buffer = RgbaImage::from_fn(size, size, |x, y| {
                Rgba([
                    ((x * 13 + i as u32 * 29) % 256) as u8,
                    ((y * 7 + i as u32 * 19) % 256) as u8,
                    ((x + y * 3 + i as u32 * 5) % 256) as u8,
                    255,
                ])
            });
            Frame::from_parts(buffer, 0, 0, Delay::from_numer_denom_ms(50, 1))
        });
        encoder.encode_frames(frames).unwrap();
    }

    /// Scripted optimizer: fixed size for lossless calls, fixed size for
    /// lossy calls, optional hard failure
    struct ScriptedOptimizer {
        available: bool,
        lossless_kb: Option<f64>,
        lossy_kb: Option<f64>,
        calls: AtomicUsize,
    }

    impl ScriptedOptimizer {
        fn sized(lossless_kb: f64, lossy_kb: f64) -> Self {
            Self {
                available: true,
                lossless_kb: Some(lossless_kb),
                lossy_kb: Some(lossy_kb),
                calls: AtomicUsize::new(0),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                lossless_kb: None,
                lossy_kb: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn broken() -> Self {
            Self {
                available: true,
                lossless_kb: None,
                lossy_kb: None,
                calls: AtomicUsize::new(0),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl RasterOptimizer for ScriptedOptimizer {
        fn check_available(&self) -> BoxFuture<'_, Result<(), CompressError>> {
            Box::pin(async {
                if self.available {
                    Ok(())
                } else {
                    Err(CompressError::MissingDependency("gifsicle".to_string()))
                }
            })
        }

        fn optimize<'a>(
            &'a self,
            _input: &'a Path,
            output: &'a Path,
            lossy: Option<u32>,
        ) -> BoxFuture<'a, Result<f64, CompressError>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                let size_kb = match lossy {
                    None => self.lossless_kb,
                    Some(_) => self.lossy_kb,
                }
                .ok_or_else(|| CompressError::ExternalTool("simulated failure".to_string()))?;
                std::fs::write(output, vec![0u8; (size_kb * 1024.0) as usize])?;
                Ok(size_kb)
            })
        }
    }

    fn config(target_kb: f64) -> Config {
        Config {
            target_size_kb: target_kb,
            min_frame_percent: 10,
            workers: 2,
        }
    }

    #[tokio::test]
    async fn test_small_input_is_copied_verbatim() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("out/output.gif");
        let payload = vec![42u8; 300 * 1024];
        std::fs::write(&input, &payload).unwrap();

        let optimizer = Arc::new(ScriptedOptimizer::sized(1.0, 1.0));
        let engine = GifCompressor::with_optimizer(config(500.0), optimizer.clone());

        let outcome = engine.run(&input, &output).await.unwrap();

        assert!(outcome.target_met);
        assert!(outcome.winning_strategy.is_none());
        assert_eq!(outcome.final_size_kb, 300.0);
        // Byte-identical, and no optimizer invocation at all
        assert_eq!(std::fs::read(&output).unwrap(), payload);
        assert_eq!(optimizer.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_input_is_fatal() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("nope.gif");
        let output = temp_dir.path().join("output.gif");

        let engine = GifCompressor::with_optimizer(
            config(500.0),
            Arc::new(ScriptedOptimizer::sized(1.0, 1.0)),
        );

        let err = engine.run(&input, &output).await.unwrap_err();
        assert!(matches!(err, CompressError::InputNotFound(_)));
    }

    #[tokio::test]
    async fn test_baseline_meeting_target_skips_the_search() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("output.gif");
        // Oversized input, content never decoded on this path
        std::fs::write(&input, vec![0u8; 700 * 1024]).unwrap();

        let optimizer = Arc::new(ScriptedOptimizer::sized(400.0, 1.0));
        let engine = GifCompressor::with_optimizer(config(500.0), optimizer.clone());

        let outcome = engine.run(&input, &output).await.unwrap();

        assert!(outcome.target_met);
        assert!(outcome.winning_strategy.is_none());
        assert_eq!(outcome.final_size_kb, 400.0);
        // Exactly the baseline call
        assert_eq!(optimizer.call_count(), 1);
    }

    #[tokio::test]
    async fn test_search_meets_target_through_lossy_strategy() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("output.gif");
        write_noisy_gif(&input, 12, 64);

        // Baseline and per-strategy lossless both miss a 1 KB target;
        // the first lossy level lands well under it
        let optimizer = Arc::new(ScriptedOptimizer::sized(20.0, 0.5));
        let engine = GifCompressor::with_optimizer(config(1.0), optimizer);

        let outcome = engine.run(&input, &output).await.unwrap();

        assert!(outcome.target_met);
        assert!(outcome.winning_strategy.is_some());
        assert_eq!(outcome.final_size_kb, 0.5);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_unreachable_target_degrades_to_baseline() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("output.gif");
        write_noisy_gif(&input, 12, 64);

        // Every candidate comes out exactly as large as the baseline, so
        // nothing beats it and the run completes degraded
        let optimizer = Arc::new(ScriptedOptimizer::sized(20.0, 20.0));
        let engine = GifCompressor::with_optimizer(config(1.0), optimizer);

        let outcome = engine.run(&input, &output).await.unwrap();

        assert!(!outcome.target_met);
        assert!(outcome.winning_strategy.is_none());
        assert_eq!(outcome.final_size_kb, 20.0);
        assert!(output.exists());
    }

    #[tokio::test]
    async fn test_missing_optimizer_aborts_before_any_work() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("output.gif");
        std::fs::write(&input, vec![0u8; 700 * 1024]).unwrap();

        let engine = GifCompressor::with_optimizer(
            config(500.0),
            Arc::new(ScriptedOptimizer::unavailable()),
        );

        let err = engine.run(&input, &output).await.unwrap_err();
        assert!(matches!(err, CompressError::MissingDependency(_)));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_broken_optimizer_fails_the_baseline_loudly() {
        let temp_dir = TempDir::new().unwrap();
        let input = temp_dir.path().join("input.gif");
        let output = temp_dir.path().join("output.gif");
        std::fs::write(&input, vec![0u8; 700 * 1024]).unwrap();

        let engine =
            GifCompressor::with_optimizer(config(500.0), Arc::new(ScriptedOptimizer::broken()));

        let err = engine.run(&input, &output).await.unwrap_err();
        assert!(matches!(err, CompressError::ExternalTool(_)));
        assert!(!output.exists());
    }
}
