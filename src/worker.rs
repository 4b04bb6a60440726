//! # Strategy Worker Module
//!
//! Esegue una singola strategia dall'inizio alla fine: estrazione frame,
//! ottimizzazione base, sweep dei livelli lossy. Separato dal motore
//! principale per maggiore modularità.
//!
//! Ogni artifact intermedio superato viene rilasciato (e quindi eliminato)
//! prima del passo successivo; il worker controlla il flag di cancellazione
//! tra un'invocazione esterna e l'altra.

use crate::artifact::TempArtifact;
use crate::error::CompressError;
use crate::frames;
use crate::gifsicle::RasterOptimizer;
use crate::search::SearchState;
use crate::strategy::Strategy;
use std::path::Path;
use tokio::task;
use tracing::{debug, warn};

/// Quality-loss levels swept in ascending order. The first level that
/// meets the target wins: with ascending loss, the first hit is also the
/// most faithful achievable.
pub const LOSSY_LEVELS: [u32; 8] = [30, 60, 90, 120, 150, 180, 210, 240];

/// Extraction outputs under this size are treated as corrupt
const MIN_PLAUSIBLE_KB: f64 = 1.0;

/// Outcome of one strategy. The artifact, when present, is owned by the
/// result; whoever drops it deletes the file.
#[derive(Debug)]
pub struct StrategyResult {
    pub strategy: Strategy,
    pub success: bool,
    pub size_kb: f64,
    pub artifact: Option<TempArtifact>,
}

impl StrategyResult {
    pub fn failed(strategy: Strategy) -> Self {
        Self {
            strategy,
            success: false,
            size_kb: f64::INFINITY,
            artifact: None,
        }
    }
}

/// Extract the frame subset for `strategy` on a blocking thread
async fn extract_subset(
    input: &Path,
    dest: &Path,
    strategy: Strategy,
) -> Result<usize, CompressError> {
    let src = input.to_path_buf();
    let dst = dest.to_path_buf();
    let skip = strategy.skip;
    let delay = u32::from(strategy.delay_ms);

    task::spawn_blocking(move || frames::extract(&src, &dst, skip, Some(delay)))
        .await
        .map_err(|e| CompressError::Decode(format!("extraction task failed: {e}")))?
}

/// Run one strategy end to end and return the best artifact it produced.
///
/// Failures (decode errors, implausibly small extractions, external tool
/// errors on the lossless step) are fatal only to this strategy: the
/// caller keeps going with the others.
pub async fn run_strategy(
    input: &Path,
    strategy: Strategy,
    target_kb: f64,
    optimizer: &dyn RasterOptimizer,
    search: &SearchState,
) -> StrategyResult {
    if search.target_found() {
        debug!("Skipping skip={}: target already met elsewhere", strategy.skip);
        return StrategyResult::failed(strategy);
    }

    debug!(
        "Strategy skip={} delay={}ms starting",
        strategy.skip, strategy.delay_ms
    );

    let extracted = match TempArtifact::create() {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!("Could not create temp artifact for skip={}: {}", strategy.skip, e);
            return StrategyResult::failed(strategy);
        }
    };

    match extract_subset(input, extracted.path(), strategy).await {
        Ok(retained) => debug!("Strategy skip={} retained {} frames", strategy.skip, retained),
        Err(e) => {
            warn!("Frame extraction failed for skip={}: {}", strategy.skip, e);
            return StrategyResult::failed(strategy);
        }
    }

    match extracted.size_kb() {
        Ok(size) if size < MIN_PLAUSIBLE_KB => {
            warn!(
                "Extraction for skip={} produced an implausibly small file ({:.2} KB), skipping",
                strategy.skip, size
            );
            return StrategyResult::failed(strategy);
        }
        Ok(_) => {}
        Err(e) => {
            warn!("Cannot stat extraction for skip={}: {}", strategy.skip, e);
            return StrategyResult::failed(strategy);
        }
    }

    if search.target_found() {
        return StrategyResult::failed(strategy);
    }

    // Lossless-relative pass over the subsampled animation
    let optimized = match TempArtifact::create() {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!("Could not create temp artifact for skip={}: {}", strategy.skip, e);
            return StrategyResult::failed(strategy);
        }
    };

    let mut best_size = match optimizer.optimize(extracted.path(), optimized.path(), None).await {
        Ok(size) => size,
        Err(e) => {
            warn!("Optimization failed for skip={}: {}", strategy.skip, e);
            return StrategyResult::failed(strategy);
        }
    };
    let mut best = optimized;
    drop(extracted);

    debug!("Strategy skip={}: {:.2} KB after frame drop", strategy.skip, best_size);

    if best_size <= target_kb {
        search.mark_found();
        search.update_best(best_size);
        return StrategyResult {
            strategy,
            success: true,
            size_kb: best_size,
            artifact: Some(best),
        };
    }

    // Lossy sweep, each level re-optimizing from the current best artifact
    for level in LOSSY_LEVELS {
        if search.target_found() {
            debug!("Strategy skip={} abandoning sweep: target met elsewhere", strategy.skip);
            break;
        }

        let candidate = match TempArtifact::create() {
            Ok(artifact) => artifact,
            Err(e) => {
                warn!("Could not create temp artifact for skip={}: {}", strategy.skip, e);
                break;
            }
        };

        let size = match optimizer.optimize(best.path(), candidate.path(), Some(level)).await {
            Ok(size) => size,
            Err(e) => {
                warn!("Lossy={} failed for skip={}: {}", level, strategy.skip, e);
                continue;
            }
        };

        debug!(
            "Strategy skip={} lossy={}: {:.2} KB",
            strategy.skip, level, size
        );

        if size <= target_kb {
            // First qualifying level wins; adopt it only if it actually
            // beats the current best
            if size < best_size {
                best = candidate;
                best_size = size;
            }
            search.mark_found();
            break;
        } else if size < best_size {
            best = candidate;
            best_size = size;
        }
        // Otherwise the candidate is dropped here and its file reclaimed
    }

    search.update_best(best_size);

    StrategyResult {
        strategy,
        success: true,
        size_kb: best_size,
        artifact: Some(best),
    }
}
