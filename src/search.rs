//! # Shared Search State Module
//!
//! Stato condiviso tra i worker durante la ricerca: un flag di
//! cancellazione cooperativa (target raggiunto) e la migliore dimensione
//! osservata finora. Tutto lock-free; i worker controllano il flag tra
//! un'invocazione esterna e l'altra e abbandonano da soli.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Lock-free state shared by all strategy workers.
///
/// The best size is stored as IEEE-754 bits; for positive floats the bit
/// pattern orders the same way as the values, so a CAS loop suffices.
#[derive(Debug)]
pub struct SearchState {
    found_target: AtomicBool,
    best_size_bits: AtomicU64,
}

impl Default for SearchState {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchState {
    pub fn new() -> Self {
        Self {
            found_target: AtomicBool::new(false),
            best_size_bits: AtomicU64::new(f64::INFINITY.to_bits()),
        }
    }

    /// Signal that some worker produced a result at or under the target
    pub fn mark_found(&self) {
        self.found_target.store(true, Ordering::Relaxed);
    }

    /// Cooperative cancellation check, polled between external invocations
    pub fn target_found(&self) -> bool {
        self.found_target.load(Ordering::Relaxed)
    }

    /// Record `size_kb` if it beats the best seen so far; returns whether
    /// it did
    pub fn update_best(&self, size_kb: f64) -> bool {
        let new_bits = size_kb.to_bits();
        let mut current = self.best_size_bits.load(Ordering::Relaxed);

        loop {
            if new_bits >= current {
                return false;
            }

            match self.best_size_bits.compare_exchange(
                current,
                new_bits,
                Ordering::SeqCst,
                Ordering::Relaxed,
            ) {
                Ok(_) => return true,
                Err(actual) => current = actual,
            }
        }
    }

    /// Best size observed so far (infinite until the first update)
    pub fn best_size(&self) -> f64 {
        f64::from_bits(self.best_size_bits.load(Ordering::Relaxed))
    }
}
