//! # Strategy Generation Module
//!
//! Deriva l'insieme ordinato e limitato di strategie di sottocampionamento
//! da provare, a partire dal numero di frame del sorgente e dalla
//! percentuale minima di frame da conservare.
//!
//! Gli stride più densi sono economici e vengono provati per primi
//! (l'ordine di generazione li favorisce); gli stride aggressivi sono
//! riservati alle sequenze lunghe, dove la ridondanza tra frame è alta.
//! L'insieme prodotto è sempre finito: al massimo 11 strategie.

/// One frame-subsampling candidate: keep every `skip`-th frame, display
/// each retained frame for `delay_ms` milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub skip: usize,
    pub delay_ms: u16,
}

/// Hard bounds on the dense-stride range
const MIN_SKIP: usize = 2;
const MAX_DENSE_SKIP: usize = 10;

/// Frame count above which aggressive strides are also considered
const AGGRESSIVE_THRESHOLD: usize = 30;

fn delay_for(skip: usize, frame_count: usize) -> u16 {
    ((100.0 * skip as f64) / frame_count as f64) as u16 + 10
}

/// Generate the ordered candidate set for a source with `frame_count`
/// frames, never implying fewer retained frames than
/// `max(3, frame_count * min_frame_percent / 100)` for the aggressive
/// strides.
pub fn generate(frame_count: usize, min_frame_percent: u32) -> Vec<Strategy> {
    let frame_count = frame_count.max(1);

    let min_frames = std::cmp::max(
        3,
        (frame_count as f64 * f64::from(min_frame_percent) / 100.0) as usize,
    );

    let max_skip = std::cmp::max(
        MIN_SKIP,
        std::cmp::min(
            MAX_DENSE_SKIP,
            (frame_count as f64 / min_frames as f64).ceil() as usize,
        ),
    );

    let mut strategies = Vec::new();

    for skip in MIN_SKIP..=max_skip {
        strategies.push(Strategy {
            skip,
            delay_ms: delay_for(skip, frame_count),
        });
    }

    // Long sequences are usually redundant enough to survive harsher strides
    if frame_count > AGGRESSIVE_THRESHOLD {
        for skip in [max_skip + 5, max_skip + 10] {
            if frame_count / skip >= min_frames {
                strategies.push(Strategy {
                    skip,
                    delay_ms: delay_for(skip, frame_count),
                });
            }
        }
    }

    strategies
}
