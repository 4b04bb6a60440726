//! # Frame Extraction Module
//!
//! Questo modulo gestisce la lettura e la riscrittura delle sequenze di frame.
//!
//! ## Responsabilità:
//! - Probe veloce dei metadati (numero frame, delay, loop count) in streaming,
//!   senza decodificare i pixel
//! - Estrazione di un sottoinsieme di frame (uno ogni `stride`) in un nuovo
//!   artifact GIF, con delay riassegnato e loop count conservato
//!
//! ## Pipeline di estrazione:
//! 1. Probe del sorgente per il loop count
//! 2. Decodifica completa dei frame compositi (RGBA)
//! 3. Selezione degli indici `0, stride, 2*stride, …`
//! 4. Ricodifica con il delay del chiamante (oppure `delay originale * stride`)
//!
//! La ricompressione vera e propria è compito di gifsicle: qui la codifica
//! privilegia la velocità rispetto al rapporto di compressione.

use crate::error::CompressError;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::{AnimationDecoder, Delay, Frame};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Delay assumed when the source declares none (or zero)
const DEFAULT_DELAY_MS: u32 = 100;

/// Loop-count attribute of an animation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopCount {
    Infinite,
    Finite(u16),
}

impl From<gif::Repeat> for LoopCount {
    fn from(repeat: gif::Repeat) -> Self {
        match repeat {
            gif::Repeat::Infinite => LoopCount::Infinite,
            gif::Repeat::Finite(n) => LoopCount::Finite(n),
        }
    }
}

impl From<LoopCount> for Repeat {
    fn from(loop_count: LoopCount) -> Self {
        match loop_count {
            LoopCount::Infinite => Repeat::Infinite,
            LoopCount::Finite(n) => Repeat::Finite(n),
        }
    }
}

/// Metadata of an animated GIF, gathered without decoding pixel data
#[derive(Debug, Clone, Copy)]
pub struct GifMetadata {
    pub frame_count: usize,
    /// Delay of the first frame in milliseconds (0 if the file declares none)
    pub first_delay_ms: u32,
    pub loop_count: LoopCount,
}

/// Probe a GIF for frame count, first-frame delay and loop count.
///
/// Uses the streaming decoder with frame decoding skipped, so the cost is
/// one pass over the LZW blocks without decompressing them.
pub fn probe(path: &Path) -> Result<GifMetadata, CompressError> {
    let file = File::open(path)?;

    let mut options = gif::DecodeOptions::new();
    options.skip_frame_decoding(true);

    let mut decoder = options
        .read_info(BufReader::new(file))
        .map_err(|e| CompressError::Decode(e.to_string()))?;

    let loop_count = LoopCount::from(decoder.repeat());

    let mut frame_count = 0usize;
    let mut first_delay_cs: Option<u16> = None;

    while let Some(frame) = decoder
        .read_next_frame()
        .map_err(|e| CompressError::Decode(e.to_string()))?
    {
        frame_count += 1;
        first_delay_cs.get_or_insert(frame.delay);
    }

    Ok(GifMetadata {
        frame_count,
        first_delay_ms: u32::from(first_delay_cs.unwrap_or(0)) * 10,
        loop_count,
    })
}

/// Extract every `stride`-th frame of `src` into a new GIF at `dest`.
///
/// The resulting per-frame delay is `delay_ms` when given, otherwise the
/// source delay scaled by `stride` so the subsampled animation keeps
/// approximately the original real-time speed. The loop count is copied
/// unchanged. Returns the number of retained frames.
pub fn extract(
    src: &Path,
    dest: &Path,
    stride: usize,
    delay_ms: Option<u32>,
) -> Result<usize, CompressError> {
    let stride = stride.max(1);

    let loop_count = probe(src)?.loop_count;

    let file = File::open(src)?;
    let decoder =
        GifDecoder::new(BufReader::new(file)).map_err(|e| CompressError::Decode(e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| CompressError::Decode(e.to_string()))?;

    if frames.is_empty() {
        return Err(CompressError::Decode("GIF has no frames".to_string()));
    }

    let source_delay_ms = {
        let (numer, denom) = frames[0].delay().numer_denom_ms();
        let ms = if denom == 0 { 0 } else { numer / denom };
        if ms == 0 {
            DEFAULT_DELAY_MS
        } else {
            ms
        }
    };
    let delay_ms = delay_ms.unwrap_or(source_delay_ms * stride as u32);
    let delay = Delay::from_numer_denom_ms(delay_ms, 1);

    let mut retained: Vec<Frame> = frames
        .iter()
        .enumerate()
        .filter(|(i, _)| i % stride == 0)
        .map(|(_, frame)| Frame::from_parts(frame.buffer().clone(), frame.left(), frame.top(), delay))
        .collect();

    if retained.is_empty() {
        // Always keep at least the first frame
        let first = &frames[0];
        retained.push(Frame::from_parts(
            first.buffer().clone(),
            first.left(),
            first.top(),
            delay,
        ));
    }

    let retained_count = retained.len();

    let output = File::create(dest).map_err(|e| CompressError::Encode(e.to_string()))?;
    let mut encoder = GifEncoder::new_with_speed(BufWriter::new(output), 10);
    encoder
        .set_repeat(loop_count.into())
        .map_err(|e| CompressError::Encode(e.to_string()))?;
    encoder
        .encode_frames(retained)
        .map_err(|e| CompressError::Encode(e.to_string()))?;

    Ok(retained_count)
}
