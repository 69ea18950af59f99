//! Stock QR decode engine backed by the `rqrr` crate.

use std::time::{Duration, Instant};

use tracing::debug;

use super::luminance::LuminanceSource;
use super::types::{DecodeHints, DecodedSymbol, EngineError, Symbology};
use super::DecodeEngine;

/// Summary of the most recent decode attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptSummary {
    /// Candidate grids located before decoding was attempted.
    pub grids_detected: usize,
    /// Wall-clock time the attempt took.
    pub elapsed: Duration,
}

/// QR symbology engine.
///
/// Holds per-attempt scratch state; [`DecodeEngine::reset`] must run between
/// attempts so one attempt's summary never leaks into the next.
#[derive(Debug, Default)]
pub struct QrEngine {
    last_attempt: Option<AttemptSummary>,
}

impl QrEngine {
    /// Create a new engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Summary of the last attempt since the most recent reset, if any.
    pub fn last_attempt(&self) -> Option<AttemptSummary> {
        self.last_attempt
    }
}

impl DecodeEngine for QrEngine {
    fn decode(
        &mut self,
        source: &LuminanceSource,
        hints: &DecodeHints,
    ) -> Result<DecodedSymbol, EngineError> {
        if let Some(formats) = &hints.possible_formats {
            if !formats.contains(&Symbology::QrCode) {
                return Err(EngineError::SymbolNotFound);
            }
        }

        let start = Instant::now();
        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            source.width() as usize,
            source.height() as usize,
            |x, y| source.sample(x, y),
        );
        let grids = prepared.detect_grids();
        self.last_attempt = Some(AttemptSummary {
            grids_detected: grids.len(),
            elapsed: start.elapsed(),
        });

        for grid in &grids {
            match grid.decode() {
                Ok((meta, content)) => {
                    let mut symbol = DecodedSymbol::new(content, Symbology::QrCode);
                    symbol
                        .metadata
                        .insert("version".to_string(), meta.version.0.to_string());
                    symbol
                        .metadata
                        .insert("ecc_level".to_string(), meta.ecc_level.to_string());
                    symbol
                        .metadata
                        .insert("mask".to_string(), meta.mask.to_string());
                    return Ok(symbol);
                }
                Err(e) => {
                    // A located grid that fails to read is still a plain
                    // not-found for the caller.
                    debug!(error = ?e, "located grid failed to decode");
                }
            }
        }

        Err(EngineError::SymbolNotFound)
    }

    fn reset(&mut self) {
        self.last_attempt = None;
    }
}
