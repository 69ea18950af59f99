//! The decode-engine boundary.
//!
//! The pipeline never implements symbology algorithms itself; it drives an
//! engine through the [`DecodeEngine`] trait. The contract mirrors a
//! stateful multi-format reader:
//!
//! - `decode` examines one [`LuminanceSource`] under optional
//!   [`DecodeHints`] and either returns a [`DecodedSymbol`] or fails with
//!   [`EngineError::SymbolNotFound`] (the common case) or
//!   [`EngineError::Fault`] (unexpected).
//! - `reset` clears internal state between attempts. The engine's state is
//!   not safe to reuse without it, so callers run `reset` after **every**
//!   attempt, whatever its outcome.
//!
//! The live-scan worker and the still-image path each own their own engine
//! instance; the two paths can run concurrently and never share one.
//!
//! [`QrEngine`] is the stock implementation, backed by the `rqrr` crate.

mod luminance;
mod qr;
mod types;

pub use luminance::{luminance_u8, LuminanceSource, PreviewImage};
pub use qr::{AttemptSummary, QrEngine};
pub use types::{DecodeHints, DecodedSymbol, EngineError, Symbology};

/// A symbol-decoding engine.
///
/// Implementations must be `Send` so a worker thread can own one.
pub trait DecodeEngine: Send {
    /// Attempt to decode one symbol from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SymbolNotFound`] when no readable symbol is
    /// present (frequent, expected), or [`EngineError::Fault`] on an
    /// unexpected engine failure.
    fn decode(
        &mut self,
        source: &LuminanceSource,
        hints: &DecodeHints,
    ) -> Result<DecodedSymbol, EngineError>;

    /// Clear internal state left over from the previous attempt.
    fn reset(&mut self);
}
