//! Framescan Core - barcode scanning pipeline
//!
//! This crate provides the frame acquisition-to-result pipeline for
//! Framescan: per-frame preprocessing, a dedicated decode worker, the
//! still-image decode path, and the session lifecycle that ties them to a
//! camera. The symbology algorithms themselves live behind the
//! [`engine::DecodeEngine`] seam.
//!
//! # Architecture
//!
//! Three execution contexts cooperate:
//!
//! - the **UI context** owns session state and never decodes;
//! - the **camera context** delivers frames and never blocks;
//! - the **worker context** is a dedicated thread that decodes one frame
//!   at a time against its exclusively-owned engine.
//!
//! Live frames flow camera → worker mailbox → rotation → engine → outcome
//! channel → [`router::ResultRouter`]. Picked still images bypass the
//! worker entirely and reach the same router through [`still`].

pub mod ambient;
pub mod engine;
pub mod frame;
pub mod inactivity;
pub mod preprocess;
pub mod router;
pub mod session;
pub mod still;
pub mod worker;

use std::time::Duration;

pub use engine::{
    DecodeEngine, DecodeHints, DecodedSymbol, EngineError, LuminanceSource, PreviewImage,
    QrEngine, Symbology,
};
pub use frame::{Frame, FrameError, RotatedFrame};
pub use router::{Feedback, ResultPresentation, ResultRouter, SessionState, SilentFeedback};
pub use session::{CameraControl, CaptureSessionController, SessionError};
pub use still::{decode_still, decode_still_detailed, StillDecodeError};
pub use worker::{DecodeWorker, WorkerState};

/// How long a successful result stays on screen by default, matching the
/// classic handheld-scanner feel.
pub const DEFAULT_RESULT_DISPLAY: Duration = Duration::from_millis(1500);

/// Tunable scanning policy.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ScanConfig {
    /// How long a decoded result stays visible before scanning can resume.
    pub result_display_duration: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            result_display_duration: DEFAULT_RESULT_DISPLAY,
        }
    }
}

/// The result of one decode attempt.
///
/// Exactly one outcome is produced per accepted frame; frames replaced in
/// the worker mailbox produce nothing. Failure is the majority case during
/// live scanning and deliberately carries no detail.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A symbol was decoded.
    Success {
        /// The decoded symbol.
        symbol: DecodedSymbol,
        /// Downscaled grayscale preview of the decoded frame, when the
        /// attempt came from the live path.
        thumbnail: Option<PreviewImage>,
        /// Scale of the thumbnail relative to the decoded frame, in (0, 1].
        scale_factor: f32,
    },
    /// No symbol was found.
    Failure,
}

impl DecodeOutcome {
    /// Whether this outcome carries a decoded symbol.
    pub fn is_success(&self) -> bool {
        matches!(self, DecodeOutcome::Success { .. })
    }

    /// The decoded symbol, if any.
    pub fn symbol(&self) -> Option<&DecodedSymbol> {
        match self {
            DecodeOutcome::Success { symbol, .. } => Some(symbol),
            DecodeOutcome::Failure => None,
        }
    }
}
