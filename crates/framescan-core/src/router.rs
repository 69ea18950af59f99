//! Result routing: the single sink for live-scan and still-image outcomes.
//!
//! Both decode paths deliver a [`DecodeOutcome`] here. Successes update
//! session state, trigger feedback (live scans only), and produce a
//! [`ResultPresentation`] for the display collaborator; failures are the
//! common case and change nothing; live scanning just keeps going.
//!
//! After a success the previous result stays visible for feedback, so
//! resuming passive scanning is an explicit, optionally delayed step
//! ([`ResultRouter::resume_scanning_after_delay`]).

use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::engine::{DecodedSymbol, PreviewImage};
use crate::{DecodeOutcome, ScanConfig};

/// Success feedback collaborator (beep, vibration, ...).
///
/// Invoked only on live-scan success.
pub trait Feedback: Send {
    /// Play the configured audible/haptic feedback once.
    fn play_feedback(&mut self);
}

/// A [`Feedback`] that does nothing, for headless use and tests.
#[derive(Debug, Default)]
pub struct SilentFeedback;

impl Feedback for SilentFeedback {
    fn play_feedback(&mut self) {}
}

/// Per-session state owned by the UI context.
#[derive(Debug, Default)]
pub struct SessionState {
    /// Most recent successful decode, kept visible until scanning resumes.
    pub last_result: Option<DecodedSymbol>,
    /// Whether a preview surface currently exists.
    pub has_active_surface: bool,
    /// A result that arrived while no session was running, waiting to be
    /// shown once one starts.
    pub saved_result_pending_display: Option<DecodedSymbol>,
}

/// What the display collaborator should show for a successful decode.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultPresentation {
    /// Formatted "symbology : text" line.
    pub headline: String,
    /// How long to keep the result on screen.
    pub display_for: Duration,
    /// Downscaled grayscale preview of the decoded frame (live scans only).
    pub thumbnail: Option<PreviewImage>,
    /// Scale of the thumbnail relative to the decoded frame (live scans
    /// only).
    pub scale_factor: Option<f32>,
}

/// Routes decode outcomes into session state and user-visible consequences.
pub struct ResultRouter {
    config: ScanConfig,
    state: SessionState,
    feedback: Box<dyn Feedback>,
    resume_at: Option<Instant>,
}

impl ResultRouter {
    /// Create a router with the given display policy and feedback
    /// collaborator.
    pub fn new(config: ScanConfig, feedback: Box<dyn Feedback>) -> Self {
        Self {
            config,
            state: SessionState::default(),
            feedback,
            resume_at: None,
        }
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Route one decode outcome.
    ///
    /// Returns a presentation for the display collaborator on success,
    /// `None` on failure. Failures never change state: they are the
    /// majority case during live scanning, not an error path.
    pub fn on_outcome(
        &mut self,
        outcome: DecodeOutcome,
        is_live_scan: bool,
    ) -> Option<ResultPresentation> {
        match outcome {
            DecodeOutcome::Failure => None,
            DecodeOutcome::Success {
                symbol,
                thumbnail,
                scale_factor,
            } => {
                // Log the symbology only; payload contents stay out of the
                // diagnostics stream.
                info!(symbology = %symbol.symbology, live = is_live_scan, "decode succeeded");
                if is_live_scan {
                    self.feedback.play_feedback();
                }

                let headline = format!("{} : {}", symbol.symbology, symbol.text);
                self.state.last_result = Some(symbol);

                Some(ResultPresentation {
                    headline,
                    display_for: self.config.result_display_duration,
                    thumbnail: if is_live_scan { thumbnail } else { None },
                    scale_factor: if is_live_scan { Some(scale_factor) } else { None },
                })
            }
        }
    }

    /// Schedule a return to passive scanning.
    ///
    /// A zero delay resumes immediately; otherwise the reset is applied by
    /// the first [`poll_resume`](Self::poll_resume) at or after the
    /// deadline.
    pub fn resume_scanning_after_delay(&mut self, delay: Duration) {
        if delay.is_zero() {
            self.reset_scan_state();
        } else {
            self.resume_at = Some(Instant::now() + delay);
        }
    }

    /// Apply a pending resume if its deadline has passed.
    ///
    /// Returns `true` when the scan state was re-armed by this call.
    pub fn poll_resume(&mut self, now: Instant) -> bool {
        match self.resume_at {
            Some(at) if now >= at => {
                self.resume_at = None;
                self.reset_scan_state();
                true
            }
            _ => false,
        }
    }

    /// Clear per-session state at session pause/stop.
    ///
    /// A parked saved result survives teardown so it can still be shown by
    /// the next session.
    pub(crate) fn clear_session(&mut self) {
        self.state.last_result = None;
        self.resume_at = None;
    }

    fn reset_scan_state(&mut self) {
        self.state.last_result = None;
        debug!("scan state re-armed");
    }
}
