//! Capture-session lifecycle.
//!
//! A [`CaptureSessionController`] ties a decode worker 1:1 to an active
//! capture session: starting the session opens the camera and spawns the
//! worker; stopping it quits and joins the worker **before** releasing the
//! camera, so a decode attempt can never touch a closed device. Surface,
//! permission, and picked-image events from the UI collaborator are
//! forwarded into the pipeline from here.
//!
//! The controller lives on the UI context and never blocks on decoding:
//! outcomes arrive over a channel and are drained by [`pump`], which the UI
//! event loop calls at its own pace.
//!
//! [`pump`]: CaptureSessionController::pump

use std::path::Path;
use std::sync::mpsc::{self, Receiver};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{info, warn};

use crate::ambient::{AmbientLightPolicy, TorchRequest};
use crate::engine::{DecodeEngine, DecodeHints, DecodedSymbol};
use crate::frame::Frame;
use crate::inactivity::InactivityTimer;
use crate::router::{Feedback, ResultPresentation, ResultRouter, SessionState};
use crate::still;
use crate::worker::{DecodeWorker, WorkerState};
use crate::{DecodeOutcome, ScanConfig};

/// Error types for session lifecycle operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The camera device could not be opened. Fatal to the session.
    #[error("failed to open camera device: {0}")]
    CameraOpenFailed(String),

    /// Camera permission has not been granted.
    #[error("camera permission not granted")]
    PermissionDenied,
}

/// Camera device collaborator.
///
/// Frame delivery happens out-of-band (the driver calls
/// [`CaptureSessionController::post_frame`] from its own context); this
/// trait covers the control operations the session needs.
pub trait CameraControl: Send {
    /// Open the device and start frame delivery.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::CameraOpenFailed`] when the device cannot be
    /// opened.
    fn open(&mut self) -> Result<(), SessionError>;

    /// Stop frame delivery and release the device.
    fn close(&mut self);

    /// Switch the torch on or off.
    fn set_torch(&mut self, on: bool);
}

/// Orchestrates camera, worker, and result routing for one scanning
/// surface.
pub struct CaptureSessionController<C: CameraControl> {
    camera: C,
    router: ResultRouter,
    hints: DecodeHints,
    worker: Option<DecodeWorker>,
    outcomes: Option<Receiver<DecodeOutcome>>,
    ambient: AmbientLightPolicy,
    inactivity: InactivityTimer,
    camera_permitted: bool,
}

impl<C: CameraControl> CaptureSessionController<C> {
    /// Create a controller. The session is not started until
    /// [`start`](Self::start).
    pub fn new(camera: C, config: ScanConfig, feedback: Box<dyn Feedback>) -> Self {
        Self {
            camera,
            router: ResultRouter::new(config, feedback),
            hints: DecodeHints::default(),
            worker: None,
            outcomes: None,
            ambient: AmbientLightPolicy::new(),
            inactivity: InactivityTimer::new(),
            camera_permitted: false,
        }
    }

    /// Replace the hints passed to the live-scan engine.
    pub fn with_hints(mut self, hints: DecodeHints) -> Self {
        self.hints = hints;
        self
    }

    /// Start the capture session: open the camera and spawn a worker that
    /// owns `engine`.
    ///
    /// Starting an already-started session is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::PermissionDenied`] before permission is
    /// granted, or [`SessionError::CameraOpenFailed`] from the device.
    pub fn start<E>(&mut self, engine: E) -> Result<(), SessionError>
    where
        E: DecodeEngine + 'static,
    {
        if !self.camera_permitted {
            return Err(SessionError::PermissionDenied);
        }
        if self.worker.is_some() {
            warn!("capture session already started");
            return Ok(());
        }

        self.camera.open()?;
        let (outcome_tx, outcome_rx) = mpsc::channel();
        self.worker = Some(DecodeWorker::spawn(engine, self.hints.clone(), outcome_tx));
        self.outcomes = Some(outcome_rx);
        self.inactivity.on_activity(Instant::now());
        info!("capture session started");
        Ok(())
    }

    /// Stop the capture session.
    ///
    /// The worker is joined before the camera is released, so an attempt
    /// still in flight finishes against an open device. Per-session state
    /// is cleared; a parked saved result survives for the next session.
    pub fn stop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.join();
        }
        self.outcomes = None;
        self.camera.close();
        self.router.clear_session();
        info!("capture session stopped");
    }

    /// Forward one camera frame to the worker.
    ///
    /// Never blocks; frames arriving while no session is running are
    /// dropped (the camera can race a teardown).
    pub fn post_frame(&self, frame: Frame) {
        if let Some(worker) = &self.worker {
            worker.post(frame);
        }
    }

    /// Drain pending decode outcomes and apply any due resume.
    ///
    /// Called from the UI event loop. Returns the presentations the display
    /// collaborator should show, in completion order.
    pub fn pump(&mut self, now: Instant) -> Vec<ResultPresentation> {
        let mut presentations = Vec::new();
        self.router.poll_resume(now);

        // A result parked while no session existed is shown as soon as one
        // is running.
        if self.worker.is_some() {
            if let Some(saved) = self.router.state_mut().saved_result_pending_display.take() {
                if let Some(presentation) = self.router.on_outcome(replay_outcome(saved), false) {
                    presentations.push(presentation);
                }
            }
        }

        let mut drained = Vec::new();
        if let Some(outcomes) = &self.outcomes {
            while let Ok(outcome) = outcomes.try_recv() {
                drained.push(outcome);
            }
        }
        for outcome in drained {
            if let Some(presentation) = self.router.on_outcome(outcome, true) {
                self.inactivity.on_activity(now);
                presentations.push(presentation);
            }
        }
        presentations
    }

    /// Decode one picked still image.
    ///
    /// Runs synchronously on the caller's context with its own engine
    /// instance, independent of live scanning; the result flows through the
    /// same router sink. Returns `None` when no symbol was found (or the
    /// file was unreadable).
    pub fn decode_still_image(
        &mut self,
        path: impl AsRef<Path>,
        engine: &mut dyn DecodeEngine,
    ) -> Option<ResultPresentation> {
        match still::decode_still(path.as_ref(), engine) {
            Some(symbol) => self.router.on_outcome(replay_outcome(symbol), false),
            None => {
                info!(path = %path.as_ref().display(), "no symbol found in picked image");
                None
            }
        }
    }

    /// Surface a previously decoded result.
    ///
    /// Shown immediately when a session is running; otherwise parked in
    /// session state and replayed by the first [`pump`](Self::pump) after
    /// the next start.
    pub fn store_saved_result(&mut self, symbol: DecodedSymbol) -> Option<ResultPresentation> {
        if self.worker.is_some() {
            self.router.on_outcome(replay_outcome(symbol), false)
        } else {
            self.router.state_mut().saved_result_pending_display = Some(symbol);
            None
        }
    }

    /// Record the camera permission decision.
    pub fn on_permission_result(&mut self, granted: bool) {
        self.camera_permitted = granted;
        if !granted {
            warn!("camera permission denied");
        }
    }

    /// The preview surface became available.
    pub fn on_surface_created(&mut self) {
        self.router.state_mut().has_active_surface = true;
    }

    /// The preview surface went away.
    pub fn on_surface_destroyed(&mut self) {
        self.router.state_mut().has_active_surface = false;
    }

    /// Feed an ambient light reading; toggles the torch on threshold
    /// crossings.
    pub fn on_ambient_light(&mut self, lux: f32) {
        if let Some(request) = self.ambient.observe(lux) {
            self.camera.set_torch(matches!(request, TorchRequest::On));
        }
    }

    /// Switch the torch directly (user control).
    pub fn set_torch(&mut self, on: bool) {
        self.camera.set_torch(on);
    }

    /// Schedule a return to passive scanning after `delay`.
    pub fn resume_scanning_after_delay(&mut self, delay: Duration) {
        self.router.resume_scanning_after_delay(delay);
    }

    /// Update the power source for the inactivity deadline.
    pub fn set_battery_powered(&mut self, on_battery: bool, now: Instant) {
        self.inactivity.set_battery_powered(on_battery, now);
    }

    /// Whether the session has been idle past the inactivity deadline.
    pub fn is_inactive(&self, now: Instant) -> bool {
        self.inactivity.is_expired(now)
    }

    /// Whether a worker is currently running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// State of the running worker, if any.
    pub fn worker_state(&self) -> Option<WorkerState> {
        self.worker.as_ref().map(DecodeWorker::state)
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        self.router.state()
    }
}

fn replay_outcome(symbol: DecodedSymbol) -> DecodeOutcome {
    DecodeOutcome::Success {
        symbol,
        thumbnail: None,
        scale_factor: 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DecodedSymbol, EngineError, LuminanceSource, Symbology};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::thread;

    const TEST_TIMEOUT: Duration = Duration::from_secs(5);

    type EventLog = Arc<Mutex<Vec<String>>>;

    fn log_event(log: &EventLog, event: &str) {
        log.lock().unwrap().push(event.to_string());
    }

    struct MockCamera {
        log: EventLog,
    }

    impl CameraControl for MockCamera {
        fn open(&mut self) -> Result<(), SessionError> {
            log_event(&self.log, "open");
            Ok(())
        }

        fn close(&mut self) {
            log_event(&self.log, "close");
        }

        fn set_torch(&mut self, on: bool) {
            log_event(&self.log, if on { "torch on" } else { "torch off" });
        }
    }

    struct CountingFeedback(Arc<AtomicUsize>);

    impl Feedback for CountingFeedback {
        fn play_feedback(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Engine that records its drop into the shared event log, so tests can
    /// check teardown ordering against camera close.
    struct LoggedEngine {
        log: EventLog,
        succeed: bool,
    }

    impl DecodeEngine for LoggedEngine {
        fn decode(
            &mut self,
            _source: &LuminanceSource,
            _hints: &DecodeHints,
        ) -> Result<DecodedSymbol, EngineError> {
            if self.succeed {
                Ok(DecodedSymbol::new("live-payload", Symbology::QrCode))
            } else {
                Err(EngineError::SymbolNotFound)
            }
        }

        fn reset(&mut self) {}
    }

    impl Drop for LoggedEngine {
        fn drop(&mut self) {
            log_event(&self.log, "engine dropped");
        }
    }

    fn controller(
        log: &EventLog,
    ) -> (
        CaptureSessionController<MockCamera>,
        Arc<AtomicUsize>,
    ) {
        let feedback_count = Arc::new(AtomicUsize::new(0));
        let controller = CaptureSessionController::new(
            MockCamera {
                log: Arc::clone(log),
            },
            ScanConfig::default(),
            Box::new(CountingFeedback(Arc::clone(&feedback_count))),
        );
        (controller, feedback_count)
    }

    fn frame(tag: u8) -> Frame {
        Frame::new(16, 16, vec![tag; 256]).unwrap()
    }

    #[test]
    fn test_start_requires_permission() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);

        let err = controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap_err();
        assert!(matches!(err, SessionError::PermissionDenied));
        assert!(log.lock().unwrap().iter().all(|e| e != "open"));
    }

    #[test]
    fn test_start_opens_camera_once() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);
        controller.on_permission_result(true);

        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap();
        assert!(controller.is_running());

        // Second start is a no-op.
        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap();

        let opens = log.lock().unwrap().iter().filter(|e| *e == "open").count();
        assert_eq!(opens, 1);
        controller.stop();
    }

    #[test]
    fn test_stop_joins_worker_before_closing_camera() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);
        controller.on_permission_result(true);

        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap();
        controller.post_frame(frame(1));
        controller.stop();

        assert!(!controller.is_running());
        let events = log.lock().unwrap().clone();
        let engine_dropped = events.iter().position(|e| e == "engine dropped").unwrap();
        let closed = events.iter().position(|e| e == "close").unwrap();
        assert!(
            engine_dropped < closed,
            "worker must stop before the camera closes: {:?}",
            events
        );
    }

    #[test]
    fn test_live_success_reaches_presentation_and_feedback() {
        let log = EventLog::default();
        let (mut controller, feedback) = controller(&log);
        controller.on_permission_result(true);
        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: true,
            })
            .unwrap();

        controller.post_frame(frame(1));

        let deadline = Instant::now() + TEST_TIMEOUT;
        let presentation = loop {
            let mut batch = controller.pump(Instant::now());
            if let Some(presentation) = batch.pop() {
                break presentation;
            }
            assert!(Instant::now() < deadline, "no presentation arrived");
            thread::sleep(Duration::from_millis(1));
        };

        assert_eq!(presentation.headline, "QR_CODE : live-payload");
        assert!(presentation.thumbnail.is_some());
        assert_eq!(feedback.load(Ordering::SeqCst), 1);
        assert_eq!(
            controller.state().last_result.as_ref().unwrap().text,
            "live-payload"
        );
        controller.stop();
        assert!(controller.state().last_result.is_none());
    }

    #[test]
    fn test_saved_result_parked_until_session_starts() {
        let log = EventLog::default();
        let (mut controller, feedback) = controller(&log);

        let parked =
            controller.store_saved_result(DecodedSymbol::new("parked", Symbology::QrCode));
        assert!(parked.is_none());
        assert!(controller.state().saved_result_pending_display.is_some());

        controller.on_permission_result(true);
        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap();

        let presentations = controller.pump(Instant::now());
        assert_eq!(presentations.len(), 1);
        assert_eq!(presentations[0].headline, "QR_CODE : parked");
        // Replayed results are not live scans: no feedback, no thumbnail.
        assert_eq!(feedback.load(Ordering::SeqCst), 0);
        assert!(controller.state().saved_result_pending_display.is_none());
        controller.stop();
    }

    #[test]
    fn test_saved_result_shown_immediately_when_running() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);
        controller.on_permission_result(true);
        controller
            .start(LoggedEngine {
                log: Arc::clone(&log),
                succeed: false,
            })
            .unwrap();

        let presentation = controller
            .store_saved_result(DecodedSymbol::new("history", Symbology::QrCode))
            .unwrap();
        assert_eq!(presentation.headline, "QR_CODE : history");
        controller.stop();
    }

    #[test]
    fn test_ambient_light_toggles_torch() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);

        controller.on_ambient_light(10.0);
        controller.on_ambient_light(20.0);
        controller.on_ambient_light(500.0);

        let events = log.lock().unwrap().clone();
        assert_eq!(events, vec!["torch on", "torch off"]);
    }

    #[test]
    fn test_surface_events_update_state() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);

        controller.on_surface_created();
        assert!(controller.state().has_active_surface);
        controller.on_surface_destroyed();
        assert!(!controller.state().has_active_surface);
    }

    #[test]
    fn test_still_decode_of_unreadable_path_is_none() {
        let log = EventLog::default();
        let (mut controller, _) = controller(&log);
        let mut engine = LoggedEngine {
            log: Arc::clone(&log),
            succeed: true,
        };

        assert!(controller
            .decode_still_image("/nonexistent/image.png", &mut engine)
            .is_none());
    }

    #[test]
    fn test_frames_before_start_are_dropped() {
        let log = EventLog::default();
        let (controller, _) = controller(&log);
        // No session: posting must be a silent no-op.
        controller.post_frame(frame(1));
        assert!(!controller.is_running());
    }
}
