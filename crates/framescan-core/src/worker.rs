//! The decode worker: one dedicated thread, one engine, one frame at a time.
//!
//! The camera delivers frames from its own callback context and must never
//! block; the UI context must never decode. The worker sits between them:
//! a dedicated thread with a private single-slot mailbox. Posting a frame
//! while another is pending replaces the pending one (latest frame wins:
//! a stale frame is worthless once a newer one exists), which bounds both
//! memory and latency to a single frame.
//!
//! # State machine
//!
//! ```text
//! Idle --(frame)--> Decoding --(attempt done)--> Idle
//! Idle --(quit)--> Stopped (terminal)
//! ```
//!
//! There is no transition from `Decoding` straight to `Stopped`: a quit
//! request is honored only between attempts, so the engine is never torn
//! down mid-decode. Frames posted after `quit` are silently ignored.
//!
//! Every accepted frame produces exactly one [`DecodeOutcome`] on the
//! outcome channel; replaced frames produce nothing. The engine is reset
//! after every attempt that invoked it, whatever the result.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::Sender;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::engine::{DecodeEngine, DecodeHints, EngineError, LuminanceSource};
use crate::frame::Frame;
use crate::preprocess;
use crate::DecodeOutcome;

/// Observable state of a decode worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    /// Waiting for a frame.
    Idle,
    /// A decode attempt is in progress.
    Decoding,
    /// The message loop has exited. Terminal.
    Stopped,
}

const STATE_IDLE: u8 = 0;
const STATE_DECODING: u8 = 1;
const STATE_STOPPED: u8 = 2;

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_DECODING => WorkerState::Decoding,
            STATE_STOPPED => WorkerState::Stopped,
            _ => WorkerState::Idle,
        }
    }
}

#[derive(Default)]
struct Mailbox {
    pending: Option<Frame>,
    quit: bool,
}

struct Shared {
    mailbox: Mutex<Mailbox>,
    available: Condvar,
    state: AtomicU8,
    dropped_frames: AtomicU64,
}

fn lock_mailbox(shared: &Shared) -> MutexGuard<'_, Mailbox> {
    shared.mailbox.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to a running decode worker.
///
/// The worker thread exclusively owns its engine; this handle only touches
/// the mailbox. Dropping the handle requests quit and joins the thread.
pub struct DecodeWorker {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl DecodeWorker {
    /// Spawn a worker thread that owns `engine` and reports outcomes on
    /// `outcomes`.
    pub fn spawn<E>(engine: E, hints: DecodeHints, outcomes: Sender<DecodeOutcome>) -> Self
    where
        E: DecodeEngine + 'static,
    {
        let shared = Arc::new(Shared {
            mailbox: Mutex::new(Mailbox::default()),
            available: Condvar::new(),
            state: AtomicU8::new(STATE_IDLE),
            dropped_frames: AtomicU64::new(0),
        });

        let thread_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || run(thread_shared, engine, hints, outcomes));

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Enqueue a frame without blocking the caller.
    ///
    /// If a frame is already pending it is replaced and dropped; after
    /// [`quit`](Self::quit) this is a no-op.
    pub fn post(&self, frame: Frame) {
        let mut mailbox = lock_mailbox(&self.shared);
        if mailbox.quit {
            debug!("frame posted after quit, ignoring");
            return;
        }
        if mailbox.pending.replace(frame).is_some() {
            self.shared.dropped_frames.fetch_add(1, Ordering::Relaxed);
            debug!("pending frame replaced by a newer one");
        }
        self.shared.available.notify_one();
    }

    /// Request a cooperative shutdown.
    ///
    /// An attempt already in progress runs to completion and its outcome is
    /// still delivered; a pending frame that never started is discarded.
    pub fn quit(&self) {
        let mut mailbox = lock_mailbox(&self.shared);
        mailbox.quit = true;
        self.shared.available.notify_one();
    }

    /// Request shutdown and block until the message loop has exited.
    ///
    /// The owning session must wait for this before releasing the camera,
    /// so no attempt can touch a closed device.
    pub fn join(mut self) {
        self.quit();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Snapshot of the worker state, published by the worker's own loop.
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.shared.state.load(Ordering::Acquire))
    }

    /// Number of frames discarded by the latest-frame-wins policy.
    pub fn dropped_frames(&self) -> u64 {
        self.shared.dropped_frames.load(Ordering::Relaxed)
    }
}

impl Drop for DecodeWorker {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.quit();
            let _ = handle.join();
        }
    }
}

/// The worker message loop. Strictly serial: one frame processed to
/// completion before the next is looked at.
fn run<E>(shared: Arc<Shared>, mut engine: E, hints: DecodeHints, outcomes: Sender<DecodeOutcome>)
where
    E: DecodeEngine,
{
    info!("decode worker started");
    loop {
        let frame = {
            let mut mailbox = lock_mailbox(&shared);
            loop {
                // Quit wins over a pending frame: messages behind a quit
                // are never processed.
                if mailbox.quit {
                    shared.state.store(STATE_STOPPED, Ordering::Release);
                    info!(
                        dropped_frames = shared.dropped_frames.load(Ordering::Relaxed),
                        "decode worker stopped"
                    );
                    return;
                }
                if let Some(frame) = mailbox.pending.take() {
                    break frame;
                }
                shared.state.store(STATE_IDLE, Ordering::Release);
                mailbox = shared
                    .available
                    .wait(mailbox)
                    .unwrap_or_else(|e| e.into_inner());
            }
        };

        shared.state.store(STATE_DECODING, Ordering::Release);
        let outcome = attempt(&mut engine, frame, &hints);
        if outcomes.send(outcome).is_err() {
            debug!("outcome receiver dropped, result discarded");
        }
    }
}

/// Run one decode attempt: rotate, build a luminance source, decode, reset.
fn attempt<E>(engine: &mut E, frame: Frame, hints: &DecodeHints) -> DecodeOutcome
where
    E: DecodeEngine,
{
    let start = Instant::now();
    let rotated = preprocess::rotate(frame);
    let (width, height) = (rotated.width(), rotated.height());

    let source = match LuminanceSource::from_luma(rotated.into_luma(), width, height) {
        Some(source) => source,
        // No usable source: the attempt fails without invoking the engine,
        // so there is nothing to reset.
        None => return DecodeOutcome::Failure,
    };

    let result = engine.decode(&source, hints);
    // The engine's state is not reusable across attempts; reset whatever
    // the result was.
    engine.reset();

    match result {
        Ok(symbol) => {
            let preview = source.render_preview();
            debug!(
                elapsed_ms = start.elapsed().as_millis() as u64,
                symbology = %symbol.symbology,
                "symbol found"
            );
            DecodeOutcome::Success {
                scale_factor: preview.scale_factor,
                thumbnail: Some(preview),
                symbol,
            }
        }
        // The common case at camera frame rates; logging it would flood
        // diagnostics.
        Err(EngineError::SymbolNotFound) => DecodeOutcome::Failure,
        Err(EngineError::Fault(reason)) => {
            warn!(%reason, "decode engine fault");
            DecodeOutcome::Failure
        }
    }
}
