//! QR scanning.
//!
//! A [`Scanner`] polls frames and reports the first decoded payload through a
//! callback. [`FrameScanner`] is the built-in implementation over any
//! [`FrameSource`]. [`ScanSession`] owns a scanner for the lifetime of scan
//! mode: it starts scanning on entry, stops on exit (or drop), and holds a
//! decoded result until it is reset.

mod decode;
mod frames;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};

pub use decode::{decode_frame, decode_luma};
pub use frames::{FrameSource, FrameStream, ImageFileSource, MemoryFrameSource};

/// Which camera to prefer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera.
    User,
    /// Rear camera.
    #[default]
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::User => write!(f, "user"),
            Self::Environment => write!(f, "environment"),
        }
    }
}

/// How the scanner captures frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConstraints {
    /// Preferred camera.
    pub facing_mode: FacingMode,
    /// Time between frames.
    pub frame_interval: Duration,
    /// Edge of the centered scan box in pixels.
    pub qrbox: u32,
}

impl Default for ScanConstraints {
    fn default() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            frame_interval: Duration::from_millis(100),
            qrbox: 250,
        }
    }
}

impl From<&Config> for ScanConstraints {
    fn from(config: &Config) -> Self {
        Self {
            facing_mode: config.scan.facing_mode,
            frame_interval: config.frame_interval(),
            qrbox: config.scan.qrbox,
        }
    }
}

/// Called with the decoded text.
pub type DecodeCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Called when scanning fails after it started.
pub type ErrorCallback = Arc<dyn Fn(Error) + Send + Sync>;

/// A handle to a running scan.
///
/// Cheap to clone; all clones share the same stop signal.
#[derive(Debug, Clone, Default)]
pub struct ScanHandle {
    stop_signal: Arc<AtomicBool>,
    finished: Arc<AtomicBool>,
}

impl ScanHandle {
    /// Create a new handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal the capture loop to stop.
    pub fn stop(&self) {
        self.stop_signal.store(true, Ordering::SeqCst);
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.stop_signal.load(Ordering::SeqCst)
    }

    /// Check if the capture loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Whether frames are still being polled.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        !self.should_stop() && !self.is_finished()
    }

    fn finish(&self) {
        self.finished.store(true, Ordering::SeqCst);
    }
}

/// A QR scanner.
#[async_trait::async_trait]
pub trait Scanner: Send + Sync + std::fmt::Debug {
    /// Start scanning. `on_decode` fires at most once; the scan ends after it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ScanStart`] if capture can't begin.
    async fn start(
        &self,
        constraints: ScanConstraints,
        on_decode: DecodeCallback,
        on_error: ErrorCallback,
    ) -> Result<ScanHandle>;

    /// Stop a scan started by this scanner.
    fn stop(&self, handle: &ScanHandle);
}

enum FrameOutcome {
    Exhausted,
    Unreadable(Error),
    Empty,
    Decoded(String),
}

/// Polls a [`FrameSource`] on a tokio task and decodes each frame.
#[derive(Debug, Clone)]
pub struct FrameScanner {
    source: Arc<dyn FrameSource>,
}

impl FrameScanner {
    /// Create a scanner over `source`.
    #[must_use]
    pub fn new(source: Arc<dyn FrameSource>) -> Self {
        Self { source }
    }
}

#[async_trait::async_trait]
impl Scanner for FrameScanner {
    async fn start(
        &self,
        constraints: ScanConstraints,
        on_decode: DecodeCallback,
        on_error: ErrorCallback,
    ) -> Result<ScanHandle> {
        if constraints.frame_interval.is_zero() {
            return Err(Error::scan_start("frame interval must be positive"));
        }
        let mut stream = self.source.open(constraints.facing_mode)?;
        let handle = ScanHandle::new();
        let task_handle = handle.clone();
        let qrbox = constraints.qrbox;

        info!(
            "Scanning every {:?} (facing {}, box {} px)",
            constraints.frame_interval, constraints.facing_mode, qrbox
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(constraints.frame_interval);
            loop {
                ticker.tick().await;
                if task_handle.should_stop() {
                    debug!("Scan stopped");
                    break;
                }

                let polled = tokio::task::spawn_blocking(move || {
                    let outcome = match stream.next_frame() {
                        None => FrameOutcome::Exhausted,
                        Some(Err(e)) => FrameOutcome::Unreadable(e),
                        Some(Ok(frame)) => match decode_frame(&frame, qrbox) {
                            Some(text) => FrameOutcome::Decoded(text),
                            None => FrameOutcome::Empty,
                        },
                    };
                    (stream, outcome)
                })
                .await;

                let outcome = match polled {
                    Ok((returned, outcome)) => {
                        stream = returned;
                        outcome
                    }
                    Err(e) => {
                        on_error(Error::internal(format!("frame worker failed: {e}")));
                        break;
                    }
                };

                if task_handle.should_stop() {
                    debug!("Scan stopped; discarding last frame");
                    break;
                }

                match outcome {
                    FrameOutcome::Empty => {}
                    FrameOutcome::Unreadable(e) => warn!("Skipping frame: {}", e),
                    FrameOutcome::Exhausted => {
                        on_error(Error::ScanExhausted);
                        break;
                    }
                    FrameOutcome::Decoded(text) => {
                        info!("Decoded {} characters", text.len());
                        task_handle.stop();
                        on_decode(text);
                        break;
                    }
                }
            }
            task_handle.finish();
        });

        Ok(handle)
    }

    fn stop(&self, handle: &ScanHandle) {
        handle.stop();
    }
}

/// Where a [`ScanSession`] stands.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ScanState {
    /// Not scanning.
    #[default]
    Idle,
    /// Waiting for a code.
    Scanning,
    /// A code was read. Terminal until reset.
    Decoded(String),
    /// Scanning failed; the message is meant for the user.
    Failed(String),
}

impl ScanState {
    /// Whether the state is waiting on the scanner.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Scanning)
    }
}

/// The scan mode of the app.
#[derive(Debug)]
pub struct ScanSession {
    scanner: Arc<dyn Scanner>,
    constraints: ScanConstraints,
    state: Arc<watch::Sender<ScanState>>,
    handle: Option<ScanHandle>,
}

impl ScanSession {
    /// Create an idle session.
    #[must_use]
    pub fn new(scanner: Arc<dyn Scanner>, constraints: ScanConstraints) -> Self {
        let (state, _) = watch::channel(ScanState::Idle);
        Self {
            scanner,
            constraints,
            state: Arc::new(state),
            handle: None,
        }
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ScanState {
        self.state.borrow().clone()
    }

    /// Watch state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ScanState> {
        self.state.subscribe()
    }

    /// Enter scan mode and start the scanner.
    ///
    /// Does nothing while a scan is running or after a decode; use
    /// [`reset`](Self::reset) to scan again. A start failure is recorded as
    /// [`ScanState::Failed`].
    pub async fn enter(&mut self) {
        match &*self.state.borrow() {
            ScanState::Scanning => return,
            ScanState::Decoded(_) => {
                debug!("Holding decoded result; reset to scan again");
                return;
            }
            ScanState::Idle | ScanState::Failed(_) => {}
        }

        self.state.send_replace(ScanState::Scanning);

        let decoded = Arc::clone(&self.state);
        let on_decode: DecodeCallback = Arc::new(move |text: String| {
            decoded.send_replace(ScanState::Decoded(text));
        });
        let failed = Arc::clone(&self.state);
        let on_error: ErrorCallback = Arc::new(move |err: Error| {
            warn!("Scan failed: {}", err);
            failed.send_replace(ScanState::Failed(err.to_string()));
        });

        match self.scanner.start(self.constraints, on_decode, on_error).await {
            Ok(handle) => self.handle = Some(handle),
            Err(err) => {
                warn!("Could not start scanner: {}", err);
                self.state.send_replace(ScanState::Failed(err.to_string()));
            }
        }
    }

    /// Leave scan mode, stopping the scanner. A decoded result is kept.
    pub fn leave(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scanner.stop(&handle);
        }
        if self.state.borrow().is_pending() {
            self.state.send_replace(ScanState::Idle);
        }
    }

    /// Clear any result or error and scan again.
    pub async fn reset(&mut self) {
        self.leave();
        self.state.send_replace(ScanState::Idle);
        self.enter().await;
    }

    /// Wait until the session is no longer scanning and return that state.
    ///
    /// # Errors
    ///
    /// Returns an error if the state channel closes, which can't happen
    /// while `self` is alive.
    pub async fn wait(&self) -> Result<ScanState> {
        let mut rx = self.subscribe();
        let state = rx
            .wait_for(|state| !state.is_pending())
            .await
            .map_err(|_| Error::internal("scan state channel closed"))?;
        Ok(state.clone())
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            self.scanner.stop(&handle);
        }
    }
}
