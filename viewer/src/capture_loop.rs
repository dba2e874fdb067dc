use region_view_common::config::DisplayConfig;
use region_view_common::frame::{rgba_to_bgr, CaptureRegion, DisplayFrame, Frame};
use std::time::Duration;
use tracing::{debug, info};

use crate::display::{DisplayError, FrameDisplay};
use crate::grabber::{CaptureError, FrameGrabber};

#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("capture failed: {0}")]
    Capture(#[from] CaptureError),
    #[error("display failed: {0}")]
    Display(#[from] DisplayError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Terminated,
}

/// Per-window settings the loop needs on every iteration.
#[derive(Debug, Clone)]
pub struct LoopSettings {
    pub window_title: String,
    pub wait_key: Duration,
    pub quit_key: char,
}

impl From<&DisplayConfig> for LoopSettings {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            window_title: config.window_title.clone(),
            wait_key: Duration::from_millis(config.wait_key_ms),
            quit_key: config.quit_key,
        }
    }
}

/// Grab, convert, show, poll. Repeats until the quit key is seen or a
/// collaborator fails.
///
/// The region is fixed at construction. Nothing is carried between
/// iterations except the iteration count.
pub struct CaptureLoop<G, D> {
    grabber: G,
    display: D,
    region: CaptureRegion,
    settings: LoopSettings,
    state: LoopState,
    iterations: u64,
}

impl<G: FrameGrabber, D: FrameDisplay> CaptureLoop<G, D> {
    pub fn new(grabber: G, display: D, region: CaptureRegion, settings: LoopSettings) -> Self {
        Self {
            grabber,
            display,
            region,
            settings,
            state: LoopState::Running,
            iterations: 0,
        }
    }

    pub fn capture_one(&mut self) -> Result<Frame, ViewerError> {
        Ok(self.grabber.grab(&self.region)?)
    }

    pub fn convert(frame: &Frame) -> DisplayFrame {
        rgba_to_bgr(frame)
    }

    pub fn render(&mut self, frame: &DisplayFrame) -> Result<(), ViewerError> {
        self.display.show(&self.settings.window_title, frame)?;
        info!("Capturing at {}", self.region);
        Ok(())
    }

    /// Only the low byte of the key code is compared, so the match is exact
    /// and case-sensitive: 'Q' does not quit when the quit key is 'q'.
    pub fn poll_quit(&mut self) -> Result<bool, ViewerError> {
        let key = self.display.wait_key(self.settings.wait_key)?;
        Ok(key.is_some_and(|k| k & 0xFF == u32::from(self.settings.quit_key) & 0xFF))
    }

    /// Run one iteration. A terminated loop does no further work.
    pub fn step(&mut self) -> Result<LoopState, ViewerError> {
        if self.state == LoopState::Terminated {
            return Ok(self.state);
        }

        let frame = self.capture_one()?;
        let display_frame = Self::convert(&frame);
        drop(frame);
        self.render(&display_frame)?;
        self.iterations += 1;

        if self.poll_quit()? {
            debug!(iterations = self.iterations, "quit key pressed");
            self.display.close_all();
            self.state = LoopState::Terminated;
        }
        Ok(self.state)
    }

    /// Loop until quit. Returns the number of frames shown.
    ///
    /// Errors are returned as soon as they occur; windows are not closed on
    /// that path.
    pub fn run(&mut self) -> Result<u64, ViewerError> {
        info!(
            region = %self.region,
            grabber = self.grabber.name(),
            quit_key = %self.settings.quit_key,
            "entering capture loop"
        );
        while self.step()? == LoopState::Running {}
        Ok(self.iterations)
    }
}
