use region_view_common::frame::{CaptureRegion, Frame, FrameError};

/// Source of screen pixels.
///
/// Implementations return a frame of exactly `region.width` x
/// `region.height` in RGBA layout, or an error. There is no retry at this
/// layer.
pub trait FrameGrabber {
    fn grab(&mut self, region: &CaptureRegion) -> Result<Frame, CaptureError>;

    /// Human-readable name for logging.
    fn name(&self) -> &str {
        "unnamed"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("failed to enumerate screens: {0}")]
    Init(String),
    #[error("no screen contains point ({left}, {top})")]
    NoScreen { left: i32, top: i32 },
    #[error("screen capture failed: {0}")]
    Grab(String),
    #[error(transparent)]
    Frame(#[from] FrameError),
}
