use region_view_common::frame::DisplayFrame;
use std::time::Duration;

/// On-screen sink for converted frames plus the keyboard poll that goes
/// with it.
pub trait FrameDisplay {
    /// Show `frame` in the window named `title`, opening it if needed.
    fn show(&mut self, title: &str, frame: &DisplayFrame) -> Result<(), DisplayError>;

    /// Block for at most `timeout` waiting for a character. Returns the most
    /// recent character code seen, or `None`.
    fn wait_key(&mut self, timeout: Duration) -> Result<Option<u32>, DisplayError>;

    /// Close every window this display opened.
    fn close_all(&mut self);
}

#[derive(Debug, thiserror::Error)]
pub enum DisplayError {
    #[error("failed to open window: {0}")]
    Window(String),
    #[error("failed to present frame: {0}")]
    Update(String),
    #[error("window was closed")]
    WindowClosed,
}
