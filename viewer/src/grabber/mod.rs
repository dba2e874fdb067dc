pub mod screen;
pub mod traits;

pub use screen::ScreenGrabber;
pub use traits::{CaptureError, FrameGrabber};
