pub mod traits;
pub mod window;

pub use traits::{DisplayError, FrameDisplay};
pub use window::MinifbDisplay;
