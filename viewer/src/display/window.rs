use minifb::{InputCallback, Window, WindowOptions};
use region_view_common::frame::DisplayFrame;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use tracing::debug;

use super::traits::{DisplayError, FrameDisplay};

/// Granularity of the event pump inside `wait_key`.
const POLL_STEP: Duration = Duration::from_millis(1);

/// No frame-rate cap: minifb would otherwise sleep inside every `update`,
/// stretching each key wait past its timeout.
const UNCAPPED_FPS: usize = 0;

/// Latest character typed into the window, shared with the input callback.
type KeySlot = Arc<Mutex<Option<u32>>>;

struct KeyCapture {
    slot: KeySlot,
}

impl InputCallback for KeyCapture {
    fn add_char(&mut self, uni_char: u32) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(uni_char);
        }
    }
}

/// Window backend over `minifb`.
///
/// The window is opened on the first `show` and reopened if the title or
/// frame size changes.
pub struct MinifbDisplay {
    window: Option<Window>,
    title: String,
    size: (usize, usize),
    key: KeySlot,
    buffer: Vec<u32>,
}

impl MinifbDisplay {
    pub fn new() -> Self {
        Self {
            window: None,
            title: String::new(),
            size: (0, 0),
            key: Arc::new(Mutex::new(None)),
            buffer: Vec::new(),
        }
    }

    fn open(&mut self, title: &str, width: usize, height: usize) -> Result<(), DisplayError> {
        let mut window = Window::new(title, width, height, WindowOptions::default())
            .map_err(|e| DisplayError::Window(e.to_string()))?;
        window.set_target_fps(UNCAPPED_FPS);
        window.set_input_callback(Box::new(KeyCapture {
            slot: Arc::clone(&self.key),
        }));
        debug!(title, width, height, "opened window");
        self.window = Some(window);
        self.title = title.to_owned();
        self.size = (width, height);
        Ok(())
    }

    fn take_key(&self) -> Option<u32> {
        self.key.lock().ok().and_then(|mut slot| slot.take())
    }
}

impl Default for MinifbDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDisplay for MinifbDisplay {
    fn show(&mut self, title: &str, frame: &DisplayFrame) -> Result<(), DisplayError> {
        let (width, height) = (frame.width() as usize, frame.height() as usize);
        if self.window.is_none() || self.title != title || self.size != (width, height) {
            self.open(title, width, height)?;
        }

        pack_0rgb(frame, &mut self.buffer);

        let window = self.window.as_mut().ok_or(DisplayError::WindowClosed)?;
        if !window.is_open() {
            return Err(DisplayError::WindowClosed);
        }
        window
            .update_with_buffer(&self.buffer, width, height)
            .map_err(|e| DisplayError::Update(e.to_string()))
    }

    fn wait_key(&mut self, timeout: Duration) -> Result<Option<u32>, DisplayError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(window) = self.window.as_mut() {
                window.update();
            }
            if let Some(key) = self.take_key() {
                return Ok(Some(key));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep((deadline - now).min(POLL_STEP));
        }
    }

    fn close_all(&mut self) {
        if self.window.take().is_some() {
            debug!(title = self.title, "closed window");
        }
    }
}

/// Pack BGR pixels into minifb's `0RGB` words, reusing `out`'s allocation.
fn pack_0rgb(frame: &DisplayFrame, out: &mut Vec<u32>) {
    out.clear();
    out.extend(
        frame
            .pixels()
            .map(|[b, g, r]| (u32::from(r) << 16) | (u32::from(g) << 8) | u32::from(b)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use region_view_common::frame::{rgba_to_bgr, Frame};

    fn display_frame(width: u32, height: u32, rgba: Vec<u8>) -> DisplayFrame {
        rgba_to_bgr(&Frame::from_raw(width, height, rgba).unwrap())
    }

    #[test]
    fn pack_places_red_in_high_byte() {
        let frame = display_frame(2, 1, vec![0x01, 0x02, 0x03, 0xFF, 0x80, 0x00, 0xFF, 0x00]);
        let mut out = Vec::new();
        pack_0rgb(&frame, &mut out);
        assert_eq!(out, vec![0x0001_0203, 0x0080_00FF]);
    }

    #[test]
    fn pack_reuses_buffer() {
        let frame = display_frame(1, 1, vec![1, 1, 1, 1]);
        let mut out = vec![7; 16];
        pack_0rgb(&frame, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn key_capture_keeps_latest_char() {
        let display = MinifbDisplay::new();
        let mut capture = KeyCapture {
            slot: Arc::clone(&display.key),
        };
        capture.add_char('a' as u32);
        capture.add_char('q' as u32);
        assert_eq!(display.take_key(), Some('q' as u32));
        assert_eq!(display.take_key(), None);
    }

    #[test]
    fn wait_without_window_times_out() {
        let mut display = MinifbDisplay::new();
        let start = Instant::now();
        let key = display.wait_key(Duration::from_millis(5)).unwrap();
        assert_eq!(key, None);
        assert!(start.elapsed() >= Duration::from_millis(5));
    }

    #[test]
    fn wait_returns_pending_key_without_sleeping() {
        let mut display = MinifbDisplay::new();
        if let Ok(mut slot) = display.key.lock() {
            *slot = Some('q' as u32);
        }
        let start = Instant::now();
        let key = display.wait_key(Duration::from_secs(5)).unwrap();
        assert_eq!(key, Some('q' as u32));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
