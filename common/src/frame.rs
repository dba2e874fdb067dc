use image::RgbaImage;
use std::fmt;

/// Channels per pixel in a captured frame (R, G, B, A).
pub const CAPTURE_CHANNELS: usize = 4;
/// Channels per pixel in a frame ready for display (B, G, R).
pub const DISPLAY_CHANNELS: usize = 3;

/// Rectangle of the virtual desktop to capture, in pixels.
///
/// `top` and `left` are signed because monitors placed left of or above the
/// primary one have negative virtual-desktop origins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureRegion {
    pub top: i32,
    pub left: i32,
    pub width: u32,
    pub height: u32,
}

impl CaptureRegion {
    pub fn new(top: i32, left: i32, width: u32, height: u32) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }
}

impl fmt::Display for CaptureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{top: {}, left: {}, width: {}, height: {}}}",
            self.top, self.left, self.width, self.height
        )
    }
}

/// One captured pixel grid in RGBA layout.
#[derive(Debug, Clone)]
pub struct Frame {
    image: RgbaImage,
}

impl Frame {
    /// Wrap a raw RGBA buffer as produced by the capture backend.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let got = data.len();
        let expected = expected_len(width, height, CAPTURE_CHANNELS);
        let mismatch = FrameError::SizeMismatch {
            width,
            height,
            channels: CAPTURE_CHANNELS,
            got,
            expected,
        };
        if got != expected {
            return Err(mismatch);
        }
        let image = RgbaImage::from_raw(width, height, data).ok_or(mismatch)?;
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn channels(&self) -> usize {
        CAPTURE_CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.image.as_raw()
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }
}

/// A frame converted to the 3-channel BGR layout the display expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayFrame {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl DisplayFrame {
    #[cfg(test)]
    fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, FrameError> {
        let expected = expected_len(width, height, DISPLAY_CHANNELS);
        if data.len() != expected {
            return Err(FrameError::SizeMismatch {
                width,
                height,
                channels: DISPLAY_CHANNELS,
                got: data.len(),
                expected,
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        DISPLAY_CHANNELS
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Iterate over pixels in row-major order as `[b, g, r]`.
    pub fn pixels(&self) -> impl Iterator<Item = [u8; 3]> + '_ {
        self.data.chunks_exact(DISPLAY_CHANNELS).map(|c| [c[0], c[1], c[2]])
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        assert!(x < self.width && y < self.height, "pixel ({x}, {y}) out of bounds");
        let i = (y as usize * self.width as usize + x as usize) * DISPLAY_CHANNELS;
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }
}

/// Convert an RGBA frame to BGR: `[r, g, b, a]` becomes `[b, g, r]`.
///
/// Alpha is discarded. Dimensions are unchanged.
pub fn rgba_to_bgr(frame: &Frame) -> DisplayFrame {
    let mut data = Vec::with_capacity(expected_len(frame.width(), frame.height(), DISPLAY_CHANNELS));
    for px in frame.as_bytes().chunks_exact(CAPTURE_CHANNELS) {
        data.extend_from_slice(&[px[2], px[1], px[0]]);
    }
    DisplayFrame {
        width: frame.width(),
        height: frame.height(),
        data,
    }
}

fn expected_len(width: u32, height: u32, channels: usize) -> usize {
    width as usize * height as usize * channels
}

#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("pixel buffer is {got} bytes, expected {expected} for {width}x{height}x{channels}")]
    SizeMismatch {
        width: u32,
        height: u32,
        channels: usize,
        got: usize,
        expected: usize,
    },
}
