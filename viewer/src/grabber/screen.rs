use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use region_view_common::frame::{CaptureRegion, Frame};
use screenshots::Screen;
use tracing::{debug, info};

use super::traits::{CaptureError, FrameGrabber};

/// Bounds of one monitor in virtual-desktop coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScreenBounds {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
}

impl ScreenBounds {
    fn contains(&self, left: i32, top: i32) -> bool {
        let dx = i64::from(left) - i64::from(self.x);
        let dy = i64::from(top) - i64::from(self.y);
        dx >= 0 && dy >= 0 && dx < i64::from(self.width) && dy < i64::from(self.height)
    }

    /// Part of a `width` x `height` area at local (x, y) that lies on this
    /// screen. (x, y) must be inside the screen.
    fn visible(&self, x: i32, y: i32, width: u32, height: u32) -> (u32, u32) {
        let room_x = self.width.saturating_sub(x.max(0) as u32);
        let room_y = self.height.saturating_sub(y.max(0) as u32);
        (width.min(room_x), height.min(room_y))
    }
}

/// Off-screen fill for the part of a region past the screen edge.
const OFF_SCREEN: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Bring a captured image to exactly `width` x `height`.
///
/// `captured` covers the visible `visible_width` x `visible_height` part of
/// the region, possibly at a higher pixel density on scaled displays. It is
/// resampled to the visible size and placed at the top-left of an opaque
/// black canvas of the full region size.
fn fit_to_region(
    captured: RgbaImage,
    visible_width: u32,
    visible_height: u32,
    width: u32,
    height: u32,
) -> RgbaImage {
    let visible = if captured.dimensions() == (visible_width, visible_height) {
        captured
    } else {
        imageops::resize(&captured, visible_width, visible_height, FilterType::Triangle)
    };
    if visible.dimensions() == (width, height) {
        return visible;
    }
    let mut canvas = RgbaImage::from_pixel(width, height, OFF_SCREEN);
    imageops::replace(&mut canvas, &visible, 0, 0);
    canvas
}

/// Pick the screen holding the region's top-left corner and translate the
/// region into that screen's local coordinates.
fn locate(screens: &[ScreenBounds], region: &CaptureRegion) -> Option<(usize, i32, i32)> {
    screens
        .iter()
        .position(|s| s.contains(region.left, region.top))
        .map(|i| (i, region.left - screens[i].x, region.top - screens[i].y))
}

/// Grabs regions of the virtual desktop through the `screenshots` crate.
///
/// Screens are enumerated once at construction and held for the lifetime of
/// the grabber.
pub struct ScreenGrabber {
    screens: Vec<Screen>,
    bounds: Vec<ScreenBounds>,
}

impl ScreenGrabber {
    pub fn new() -> Result<Self, CaptureError> {
        let screens = Screen::all().map_err(|e| CaptureError::Init(e.to_string()))?;
        if screens.is_empty() {
            return Err(CaptureError::Init("no screens reported".into()));
        }

        let bounds = screens
            .iter()
            .map(|s| {
                let d = s.display_info;
                info!(
                    id = d.id,
                    x = d.x,
                    y = d.y,
                    width = d.width,
                    height = d.height,
                    scale = d.scale_factor,
                    primary = d.is_primary,
                    "found monitor"
                );
                ScreenBounds {
                    x: d.x,
                    y: d.y,
                    width: d.width,
                    height: d.height,
                }
            })
            .collect();

        Ok(Self { screens, bounds })
    }
}

impl FrameGrabber for ScreenGrabber {
    fn grab(&mut self, region: &CaptureRegion) -> Result<Frame, CaptureError> {
        let (index, x, y) = locate(&self.bounds, region).ok_or(CaptureError::NoScreen {
            left: region.left,
            top: region.top,
        })?;

        let (visible_width, visible_height) =
            self.bounds[index].visible(x, y, region.width, region.height);

        let shot = self.screens[index]
            .capture_area(x, y, visible_width, visible_height)
            .map_err(|e| CaptureError::Grab(e.to_string()))?;

        // The capture crate pins its own `image` version, so hand the pixels
        // over as a raw buffer.
        let (got_width, got_height) = (shot.width(), shot.height());
        let captured = RgbaImage::from_raw(got_width, got_height, shot.into_raw())
            .ok_or_else(|| CaptureError::Grab("capture returned a truncated buffer".into()))?;

        if (got_width, got_height) != (region.width, region.height) {
            debug!(
                got_width,
                got_height,
                visible_width,
                visible_height,
                "fitting capture to region"
            );
        }
        let image = fit_to_region(
            captured,
            visible_width,
            visible_height,
            region.width,
            region.height,
        );

        debug!(screen = index, x, y, "grabbed region");
        Ok(Frame::from_raw(region.width, region.height, image.into_raw())?)
    }

    fn name(&self) -> &str {
        "screenshots"
    }
}
