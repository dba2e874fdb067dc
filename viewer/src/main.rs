mod capture_loop;
mod display;
mod grabber;

use capture_loop::{CaptureLoop, LoopSettings};
use display::MinifbDisplay;
use grabber::ScreenGrabber;
use region_view_common::config::Config;
use std::path::PathBuf;
use tracing::{error, info};

fn main() {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let config = match Config::load_or_default(config_path.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.parse().unwrap_or_default()),
        )
        .init();

    let region = config.capture.region();
    info!(
        region = %region,
        window_title = config.display.window_title,
        wait_key_ms = config.display.wait_key_ms,
        "starting region-view"
    );

    let grabber = match ScreenGrabber::new() {
        Ok(g) => g,
        Err(e) => {
            error!(error = %e, "failed to initialise screen capture");
            std::process::exit(1);
        }
    };

    let mut capture_loop = CaptureLoop::new(
        grabber,
        MinifbDisplay::new(),
        region,
        LoopSettings::from(&config.display),
    );

    match capture_loop.run() {
        Ok(frames) => info!(frames, "capture loop finished"),
        Err(e) => {
            error!(error = %e, "capture loop failed");
            std::process::exit(1);
        }
    }
}
