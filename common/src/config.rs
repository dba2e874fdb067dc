use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::frame::CaptureRegion;

/// Config file picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Region of the virtual desktop to mirror. Defaults target the right half
/// of an extended monitor.
#[derive(Debug, Clone, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_top")]
    pub top: i32,
    #[serde(default = "default_left")]
    pub left: i32,
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_height")]
    pub height: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_window_title")]
    pub window_title: String,
    /// How long each iteration waits for a keypress.
    #[serde(default = "default_wait_key_ms")]
    pub wait_key_ms: u64,
    #[serde(default = "default_quit_key")]
    pub quit_key: char,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            top: default_top(),
            left: default_left(),
            width: default_width(),
            height: default_height(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            window_title: default_window_title(),
            wait_key_ms: default_wait_key_ms(),
            quit_key: default_quit_key(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl CaptureConfig {
    pub fn region(&self) -> CaptureRegion {
        CaptureRegion::new(self.top, self.left, self.width, self.height)
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    /// Load `explicit` if given, else `config.toml` if present, else defaults.
    ///
    /// An explicitly named file that is missing is an error; the implicit
    /// default file is optional.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_or_default_in(Path::new("."), explicit)
    }

    /// Same as [`Config::load_or_default`], looking for `config.toml` in `dir`.
    pub fn load_or_default_in(dir: &Path, explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let fallback = dir.join(DEFAULT_CONFIG_PATH);
        if fallback.is_file() {
            Self::load(&fallback)
        } else {
            debug!(dir = %dir.display(), "no config file, using defaults");
            Ok(Self::default())
        }
    }

    /// Only degenerate sizes are rejected. Whether the region lies on a real
    /// screen is left to the capture backend.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.width == 0 || self.capture.height == 0 {
            return Err(ConfigError::InvalidRegion(format!(
                "width and height must be positive, got {}x{}",
                self.capture.width, self.capture.height
            )));
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
    #[error("invalid capture region: {0}")]
    InvalidRegion(String),
}

// Default value functions
fn default_top() -> i32 {
    0
}
fn default_left() -> i32 {
    2780
}
fn default_width() -> u32 {
    320
}
fn default_height() -> u32 {
    320
}
fn default_window_title() -> String {
    "Test Capture".into()
}
fn default_wait_key_ms() -> u64 {
    1
}
fn default_quit_key() -> char {
    'q'
}
fn default_log_level() -> String {
    "info".into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_match_builtin_region() {
        let config = Config::default();
        assert_eq!(config.capture.region(), CaptureRegion::new(0, 2780, 320, 320));
        assert_eq!(config.display.window_title, "Test Capture");
        assert_eq!(config.display.wait_key_ms, 1);
        assert_eq!(config.display.quit_key, 'q');
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let file = write_config(
            r#"
            [capture]
            left = -1920
            width = 640

            [logging]
            level = "debug"
            "#,
        );
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.capture.region(), CaptureRegion::new(0, -1920, 640, 320));
        assert_eq!(config.display.window_title, "Test Capture");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn empty_file_is_all_defaults() {
        let file = write_config("");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.capture.region(), Config::default().capture.region());
    }

    #[test]
    fn quit_key_parses_from_string() {
        let file = write_config("[display]\nquit_key = \"x\"\nwait_key_ms = 5\n");
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.display.quit_key, 'x');
        assert_eq!(config.display.wait_key_ms, 5);
    }

    #[test]
    fn zero_height_rejected() {
        let file = write_config("[capture]\nheight = 0\n");
        assert!(matches!(
            Config::load(file.path()),
            Err(ConfigError::InvalidRegion(_))
        ));
    }

    #[test]
    fn malformed_toml_rejected() {
        let file = write_config("[capture\nwidth = ");
        assert!(matches!(Config::load(file.path()), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(matches!(
            Config::load_or_default(Some(&missing)),
            Err(ConfigError::ReadFile(..))
        ));
    }

    #[test]
    fn no_argument_and_no_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default_in(dir.path(), None).unwrap();
        assert_eq!(config.capture.region(), CaptureRegion::new(0, 2780, 320, 320));
        assert_eq!(config.display.quit_key, 'q');
    }

    #[test]
    fn no_argument_picks_up_config_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_PATH),
            "[capture]\ntop = 40\n[display]\nwindow_title = \"Mirror\"\n",
        )
        .unwrap();
        let config = Config::load_or_default_in(dir.path(), None).unwrap();
        assert_eq!(config.capture.region(), CaptureRegion::new(40, 2780, 320, 320));
        assert_eq!(config.display.window_title, "Mirror");
    }

    #[test]
    fn explicit_path_wins_over_config_toml() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_PATH), "[capture]\ntop = 40\n").unwrap();
        let file = write_config("[capture]\ntop = 7\n");
        let config = Config::load_or_default_in(dir.path(), Some(file.path())).unwrap();
        assert_eq!(config.capture.top, 7);
    }

    #[test]
    fn broken_config_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_PATH), "[capture\n").unwrap();
        assert!(matches!(
            Config::load_or_default_in(dir.path(), None),
            Err(ConfigError::Parse(_))
        ));
    }
}
