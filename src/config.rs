//! Player configuration.

use std::time::Duration;

use crate::animation::DEFAULT_FPS;
use crate::loader::CrossOrigin;
use crate::sizing::{Anchor, FitMode};

/// Error decoding a configuration document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid player configuration: {0}")]
pub struct ConfigError(pub String);

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        Self(err.to_string())
    }
}

/// Construction-time options for a [`crate::Player`].
///
/// Every field has a default, so only the interesting ones need setting:
///
/// ```rust
/// use flipbook_core::{FitMode, PlayerConfig};
///
/// let config = PlayerConfig { fps: 12.0, fit: FitMode::Contain, ..Default::default() };
/// assert!(config.render_first_frame_on_load);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Playback rate in frames per second
    pub fps: f64,
    /// How frames are scaled into the viewport
    pub fit: FitMode,
    /// Where frames sit inside the viewport
    pub anchor: Anchor,
    /// Start playing once every frame has loaded
    pub play_on_load: bool,
    /// Draw `first_frame_index` once every frame has loaded
    pub render_first_frame_on_load: bool,
    /// Wrap around instead of stopping at the last frame
    #[cfg_attr(feature = "serde", serde(rename = "loop"))]
    pub loop_playback: bool,
    /// Frame shown first and used for size-to-first-image
    pub first_frame_index: usize,
    /// Viewport width override; `None` keeps the surface's width
    pub width: Option<u32>,
    /// Viewport height override; `None` keeps the surface's height
    pub height: Option<u32>,
    /// Resize the viewport to the first frame's natural size after loading
    pub size_to_first_image: bool,
    /// Credentials mode passed to the loader
    pub cross_origin: CrossOrigin,
    /// Give up on frames still loading after this many milliseconds
    pub load_timeout_ms: Option<u64>,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_FPS,
            fit: FitMode::Cover,
            anchor: Anchor::CENTER,
            play_on_load: false,
            render_first_frame_on_load: true,
            loop_playback: false,
            first_frame_index: 0,
            width: None,
            height: None,
            size_to_first_image: false,
            cross_origin: CrossOrigin::None,
            load_timeout_ms: None,
        }
    }
}

impl PlayerConfig {
    /// Parse a TOML document; missing keys take their defaults.
    #[cfg(feature = "toml")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Fix values that cannot be honoured for a list of `frame_count` frames.
    ///
    /// Invalid frame rates fall back to the default and an out-of-range
    /// first frame is clamped to the last one. Each fix is logged.
    pub fn normalized(mut self, frame_count: usize) -> Self {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            log::warn!("invalid frame rate {}, using {DEFAULT_FPS}", self.fps);
            self.fps = DEFAULT_FPS;
        }
        if frame_count > 0 && self.first_frame_index >= frame_count {
            log::warn!(
                "first frame index {} is past the last frame, using {}",
                self.first_frame_index,
                frame_count - 1
            );
            self.first_frame_index = frame_count - 1;
        }
        self
    }

    /// The load timeout as a duration, if any.
    pub fn load_timeout(&self) -> Option<Duration> {
        self.load_timeout_ms.map(Duration::from_millis)
    }
}
