//! # flipbook-core
//!
//! Core image-sequence playback library.
//!
//! This crate provides platform-agnostic data structures and logic for:
//! - Expanding numbered filename ranges (`img_001.png` .. `img_120.png`)
//! - Placing an image in a viewport with cover/contain/fill and an anchor
//! - Loading every frame up front and playing them back as a flipbook
//!   (play, pause, resume, loop)
//! - Rendering to an HTML canvas (with optional web support)
//!
//! Drawing, image decoding and timers are supplied by the host through the
//! [`Surface`], [`ImageLoader`] and [`Timer`] traits. Diagnostics go through
//! the [`log`] facade; install any logger to see them.
//!
//! ## Features
//!
//! - `serde` - Enable serialization/deserialization for configuration
//! - `toml` - Parse [`PlayerConfig`] from TOML
//! - `web` - Enable web/WASM canvas rendering support
//! - `image` - Load and decode frames from disk
//!
//! ## Example
//!
//! ```rust,ignore
//! use flipbook_core::{Player, PlayerConfig, SequenceDescriptor};
//!
//! let config = PlayerConfig { fps: 12.0, loop_playback: true, play_on_load: true, ..Default::default() };
//! let mut player = Player::new(surface, timer, SequenceDescriptor::new("img/0001.jpg", "img/0120.jpg"), config);
//! player.subscribe(|event: &flipbook_core::PlayerEvent| println!("{event:?}"));
//! player.load(&mut loader);
//! ```

mod animation;
mod config;
mod data;
#[cfg(feature = "image")]
pub mod decode;
mod error;
mod loader;
mod parser;
mod player;
pub mod render;
mod sequence;
mod sizing;
mod timer;

pub use animation::{Advance, AnimationController, LoopMode, DEFAULT_FPS, MAX_INTERVAL, MIN_INTERVAL};
pub use config::{ConfigError, PlayerConfig};
pub use data::{FrameList, ImageAsset};
pub use error::{Error, Result};
pub use loader::{
    CrossOrigin, FrameLoaderState, ImageLoader, LoadError, LoadRequest, LoadingPhase, LoadingProgress, RecordingLoader,
};
pub use parser::ParseError;
pub use player::{Command, CommandQueue, PlaybackState, Player, PlayerEvent, PlayerObserver, PlayerState, SubscriptionId};
pub use render::{draw_fitted, DrawCommand, RecordingSurface, Surface};
pub use sequence::{expand, expand_every, try_expand, try_expand_every, FrameSource, SequenceDescriptor, SequenceError};
pub use sizing::{place, Anchor, FitMode, HorizontalAnchor, Placement, Size, VerticalAnchor};
pub use timer::{ManualTimer, Timer, TimerId};

#[cfg(feature = "web")]
pub use render::web::mount;
