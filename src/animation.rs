//! Frame stepping for playback.

use std::time::Duration;

/// Default playback rate.
pub const DEFAULT_FPS: f64 = 25.0;

/// Shortest time between two frames.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Longest time between two frames, the largest delay a browser timer accepts.
pub const MAX_INTERVAL: Duration = Duration::from_millis(i32::MAX as u64);

/// Loop mode for animation playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoopMode {
    /// Stop at the end of the sequence
    #[default]
    Once,
    /// Wrap back to the first frame when reaching the end
    Loop,
}

impl From<bool> for LoopMode {
    fn from(looping: bool) -> Self {
        if looping {
            LoopMode::Loop
        } else {
            LoopMode::Once
        }
    }
}

/// What happened when the animation stepped past the current frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Advance {
    /// Moved to the next frame
    Next,
    /// Wrapped from the last frame back to the first
    Wrapped,
    /// Hit the end in [`LoopMode::Once`]; the index stays on the last frame
    Finished,
}

/// Platform-agnostic frame index bookkeeping.
///
/// This controller only knows which frame is current and what comes next.
/// It does not render and does not own a timer; [`crate::Player`] calls
/// [`advance`](Self::advance) once per tick at the rate given by
/// [`interval`](Self::interval).
///
/// ## Example
///
/// ```rust
/// use flipbook_core::{Advance, AnimationController, LoopMode};
///
/// let mut controller = AnimationController::new(12.0);
/// controller.set_frame_count(3);
/// controller.set_loop_mode(LoopMode::Loop);
///
/// assert_eq!(controller.advance(), Advance::Next);
/// assert_eq!(controller.advance(), Advance::Next);
/// assert_eq!(controller.advance(), Advance::Wrapped);
/// assert_eq!(controller.current_frame(), 0);
/// ```
#[derive(Clone, Debug)]
pub struct AnimationController {
    /// Current frame index
    current_frame: usize,
    /// Total number of frames
    frame_count: usize,
    /// Frames per second
    fps: f64,
    /// Loop mode
    loop_mode: LoopMode,
}

impl AnimationController {
    /// Create a new animation controller with the given FPS.
    ///
    /// A non-finite or non-positive rate falls back to [`DEFAULT_FPS`].
    pub fn new(fps: f64) -> Self {
        let mut controller = Self {
            current_frame: 0,
            frame_count: 0,
            fps: DEFAULT_FPS,
            loop_mode: LoopMode::Once,
        };
        controller.set_fps(fps);
        controller
    }

    /// Set the total number of frames.
    pub fn set_frame_count(&mut self, count: usize) {
        self.frame_count = count;
        // Clamp current frame to valid range
        if self.current_frame >= count {
            self.current_frame = count.saturating_sub(1);
        }
    }

    /// Get the total number of frames.
    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Set the playback FPS.
    pub fn set_fps(&mut self, fps: f64) {
        if fps.is_finite() && fps > 0.0 {
            self.fps = fps;
        } else {
            log::warn!("invalid frame rate {fps}, using {DEFAULT_FPS}");
            self.fps = DEFAULT_FPS;
        }
    }

    /// Get the current FPS.
    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Time between two frames, kept within [`MIN_INTERVAL`] and
    /// [`MAX_INTERVAL`].
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(1.0 / self.fps)
            .unwrap_or(MAX_INTERVAL)
            .clamp(MIN_INTERVAL, MAX_INTERVAL)
    }

    /// Set the loop mode.
    pub fn set_loop_mode(&mut self, mode: LoopMode) {
        self.loop_mode = mode;
    }

    /// Get the current loop mode.
    #[inline]
    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    /// Get the current frame index.
    #[inline]
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Set the current frame index.
    ///
    /// The frame will be clamped to the valid range.
    pub fn set_current_frame(&mut self, frame: usize) {
        self.current_frame = frame.min(self.frame_count.saturating_sub(1));
    }

    /// Step past the current frame.
    pub fn advance(&mut self) -> Advance {
        if self.current_frame + 1 < self.frame_count {
            self.current_frame += 1;
            return Advance::Next;
        }
        match self.loop_mode {
            LoopMode::Loop => {
                self.current_frame = 0;
                Advance::Wrapped
            }
            LoopMode::Once => Advance::Finished,
        }
    }
}
