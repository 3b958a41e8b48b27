//! Image loading collaborator and load bookkeeping.
//!
//! All frames are requested up front. Completions arrive later, one at a
//! time and in any order, and are tracked by count rather than by index.

use std::marker::PhantomData;

use crate::data::ImageAsset;

/// Credentials mode for cross-origin image requests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum CrossOrigin {
    /// Plain request, no CORS attribute
    #[default]
    None,
    /// CORS request without credentials
    Anonymous,
    /// CORS request with credentials
    UseCredentials,
}

impl CrossOrigin {
    /// Value for an `<img crossorigin>` attribute, if one should be set.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            CrossOrigin::None => None,
            CrossOrigin::Anonymous => Some("anonymous"),
            CrossOrigin::UseCredentials => Some("use-credentials"),
        }
    }
}

/// Why a frame failed to load.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The loader reported a failure
    #[error("failed to load image: {0}")]
    Failed(String),
    /// The load timeout expired first
    #[error("timed out waiting for image")]
    TimedOut,
}

/// Resolves frame identifiers to decoded images.
///
/// Implement this trait for your platform (`<img>` elements, file decoding,
/// an asset server, ...). `request` must not block: report each outcome
/// later through [`crate::Player::on_image_loaded`] or
/// [`crate::Player::on_image_failed`] with the same `index`.
///
/// No `Send` bounds, so it works in single-threaded WASM contexts.
pub trait ImageLoader {
    /// Decoded image handle produced by this loader
    type Image;

    /// Start loading the frame at `index`.
    fn request(&mut self, index: usize, id: &str, cross_origin: CrossOrigin);
}

/// A request captured by [`RecordingLoader`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadRequest {
    pub index: usize,
    pub id: String,
    pub cross_origin: CrossOrigin,
}

/// Loader that only records requests.
///
/// The host (or a test) decides when and how each one completes.
#[derive(Clone, Debug)]
pub struct RecordingLoader<I> {
    requests: Vec<LoadRequest>,
    _image: PhantomData<fn() -> I>,
}

impl<I> Default for RecordingLoader<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> RecordingLoader<I> {
    /// Create an empty loader.
    pub fn new() -> Self {
        Self {
            requests: Vec::new(),
            _image: PhantomData,
        }
    }

    /// Requests not yet taken.
    #[inline]
    pub fn requests(&self) -> &[LoadRequest] {
        &self.requests
    }

    /// Take every recorded request.
    pub fn take_requests(&mut self) -> Vec<LoadRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl<I> ImageLoader for RecordingLoader<I> {
    type Image = I;

    fn request(&mut self, index: usize, id: &str, cross_origin: CrossOrigin) {
        self.requests.push(LoadRequest {
            index,
            id: id.to_string(),
            cross_origin,
        });
    }
}

/// Loading phase indicator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadingPhase {
    /// Nothing requested yet
    Idle,
    /// Requests issued, some still outstanding
    Loading,
    /// Every frame loaded
    Complete,
    /// Every request settled but at least one failed
    Stalled,
}

/// Progress counters for a loading session
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadingProgress {
    /// Frames decoded successfully
    pub loaded: usize,
    /// Frames that failed
    pub failed: usize,
    /// Frames requested
    pub total: usize,
}

impl LoadingProgress {
    /// Create a new loading progress tracker
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset progress for a new loading session
    pub fn reset(&mut self, total: usize) {
        self.loaded = 0;
        self.failed = 0;
        self.total = total;
    }

    /// Loaded fraction in `0.0..=1.0`; an empty session counts as done.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.loaded as f64 / self.total as f64
        }
    }

    /// Loaded percentage (0-100)
    pub fn percent(&self) -> u8 {
        (self.fraction() * 100.0) as u8
    }

    /// Every request has either loaded or failed
    pub fn is_settled(&self) -> bool {
        self.loaded + self.failed >= self.total
    }

    /// Format loading message
    pub fn message(&self) -> String {
        let mut msg = format!(
            "Loading frames... {} / {} ({}%)",
            self.loaded,
            self.total,
            self.percent()
        );
        if self.failed > 0 {
            msg.push_str(&format!(", {} failed", self.failed));
        }
        msg
    }
}

#[derive(Clone, Debug)]
enum Slot<I> {
    Pending,
    Loaded(ImageAsset<I>),
    Failed(LoadError),
}

/// Per-frame load state for one player.
#[derive(Clone, Debug)]
pub struct FrameLoaderState<I> {
    phase: LoadingPhase,
    progress: LoadingProgress,
    slots: Vec<Slot<I>>,
}

impl<I> Default for FrameLoaderState<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> FrameLoaderState<I> {
    /// Create a new loader state
    pub fn new() -> Self {
        Self {
            phase: LoadingPhase::Idle,
            progress: LoadingProgress::new(),
            slots: Vec::new(),
        }
    }

    /// Start a session expecting `total` completions.
    pub fn start_loading(&mut self, total: usize) {
        self.progress.reset(total);
        self.slots.clear();
        self.slots.resize_with(total, || Slot::Pending);
        self.phase = LoadingPhase::Loading;
        self.update_phase();
    }

    /// Record a successful load.
    ///
    /// Returns false, leaving state untouched, when `index` is out of range,
    /// already settled, or no session is running.
    pub fn complete(&mut self, index: usize, asset: ImageAsset<I>) -> bool {
        if !self.accepts(index) {
            return false;
        }
        self.slots[index] = Slot::Loaded(asset);
        self.progress.loaded += 1;
        self.update_phase();
        true
    }

    /// Record a failed load. Same acceptance rules as [`Self::complete`].
    pub fn fail(&mut self, index: usize, error: LoadError) -> bool {
        if !self.accepts(index) {
            return false;
        }
        self.slots[index] = Slot::Failed(error);
        self.progress.failed += 1;
        self.update_phase();
        true
    }

    /// Fail every frame still pending, returning their indices.
    pub fn fail_pending(&mut self, error: LoadError) -> Vec<usize> {
        let pending: Vec<usize> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| matches!(slot, Slot::Pending))
            .map(|(i, _)| i)
            .collect();
        for &i in &pending {
            self.fail(i, error.clone());
        }
        pending
    }

    /// Put failed frames back to pending for another attempt.
    ///
    /// Returns the indices to re-request.
    pub fn retry_failed(&mut self) -> Vec<usize> {
        let mut retried = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if matches!(slot, Slot::Failed(_)) {
                *slot = Slot::Pending;
                retried.push(i);
            }
        }
        if !retried.is_empty() {
            self.progress.failed -= retried.len();
            self.phase = LoadingPhase::Loading;
        }
        retried
    }

    /// Current loading phase
    #[inline]
    pub fn phase(&self) -> LoadingPhase {
        self.phase
    }

    /// Current counters
    #[inline]
    pub fn progress(&self) -> &LoadingProgress {
        &self.progress
    }

    /// Get the loaded asset for a frame
    pub fn asset(&self, index: usize) -> Option<&ImageAsset<I>> {
        match self.slots.get(index) {
            Some(Slot::Loaded(asset)) => Some(asset),
            _ => None,
        }
    }

    /// Get the failure recorded for a frame
    pub fn error(&self, index: usize) -> Option<&LoadError> {
        match self.slots.get(index) {
            Some(Slot::Failed(err)) => Some(err),
            _ => None,
        }
    }

    fn accepts(&self, index: usize) -> bool {
        self.phase == LoadingPhase::Loading && matches!(self.slots.get(index), Some(Slot::Pending))
    }

    fn update_phase(&mut self) {
        if self.phase != LoadingPhase::Loading || !self.progress.is_settled() {
            return;
        }
        self.phase = if self.progress.failed == 0 {
            LoadingPhase::Complete
        } else {
            LoadingPhase::Stalled
        };
    }
}
