//! Filename sequence expansion.
//!
//! Turns a `{first, last}` pair such as `frame_0001.png` / `frame_0120.png`
//! into the full ordered list of frame names. Both names must share the same
//! template around their last run of digits.

use std::ops::Range;

/// Why a `{first, last}` pair could not be expanded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SequenceError {
    /// `first` or `last` is empty
    #[error("first and last filenames are required")]
    MissingBound,
    /// The first filename has no digits
    #[error("the first filename `{0}` doesn't contain a number")]
    NoNumberInFirst(String),
    /// The last filename has no digits
    #[error("the last filename `{0}` doesn't contain a number")]
    NoNumberInLast(String),
    /// Text around the numbers differs
    #[error("the base-names of `{first}` and `{last}` don't match")]
    TemplateMismatch { first: String, last: String },
    /// Zero padding makes the width ambiguous
    #[error("wrong number of leading zeros: `{first}` vs `{last}`")]
    PaddingMismatch { first: String, last: String },
    /// A number does not fit in 64 bits
    #[error("frame number `{0}` is too large")]
    NumberTooLarge(String),
    /// A step of zero would never terminate
    #[error("step must be at least 1")]
    ZeroStep,
}

/// Input for sequence expansion.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SequenceDescriptor {
    /// First filename in the sequence (inclusive)
    #[cfg_attr(feature = "serde", serde(alias = "from"))]
    pub first: String,
    /// Last filename in the sequence (inclusive)
    #[cfg_attr(feature = "serde", serde(alias = "to"))]
    pub last: String,
    /// Emit every `step`-th frame
    #[cfg_attr(feature = "serde", serde(default = "default_step"))]
    pub step: u64,
}

#[cfg(feature = "serde")]
fn default_step() -> u64 {
    1
}

impl SequenceDescriptor {
    /// Create a descriptor stepping one frame at a time.
    pub fn new(first: impl Into<String>, last: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            last: last.into(),
            step: 1,
        }
    }

    /// Set the step between emitted frames.
    pub fn with_step(mut self, step: u64) -> Self {
        self.step = step;
        self
    }

    /// Expand into a frame list, logging and returning `[]` on failure.
    pub fn expand(&self) -> Vec<String> {
        expand_every(&self.first, &self.last, self.step)
    }

    /// Expand into a frame list, reporting why expansion failed.
    pub fn try_expand(&self) -> Result<Vec<String>, SequenceError> {
        try_expand_every(&self.first, &self.last, self.step)
    }
}

/// Where a player's frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum FrameSource {
    /// An explicit list of identifiers
    List(Vec<String>),
    /// A numbered filename range
    Sequence(SequenceDescriptor),
}

impl FrameSource {
    /// Resolve to the ordered list of frame identifiers.
    ///
    /// Sequence problems are logged and yield an empty list.
    pub fn into_frames(self) -> Vec<String> {
        match self {
            FrameSource::List(frames) => frames,
            FrameSource::Sequence(descriptor) => descriptor.expand(),
        }
    }

    /// Like [`into_frames`](Self::into_frames), but a descriptor that cannot
    /// be expanded is an error.
    pub fn try_into_frames(self) -> Result<Vec<String>, SequenceError> {
        match self {
            FrameSource::List(frames) => Ok(frames),
            FrameSource::Sequence(descriptor) => descriptor.try_expand(),
        }
    }
}

impl From<Vec<String>> for FrameSource {
    fn from(frames: Vec<String>) -> Self {
        FrameSource::List(frames)
    }
}

impl From<Vec<&str>> for FrameSource {
    fn from(frames: Vec<&str>) -> Self {
        FrameSource::List(frames.into_iter().map(str::to_owned).collect())
    }
}

impl From<SequenceDescriptor> for FrameSource {
    fn from(descriptor: SequenceDescriptor) -> Self {
        FrameSource::Sequence(descriptor)
    }
}

/// Expand `first..=last` into the full list of filenames.
///
/// Never fails: any problem is logged as a warning and an empty list is
/// returned, so a bad descriptor yields a player with nothing to show
/// rather than an error.
///
/// Numbers with a leading zero must keep the same digit count on both ends.
/// A lone `0` does not count as padded, so `img0.png` to `img10.png` expands
/// to eleven names.
///
/// ## Example
///
/// ```rust
/// use flipbook_core::expand;
///
/// let frames = expand("img08.png", "img11.png");
/// assert_eq!(frames, vec!["img08.png", "img09.png", "img10.png", "img11.png"]);
///
/// assert!(expand("a.png", "b.png").is_empty());
/// assert!(expand("img01.png", "img1.png").is_empty());
/// assert_eq!(expand("img0.png", "img10.png").len(), 11);
/// ```
pub fn expand(first: &str, last: &str) -> Vec<String> {
    expand_every(first, last, 1)
}

/// Like [`expand`], keeping every `step`-th frame.
pub fn expand_every(first: &str, last: &str, step: u64) -> Vec<String> {
    match try_expand_every(first, last, step) {
        Ok(frames) => frames,
        Err(err) => {
            log::warn!("can't parse the file sequence correctly, returning []: {err}");
            Vec::new()
        }
    }
}

/// Strict form of [`expand`].
pub fn try_expand(first: &str, last: &str) -> Result<Vec<String>, SequenceError> {
    try_expand_every(first, last, 1)
}

/// Strict form of [`expand_every`].
pub fn try_expand_every(first: &str, last: &str, step: u64) -> Result<Vec<String>, SequenceError> {
    if first.is_empty() || last.is_empty() {
        return Err(SequenceError::MissingBound);
    }
    if step == 0 {
        return Err(SequenceError::ZeroStep);
    }

    let a = last_number(first).ok_or_else(|| SequenceError::NoNumberInFirst(first.to_string()))?;
    let b = last_number(last).ok_or_else(|| SequenceError::NoNumberInLast(last.to_string()))?;

    let prefix = &first[..a.start];
    let suffix = &first[a.end..];
    if prefix != &last[..b.start] || suffix != &last[b.end..] {
        return Err(SequenceError::TemplateMismatch {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let digits_a = &first[a.clone()];
    let digits_b = &last[b.clone()];
    let padded = has_leading_zero(digits_a) || has_leading_zero(digits_b);
    if padded && digits_a.len() != digits_b.len() {
        return Err(SequenceError::PaddingMismatch {
            first: first.to_string(),
            last: last.to_string(),
        });
    }

    let num_a = parse_number(digits_a)?;
    let num_b = parse_number(digits_b)?;
    let width = digits_a.len();
    let step = usize::try_from(step).unwrap_or(usize::MAX);

    Ok((num_a..=num_b)
        .step_by(step)
        .map(|i| format!("{prefix}{i:0width$}{suffix}"))
        .collect())
}

/// Byte range of the last maximal run of ASCII digits.
fn last_number(name: &str) -> Option<Range<usize>> {
    let bytes = name.as_bytes();
    let end = bytes.iter().rposition(u8::is_ascii_digit)? + 1;
    let start = bytes[..end]
        .iter()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |i| i + 1);
    Some(start..end)
}

/// A single `0` is a plain zero, not padding.
#[inline]
fn has_leading_zero(digits: &str) -> bool {
    digits.len() > 1 && digits.starts_with('0')
}

fn parse_number(digits: &str) -> Result<u64, SequenceError> {
    digits
        .parse::<u64>()
        .map_err(|_| SequenceError::NumberTooLarge(digits.to_string()))
}
