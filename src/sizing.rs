//! Object-fit placement of an image inside a viewport.

/// Width and height in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    /// Create a new size.
    #[inline]
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Width divided by height.
    #[inline]
    pub fn aspect_ratio(&self) -> f64 {
        self.width / self.height
    }

    /// Returns true when both sides are finite and strictly positive.
    #[inline]
    pub fn is_drawable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

impl From<(u32, u32)> for Size {
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width as f64, height as f64)
    }
}

/// How an image is scaled into the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FitMode {
    /// Stretch to the viewport, ignoring aspect ratio
    Fill,
    /// Fill the viewport, cropping the overflowing axis
    #[default]
    Cover,
    /// Fit entirely inside the viewport, letterboxing the other axis
    Contain,
}

/// Horizontal anchor keyword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HorizontalAnchor {
    Left,
    #[default]
    Center,
    Right,
}

/// Vertical anchor keyword.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VerticalAnchor {
    Top,
    #[default]
    Center,
    Bottom,
}

/// Where the scaled image sits inside the viewport.
///
/// Parsed from an `object-position`-like string such as `"left top"` or
/// `"bottom"`; see [`crate::parser`]. An axis that is not named is centered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Anchor {
    pub horizontal: HorizontalAnchor,
    pub vertical: VerticalAnchor,
}

impl Anchor {
    /// Centered on both axes.
    pub const CENTER: Anchor = Anchor {
        horizontal: HorizontalAnchor::Center,
        vertical: VerticalAnchor::Center,
    };

    /// Create an anchor from its two axis keywords.
    pub const fn new(horizontal: HorizontalAnchor, vertical: VerticalAnchor) -> Self {
        Self { horizontal, vertical }
    }
}

/// Computed draw rectangle, in viewport pixels.
///
/// Offsets may be negative: with [`FitMode::Cover`] the image overflows the
/// viewport and the surface is expected to clip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    /// Left edge of the drawn image
    pub x: f64,
    /// Top edge of the drawn image
    pub y: f64,
    /// Drawn width
    pub width: f64,
    /// Drawn height
    pub height: f64,
}

/// Compute where and how large to draw `source` inside `target`.
///
/// Returns `None` when either size has a zero, negative or non-finite side,
/// since no meaningful scale exists.
///
/// ## Example
///
/// ```rust
/// use flipbook_core::{place, Anchor, FitMode, Size};
///
/// let p = place(Size::new(200.0, 100.0), Size::new(100.0, 100.0), FitMode::Cover, Anchor::CENTER).unwrap();
/// assert_eq!((p.width, p.height), (200.0, 100.0));
/// assert_eq!((p.x, p.y), (-50.0, 0.0));
/// ```
pub fn place(source: Size, target: Size, fit: FitMode, anchor: Anchor) -> Option<Placement> {
    if !source.is_drawable() || !target.is_drawable() {
        return None;
    }

    let (width, height) = scaled_size(source, target, fit);

    let x = match anchor.horizontal {
        HorizontalAnchor::Left => 0.0,
        HorizontalAnchor::Center => (target.width - width) / 2.0,
        HorizontalAnchor::Right => target.width - width,
    };
    let y = match anchor.vertical {
        VerticalAnchor::Top => 0.0,
        VerticalAnchor::Center => (target.height - height) / 2.0,
        VerticalAnchor::Bottom => target.height - height,
    };

    Some(Placement { x, y, width, height })
}

fn scaled_size(source: Size, target: Size, fit: FitMode) -> (f64, f64) {
    let canvas_ratio = target.aspect_ratio();
    let image_ratio = source.aspect_ratio();

    // Cover matches the axis the image is short on; contain the one it is long on.
    let match_height = match fit {
        FitMode::Fill => return (target.width, target.height),
        FitMode::Cover => image_ratio > canvas_ratio,
        FitMode::Contain => image_ratio < canvas_ratio,
    };

    if match_height {
        (target.height * image_ratio, target.height)
    } else {
        (target.width, target.width / image_ratio)
    }
}
