//! Core data structures for image frames.

use crate::sizing::Size;

/// Ordered frame identifiers (filenames or URLs).
pub type FrameList = Vec<String>;

/// A decoded frame together with its natural size.
///
/// `H` is whatever handle the drawing surface knows how to draw: an
/// `HtmlImageElement` on the web, an `RgbaImage` natively, or a plain id in
/// tests. Assets are created once a load completes and never change after.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageAsset<H> {
    /// Identifier the asset was requested with
    pub id: String,
    /// Intrinsic width in pixels
    pub natural_width: u32,
    /// Intrinsic height in pixels
    pub natural_height: u32,
    /// Decoded image handle
    pub image: H,
}

impl<H> ImageAsset<H> {
    /// Create a new asset.
    pub fn new(id: impl Into<String>, natural_width: u32, natural_height: u32, image: H) -> Self {
        Self {
            id: id.into(),
            natural_width,
            natural_height,
            image,
        }
    }

    /// Natural size as a [`Size`].
    #[inline]
    pub fn natural_size(&self) -> Size {
        Size::from((self.natural_width, self.natural_height))
    }
}
