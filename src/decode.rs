//! Native frame loading from disk, decoded with the `image` crate.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use image::RgbaImage;

use crate::loader::{CrossOrigin, ImageLoader, LoadError};
use crate::render::Surface;
use crate::timer::Timer;
use crate::{ImageAsset, Player};

type Outcome = (usize, Result<ImageAsset<RgbaImage>, LoadError>);

/// Loads frames from files relative to a root directory.
///
/// Decoding happens inside [`request`](ImageLoader::request); outcomes are
/// queued and handed to the player by [`deliver`](Self::deliver), so the
/// player never sees a completion while it is still issuing requests.
#[derive(Debug)]
pub struct FileImageLoader {
    root: PathBuf,
    queue: VecDeque<Outcome>,
}

impl FileImageLoader {
    /// Resolve frame ids against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            queue: VecDeque::new(),
        }
    }

    /// Root directory ids are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of outcomes waiting for delivery.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Hand every queued outcome to `player`.
    pub fn deliver<S, T>(&mut self, player: &mut Player<S, T>)
    where
        S: Surface<Image = RgbaImage>,
        T: Timer,
    {
        while let Some((index, outcome)) = self.queue.pop_front() {
            match outcome {
                Ok(asset) => player.on_image_loaded(index, asset),
                Err(err) => player.on_image_failed(index, err),
            }
        }
    }

    fn decode(&self, id: &str) -> Result<ImageAsset<RgbaImage>, LoadError> {
        let path = self.root.join(id);
        let image = image::open(&path)
            .map_err(|err| LoadError::Failed(format!("{}: {err}", path.display())))?
            .to_rgba8();
        let (width, height) = image.dimensions();
        Ok(ImageAsset::new(id, width, height, image))
    }
}

impl ImageLoader for FileImageLoader {
    type Image = RgbaImage;

    fn request(&mut self, index: usize, id: &str, _cross_origin: CrossOrigin) {
        let outcome = self.decode(id);
        if let Err(err) = &outcome {
            log::debug!("decoding `{id}` failed: {err}");
        }
        self.queue.push_back((index, outcome));
    }
}
