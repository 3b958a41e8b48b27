//! Crate-level error type.

use crate::loader::LoadError;
use crate::parser::ParseError;
use crate::sequence::SequenceError;

/// Result alias that carries the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

/// Any failure surfaced by this crate.
///
/// Playback itself never fails; these come from the strict variants of the
/// soft-failing helpers and from configuration decoding.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A `{first, last}` pair could not be expanded.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
    /// A fit, anchor or cross-origin keyword was not recognised.
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// An image failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),
    /// A configuration document could not be decoded.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}
