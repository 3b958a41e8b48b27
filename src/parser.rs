//! Keyword parsing for fit modes, anchors and cross-origin modes.

use std::fmt;
use std::str::FromStr;

use crate::loader::CrossOrigin;
use crate::sizing::{Anchor, FitMode, HorizontalAnchor, VerticalAnchor};

/// Error type for keyword parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    /// Not one of `fill`, `cover` or `contain`
    #[error("unknown fit mode `{0}`, expected fill, cover or contain")]
    UnknownFitMode(String),
    /// A token of an anchor string is not a position keyword
    #[error("unknown anchor keyword `{token}` in `{input}`")]
    UnknownAnchor { token: String, input: String },
    /// Not a valid cross-origin mode
    #[error("unknown cross-origin mode `{0}`, expected none, anonymous or use-credentials")]
    UnknownCrossOrigin(String),
}

impl FromStr for FitMode {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fill" => Ok(FitMode::Fill),
            "cover" => Ok(FitMode::Cover),
            "contain" => Ok(FitMode::Contain),
            _ => Err(ParseError::UnknownFitMode(s.to_string())),
        }
    }
}

impl fmt::Display for FitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FitMode::Fill => "fill",
            FitMode::Cover => "cover",
            FitMode::Contain => "contain",
        })
    }
}

/// Parse an anchor such as `"right bottom"`, `"top"` or `"center center"`.
///
/// Tokens are whitespace separated and their order does not matter. Each
/// axis is read on its own: an axis no token names stays centered, and when
/// the same axis is named twice the later token wins.
///
/// ## Example
///
/// ```rust
/// use flipbook_core::{Anchor, HorizontalAnchor, VerticalAnchor};
///
/// let anchor: Anchor = "bottom left".parse().unwrap();
/// assert_eq!(anchor.horizontal, HorizontalAnchor::Left);
/// assert_eq!(anchor.vertical, VerticalAnchor::Bottom);
///
/// let anchor: Anchor = "left".parse().unwrap();
/// assert_eq!(anchor.vertical, VerticalAnchor::Center);
/// ```
impl FromStr for Anchor {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut anchor = Anchor::CENTER;
        for token in s.split_whitespace() {
            match token.to_ascii_lowercase().as_str() {
                "left" => anchor.horizontal = HorizontalAnchor::Left,
                "right" => anchor.horizontal = HorizontalAnchor::Right,
                "top" => anchor.vertical = VerticalAnchor::Top,
                "bottom" => anchor.vertical = VerticalAnchor::Bottom,
                "center" => {}
                _ => {
                    return Err(ParseError::UnknownAnchor {
                        token: token.to_string(),
                        input: s.to_string(),
                    })
                }
            }
        }
        Ok(anchor)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = match self.horizontal {
            HorizontalAnchor::Left => "left",
            HorizontalAnchor::Center => "center",
            HorizontalAnchor::Right => "right",
        };
        let v = match self.vertical {
            VerticalAnchor::Top => "top",
            VerticalAnchor::Center => "center",
            VerticalAnchor::Bottom => "bottom",
        };
        write!(f, "{h} {v}")
    }
}

impl TryFrom<String> for Anchor {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Anchor> for String {
    fn from(anchor: Anchor) -> Self {
        anchor.to_string()
    }
}

impl FromStr for CrossOrigin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" => Ok(CrossOrigin::None),
            "" | "anonymous" | "true" => Ok(CrossOrigin::Anonymous),
            "use-credentials" => Ok(CrossOrigin::UseCredentials),
            _ => Err(ParseError::UnknownCrossOrigin(s.to_string())),
        }
    }
}
