//! Crop request types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::attachment::CropSource;

/// Target crop size, parsed from `WxH` or `W:H`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CropDimensions {
    pub width: u32,
    pub height: u32,
}

impl CropDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether these dimensions fit inside a source of the given size.
    pub fn fits_within(&self, source_width: u32, source_height: u32) -> bool {
        self.width <= source_width && self.height <= source_height
    }
}

impl fmt::Display for CropDimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for CropDimensions {
    type Err = CropDimensionsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (width, height) = s
            .split_once(['x', ':'])
            .ok_or_else(|| CropDimensionsParseError::InvalidFormat(s.to_string()))?;

        let width = parse_component(width, s)?;
        let height = parse_component(height, s)?;

        if width == 0 || height == 0 {
            return Err(CropDimensionsParseError::ZeroValue);
        }

        Ok(CropDimensions { width, height })
    }
}

fn parse_component(part: &str, whole: &str) -> Result<u32, CropDimensionsParseError> {
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CropDimensionsParseError::InvalidFormat(whole.to_string()));
    }
    part.parse()
        .map_err(|_| CropDimensionsParseError::InvalidNumber(part.to_string()))
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CropDimensionsParseError {
    #[error("Invalid crop format: {0}, expected 'WxH'")]
    InvalidFormat(String),
    #[error("Invalid number in crop dimensions: {0}")]
    InvalidNumber(String),
    #[error("Crop dimensions cannot have zero values")]
    ZeroValue,
}

/// Requested crop is larger than the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Crop dimensions ({requested}) cannot be larger than the original image ({source_width}x{source_height}).")]
pub struct CropTooLarge {
    pub requested: CropDimensions,
    pub source_width: u32,
    pub source_height: u32,
}

/// Pixel rectangle selected by a centered crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl CropRect {
    /// Center a `dims`-sized rectangle inside a `source_width` x `source_height` frame.
    ///
    /// Odd margins round down, so the extra pixel goes to the right/bottom.
    pub fn centered(
        source_width: u32,
        source_height: u32,
        dims: CropDimensions,
    ) -> Result<Self, CropTooLarge> {
        if !dims.fits_within(source_width, source_height) {
            return Err(CropTooLarge {
                requested: dims,
                source_width,
                source_height,
            });
        }

        let left = (source_width - dims.width) / 2;
        let top = (source_height - dims.height) / 2;
        Ok(Self {
            left,
            top,
            right: left + dims.width,
            bottom: top + dims.height,
        })
    }

    pub fn width(&self) -> u32 {
        self.right - self.left
    }

    pub fn height(&self) -> u32 {
        self.bottom - self.top
    }
}

/// A validated crop request, consumed by exactly one crop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropRequest {
    pub dimensions: CropDimensions,
    pub source: CropSource,
}

impl CropRequest {
    pub fn new(dimensions: CropDimensions, source: CropSource) -> Self {
        Self { dimensions, source }
    }

    /// Caption attached to the delivered artifact.
    pub fn caption(&self) -> String {
        format!("Cropped to: `{}`", self.dimensions)
    }
}
