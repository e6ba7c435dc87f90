//! Fast SIMD-accelerated image resizing.
//!
//! Uses fast_image_resize, which is 5-14x faster than the image crate's
//! resize and picks AVX2/NEON when available. Works on any 8/16 bit or
//! `f32` `DynamicImage` without converting it first.

use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::OpError;
use crate::error::ConfigError;

/// Interpolation modes accepted by the resize layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interpolation {
    Linear,
    Area,
    Cubic,
}

impl Interpolation {
    fn algorithm(self) -> ResizeAlg {
        match self {
            Interpolation::Linear => ResizeAlg::Convolution(FilterType::Bilinear),
            Interpolation::Area => ResizeAlg::Convolution(FilterType::Box),
            Interpolation::Cubic => ResizeAlg::Convolution(FilterType::CatmullRom),
        }
    }
}

impl Default for Interpolation {
    fn default() -> Self {
        Interpolation::Linear
    }
}

impl fmt::Display for Interpolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Interpolation::Linear => write!(f, "linear"),
            Interpolation::Area => write!(f, "area"),
            Interpolation::Cubic => write!(f, "cubic"),
        }
    }
}

impl FromStr for Interpolation {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" | "inter_linear" => Ok(Interpolation::Linear),
            "area" | "inter_area" => Ok(Interpolation::Area),
            "cubic" | "inter_cubic" => Ok(Interpolation::Cubic),
            _ => Err(ConfigError::invalid("interpolation", s)),
        }
    }
}

/// Reusable resizer; keeps its scratch buffers between calls
pub struct FastResizer {
    resizer: Resizer,
}

impl FastResizer {
    pub fn new() -> Self {
        Self {
            resizer: Resizer::new(),
        }
    }

    /// Resize `image` to exactly `width` x `height`, keeping its color type.
    pub fn resize(
        &mut self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    ) -> Result<DynamicImage, OpError> {
        let failed = |reason: String| OpError::Resize {
            width,
            height,
            reason,
        };

        if image.width() == 0 || image.height() == 0 {
            return Err(failed("Invalid source dimensions".to_string()));
        }

        if width == 0 || height == 0 {
            return Err(failed("Invalid destination dimensions".to_string()));
        }

        if image.width() == width && image.height() == height {
            return Ok(image.clone());
        }

        let mut dst_image = DynamicImage::new(width, height, image.color());
        let options = ResizeOptions::new().resize_alg(interpolation.algorithm());

        self.resizer
            .resize(image, &mut dst_image, &options)
            .map_err(|e| failed(e.to_string()))?;

        Ok(dst_image)
    }
}

impl Default for FastResizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function for one-off resizing
pub fn resize(
    image: &DynamicImage,
    width: u32,
    height: u32,
    interpolation: Interpolation,
) -> Result<DynamicImage, OpError> {
    let mut resizer = FastResizer::new();
    resizer.resize(image, width, height, interpolation)
}
