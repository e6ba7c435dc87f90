//! Deterministic geometric layers.

use image::DynamicImage;

use super::{finite, operation_error, positive};
use crate::core::layer::{kinds, map_each, ImageBatch, Layer, LayerInfo};
use crate::core::ops::{geometry, FastResizer, Interpolation};
use crate::core::snapshot::LayerSpec;
use crate::error::{ConfigError, ExecutionError};

/// Scale every image to a fixed `(width, height)`
pub struct Resize {
    info: LayerInfo,
    dim: (u32, u32),
    interpolation: Interpolation,
}

impl Resize {
    pub fn new(dim: (u32, u32), interpolation: Interpolation) -> Result<Self, ConfigError> {
        positive("dim", dim.0)?;
        positive("dim", dim.1)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::RESIZE,
                format!("Dim: ({}, {}), Interpolation: {}", dim.0, dim.1, interpolation),
            ),
            dim,
            interpolation,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }

    pub fn dim(&self) -> (u32, u32) {
        self.dim
    }
}

impl Layer for Resize {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        let mut resizer = FastResizer::new();
        map_each(images, |image| {
            resizer.resize(image, self.dim.0, self.dim.1, self.interpolation)
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Resize {
            name: self.info.name().to_string(),
            width: self.dim.0,
            height: self.dim.1,
            interpolation: self.interpolation,
        })
    }
}

/// Cut the `width` x `height` region at `(x, y)`; images it does not fit are dropped
pub struct Crop {
    info: LayerInfo,
    x: u32,
    y: u32,
    width: u32,
    height: u32,
}

impl Crop {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Result<Self, ConfigError> {
        positive("width", width)?;
        positive("height", height)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::CROP,
                format!("X: {}, Y: {}, W: {}, H: {}", x, y, width, height),
            ),
            x,
            y,
            width,
            height,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for Crop {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| {
            Ok(geometry::crop(image, self.x, self.y, self.width, self.height))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Crop {
            name: self.info.name().to_string(),
            x: self.x,
            y: self.y,
            width: self.width,
            height: self.height,
        })
    }
}

/// Constant-color border, white unless told otherwise
pub struct Padding {
    info: LayerInfo,
    top: u32,
    bottom: u32,
    left: u32,
    right: u32,
    color: [u8; 3],
}

impl Padding {
    pub const WHITE: [u8; 3] = [255, 255, 255];

    /// Each opposite pair of borders must sum to a valid `u32` dimension
    pub fn new(top: u32, bottom: u32, left: u32, right: u32, color: [u8; 3]) -> Result<Self, ConfigError> {
        if top.checked_add(bottom).is_none() {
            return Err(ConfigError::invalid("top", (top, bottom)));
        }
        if left.checked_add(right).is_none() {
            return Err(ConfigError::invalid("left", (left, right)));
        }

        Ok(Self {
            info: LayerInfo::standard(
                kinds::PADDING,
                format!(
                    "Top: {}, Bottom: {}, Left: {}, Right: {}, Color: {:?}",
                    top, bottom, left, right, color
                ),
            ),
            top,
            bottom,
            left,
            right,
            color,
        })
    }

    /// Color given as a slice, which must have exactly three components
    pub fn with_color_slice(
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
        color: &[u8],
    ) -> Result<Self, ConfigError> {
        let color: [u8; 3] = color
            .try_into()
            .map_err(|_| ConfigError::invalid("color", color))?;
        Self::new(top, bottom, left, right, color)
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for Padding {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| {
            geometry::pad(image, self.top, self.bottom, self.left, self.right, self.color)
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Padding {
            name: self.info.name().to_string(),
            top: self.top,
            bottom: self.bottom,
            left: self.left,
            right: self.right,
            color: self.color,
        })
    }
}

/// Rotate about the center by a fixed angle in degrees, counter-clockwise
pub struct Rotate {
    info: LayerInfo,
    angle: f64,
}

impl Rotate {
    pub fn new(angle: f64) -> Result<Self, ConfigError> {
        let angle = finite("angle", angle)?;
        Ok(Self {
            info: LayerInfo::standard(kinds::ROTATE, format!("Angle: {:?}", angle)),
            angle,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for Rotate {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(geometry::rotate(image, self.angle)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Rotate {
            name: self.info.name().to_string(),
            angle: self.angle,
        })
    }
}

/// Mirror left to right
pub struct HorizontalFlip {
    info: LayerInfo,
}

impl HorizontalFlip {
    pub fn new() -> Self {
        Self {
            info: LayerInfo::standard(kinds::HORIZONTAL_FLIP, "-".to_string()),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Default for HorizontalFlip {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for HorizontalFlip {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(geometry::flip_horizontal(image)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::HorizontalFlip {
            name: self.info.name().to_string(),
        })
    }
}

/// Mirror top to bottom
pub struct VerticalFlip {
    info: LayerInfo,
}

impl VerticalFlip {
    pub fn new() -> Self {
        Self {
            info: LayerInfo::standard(kinds::VERTICAL_FLIP, "-".to_string()),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Default for VerticalFlip {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for VerticalFlip {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(geometry::flip_vertical(image)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::VerticalFlip {
            name: self.info.name().to_string(),
        })
    }
}
