//! Deterministic color layers.

use image::DynamicImage;

use super::{finite, operation_error};
use crate::core::layer::{kinds, map_each, ImageBatch, Layer, LayerInfo};
use crate::core::ops::color;
use crate::core::snapshot::LayerSpec;
use crate::error::{ConfigError, ExecutionError};

/// Convert to single-channel luminance
pub struct Grayscale {
    info: LayerInfo,
}

impl Grayscale {
    pub fn new() -> Self {
        Self {
            info: LayerInfo::standard(kinds::GRAYSCALE, "-".to_string()),
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Default for Grayscale {
    fn default() -> Self {
        Self::new()
    }
}

impl Layer for Grayscale {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(color::grayscale(image)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Grayscale {
            name: self.info.name().to_string(),
        })
    }
}

/// Multiply every sample by a constant; output images are `f32`
pub struct Rescale {
    info: LayerInfo,
    factor: f64,
}

impl Rescale {
    /// Maps 8-bit samples onto `[0, 1]`
    pub const UNIT: f64 = 1.0 / 255.0;

    pub fn new(factor: f64) -> Result<Self, ConfigError> {
        let factor = finite("rescale", factor)?;
        Ok(Self {
            info: LayerInfo::standard(kinds::RESCALE, format!("Rescale: {:?}", factor)),
            factor,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }
}

impl Default for Rescale {
    fn default() -> Self {
        Self {
            info: LayerInfo::standard(kinds::RESCALE, format!("Rescale: {:?}", Self::UNIT)),
            factor: Self::UNIT,
        }
    }
}

impl Layer for Rescale {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(color::rescale(image, self.factor)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Rescale {
            name: self.info.name().to_string(),
            factor: self.factor,
        })
    }
}
