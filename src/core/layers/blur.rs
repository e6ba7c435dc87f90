//! Smoothing and convolution layers.

use image::DynamicImage;

use super::{finite, odd, operation_error, positive};
use crate::core::layer::{kinds, map_each, ImageBatch, Layer, LayerInfo};
use crate::core::ops::filter;
use crate::core::snapshot::LayerSpec;
use crate::error::{ConfigError, ExecutionError};

/// Normalized box filter
pub struct AverageBlur {
    info: LayerInfo,
    kernel: (u32, u32),
}

impl AverageBlur {
    pub fn new(kernel: (u32, u32)) -> Result<Self, ConfigError> {
        positive("kernel_size", kernel.0)?;
        positive("kernel_size", kernel.1)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::AVERAGE_BLUR,
                format!("Kernel Size: ({}, {})", kernel.0, kernel.1),
            ),
            kernel,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for AverageBlur {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(filter::average_blur(image, self.kernel)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::AverageBlur {
            name: self.info.name().to_string(),
            kernel_width: self.kernel.0,
            kernel_height: self.kernel.1,
        })
    }
}

/// Gaussian filter with odd kernel sides
pub struct GaussianBlur {
    info: LayerInfo,
    kernel: (u32, u32),
    sigma_x: f64,
    sigma_y: f64,
}

impl GaussianBlur {
    /// A sigma of zero is derived from the kernel size.
    pub fn new(kernel: (u32, u32), sigma_x: f64, sigma_y: f64) -> Result<Self, ConfigError> {
        odd("kernel_size", kernel.0)?;
        odd("kernel_size", kernel.1)?;
        let sigma_x = non_negative("sigma_x", sigma_x)?;
        let sigma_y = non_negative("sigma_y", sigma_y)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::GAUSSIAN_BLUR,
                format!(
                    "Kernel Size: ({}, {}), Sigma X: {:?}, Sigma Y: {:?}",
                    kernel.0, kernel.1, sigma_x, sigma_y
                ),
            ),
            kernel,
            sigma_x,
            sigma_y,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for GaussianBlur {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| {
            Ok(filter::gaussian_blur(image, self.kernel, self.sigma_x, self.sigma_y))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::GaussianBlur {
            name: self.info.name().to_string(),
            kernel_width: self.kernel.0,
            kernel_height: self.kernel.1,
            sigma_x: self.sigma_x,
            sigma_y: self.sigma_y,
        })
    }
}

/// Per-channel median over a square window
pub struct MedianBlur {
    info: LayerInfo,
    kernel_size: u32,
}

impl MedianBlur {
    pub fn new(kernel_size: u32) -> Result<Self, ConfigError> {
        odd("kernel_size", kernel_size)?;

        Ok(Self {
            info: LayerInfo::standard(kinds::MEDIAN_BLUR, format!("Kernel Size: {}", kernel_size)),
            kernel_size,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for MedianBlur {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| filter::median_blur(image, self.kernel_size))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::MedianBlur {
            name: self.info.name().to_string(),
            kernel_size: self.kernel_size,
        })
    }
}

/// Edge-preserving smoothing
pub struct BilateralBlur {
    info: LayerInfo,
    diameter: u32,
    sigma_color: f64,
    sigma_space: f64,
}

impl BilateralBlur {
    pub fn new(diameter: u32, sigma_color: f64, sigma_space: f64) -> Result<Self, ConfigError> {
        positive("d", diameter)?;
        let sigma_color = strictly_positive("sigma_color", sigma_color)?;
        let sigma_space = strictly_positive("sigma_space", sigma_space)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::BILATERAL_BLUR,
                format!(
                    "D: {}, Sigma Color: {:?}, Sigma Space: {:?}",
                    diameter, sigma_color, sigma_space
                ),
            ),
            diameter,
            sigma_color,
            sigma_space,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for BilateralBlur {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| {
            Ok(filter::bilateral_blur(
                image,
                self.diameter,
                self.sigma_color,
                self.sigma_space,
            ))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::BilateralBlur {
            name: self.info.name().to_string(),
            diameter: self.diameter,
            sigma_color: self.sigma_color,
            sigma_space: self.sigma_space,
        })
    }
}

/// Correlate with a user-supplied kernel
pub struct Convolution {
    info: LayerInfo,
    kernel: Vec<Vec<f64>>,
}

impl Convolution {
    /// `kernel` must be non-empty, rectangular and finite
    pub fn new(kernel: Vec<Vec<f64>>) -> Result<Self, ConfigError> {
        let cols = kernel.first().map_or(0, Vec::len);
        let valid = cols > 0
            && kernel.iter().all(|row| row.len() == cols)
            && kernel.iter().flatten().all(|weight| weight.is_finite());
        if !valid {
            return Err(ConfigError::invalid("kernel", &kernel));
        }

        Ok(Self {
            info: LayerInfo::standard(
                kinds::CONVOLUTION,
                format!("Kernel: {}x{}", kernel.len(), cols),
            ),
            kernel,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for Convolution {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        map_each(images, |image| Ok(filter::convolve(image, &self.kernel)))
            .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::Convolution {
            name: self.info.name().to_string(),
            kernel: self.kernel.clone(),
        })
    }
}

fn non_negative(argument: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(argument, value)?;
    if value < 0.0 {
        return Err(ConfigError::invalid(argument, value));
    }
    Ok(value)
}

fn strictly_positive(argument: &'static str, value: f64) -> Result<f64, ConfigError> {
    let value = finite(argument, value)?;
    if value <= 0.0 {
        return Err(ConfigError::invalid(argument, value));
    }
    Ok(value)
}
