//! # Layers Module
//!
//! The built-in layers.
//!
//! ## Families
//! - **io** - `read` (the source) and `save` (the sink)
//! - **geometry** - resize, crop, padding, rotate, flips
//! - **color** - grayscale, rescale
//! - **blur** - average, gaussian, median, bilateral, convolution
//! - **augment** - the random layers and their single-shot presets
//!
//! Every constructor validates its arguments and returns a [`ConfigError`]
//! naming the first bad one. `named` renames a layer before it joins a
//! pipeline.
//!
//! [`ConfigError`]: crate::error::ConfigError

mod augment;
mod blur;
mod color;
mod geometry;
mod io;
mod npy;

pub use augment::{
    RandomBrightness, RandomChannelShift, RandomFlip, RandomHorizontalFlip,
    RandomHorizontalShift, RandomRotate, RandomVerticalFlip, RandomVerticalShift, RandomZoom,
};
pub use blur::{AverageBlur, BilateralBlur, Convolution, GaussianBlur, MedianBlur};
pub use color::{Grayscale, Rescale};
pub use geometry::{Crop, HorizontalFlip, Padding, Resize, Rotate, VerticalFlip};
pub use io::{Read, Save, SaveFormat};

pub use crate::core::layer::Augmentation;
pub use crate::core::ops::Interpolation;

use crate::core::layer::LayerInfo;
use crate::core::ops::OpError;
use crate::error::{ConfigError, ExecutionError};

/// Wrap a pixel operation failure with the name of the layer it happened in
pub(crate) fn operation_error(info: &LayerInfo, source: OpError) -> ExecutionError {
    ExecutionError::Operation {
        layer: info.name().to_string(),
        source,
    }
}

pub(crate) fn finite(argument: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::invalid(argument, value))
    }
}

pub(crate) fn positive(argument: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value > 0 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(argument, value))
    }
}

pub(crate) fn odd(argument: &'static str, value: u32) -> Result<u32, ConfigError> {
    if value % 2 == 1 {
        Ok(value)
    } else {
        Err(ConfigError::invalid(argument, value))
    }
}

/// `low <= high`, both finite
pub(crate) fn ordered(
    argument: &'static str,
    low: f64,
    high: f64,
) -> Result<(f64, f64), ConfigError> {
    finite(argument, low)?;
    finite(argument, high)?;
    if low > high {
        return Err(ConfigError::invalid(argument, (low, high)));
    }
    Ok((low, high))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validators() {
        assert!(finite("angle", f64::NAN).is_err());
        assert_eq!(finite("angle", -3.5).unwrap(), -3.5);
        assert!(positive("width", 0).is_err());
        assert!(odd("kernel", 4).is_err());
        assert_eq!(odd("kernel", 5).unwrap(), 5);
        assert!(ordered("range", 2.0, 1.0).is_err());
        assert_eq!(ordered("range", -1.0, 1.0).unwrap(), (-1.0, 1.0));
    }
}
