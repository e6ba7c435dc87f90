//! # Snapshot Module
//!
//! The persisted form of a pipeline.
//!
//! A snapshot is JSON: a format version, the frozen flag and one tagged
//! entry per layer carrying its name and constructor arguments. Restoring
//! rebuilds each layer through its validating constructor, so a hand-edited
//! file is checked exactly like code would be.
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "frozen": true,
//!   "layers": [
//!     { "type": "read", "name": "Read Layer", "path": "images" },
//!     { "type": "resize", "name": "Resize Layer", "width": 50, "height": 50, "interpolation": "linear" }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::core::layer::{Augmentation, Layer};
use crate::core::layers::{
    AverageBlur, BilateralBlur, Convolution, Crop, GaussianBlur, Grayscale, HorizontalFlip,
    Interpolation, MedianBlur, Padding, RandomBrightness, RandomChannelShift, RandomFlip,
    RandomHorizontalFlip, RandomHorizontalShift, RandomRotate, RandomVerticalFlip,
    RandomVerticalShift, RandomZoom, Read, Rescale, Resize, Rotate, Save, SaveFormat,
    VerticalFlip,
};
use crate::error::{ConfigError, SnapshotError};

/// Current snapshot format
pub const SNAPSHOT_VERSION: u32 = 1;

/// A whole pipeline at rest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSnapshot {
    pub format_version: u32,
    pub frozen: bool,
    pub layers: Vec<LayerSpec>,
}

impl PipelineSnapshot {
    /// Reject snapshots written in another format version
    pub fn check_version(&self) -> Result<(), SnapshotError> {
        if self.format_version == SNAPSHOT_VERSION {
            Ok(())
        } else {
            Err(SnapshotError::UnsupportedVersion {
                found: self.format_version,
                expected: SNAPSHOT_VERSION,
            })
        }
    }
}

/// Constructor arguments of one built-in layer, tagged by layer type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerSpec {
    Read {
        name: String,
        path: PathBuf,
    },
    Save {
        name: String,
        path: PathBuf,
        format: SaveFormat,
    },
    Resize {
        name: String,
        width: u32,
        height: u32,
        interpolation: Interpolation,
    },
    Crop {
        name: String,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
    },
    Padding {
        name: String,
        top: u32,
        bottom: u32,
        left: u32,
        right: u32,
        #[serde(default = "white")]
        color: [u8; 3],
    },
    Rotate {
        name: String,
        angle: f64,
    },
    HorizontalFlip {
        name: String,
    },
    VerticalFlip {
        name: String,
    },
    Grayscale {
        name: String,
    },
    Rescale {
        name: String,
        factor: f64,
    },
    AverageBlur {
        name: String,
        kernel_width: u32,
        kernel_height: u32,
    },
    GaussianBlur {
        name: String,
        kernel_width: u32,
        kernel_height: u32,
        sigma_x: f64,
        sigma_y: f64,
    },
    MedianBlur {
        name: String,
        kernel_size: u32,
    },
    BilateralBlur {
        name: String,
        diameter: u32,
        sigma_color: f64,
        sigma_space: f64,
    },
    Convolution {
        name: String,
        kernel: Vec<Vec<f64>>,
    },
    RandomRotate {
        name: String,
        start_angle: f64,
        end_angle: f64,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomFlip {
        name: String,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomHorizontalFlip {
        name: String,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomVerticalFlip {
        name: String,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomZoom {
        name: String,
        start: f64,
        end: f64,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomHorizontalShift {
        name: String,
        ratio: f64,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomVerticalShift {
        name: String,
        ratio: f64,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomBrightness {
        name: String,
        low: f64,
        high: f64,
        probability: f64,
        number_of_outputs: usize,
    },
    RandomChannelShift {
        name: String,
        low: f64,
        high: f64,
        probability: f64,
        number_of_outputs: usize,
    },
}

fn white() -> [u8; 3] {
    Padding::WHITE
}

impl LayerSpec {
    /// Construct the layer this entry describes, re-running its validation
    pub fn build(self) -> Result<Box<dyn Layer>, ConfigError> {
        let layer: Box<dyn Layer> = match self {
            LayerSpec::Read { name, path } => Box::new(Read::new(path)?.named(name)),
            LayerSpec::Save { name, path, format } => Box::new(Save::new(path, format)?.named(name)),
            LayerSpec::Resize {
                name,
                width,
                height,
                interpolation,
            } => Box::new(Resize::new((width, height), interpolation)?.named(name)),
            LayerSpec::Crop {
                name,
                x,
                y,
                width,
                height,
            } => Box::new(Crop::new(x, y, width, height)?.named(name)),
            LayerSpec::Padding {
                name,
                top,
                bottom,
                left,
                right,
                color,
            } => Box::new(Padding::new(top, bottom, left, right, color)?.named(name)),
            LayerSpec::Rotate { name, angle } => Box::new(Rotate::new(angle)?.named(name)),
            LayerSpec::HorizontalFlip { name } => Box::new(HorizontalFlip::new().named(name)),
            LayerSpec::VerticalFlip { name } => Box::new(VerticalFlip::new().named(name)),
            LayerSpec::Grayscale { name } => Box::new(Grayscale::new().named(name)),
            LayerSpec::Rescale { name, factor } => Box::new(Rescale::new(factor)?.named(name)),
            LayerSpec::AverageBlur {
                name,
                kernel_width,
                kernel_height,
            } => Box::new(AverageBlur::new((kernel_width, kernel_height))?.named(name)),
            LayerSpec::GaussianBlur {
                name,
                kernel_width,
                kernel_height,
                sigma_x,
                sigma_y,
            } => Box::new(
                GaussianBlur::new((kernel_width, kernel_height), sigma_x, sigma_y)?.named(name),
            ),
            LayerSpec::MedianBlur { name, kernel_size } => {
                Box::new(MedianBlur::new(kernel_size)?.named(name))
            }
            LayerSpec::BilateralBlur {
                name,
                diameter,
                sigma_color,
                sigma_space,
            } => Box::new(BilateralBlur::new(diameter, sigma_color, sigma_space)?.named(name)),
            LayerSpec::Convolution { name, kernel } => {
                Box::new(Convolution::new(kernel)?.named(name))
            }
            LayerSpec::RandomRotate {
                name,
                start_angle,
                end_angle,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomRotate::new(start_angle, end_angle, augmentation)?.named(name))
            }
            LayerSpec::RandomFlip {
                name,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomFlip::new(augmentation).named(name))
            }
            LayerSpec::RandomHorizontalFlip {
                name,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomHorizontalFlip::new(augmentation).named(name))
            }
            LayerSpec::RandomVerticalFlip {
                name,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomVerticalFlip::new(augmentation).named(name))
            }
            LayerSpec::RandomZoom {
                name,
                start,
                end,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomZoom::new(start, end, augmentation)?.named(name))
            }
            LayerSpec::RandomHorizontalShift {
                name,
                ratio,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomHorizontalShift::new(ratio, augmentation)?.named(name))
            }
            LayerSpec::RandomVerticalShift {
                name,
                ratio,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomVerticalShift::new(ratio, augmentation)?.named(name))
            }
            LayerSpec::RandomBrightness {
                name,
                low,
                high,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomBrightness::new(low, high, augmentation)?.named(name))
            }
            LayerSpec::RandomChannelShift {
                name,
                low,
                high,
                probability,
                number_of_outputs,
            } => {
                let augmentation = Augmentation::new(probability, number_of_outputs)?;
                Box::new(RandomChannelShift::new(low, high, augmentation)?.named(name))
            }
        };

        Ok(layer)
    }
}
