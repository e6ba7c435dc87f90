//! Random augmentation layers.
//!
//! Each one draws fresh parameters per output slot and fans every input out
//! into `number_of_outputs` images (see [`Augmentation`]).

use image::DynamicImage;
use rand::Rng;

use super::{finite, operation_error, ordered};
use crate::core::layer::{augment, kinds, Augmentation, ImageBatch, Layer, LayerInfo};
use crate::core::ops::{color, geometry, FastResizer};
use crate::core::snapshot::LayerSpec;
use crate::error::{ConfigError, ExecutionError};

/// Rotate by an angle drawn from `[start_angle, end_angle]`
pub struct RandomRotate {
    info: LayerInfo,
    start_angle: f64,
    end_angle: f64,
    augmentation: Augmentation,
}

impl RandomRotate {
    pub fn new(
        start_angle: f64,
        end_angle: f64,
        augmentation: Augmentation,
    ) -> Result<Self, ConfigError> {
        let (start_angle, end_angle) = ordered("start_angle", start_angle, end_angle)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_ROTATE,
                format!(
                    "Start Angle: {:?}, End Angle: {:?}, {}",
                    start_angle,
                    end_angle,
                    augmentation.describe()
                ),
            ),
            start_angle,
            end_angle,
            augmentation,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomRotate {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let angle = rng.gen_range(self.start_angle..=self.end_angle);
            Ok(geometry::rotate(image, angle))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomRotate {
            name: self.info.name().to_string(),
            start_angle: self.start_angle,
            end_angle: self.end_angle,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Flip horizontally or vertically, picked with equal odds
pub struct RandomFlip {
    info: LayerInfo,
    augmentation: Augmentation,
}

impl RandomFlip {
    pub fn new(augmentation: Augmentation) -> Self {
        Self {
            info: LayerInfo::standard(kinds::RANDOM_FLIP, augmentation.describe()),
            augmentation,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomFlip {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            Ok(if rng.gen_bool(0.5) {
                geometry::flip_horizontal(image)
            } else {
                geometry::flip_vertical(image)
            })
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomFlip {
            name: self.info.name().to_string(),
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Mirror left to right on a coin toss
pub struct RandomHorizontalFlip {
    info: LayerInfo,
    augmentation: Augmentation,
}

impl RandomHorizontalFlip {
    pub fn new(augmentation: Augmentation) -> Self {
        Self {
            info: LayerInfo::standard(kinds::RANDOM_HORIZONTAL_FLIP, augmentation.describe()),
            augmentation,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomHorizontalFlip {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, _| {
            Ok(geometry::flip_horizontal(image))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomHorizontalFlip {
            name: self.info.name().to_string(),
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Mirror top to bottom on a coin toss
pub struct RandomVerticalFlip {
    info: LayerInfo,
    augmentation: Augmentation,
}

impl RandomVerticalFlip {
    pub fn new(augmentation: Augmentation) -> Self {
        Self {
            info: LayerInfo::standard(kinds::RANDOM_VERTICAL_FLIP, augmentation.describe()),
            augmentation,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomVerticalFlip {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, _| {
            Ok(geometry::flip_vertical(image))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomVerticalFlip {
            name: self.info.name().to_string(),
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Crop a random window covering a `[start, end]` fraction and scale it back up
pub struct RandomZoom {
    info: LayerInfo,
    start: f64,
    end: f64,
    augmentation: Augmentation,
}

impl RandomZoom {
    pub fn new(start: f64, end: f64, augmentation: Augmentation) -> Result<Self, ConfigError> {
        let start = finite("start", start)?;
        let end = finite("end", end)?;
        if !(0.0..1.0).contains(&start) {
            return Err(ConfigError::invalid("start", start));
        }
        if end <= 0.0 || end > 1.0 || end < start {
            return Err(ConfigError::invalid("end", end));
        }

        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_ZOOM,
                format!("Start: {:?}, End: {:?}, {}", start, end, augmentation.describe()),
            ),
            start,
            end,
            augmentation,
        })
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomZoom {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        let mut resizer = FastResizer::new();
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let fraction = rng.gen_range(self.start..=self.end);
            let window = geometry::zoom_window(image, fraction);
            let x = rng.gen_range(0..=image.width() - window.0);
            let y = rng.gen_range(0..=image.height() - window.1);
            geometry::zoom(&mut resizer, image, x, y, window)
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomZoom {
            name: self.info.name().to_string(),
            start: self.start,
            end: self.end,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

fn shift_ratio(ratio: f64) -> Result<f64, ConfigError> {
    let ratio = finite("ratio", ratio)?;
    if !(0.0..=1.0).contains(&ratio) {
        return Err(ConfigError::invalid("ratio", ratio));
    }
    Ok(ratio)
}

/// Trim up to `ratio` of the width from one side and stretch back
pub struct RandomHorizontalShift {
    info: LayerInfo,
    ratio: f64,
    augmentation: Augmentation,
}

impl RandomHorizontalShift {
    pub fn new(ratio: f64, augmentation: Augmentation) -> Result<Self, ConfigError> {
        let ratio = shift_ratio(ratio)?;
        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_HORIZONTAL_SHIFT,
                format!("Ratio: {:?}, {}", ratio, augmentation.describe()),
            ),
            ratio,
            augmentation,
        })
    }

    /// Always shift, one output per input
    pub fn once(ratio: f64) -> Result<Self, ConfigError> {
        Self::new(ratio, Augmentation::default())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomHorizontalShift {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        let mut resizer = FastResizer::new();
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let ratio = rng.gen_range(-self.ratio..=self.ratio);
            geometry::shift_horizontal(&mut resizer, image, ratio)
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomHorizontalShift {
            name: self.info.name().to_string(),
            ratio: self.ratio,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Trim up to `ratio` of the height from one side and stretch back
pub struct RandomVerticalShift {
    info: LayerInfo,
    ratio: f64,
    augmentation: Augmentation,
}

impl RandomVerticalShift {
    pub fn new(ratio: f64, augmentation: Augmentation) -> Result<Self, ConfigError> {
        let ratio = shift_ratio(ratio)?;
        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_VERTICAL_SHIFT,
                format!("Ratio: {:?}, {}", ratio, augmentation.describe()),
            ),
            ratio,
            augmentation,
        })
    }

    /// Always shift, one output per input
    pub fn once(ratio: f64) -> Result<Self, ConfigError> {
        Self::new(ratio, Augmentation::default())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomVerticalShift {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        let mut resizer = FastResizer::new();
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let ratio = rng.gen_range(-self.ratio..=self.ratio);
            geometry::shift_vertical(&mut resizer, image, ratio)
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomVerticalShift {
            name: self.info.name().to_string(),
            ratio: self.ratio,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Scale HSV saturation and value by a factor drawn from `[low, high]`
pub struct RandomBrightness {
    info: LayerInfo,
    low: f64,
    high: f64,
    augmentation: Augmentation,
}

impl RandomBrightness {
    pub fn new(low: f64, high: f64, augmentation: Augmentation) -> Result<Self, ConfigError> {
        let (low, high) = ordered("high", low, high)?;
        if low < 0.0 {
            return Err(ConfigError::invalid("low", low));
        }

        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_BRIGHTNESS,
                format!("Low: {:?}, High: {:?}, {}", low, high, augmentation.describe()),
            ),
            low,
            high,
            augmentation,
        })
    }

    /// Always adjust, one output per input
    pub fn once(low: f64, high: f64) -> Result<Self, ConfigError> {
        Self::new(low, high, Augmentation::default())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomBrightness {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let factor = rng.gen_range(self.low..=self.high);
            Ok(color::brightness(image, factor))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomBrightness {
            name: self.info.name().to_string(),
            low: self.low,
            high: self.high,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

/// Add an offset drawn from `[low, high]` (8-bit units) to every color channel
pub struct RandomChannelShift {
    info: LayerInfo,
    low: f64,
    high: f64,
    augmentation: Augmentation,
}

impl RandomChannelShift {
    pub fn new(low: f64, high: f64, augmentation: Augmentation) -> Result<Self, ConfigError> {
        let (low, high) = ordered("high", low, high)?;

        Ok(Self {
            info: LayerInfo::standard(
                kinds::RANDOM_CHANNEL_SHIFT,
                format!("Low: {:?}, High: {:?}, {}", low, high, augmentation.describe()),
            ),
            low,
            high,
            augmentation,
        })
    }

    /// Always shift, one output per input
    pub fn once(low: f64, high: f64) -> Result<Self, ConfigError> {
        Self::new(low, high, Augmentation::default())
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.info.rename(name);
        self
    }
}

impl Layer for RandomChannelShift {
    fn info(&self) -> &LayerInfo {
        &self.info
    }

    fn transform(&self, images: &[DynamicImage], _context: &str) -> Result<ImageBatch, ExecutionError> {
        augment(images, &self.augmentation, &mut rand::thread_rng(), |image, rng| {
            let value = rng.gen_range(self.low..=self.high);
            Ok(color::channel_shift(image, value))
        })
        .map_err(|e| operation_error(&self.info, e))
    }

    fn to_spec(&self) -> Option<LayerSpec> {
        Some(LayerSpec::RandomChannelShift {
            name: self.info.name().to_string(),
            low: self.low,
            high: self.high,
            probability: self.augmentation.probability(),
            number_of_outputs: self.augmentation.number_of_outputs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ops::test_support::gradient;
    use image::GenericImageView;

    fn aug(probability: f64, outputs: usize) -> Augmentation {
        Augmentation::new(probability, outputs).unwrap()
    }

    fn all_random(probability: f64, outputs: usize) -> Vec<Box<dyn Layer>> {
        let a = aug(probability, outputs);
        vec![
            Box::new(RandomRotate::new(-30.0, 30.0, a).unwrap()),
            Box::new(RandomFlip::new(a)),
            Box::new(RandomHorizontalFlip::new(a)),
            Box::new(RandomVerticalFlip::new(a)),
            Box::new(RandomZoom::new(0.5, 0.9, a).unwrap()),
            Box::new(RandomHorizontalShift::new(0.3, a).unwrap()),
            Box::new(RandomVerticalShift::new(0.3, a).unwrap()),
            Box::new(RandomBrightness::new(0.5, 1.5, a).unwrap()),
            Box::new(RandomChannelShift::new(-20.0, 20.0, a).unwrap()),
        ]
    }

    #[test]
    fn range_validation() {
        assert!(RandomRotate::new(10.0, -10.0, Augmentation::default()).is_err());
        assert!(RandomZoom::new(1.0, 1.0, Augmentation::default()).is_err());
        assert!(RandomZoom::new(0.0, 0.0, Augmentation::default()).is_err());
        assert!(RandomZoom::new(0.6, 0.5, Augmentation::default()).is_err());
        assert!(RandomHorizontalShift::once(1.5).is_err());
        assert!(RandomVerticalShift::once(-0.1).is_err());
        assert!(RandomBrightness::once(-0.5, 1.0).is_err());
        assert!(RandomBrightness::once(2.0, 1.0).is_err());
        assert!(RandomChannelShift::once(5.0, 1.0).is_err());
        assert!(RandomChannelShift::once(-5.0, f64::INFINITY).is_err());
    }

    #[test]
    fn descriptions_include_fan_out() {
        let layer = RandomRotate::new(-10.0, 10.0, aug(0.5, 3)).unwrap();
        assert_eq!(
            layer.describe().1,
            "Start Angle: -10.0, End Angle: 10.0, Probability: 0.5, Number of Outputs: 3"
        );
        assert_eq!(
            RandomFlip::new(Augmentation::default()).describe().1,
            "Probability: 1.0, Number of Outputs: 1"
        );
    }

    #[test]
    fn presets_always_apply_once() {
        let layer = RandomBrightness::once(1.0, 2.0).unwrap();
        assert_eq!(layer.get_type(), kinds::RANDOM_BRIGHTNESS);
        assert_eq!(layer.describe().1, "Low: 1.0, High: 2.0, Probability: 1.0, Number of Outputs: 1");
        assert_eq!(RandomChannelShift::once(1.0, 5.0).unwrap().get_type(), kinds::RANDOM_CHANNEL_SHIFT);
    }

    #[test]
    fn certain_application_fans_out() {
        let images = vec![gradient(40, 30), gradient(20, 20)];

        for layer in all_random(1.0, 3) {
            let output = layer.transform(&images, "x").unwrap();
            assert_eq!(output.len(), 6, "{}", layer.get_type());
            assert_eq!(output[0].dimensions(), (40, 30), "{}", layer.get_type());
            assert_eq!(output[5].dimensions(), (20, 20), "{}", layer.get_type());
        }
    }

    #[test]
    fn zero_probability_is_identity() {
        let images = vec![gradient(16, 12)];

        for layer in all_random(0.0, 2) {
            let output = layer.transform(&images, "x").unwrap();
            assert_eq!(output.len(), 2);
            assert!(output.iter().all(|image| image.as_bytes() == images[0].as_bytes()));
        }
    }

    #[test]
    fn degenerate_inputs_are_dropped() {
        let images = vec![DynamicImage::new_rgb8(0, 0)];
        for layer in all_random(1.0, 2) {
            assert!(layer.transform(&images, "x").unwrap().is_empty());
        }
    }

    #[test]
    fn full_zoom_range_never_panics_on_tiny_images() {
        let layer = RandomZoom::new(0.0, 1.0, aug(1.0, 20)).unwrap();
        let output = layer.transform(&[gradient(2, 2)], "x").unwrap();
        assert!(output.len() <= 20);
        assert!(output.iter().all(|image| image.dimensions() == (2, 2)));
    }
}
