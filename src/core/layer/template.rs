//! The per-image loops shared by every built-in layer.
//!
//! Random layers fan each input out into `number_of_outputs` slots, and the
//! gate decides per slot whether the operation runs or the input passes
//! through untouched. Deterministic layers run once per image. Both drop
//! degenerate inputs and results.

use image::DynamicImage;
use rand::Rng;

use super::{is_degenerate, ImageBatch};
use crate::core::gate::ProbabilityGate;
use crate::core::ops::OpError;
use crate::error::ConfigError;

/// Fan-out settings of a random layer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Augmentation {
    gate: ProbabilityGate,
    number_of_outputs: usize,
}

impl Augmentation {
    /// `probability` in `[0, 1]`, at least one output per input
    pub fn new(probability: f64, number_of_outputs: usize) -> Result<Self, ConfigError> {
        let gate = ProbabilityGate::new(probability)?;
        if number_of_outputs < 1 {
            return Err(ConfigError::invalid("number_of_outputs", number_of_outputs));
        }
        Ok(Self {
            gate,
            number_of_outputs,
        })
    }

    pub fn probability(&self) -> f64 {
        self.gate.probability()
    }

    pub fn number_of_outputs(&self) -> usize {
        self.number_of_outputs
    }

    pub(crate) fn describe(&self) -> String {
        format!(
            "Probability: {:?}, Number of Outputs: {}",
            self.probability(),
            self.number_of_outputs
        )
    }
}

impl Default for Augmentation {
    fn default() -> Self {
        Self {
            gate: ProbabilityGate::always(),
            number_of_outputs: 1,
        }
    }
}

/// Fan-out loop of random layers
pub(crate) fn augment<R, F>(
    images: &[DynamicImage],
    augmentation: &Augmentation,
    rng: &mut R,
    mut op: F,
) -> Result<ImageBatch, OpError>
where
    R: Rng + ?Sized,
    F: FnMut(&DynamicImage, &mut R) -> Result<DynamicImage, OpError>,
{
    let mut output = Vec::with_capacity(images.len() * augmentation.number_of_outputs);

    for image in images {
        for _ in 0..augmentation.number_of_outputs {
            let apply = augmentation.gate.decide(rng);

            if is_degenerate(image) {
                continue;
            }

            let result = if apply { op(image, rng)? } else { image.clone() };

            if !is_degenerate(&result) {
                output.push(result);
            }
        }
    }

    Ok(output)
}

/// Once-per-image loop of deterministic layers
pub(crate) fn map_each<F>(images: &[DynamicImage], mut op: F) -> Result<ImageBatch, OpError>
where
    F: FnMut(&DynamicImage) -> Result<DynamicImage, OpError>,
{
    let mut output = Vec::with_capacity(images.len());

    for image in images.iter().filter(|image| !is_degenerate(image)) {
        let result = op(image)?;
        if !is_degenerate(&result) {
            output.push(result);
        }
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn batch(sizes: &[(u32, u32)]) -> ImageBatch {
        sizes
            .iter()
            .map(|&(w, h)| DynamicImage::new_rgb8(w, h))
            .collect()
    }

    #[test]
    fn rejects_zero_outputs() {
        assert!(Augmentation::new(1.0, 0).is_err());
        assert!(Augmentation::new(1.5, 1).is_err());
    }

    #[test]
    fn fans_out_every_image() {
        let images = batch(&[(4, 4), (6, 6), (8, 8)]);
        let augmentation = Augmentation::new(1.0, 4).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let output = augment(&images, &augmentation, &mut rng, |image, _| Ok(image.fliph())).unwrap();

        assert_eq!(output.len(), 12);
        assert!(output[..4].iter().all(|image| image.width() == 4));
        assert!(output[8..].iter().all(|image| image.width() == 8));
    }

    #[test]
    fn zero_probability_never_calls_the_operation() {
        let images = batch(&[(4, 4)]);
        let augmentation = Augmentation::new(0.0, 3).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let output = augment(&images, &augmentation, &mut rng, |_, _| {
            panic!("operation must not run")
        })
        .unwrap();

        assert_eq!(output.len(), 3);
    }

    #[test]
    fn degenerate_inputs_and_results_are_dropped() {
        let images = batch(&[(0, 4), (4, 4)]);
        let augmentation = Augmentation::new(1.0, 2).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let output = augment(&images, &augmentation, &mut rng, |_, _| {
            Ok(DynamicImage::new_rgb8(0, 0))
        })
        .unwrap();
        assert!(output.is_empty());

        let output = map_each(&images, |image| Ok(image.clone())).unwrap();
        assert_eq!(output.len(), 1);
    }

    #[test]
    fn describe_uses_debug_floats() {
        let augmentation = Augmentation::new(1.0, 5).unwrap();
        assert_eq!(augmentation.describe(), "Probability: 1.0, Number of Outputs: 5");
    }
}
