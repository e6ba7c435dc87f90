//! Stochastic apply/skip decision shared by every random layer.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Decides, per output slot, whether a random layer applies its operation.
///
/// Stateless: every call to [`decide`](Self::decide) is an independent draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ProbabilityGate {
    probability: f64,
}

impl ProbabilityGate {
    /// A gate that applies with probability `probability`, which must lie in `[0, 1]`.
    pub fn new(probability: f64) -> Result<Self, ConfigError> {
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ConfigError::invalid("probability", probability));
        }
        Ok(Self { probability })
    }

    /// A gate that always applies
    pub fn always() -> Self {
        Self { probability: 1.0 }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// `true` means "apply", `false` means "pass the image through".
    ///
    /// `gen::<f64>()` draws from `[0, 1)`, so `p = 1` always applies and
    /// `p = 0` never does.
    pub fn decide<R: Rng + ?Sized>(&self, rng: &mut R) -> bool {
        rng.gen::<f64>() < self.probability
    }
}

impl Default for ProbabilityGate {
    fn default() -> Self {
        Self::always()
    }
}

impl TryFrom<f64> for ProbabilityGate {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProbabilityGate> for f64 {
    fn from(gate: ProbabilityGate) -> Self {
        gate.probability
    }
}
