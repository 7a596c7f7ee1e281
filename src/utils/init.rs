use ndarray::Array2;
use rand::{rngs::SmallRng, SeedableRng};
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::error::PositionError;

/// Initial values for learned parameter tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Normal { mean: f32, std: f32 },
    /// Uniform in [-limit, limit]
    Uniform { limit: f32 },
    Zeros,
}

impl Default for Initializer {
    fn default() -> Self {
        Self::Normal { mean: 0.0, std: 0.02 }
    }
}

impl Initializer {
    /// Describes why the distribution cannot be sampled, if it cannot.
    pub fn invalid_reason(&self) -> Option<String> {
        match *self {
            Initializer::Normal { mean, std }
                if !mean.is_finite() || !std.is_finite() || std < 0.0 =>
            {
                Some(format!("Invalid normal initializer: mean {}, std {}", mean, std))
            }
            // The sampler needs the full width 2 * limit to be finite
            Initializer::Uniform { limit } if !(2.0 * limit).is_finite() || limit < 0.0 => {
                Some(format!("Invalid uniform initializer limit {}", limit))
            }
            _ => None,
        }
    }

    /// Samples a `(rows, cols)` table. A seed makes the draw reproducible.
    pub fn sample(
        &self,
        shape: (usize, usize),
        seed: Option<u64>,
    ) -> Result<Array2<f32>, PositionError> {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };

        if let Some(reason) = self.invalid_reason() {
            return Err(PositionError::InitializationError(reason));
        }

        match *self {
            Initializer::Normal { mean, std } => {
                let normal = Normal::new(mean, std)
                    .map_err(|e| PositionError::InitializationError(e.to_string()))?;
                Ok(Array2::from_shape_fn(shape, |_| normal.sample(&mut rng)))
            }
            Initializer::Uniform { limit } => {
                let uniform = Uniform::new_inclusive(-limit, limit);
                Ok(Array2::from_shape_fn(shape, |_| uniform.sample(&mut rng)))
            }
            Initializer::Zeros => Ok(Array2::zeros(shape)),
        }
    }
}
