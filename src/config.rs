use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PositionError;
use crate::positional::{LearnedPositionEmbedding, PositionEncoder, DEFAULT_MAX_TIMESCALE};
use crate::utils::{Initializer, PositionalEncodingType, ReducerType};

/// Configuration for a position encoder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncoderConfig {
    #[serde(default)]
    pub encoding: PositionalEncodingType,
    /// Learned only: positions above this share one embedding
    #[serde(default = "default_maximum_position")]
    pub maximum_position: usize,
    #[serde(default)]
    pub reducer: ReducerType,
    /// Learned only: initial values of the embedding table
    #[serde(default)]
    pub initializer: Initializer,
    #[serde(default)]
    pub seed: Option<u64>,
    /// Sinusoidal only: longest wavelength of the sine waves
    #[serde(default = "default_max_timescale")]
    pub max_timescale: f32,
}

fn default_maximum_position() -> usize { LearnedPositionEmbedding::DEFAULT_MAXIMUM_POSITION }
fn default_max_timescale() -> f32 { DEFAULT_MAX_TIMESCALE }

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            encoding: PositionalEncodingType::default(),
            maximum_position: default_maximum_position(),
            reducer: ReducerType::default(),
            initializer: Initializer::default(),
            seed: None,
            max_timescale: default_max_timescale(),
        }
    }
}

impl EncoderConfig {
    pub fn validate(&self) -> Result<(), PositionError> {
        if self.maximum_position == usize::MAX {
            return Err(PositionError::config("maximum_position must be below usize::MAX"));
        }

        if !self.max_timescale.is_finite() || self.max_timescale <= 1.0 {
            return Err(PositionError::config(format!(
                "max_timescale must be finite and greater than 1, got {}",
                self.max_timescale
            )));
        }

        match self.initializer.invalid_reason() {
            Some(reason) => Err(PositionError::config(reason)),
            None => Ok(()),
        }
    }

    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, PositionError> {
        let config: Self = serde_json::from_str(json).map_err(PositionError::serialization)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PositionError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, PositionError> {
        serde_json::to_string_pretty(self).map_err(PositionError::serialization)
    }

    pub fn build_encoder(&self) -> Result<PositionEncoder, PositionError> {
        PositionEncoder::from_config(self)
    }
}
