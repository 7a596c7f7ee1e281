use std::fmt;

use ndarray::{Array3, ArrayView2, ArrayView3};
use tracing::trace;

use crate::config::EncoderConfig;
use crate::error::PositionError;
use crate::layers::{build_reducer, Reducer, SumReducer};
use crate::positional::{
    position_sequence, tile_batch, LearnedPositionEmbedding, SinusoidalPositionEncoding,
};
use crate::utils::PositionalEncodingType;

/// Trait for all position encoding strategies
pub trait PositionEncoding: Send + Sync + fmt::Debug {
    /// Creates position encodings.
    /// positions shape: (batch_size, steps), output shape: (batch_size, steps, depth)
    fn encode(&self, positions: ArrayView2<usize>, depth: usize)
        -> Result<Array3<f32>, PositionError>;
}

impl PositionEncoding for Box<dyn PositionEncoding> {
    fn encode(
        &self,
        positions: ArrayView2<usize>,
        depth: usize,
    ) -> Result<Array3<f32>, PositionError> {
        (**self).encode(positions, depth)
    }
}

/// Encoder backed by a learned lookup table
pub type PositionEmbedder = PositionEncoder<LearnedPositionEmbedding>;

/// Encoder backed by fixed sine waves
pub type SinusoidalPositionEncoder = PositionEncoder<SinusoidalPositionEncoding>;

/// Adds position information to `[batch, time, depth]` inputs.
///
/// The encoding of positions `1..=T` (or of a single explicit position) is
/// computed once for one batch row, repeated across the batch and merged
/// into the inputs with the configured [`Reducer`].
#[derive(Debug)]
pub struct PositionEncoder<E = Box<dyn PositionEncoding>> {
    strategy: E,
    reducer: Box<dyn Reducer>,
}

impl PositionEncoder<LearnedPositionEmbedding> {
    /// Positions greater than `maximum_position` share its embedding.
    pub fn embedder(maximum_position: usize) -> Self {
        Self::new(LearnedPositionEmbedding::new(maximum_position))
    }
}

impl Default for PositionEncoder<LearnedPositionEmbedding> {
    fn default() -> Self {
        Self::new(LearnedPositionEmbedding::default())
    }
}

impl PositionEncoder<SinusoidalPositionEncoding> {
    pub fn sinusoidal() -> Self {
        Self::new(SinusoidalPositionEncoding::new())
    }
}

impl Default for PositionEncoder<SinusoidalPositionEncoding> {
    fn default() -> Self {
        Self::sinusoidal()
    }
}

impl PositionEncoder {
    /// Builds a type-erased encoder from a validated configuration.
    pub fn from_config(config: &EncoderConfig) -> Result<Self, PositionError> {
        config.validate()?;

        let strategy: Box<dyn PositionEncoding> = match config.encoding {
            PositionalEncodingType::Sinusoidal => Box::new(
                SinusoidalPositionEncoding::with_max_timescale(config.max_timescale),
            ),
            PositionalEncodingType::Learned => Box::new(
                LearnedPositionEmbedding::new(config.maximum_position)
                    .with_initializer(config.initializer.clone(), config.seed),
            ),
        };

        Ok(Self {
            strategy,
            reducer: build_reducer(config.reducer),
        })
    }
}

impl<E: PositionEncoding> PositionEncoder<E> {
    /// Wraps a strategy, merging with a fresh [`SumReducer`].
    pub fn new(strategy: E) -> Self {
        Self {
            strategy,
            reducer: Box::new(SumReducer),
        }
    }

    pub fn with_reducer<R: Reducer + 'static>(mut self, reducer: R) -> Self {
        self.reducer = Box::new(reducer);
        self
    }

    pub fn strategy(&self) -> &E {
        &self.strategy
    }

    pub fn reducer(&self) -> &dyn Reducer {
        self.reducer.as_ref()
    }

    pub fn encode(
        &self,
        positions: ArrayView2<usize>,
        depth: usize,
    ) -> Result<Array3<f32>, PositionError> {
        self.strategy.encode(positions, depth)
    }

    /// Applies position encoding to inputs of shape `[B, T, D]`.
    ///
    /// `position` is the 1-indexed position of the only timestep, when known
    /// (step-wise decoding). The output depth depends on the reducer.
    pub fn apply(
        &self,
        inputs: ArrayView3<f32>,
        position: Option<usize>,
    ) -> Result<Array3<f32>, PositionError> {
        let (batch_size, timesteps, depth) = inputs.dim();
        if position.is_some() && timesteps != 1 {
            return Err(PositionError::mismatch(format!(
                "An explicit position encodes a single timestep but inputs have {}",
                timesteps
            )));
        }

        trace!(batch_size, timesteps, depth, ?position, "applying position encoding");

        let positions = position_sequence(timesteps, position);
        let encoding = self.strategy.encode(positions.view(), depth)?;
        let encoding = tile_batch(&encoding, batch_size)?;

        self.reducer.reduce(&[inputs.reborrow(), encoding])
    }

    /// Erases the strategy type, e.g. to store different encoders together.
    pub fn boxed(self) -> PositionEncoder
    where
        E: 'static,
    {
        PositionEncoder {
            strategy: Box::new(self.strategy),
            reducer: self.reducer,
        }
    }
}
