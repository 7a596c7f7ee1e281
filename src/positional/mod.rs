//! Position encoders for `[batch, time, depth]` inputs
mod positional;
pub use positional::{
    PositionEmbedder, PositionEncoder, PositionEncoding, SinusoidalPositionEncoder,
};

mod broadcast;
pub use broadcast::{position_sequence, tile_batch};

mod timescale;
pub use timescale::{inverse_timescales, DEFAULT_MAX_TIMESCALE};

mod sinusoidal;
pub use sinusoidal::SinusoidalPositionEncoding;

mod learned;
pub use learned::LearnedPositionEmbedding;
