pub mod config;
pub use config::EncoderConfig;

pub mod error;
pub use error::PositionError;

pub mod layers;
pub use layers::{ConcatReducer, MultiplyReducer, Reducer, SumReducer};

pub mod positional;
pub use positional::{
    LearnedPositionEmbedding, PositionEmbedder, PositionEncoder, PositionEncoding,
    SinusoidalPositionEncoder, SinusoidalPositionEncoding,
};

pub mod utils;
pub use utils::{Initializer, PositionalEncodingType, ReducerType};
