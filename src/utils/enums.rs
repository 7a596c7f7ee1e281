use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PositionalEncodingType {
    /// Fixed sinusoidal patterns (non-learnable)
    Sinusoidal,
    /// Learned lookup table, clamped at the maximum position
    Learned,
}

impl Default for PositionalEncodingType {
    fn default() -> Self {
        Self::Learned
    }
}

/// How the position encoding is merged into the inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReducerType {
    Sum,
    Multiply,
    Concat,
}

impl Default for ReducerType {
    fn default() -> Self {
        Self::Sum
    }
}
