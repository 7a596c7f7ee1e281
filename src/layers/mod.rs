//! Layers that combine inputs with position encodings

mod reducer;

pub use reducer::{build_reducer, ConcatReducer, MultiplyReducer, Reducer, SumReducer};
