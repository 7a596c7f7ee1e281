use std::fmt;

use ndarray::{concatenate, Array3, ArrayView3, Axis};

use crate::error::PositionError;
use crate::utils::ReducerType;

/// Merges a list of `[batch, time, depth]` tensors into one
pub trait Reducer: Send + Sync + fmt::Debug {
    fn reduce(&self, inputs: &[ArrayView3<f32>]) -> Result<Array3<f32>, PositionError>;
}

/// Element-wise sum. All inputs must have the same shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct SumReducer;

/// Element-wise product. All inputs must have the same shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct MultiplyReducer;

/// Concatenation along the depth axis
#[derive(Debug, Clone, Copy, Default)]
pub struct ConcatReducer;

impl Reducer for SumReducer {
    fn reduce(&self, inputs: &[ArrayView3<f32>]) -> Result<Array3<f32>, PositionError> {
        let (first, rest) = same_shape(inputs)?;
        let mut output = first.to_owned();
        for input in rest {
            output += input;
        }
        Ok(output)
    }
}

impl Reducer for MultiplyReducer {
    fn reduce(&self, inputs: &[ArrayView3<f32>]) -> Result<Array3<f32>, PositionError> {
        let (first, rest) = same_shape(inputs)?;
        let mut output = first.to_owned();
        for input in rest {
            output *= input;
        }
        Ok(output)
    }
}

impl Reducer for ConcatReducer {
    fn reduce(&self, inputs: &[ArrayView3<f32>]) -> Result<Array3<f32>, PositionError> {
        let (batch_size, timesteps) = leading_dims(inputs)?;
        for input in inputs {
            let (b, t, _) = input.dim();
            if (b, t) != (batch_size, timesteps) {
                return Err(PositionError::mismatch(format!(
                    "Cannot concatenate inputs with leading dimensions ({}, {}) and ({}, {})",
                    batch_size, timesteps, b, t
                )));
            }
        }

        concatenate(Axis(2), inputs).map_err(|e| PositionError::mismatch(e.to_string()))
    }
}

/// Creates a fresh reducer for `kind`
pub fn build_reducer(kind: ReducerType) -> Box<dyn Reducer> {
    match kind {
        ReducerType::Sum => Box::new(SumReducer),
        ReducerType::Multiply => Box::new(MultiplyReducer),
        ReducerType::Concat => Box::new(ConcatReducer),
    }
}

fn leading_dims(inputs: &[ArrayView3<f32>]) -> Result<(usize, usize), PositionError> {
    let first = inputs
        .first()
        .ok_or_else(|| PositionError::mismatch("Cannot reduce an empty list of inputs"))?;
    let (batch_size, timesteps, _) = first.dim();
    Ok((batch_size, timesteps))
}

fn same_shape<'a, 'b>(
    inputs: &'a [ArrayView3<'b, f32>],
) -> Result<(&'a ArrayView3<'b, f32>, &'a [ArrayView3<'b, f32>]), PositionError> {
    let (first, rest) = inputs
        .split_first()
        .ok_or_else(|| PositionError::mismatch("Cannot reduce an empty list of inputs"))?;

    for input in rest {
        if input.shape() != first.shape() {
            return Err(PositionError::mismatch(format!(
                "Expected all inputs to have shape {:?}, got {:?}",
                first.shape(),
                input.shape()
            )));
        }
    }

    Ok((first, rest))
}
