use ndarray::{Array2, Array3, ArrayView3};

use crate::error::PositionError;

/// Positions to encode for a sequence of `timesteps` steps, as a single
/// batch row of shape `(1, steps)`.
///
/// Without an explicit position this is `1..=timesteps`. An explicit position
/// is the one step being decoded, so the row holds only that index.
pub fn position_sequence(timesteps: usize, position: Option<usize>) -> Array2<usize> {
    match position {
        Some(position) => Array2::from_elem((1, 1), position),
        None => Array2::from_shape_fn((1, timesteps), |(_, step)| step + 1),
    }
}

/// Repeats a single-row encoding `(1, steps, depth)` along the batch axis
/// without copying.
pub fn tile_batch(
    encoding: &Array3<f32>,
    batch_size: usize,
) -> Result<ArrayView3<'_, f32>, PositionError> {
    let (rows, steps, depth) = encoding.dim();
    if rows == batch_size {
        return Ok(encoding.view());
    }
    if rows != 1 {
        return Err(PositionError::mismatch(format!(
            "Cannot tile an encoding with {} batch rows to batch size {}",
            rows, batch_size
        )));
    }

    encoding
        .broadcast((batch_size, steps, depth))
        .ok_or_else(|| {
            PositionError::mismatch(format!(
                "Cannot broadcast encoding of shape {:?} to batch size {}",
                encoding.shape(),
                batch_size
            ))
        })
}
