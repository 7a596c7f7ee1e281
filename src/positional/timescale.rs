use ndarray::Array1;

use crate::error::PositionError;

/// Base of the geometric progression of sinusoid wavelengths.
pub const DEFAULT_MAX_TIMESCALE: f32 = 10000.0;

/// Per-channel inverse timescales for a sinusoidal encoding of `depth` channels.
///
/// Returns `depth / 2` values `exp(-k * ln(max_timescale) / (depth / 2 - 1))`,
/// starting at 1 and decreasing geometrically to `1 / max_timescale`.
/// `depth` must be even with at least two sine/cosine pairs.
pub fn inverse_timescales(depth: usize, max_timescale: f32) -> Result<Array1<f32>, PositionError> {
    if depth % 2 != 0 {
        return Err(PositionError::config(format!(
            "Sinusoidal position encoding expects the depth to be divisible by 2 but got {}",
            depth
        )));
    }

    let half = depth / 2;
    if half < 2 {
        return Err(PositionError::config(format!(
            "Sinusoidal position encoding needs a depth of at least 4 but got {}",
            depth
        )));
    }

    if !max_timescale.is_finite() || max_timescale <= 1.0 {
        return Err(PositionError::config(format!(
            "Maximum timescale must be finite and greater than 1, got {}",
            max_timescale
        )));
    }

    let log_increment = max_timescale.ln() / (half - 1) as f32;
    Ok(Array1::from_shape_fn(half, |k| (k as f32 * -log_increment).exp()))
}
