use ndarray::{s, Array3, ArrayView2};

use crate::error::PositionError;
use crate::positional::{inverse_timescales, PositionEncoding, DEFAULT_MAX_TIMESCALE};

/// Encodes positions with sine waves (Vaswani et al., 2017).
///
/// The first half of the channels holds `sin(p * inv_timescale[k])`, the
/// second half `cos(p * inv_timescale[k])`. Stateless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinusoidalPositionEncoding {
    max_timescale: f32,
}

impl Default for SinusoidalPositionEncoding {
    fn default() -> Self {
        Self::new()
    }
}

impl SinusoidalPositionEncoding {
    pub fn new() -> Self {
        Self::with_max_timescale(DEFAULT_MAX_TIMESCALE)
    }

    pub fn with_max_timescale(max_timescale: f32) -> Self {
        Self { max_timescale }
    }

    pub fn max_timescale(&self) -> f32 {
        self.max_timescale
    }
}

impl PositionEncoding for SinusoidalPositionEncoding {
    fn encode(
        &self,
        positions: ArrayView2<usize>,
        depth: usize,
    ) -> Result<Array3<f32>, PositionError> {
        let inv_timescales = inverse_timescales(depth, self.max_timescale)?;
        let half = inv_timescales.len();

        let (batch_size, steps) = positions.dim();
        let mut encoding = Array3::zeros((batch_size, steps, depth));

        for ((b, t), &position) in positions.indexed_iter() {
            let mut row = encoding.slice_mut(s![b, t, ..]);
            for (k, &inv) in inv_timescales.iter().enumerate() {
                let scaled_time = position as f32 * inv;
                row[k] = scaled_time.sin();
                row[half + k] = scaled_time.cos();
            }
        }

        Ok(encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::positional::position_sequence;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array2};
    use proptest::prelude::*;

    #[test]
    fn test_position_zero() {
        let encoding = SinusoidalPositionEncoding::new()
            .encode(array![[0]].view(), 4)
            .unwrap();
        assert_eq!(encoding, array![[[0.0f32, 0.0, 1.0, 1.0]]]);
    }

    #[test]
    fn test_known_values() {
        // depth 4: inverse timescales are [1, 1e-4]
        let encoding = SinusoidalPositionEncoding::new()
            .encode(array![[1, 2]].view(), 4)
            .unwrap();

        assert_abs_diff_eq!(encoding[[0, 0, 0]], 1.0f32.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(encoding[[0, 0, 1]], 1e-4, epsilon = 1e-6);
        assert_abs_diff_eq!(encoding[[0, 0, 2]], 1.0f32.cos(), epsilon = 1e-6);
        assert_abs_diff_eq!(encoding[[0, 0, 3]], 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(encoding[[0, 1, 0]], 2.0f32.sin(), epsilon = 1e-6);
        assert_abs_diff_eq!(encoding[[0, 1, 2]], 2.0f32.cos(), epsilon = 1e-6);
    }

    #[test]
    fn test_each_batch_row_is_encoded() {
        let encoding = SinusoidalPositionEncoding::new()
            .encode(array![[3, 1], [1, 3]].view(), 6)
            .unwrap();

        assert_eq!(encoding.shape(), &[2, 2, 6]);
        assert_eq!(encoding.slice(s![0, 0, ..]), encoding.slice(s![1, 1, ..]));
        assert_eq!(encoding.slice(s![0, 1, ..]), encoding.slice(s![1, 0, ..]));
    }

    #[test]
    fn test_odd_depth_fails() {
        let result = SinusoidalPositionEncoding::new().encode(array![[1, 2, 3]].view(), 5);
        assert!(matches!(result, Err(PositionError::ConfigError(_))));
    }

    #[test]
    fn test_depth_two_fails() {
        let result = SinusoidalPositionEncoding::new().encode(array![[1]].view(), 2);
        assert!(matches!(result, Err(PositionError::ConfigError(_))));
    }

    #[test]
    fn test_empty_positions() {
        let positions = Array2::<usize>::zeros((1, 0));
        let encoding = SinusoidalPositionEncoding::new()
            .encode(positions.view(), 8)
            .unwrap();
        assert_eq!(encoding.shape(), &[1, 0, 8]);
    }

    proptest! {
        #[test]
        fn prop_shape_and_range(timesteps in 1usize..64, half in 2usize..32) {
            let depth = half * 2;
            let positions = position_sequence(timesteps, None);
            let encoding = SinusoidalPositionEncoding::new()
                .encode(positions.view(), depth)
                .unwrap();

            prop_assert_eq!(encoding.dim(), (1, timesteps, depth));
            prop_assert!(encoding.iter().all(|v| (-1.0..=1.0).contains(v)));
        }

        #[test]
        fn prop_deterministic(timesteps in 1usize..32, half in 2usize..16) {
            let encoder = SinusoidalPositionEncoding::new();
            let positions = position_sequence(timesteps, None);
            let first = encoder.encode(positions.view(), half * 2).unwrap();
            let second = encoder.encode(positions.view(), half * 2).unwrap();

            let first_bits: Vec<u32> = first.iter().map(|v| v.to_bits()).collect();
            let second_bits: Vec<u32> = second.iter().map(|v| v.to_bits()).collect();
            prop_assert_eq!(first_bits, second_bits);
        }
    }
}
