use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use ndarray::{s, Array2, Array3, ArrayView2};
use tracing::debug;

use crate::error::PositionError;
use crate::positional::PositionEncoding;
use crate::utils::Initializer;

#[derive(Debug)]
enum TableState {
    Unbuilt,
    Built(Arc<Array2<f32>>),
}

/// Learned position embeddings.
///
/// The `[maximum_position + 1, depth]` table is created on the first
/// `encode` call, once the depth is known, and reused afterwards. Positions
/// above `maximum_position` share its row.
#[derive(Debug)]
pub struct LearnedPositionEmbedding {
    maximum_position: usize,
    initializer: Initializer,
    seed: Option<u64>,
    table: RwLock<TableState>,
}

impl Default for LearnedPositionEmbedding {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAXIMUM_POSITION)
    }
}

impl LearnedPositionEmbedding {
    pub const DEFAULT_MAXIMUM_POSITION: usize = 128;

    pub fn new(maximum_position: usize) -> Self {
        Self {
            maximum_position,
            initializer: Initializer::default(),
            seed: None,
            table: RwLock::new(TableState::Unbuilt),
        }
    }

    /// Sets how the table is filled when it is built.
    pub fn with_initializer(mut self, initializer: Initializer, seed: Option<u64>) -> Self {
        self.initializer = initializer;
        self.seed = seed;
        self
    }

    pub fn maximum_position(&self) -> usize {
        self.maximum_position
    }

    pub fn is_built(&self) -> bool {
        matches!(
            *self.table.read().unwrap_or_else(PoisonError::into_inner),
            TableState::Built(_)
        )
    }

    /// Depth the table was built with
    pub fn depth(&self) -> Option<usize> {
        self.table().map(|table| table.ncols())
    }

    /// Shared handle to the table, if built.
    pub fn table(&self) -> Option<Arc<Array2<f32>>> {
        match &*self.table.read().unwrap_or_else(PoisonError::into_inner) {
            TableState::Built(table) => Some(Arc::clone(table)),
            TableState::Unbuilt => None,
        }
    }

    /// Mutable access for an external optimizer. Copies the table first if
    /// a handle returned by [`table`](Self::table) is still alive.
    pub fn table_mut(&mut self) -> Option<&mut Array2<f32>> {
        match self.table.get_mut().unwrap_or_else(PoisonError::into_inner) {
            TableState::Built(table) => Some(Arc::make_mut(table)),
            TableState::Unbuilt => None,
        }
    }

    /// Builds the table for `depth` unless it already exists.
    ///
    /// Concurrent first calls build a single table: the state is re-checked
    /// under the write lock.
    pub fn build(&self, depth: usize) -> Result<Arc<Array2<f32>>, PositionError> {
        if let TableState::Built(table) = &*self.read_state()? {
            return Self::check_depth(table, depth);
        }

        let mut state = self.write_state()?;
        if let TableState::Built(table) = &*state {
            return Self::check_depth(table, depth);
        }

        let rows = self.maximum_position.checked_add(1).ok_or_else(|| {
            PositionError::config(format!(
                "Maximum position {} is too large",
                self.maximum_position
            ))
        })?;
        let table = Arc::new(self.initializer.sample((rows, depth), self.seed)?);
        debug!(
            rows,
            depth,
            maximum_position = self.maximum_position,
            "built position embedding table"
        );

        *state = TableState::Built(Arc::clone(&table));
        Ok(table)
    }

    fn check_depth(
        table: &Arc<Array2<f32>>,
        depth: usize,
    ) -> Result<Arc<Array2<f32>>, PositionError> {
        if table.ncols() != depth {
            return Err(PositionError::mismatch(format!(
                "Position embeddings were built with depth {} but depth {} was requested",
                table.ncols(),
                depth
            )));
        }
        Ok(Arc::clone(table))
    }

    fn read_state(&self) -> Result<RwLockReadGuard<'_, TableState>, PositionError> {
        self.table
            .read()
            .map_err(|e| PositionError::InitializationError(e.to_string()))
    }

    fn write_state(&self) -> Result<RwLockWriteGuard<'_, TableState>, PositionError> {
        self.table
            .write()
            .map_err(|e| PositionError::InitializationError(e.to_string()))
    }
}

impl PositionEncoding for LearnedPositionEmbedding {
    fn encode(
        &self,
        positions: ArrayView2<usize>,
        depth: usize,
    ) -> Result<Array3<f32>, PositionError> {
        let table = self.build(depth)?;

        let (batch_size, steps) = positions.dim();
        let mut output = Array3::zeros((batch_size, steps, depth));

        for ((b, t), &position) in positions.indexed_iter() {
            let row = position.min(self.maximum_position);
            output.slice_mut(s![b, t, ..]).assign(&table.row(row));
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn seeded(maximum_position: usize) -> LearnedPositionEmbedding {
        LearnedPositionEmbedding::new(maximum_position)
            .with_initializer(Initializer::Normal { mean: 0.0, std: 1.0 }, Some(11))
    }

    #[test]
    fn test_lazy_build() {
        let embedding = seeded(10);
        assert!(!embedding.is_built());
        assert!(embedding.table().is_none());

        let output = embedding.encode(array![[1, 2, 3]].view(), 8).unwrap();
        assert_eq!(output.shape(), &[1, 3, 8]);
        assert!(embedding.is_built());
        assert_eq!(embedding.depth(), Some(8));
        assert_eq!(embedding.table().unwrap().shape(), &[11, 8]);
    }

    #[test]
    fn test_default_maximum_position() {
        let embedding = LearnedPositionEmbedding::default();
        assert_eq!(embedding.maximum_position(), 128);

        let table = embedding.build(4).unwrap();
        assert_eq!(table.shape(), &[129, 4]);
    }

    #[test]
    fn test_lookup_rows() {
        let embedding = seeded(5);
        let output = embedding.encode(array![[0, 3], [5, 1]].view(), 4).unwrap();
        let table = embedding.table().unwrap();

        assert_eq!(output.slice(s![0, 0, ..]), table.row(0));
        assert_eq!(output.slice(s![0, 1, ..]), table.row(3));
        assert_eq!(output.slice(s![1, 0, ..]), table.row(5));
        assert_eq!(output.slice(s![1, 1, ..]), table.row(1));
    }

    #[test]
    fn test_positions_are_clamped() {
        let embedding = seeded(6);
        let beyond = embedding.encode(array![[11]].view(), 4).unwrap();
        let at_max = embedding.encode(array![[6]].view(), 4).unwrap();
        assert_eq!(beyond, at_max);

        let huge = embedding.encode(array![[usize::MAX]].view(), 4).unwrap();
        assert_eq!(huge, at_max);
    }

    #[test]
    fn test_depth_mismatch() {
        let embedding = seeded(4);
        embedding.build(8).unwrap();

        let err = embedding.encode(array![[1]].view(), 6).unwrap_err();
        assert!(matches!(err, PositionError::DimensionMismatch(_)));
        // The original table is untouched
        assert_eq!(embedding.depth(), Some(8));
    }

    #[test]
    fn test_build_is_idempotent() {
        let embedding = seeded(4);
        let first = embedding.build(3).unwrap();
        let second = embedding.build(3).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_concurrent_first_calls_build_once() {
        let embedding = LearnedPositionEmbedding::new(32);

        let tables: Vec<Arc<Array2<f32>>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| embedding.build(16).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        let stored = embedding.table().unwrap();
        for table in &tables {
            assert!(Arc::ptr_eq(table, &stored));
        }
    }

    #[test]
    fn test_external_update_is_visible() {
        let mut embedding = seeded(3);
        embedding.build(2).unwrap();

        let table = embedding.table_mut().unwrap();
        table.fill(0.0);
        table.row_mut(2).assign(&array![1.5, -1.5]);

        let output = embedding.encode(array![[2, 9]].view(), 2).unwrap();
        assert_eq!(output.slice(s![0, 0, ..]), array![1.5f32, -1.5]);
        assert_eq!(output.slice(s![0, 1, ..]), array![0.0f32, 0.0]);
    }

    #[test]
    fn test_table_mut_before_build() {
        let mut embedding = LearnedPositionEmbedding::new(3);
        assert!(embedding.table_mut().is_none());
    }

    #[test]
    fn test_zero_initializer() {
        let embedding = LearnedPositionEmbedding::new(2).with_initializer(Initializer::Zeros, None);
        let output = embedding.encode(array![[1, 2, 3]].view(), 5).unwrap();
        assert!(output.iter().all(|&v| v == 0.0));
    }
}
