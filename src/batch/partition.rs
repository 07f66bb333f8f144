//! Batch partitioning

/// Default number of URLs per batch
pub const DEFAULT_BATCH_SIZE: usize = 50;

/// Split `items` into contiguous, ordered batches of at most `size` items.
///
/// Yields `ceil(len / size)` batches; only the last may be shorter. An empty
/// input yields no batches. A `size` of zero is treated as one.
pub fn create_batches<T>(items: &[T], size: usize) -> Vec<&[T]> {
    items.chunks(size.max(1)).collect()
}
