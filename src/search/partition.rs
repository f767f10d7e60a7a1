//! Contiguous partitioning of the index for parallel search.

use std::ops::Range;

/// A contiguous half-open range of index positions handled by one worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    /// Position of this partition among its siblings.
    pub index: usize,
    /// First index position covered.
    pub start: usize,
    /// Number of positions covered.
    pub count: usize,
}

impl Partition {
    pub fn end(&self) -> usize {
        self.start + self.count
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }
}

/// Clamp a requested worker count to `[1, total]`.
///
/// Returns 0 only when there is nothing to search.
pub fn effective_workers(requested: usize, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    requested.clamp(1, total)
}

/// Split `total` positions into near-equal contiguous partitions.
///
/// The first `total % workers` partitions receive one extra position, so
/// sizes differ by at most one and partitions appear in index order.
pub fn plan_partitions(total: usize, requested_workers: usize) -> Vec<Partition> {
    let workers = effective_workers(requested_workers, total);
    if workers == 0 {
        return Vec::new();
    }

    let base = total / workers;
    let rest = total % workers;
    let mut start = 0;

    (0..workers)
        .map(|index| {
            let count = base + usize::from(index < rest);
            let partition = Partition {
                index,
                start,
                count,
            };
            start += count;
            partition
        })
        .collect()
}
