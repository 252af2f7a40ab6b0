use std::ops::Range;

/// Splits `total` rows among `num_workers` and returns the block for `worker_id`.
///
/// Properties:
/// - Ranges are contiguous, disjoint and cover `[0..total)`.
/// - Sizes differ by at most 1, the first `total % num_workers` workers take the extra row.
pub fn shard_range(total: usize, worker_id: usize, num_workers: usize) -> Range<usize> {
    debug_assert!(num_workers > 0);
    debug_assert!(worker_id < num_workers);

    let base = total / num_workers;
    let rem = total % num_workers;

    let start = worker_id * base + worker_id.min(rem);
    let extra = usize::from(worker_id < rem);
    let end = start + base + extra;

    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shard_range_balanced() {
        // total 10, workers 3 => sizes 4,3,3
        assert_eq!(shard_range(10, 0, 3), 0..4);
        assert_eq!(shard_range(10, 1, 3), 4..7);
        assert_eq!(shard_range(10, 2, 3), 7..10);
    }

    #[test]
    fn fewer_rows_than_workers_leaves_trailing_shards_empty() {
        assert_eq!(shard_range(1, 0, 2), 0..1);
        assert_eq!(shard_range(1, 1, 2), 1..1);
        assert!(shard_range(0, 0, 4).is_empty());
    }

    #[test]
    fn shards_cover_every_row_exactly_once() {
        for total in 0..40 {
            for workers in 1..8 {
                let mut next = 0;
                for id in 0..workers {
                    let range = shard_range(total, id, workers);
                    assert_eq!(range.start, next);
                    next = range.end;
                }
                assert_eq!(next, total);
            }
        }
    }
}
