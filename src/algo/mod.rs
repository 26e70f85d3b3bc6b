//! Data-parallel building blocks used by the topology passes.
//!
//! - **Prefix sums**: start offsets from per-face valences
//! - **Radix sort**: stable, deterministic sort over 64-bit keys
//!
//! Every helper takes a `parallel` switch. The sequential path walks the same
//! blocks in the same order, so results never depend on the thread count.

pub mod prefix;
pub mod radix_sort;

pub use prefix::exclusive_prefix_sum;
pub use radix_sort::{radix_sort, RadixKey};

use rayon::prelude::*;

/// Default number of items handed to one task.
pub const DEFAULT_BLOCK_SIZE: usize = 4096;

/// Run `f` on every item, fanning out to the rayon pool when `parallel` is set.
pub(crate) fn for_each_item<T, F>(parallel: bool, items: Vec<T>, f: F)
where
    T: Send,
    F: Fn(T) + Sync + Send,
{
    if parallel {
        items.into_par_iter().for_each(f);
    } else {
        items.into_iter().for_each(f);
    }
}

/// Map every item, preserving input order in the output.
pub(crate) fn map_items<T, R, F>(parallel: bool, items: Vec<T>, f: F) -> Vec<R>
where
    T: Send,
    R: Send,
    F: Fn(T) -> R + Sync + Send,
{
    if parallel {
        items.into_par_iter().map(f).collect()
    } else {
        items.into_iter().map(f).collect()
    }
}

/// Split `0..len` into consecutive ranges of at most `block` items.
pub(crate) fn block_ranges(len: usize, block: usize) -> Vec<std::ops::Range<usize>> {
    let block = block.max(1);
    (0..len.div_ceil(block))
        .map(|b| b * block..((b + 1) * block).min(len))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_ranges_cover_input() {
        let ranges = block_ranges(10, 4);
        assert_eq!(ranges, vec![0..4, 4..8, 8..10]);
        assert!(block_ranges(0, 4).is_empty());
        assert_eq!(block_ranges(3, 0), vec![0..1, 1..2, 2..3]);
    }

    #[test]
    fn test_map_items_keeps_order() {
        let items: Vec<usize> = (0..1000).collect();
        let parallel = map_items(true, items.clone(), |x| x * 2);
        let sequential = map_items(false, items, |x| x * 2);
        assert_eq!(parallel, sequential);
        assert_eq!(parallel[999], 1998);
    }
}
