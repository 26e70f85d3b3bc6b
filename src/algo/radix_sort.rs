//! Stable LSD radix sort over 64-bit keys.
//!
//! Eight passes of one byte each. Digit histograms are counted per block in
//! parallel, then every block scatters in parallel into output slices laid
//! out bucket-major and block-minor, which keeps the sort stable and the
//! output independent of scheduling. Passes where every key shares
//! the same digit are skipped, so small index ranges only pay for the bytes
//! they use.

use super::{for_each_item, map_items};

const RADIX_BITS: u32 = 8;
const BUCKETS: usize = 1 << RADIX_BITS;
const PASSES: u32 = u64::BITS / RADIX_BITS;

/// Types that can be ordered by a 64-bit key.
pub trait RadixKey {
    /// The sort key.
    fn radix_key(&self) -> u64;
}

impl RadixKey for u64 {
    #[inline]
    fn radix_key(&self) -> u64 {
        *self
    }
}

#[inline]
fn digit<T: RadixKey>(item: &T, shift: u32) -> usize {
    ((item.radix_key() >> shift) as usize) & (BUCKETS - 1)
}

/// Sort `data` by [`RadixKey::radix_key`], stable for equal keys.
///
/// `scratch` is used as the ping-pong buffer and is left with unspecified
/// contents of the same length as `data`.
///
/// # Example
///
/// ```
/// use subdiv_mesh::algo::radix_sort;
///
/// let mut keys = vec![5u64, 1 << 40, 3, 5, 0];
/// let mut scratch = Vec::new();
/// radix_sort(&mut keys, &mut scratch, 2, true);
/// assert_eq!(keys, vec![0, 3, 5, 5, 1 << 40]);
/// ```
pub fn radix_sort<T>(data: &mut Vec<T>, scratch: &mut Vec<T>, block: usize, parallel: bool)
where
    T: RadixKey + Copy + Send + Sync,
{
    let n = data.len();
    if n <= 1 {
        return;
    }
    let block = block.max(1);
    scratch.clear();
    scratch.resize(n, data[0]);

    for pass in 0..PASSES {
        let shift = pass * RADIX_BITS;

        let chunks: Vec<&[T]> = data.chunks(block).collect();
        let histograms: Vec<[usize; BUCKETS]> = map_items(parallel, chunks, |chunk| {
            let mut histogram = [0usize; BUCKETS];
            for item in chunk {
                histogram[digit(item, shift)] += 1;
            }
            histogram
        });

        let mut totals = [0usize; BUCKETS];
        for histogram in &histograms {
            for (total, count) in totals.iter_mut().zip(histogram) {
                *total += count;
            }
        }
        if totals.contains(&n) {
            continue;
        }

        // bucket-major, then block order: block b writes after blocks < b,
        // so every (block, bucket) pair owns one disjoint output slice
        let mut targets: Vec<Vec<&mut [T]>> = (0..histograms.len())
            .map(|_| Vec::with_capacity(BUCKETS))
            .collect();
        let mut rest: &mut [T] = scratch.as_mut_slice();
        for bucket in 0..BUCKETS {
            for (target, histogram) in targets.iter_mut().zip(&histograms) {
                let (head, tail) = std::mem::take(&mut rest).split_at_mut(histogram[bucket]);
                target.push(head);
                rest = tail;
            }
        }

        let work: Vec<(&[T], Vec<&mut [T]>)> = data.chunks(block).zip(targets).collect();
        for_each_item(parallel, work, |(chunk, mut buckets)| {
            let mut cursor = [0usize; BUCKETS];
            for item in chunk {
                let d = digit(item, shift);
                buckets[d][cursor[d]] = *item;
                cursor[d] += 1;
            }
        });

        std::mem::swap(data, scratch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Tagged {
        key: u64,
        tag: usize,
    }

    impl RadixKey for Tagged {
        fn radix_key(&self) -> u64 {
            self.key
        }
    }

    fn pseudo_random(n: usize) -> Vec<u64> {
        let mut state = 0x9E37_79B9_7F4A_7C15u64;
        (0..n)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state
            })
            .collect()
    }

    #[test]
    fn test_matches_std_sort() {
        let mut keys = pseudo_random(5000);
        let mut expected = keys.clone();
        expected.sort_unstable();

        let mut scratch = Vec::new();
        radix_sort(&mut keys, &mut scratch, 64, true);
        assert_eq!(keys, expected);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let mut items: Vec<Tagged> = (0..300)
            .map(|i| Tagged {
                key: (i % 5) as u64 | (if i % 2 == 0 { u64::MAX << 60 } else { 0 }),
                tag: i,
            })
            .collect();
        let mut expected = items.clone();
        expected.sort_by_key(|t| t.key);

        let mut scratch = Vec::new();
        radix_sort(&mut items, &mut scratch, 7, true);
        assert_eq!(items, expected);
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let keys = pseudo_random(2000);
        let mut a = keys.clone();
        let mut b = keys;
        let mut scratch = Vec::new();
        radix_sort(&mut a, &mut scratch, 100, true);
        radix_sort(&mut b, &mut scratch, 100, false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_sentinel_keys_sort_last() {
        let mut keys = vec![u64::MAX, 7, u64::MAX, 2];
        let mut scratch = Vec::new();
        radix_sort(&mut keys, &mut scratch, 4096, false);
        assert_eq!(keys, vec![2, 7, u64::MAX, u64::MAX]);
    }
}
