//! Blocked exclusive prefix sum.

use super::{for_each_item, map_items};

/// Write the exclusive prefix sum of `input` into `output` and return the
/// total.
///
/// Block sums are computed in parallel, combined sequentially, and then each
/// block writes its own slice of `output`.
///
/// # Example
///
/// ```
/// use subdiv_mesh::algo::exclusive_prefix_sum;
///
/// let mut starts = Vec::new();
/// let total = exclusive_prefix_sum(&[4, 3, 5], &mut starts, 4096, true);
/// assert_eq!(starts, vec![0, 4, 7]);
/// assert_eq!(total, 12);
/// ```
pub fn exclusive_prefix_sum(input: &[u32], output: &mut Vec<u32>, block: usize, parallel: bool) -> usize {
    let block = block.max(1);
    let chunks: Vec<&[u32]> = input.chunks(block).collect();
    let sums = map_items(parallel, chunks, |chunk| {
        chunk.iter().map(|&x| x as usize).sum::<usize>()
    });

    let mut offsets = Vec::with_capacity(sums.len());
    let mut total = 0usize;
    for sum in sums {
        offsets.push(total);
        total += sum;
    }

    output.clear();
    output.resize(input.len(), 0);
    let work: Vec<_> = output
        .chunks_mut(block)
        .zip(input.chunks(block))
        .zip(offsets)
        .collect();
    for_each_item(parallel, work, |((out, values), base)| {
        let mut acc = base;
        for (o, &x) in out.iter_mut().zip(values) {
            *o = acc as u32;
            acc += x as usize;
        }
    });

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let mut out = vec![1, 2, 3];
        assert_eq!(exclusive_prefix_sum(&[], &mut out, 16, true), 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_crosses_block_boundaries() {
        let input: Vec<u32> = (0..100).map(|i| i % 7).collect();
        let mut expected = Vec::new();
        let mut acc = 0;
        for &x in &input {
            expected.push(acc);
            acc += x;
        }

        let mut parallel = Vec::new();
        let total = exclusive_prefix_sum(&input, &mut parallel, 8, true);
        assert_eq!(parallel, expected);
        assert_eq!(total, acc as usize);

        let mut sequential = Vec::new();
        exclusive_prefix_sum(&input, &mut sequential, 3, false);
        assert_eq!(sequential, expected);
    }
}
