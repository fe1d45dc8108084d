// Moffat's in-place Huffman, see
// https://create.stephan-brumme.com/length-limited-prefix-codes/#moffat
// The three phases below reuse one buffer.

use log::trace;

use super::error::{LengthLimitError, Result};
use super::sorted_histogram::{check_output, SortedHistogram};

/// Leaf weights, sorted ascending, all non-zero
struct Leaves<'a>(&'a mut [u64]);

/// `a[k]` is the parent of internal node `k`, except for the root at `n - 2`
struct ParentLinks<'a>(&'a mut [u64]);

/// `a[k]` is the depth of internal node `k`, the deepest nodes come first
struct NodeDepths<'a>(&'a mut [u64]);

impl<'a> Leaves<'a> {
    fn into_parent_links(self) -> ParentLinks<'a> {
        let a = self.0;
        let (mut leaf, mut node) = (0, 0);

        // internal nodes are created in ascending weight order, so both the
        // unconsumed leaves and the unconsumed nodes form sorted runs and
        // the smallest item is at the start of one of them
        fn take_node(a: &[u64], leaf: usize, node: usize, next: usize) -> bool {
            leaf >= a.len() || (node < next && a[node] < a[leaf])
        }

        for next in 0..a.len() - 1 {
            // first child, assign
            if take_node(a, leaf, node, next) {
                a[next] = a[node];
                a[node] = crate::u64!(next);
                node += 1;
            } else {
                a[next] = a[leaf];
                leaf += 1;
            }

            // second child, add
            if take_node(a, leaf, node, next) {
                a[next] += a[node];
                a[node] = crate::u64!(next);
                node += 1;
            } else {
                a[next] += a[leaf];
                leaf += 1;
            }
        }

        ParentLinks(a)
    }
}

impl<'a> ParentLinks<'a> {
    fn into_node_depths(self) -> NodeDepths<'a> {
        let a = self.0;
        let root = a.len() - 2; // n leafs => n - 1 internal nodes
        a[root] = 0;
        for j in (0..root).rev() {
            // parents always have a higher index, so they're resolved already
            let parent = crate::usize!(a[j]);
            a[j] = a[parent] + 1;
        }
        debug_assert!(
            a[..=root].windows(2).all(|x| x[0] >= x[1]),
            "Internal node depths must descend towards the root."
        );
        NodeDepths(a)
    }
}

impl<'a> NodeDepths<'a> {
    /// Turns internal node depths into leaf depths, longest first.
    fn into_code_lengths(self) -> u8 {
        let a = self.0;
        let mut avail = 1;
        let mut used = 0;
        let mut depth = 0;

        // read position over internal nodes, write position over leaves
        let mut node = a.len() - 1; // one past the root
        let mut next = a.len();
        while avail > 0 {
            while node > 0 && a[node - 1] == depth {
                used += 1;
                node -= 1;
            }
            while avail > used {
                next -= 1;
                a[next] = depth;
                avail -= 1;
            }

            avail = 2 * used;
            depth += 1;
            used = 0;
        }

        crate::u8!(a[0])
    }
}

/// Optimal code lengths for a sorted, zero-free histogram.
///
/// Overwrites the frequencies with their code lengths, which end up in
/// descending order. Returns the longest length. A single symbol gets one
/// bit.
pub fn huffman_sorted_in_place(sorted_histogram: &mut [u64]) -> Result<u8> {
    debug_assert!(
        sorted_histogram.iter().all(|&x| x != 0),
        "All entries of histogram must be non-zero."
    );
    debug_assert!(
        sorted_histogram.windows(2).all(|x| x[0] <= x[1]),
        "Histogram must be sorted."
    );

    match sorted_histogram.len() {
        0 => Err(LengthLimitError::EmptyAlphabet),
        1 => {
            sorted_histogram[0] = 1;
            Ok(1)
        }
        _ => Ok(Leaves(sorted_histogram)
            .into_parent_links()
            .into_node_depths()
            .into_code_lengths()),
    }
}

/// Optimal code lengths without a length limit.
///
/// `histogram` may be in any order and contain zeros, unused symbols get
/// length 0.
pub fn huffman(histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    check_output(histogram, code_lens);
    let sorted = SortedHistogram::new(histogram)?;
    let mut lens = sorted.weights()?;
    let longest = huffman_sorted_in_place(&mut lens)?;
    trace!("unlimited code for {} symbols: {} bits", sorted.len(), longest);
    sorted.scatter(&lens, code_lens);
    Ok(longest)
}
