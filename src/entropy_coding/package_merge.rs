// Inspired by
// https://create.stephan-brumme.com/length-limited-prefix-codes/#package-merge
// https://github.com/sellibitze/packagemerge-rs/blob/27adc64e3a8b51b86ea91449c6a4c1971af7c682/src/lib.rs

use std::mem;

use log::trace;

use super::error::{LengthLimitError, Result};
use super::sorted_histogram::{check_budget, check_limit, check_output, SortedHistogram};
use super::MAX_CODE_LENGTH;

/// Optimal length limited code lengths for a sorted, zero-free histogram.
///
/// Larmore and Hirschberg's package-merge: every level of the code tree is
/// a list of coins (symbols and packages of two coins from the level
/// below), the cheapest `2n - 2` coins of the top level are selected and a
/// symbol's code length is the number of selected coins containing it.
///
/// Overwrites the frequencies with their code lengths, which end up in
/// descending order. Returns the longest length.
pub fn package_merge_sorted_in_place(max_len: u8, a: &mut [u64]) -> Result<u8> {
    debug_assert!(a.iter().all(|&x| x != 0), "All entries of histogram must be non-zero.");
    debug_assert!(a.windows(2).all(|x| x[0] <= x[1]), "Histogram must be sorted.");

    if a.is_empty() {
        return Err(LengthLimitError::EmptyAlphabet);
    }
    if max_len == 0 || max_len > MAX_CODE_LENGTH {
        return Err(LengthLimitError::InvalidLengthLimit(max_len));
    }
    // one or two symbols always get a single bit
    if a.len() <= 2 {
        a.fill(1);
        return Ok(1);
    }
    check_budget(max_len, a.len())?;

    let (is_merged, top_mask) = package_levels(max_len, a)?;
    Ok(select_coins(&is_merged, top_mask, a))
}

/// Builds the coin list of every level and records where packages landed.
///
/// Bit `k` of `is_merged[p]` is set if position `p` of the level built in
/// round `k` holds a package. Returns the flags and the mask of the last
/// round that was needed.
fn package_levels(max_len: u8, histogram: &[u64]) -> Result<(Vec<u64>, u64)> {
    let len = histogram.len();
    let capacity = 2 * len;
    let relevant = 2 * len - 2; // the last 2 coins are never selected

    let mut previous = scratch(capacity)?;
    let mut current = scratch(capacity)?;
    let mut is_merged = scratch(capacity)?;
    previous.extend_from_slice(histogram);
    is_merged.resize(capacity, 0);

    let mut mask = 1;
    for _ in 1..max_len {
        // a trailing unpaired coin can't be packaged
        let pairs = previous.len() / 2;

        // a package can't be cheaper than its parts, so the two cheapest
        // coins are always plain symbols
        current.clear();
        current.extend_from_slice(&histogram[..2]);
        let mut leaf = 2;

        for package in 0..pairs {
            let weight = previous[2 * package] + previous[2 * package + 1];
            // on ties the plain symbol comes first
            while leaf < len && histogram[leaf] <= weight {
                current.push(histogram[leaf]);
                leaf += 1;
            }
            is_merged[current.len()] |= mask;
            current.push(weight);
        }
        // very skewed histograms leave symbols more expensive than any package
        current.extend_from_slice(&histogram[leaf..]);

        mask <<= 1;

        // once the relevant coins of a level repeat, every further level repeats too
        if 2 * pairs >= relevant && previous[1..relevant] == current[1..relevant] {
            break;
        }
        mem::swap(&mut previous, &mut current);
    }
    trace!("package-merge used {} levels", mask.trailing_zeros());

    // shifted one level too far
    Ok((is_merged, mask >> 1))
}

/// Walks the levels top-down, every non-package coin among the selected
/// ones adds a bit to its symbol and every package selects two coins of
/// the level below.
fn select_coins(is_merged: &[u64], top_mask: u64, code_lens: &mut [u64]) -> u8 {
    code_lens.fill(0);

    let mut selected = code_lens.len() * 2 - 2;
    let mut mask = top_mask;
    while mask != 0 && selected != 0 {
        let mut packages = 0;

        // never packages, see package_levels
        code_lens[0] += 1;
        code_lens[1] += 1;
        let mut symbol = 2;

        for &flags in &is_merged[2..selected] {
            if flags & mask == 0 {
                code_lens[symbol] += 1;
                symbol += 1;
            } else {
                packages += 1;
            }
        }

        selected = 2 * packages;
        mask >>= 1;
    }

    // the bottom level is the plain histogram
    for len in &mut code_lens[..selected] {
        *len += 1;
    }

    // least frequent symbol has the longest code
    crate::u8!(code_lens[0])
}

fn scratch(capacity: usize) -> Result<Vec<u64>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)?;
    Ok(buf)
}

/// Optimal code lengths of at most `max_len` bits.
///
/// `histogram` may be in any order and contain zeros, unused symbols get
/// length 0. Slower than the other limiters but never worse.
pub fn package_merge(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    check_output(histogram, code_lens);
    check_limit(max_len, histogram)?;
    let sorted = SortedHistogram::new(histogram)?;
    let mut lens = sorted.weights()?;
    let longest = package_merge_sorted_in_place(max_len, &mut lens)?;
    sorted.scatter(&lens, code_lens);
    Ok(longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(counts: &[u64], max_len: u8) -> Result<Vec<u64>> {
        let mut lens = counts.to_vec();
        package_merge_sorted_in_place(max_len, &mut lens)?;
        Ok(lens)
    }

    #[test]
    fn sellibitze_example() {
        let counts = [1, 32, 16, 4, 8, 2, 1];
        let mut code_lens = [0; 7];

        assert_eq!(package_merge(8, &counts, &mut code_lens), Ok(6));
        assert_eq!(code_lens, [6, 1, 2, 4, 3, 5, 6]);
        assert_eq!(sorted(&[1, 1, 2, 4, 8, 16, 32], 8), Ok(vec![6, 6, 5, 4, 3, 2, 1]));

        assert_eq!(package_merge(5, &counts, &mut code_lens), Ok(5));
        assert_eq!(code_lens, [5, 1, 2, 5, 3, 5, 5]);
        assert_eq!(sorted(&[1, 1, 2, 4, 8, 16, 32], 5), Ok(vec![5, 5, 5, 5, 3, 2, 1]));
    }

    #[test]
    fn stephan_brumme_example() {
        let counts = [270, 20, 10, 0, 1, 6, 1];
        let mut code_lens = [0; 7];
        assert_eq!(package_merge(4, &counts, &mut code_lens), Ok(4));
        assert_eq!(code_lens, [1, 2, 4, 0, 4, 4, 4]);
        assert_eq!(sorted(&[1, 1, 6, 10, 20, 270], 4), Ok(vec![4, 4, 4, 4, 2, 1]));
    }

    #[test]
    fn loose_limit_is_unlimited_huffman() {
        assert_eq!(sorted(&[1, 1, 6, 10, 20, 270], 5), Ok(vec![5, 5, 4, 3, 2, 1]));
        assert_eq!(sorted(&[1, 1, 6, 10, 20, 270], 63), Ok(vec![5, 5, 4, 3, 2, 1]));
    }

    #[test]
    fn tightest_limit_is_flat() {
        assert_eq!(sorted(&[1, 1, 2, 4, 8, 16, 32, 64], 3), Ok(vec![3; 8]));
    }

    #[test]
    fn single_symbol() {
        for max_len in [1, 2, 8, 63] {
            assert_eq!(sorted(&[1], max_len), Ok(vec![1]));
            assert_eq!(sorted(&[10], max_len), Ok(vec![1]));
        }
    }

    #[test]
    fn two_symbols() {
        for max_len in [1, 2, 8] {
            assert_eq!(sorted(&[1, 1], max_len), Ok(vec![1, 1]));
            assert_eq!(sorted(&[10, 10], max_len), Ok(vec![1, 1]));
            assert_eq!(sorted(&[1, 100], max_len), Ok(vec![1, 1]));
        }
    }

    #[test]
    fn max_len_too_small() {
        assert_eq!(
            sorted(&[1, 1, 2, 4, 8, 16, 32], 2),
            Err(LengthLimitError::InsufficientLengthBudget { max_len: 2, used: 7 })
        );
    }

    #[test]
    fn max_len_too_big() {
        assert_eq!(
            sorted(&[1, 1, 2, 4, 8, 16, 32], 64),
            Err(LengthLimitError::InvalidLengthLimit(64))
        );
        let mut code_lens = [0; 3];
        assert_eq!(
            package_merge(0, &[1, 2, 3], &mut code_lens),
            Err(LengthLimitError::InvalidLengthLimit(0))
        );
    }
}
