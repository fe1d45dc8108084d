use std::cmp::Ordering;
use std::collections::BinaryHeap;

use log::debug;

use super::error::Result;
use super::kraft::{estimate, longest, Estimate, KraftConfig};

/// A code that may still change length, ordered by how much it was
/// rounded down. Equal gains put the lower symbol first.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    /// entropy - code length
    gain: f32,
    symbol: usize,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.gain
            .total_cmp(&other.gain)
            .then_with(|| other.symbol.cmp(&self.symbol))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

/// [`limited_kraft_heap_with`] using the default configuration
pub fn limited_kraft_heap(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    limited_kraft_heap_with(&KraftConfig::default(), max_len, histogram, code_lens)
}

/// Like [`limited_kraft_with`](super::limited_kraft_with), but always
/// extends the code with the biggest gain instead of sweeping.
///
/// Converges faster than the sweep, the codes are slightly worse. The
/// thresholds of `config` are ignored.
pub fn limited_kraft_heap_with(
    config: &KraftConfig,
    max_len: u8,
    histogram: &[u32],
    code_lens: &mut [u8],
) -> Result<u8> {
    let Estimate { entropies, one, mut spent } = estimate(config.log(), max_len, histogram, code_lens)?;

    let mut heap = BinaryHeap::new();
    heap.try_reserve_exact(histogram.len())?;
    for (symbol, (&len, &entropy)) in code_lens.iter().zip(&entropies).enumerate() {
        if len != 0 && len < max_len {
            heap.push(Candidate { gain: entropy - f32::from(len), symbol });
        }
    }

    let mut extended = 0;
    while spent > one {
        // the budget check guarantees a fit before every code is at max_len
        let Some(mut candidate) = heap.pop() else {
            break;
        };
        let len = &mut code_lens[candidate.symbol];
        if *len == 0 || *len >= max_len {
            continue;
        }

        *len += 1;
        spent -= one >> *len;
        extended += 1;
        if spent <= one {
            break;
        }

        candidate.gain -= 1.0;
        if *len < max_len {
            heap.push(candidate);
        }
    }
    debug_assert!(spent <= one);
    if extended > 0 {
        debug!("kraft heap extended {} codes", extended);
    }

    // shrink in gain order, single bit codes can't shrink
    while spent < one {
        let Some(candidate) = heap.pop() else {
            break;
        };
        let len = &mut code_lens[candidate.symbol];
        if *len <= 1 {
            continue;
        }
        let have = one >> *len;
        if one - spent >= have {
            *len -= 1;
            spent += have;
        }
    }

    Ok(longest(code_lens))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy_coding::error::LengthLimitError;
    use crate::entropy_coding::kraft::Log2;

    #[test]
    fn candidate_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Candidate { gain: 0.25, symbol: 3 });
        heap.push(Candidate { gain: -0.5, symbol: 0 });
        heap.push(Candidate { gain: 0.25, symbol: 1 });
        heap.push(Candidate { gain: 0.4, symbol: 7 });
        let order: Vec<_> = std::iter::from_fn(|| heap.pop()).map(|c| c.symbol).collect();
        assert_eq!(order, [7, 1, 3, 0]);
    }

    #[test]
    fn underdrawn_budget_is_given_back() {
        let mut code_lens = [0; 4];
        for log in [Log2::Fast, Log2::Exact] {
            let config = KraftConfig::new(0.4375, 0.015625, log).unwrap();
            assert_eq!(limited_kraft_heap_with(&config, 8, &[5, 0, 1, 2], &mut code_lens), Ok(2));
            assert_eq!(code_lens, [1, 0, 2, 2]);
        }
    }

    #[test]
    fn ties_extend_lower_symbols_first() {
        let mut code_lens = [0; 5];
        assert_eq!(limited_kraft_heap(8, &[1; 5], &mut code_lens), Ok(3));
        assert_eq!(code_lens, [3, 3, 2, 2, 2]);
    }

    #[test]
    fn singleton_stays_one_bit() {
        let mut code_lens = [0; 4];
        for max_len in [1, 2, 8] {
            assert_eq!(limited_kraft_heap(max_len, &[0, 0, 0, 3], &mut code_lens), Ok(1));
            assert_eq!(code_lens, [0, 0, 0, 1]);
        }
    }

    #[test]
    fn errors() {
        let mut code_lens = [0; 3];
        assert_eq!(
            limited_kraft_heap(1, &[1, 1, 1], &mut code_lens),
            Err(LengthLimitError::InsufficientLengthBudget { max_len: 1, used: 3 })
        );
        assert_eq!(limited_kraft_heap(8, &[0; 3], &mut code_lens), Err(LengthLimitError::EmptyAlphabet));
    }
}
