use log::{debug, trace};

use super::error::{LengthLimitError, Result};
use super::prefix_codes::huffman_sorted_in_place;
use super::sorted_histogram::{check_limit, check_output, SortedHistogram};
use super::MAX_CODE_LENGTH;

const BUCKETS: usize = MAX_CODE_LENGTH as usize + 1;

/// Number of symbols per code length, `counts[0]` stays unused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthHistogram {
    counts: [u64; BUCKETS],
}

impl LengthHistogram {
    /// Counts the lengths of a code, `0` entries are ignored.
    pub fn from_code_lengths(code_lens: &[u64]) -> Result<Self> {
        let mut counts = [0; BUCKETS];
        for &len in code_lens.iter().filter(|&&len| len != 0) {
            if len > u64::from(MAX_CODE_LENGTH) {
                return Err(LengthLimitError::UnlimitedTooLong(
                    u8::try_from(len).unwrap_or(u8::MAX),
                ));
            }
            counts[crate::usize!(len)] += 1;
        }
        Ok(Self { counts })
    }

    /// `counts[len]` symbols of length `len`, up to 63 bits.
    pub fn from_counts(counts: &[u64]) -> Self {
        assert!(counts.len() <= BUCKETS, "Code lengths are limited to {MAX_CODE_LENGTH} bits");
        assert!(counts.first().map_or(true, |&x| x == 0), "Length 0 can't be counted");
        let mut buckets = [0; BUCKETS];
        buckets[..counts.len()].copy_from_slice(counts);
        Self { counts: buckets }
    }

    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    pub fn symbols(&self) -> u64 {
        self.counts.iter().sum()
    }

    /// Longest used length, 0 if empty
    pub fn longest(&self) -> u8 {
        self.counts
            .iter()
            .rposition(|&count| count != 0)
            .map_or(0, |len| crate::u8!(len))
    }

    /// `Σ count[len] * 2^(scale - len)`, a complete code sums to `2^scale`.
    /// All used lengths must fit into `scale` bits.
    pub fn kraft_sum(&self, scale: u8) -> u128 {
        debug_assert!(self.longest() <= scale);
        (1..=scale.min(MAX_CODE_LENGTH))
            .map(|len| u128::from(self.counts[usize::from(len)]) << (scale - len))
            .sum()
    }

    /// JPEG's approach (ITU T.81, Annex K.3).
    ///
    /// Two of the longest codes `x` and `y` only differ in their last bit.
    /// Dropping that bit makes `x` one bit shorter and leaves `y` without a
    /// code. Some code `z` at least two bits shorter than `y` is extended
    /// by one bit, both of its children go to `z` and `y`. When `z` is
    /// exactly two bits shorter all three end up with the same length and
    /// the Kraft sum doesn't change.
    ///
    /// Returns the new longest length, which may be less than `new_max`.
    pub fn limit_incremental(&mut self, new_max: u8, old_max: u8) -> Result<u8> {
        check_shrink(new_max, old_max)?;
        if new_max == old_max {
            return Ok(new_max);
        }

        let counts = &mut self.counts;
        let mut i = usize::from(old_max);
        let mut steps = 0u64;
        while i > usize::from(new_max) {
            if counts[i] == 0 {
                i -= 1;
                continue;
            }
            // the longest level of a complete code is always full
            if counts[i] < 2 {
                return Err(LengthLimitError::IncompleteCode);
            }

            let mut j = i - 2;
            while j > 0 && counts[j] == 0 {
                j -= 1;
            }
            if j == 0 {
                return Err(LengthLimitError::InsufficientLengthBudget {
                    max_len: new_max,
                    used: crate::usize!(counts.iter().sum::<u64>()),
                });
            }

            counts[i] -= 2;
            counts[i - 1] += 1;
            counts[j + 1] += 2;
            counts[j] -= 1;
            steps += 1;
        }
        trace!("incremental limit {} -> {} took {} steps", old_max, new_max, steps);

        Ok(self.longest())
    }

    /// MiniZ's approach.
    ///
    /// Everything longer than `new_max` is cut down to `new_max` right
    /// away, which overdraws the Kraft budget. Every round moves one of the
    /// longest codes below the longest shorter code `z`, where it shares
    /// the extended `z` with it. That pays back exactly one unit of
    /// `2^-new_max`.
    ///
    /// Always returns `new_max`.
    pub fn limit_immediate(&mut self, new_max: u8, old_max: u8) -> Result<u8> {
        check_shrink(new_max, old_max)?;
        if new_max == old_max {
            return Ok(new_max);
        }

        let max = usize::from(new_max);
        let counts = &mut self.counts;
        let folded: u64 = counts[max + 1..=usize::from(old_max)].iter().sum();
        counts[max] += folded;
        counts[max + 1..].fill(0);

        let one = 1u128 << new_max;
        let mut total = self.kraft_sum(new_max);
        trace!("immediate limit folded {} codes, overdrawn by {}", folded, total.saturating_sub(one));

        let counts = &mut self.counts;
        while total > one {
            debug_assert!(counts[max] > 0);
            counts[max] -= 1;

            let donor = (1..max).rev().find(|&len| counts[len] > 0).ok_or_else(|| {
                LengthLimitError::InsufficientLengthBudget {
                    max_len: new_max,
                    used: crate::usize!(counts.iter().sum::<u64>() + 1),
                }
            })?;
            counts[donor] -= 1;
            // the selected code often lands on the length it already had
            counts[donor + 1] += 2;

            total -= 1;
        }

        Ok(new_max)
    }

    /// Hands the lengths back out in sorted symbol order: `code_lens[0]`
    /// (least frequent) gets the longest length.
    pub fn assign(mut self, longest: u8, code_lens: &mut [u64]) {
        debug_assert_eq!(self.symbols(), crate::u64!(code_lens.len()));
        let mut len = usize::from(longest);
        for code_len in code_lens {
            *code_len = crate::u64!(len);
            self.counts[len] -= 1;
            while len > 0 && self.counts[len] == 0 {
                len -= 1;
            }
        }
    }
}

fn check_shrink(new_max: u8, old_max: u8) -> Result<()> {
    if new_max <= 1 || new_max > old_max || old_max > MAX_CODE_LENGTH {
        return Err(LengthLimitError::InvalidLengthLimit(new_max));
    }
    Ok(())
}

type Limiter = fn(&mut LengthHistogram, u8, u8) -> Result<u8>;

fn limited_with(limiter: Limiter, max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    check_output(histogram, code_lens);
    check_limit(max_len, histogram)?;
    let sorted = SortedHistogram::new(histogram)?;
    let mut lens = sorted.weights()?;

    let unlimited = huffman_sorted_in_place(&mut lens)?;
    let longest = match unlimited <= max_len {
        true => unlimited,
        false => {
            let mut lengths = LengthHistogram::from_code_lengths(&lens)?;
            let longest = limiter(&mut lengths, max_len, unlimited)?;
            debug!("limited {} symbols from {} to {} bits", sorted.len(), unlimited, longest);
            lengths.assign(longest, &mut lens);
            longest
        }
    };

    sorted.scatter(&lens, code_lens);
    Ok(longest)
}

/// Limits the unlimited code with [`LengthHistogram::limit_incremental`].
pub fn limited_incremental(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    limited_with(LengthHistogram::limit_incremental, max_len, histogram, code_lens)
}

/// Limits the unlimited code with [`LengthHistogram::limit_immediate`].
pub fn limited_immediate(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    limited_with(LengthHistogram::limit_immediate, max_len, histogram, code_lens)
}
