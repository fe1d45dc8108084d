use log::{debug, trace};

use super::error::{LengthLimitError, Result};
use super::prefix_codes::huffman_sorted_in_place;
use super::sorted_histogram::{check_limit, check_output, SortedHistogram};

/// Flattening applied to the frequencies between two unlimited codes:
/// `w' = (1 + (w >> shift) / divisor) << shift`.
///
/// Bigger divisors and shifts need fewer rounds but give worse codes.
/// bzip2 uses a divisor of 2 and clears the lowest 8 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReweightConfig {
    divisor: u64,
    shift: u32,
}

impl ReweightConfig {
    pub fn new(divisor: u64, shift: u32) -> Result<Self> {
        if divisor < 2 {
            return Err(LengthLimitError::InvalidConfig("reweight divisor must be at least 2"));
        }
        if shift > 31 {
            return Err(LengthLimitError::InvalidConfig("reweight shift must be at most 31"));
        }
        Ok(Self { divisor, shift })
    }

    pub fn divisor(&self) -> u64 {
        self.divisor
    }

    pub fn shift(&self) -> u32 {
        self.shift
    }

    /// Monotone non-decreasing and never 0, so sorted weights stay sorted
    /// and used symbols stay used.
    #[inline(always)]
    fn reweight(&self, weight: u64) -> u64 {
        (1 + (weight >> self.shift) / self.divisor) << self.shift
    }
}

impl Default for ReweightConfig {
    fn default() -> Self {
        Self { divisor: 2, shift: 0 }
    }
}

/// [`limited_reweight_with`] using the default configuration
pub fn limited_reweight(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    limited_reweight_with(&ReweightConfig::default(), max_len, histogram, code_lens)
}

/// Flattens the frequencies until the unlimited code fits into `max_len` bits.
pub fn limited_reweight_with(
    config: &ReweightConfig,
    max_len: u8,
    histogram: &[u32],
    code_lens: &mut [u8],
) -> Result<u8> {
    check_output(histogram, code_lens);
    check_limit(max_len, histogram)?;
    let sorted = SortedHistogram::new(histogram)?;
    let mut weights = sorted.weights()?;
    let mut lens = sorted.weights()?;

    let mut longest = huffman_sorted_in_place(&mut lens)?;
    let mut rounds = 0;
    while longest > max_len {
        let mut changed = false;
        for weight in &mut weights {
            let reweighted = config.reweight(*weight);
            changed |= reweighted != *weight;
            *weight = reweighted;
        }
        // guard only: at the fixed point all weights are within a factor of 2,
        // whose unlimited code needs at most ceil(log2(used)) bits
        if !changed {
            return Err(LengthLimitError::InsufficientLengthBudget { max_len, used: sorted.len() });
        }

        lens.copy_from_slice(&weights);
        longest = huffman_sorted_in_place(&mut lens)?;
        rounds += 1;
        trace!("reweight round {}: {} bits", rounds, longest);
    }
    if rounds > 0 {
        debug!("reweighting needed {} rounds to fit {} bits", rounds, max_len);
    }

    sorted.scatter(&lens, code_lens);
    Ok(longest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_validation() {
        assert_eq!(ReweightConfig::default(), ReweightConfig::new(2, 0).unwrap());
        assert!(ReweightConfig::new(3, 8).is_ok());
        assert!(matches!(ReweightConfig::new(1, 0), Err(LengthLimitError::InvalidConfig(_))));
        assert!(matches!(ReweightConfig::new(0, 0), Err(LengthLimitError::InvalidConfig(_))));
        assert!(matches!(ReweightConfig::new(2, 32), Err(LengthLimitError::InvalidConfig(_))));
    }

    #[test]
    fn reweight_is_monotone_and_positive() {
        for config in [
            ReweightConfig::default(),
            ReweightConfig::new(3, 0).unwrap(),
            ReweightConfig::new(2, 8).unwrap(),
        ] {
            let mut last = 0;
            for weight in (0..5000).chain([u64::from(u32::MAX)]) {
                let reweighted = config.reweight(weight);
                assert!(reweighted > 0);
                assert!(reweighted >= last);
                last = reweighted;
            }
        }
    }

    #[test]
    fn default_flattening() {
        let config = ReweightConfig::default();
        assert_eq!(config.reweight(1), 1);
        assert_eq!(config.reweight(2), 2);
        assert_eq!(config.reweight(10), 6);
        assert_eq!(config.reweight(270), 136);
    }

    #[test]
    fn flattens_until_it_fits() {
        // 1 1 6 10 20 270 needs three rounds, ending at 1 1 2 3 4 35
        let histogram = [270, 20, 10, 0, 1, 6, 1];
        let mut code_lens = [0; 7];
        assert_eq!(limited_reweight(4, &histogram, &mut code_lens), Ok(4));
        assert_eq!(code_lens, [1, 3, 3, 0, 4, 3, 4]);
    }

    #[test]
    fn fitting_code_is_untouched() {
        let histogram = [270, 20, 10, 0, 1, 6, 1];
        let mut code_lens = [0; 7];
        assert_eq!(limited_reweight(5, &histogram, &mut code_lens), Ok(5));
        assert_eq!(code_lens, [1, 2, 3, 0, 5, 4, 5]);
    }

    #[test]
    fn near_flat_weights_fit_the_tightest_limit() {
        for used in 2..=300usize {
            let histogram: Vec<u32> = (0..used).map(|i| 1 + (i % 2) as u32).collect();
            let max_len = (usize::BITS - (used - 1).leading_zeros()) as u8;
            let mut code_lens = vec![0; used];
            let longest = limited_reweight(max_len, &histogram, &mut code_lens).unwrap();
            assert!(longest <= max_len, "{used} symbols");
        }
    }

    #[test]
    fn shifted_weights_reach_the_limit() {
        let histogram: Vec<u32> = (0..20).map(|i| 1 << i).collect();
        let mut code_lens = vec![0; histogram.len()];
        let config = ReweightConfig::new(2, 8).unwrap();
        assert_eq!(limited_reweight_with(&config, 6, &histogram, &mut code_lens), Ok(6));
        assert!(code_lens.iter().all(|&len| (1..=6).contains(&len)));
    }
}
