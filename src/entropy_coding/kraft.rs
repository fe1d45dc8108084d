use log::{debug, trace};

use super::error::{LengthLimitError, Result};
use super::sorted_histogram::{check_limit, check_output};
use super::MAX_CODE_LENGTH;

const LOG2_3_2: f32 = 0.5849625;

/// `log2(x)` from the float's bit pattern.
///
/// The exponent is the integer part, the mantissa `m` in `[1, 2)` goes
/// through the parabola hitting `log2(m)` at 1, 1.5 and 2. The absolute
/// error stays below 0.01.
#[inline]
pub fn fast_log2(x: f32) -> f32 {
    const A: f32 = 2.0 - 4.0 * LOG2_3_2;
    const B: f32 = 12.0 * LOG2_3_2 - 5.0;
    const C: f32 = 3.0 - 8.0 * LOG2_3_2;
    const MANTISSA_BITS: u32 = 23;
    const EXPONENT_MASK: u32 = 0xff;
    const BIAS: i32 = 127;

    let bits = x.to_bits();
    let exponent = ((bits >> MANTISSA_BITS) & EXPONENT_MASK) as i32 - BIAS;
    // same mantissa, exponent 0
    let m = f32::from_bits((bits & !(EXPONENT_MASK << MANTISSA_BITS)) | ((BIAS as u32) << MANTISSA_BITS));

    exponent as f32 + (A * m + B) * m + C
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Log2 {
    /// [`fast_log2`]
    #[default]
    Fast,
    /// [`f32::log2`]
    Exact,
}

impl Log2 {
    #[inline(always)]
    pub fn eval(self, x: f32) -> f32 {
        match self {
            Log2::Fast => fast_log2(x),
            Log2::Exact => x.log2(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KraftConfig {
    initial_threshold: f32,
    threshold_step: f32,
    log: Log2,
}

impl KraftConfig {
    /// Smallest accepted step, anything smaller stops moving the threshold.
    pub const MIN_STEP: f32 = 1.0 / 65536.0;
    /// Largest accepted threshold magnitude, lengths stay within 63 bits
    pub const MAX_THRESHOLD: f32 = MAX_CODE_LENGTH as f32;

    pub fn new(initial_threshold: f32, threshold_step: f32, log: Log2) -> Result<Self> {
        if !(-Self::MAX_THRESHOLD..=Self::MAX_THRESHOLD).contains(&initial_threshold) {
            return Err(LengthLimitError::InvalidConfig("initial threshold must be within ±63"));
        }
        if !threshold_step.is_finite() || threshold_step < Self::MIN_STEP {
            return Err(LengthLimitError::InvalidConfig(
                "threshold step must be finite and at least 2^-16",
            ));
        }
        Ok(Self { initial_threshold, threshold_step, log })
    }

    pub fn initial_threshold(&self) -> f32 {
        self.initial_threshold
    }

    pub fn threshold_step(&self) -> f32 {
        self.threshold_step
    }

    pub fn log(&self) -> Log2 {
        self.log
    }
}

impl Default for KraftConfig {
    fn default() -> Self {
        Self {
            initial_threshold: 28.0 / 64.0,
            threshold_step: 1.0 / 64.0,
            log: Log2::Fast,
        }
    }
}

/// Rounded entropies and the budget they spend.
pub(crate) struct Estimate {
    /// `-log2(p)` per symbol, 0 for unused ones
    pub entropies: Vec<f32>,
    /// `2^max_len`
    pub one: u128,
    /// Scaled Kraft sum of `code_lens`
    pub spent: u128,
}

/// Validates the arguments and writes the rounded entropies to `code_lens`,
/// clamped to `1..=max_len`.
pub(crate) fn estimate(
    log: Log2,
    max_len: u8,
    histogram: &[u32],
    code_lens: &mut [u8],
) -> Result<Estimate> {
    check_output(histogram, code_lens);
    check_limit(max_len, histogram)?;

    let total: u64 = histogram.iter().map(|&count| u64::from(count)).sum();
    let inv_total = 1.0 / total as f32;
    let one = 1u128 << max_len;
    let mut spent = 0;

    let mut entropies = Vec::new();
    entropies.try_reserve_exact(histogram.len())?;
    for (&count, len) in histogram.iter().zip(code_lens.iter_mut()) {
        if count == 0 {
            *len = 0;
            entropies.push(0.0);
            continue;
        }
        let entropy = -log.eval(count as f32 * inv_total);
        // saturating cast, negative rounds to 0
        *len = ((entropy + 0.5) as u8).clamp(1, max_len);
        spent += one >> *len;
        entropies.push(entropy);
    }

    Ok(Estimate { entropies, one, spent })
}

pub(crate) fn longest(code_lens: &[u8]) -> u8 {
    code_lens.iter().copied().max().unwrap_or(0)
}

/// [`limited_kraft_with`] using the default configuration
pub fn limited_kraft(max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
    limited_kraft_with(&KraftConfig::default(), max_len, histogram, code_lens)
}

/// Sweeps the symbols in order with a falling threshold. Every code whose
/// entropy exceeds its length by more than the threshold gets one bit
/// longer, until the budget isn't overdrawn anymore.
///
/// Fast, but the codes aren't optimal and a more frequent symbol can end up
/// with a longer code than a less frequent one.
pub fn limited_kraft_with(
    config: &KraftConfig,
    max_len: u8,
    histogram: &[u32],
    code_lens: &mut [u8],
) -> Result<u8> {
    let Estimate { entropies, one, mut spent } = estimate(config.log, max_len, histogram, code_lens)?;

    let mut threshold = config.initial_threshold;
    let mut sweeps = 0u32;
    while spent > one {
        for (len, &entropy) in code_lens.iter_mut().zip(&entropies) {
            if *len == 0 || *len >= max_len {
                continue;
            }
            if entropy - f32::from(*len) > threshold {
                *len += 1;
                spent -= one >> *len;
                if spent <= one {
                    break;
                }
            }
        }
        sweeps += 1;
        // from the counter, repeated subtraction can get stuck on one float
        threshold = config.initial_threshold - sweeps as f32 * config.threshold_step;
    }
    if sweeps > 0 {
        debug!("kraft sum fits after {} sweeps, threshold {}", sweeps, threshold);
    }

    // hand out what's left, single bit codes can't shrink
    if spent < one {
        for len in code_lens.iter_mut().filter(|len| **len > 1) {
            let have = one >> *len;
            if one - spent >= have {
                *len -= 1;
                spent += have;
                if spent == one {
                    break;
                }
            }
        }
        trace!("kraft sum after shrinking: {}/{}", spent, one);
    }

    Ok(longest(code_lens))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_log2_is_exact_at_anchors() {
        for exponent in -20..20 {
            let x = 2f32.powi(exponent);
            assert!((fast_log2(x) - exponent as f32).abs() < 1e-5, "log2({x})");
            let x = 1.5 * x;
            assert!((fast_log2(x) - x.log2()).abs() < 1e-5, "log2({x})");
        }
    }

    #[test]
    fn fast_log2_accuracy() {
        let mut worst = 0f32;
        for i in 1..=100_000 {
            let x = i as f32 / 100_000.0;
            worst = worst.max((fast_log2(x) - x.log2()).abs());
        }
        assert!(worst < 0.01, "max error {worst}");
        // it's an approximation after all
        assert!(worst > 0.001);
    }

    #[test]
    fn config_validation() {
        assert_eq!(KraftConfig::default(), KraftConfig::new(0.4375, 0.015625, Log2::Fast).unwrap());
        assert!(KraftConfig::new(0.0, 0.5, Log2::Exact).is_ok());
        assert!(KraftConfig::new(-1.0, 1.0, Log2::Exact).is_ok());
        let rejected = [
            (f32::NAN, 0.1),
            (f32::INFINITY, 0.1),
            (0.5, 0.0),
            (0.5, -0.1),
            (0.5, f32::NAN),
            (0.5, 1e-9),
            (1.0e6, 0.015625),
            (-64.0, 0.015625),
        ];
        for (threshold, step) in rejected {
            let config = KraftConfig::new(threshold, step, Log2::Fast);
            assert!(matches!(config, Err(LengthLimitError::InvalidConfig(_))), "{threshold} {step}");
        }
    }

    #[test]
    fn underdrawn_budget_is_given_back() {
        // entropies 0.68, 3 and 2 leave a quarter of the budget unused
        let mut code_lens = [0; 4];
        for log in [Log2::Fast, Log2::Exact] {
            let config = KraftConfig::new(0.4375, 0.015625, log).unwrap();
            assert_eq!(limited_kraft_with(&config, 8, &[5, 0, 1, 2], &mut code_lens), Ok(2));
            assert_eq!(code_lens, [1, 0, 2, 2]);
        }
    }

    #[test]
    fn overdrawn_budget_extends_first_codes() {
        // log2(5) rounds down to 2 bits for everyone
        let mut code_lens = [0; 5];
        assert_eq!(limited_kraft(8, &[1; 5], &mut code_lens), Ok(3));
        assert_eq!(code_lens, [3, 3, 2, 2, 2]);
    }

    #[test]
    fn extreme_thresholds_terminate() {
        // every sweep above log2(5) - 2 changes nothing
        for threshold in [KraftConfig::MAX_THRESHOLD, -KraftConfig::MAX_THRESHOLD] {
            let config = KraftConfig::new(threshold, 0.015625, Log2::Fast).unwrap();
            let mut code_lens = [0; 5];
            assert_eq!(limited_kraft_with(&config, 8, &[1; 5], &mut code_lens), Ok(3));
            assert_eq!(code_lens, [3, 3, 2, 2, 2]);
        }
        let config = KraftConfig::new(40.0, KraftConfig::MIN_STEP, Log2::Exact).unwrap();
        let mut code_lens = [0; 5];
        assert_eq!(limited_kraft_with(&config, 8, &[1; 5], &mut code_lens), Ok(3));
    }

    #[test]
    fn rare_symbols_are_capped() {
        let mut histogram = [1; 9];
        histogram[0] = 1_000_000;
        let mut code_lens = [0; 9];
        assert_eq!(limited_kraft(4, &histogram, &mut code_lens), Ok(4));
        assert_eq!(code_lens[0], 1);
        assert!(code_lens[1..].iter().all(|&len| len == 4));
    }

    #[test]
    fn single_symbol() {
        let mut code_lens = [0; 3];
        assert_eq!(limited_kraft(1, &[0, 9, 0], &mut code_lens), Ok(1));
        assert_eq!(code_lens, [0, 1, 0]);
    }
}
