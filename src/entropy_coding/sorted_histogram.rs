use super::error::{LengthLimitError, Result};
use super::MAX_CODE_LENGTH;

/// Validates the arguments every length-limiting entry point shares and
/// returns the number of used symbols.
pub(crate) fn check_limit(max_len: u8, histogram: &[u32]) -> Result<usize> {
    if max_len == 0 || max_len > MAX_CODE_LENGTH {
        return Err(LengthLimitError::InvalidLengthLimit(max_len));
    }
    let used = used_symbols(histogram)?;
    check_budget(max_len, used)?;
    Ok(used)
}

/// At least `log2(used)` bits are needed by every prefix code.
pub(crate) fn check_budget(max_len: u8, used: usize) -> Result<()> {
    debug_assert!(max_len <= MAX_CODE_LENGTH);
    match (1u64 << max_len) < crate::u64!(used) {
        true => Err(LengthLimitError::InsufficientLengthBudget { max_len, used }),
        false => Ok(()),
    }
}

pub(crate) fn check_output(histogram: &[u32], code_lens: &[u8]) {
    assert_eq!(
        histogram.len(),
        code_lens.len(),
        "Histogram and code lengths must have the same size"
    );
}

fn used_symbols(histogram: &[u32]) -> Result<usize> {
    match histogram.iter().filter(|&&count| count != 0).count() {
        0 => Err(LengthLimitError::EmptyAlphabet),
        used => Ok(used),
    }
}

/// The used part of a histogram, sorted ascending by count.
///
/// Every entry keeps the index of the symbol it came from, so results
/// computed in sorted order can be written back in symbol order. Equal
/// counts are ordered by symbol index, the lower index counts as the less
/// frequent one.
#[derive(Debug)]
pub struct SortedHistogram {
    /// count, symbol
    pairs: Vec<(u64, usize)>,
}

impl SortedHistogram {
    pub fn new(histogram: &[u32]) -> Result<Self> {
        let used = used_symbols(histogram)?;
        let mut pairs = Vec::new();
        pairs.try_reserve_exact(used)?;
        pairs.extend(
            histogram
                .iter()
                .enumerate()
                .filter(|&(_, &count)| count != 0)
                .map(|(symbol, &count)| (u64::from(count), symbol)),
        );
        // (count, symbol) pairs are unique, so unstable sorting is deterministic
        pairs.sort_unstable();
        Ok(Self { pairs })
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// Symbol ids from the least to the most frequent
    pub fn symbols(&self) -> impl DoubleEndedIterator<Item = usize> + ExactSizeIterator + '_ {
        self.pairs.iter().map(|&(_, symbol)| symbol)
    }

    /// Fresh scratch copy of the sorted counts
    pub fn weights(&self) -> Result<Vec<u64>> {
        let mut weights = Vec::new();
        weights.try_reserve_exact(self.len())?;
        weights.extend(self.pairs.iter().map(|&(count, _)| count));
        Ok(weights)
    }

    /// Writes lengths computed in sorted order back to symbol order.
    /// Unused symbols get length 0.
    pub fn scatter(&self, sorted_lens: &[u64], code_lens: &mut [u8]) {
        debug_assert_eq!(sorted_lens.len(), self.len());
        code_lens.fill(0);
        for (symbol, &len) in self.symbols().zip(sorted_lens) {
            code_lens[symbol] = crate::u8!(len);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_used_symbols() {
        let sorted = SortedHistogram::new(&[5, 0, 1, 2]).unwrap();
        assert_eq!(sorted.len(), 3);
        assert_eq!(sorted.symbols().collect::<Vec<_>>(), [2, 3, 0]);
        assert_eq!(sorted.weights().unwrap(), [1, 2, 5]);
    }

    #[test]
    fn ties_ordered_by_symbol() {
        let sorted = SortedHistogram::new(&[7, 3, 7, 0, 3, 7]).unwrap();
        assert_eq!(sorted.symbols().collect::<Vec<_>>(), [1, 4, 0, 2, 5]);
    }

    #[test]
    fn scatter_restores_symbol_order() {
        let sorted = SortedHistogram::new(&[5, 0, 1, 2]).unwrap();
        let mut code_lens = [9; 4];
        sorted.scatter(&[2, 2, 1], &mut code_lens);
        assert_eq!(code_lens, [1, 0, 2, 2]);
    }

    #[test]
    fn rejects_unused_alphabet() {
        assert_eq!(SortedHistogram::new(&[]).unwrap_err(), LengthLimitError::EmptyAlphabet);
        assert_eq!(SortedHistogram::new(&[0, 0]).unwrap_err(), LengthLimitError::EmptyAlphabet);
    }

    #[test]
    fn limit_arguments() {
        assert_eq!(check_limit(0, &[1]), Err(LengthLimitError::InvalidLengthLimit(0)));
        assert_eq!(check_limit(64, &[1]), Err(LengthLimitError::InvalidLengthLimit(64)));
        assert_eq!(check_limit(8, &[0; 4]), Err(LengthLimitError::EmptyAlphabet));
        assert_eq!(
            check_limit(1, &[1, 1, 1]),
            Err(LengthLimitError::InsufficientLengthBudget { max_len: 1, used: 3 })
        );
        assert_eq!(check_limit(1, &[1, 0, 1]), Ok(2));
        assert_eq!(check_limit(63, &[1, 2, 3]), Ok(3));
    }
}
