use std::collections::TryReserveError;

use thiserror::Error;

use super::MAX_CODE_LENGTH;

/// Reasons a code length assignment can't be produced.
///
/// On any of these the output slice holds no meaningful lengths.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LengthLimitError {
    #[error("length limit {0} is outside of 1..={max}", max = MAX_CODE_LENGTH)]
    InvalidLengthLimit(u8),
    #[error("histogram has no used symbols")]
    EmptyAlphabet,
    #[error("{used} symbols can't be encoded with at most {max_len} bits")]
    InsufficientLengthBudget { max_len: u8, used: usize },
    #[error("unlimited code needs {0} bits, only up to {max} can be limited", max = MAX_CODE_LENGTH)]
    UnlimitedTooLong(u8),
    #[error("length histogram is not a complete prefix code")]
    IncompleteCode,
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("failed to allocate scratch space")]
    AllocationFailure(#[from] TryReserveError),
}

pub type Result<T> = std::result::Result<T, LengthLimitError>;
