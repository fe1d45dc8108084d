pub mod error;
pub mod kraft;
pub mod kraft_heap;
pub mod length_histogram;
pub mod package_merge;
pub mod prefix_codes;
pub mod reweight;
pub mod sorted_histogram;


use std::fmt;
use std::str::FromStr;

pub use error::{LengthLimitError, Result};
pub use kraft::{fast_log2, limited_kraft, limited_kraft_with, KraftConfig, Log2};
pub use kraft_heap::{limited_kraft_heap, limited_kraft_heap_with};
pub use length_histogram::{limited_immediate, limited_incremental, LengthHistogram};
pub use package_merge::{package_merge, package_merge_sorted_in_place};
pub use prefix_codes::{huffman, huffman_sorted_in_place};
pub use reweight::{limited_reweight, limited_reweight_with, ReweightConfig};
pub use sorted_histogram::SortedHistogram;

/// Codes are limited to 63 bits, so a whole code fits into a `u64`.
pub const MAX_CODE_LENGTH: u8 = 63;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Algorithm {
    /// Optimal code without a limit, see [`huffman`]
    Unlimited,
    /// Optimal limited code, see [`package_merge`]
    PackageMerge,
    /// MiniZ, see [`LengthHistogram::limit_immediate`]
    Immediate,
    /// JPEG, see [`LengthHistogram::limit_incremental`]
    Incremental,
    /// bzip2, see [`limited_reweight_with`]
    Reweight(ReweightConfig),
    /// see [`limited_kraft_with`]
    Kraft(KraftConfig),
    /// see [`limited_kraft_heap_with`]
    KraftHeap(KraftConfig),
}

impl Algorithm {
    /// Every algorithm with its default configuration, ordered by id
    pub fn all() -> [Self; 7] {
        [
            Self::Unlimited,
            Self::PackageMerge,
            Self::Immediate,
            Self::Incremental,
            Self::Reweight(ReweightConfig::default()),
            Self::Kraft(KraftConfig::default()),
            Self::KraftHeap(KraftConfig::default()),
        ]
    }

    pub fn id(&self) -> u8 {
        match self {
            Self::Unlimited => 0,
            Self::PackageMerge => 1,
            Self::Immediate => 2,
            Self::Incremental => 3,
            Self::Reweight(_) => 4,
            Self::Kraft(_) => 5,
            Self::KraftHeap(_) => 6,
        }
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::all().into_iter().find(|algorithm| algorithm.id() == id)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unlimited => "unlimited",
            Self::PackageMerge => "package-merge",
            Self::Immediate => "immediate",
            Self::Incremental => "incremental",
            Self::Reweight(_) => "reweight",
            Self::Kraft(_) => "kraft",
            Self::KraftHeap(_) => "kraft-heap",
        }
    }

    /// Where the algorithm comes from
    pub fn origin(&self) -> &'static str {
        match self {
            Self::Unlimited => "Moffat",
            Self::PackageMerge => "Larmore/Hirschberg",
            Self::Immediate => "MiniZ",
            Self::Incremental => "JPEG",
            Self::Reweight(_) => "bzip2",
            Self::Kraft(_) | Self::KraftHeap(_) => "Kraft",
        }
    }

    /// Whether every result is a complete code with lengths ordered like
    /// the frequencies. The entropy based ones only promise a prefix code.
    pub fn is_exact(&self) -> bool {
        !matches!(self, Self::Kraft(_) | Self::KraftHeap(_))
    }

    /// Returns the longest code length. [`Algorithm::Unlimited`] ignores
    /// `max_len`.
    pub fn run(&self, max_len: u8, histogram: &[u32], code_lens: &mut [u8]) -> Result<u8> {
        match self {
            Self::Unlimited => huffman(histogram, code_lens),
            Self::PackageMerge => package_merge(max_len, histogram, code_lens),
            Self::Immediate => limited_immediate(max_len, histogram, code_lens),
            Self::Incremental => limited_incremental(max_len, histogram, code_lens),
            Self::Reweight(config) => limited_reweight_with(config, max_len, histogram, code_lens),
            Self::Kraft(config) => limited_kraft_with(config, max_len, histogram, code_lens),
            Self::KraftHeap(config) => limited_kraft_heap_with(config, max_len, histogram, code_lens),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.origin())
    }
}

/// Accepts an id, a name or an origin, e.g. `1`, `package-merge` or `jpeg`.
impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if let Ok(id) = s.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| format!("unknown algorithm id {id}"));
        }
        let s = s.to_ascii_lowercase();
        let found = match s.as_str() {
            "moffat" => Some(Self::Unlimited),
            "miniz" => Some(Self::Immediate),
            "jpeg" => Some(Self::Incremental),
            "bzip2" => Some(Self::Reweight(ReweightConfig::default())),
            _ => Self::all().into_iter().find(|algorithm| algorithm.name() == s),
        };
        found.ok_or_else(|| format!("unknown algorithm '{s}'"))
    }
}
