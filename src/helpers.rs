use std::fmt;
use std::io::{self, Read};

use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::entropy_coding::MAX_CODE_LENGTH;

pub const ALPHABET_SIZE: usize = 256;

/// Byte histogram of the first 64 KiB of enwik (mattmahoney.net/dc/textdata.html)
#[rustfmt::skip]
pub const ENWIK_HISTOGRAM: [u32; ALPHABET_SIZE] = [
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 538, 0, 0, 0, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    8289, 6, 72, 31, 0, 1, 309, 509, 57, 58, 58, 0, 448, 278, 565, 490,
    150, 215, 94, 61, 57, 71, 47, 53, 87, 123, 195, 345, 294, 151, 293, 12,
    0, 275, 85, 153, 50, 97, 76, 64, 56, 134, 40, 33, 66, 113, 58, 33,
    116, 5, 98, 147, 172, 33, 17, 84, 3, 11, 19, 1172, 0, 1173, 0, 35,
    0, 4125, 472, 1866, 1424, 4746, 918, 776, 2091, 4112, 73, 308, 1796, 1593, 3528, 3514,
    1109, 177, 3069, 3334, 4336, 1288, 513, 535, 179, 670, 58, 64, 171, 64, 3, 0,
    6, 0, 5, 2, 5, 3, 0, 0, 2, 1, 3, 0, 2, 0, 0, 0,
    4, 0, 0, 1, 2, 2, 1, 2, 4, 2, 0, 2, 1, 1, 0, 1,
    4, 1, 3, 0, 1, 1, 2, 2, 1, 15, 2, 2, 0, 2, 0, 2,
    4, 1, 2, 7, 2, 0, 0, 4, 17, 2, 3, 1, 3, 3, 0, 1,
    0, 0, 0, 25, 2, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    19, 7, 0, 0, 0, 0, 0, 7, 10, 6, 0, 1, 0, 0, 0, 0,
    14, 0, 3, 5, 2, 1, 2, 0, 0, 0, 0, 1, 2, 1, 0, 0,
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
];

pub fn histogram(buf: &[u8]) -> Vec<u32> {
    let mut res = vec![0; ALPHABET_SIZE];
    add_to_histogram(&mut res, buf);
    res
}

fn add_to_histogram(res: &mut [u32], buf: &[u8]) {
    for &byte in buf {
        res[usize::from(byte)] += 1;
    }
}

/// Byte histogram of everything `reader` yields.
pub fn histogram_from_reader(mut reader: impl Read) -> io::Result<Vec<u32>> {
    let mut res = vec![0; ALPHABET_SIZE];
    let mut buf = vec![0; 1 << 16];
    loop {
        match reader.read(&mut buf) {
            Ok(0) => return Ok(res),
            Ok(n) => add_to_histogram(&mut res, &buf[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}

/// Reads whitespace separated counts, missing trailing counts are 0.
pub fn parse_histogram(text: &str) -> io::Result<Vec<u32>> {
    let mut res = vec![0; ALPHABET_SIZE];
    for (pos, token) in text.split_whitespace().enumerate() {
        if pos >= ALPHABET_SIZE {
            return Err(invalid_data(format!("more than {ALPHABET_SIZE} counts")));
        }
        res[pos] = token
            .parse()
            .map_err(|e| invalid_data(format!("count #{pos} '{token}': {e}")))?;
    }
    Ok(res)
}

fn invalid_data(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, msg)
}

/// The text format [`parse_histogram`] reads, 16 counts per line
pub fn format_histogram(histogram: &[u32]) -> String {
    histogram
        .chunks(16)
        .map(|line| line.iter().map(u32::to_string).collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Terminal logger on stderr, `verbose` counts the `-v` flags.
pub fn init_logging(verbose: u8) -> io::Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// What a set of code lengths does to a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeStats {
    pub max_len: u8,
    /// Longest used code
    pub longest: u8,
    /// 8 bits per symbol
    pub original_bits: u64,
    pub encoded_bits: u64,
    /// `Σ 2^(max_len - len)` over the used codes
    pub kraft_sum: u128,
}

impl CodeStats {
    /// `max_len` scales the Kraft sum, lengths above it are measured against
    /// `longest` instead.
    pub fn new(max_len: u8, histogram: &[u32], code_lens: &[u8]) -> Self {
        assert_eq!(histogram.len(), code_lens.len());
        let longest = code_lens.iter().copied().max().unwrap_or(0);
        let scale = max_len.max(longest).min(MAX_CODE_LENGTH);

        let mut stats = Self { max_len: scale, longest, original_bits: 0, encoded_bits: 0, kraft_sum: 0 };
        for (&count, &len) in histogram.iter().zip(code_lens) {
            stats.original_bits += 8 * u64::from(count);
            stats.encoded_bits += u64::from(count) * u64::from(len);
            if len != 0 {
                stats.kraft_sum += 1 << (scale - len.min(scale));
            }
        }
        stats
    }

    /// `2^max_len`, the Kraft sum of a complete code
    pub fn one(&self) -> u128 {
        1 << self.max_len
    }

    /// A prefix code exists for these lengths
    pub fn is_valid(&self) -> bool {
        self.kraft_sum <= self.one()
    }

    /// Every bit pattern is used
    pub fn is_complete(&self) -> bool {
        self.kraft_sum == self.one()
    }

    /// Kraft sum as a fraction, at most 1 for a prefix code
    pub fn kraft(&self) -> f64 {
        self.kraft_sum as f64 / self.one() as f64
    }

    /// Encoded size relative to the original, in percent
    pub fn ratio(&self) -> f64 {
        match self.original_bits {
            0 => 0.0,
            original => 100.0 * self.encoded_bits as f64 / original as f64,
        }
    }
}

impl fmt::Display for CodeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "limit:    {} bits, longest code has {} bits", self.max_len, self.longest)?;
        writeln!(
            f,
            "size:     {} -> {} bits ({:.3}%)",
            self.original_bits,
            self.encoded_bits,
            self.ratio()
        )?;
        write!(
            f,
            "kraft:    {:.6} ({})",
            self.kraft(),
            if self.is_valid() { "ok" } else { "FAILED" }
        )
    }
}
