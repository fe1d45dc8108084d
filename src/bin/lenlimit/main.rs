use std::fs;
use std::io::{self, Read};
use std::process;
use std::str::FromStr;
use std::time::{Duration, Instant};

use clap::Parser;
use log::info;
use rayon::prelude::*;

use lenlimit::{
    entropy_coding::{Algorithm, KraftConfig, LengthLimitError, Log2, ReweightConfig},
    helpers::{self, CodeStats, ENWIK_HISTOGRAM},
};

#[derive(Debug, Clone, Copy)]
enum Selection {
    One(Algorithm),
    All,
}

impl FromStr for Selection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            _ => s.parse().map(Self::One),
        }
    }
}

/// Builds length-limited prefix codes for a byte histogram and compares
/// the algorithms by size and speed
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Algorithm id (0-6), name or origin, e.g. package-merge or jpeg. `all` runs every one
    algorithm: Selection,

    /// Longest allowed code length
    bits: u8,

    /// Runs per algorithm, for timing
    #[clap(short = 'r', long, default_value_t = 1000)]
    repeat: u32,

    /// Up to 256 whitespace separated counts, `-` reads stdin. Defaults to the first 64 KiB of enwik
    #[clap(short = 'H', long)]
    histogram: Option<String>,

    /// Reweight: weights become 1 + w / divisor
    #[clap(long, default_value_t = 2)]
    divisor: u64,

    /// Reweight: low bits kept out of the division
    #[clap(long, default_value_t = 0)]
    shift: u32,

    /// Kraft: first threshold of the sweep
    #[clap(long, default_value_t = 0.4375)]
    threshold: f32,

    /// Kraft: threshold decrement per sweep
    #[clap(long, default_value_t = 0.015625)]
    step: f32,

    /// Kraft: f32::log2 instead of the approximation
    #[clap(long)]
    exact_log: bool,

    /// Log level, 0 (warnings) to 3 (trace)
    #[clap(short = 'v', long, default_value_t = 0)]
    verbose: u8,
}

struct Report {
    algorithm: Algorithm,
    result: Result<Vec<u8>, LengthLimitError>,
    elapsed: Duration,
}

fn invalid_input(e: LengthLimitError) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, e)
}

fn load_histogram(path: Option<&str>) -> io::Result<Vec<u32>> {
    let text = match path {
        None => return Ok(ENWIK_HISTOGRAM.to_vec()),
        Some("-") => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            text
        }
        Some(path) => fs::read_to_string(path)?,
    };
    helpers::parse_histogram(&text)
}

/// Anything but a malformed histogram means the file couldn't be read
fn cannot_open(e: &io::Error) -> bool {
    e.kind() != io::ErrorKind::InvalidData
}

fn configure(algorithm: Algorithm, reweight: ReweightConfig, kraft: KraftConfig) -> Algorithm {
    match algorithm {
        Algorithm::Reweight(_) => Algorithm::Reweight(reweight),
        Algorithm::Kraft(_) => Algorithm::Kraft(kraft),
        Algorithm::KraftHeap(_) => Algorithm::KraftHeap(kraft),
        other => other,
    }
}

fn bench(algorithm: Algorithm, bits: u8, repeat: u32, histogram: &[u32]) -> Report {
    let mut code_lens = vec![0; histogram.len()];
    let timer = Instant::now();
    let mut result = Ok(0);
    for _ in 0..repeat {
        result = algorithm.run(bits, histogram, &mut code_lens);
        if result.is_err() {
            break;
        }
    }
    let elapsed = timer.elapsed();
    Report { algorithm, result: result.map(|_| code_lens), elapsed }
}

/// Prints one report, returns the exit status it asks for
fn print_report(report: &Report, bits: u8, repeat: u32, histogram: &[u32]) -> i32 {
    println!("algorithm: {}", report.algorithm);
    let code_lens = match &report.result {
        Ok(code_lens) => code_lens,
        Err(LengthLimitError::InsufficientLengthBudget { .. } | LengthLimitError::InvalidLengthLimit(_)) => {
            println!("BITS is too small ({}), no valid code possible", bits);
            return 3;
        }
        Err(e) => {
            println!("failed: {}", e);
            return 1;
        }
    };

    let stats = CodeStats::new(bits, histogram, code_lens);
    println!("limit to {} bits (max. {} bits actually produced)", bits, stats.longest);
    println!("{} => {} bits ({:.2}%)", stats.original_bits, stats.encoded_bits, stats.ratio());
    println!(
        "check Kraft value: {} ({:.6})",
        if stats.is_valid() { "ok" } else { "FAILED" },
        stats.kraft()
    );
    println!("repeat {}x, {:?} per run", repeat, report.elapsed / repeat);
    0
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    helpers::init_logging(args.verbose)?;

    let repeat = args.repeat.max(1);
    let histogram = match load_histogram(args.histogram.as_deref()) {
        Ok(histogram) => histogram,
        Err(e) if cannot_open(&e) => {
            println!("can't open histogram {}", args.histogram.as_deref().unwrap_or("-"));
            info!("{}", e);
            process::exit(2);
        }
        Err(e) => return Err(e),
    };
    info!(
        "{} symbols, {} used",
        histogram.len(),
        histogram.iter().filter(|&&count| count != 0).count()
    );

    let reweight = ReweightConfig::new(args.divisor, args.shift).map_err(invalid_input)?;
    let log = if args.exact_log { Log2::Exact } else { Log2::Fast };
    let kraft = KraftConfig::new(args.threshold, args.step, log).map_err(invalid_input)?;
    let algorithms: Vec<_> = match args.algorithm {
        Selection::One(algorithm) => vec![algorithm],
        Selection::All => Algorithm::all().to_vec(),
    };

    let timer = Instant::now();
    let reports: Vec<_> = algorithms
        .into_par_iter()
        .map(|algorithm| bench(configure(algorithm, reweight, kraft), args.bits, repeat, &histogram))
        .collect();
    info!("done in {:?}", timer.elapsed());

    let mut status = 0;
    for (i, report) in reports.iter().enumerate() {
        if i > 0 {
            println!();
        }
        status = status.max(print_report(report, args.bits, repeat, &histogram));
    }
    if status != 0 {
        process::exit(status);
    }
    Ok(())
}
