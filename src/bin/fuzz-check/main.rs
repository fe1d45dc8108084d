use std::io::{self, Result};
use std::process;

use clap::Parser;
use log::{debug, error};

use lenlimit::{
    entropy_coding::Algorithm,
    helpers::{self, CodeStats},
};

/// Aborts when an algorithm fails on the byte histogram of stdin or builds
/// a broken code, for coverage guided fuzzers
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Algorithm id, name or origin
    #[clap(default_value = "package-merge")]
    algorithm: Algorithm,

    /// Longest allowed code length
    #[clap(short = 'b', long, default_value_t = 8)]
    bits: u8,

    /// Log level, 0 (warnings) to 3 (trace)
    #[clap(short = 'v', long, default_value_t = 0)]
    verbose: u8,
}

fn crash(reason: &str) -> ! {
    error!("{}", reason);
    eprintln!("{}", reason);
    process::abort();
}

fn main() -> Result<()> {
    let args = Args::parse();
    helpers::init_logging(args.verbose)?;

    let histogram = helpers::histogram_from_reader(io::stdin().lock())?;
    // nothing to build a code for
    if histogram.iter().all(|&count| count == 0) {
        return Ok(());
    }

    let mut code_lens = vec![0; histogram.len()];
    let longest = match args.algorithm.run(args.bits, &histogram, &mut code_lens) {
        Ok(longest) => longest,
        Err(e) => crash(&format!("{}: {}", args.algorithm, e)),
    };

    let stats = CodeStats::new(args.bits, &histogram, &code_lens);
    debug!("{}", stats);
    if stats.longest != longest {
        crash(&format!("{}: reported {} bits, produced {}", args.algorithm, longest, stats.longest));
    }
    if args.algorithm != Algorithm::Unlimited && longest > args.bits {
        crash(&format!("{}: {} bits exceed the limit", args.algorithm, longest));
    }
    if histogram.iter().zip(&code_lens).any(|(&count, &len)| (count == 0) != (len == 0)) {
        crash(&format!("{}: used symbols and codes differ", args.algorithm));
    }
    if !stats.is_valid() {
        crash(&format!("{}: kraft sum {:.6}", args.algorithm, stats.kraft()));
    }
    Ok(())
}
