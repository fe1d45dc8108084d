use std::fs::File;
use std::io::{self, Result};

use clap::Parser;
use log::info;

use lenlimit::helpers;

/// Counts how often each byte occurs, prints the counts whitespace
/// separated, unused bytes included
#[derive(Parser, Debug)]
#[clap(version, about)]
struct Args {
    /// Input file, `-` reads stdin
    file: String,

    /// Log level, 0 (warnings) to 3 (trace)
    #[clap(short = 'v', long, default_value_t = 0)]
    verbose: u8,
}

fn main() -> Result<()> {
    let args = Args::parse();
    helpers::init_logging(args.verbose)?;

    let histogram = match args.file.as_str() {
        "-" => helpers::histogram_from_reader(io::stdin().lock())?,
        path => helpers::histogram_from_reader(File::open(path)?)?,
    };
    info!("{} bytes", histogram.iter().map(|&count| u64::from(count)).sum::<u64>());

    println!("{}", helpers::format_histogram(&histogram));
    Ok(())
}
