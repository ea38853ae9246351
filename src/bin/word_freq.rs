//! Count word frequencies in a file (or stdin) with a fixed-capacity table.
//!
//! Usage: `word-freq [--top N] [PATH]`
//!
//! Table capacity and read chunk size come from `WORD_FREQ_CAPACITY` and
//! `WORD_FREQ_CHUNK_SIZE`. Logging is controlled by `RUST_LOG`.

use probed_table::{CounterConfig, WordCounter};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::process::ExitCode;

struct Args {
    path: Option<String>,
    top: usize,
}

const USAGE: &str = "usage: word-freq [--top N] [PATH]";

/// Parse arguments, program name excluded.
fn parse_args<I>(argv: I) -> Result<Args, String>
where
    I: IntoIterator<Item = String>,
{
    let mut args = Args { path: None, top: 10 };
    let mut it = argv.into_iter();
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--top" => {
                let n = it.next().ok_or("--top needs a value")?;
                args.top = n.parse().map_err(|_| format!("invalid --top value: {n}"))?;
            }
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ if args.path.is_none() => args.path = Some(arg),
            _ => return Err(format!("unexpected argument: {arg}")),
        }
    }
    Ok(args)
}

fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = CounterConfig::from_env();
    log::debug!("config: {config:?}");
    let mut counter = WordCounter::new(&config)?;

    let summary = match &args.path {
        Some(path) => counter.count_reader(File::open(path)?)?,
        None => counter.count_reader(io::stdin().lock())?,
    };

    let mut out = BufWriter::new(io::stdout().lock());
    writeln!(out, "total words: {}", summary.total_words)?;
    writeln!(out, "distinct words: {}", summary.distinct_words)?;
    if let Some(w) = &summary.earliest {
        writeln!(out, "earliest: {w}")?;
    }
    if let Some(w) = &summary.latest {
        writeln!(out, "latest: {w}")?;
    }
    for (word, n) in counter.top(args.top) {
        writeln!(out, "{n:>8} {word}")?;
    }
    out.flush()?;
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(a) => a,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::from(2);
        }
    };
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("word-freq: {e}");
            ExitCode::FAILURE
        }
    }
}
