//! Combines the frequencies a candidate list got from several corpora
use clap::Parser;

use mwetoolkit::combine::{parse_heuristics, CombineConfig, FreqCombinerHandler};
use mwetoolkit::filetype::{self, LazyPrinter, ParseOptions};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Adds one combined frequency per heuristic to the candidates and their words
#[derive(Parser, Debug)]
#[command(name = "mwe-combine-freqs", version, about)]
struct Cli {
  /// Colon-separated heuristics, among uniform, inverse and backoff
  #[arg(short, long, default_value = "uniform:inverse:backoff")]
  combination: String,
  /// Frequency source the candidates were extracted from, required by backoff
  #[arg(short, long, value_name = "NAME")]
  original: Option<String>,
  /// Force reading the candidates in this filetype
  #[arg(long, value_name = "FILETYPE")]
  from: Option<String>,
  /// Output in this filetype instead of the input one
  #[arg(long, value_name = "FILETYPE")]
  to: Option<String>,
  #[command(flatten)]
  common: CommonArgs,
  /// Candidate files (stdin when absent)
  candidates: Vec<String>,
}

fn run(args: &Cli) -> Result<()> {
  let config = CombineConfig {
    heuristics: parse_heuristics(&args.combination)?,
    main_corpus: args.original.clone(),
  };
  let printer = LazyPrinter::new(args.to.as_deref());
  let mut handler = FreqCombinerHandler::new(config, Box::new(printer))?;
  filetype::parse(&args.candidates, &mut handler, &ParseOptions::with_filetype(args.from.as_deref()))
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
