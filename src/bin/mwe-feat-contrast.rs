//! Adds contrastive measures to every candidate of a candidate list
use clap::Parser;

use mwetoolkit::filetype::{self, LazyPrinter, ParseOptions};
use mwetoolkit::measures::{parse_contrast_measures, ContrastConfig, ContrastHandler};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Scores the candidates by how much more frequent they are in the main corpus than in the others
#[derive(Parser, Debug)]
#[command(name = "mwe-feat-contrast", version, about)]
struct Cli {
  /// Frequency source the candidates were extracted from; every other one is contrastive
  #[arg(short, long, value_name = "NAME")]
  original: String,
  /// Colon-separated measures, among csmwe, simplecsmwe and simplediff
  #[arg(short, long, default_value = "csmwe:simplediff:simplecsmwe")]
  measures: String,
  /// One score against all the contrastive corpora joined, instead of one per corpus
  #[arg(short, long)]
  all: bool,
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
  let config = ContrastConfig {
    measures: parse_contrast_measures(&args.measures)?,
    join_all: args.all,
    ..ContrastConfig::new(&args.original)
  };
  let printer = LazyPrinter::new(args.to.as_deref());
  let mut handler = ContrastHandler::new(config, Box::new(printer));
  filetype::parse(&args.candidates, &mut handler, &ParseOptions::with_filetype(args.from.as_deref()))
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
