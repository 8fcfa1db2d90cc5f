//! Adds association measures to every candidate of a candidate list
use clap::Parser;

use mwetoolkit::filetype::{self, LazyPrinter, ParseOptions};
use mwetoolkit::measures::{parse_measures, AssociationConfig, AssociationHandler};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Computes association measures from the frequencies of the candidates and of their words
#[derive(Parser, Debug)]
#[command(name = "mwe-feat-association", version, about)]
struct Cli {
  /// Colon-separated measures, among mle, pmi, t, dice and ll
  #[arg(short, long, default_value = "mle:pmi:t:dice:ll")]
  measures: String,
  /// Frequency source the candidates were extracted from, needed with backed-off counts
  #[arg(short, long, value_name = "NAME")]
  original: Option<String>,
  /// MLE is the raw frequency instead of the frequency over the corpus size
  #[arg(short, long)]
  unnorm_mle: bool,
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
  let config = AssociationConfig {
    measures: parse_measures(&args.measures)?,
    main_corpus: args.original.clone(),
    unnorm_mle: args.unnorm_mle,
  };
  let printer = LazyPrinter::new(args.to.as_deref());
  let mut handler = AssociationHandler::new(config, Box::new(printer));
  filetype::parse(&args.candidates, &mut handler, &ParseOptions::with_filetype(args.from.as_deref()))
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
