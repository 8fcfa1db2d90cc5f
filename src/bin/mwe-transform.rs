//! Converts between filetypes, optionally normalizing the words
use clap::Parser;

use mwetoolkit::filetype::{self, LazyPrinter, ParseOptions};
use mwetoolkit::transform::{TransformConfig, TransformHandler};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Reads corpora, candidate lists or patterns and prints them in another filetype
#[derive(Parser, Debug)]
#[command(name = "mwe-transform", version, about)]
struct Cli {
  /// Force reading the input in this filetype
  #[arg(long, value_name = "FILETYPE")]
  from: Option<String>,
  /// Output in this filetype instead of the input one
  #[arg(long, value_name = "FILETYPE")]
  to: Option<String>,
  /// Lowercase surface forms and lemmas
  #[arg(long)]
  lowercase: bool,
  /// TreeTagger input: POS tag that ends a sentence
  #[arg(long, value_name = "POS", num_args = 0..=1, default_missing_value = "SENT")]
  sent_split: Option<String>,
  #[command(flatten)]
  common: CommonArgs,
  /// Input files (stdin when absent)
  input: Vec<String>,
}

fn run(args: &Cli) -> Result<()> {
  let config = TransformConfig { lowercase: args.lowercase };
  let printer = LazyPrinter::new(args.to.as_deref());
  let mut handler = TransformHandler::new(config, Box::new(printer));
  let options = ParseOptions {
    filetype: args.from.clone(),
    sent_split: args.sent_split.clone(),
  };
  filetype::parse(&args.input, &mut handler, &options)
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
