//! Extracts MWE candidates from a corpus with the LocalMaxs algorithm
use clap::Parser;

use mwetoolkit::filetype::{self, Category, LazyPrinter, ParseOptions};
use mwetoolkit::localmaxs::{DiskKeys, LocalMaxsConfig, LocalMaxsHandler, MemoryKeys, NgramKeys};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::util::interpret_ngram;
use mwetoolkit::Result;

/// Extracts the n-grams whose glue is a local maximum
#[derive(Parser, Debug)]
#[command(name = "mwe-localmaxs", version, about)]
struct Cli {
  /// Extract n-grams of <min> to <max> words
  #[arg(short, long, value_name = "MIN:MAX", default_value = "2:8")]
  ngram: String,
  /// Count surface forms instead of lemmas
  #[arg(short, long)]
  surface: bool,
  /// Glue measure; only scp is available
  #[arg(short = 'G', long, default_value = "scp")]
  glue: String,
  /// Output only candidates seen at least this often
  #[arg(short, long, default_value_t = 2)]
  freq: u64,
  /// Keep the n-grams in a temporary file instead of memory: slower, but smaller
  #[arg(short = 'S', long)]
  shelve: bool,
  /// Force reading the corpus in this filetype
  #[arg(long, value_name = "FILETYPE")]
  from: Option<String>,
  /// Output the candidates in this filetype
  #[arg(long, value_name = "FILETYPE", default_value = "XML")]
  to: String,
  #[command(flatten)]
  common: CommonArgs,
  /// Corpus files (stdin when absent)
  corpus: Vec<String>,
}

fn run(args: &Cli) -> Result<()> {
  let (min_ngram, max_ngram) = interpret_ngram(&args.ngram)?;
  let config = LocalMaxsConfig {
    min_ngram,
    max_ngram,
    min_frequency: args.freq,
    surface_instead_lemmas: args.surface,
    glue: args.glue.parse()?,
  };
  let keys: Box<dyn NgramKeys> = if args.shelve {
    Box::new(DiskKeys::new()?)
  } else {
    Box::new(MemoryKeys::new())
  };
  let printer = LazyPrinter::new(Some(args.to.as_str())).with_category(Category::Candidates);
  let mut handler = LocalMaxsHandler::new(config, keys, Box::new(printer));
  filetype::parse(&args.corpus, &mut handler, &ParseOptions::with_filetype(args.from.as_deref()))
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
