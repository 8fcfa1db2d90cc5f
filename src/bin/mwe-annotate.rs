//! Annotates a corpus with the occurrences of a list of MWE candidates
use clap::Parser;

use mwetoolkit::annotate::{load_candidates, make_detector, AnnotateConfig, AnnotatorHandler, DetectorKind};
use mwetoolkit::filetype::{self, LazyPrinter, ParseOptions};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Finds the candidates of a list in a corpus and marks them as MWE occurrences
#[derive(Parser, Debug)]
#[command(name = "mwe-annotate", version, about)]
struct Cli {
  /// The MWE candidates to annotate
  #[arg(short, long = "candidates", value_name = "FILE", required = true)]
  candidates: Vec<String>,
  /// Force reading the candidates in this filetype
  #[arg(long, value_name = "FILETYPE")]
  candidates_from: Option<String>,
  /// Force reading the corpus in this filetype
  #[arg(long, value_name = "FILETYPE")]
  corpus_from: Option<String>,
  /// Output the corpus in this filetype instead of the input one
  #[arg(long, value_name = "FILETYPE")]
  to: Option<String>,
  /// Detection method: ContiguousLemma or Source
  #[arg(short, long, default_value = "ContiguousLemma")]
  detector: String,
  /// Detect with the sources of the candidates, same as `-d Source`
  #[arg(short = 'S', long)]
  source: bool,
  /// Number of gaps allowed inside an occurrence (not with Source)
  #[arg(short, long)]
  gaps: Option<usize>,
  /// Only output sentences with occurrences, without annotating them
  #[arg(long, conflicts_with = "filter_and_annot")]
  filter: bool,
  /// Only output sentences with occurrences, annotated
  #[arg(long)]
  filter_and_annot: bool,
  #[command(flatten)]
  common: CommonArgs,
  /// Corpus files (stdin when absent)
  corpus: Vec<String>,
}

fn run(args: &Cli) -> Result<()> {
  let detector = if args.source {
    DetectorKind::Source
  } else {
    args.detector.parse()?
  };
  let config = AnnotateConfig {
    detector,
    gaps: args.gaps,
    annotate: !args.filter,
    filter: args.filter || args.filter_and_annot,
  };
  config.validate()?;
  let candidates = load_candidates(&args.candidates, args.candidates_from.as_deref())?;
  let detector = make_detector(&config, candidates)?;
  let printer = LazyPrinter::new(args.to.as_deref());
  let mut handler = AnnotatorHandler::new(config, detector, Box::new(printer));
  filetype::parse(&args.corpus, &mut handler, &ParseOptions::with_filetype(args.corpus_from.as_deref()))
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
