//! Extracts MWE candidates from a corpus, with patterns or as plain n-grams
use clap::Parser;

use mwetoolkit::candidates::{CandidatesConfig, CandidatesGeneratorHandler};
use mwetoolkit::filetype::{self, Category, LazyPrinter, ParseOptions};
use mwetoolkit::patterns::{self, parse_id_order, MatchOptions, ParsedPattern};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::util::interpret_ngram;
use mwetoolkit::{options_error, Result};

/// Extracts the candidates matching patterns, or every n-gram, from a corpus
#[derive(Parser, Debug)]
#[command(name = "mwe-candidates", version, about)]
struct Cli {
  /// Patterns file describing the candidates to extract
  #[arg(short, long, conflicts_with = "ngram", required_unless_present = "ngram")]
  patterns: Option<String>,
  /// Extract every n-gram of <min> to <max> words
  #[arg(short, long, value_name = "MIN:MAX")]
  ngram: Option<String>,
  /// Force reading the patterns in this filetype
  #[arg(long, value_name = "FILETYPE")]
  patterns_from: Option<String>,
  /// Which matches are output at each position: All, Longest or Shortest
  #[arg(short = 'd', long, default_value = "All")]
  match_distance: String,
  /// Do not output overlapping matches (not allowed with distance All)
  #[arg(short = 'N', long)]
  non_overlapping: bool,
  /// Output the words in this colon-separated order of pattern ids; `*` is the rest
  #[arg(long, default_value = "*")]
  id_order: String,
  /// Output the count of each candidate
  #[arg(short, long)]
  freq: bool,
  /// Ignore parts of speech when comparing candidates
  #[arg(short = 'g', long)]
  ignore_pos: bool,
  /// Count surface forms instead of lemmas
  #[arg(short, long)]
  surface: bool,
  /// Output the sentence ids and word positions of each occurrence
  #[arg(short = 'S', long)]
  source: bool,
  /// Force reading the corpus in this filetype
  #[arg(long, value_name = "FILETYPE")]
  from: Option<String>,
  /// Output the candidates in this filetype
  #[arg(long, value_name = "FILETYPE", default_value = "XML")]
  to: String,
  /// TreeTagger input: POS tag that ends a sentence
  #[arg(long, value_name = "POS", num_args = 0..=1, default_missing_value = "SENT")]
  sent_split: Option<String>,
  #[command(flatten)]
  common: CommonArgs,
  /// Corpus files (stdin when absent)
  corpus: Vec<String>,
}

fn run(args: &Cli) -> Result<()> {
  let patterns: Vec<ParsedPattern> = match (&args.patterns, &args.ngram) {
    (Some(path), _) => patterns::load_patterns(path, args.patterns_from.as_deref())?,
    (None, Some(range)) => {
      let (min, max) = interpret_ngram(range)?;
      vec![ParsedPattern::generic(min, max)]
    },
    (None, None) => options_error!("Exactly one option, -p or -n, must be provided"),
  };
  let match_options = MatchOptions {
    distance: args.match_distance.parse()?,
    overlapping: !args.non_overlapping,
    id_order: parse_id_order(&args.id_order),
    ..MatchOptions::default()
  };
  let config = CandidatesConfig {
    match_options,
    ignore_pos: args.ignore_pos,
    surface_instead_lemmas: args.surface,
    print_cand_freq: args.freq,
    print_source: args.source,
    ..CandidatesConfig::new(patterns)
  };
  let printer = LazyPrinter::new(Some(args.to.as_str())).with_category(Category::Candidates);
  let mut handler = CandidatesGeneratorHandler::new(config, Box::new(printer))?;
  let options = ParseOptions {
    filetype: args.from.clone(),
    sent_split: args.sent_split.clone(),
  };
  filetype::parse(&args.corpus, &mut handler, &options)
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
