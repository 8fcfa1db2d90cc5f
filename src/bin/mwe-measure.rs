//! Evaluates the MWE occurrences of a corpus against a reference corpus
use clap::Parser;

use mwetoolkit::base::Sentence;
use mwetoolkit::evaluation::{compare_sentence_lists, EvaluationConfig};
use mwetoolkit::filetype::{self, EntityCollectorHandler, ParseOptions};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::Result;

/// Prints the precision, recall and F-measure of the predicted MWE occurrences
#[derive(Parser, Debug)]
#[command(name = "mwe-measure", version, about)]
struct Cli {
  /// Gold-standard corpus with annotated MWE occurrences
  #[arg(short, long, value_name = "FILE")]
  reference: String,
  /// Force reading the reference in this filetype
  #[arg(long, value_name = "FILETYPE")]
  reference_from: Option<String>,
  /// Force reading the predicted corpus in this filetype
  #[arg(long, value_name = "FILETYPE")]
  corpus_from: Option<String>,
  /// MWE comparison: ExactMatch or LinkBased
  #[arg(short, long, default_value = "ExactMatch")]
  evaluator: String,
  /// Sentence pairing between the corpora: Naive
  #[arg(long, default_value = "Naive")]
  sentence_aligner: String,
  #[command(flatten)]
  common: CommonArgs,
  /// Predicted corpus files (stdin when absent)
  corpus: Vec<String>,
}

fn read_sentences(paths: &[String], filetype: Option<&str>) -> Result<Vec<Sentence>> {
  let mut collector = EntityCollectorHandler::new();
  filetype::parse(paths, &mut collector, &ParseOptions::with_filetype(filetype))?;
  Ok(collector.into_sentences())
}

fn run(args: &Cli) -> Result<()> {
  let config = EvaluationConfig {
    aligner: args.sentence_aligner.parse()?,
    evaluator: args.evaluator.parse()?,
  };
  let reference = read_sentences(&[args.reference.clone()], args.reference_from.as_deref())?;
  let prediction = read_sentences(&args.corpus, args.corpus_from.as_deref())?;
  let results = compare_sentence_lists(&config, &reference, &prediction);
  print!("{}", results);
  Ok(())
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
