//! Builds the binary suffix-array index of a corpus
use clap::Parser;
use log::info;

use mwetoolkit::base::WordAttr;
use mwetoolkit::filetype::{self, ParseOptions};
use mwetoolkit::index::{Index, IndexPopulator};
use mwetoolkit::util::cli::{self, CommonArgs};
use mwetoolkit::{options_error, Result};

/// Indexes the words of a corpus, one suffix array per attribute
#[derive(Parser, Debug)]
#[command(name = "mwe-index", version, about)]
struct Cli {
  /// Base path of the index files
  #[arg(short, long, value_name = "BASEPATH")]
  index: String,
  /// Colon-separated attributes to index, among surface, lemma, pos and syn
  #[arg(short, long, default_value = "surface:lemma:pos:syn")]
  attributes: String,
  /// Build the suffix arrays with this external indexer program
  #[arg(long, value_name = "PROGRAM")]
  c_indexer: Option<String>,
  /// Force reading the corpus in this filetype
  #[arg(long, value_name = "FILETYPE")]
  from: Option<String>,
  #[command(flatten)]
  common: CommonArgs,
  /// Corpus files (stdin when absent)
  corpus: Vec<String>,
}

fn parse_attributes(list: &str) -> Result<Vec<WordAttr>> {
  let mut attributes = Vec::new();
  for name in list.split(':') {
    if name.contains('+') {
      options_error!("Composite attributes are not supported: {}", name);
    }
    let attr: WordAttr = name.parse()?;
    if !attributes.contains(&attr) {
      attributes.push(attr);
    }
  }
  Ok(attributes)
}

fn run(args: &Cli) -> Result<()> {
  let attributes = parse_attributes(&args.attributes)?;
  let mut index = Index::with_attributes(&args.index, &attributes);
  if let Some(ref program) = args.c_indexer {
    index.use_c_indexer(program);
  }
  let mut populator = IndexPopulator::new(index);
  filetype::parse(&args.corpus, &mut populator, &ParseOptions::with_filetype(args.from.as_deref()))?;
  info!("Index written to {}.info", populator.index().basepath());
  Ok(())
}

fn main() {
  let args = Cli::parse();
  cli::setup(&args.common);
  let result = run(&args);
  cli::exit_with(&args.common, result)
}
