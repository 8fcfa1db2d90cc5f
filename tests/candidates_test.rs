//! Candidate extraction over the fixture corpora, read back from the printed output

extern crate mwetoolkit;
extern crate serde;
extern crate csv;

use serde::Deserialize;

use mwetoolkit::base::Candidate;
use mwetoolkit::candidates::{CandidatesConfig, CandidatesGeneratorHandler};
use mwetoolkit::filetype::{self, Category, EntityCollectorHandler, InputFile, LazyPrinter, ParseOptions, SharedBuffer};
use mwetoolkit::patterns::{self, MatchOptions, ParsedPattern};
use mwetoolkit::util::test::resource;

fn extract(corpus: &str, config: CandidatesConfig, to: &str) -> String {
  let buffer = SharedBuffer::new();
  let printer = LazyPrinter::new(Some(to))
    .with_category(Category::Candidates)
    .with_output(buffer.boxed());
  let mut handler = CandidatesGeneratorHandler::new(config, Box::new(printer)).unwrap();
  filetype::parse(&[resource(corpus)], &mut handler, &ParseOptions::default()).unwrap();
  buffer.contents()
}

fn read_candidates(xml: &str) -> Vec<Candidate> {
  let input = InputFile::from_bytes("extracted.xml", xml.as_bytes()).unwrap();
  let mut collector = EntityCollectorHandler::new();
  filetype::parse_inputs(vec![input], &mut collector, &ParseOptions::default()).unwrap();
  collector.into_candidates()
}

fn sources(candidate: &Candidate) -> Vec<String> {
  candidate.occurs.iter().flat_map(|o| o.sources.iter().cloned()).collect()
}

#[test]
fn test_adjective_noun_pattern() {
  let patterns = patterns::load_patterns(&resource("adjnoun.patterns.xml"), None).unwrap();
  assert_eq!(patterns.len(), 1);
  let config = CandidatesConfig {
    print_source: true,
    print_cand_freq: true,
    ..CandidatesConfig::new(patterns)
  };
  let printed = extract("oldman.xml", config, "XML");
  assert!(printed.contains("<corpussize name=\"oldman\" value=\"8\""));
  let candidates = read_candidates(&printed);
  assert_eq!(candidates.len(), 1);
  let cand = &candidates[0];
  assert_eq!(cand.id_number, 1);
  let lemmas: Vec<&str> = cand.words().iter().filter_map(|w| w.lemma.as_deref()).collect();
  assert_eq!(lemmas, vec!["old", "man"]);
  assert_eq!(cand.ngram.get_freq_value("oldman"), 2);
  assert_eq!(sources(cand), vec!["1:2,3", "2:2,3"]);
  let surfaces: Vec<&str> = cand.occurs.iter().filter_map(|o| o.words[1].surface.as_deref()).collect();
  assert_eq!(surfaces, vec!["man", "men"]);
}

#[test]
fn test_repeated_expression_is_merged() {
  let pattern = ParsedPattern::from_xml("<pat><w lemma=\"kick\"/><w lemma=\"the\"/><w lemma=\"bucket\"/></pat>").unwrap();
  let config = CandidatesConfig {
    print_source: true,
    print_cand_freq: true,
    ..CandidatesConfig::new(vec![pattern])
  };
  let candidates = read_candidates(&extract("bucket.moses", config, "XML"));
  assert_eq!(candidates.len(), 1);
  assert_eq!(candidates[0].ngram.get_freq_value("bucket.moses"), 2);
  assert_eq!(sources(&candidates[0]), vec!["1:2,3,4", "2:3,4,5"]);
}

#[test]
fn test_ngrams_without_pos() {
  let config = CandidatesConfig {
    ignore_pos: true,
    print_cand_freq: true,
    match_options: MatchOptions::default(),
    ..CandidatesConfig::new(vec![ParsedPattern::generic(2, 2)])
  };
  let candidates = read_candidates(&extract("bucket.moses", config, "XML"));
  // 4 + 5 bigrams, "kick the" and "the bucket" seen twice
  assert_eq!(candidates.len(), 7);
  assert!(candidates.iter().all(|c| c.words().iter().all(|w| w.pos.is_none())));
  let the_bucket: Vec<&Candidate> = candidates
    .iter()
    .filter(|c| c.ngram.to_plain() == "the_bucket")
    .collect();
  assert_eq!(the_bucket.len(), 1);
  assert_eq!(the_bucket[0].ngram.get_freq_value("bucket.moses"), 2);
}

#[derive(Debug, Deserialize)]
struct CsvRow {
  id: u64,
  ngram: String,
  pos: String,
  occurs: String,
  sources: String,
}

#[test]
fn test_csv_output_reads_as_a_table() {
  let patterns = patterns::load_patterns(&resource("adjnoun.patterns.xml"), None).unwrap();
  let config = CandidatesConfig {
    print_source: true,
    ..CandidatesConfig::new(patterns)
  };
  let printed = extract("oldman.xml", config, "CSV");
  let mut reader = csv::ReaderBuilder::new()
    .delimiter(b'\t')
    .comment(Some(b'#'))
    .from_reader(printed.as_bytes());
  let headers = reader.headers().unwrap().clone();
  assert_eq!(&headers[3], "oldman");
  let rows: Vec<CsvRow> = reader.deserialize().map(|row| row.unwrap()).collect();
  assert_eq!(rows.len(), 1);
  assert_eq!(rows[0].id, 1);
  assert_eq!(rows[0].ngram, "old man");
  assert_eq!(rows[0].pos, "JJ NN");
  assert_eq!(rows[0].occurs, "old man;old men");
  assert_eq!(rows[0].sources, "1:2,3;2:2,3");
}
