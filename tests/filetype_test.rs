//! Tests for the filetype registry, detection and the parse/print round trips

extern crate mwetoolkit;

use mwetoolkit::base::{Candidate, Meta, Sentence};
use mwetoolkit::filetype::common::{escape, unescape};
use mwetoolkit::filetype::{self, detect, EntityCollectorHandler, InputFile, InputHandler, LazyPrinter, ParseInfo, ParseOptions, SharedBuffer};
use mwetoolkit::transform::{TransformConfig, TransformHandler};
use mwetoolkit::util::first_time;
use mwetoolkit::util::test::{resource, resources_with_suffix};
use mwetoolkit::{Error, Result};

/// Writes down the events it receives, in order
#[derive(Default)]
struct EventLog {
  events: Vec<String>,
}

impl InputHandler for EventLog {
  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> {
    self.events.push("before_file".to_string());
    Ok(())
  }

  fn after_file(&mut self, _info: &ParseInfo) -> Result<()> {
    self.events.push("after_file".to_string());
    Ok(())
  }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> {
    self.events.push("meta".to_string());
    Ok(())
  }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.events.push(format!("sentence {}", sentence.len()));
    Ok(())
  }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    self.events.push(format!("candidate {}", candidate.id_number));
    Ok(())
  }
}

fn print_as(paths: &[String], to: Option<&str>) -> String {
  let buffer = SharedBuffer::new();
  let mut printer = LazyPrinter::new(to).with_output(buffer.boxed());
  filetype::parse(paths, &mut printer, &ParseOptions::default()).unwrap();
  buffer.contents()
}

#[test]
fn test_fixture_detection() {
  let expected = [
    ("cat.conll", "CONLL"),
    ("oldman.xml", "XML"),
    ("adjnoun.patterns.xml", "XML"),
    ("bucket.moses", "Moses"),
    ("plain.txt", "PlainCorpus"),
  ];
  for (name, ext) in expected.iter() {
    let input = InputFile::open(&resource(name)).unwrap();
    assert_eq!(detect(&input, None).unwrap().ext, *ext, "{}", name);
  }
}

#[test]
fn test_xml_fixtures_parse() {
  let paths = resources_with_suffix(".xml");
  assert_eq!(paths.len(), 4);
  for path in paths {
    let mut collector = EntityCollectorHandler::new();
    filetype::parse(&[path.clone()], &mut collector, &ParseOptions::default())
      .unwrap_or_else(|err| panic!("{}: {}", path, err));
  }
}

#[test]
fn test_conll_round_trip() {
  let printed = print_as(&[resource("cat.conll")], None);
  let lines: Vec<&str> = printed.lines().filter(|l| !l.starts_with('#') && !l.is_empty()).collect();
  assert_eq!(
    lines,
    vec![
      "1\tthe\tthe\tDT\tDT\t_\t2\tdet\t_\t_",
      "2\tcat\tcat\tNN\tNN\t_\t0\troot\t_\t_",
    ]
  );
}

#[test]
fn test_printers_announce_their_filetype() {
  let printed = print_as(&[resource("plain.txt")], Some("Moses"));
  assert!(printed.starts_with("# MWETOOLKIT: filetype=\"Moses\"\n"));
  assert!(printed.contains("The|||"));
}

#[test]
fn test_escaping_round_trips() {
  let pairs: &[(&str, &str)] = &[("$", "${dollar}"), ("|", "${pipe}"), (" ", "${space}")];
  for text in &["a|b", "$ $", "${pipe}", "plain"] {
    assert_eq!(unescape(pairs, &escape(pairs, text)), *text);
  }
  assert_eq!(escape(pairs, "a b|$"), "a${space}b${pipe}${dollar}");
}

#[test]
fn test_every_file_is_bracketed() {
  let mut log = EventLog::default();
  let paths = vec![resource("cat.conll"), resource("bucket.moses")];
  filetype::parse(&paths, &mut log, &ParseOptions::default()).unwrap();
  assert_eq!(
    log.events,
    vec![
      "before_file",
      "meta",
      "sentence 2",
      "after_file",
      "before_file",
      "sentence 5",
      "sentence 6",
      "after_file",
    ]
  );
}

#[test]
fn test_meta_comes_first() {
  let mut log = EventLog::default();
  filetype::parse(&[resource("freqs.candidates.xml")], &mut log, &ParseOptions::default()).unwrap();
  assert_eq!(log.events, vec!["before_file", "meta", "candidate 1", "after_file"]);
}

#[test]
fn test_unknown_forced_filetype() {
  let mut log = EventLog::default();
  let options = ParseOptions::with_filetype(Some("DOCX"));
  assert!(filetype::parse(&[resource("plain.txt")], &mut log, &options).is_err());
  assert!(log.events.is_empty());
}

#[test]
fn test_transform_to_xml_lowercases() {
  let buffer = SharedBuffer::new();
  let printer = LazyPrinter::new(Some("XML")).with_output(buffer.boxed());
  let mut handler = TransformHandler::new(TransformConfig { lowercase: true }, Box::new(printer));
  filetype::parse(&[resource("bucket.moses")], &mut handler, &ParseOptions::default()).unwrap();
  let printed = buffer.contents();
  assert!(printed.starts_with("<?xml"));
  assert!(printed.trim_end().ends_with("</corpus>"));

  let input = InputFile::from_bytes("lowered.xml", printed.as_bytes()).unwrap();
  let mut collector = EntityCollectorHandler::new();
  filetype::parse_inputs(vec![input], &mut collector, &ParseOptions::default()).unwrap();
  let sentences = collector.into_sentences();
  assert_eq!(sentences.len(), 2);
  assert_eq!(sentences[0].words[0].surface.as_deref(), Some("he"));
  assert_eq!(sentences[1].words[0].surface.as_deref(), Some("they"));
  assert_eq!(sentences[1].words[2].pos.as_deref(), Some("VB"));
}

#[test]
fn test_reserved_characters_are_refused() {
  let inputs = [
    ("CONLL", "1\tca\u{1c}t\tcat\tNN\tNN\t_\t0\troot\t_\t_\n"),
    ("Moses", "the|the|DT|det ca\u{1e}t|cat|NN|root\n"),
    ("PlainCorpus", "the ca\u{1d}t\n"),
    ("TaggedPlainCorpus", "the ca\u{1c}t\n"),
    ("TreeTagger", "ca\u{1c}t\tNN\tcat\n"),
    ("PlainCandidates", "strong_te\u{1d}a\n"),
  ];
  for (ext, text) in inputs.iter() {
    let input = InputFile::from_bytes("reserved", text.as_bytes()).unwrap();
    let mut collector = EntityCollectorHandler::new();
    let outcome = filetype::parse_inputs(vec![input], &mut collector, &ParseOptions::with_filetype(Some(*ext)));
    match outcome {
      Err(Error::FilesFailed(1)) => {},
      other => panic!("{} accepted a reserved character: {:?}", ext, other),
    }
    assert!(collector.sentences().iter().all(|s| s.words.is_empty()), "{}", ext);
    assert!(collector.candidates().is_empty(), "{}", ext);
  }
}

#[test]
fn test_invalid_utf8_is_replaced_with_a_warning() {
  let input = InputFile::from_bytes("latin1.txt", b"caf\xe9 au lait\n").unwrap();
  let mut collector = EntityCollectorHandler::new();
  filetype::parse_inputs(vec![input], &mut collector, &ParseOptions::with_filetype(Some("PlainCorpus"))).unwrap();
  let sentences = collector.into_sentences();
  assert_eq!(sentences[0].words[0].surface.as_deref(), Some("caf\u{fffd}"));
  assert_eq!(sentences[0].words[2].surface.as_deref(), Some("lait"));
  // already reported once
  assert!(!first_time("Invalid UTF-8 replaced in latin1.txt (line 1)"));
}
