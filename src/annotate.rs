//! Annotation of a corpus with the occurrences of a list of MWE candidates
use log::info;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::base::{Candidate, MWEOccurrence, Sentence, Word};
use crate::error::{Error, Result};
use crate::filetype::{self, EntityCollectorHandler, InputHandler, ParseInfo, ParseOptions};

/// How occurrences of candidates are found in sentences
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DetectorKind {
  /// contiguous lemmas (surfaces when there is no lemma), with optional gaps
  ContiguousLemma,
  /// the `sid:i,j` sources recorded by the candidate extraction
  Source,
}

impl fmt::Display for DetectorKind {
  fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
    match self {
      DetectorKind::ContiguousLemma => fmt.write_str("ContiguousLemma"),
      DetectorKind::Source => fmt.write_str("Source"),
    }
  }
}

impl FromStr for DetectorKind {
  type Err = Error;
  fn from_str(name: &str) -> Result<DetectorKind> {
    match name {
      "ContiguousLemma" => Ok(DetectorKind::ContiguousLemma),
      "Source" => Ok(DetectorKind::Source),
      other => Err(Error::Options(format!("Unknown detector name: {}", other))),
    }
  }
}

/// Options of `mwe-annotate`
#[derive(Debug, Clone)]
pub struct AnnotateConfig {
  /// detection method
  pub detector: DetectorKind,
  /// gaps allowed inside a contiguous occurrence
  pub gaps: Option<usize>,
  /// add the occurrences found to the sentences
  pub annotate: bool,
  /// drop the sentences without occurrences
  pub filter: bool,
}

impl Default for AnnotateConfig {
  fn default() -> Self {
    AnnotateConfig {
      detector: DetectorKind::ContiguousLemma,
      gaps: None,
      annotate: true,
      filter: false,
    }
  }
}

impl AnnotateConfig {
  /// Gaps make no sense with recorded sources
  pub fn validate(&self) -> Result<()> {
    if self.detector == DetectorKind::Source && self.gaps.is_some() {
      options_error!("Bad arguments: method \"Source\" with \"--gaps\"");
    }
    Ok(())
  }
}

/// Reads the candidate list of the annotation
pub fn load_candidates(paths: &[String], filetype: Option<&str>) -> Result<Vec<Candidate>> {
  info!("Reading MWE list from candidates file");
  let mut collector = EntityCollectorHandler::new();
  filetype::parse(paths, &mut collector, &ParseOptions::with_filetype(filetype))?;
  info!("MWE list loaded in memory successfully");
  Ok(collector.into_candidates())
}

/// Finds candidate occurrences in a sentence
pub trait Detector {
  /// The occurrences in `sentence`, in the order they start
  fn detect(&self, sentence: &Sentence) -> Result<Vec<MWEOccurrence>>;
}

/// Builds the detector of `config` over `candidates`
pub fn make_detector(config: &AnnotateConfig, candidates: Vec<Candidate>) -> Result<Box<dyn Detector>> {
  config.validate()?;
  let candidates: Vec<Rc<Candidate>> = candidates.into_iter().map(Rc::new).collect();
  let detector: Box<dyn Detector> = match config.detector {
    DetectorKind::ContiguousLemma => Box::new(ContiguousLemmaDetector::new(candidates, config.gaps.unwrap_or(0))),
    DetectorKind::Source => Box::new(SourceDetector::new(candidates)?),
  };
  Ok(detector)
}

/// Uses the sources of the candidate occurrences, which name sentences and word positions
pub struct SourceDetector {
  by_sentence: HashMap<String, Vec<(Rc<Candidate>, Vec<usize>)>>,
}

impl SourceDetector {
  /// Indexes the sources of every occurrence of `candidates`
  pub fn new(candidates: Vec<Rc<Candidate>>) -> Result<Self> {
    let mut by_sentence: HashMap<String, Vec<(Rc<Candidate>, Vec<usize>)>> = HashMap::new();
    for candidate in candidates {
      for source in candidate.occurs.iter().flat_map(|ngram| ngram.sources.iter()) {
        let (sentence_id, indexes) = parse_source(source)
          .ok_or_else(|| Error::Other(format!("Bad source for cand {}: {}", candidate.id_number, source)))?;
        if indexes.len() != candidate.len() {
          return Err(Error::Other(format!(
            "Bad value of indexes for cand {}: {:?}",
            candidate.id_number, indexes
          )));
        }
        by_sentence
          .entry(sentence_id)
          .or_insert_with(Vec::new)
          .push((candidate.clone(), indexes));
      }
    }
    Ok(SourceDetector { by_sentence })
  }
}

/// Splits `sid:w1,w2` into the sentence id and 0-based word indexes
fn parse_source(source: &str) -> Option<(String, Vec<usize>)> {
  let colon = source.find(':')?;
  let mut indexes = Vec::new();
  for wordnum in source[colon + 1..].split(',') {
    let wordnum: usize = wordnum.trim().parse().ok()?;
    indexes.push(wordnum.checked_sub(1)?);
  }
  Some((source[..colon].to_string(), indexes))
}

impl Detector for SourceDetector {
  fn detect(&self, sentence: &Sentence) -> Result<Vec<MWEOccurrence>> {
    match self.by_sentence.get(&sentence.id_number.to_string()) {
      Some(found) => found
        .iter()
        .map(|(candidate, indexes)| MWEOccurrence::new(sentence, candidate.clone(), indexes.clone()))
        .collect(),
      None => Ok(Vec::new()),
    }
  }
}

/// Finds candidates whose lemmas appear in sequence in the sentence.
///
/// Candidates are indexed by their first lemma, so each position of a sentence
/// is only tried against the candidates that can start there.
pub struct ContiguousLemmaDetector {
  by_first_lemma: HashMap<String, Vec<Rc<Candidate>>>,
  gaps: usize,
}

fn match_key(word: &Word) -> Option<&str> { word.lemma_or_surface() }

impl ContiguousLemmaDetector {
  /// Indexes `candidates`, allowing `gaps` skipped words inside each occurrence
  pub fn new(candidates: Vec<Rc<Candidate>>, gaps: usize) -> Self {
    let mut by_first_lemma: HashMap<String, Vec<Rc<Candidate>>> = HashMap::new();
    for candidate in candidates {
      let first = candidate.words().first().and_then(match_key).map(str::to_string);
      if let Some(first) = first {
        by_first_lemma.entry(first).or_insert_with(Vec::new).push(candidate);
      }
    }
    ContiguousLemmaDetector { by_first_lemma, gaps }
  }
}

/// A partial occurrence, filled slot by slot
struct OccurrenceBuilder {
  candidate: Rc<Candidate>,
  indexes: Vec<usize>,
  gaps: usize,
}

enum Fill {
  Filled,
  Gap,
  Failed,
}

impl OccurrenceBuilder {
  fn is_full(&self) -> bool { self.indexes.len() == self.candidate.len() }

  /// Puts the word at `index` in the next slot, or skips it as a gap
  fn fill_next_slot(&mut self, sentence: &Sentence, index: usize) -> Fill {
    if self.is_full() {
      return Fill::Failed;
    }
    let slot = self.indexes.len();
    let wanted = self.candidate.words().get(slot).and_then(match_key);
    if wanted.is_some() && sentence.words.get(index).and_then(match_key) == wanted {
      self.indexes.push(index);
      Fill::Filled
    } else if self.gaps > 0 && slot != 0 {
      self.gaps -= 1;
      Fill::Gap
    } else {
      Fill::Failed
    }
  }
}

impl Detector for ContiguousLemmaDetector {
  fn detect(&self, sentence: &Sentence) -> Result<Vec<MWEOccurrence>> {
    // every builder ever created, so that occurrences come out in the order they start
    let mut all: Vec<OccurrenceBuilder> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    for (i, word) in sentence.words.iter().enumerate() {
      current.retain(|&b| match all[b].fill_next_slot(sentence, i) {
        Fill::Failed => false,
        Fill::Filled | Fill::Gap => true,
      });
      let starting = match match_key(word).and_then(|key| self.by_first_lemma.get(key)) {
        Some(starting) => starting,
        None => continue,
      };
      for candidate in starting {
        let mut builder = OccurrenceBuilder {
          candidate: candidate.clone(),
          indexes: Vec::new(),
          gaps: self.gaps,
        };
        if let Fill::Filled = builder.fill_next_slot(sentence, i) {
          current.push(all.len());
          all.push(builder);
        }
      }
    }
    all
      .into_iter()
      .filter(OccurrenceBuilder::is_full)
      .map(|b| MWEOccurrence::new(sentence, b.candidate, b.indexes))
      .collect()
  }
}

/// Annotates (or filters) the sentences going through
pub struct AnnotatorHandler {
  config: AnnotateConfig,
  detector: Box<dyn Detector>,
  chain: Box<dyn InputHandler>,
}

impl AnnotatorHandler {
  /// Detects with `detector`, sending the sentences to `chain`
  pub fn new(config: AnnotateConfig, detector: Box<dyn Detector>, chain: Box<dyn InputHandler>) -> Self {
    AnnotatorHandler {
      config,
      detector,
      chain,
    }
  }
}

impl InputHandler for AnnotatorHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  fn before_file(&mut self, info: &ParseInfo) -> Result<()> {
    self.chain.before_file(info)?;
    info!("Annotating corpus with MWEs found in list");
    Ok(())
  }

  fn handle_sentence(&mut self, mut sentence: Sentence, info: &ParseInfo) -> Result<()> {
    let found = self.detector.detect(&sentence)?;
    let matched = !found.is_empty();
    if self.config.annotate {
      sentence.mweoccurs.extend(found);
    }
    if matched || !self.config.filter {
      self.chain.handle_sentence(sentence, info)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn words(lemmas: &str) -> Vec<Word> {
    lemmas
      .split_whitespace()
      .map(|l| Word::from_attrs(None, Some(l), None, None))
      .collect()
  }

  fn indexes(found: &[MWEOccurrence]) -> Vec<Vec<usize>> { found.iter().map(|o| o.indexes.clone()).collect() }

  #[test]
  fn contiguous_lemmas() {
    let candidate = Rc::new(Candidate::new(1, words("kick the bucket")));
    let detector = ContiguousLemmaDetector::new(vec![candidate], 0);
    let sentence = Sentence::new(1, words("he kick the bucket and kick a bucket"));
    let found = detector.detect(&sentence).unwrap();
    assert_eq!(indexes(&found), vec![vec![1, 2, 3]]);
  }

  #[test]
  fn gaps_are_skipped_inside_occurrences() {
    let candidate = Rc::new(Candidate::new(1, words("kick bucket")));
    let sentence = Sentence::new(1, words("kick the old bucket"));
    let strict = ContiguousLemmaDetector::new(vec![candidate.clone()], 0);
    assert!(strict.detect(&sentence).unwrap().is_empty());
    let loose = ContiguousLemmaDetector::new(vec![candidate], 2);
    assert_eq!(indexes(&loose.detect(&sentence).unwrap()), vec![vec![0, 3]]);
  }

  #[test]
  fn sources_name_sentences() {
    let mut candidate = Candidate::new(7, words("take off"));
    let mut occur = candidate.ngram.clone();
    occur.sources = vec!["2:1,3".to_string()];
    candidate.add_occur(occur);
    let detector = SourceDetector::new(vec![Rc::new(candidate)]).unwrap();
    assert!(detector.detect(&Sentence::new(1, words("a b c"))).unwrap().is_empty());
    let found = detector.detect(&Sentence::new(2, words("take it off"))).unwrap();
    assert_eq!(indexes(&found), vec![vec![0, 2]]);
    assert!(detector.detect(&Sentence::new(2, words("take"))).is_err());
  }

  #[test]
  fn sources_must_cover_every_word() {
    let mut candidate = Candidate::new(7, words("take off"));
    let mut occur = candidate.ngram.clone();
    occur.sources = vec!["2:1".to_string()];
    candidate.add_occur(occur);
    assert!(SourceDetector::new(vec![Rc::new(candidate)]).is_err());
  }

  #[test]
  fn gaps_are_refused_with_sources() {
    let config = AnnotateConfig {
      detector: DetectorKind::Source,
      gaps: Some(1),
      ..AnnotateConfig::default()
    };
    assert!(config.validate().is_err());
    assert!("Nonsense".parse::<DetectorKind>().is_err());
  }
}
