//! Candidate extraction: every match of every pattern in the corpus becomes an
//! observation of a candidate, and observations with the same base form are merged.
//!
//! The base form drops POS tags when asked to, and keeps either surfaces or
//! lemmas (surfaces where no lemma is known). Candidates are printed once the
//! whole corpus was read, in order of first appearance.
use log::info;
use std::collections::HashSet;

use crate::base::{Candidate, CandidateFactory, FeatureSet, Meta, Ngram, Sentence, WordAttr};
use crate::error::Result;
use crate::filetype::{Category, InputHandler, ParseInfo};
use crate::patterns::{MatchOptions, ParsedPattern};

/// Everything the extraction needs, built once from the command line
#[derive(Debug, Clone)]
pub struct CandidatesConfig {
  /// patterns to match, or a single generic n-gram pattern
  pub patterns: Vec<ParsedPattern>,
  /// match distance, overlap and id order
  pub match_options: MatchOptions,
  /// set POS to the wildcard before comparing candidates
  pub ignore_pos: bool,
  /// compare surfaces instead of lemmas
  pub surface_instead_lemmas: bool,
  /// print the joint frequency of each candidate
  pub print_cand_freq: bool,
  /// print the `sid:w1,w2` sources of each occurrence
  pub print_source: bool,
}

impl CandidatesConfig {
  /// Extraction with `patterns` and default options
  pub fn new(patterns: Vec<ParsedPattern>) -> Self {
    CandidatesConfig {
      patterns,
      match_options: MatchOptions::default(),
      ignore_pos: false,
      surface_instead_lemmas: false,
      print_cand_freq: false,
      print_source: false,
    }
  }
}

/// Generates candidates from the sentences it receives, and sends them down the chain on `finish`
pub struct CandidatesGeneratorHandler {
  config: CandidatesConfig,
  chain: Box<dyn InputHandler>,
  factory: CandidateFactory,
  corpus_name: String,
  corpus_sizes: FeatureSet<i64>,
}

impl CandidatesGeneratorHandler {
  /// Fails on illegal match options
  pub fn new(config: CandidatesConfig, chain: Box<dyn InputHandler>) -> Result<Self> {
    config.match_options.validate()?;
    Ok(CandidatesGeneratorHandler {
      config,
      chain,
      factory: CandidateFactory::new(),
      corpus_name: String::new(),
      corpus_sizes: FeatureSet::frequencies(),
    })
  }

  /// The base form a match is counted under
  fn canonical(&self, ngram: &Ngram) -> Ngram {
    let mut base = Ngram::new(ngram.words.clone());
    if self.config.surface_instead_lemmas {
      base.set_all(WordAttr::Lemma, None);
    } else {
      for word in base.words.iter_mut() {
        if word.lemma.is_some() {
          word.surface = None;
        }
      }
    }
    base
  }

  /// One observation of `ngram` at `indexes` (0-based) of `sentence`
  fn observe(&mut self, sentence: &Sentence, mut ngram: Ngram, indexes: &str) {
    if self.config.ignore_pos {
      ngram.set_all(WordAttr::Pos, None);
    }
    let mut candidate = Candidate::new(0, Vec::new());
    candidate.ngram = self.canonical(&ngram);
    if self.config.print_cand_freq {
      candidate.ngram.add_frequency(&self.corpus_name, 1);
    }
    ngram.add_frequency(&self.corpus_name, 1);
    if self.config.print_source {
      ngram.sources.push(format!("{}:{}", sentence.id_number, indexes));
    }
    candidate.add_occur(ngram);
    self.factory.uniquified(candidate);
  }

  /// The header of the output: one corpus size per corpus read
  fn meta(&self) -> Meta {
    let mut meta = Meta::new();
    for (name, &size) in self.corpus_sizes.iter() {
      meta.add_corpus_size(name, size);
    }
    meta
  }
}

impl InputHandler for CandidatesGeneratorHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  fn before_file(&mut self, info: &ParseInfo) -> Result<()> {
    self.corpus_name = info.corpus_name();
    self.corpus_sizes.add(&self.corpus_name, 0);
    self.chain.before_file(info)
  }

  /// Corpus headers are not carried over to the candidate list
  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.corpus_sizes.add(&self.corpus_name, sentence.len() as i64);
    let mut already_matched: HashSet<String> = HashSet::new();
    for p in 0..self.config.patterns.len() {
      let matches = self.config.patterns[p].matches(&sentence.words, &self.config.match_options)?;
      for found in matches {
        let wordnums: Vec<String> = found.indexes.iter().map(|i| (i + 1).to_string()).collect();
        let wordnums = wordnums.join(",");
        if !already_matched.insert(wordnums.clone()) {
          continue;
        }
        self.observe(&sentence, found.ngram, &wordnums);
      }
    }
    Ok(())
  }

  fn finish(&mut self) -> Result<()> {
    info!("Outputting candidates file...");
    let info = ParseInfo::detached("XML", Category::Candidates);
    let meta = self.meta();
    self.chain.handle_meta(meta, &info)?;
    let factory = std::mem::replace(&mut self.factory, CandidateFactory::new());
    let mut ids = CandidateFactory::new();
    for found in factory.into_candidates() {
      let mut candidate = ids.make(Vec::new(), None);
      candidate.ngram = found.ngram;
      candidate.occurs = found.occurs;
      self.chain.handle_candidate(candidate, &info)?;
    }
    self.chain.finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;
  use crate::filetype::{Entity, EntityCollectorHandler};
  use std::cell::RefCell;
  use std::rc::Rc;

  /// Collects what the generator sends down
  struct Tap(Rc<RefCell<EntityCollectorHandler>>);

  impl InputHandler for Tap {
    fn fallback(&mut self, entity: Entity, info: &ParseInfo) -> Result<()> {
      self.0.borrow_mut().fallback(entity, info)
    }
  }

  fn sentence(id: u64, text: &str) -> Sentence {
    let words = text
      .split_whitespace()
      .map(|token| {
        let parts: Vec<&str> = token.split('/').collect();
        Word::from_attrs(Some(parts[0]), Some(parts[0].to_lowercase().as_str()), parts.get(1).cloned(), None)
      })
      .collect();
    Sentence::new(id, words)
  }

  fn run(config: CandidatesConfig, sentences: Vec<Sentence>) -> Vec<Candidate> {
    let collected = Rc::new(RefCell::new(EntityCollectorHandler::new()));
    let mut handler = CandidatesGeneratorHandler::new(config, Box::new(Tap(collected.clone()))).unwrap();
    let info = ParseInfo::detached("XML", Category::Corpus);
    handler.before_file(&info).unwrap();
    for s in sentences {
      handler.handle_sentence(s, &info).unwrap();
    }
    handler.after_file(&info).unwrap();
    handler.finish().unwrap();
    let collected = collected.borrow();
    let candidates = collected.candidates().into_iter().cloned().collect();
    candidates
  }

  #[test]
  fn adjective_noun_pairs() {
    let pattern = ParsedPattern::from_xml("<pat><w pos=\"JJ\"/><w pos=\"NN\"/></pat>").unwrap();
    let mut config = CandidatesConfig::new(vec![pattern]);
    config.print_source = true;
    let candidates = run(config, vec![sentence(1, "the/DT old/JJ man/NN sat/VBD")]);
    assert_eq!(candidates.len(), 1);
    let lemmas: Vec<&str> = candidates[0].words().iter().filter_map(|w| w.lemma.as_deref()).collect();
    assert_eq!(lemmas, vec!["old", "man"]);
    assert_eq!(candidates[0].words()[0].surface, None);
    assert_eq!(candidates[0].occurs[0].sources, vec!["1:2,3".to_string()]);
  }

  #[test]
  fn repeated_ngrams_are_merged() {
    let mut config = CandidatesConfig::new(vec![ParsedPattern::generic(3, 3)]);
    config.print_cand_freq = true;
    config.print_source = true;
    let candidates = run(
      config,
      vec![sentence(1, "kick the bucket"), sentence(2, "Kick the bucket")],
    );
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].id_number, 1);
    assert_eq!(candidates[0].ngram.get_freq_value("<none>"), 2);
    assert_eq!(candidates[0].occurs.len(), 2);
    let sources: Vec<&String> = candidates[0].occurs.iter().flat_map(|o| o.sources.iter()).collect();
    assert_eq!(sources, vec!["1:1,2,3", "2:1,2,3"]);
  }

  #[test]
  fn agreeing_patterns_count_once() {
    let noun = ParsedPattern::from_xml("<pat><w pos=\"N\"/></pat>").unwrap();
    let mut config = CandidatesConfig::new(vec![noun.clone(), noun]);
    config.print_cand_freq = true;
    let candidates = run(config, vec![sentence(1, "dogs/N bark/V")]);
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].ngram.get_freq_value("<none>"), 1);
  }
}
