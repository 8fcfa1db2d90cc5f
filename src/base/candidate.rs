//! MWE candidates and the factory that deduplicates them
use std::collections::HashMap;

use super::feature::{FeatValue, FeatureSet};
use super::ngram::Ngram;
use super::word::Word;

/// A distinct word sequence extracted as a potential MWE.
///
/// `ngram` is the base form; `occurs` are its distinct surface realizations.
#[derive(Debug, Clone)]
pub struct Candidate {
  /// unique id, starting at 1
  pub id_number: u64,
  /// base form, with frequencies and sources
  pub ngram: Ngram,
  /// features such as association measures, merged with max
  pub features: FeatureSet<FeatValue>,
  /// true-positive judgements
  pub tpclasses: FeatureSet<String>,
  /// distinct surface realizations
  pub occurs: Vec<Ngram>,
  /// bigrams the candidate is made of
  pub bigrams: Vec<Ngram>,
  /// variations
  pub vars: Vec<Ngram>,
}

impl Candidate {
  /// A candidate without features nor occurrences
  pub fn new(id_number: u64, words: Vec<Word>) -> Self {
    Candidate {
      id_number,
      ngram: Ngram::new(words),
      features: FeatureSet::features(),
      tpclasses: FeatureSet::tpclasses(),
      occurs: Vec::new(),
      bigrams: Vec::new(),
      vars: Vec::new(),
    }
  }

  /// Number of words of the base form
  pub fn len(&self) -> usize { self.ngram.len() }

  /// Whether the base form has no words
  pub fn is_empty(&self) -> bool { self.ngram.is_empty() }

  /// Words of the base form
  pub fn words(&self) -> &[Word] { &self.ngram.words }

  /// Adds a feature, keeping the maximum on collision
  pub fn add_feat<V: Into<FeatValue>>(&mut self, name: &str, value: V) {
    self.features.add(name, value.into());
  }

  /// Adds a surface realization, merging it with an identical one
  pub fn add_occur(&mut self, occur: Ngram) {
    match self.occurs.iter_mut().find(|o| o.to_key() == occur.to_key()) {
      Some(existing) => existing.merge_from(&occur),
      None => self.occurs.push(occur),
    }
  }

  /// Merges counts, sources, occurrences, features and classes of `other`
  pub fn merge_from(&mut self, other: &Candidate) {
    self.ngram.merge_from(&other.ngram);
    for occur in &other.occurs {
      self.add_occur(occur.clone());
    }
    self.features.merge_from(&other.features);
    self.tpclasses.merge_from(&other.tpclasses);
  }

  /// The candidate in PlainCandidates form: lemmas joined by `_`
  pub fn to_plaincandidate(&self) -> String { self.ngram.to_plain() }

  /// The `<cand>` element
  pub fn to_xml(&self) -> String {
    let mut output = format!("<cand candid=\"{}\">", self.id_number);
    output.push_str("\n    <ngram>");
    self.ngram.to_xml_into(&mut output);
    output.push_str("</ngram>\n");
    if !self.bigrams.is_empty() {
      output.push_str("    <bigram>\n");
      for bigram in &self.bigrams {
        output.push_str("       ");
        output.push_str(&bigram.to_xml());
        output.push('\n');
      }
      output.push_str("    </bigram>\n");
    }
    if !self.occurs.is_empty() {
      output.push_str("    <occurs>\n");
      for occur in &self.occurs {
        output.push_str("    ");
        output.push_str(&occur.to_xml());
        output.push('\n');
      }
      output.push_str("    </occurs>\n");
    }
    if !self.vars.is_empty() {
      output.push_str("    <vars>\n");
      for var in &self.vars {
        output.push_str("        ");
        output.push_str(&var.to_xml());
        output.push('\n');
      }
      output.push_str("    </vars>\n");
    }
    if !self.features.is_empty() {
      output.push_str("    <features>\n");
      self.features.to_xml_into(&mut output, 8, "\n");
      output.push_str("    </features>\n");
    }
    self.tpclasses.to_xml_into(&mut output, 4, "\n");
    output.push_str("</cand>");
    output
  }
}

/// Creates candidates with increasing ids, and deduplicates them by word sequence.
///
/// Deduplicated candidates live in an arena; `make_uniq` returns the arena index
/// of the instance that now holds the merged data.
#[derive(Debug, Default)]
pub struct CandidateFactory {
  prev_id: u64,
  arena: Vec<Candidate>,
  mapping: HashMap<String, usize>,
}

impl CandidateFactory {
  /// A factory whose first candidate gets id 1
  pub fn new() -> Self { CandidateFactory::default() }

  /// Creates a candidate with the next id, or with `id_number`,
  /// which then becomes the base for the following ones
  pub fn make(&mut self, words: Vec<Word>, id_number: Option<u64>) -> Candidate {
    self.prev_id = match id_number {
      Some(id) => id,
      None => self.prev_id + 1,
    };
    Candidate::new(self.prev_id, words)
  }

  /// Creates a candidate and deduplicates it right away
  pub fn make_uniq(&mut self, words: Vec<Word>, id_number: Option<u64>) -> usize {
    let candidate = self.make(words, id_number);
    self.uniquified(candidate)
  }

  /// Stores `candidate`, or merges it into the instance with the same words
  pub fn uniquified(&mut self, candidate: Candidate) -> usize {
    let key = candidate.ngram.to_key();
    match self.mapping.get(&key) {
      Some(&i) => {
        self.arena[i].merge_from(&candidate);
        i
      },
      None => {
        self.mapping.insert(key, self.arena.len());
        self.arena.push(candidate);
        self.arena.len() - 1
      },
    }
  }

  /// A deduplicated candidate
  pub fn get(&self, index: usize) -> Option<&Candidate> { self.arena.get(index) }

  /// A deduplicated candidate, for in-place updates
  pub fn get_mut(&mut self, index: usize) -> Option<&mut Candidate> { self.arena.get_mut(index) }

  /// Number of distinct candidates
  pub fn len(&self) -> usize { self.arena.len() }

  /// Whether nothing was stored yet
  pub fn is_empty(&self) -> bool { self.arena.is_empty() }

  /// Deduplicated candidates, in insertion order
  pub fn candidates(&self) -> &[Candidate] { &self.arena }

  /// Hands out the deduplicated candidates, in insertion order
  pub fn into_candidates(self) -> Vec<Candidate> { self.arena }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn words(lemmas: &[&str]) -> Vec<Word> {
    lemmas.iter().map(|l| Word::from_attrs(None, Some(*l), None, None)).collect()
  }

  #[test]
  fn ids_increase_and_reset() {
    let mut factory = CandidateFactory::new();
    assert_eq!(factory.make(words(&["a"]), None).id_number, 1);
    assert_eq!(factory.make(words(&["b"]), None).id_number, 2);
    assert_eq!(factory.make(words(&["c"]), Some(10)).id_number, 10);
    assert_eq!(factory.make(words(&["d"]), None).id_number, 11);
  }

  #[test]
  fn duplicates_are_merged() {
    let mut factory = CandidateFactory::new();
    let mut first = factory.make(words(&["kick", "bucket"]), None);
    first.ngram.add_frequency("c", 1);
    let mut second = factory.make(words(&["kick", "bucket"]), None);
    second.ngram.add_frequency("c", 1);
    let a = factory.uniquified(first);
    let b = factory.uniquified(second);
    assert_eq!(a, b);
    assert_eq!(factory.len(), 1);
    let merged = factory.get(a).unwrap();
    assert_eq!(merged.id_number, 1);
    assert_eq!(merged.ngram.get_freq_value("c"), 2);
  }

  #[test]
  fn xml_layout() {
    let mut cand = Candidate::new(3, words(&["a", "b"]));
    cand.add_feat("pmi", 1.5);
    cand.tpclasses.add("gold", "True".to_string());
    assert_eq!(
      cand.to_xml(),
      "<cand candid=\"3\">\n    <ngram><w lemma=\"a\" /> <w lemma=\"b\" /> </ngram>\n    <features>\n        \
       <feat name=\"pmi\" value=\"1.5\" />\n    </features>\n    <tpclass name=\"gold\" value=\"True\" />\n</cand>"
    );
  }
}
