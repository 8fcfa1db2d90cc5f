//! Evaluation of the MWE occurrences annotated in a predicted corpus against a
//! reference corpus: precision, recall and F-measure.
use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, AddAssign};
use std::str::FromStr;

use crate::base::Sentence;
use crate::error::{Error, Result};

/// Matches found over match attempts, on one side of a comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneSidedComparison {
  /// successful attempts
  pub matches: u64,
  /// all attempts
  pub attempts: u64,
}

impl OneSidedComparison {
  /// Counts one more attempt
  pub fn record(&mut self, matched: bool) {
    self.attempts += 1;
    if matched {
      self.matches += 1;
    }
  }

  /// `matches / attempts`, NaN when nothing was attempted
  pub fn ratio(&self) -> f64 {
    if self.attempts == 0 {
      std::f64::NAN
    } else {
      self.matches as f64 / self.attempts as f64
    }
  }
}

impl Add for OneSidedComparison {
  type Output = OneSidedComparison;
  fn add(self, other: OneSidedComparison) -> OneSidedComparison {
    OneSidedComparison {
      matches: self.matches + other.matches,
      attempts: self.attempts + other.attempts,
    }
  }
}

/// Both sides of a reference-vs-prediction comparison
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluationResult {
  /// predicted MWEs found in the reference
  pub prediction: OneSidedComparison,
  /// reference MWEs found in the prediction
  pub reference: OneSidedComparison,
}

impl EvaluationResult {
  /// Positive predictive value
  pub fn precision(&self) -> f64 { self.prediction.ratio() }

  /// True positive rate
  pub fn recall(&self) -> f64 { self.reference.ratio() }

  /// Harmonic mean of precision and recall
  pub fn f_measure(&self) -> f64 {
    let (p, r) = (self.precision(), self.recall());
    2.0 * p * r / (p + r)
  }
}

impl AddAssign for EvaluationResult {
  fn add_assign(&mut self, other: EvaluationResult) {
    self.prediction = self.prediction + other.prediction;
    self.reference = self.reference + other.reference;
  }
}

impl fmt::Display for EvaluationResult {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "Precision: {}", self.precision())?;
    writeln!(f, "Recall: {}", self.recall())?;
    writeln!(f, "F-measure: {}", self.f_measure())
  }
}

/// How sentences of the two corpora are paired
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SentenceAligner {
  /// first with first, second with second, and so on
  Naive,
}

impl FromStr for SentenceAligner {
  type Err = Error;
  fn from_str(name: &str) -> Result<SentenceAligner> {
    match name {
      "Naive" => Ok(SentenceAligner::Naive),
      other => Err(Error::Options(format!("Unknown sentence aligner: {}", other))),
    }
  }
}

impl SentenceAligner {
  /// Pairs of `(reference, prediction)` sentences
  pub fn align<'a>(self, reference: &'a [Sentence], prediction: &'a [Sentence]) -> Vec<(&'a Sentence, &'a Sentence)> {
    match self {
      SentenceAligner::Naive => reference.iter().zip(prediction.iter()).collect(),
    }
  }
}

/// How the MWEs of two aligned sentences are compared
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Evaluator {
  /// an MWE matches when the other side has one with the same indexes
  ExactMatch,
  /// every pair of consecutive MWE tokens is compared, after Schneider (2014)
  LinkBased,
}

impl FromStr for Evaluator {
  type Err = Error;
  fn from_str(name: &str) -> Result<Evaluator> {
    match name {
      "ExactMatch" => Ok(Evaluator::ExactMatch),
      "LinkBased" => Ok(Evaluator::LinkBased),
      other => Err(Error::Options(format!("Unknown evaluator: {}", other))),
    }
  }
}

fn links(indexes: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
  indexes.windows(2).map(|pair| (pair[0], pair[1]))
}

impl Evaluator {
  /// Looks up the MWEs of `attempted` in `known`
  fn one_sided(self, known: &Sentence, attempted: &Sentence) -> OneSidedComparison {
    let mut result = OneSidedComparison::default();
    match self {
      Evaluator::ExactMatch => {
        let known: HashSet<&[usize]> = known.mweoccurs.iter().map(|o| o.indexes.as_slice()).collect();
        for occur in &attempted.mweoccurs {
          result.record(known.contains(occur.indexes.as_slice()));
        }
      },
      Evaluator::LinkBased => {
        let known: HashSet<(usize, usize)> = known.mweoccurs.iter().flat_map(|o| links(&o.indexes)).collect();
        for occur in &attempted.mweoccurs {
          for link in links(&occur.indexes) {
            result.record(known.contains(&link));
          }
        }
      },
    }
    result
  }

  /// Compares the MWEs of one pair of aligned sentences
  pub fn compare_sentences(self, reference: &Sentence, prediction: &Sentence) -> EvaluationResult {
    EvaluationResult {
      prediction: self.one_sided(reference, prediction),
      reference: self.one_sided(prediction, reference),
    }
  }
}

/// Options of `mwe-measure`
#[derive(Debug, Clone, Copy)]
pub struct EvaluationConfig {
  /// sentence pairing
  pub aligner: SentenceAligner,
  /// MWE comparison
  pub evaluator: Evaluator,
}

impl Default for EvaluationConfig {
  fn default() -> Self {
    EvaluationConfig {
      aligner: SentenceAligner::Naive,
      evaluator: Evaluator::ExactMatch,
    }
  }
}

/// Compares two corpora sentence by sentence
pub fn compare_sentence_lists(config: &EvaluationConfig, reference: &[Sentence], prediction: &[Sentence]) -> EvaluationResult {
  let mut result = EvaluationResult::default();
  for (s_ref, s_pred) in config.aligner.align(reference, prediction) {
    result += config.evaluator.compare_sentences(s_ref, s_pred);
  }
  result
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;

  fn annotated(spans: &[&[usize]]) -> Sentence {
    let words = (0..6).map(|i| Word::from_attrs(Some(i.to_string().as_str()), None, None, None)).collect();
    let mut sentence = Sentence::new(1, words);
    for (n, span) in spans.iter().enumerate() {
      sentence.annotate_span(n as u64 + 1, span.to_vec()).unwrap();
    }
    sentence
  }

  #[test]
  fn exact_match() {
    let reference = vec![annotated(&[&[0, 1], &[3, 4, 5]])];
    let prediction = vec![annotated(&[&[0, 1], &[3, 4]])];
    let result = compare_sentence_lists(&EvaluationConfig::default(), &reference, &prediction);
    assert_eq!(result.precision(), 0.5);
    assert_eq!(result.recall(), 0.5);
    assert_eq!(result.f_measure(), 0.5);
  }

  #[test]
  fn link_based() {
    let config = EvaluationConfig {
      evaluator: Evaluator::LinkBased,
      ..EvaluationConfig::default()
    };
    let reference = vec![annotated(&[&[3, 4, 5]])];
    let prediction = vec![annotated(&[&[3, 4]])];
    let result = compare_sentence_lists(&config, &reference, &prediction);
    assert_eq!(result.precision(), 1.0);
    assert_eq!(result.recall(), 0.5);
  }

  #[test]
  fn one_sided_counts() {
    let reference = annotated(&[&[0, 1], &[3, 4, 5]]);
    let prediction = annotated(&[&[0, 1], &[2, 3]]);
    let exact = Evaluator::ExactMatch.compare_sentences(&reference, &prediction);
    assert_eq!(exact.prediction, OneSidedComparison { matches: 1, attempts: 2 });
    assert_eq!(exact.reference, OneSidedComparison { matches: 1, attempts: 2 });
    let links = Evaluator::LinkBased.compare_sentences(&reference, &prediction);
    // links (0,1) (2,3) against (0,1) (3,4) (4,5)
    assert_eq!(links.prediction, OneSidedComparison { matches: 1, attempts: 2 });
    assert_eq!(links.reference, OneSidedComparison { matches: 1, attempts: 3 });

    let mut counts = OneSidedComparison::default();
    counts.record(true);
    counts.record(false);
    assert_eq!(counts + counts, OneSidedComparison { matches: 2, attempts: 4 });
  }

  #[test]
  fn nothing_predicted_is_nan() {
    let reference = vec![annotated(&[&[0, 1]])];
    let prediction = vec![annotated(&[])];
    let result = compare_sentence_lists(&EvaluationConfig::default(), &reference, &prediction);
    assert!(result.precision().is_nan());
    assert_eq!(result.recall(), 0.0);
    assert!(result.f_measure().is_nan());
    assert!(result.to_string().starts_with("Precision: NaN\nRecall: 0\n"));
  }
}
