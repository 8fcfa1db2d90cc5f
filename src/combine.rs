//! Combination of the frequencies a candidate got from several corpora into
//! new frequency sources, one per heuristic.
//!
//! A backed-off count is stored negated, so that the association measures
//! know which corpus size it should be compared with.
use std::fmt;
use std::str::FromStr;

use crate::base::{Candidate, Meta};
use crate::error::{Error, Result};
use crate::filetype::{InputHandler, ParseInfo};

/// A way of merging the counts of several frequency sources
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Heuristic {
  /// same weight for every source
  Uniform,
  /// weight inversely proportional to the size of the source
  Inverse,
  /// web counts replace the main count when it is too low
  Backoff,
}

impl Heuristic {
  /// Every heuristic, in command-line order
  pub const ALL: [Heuristic; 3] = [Heuristic::Uniform, Heuristic::Inverse, Heuristic::Backoff];

  /// Name of the heuristic, also the name of the frequency source it creates
  pub fn name(self) -> &'static str {
    match self {
      Heuristic::Uniform => "uniform",
      Heuristic::Inverse => "inverse",
      Heuristic::Backoff => "backoff",
    }
  }
}

impl fmt::Display for Heuristic {
  fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result { fmt.write_str(self.name()) }
}

impl FromStr for Heuristic {
  type Err = Error;
  fn from_str(name: &str) -> Result<Heuristic> {
    match name {
      "uniform" => Ok(Heuristic::Uniform),
      "inverse" => Ok(Heuristic::Inverse),
      "backoff" => Ok(Heuristic::Backoff),
      other => Err(Error::Options(format!(
        "combination is not supported: {}\nargument must be list separated by \":\" and containing the names: \
         uniform, inverse, backoff",
        other
      ))),
    }
  }
}

/// Parses a colon-separated list of heuristics, like `uniform:backoff`
pub fn parse_heuristics(names: &str) -> Result<Vec<Heuristic>> { names.split(':').map(str::parse).collect() }

/// Options of `mwe-combine-freqs`
#[derive(Debug, Clone)]
pub struct CombineConfig {
  /// heuristics to compute
  pub heuristics: Vec<Heuristic>,
  /// corpus the candidates were extracted from; the backoff heuristic needs it
  pub main_corpus: Option<String>,
}

impl Default for CombineConfig {
  fn default() -> Self {
    CombineConfig {
      heuristics: Heuristic::ALL.to_vec(),
      main_corpus: None,
    }
  }
}

impl CombineConfig {
  /// Refuses backoff without a main corpus
  pub fn validate(&self) -> Result<()> {
    if self.heuristics.contains(&Heuristic::Backoff) && self.main_corpus.is_none() {
      options_error!("You must define the original frequency source with -o to use backoff");
    }
    Ok(())
  }
}

/// Main counts below this value are replaced by web counts
pub fn backoff_threshold(corpus_size: f64) -> f64 { (corpus_size / 100_000.0).log2() }

/// Whether a frequency source is a web count
pub fn is_web_source(name: &str) -> bool {
  let name = name.to_lowercase();
  name.contains("google") || name.contains("yahoo")
}

fn mean<'a, I: Iterator<Item = &'a f64>>(values: I) -> f64 {
  let (sum, count) = values.fold((0.0, 0u32), |(sum, count), value| (sum + value, count + 1));
  if count == 0 {
    0.0
  } else {
    sum / f64::from(count)
  }
}

/// Combines counts from several sources
pub struct Combiner<'c> {
  config: &'c CombineConfig,
  corpus_sizes: &'c [(String, f64)],
}

impl<'c> Combiner<'c> {
  /// A combiner for sources of the given sizes
  pub fn new(config: &'c CombineConfig, corpus_sizes: &'c [(String, f64)]) -> Self { Combiner { config, corpus_sizes } }

  fn size_of(&self, name: &str) -> Option<f64> {
    self.corpus_sizes.iter().find(|(n, _)| n == name).map(|&(_, size)| size)
  }

  /// The combined count of `freqs` and whether it was backed off
  pub fn combine(&self, heuristic: Heuristic, freqs: &[(String, f64)]) -> (f64, bool) {
    match heuristic {
      Heuristic::Uniform => (mean(freqs.iter().map(|(_, f)| f)), false),
      Heuristic::Inverse => {
        let total: f64 = self.corpus_sizes.iter().map(|(_, size)| size).sum();
        let mut result = 0.0;
        for (name, freq) in freqs {
          match self.size_of(name) {
            Some(size) if total != 0.0 => result += (total - size) / total * freq,
            _ => warn_once!("No corpus size for {}, ignored by the inverse combination", name),
          }
        }
        (result, false)
      },
      Heuristic::Backoff => {
        let main = match self.config.main_corpus {
          Some(ref main) => main,
          None => return (0.0, false),
        };
        let main_freq = freqs.iter().find(|(n, _)| n == main).map(|&(_, f)| f).unwrap_or(0.0);
        let threshold = backoff_threshold(self.size_of(main).unwrap_or(0.0));
        if main_freq < threshold {
          let web = mean(freqs.iter().filter(|(n, _)| is_web_source(n)).map(|(_, f)| f));
          (-web, true)
        } else {
          (main_freq, false)
        }
      },
    }
  }
}

/// Adds one combined frequency per heuristic to candidates and their words
pub struct FreqCombinerHandler {
  config: CombineConfig,
  chain: Box<dyn InputHandler>,
  corpus_sizes: Vec<(String, f64)>,
}

impl FreqCombinerHandler {
  /// Combines as configured, sending the candidates to `chain`
  pub fn new(config: CombineConfig, chain: Box<dyn InputHandler>) -> Result<Self> {
    config.validate()?;
    Ok(FreqCombinerHandler {
      config,
      chain,
      corpus_sizes: Vec::new(),
    })
  }
}

fn as_counts<'a, I: Iterator<Item = (&'a str, &'a i64)>>(freqs: I) -> Vec<(String, f64)> {
  freqs.map(|(name, &value)| (name.to_string(), value as f64)).collect()
}

impl InputHandler for FreqCombinerHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  /// Declares the size of each new source
  fn handle_meta(&mut self, mut meta: Meta, info: &ParseInfo) -> Result<()> {
    self.corpus_sizes = as_counts(meta.corpus_sizes.iter());
    let combiner = Combiner::new(&self.config, &self.corpus_sizes);
    for &heuristic in &self.config.heuristics {
      let combined = match heuristic {
        Heuristic::Backoff => mean(
          self
            .corpus_sizes
            .iter()
            .filter(|(name, _)| is_web_source(name))
            .map(|(_, size)| size),
        ),
        _ => combiner.combine(heuristic, &self.corpus_sizes).0,
      };
      meta.add_corpus_size(heuristic.name(), combined as i64);
    }
    self.chain.handle_meta(meta, info)
  }

  fn handle_candidate(&mut self, mut candidate: Candidate, info: &ParseInfo) -> Result<()> {
    let combiner = Combiner::new(&self.config, &self.corpus_sizes);
    let joint = as_counts(candidate.ngram.freqs.iter());
    let mut backed_off = false;
    for &heuristic in &self.config.heuristics {
      let (combined, backoff) = combiner.combine(heuristic, &joint);
      backed_off |= backoff;
      candidate.ngram.add_frequency(heuristic.name(), combined as i64);
    }
    for word in candidate.ngram.words.iter_mut() {
      let mut counts = as_counts(word.freqs.iter());
      for &heuristic in &self.config.heuristics {
        if heuristic == Heuristic::Backoff && backed_off {
          // a backed-off candidate backs off its words too
          for (name, count) in counts.iter_mut() {
            if Some(&*name) == self.config.main_corpus.as_ref() {
              *count = 0.0;
            }
          }
        }
        let (combined, _) = combiner.combine(heuristic, &counts);
        word.add_frequency(heuristic.name(), combined as i64);
      }
    }
    self.chain.handle_candidate(candidate, info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn counts(pairs: &[(&str, f64)]) -> Vec<(String, f64)> {
    pairs.iter().map(|&(n, f)| (n.to_string(), f)).collect()
  }

  #[test]
  fn uniform_and_inverse() {
    let config = CombineConfig::default();
    let sizes = counts(&[("bnc", 1_000.0), ("google", 3_000.0)]);
    let combiner = Combiner::new(&config, &sizes);
    let freqs = counts(&[("bnc", 2.0), ("google", 10.0)]);
    assert_eq!(combiner.combine(Heuristic::Uniform, &freqs), (6.0, false));
    // weights are 3/4 and 1/4
    assert_eq!(combiner.combine(Heuristic::Inverse, &freqs), (4.0, false));
  }

  #[test]
  fn rare_main_counts_back_off() {
    let config = CombineConfig {
      heuristics: vec![Heuristic::Backoff],
      main_corpus: Some("bnc".to_string()),
    };
    // threshold log2(1.6e6 / 1e5) = 4
    let sizes = counts(&[("bnc", 1_600_000.0), ("google", 1e9), ("yahoo", 1e9)]);
    let combiner = Combiner::new(&config, &sizes);
    let rare = counts(&[("bnc", 3.0), ("google", 100.0), ("yahoo", 300.0)]);
    assert_eq!(combiner.combine(Heuristic::Backoff, &rare), (-200.0, true));
    let common = counts(&[("bnc", 5.0), ("google", 100.0), ("yahoo", 300.0)]);
    assert_eq!(combiner.combine(Heuristic::Backoff, &common), (5.0, false));
  }

  #[test]
  fn backoff_needs_a_main_corpus() {
    let config = CombineConfig {
      heuristics: vec![Heuristic::Backoff],
      main_corpus: None,
    };
    assert!(config.validate().is_err());
  }

  #[test]
  fn web_sources() {
    assert!(is_web_source("Google-2012"));
    assert!(is_web_source("yahoo"));
    assert!(!is_web_source("bnc"));
  }
}
