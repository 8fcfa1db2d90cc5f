//! Association measures between the words of a candidate, computed from its
//! joint frequency, the frequencies of its words and the size of each corpus.
//!
//! For every corpus size declared in the `Meta` header, each candidate gains
//! one feature `<measure>_<corpus>` per requested measure.
use log::warn;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::base::{Candidate, FeatValue, Meta};
use crate::error::{Error, Result};
use crate::filetype::{Directive, Entity, InputHandler, ParseInfo};

/// Name of the frequency source produced by the backoff combination
pub const BACKOFF_CORPUS: &str = "backoff";

/// An association measure
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Measure {
  /// Maximum likelihood estimator
  Mle,
  /// Pointwise mutual information
  Pmi,
  /// Student's t test score
  T,
  /// Dice's coefficient
  Dice,
  /// Log-likelihood, bigrams only
  Ll,
}

impl Measure {
  /// Every measure, in the order they are computed
  pub const ALL: [Measure; 5] = [Measure::Mle, Measure::Pmi, Measure::T, Measure::Dice, Measure::Ll];

  /// Name used in feature names and on the command line
  pub fn name(self) -> &'static str {
    use Measure::*;
    match self {
      Mle => "mle",
      Pmi => "pmi",
      T => "t",
      Dice => "dice",
      Ll => "ll",
    }
  }
}

impl fmt::Display for Measure {
  fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result { fmt.write_str(self.name()) }
}

impl FromStr for Measure {
  type Err = Error;
  fn from_str(name: &str) -> Result<Measure> {
    use Measure::*;
    match name {
      "mle" => Ok(Mle),
      "pmi" => Ok(Pmi),
      "t" => Ok(T),
      "dice" => Ok(Dice),
      "ll" => Ok(Ll),
      other => Err(Error::Options(format!(
        "measure is not supported: {}\nargument must be list separated by \":\" and containing the names: \
         mle, t, pmi, dice, ll",
        other
      ))),
    }
  }
}

/// Parses a colon-separated list of measure names, like `pmi:t:ll`
pub fn parse_measures(names: &str) -> Result<Vec<Measure>> { names.split(':').map(str::parse).collect() }

/// Options of `mwe-feat-association`
#[derive(Debug, Clone)]
pub struct AssociationConfig {
  /// measures to compute
  pub measures: Vec<Measure>,
  /// corpus the candidates were extracted from, needed to resolve the size of `backoff`
  pub main_corpus: Option<String>,
  /// MLE is the raw joint frequency instead of a relative one
  pub unnorm_mle: bool,
}

impl Default for AssociationConfig {
  fn default() -> Self {
    AssociationConfig {
      measures: Measure::ALL.to_vec(),
      main_corpus: None,
      unnorm_mle: false,
    }
  }
}

impl AssociationConfig {
  fn wants(&self, measure: Measure) -> bool { self.measures.contains(&measure) }
}

/// Expected joint count of words with counts `marginals` under independence,
/// scaled to the number of n-grams of a corpus of `corpus_size` tokens
pub fn expect(marginals: &[f64], corpus_size: f64) -> f64 {
  let product: f64 = marginals.iter().map(|m| m / corpus_size).product();
  product * (corpus_size - marginals.len() as f64 + 1.0)
}

/// Observed and expected 2x2 contingency tables of a bigram.
/// Cell `[0][1]` counts `w1` followed by anything but `w2`, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct ContingencyTable {
  /// observed counts
  pub observed: [[f64; 2]; 2],
  /// counts expected under independence
  pub expected: [[f64; 2]; 2],
}

/// Builds the contingency tables of the bigram `w1 w2`.
///
/// A bigram can not occur more often than its words: marginals lower than
/// `joint` are raised to it, with a warning.
pub fn contingency_table(joint: f64, marginals: &mut [f64; 2], corpus_size: f64, corpus_name: &str) -> ContingencyTable {
  if joint > marginals[0] || joint > marginals[1] {
    warn!("{} unigrams must occur at least as much as bigram.", corpus_name);
  }
  for marginal in marginals.iter_mut() {
    if joint > *marginal {
      warn!("Automatic correction: {} -> {}", marginal, joint);
      *marginal = joint;
    }
  }
  let [c1, c2] = *marginals;
  let ngrams = corpus_size - 1.0;
  ContingencyTable {
    observed: [[joint, c1 - joint], [c2 - joint, ngrams - c1 - c2 + joint]],
    expected: [
      [expect(&[c1, c2], corpus_size), expect(&[c1, ngrams - c2], corpus_size)],
      [expect(&[ngrams - c1, c2], corpus_size), expect(&[ngrams - c1, ngrams - c2], corpus_size)],
    ],
  }
}

/// Log-likelihood ratio of a contingency table, over its non-zero observed cells
pub fn log_likelihood(table: &ContingencyTable) -> f64 {
  let mut ll = 0.0;
  for i in 0..2 {
    for j in 0..2 {
      let observed = table.observed[i][j];
      if observed != 0.0 {
        ll += observed * (observed.log10() - table.expected[i][j].log10());
      }
    }
  }
  2.0 * ll
}

/// Undefined results count as zero
fn finite(value: f64) -> f64 {
  if value.is_finite() {
    value
  } else {
    0.0
  }
}

/// The requested measures of an n-gram seen `joint` times, whose words were
/// seen `marginals` times, in a corpus of `corpus_size` tokens named `corpus_name`
pub fn calculate_ams(
  config: &AssociationConfig,
  joint: f64,
  marginals: &[f64],
  corpus_size: f64,
  corpus_name: &str,
) -> Vec<(String, FeatValue)>
{
  let n = marginals.len() as f64;
  let expected = expect(marginals, corpus_size);
  let marginal_sum: f64 = marginals.iter().sum();
  let mut feats = Vec::new();
  for &measure in Measure::ALL.iter().filter(|&&m| config.wants(m)) {
    let value = match measure {
      Measure::Mle if config.unnorm_mle => FeatValue::Int(joint as i64),
      Measure::Mle => FeatValue::Real(finite(joint / corpus_size)),
      Measure::Pmi => {
        if expected != 0.0 && joint != 0.0 {
          FeatValue::Real(finite((joint / expected).log2()))
        } else {
          FeatValue::Real(0.0)
        }
      },
      Measure::T => {
        if joint != 0.0 {
          FeatValue::Real(finite((joint - expected) / joint.sqrt()))
        } else {
          FeatValue::Real(0.0)
        }
      },
      Measure::Dice => {
        if marginal_sum != 0.0 {
          FeatValue::Real(finite(n * joint / marginal_sum))
        } else {
          FeatValue::Real(0.0)
        }
      },
      Measure::Ll => {
        if marginals.len() == 2 {
          let mut pair = [marginals[0], marginals[1]];
          let table = contingency_table(joint, &mut pair, corpus_size, corpus_name);
          FeatValue::Real(finite(log_likelihood(&table)))
        } else {
          warn_once!("log-likelihood is only implemented for 2grams. Defaults to 0.0 for n>2");
          FeatValue::Real(0.0)
        }
      },
    };
    feats.push((format!("{}_{}", measure, corpus_name), value));
  }
  feats
}

/// Adds association measures to every candidate going through
pub struct AssociationHandler {
  config: AssociationConfig,
  chain: Box<dyn InputHandler>,
  corpus_sizes: HashMap<String, f64>,
}

impl AssociationHandler {
  /// Measures as configured, sent to `chain`
  pub fn new(config: AssociationConfig, chain: Box<dyn InputHandler>) -> Self {
    AssociationHandler {
      config,
      chain,
      corpus_sizes: HashMap::new(),
    }
  }

  /// Size of the corpus a frequency named `corpus_name` was drawn from
  fn corpus_size(&self, corpus_name: &str, backed_off: bool) -> Result<Option<f64>> {
    let lookup = if corpus_name == BACKOFF_CORPUS && !backed_off {
      match self.config.main_corpus {
        Some(ref main) => main.as_str(),
        None => options_error!("You must define the original corpus with -o to use the backoff frequencies"),
      }
    } else {
      corpus_name
    };
    Ok(self.corpus_sizes.get(lookup).cloned())
  }
}

impl InputHandler for AssociationHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  /// Declares the new features: a real number per measure and corpus
  fn handle_meta(&mut self, mut meta: Meta, info: &ParseInfo) -> Result<()> {
    let corpora: Vec<(String, i64)> = meta.corpus_sizes.iter().map(|(name, &size)| (name.to_string(), size)).collect();
    for (name, size) in corpora {
      self.corpus_sizes.insert(name.clone(), size as f64);
      for measure in &self.config.measures {
        meta.add_meta_feat(&format!("{}_{}", measure, name), "real");
      }
    }
    self.chain.handle_meta(meta, info)
  }

  fn handle_candidate(&mut self, mut candidate: Candidate, info: &ParseInfo) -> Result<()> {
    // negative counts were backed off by the frequency combination
    let mut backed_off = candidate.ngram.freqs.iter().any(|(_, &value)| value < 0);
    backed_off |= candidate
      .words()
      .iter()
      .any(|word| word.freqs.iter().any(|(_, &value)| value < 0));

    let joints: Vec<(String, f64)> = candidate
      .ngram
      .freqs
      .iter()
      .map(|(name, &value)| (name.to_string(), value.abs() as f64))
      .collect();
    for (corpus_name, joint) in joints {
      let marginals: Option<Vec<f64>> = candidate
        .words()
        .iter()
        .map(|word| word.freqs.get(&corpus_name).map(|value| value.abs() as f64))
        .collect();
      let marginals = match marginals {
        Some(marginals) if !marginals.is_empty() => marginals,
        _ => {
          warn_once!("Missing word frequencies for corpus {}, skipping its measures", corpus_name);
          continue;
        },
      };
      let corpus_size = match self.corpus_size(&corpus_name, backed_off)? {
        Some(size) => size,
        None => {
          warn_once!("No corpus size declared for {}, skipping its measures", corpus_name);
          continue;
        },
      };
      for (name, value) in calculate_ams(&self.config, joint, &marginals, corpus_size, &corpus_name) {
        candidate.add_feat(&name, value);
      }
    }
    self.chain.handle_candidate(candidate, info)
  }
}

/// A contrastive measure, comparing the frequency of a candidate in the main
/// corpus with its frequency in a contrastive corpus
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ContrastMeasure {
  /// arctangent of the log-weighted frequency ratio (Bonin et al. 2010)
  Csmwe,
  /// plain ratio of the frequencies
  SimpleDiff,
  /// rank-equivalent simplification of `Csmwe`
  SimpleCsmwe,
}

impl ContrastMeasure {
  /// Every contrastive measure, in the order they are computed
  pub const ALL: [ContrastMeasure; 3] = [ContrastMeasure::Csmwe, ContrastMeasure::SimpleDiff, ContrastMeasure::SimpleCsmwe];

  /// Name used in feature names and on the command line
  pub fn name(self) -> &'static str {
    match self {
      ContrastMeasure::Csmwe => "csmwe",
      ContrastMeasure::SimpleDiff => "simplediff",
      ContrastMeasure::SimpleCsmwe => "simplecsmwe",
    }
  }
}

impl fmt::Display for ContrastMeasure {
  fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result { fmt.write_str(self.name()) }
}

impl FromStr for ContrastMeasure {
  type Err = Error;
  fn from_str(name: &str) -> Result<ContrastMeasure> {
    match name {
      "csmwe" => Ok(ContrastMeasure::Csmwe),
      "simplediff" => Ok(ContrastMeasure::SimpleDiff),
      "simplecsmwe" => Ok(ContrastMeasure::SimpleCsmwe),
      other => Err(Error::Options(format!(
        "measure is not supported: {}\nargument must be list separated by \":\" and containing the names: \
         csmwe, simplediff, simplecsmwe",
        other
      ))),
    }
  }
}

/// Parses a colon-separated list of contrastive measure names
pub fn parse_contrast_measures(names: &str) -> Result<Vec<ContrastMeasure>> {
  names.split(':').map(str::parse).collect()
}

/// Name of the joined contrastive corpus
pub const ALL_CONTRASTIVE: &str = "all";

/// Options of `mwe-feat-contrast`
#[derive(Debug, Clone)]
pub struct ContrastConfig {
  /// measures to compute
  pub measures: Vec<ContrastMeasure>,
  /// corpus the candidates were extracted from; every other one is contrastive
  pub main_corpus: String,
  /// one score against the union of the contrastive corpora instead of one per corpus
  pub join_all: bool,
}

impl ContrastConfig {
  /// Every measure against each contrastive corpus of `main_corpus`
  pub fn new(main_corpus: &str) -> Self {
    ContrastConfig {
      measures: ContrastMeasure::ALL.to_vec(),
      main_corpus: main_corpus.to_string(),
      join_all: false,
    }
  }
}

/// The requested contrastive measures of a candidate seen `main_freq` times in
/// the main corpus and `contrast_freq` times in `corpus_name`, whose candidates
/// add up to `total_freq` occurrences. Both frequencies are already smoothed.
pub fn calculate_contrast(
  measures: &[ContrastMeasure],
  main_freq: f64,
  contrast_freq: f64,
  total_freq: f64,
  corpus_name: &str,
) -> Vec<(String, FeatValue)>
{
  let ratio = main_freq / contrast_freq;
  let mut feats = Vec::new();
  for &measure in ContrastMeasure::ALL.iter().filter(|m| measures.contains(m)) {
    let value = match measure {
      ContrastMeasure::Csmwe => (main_freq.log2() * (main_freq / (contrast_freq / total_freq))).atan(),
      ContrastMeasure::SimpleDiff => ratio,
      ContrastMeasure::SimpleCsmwe => main_freq.log2() * ratio,
    };
    feats.push((format!("{}_{}", measure, corpus_name), FeatValue::Real(finite(value))));
  }
  feats
}

/// Adds contrastive measures to every candidate going through.
///
/// The measures need the total frequency of every contrastive corpus, so the
/// candidates of a file are held back until its end.
pub struct ContrastHandler {
  config: ContrastConfig,
  chain: Box<dyn InputHandler>,
  pending: Vec<Entity>,
  totals: HashMap<String, f64>,
}

impl ContrastHandler {
  /// Measures as configured, sent to `chain`
  pub fn new(config: ContrastConfig, chain: Box<dyn InputHandler>) -> Self {
    ContrastHandler {
      config,
      chain,
      pending: Vec::new(),
      totals: HashMap::new(),
    }
  }

  /// The contrastive corpora of `candidate`, with their smoothed frequencies,
  /// and its smoothed main frequency
  fn frequencies(&self, candidate: &Candidate) -> (f64, Vec<(String, f64)>) {
    let mut main_freq = 1.0;
    let mut joined = 1.0;
    let mut contrast = Vec::new();
    for (name, &value) in candidate.ngram.freqs.iter() {
      let value = value.abs() as f64;
      if name == self.config.main_corpus {
        main_freq += value;
      } else if self.config.join_all {
        joined += value;
      } else {
        contrast.push((name.to_string(), value + 1.0));
      }
    }
    if self.config.join_all {
      contrast.push((ALL_CONTRASTIVE.to_string(), joined));
    }
    (main_freq, contrast)
  }

  fn measure(&self, candidate: &mut Candidate) {
    let (main_freq, contrast) = self.frequencies(candidate);
    for (corpus_name, contrast_freq) in contrast {
      let total = self.totals.get(&corpus_name).cloned().unwrap_or(0.0);
      for (name, value) in calculate_contrast(&self.config.measures, main_freq, contrast_freq, total, &corpus_name) {
        candidate.add_feat(&name, value);
      }
    }
  }
}

impl InputHandler for ContrastHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  /// Declares a real feature per measure and contrastive corpus
  fn handle_meta(&mut self, mut meta: Meta, _info: &ParseInfo) -> Result<()> {
    let corpora: Vec<String> = meta.corpus_sizes.names().map(str::to_string).collect();
    if !corpora.contains(&self.config.main_corpus) {
      options_error!(
        "main frequency must be a valid freq. name\nPossible values: {}",
        corpora.join(", ")
      );
    }
    self.totals.clear();
    let mut contrastive: Vec<String> = corpora.into_iter().filter(|name| *name != self.config.main_corpus).collect();
    if self.config.join_all {
      contrastive = vec![ALL_CONTRASTIVE.to_string()];
    }
    for name in contrastive {
      for measure in &self.config.measures {
        meta.add_meta_feat(&format!("{}_{}", measure, name), "real");
      }
    }
    self.pending.push(Entity::Meta(meta));
    Ok(())
  }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    for (name, &value) in candidate.ngram.freqs.iter() {
      if name == self.config.main_corpus {
        continue;
      }
      let value = value.abs() as f64;
      *self.totals.entry(name.to_string()).or_insert(0.0) += value;
      if self.config.join_all {
        *self.totals.entry(ALL_CONTRASTIVE.to_string()).or_insert(0.0) += value;
      }
    }
    self.pending.push(Entity::Candidate(candidate));
    Ok(())
  }

  fn handle_directive(&mut self, directive: &Directive, _info: &ParseInfo) -> Result<()> {
    self.pending.push(Entity::Directive(directive.clone()));
    Ok(())
  }

  fn fallback(&mut self, entity: Entity, _info: &ParseInfo) -> Result<()> {
    self.pending.push(entity);
    Ok(())
  }

  fn after_file(&mut self, info: &ParseInfo) -> Result<()> {
    let pending = std::mem::replace(&mut self.pending, Vec::new());
    for entity in pending {
      match entity {
        Entity::Candidate(mut candidate) => {
          self.measure(&mut candidate);
          self.chain.handle_candidate(candidate, info)?;
        },
        other => self.chain.handle(other, info)?,
      }
    }
    self.chain.after_file(info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;
  use crate::filetype::{Category, EntityCollectorHandler};
  use std::cell::RefCell;
  use std::rc::Rc;

  /// Collects what a measure stage sends down
  struct Tap(Rc<RefCell<EntityCollectorHandler>>);

  impl InputHandler for Tap {
    fn fallback(&mut self, entity: Entity, info: &ParseInfo) -> Result<()> {
      self.0.borrow_mut().fallback(entity, info)
    }
  }

  fn collector() -> (Rc<RefCell<EntityCollectorHandler>>, Box<dyn InputHandler>) {
    let collected = Rc::new(RefCell::new(EntityCollectorHandler::new()));
    let tap: Box<dyn InputHandler> = Box::new(Tap(collected.clone()));
    (collected, tap)
  }

  fn meta(sizes: &[(&str, i64)]) -> Meta {
    let mut meta = Meta::new();
    for &(name, size) in sizes {
      meta.add_corpus_size(name, size);
    }
    meta
  }

  fn candidate(lemmas: &str, freqs: &[(&str, i64)]) -> Candidate {
    let words = lemmas.split_whitespace().map(|l| Word::from_attrs(None, Some(l), None, None)).collect();
    let mut candidate = Candidate::new(1, words);
    for &(name, value) in freqs {
      candidate.ngram.add_frequency(name, value);
    }
    candidate
  }

  fn feature(candidate: &Candidate, name: &str) -> f64 {
    match candidate.features.get(name) {
      Some(FeatValue::Real(value)) => *value,
      other => panic!("no real feature {}: {:?}", name, other),
    }
  }

  fn real(feats: &[(String, FeatValue)], name: &str) -> f64 {
    match feats.iter().find(|(n, _)| n == name) {
      Some((_, FeatValue::Real(value))) => *value,
      other => panic!("no real feature {}: {:?}", name, other),
    }
  }

  #[test]
  fn expectation_is_scaled_to_ngrams() {
    assert!((expect(&[100.0, 200.0], 10000.0) - 1.9998).abs() < 1e-9);
  }

  #[test]
  fn bigram_measures() {
    let feats = calculate_ams(&AssociationConfig::default(), 10.0, &[100.0, 200.0], 10000.0, "bnc");
    let names: Vec<&str> = feats.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["mle_bnc", "pmi_bnc", "t_bnc", "dice_bnc", "ll_bnc"]);
    assert!((real(&feats, "mle_bnc") - 0.001).abs() < 1e-12);
    assert!((real(&feats, "pmi_bnc") - 2.3219).abs() < 1e-3);
    assert!((real(&feats, "t_bnc") - 2.5298).abs() < 1e-3);
    assert!((real(&feats, "dice_bnc") - 0.0667).abs() < 1e-4);
    assert!(real(&feats, "ll_bnc") > 0.0);
  }

  #[test]
  fn zero_counts_give_zero() {
    let feats = calculate_ams(&AssociationConfig::default(), 0.0, &[0.0, 200.0], 10000.0, "c");
    assert_eq!(real(&feats, "pmi_c"), 0.0);
    assert_eq!(real(&feats, "t_c"), 0.0);
    assert_eq!(real(&feats, "dice_c"), 0.0);
  }

  #[test]
  fn dice_ignores_word_order() {
    let config = AssociationConfig {
      measures: vec![Measure::Dice],
      ..AssociationConfig::default()
    };
    let forward = calculate_ams(&config, 3.0, &[10.0, 20.0, 30.0], 1000.0, "c");
    let backward = calculate_ams(&config, 3.0, &[30.0, 20.0, 10.0], 1000.0, "c");
    assert_eq!(real(&forward, "dice_c"), real(&backward, "dice_c"));
  }

  #[test]
  fn unnormalized_mle_is_the_raw_count() {
    let config = AssociationConfig {
      measures: vec![Measure::Mle],
      unnorm_mle: true,
      ..AssociationConfig::default()
    };
    let feats = calculate_ams(&config, 10.0, &[100.0, 200.0], 10000.0, "c");
    assert_eq!(feats, vec![("mle_c".to_string(), FeatValue::Int(10))]);
  }

  #[test]
  fn marginals_are_raised_to_the_joint_count() {
    let mut marginals = [5.0, 3.0];
    let table = contingency_table(7.0, &mut marginals, 100.0, "c");
    assert_eq!(marginals, [7.0, 7.0]);
    assert_eq!(table.observed[0][1], 0.0);
    assert_eq!(table.observed[1][0], 0.0);
    for row in table.expected.iter() {
      for &cell in row.iter() {
        assert!(cell > 0.0);
      }
    }
    assert!(log_likelihood(&table) >= 0.0);
  }

  #[test]
  fn trigrams_have_no_log_likelihood() {
    let config = AssociationConfig {
      measures: vec![Measure::Ll],
      ..AssociationConfig::default()
    };
    let feats = calculate_ams(&config, 2.0, &[10.0, 20.0, 30.0], 1000.0, "c");
    assert_eq!(real(&feats, "ll_c"), 0.0);
  }

  #[test]
  fn measure_lists() {
    assert_eq!(parse_measures("pmi:ll").unwrap(), vec![Measure::Pmi, Measure::Ll]);
    assert!(parse_measures("pmi:chi2").is_err());
  }

  #[test]
  fn words_without_frequency_skip_the_corpus() {
    let (collected, tap) = collector();
    let mut handler = AssociationHandler::new(AssociationConfig::default(), tap);
    let info = ParseInfo::detached("XML", Category::Candidates);
    handler.handle_meta(meta(&[("bnc", 10000), ("web", 5000)]), &info).unwrap();

    let mut partial = candidate("strong tea", &[("bnc", 10), ("web", 4)]);
    partial.ngram.words[0].freqs.add("bnc", 100);
    partial.ngram.words[0].freqs.add("web", 50);
    partial.ngram.words[1].freqs.add("web", 30);
    handler.handle_candidate(partial, &info).unwrap();

    let collected = collected.borrow();
    let candidates = collected.candidates();
    assert_eq!(candidates.len(), 1);
    let names: Vec<&str> = candidates[0].features.names().collect();
    assert!(names.iter().all(|name| !name.ends_with("_bnc")), "{:?}", names);
    assert!(names.contains(&"pmi_web"));
  }

  #[test]
  fn contrastive_measures_per_corpus() {
    let (collected, tap) = collector();
    let mut handler = ContrastHandler::new(ContrastConfig::new("bnc"), tap);
    let info = ParseInfo::detached("XML", Category::Candidates);
    handler.before_file(&info).unwrap();
    handler.handle_meta(meta(&[("bnc", 1000), ("web", 500)]), &info).unwrap();
    handler.handle_candidate(candidate("strong tea", &[("bnc", 9), ("web", 3)]), &info).unwrap();
    handler.handle_candidate(candidate("joint venture", &[("bnc", 1), ("web", 1)]), &info).unwrap();
    // nothing leaves before the totals are known
    assert!(collected.borrow().entities.is_empty());
    handler.after_file(&info).unwrap();

    let collected = collected.borrow();
    match collected.entities.first() {
      Some(Entity::Meta(meta)) => {
        let declared: Vec<&str> = meta.meta_feats.iter().map(|feat| feat.name.as_str()).collect();
        assert_eq!(declared, vec!["csmwe_web", "simplediff_web", "simplecsmwe_web"]);
      },
      other => panic!("expected the meta first, got {:?}", other),
    }
    let candidates = collected.candidates();
    assert_eq!(candidates.len(), 2);
    // main 9+1, contrastive 3+1, contrastive total 3+1
    assert!((feature(candidates[0], "csmwe_web") - 1.540_702_415_3).abs() < 1e-9);
    assert!((feature(candidates[0], "simplediff_web") - 2.5).abs() < 1e-12);
    assert!((feature(candidates[0], "simplecsmwe_web") - 8.304_820_237_2).abs() < 1e-9);
    // main 1+1, contrastive 1+1: atan(1 * 2 / (2 / 4))
    assert!((feature(candidates[1], "csmwe_web") - 4f64.atan()).abs() < 1e-12);
    assert!((feature(candidates[1], "simplediff_web") - 1.0).abs() < 1e-12);
    assert!((feature(candidates[1], "simplecsmwe_web") - 1.0).abs() < 1e-12);
  }

  #[test]
  fn contrastive_corpora_joined() {
    let (collected, tap) = collector();
    let config = ContrastConfig {
      measures: vec![ContrastMeasure::SimpleDiff],
      join_all: true,
      ..ContrastConfig::new("bnc")
    };
    let mut handler = ContrastHandler::new(config, tap);
    let info = ParseInfo::detached("XML", Category::Candidates);
    handler.handle_meta(meta(&[("bnc", 1000), ("web", 500), ("news", 200)]), &info).unwrap();
    handler.handle_candidate(candidate("strong tea", &[("bnc", 9), ("web", 3), ("news", 1)]), &info).unwrap();
    handler.after_file(&info).unwrap();

    let collected = collected.borrow();
    let candidates = collected.candidates();
    let names: Vec<&str> = candidates[0].features.names().collect();
    assert_eq!(names, vec!["simplediff_all"]);
    // (9 + 1) / (3 + 1 + 1)
    assert!((feature(candidates[0], "simplediff_all") - 2.0).abs() < 1e-12);
  }

  #[test]
  fn contrast_needs_a_known_main_corpus() {
    let (_collected, tap) = collector();
    let mut handler = ContrastHandler::new(ContrastConfig::new("wiki"), tap);
    let info = ParseInfo::detached("XML", Category::Candidates);
    let err = handler.handle_meta(meta(&[("bnc", 1000)]), &info).unwrap_err();
    assert!(err.is_usage());
    assert!(parse_contrast_measures("csmwe:pmi").is_err());
  }
}
