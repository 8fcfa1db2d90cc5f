//! Named values attached to words, ngrams, candidates and meta headers.
//!
//! Frequencies, features, TP classes and corpus sizes share the same shape:
//! an insertion-ordered map from name to value, plus a merge operator that
//! decides what happens when the same name is added twice.
use std::collections::HashMap;
use std::fmt;

use super::quoteattr;

/// The category of a feature set, which is also its XML tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureKind {
  /// `<feat>`: candidate features, merged with `max`
  Feat,
  /// `<freq>`: corpus frequencies, merged by summing
  Freq,
  /// `<tpclass>`: true-positive judgements, merged by concatenation
  TpClass,
  /// `<corpussize>`: number of tokens per corpus, the last value wins
  CorpusSize,
}

impl FeatureKind {
  /// XML element name of this kind
  pub fn tag(self) -> &'static str {
    match self {
      FeatureKind::Feat => "feat",
      FeatureKind::Freq => "freq",
      FeatureKind::TpClass => "tpclass",
      FeatureKind::CorpusSize => "corpussize",
    }
  }
}

/// A feature value, typed after the declaration in the meta header
#[derive(Debug, Clone, PartialEq)]
pub enum FeatValue {
  /// `integer`
  Int(i64),
  /// `real`
  Real(f64),
  /// `string` or an enumeration such as `{True,False}`
  Str(String),
}

impl FeatValue {
  /// Numeric view of the value, if it has one
  pub fn as_f64(&self) -> Option<f64> {
    match *self {
      FeatValue::Int(i) => Some(i as f64),
      FeatValue::Real(r) => Some(r),
      FeatValue::Str(ref s) => s.parse().ok(),
    }
  }

  /// Parses `raw` according to a declared type.
  /// Unknown types and unparsable numbers are kept as strings.
  pub fn typed(raw: &str, feat_type: Option<&str>) -> FeatValue {
    match feat_type {
      Some("integer") => match raw.parse() {
        Ok(i) => FeatValue::Int(i),
        Err(_) => FeatValue::Str(raw.to_string()),
      },
      Some("real") => match raw.parse() {
        Ok(r) => FeatValue::Real(r),
        Err(_) => FeatValue::Str(raw.to_string()),
      },
      _ => FeatValue::Str(raw.to_string()),
    }
  }
}

impl fmt::Display for FeatValue {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      FeatValue::Int(i) => write!(f, "{}", i),
      FeatValue::Real(r) => {
        if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e16 {
          write!(f, "{:.1}", r)
        } else {
          write!(f, "{}", r)
        }
      },
      FeatValue::Str(ref s) => write!(f, "{}", s),
    }
  }
}

impl From<i64> for FeatValue {
  fn from(i: i64) -> Self { FeatValue::Int(i) }
}
impl From<f64> for FeatValue {
  fn from(r: f64) -> Self { FeatValue::Real(r) }
}
impl From<String> for FeatValue {
  fn from(s: String) -> Self { FeatValue::Str(s) }
}
impl<'a> From<&'a str> for FeatValue {
  fn from(s: &'a str) -> Self { FeatValue::Str(s.to_string()) }
}

fn merge_sum(old: i64, new: i64) -> i64 { old + new }

fn merge_last<V>(_old: V, new: V) -> V { new }

fn merge_concat(old: String, new: String) -> String { old + &new }

fn merge_max(old: FeatValue, new: FeatValue) -> FeatValue {
  match (old.as_f64(), new.as_f64()) {
    (Some(a), Some(b)) => {
      if b > a {
        new
      } else {
        old
      }
    },
    _ => match (&old, &new) {
      (&FeatValue::Str(ref a), &FeatValue::Str(ref b)) if a >= b => old,
      _ => new,
    },
  }
}

/// Insertion-ordered mapping from feature names to values
#[derive(Debug, Clone)]
pub struct FeatureSet<V> {
  kind: FeatureKind,
  merge_op: fn(V, V) -> V,
  entries: Vec<(String, V)>,
  index: HashMap<String, usize>,
}

impl<V: Clone> FeatureSet<V> {
  /// An empty set of the given kind, merging duplicates through `merge_op`
  pub fn with_merge(kind: FeatureKind, merge_op: fn(V, V) -> V) -> Self {
    FeatureSet {
      kind,
      merge_op,
      entries: Vec::new(),
      index: HashMap::new(),
    }
  }

  /// Category of this set
  pub fn kind(&self) -> FeatureKind { self.kind }

  /// Number of distinct names
  pub fn len(&self) -> usize { self.entries.len() }

  /// Whether no name was ever added
  pub fn is_empty(&self) -> bool { self.entries.is_empty() }

  /// Whether `name` is present
  pub fn contains(&self, name: &str) -> bool { self.index.contains_key(name) }

  /// Value stored under `name`
  pub fn get(&self, name: &str) -> Option<&V> { self.index.get(name).map(|&i| &self.entries[i].1) }

  /// Adds a value, merging it into an existing one of the same name
  pub fn add(&mut self, name: &str, value: V) {
    match self.index.get(name) {
      Some(&i) => {
        let old = self.entries[i].1.clone();
        self.entries[i].1 = (self.merge_op)(old, value);
      },
      None => {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), value));
      },
    }
  }

  /// Stores a value, discarding any previous one of the same name
  pub fn set(&mut self, name: &str, value: V) {
    match self.index.get(name) {
      Some(&i) => self.entries[i].1 = value,
      None => {
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push((name.to_string(), value));
      },
    }
  }

  /// Adds every entry of `other`, in its order
  pub fn merge_from(&mut self, other: &FeatureSet<V>) {
    for (name, value) in other.iter() {
      self.add(name, value.clone());
    }
  }

  /// Removes every entry
  pub fn clear(&mut self) {
    self.entries.clear();
    self.index.clear();
  }

  /// Iterates over `(name, value)` in insertion order
  pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
    self.entries.iter().map(|&(ref n, ref v)| (n.as_str(), v))
  }

  /// Names in insertion order
  pub fn names(&self) -> impl Iterator<Item = &str> { self.entries.iter().map(|e| e.0.as_str()) }
}

impl<V: Clone + fmt::Display> FeatureSet<V> {
  /// Appends `<tag name=".." value=".." />` for every entry
  pub fn to_xml_into(&self, output: &mut String, indent: usize, after_each: &str) {
    for (name, value) in self.iter() {
      for _ in 0..indent {
        output.push(' ');
      }
      output.push('<');
      output.push_str(self.kind.tag());
      output.push_str(" name=");
      output.push_str(&quoteattr(name));
      output.push_str(" value=");
      output.push_str(&quoteattr(&value.to_string()));
      output.push_str(" />");
      output.push_str(after_each);
    }
  }
}

impl FeatureSet<i64> {
  /// Frequencies: duplicates are summed
  pub fn frequencies() -> Self { FeatureSet::with_merge(FeatureKind::Freq, merge_sum) }
  /// Corpus sizes: the last value wins
  pub fn corpus_sizes() -> Self { FeatureSet::with_merge(FeatureKind::CorpusSize, merge_last) }
}

impl FeatureSet<FeatValue> {
  /// Candidate features: duplicates keep the maximum
  pub fn features() -> Self { FeatureSet::with_merge(FeatureKind::Feat, merge_max) }
}

impl FeatureSet<String> {
  /// TP classes: duplicates are concatenated
  pub fn tpclasses() -> Self { FeatureSet::with_merge(FeatureKind::TpClass, merge_concat) }
}

impl<V: PartialEq> PartialEq for FeatureSet<V> {
  fn eq(&self, other: &Self) -> bool { self.kind == other.kind && self.entries == other.entries }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn frequencies_are_summed() {
    let mut freqs = FeatureSet::frequencies();
    freqs.add("bnc", 3);
    freqs.add("web", 1);
    freqs.add("bnc", 4);
    assert_eq!(freqs.get("bnc"), Some(&7));
    assert_eq!(freqs.names().collect::<Vec<_>>(), vec!["bnc", "web"]);
  }

  #[test]
  fn features_keep_the_maximum() {
    let mut feats = FeatureSet::features();
    feats.add("pmi", FeatValue::Real(1.5));
    feats.add("pmi", FeatValue::Real(0.5));
    feats.add("pmi", FeatValue::Int(2));
    assert_eq!(feats.get("pmi"), Some(&FeatValue::Int(2)));
  }

  #[test]
  fn tpclasses_concatenate_and_sizes_replace() {
    let mut tp = FeatureSet::tpclasses();
    tp.add("gold", "True".to_string());
    tp.add("gold", "False".to_string());
    assert_eq!(tp.get("gold").map(String::as_str), Some("TrueFalse"));

    let mut sizes = FeatureSet::corpus_sizes();
    sizes.add("bnc", 10);
    sizes.add("bnc", 3);
    assert_eq!(sizes.get("bnc"), Some(&3));
  }

  #[test]
  fn xml_serialization() {
    let mut freqs = FeatureSet::frequencies();
    freqs.add("a&b", 2);
    let mut out = String::new();
    freqs.to_xml_into(&mut out, 4, "\n");
    assert_eq!(out, "    <freq name=\"a&amp;b\" value=\"2\" />\n");
  }

  #[test]
  fn typed_values() {
    assert_eq!(FeatValue::typed("3", Some("integer")), FeatValue::Int(3));
    assert_eq!(FeatValue::typed("0.5", Some("real")), FeatValue::Real(0.5));
    assert_eq!(FeatValue::typed("True", Some("{True,False}")), FeatValue::Str("True".into()));
    assert_eq!(FeatValue::Real(3.0).to_string(), "3.0");
  }
}
