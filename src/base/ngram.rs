//! Ordered word sequences with frequencies and source descriptors
use super::feature::FeatureSet;
use super::word::{Word, WordAttr};
use super::WORD_SEPARATOR;

/// A sequence of words, plus corpus frequencies and the list of
/// `sentence-id:positions` descriptors it was seen at
#[derive(Debug, Clone)]
pub struct Ngram {
  /// the words
  pub words: Vec<Word>,
  /// corpus name to count, merged by summing
  pub freqs: FeatureSet<i64>,
  /// source descriptors such as `12:3,4`
  pub sources: Vec<String>,
}

impl Default for Ngram {
  fn default() -> Ngram { Ngram::new(Vec::new()) }
}

impl PartialEq for Ngram {
  fn eq(&self, other: &Ngram) -> bool { self.words == other.words }
}

impl Ngram {
  /// An ngram without frequencies nor sources
  pub fn new(words: Vec<Word>) -> Self {
    Ngram {
      words,
      freqs: FeatureSet::frequencies(),
      sources: Vec::new(),
    }
  }

  /// Number of words
  pub fn len(&self) -> usize { self.words.len() }

  /// Whether there are no words
  pub fn is_empty(&self) -> bool { self.words.is_empty() }

  /// Adds a count for corpus `name`
  pub fn add_frequency(&mut self, name: &str, value: i64) { self.freqs.add(name, value); }

  /// Count for corpus `name`, zero when unknown
  pub fn get_freq_value(&self, name: &str) -> i64 { self.freqs.get(name).cloned().unwrap_or(0) }

  /// Sets `attr` of every word to `value`
  pub fn set_all(&mut self, attr: WordAttr, value: Option<&str>) {
    for word in self.words.iter_mut() {
      word.set(attr, value.map(str::to_string));
    }
  }

  /// Canonical key of the word sequence, used for deduplication
  pub fn to_key(&self) -> String {
    let keys: Vec<String> = self.words.iter().map(Word::to_key).collect();
    keys.join(&WORD_SEPARATOR.to_string())
  }

  /// Merges frequencies and sources of `other` into this ngram
  pub fn merge_from(&mut self, other: &Ngram) {
    self.freqs.merge_from(&other.freqs);
    self.sources.extend(other.sources.iter().cloned());
  }

  /// Words joined by `_`, each as lemma or surface
  pub fn to_plain(&self) -> String {
    self
      .words
      .iter()
      .map(|w| w.lemma_or_surface().unwrap_or("<?>"))
      .collect::<Vec<_>>()
      .join("_")
  }

  /// Appends words, frequencies and sources, without the enclosing element
  pub fn to_xml_into(&self, output: &mut String) {
    for word in &self.words {
      word.to_xml_into(output);
      output.push(' ');
    }
    self.freqs.to_xml_into(output, 0, "");
    if !self.sources.is_empty() {
      output.push_str("<sources ids=\"");
      output.push_str(&self.sources.join(";"));
      output.push_str("\"/>");
    }
  }

  /// The `<ngram>` element
  pub fn to_xml(&self) -> String {
    let mut output = String::from("<ngram>");
    self.to_xml_into(&mut output);
    output.push_str("</ngram>");
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn bigram() -> Ngram {
    Ngram::new(vec![
      Word::from_attrs(Some("old"), Some("old"), Some("JJ"), None),
      Word::from_attrs(Some("men"), Some("man"), Some("NN"), None),
    ])
  }

  #[test]
  fn merging_sums_and_appends() {
    let mut a = bigram();
    a.add_frequency("bnc", 1);
    a.sources.push("1:2,3".into());
    let mut b = bigram();
    b.add_frequency("bnc", 2);
    b.sources.push("4:1,2".into());
    a.merge_from(&b);
    assert_eq!(a.get_freq_value("bnc"), 3);
    assert_eq!(a.sources, vec!["1:2,3", "4:1,2"]);
  }

  #[test]
  fn keys_follow_attributes() {
    let mut a = bigram();
    let key = a.to_key();
    a.set_all(WordAttr::Surface, None);
    assert_ne!(a.to_key(), key);
    assert_eq!(a.to_plain(), "old_man");
  }

  #[test]
  fn xml_layout() {
    let mut a = bigram();
    a.add_frequency("c", 1);
    a.sources.push("1:2,3".into());
    assert_eq!(
      a.to_xml(),
      "<ngram><w surface=\"old\" lemma=\"old\" pos=\"JJ\" /> <w surface=\"men\" lemma=\"man\" pos=\"NN\" /> \
       <freq name=\"c\" value=\"1\" /><sources ids=\"1:2,3\"/></ngram>"
    );
  }
}
