//! A single token and its four optional attributes
use std::fmt;
use std::str::FromStr;

use super::feature::FeatureSet;
use super::{quoteattr, ATTRIBUTE_SEPARATOR, WILDCARD, WORD_SEPARATOR};
use crate::error::{Error, Result};

/// The attributes a word carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WordAttr {
  /// the form seen in the text
  Surface,
  /// the dictionary form
  Lemma,
  /// part-of-speech tag
  Pos,
  /// syntactic relation, `rel:head` pairs separated by `;`
  Syn,
}

impl WordAttr {
  /// All attributes, in serialization order
  pub const ALL: [WordAttr; 4] = [WordAttr::Surface, WordAttr::Lemma, WordAttr::Pos, WordAttr::Syn];

  /// Attribute name as used in XML and in patterns
  pub fn name(self) -> &'static str {
    match self {
      WordAttr::Surface => "surface",
      WordAttr::Lemma => "lemma",
      WordAttr::Pos => "pos",
      WordAttr::Syn => "syn",
    }
  }
}

impl FromStr for WordAttr {
  type Err = Error;
  fn from_str(name: &str) -> Result<Self> {
    match name {
      "surface" => Ok(WordAttr::Surface),
      "lemma" => Ok(WordAttr::Lemma),
      "pos" => Ok(WordAttr::Pos),
      "syn" => Ok(WordAttr::Syn),
      other => Err(Error::Options(format!("Unknown word attribute: {:?}", other))),
    }
  }
}

impl fmt::Display for WordAttr {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

/// An orthographic token. `None` attributes are wildcards.
#[derive(Debug, Clone)]
pub struct Word {
  /// surface form
  pub surface: Option<String>,
  /// lemma
  pub lemma: Option<String>,
  /// part of speech
  pub pos: Option<String>,
  /// syntactic relations
  pub syn: Option<String>,
  /// per-corpus frequencies of this word
  pub freqs: FeatureSet<i64>,
}

impl Default for Word {
  fn default() -> Word {
    Word {
      surface: None,
      lemma: None,
      pos: None,
      syn: None,
      freqs: FeatureSet::frequencies(),
    }
  }
}

impl PartialEq for Word {
  fn eq(&self, other: &Word) -> bool {
    self.surface == other.surface
      && self.lemma == other.lemma
      && self.pos == other.pos
      && self.syn == other.syn
  }
}

fn owned(value: Option<&str>) -> Option<String> { value.map(str::to_string) }

impl Word {
  /// A word made of wildcards only
  pub fn new() -> Self { Word::default() }

  /// Builds a word from its attributes, without validation
  pub fn from_attrs(
    surface: Option<&str>,
    lemma: Option<&str>,
    pos: Option<&str>,
    syn: Option<&str>,
  ) -> Self
  {
    Word {
      surface: owned(surface),
      lemma: owned(lemma),
      pos: owned(pos),
      syn: owned(syn),
      freqs: FeatureSet::frequencies(),
    }
  }

  /// Builds a word, refusing attributes that contain the internal separators
  pub fn checked(
    surface: Option<&str>,
    lemma: Option<&str>,
    pos: Option<&str>,
    syn: Option<&str>,
  ) -> Result<Self>
  {
    let word = Word::from_attrs(surface, lemma, pos, syn);
    word.validate()?;
    Ok(word)
  }

  /// Fails if any attribute contains a separator character
  pub fn validate(&self) -> Result<()> {
    for &attr in WordAttr::ALL.iter() {
      if let Some(value) = self.get(attr) {
        if value.contains(|c| c == WILDCARD || c == ATTRIBUTE_SEPARATOR || c == WORD_SEPARATOR) {
          return Err(Error::InvalidAttribute(format!(
            "{} {:?} contains a reserved control character",
            attr, value
          )));
        }
      }
    }
    Ok(())
  }

  /// Value of an attribute
  pub fn get(&self, attr: WordAttr) -> Option<&str> {
    let value = match attr {
      WordAttr::Surface => &self.surface,
      WordAttr::Lemma => &self.lemma,
      WordAttr::Pos => &self.pos,
      WordAttr::Syn => &self.syn,
    };
    value.as_ref().map(String::as_str)
  }

  /// Replaces an attribute
  pub fn set(&mut self, attr: WordAttr, value: Option<String>) {
    match attr {
      WordAttr::Surface => self.surface = value,
      WordAttr::Lemma => self.lemma = value,
      WordAttr::Pos => self.pos = value,
      WordAttr::Syn => self.syn = value,
    }
  }

  /// The lemma if there is one, the surface otherwise
  pub fn lemma_or_surface(&self) -> Option<&str> {
    self.lemma.as_ref().or_else(|| self.surface.as_ref()).map(String::as_str)
  }

  /// Whether this word, read as a pattern, accepts `other`.
  /// Absent attributes on `self` accept anything; syntax is not compared.
  pub fn matches(&self, other: &Word) -> bool {
    let accepts = |mine: &Option<String>, theirs: &Option<String>| match *mine {
      None => true,
      Some(ref value) => theirs.as_ref() == Some(value),
    };
    accepts(&self.pos, &other.pos)
      && accepts(&self.surface, &other.surface)
      && accepts(&self.lemma, &other.lemma)
  }

  /// Adds a frequency for corpus `name`
  pub fn add_frequency(&mut self, name: &str, value: i64) { self.freqs.add(name, value); }

  /// Frequency for corpus `name`, zero when unknown
  pub fn get_freq_value(&self, name: &str) -> i64 { self.freqs.get(name).cloned().unwrap_or(0) }

  /// Canonical key from surface, lemma and POS
  pub fn to_key(&self) -> String {
    let mut key = String::new();
    for (i, attr) in [WordAttr::Surface, WordAttr::Lemma, WordAttr::Pos].iter().enumerate() {
      if i > 0 {
        key.push(ATTRIBUTE_SEPARATOR);
      }
      match self.get(*attr) {
        Some(value) => key.push_str(value),
        None => key.push(WILDCARD),
      }
    }
    key
  }

  /// Appends the `<w ... />` element
  pub fn to_xml_into(&self, output: &mut String) {
    output.push_str("<w");
    for &attr in WordAttr::ALL.iter() {
      if let Some(value) = self.get(attr) {
        output.push(' ');
        output.push_str(attr.name());
        output.push('=');
        output.push_str(&quoteattr(value));
      }
    }
    if self.freqs.is_empty() {
      output.push_str(" />");
    } else {
      output.push_str(" >");
      self.freqs.to_xml_into(output, 0, "");
      output.push_str("</w>");
    }
  }

  /// The `<w ... />` element
  pub fn to_xml(&self) -> String {
    let mut output = String::new();
    self.to_xml_into(&mut output);
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn separators_are_refused() {
    assert!(Word::checked(Some("ok"), None, Some("NN"), None).is_ok());
    let bad = format!("a{}b", WORD_SEPARATOR);
    match Word::checked(Some(&bad), None, None, None) {
      Err(Error::InvalidAttribute(_)) => {},
      other => panic!("expected InvalidAttribute, got {:?}", other),
    }
  }

  #[test]
  fn equality_ignores_frequencies() {
    let mut a = Word::from_attrs(Some("cats"), Some("cat"), Some("NN"), None);
    let b = a.clone();
    a.add_frequency("bnc", 3);
    assert_eq!(a, b);
    assert_ne!(a, Word::from_attrs(Some("cats"), Some("cat"), Some("NNS"), None));
  }

  #[test]
  fn pattern_words_accept_wildcards() {
    let pattern = Word::from_attrs(None, None, Some("NN"), None);
    assert!(pattern.matches(&Word::from_attrs(Some("man"), Some("man"), Some("NN"), None)));
    assert!(!pattern.matches(&Word::from_attrs(Some("sat"), Some("sit"), Some("VBD"), None)));
  }

  #[test]
  fn xml_omits_absent_attributes() {
    let mut w = Word::from_attrs(Some("a\"b"), None, Some("DT"), None);
    assert_eq!(w.to_xml(), "<w surface=\"a&quot;b\" pos=\"DT\" />");
    w.add_frequency("c", 2);
    assert_eq!(w.to_xml(), "<w surface=\"a&quot;b\" pos=\"DT\" ><freq name=\"c\" value=\"2\" /></w>");
  }

  #[test]
  fn lemma_falls_back_to_surface() {
    assert_eq!(Word::from_attrs(Some("ran"), None, None, None).lemma_or_surface(), Some("ran"));
    assert_eq!(Word::from_attrs(Some("ran"), Some("run"), None, None).lemma_or_surface(), Some("run"));
  }
}
