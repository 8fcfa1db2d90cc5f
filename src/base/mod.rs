//! The entities streamed through every pipeline.
//!
//! Parsers create them in input order, handlers consume them in the same order.
//! Word attributes are optional: an absent attribute is the wildcard, and prints as nothing.

pub mod candidate;
pub mod entry;
pub mod feature;
pub mod meta;
pub mod mweoccur;
pub mod ngram;
pub mod sentence;
pub mod word;

pub use self::candidate::{Candidate, CandidateFactory};
pub use self::entry::Entry;
pub use self::feature::{FeatValue, FeatureKind, FeatureSet};
pub use self::meta::{Meta, MetaFeat};
pub use self::mweoccur::MWEOccurrence;
pub use self::ngram::Ngram;
pub use self::sentence::{Sentence, SentenceFactory};
pub use self::word::{Word, WordAttr};

/// Stands for an absent attribute inside canonical keys
pub const WILDCARD: char = '\x1e';
/// Separates the attributes of a word inside canonical keys
pub const ATTRIBUTE_SEPARATOR: char = '\x1d';
/// Separates the words of an ngram inside canonical keys
pub const WORD_SEPARATOR: char = '\x1c';
/// Printed where a feature has no value
pub const UNKNOWN_FEAT_VALUE: &str = "?";

/// Quotes `value` for use as an XML attribute, surrounding double quotes included
pub fn quoteattr(value: &str) -> String {
  let mut quoted = String::with_capacity(value.len() + 2);
  quoted.push('"');
  for c in value.chars() {
    match c {
      '&' => quoted.push_str("&amp;"),
      '<' => quoted.push_str("&lt;"),
      '>' => quoted.push_str("&gt;"),
      '"' => quoted.push_str("&quot;"),
      '\n' => quoted.push_str("&#10;"),
      '\r' => quoted.push_str("&#13;"),
      '\t' => quoted.push_str("&#9;"),
      _ => quoted.push(c),
    }
  }
  quoted.push('"');
  quoted
}

/// Escapes XML text content
pub fn escape_text(value: &str) -> String {
  value
    .replace('&', "&amp;")
    .replace('<', "&lt;")
    .replace('>', "&gt;")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn attributes_are_quoted() {
    assert_eq!(quoteattr("a<b & \"c\""), "\"a&lt;b &amp; &quot;c&quot;\"");
    assert_eq!(quoteattr(""), "\"\"");
    assert_eq!(escape_text("x > y"), "x &gt; y");
  }
}
