//! Dictionary entries, as found in reference lists
use super::candidate::Candidate;
use super::feature::{FeatValue, FeatureSet};
use super::ngram::Ngram;

/// A dictionary entry: an ngram with an id and features
#[derive(Debug, Clone)]
pub struct Entry {
  /// entry id
  pub id_number: u64,
  /// the words of the entry
  pub ngram: Ngram,
  /// features, merged with max
  pub features: FeatureSet<FeatValue>,
}

impl Entry {
  /// An entry without features
  pub fn new(id_number: u64, ngram: Ngram) -> Self {
    Entry {
      id_number,
      ngram,
      features: FeatureSet::features(),
    }
  }

  /// Merges counts and features of `other`
  pub fn merge_from(&mut self, other: &Entry) {
    self.ngram.merge_from(&other.ngram);
    self.features.merge_from(&other.features);
  }

  /// The `<entry>` element
  pub fn to_xml(&self) -> String {
    let mut output = format!("<entry entryid=\"{}\">", self.id_number);
    self.ngram.to_xml_into(&mut output);
    if !self.features.is_empty() {
      output.push_str("    <features>\n");
      self.features.to_xml_into(&mut output, 0, "");
      output.push_str("    </features>\n");
    }
    output.push_str("</entry>");
    output
  }

  /// Turns the entry into a candidate, which is how dict entries travel through handlers
  pub fn into_candidate(self) -> Candidate {
    let mut candidate = Candidate::new(self.id_number, Vec::new());
    candidate.ngram = self.ngram;
    candidate.features = self.features;
    candidate
  }
}

impl<'a> From<&'a Candidate> for Entry {
  fn from(candidate: &'a Candidate) -> Entry {
    Entry {
      id_number: candidate.id_number,
      ngram: candidate.ngram.clone(),
      features: candidate.features.clone(),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;

  #[test]
  fn entries_print_as_entry_elements() {
    let entry = Entry::new(7, Ngram::new(vec![Word::from_attrs(None, Some("x"), None, None)]));
    assert_eq!(entry.to_xml(), "<entry entryid=\"7\"><w lemma=\"x\" /> </entry>");
    let back = Entry::from(&entry.clone().into_candidate());
    assert_eq!(back.id_number, 7);
    assert_eq!(back.ngram, entry.ngram);
  }
}
