//! Occurrences of MWE candidates inside sentences
use std::rc::Rc;

use super::candidate::Candidate;
use super::sentence::Sentence;
use crate::error::{Error, Result};

/// One appearance of `candidate` in a sentence.
///
/// `indexes` are 0-based positions in the sentence, one per candidate word,
/// in candidate order. A permutation or gaps are allowed, e.g. for
/// "kick the bucket" in "The old man kicked the proverbial bucket"
/// the indexes are `[3, 4, 6]`.
#[derive(Debug, Clone)]
pub struct MWEOccurrence {
  /// the referenced candidate, shared between occurrences
  pub candidate: Rc<Candidate>,
  /// 0-based sentence positions
  pub indexes: Vec<usize>,
}

impl MWEOccurrence {
  /// Checks that every index falls inside `sentence` and that there is one per candidate word
  pub fn new(sentence: &Sentence, candidate: Rc<Candidate>, indexes: Vec<usize>) -> Result<Self> {
    for &index in &indexes {
      if index >= sentence.len() {
        return Err(Error::BadIndex {
          candidate: candidate.id_number,
          sentence: sentence.id_number,
          index: index + 1,
        });
      }
    }
    if indexes.len() != candidate.len() {
      return Err(Error::Other(format!(
        "Candidate {} has {} words but {} indexes in sentence {}",
        candidate.id_number,
        candidate.len(),
        indexes.len(),
        sentence.id_number
      )));
    }
    Ok(MWEOccurrence { candidate, indexes })
  }

  /// The `<mweoccur>` element, with 1-based indexes
  pub fn to_xml(&self) -> String {
    let mut output = format!("<mweoccur candid=\"{}\">", self.candidate.id_number);
    for index in &self.indexes {
      output.push_str(&format!("<mwepart index=\"{}\"/>", index + 1));
    }
    output.push_str("</mweoccur>");
    output
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;

  fn sentence() -> Sentence {
    let words = ["the", "cat", "sat"]
      .iter()
      .map(|s| Word::from_attrs(Some(*s), None, None, None))
      .collect();
    Sentence::new(1, words)
  }

  #[test]
  fn out_of_range_indexes_are_refused() {
    let s = sentence();
    let cand = Rc::new(Candidate::new(4, s.words[1..3].to_vec()));
    assert!(MWEOccurrence::new(&s, cand.clone(), vec![1, 2]).is_ok());
    match MWEOccurrence::new(&s, cand.clone(), vec![2, 3]) {
      Err(Error::BadIndex { index, .. }) => assert_eq!(index, 4),
      other => panic!("expected BadIndex, got {:?}", other),
    }
    assert!(MWEOccurrence::new(&s, cand, vec![1]).is_err());
  }

  #[test]
  fn xml_is_one_based() {
    let s = sentence();
    let cand = Rc::new(Candidate::new(4, s.words[0..2].to_vec()));
    let occur = MWEOccurrence::new(&s, cand, vec![0, 1]).unwrap();
    assert_eq!(
      occur.to_xml(),
      "<mweoccur candid=\"4\"><mwepart index=\"1\"/><mwepart index=\"2\"/></mweoccur>"
    );
  }
}
