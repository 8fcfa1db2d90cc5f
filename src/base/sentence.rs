//! Corpus sentences and their annotated MWE occurrences
use std::rc::Rc;

use super::candidate::Candidate;
use super::mweoccur::MWEOccurrence;
use super::ngram::Ngram;
use super::word::Word;
use crate::error::Result;

/// A sentence: words, a unique id, and the MWEs annotated in it
#[derive(Debug, Clone)]
pub struct Sentence {
  /// unique id, starting at 1
  pub id_number: u64,
  /// the words, in text order
  pub words: Vec<Word>,
  /// MWEs annotated in this sentence
  pub mweoccurs: Vec<MWEOccurrence>,
}

impl Sentence {
  /// A sentence without MWE annotation
  pub fn new(id_number: u64, words: Vec<Word>) -> Self {
    Sentence {
      id_number,
      words,
      mweoccurs: Vec::new(),
    }
  }

  /// Number of words
  pub fn len(&self) -> usize { self.words.len() }

  /// Whether there are no words
  pub fn is_empty(&self) -> bool { self.words.is_empty() }

  /// Annotates an occurrence of `candidate` at the given 0-based indexes
  pub fn add_mwe_occurrence(&mut self, candidate: Rc<Candidate>, indexes: Vec<usize>) -> Result<()> {
    let occurrence = MWEOccurrence::new(self, candidate, indexes)?;
    self.mweoccurs.push(occurrence);
    Ok(())
  }

  /// Annotates an occurrence at `indexes`, creating a candidate from the words found there
  pub fn annotate_span(&mut self, candidate_id: u64, indexes: Vec<usize>) -> Result<()> {
    let words = indexes.iter().filter_map(|&i| self.words.get(i).cloned()).collect();
    self.add_mwe_occurrence(Rc::new(Candidate::new(candidate_id, words)), indexes)
  }

  /// The words at `indexes`, as an ngram
  pub fn sub_ngram(&self, indexes: &[usize]) -> Ngram {
    Ngram::new(indexes.iter().filter_map(|&i| self.words.get(i).cloned()).collect())
  }

  /// Groups word positions into single-word and multi-word expressions.
  /// Every MWE is merged into the group of its first word.
  pub fn xwe_indexes(&self) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = (0..self.words.len()).map(|i| vec![i]).collect();
    for mweo in &self.mweoccurs {
      let first = match mweo.indexes.iter().min() {
        Some(&first) => first,
        None => continue,
      };
      for &i in &mweo.indexes {
        if i != first {
          let moved = ::std::mem::replace(&mut groups[i], Vec::new());
          groups[first].extend(moved);
        }
      }
    }
    groups.into_iter().filter(|g| !g.is_empty()).collect()
  }

  /// For each word, the ids of the candidates annotated on it
  pub fn mwe_ids_per_word(&self) -> Vec<Vec<u64>> {
    let mut ids = vec![Vec::new(); self.words.len()];
    for mweo in &self.mweoccurs {
      for &i in &mweo.indexes {
        if let Some(slot) = ids.get_mut(i) {
          slot.push(mweo.candidate.id_number);
        }
      }
    }
    ids
  }

  /// Wraps the tokens that are MWE parts in `<mwepart id="..">` tags
  pub fn add_mwe_tags(&self, tokens: Vec<String>) -> Vec<String> {
    tokens
      .into_iter()
      .zip(self.mwe_ids_per_word())
      .map(|(token, ids)| {
        if ids.is_empty() {
          token
        } else {
          let ids: Vec<String> = ids.iter().map(u64::to_string).collect();
          format!("<mwepart id=\"{}\">{}</mwepart>", ids.join(","), token)
        }
      })
      .collect()
  }

  /// Surfaces joined by spaces, wildcards shown as `<?>`
  pub fn to_surface_string(&self) -> String {
    self
      .words
      .iter()
      .map(|w| w.surface.as_ref().map(String::as_str).unwrap_or("<?>"))
      .collect::<Vec<_>>()
      .join(" ")
  }

  /// The `<s>` element
  pub fn to_xml(&self) -> String {
    let mut output = format!("<s s_id=\"{}\">", self.id_number);
    for word in &self.words {
      word.to_xml_into(&mut output);
      output.push(' ');
    }
    if !self.mweoccurs.is_empty() {
      output.push_str("\n<mweoccurs>\n");
      for mweoccur in &self.mweoccurs {
        output.push_str("  ");
        output.push_str(&mweoccur.to_xml());
        output.push('\n');
      }
      output.push_str("</mweoccurs>\n");
    }
    output.push_str("</s>");
    output
  }
}

/// Hands out sentences with consecutive ids, starting at 1
#[derive(Debug, Default)]
pub struct SentenceFactory {
  prev_id: u64,
}

impl SentenceFactory {
  /// A fresh factory
  pub fn new() -> Self { SentenceFactory::default() }

  /// Creates a sentence with the next id, or with `id_number`,
  /// which then becomes the base for the following ones
  pub fn make(&mut self, words: Vec<Word>, id_number: Option<u64>) -> Sentence {
    self.prev_id = match id_number {
      Some(id) => id,
      None => self.prev_id + 1,
    };
    Sentence::new(self.prev_id, words)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sentence(surfaces: &[&str]) -> Sentence {
    let words = surfaces
      .iter()
      .map(|s| Word::from_attrs(Some(*s), None, None, None))
      .collect();
    SentenceFactory::new().make(words, None)
  }

  #[test]
  fn xwe_groups() {
    let mut s = sentence(&["he", "kicked", "the", "old", "bucket"]);
    s.annotate_span(1, vec![1, 2, 4]).unwrap();
    assert_eq!(s.xwe_indexes(), vec![vec![0], vec![1, 2, 4], vec![3]]);
  }

  #[test]
  fn xml_layout() {
    let mut s = sentence(&["a", "b"]);
    assert_eq!(s.to_xml(), "<s s_id=\"1\"><w surface=\"a\" /> <w surface=\"b\" /> </s>");
    s.annotate_span(3, vec![0, 1]).unwrap();
    assert_eq!(
      s.to_xml(),
      "<s s_id=\"1\"><w surface=\"a\" /> <w surface=\"b\" /> \n<mweoccurs>\n  \
       <mweoccur candid=\"3\"><mwepart index=\"1\"/><mwepart index=\"2\"/></mweoccur>\n</mweoccurs>\n</s>"
    );
  }

  #[test]
  fn factory_counts_from_one() {
    let mut factory = SentenceFactory::new();
    assert_eq!(factory.make(Vec::new(), None).id_number, 1);
    assert_eq!(factory.make(Vec::new(), None).id_number, 2);
  }
}
