//! Format conversion stage, with optional normalization of the words on the way
use crate::base::{Candidate, Ngram, Sentence, Word};
use crate::error::Result;
use crate::filetype::{InputHandler, ParseInfo};

/// Options of `mwe-transform`
#[derive(Debug, Clone, Copy, Default)]
pub struct TransformConfig {
  /// lowercase surface forms and lemmas
  pub lowercase: bool,
}

fn lowercase_word(word: &mut Word) {
  if let Some(surface) = word.surface.as_mut() {
    *surface = surface.to_lowercase();
  }
  if let Some(lemma) = word.lemma.as_mut() {
    *lemma = lemma.to_lowercase();
  }
}

fn lowercase_ngram(ngram: &mut Ngram) { ngram.words.iter_mut().for_each(lowercase_word); }

/// Rewrites sentences and candidates according to a `TransformConfig`, forwarding everything
pub struct TransformHandler {
  config: TransformConfig,
  chain: Box<dyn InputHandler>,
}

impl TransformHandler {
  /// Stage in front of `chain`
  pub fn new(config: TransformConfig, chain: Box<dyn InputHandler>) -> Self { TransformHandler { config, chain } }
}

impl InputHandler for TransformHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  fn handle_sentence(&mut self, mut sentence: Sentence, info: &ParseInfo) -> Result<()> {
    if self.config.lowercase {
      sentence.words.iter_mut().for_each(lowercase_word);
    }
    self.chain.handle_sentence(sentence, info)
  }

  fn handle_candidate(&mut self, mut candidate: Candidate, info: &ParseInfo) -> Result<()> {
    if self.config.lowercase {
      lowercase_ngram(&mut candidate.ngram);
      candidate.occurs.iter_mut().for_each(lowercase_ngram);
    }
    self.chain.handle_candidate(candidate, info)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::filetype::{Category, EntityCollectorHandler};
  use std::cell::RefCell;
  use std::rc::Rc;

  struct Tap(Rc<RefCell<EntityCollectorHandler>>);

  impl InputHandler for Tap {
    fn fallback(&mut self, entity: crate::filetype::Entity, info: &ParseInfo) -> Result<()> {
      self.0.borrow_mut().fallback(entity, info)
    }
  }

  #[test]
  fn lowercases_surface_and_lemma_only() {
    let collected = Rc::new(RefCell::new(EntityCollectorHandler::new()));
    let config = TransformConfig { lowercase: true };
    let mut handler = TransformHandler::new(config, Box::new(Tap(Rc::clone(&collected))));
    let info = ParseInfo::detached("XML", Category::Corpus);
    let words = vec![Word::from_attrs(Some("The"), Some("The"), Some("DT"), None)];
    handler.handle_sentence(Sentence::new(1, words), &info).unwrap();
    let collected = collected.borrow();
    let sentences = collected.sentences();
    let word = &sentences[0].words[0];
    assert_eq!(word.surface.as_deref(), Some("the"));
    assert_eq!(word.lemma.as_deref(), Some("the"));
    assert_eq!(word.pos.as_deref(), Some("DT"));
  }

  #[test]
  fn untouched_without_options() {
    let collected = Rc::new(RefCell::new(EntityCollectorHandler::new()));
    let mut handler = TransformHandler::new(TransformConfig::default(), Box::new(Tap(Rc::clone(&collected))));
    let info = ParseInfo::detached("XML", Category::Candidates);
    let words = vec![Word::from_attrs(Some("Big"), None, None, None)];
    handler.handle_candidate(Candidate::new(1, words), &info).unwrap();
    let collected = collected.borrow();
    let candidates = collected.candidates();
    assert_eq!(candidates[0].words()[0].surface.as_deref(), Some("Big"));
  }
}
