//! PlainCandidates: one candidate per line, lemmas joined by `_`
use std::io::Write;

use super::common::{parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::plaincorpus::{ESCAPE_PAIRS, WILDCARD_TOKEN};
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Candidate, CandidateFactory, Meta, Word};
use crate::error::Result;

/// PlainCandidates description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "PlainCandidates",
  description: "One multi_word_candidate per line",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Candidates],
  output_categories: &[Category::Candidates],
};

fn check(header: &[u8], strict: bool) -> bool {
  if !strict {
    return true;
  }
  let first = header.split(|&b| b == b'\n').next().unwrap_or(&[]);
  !first.contains(&b' ') && first.contains(&b'_')
}

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(PlainCandidatesParser {
    candidates: CandidateFactory::new(),
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(PlainCandidatesPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
  }))
}

struct PlainCandidatesParser {
  candidates: CandidateFactory,
}

impl LineParser for PlainCandidatesParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    if line.trim().is_empty() {
      return Ok(());
    }
    let words = line
      .trim()
      .split('_')
      .map(|lemma| {
        let word = Word {
          lemma: match lemma {
            WILDCARD_TOKEN => None,
            lemma => Some(unescape(ESCAPE_PAIRS, lemma)),
          },
          ..Word::default()
        };
        word.validate().map(|()| word)
      })
      .collect::<Result<Vec<Word>>>()?;
    let candidate = self.candidates.make(words, None);
    ctx.emit(Entity::Candidate(candidate))
  }
}

impl Parser for PlainCandidatesParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct PlainCandidatesPrinter {
  core: PrinterCore,
}

impl InputHandler for PlainCandidatesPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    let line = candidate
      .words()
      .iter()
      .map(|w| match w.lemma_or_surface() {
        Some(value) => self.core.escape(value),
        None => WILDCARD_TOKEN.to_string(),
      })
      .collect::<Vec<_>>()
      .join("_")
      + "\n";
    self.core.add_string(&line)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn strict_check_wants_underscores_without_spaces() {
    assert!(check(b"kick_the_bucket\n", true));
    assert!(!check(b"kick the bucket\n", true));
    assert!(check(b"kick the bucket\n", false));
  }
}
