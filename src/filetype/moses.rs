//! Moses factored format: `surface|lemma|pos|syn` tokens separated by spaces, one sentence per line
use log::warn;
use std::io::Write;

use super::common::{parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::taggedplaincorpus::{annotate_tagged, split_tagged};
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Meta, Sentence, SentenceFactory, Word, WordAttr};
use crate::error::Result;

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("|", "${pipe}"),
  ("#", "${hash}"),
  (" ", "${space}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
];

/// Moses description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "Moses",
  description: "Moses factored format (word=f1|f2|f3|f4|f5)",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

/// Every token of the first non-comment line has exactly three pipes
fn check(header: &[u8], strict: bool) -> bool {
  for line in header.split(|&b| b == b'\n') {
    if !line.starts_with(b"#") {
      return line
        .split(|&b| b == b' ')
        .filter(|w| !w.is_empty())
        .all(|w| w.iter().filter(|&&b| b == b'|').count() == 3);
    }
  }
  !strict
}

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(MosesParser {
    sentences: SentenceFactory::new(),
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(MosesPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
  }))
}

struct MosesParser {
  sentences: SentenceFactory,
}

impl LineParser for MosesParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    let mut words = Vec::new();
    let mut ids = Vec::new();
    for (i, (token, token_ids)) in split_tagged(line).into_iter().enumerate() {
      let parts: Vec<Option<String>> = token
        .split('|')
        .map(|part| match part {
          "" => None,
          part => Some(unescape(ESCAPE_PAIRS, part)),
        })
        .collect();
      if parts.len() != 4 {
        warn!(
          "Ignoring bad token (line {}, token {})",
          ctx.info.linenum.unwrap_or(0),
          i + 1
        );
        continue;
      }
      let mut word = Word::new();
      for (&attr, value) in WordAttr::ALL.iter().zip(parts) {
        word.set(attr, value);
      }
      word.validate()?;
      words.push(word);
      ids.push(token_ids);
    }
    let mut sentence = self.sentences.make(words, None);
    annotate_tagged(&mut sentence, &ids)?;
    ctx.emit(Entity::Sentence(sentence))
  }
}

impl Parser for MosesParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct MosesPrinter {
  core: PrinterCore,
}

impl MosesPrinter {
  fn word_to_moses(&self, word: &Word) -> String {
    WordAttr::ALL
      .iter()
      .map(|&attr| word.get(attr).map(|v| self.core.escape(v)).unwrap_or_default())
      .collect::<Vec<_>>()
      .join("|")
  }
}

impl InputHandler for MosesPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    let tokens = sentence.words.iter().map(|w| self.word_to_moses(w)).collect();
    let line = sentence.add_mwe_tags(tokens).join(" ") + "\n";
    self.core.add_string(&line)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tokens_need_three_pipes() {
    assert!(check(b"the|the|DT|det cat|cat|NN|root\n", true));
    assert!(!check(b"the|the|DT cat\n", true));
    assert!(check(b"# MWETOOLKIT: filetype=\"Moses\"\n|||\n", true));
  }

  #[test]
  fn words_print_as_factors() {
    let printer = MosesPrinter {
      core: PrinterCore::new(&INFO, Category::Corpus, Box::new(Vec::new())).unwrap(),
    };
    let word = Word::from_attrs(Some("a|b"), None, Some("NN"), None);
    assert_eq!(printer.word_to_moses(&word), "a${pipe}b||NN|");
  }
}
