//! TaggedPlainCorpus: one sentence per line, MWE parts wrapped in `<mwepart id="..">` tags
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::io::Write;

use super::common::{parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Meta, Sentence, SentenceFactory, Word};
use crate::error::Result;

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("#", "${hash}"),
  ("<", "${lt}"),
  (">", "${gt}"),
  (" ", "${space}"),
  ("\n", "${newline}"),
];

/// TaggedPlainCorpus description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "TaggedPlainCorpus",
  description: "One sentence per line with <mwepart>tags</mwepart>",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

lazy_static! {
  static ref ENTRY: Regex =
    Regex::new(r#"(?P<word>[^<> ]+)|<mwepart +id="(?P<ids>[0-9,]*)">(?P<c_word>[^<> ]+)</ *mwepart *>"#).unwrap();
}

fn check(header: &[u8], strict: bool) -> bool { !strict || String::from_utf8_lossy(header).contains("<mwepart") }

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(TaggedParser {
    sentences: SentenceFactory::new(),
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(TaggedPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
  }))
}

/// Splits a line into tokens, each with the MWE ids of its `<mwepart>` wrapper
pub fn split_tagged(line: &str) -> Vec<(String, Vec<u64>)> {
  ENTRY
    .captures_iter(line)
    .filter_map(|caps| {
      if let Some(word) = caps.name("word") {
        return Some((word.as_str().to_string(), Vec::new()));
      }
      let word = caps.name("c_word")?.as_str().to_string();
      let ids = caps
        .name("ids")
        .map(|ids| ids.as_str().split(',').filter_map(|id| id.parse().ok()).collect())
        .unwrap_or_default();
      Some((word, ids))
    })
    .collect()
}

/// Annotates one MWE per distinct id, in increasing id order
pub fn annotate_tagged(sentence: &mut Sentence, ids: &[Vec<u64>]) -> Result<()> {
  let mut spans: BTreeMap<u64, Vec<usize>> = BTreeMap::new();
  for (index, word_ids) in ids.iter().enumerate() {
    for &id in word_ids {
      spans.entry(id).or_insert_with(Vec::new).push(index);
    }
  }
  for (id, indexes) in spans {
    sentence.annotate_span(id, indexes)?;
  }
  Ok(())
}

struct TaggedParser {
  sentences: SentenceFactory,
}

impl LineParser for TaggedParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    let tokens = split_tagged(line);
    let words = tokens
      .iter()
      .map(|&(ref token, _)| {
        let word = Word {
          surface: Some(unescape(ESCAPE_PAIRS, token)),
          ..Word::default()
        };
        word.validate().map(|()| word)
      })
      .collect::<Result<Vec<Word>>>()?;
    let mut sentence = self.sentences.make(words, None);
    let ids: Vec<Vec<u64>> = tokens.into_iter().map(|(_, ids)| ids).collect();
    annotate_tagged(&mut sentence, &ids)?;
    ctx.emit(Entity::Sentence(sentence))
  }
}

impl Parser for TaggedParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct TaggedPrinter {
  core: PrinterCore,
}

impl InputHandler for TaggedPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    let surfaces = sentence
      .words
      .iter()
      .map(|w| self.core.escape(w.surface.as_ref().map(String::as_str).unwrap_or("<?>")))
      .collect();
    let line = sentence.add_mwe_tags(surfaces).join(" ") + "\n";
    self.core.add_string(&line)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn tags_are_split_from_words() {
    let tokens = split_tagged("he <mwepart id=\"1\">kicked</mwepart> the <mwepart id=\"1,2\">bucket</mwepart>");
    assert_eq!(
      tokens,
      vec![
        ("he".to_string(), vec![]),
        ("kicked".to_string(), vec![1]),
        ("the".to_string(), vec![]),
        ("bucket".to_string(), vec![1, 2]),
      ]
    );
  }
}
