//! TreeTagger output: `surface\tpos\tlemma` per line, `</s>` between sentences
use log::warn;
use std::io::Write;

use super::common::{parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Meta, Sentence, SentenceFactory, Word, WordAttr};
use crate::error::Result;

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("|", "${pipe}"),
  ("#", "${hash}"),
  ("<", "${lt}"),
  (">", "${gt}"),
  (" ", "${space}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
];

const COLUMNS: [WordAttr; 3] = [WordAttr::Surface, WordAttr::Pos, WordAttr::Lemma];
const UNKNOWN: &str = "<unknown>";
const SENTENCE_END: &str = "</s>";

/// TreeTagger description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "TreeTagger",
  description: "3-field tab-separated format output by TreeTagger",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

fn check(header: &[u8], strict: bool) -> bool {
  for line in header.split(|&b| b == b'\n') {
    if !line.is_empty() && !line.starts_with(b"#") {
      return line.split(|&b| b == b'\t').count() == 3;
    }
  }
  !strict
}

fn new_parser(options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(TreeTaggerParser {
    sentences: SentenceFactory::new(),
    sent_split: options.sent_split.clone(),
    next_mwe_id: 0,
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(TreeTaggerPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
    sentence_count: 0,
  }))
}

struct TreeTaggerParser {
  sentences: SentenceFactory,
  sent_split: Option<String>,
  next_mwe_id: u64,
}

fn field(value: &str) -> Option<String> {
  match value {
    UNKNOWN => None,
    value => Some(unescape(ESCAPE_PAIRS, value)),
  }
}

impl LineParser for TreeTaggerParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    if line == SENTENCE_END {
      return ctx.flush_partial();
    }
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() != 3 {
      warn!(
        "Ignoring line {} (it has {} entries)",
        ctx.info.linenum.unwrap_or(0),
        fields.len()
      );
      return Ok(());
    }
    if ctx.partial_sentence().is_none() {
      let sentence = self.sentences.make(Vec::new(), None);
      ctx.new_partial(Entity::Sentence(sentence))?;
    }
    let columns: Vec<Vec<&str>> = fields.iter().map(|f| f.split(' ').collect()).collect();
    let count = columns[0].len();
    let mut ends_sentence = false;
    let mut indexes = Vec::new();
    if let Some(sentence) = ctx.partial_sentence() {
      for sub in 0..count {
        let get = |column: usize| columns[column].get(sub).cloned().and_then(field);
        let word = Word {
          surface: get(0),
          pos: get(1),
          lemma: get(2),
          ..Word::default()
        };
        word.validate()?;
        if word.pos.is_some() && word.pos == self.sent_split {
          ends_sentence = true;
        }
        indexes.push(sentence.len());
        sentence.words.push(word);
      }
      if indexes.len() > 1 {
        self.next_mwe_id += 1;
        sentence.annotate_span(self.next_mwe_id, indexes)?;
      }
    }
    if ends_sentence {
      ctx.flush_partial()?;
    }
    Ok(())
  }
}

impl Parser for TreeTaggerParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct TreeTaggerPrinter {
  core: PrinterCore,
  sentence_count: usize,
}

impl TreeTaggerPrinter {
  fn escape(&self, value: Option<&str>) -> String {
    match value {
      Some(value) => self.core.escape(value),
      None => UNKNOWN.to_string(),
    }
  }
}

impl InputHandler for TreeTaggerPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    if self.sentence_count != 0 {
      self.core.add_string("</s>\n")?;
    }
    self.sentence_count += 1;
    let mut output = String::new();
    for group in sentence.xwe_indexes() {
      let columns: Vec<String> = COLUMNS
        .iter()
        .map(|&attr| {
          group
            .iter()
            .map(|&i| self.escape(sentence.words[i].get(attr)))
            .collect::<Vec<_>>()
            .join(" ")
        })
        .collect();
      output.push_str(&columns.join("\t"));
      output.push('\n');
    }
    self.core.add_string(&output)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn three_columns_are_expected() {
    assert!(check(b"The\tDT\tthe\ncat\tNN\tcat\n", true));
    assert!(!check(b"The DT the\n", true));
  }
}
