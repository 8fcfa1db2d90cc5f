//! PlainCorpus: one sentence per line, words separated by spaces and MWE parts joined by `_`
use std::io::Write;

use super::common::{parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{CandidateFactory, Meta, Sentence, SentenceFactory, Word};
use crate::error::Result;

/// Escapes shared with PlainCandidates
pub const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  (" ", "${space}"),
  ("\t", "${tab}"),
  ("_", "${underscore}"),
  ("#", "${hash}"),
  ("\n", "${newline}"),
];

/// Printed for a word without surface
pub const WILDCARD_TOKEN: &str = "<?>";

/// PlainCorpus description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "PlainCorpus",
  description: "One sentence per line, with multi_word_expressions",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

fn check(_header: &[u8], strict: bool) -> bool { !strict }

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(PlainCorpusParser {
    sentences: SentenceFactory::new(),
    candidates: CandidateFactory::new(),
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(PlainCorpusPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
  }))
}

/// A word with only a surface, `<?>` being the wildcard
pub fn surface_word(token: &str) -> Result<Word> {
  let word = Word {
    surface: match token {
      WILDCARD_TOKEN => None,
      token => Some(unescape(ESCAPE_PAIRS, token)),
    },
    ..Word::default()
  };
  word.validate()?;
  Ok(word)
}

struct PlainCorpusParser {
  sentences: SentenceFactory,
  candidates: CandidateFactory,
}

impl LineParser for PlainCorpusParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    let mut sentence = self.sentences.make(Vec::new(), None);
    for mwe in line.split_whitespace() {
      let words = mwe.split('_').map(surface_word).collect::<Result<Vec<Word>>>()?;
      let start = sentence.len();
      sentence.words.extend(words.iter().cloned());
      if words.len() > 1 {
        let index = self.candidates.make_uniq(words, None);
        let id = self.candidates.get(index).map(|c| c.id_number).unwrap_or(0);
        sentence.annotate_span(id, (start..sentence.len()).collect())?;
      }
    }
    ctx.emit(Entity::Sentence(sentence))
  }
}

impl Parser for PlainCorpusParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct PlainCorpusPrinter {
  core: PrinterCore,
}

impl InputHandler for PlainCorpusPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    let ids = sentence.mwe_ids_per_word();
    let mut line = String::new();
    for (i, word) in sentence.words.iter().enumerate() {
      match word.surface {
        Some(ref surface) => line.push_str(&self.core.escape(surface)),
        None => line.push_str(WILDCARD_TOKEN),
      }
      if i + 1 < sentence.len() {
        let shared = ids[i].iter().any(|id| ids[i + 1].contains(id));
        line.push(if shared { '_' } else { ' ' });
      }
    }
    line.push('\n');
    self.core.add_string(&line)?;
    self.core.flush()
  }
}
