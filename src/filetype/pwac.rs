//! pWaC: CONLL-like columns inside `<text>` and `<s>` tags
use std::io::Write;

use super::common::{parse_text, LineParser, ParsingContext, PrinterCore};
use super::conll::{ColumnParser, ColumnPrinter};
use super::handler::InputHandler;
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Meta, Sentence};
use crate::error::Result;

const COLUMNS: &[&str] = &["FORM", "LEMMA", "CPOSTAG", "ID", "HEAD", "DEPREL"];

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("_", "${underscore}"),
  ("<", "${lt}"),
  (">", "${gt}"),
  (" ", "${space}"),
  ("#", "${hash}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
];

/// pWaC description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "pWaC",
  description: "Wac parsed format",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

/// The `<text id` tag is mandatory, so the check is always strict
fn check(header: &[u8], _strict: bool) -> bool { header.starts_with(b"<text id") }

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> {
  Box::new(PWaCParser {
    columns: ColumnParser::new(&INFO, COLUMNS),
  })
}

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  let core = PrinterCore::new(&INFO, category, output)?;
  Ok(Box::new(PWaCPrinter {
    columns: ColumnPrinter::new(core, COLUMNS).between_sentences(""),
  }))
}

struct PWaCParser {
  columns: ColumnParser,
}

impl LineParser for PWaCParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    if line.is_empty() || (line.starts_with('<') && line.ends_with('>')) {
      // <text>, <s> and their closing tags carry nothing; sentences start at ID 1
      return Ok(());
    }
    self.columns.parse_columns(line, ctx)
  }
}

impl Parser for PWaCParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

struct PWaCPrinter {
  columns: ColumnPrinter,
}

impl PWaCPrinter {
  fn core(&mut self) -> &mut PrinterCore { self.columns.core() }
}

impl InputHandler for PWaCPrinter {
  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core().add_string("<text id=\"mwetoolkit\">\n") }

  fn after_file(&mut self, _info: &ParseInfo) -> Result<()> {
    self.core().add_string("</text>\n")?;
    self.core().flush()
  }

  fn flush(&mut self) -> Result<()> { self.core().flush() }

  fn handle_comment(&mut self, comment: &str, _info: &ParseInfo) -> Result<()> { self.core().write_comment(comment) }

  fn handle_directive(&mut self, directive: &super::Directive, _info: &ParseInfo) -> Result<()> {
    self.core().handle_directive(directive)
  }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.core().add_string("<s>\n")?;
    self.columns.write_sentence(&sentence)?;
    self.core().add_string("</s>\n")?;
    self.core().flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn only_text_headers_match() {
    assert!(check(b"<text id=\"x\">\n<s>\n", true));
    assert!(!check(b"the|the|DT|det\n", false));
  }
}
