//! CONLL-X: one word per line in ten tab-separated columns, a blank line between sentences.
//!
//! Multi-word tokens put several space-separated entries in each column.
//! The same column machinery reads pWaC, which only orders the columns differently.
use log::warn;

use super::common::{escape, parse_text, unescape, LineParser, ParsingContext, PrinterCore};
use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::base::{Meta, Sentence, SentenceFactory, Word};
use crate::error::Result;

/// Column names, in file order
pub const COLUMNS: &[&str] = &[
  "ID", "FORM", "LEMMA", "CPOSTAG", "POSTAG", "FEATS", "HEAD", "DEPREL", "PHEAD", "PDEPREL",
];

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("_", "${underscore}"),
  (" ", "${space}"),
  ("#", "${hash}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
];

/// CONLL description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "CONLL",
  description: "CONLL tab-separated 10-entries-per-word",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: Some(new_parser),
  printer: Some(new_printer),
  input_categories: &[Category::Corpus],
  output_categories: &[Category::Corpus],
};

/// The first non-comment line has exactly ten columns
fn check(header: &[u8], strict: bool) -> bool {
  for line in header.split(|&b| b == b'\n') {
    if !line.is_empty() && !line.starts_with(b"#") {
      return line.split(|&b| b == b'\t').count() == COLUMNS.len();
    }
  }
  !strict
}

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> { Box::new(ColumnParser::new(&INFO, COLUMNS)) }

fn new_printer(category: Category, output: Box<dyn std::io::Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(ColumnPrinter::new(PrinterCore::new(&INFO, category, output)?, COLUMNS)))
}

/// Reads one word per line from named columns
pub struct ColumnParser {
  filetype: &'static FiletypeInfo,
  columns: &'static [&'static str],
  sentences: SentenceFactory,
  ignoring_sentence: bool,
  next_mwe_id: u64,
}

impl ColumnParser {
  /// A parser for files laid out as `columns`
  pub fn new(filetype: &'static FiletypeInfo, columns: &'static [&'static str]) -> Self {
    ColumnParser {
      filetype,
      columns,
      sentences: SentenceFactory::new(),
      ignoring_sentence: false,
      next_mwe_id: 0,
    }
  }

  fn column(&self, name: &str) -> Option<usize> { self.columns.iter().position(|c| *c == name) }

  fn word(&self, fields: &[Option<String>]) -> Result<Word> {
    let get = |name: &str| -> Option<String> { self.column(name).and_then(|i| fields[i].clone()) };
    let (surface, lemma, pos) = (get("FORM"), get("LEMMA"), get("CPOSTAG"));
    let postag = get("POSTAG");
    if postag.is_some() && postag != pos {
      self.warn_unused("POSTAG != CPOSTAG");
    }
    for &(column, what) in &[("FEATS", "found FEATS"), ("PHEAD", "found PHEAD"), ("PDEPREL", "found PDEPREL")] {
      if get(column).is_some() {
        self.warn_unused(what);
      }
    }
    let syn = match get("HEAD") {
      Some(head) => Some(format!("{}:{}", get("DEPREL").unwrap_or_default(), head)),
      None => get("DEPREL"),
    };
    let word = Word {
      surface,
      lemma,
      pos,
      syn,
      ..Word::default()
    };
    word.validate()?;
    Ok(word)
  }

  fn warn_unused(&self, what: &str) {
    warn_once!("Unable to handle {} entry: {}.", self.filetype.ext, what);
  }

  /// Handles one line of columns
  pub fn parse_columns(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> {
    let data: Vec<Vec<&str>> = line.split('\t').map(|d| d.split(' ').collect()).collect();
    if data.len() <= 1 {
      return Ok(());
    }
    let id_column = self.column("ID").unwrap_or(0);
    let ids = data[id_column].clone();
    let mut indexes = Vec::new();
    for (sub, raw_id) in ids.iter().enumerate() {
      if data.len() != self.columns.len() {
        warn!(
          "Expected {} entries, got {} (at line {})",
          self.columns.len(),
          data.len(),
          ctx.info.linenum.unwrap_or(0)
        );
        self.ignoring_sentence = true;
        continue;
      }
      let id: usize = match raw_id.parse() {
        Ok(id) if id > 0 => id,
        _ => {
          warn!(
            "Bad word ID at field {}: {:?} (at line {})",
            id_column,
            raw_id,
            ctx.info.linenum.unwrap_or(0)
          );
          self.ignoring_sentence = true;
          continue;
        },
      };
      if id == 1 || ctx.partial_sentence().is_none() {
        let sentence = self.sentences.make(Vec::new(), None);
        ctx.new_partial(Entity::Sentence(sentence))?;
        self.ignoring_sentence = false;
      }
      if self.ignoring_sentence {
        continue;
      }
      let fields: Vec<Option<String>> = data
        .iter()
        .map(|column| match column.get(sub).cloned().unwrap_or("_") {
          "_" => None,
          value => Some(unescape(self.filetype.escape_pairs, value)),
        })
        .collect();
      let word = self.word(&fields)?;
      if let Some(sentence) = ctx.partial_sentence() {
        sentence.words.push(word);
      }
      indexes.push(id - 1);
    }
    if ids.len() > 1 && !self.ignoring_sentence {
      self.next_mwe_id += 1;
      let mwe_id = self.next_mwe_id;
      if let Some(sentence) = ctx.partial_sentence() {
        sentence.annotate_span(mwe_id, indexes)?;
      }
    }
    Ok(())
  }
}

impl LineParser for ColumnParser {
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()> { self.parse_columns(line, ctx) }
}

impl Parser for ColumnParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    parse_text(self, input, handler, info)
  }
}

/// Prints one word per line in named columns
pub struct ColumnPrinter {
  core: PrinterCore,
  columns: &'static [&'static str],
  sentence_count: usize,
  between_sentences: &'static str,
}

impl ColumnPrinter {
  /// A printer for `columns`, sentences separated by a blank line
  pub fn new(core: PrinterCore, columns: &'static [&'static str]) -> Self {
    ColumnPrinter {
      core,
      columns,
      sentence_count: 0,
      between_sentences: "\n",
    }
  }

  /// Separates sentences by `separator` instead
  pub fn between_sentences(mut self, separator: &'static str) -> Self {
    self.between_sentences = separator;
    self
  }

  /// Direct access to the output, for wrapping formats
  pub fn core(&mut self) -> &mut PrinterCore { &mut self.core }

  fn field(&self, name: &str, index: usize, word: &Word) -> Option<String> {
    let (deprel, head) = match word.syn {
      Some(ref syn) => {
        let mut parts = syn.splitn(2, ':');
        (parts.next().map(str::to_string), parts.next().map(str::to_string))
      },
      None => (None, None),
    };
    match name {
      "ID" => Some((index + 1).to_string()),
      "FORM" => word.surface.clone(),
      "LEMMA" => word.lemma.clone(),
      "CPOSTAG" | "POSTAG" => word.pos.clone(),
      "DEPREL" => deprel.filter(|d| !d.is_empty()),
      "HEAD" => head,
      _ => None,
    }
  }

  /// Writes `sentence`, one line per word or multi-word token
  pub fn write_sentence(&mut self, sentence: &Sentence) -> Result<()> {
    if self.sentence_count != 0 {
      self.core.add_string(self.between_sentences)?;
    }
    self.sentence_count += 1;
    for group in sentence.xwe_indexes() {
      let mut line = Vec::with_capacity(self.columns.len());
      for name in self.columns {
        let entries: Vec<String> = group
          .iter()
          .map(|&i| match self.field(name, i, &sentence.words[i]) {
            Some(value) => escape(self.core.filetype.escape_pairs, &value),
            None => "_".to_string(),
          })
          .collect();
        line.push(entries.join(" "));
      }
      let line = line.join("\t") + "\n";
      self.core.add_string(&line)?;
    }
    Ok(())
  }
}

impl InputHandler for ColumnPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.write_sentence(&sentence)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_needs_ten_columns() {
    assert!(check(b"# comment\n1\tthe\tthe\tDT\tDT\t_\t2\tdet\t_\t_\n", true));
    assert!(!check(b"1\tthe\tthe\tDT\n", false));
    assert!(!check(b"# only comments\n", true));
    assert!(check(b"# only comments\n", false));
  }

  #[test]
  fn syntax_is_split_into_head_and_relation() {
    let core = PrinterCore::new(&INFO, Category::Corpus, Box::new(Vec::new())).unwrap();
    let printer = ColumnPrinter::new(core, COLUMNS);
    let word = Word::from_attrs(Some("cat"), Some("cat"), Some("NN"), Some("root:0"));
    assert_eq!(printer.field("DEPREL", 1, &word), Some("root".to_string()));
    assert_eq!(printer.field("HEAD", 1, &word), Some("0".to_string()));
    assert_eq!(printer.field("ID", 1, &word), Some("2".to_string()));
    assert_eq!(printer.field("FEATS", 1, &word), None);
  }
}
