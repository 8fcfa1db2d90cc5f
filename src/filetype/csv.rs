//! Tab-separated candidate tables, meant for spreadsheets
use std::io::Write;

use super::common::PrinterCore;
use super::handler::InputHandler;
use super::{Category, FiletypeInfo, ParseInfo};
use crate::base::{Candidate, Meta, Word};
use crate::error::Result;

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("/", "${slash}"),
  (" ", "${space}"),
  (";", "${semicolon}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
  ("#", "${hash}"),
];

const SEPARATOR: &str = "\t";

/// CSV description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "CSV",
  description: "Tab-separated CSV filetype format, one field per column",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: None,
  printer: Some(new_printer),
  input_categories: &[],
  output_categories: &[Category::Candidates],
};

fn check(_header: &[u8], strict: bool) -> bool { !strict }

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(CsvPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
    corpora: Vec::new(),
    tpclasses: Vec::new(),
    feats: Vec::new(),
  }))
}

/// Columns are fixed by the header; every row follows the same order
struct CsvPrinter {
  core: PrinterCore,
  corpora: Vec<String>,
  tpclasses: Vec<String>,
  feats: Vec<String>,
}

impl CsvPrinter {
  fn escaped(&self, value: Option<&str>) -> String { value.map(|v| self.core.escape(v)).unwrap_or_default() }

  /// Lemma, or surface when the lemma is a wildcard
  fn base_form(&self, word: &Word) -> String { self.escaped(word.lemma_or_surface()) }
}

impl InputHandler for CsvPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, meta: Meta, _info: &ParseInfo) -> Result<()> {
    self.corpora = meta.corpus_sizes.names().map(str::to_string).collect();
    self.tpclasses = meta.meta_tpclasses.iter().map(|f| f.name.clone()).collect();
    self.feats = meta.meta_feats.iter().map(|f| f.name.clone()).collect();
    let mut headers: Vec<String> = vec!["id".into(), "ngram".into(), "pos".into()];
    headers.extend(self.corpora.iter().map(|n| self.core.escape(n)));
    headers.push("occurs".into());
    headers.push("sources".into());
    headers.extend(self.tpclasses.iter().map(|n| self.core.escape(n)));
    headers.extend(self.feats.iter().map(|n| self.core.escape(n)));
    let line = headers.join(SEPARATOR) + "\n";
    self.core.add_string(&line)
  }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    let mut values = vec![candidate.id_number.to_string()];
    let ngram: Vec<String> = candidate.words().iter().map(|w| self.base_form(w)).collect();
    values.push(ngram.join(" "));
    let pos: Vec<String> = candidate.words().iter().map(|w| self.escaped(w.pos.as_deref())).collect();
    values.push(pos.join(" "));
    for corpus in &self.corpora {
      values.push(candidate.ngram.get_freq_value(corpus).to_string());
    }
    let occurs: Vec<String> = candidate
      .occurs
      .iter()
      .map(|o| o.words.iter().map(|w| self.escaped(w.surface.as_deref())).collect::<Vec<_>>().join(" "))
      .collect();
    values.push(occurs.join(";"));
    let sources: Vec<&str> = candidate
      .occurs
      .iter()
      .flat_map(|o| o.sources.iter().map(String::as_str))
      .collect();
    values.push(sources.join(";"));
    for name in &self.tpclasses {
      values.push(candidate.tpclasses.get(name).cloned().unwrap_or_default());
    }
    for name in &self.feats {
      values.push(candidate.features.get(name).map(|v| v.to_string()).unwrap_or_default());
    }
    let line = values.join(SEPARATOR) + "\n";
    self.core.add_string(&line)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Ngram;
  use crate::filetype::SharedBuffer;

  #[test]
  fn rows_match_header_columns() {
    let buffer = SharedBuffer::new();
    let mut printer = new_printer(Category::Candidates, buffer.boxed()).unwrap();
    let info = ParseInfo::detached("XML", Category::Candidates);
    let mut meta = Meta::new();
    meta.add_corpus_size("bnc", 100);
    meta.add_meta_tpclass("gold", "{True,False}");
    meta.add_meta_feat("pmi", "real");
    printer.handle_meta(meta, &info).unwrap();

    let mut cand = Candidate::new(
      3,
      vec![
        Word::from_attrs(Some("Cats"), Some("cat"), Some("N"), None),
        Word::from_attrs(Some("ran"), None, Some("V"), None),
      ],
    );
    cand.ngram.add_frequency("bnc", 4);
    let mut occur = Ngram::new(cand.words().to_vec());
    occur.sources.push("1:1,2".to_string());
    occur.sources.push("5:3,4".to_string());
    cand.add_occur(occur);
    cand.tpclasses.add("gold", "True".to_string());
    cand.add_feat("pmi", 1.5);
    printer.handle_candidate(cand, &info).unwrap();

    let contents = buffer.contents();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines[0], "id\tngram\tpos\tbnc\toccurs\tsources\tgold\tpmi");
    assert_eq!(lines[1], "3\tcat ran\tN V\t4\tCats ran\t1:1,2;5:3,4\tTrue\t1.5");
  }
}
