//! UCS data sets: one line of counts per bigram candidate
use log::warn;
use std::io::Write;

use super::common::PrinterCore;
use super::handler::InputHandler;
use super::{Category, FiletypeInfo, ParseInfo};
use crate::base::{Candidate, FeatureSet, Meta};
use crate::error::Result;

const ESCAPE_PAIRS: &[(&str, &str)] = &[
  ("$", "${dollar}"),
  ("/", "${slash}"),
  (" ", "${space}"),
  ("\t", "${tab}"),
  ("\n", "${newline}"),
  ("#", "${hash}"),
];

/// UCS description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "UCS",
  description: "UCS 2-gram filetype format",
  comment_prefix: "#",
  escape_pairs: ESCAPE_PAIRS,
  checker: check,
  parser: None,
  printer: Some(new_printer),
  input_categories: &[],
  output_categories: &[Category::Candidates],
};

fn check(_header: &[u8], _strict: bool) -> bool { false }

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(UcsPrinter::new(PrinterCore::new(&INFO, category, output)?, None)))
}

/// Prints `id l1 l2 f f1 f2 N`, with counts taken from `freq_source` (the first corpus if unset)
struct UcsPrinter {
  core: PrinterCore,
  freq_source: Option<String>,
  corpus_size: i64,
}

impl UcsPrinter {
  fn new(core: PrinterCore, freq_source: Option<String>) -> Self {
    UcsPrinter {
      core,
      freq_source,
      corpus_size: 0,
    }
  }

  fn freq_value(&self, freqs: &FeatureSet<i64>) -> Option<i64> {
    freqs
      .iter()
      .find(|&(name, _)| self.freq_source.as_ref().map_or(true, |source| source == name))
      .map(|(_, &value)| value)
  }
}

impl InputHandler for UcsPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  fn handle_meta(&mut self, meta: Meta, _info: &ParseInfo) -> Result<()> {
    self.corpus_size = match self.freq_value(&meta.corpus_sizes) {
      Some(size) => size,
      None => {
        if !meta.is_dummy() {
          warn!("Frequency source '{}' not found!", self.freq_source.as_deref().unwrap_or(""));
        }
        0
      },
    };
    self.core.add_string("id\tl1\tl2\tf\tf1\tf2\tN\n")
  }

  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    if candidate.len() != 2 {
      warn!("Ignoring entity {}, of length {}!=2", candidate.id_number, candidate.len());
      return Ok(());
    }
    let mut fields = vec![candidate.id_number.to_string()];
    for word in candidate.words() {
      fields.push(word.lemma_or_surface().map(|v| self.core.escape(v)).unwrap_or_default());
    }
    let freq = self.freq_value(&candidate.ngram.freqs).unwrap_or(0);
    fields.push(format!("{:.6}", freq as f64));
    for word in candidate.words() {
      match self.freq_value(&word.freqs) {
        Some(value) => fields.push(format!("{:.6}", value as f64)),
        None => {
          warn!("Word frequency information missing for entity {}", candidate.id_number);
          fields.push("0".to_string());
        },
      }
    }
    fields.push(self.corpus_size.to_string());
    let line = fields.join("\t") + "\n";
    self.core.add_string(&line)?;
    self.core.flush()
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::base::Word;
  use crate::filetype::SharedBuffer;

  #[test]
  fn only_bigrams_are_printed() {
    let buffer = SharedBuffer::new();
    let mut printer = new_printer(Category::Candidates, buffer.boxed()).unwrap();
    let info = ParseInfo::detached("XML", Category::Candidates);
    let mut meta = Meta::new();
    meta.add_corpus_size("bnc", 1000);
    printer.handle_meta(meta, &info).unwrap();

    let mut first = Word::from_attrs(None, Some("hot"), None, None);
    first.add_frequency("bnc", 20);
    let mut second = Word::from_attrs(None, Some("dog"), None, None);
    second.add_frequency("bnc", 30);
    let mut bigram = Candidate::new(1, vec![first.clone(), second]);
    bigram.ngram.add_frequency("bnc", 5);
    printer.handle_candidate(bigram, &info).unwrap();
    printer.handle_candidate(Candidate::new(2, vec![first]), &info).unwrap();

    assert_eq!(
      buffer.contents(),
      "id\tl1\tl2\tf\tf1\tf2\tN\n1\thot\tdog\t5.000000\t20.000000\t30.000000\t1000\n"
    );
  }
}
