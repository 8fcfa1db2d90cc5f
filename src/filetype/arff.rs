//! WEKA's ARFF: a relation header declaring every feature, then one comma-separated row per candidate
use std::io::Write;

use super::common::PrinterCore;
use super::handler::InputHandler;
use super::{Category, FiletypeInfo, ParseInfo};
use crate::base::{Candidate, FeatValue, Meta, UNKNOWN_FEAT_VALUE};
use crate::error::Result;

/// Relation name written in the header
pub const RELATION_NAME: &str = "MWETOOLKIT_RELATION";

/// ARFF description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "ARFF",
  description: "ARFF file type, as defined by the WEKA toolkit",
  comment_prefix: "%",
  escape_pairs: &[],
  checker: check,
  parser: None,
  printer: Some(new_printer),
  input_categories: &[],
  output_categories: &[Category::Candidates],
};

fn check(_header: &[u8], strict: bool) -> bool { !strict }

fn new_printer(category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  Ok(Box::new(ArffPrinter {
    core: PrinterCore::new(&INFO, category, output)?,
    feats: Vec::new(),
    tpclasses: Vec::new(),
  }))
}

struct ArffPrinter {
  core: PrinterCore,
  feats: Vec<String>,
  tpclasses: Vec<String>,
}

fn arff_value(value: &FeatValue) -> String {
  match *value {
    FeatValue::Real(real) => format!("{:.8}", real),
    ref other => other.to_string(),
  }
}

impl InputHandler for ArffPrinter {
  printer_core_methods!();

  fn before_file(&mut self, _info: &ParseInfo) -> Result<()> { self.core.before_file() }

  /// Writes the relation header; invalid feature types give a file WEKA will refuse
  fn handle_meta(&mut self, meta: Meta, _info: &ParseInfo) -> Result<()> {
    let mut header = format!("@relation {}\n", RELATION_NAME);
    for feat in meta.meta_feats.iter().chain(meta.meta_tpclasses.iter()) {
      header.push_str(&format!("@attribute {} {}\n", feat.name, feat.feat_type));
    }
    header.push_str("@data\n");
    self.feats = meta.meta_feats.iter().map(|f| f.name.clone()).collect();
    self.tpclasses = meta.meta_tpclasses.iter().map(|f| f.name.clone()).collect();
    self.core.add_string(&header)
  }

  /// Features declared in the header, in header order, then TP classes; `?` when missing
  fn handle_candidate(&mut self, candidate: Candidate, _info: &ParseInfo) -> Result<()> {
    let mut row: Vec<String> = self
      .feats
      .iter()
      .map(|name| {
        candidate
          .features
          .get(name)
          .map(arff_value)
          .unwrap_or_else(|| UNKNOWN_FEAT_VALUE.to_string())
      })
      .collect();
    row.extend(self.tpclasses.iter().map(|name| {
      candidate
        .tpclasses
        .get(name)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_FEAT_VALUE.to_string())
    }));
    let line = row.join(",") + "\n";
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
  fn rows_follow_the_header() {
    let buffer = SharedBuffer::new();
    let mut printer = new_printer(Category::Candidates, buffer.boxed()).unwrap();
    let info = ParseInfo::detached("XML", Category::Candidates);
    let mut meta = Meta::new();
    meta.add_meta_feat("pmi", "real");
    meta.add_meta_feat("n", "integer");
    meta.add_meta_tpclass("gold", "{True,False}");
    printer.before_file(&info).unwrap();
    printer.handle_meta(meta, &info).unwrap();
    let mut cand = Candidate::new(1, vec![Word::from_attrs(None, Some("a"), None, None)]);
    cand.add_feat("pmi", 0.5);
    cand.tpclasses.add("gold", "True".to_string());
    printer.handle_candidate(cand, &info).unwrap();
    printer.finish().unwrap();
    assert_eq!(
      buffer.contents(),
      "% MWETOOLKIT: filetype=\"ARFF\"\n@relation MWETOOLKIT_RELATION\n@attribute pmi real\n\
       @attribute n integer\n@attribute gold {True,False}\n@data\n0.50000000,?,True\n"
    );
  }
}
