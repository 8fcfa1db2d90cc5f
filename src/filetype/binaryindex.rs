//! Reads the corpus stored in a binary suffix-array index, through its `.info` file
use super::common::ParsingContext;
use super::handler::{Entity, InputHandler};
use super::input::{InputFile, STDIN_NAME};
use super::{Category, FiletypeInfo, ParseInfo, ParseOptions, Parser};
use crate::error::Result;
use crate::index::Index;

/// BinaryIndex description
pub static INFO: FiletypeInfo = FiletypeInfo {
  ext: "BinaryIndex",
  description: "The `.info` file for binary index created by mwe-index",
  comment_prefix: "#",
  escape_pairs: &[],
  checker: check,
  parser: Some(new_parser),
  printer: None,
  input_categories: &[Category::Corpus],
  output_categories: &[],
};

/// Always strict: an index without its metadata header is broken
fn check(header: &[u8], _strict: bool) -> bool { header.starts_with(b"corpus_size int") }

fn new_parser(_options: &ParseOptions) -> Box<dyn Parser> { Box::new(BinaryIndexParser) }

struct BinaryIndexParser;

impl Parser for BinaryIndexParser {
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()> {
    let path = match input.path {
      Some(ref path) if input.name != STDIN_NAME => Some(path.to_string_lossy().into_owned()),
      _ => None,
    };
    ParsingContext::run(handler, info, |ctx| {
      let path = match path {
        Some(path) => path,
        None => return Err(ctx.input_error("Cannot read BinaryIndex file from stdin!")),
      };
      if !path.ends_with(".info") {
        return Err(ctx.input_error("BinaryIndex file should have extension .info!"));
      }
      let index = Index::open(&path)?;
      for (sentence, progress) in index.sentences() {
        ctx.info.progress = progress;
        for word in &sentence.words {
          word.validate()?;
        }
        ctx.emit(Entity::Sentence(sentence))?;
      }
      Ok(())
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn header_must_declare_the_corpus_size() {
    assert!(check(b"corpus_size int 12\n", true));
    assert!(check(b"corpus_size int 12\n", false));
    assert!(!check(b"<?xml version=\"1.0\"?>", false));
  }

  #[test]
  fn stdin_is_refused() {
    let mut input = InputFile::from_bytes(STDIN_NAME, b"corpus_size int 0\n").unwrap();
    let mut collector = crate::filetype::EntityCollectorHandler::new();
    let info = ParseInfo::new(&INFO, &input);
    assert!(BinaryIndexParser.parse_file(&mut input, &mut collector, info).is_err());
  }
}
