//! Filetypes: the registry, format detection and the parse driver.
//!
//! Every supported format is described by a static `FiletypeInfo`, carrying its
//! escape table, its header checker, and constructors for its parser and printer.
//! Input files are detected by a `MWETOOLKIT: filetype="..."` directive in their
//! header, or else by asking each checker in turn, strictly first.
use log::error;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

#[macro_use]
pub mod common;
pub mod handler;
pub mod input;

pub mod arff;
pub mod binaryindex;
pub mod conll;
pub mod csv;
pub mod html;
pub mod moses;
pub mod plaincandidates;
pub mod plaincorpus;
pub mod pwac;
pub mod taggedplaincorpus;
pub mod treetagger;
pub mod ucs;
pub mod xml;

pub use self::common::{Directive, SharedBuffer};
pub use self::handler::{Entity, EntityCollectorHandler, FirstInputHandler, InputHandler, LazyPrinter};
pub use self::input::InputFile;

use self::common::HEADER_DIRECTIVE;
use crate::error::{Error, Result};

/// What a stream of entities is made of
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
  /// sentences
  Corpus,
  /// candidates with frequencies and features
  Candidates,
  /// patterns
  Patterns,
  /// dictionary entries
  Dict,
}

impl Category {
  /// Name of the category, also the root element of its XML form
  pub fn name(self) -> &'static str {
    match self {
      Category::Corpus => "corpus",
      Category::Candidates => "candidates",
      Category::Patterns => "patterns",
      Category::Dict => "dict",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(self.name()) }
}

/// Reads a whole input file, sending its entities to a handler
pub trait Parser {
  /// Parses `input`, wrapping its entities between `before_file` and `after_file`
  fn parse_file(&mut self, input: &mut InputFile, handler: &mut dyn InputHandler, info: ParseInfo) -> Result<()>;
}

/// Builds a printer for a category, writing into an output
pub type PrinterMaker = fn(Category, Box<dyn Write>) -> Result<Box<dyn InputHandler>>;

/// Static description of a filetype
pub struct FiletypeInfo {
  /// name used with `--from` / `--to` and in directives
  pub ext: &'static str,
  /// human-readable description
  pub description: &'static str,
  /// lines starting with this are comments
  pub comment_prefix: &'static str,
  /// `(unescaped, escaped)` pairs, the escape character first
  pub escape_pairs: &'static [(&'static str, &'static str)],
  /// whether a header looks like this filetype; `strict` rules out guessing
  pub checker: fn(&[u8], bool) -> bool,
  /// parser constructor, if the filetype can be read
  pub parser: Option<fn(&ParseOptions) -> Box<dyn Parser>>,
  /// printer constructor, if the filetype can be written
  pub printer: Option<PrinterMaker>,
  /// categories that can be read
  pub input_categories: &'static [Category],
  /// categories that can be written
  pub output_categories: &'static [Category],
}

impl fmt::Debug for FiletypeInfo {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { write!(f, "FiletypeInfo({})", self.ext) }
}

/// All filetypes, in detection order
pub static INFOS: [&FiletypeInfo; 13] = [
  &arff::INFO,
  &xml::INFO,
  &self::csv::INFO,
  &conll::INFO,
  &pwac::INFO,
  &plaincorpus::INFO,
  &binaryindex::INFO,
  &moses::INFO,
  &plaincandidates::INFO,
  &html::INFO,
  &taggedplaincorpus::INFO,
  &treetagger::INFO,
  &ucs::INFO,
];

/// The filetype called `ext`, case aside
pub fn lookup(ext: &str) -> Result<&'static FiletypeInfo> {
  INFOS
    .iter()
    .find(|info| info.ext.eq_ignore_ascii_case(ext))
    .cloned()
    .ok_or_else(|| Error::UnknownFiletype(ext.to_string()))
}

/// Names of the filetypes that can be read (`input`) or written, for help messages
pub fn extensions(input: bool) -> Vec<&'static str> {
  INFOS
    .iter()
    .filter(|info| if input { info.parser.is_some() } else { info.printer.is_some() })
    .map(|info| info.ext)
    .collect()
}

/// Builds a printer for `ext`, refusing categories the filetype cannot hold
pub fn make_printer(ext: &str, category: Category, output: Box<dyn Write>) -> Result<Box<dyn InputHandler>> {
  let info = lookup(ext)?;
  match info.printer {
    Some(maker) => maker(category, output),
    None => Err(Error::NoPrinter(info.ext.to_string())),
  }
}

/// Where a parser stands, handed to every handler callback
#[derive(Debug, Clone)]
pub struct ParseInfo {
  /// filetype being read
  pub filetype: &'static str,
  /// category being read
  pub category: Category,
  /// name of the input, for messages
  pub filename: String,
  /// path of the input, when it is a file
  pub filepath: Option<PathBuf>,
  /// current 1-based line, when meaningful
  pub linenum: Option<usize>,
  /// `(consumed, total)`, total 0 when unknown
  pub progress: (u64, u64),
}

impl ParseInfo {
  /// Position at the start of `input`, read as `filetype`
  pub fn new(filetype: &'static FiletypeInfo, input: &InputFile) -> Self {
    ParseInfo {
      filetype: filetype.ext,
      category: filetype.input_categories.first().cloned().unwrap_or(Category::Corpus),
      filename: input.name.clone(),
      filepath: input.path.clone(),
      linenum: None,
      progress: input.progress(),
    }
  }

  /// A position that belongs to no file, for entities made up by handlers
  pub fn detached(filetype: &'static str, category: Category) -> Self {
    ParseInfo {
      filetype,
      category,
      filename: String::from("<none>"),
      filepath: None,
      linenum: None,
      progress: (0, 0),
    }
  }

  /// Name of the corpus being read: the file name without directories and without `.xml` or `.info`
  pub fn corpus_name(&self) -> String {
    let name = match self.filepath {
      Some(ref path) => path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| self.filename.clone()),
      None => Path::new(&self.filename)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| self.filename.clone()),
    };
    for ext in &[".xml", ".info"] {
      if name.len() > ext.len() && name.ends_with(ext) {
        return name[..name.len() - ext.len()].to_string();
      }
    }
    name
  }
}

/// Per-invocation parsing options
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
  /// forced input filetype
  pub filetype: Option<String>,
  /// TreeTagger POS tag that ends a sentence
  pub sent_split: Option<String>,
}

impl ParseOptions {
  /// Options forcing `filetype`, if any
  pub fn with_filetype(filetype: Option<&str>) -> Self {
    ParseOptions {
      filetype: filetype.map(str::to_string),
      sent_split: None,
    }
  }
}

/// Picks the filetype of `input`: the forced one, a directive in the header,
/// the first strict checker, or the first lenient one
pub fn detect(input: &InputFile, hint: Option<&str>) -> Result<&'static FiletypeInfo> {
  let chosen = match hint {
    Some(hint) => lookup(hint)?,
    None => sniff(input)?,
  };
  if !(chosen.checker)(input.header(), false) {
    return Err(Error::input(&input.name, None, format!("Bad \"{}\" input", chosen.ext)));
  }
  Ok(chosen)
}

fn sniff(input: &InputFile) -> Result<&'static FiletypeInfo> {
  let header = String::from_utf8_lossy(input.header());
  for caps in HEADER_DIRECTIVE.captures_iter(&header) {
    if &caps[1] == "filetype" {
      return lookup(&caps[2])
        .map_err(|_| Error::input(&input.name, None, format!("Unknown file format: {}", &caps[2])));
    }
  }
  for &strict in &[true, false] {
    let found = INFOS
      .iter()
      .find(|info| info.parser.is_some() && (info.checker)(input.header(), strict));
    if let Some(info) = found {
      return Ok(*info);
    }
  }
  Err(Error::input(&input.name, None, "Unknown file format"))
}

/// Parses the files in `paths` (stdin if empty) into `handler`.
///
/// A file that fails is reported and skipped; the others are still parsed, and
/// the run ends with `FilesFailed`. `finish` is called once at the end.
pub fn parse(paths: &[String], handler: &mut dyn InputHandler, options: &ParseOptions) -> Result<()> {
  let paths: Vec<String> = if paths.is_empty() {
    vec!["-".to_string()]
  } else {
    paths.to_vec()
  };
  let sizes = input::file_sizes(&paths);
  let total: u64 = sizes.iter().sum();
  let mut beg = 0;
  let sources = paths.iter().zip(sizes.into_iter()).map(|(path, size)| {
    let opened = InputFile::open(path).map(|mut input| {
      input.set_offsets(beg, total);
      input
    });
    beg += size;
    opened
  });
  parse_sources(sources, handler, options)
}

/// Parses already opened inputs into `handler`
pub fn parse_inputs(inputs: Vec<InputFile>, handler: &mut dyn InputHandler, options: &ParseOptions) -> Result<()> {
  parse_sources(inputs.into_iter().map(Ok), handler, options)
}

fn parse_sources<I>(sources: I, handler: &mut dyn InputHandler, options: &ParseOptions) -> Result<()>
where I: Iterator<Item = Result<InputFile>> {
  if let Some(ref hint) = options.filetype {
    lookup(hint)?;
  }
  let mut first = FirstInputHandler::new(handler);
  let mut failed = 0;
  for source in sources {
    let outcome = match source.and_then(|input| prepare(input, options)) {
      Ok((mut input, filetype, mut parser)) => {
        let info = ParseInfo::new(filetype, &input);
        parser.parse_file(&mut input, &mut first, info)
      },
      Err(err) => {
        if !err.is_broken_pipe() {
          error!("{}", err);
        }
        Err(err)
      },
    };
    match outcome {
      Ok(()) => {},
      Err(Error::StopParsing) => break,
      Err(err) => {
        if err.is_broken_pipe() {
          return Err(err);
        }
        failed += 1;
      },
    }
  }
  first.finish()?;
  if failed > 0 {
    Err(Error::FilesFailed(failed))
  } else {
    Ok(())
  }
}

fn prepare(input: InputFile, options: &ParseOptions) -> Result<(InputFile, &'static FiletypeInfo, Box<dyn Parser>)> {
  let filetype = detect(&input, options.filetype.as_ref().map(String::as_str))?;
  match filetype.parser {
    Some(make) => Ok((input, filetype, make(options))),
    None => Err(Error::NoParser(filetype.ext.to_string())),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn every_filetype_has_a_unique_name() {
    for (i, a) in INFOS.iter().enumerate() {
      for b in INFOS.iter().skip(i + 1) {
        assert_ne!(a.ext, b.ext);
      }
      assert!(lookup(&a.ext.to_lowercase()).is_ok());
    }
  }

  #[test]
  fn escape_character_comes_first() {
    for info in INFOS.iter() {
      if let Some(&(plain, _)) = info.escape_pairs.first() {
        assert_eq!(plain, "$", "{}", info.ext);
      }
    }
  }

  #[test]
  fn directives_win_over_checkers() {
    let input = InputFile::from_bytes("mem", b"# MWETOOLKIT: filetype=\"PlainCorpus\"\na\tb\tc\n").unwrap();
    assert_eq!(detect(&input, None).unwrap().ext, "PlainCorpus");
  }

  #[test]
  fn checkers_are_consulted_in_order() {
    let conll = InputFile::from_bytes("mem", b"1\tthe\tthe\tDT\tDT\t_\t2\tdet\t_\t_\n").unwrap();
    assert_eq!(detect(&conll, None).unwrap().ext, "CONLL");
    let moses = InputFile::from_bytes("mem", b"the|the|DT|det cat|cat|NN|root\n").unwrap();
    assert_eq!(detect(&moses, None).unwrap().ext, "Moses");
    let plain = InputFile::from_bytes("mem", b"the old man\n").unwrap();
    assert_eq!(detect(&plain, None).unwrap().ext, "PlainCorpus");
  }

  #[test]
  fn unknown_hints_are_refused() {
    let input = InputFile::from_bytes("mem", b"").unwrap();
    match detect(&input, Some("DOCX")) {
      Err(Error::UnknownFiletype(ext)) => assert_eq!(ext, "DOCX"),
      other => panic!("unexpected {:?}", other.map(|i| i.ext)),
    }
  }

  #[test]
  fn printers_check_categories() {
    assert!(make_printer("CONLL", Category::Corpus, SharedBuffer::new().boxed()).is_ok());
    match make_printer("CONLL", Category::Candidates, SharedBuffer::new().boxed()) {
      Err(Error::BadCategory { .. }) => {},
      Err(other) => panic!("unexpected {}", other),
      Ok(_) => panic!("CONLL cannot print candidates"),
    }
  }

  #[test]
  fn corpus_names() {
    let mut info = ParseInfo::detached("XML", Category::Corpus);
    info.filepath = Some(PathBuf::from("/data/bnc.xml"));
    assert_eq!(info.corpus_name(), "bnc");
  }
}
