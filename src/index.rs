//! Suffix-array index of a corpus, one array per word attribute.
//!
//! An index with base path `B` is made of `B.info` (`key type value` lines)
//! and, for each attribute `a`, the files `B.a.corpus` (native-endian `i32`
//! symbol numbers, `0` closing every sentence), `B.a.suffix` (suffix positions
//! in sorted order) and `B.a.symbols` (one symbol per line, symbol 0 being
//! the empty string).
use log::{info, warn};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::base::{Sentence, SentenceFactory, Word, WordAttr, WILDCARD};
use crate::error::{Error, Result};
use crate::filetype::InputHandler;
use crate::filetype::ParseInfo;

/// Suffixes are only sorted on their first words
pub const NGRAM_LIMIT: usize = 16;
/// Name of the external indexer, looked up next to the toolkit binaries and in `PATH`
pub const C_INDEXER_PROGRAM: &str = "c-indexer";
/// Metadata key holding the number of indexed tokens
pub const CORPUS_SIZE_KEY: &str = "corpus_size";

/// A metadata value of the `.info` file
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
  /// `int`
  Int(i64),
  /// `string`
  Str(String),
}

impl fmt::Display for MetaValue {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      MetaValue::Int(i) => write!(f, "int {}", i),
      MetaValue::Str(ref s) => write!(f, "string {}", s),
    }
  }
}

/// Two-way mapping between attribute values and symbol numbers
#[derive(Debug, Clone)]
pub struct SymbolTable {
  symbol_to_number: HashMap<String, i32>,
  number_to_symbol: Vec<String>,
}

impl Default for SymbolTable {
  fn default() -> SymbolTable {
    let mut table = SymbolTable {
      symbol_to_number: HashMap::new(),
      number_to_symbol: Vec::new(),
    };
    table.intern("");
    table
  }
}

impl SymbolTable {
  /// A table knowing only the end-of-sentence symbol
  pub fn new() -> Self { SymbolTable::default() }

  /// Number of `symbol`, which is added if new
  pub fn intern(&mut self, symbol: &str) -> i32 {
    if let Some(&number) = self.symbol_to_number.get(symbol) {
      return number;
    }
    let number = self.number_to_symbol.len() as i32;
    self.symbol_to_number.insert(symbol.to_string(), number);
    self.number_to_symbol.push(symbol.to_string());
    number
  }

  /// Number of `symbol`, if known
  pub fn number(&self, symbol: &str) -> Option<i32> { self.symbol_to_number.get(symbol).cloned() }

  /// Symbol numbered `number`
  pub fn symbol(&self, number: i32) -> Option<&str> {
    if number < 0 {
      return None;
    }
    self.number_to_symbol.get(number as usize).map(String::as_str)
  }

  /// Number of symbols, end-of-sentence included
  pub fn len(&self) -> usize { self.number_to_symbol.len() }

  /// Always false: the end-of-sentence symbol is always there
  pub fn is_empty(&self) -> bool { self.number_to_symbol.is_empty() }

  /// Reads one symbol per line
  pub fn load(path: &Path) -> Result<SymbolTable> {
    let mut table = SymbolTable {
      symbol_to_number: HashMap::new(),
      number_to_symbol: Vec::new(),
    };
    for line in BufReader::new(File::open(path)?).lines() {
      let symbol = line?;
      let number = table.number_to_symbol.len() as i32;
      table.symbol_to_number.insert(symbol.clone(), number);
      table.number_to_symbol.push(symbol);
    }
    if table.number_to_symbol.is_empty() {
      table.intern("");
    }
    Ok(table)
  }

  /// Writes one symbol per line
  pub fn save(&self, path: &Path) -> Result<()> {
    let mut output = BufWriter::new(File::create(path)?);
    for symbol in &self.number_to_symbol {
      output.write_all(symbol.as_bytes())?;
      output.write_all(b"\n")?;
    }
    output.flush()?;
    Ok(())
  }
}

/// Compares the suffixes starting at `a` and `b` on at most `limit` symbols.
/// A suffix that runs out first is the smaller one.
pub fn compare_ngrams(corpus: &[i32], a: usize, b: usize, limit: usize) -> Ordering {
  let left = &corpus[a.min(corpus.len())..];
  let right = &corpus[b.min(corpus.len())..];
  let left = &left[..left.len().min(limit)];
  let right = &right[..right.len().min(limit)];
  left.cmp(right)
}

fn read_i32s(path: &Path) -> Result<Vec<i32>> {
  let mut bytes = Vec::new();
  File::open(path)?.read_to_end(&mut bytes)?;
  if bytes.len() % 4 != 0 {
    return Err(Error::Other(format!("{} is truncated", path.display())));
  }
  Ok(
    bytes
      .chunks(4)
      .map(|chunk| i32::from_ne_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
      .collect(),
  )
}

fn write_i32s(path: &Path, values: &[i32]) -> Result<()> {
  let mut output = BufWriter::new(File::create(path)?);
  for value in values {
    output.write_all(&value.to_ne_bytes())?;
  }
  output.flush()?;
  Ok(())
}

/// Corpus array, suffix array and symbol table of one attribute
#[derive(Debug, Clone, Default)]
pub struct SuffixArray {
  /// symbol numbers, in corpus order
  pub corpus: Vec<i32>,
  /// corpus positions, sorted by the suffix starting there
  pub suffix: Vec<i32>,
  /// symbol numbering
  pub symbols: SymbolTable,
}

impl SuffixArray {
  /// An empty array
  pub fn new() -> Self { SuffixArray::default() }

  /// Appends a word value, `""` marking the end of a sentence
  pub fn append_word(&mut self, word: &str) {
    let number = self.symbols.intern(word);
    self.corpus.push(number);
  }

  /// Sorts the suffixes of the corpus array
  pub fn build_suffix_array(&mut self) {
    let corpus = &self.corpus;
    let mut positions: Vec<usize> = (0..corpus.len()).collect();
    positions.sort_by(|&a, &b| compare_ngrams(corpus, a, b, NGRAM_LIMIT));
    self.suffix = positions.into_iter().map(|p| p as i32).collect();
  }

  /// The `(first, last)` positions of the suffix array starting with `ngram`
  pub fn find_ngram_range(&self, ngram: &[i32]) -> Option<(usize, usize)> {
    let first = self.suffix.partition_point(|&p| self.prefix(p, ngram.len()) < ngram);
    let last = self.suffix.partition_point(|&p| self.prefix(p, ngram.len()) <= ngram);
    if first < last {
      Some((first, last - 1))
    } else {
      None
    }
  }

  fn prefix(&self, position: i32, len: usize) -> &[i32] {
    let start = (position.max(0) as usize).min(self.corpus.len());
    let end = (start + len).min(self.corpus.len());
    &self.corpus[start..end]
  }

  /// Number of occurrences of `ngram` in the corpus
  pub fn count(&self, ngram: &[i32]) -> usize {
    self.find_ngram_range(ngram).map_or(0, |(first, last)| last - first + 1)
  }

  /// Reads the three files of `basepath`
  pub fn load(basepath: &str) -> Result<SuffixArray> {
    Ok(SuffixArray {
      corpus: read_i32s(Path::new(&format!("{}.corpus", basepath)))?,
      suffix: read_i32s(Path::new(&format!("{}.suffix", basepath)))?,
      symbols: SymbolTable::load(Path::new(&format!("{}.symbols", basepath)))?,
    })
  }

  /// Writes the three files of `basepath`
  pub fn save(&self, basepath: &str) -> Result<()> {
    write_i32s(Path::new(&format!("{}.corpus", basepath)), &self.corpus)?;
    write_i32s(Path::new(&format!("{}.suffix", basepath)), &self.suffix)?;
    self.symbols.save(Path::new(&format!("{}.symbols", basepath)))
  }

  /// Pipes the corpus, one word per line, to the external indexer, which writes the files of `basepath`
  pub fn build_with_indexer(&self, program: &str, basepath: &str) -> Result<()> {
    info!("Using C indexer to build suffix array {}", basepath);
    let mut child = Command::new(program).arg(basepath).stdin(Stdio::piped()).spawn()?;
    if let Some(stdin) = child.stdin.take() {
      let mut stdin = BufWriter::new(stdin);
      for &number in &self.corpus {
        stdin.write_all(self.symbols.symbol(number).unwrap_or("").as_bytes())?;
        stdin.write_all(b"\n")?;
      }
      stdin.flush()?;
    }
    let status = child.wait()?;
    if !status.success() {
      return Err(Error::Other(format!("{} {} failed: {}", program, basepath, status)));
    }
    Ok(())
  }
}

fn symbol_of(value: Option<&str>) -> String {
  match value {
    Some(value) => value.to_string(),
    None => WILDCARD.to_string(),
  }
}

fn is_wildcard(symbol: &str) -> bool {
  let mut chars = symbol.chars();
  chars.next() == Some(WILDCARD) && chars.next().is_none()
}

/// Suffix arrays for the attributes of a corpus, plus shared metadata
#[derive(Debug)]
pub struct Index {
  basepath: String,
  /// contents of the `.info` file
  pub metadata: BTreeMap<String, MetaValue>,
  arrays: Vec<(WordAttr, SuffixArray)>,
  c_indexer: Option<String>,
}

impl Index {
  /// An empty index over all word attributes
  pub fn new(basepath: &str) -> Self { Index::with_attributes(basepath, &WordAttr::ALL) }

  /// An empty index over `attributes`
  pub fn with_attributes(basepath: &str, attributes: &[WordAttr]) -> Self {
    let mut metadata = BTreeMap::new();
    metadata.insert(CORPUS_SIZE_KEY.to_string(), MetaValue::Int(0));
    Index {
      basepath: basepath.to_string(),
      metadata,
      arrays: attributes.iter().map(|&attr| (attr, SuffixArray::new())).collect(),
      c_indexer: None,
    }
  }

  /// Builds the arrays with the external indexer `program` instead of in-process
  pub fn use_c_indexer(&mut self, program: &str) { self.c_indexer = Some(program.to_string()); }

  /// Base path of the index files
  pub fn basepath(&self) -> &str { &self.basepath }

  fn info_path(&self) -> String { format!("{}.info", self.basepath) }

  fn attr_path(&self, attr: WordAttr) -> String { format!("{}.{}", self.basepath, attr) }

  /// Attributes actually present
  pub fn attributes(&self) -> Vec<WordAttr> { self.arrays.iter().map(|&(attr, _)| attr).collect() }

  /// The array of `attr`, if present
  pub fn array(&self, attr: WordAttr) -> Option<&SuffixArray> {
    self.arrays.iter().find(|&&(a, _)| a == attr).map(|(_, array)| array)
  }

  /// Number of indexed tokens
  pub fn corpus_size(&self) -> i64 {
    match self.metadata.get(CORPUS_SIZE_KEY) {
      Some(&MetaValue::Int(size)) => size,
      _ => 0,
    }
  }

  /// Opens the index whose `.info` file is at `info_path`.
  /// Attributes whose files are missing are left out, with a warning.
  pub fn open(info_path: &str) -> Result<Index> {
    if !info_path.ends_with(".info") {
      return Err(Error::Other("BinaryIndex file should have extension .info!".to_string()));
    }
    let basepath = &info_path[..info_path.len() - ".info".len()];
    let mut index = Index::with_attributes(basepath, &[]);
    index.load_metadata()?;
    for &attr in WordAttr::ALL.iter() {
      let path = index.attr_path(attr);
      if !Path::new(&format!("{}.corpus", path)).is_file() {
        warn!("Cannot load attribute {}; index files not present.", attr);
        continue;
      }
      info!("Loading corpus files for attribute \"{}\".", attr);
      let array = SuffixArray::load(&path)?;
      index.arrays.push((attr, array));
    }
    Ok(index)
  }

  fn load_metadata(&mut self) -> Result<()> {
    let file = File::open(self.info_path())?;
    for line in BufReader::new(file).lines() {
      let line = line?;
      if line.is_empty() {
        continue;
      }
      let mut parts = line.splitn(3, ' ');
      let (key, kind, value) = match (parts.next(), parts.next(), parts.next()) {
        (Some(key), Some(kind), Some(value)) => (key, kind, value),
        _ => return Err(Error::input(&self.info_path(), None, format!("Bad metadata line: {:?}", line))),
      };
      let value = match kind {
        "int" => MetaValue::Int(value.parse()?),
        _ => MetaValue::Str(value.to_string()),
      };
      self.metadata.insert(key.to_string(), value);
    }
    Ok(())
  }

  fn save_metadata(&self) -> Result<()> {
    let mut output = BufWriter::new(File::create(self.info_path())?);
    for (key, value) in &self.metadata {
      writeln!(output, "{} {}", key, value)?;
    }
    output.flush()?;
    Ok(())
  }

  /// Appends the words of `sentence` to every array, followed by the end-of-sentence symbol
  pub fn append_sentence(&mut self, sentence: &Sentence) {
    for (attr, array) in self.arrays.iter_mut() {
      for word in &sentence.words {
        array.append_word(&symbol_of(word.get(*attr)));
      }
      array.append_word("");
    }
    let size = self.corpus_size() + sentence.len() as i64;
    self.metadata.insert(CORPUS_SIZE_KEY.to_string(), MetaValue::Int(size));
  }

  /// Sorts every array and writes all index files
  pub fn build_and_save(&mut self) -> Result<()> {
    self.save_metadata()?;
    for i in 0..self.arrays.len() {
      let attr = self.arrays[i].0;
      let path = self.attr_path(attr);
      info!("Building suffix array for {}...", attr);
      match self.c_indexer {
        Some(ref program) => self.arrays[i].1.build_with_indexer(program, &path)?,
        None => {
          let array = &mut self.arrays[i].1;
          array.build_suffix_array();
          array.save(&path)?;
        },
      }
    }
    Ok(())
  }

  /// The sentences of the corpus, with `(position, length)` progress
  pub fn sentences(&self) -> IndexSentences {
    IndexSentences {
      index: self,
      position: 0,
      factory: SentenceFactory::new(),
    }
  }

  /// Removes every file of the index
  pub fn remove_files(&self) -> io::Result<()> {
    fs::remove_file(self.info_path())?;
    for &(attr, _) in &self.arrays {
      for ext in &["corpus", "suffix", "symbols"] {
        let path = format!("{}.{}", self.attr_path(attr), ext);
        if Path::new(&path).exists() {
          fs::remove_file(path)?;
        }
      }
    }
    Ok(())
  }
}

/// Iterator over the sentences of an index
pub struct IndexSentences<'a> {
  index: &'a Index,
  position: usize,
  factory: SentenceFactory,
}

impl<'a> Iterator for IndexSentences<'a> {
  type Item = (Sentence, (u64, u64));

  fn next(&mut self) -> Option<Self::Item> {
    let guide = &self.index.arrays.first()?.1;
    let length = guide.corpus.len();
    let mut words = Vec::new();
    while self.position < length {
      let i = self.position;
      self.position += 1;
      if guide.corpus[i] == 0 {
        let sentence = self.factory.make(words, None);
        return Some((sentence, (i as u64, length as u64)));
      }
      let mut word = Word::new();
      for (attr, array) in &self.index.arrays {
        let symbol = array.corpus.get(i).and_then(|&n| array.symbols.symbol(n));
        let value = match symbol {
          Some(symbol) if !is_wildcard(symbol) => Some(symbol.to_string()),
          _ => None,
        };
        word.set(*attr, value);
      }
      words.push(word);
    }
    None
  }
}

/// Stage that appends every sentence it receives to an index, and writes it in `finish`
pub struct IndexPopulator {
  index: Index,
}

impl IndexPopulator {
  /// Fills `index`
  pub fn new(index: Index) -> Self { IndexPopulator { index } }

  /// The index being filled
  pub fn index(&self) -> &Index { &self.index }
}

impl InputHandler for IndexPopulator {
  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    self.index.append_sentence(&sentence);
    Ok(())
  }

  fn finish(&mut self) -> Result<()> { self.index.build_and_save() }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn array_of(text: &str) -> SuffixArray {
    let mut array = SuffixArray::new();
    for word in text.split(' ') {
      array.append_word(if word == "|" { "" } else { word });
    }
    array.build_suffix_array();
    array
  }

  #[test]
  fn symbol_zero_is_the_sentence_end() {
    let mut symbols = SymbolTable::new();
    assert_eq!(symbols.intern(""), 0);
    assert_eq!(symbols.intern("a"), 1);
    assert_eq!(symbols.intern("a"), 1);
    assert_eq!(symbols.symbol(1), Some("a"));
  }

  #[test]
  fn suffixes_are_sorted() {
    let array = array_of("b a b a |");
    let suffixes: Vec<Vec<i32>> = array
      .suffix
      .iter()
      .map(|&p| array.corpus[p as usize..].to_vec())
      .collect();
    let mut sorted = suffixes.clone();
    sorted.sort();
    assert_eq!(suffixes, sorted);
  }

  #[test]
  fn ngram_ranges_count_occurrences() {
    let array = array_of("b a b a | a b |");
    let a = array.symbols.number("a").unwrap();
    let b = array.symbols.number("b").unwrap();
    assert_eq!(array.count(&[b, a]), 2);
    assert_eq!(array.count(&[a, b]), 2);
    assert_eq!(array.count(&[a, a]), 0);
    assert_eq!(array.count(&[a]), 3);
  }
}
