//! Candidate extraction with LocalMaxs (da Silva et al. 1999): every n-gram of
//! the corpus is counted, and an n-gram is kept only when its glue is not lower
//! than the glue of the (n-1)-grams it contains, nor than the glue of the
//! (n+1)-grams containing it.
//!
//! The n-gram keys live in memory, or in an anonymous temporary file for
//! corpora whose vocabulary of n-grams does not fit in memory.
use log::info;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::hash::{Hash, Hasher};
use std::io::{Read, Seek, SeekFrom, Write};
use std::str::FromStr;

use crate::base::{CandidateFactory, FeatValue, Meta, Sentence, Word, WORD_SEPARATOR};
use crate::error::{Error, Result};
use crate::filetype::{Category, InputHandler, ParseInfo};

/// Name of the frequency source of the extracted candidates
pub const LOCALMAXS_CORPUS: &str = "corpus";

/// How strongly the words of an n-gram stick together
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Glue {
  /// Symmetrical conditional probability
  Scp,
}

impl fmt::Display for Glue {
  fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Glue::Scp => fmt.write_str("scp"),
    }
  }
}

impl FromStr for Glue {
  type Err = Error;
  fn from_str(name: &str) -> Result<Glue> {
    match name {
      "scp" => Ok(Glue::Scp),
      other => options_error!("Unknown glue function '{}'", other),
    }
  }
}

/// Options of `mwe-localmaxs`
#[derive(Debug, Clone)]
pub struct LocalMaxsConfig {
  /// shortest n-gram to output
  pub min_ngram: usize,
  /// longest n-gram to output; one word longer are counted to compare with
  pub max_ngram: usize,
  /// n-grams seen less often are not output
  pub min_frequency: u64,
  /// count surfaces instead of lemmas
  pub surface_instead_lemmas: bool,
  /// glue measure
  pub glue: Glue,
}

impl Default for LocalMaxsConfig {
  fn default() -> Self {
    LocalMaxsConfig {
      min_ngram: 2,
      max_ngram: 8,
      min_frequency: 2,
      surface_instead_lemmas: false,
      glue: Glue::Scp,
    }
  }
}

/// Dense ids for the n-gram keys seen so far
pub trait NgramKeys {
  /// Id of `key`, if it was inserted
  fn find(&mut self, key: &str) -> Result<Option<usize>>;
  /// Stores a key that `find` does not know, returning its id
  fn insert(&mut self, key: &str) -> Result<usize>;
  /// The key of `id`
  fn key(&mut self, id: usize) -> Result<String>;
}

/// Keys in a hash map
#[derive(Debug, Default)]
pub struct MemoryKeys {
  ids: HashMap<String, usize>,
  keys: Vec<String>,
}

impl MemoryKeys {
  /// No keys
  pub fn new() -> Self { MemoryKeys::default() }
}

impl NgramKeys for MemoryKeys {
  fn find(&mut self, key: &str) -> Result<Option<usize>> { Ok(self.ids.get(key).cloned()) }

  fn insert(&mut self, key: &str) -> Result<usize> {
    let id = self.keys.len();
    self.ids.insert(key.to_string(), id);
    self.keys.push(key.to_string());
    Ok(id)
  }

  fn key(&mut self, id: usize) -> Result<String> {
    self
      .keys
      .get(id)
      .cloned()
      .ok_or_else(|| Error::Other(format!("No n-gram with id {}", id)))
  }
}

/// Keys appended to a temporary file; only their hashes and offsets stay in memory.
///
/// The file has no name and is removed when the store is dropped.
#[derive(Debug)]
pub struct DiskKeys {
  file: File,
  end: u64,
  spans: Vec<(u64, usize)>,
  by_hash: HashMap<u64, Vec<usize>>,
}

impl DiskKeys {
  /// An empty store, backed by a fresh file in the temporary directory
  pub fn new() -> Result<Self> {
    let file = tempfile::tempfile()?;
    Ok(DiskKeys {
      file,
      end: 0,
      spans: Vec::new(),
      by_hash: HashMap::new(),
    })
  }

  fn hash(key: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    hasher.finish()
  }

  fn read_span(&mut self, (offset, len): (u64, usize)) -> Result<Vec<u8>> {
    let mut bytes = vec![0; len];
    self.file.seek(SeekFrom::Start(offset))?;
    self.file.read_exact(&mut bytes)?;
    Ok(bytes)
  }
}

impl NgramKeys for DiskKeys {
  fn find(&mut self, key: &str) -> Result<Option<usize>> {
    let same_hash = match self.by_hash.get(&DiskKeys::hash(key)) {
      Some(ids) => ids.clone(),
      None => return Ok(None),
    };
    for id in same_hash {
      let span = self.spans[id];
      if span.1 == key.len() && self.read_span(span)? == key.as_bytes() {
        return Ok(Some(id));
      }
    }
    Ok(None)
  }

  fn insert(&mut self, key: &str) -> Result<usize> {
    let id = self.spans.len();
    self.file.seek(SeekFrom::Start(self.end))?;
    self.file.write_all(key.as_bytes())?;
    self.spans.push((self.end, key.len()));
    self.end += key.len() as u64;
    self.by_hash.entry(DiskKeys::hash(key)).or_insert_with(Vec::new).push(id);
    Ok(id)
  }

  fn key(&mut self, id: usize) -> Result<String> {
    let span = match self.spans.get(id) {
      Some(&span) => span,
      None => return Err(Error::Other(format!("No n-gram with id {}", id))),
    };
    let bytes = self.read_span(span)?;
    String::from_utf8(bytes).map_err(|e| Error::Other(format!("Corrupted n-gram store: {}", e)))
  }
}

fn join(words: &[String]) -> String {
  let mut key = String::new();
  for (i, word) in words.iter().enumerate() {
    if i > 0 {
      key.push(WORD_SEPARATOR);
    }
    key.push_str(word);
  }
  key
}

fn split(key: &str) -> Vec<String> { key.split(WORD_SEPARATOR).map(str::to_string).collect() }

/// Counts the n-grams of the sentences it receives, and sends the local
/// maxima down the chain on `finish`
pub struct LocalMaxsHandler {
  config: LocalMaxsConfig,
  chain: Box<dyn InputHandler>,
  keys: Box<dyn NgramKeys>,
  counts: Vec<u64>,
  glues: Vec<Option<f64>>,
  corpus_size: u64,
}

impl LocalMaxsHandler {
  /// Extraction as configured, keeping the n-gram keys in `keys`
  pub fn new(config: LocalMaxsConfig, keys: Box<dyn NgramKeys>, chain: Box<dyn InputHandler>) -> Self {
    LocalMaxsHandler {
      config,
      chain,
      keys,
      counts: Vec::new(),
      glues: Vec::new(),
      corpus_size: 0,
    }
  }

  fn base_form<'w>(&self, word: &'w Word) -> &'w str {
    let value = if self.config.surface_instead_lemmas {
      word.surface.as_deref()
    } else {
      word.lemma_or_surface()
    };
    value.unwrap_or("")
  }

  fn count(&mut self, words: &[String]) -> Result<()> {
    let key = join(words);
    match self.keys.find(&key)? {
      Some(id) => self.counts[id] += 1,
      None => {
        self.keys.insert(&key)?;
        self.counts.push(1);
      },
    }
    Ok(())
  }

  fn prob(&mut self, words: &[String]) -> Result<f64> {
    let count = match self.keys.find(&join(words))? {
      Some(id) => self.counts[id],
      None => 0,
    };
    Ok(count as f64 / self.corpus_size as f64)
  }

  /// Symmetrical conditional probability: the squared probability of the
  /// n-gram over the mean product of the probabilities of its two halves
  fn scp(&mut self, words: &[String]) -> Result<f64> {
    let square_prob = self.prob(words)?.powi(2);
    if words.len() == 1 {
      return Ok(square_prob);
    }
    let mut avp = 0.0;
    for i in 1..words.len() {
      avp += self.prob(&words[..i])? * self.prob(&words[i..])?;
    }
    avp /= (words.len() - 1) as f64;
    if avp == 0.0 {
      Ok(0.0)
    } else {
      Ok(square_prob / avp)
    }
  }

  fn glue(&mut self, id: usize) -> Result<f64> {
    if let Some(glue) = self.glues[id] {
      return Ok(glue);
    }
    let words = split(&self.keys.key(id)?);
    let glue = match self.config.glue {
      Glue::Scp => self.scp(&words)?,
    };
    self.glues[id] = Some(glue);
    Ok(glue)
  }

  /// Marks the n-grams that are local maxima of glue
  fn localmaxs(&mut self) -> Result<Vec<bool>> {
    let total = self.counts.len();
    self.glues = vec![None; total];
    let mut selected = vec![true; total];
    for id in 0..total {
      let words = split(&self.keys.key(id)?);
      let len = words.len();
      if len < self.config.min_ngram || len > self.config.max_ngram + 1 {
        selected[id] = false;
        continue;
      }
      let this_glue = self.glue(id)?;
      for subgram in [&words[..len - 1], &words[1..]].iter() {
        let sub_id = match self.keys.find(&join(subgram))? {
          Some(sub_id) if !subgram.is_empty() => sub_id,
          _ => continue,
        };
        let sub_glue = self.glue(sub_id)?;
        if this_glue < sub_glue {
          selected[id] = false;
        } else if sub_glue < this_glue {
          selected[sub_id] = false;
        }
      }
    }
    Ok(selected)
  }

  fn meta(&self) -> Meta {
    let mut meta = Meta::new();
    meta.add_corpus_size(LOCALMAXS_CORPUS, self.corpus_size as i64);
    meta.add_meta_feat("glue", "real");
    meta
  }
}

impl InputHandler for LocalMaxsHandler {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.chain;
    Some(next)
  }

  /// Corpus headers are not carried over to the candidate list
  fn handle_meta(&mut self, _meta: Meta, _info: &ParseInfo) -> Result<()> { Ok(()) }

  fn handle_sentence(&mut self, sentence: Sentence, _info: &ParseInfo) -> Result<()> {
    let words: Vec<String> = sentence.words.iter().map(|w| self.base_form(w).to_string()).collect();
    for size in 1..=self.config.max_ngram + 1 {
      for start in 0..(words.len() + 1).saturating_sub(size) {
        self.count(&words[start..start + size])?;
      }
    }
    self.corpus_size += words.len() as u64;
    Ok(())
  }

  fn finish(&mut self) -> Result<()> {
    info!("Selecting ngrams through LocalMaxs...");
    let selected = self.localmaxs()?;
    info!("Outputting candidates file...");
    let info = ParseInfo::detached("XML", Category::Candidates);
    let meta = self.meta();
    self.chain.handle_meta(meta, &info)?;
    let mut factory = CandidateFactory::new();
    for (id, &keep) in selected.iter().enumerate() {
      if !keep || self.counts[id] < self.config.min_frequency {
        continue;
      }
      let ngram = split(&self.keys.key(id)?);
      if ngram.len() > self.config.max_ngram {
        continue;
      }
      let words = ngram
        .iter()
        .map(|value| {
          if self.config.surface_instead_lemmas {
            Word::from_attrs(Some(value.as_str()), None, None, None)
          } else {
            Word::from_attrs(None, Some(value.as_str()), None, None)
          }
        })
        .collect();
      let mut candidate = factory.make(words, None);
      candidate.ngram.add_frequency(LOCALMAXS_CORPUS, self.counts[id] as i64);
      let glue = self.glue(id)?;
      candidate.add_feat("glue", FeatValue::Real(glue));
      self.chain.handle_candidate(candidate, &info)?;
    }
    self.chain.finish()
  }
}
