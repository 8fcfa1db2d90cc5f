//! Input files: transparent decompression, header peeking and progress accounting
use bzip2::read::BzDecoder;
use flate2::read::MultiGzDecoder;
use std::cell::Cell;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use zip::ZipArchive;

use crate::error::{Error, Result};

/// How many bytes are peeked at to detect compression and filetypes
pub const HEADER_LEN: usize = 4096;

/// Name under which standard input is reported
pub const STDIN_NAME: &str = "<stdin>";

struct CountingReader {
  inner: Box<dyn Read>,
  consumed: Rc<Cell<u64>>,
}

impl Read for CountingReader {
  fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
    let n = self.inner.read(buf)?;
    self.consumed.set(self.consumed.get() + n as u64);
    Ok(n)
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Compression {
  Zip,
  Bzip2,
  Gzip,
}

impl Compression {
  fn sniff(header: &[u8]) -> Option<Compression> {
    if header.starts_with(b"PK\x03\x04") {
      Some(Compression::Zip)
    } else if header.starts_with(b"BZh") {
      Some(Compression::Bzip2)
    } else if header.starts_with(b"\x1f\x8b\x08") {
      Some(Compression::Gzip)
    } else {
      None
    }
  }

  fn wrap(self, name: &str, mut reader: Box<dyn Read>) -> Result<Box<dyn Read>> {
    Ok(match self {
      Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
      Compression::Gzip => Box::new(MultiGzDecoder::new(reader)),
      Compression::Zip => {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let mut archive = ZipArchive::new(Cursor::new(data))?;
        if archive.len() != 1 {
          return Err(Error::input(
            name,
            None,
            format!("Zip archive must contain exactly one file, found {}", archive.len()),
          ));
        }
        let mut content = Vec::new();
        archive.by_index(0)?.read_to_end(&mut content)?;
        Box::new(Cursor::new(content))
      },
    })
  }
}

/// Reads the first bytes of `reader` and hands them back together with a
/// reader that still yields everything
fn peek(mut reader: Box<dyn Read>) -> Result<(Vec<u8>, Box<dyn Read>)> {
  let mut header = Vec::with_capacity(HEADER_LEN);
  reader.by_ref().take(HEADER_LEN as u64).read_to_end(&mut header)?;
  let rest = Cursor::new(header.clone()).chain(reader);
  Ok((header, Box::new(rest)))
}

/// An opened input, possibly decompressed, whose header can be inspected before parsing
pub struct InputFile {
  /// name used in messages
  pub name: String,
  /// path on disk, `None` for stdin and in-memory inputs
  pub path: Option<PathBuf>,
  reader: Box<dyn BufRead>,
  header: Vec<u8>,
  consumed: Rc<Cell<u64>>,
  compressed: bool,
  beg: u64,
  total: u64,
}

impl InputFile {
  /// Opens `path`, `-` being stdin, and decompresses it if needed
  pub fn open(path: &str) -> Result<InputFile> {
    if path == "-" {
      InputFile::from_reader(STDIN_NAME, Box::new(io::stdin()), 0)
    } else {
      let file = File::open(path)?;
      let size = file.metadata()?.len();
      let mut input = InputFile::from_reader(path, Box::new(file), size)?;
      input.path = Some(PathBuf::from(path));
      Ok(input)
    }
  }

  /// Wraps any reader; `size` is its length in bytes, or 0 if unknown
  pub fn from_reader(name: &str, raw: Box<dyn Read>, size: u64) -> Result<InputFile> {
    let consumed = Rc::new(Cell::new(0));
    let counting = CountingReader {
      inner: raw,
      consumed: consumed.clone(),
    };
    let (header, reader) = peek(Box::new(counting))?;
    let (header, reader, compressed) = match Compression::sniff(&header) {
      Some(compression) => {
        let (header, reader) = peek(compression.wrap(name, reader)?)?;
        (header, reader, true)
      },
      None => (header, reader, false),
    };
    Ok(InputFile {
      name: name.to_string(),
      path: None,
      reader: Box::new(BufReader::new(reader)),
      header,
      consumed,
      compressed,
      beg: 0,
      total: size,
    })
  }

  /// An in-memory input, mostly for tests
  pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<InputFile> {
    InputFile::from_reader(name, Box::new(Cursor::new(bytes.to_vec())), bytes.len() as u64)
  }

  /// Places this file inside a run over several files: `beg` bytes come before it, `total` overall
  pub fn set_offsets(&mut self, beg: u64, total: u64) {
    self.beg = beg;
    self.total = total;
  }

  /// The first bytes of the (decompressed) content
  pub fn header(&self) -> &[u8] { &self.header }

  /// The (decompressed) content, header included
  pub fn reader(&mut self) -> &mut dyn BufRead { &mut *self.reader }

  /// Whether the content was compressed
  pub fn is_compressed(&self) -> bool { self.compressed }

  /// `(bytes consumed, total bytes)`; `(0, 0)` for compressed input, whose size is unknown
  pub fn progress(&self) -> (u64, u64) {
    if self.compressed {
      (0, 0)
    } else {
      (self.beg + self.consumed.get(), self.total)
    }
  }
}

/// Sizes of the files in `paths`, for progress reporting across files
pub fn file_sizes(paths: &[String]) -> Vec<u64> {
  paths
    .iter()
    .map(|p| {
      if p == "-" {
        0
      } else {
        fs::metadata(Path::new(p)).map(|m| m.len()).unwrap_or(0)
      }
    })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use flate2::write::GzEncoder;
  use flate2::Compression as Level;
  use std::io::Write;

  #[test]
  fn plain_input_keeps_its_header() {
    let mut input = InputFile::from_bytes("mem", b"hello\nworld\n").unwrap();
    assert_eq!(input.header(), b"hello\nworld\n");
    let mut text = String::new();
    input.reader().read_to_string(&mut text).unwrap();
    assert_eq!(text, "hello\nworld\n");
    assert!(!input.is_compressed());
  }

  #[test]
  fn gzip_is_decompressed() {
    let mut encoder = GzEncoder::new(Vec::new(), Level::default());
    encoder.write_all(b"a|b|c|d\n").unwrap();
    let bytes = encoder.finish().unwrap();
    let mut input = InputFile::from_bytes("mem.gz", &bytes).unwrap();
    assert!(input.is_compressed());
    assert_eq!(input.header(), b"a|b|c|d\n");
    assert_eq!(input.progress(), (0, 0));
    let mut text = String::new();
    input.reader().read_to_string(&mut text).unwrap();
    assert_eq!(text, "a|b|c|d\n");
  }
}
