//! Errors shared by every stage of the toolkit
use std::error;
use std::fmt;
use std::io;
use std::num;
use std::result;

/// Type alias for toolkit errors
pub type Result<X> = result::Result<X, Error>;

/// Wrapper for the kinds of errors occuring while parsing, matching and printing
#[derive(Debug)]
pub enum Error {
  /// Underlying I/O failure
  Io(io::Error),
  /// Integer field that failed to parse
  ParseInt(num::ParseIntError),
  /// Real-valued field that failed to parse
  ParseFloat(num::ParseFloatError),
  /// libxml could not build a DOM
  Xml(String),
  /// Zip archive could not be opened
  Zip(String),
  /// Malformed user input, pointing at a file and line
  InputFormat {
    /// name of the offending file
    file: String,
    /// 1-based line, when known
    line: Option<usize>,
    /// what went wrong
    message: String,
  },
  /// The requested or detected filetype does not exist
  UnknownFiletype(String),
  /// The filetype cannot be read
  NoParser(String),
  /// The filetype cannot be written
  NoPrinter(String),
  /// A printer was asked for a category it cannot hold
  BadCategory {
    /// filetype extension of the printer
    filetype: String,
    /// category requested
    category: String,
  },
  /// Malformed pattern, refused before any input is read
  Pattern(String),
  /// Illegal option combination
  Options(String),
  /// A word attribute holds one of the internal separator characters
  InvalidAttribute(String),
  /// An MWE occurrence points outside of its sentence
  BadIndex {
    /// id of the referenced candidate
    candidate: u64,
    /// id of the sentence
    sentence: u64,
    /// 1-based index that was out of range
    index: usize,
  },
  /// Control-flow signal: stop reading input, flush, and finish cleanly
  StopParsing,
  /// Some input files were aborted; the others were processed
  FilesFailed(usize),
  /// Anything else
  Other(String),
}

impl Error {
  /// Builds an `InputFormat` error
  pub fn input<S: Into<String>>(file: &str, line: Option<usize>, message: S) -> Self {
    Error::InputFormat {
      file: file.to_string(),
      line,
      message: message.into(),
    }
  }

  /// Whether this error was caused by bad arguments rather than bad data
  pub fn is_usage(&self) -> bool {
    match *self {
      Error::Options(_) | Error::UnknownFiletype(_) => true,
      _ => false,
    }
  }

  /// Whether this is a closed downstream pipe, which is not worth reporting
  pub fn is_broken_pipe(&self) -> bool {
    match *self {
      Error::Io(ref err) => err.kind() == io::ErrorKind::BrokenPipe,
      _ => false,
    }
  }
}

impl fmt::Display for Error {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match *self {
      Error::Io(ref err) => write!(f, "IO error: {}", err),
      Error::ParseInt(ref err) => write!(f, "Error parsing integer: {}", err),
      Error::ParseFloat(ref err) => write!(f, "Error parsing float: {}", err),
      Error::Xml(ref info) => write!(f, "XML error: {}", info),
      Error::Zip(ref info) => write!(f, "Zip error: {}", info),
      Error::InputFormat {
        ref file,
        ref line,
        ref message,
      } => match *line {
        Some(line) => write!(f, "{} (line {} of {})", message, line, file),
        None => write!(f, "{} (in {})", message, file),
      },
      Error::UnknownFiletype(ref ext) => write!(f, "Unknown file format: {}", ext),
      Error::NoParser(ref ext) => write!(f, "Parser not implemented for: {}", ext),
      Error::NoPrinter(ref ext) => write!(f, "Printer not implemented for: {}", ext),
      Error::BadCategory {
        ref filetype,
        ref category,
      } => write!(f, "Bad printer: {}(category=\"{}\")", filetype, category),
      Error::Pattern(ref info) => write!(f, "Bad pattern: {}", info),
      Error::Options(ref info) => write!(f, "{}", info),
      Error::InvalidAttribute(ref info) => write!(f, "Invalid word attribute: {}", info),
      Error::BadIndex {
        candidate,
        sentence,
        index,
      } => write!(
        f,
        "Candidate {} references bad word index: Sentence {}, index {}",
        candidate, sentence, index
      ),
      Error::StopParsing => write!(f, "parsing stopped"),
      Error::FilesFailed(n) => write!(f, "{} input file(s) could not be processed", n),
      Error::Other(ref info) => write!(f, "{}", info),
    }
  }
}

impl error::Error for Error {
  fn source(&self) -> Option<&(dyn error::Error + 'static)> {
    match *self {
      Error::Io(ref err) => Some(err),
      Error::ParseInt(ref err) => Some(err),
      Error::ParseFloat(ref err) => Some(err),
      _ => None,
    }
  }
}

//
// Convert everything else into Error
//
impl From<io::Error> for Error {
  fn from(err: io::Error) -> Self { Error::Io(err) }
}
impl From<num::ParseIntError> for Error {
  fn from(err: num::ParseIntError) -> Self { Error::ParseInt(err) }
}
impl From<num::ParseFloatError> for Error {
  fn from(err: num::ParseFloatError) -> Self { Error::ParseFloat(err) }
}
impl From<zip::result::ZipError> for Error {
  fn from(err: zip::result::ZipError) -> Self { Error::Zip(err.to_string()) }
}
impl From<String> for Error {
  fn from(info: String) -> Self { Error::Other(info) }
}
