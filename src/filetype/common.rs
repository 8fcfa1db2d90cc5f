//! Pieces shared by parsers and printers: directives, escaping,
//! the per-file parsing context and the line-oriented parser driver
use lazy_static::lazy_static;
use log::{debug, error, warn};
use regex::Regex;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fmt;
use std::io::{self, BufRead, Write};
use std::rc::Rc;

use super::handler::{Entity, InputHandler};
use super::input::InputFile;
use super::{Category, FiletypeInfo, ParseInfo};
use crate::base::Sentence;
use crate::error::{Error, Result};

lazy_static! {
  static ref DIRECTIVE: Regex = Regex::new(r#"^ *MWETOOLKIT: *(\w+)="(.*?)" *$"#).unwrap();
  /// Same as a directive line, but searched anywhere in a file header
  pub static ref HEADER_DIRECTIVE: Regex = Regex::new(r#"(?m) *MWETOOLKIT: *(\w+)="(.*?)" *$"#).unwrap();
}

/// An in-band `MWETOOLKIT: key="value"` instruction carried by a comment
#[derive(Debug, Clone, PartialEq)]
pub struct Directive {
  /// directive name, e.g. `filetype`
  pub key: String,
  /// directive value
  pub value: String,
}

impl Directive {
  /// A new directive
  pub fn new(key: &str, value: &str) -> Self {
    Directive {
      key: key.to_string(),
      value: value.to_string(),
    }
  }

  /// Reads a directive from comment text, if it is one
  pub fn parse(comment: &str) -> Option<Directive> {
    DIRECTIVE
      .captures(comment)
      .map(|caps| Directive::new(&caps[1], &caps[2]))
  }
}

impl fmt::Display for Directive {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "MWETOOLKIT: {}=\"{}\"", self.key, self.value)
  }
}

/// Applies `(unescaped, escaped)` pairs in order; the escape character comes first
pub fn escape(pairs: &[(&str, &str)], text: &str) -> String {
  let mut escaped = text.to_string();
  for &(plain, coded) in pairs {
    if escaped.contains(plain) {
      escaped = escaped.replace(plain, coded);
    }
  }
  escaped
}

/// Undoes `escape`, decoding the escape character last
pub fn unescape(pairs: &[(&str, &str)], text: &str) -> String {
  let mut plain = text.to_string();
  for &(unescaped, coded) in pairs.iter().rev() {
    if plain.contains(coded) {
      plain = plain.replace(coded, unescaped);
    }
  }
  plain
}

/// State of one file being parsed.
///
/// Entities built over several lines wait in a partial slot, which is flushed
/// when the next entity starts, at the end of the file and when parsing aborts.
pub struct ParsingContext<'h> {
  handler: &'h mut dyn InputHandler,
  /// where we are
  pub info: ParseInfo,
  partial: Option<Entity>,
}

impl<'h> ParsingContext<'h> {
  /// Runs `body` between `before_file` and `after_file`.
  ///
  /// `after_file` is always called. A `StopParsing` raised anywhere inside still
  /// flushes the partial slot and is handed back so that the caller stops reading.
  pub fn run<F>(handler: &'h mut dyn InputHandler, info: ParseInfo, body: F) -> Result<()>
  where F: FnOnce(&mut ParsingContext<'h>) -> Result<()> {
    let mut ctx = ParsingContext {
      handler,
      info,
      partial: None,
    };
    let outcome = match ctx.handler.before_file(&ctx.info) {
      Ok(()) => body(&mut ctx).and_then(|()| ctx.flush_partial()),
      Err(err) => Err(err),
    };
    let outcome = match outcome {
      Err(Error::StopParsing) => match ctx.flush_partial() {
        Ok(()) | Err(Error::StopParsing) => Err(Error::StopParsing),
        Err(err) => Err(err),
      },
      Err(err) => {
        if !err.is_broken_pipe() {
          if let Err(lost) = ctx.flush_partial() {
            debug!("Could not flush pending entity: {}", lost);
          }
        }
        Err(err)
      },
      Ok(()) => Ok(()),
    };
    let closed = ctx.handler.after_file(&ctx.info);
    match outcome {
      Ok(()) => closed,
      Err(Error::StopParsing) => closed.and(Err(Error::StopParsing)),
      Err(err) => {
        if !err.is_broken_pipe() {
          report(&err, &ctx.info);
        }
        Err(err)
      },
    }
  }

  /// The handler receiving this file's entities
  pub fn handler(&mut self) -> &mut dyn InputHandler {
    let handler: &mut dyn InputHandler = &mut *self.handler;
    handler
  }

  /// Sends an entity downstream right away
  pub fn emit(&mut self, entity: Entity) -> Result<()> { self.handler.handle(entity, &self.info) }

  /// Flushes the pending entity and keeps `entity` pending instead
  pub fn new_partial(&mut self, entity: Entity) -> Result<()> {
    self.flush_partial()?;
    self.partial = Some(entity);
    Ok(())
  }

  /// Sends the pending entity downstream, if any
  pub fn flush_partial(&mut self) -> Result<()> {
    match self.partial.take() {
      Some(entity) => self.handler.handle(entity, &self.info),
      None => Ok(()),
    }
  }

  /// The pending sentence, if the pending entity is one
  pub fn partial_sentence(&mut self) -> Option<&mut Sentence> {
    match self.partial {
      Some(Entity::Sentence(ref mut sentence)) => Some(sentence),
      _ => None,
    }
  }

  /// Drops the pending entity without sending it
  pub fn discard_partial(&mut self) { self.partial = None; }

  /// Delivers the text of a comment line as a directive or a plain comment
  pub fn handle_comment_line(&mut self, text: &str) -> Result<()> {
    self.flush_partial()?;
    let text = text.trim();
    match Directive::parse(text) {
      Some(directive) => self.handler.handle_directive(&directive, &self.info),
      None => self.handler.handle_comment(text, &self.info),
    }
  }

  /// A user-input error pointing at the current line
  pub fn input_error<S: Into<String>>(&self, message: S) -> Error {
    Error::input(&self.info.filename, self.info.linenum, message)
  }
}

fn report(err: &Error, info: &ParseInfo) {
  match *err {
    Error::InputFormat { .. } => error!("{}", err),
    Error::BadIndex { .. } | Error::InvalidAttribute(_) | Error::Xml(_) => match info.linenum {
      Some(line) => error!("{} (line {} of {})", err, line, info.filename),
      None => error!("{} (in {})", err, info.filename),
    },
    _ => error!(
      "UNEXPECTED ERROR when parsing input line {} of {}: {}",
      info.linenum.map(|l| l.to_string()).unwrap_or_else(|| "?".into()),
      info.filename,
      err
    ),
  }
}

/// A parser working one line at a time
pub trait LineParser {
  /// Lines starting with this are comments
  const COMMENT_PREFIX: &'static str = "#";

  /// Handles a line that is not a comment, trailing newline removed
  fn parse_line(&mut self, line: &str, ctx: &mut ParsingContext) -> Result<()>;
}

/// Drives a `LineParser` over a whole input file.
///
/// Comment lines become comments or directives, and a blank line right after a
/// comment is kept as an empty comment. Malformed lines are skipped with a warning.
pub fn parse_text<P: LineParser>(
  parser: &mut P,
  input: &mut InputFile,
  handler: &mut dyn InputHandler,
  info: ParseInfo,
) -> Result<()>
{
  ParsingContext::run(handler, info, |ctx| {
    let mut buffer = Vec::new();
    let mut linenum = 0;
    let mut after_comment = false;
    loop {
      buffer.clear();
      if input.reader().read_until(b'\n', &mut buffer)? == 0 {
        break;
      }
      linenum += 1;
      ctx.info.linenum = Some(linenum);
      ctx.info.progress = input.progress();
      let decoded = String::from_utf8_lossy(&buffer);
      if let Cow::Owned(_) = decoded {
        warn_once!("Invalid UTF-8 replaced in {} (line {})", ctx.info.filename, linenum);
      }
      let line = decoded.trim_end_matches(|c| c == '\n' || c == '\r');
      let stripped = line.trim_start();
      if stripped.starts_with(P::COMMENT_PREFIX) {
        ctx.handle_comment_line(&stripped[P::COMMENT_PREFIX.len()..])?;
        after_comment = true;
        continue;
      }
      if line.is_empty() && after_comment {
        after_comment = false;
        ctx.handle_comment_line("")?;
        continue;
      }
      after_comment = false;
      match parser.parse_line(line, ctx) {
        Err(err @ Error::InputFormat { .. }) => warn!("{}", err),
        other => other?,
      }
    }
    Ok(())
  })
}

/// Output side common to all printers: category check, escaping, comments, the filetype directive
pub struct PrinterCore {
  /// what is being printed
  pub filetype: &'static FiletypeInfo,
  /// which category of entities is printed
  pub category: Category,
  output: Box<dyn Write>,
  wrote_directive: bool,
}

impl PrinterCore {
  /// Fails unless `filetype` can print `category`
  pub fn new(filetype: &'static FiletypeInfo, category: Category, output: Box<dyn Write>) -> Result<Self> {
    if !filetype.output_categories.contains(&category) {
      return Err(Error::BadCategory {
        filetype: filetype.ext.to_string(),
        category: category.name().to_string(),
      });
    }
    Ok(PrinterCore {
      filetype,
      category,
      output,
      wrote_directive: false,
    })
  }

  /// Writes `text` verbatim
  pub fn add_string(&mut self, text: &str) -> Result<()> {
    self.output.write_all(text.as_bytes())?;
    Ok(())
  }

  /// Escapes `text` for this filetype
  pub fn escape(&self, text: &str) -> String { escape(self.filetype.escape_pairs, text) }

  /// Writes a comment, one prefixed line per line of `comment`
  pub fn write_comment(&mut self, comment: &str) -> Result<()> {
    let prefix = self.filetype.comment_prefix;
    for line in comment.split('\n') {
      if line.is_empty() {
        self.add_string("\n")?;
      } else {
        let text = format!("{} {}\n", prefix, line);
        self.add_string(&text)?;
      }
    }
    Ok(())
  }

  /// Writes a directive as a comment
  pub fn write_directive(&mut self, directive: &Directive) -> Result<()> {
    self.write_comment(&directive.to_string())
  }

  /// Forwards directives other than `filetype`, which each printer writes on its own
  pub fn handle_directive(&mut self, directive: &Directive) -> Result<()> {
    if directive.key == "filetype" {
      Ok(())
    } else {
      self.write_directive(directive)
    }
  }

  /// Writes the filetype directive the first time it is called
  pub fn before_file(&mut self) -> Result<()> {
    if self.wrote_directive {
      return Ok(());
    }
    self.wrote_directive = true;
    let directive = self.filetype_directive();
    self.write_directive(&directive)
  }

  /// Marks the filetype directive as written, for printers with their own header
  pub fn take_directive(&mut self) -> Option<Directive> {
    if self.wrote_directive {
      None
    } else {
      self.wrote_directive = true;
      Some(self.filetype_directive())
    }
  }

  fn filetype_directive(&self) -> Directive { Directive::new("filetype", self.filetype.ext) }

  /// Flushes the output
  pub fn flush(&mut self) -> Result<()> {
    self.output.flush()?;
    Ok(())
  }
}

/// The `InputHandler` methods every printer shares with its `PrinterCore`
macro_rules! printer_core_methods {
  () => {
    fn handle_comment(&mut self, comment: &str, _info: &$crate::filetype::ParseInfo) -> $crate::error::Result<()> {
      self.core.write_comment(comment)
    }

    fn handle_directive(
      &mut self,
      directive: &$crate::filetype::common::Directive,
      _info: &$crate::filetype::ParseInfo,
    ) -> $crate::error::Result<()>
    {
      self.core.handle_directive(directive)
    }

    fn flush(&mut self) -> $crate::error::Result<()> { self.core.flush() }
  };
}

/// An in-memory output that can be read back while a printer holds it
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
  /// An empty buffer
  pub fn new() -> Self { SharedBuffer::default() }

  /// Everything written so far
  pub fn contents(&self) -> String { String::from_utf8_lossy(&self.0.borrow()).into_owned() }

  /// A boxed handle on the same buffer, to hand to a printer
  pub fn boxed(&self) -> Box<dyn Write> { Box::new(self.clone()) }
}

impl Write for SharedBuffer {
  fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
    self.0.borrow_mut().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

#[cfg(test)]
mod tests {
  use super::*;

  const PAIRS: &[(&str, &str)] = &[("$", "${dollar}"), (" ", "${space}"), ("_", "${underscore}")];

  #[test]
  fn escaping_is_invertible() {
    for text in &["a b", "a_b c", "$", "${space}", "${dollar}", "plain", "$ _$"] {
      let escaped = escape(PAIRS, text);
      assert!(!escaped.contains(' '));
      assert_eq!(unescape(PAIRS, &escaped), *text);
    }
    assert_eq!(escape(PAIRS, "a b$"), "a${space}b${dollar}");
  }

  #[test]
  fn directives_are_recognized() {
    let directive = Directive::parse(" MWETOOLKIT: filetype=\"CONLL\"").unwrap();
    assert_eq!(directive, Directive::new("filetype", "CONLL"));
    assert_eq!(directive.to_string(), "MWETOOLKIT: filetype=\"CONLL\"");
    assert!(Directive::parse("just a comment").is_none());
  }

  #[test]
  fn shared_buffer_collects_output() {
    let buffer = SharedBuffer::new();
    let mut handle = buffer.boxed();
    handle.write_all(b"abc").unwrap();
    assert_eq!(buffer.contents(), "abc");
  }
}
