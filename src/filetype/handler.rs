//! Handlers consume the entities produced by parsers.
//!
//! Every callback has a default: a handler that declares a downstream handler
//! through `chained()` forwards everything it does not override, and a handler
//! without one ignores what it does not understand, with a warning.
use log::{debug, info, warn};
use std::io::{self, Write};

use super::common::Directive;
use super::{make_printer, Category, ParseInfo};
use crate::base::{Candidate, Meta, Sentence};
use crate::error::Result;
use crate::patterns::ParsedPattern;

/// Anything a parser can emit
#[derive(Debug)]
pub enum Entity {
  /// stream header
  Meta(Meta),
  /// corpus sentence
  Sentence(Sentence),
  /// candidate, or dictionary entry
  Candidate(Candidate),
  /// pattern description
  Pattern(ParsedPattern),
  /// free-text comment
  Comment(String),
  /// `MWETOOLKIT: key="value"` comment
  Directive(Directive),
}

impl Entity {
  /// Short name of the kind of entity, used in progress messages
  pub fn kind(&self) -> &'static str {
    match *self {
      Entity::Meta(_) => "meta",
      Entity::Sentence(_) => "sentence",
      Entity::Candidate(_) => "candidate",
      Entity::Pattern(_) => "pattern",
      Entity::Comment(_) => "comment",
      Entity::Directive(_) => "directive",
    }
  }
}

/// The callbacks of a pipeline stage
pub trait InputHandler {
  /// The downstream handler, if any
  fn chained(&mut self) -> Option<&mut dyn InputHandler> { None }

  /// Called once before the entities of each input file
  fn before_file(&mut self, info: &ParseInfo) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.before_file(info);
    }
    Ok(())
  }

  /// Called once after the entities of each input file, even when parsing was aborted
  fn after_file(&mut self, info: &ParseInfo) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.after_file(info);
    }
    Ok(())
  }

  /// Called once after the last input file
  fn finish(&mut self) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.finish();
    }
    self.flush()
  }

  /// Pushes buffered output downstream
  fn flush(&mut self) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.flush();
    }
    Ok(())
  }

  /// Stream header
  fn handle_meta(&mut self, meta: Meta, info: &ParseInfo) -> Result<()> {
    self.fallback(Entity::Meta(meta), info)
  }

  /// Corpus sentence
  fn handle_sentence(&mut self, sentence: Sentence, info: &ParseInfo) -> Result<()> {
    self.fallback(Entity::Sentence(sentence), info)
  }

  /// Candidate, or dictionary entry
  fn handle_candidate(&mut self, candidate: Candidate, info: &ParseInfo) -> Result<()> {
    self.fallback(Entity::Candidate(candidate), info)
  }

  /// Pattern
  fn handle_pattern(&mut self, pattern: ParsedPattern, info: &ParseInfo) -> Result<()> {
    self.fallback(Entity::Pattern(pattern), info)
  }

  /// Comment, without its comment prefix
  fn handle_comment(&mut self, comment: &str, info: &ParseInfo) -> Result<()> {
    self.fallback(Entity::Comment(comment.to_string()), info)
  }

  /// Directive found in a comment
  fn handle_directive(&mut self, directive: &Directive, info: &ParseInfo) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.handle_directive(directive, info);
    }
    if directive.key != "filetype" {
      warn_once!("Unknown directive: {}", directive.key);
    }
    Ok(())
  }

  /// Dispatches `entity` to the matching callback
  fn handle(&mut self, entity: Entity, info: &ParseInfo) -> Result<()> {
    match entity {
      Entity::Meta(meta) => self.handle_meta(meta, info),
      Entity::Sentence(sentence) => self.handle_sentence(sentence, info),
      Entity::Candidate(candidate) => self.handle_candidate(candidate, info),
      Entity::Pattern(pattern) => self.handle_pattern(pattern, info),
      Entity::Comment(comment) => self.handle_comment(&comment, info),
      Entity::Directive(directive) => self.handle_directive(&directive, info),
    }
  }

  /// What happens to entities that have no dedicated callback
  fn fallback(&mut self, entity: Entity, info: &ParseInfo) -> Result<()> {
    if let Some(next) = self.chained() {
      return next.handle(entity, info);
    }
    match entity {
      Entity::Comment(_) => {},
      Entity::Meta(ref meta) if meta.is_dummy() => {},
      _ => match info.linenum {
        Some(line) => warn!("Ignoring {} (line {})", entity.kind(), line),
        None => warn!("Ignoring {}", entity.kind()),
      },
    }
    Ok(())
  }
}

/// Outermost handler of every pipeline.
///
/// Makes sure a `Meta` precedes the first entity and reports progress.
pub struct FirstInputHandler<'h> {
  handler: &'h mut dyn InputHandler,
  seen_meta: bool,
  kind: Option<&'static str>,
  count: u64,
}

impl<'h> FirstInputHandler<'h> {
  /// Wraps `handler`
  pub fn new(handler: &'h mut dyn InputHandler) -> Self {
    FirstInputHandler {
      handler,
      seen_meta: false,
      kind: None,
      count: 0,
    }
  }

  /// Number of entities seen so far
  pub fn count(&self) -> u64 { self.count }

  fn observe(&mut self, kind: &'static str, info: &ParseInfo) -> Result<()> {
    if !self.seen_meta {
      self.seen_meta = true;
      debug!("No meta before the first {}, using an empty one", kind);
      self.handler.handle_meta(Meta::new(), info)?;
    }
    self.kind = match self.kind {
      Some(previous) if previous != kind => Some("entity"),
      _ => Some(kind),
    };
    self.count += 1;
    if self.count % 100 == 0 {
      let (done, total) = info.progress;
      let percent = if total > 0 {
        format!(" ({:2.0}%)", 100.0 * done as f64 / total as f64)
      } else {
        String::new()
      };
      info!(
        "~~> Processing {} number {}{}",
        self.kind.unwrap_or("entity"),
        self.count,
        percent
      );
    }
    Ok(())
  }
}

impl<'h> InputHandler for FirstInputHandler<'h> {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> {
    let next: &mut dyn InputHandler = &mut *self.handler;
    Some(next)
  }

  fn handle_meta(&mut self, meta: Meta, info: &ParseInfo) -> Result<()> {
    self.seen_meta = true;
    self.handler.handle_meta(meta, info)
  }

  fn handle_sentence(&mut self, sentence: Sentence, info: &ParseInfo) -> Result<()> {
    self.observe("sentence", info)?;
    self.handler.handle_sentence(sentence, info)
  }

  fn handle_candidate(&mut self, candidate: Candidate, info: &ParseInfo) -> Result<()> {
    self.observe("candidate", info)?;
    self.handler.handle_candidate(candidate, info)
  }

  fn handle_pattern(&mut self, pattern: ParsedPattern, info: &ParseInfo) -> Result<()> {
    self.observe("pattern", info)?;
    self.handler.handle_pattern(pattern, info)
  }
}

/// Stores every entity it receives, comments and directives aside
#[derive(Debug, Default)]
pub struct EntityCollectorHandler {
  /// entities, in arrival order
  pub entities: Vec<Entity>,
}

impl EntityCollectorHandler {
  /// An empty collector
  pub fn new() -> Self { EntityCollectorHandler::default() }

  /// The collected sentences
  pub fn sentences(&self) -> Vec<&Sentence> {
    self
      .entities
      .iter()
      .filter_map(|e| match *e {
        Entity::Sentence(ref s) => Some(s),
        _ => None,
      })
      .collect()
  }

  /// The collected candidates
  pub fn candidates(&self) -> Vec<&Candidate> {
    self
      .entities
      .iter()
      .filter_map(|e| match *e {
        Entity::Candidate(ref c) => Some(c),
        _ => None,
      })
      .collect()
  }

  /// Gives up the collected sentences
  pub fn into_sentences(self) -> Vec<Sentence> {
    self
      .entities
      .into_iter()
      .filter_map(|e| match e {
        Entity::Sentence(s) => Some(s),
        _ => None,
      })
      .collect()
  }

  /// Gives up the collected candidates
  pub fn into_candidates(self) -> Vec<Candidate> {
    self
      .entities
      .into_iter()
      .filter_map(|e| match e {
        Entity::Candidate(c) => Some(c),
        _ => None,
      })
      .collect()
  }

  /// Gives up the collected patterns
  pub fn into_patterns(self) -> Vec<ParsedPattern> {
    self
      .entities
      .into_iter()
      .filter_map(|e| match e {
        Entity::Pattern(p) => Some(p),
        _ => None,
      })
      .collect()
  }
}

impl InputHandler for EntityCollectorHandler {
  fn fallback(&mut self, entity: Entity, _info: &ParseInfo) -> Result<()> {
    if let Entity::Comment(_) = entity {
      return Ok(());
    }
    self.entities.push(entity);
    Ok(())
  }

  fn handle_directive(&mut self, _directive: &Directive, _info: &ParseInfo) -> Result<()> { Ok(()) }
}

/// A printer that is built when the first file starts, once the input filetype is known.
///
/// The output filetype is the forced one if any, or the one of the input.
pub struct LazyPrinter {
  forced_ext: Option<String>,
  category: Option<Category>,
  output: Option<Box<dyn Write>>,
  printer: Option<Box<dyn InputHandler>>,
}

impl LazyPrinter {
  /// Prints to stdout, in `forced_ext` or in the input filetype
  pub fn new(forced_ext: Option<&str>) -> Self {
    LazyPrinter {
      forced_ext: forced_ext.map(str::to_string),
      category: None,
      output: None,
      printer: None,
    }
  }

  /// Prints into `output` instead of stdout
  pub fn with_output(mut self, output: Box<dyn Write>) -> Self {
    self.output = Some(output);
    self
  }

  /// Prints in `category` regardless of the input category
  pub fn with_category(mut self, category: Category) -> Self {
    self.category = Some(category);
    self
  }

  /// The printer, building it for `info` if needed
  pub fn ensure(&mut self, info: &ParseInfo) -> Result<&mut dyn InputHandler> {
    let printer = match self.printer.take() {
      Some(printer) => printer,
      None => {
        let output = self
          .output
          .take()
          .unwrap_or_else(|| Box::new(io::stdout()) as Box<dyn Write>);
        let ext = self.forced_ext.as_ref().map(String::as_str).unwrap_or(info.filetype);
        make_printer(ext, self.category.unwrap_or(info.category), output)?
      },
    };
    let printer: &mut dyn InputHandler = &mut **self.printer.get_or_insert(printer);
    Ok(printer)
  }

  /// The printer, if it was built already
  pub fn get(&mut self) -> Option<&mut dyn InputHandler> {
    match self.printer.as_mut() {
      Some(printer) => {
        let printer: &mut dyn InputHandler = &mut **printer;
        Some(printer)
      },
      None => None,
    }
  }
}

impl InputHandler for LazyPrinter {
  fn chained(&mut self) -> Option<&mut dyn InputHandler> { self.get() }

  fn before_file(&mut self, info: &ParseInfo) -> Result<()> { self.ensure(info)?.before_file(info) }

  fn finish(&mut self) -> Result<()> {
    match self.get() {
      Some(printer) => printer.finish(),
      None => Ok(()),
    }
  }

  fn fallback(&mut self, entity: Entity, info: &ParseInfo) -> Result<()> { self.ensure(info)?.handle(entity, info) }

  fn handle_directive(&mut self, directive: &Directive, info: &ParseInfo) -> Result<()> {
    self.ensure(info)?.handle_directive(directive, info)
  }
}
