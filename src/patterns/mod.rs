//! Patterns over sentences: loading them from XML and enumerating their matches

mod matching;
mod rules;
pub mod utils;

pub use self::matching::{parse_id_order, MatchDistance, MatchOptions, PatternMatch};
pub use self::rules::{ParsedPattern, Repeat};

use crate::error::{Error, Result};
use crate::filetype::{self, EntityCollectorHandler, ParseOptions};

/// Loads every pattern of a patterns file, in any format that holds patterns
pub fn load_patterns(path: &str, filetype: Option<&str>) -> Result<Vec<ParsedPattern>> {
  let mut collector = EntityCollectorHandler::new();
  filetype::parse(&[path.to_string()], &mut collector, &ParseOptions::with_filetype(filetype))
    .map_err(|err| Error::Pattern(format!("Could not load patterns from {}: {}", path, err)))?;
  let patterns = collector.into_patterns();
  if patterns.is_empty() {
    return Err(Error::Pattern(format!("No pattern found in {}", path)));
  }
  Ok(patterns)
}
