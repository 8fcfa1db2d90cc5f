//! Assorted helpers: one-time warnings, environment switches, CLI plumbing
use lazy_static::lazy_static;
use log::warn;
use std::collections::HashSet;
use std::env;
use std::sync::Mutex;

use crate::error::{Error, Result};

#[macro_use]
pub mod macros;
pub mod cli;
pub mod test;

/// Set to replace timestamps by a fixed sentinel, for diff-based regression tests
pub const DETERMINISTIC_MODE_VAR: &str = "MWETOOLKIT_DETERMINISTIC_MODE";
/// Set to mark the id-order groups of each pattern match with braces
pub const DEBUG_ID_ORDER_VAR: &str = "MWETOOLKIT_DEBUG_ID_ORDER";

lazy_static! {
  static ref SEEN_WARNINGS: Mutex<HashSet<String>> = Mutex::new(HashSet::new());
}

/// Records `message`, returning true only on its first appearance
pub fn first_time(message: &str) -> bool {
  match SEEN_WARNINGS.lock() {
    Ok(mut seen) => seen.insert(message.to_string()),
    Err(_) => true,
  }
}

/// Non-macro entry point used by `warn_once!`
pub fn log_warning(message: &str) { warn!("{}", message); }

/// Whether timestamps must be replaced by a fixed sentinel
pub fn deterministic_mode() -> bool { env::var_os(DETERMINISTIC_MODE_VAR).is_some() }

/// Whether matches should carry brace markers around their id-order groups
pub fn debug_id_order() -> bool { env::var_os(DEBUG_ID_ORDER_VAR).is_some() }

/// Parses an n-gram length range of the form `<min>:<max>` or `<n>`.
/// `min` must be at least 1 and not greater than `max`.
pub fn interpret_ngram(argument: &str) -> Result<(usize, usize)> {
  let parse = |s: &str| {
    s.trim()
      .parse::<usize>()
      .map_err(|_| Error::Options(format!("Invalid argument for -n: {:?}", argument)))
  };
  let (n_min, n_max) = match argument.find(':') {
    Some(colon) => (parse(&argument[..colon])?, parse(&argument[colon + 1..])?),
    None => {
      let n = parse(argument)?;
      (n, n)
    },
  };
  if n_min > n_max {
    options_error!("Error parsing argument for -n: <min> is greater than <max>");
  }
  if n_min < 1 {
    options_error!("Error parsing argument for -n: <min> must be at least 1");
  }
  Ok((n_min, n_max))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn ngram_ranges() {
    assert_eq!(interpret_ngram("3:5").unwrap(), (3, 5));
    assert_eq!(interpret_ngram("2").unwrap(), (2, 2));
    assert!(interpret_ngram("5:3").is_err());
    assert!(interpret_ngram("0:2").is_err());
    assert!(interpret_ngram("a:b").is_err());
  }

  #[test]
  fn warnings_are_remembered() {
    assert!(first_time("util test message"));
    assert!(!first_time("util test message"));
  }
}
