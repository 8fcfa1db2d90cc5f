//! # The `mwetoolkit` library in Rust
//! Multiword expression extraction from corpora: readers and writers for the
//! common corpus and candidate-list formats, a pattern language over
//! annotated words, candidate extraction (with patterns or LocalMaxs),
//! association and contrastive measures, frequency combination, corpus
//! annotation and evaluation.
//!
//! Every tool is a pipeline: a parser streams entities from its input files
//! into a chain of `filetype::InputHandler` stages, the last of which is a
//! printer.

#![warn(
  missing_docs,
  trivial_casts,
  trivial_numeric_casts,
  unused_import_braces,
  unused_qualifications
)]

#[macro_use]
pub mod util;
pub mod error;

pub mod base;
pub mod filetype;
pub mod index;
pub mod patterns;

pub mod annotate;
pub mod candidates;
pub mod combine;
pub mod evaluation;
pub mod localmaxs;
pub mod measures;
pub mod transform;

pub use crate::error::{Error, Result};
