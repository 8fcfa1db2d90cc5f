//! The code for the actual matching
//!
//! A pattern is matched by backtracking over its tree. At each start position,
//! every way of matching is enumerated in preference order: greedy repeats try
//! one more iteration first, alternations try their branches in order. Among
//! those, one match is kept per end position, the preferred one, longest first.
//!
//! A repeat reaching a position again with the same captures would only
//! enumerate the same matches again, later; such paths are cut, which keeps
//! nested repeats polynomial.

use std::cell::RefCell;
use std::collections::HashSet;
use std::str::FromStr;

use crate::base::{Ngram, Word, WordAttr};
use crate::error::{Error, Result};
use crate::patterns::rules::*;
use crate::util::debug_id_order;

/*
 * MATCH OPTIONS
 */

/// Which of the matches starting at a given position are returned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchDistance {
  /// every one of them
  All,
  /// the longest only
  Longest,
  /// the shortest only
  Shortest,
}

impl FromStr for MatchDistance {
  type Err = Error;
  fn from_str(name: &str) -> Result<Self> {
    match name {
      "All" => Ok(MatchDistance::All),
      "Longest" => Ok(MatchDistance::Longest),
      "Shortest" => Ok(MatchDistance::Shortest),
      other => Err(Error::Options(format!("Bad match distance: {:?}", other))),
    }
  }
}

/// How matches are enumerated and shaped
#[derive(Debug, Clone)]
pub struct MatchOptions {
  /// which matches to return at each start position
  pub distance: MatchDistance,
  /// whether a match may start inside the previous one
  pub overlapping: bool,
  /// only match at the first word
  pub anchor_begin: bool,
  /// only match up to the last word
  pub anchor_end: bool,
  /// order of the captured groups in the result; `*` is everything else
  pub id_order: Vec<String>,
}

impl Default for MatchOptions {
  fn default() -> Self {
    MatchOptions {
      distance: MatchDistance::All,
      overlapping: true,
      anchor_begin: false,
      anchor_end: false,
      id_order: vec!["*".to_string()],
    }
  }
}

impl MatchOptions {
  /// Refuses illegal combinations
  pub fn validate(&self) -> Result<()> {
    if self.distance == MatchDistance::All && !self.overlapping {
      options_error!("Match distance All requires overlapping matches");
    }
    Ok(())
  }
}

/// Parses an id order of the form `a:b:*`
pub fn parse_id_order(spec: &str) -> Vec<String> {
  spec.split(':').filter(|s| !s.is_empty()).map(str::to_string).collect()
}

/// A match: the words in id order, and their 0-based positions in the sentence
#[derive(Debug, Clone)]
pub struct PatternMatch {
  /// the matched words, ignored ones excluded
  pub ngram: Ngram,
  /// sentence positions of the words of `ngram`, in the same order
  pub indexes: Vec<usize>,
}

/*
 * MATCHING STATE
 */

/// Captures made so far along one matching path
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct MatchState {
  spans: Vec<Option<(usize, usize)>>,
  foredeps: Vec<Option<usize>>,
}

type Cont<'a> = dyn FnMut(usize, &MatchState) + 'a;

/// Iteration count, position and captures a repeat was already tried with
type Visited = RefCell<HashSet<(usize, usize, MatchState)>>;

struct Matcher<'p, 'w> {
  pattern: &'p ParsedPattern,
  words: &'w [Word],
}

/// Matches `*` against any run of characters
fn glob_matches(glob: &str, value: &str) -> bool {
  let parts: Vec<&str> = glob.split('*').collect();
  if parts.len() == 1 {
    return glob == value;
  }
  let (first, last) = (parts[0], parts[parts.len() - 1]);
  if value.len() < first.len() + last.len() || !value.starts_with(first) || !value.ends_with(last) {
    return false;
  }
  let mut rest = &value[first.len()..value.len() - last.len()];
  for part in &parts[1..parts.len() - 1] {
    match rest.find(part) {
      Some(at) => rest = &rest[at + part.len()..],
      None => return false,
    }
  }
  true
}

/// The `rel:head` entries of the `syn` attribute
fn syn_entries(word: &Word) -> impl Iterator<Item = (&str, &str)> + '_ {
  word
    .syn
    .as_deref()
    .unwrap_or("")
    .split(';')
    .filter_map(|entry| entry.rfind(':').map(|colon| (&entry[..colon], &entry[colon + 1..])))
}

fn same_words(a: &[Word], b: &[Word]) -> bool {
  a.len() == b.len()
    && a
      .iter()
      .zip(b)
      .all(|(x, y)| WordAttr::ALL.iter().all(|&attr| x.get(attr) == y.get(attr)))
}

impl<'p, 'w> Matcher<'p, 'w> {
  fn attr(&self, pos: usize, attr: WordAttr) -> &'w str {
    let words: &'w [Word] = self.words;
    words[pos].get(attr).unwrap_or("")
  }

  fn match_node(&self, node: &PatternNode, pos: usize, state: &MatchState, k: &mut Cont) {
    match *node {
      PatternNode::Word(ref word) => self.match_word(word, pos, state, k),
      PatternNode::Seq(ref group) | PatternNode::Either(ref group) => self.match_group(node, group, pos, state, k),
      PatternNode::BackPat(slot) => {
        if let Some((beg, end)) = state.spans[slot] {
          let len = end - beg;
          if pos + len <= self.words.len() && same_words(&self.words[beg..end], &self.words[pos..pos + len]) {
            k(pos + len, state);
          }
        }
      },
    }
  }

  fn match_word(&self, word: &WordPattern, pos: usize, state: &MatchState, k: &mut Cont) {
    if pos >= self.words.len() {
      return;
    }
    for (attr, constraint) in &word.constraints {
      let value = self.attr(pos, *attr);
      let ok = match *constraint {
        AttrConstraint::Glob(ref glob) => glob_matches(glob, value),
        AttrConstraint::BackRef { slot, attr: ref_attr } => match state.spans[slot] {
          Some((beg, _)) => self.attr(beg, ref_attr) == value,
          None => false,
        },
      };
      if !ok {
        return;
      }
    }
    if word
      .negations
      .iter()
      .any(|(attr, glob)| glob_matches(glob, self.attr(pos, *attr)))
    {
      return;
    }
    if let Some(foredep) = word.foredep_check {
      if state.foredeps[foredep] != Some(pos + 1) {
        return;
      }
    }
    let mut state = state.clone();
    if let Some(slot) = word.slot {
      state.spans[slot] = Some((pos, pos + 1));
    }
    match word.syndep {
      None => k(pos + 1, &state),
      Some(SynDep::Back { ref rel, slot }) => {
        let head = match state.spans[slot] {
          Some((beg, _)) => (beg + 1).to_string(),
          None => return,
        };
        if syn_entries(&self.words[pos]).any(|(r, h)| r == rel && h == head) {
          k(pos + 1, &state);
        }
      },
      Some(SynDep::Fore { ref rel, foredep }) => {
        for (r, h) in syn_entries(&self.words[pos]) {
          if r != rel {
            continue;
          }
          if let Ok(head) = h.parse::<usize>() {
            let mut state = state.clone();
            state.foredeps[foredep] = Some(head);
            k(pos + 1, &state);
          }
        }
      },
    }
  }

  fn match_group(&self, node: &PatternNode, group: &Group, pos: usize, state: &MatchState, k: &mut Cont) {
    if group.anchor_start && pos != 0 {
      return;
    }
    let n = self.words.len();
    let visited = Visited::default();
    self.match_repeat(node, group, &visited, 0, pos, state, &mut |end, st| {
      if group.anchor_end && end != n {
        return;
      }
      let mut st = st.clone();
      for slot in group.slot.iter().chain(group.ignore.iter()) {
        st.spans[*slot] = Some((pos, end));
      }
      k(end, &st)
    });
  }

  /// Greedy: one more iteration is always tried before stopping
  fn match_repeat(
    &self,
    node: &PatternNode,
    group: &Group,
    visited: &Visited,
    count: usize,
    pos: usize,
    state: &MatchState,
    k: &mut Cont,
  )
  {
    let Repeat { min, max } = group.repeat;
    // past `min`, an unbounded repeat behaves the same whatever its count
    let seen_count = if max.is_none() && count >= min { min } else { count };
    if !visited.borrow_mut().insert((seen_count, pos, state.clone())) {
      return;
    }
    if max.map_or(true, |max| count < max) {
      self.match_once(node, group, pos, state, &mut |next, st| {
        if next == pos && count >= min {
          return;
        }
        self.match_repeat(node, group, visited, count + 1, next, st, k)
      });
    }
    if count >= min {
      k(pos, state);
    }
  }

  fn match_once(&self, node: &PatternNode, group: &Group, pos: usize, state: &MatchState, k: &mut Cont) {
    match *node {
      PatternNode::Either(_) => {
        for branch in &group.children {
          self.match_node(branch, pos, state, k);
        }
      },
      _ => self.match_seq(&group.children, pos, state, k),
    }
  }

  fn match_seq(&self, children: &[PatternNode], pos: usize, state: &MatchState, k: &mut Cont) {
    match children.split_first() {
      None => k(pos, state),
      Some((first, rest)) => self.match_node(first, pos, state, &mut |next, st| self.match_seq(rest, next, st, k)),
    }
  }

  /// Preferred match for each end position, longest first
  fn matches_at(&self, start: usize, anchor_end: bool) -> Vec<(usize, MatchState)> {
    let initial = MatchState {
      spans: vec![None; self.pattern.slots.len()],
      foredeps: vec![None; self.pattern.foredeps],
    };
    let mut all = Vec::new();
    self.match_node(&self.pattern.root, start, &initial, &mut |end, st| {
      all.push((end, st.clone()));
    });
    let mut chosen: Vec<(usize, MatchState)> = Vec::new();
    let mut bound = usize::max_value();
    while let Some(found) = all.iter().find(|(end, _)| *end < bound) {
      bound = found.0;
      if !anchor_end || found.0 == self.words.len() {
        chosen.push(found.clone());
      }
    }
    chosen.retain(|(end, _)| *end > start);
    chosen
  }

  /// Arranges the words of a match in id order, dropping the ignored ones
  fn shape(&self, start: usize, end: usize, state: &MatchState, id_order: &[Option<usize>]) -> PatternMatch {
    let slots = &self.pattern.slots;
    let interesting = |slot: usize| slots[slot] == SlotKind::Ignore || id_order.contains(&Some(slot));
    let mut groups: Vec<(Vec<Word>, Vec<usize>)> = vec![(Vec::new(), Vec::new()); id_order.len()];
    for pos in start..end {
      let innermost = (0..slots.len())
        .rev()
        .filter(|&slot| interesting(slot))
        .find(|&slot| state.spans[slot].map_or(false, |(beg, end)| beg <= pos && pos < end));
      if let Some(slot) = innermost {
        if slots[slot] == SlotKind::Ignore {
          continue;
        }
      }
      if let Some(i) = id_order.iter().position(|&group| group == innermost) {
        groups[i].0.push(self.words[pos].clone());
        groups[i].1.push(pos);
      }
    }
    if debug_id_order() {
      for (words, _) in groups.iter_mut() {
        if words.is_empty() {
          words.push(Word::from_attrs(Some(""), Some(""), None, None));
        }
        let first = words[0].lemma.take().unwrap_or_default();
        words[0].lemma = Some(format!("{{{}", first));
        let last = words.len() - 1;
        let closing = words[last].lemma.take().unwrap_or_default();
        words[last].lemma = Some(format!("{}}}", closing));
      }
    }
    let mut ngram = Vec::new();
    let mut indexes = Vec::new();
    for (words, positions) in groups {
      ngram.extend(words);
      indexes.extend(positions);
    }
    for word in ngram.iter_mut() {
      word.freqs.clear();
    }
    PatternMatch {
      ngram: Ngram::new(ngram),
      indexes,
    }
  }
}

impl ParsedPattern {
  /// Enumerates the matches of this pattern in `words`
  pub fn matches(&self, words: &[Word], options: &MatchOptions) -> Result<Vec<PatternMatch>> {
    options.validate()?;
    let id_order: Vec<Option<usize>> = options
      .id_order
      .iter()
      .filter_map(|id| {
        if id == "*" {
          Some(None)
        } else {
          match self.slot_of(id) {
            Some(slot) => Some(Some(slot)),
            None => {
              warn_once!("Pattern does not define id \"{}\"", id);
              None
            },
          }
        }
      })
      .collect();
    let matcher = Matcher { pattern: self, words };
    let mut result = Vec::new();
    let mut i = 0;
    while i < words.len() {
      let here = matcher.matches_at(i, options.anchor_end);
      let selected: Vec<&(usize, MatchState)> = match options.distance {
        MatchDistance::All => here.iter().collect(),
        MatchDistance::Longest => here.first().into_iter().collect(),
        MatchDistance::Shortest => here.last().into_iter().collect(),
      };
      let mut next = i + 1;
      for (end, state) in selected {
        result.push(matcher.shape(i, *end, state, &id_order));
        if !options.overlapping {
          next = next.max(*end);
        }
      }
      if options.anchor_begin {
        break;
      }
      i = next;
    }
    Ok(result)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn tagged(text: &str) -> Vec<Word> {
    text
      .split_whitespace()
      .map(|token| {
        let mut parts = token.splitn(2, '/');
        let surface = parts.next().unwrap_or("");
        Word::from_attrs(Some(surface), Some(surface), parts.next(), None)
      })
      .collect()
  }

  fn options(distance: MatchDistance, overlapping: bool) -> MatchOptions {
    MatchOptions {
      distance,
      overlapping,
      ..MatchOptions::default()
    }
  }

  #[test]
  fn globs() {
    assert!(glob_matches("N*", "NN"));
    assert!(glob_matches("*", ""));
    assert!(glob_matches("a*c*e", "abcde"));
    assert!(!glob_matches("a*c*e", "abde"));
    assert!(!glob_matches("N*", ""));
    assert!(!glob_matches("ab*ba", "aba"));
  }

  #[test]
  fn distance_and_overlap() {
    let words = tagged("a/N b/N c/N d/N");
    let pattern = ParsedPattern::from_xml("<pat repeat=\"+\"><w pos=\"N\"/></pat>").unwrap();
    let longest = pattern.matches(&words, &options(MatchDistance::Longest, false)).unwrap();
    assert_eq!(longest.len(), 1);
    assert_eq!(longest[0].indexes, vec![0, 1, 2, 3]);
    let shortest = pattern.matches(&words, &options(MatchDistance::Shortest, true)).unwrap();
    assert_eq!(shortest.len(), 4);
    assert!(shortest.iter().all(|m| m.ngram.len() == 1));
    let all = pattern.matches(&words, &options(MatchDistance::All, true)).unwrap();
    assert_eq!(all.len(), 10);
    assert!(pattern.matches(&words, &options(MatchDistance::All, false)).is_err());
  }

  #[test]
  fn nested_repeats_stay_polynomial() {
    let text: Vec<String> = (0..30).map(|i| format!("w{}/N", i)).collect();
    let words = tagged(&text.join(" "));
    let pattern =
      ParsedPattern::from_xml("<pat><pat repeat=\"*\"><pat repeat=\"+\"><w pos=\"N\"/></pat></pat></pat>").unwrap();
    let longest = pattern.matches(&words, &options(MatchDistance::Longest, false)).unwrap();
    assert_eq!(longest.len(), 1);
    assert_eq!(longest[0].indexes, (0..30).collect::<Vec<usize>>());
    let all = pattern.matches(&words, &options(MatchDistance::All, true)).unwrap();
    assert_eq!(all.len(), 30 * 31 / 2);
  }

  #[test]
  fn ignored_words_are_dropped() {
    let words = tagged("take/V the/D money/N out/P");
    let pattern = ParsedPattern::from_xml(
      "<pat><w pos=\"V\"/><pat repeat=\"*\" ignore=\"true\"><w/></pat><w pos=\"P\"/></pat>",
    )
    .unwrap();
    let found = pattern.matches(&words, &options(MatchDistance::Longest, true)).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].indexes, vec![0, 3]);
    assert_eq!(found[0].ngram.words[1].surface.as_deref(), Some("out"));
  }

  #[test]
  fn id_order_rearranges_groups() {
    let words = tagged("big/J red/J car/N");
    let pattern = ParsedPattern::from_xml("<pat><w id=\"adj\" pos=\"J\"/><w pos=\"J\"/><w id=\"noun\" pos=\"N\"/></pat>").unwrap();
    let mut opts = MatchOptions::default();
    opts.id_order = parse_id_order("noun:*:adj");
    let found = pattern.matches(&words, &opts).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].indexes, vec![2, 1, 0]);
  }

  #[test]
  fn negation_and_back_references() {
    let words = tagged("go/V go/V went/V");
    let repeated = ParsedPattern::from_xml("<pat><w id=\"a\"/><w lemma=\"back:a.lemma\"/></pat>").unwrap();
    let found = repeated.matches(&words, &MatchOptions::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].indexes, vec![0, 1]);

    let negated = ParsedPattern::from_xml("<pat><w><neg lemma=\"go\"/></w></pat>").unwrap();
    let found = negated.matches(&words, &MatchOptions::default()).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].indexes, vec![2]);
  }

  #[test]
  fn syntactic_dependencies() {
    let mut words = tagged("the/D cat/N sleeps/V");
    words[0].syn = Some("det:2".to_string());
    words[1].syn = Some("nsubj:3".to_string());
    words[2].syn = Some("root:0".to_string());
    let fore = ParsedPattern::from_xml("<pat><w pos=\"N\" syndep=\"nsubj:v\"/><w id=\"v\" pos=\"V\"/></pat>").unwrap();
    assert_eq!(fore.matches(&words, &MatchOptions::default()).unwrap().len(), 1);
    let back = ParsedPattern::from_xml("<pat><w id=\"d\" pos=\"D\"/><w syndep=\"det:d\"/></pat>").unwrap();
    assert!(back.matches(&words, &MatchOptions::default()).unwrap().is_empty());
  }

  #[test]
  fn generic_ngrams() {
    let words = tagged("a b c");
    let found = ParsedPattern::generic(1, 2).matches(&words, &MatchOptions::default()).unwrap();
    let spans: Vec<Vec<usize>> = found.into_iter().map(|m| m.indexes).collect();
    assert_eq!(spans, vec![vec![0, 1], vec![0], vec![1, 2], vec![1], vec![2]]);
  }
}
