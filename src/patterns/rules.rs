//! The definitions of patterns, and the code for loading them from their XML description

use libxml::parser::Parser;
use libxml::tree::{Document, Node};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::base::WordAttr;
use crate::error::{Error, Result};
use crate::patterns::utils::*;

/*
 * REPEATS
 */

/// How many times a `pat` or `either` may match in a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Repeat {
  /// lower bound
  pub min: usize,
  /// upper bound, `None` for unbounded
  pub max: Option<usize>,
}

impl Repeat {
  /// exactly once, the default
  pub const ONCE: Repeat = Repeat { min: 1, max: Some(1) };

  /// Parses one of `*`, `+`, `?`, `{n}`, `{n,m}`, `{,m}`, `{n,}`
  pub fn parse(spec: &str) -> Result<Repeat> {
    let invalid = || Error::Pattern(format!("Invalid repeat pattern: {:?}", spec));
    match spec {
      "*" => return Ok(Repeat { min: 0, max: None }),
      "+" => return Ok(Repeat { min: 1, max: None }),
      "?" => return Ok(Repeat { min: 0, max: Some(1) }),
      _ => {},
    }
    if !(spec.starts_with('{') && spec.ends_with('}')) || spec.len() < 3 {
      return Err(invalid());
    }
    let inner = &spec[1..spec.len() - 1];
    let bound = |s: &str| -> Result<Option<usize>> {
      if s.is_empty() {
        Ok(None)
      } else if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().map(Some).map_err(|_| invalid())
      } else {
        Err(invalid())
      }
    };
    let repeat = match inner.find(',') {
      None => match bound(inner)? {
        Some(n) => Repeat { min: n, max: Some(n) },
        None => return Err(invalid()),
      },
      Some(comma) => Repeat {
        min: bound(&inner[..comma])?.unwrap_or(0),
        max: bound(&inner[comma + 1..])?,
      },
    };
    if let Some(max) = repeat.max {
      if max < repeat.min {
        return Err(invalid());
      }
    }
    Ok(repeat)
  }
}

/*
 * PATTERN TREE
 */

/// Constraint on one attribute of a word
#[derive(Debug, Clone, PartialEq)]
pub enum AttrConstraint {
  /// the value, where `*` stands for any run of characters
  Glob(String),
  /// the same value as attribute `attr` of the word captured in `slot`
  BackRef {
    /// capture slot of the referenced word
    slot: usize,
    /// which attribute of the referenced word
    attr: WordAttr,
  },
}

/// Syntactic dependency a word must carry in its `syn` attribute
#[derive(Debug, Clone, PartialEq)]
pub enum SynDep {
  /// towards a word matched earlier
  Back {
    /// relation name
    rel: String,
    /// capture slot of the head
    slot: usize,
  },
  /// towards a word matched later; the head number is remembered in `foredep`
  Fore {
    /// relation name
    rel: String,
    /// index of the pending fore-reference
    foredep: usize,
  },
}

/// A pattern for a single word
#[derive(Debug, Clone, Default)]
pub struct WordPattern {
  /// positive constraints
  pub constraints: Vec<(WordAttr, AttrConstraint)>,
  /// globs the attribute must not match
  pub negations: Vec<(WordAttr, String)>,
  /// capture slot, for words with an `id`
  pub slot: Option<usize>,
  /// required dependency
  pub syndep: Option<SynDep>,
  /// fore-reference this word must be the head of
  pub foredep_check: Option<usize>,
}

/// Children of a `pat` or `either`, with their capture and anchoring options
#[derive(Debug, Clone)]
pub struct Group {
  /// sub-patterns
  pub children: Vec<PatternNode>,
  /// capture slot, for groups with an `id`
  pub slot: Option<usize>,
  /// capture slot of the words to drop from the result
  pub ignore: Option<usize>,
  /// repetition
  pub repeat: Repeat,
  /// must start at the first word
  pub anchor_start: bool,
  /// must end at the last word
  pub anchor_end: bool,
}

impl Group {
  fn plain(children: Vec<PatternNode>) -> Self {
    Group {
      children,
      slot: None,
      ignore: None,
      repeat: Repeat::ONCE,
      anchor_start: false,
      anchor_end: false,
    }
  }
}

/// A node of the pattern tree
#[derive(Debug, Clone)]
pub enum PatternNode {
  /// one word
  Word(WordPattern),
  /// concatenation
  Seq(Group),
  /// ordered alternation
  Either(Group),
  /// the same words as captured in a slot
  BackPat(usize),
}

/// What a capture slot holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotKind {
  /// a `w` with an id
  Word,
  /// a `pat` or `either` with an id
  Group,
  /// an `ignore` group
  Ignore,
}

/// A pattern, ready for matching
#[derive(Debug, Clone)]
pub struct ParsedPattern {
  /// XML the pattern was loaded from
  pub source: String,
  /// root of the tree
  pub root: PatternNode,
  /// capture slots, in opening order
  pub slots: Vec<SlotKind>,
  /// capture slots of the ids
  pub names: HashMap<String, usize>,
  /// number of fore-references
  pub foredeps: usize,
}

impl fmt::Display for ParsedPattern {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&self.source) }
}

/*
 * PATTERN LOADING
 */

/// Pattern Loading Context
/// (internal data structure for loading a pattern)
/// it keeps track of the defined ids and of the pending fore-references
#[derive(Default)]
struct PCtx {
  slots: Vec<SlotKind>,
  names: HashMap<String, usize>,
  /// ids that a sibling branch of an enclosing `either` already bound
  rebindable: HashSet<String>,
  forepattern_ids: HashMap<String, usize>,
  foredeps: usize,
}

impl PCtx {
  fn new_slot(&mut self, kind: SlotKind) -> usize {
    self.slots.push(kind);
    self.slots.len() - 1
  }

  fn define(&mut self, id: &str, kind: SlotKind) -> Result<usize> {
    if id.contains('_') {
      return Err(Error::Pattern(format!("Id {:?} may not contain an underscore", id)));
    }
    match self.names.get(id) {
      Some(&slot) if self.rebindable.contains(id) => {
        if self.slots[slot] != kind {
          return Err(Error::Pattern(format!(
            "Alternation branches bind id '{}' inconsistently",
            id
          )));
        }
        self.rebindable.remove(id);
        Ok(slot)
      },
      Some(_) => Err(Error::Pattern(format!("Id '{}' defined twice", id))),
      None => {
        let slot = self.new_slot(kind);
        self.names.insert(id.to_string(), slot);
        Ok(slot)
      },
    }
  }

  fn word_slot(&self, id: &str) -> Option<usize> {
    self
      .names
      .get(id)
      .cloned()
      .filter(|&slot| self.slots[slot] == SlotKind::Word)
  }
}

fn check_scope_repeat(scope_repeat: Option<&str>, node: &Node) -> Result<()> {
  match scope_repeat {
    Some(outer) => Err(Error::Pattern(format!(
      "Elem <{}> cannot have `id` or `ignore` under a `repeat` scope (repeat=\"{}\")",
      node.get_name(),
      outer
    ))),
    None => Ok(()),
  }
}

impl PatternNode {
  /// loads a `PatternNode` from a node
  fn load_from_node(node: &Node, pctx: &mut PCtx, scope_repeat: Option<&str>) -> Result<PatternNode> {
    match node.get_name().as_ref() {
      "pat" => Group::load_pat(node, pctx, scope_repeat).map(PatternNode::Seq),
      "either" => Group::load_either(node, pctx, scope_repeat).map(PatternNode::Either),
      "backpat" => {
        let id = require_node_property(node, "id")?;
        match pctx.names.get(&id) {
          Some(&slot) => Ok(PatternNode::BackPat(slot)),
          None => Err(Error::Pattern(format!("backpat refers to undefined id '{}'", id))),
        }
      },
      "w" => WordPattern::load_from_node(node, pctx, scope_repeat).map(PatternNode::Word),
      other => Err(Error::Pattern(format!("Invalid node name {:?}", other))),
    }
  }
}

impl Group {
  fn repeat_of(node: &Node) -> Result<Option<String>> {
    match get_nonempty_property(node, "repeat") {
      Some(repeat) => {
        Repeat::parse(&repeat)?;
        Ok(Some(repeat))
      },
      None => Ok(None),
    }
  }

  /// loads a `<pat>`
  fn load_pat(node: &Node, pctx: &mut PCtx, scope_repeat: Option<&str>) -> Result<Group> {
    let repeat = Group::repeat_of(node)?;
    let ignore = if get_nonempty_property(node, "ignore").is_some() {
      check_scope_repeat(scope_repeat, node)?;
      Some(pctx.new_slot(SlotKind::Ignore))
    } else {
      None
    };
    let slot = match get_nonempty_property(node, "id") {
      Some(id) => {
        check_scope_repeat(scope_repeat, node)?;
        Some(pctx.define(&id, SlotKind::Group)?)
      },
      None => None,
    };
    let inner_scope = repeat.as_deref().or(scope_repeat);
    let mut children = Vec::new();
    for child in &get_non_text_children(node)? {
      children.push(PatternNode::load_from_node(child, pctx, inner_scope)?);
    }
    Ok(Group {
      children,
      slot,
      ignore,
      repeat: repeat.as_deref().map(Repeat::parse).transpose()?.unwrap_or(Repeat::ONCE),
      anchor_start: get_nonempty_property(node, "anchor_start").is_some(),
      anchor_end: get_nonempty_property(node, "anchor_end").is_some(),
    })
  }

  /// loads an `<either>`; ids bound in one branch may be bound again, alike, in the others
  fn load_either(node: &Node, pctx: &mut PCtx, scope_repeat: Option<&str>) -> Result<Group> {
    let repeat = Group::repeat_of(node)?;
    let slot = match get_nonempty_property(node, "id") {
      Some(id) => {
        check_scope_repeat(scope_repeat, node)?;
        Some(pctx.define(&id, SlotKind::Group)?)
      },
      None => None,
    };
    let inner_scope = repeat.as_deref().or(scope_repeat);
    let outer_rebindable = pctx.rebindable.clone();
    let before: HashSet<String> = pctx.names.keys().cloned().collect();
    let mut branches = Vec::new();
    for child in &get_non_text_children(node)? {
      branches.push(PatternNode::load_from_node(child, pctx, inner_scope)?);
      let mut rebindable = outer_rebindable.clone();
      rebindable.extend(pctx.names.keys().filter(|id| !before.contains(*id)).cloned());
      pctx.rebindable = rebindable;
    }
    pctx.rebindable = outer_rebindable;
    let mut group = Group::plain(branches);
    group.slot = slot;
    group.repeat = repeat.as_deref().map(Repeat::parse).transpose()?.unwrap_or(Repeat::ONCE);
    Ok(group)
  }
}

impl WordPattern {
  const VALID_ATTRS: [&'static str; 7] = ["surface", "lemma", "pos", "syn", "id", "neg", "syndep"];

  /// loads a `<w>`
  fn load_from_node(node: &Node, pctx: &mut PCtx, scope_repeat: Option<&str>) -> Result<WordPattern> {
    for (attr, _) in node.get_attributes() {
      if !WordPattern::VALID_ATTRS.contains(&attr.as_str()) {
        warn_once!("Ignoring bad word attr: {:?}", attr);
      }
    }
    let mut word = WordPattern::default();
    for &attr in WordAttr::ALL.iter() {
      let value = match get_nonempty_property(node, attr.name()) {
        Some(value) => value,
        None => continue,
      };
      let constraint = if value.starts_with("back:") {
        let reference = &value["back:".len()..];
        let dot = reference
          .find('.')
          .ok_or_else(|| Error::Pattern(format!("Bad back-reference: {:?}", value)))?;
        let slot = pctx.word_slot(&reference[..dot]).ok_or_else(|| {
          Error::Pattern(format!("Back-reference to undefined word id: {:?}", value))
        })?;
        AttrConstraint::BackRef {
          slot,
          attr: reference[dot + 1..].parse()?,
        }
      } else {
        AttrConstraint::Glob(value)
      };
      word.constraints.push((attr, constraint));
    }

    if let Some(negated) = get_nonempty_property(node, "neg") {
      for name in negated.split(':').filter(|n| !n.is_empty()) {
        let attr: WordAttr = name.parse()?;
        match word.constraints.iter().position(|c| c.0 == attr) {
          Some(i) => match word.constraints.remove(i).1 {
            AttrConstraint::Glob(value) => word.negations.push((attr, value)),
            AttrConstraint::BackRef { .. } => {
              return Err(Error::Pattern(format!("You cannot negate a back-reference: {}", attr)));
            },
          },
          None => return Err(Error::Pattern(format!("You cannot negate an undefined attribute: {}", attr))),
        }
      }
    }

    for child in &get_non_text_children(node)? {
      if child.get_name() != "neg" {
        return Err(Error::Pattern(format!(
          "Elem <w> only accepts subelem <neg>; got <{}>",
          child.get_name()
        )));
      }
      for (name, value) in child.get_attributes() {
        word.negations.push((name.parse()?, value));
      }
    }

    if let Some(id) = get_nonempty_property(node, "id") {
      check_scope_repeat(scope_repeat, node)?;
      word.foredep_check = pctx.forepattern_ids.get(&id).cloned();
      word.slot = Some(pctx.define(&id, SlotKind::Word)?);
    }

    if let Some(syndep) = get_nonempty_property(node, "syndep") {
      let colon = syndep
        .rfind(':')
        .ok_or_else(|| Error::Pattern(format!("Bad syndep, expected \"rel:id\": {:?}", syndep)))?;
      let (rel, reference) = (syndep[..colon].to_string(), &syndep[colon + 1..]);
      word.syndep = Some(match pctx.word_slot(reference) {
        Some(slot) => SynDep::Back { rel, slot },
        None => {
          let foredep = pctx.foredeps;
          pctx.foredeps += 1;
          pctx.forepattern_ids.insert(reference.to_string(), foredep);
          SynDep::Fore { rel, foredep }
        },
      });
    }
    Ok(word)
  }
}

impl ParsedPattern {
  /// Compiles the `<pat>` element `node` of `doc`
  pub fn from_node(doc: &Document, node: &Node) -> Result<ParsedPattern> {
    let mut pctx = PCtx::default();
    let root = PatternNode::load_from_node(node, &mut pctx, None)?;
    Ok(ParsedPattern {
      source: doc.node_to_string(node),
      root,
      slots: pctx.slots,
      names: pctx.names,
      foredeps: pctx.foredeps,
    })
  }

  /// Compiles a pattern given as an XML string, such as `<pat><w pos="N"/></pat>`
  pub fn from_xml(xml: &str) -> Result<ParsedPattern> {
    let doc = Parser::default()
      .parse_string(xml)
      .map_err(|err| Error::Xml(format!("{:?}", err)))?;
    let root = doc
      .get_root_element()
      .ok_or_else(|| Error::Pattern("Empty pattern".to_string()))?;
    ParsedPattern::from_node(&doc, &root)
  }

  /// A pattern matching any `min` to `max` consecutive words
  pub fn generic(min: usize, max: usize) -> ParsedPattern {
    let mut any = Group::plain(vec![PatternNode::Word(WordPattern::default())]);
    any.repeat = Repeat { min, max: Some(max) };
    ParsedPattern {
      source: format!("<pat><pat repeat=\"{{{},{}}}\"><w/></pat></pat>", min, max),
      root: PatternNode::Seq(Group::plain(vec![PatternNode::Seq(any)])),
      slots: Vec::new(),
      names: HashMap::new(),
      foredeps: 0,
    }
  }

  /// Capture slot of the id `name`
  pub fn slot_of(&self, name: &str) -> Option<usize> { self.names.get(name).cloned() }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn repeat_forms() {
    assert_eq!(Repeat::parse("*").unwrap(), Repeat { min: 0, max: None });
    assert_eq!(Repeat::parse("+").unwrap(), Repeat { min: 1, max: None });
    assert_eq!(Repeat::parse("?").unwrap(), Repeat { min: 0, max: Some(1) });
    assert_eq!(Repeat::parse("{3}").unwrap(), Repeat { min: 3, max: Some(3) });
    assert_eq!(Repeat::parse("{2,4}").unwrap(), Repeat { min: 2, max: Some(4) });
    assert_eq!(Repeat::parse("{,4}").unwrap(), Repeat { min: 0, max: Some(4) });
    assert_eq!(Repeat::parse("{2,}").unwrap(), Repeat { min: 2, max: None });
    assert!(Repeat::parse("{}").is_err());
    assert!(Repeat::parse("{4,2}").is_err());
    assert!(Repeat::parse("many").is_err());
  }

  #[test]
  fn ids_are_numbered_in_opening_order() {
    let pattern = ParsedPattern::from_xml(
      "<pat><pat id=\"a\" ignore=\"true\"><w id=\"b\" pos=\"N\"/></pat><w lemma=\"back:b.lemma\"/></pat>",
    )
    .unwrap();
    assert_eq!(pattern.slots, vec![SlotKind::Ignore, SlotKind::Group, SlotKind::Word]);
    assert_eq!(pattern.slot_of("a"), Some(1));
    assert_eq!(pattern.slot_of("b"), Some(2));
  }

  #[test]
  fn ids_under_repeat_are_refused() {
    assert!(ParsedPattern::from_xml("<pat repeat=\"+\"><w id=\"x\"/></pat>").is_err());
    assert!(ParsedPattern::from_xml("<pat repeat=\"*\"><pat ignore=\"1\"><w/></pat></pat>").is_err());
    assert!(ParsedPattern::from_xml("<pat repeat=\"lots\"><w/></pat>").is_err());
  }

  #[test]
  fn alternation_branches_may_share_ids() {
    assert!(ParsedPattern::from_xml("<pat><either><w id=\"x\" pos=\"N\"/><w id=\"x\" pos=\"V\"/></either></pat>").is_ok());
    assert!(ParsedPattern::from_xml(
      "<pat><either><w id=\"x\" pos=\"N\"/><pat id=\"x\"><w pos=\"V\"/></pat></either></pat>"
    )
    .is_err());
    assert!(ParsedPattern::from_xml("<pat><w id=\"x\"/><w id=\"x\"/></pat>").is_err());
  }
}
