//! Some utility functions. Mostly helper functions for dealing with the XML

use libxml::tree::{Node, NodeType};

use crate::error::{Error, Result};

/*
 * XML HELPER FUNCTIONS
 */

/// checks whether a node is a comment node
pub fn is_comment_node(node: &Node) -> bool { node.get_type() == Some(NodeType::CommentNode) }

/// checks whether a node is an element node
pub fn is_element_node(node: &Node) -> bool { node.get_type() == Some(NodeType::ElementNode) }

/// Returns every child of the node, text and comment nodes included
pub fn get_children(node: &Node) -> Vec<Node> {
  let mut cur = node.get_first_child();
  let mut children: Vec<Node> = Vec::new();
  while let Some(child) = cur {
    cur = child.get_next_sibling();
    children.push(child);
  }
  children
}

/// Returns a vector of the element children, skipping text and comment nodes.
/// Requires that the text nodes in between contain only whitespaces.
pub fn get_non_text_children(node: &Node) -> Result<Vec<Node>> {
  let mut children: Vec<Node> = Vec::new();
  for child in get_children(node) {
    if child.is_text_node() {
      let text = child.get_content();
      if !text.trim().is_empty() {
        return Err(Error::Pattern(format!(
          "found unexpected text in \"{}\" node: \"{}\"",
          node.get_name(),
          text.trim()
        )));
      }
    } else if is_element_node(&child) {
      children.push(child);
    }
  }
  Ok(children)
}

/// Gets a property from a node (or an `Err`, if it doesn't have the property)
pub fn require_node_property(node: &Node, property: &str) -> Result<String> {
  node.get_property(property).ok_or_else(|| {
    Error::Pattern(format!(
      "\"{}\" node misses \"{}\" property",
      node.get_name(),
      property
    ))
  })
}

/// Gets a property, treating an empty value as absent
pub fn get_nonempty_property(node: &Node, property: &str) -> Option<String> {
  node.get_property(property).filter(|value| !value.is_empty())
}
