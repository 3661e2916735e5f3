//! Concrete syntax tree shared by both parsing engines.
//!
//! Nodes live in an arena and refer to their children by [`NodeId`]. The
//! tree is strictly parent-owned; it exists only between parsing and the
//! desugaring pass.

use std::fmt::{self, Write};

use crate::grammar::{NonTerminal, Symbol};
use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseNode {
  pub symbol: Symbol,
  /// Matched lexeme; only terminals carry one.
  pub text: Option<String>,
  pub children: Vec<NodeId>,
}

#[derive(Debug, Clone, Default)]
pub struct ParseTree {
  nodes: Vec<ParseNode>,
  root: Option<NodeId>,
}

impl ParseTree {
  pub fn new() -> Self {
    Self::default()
  }

  /// Allocate a node with no children and no text yet.
  pub fn alloc(&mut self, symbol: Symbol) -> NodeId {
    self.nodes.push(ParseNode {
      symbol,
      text: None,
      children: Vec::new(),
    });
    NodeId(self.nodes.len() - 1)
  }

  pub fn leaf(&mut self, kind: TokenKind, text: impl Into<String>) -> NodeId {
    let id = self.alloc(Symbol::Terminal(kind));
    self.nodes[id.0].text = Some(text.into());
    id
  }

  pub fn branch(&mut self, nt: NonTerminal, children: Vec<NodeId>) -> NodeId {
    let id = self.alloc(Symbol::NonTerminal(nt));
    self.nodes[id.0].children = children;
    id
  }

  pub fn push_child(&mut self, parent: NodeId, child: NodeId) {
    self.nodes[parent.0].children.push(child);
  }

  pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) {
    self.nodes[id.0].text = Some(text.into());
  }

  pub fn set_root(&mut self, id: NodeId) {
    self.root = Some(id);
  }

  pub fn root(&self) -> Option<NodeId> {
    self.root
  }

  pub fn node(&self, id: NodeId) -> &ParseNode {
    &self.nodes[id.0]
  }

  pub fn len(&self) -> usize {
    self.nodes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.nodes.is_empty()
  }

  /// Indented debug dump, one node per line: `Node: 'label' (children: n)`.
  /// Terminals show their lexeme rather than their grammar name.
  pub fn dump(&self) -> String {
    let mut out = String::new();
    match self.root {
      Some(root) => self.dump_node(root, 0, &mut out),
      None => out.push_str("NULL\n"),
    }
    out
  }

  fn dump_node(&self, id: NodeId, depth: usize, out: &mut String) {
    let node = self.node(id);
    let label = match (&node.symbol, &node.text) {
      (Symbol::Terminal(_), Some(text)) => text.clone(),
      (symbol, _) => symbol.to_string(),
    };
    let _ = writeln!(
      out,
      "{}Node: '{}' (children: {})",
      "  ".repeat(depth),
      label,
      node.children.len()
    );
    for &child in &node.children {
      self.dump_node(child, depth + 1, out);
    }
  }
}

impl fmt::Display for ParseTree {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.dump())
  }
}
