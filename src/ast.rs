//! Abstract syntax tree produced by desugaring either parse tree.
//!
//! Every node is a `(kind, value, children)` triple. The constructors keep
//! the shape invariants: operators and assignments have exactly two
//! children, literals and identifiers none, and the root one child per
//! statement in source order.

use std::fmt::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AstKind {
  Root,
  Identifier,
  Number,
  Str,
  Plus,
  Times,
  Assign,
}

impl fmt::Display for AstKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      AstKind::Root => "ROOT",
      AstKind::Identifier => "IDENTIFIER",
      AstKind::Number => "NUMBER",
      AstKind::Str => "STRING",
      AstKind::Plus => "PLUS",
      AstKind::Times => "TIMES",
      AstKind::Assign => "ASSIGN",
    };
    f.write_str(name)
  }
}

/// Binary operators recognised by the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
  Add,
  Mul,
}

impl BinaryOp {
  fn kind(self) -> AstKind {
    match self {
      BinaryOp::Add => AstKind::Plus,
      BinaryOp::Mul => AstKind::Times,
    }
  }

  fn symbol(self) -> &'static str {
    match self {
      BinaryOp::Add => "+",
      BinaryOp::Mul => "*",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstNode {
  kind: AstKind,
  value: String,
  children: Vec<AstNode>,
}

impl AstNode {
  fn new(kind: AstKind, value: impl Into<String>, children: Vec<AstNode>) -> Self {
    Self {
      kind,
      value: value.into(),
      children,
    }
  }

  pub fn root(statements: Vec<AstNode>) -> Self {
    Self::new(AstKind::Root, "-", statements)
  }

  pub fn identifier(name: impl Into<String>) -> Self {
    Self::new(AstKind::Identifier, name, Vec::new())
  }

  pub fn number(text: impl Into<String>) -> Self {
    Self::new(AstKind::Number, text, Vec::new())
  }

  /// String literal; `text` includes the surrounding quotes.
  pub fn string(text: impl Into<String>) -> Self {
    Self::new(AstKind::Str, text, Vec::new())
  }

  pub fn binary(op: BinaryOp, lhs: AstNode, rhs: AstNode) -> Self {
    Self::new(op.kind(), op.symbol(), vec![lhs, rhs])
  }

  pub fn assign(name: impl Into<String>, value: AstNode) -> Self {
    Self::new(AstKind::Assign, "<-", vec![Self::identifier(name), value])
  }

  pub fn kind(&self) -> AstKind {
    self.kind
  }

  pub fn value(&self) -> &str {
    &self.value
  }

  pub fn children(&self) -> &[AstNode] {
    &self.children
  }

  /// Both operands of a binary or assignment node.
  pub fn operands(&self) -> Option<(&AstNode, &AstNode)> {
    match self.children.as_slice() {
      [lhs, rhs] if matches!(self.kind, AstKind::Plus | AstKind::Times | AstKind::Assign) => {
        Some((lhs, rhs))
      }
      _ => None,
    }
  }
}

/// Depth-first, pre-order dump: `Type: <KIND>, Value: '<value>'`, indented
/// two spaces per level. Absent nodes print as `NULL`.
pub fn dump(node: Option<&AstNode>) -> String {
  let mut out = String::new();
  dump_node(node, 0, &mut out);
  out
}

fn dump_node(node: Option<&AstNode>, depth: usize, out: &mut String) {
  let indent = "  ".repeat(depth);
  let Some(node) = node else {
    let _ = writeln!(out, "{indent}NULL");
    return;
  };
  let _ = writeln!(out, "{indent}Type: {}, Value: '{}'", node.kind, node.value);
  for child in &node.children {
    dump_node(Some(child), depth + 1, out);
  }
}

impl fmt::Display for AstNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&dump(Some(self)))
  }
}

/// A parsed program: its name and the `ROOT` node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ast {
  name: String,
  root: AstNode,
}

impl Ast {
  pub fn new(name: impl Into<String>, root: AstNode) -> Self {
    Self {
      name: name.into(),
      root,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn root(&self) -> &AstNode {
    &self.root
  }

  /// Iterate statements in order.
  pub fn statements(&self) -> impl Iterator<Item = &AstNode> {
    self.root.children.iter()
  }

  pub fn dump(&self) -> String {
    dump(Some(&self.root))
  }
}

impl fmt::Display for Ast {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    self.root.fmt(f)
  }
}
