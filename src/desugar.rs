//! Parse tree to AST.
//!
//! Both engines hand over a concrete tree of the same grammar family; they
//! only differ in how operator chains are spelled. The predictive grammar
//! produces `Term Expression'` tails, the shift-reduce grammar produces
//! left-recursive `Expression plus Term` spines. Both are folded into the
//! same left-associative binary nodes here. Punctuation disappears, nested
//! statement lists are flattened and parentheses are unwrapped.

use snafu::OptionExt;

use crate::ast::{Ast, AstNode, BinaryOp};
use crate::grammar::{NonTerminal, Symbol};
use crate::parse_tree::{NodeId, ParseNode, ParseTree};
use crate::parser::{MalformedTreeSnafu, ParseError};
use crate::token::TokenKind;

/// One precedence level of the expression grammar.
struct Level {
  node: NonTerminal,
  tail: NonTerminal,
  operand: NonTerminal,
  op: BinaryOp,
  op_token: TokenKind,
}

const SUM: Level = Level {
  node: NonTerminal::Expression,
  tail: NonTerminal::ExpressionTail,
  operand: NonTerminal::Term,
  op: BinaryOp::Add,
  op_token: TokenKind::Plus,
};

const PRODUCT: Level = Level {
  node: NonTerminal::Term,
  tail: NonTerminal::TermTail,
  operand: NonTerminal::Factor,
  op: BinaryOp::Mul,
  op_token: TokenKind::Times,
};

/// Convert a complete parse tree rooted at `Program` into an [`Ast`].
pub fn desugar(name: &str, tree: &ParseTree) -> Result<Ast, ParseError> {
  let root = tree.root().context(MalformedTreeSnafu {
    detail: "tree has no root",
  })?;
  let program = Desugarer { tree }.program(root)?;
  Ok(Ast::new(name, program))
}

struct Desugarer<'a> {
  tree: &'a ParseTree,
}

impl<'a> Desugarer<'a> {
  fn program(&self, id: NodeId) -> Result<AstNode, ParseError> {
    let node = self.require(id, NonTerminal::Program)?;
    let mut statements = Vec::new();
    for &child in &node.children {
      self.statement_list(child, &mut statements)?;
    }
    Ok(AstNode::root(statements))
  }

  fn statement_list(&self, id: NodeId, out: &mut Vec<AstNode>) -> Result<(), ParseError> {
    let node = self.require(id, NonTerminal::StatementList)?;
    for &child in &node.children {
      match self.node(child).symbol {
        Symbol::NonTerminal(NonTerminal::Statement) => out.push(self.statement(child)?),
        Symbol::NonTerminal(NonTerminal::StatementList) => self.statement_list(child, out)?,
        _ => return Err(self.malformed(child, "unexpected child of StatementList")),
      }
    }
    Ok(())
  }

  // identifier assign Expression semicolon
  fn statement(&self, id: NodeId) -> Result<AstNode, ParseError> {
    let node = self.require(id, NonTerminal::Statement)?;
    let [target, assign, value, semicolon] = node.children.as_slice() else {
      return Err(self.malformed(id, "statement must have four children"));
    };
    self.require_terminal(*assign, TokenKind::Assign)?;
    self.require_terminal(*semicolon, TokenKind::Semicolon)?;
    let name = self.lexeme(*target, TokenKind::Identifier)?;
    Ok(AstNode::assign(name, self.chain(*value, &SUM)?))
  }

  fn chain(&self, id: NodeId, level: &Level) -> Result<AstNode, ParseError> {
    let node = self.require(id, level.node)?;
    match node.children.as_slice() {
      // X -> Y
      [single] if self.is(*single, level.operand) => self.operand(*single, level),
      // X -> X op Y
      [lhs, op, rhs] if self.is(*lhs, level.node) => {
        self.require_terminal(*op, level.op_token)?;
        let lhs = self.chain(*lhs, level)?;
        let rhs = self.operand(*rhs, level)?;
        Ok(AstNode::binary(level.op, lhs, rhs))
      }
      // X -> Y X'
      [first, tail] if self.is(*tail, level.tail) => {
        let first = self.operand(*first, level)?;
        self.fold_tail(*tail, first, level)
      }
      _ => Err(self.malformed(id, "unrecognised operator chain")),
    }
  }

  /// Walk `X' -> op Y X' | ε`, folding each operand onto the accumulated
  /// left-hand side.
  fn fold_tail(&self, mut id: NodeId, mut acc: AstNode, level: &Level) -> Result<AstNode, ParseError> {
    loop {
      let node = self.require(id, level.tail)?;
      match node.children.as_slice() {
        [] => return Ok(acc),
        [op, operand, rest] => {
          self.require_terminal(*op, level.op_token)?;
          acc = AstNode::binary(level.op, acc, self.operand(*operand, level)?);
          id = *rest;
        }
        _ => return Err(self.malformed(id, "operator tail must be empty or have three children")),
      }
    }
  }

  fn operand(&self, id: NodeId, level: &Level) -> Result<AstNode, ParseError> {
    match level.operand {
      NonTerminal::Term => self.chain(id, &PRODUCT),
      _ => self.factor(id),
    }
  }

  fn factor(&self, id: NodeId) -> Result<AstNode, ParseError> {
    let node = self.require(id, NonTerminal::Factor)?;
    match node.children.as_slice() {
      [leaf] => match self.node(*leaf).symbol {
        Symbol::Terminal(TokenKind::Identifier) => Ok(AstNode::identifier(
          self.lexeme(*leaf, TokenKind::Identifier)?,
        )),
        Symbol::Terminal(TokenKind::Number) => {
          Ok(AstNode::number(self.lexeme(*leaf, TokenKind::Number)?))
        }
        Symbol::Terminal(TokenKind::Str) => Ok(AstNode::string(self.lexeme(*leaf, TokenKind::Str)?)),
        _ => Err(self.malformed(*leaf, "factor leaf is not an operand")),
      },
      [open, inner, close] => {
        self.require_terminal(*open, TokenKind::LeftParen)?;
        self.require_terminal(*close, TokenKind::RightParen)?;
        self.chain(*inner, &SUM)
      }
      _ => Err(self.malformed(id, "factor must have one or three children")),
    }
  }

  fn node(&self, id: NodeId) -> &'a ParseNode {
    self.tree.node(id)
  }

  fn is(&self, id: NodeId, nt: NonTerminal) -> bool {
    self.node(id).symbol == Symbol::NonTerminal(nt)
  }

  fn require(&self, id: NodeId, nt: NonTerminal) -> Result<&'a ParseNode, ParseError> {
    if self.is(id, nt) {
      Ok(self.node(id))
    } else {
      Err(self.malformed(id, &format!("expected {nt}")))
    }
  }

  fn require_terminal(&self, id: NodeId, kind: TokenKind) -> Result<&'a ParseNode, ParseError> {
    let node = self.node(id);
    if node.symbol == Symbol::Terminal(kind) {
      Ok(node)
    } else {
      Err(self.malformed(id, &format!("expected {kind}")))
    }
  }

  fn lexeme(&self, id: NodeId, kind: TokenKind) -> Result<String, ParseError> {
    let node = self.require_terminal(id, kind)?;
    node
      .text
      .clone()
      .context(MalformedTreeSnafu {
        detail: format!("{kind} leaf has no lexeme"),
      })
  }

  fn malformed(&self, id: NodeId, what: &str) -> ParseError {
    ParseError::MalformedTree {
      detail: format!("{what}, found {}", self.node(id).symbol),
    }
  }
}
