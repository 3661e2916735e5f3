//! Predictive LL(1) parsing over the right-recursive grammar.

use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, trace};

use crate::error::CompileResult;
use crate::grammar::{Grammar, GrammarError, NonTerminal, Production, Symbol};
use crate::parse_tree::{NodeId, ParseTree};
use crate::token::TokenKind;
use crate::tokenizer::{LexError, Lexer};

use super::{Parse, ParseError, lookahead};

/// `M[non-terminal, lookahead] -> production`, derived from FIRST and FOLLOW.
#[derive(Debug, Clone)]
pub struct Ll1Table {
  entries: BTreeMap<(NonTerminal, TokenKind), Production>,
}

impl Ll1Table {
  /// Fill the table; two productions predicted by the same cell is an error.
  pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
    let mut entries: BTreeMap<(NonTerminal, TokenKind), Production> = BTreeMap::new();
    for production in grammar.productions() {
      let (mut predict, nullable) = grammar.first_of(&production.rhs);
      if nullable {
        predict.extend(grammar.follow(production.lhs));
      }
      for terminal in predict {
        let key = (production.lhs, terminal);
        if let Some(existing) = entries.get(&key)
          && existing != production
        {
          return Err(GrammarError::PredictConflict {
            non_terminal: production.lhs,
            terminal,
            first: existing.to_string(),
            second: production.to_string(),
          });
        }
        entries.insert(key, production.clone());
      }
    }
    debug!(entries = entries.len(), "built LL(1) table");
    Ok(Self { entries })
  }

  pub fn get(&self, non_terminal: NonTerminal, lookahead: TokenKind) -> Option<&Production> {
    self.entries.get(&(non_terminal, lookahead))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl fmt::Display for Ll1Table {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for ((non_terminal, terminal), production) in &self.entries {
      writeln!(f, "[{non_terminal}, {terminal}] {production}")?;
    }
    Ok(())
  }
}

pub struct Ll1Parser {
  name: String,
  lexer: Lexer,
  table: Ll1Table,
  start: NonTerminal,
}

impl Ll1Parser {
  pub fn new() -> CompileResult<Self> {
    Self::with_name("program")
  }

  pub fn with_name(name: impl Into<String>) -> CompileResult<Self> {
    let grammar = Grammar::right_recursive();
    Ok(Self {
      name: name.into(),
      lexer: Lexer::new()?,
      table: Ll1Table::build(&grammar)?,
      start: grammar.start(),
    })
  }

  pub fn table(&self) -> &Ll1Table {
    &self.table
  }
}

impl Parse for Ll1Parser {
  fn name(&self) -> &str {
    &self.name
  }

  fn set_input(&mut self, input: &str) {
    self.lexer.set_input(input);
  }

  fn lex_errors(&self) -> &[LexError] {
    self.lexer.errors()
  }

  /// Expand the leftmost non-terminal on the stack until only the end
  /// marker is left. An empty stack stands for the end marker.
  fn parse_tree(&mut self) -> Result<ParseTree, ParseError> {
    self.lexer.reset();
    let mut tree = ParseTree::new();
    let root = tree.alloc(Symbol::NonTerminal(self.start));
    tree.set_root(root);

    let mut stack: Vec<(Symbol, NodeId)> = vec![(Symbol::NonTerminal(self.start), root)];
    let mut token = lookahead(&mut self.lexer);

    while let Some((top, slot)) = stack.pop() {
      trace!(%top, lookahead = %token.kind, depth = stack.len(), "ll1 step");
      match top {
        Symbol::Terminal(expected) => {
          if token.kind != expected {
            return Err(ParseError::mismatch(expected, &token));
          }
          tree.set_text(slot, std::mem::take(&mut token.text));
          token = lookahead(&mut self.lexer);
        }
        Symbol::NonTerminal(non_terminal) => {
          let production = self
            .table
            .get(non_terminal, token.kind)
            .ok_or_else(|| ParseError::no_production(non_terminal, &token))?;
          let children: Vec<(Symbol, NodeId)> = production
            .rhs
            .iter()
            .map(|&symbol| (symbol, tree.alloc(symbol)))
            .collect();
          for &(_, child) in &children {
            tree.push_child(slot, child);
          }
          stack.extend(children.into_iter().rev());
        }
      }
    }

    if !token.is_eof() {
      return Err(ParseError::leftover(&token));
    }
    Ok(tree)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::grammar::NonTerminal as N;
  use crate::token::TokenKind as T;

  fn table() -> Ll1Table {
    Ll1Table::build(&Grammar::right_recursive()).unwrap()
  }

  #[test]
  fn predictive_table_entries() {
    let table = table();
    assert!(table.get(N::StatementList, T::EndOfFile).unwrap().is_epsilon());
    assert_eq!(
      table.get(N::Factor, T::Str).unwrap().to_string(),
      "Factor -> string"
    );
    assert!(table.get(N::ExpressionTail, T::RightParen).unwrap().is_epsilon());
    assert!(table.get(N::TermTail, T::Plus).unwrap().is_epsilon());
    assert!(table.get(N::Statement, T::Number).is_none());
    assert!(table.get(N::Factor, T::Semicolon).is_none());
  }

  #[test]
  fn left_recursion_is_a_predict_conflict() {
    let error = Ll1Table::build(&Grammar::left_recursive()).unwrap_err();
    assert!(matches!(
      error,
      GrammarError::PredictConflict {
        non_terminal: N::Expression,
        ..
      }
    ));
  }

  #[test]
  fn table_dump_lists_every_cell() {
    let table = table();
    let dump = table.to_string();
    assert_eq!(dump.lines().count(), table.len());
    assert!(dump.contains("[Term', times] Term' -> times Factor Term'"));
  }

  #[test]
  fn builds_right_recursive_tree() {
    let mut parser = Ll1Parser::new().unwrap();
    parser.set_input("x <- 1;");
    let tree = parser.parse_tree().unwrap();
    let expected = "\
Node: 'Program' (children: 1)
  Node: 'StatementList' (children: 2)
    Node: 'Statement' (children: 4)
      Node: 'x' (children: 0)
      Node: '<-' (children: 0)
      Node: 'Expression' (children: 2)
        Node: 'Term' (children: 2)
          Node: 'Factor' (children: 1)
            Node: '1' (children: 0)
          Node: 'Term'' (children: 0)
        Node: 'Expression'' (children: 0)
      Node: ';' (children: 0)
    Node: 'StatementList' (children: 0)
";
    assert_eq!(tree.dump(), expected);
  }

  #[test]
  fn errors_carry_the_offending_token() {
    let mut parser = Ll1Parser::new().unwrap();
    // `Term'` has no entry on end of input: `$` is not in its FOLLOW set.
    parser.set_input("x <- 1");
    assert!(matches!(
      parser.parse(),
      Err(ParseError::NoProduction {
        non_terminal: N::TermTail,
        kind: T::EndOfFile,
        ..
      })
    ));

    parser.set_input("x");
    assert!(matches!(
      parser.parse(),
      Err(ParseError::Mismatch {
        expected: T::Assign,
        kind: T::EndOfFile,
        line: 1,
        column: 2,
        ..
      })
    ));

    parser.set_input("x 1;");
    assert!(matches!(
      parser.parse(),
      Err(ParseError::Mismatch {
        expected: T::Assign,
        line: 1,
        column: 3,
        ..
      })
    ));

    parser.set_input("x <- ;");
    assert!(matches!(
      parser.parse(),
      Err(ParseError::NoProduction {
        non_terminal: N::Expression,
        kind: T::Semicolon,
        ..
      })
    ));
  }
}
