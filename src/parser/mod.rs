//! Table-driven parsers.
//!
//! Both engines pull tokens from the shared [`Lexer`], build a
//! [`ParseTree`] with their own tables and hand it to [`desugar`] so the
//! resulting [`Ast`] is identical whichever engine ran. The first syntax
//! error aborts the parse; no partial tree is ever returned.

mod ll1;
mod slr;

use std::fmt;
use std::str::FromStr;

use snafu::Snafu;

use crate::ast::Ast;
use crate::desugar::desugar;
use crate::error::CompileResult;
use crate::grammar::{Grammar, NonTerminal};
use crate::parse_tree::ParseTree;
use crate::token::{Token, TokenKind};
use crate::tokenizer::{LexError, Lexer};

pub use ll1::{Ll1Parser, Ll1Table};
pub use slr::{Action, SlrParser, SlrTable};

#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub(crate)))]
pub enum ParseError {
  #[snafu(display("expected '{expected}' but found '{found}' ({kind})"))]
  Mismatch {
    expected: TokenKind,
    found: String,
    kind: TokenKind,
    line: usize,
    column: usize,
  },
  #[snafu(display("no production for {non_terminal} on '{found}' ({kind})"))]
  NoProduction {
    non_terminal: NonTerminal,
    found: String,
    kind: TokenKind,
    line: usize,
    column: usize,
  },
  #[snafu(display("unexpected '{found}' ({kind}) in state {state}"))]
  NoAction {
    state: usize,
    found: String,
    kind: TokenKind,
    line: usize,
    column: usize,
  },
  #[snafu(display("no goto entry for state {state} on {non_terminal}"))]
  NoGoto {
    state: usize,
    non_terminal: NonTerminal,
  },
  #[snafu(display("unexpected '{found}' after the end of the program"))]
  LeftoverInput {
    found: String,
    line: usize,
    column: usize,
  },
  #[snafu(display("malformed parse tree: {detail}"))]
  MalformedTree { detail: String },
}

impl ParseError {
  pub(crate) fn mismatch(expected: TokenKind, token: &Token) -> Self {
    Self::Mismatch {
      expected,
      found: token.describe(),
      kind: token.kind,
      line: token.line,
      column: token.column,
    }
  }

  pub(crate) fn no_production(non_terminal: NonTerminal, token: &Token) -> Self {
    Self::NoProduction {
      non_terminal,
      found: token.describe(),
      kind: token.kind,
      line: token.line,
      column: token.column,
    }
  }

  pub(crate) fn no_action(state: usize, token: &Token) -> Self {
    Self::NoAction {
      state,
      found: token.describe(),
      kind: token.kind,
      line: token.line,
      column: token.column,
    }
  }

  pub(crate) fn leftover(token: &Token) -> Self {
    Self::LeftoverInput {
      found: token.describe(),
      line: token.line,
      column: token.column,
    }
  }

  /// Source position of the offending token, when there is one.
  pub fn location(&self) -> Option<(usize, usize)> {
    match self {
      ParseError::Mismatch { line, column, .. }
      | ParseError::NoProduction { line, column, .. }
      | ParseError::NoAction { line, column, .. }
      | ParseError::LeftoverInput { line, column, .. } => Some((*line, *column)),
      ParseError::NoGoto { .. } | ParseError::MalformedTree { .. } => None,
    }
  }
}

/// Common surface of the two engines.
pub trait Parse {
  /// Name attached to every [`Ast`] this parser produces.
  fn name(&self) -> &str;

  fn set_input(&mut self, input: &str);

  /// Run the engine over the current input and return the concrete tree.
  fn parse_tree(&mut self) -> Result<ParseTree, ParseError>;

  /// Characters the lexer skipped during the last parse.
  fn lex_errors(&self) -> &[LexError];

  fn parse(&mut self) -> Result<Ast, ParseError> {
    let tree = self.parse_tree()?;
    desugar(self.name(), &tree)
  }
}

/// Which parsing engine to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Engine {
  Ll1,
  #[default]
  Slr,
}

impl Engine {
  /// Construct a parser for this engine.
  pub fn parser(self, name: &str) -> CompileResult<Box<dyn Parse>> {
    Ok(match self {
      Engine::Ll1 => Box::new(Ll1Parser::with_name(name)?),
      Engine::Slr => Box::new(SlrParser::with_name(name)?),
    })
  }

  /// Textual dump of this engine's parse table.
  pub fn table(self) -> CompileResult<String> {
    Ok(match self {
      Engine::Ll1 => Ll1Table::build(&Grammar::right_recursive())?.to_string(),
      Engine::Slr => SlrTable::build(&Grammar::left_recursive())?.to_string(),
    })
  }
}

impl fmt::Display for Engine {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Engine::Ll1 => "ll1",
      Engine::Slr => "slr",
    })
  }
}

impl FromStr for Engine {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.to_ascii_lowercase().as_str() {
      "ll1" | "ll" => Ok(Engine::Ll1),
      "slr" | "lr" => Ok(Engine::Slr),
      other => Err(format!("unknown parser engine '{other}' (expected ll1 or slr)")),
    }
  }
}

/// Next token from the lexer, or an end-of-file marker anchored just past
/// the consumed input.
fn lookahead(lexer: &mut Lexer) -> Token {
  match lexer.next() {
    Some(token) => token,
    None => {
      let (line, column) = lexer.location();
      Token::end_of_file(line, column)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn engine_names_round_trip() {
    assert_eq!("ll1".parse::<Engine>(), Ok(Engine::Ll1));
    assert_eq!("SLR".parse::<Engine>(), Ok(Engine::Slr));
    assert!("lalr".parse::<Engine>().is_err());
    assert_eq!(Engine::default(), Engine::Slr);
    assert_eq!(Engine::Ll1.to_string(), "ll1");
  }

  #[test]
  fn located_errors_report_their_position() {
    let token = Token::new(TokenKind::Number, "7", 2, 4);
    let error = ParseError::mismatch(TokenKind::Semicolon, &token);
    assert_eq!(error.location(), Some((2, 4)));
    assert_eq!(error.to_string(), "expected 'semicolon' but found '7' (number)");

    let eof = ParseError::leftover(&Token::end_of_file(1, 1));
    assert_eq!(eof.to_string(), "unexpected 'EOF' after the end of the program");
    assert_eq!(
      ParseError::MalformedTree {
        detail: "x".into()
      }
      .location(),
      None
    );
  }
}
