//! Token model shared by the lexer and both parsers.

use std::fmt;

/// Kinds of tokens recognised by the front-end.
///
/// The kinds double as the terminal alphabet of both grammars, so
/// `EndOfFile` is the `$` marker the parse tables are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenKind {
  Identifier,
  Number,
  Str,
  Plus,
  Times,
  LeftParen,
  RightParen,
  Assign,
  Semicolon,
  EndOfFile,
}

impl TokenKind {
  /// Every terminal, in a stable order used when printing tables.
  pub const ALL: [TokenKind; 10] = [
    TokenKind::Identifier,
    TokenKind::Number,
    TokenKind::Str,
    TokenKind::Plus,
    TokenKind::Times,
    TokenKind::LeftParen,
    TokenKind::RightParen,
    TokenKind::Assign,
    TokenKind::Semicolon,
    TokenKind::EndOfFile,
  ];

  /// Upper-case class name, as printed by the token dump.
  pub fn class_name(self) -> &'static str {
    match self {
      TokenKind::Identifier => "IDENTIFIER",
      TokenKind::Number => "NUMBER",
      TokenKind::Str => "STRING",
      TokenKind::Plus => "PLUS",
      TokenKind::Times => "TIMES",
      TokenKind::LeftParen => "LP",
      TokenKind::RightParen => "RP",
      TokenKind::Assign => "ASSIGN",
      TokenKind::Semicolon => "SEMICOLON",
      TokenKind::EndOfFile => "EOF",
    }
  }
}

/// Grammar-facing name of the terminal (`identifier`, `plus`, `$`, ...).
impl fmt::Display for TokenKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      TokenKind::Identifier => "identifier",
      TokenKind::Number => "number",
      TokenKind::Str => "string",
      TokenKind::Plus => "plus",
      TokenKind::Times => "times",
      TokenKind::LeftParen => "left_paren",
      TokenKind::RightParen => "right_paren",
      TokenKind::Assign => "assign",
      TokenKind::Semicolon => "semicolon",
      TokenKind::EndOfFile => "$",
    };
    f.write_str(name)
  }
}

/// A lexeme together with the 1-based position where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
  pub kind: TokenKind,
  pub text: String,
  pub line: usize,
  pub column: usize,
}

impl Token {
  pub fn new(kind: TokenKind, text: impl Into<String>, line: usize, column: usize) -> Self {
    Self {
      kind,
      text: text.into(),
      line,
      column,
    }
  }

  /// End-of-input marker anchored at the position just past the last lexeme.
  pub fn end_of_file(line: usize, column: usize) -> Self {
    Self::new(TokenKind::EndOfFile, "", line, column)
  }

  pub fn is_eof(&self) -> bool {
    self.kind == TokenKind::EndOfFile
  }

  /// Human-friendly description used in diagnostics.
  pub fn describe(&self) -> String {
    if self.is_eof() {
      "EOF".to_string()
    } else {
      self.text.clone()
    }
  }
}
