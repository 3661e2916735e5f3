//! Lexical analysis: runs a bank of DFAs in parallel over the input.
//!
//! Every call scans one lexeme. All automata start from their initial state
//! and are fed the same characters until none survives; the longest prefix
//! that left some automaton accepting wins, ties going to the automaton
//! registered first. Characters no automaton accepts are reported as
//! [`LexError`]s and skipped, so the token stream simply omits them.

use snafu::Snafu;
use tracing::warn;

use crate::dfa::{Dfa, DfaBuilder, DfaError};
use crate::token::{Token, TokenKind};

const DIGITS: &str = "0123456789";
const LETTERS: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ_";

/// An unrecognised character, skipped by the lexer.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
#[snafu(display("no valid token found at line {line}, column {column} for character {character:?}"))]
pub struct LexError {
  pub character: char,
  pub line: usize,
  pub column: usize,
}

/// Outcome of a single scanning cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scan {
  Token(Token),
  Error(LexError),
}

fn is_whitespace(c: char) -> bool {
  matches!(c, ' ' | '\t' | '\n' | '\r')
}

pub struct Lexer {
  input: Vec<char>,
  pos: usize,
  line: usize,
  column: usize,
  /// Registration order is token priority.
  automata: Vec<Dfa>,
  alive: Vec<bool>,
  errors: Vec<LexError>,
}

impl Lexer {
  /// Build the DFA bank. Priority: number, identifier, times, plus, left
  /// paren, right paren, assign, semicolon, string.
  pub fn new() -> Result<Self, DfaError> {
    let automata = vec![
      number_dfa()?,
      identifier_dfa()?,
      single_char_dfa('*', TokenKind::Times)?,
      single_char_dfa('+', TokenKind::Plus)?,
      single_char_dfa('(', TokenKind::LeftParen)?,
      single_char_dfa(')', TokenKind::RightParen)?,
      assign_dfa()?,
      single_char_dfa(';', TokenKind::Semicolon)?,
      string_dfa()?,
    ];
    let alive = vec![false; automata.len()];
    Ok(Self {
      input: Vec::new(),
      pos: 0,
      line: 1,
      column: 1,
      automata,
      alive,
      errors: Vec::new(),
    })
  }

  /// Replace the input and rewind to its start.
  pub fn set_input(&mut self, input: &str) {
    self.input = input.chars().collect();
    self.reset();
  }

  /// Rewind to the start of the current input and forget past errors.
  pub fn reset(&mut self) {
    self.pos = 0;
    self.line = 1;
    self.column = 1;
    self.errors.clear();
  }

  /// Whether any non-whitespace input remains. Does not consume anything.
  pub fn has_next(&self) -> bool {
    self.input[self.pos..].iter().any(|&c| !is_whitespace(c))
  }

  /// Lexical errors met since the last [`Lexer::set_input`] or [`Lexer::reset`].
  pub fn errors(&self) -> &[LexError] {
    &self.errors
  }

  /// Position just past the consumed input, for anchoring the EOF marker.
  pub fn location(&self) -> (usize, usize) {
    (self.line, self.column)
  }

  /// Tokenize `input` completely, using the streaming interface.
  pub fn tokenize(&mut self, input: &str) -> Vec<Token> {
    self.set_input(input);
    self.by_ref().collect()
  }

  /// Run one scanning cycle. Returns `None` at end of input.
  pub fn scan_lexeme(&mut self) -> Option<Scan> {
    self.skip_whitespace();
    if self.pos >= self.input.len() {
      return None;
    }

    let start = self.pos;
    let (line, column) = (self.line, self.column);
    for (dfa, alive) in self.automata.iter_mut().zip(self.alive.iter_mut()) {
      dfa.init();
      *alive = true;
    }

    let string_slot = self.automata.len() - 1;
    let mut best: Option<(usize, usize)> = None;
    let mut cursor = start;

    while cursor < self.input.len() {
      let c = self.input[cursor];
      if is_whitespace(c) && !self.alive[string_slot] {
        break;
      }

      let mut survivors = false;
      for (index, dfa) in self.automata.iter_mut().enumerate() {
        if !self.alive[index] {
          continue;
        }
        if !dfa.evaluate(c) {
          self.alive[index] = false;
          continue;
        }
        survivors = true;
        // The first accepting automaton in registration order takes the tie.
        if dfa.is_accepted() && best.is_none_or(|(end, _)| end <= cursor) {
          best = Some((cursor + 1, index));
        }
      }

      if !survivors {
        break;
      }
      cursor += 1;
    }

    match best {
      Some((end, index)) => {
        let text: String = self.input[start..end].iter().collect();
        self.advance_to(end);
        Some(Scan::Token(Token::new(
          self.automata[index].kind(),
          text,
          line,
          column,
        )))
      }
      None => {
        let error = LexError {
          character: self.input[start],
          line,
          column,
        };
        warn!(%error, "skipping unrecognised character");
        self.advance_to(start + 1);
        self.errors.push(error.clone());
        Some(Scan::Error(error))
      }
    }
  }

  fn skip_whitespace(&mut self) {
    while self.pos < self.input.len() && is_whitespace(self.input[self.pos]) {
      self.step();
    }
  }

  fn advance_to(&mut self, end: usize) {
    while self.pos < end {
      self.step();
    }
  }

  fn step(&mut self) {
    if self.input[self.pos] == '\n' {
      self.line += 1;
      self.column = 1;
    } else {
      self.column += 1;
    }
    self.pos += 1;
  }
}

/// Streaming interface: yields tokens, silently retrying past lexical errors.
impl Iterator for Lexer {
  type Item = Token;

  fn next(&mut self) -> Option<Token> {
    loop {
      match self.scan_lexeme()? {
        Scan::Token(token) => return Some(token),
        Scan::Error(_) => continue,
      }
    }
  }
}

// ^[0-9]+$
fn number_dfa() -> Result<Dfa, DfaError> {
  let mut dfa = DfaBuilder::new(2, DIGITS, TokenKind::Number);
  dfa.add_transitions(0, DIGITS, 1)?;
  dfa.add_transitions(1, DIGITS, 1)?;
  dfa.set_final_state(1)?;
  Ok(dfa.release())
}

// ^[A-Za-z_][A-Za-z0-9_]*$
fn identifier_dfa() -> Result<Dfa, DfaError> {
  let alphabet = format!("{DIGITS}{LETTERS}");
  let mut dfa = DfaBuilder::new(2, &alphabet, TokenKind::Identifier);
  dfa.add_transitions(0, LETTERS, 1)?;
  dfa.add_transitions(1, &alphabet, 1)?;
  dfa.set_final_state(1)?;
  Ok(dfa.release())
}

fn single_char_dfa(symbol: char, kind: TokenKind) -> Result<Dfa, DfaError> {
  let mut dfa = DfaBuilder::new(2, &symbol.to_string(), kind);
  dfa.add_transition(0, symbol, 1)?;
  dfa.set_final_state(1)?;
  Ok(dfa.release())
}

// ^<-$
fn assign_dfa() -> Result<Dfa, DfaError> {
  let mut dfa = DfaBuilder::new(3, "<-", TokenKind::Assign);
  dfa.add_transition(0, '<', 1)?;
  dfa.add_transition(1, '-', 2)?;
  dfa.set_final_state(2)?;
  Ok(dfa.release())
}

// ^"[^"]*"$; no escapes, quotes kept in the lexeme.
fn string_dfa() -> Result<Dfa, DfaError> {
  let mut dfa = DfaBuilder::new(3, "\"", TokenKind::Str).with_other_class();
  dfa.add_transition(0, '"', 1)?;
  dfa.add_other_transition(1, 1)?;
  dfa.add_transition(1, '"', 2)?;
  dfa.set_final_state(2)?;
  Ok(dfa.release())
}

#[cfg(test)]
mod tests {
  use super::*;

  fn lex(input: &str) -> Vec<(TokenKind, String)> {
    Lexer::new()
      .unwrap()
      .tokenize(input)
      .into_iter()
      .map(|token| (token.kind, token.text))
      .collect()
  }

  fn tok(kind: TokenKind, text: &str) -> (TokenKind, String) {
    (kind, text.to_string())
  }

  #[test]
  fn numbers_and_identifiers() {
    assert_eq!(lex("123"), vec![tok(TokenKind::Number, "123")]);
    assert_eq!(lex("_underscore"), vec![tok(TokenKind::Identifier, "_underscore")]);
    assert_eq!(
      lex("var123 456 test"),
      vec![
        tok(TokenKind::Identifier, "var123"),
        tok(TokenKind::Number, "456"),
        tok(TokenKind::Identifier, "test"),
      ]
    );
  }

  #[test]
  fn whitespace_never_produces_tokens() {
    assert_eq!(
      lex("  hello   123  "),
      vec![tok(TokenKind::Identifier, "hello"), tok(TokenKind::Number, "123")]
    );
    assert_eq!(
      lex("\thello\t123\t"),
      vec![tok(TokenKind::Identifier, "hello"), tok(TokenKind::Number, "123")]
    );
    assert!(lex("").is_empty());
    assert!(lex(" \t\r\n ").is_empty());
  }

  #[test]
  fn digits_then_letters_split_into_two_tokens() {
    assert_eq!(
      lex("123abc"),
      vec![tok(TokenKind::Number, "123"), tok(TokenKind::Identifier, "abc")]
    );
  }

  #[test]
  fn operators_need_no_surrounding_whitespace() {
    assert_eq!(
      lex("result<-(a+b)*c;"),
      vec![
        tok(TokenKind::Identifier, "result"),
        tok(TokenKind::Assign, "<-"),
        tok(TokenKind::LeftParen, "("),
        tok(TokenKind::Identifier, "a"),
        tok(TokenKind::Plus, "+"),
        tok(TokenKind::Identifier, "b"),
        tok(TokenKind::RightParen, ")"),
        tok(TokenKind::Times, "*"),
        tok(TokenKind::Identifier, "c"),
        tok(TokenKind::Semicolon, ";"),
      ]
    );
  }

  #[test]
  fn strings_keep_quotes_and_inner_whitespace() {
    assert_eq!(
      lex("msg <- \"hello world\";"),
      vec![
        tok(TokenKind::Identifier, "msg"),
        tok(TokenKind::Assign, "<-"),
        tok(TokenKind::Str, "\"hello world\""),
        tok(TokenKind::Semicolon, ";"),
      ]
    );
    assert_eq!(lex("\"\""), vec![tok(TokenKind::Str, "\"\"")]);
  }

  #[test]
  fn strings_take_any_character_but_a_quote() {
    assert_eq!(lex("\"héllo\""), vec![tok(TokenKind::Str, "\"héllo\"")]);
    assert_eq!(lex("\"$ <- ;\""), vec![tok(TokenKind::Str, "\"$ <- ;\"")]);

    let mut lexer = Lexer::new().unwrap();
    let tokens = lexer.tokenize("s <- \"a\nb\";");
    assert!(lexer.errors().is_empty());
    assert_eq!(tokens[2], Token::new(TokenKind::Str, "\"a\nb\"", 1, 6));
    assert_eq!(tokens[3], Token::new(TokenKind::Semicolon, ";", 2, 3));
  }

  #[test]
  fn location_follows_consumed_input() {
    let mut lexer = Lexer::new().unwrap();
    lexer.set_input("ab\n  c");
    assert_eq!(lexer.location(), (1, 1));
    assert_eq!(lexer.next().unwrap().text, "ab");
    assert_eq!(lexer.location(), (1, 3));
    assert_eq!(lexer.next().unwrap().text, "c");
    assert!(lexer.next().is_none());
    assert_eq!(lexer.location(), (2, 4));
  }

  #[test]
  fn positions_are_one_based() {
    let tokens = Lexer::new().unwrap().tokenize("a <- 1;\n  bb <- 22;");
    let positions: Vec<_> = tokens.iter().map(|t| (t.line, t.column)).collect();
    assert_eq!(
      positions,
      vec![(1, 1), (1, 3), (1, 6), (1, 7), (2, 3), (2, 6), (2, 9), (2, 11)]
    );
  }

  #[test]
  fn unknown_characters_are_skipped_and_recorded() {
    let mut lexer = Lexer::new().unwrap();
    let tokens: Vec<_> = lexer
      .tokenize("a $ 1")
      .into_iter()
      .map(|t| t.kind)
      .collect();
    assert_eq!(tokens, vec![TokenKind::Identifier, TokenKind::Number]);
    assert_eq!(
      lexer.errors(),
      &[LexError {
        character: '$',
        line: 1,
        column: 3,
      }]
    );
  }

  #[test]
  fn lone_angle_bracket_is_an_error() {
    let mut lexer = Lexer::new().unwrap();
    lexer.set_input("a < 123;");
    assert_eq!(lexer.scan_lexeme().map(|s| matches!(s, Scan::Token(_))), Some(true));
    assert!(matches!(lexer.scan_lexeme(), Some(Scan::Error(LexError { character: '<', .. }))));
    assert_eq!(
      lexer.scan_lexeme(),
      Some(Scan::Token(Token::new(TokenKind::Number, "123", 1, 5)))
    );
  }

  #[test]
  fn unterminated_string_falls_back_to_an_error() {
    let mut lexer = Lexer::new().unwrap();
    let kinds: Vec<_> = lexer.tokenize("\"abc").into_iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TokenKind::Identifier]);
    assert_eq!(lexer.errors().len(), 1);
  }

  #[test]
  fn streaming_matches_has_next() {
    let mut lexer = Lexer::new().unwrap();
    lexer.set_input("hello 123 world");
    let mut seen = Vec::new();
    while lexer.has_next() {
      seen.push(lexer.next().unwrap().text);
    }
    assert_eq!(seen, vec!["hello", "123", "world"]);
    assert!(lexer.next().is_none());
  }

  #[test]
  fn reset_rewinds() {
    let mut lexer = Lexer::new().unwrap();
    lexer.set_input("abc 123");
    assert_eq!(lexer.next().unwrap().text, "abc");
    lexer.reset();
    assert!(lexer.has_next());
    assert_eq!(lexer.next().unwrap().text, "abc");
  }
}
