//! Crate-level error type and diagnostic rendering.
//!
//! Each stage reports through its own error enum; `CompileError` gathers
//! them so the pipeline can use `?` throughout. Located errors render in the
//! chibicc style: the offending source line, then a caret under the column.

use std::io;
use std::path::PathBuf;

use snafu::Snafu;

use crate::dfa::DfaError;
use crate::grammar::GrammarError;
use crate::parser::ParseError;
use crate::typeck::TypeError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CompileError {
  #[snafu(context(false), display("lexer construction failed: {source}"))]
  Dfa { source: DfaError },
  #[snafu(context(false), display("grammar is not suitable for this parser: {source}"))]
  Grammar { source: GrammarError },
  #[snafu(context(false), display("syntax error: {source}"))]
  Parse { source: ParseError },
  #[snafu(display("type check of '{program}' failed with {} error(s)", errors.len()))]
  TypeCheckFailed {
    program: String,
    errors: Vec<TypeError>,
  },
  #[snafu(display("failed to read {}: {source}", path.display()))]
  ReadInput { path: PathBuf, source: io::Error },
  #[snafu(display("failed to write {}: {source}", path.display()))]
  WriteOutput { path: PathBuf, source: io::Error },
}

impl CompileError {
  /// Render for humans, pointing into `source` where the error has a
  /// position.
  pub fn render(&self, source: &str) -> String {
    match self {
      CompileError::Parse { source: error } => match error.location() {
        Some((line, column)) => annotate(source, line, column, &self.to_string()),
        None => self.to_string(),
      },
      CompileError::TypeCheckFailed { errors, .. } => {
        let mut out = self.to_string();
        for error in errors {
          out.push_str("\n  ");
          out.push_str(&error.to_string());
        }
        out
      }
      _ => self.to_string(),
    }
  }
}

/// `line:column: message`, the quoted source line and a caret under
/// `column`. Both coordinates are 1-based; out-of-range positions clamp to
/// the end of the input.
pub fn annotate(source: &str, line: usize, column: usize, message: &str) -> String {
  let text = source.lines().nth(line.saturating_sub(1)).unwrap_or("");
  let offset = column.saturating_sub(1).min(text.chars().count());
  let expr_line = format!("'{text}'");
  let marker = format!("{}^", " ".repeat(offset + 1)); // account for opening quote
  format!("{line}:{column}: {message}\n{expr_line}\n{marker}")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::token::TokenKind;

  #[test]
  fn caret_points_at_the_column() {
    let rendered = annotate("a <- 1;\nb <- ;", 2, 6, "boom");
    assert_eq!(rendered, "2:6: boom\n'b <- ;'\n      ^");
  }

  #[test]
  fn parse_errors_render_with_location() {
    let error = CompileError::from(ParseError::Mismatch {
      expected: TokenKind::Semicolon,
      found: "EOF".into(),
      kind: TokenKind::EndOfFile,
      line: 1,
      column: 7,
    });
    let rendered = error.render("x <- 1");
    assert!(rendered.starts_with("1:7: syntax error: expected 'semicolon' but found 'EOF'"));
    assert!(rendered.ends_with("'x <- 1'\n       ^"));
  }

  #[test]
  fn type_failures_list_every_error() {
    let error = CompileError::TypeCheckFailed {
      program: "p".into(),
      errors: vec![
        TypeError::UndeclaredIdentifier { name: "a".into() },
        TypeError::UndeclaredIdentifier { name: "b".into() },
      ],
    };
    assert_eq!(
      error.render(""),
      "type check of 'p' failed with 2 error(s)\n  variable 'a' used before declaration\n  variable 'b' used before declaration"
    );
  }
}
