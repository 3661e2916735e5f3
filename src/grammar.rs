//! Grammar symbols, productions and the nullable/FIRST/FOLLOW analysis both
//! table builders rely on.
//!
//! Terminals are [`TokenKind`]s; non-terminals are a closed enum so table
//! lookups are exhaustively typed rather than keyed on strings.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use snafu::Snafu;

use crate::token::TokenKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NonTerminal {
  Program,
  StatementList,
  Statement,
  Expression,
  /// `Expression'` of the right-recursive grammar.
  ExpressionTail,
  Term,
  /// `Term'` of the right-recursive grammar.
  TermTail,
  Factor,
}

impl fmt::Display for NonTerminal {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      NonTerminal::Program => "Program",
      NonTerminal::StatementList => "StatementList",
      NonTerminal::Statement => "Statement",
      NonTerminal::Expression => "Expression",
      NonTerminal::ExpressionTail => "Expression'",
      NonTerminal::Term => "Term",
      NonTerminal::TermTail => "Term'",
      NonTerminal::Factor => "Factor",
    };
    f.write_str(name)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Symbol {
  Terminal(TokenKind),
  NonTerminal(NonTerminal),
}

impl fmt::Display for Symbol {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Symbol::Terminal(kind) => kind.fmt(f),
      Symbol::NonTerminal(nt) => nt.fmt(f),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Production {
  pub lhs: NonTerminal,
  /// Empty for an ε-production.
  pub rhs: Vec<Symbol>,
}

impl Production {
  pub fn is_epsilon(&self) -> bool {
    self.rhs.is_empty()
  }
}

impl fmt::Display for Production {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ->", self.lhs)?;
    if self.rhs.is_empty() {
      return f.write_str(" ε");
    }
    for symbol in &self.rhs {
      write!(f, " {symbol}")?;
    }
    Ok(())
  }
}

/// A parse-table cell that two different actions both claim.
#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum GrammarError {
  #[snafu(display("LL(1) conflict at [{non_terminal}, {terminal}]: {first} vs {second}"))]
  PredictConflict {
    non_terminal: NonTerminal,
    terminal: TokenKind,
    first: String,
    second: String,
  },
  #[snafu(display("SLR conflict in state {state} on {terminal}: {first} vs {second}"))]
  ActionConflict {
    state: usize,
    terminal: TokenKind,
    first: String,
    second: String,
  },
}

pub struct Grammar {
  start: NonTerminal,
  productions: Vec<Production>,
  nullable: BTreeSet<NonTerminal>,
  first: BTreeMap<NonTerminal, BTreeSet<TokenKind>>,
  follow: BTreeMap<NonTerminal, BTreeSet<TokenKind>>,
}

use NonTerminal as N;
use TokenKind as T;

fn t(kind: TokenKind) -> Symbol {
  Symbol::Terminal(kind)
}

fn n(nt: NonTerminal) -> Symbol {
  Symbol::NonTerminal(nt)
}

fn rule(lhs: NonTerminal, rhs: &[Symbol]) -> Production {
  Production {
    lhs,
    rhs: rhs.to_vec(),
  }
}

impl Grammar {
  /// Statement grammar with left recursion removed, for predictive parsing.
  pub fn right_recursive() -> Self {
    Self::new(
      N::Program,
      vec![
        rule(N::Program, &[n(N::StatementList)]),
        rule(N::StatementList, &[n(N::Statement), n(N::StatementList)]),
        rule(N::StatementList, &[]),
        rule(
          N::Statement,
          &[t(T::Identifier), t(T::Assign), n(N::Expression), t(T::Semicolon)],
        ),
        rule(N::Expression, &[n(N::Term), n(N::ExpressionTail)]),
        rule(N::ExpressionTail, &[t(T::Plus), n(N::Term), n(N::ExpressionTail)]),
        rule(N::ExpressionTail, &[]),
        rule(N::Term, &[n(N::Factor), n(N::TermTail)]),
        rule(N::TermTail, &[t(T::Times), n(N::Factor), n(N::TermTail)]),
        rule(N::TermTail, &[]),
        rule(N::Factor, &[t(T::Identifier)]),
        rule(N::Factor, &[t(T::Number)]),
        rule(N::Factor, &[t(T::Str)]),
        rule(
          N::Factor,
          &[t(T::LeftParen), n(N::Expression), t(T::RightParen)],
        ),
      ],
    )
  }

  /// Statement grammar with natural left recursion, for shift-reduce parsing.
  pub fn left_recursive() -> Self {
    Self::new(
      N::Program,
      vec![
        rule(N::Program, &[n(N::StatementList)]),
        rule(N::StatementList, &[n(N::Statement), n(N::StatementList)]),
        rule(N::StatementList, &[]),
        rule(
          N::Statement,
          &[t(T::Identifier), t(T::Assign), n(N::Expression), t(T::Semicolon)],
        ),
        rule(N::Expression, &[n(N::Expression), t(T::Plus), n(N::Term)]),
        rule(N::Expression, &[n(N::Term)]),
        rule(N::Term, &[n(N::Term), t(T::Times), n(N::Factor)]),
        rule(N::Term, &[n(N::Factor)]),
        rule(N::Factor, &[t(T::Identifier)]),
        rule(N::Factor, &[t(T::Number)]),
        rule(N::Factor, &[t(T::Str)]),
        rule(
          N::Factor,
          &[t(T::LeftParen), n(N::Expression), t(T::RightParen)],
        ),
      ],
    )
  }

  pub fn new(start: NonTerminal, productions: Vec<Production>) -> Self {
    let mut grammar = Self {
      start,
      productions,
      nullable: BTreeSet::new(),
      first: BTreeMap::new(),
      follow: BTreeMap::new(),
    };
    grammar.compute_first();
    grammar.compute_follow();
    grammar
  }

  pub fn start(&self) -> NonTerminal {
    self.start
  }

  pub fn productions(&self) -> &[Production] {
    &self.productions
  }

  pub fn production(&self, index: usize) -> &Production {
    &self.productions[index]
  }

  pub fn non_terminals(&self) -> BTreeSet<NonTerminal> {
    self.productions.iter().map(|p| p.lhs).collect()
  }

  pub fn is_nullable(&self, nt: NonTerminal) -> bool {
    self.nullable.contains(&nt)
  }

  pub fn first(&self, nt: NonTerminal) -> BTreeSet<TokenKind> {
    self.first.get(&nt).cloned().unwrap_or_default()
  }

  pub fn follow(&self, nt: NonTerminal) -> BTreeSet<TokenKind> {
    self.follow.get(&nt).cloned().unwrap_or_default()
  }

  /// FIRST of a symbol string, and whether the whole string can vanish.
  pub fn first_of(&self, symbols: &[Symbol]) -> (BTreeSet<TokenKind>, bool) {
    let mut set = BTreeSet::new();
    for symbol in symbols {
      match *symbol {
        Symbol::Terminal(kind) => {
          set.insert(kind);
          return (set, false);
        }
        Symbol::NonTerminal(nt) => {
          if let Some(first) = self.first.get(&nt) {
            set.extend(first.iter().copied());
          }
          if !self.nullable.contains(&nt) {
            return (set, false);
          }
        }
      }
    }
    (set, true)
  }

  fn compute_first(&mut self) {
    let mut changed = true;
    while changed {
      changed = false;
      for index in 0..self.productions.len() {
        let lhs = self.productions[index].lhs;
        let (first, nullable) = self.first_of(&self.productions[index].rhs);
        let entry = self.first.entry(lhs).or_default();
        let before = entry.len();
        entry.extend(first);
        changed |= entry.len() != before;
        if nullable {
          changed |= self.nullable.insert(lhs);
        }
      }
    }
  }

  fn compute_follow(&mut self) {
    self
      .follow
      .entry(self.start)
      .or_default()
      .insert(TokenKind::EndOfFile);

    let mut changed = true;
    while changed {
      changed = false;
      for production in &self.productions {
        for (position, symbol) in production.rhs.iter().enumerate() {
          let Symbol::NonTerminal(nt) = *symbol else {
            continue;
          };
          let (mut additions, rest_nullable) = self.first_of(&production.rhs[position + 1..]);
          if rest_nullable && let Some(lhs_follow) = self.follow.get(&production.lhs) {
            additions.extend(lhs_follow.iter().copied());
          }
          let entry = self.follow.entry(nt).or_default();
          let before = entry.len();
          entry.extend(additions);
          changed |= entry.len() != before;
        }
      }
    }
  }
}
