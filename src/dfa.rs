//! Deterministic finite automata, one per token class.
//!
//! An automaton goes through two phases. [`DfaBuilder`] accepts transitions
//! and final states and validates every call. [`DfaBuilder::release`] freezes
//! it into a [`Dfa`], which only knows how to evaluate input:
//!
//! ```
//! use streamc::dfa::DfaBuilder;
//! use streamc::token::TokenKind;
//!
//! let mut builder = DfaBuilder::new(2, "+", TokenKind::Plus);
//! builder.add_transition(0, '+', 1)?;
//! builder.set_final_state(1)?;
//! let mut dfa = builder.release();
//! assert!(dfa.evaluate('+'));
//! assert!(dfa.is_accepted());
//! assert!(!dfa.evaluate('+'));
//! # Ok::<(), streamc::dfa::DfaError>(())
//! ```
//!
//! Because the frozen type has no mutators, editing a released automaton
//! does not compile:
//!
//! ```compile_fail
//! use streamc::dfa::DfaBuilder;
//! use streamc::token::TokenKind;
//!
//! let mut dfa = DfaBuilder::new(2, "+", TokenKind::Plus).release();
//! dfa.add_transition(0, '+', 1);
//! ```

use std::collections::{HashMap, HashSet};

use snafu::{OptionExt, Snafu, ensure};

use crate::token::TokenKind;

#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum DfaError {
  #[snafu(display("invalid state {state}: the {kind} automaton has {states} states"))]
  InvalidState {
    state: usize,
    states: usize,
    kind: TokenKind,
  },
  #[snafu(display("symbol {symbol:?} is not in the alphabet of the {kind} automaton"))]
  SymbolNotInAlphabet { symbol: char, kind: TokenKind },
  #[snafu(display("the {kind} automaton has no class for other symbols"))]
  NoOtherClass { kind: TokenKind },
}

/// Mutable construction phase of an automaton.
#[derive(Debug, Clone)]
pub struct DfaBuilder {
  kind: TokenKind,
  alphabet: HashMap<char, usize>,
  /// Column shared by every symbol outside `alphabet`, if any.
  other: Option<usize>,
  rows: Vec<Vec<Option<usize>>>,
  finals: HashSet<usize>,
}

impl DfaBuilder {
  /// Start building an automaton with `states` states over `alphabet`.
  /// State 0 is the initial state.
  pub fn new(states: usize, alphabet: &str, kind: TokenKind) -> Self {
    let mut symbols = HashMap::new();
    for symbol in alphabet.chars() {
      let next = symbols.len();
      symbols.entry(symbol).or_insert(next);
    }
    let width = symbols.len();
    Self {
      kind,
      alphabet: symbols,
      other: None,
      rows: vec![vec![None; width]; states],
      finals: HashSet::new(),
    }
  }

  /// Extend the alphabet with one class standing for every symbol not listed
  /// in it, so the automaton accepts arbitrary text through that class.
  pub fn with_other_class(mut self) -> Self {
    if self.other.is_none() {
      self.other = Some(self.alphabet.len());
      for row in &mut self.rows {
        row.push(None);
      }
    }
    self
  }

  /// Record `from --symbol--> to`. A later call for the same `(from, symbol)`
  /// overwrites the earlier one.
  pub fn add_transition(&mut self, from: usize, symbol: char, to: usize) -> Result<(), DfaError> {
    self.check_state(from)?;
    self.check_state(to)?;
    let column = *self
      .alphabet
      .get(&symbol)
      .context(SymbolNotInAlphabetSnafu {
        symbol,
        kind: self.kind,
      })?;
    self.rows[from][column] = Some(to);
    Ok(())
  }

  /// Record `from --other--> to` for every symbol outside the alphabet.
  pub fn add_other_transition(&mut self, from: usize, to: usize) -> Result<(), DfaError> {
    self.check_state(from)?;
    self.check_state(to)?;
    let column = self.other.context(NoOtherClassSnafu { kind: self.kind })?;
    self.rows[from][column] = Some(to);
    Ok(())
  }

  /// Add every symbol of `symbols` as a transition `from -> to`.
  pub fn add_transitions(&mut self, from: usize, symbols: &str, to: usize) -> Result<(), DfaError> {
    symbols
      .chars()
      .try_for_each(|symbol| self.add_transition(from, symbol, to))
  }

  pub fn set_final_state(&mut self, state: usize) -> Result<(), DfaError> {
    self.check_state(state)?;
    self.finals.insert(state);
    Ok(())
  }

  /// Freeze the automaton. Structurally identical transition rows are stored
  /// once and shared by index.
  pub fn release(self) -> Dfa {
    let mut pool: HashMap<Vec<Option<usize>>, usize> = HashMap::new();
    let mut rows = Vec::new();
    let mut row_of_state = Vec::with_capacity(self.rows.len());

    for row in self.rows {
      let index = *pool.entry(row.clone()).or_insert_with(|| {
        rows.push(row.into_boxed_slice());
        rows.len() - 1
      });
      row_of_state.push(index);
    }

    Dfa {
      kind: self.kind,
      alphabet: self.alphabet,
      other: self.other,
      rows,
      row_of_state,
      finals: self.finals,
      current: Some(0),
    }
  }

  fn check_state(&self, state: usize) -> Result<(), DfaError> {
    ensure!(
      state < self.rows.len(),
      InvalidStateSnafu {
        state,
        states: self.rows.len(),
        kind: self.kind,
      }
    );
    Ok(())
  }
}

/// Frozen automaton: evaluation only.
#[derive(Debug, Clone)]
pub struct Dfa {
  kind: TokenKind,
  alphabet: HashMap<char, usize>,
  other: Option<usize>,
  rows: Vec<Box<[Option<usize>]>>,
  row_of_state: Vec<usize>,
  finals: HashSet<usize>,
  /// `None` once the automaton has rejected its input.
  current: Option<usize>,
}

impl Dfa {
  pub fn kind(&self) -> TokenKind {
    self.kind
  }

  /// Return to the initial state, clearing a previous rejection.
  pub fn init(&mut self) {
    self.current = Some(0);
  }

  /// Feed one symbol. Returns `false` and stays rejected until [`Dfa::init`]
  /// when the symbol has no column or no edge.
  pub fn evaluate(&mut self, symbol: char) -> bool {
    let column = self.alphabet.get(&symbol).copied().or(self.other);
    self.current = match (self.current, column) {
      (Some(state), Some(column)) => self
        .row_of_state
        .get(state)
        .and_then(|&row| self.rows[row][column]),
      _ => None,
    };
    self.current.is_some()
  }

  pub fn is_accepted(&self) -> bool {
    self
      .current
      .is_some_and(|state| self.finals.contains(&state))
  }

  pub fn is_rejected(&self) -> bool {
    self.current.is_none()
  }

  /// Number of distinct transition rows kept after compression.
  pub fn distinct_rows(&self) -> usize {
    self.rows.len()
  }
}
