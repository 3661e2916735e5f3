//! Shift-reduce parsing with SLR(1) tables over the left-recursive grammar.
//!
//! The tables come from the canonical LR(0) collection of the grammar
//! augmented with `S' -> Program`. Reductions are placed on the FOLLOW set
//! of the production's left-hand side; any cell claimed twice is reported
//! as a [`GrammarError::ActionConflict`].

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use snafu::OptionExt;
use tracing::{debug, trace};

use crate::error::CompileResult;
use crate::grammar::{Grammar, GrammarError, NonTerminal, Production, Symbol};
use crate::parse_tree::{NodeId, ParseTree};
use crate::token::TokenKind;
use crate::tokenizer::{LexError, Lexer};

use super::{MalformedTreeSnafu, Parse, ParseError, lookahead};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
  Shift(usize),
  /// Index into the grammar's productions.
  Reduce(usize),
  Accept,
}

impl fmt::Display for Action {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Action::Shift(state) => write!(f, "s{state}"),
      Action::Reduce(production) => write!(f, "r{production}"),
      Action::Accept => f.write_str("acc"),
    }
  }
}

/// An LR(0) item. `production: None` is the augmented start rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Item {
  production: Option<usize>,
  dot: usize,
}

type ItemSet = BTreeSet<Item>;

struct Automaton<'g> {
  grammar: &'g Grammar,
  augmented: [Symbol; 1],
}

impl<'g> Automaton<'g> {
  fn new(grammar: &'g Grammar) -> Self {
    Self {
      grammar,
      augmented: [Symbol::NonTerminal(grammar.start())],
    }
  }

  fn rhs(&self, item: Item) -> &[Symbol] {
    match item.production {
      Some(index) => &self.grammar.production(index).rhs,
      None => &self.augmented,
    }
  }

  fn next_symbol(&self, item: Item) -> Option<Symbol> {
    self.rhs(item).get(item.dot).copied()
  }

  fn closure(&self, kernel: ItemSet) -> ItemSet {
    let mut items = kernel;
    let mut pending: Vec<Item> = items.iter().copied().collect();
    while let Some(item) = pending.pop() {
      let Some(Symbol::NonTerminal(nt)) = self.next_symbol(item) else {
        continue;
      };
      for (index, production) in self.grammar.productions().iter().enumerate() {
        let fresh = Item {
          production: Some(index),
          dot: 0,
        };
        if production.lhs == nt && items.insert(fresh) {
          pending.push(fresh);
        }
      }
    }
    items
  }

  fn goto(&self, items: &ItemSet, symbol: Symbol) -> ItemSet {
    let kernel = items
      .iter()
      .filter(|&&item| self.next_symbol(item) == Some(symbol))
      .map(|&item| Item {
        dot: item.dot + 1,
        ..item
      })
      .collect();
    self.closure(kernel)
  }
}

#[derive(Debug, Clone)]
pub struct SlrTable {
  productions: Vec<Production>,
  states: usize,
  action: BTreeMap<(usize, TokenKind), Action>,
  goto: BTreeMap<(usize, NonTerminal), usize>,
}

impl SlrTable {
  pub fn build(grammar: &Grammar) -> Result<Self, GrammarError> {
    let automaton = Automaton::new(grammar);
    let start = automaton.closure(BTreeSet::from([Item {
      production: None,
      dot: 0,
    }]));

    let mut states: Vec<ItemSet> = vec![start.clone()];
    let mut index: BTreeMap<ItemSet, usize> = BTreeMap::from([(start, 0)]);
    let mut table = Self {
      productions: grammar.productions().to_vec(),
      states: 0,
      action: BTreeMap::new(),
      goto: BTreeMap::new(),
    };

    let mut current = 0;
    while current < states.len() {
      let symbols: BTreeSet<Symbol> = states[current]
        .iter()
        .filter_map(|&item| automaton.next_symbol(item))
        .collect();
      for symbol in symbols {
        let target = automaton.goto(&states[current], symbol);
        let next = match index.get(&target) {
          Some(&existing) => existing,
          None => {
            states.push(target.clone());
            index.insert(target, states.len() - 1);
            states.len() - 1
          }
        };
        match symbol {
          Symbol::Terminal(terminal) => table.set_action(current, terminal, Action::Shift(next))?,
          Symbol::NonTerminal(nt) => {
            table.goto.insert((current, nt), next);
          }
        }
      }

      for &item in &states[current] {
        if automaton.next_symbol(item).is_some() {
          continue;
        }
        match item.production {
          None => table.set_action(current, TokenKind::EndOfFile, Action::Accept)?,
          Some(production) => {
            for terminal in grammar.follow(grammar.production(production).lhs) {
              table.set_action(current, terminal, Action::Reduce(production))?;
            }
          }
        }
      }
      current += 1;
    }

    table.states = states.len();
    debug!(
      states = table.states,
      actions = table.action.len(),
      gotos = table.goto.len(),
      "built SLR table"
    );
    Ok(table)
  }

  fn set_action(&mut self, state: usize, terminal: TokenKind, action: Action) -> Result<(), GrammarError> {
    match self.action.get(&(state, terminal)) {
      Some(&existing) if existing != action => Err(GrammarError::ActionConflict {
        state,
        terminal,
        first: self.describe(existing),
        second: self.describe(action),
      }),
      _ => {
        self.action.insert((state, terminal), action);
        Ok(())
      }
    }
  }

  fn describe(&self, action: Action) -> String {
    match action {
      Action::Reduce(index) => format!("reduce {}", self.productions[index]),
      Action::Shift(state) => format!("shift {state}"),
      Action::Accept => "accept".to_string(),
    }
  }

  pub fn action(&self, state: usize, terminal: TokenKind) -> Option<Action> {
    self.action.get(&(state, terminal)).copied()
  }

  pub fn goto(&self, state: usize, non_terminal: NonTerminal) -> Option<usize> {
    self.goto.get(&(state, non_terminal)).copied()
  }

  pub fn production(&self, index: usize) -> &Production {
    &self.productions[index]
  }

  pub fn state_count(&self) -> usize {
    self.states
  }
}

impl fmt::Display for SlrTable {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "productions:")?;
    for (index, production) in self.productions.iter().enumerate() {
      writeln!(f, "  r{index}: {production}")?;
    }
    for state in 0..self.states {
      write!(f, "state {state}:")?;
      for terminal in TokenKind::ALL {
        if let Some(action) = self.action(state, terminal) {
          write!(f, " {terminal}={action}")?;
        }
      }
      for (&(_, nt), target) in self.goto.range((state, NonTerminal::Program)..=(state, NonTerminal::Factor)) {
        write!(f, " {nt}->{target}")?;
      }
      writeln!(f)?;
    }
    Ok(())
  }
}

pub struct SlrParser {
  name: String,
  lexer: Lexer,
  table: SlrTable,
}

impl SlrParser {
  pub fn new() -> CompileResult<Self> {
    Self::with_name("program")
  }

  pub fn with_name(name: impl Into<String>) -> CompileResult<Self> {
    Ok(Self {
      name: name.into(),
      lexer: Lexer::new()?,
      table: SlrTable::build(&Grammar::left_recursive())?,
    })
  }

  pub fn table(&self) -> &SlrTable {
    &self.table
  }
}

impl Parse for SlrParser {
  fn name(&self) -> &str {
    &self.name
  }

  fn set_input(&mut self, input: &str) {
    self.lexer.set_input(input);
  }

  fn lex_errors(&self) -> &[LexError] {
    self.lexer.errors()
  }

  /// Shift and reduce until the table accepts. Reductions keep running on
  /// the end marker; reaching the end of input does not stop the loop.
  fn parse_tree(&mut self) -> Result<ParseTree, ParseError> {
    self.lexer.reset();
    let mut tree = ParseTree::new();
    // (state, node); the bottom entry has no node.
    let mut stack: Vec<(usize, Option<NodeId>)> = vec![(0, None)];
    let mut token = lookahead(&mut self.lexer);

    loop {
      let state = stack.last().map_or(0, |&(state, _)| state);
      let action = self
        .table
        .action(state, token.kind)
        .ok_or_else(|| ParseError::no_action(state, &token))?;
      trace!(state, lookahead = %token.kind, %action, "slr step");

      match action {
        Action::Shift(next) => {
          let leaf = tree.leaf(token.kind, std::mem::take(&mut token.text));
          stack.push((next, Some(leaf)));
          token = lookahead(&mut self.lexer);
        }
        Action::Reduce(index) => {
          let production = self.table.production(index);
          let split = stack
            .len()
            .checked_sub(production.rhs.len())
            .filter(|&split| split > 0)
            .context(MalformedTreeSnafu {
              detail: format!("stack underflow reducing {production}"),
            })?;
          let children = stack.drain(split..).filter_map(|(_, node)| node).collect();
          let node = tree.branch(production.lhs, children);
          let below = stack.last().map_or(0, |&(state, _)| state);
          let next = self
            .table
            .goto(below, production.lhs)
            .ok_or(ParseError::NoGoto {
              state: below,
              non_terminal: production.lhs,
            })?;
          stack.push((next, Some(node)));
        }
        Action::Accept => {
          let root = stack
            .last()
            .and_then(|&(_, node)| node)
            .context(MalformedTreeSnafu {
              detail: "accepted without a program node",
            })?;
          tree.set_root(root);
          return Ok(tree);
        }
      }
    }
  }
}
