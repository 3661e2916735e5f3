//! Crate root: wires together the front-end pipeline.
//!
//! - `tokenizer` runs a bank of DFAs (`dfa`) over the source and yields
//!   `token`s.
//! - `parser` drives either the LL(1) or the SLR engine over the `grammar`,
//!   building a `parse_tree`.
//! - `desugar` turns either parse tree into the same `ast`.
//! - `typeck` assigns a `ty` to every binding.
//! - `error` gathers the stage errors and renders them.

pub mod ast;
pub mod desugar;
pub mod dfa;
pub mod error;
pub mod grammar;
pub mod parse_tree;
pub mod parser;
pub mod token;
pub mod tokenizer;
pub mod ty;
pub mod typeck;

use tracing::info_span;

pub use ast::Ast;
pub use error::{CompileError, CompileResult};
pub use parser::{Engine, Parse};
pub use ty::{Type, TypeEnvironment};

/// Parse `source` with the chosen engine.
pub fn parse_source(engine: Engine, name: &str, source: &str) -> CompileResult<Ast> {
  let _span = info_span!("parse", %engine, name).entered();
  let mut parser = engine.parser(name)?;
  parser.set_input(source);
  Ok(parser.parse()?)
}

/// Parse and type-check `source`, returning the populated environment.
pub fn check_source(engine: Engine, name: &str, source: &str) -> CompileResult<TypeEnvironment> {
  let ast = parse_source(engine, name, source)?;
  let _span = info_span!("typecheck", name).entered();
  typeck::TypeChecker::new(&ast).check()
}
