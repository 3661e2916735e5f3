//! Type checking of a desugared program.
//!
//! The checker walks the whole tree even after a failure so that every
//! diagnostic in the program is reported at once. Each one is logged as it
//! is found and collected; [`TypeChecker::check`] fails at the end if any
//! were recorded.

use snafu::Snafu;
use tracing::warn;

use crate::ast::{Ast, AstKind, AstNode};
use crate::error::{CompileError, CompileResult};
use crate::ty::{STDOUT, Type, TypeEnvironment};

#[derive(Debug, Clone, Snafu, PartialEq, Eq)]
pub enum TypeError {
  #[snafu(display("variable '{name}' used before declaration"))]
  UndeclaredIdentifier { name: String },
  #[snafu(display("cannot assign to input stream '{name}'"))]
  AssignToInputStream { name: String },
  #[snafu(display("cannot redirect input stream into output stream '{name}'"))]
  InputToOutputStream { name: String },
  #[snafu(display("output stream cannot be used as a value (assigned to '{name}')"))]
  OutputStreamAsValue { name: String },
  #[snafu(display("cannot assign type {found} to variable '{name}' declared as {declared}"))]
  IncompatibleAssignment {
    name: String,
    declared: Type,
    found: Type,
  },
  #[snafu(display("invalid operand types for '+': {lhs} and {rhs}"))]
  InvalidAddition { lhs: Type, rhs: Type },
  #[snafu(display("invalid operand types for '*': {lhs} and {rhs}"))]
  InvalidMultiplication { lhs: Type, rhs: Type },
}

pub struct TypeChecker<'a> {
  ast: &'a Ast,
  env: TypeEnvironment,
  errors: Vec<TypeError>,
}

impl<'a> TypeChecker<'a> {
  pub fn new(ast: &'a Ast) -> Self {
    Self {
      ast,
      env: TypeEnvironment::new(),
      errors: Vec::new(),
    }
  }

  /// Type the whole program. Returns the populated environment, or every
  /// diagnostic found wrapped in [`CompileError::TypeCheckFailed`].
  pub fn check(mut self) -> CompileResult<TypeEnvironment> {
    let ast = self.ast;
    self.type_of(ast.root());
    if self.errors.is_empty() {
      Ok(self.env)
    } else {
      Err(CompileError::TypeCheckFailed {
        program: self.ast.name().to_string(),
        errors: self.errors,
      })
    }
  }

  pub fn type_of(&mut self, node: &AstNode) -> Type {
    match node.kind() {
      AstKind::Root => {
        for statement in node.children() {
          self.type_of(statement);
        }
        Type::Undefined
      }
      AstKind::Number => Type::Number,
      AstKind::Str => Type::Str,
      AstKind::Identifier => self.identifier(node.value()),
      AstKind::Assign => match node.operands() {
        Some((target, value)) => self.assign(target.value(), value),
        None => Type::Undefined,
      },
      AstKind::Plus => match node.operands() {
        Some((lhs, rhs)) => {
          let (lhs, rhs) = (self.type_of(lhs), self.type_of(rhs));
          self.addition(lhs, rhs)
        }
        None => Type::Undefined,
      },
      AstKind::Times => match node.operands() {
        Some((lhs, rhs)) => {
          let (lhs, rhs) = (self.type_of(lhs), self.type_of(rhs));
          self.multiplication(lhs, rhs)
        }
        None => Type::Undefined,
      },
    }
  }

  pub fn environment(&self) -> &TypeEnvironment {
    &self.env
  }

  pub fn errors(&self) -> &[TypeError] {
    &self.errors
  }

  fn report(&mut self, error: TypeError) -> Type {
    warn!(%error, "type error");
    self.errors.push(error);
    Type::Undefined
  }

  fn identifier(&mut self, name: &str) -> Type {
    // A name bound to `undefined` was already reported where it was bound.
    if !self.env.contains(name) {
      return self.report(TypeError::UndeclaredIdentifier { name: name.into() });
    }
    self.env.lookup(name)
  }

  fn assign(&mut self, name: &str, value: &AstNode) -> Type {
    let declared = self.env.lookup(name);
    let mut found = self.type_of(value);

    if declared == Type::InStream {
      return self.report(TypeError::AssignToInputStream { name: name.into() });
    }
    if found == Type::InStream {
      if name == STDOUT {
        return self.report(TypeError::InputToOutputStream { name: name.into() });
      }
      found = Type::Str;
    }

    match declared {
      // A fresh name takes whatever it is given, the output stream included.
      Type::Undefined => {
        self.env.bind(name, found);
        found
      }
      _ if found == Type::OutStream => {
        self.report(TypeError::OutputStreamAsValue { name: name.into() })
      }
      _ if declared == found => declared,
      Type::OutStream => Type::OutStream,
      _ if !found.is_defined() => declared,
      _ => {
        self.report(TypeError::IncompatibleAssignment {
          name: name.into(),
          declared,
          found,
        });
        declared
      }
    }
  }

  fn addition(&mut self, lhs: Type, rhs: Type) -> Type {
    match (lhs, rhs) {
      (Type::Number, Type::Number) => Type::Number,
      (Type::Str, Type::Str) => Type::Str,
      (Type::Undefined, _) | (_, Type::Undefined) => Type::Undefined,
      _ => self.report(TypeError::InvalidAddition { lhs, rhs }),
    }
  }

  // Either operand may be the repeat count.
  fn multiplication(&mut self, lhs: Type, rhs: Type) -> Type {
    match (lhs, rhs) {
      (Type::Number, Type::Number) => Type::Number,
      (Type::Number, Type::Str) | (Type::Str, Type::Number) => Type::Str,
      (Type::Undefined, _) | (_, Type::Undefined) => Type::Undefined,
      _ => self.report(TypeError::InvalidMultiplication { lhs, rhs }),
    }
  }
}
