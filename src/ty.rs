use std::fmt;

/// Names bound before the first statement.
pub const STDIN: &str = "stdin";
pub const STDOUT: &str = "stdout";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
  Number,
  Str,
  /// Result of an ill-typed expression, or the lookup of an unbound name.
  Undefined,
  InStream,
  OutStream,
}

impl Type {
  pub fn is_stream(self) -> bool {
    matches!(self, Type::InStream | Type::OutStream)
  }

  pub fn is_defined(self) -> bool {
    self != Type::Undefined
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Type::Number => "number",
      Type::Str => "string",
      Type::Undefined => "undefined",
      Type::InStream => "input stream",
      Type::OutStream => "output stream",
    })
  }
}

/// Append-only symbol table. Rebinding a name pushes a new entry and the
/// most recent one wins on lookup; older entries stay visible through
/// [`TypeEnvironment::bindings`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEnvironment {
  symbols: Vec<(String, Type)>,
}

impl Default for TypeEnvironment {
  fn default() -> Self {
    Self::new()
  }
}

impl TypeEnvironment {
  /// Environment holding only `stdin` and `stdout`.
  pub fn new() -> Self {
    Self {
      symbols: vec![
        (STDIN.to_string(), Type::InStream),
        (STDOUT.to_string(), Type::OutStream),
      ],
    }
  }

  pub fn bind(&mut self, name: impl Into<String>, ty: Type) {
    self.symbols.push((name.into(), ty));
  }

  /// Type of the latest binding of `name`, [`Type::Undefined`] if none.
  pub fn lookup(&self, name: &str) -> Type {
    self
      .symbols
      .iter()
      .rev()
      .find(|(bound, _)| bound == name)
      .map_or(Type::Undefined, |&(_, ty)| ty)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.symbols.iter().any(|(bound, _)| bound == name)
  }

  /// Every binding, oldest first, streams included.
  pub fn bindings(&self) -> impl Iterator<Item = (&str, Type)> {
    self.symbols.iter().map(|(name, ty)| (name.as_str(), *ty))
  }

  /// Program variables only, oldest first.
  pub fn variables(&self) -> impl Iterator<Item = (&str, Type)> {
    self.bindings().filter(|(_, ty)| !ty.is_stream())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn seeded_with_streams() {
    let env = TypeEnvironment::new();
    assert_eq!(env.lookup("stdin"), Type::InStream);
    assert_eq!(env.lookup("stdout"), Type::OutStream);
    assert_eq!(env.lookup("x"), Type::Undefined);
    assert_eq!(env.variables().count(), 0);
  }

  #[test]
  fn most_recent_binding_wins() {
    let mut env = TypeEnvironment::new();
    env.bind("x", Type::Number);
    env.bind("y", Type::Str);
    env.bind("x", Type::Str);
    assert_eq!(env.lookup("x"), Type::Str);
    let names: Vec<_> = env.variables().collect();
    assert_eq!(
      names,
      vec![("x", Type::Number), ("y", Type::Str), ("x", Type::Str)]
    );
  }

  #[test]
  fn display_names() {
    assert_eq!(Type::InStream.to_string(), "input stream");
    assert_eq!(Type::Str.to_string(), "string");
  }
}
