use streamc::ast::{AstKind, AstNode};
use streamc::parser::{Engine, Ll1Parser, Parse, ParseError, SlrParser};
use streamc::{Ast, CompileError, parse_source};

const ENGINES: [Engine; 2] = [Engine::Ll1, Engine::Slr];

fn parse(engine: Engine, source: &str) -> Ast {
  parse_source(engine, "test", source).unwrap()
}

fn assert_both(source: &str, expected: &str) {
  for engine in ENGINES {
    assert_eq!(parse(engine, source).dump(), expected, "engine {engine}");
  }
}

#[test]
fn simple_assignment() {
  assert_both(
    "x <- 42;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'x'
    Type: NUMBER, Value: '42'
",
  );
}

#[test]
fn addition_is_left_associative() {
  assert_both(
    "r <- a + b + c;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'r'
    Type: PLUS, Value: '+'
      Type: PLUS, Value: '+'
        Type: IDENTIFIER, Value: 'a'
        Type: IDENTIFIER, Value: 'b'
      Type: IDENTIFIER, Value: 'c'
",
  );
}

#[test]
fn multiplication_is_left_associative() {
  assert_both(
    "r <- 2 * 3 * 4;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'r'
    Type: TIMES, Value: '*'
      Type: TIMES, Value: '*'
        Type: NUMBER, Value: '2'
        Type: NUMBER, Value: '3'
      Type: NUMBER, Value: '4'
",
  );
}

#[test]
fn multiplication_binds_tighter() {
  assert_both(
    "r <- a + b * c;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'r'
    Type: PLUS, Value: '+'
      Type: IDENTIFIER, Value: 'a'
      Type: TIMES, Value: '*'
        Type: IDENTIFIER, Value: 'b'
        Type: IDENTIFIER, Value: 'c'
",
  );
}

#[test]
fn parentheses_override_precedence() {
  assert_both(
    "result <- (a + b) * c;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'result'
    Type: TIMES, Value: '*'
      Type: PLUS, Value: '+'
        Type: IDENTIFIER, Value: 'a'
        Type: IDENTIFIER, Value: 'b'
      Type: IDENTIFIER, Value: 'c'
",
  );
}

#[test]
fn statements_stay_in_source_order() {
  assert_both(
    "x <- 1;\ny <- \"hi there\";\nstdout <- y * x;",
    "\
Type: ROOT, Value: '-'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'x'
    Type: NUMBER, Value: '1'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'y'
    Type: STRING, Value: '\"hi there\"'
  Type: ASSIGN, Value: '<-'
    Type: IDENTIFIER, Value: 'stdout'
    Type: TIMES, Value: '*'
      Type: IDENTIFIER, Value: 'y'
      Type: IDENTIFIER, Value: 'x'
",
  );
}

#[test]
fn empty_input_gives_an_empty_root() {
  for engine in ENGINES {
    for source in ["", "   \n\t"] {
      let ast = parse(engine, source);
      assert_eq!(ast.root().kind(), AstKind::Root);
      assert!(ast.root().children().is_empty());
    }
  }
}

#[test]
fn ast_carries_the_program_name() {
  let mut parser = SlrParser::with_name("demo").unwrap();
  parser.set_input("a <- 1;");
  assert_eq!(parser.parse().unwrap().name(), "demo");

  let mut parser = Ll1Parser::with_name("demo").unwrap();
  parser.set_input("a <- 1;");
  assert_eq!(parser.parse().unwrap().name(), "demo");
}

#[test]
fn invalid_programs_fail_on_both_engines() {
  let cases = [
    "x <- 1",
    "x 1;",
    "<- 1;",
    "x <- (1 + 2;",
    "x <- 1 + ;",
    "x <- 1 2;",
    "x <- ();",
    "x <- 1;)",
  ];
  for engine in ENGINES {
    for source in cases {
      match parse_source(engine, "bad", source) {
        Err(CompileError::Parse { .. }) => {}
        other => panic!("{engine} accepted {source:?}: {other:?}"),
      }
    }
  }
}

#[test]
fn premature_end_points_past_the_input() {
  for engine in ENGINES {
    let mut parser = engine.parser("t").unwrap();
    parser.set_input("x <- 1");
    let error = parser.parse().unwrap_err();
    assert_eq!(error.location(), Some((1, 7)), "engine {engine}");
  }
}

#[test]
fn lexical_errors_are_skipped_not_fatal() {
  for engine in ENGINES {
    let mut parser = engine.parser("t").unwrap();
    parser.set_input("x <- 1 $;");
    let ast = parser.parse().unwrap();
    assert_eq!(ast.statements().count(), 1);
    assert_eq!(parser.lex_errors().len(), 1);
    assert_eq!(parser.lex_errors()[0].character, '$');
  }
}

#[test]
fn parsers_are_reusable() {
  let mut parser = Ll1Parser::new().unwrap();
  parser.set_input("x <- ;");
  assert!(matches!(parser.parse(), Err(ParseError::NoProduction { .. })));
  parser.set_input("x <- 2;");
  let ast = parser.parse().unwrap();
  let statement: &AstNode = ast.statements().next().unwrap();
  assert_eq!(statement.kind(), AstKind::Assign);
}

#[test]
fn engines_agree_on_a_longer_program() {
  let source = "\
name <- stdin;
greeting <- \"hello \" + name;
count <- (1 + 2) * 3 + 4 * (5 + 6);
stdout <- greeting * count;
";
  assert_eq!(parse(Engine::Ll1, source), parse(Engine::Slr, source));
}
