use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use snafu::ResultExt;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use streamc::error::{ReadInputSnafu, WriteOutputSnafu};
use streamc::tokenizer::Lexer;
use streamc::{CompileResult, Engine, check_source, parse_source};

/// Front end for the stream assignment language.
///
/// Lexes, parses and type-checks a program, printing the requested stage's
/// output.
#[derive(Parser)]
#[command(name = "streamc", version, about, long_about = None)]
struct Cli {
  /// Source file to compile
  input: PathBuf,

  /// Parsing engine
  #[arg(short, long, default_value_t = Engine::Slr)]
  parser: Engine,

  /// What to print
  #[arg(short, long, value_enum, default_value_t = Emit::Types)]
  emit: Emit,

  /// Write output to FILE instead of stdout
  #[arg(short, long, value_name = "FILE")]
  output: Option<PathBuf>,

  /// Log table construction and diagnostics at debug level
  #[arg(short, long)]
  verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
  Tokens,
  ParseTree,
  Ast,
  Types,
  Table,
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let source = match fs::read_to_string(&cli.input).context(ReadInputSnafu { path: &cli.input }) {
    Ok(source) => source,
    Err(err) => {
      eprintln!("{err}");
      return ExitCode::FAILURE;
    }
  };

  match run(&cli, &source) {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      eprintln!("{}", err.render(&source));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "streamc=debug" } else { "streamc=warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .init();
}

fn run(cli: &Cli, source: &str) -> CompileResult<()> {
  if cli.emit != Emit::Table && source.trim().is_empty() {
    warn!(path = %cli.input.display(), "input file is empty, nothing to compile");
    return Ok(());
  }

  let name = cli
    .input
    .file_stem()
    .map_or_else(|| "program".to_string(), |stem| stem.to_string_lossy().into_owned());

  let out = match cli.emit {
    Emit::Tokens => {
      let mut out = String::new();
      for token in Lexer::new()?.tokenize(source) {
        let _ = writeln!(
          out,
          "{}:{} {} '{}'",
          token.line,
          token.column,
          token.kind.class_name(),
          token.text
        );
      }
      out
    }
    Emit::ParseTree => {
      let mut parser = cli.parser.parser(&name)?;
      parser.set_input(source);
      parser.parse_tree()?.dump()
    }
    Emit::Ast => parse_source(cli.parser, &name, source)?.dump(),
    Emit::Types => {
      let env = check_source(cli.parser, &name, source)?;
      let mut out = String::new();
      for (variable, ty) in env.variables() {
        let _ = writeln!(out, "{variable}: {ty}");
      }
      out
    }
    Emit::Table => cli.parser.table()?,
  };
  write_output(&out, cli.output.as_deref())
}

fn write_output(text: &str, path: Option<&Path>) -> CompileResult<()> {
  match path {
    Some(path) => fs::write(path, text).context(WriteOutputSnafu { path }),
    None => {
      print!("{text}");
      Ok(())
    }
  }
}
