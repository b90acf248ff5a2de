//! Batch entry points: run, tokenize or parse a script file

use anyhow::{Context, Result};
use colored::*;
use lox_core::parser::{parse_statements, Lexer};
use lox_core::{Interpreter, InterpreterConfig, LoxError, RunError, Session};
use std::path::Path;

/// Command-line usage error
pub const EXIT_USAGE: i32 = 64;
/// Lexical, syntax or resolution errors
pub const EXIT_COMPILE_ERROR: i32 = 65;
/// Runtime error
pub const EXIT_RUNTIME_ERROR: i32 = 70;
/// Script could not be read
pub const EXIT_IO_ERROR: i32 = 74;

/// Read a script file to a string
pub fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read '{}'", path.display()))
}

/// Print one diagnostic to stderr
pub fn report_diagnostic(err: &LoxError) {
    eprintln!("{}", err.to_string().red());
}

/// Print every diagnostic carried by a failed run to stderr
pub fn report_run_error(err: &RunError) {
    for diagnostic in err.errors() {
        report_diagnostic(diagnostic);
    }
}

fn report_io_error(err: &anyhow::Error) -> i32 {
    eprintln!("{} {:#}", "Error:".bright_red().bold(), err);
    EXIT_IO_ERROR
}

/// Run `source` in `session`, reporting failures; returns the exit status
pub fn run_source(session: &mut Session, source: &str) -> i32 {
    match session.run(source) {
        Ok(()) => 0,
        Err(err) => {
            report_run_error(&err);
            err.exit_code()
        }
    }
}

/// `lox run <file>`
pub fn run_file(path: &Path, config: InterpreterConfig) -> i32 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return report_io_error(&err),
    };

    tracing::info!(path = %path.display(), "running script");
    let mut session = Session::with_interpreter(Interpreter::new().with_config(config));
    run_source(&mut session, &source)
}

/// `lox tokens <file>`: one token per line
pub fn print_tokens(path: &Path) -> i32 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return report_io_error(&err),
    };

    let output = Lexer::new(&source).tokenize();
    for token in &output.tokens {
        println!("{}", token);
    }
    for err in &output.errors {
        report_diagnostic(err);
    }

    if output.errors.is_empty() {
        0
    } else {
        EXIT_COMPILE_ERROR
    }
}

/// `lox parse <file>`: one syntax tree per top-level statement
pub fn print_tree(path: &Path) -> i32 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(err) => return report_io_error(&err),
    };

    let output = parse_statements(&source);
    for stmt in &output.program.statements {
        println!("{}", stmt);
    }
    for err in &output.errors {
        report_diagnostic(err);
    }

    if output.errors.is_empty() {
        0
    } else {
        EXIT_COMPILE_ERROR
    }
}
