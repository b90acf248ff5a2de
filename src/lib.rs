//! # Lox
//!
//! Command-line driver and interactive session for the Lox scripting
//! language. The language itself (lexer, parser, resolver, interpreter) lives
//! in the `lox-core` crate; this crate adds the host layer around it.
//!
//! ## Modules
//!
//! - `cli`: Argument parsing for the `lox` binary.
//! - `runner`: Running, tokenizing and parsing script files, with colored
//!   diagnostics and conventional exit codes.
//! - `repl`: The interactive Read-Eval-Print Loop, including file watching.
//! - `commands`: REPL commands such as `help`, `env` and `load`.
//! - `logging`: `tracing` subscriber setup driven by `LOX_LOG`.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod repl;
pub mod runner;

pub use lox_core;
pub use lox_core::{Interpreter, InterpreterConfig, RunError, Session, Value};
