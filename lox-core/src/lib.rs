//! # Lox Core
//!
//! Front-to-back pipeline for the Lox scripting language: lexing, parsing with
//! error recovery, static resolution of variable bindings, and a tree-walking
//! interpreter with lexically scoped closures.
//!
//! The crate performs no terminal I/O of its own apart from the `print`
//! statement, whose output sink is injectable.
//!
//! ## Example
//!
//! ```ignore
//! use lox_core::{OutputBuffer, Interpreter, Session};
//!
//! let output = OutputBuffer::new();
//! let mut session = Session::with_interpreter(Interpreter::new().with_output(output.clone()));
//! session.run("var a = 1; print a + 2;")?;
//! assert_eq!(output.contents(), "3\n");
//! ```

pub mod parser;
pub mod session;
pub mod stack;
pub mod types;

// Re-export commonly used types
pub use parser::{
    parse_statements, ControlFlow, Interpreter, LoxError, OutputBuffer, Program, Token,
    TokenKind,
};
pub use session::{RunError, Session};
pub use types::{Callable, InterpreterConfig, Value};
