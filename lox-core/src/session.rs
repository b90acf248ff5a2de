//! Full pipeline: lex and parse, resolve, then interpret
//!
//! A [`Session`] keeps one interpreter alive across many runs, so globals and
//! resolved locals accumulate the way a REPL needs them to.

use crate::parser::{parse_statements, resolve, Interpreter, LoxError};
use std::fmt;

/// Why a run did not complete
#[derive(Debug, Clone, PartialEq)]
pub enum RunError {
    /// Lexical, syntax or resolution errors; nothing was executed
    Compile(Vec<LoxError>),
    /// Execution stopped at this error
    Runtime(LoxError),
}

impl RunError {
    /// Conventional process exit status
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Compile(_) => 65,
            RunError::Runtime(_) => 70,
        }
    }

    /// Every diagnostic carried by this error, in report order
    pub fn errors(&self) -> Vec<&LoxError> {
        match self {
            RunError::Compile(errors) => errors.iter().collect(),
            RunError::Runtime(err) => vec![err],
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::Compile(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            RunError::Runtime(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RunError {}

pub struct Session {
    interpreter: Interpreter,
}

impl Session {
    pub fn new() -> Self {
        Self::with_interpreter(Interpreter::new())
    }

    pub fn with_interpreter(interpreter: Interpreter) -> Self {
        Session { interpreter }
    }

    pub fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    /// Run one source unit to completion
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let program = parse_statements(source)
            .into_result()
            .map_err(RunError::Compile)?;

        let resolution = resolve(&program);
        if resolution.has_errors() {
            return Err(RunError::Compile(resolution.errors));
        }

        self.interpreter.resolve(resolution.locals);
        let result = self.interpreter.interpret(&program);
        self.interpreter.forget(&resolution.top_level);
        result.map_err(RunError::Runtime)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
