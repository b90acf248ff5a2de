//! Interpreter configuration
//!
//! Pure data carried from the host (command line, REPL) into the interpreter.

/// Default limit on nested user-function calls
pub const DEFAULT_MAX_CALL_DEPTH: usize = 4096;

/// Runtime limits for one interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterpreterConfig {
    /// Calls nested deeper than this raise a "Stack overflow." runtime error
    pub max_call_depth: usize,
}

impl InterpreterConfig {
    pub fn new() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    /// Set the call depth limit (at least 1)
    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth.max(1);
        self
    }

    /// Parse a `--max-call-depth=N` style value
    pub fn parse_call_depth(text: &str) -> Option<usize> {
        text.trim().parse::<usize>().ok().filter(|depth| *depth > 0)
    }
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self::new()
    }
}
