//! Callable values: native builtins and user-defined functions

use crate::parser::ast::FunctionDecl;
use crate::parser::builtins::BuiltinFunction;
use crate::parser::environment::SharedEnvironment;
use crate::parser::error::LoxError;
use crate::parser::interpreter::Interpreter;
use crate::parser::lexer::Token;
use crate::types::Value;
use std::fmt;
use std::rc::Rc;

/// A user-defined function paired with the frame active where it was declared
pub struct LoxFunction {
    pub declaration: Rc<FunctionDecl>,
    pub closure: SharedEnvironment,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: SharedEnvironment) -> Self {
        LoxFunction {
            declaration,
            closure,
        }
    }

    pub fn arity(&self) -> usize {
        self.declaration.params.len()
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }
}

#[derive(Clone)]
pub enum Callable {
    Native(&'static BuiltinFunction),
    Function(Rc<LoxFunction>),
}

impl Callable {
    pub fn arity(&self) -> usize {
        match self {
            Callable::Native(builtin) => builtin.arity,
            Callable::Function(function) => function.arity(),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Callable::Native(builtin) => builtin.name,
            Callable::Function(function) => function.name(),
        }
    }

    /// Identity comparison
    pub fn same_as(&self, other: &Callable) -> bool {
        match (self, other) {
            (Callable::Native(a), Callable::Native(b)) => std::ptr::eq(*a, *b),
            (Callable::Function(a), Callable::Function(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Invoke with already-evaluated arguments; arity is checked by the caller.
    /// `paren` locates any error raised by the call.
    pub fn call(
        &self,
        interpreter: &mut Interpreter,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, LoxError> {
        match self {
            Callable::Native(builtin) => (builtin.handler)(interpreter, &arguments)
                .map_err(|e| LoxError::runtime(paren, e.to_string())),
            Callable::Function(function) => interpreter.call_function(function, arguments, paren),
        }
    }
}

impl fmt::Display for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Callable::Native(_) => write!(f, "<native fn>"),
            Callable::Function(function) => write!(f, "<fn {}>", function.name()),
        }
    }
}
