// lox-core/src/parser/mod.rs

pub mod ast;
pub mod builtins;
pub mod environment;
pub mod error;
pub mod evaluator;
pub mod interpreter;
pub mod lexer;
pub mod resolver;
pub mod statement_parser;

#[cfg(test)]
mod evaluator_tests;

pub use ast::{Expr, ExprId, FunctionDecl, Program, Stmt};
pub use environment::{Environment, SharedEnvironment};
pub use error::{ErrorLocation, ErrorPhase, LoxError};
pub use interpreter::{ControlFlow, Interpreter, OutputBuffer};
pub use lexer::{LexOutput, Lexer, Literal, Token, TokenKind};
pub use resolver::{resolve, Resolution};
pub use statement_parser::{parse_expression, parse_statements, ParseOutput, StatementParser};
