//! Interpreter for executing Lox programs
//!
//! Executes statements against a chain of environment frames. Expression
//! evaluation lives in `evaluator.rs` as a second `impl Interpreter` block.

use crate::parser::ast::{ExprId, Program, Stmt};
use crate::parser::builtins::register_globals;
use crate::parser::environment::{Environment, SharedEnvironment};
use crate::parser::error::LoxError;
use crate::parser::lexer::Token;
use crate::stack::ensure_sufficient_stack;
use crate::types::{Callable, InterpreterConfig, LoxFunction, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};
use std::rc::Rc;

/// Outcome of a statement that completed without error
#[derive(Debug)]
pub enum ControlFlow {
    Normal,
    /// A `return` is unwinding to the nearest enclosing call
    Return(Value),
}

/// In-memory output sink; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct OutputBuffer(Rc<RefCell<Vec<u8>>>);

impl OutputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }
}

impl Write for OutputBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Tree-walking interpreter for Lox statements
pub struct Interpreter {
    /// Outermost frame; holds builtins and top-level declarations
    pub(crate) globals: SharedEnvironment,
    /// Frame for the code currently executing
    pub(crate) environment: SharedEnvironment,
    /// Scope distances for resolved local references
    pub(crate) locals: HashMap<ExprId, usize>,
    /// Destination for `print`
    output: Box<dyn Write>,
    /// Number of user-function calls currently active
    call_depth: usize,
    config: InterpreterConfig,
}

impl Interpreter {
    /// Create a new interpreter printing to stdout
    pub fn new() -> Self {
        let globals = Environment::new().into_shared();
        register_globals(&globals);

        Interpreter {
            environment: Rc::clone(&globals),
            globals,
            locals: HashMap::new(),
            output: Box::new(io::stdout()),
            call_depth: 0,
            config: InterpreterConfig::default(),
        }
    }

    pub fn with_config(mut self, config: InterpreterConfig) -> Self {
        self.config = config;
        self
    }

    /// Redirect `print` output
    pub fn with_output(mut self, writer: impl Write + 'static) -> Self {
        self.output = Box::new(writer);
        self
    }

    pub fn config(&self) -> InterpreterConfig {
        self.config
    }

    /// The global frame
    pub fn globals(&self) -> SharedEnvironment {
        Rc::clone(&self.globals)
    }

    /// Bind `name` in the global frame
    pub fn define_global(&mut self, name: &str, value: Value) {
        self.globals.borrow_mut().define(name, value);
    }

    /// Global bindings, sorted by name
    pub fn global_bindings(&self) -> Vec<(String, Value)> {
        self.globals
            .borrow()
            .bindings()
            .into_iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    /// Merge a resolution table; entries from earlier programs are kept
    pub fn resolve(&mut self, locals: HashMap<ExprId, usize>) {
        self.locals.extend(locals);
    }

    /// Drop resolution entries for references that can no longer run
    pub fn forget(&mut self, ids: &[ExprId]) {
        for id in ids {
            self.locals.remove(id);
        }
    }

    /// Execute a resolved program, stopping at the first runtime error
    #[tracing::instrument(skip_all, fields(statements = program.len()))]
    pub fn interpret(&mut self, program: &Program) -> Result<(), LoxError> {
        let result = self.run_statements(&program.statements);
        let _ = self.output.flush();

        match result {
            // Only reachable when resolution errors were ignored
            Ok(ControlFlow::Return(_)) | Ok(ControlFlow::Normal) => Ok(()),
            Err(err) => {
                tracing::debug!(line = err.line, message = %err.message, "runtime error");
                // A failed run must not leave the REPL inside a block or call frame
                self.environment = Rc::clone(&self.globals);
                self.call_depth = 0;
                Err(err)
            }
        }
    }

    fn run_statements(&mut self, statements: &[Stmt]) -> Result<ControlFlow, LoxError> {
        for stmt in statements {
            if let ControlFlow::Return(value) = self.run_statement(stmt)? {
                return Ok(ControlFlow::Return(value));
            }
        }
        Ok(ControlFlow::Normal)
    }

    /// Execute a single statement
    pub fn run_statement(&mut self, stmt: &Stmt) -> Result<ControlFlow, LoxError> {
        ensure_sufficient_stack(|| match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Print { keyword, value } => {
                let value = self.evaluate(value)?;
                writeln!(self.output, "{}", value).map_err(|e| {
                    LoxError::runtime(keyword, format!("Failed to write output: {}", e))
                })?;
                Ok(ControlFlow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(init) => self.evaluate(init)?,
                    None => Value::Nil,
                };
                self.environment
                    .borrow_mut()
                    .define(name.lexeme.as_str(), value);
                Ok(ControlFlow::Normal)
            }

            Stmt::Block(statements) => {
                let frame = Environment::with_enclosing(Rc::clone(&self.environment)).into_shared();
                self.execute_block(statements, frame)
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    self.run_statement(then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.run_statement(else_branch)
                } else {
                    Ok(ControlFlow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                while self.evaluate(condition)?.is_truthy() {
                    if let ControlFlow::Return(value) = self.run_statement(body)? {
                        return Ok(ControlFlow::Return(value));
                    }
                }
                Ok(ControlFlow::Normal)
            }

            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment.borrow_mut().define(
                    declaration.name.lexeme.as_str(),
                    Value::Callable(Callable::Function(Rc::new(function))),
                );
                Ok(ControlFlow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Ok(ControlFlow::Return(value))
            }
        })
    }

    /// Run `statements` with `frame` as the current environment.
    /// The previous environment is restored however the block exits.
    pub fn execute_block(
        &mut self,
        statements: &[Stmt],
        frame: SharedEnvironment,
    ) -> Result<ControlFlow, LoxError> {
        let previous = std::mem::replace(&mut self.environment, frame);
        let result = self.run_statements(statements);
        self.environment = previous;
        result
    }

    /// Invoke a user-defined function with already-evaluated arguments
    #[tracing::instrument(level = "trace", skip_all, fields(function = function.name(), depth = self.call_depth))]
    pub fn call_function(
        &mut self,
        function: &LoxFunction,
        arguments: Vec<Value>,
        paren: &Token,
    ) -> Result<Value, LoxError> {
        if self.call_depth >= self.config.max_call_depth {
            return Err(LoxError::runtime(paren, "Stack overflow."));
        }

        let mut frame = Environment::with_enclosing(Rc::clone(&function.closure));
        for (param, argument) in function.declaration.params.iter().zip(arguments) {
            frame.define(param.lexeme.as_str(), argument);
        }

        self.call_depth += 1;
        let result = ensure_sufficient_stack(|| {
            self.execute_block(&function.declaration.body, frame.into_shared())
        });
        self.call_depth -= 1;

        match result? {
            ControlFlow::Return(value) => Ok(value),
            ControlFlow::Normal => Ok(Value::Nil),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::resolver::resolve;
    use crate::parser::statement_parser::parse_statements;
    use pretty_assertions::assert_eq;

    fn run_with(interpreter: &mut Interpreter, source: &str) -> Result<(), LoxError> {
        let program = parse_statements(source)
            .into_result()
            .expect("source should parse");
        let resolution = resolve(&program);
        assert!(resolution.errors.is_empty(), "{:?}", resolution.errors);
        interpreter.resolve(resolution.locals);
        interpreter.interpret(&program)
    }

    #[test]
    fn test_var_and_print() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(&mut interpreter, "var a = 1; print a; a = a + 1; print a;").unwrap();
        assert_eq!(output.contents(), "1\n2\n");
    }

    #[test]
    fn test_uninitialized_var_is_nil() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(&mut interpreter, "var a; print a;").unwrap();
        assert_eq!(output.contents(), "nil\n");
    }

    #[test]
    fn test_block_restores_environment() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(
            &mut interpreter,
            "var a = \"outer\"; { var a = \"inner\"; print a; } print a;",
        )
        .unwrap();
        assert_eq!(output.contents(), "inner\nouter\n");
        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));
    }

    #[test]
    fn test_environment_restored_after_runtime_error() {
        let mut interpreter = Interpreter::new().with_output(OutputBuffer::new());

        let err = run_with(&mut interpreter, "{ var a = 1; { print -\"x\"; } }").unwrap_err();
        assert_eq!(err.message, "Operand must be a number.");
        assert!(Rc::ptr_eq(&interpreter.environment, &interpreter.globals));
    }

    #[test]
    fn test_while_loop() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(&mut interpreter, "var i = 0; while (i < 3) { print i; i = i + 1; }").unwrap();
        assert_eq!(output.contents(), "0\n1\n2\n");
    }

    #[test]
    fn test_return_unwinds_loops() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(
            &mut interpreter,
            "fun first() { for (var i = 0; i < 10; i = i + 1) { if (i == 2) return i; } } print first();",
        )
        .unwrap();
        assert_eq!(output.contents(), "2\n");
    }

    #[test]
    fn test_call_depth_limit() {
        let mut interpreter = Interpreter::new()
            .with_output(OutputBuffer::new())
            .with_config(InterpreterConfig::new().with_max_call_depth(50));

        let err = run_with(&mut interpreter, "fun f(n) { return f(n + 1); }\nf(0);").unwrap_err();
        assert_eq!(err.to_string(), "Stack overflow.\n[line 1]");
    }

    #[test]
    fn test_state_persists_across_runs() {
        let output = OutputBuffer::new();
        let mut interpreter = Interpreter::new().with_output(output.clone());

        run_with(&mut interpreter, "var count = 1; fun bump() { count = count + 1; }").unwrap();
        run_with(&mut interpreter, "bump(); bump(); print count;").unwrap();
        assert_eq!(output.contents(), "3\n");
    }

    #[test]
    fn test_global_bindings() {
        let mut interpreter = Interpreter::new().with_output(OutputBuffer::new());
        interpreter.define_global("answer", Value::Number(42.0));

        let bindings: Vec<(String, String)> = interpreter
            .global_bindings()
            .into_iter()
            .map(|(name, value)| (name, value.to_string()))
            .collect();
        assert!(bindings.contains(&("answer".to_string(), "42".to_string())));
        assert!(bindings.contains(&("clock".to_string(), "<native fn>".to_string())));
    }
}
