//! Static scope resolution
//!
//! Walks a parsed program once, before execution, and records for every local
//! variable reference how many frames up its binding lives. References that
//! match no enclosing local scope are left out of the table and are looked up
//! in the global frame at run time.

use crate::parser::ast::{Expr, ExprId, FunctionDecl, Program, Stmt};
use crate::parser::error::{ErrorPhase, LoxError};
use crate::parser::lexer::Token;
use crate::stack::ensure_sufficient_stack;
use std::collections::HashMap;

/// Side table produced by resolution
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Scope distance for every resolved local reference
    pub locals: HashMap<ExprId, usize>,
    /// Resolved references outside every function body; they are dead once
    /// the program has run
    pub top_level: Vec<ExprId>,
    pub errors: Vec<LoxError>,
}

impl Resolution {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindingState {
    /// Slot reserved, initializer not yet resolved
    Declared,
    Defined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FunctionKind {
    None,
    Function,
}

/// Lexical state threaded through every resolution step
struct ResolveContext {
    scopes: Vec<HashMap<String, BindingState>>,
    current_function: FunctionKind,
}

impl ResolveContext {
    fn new() -> Self {
        ResolveContext {
            scopes: Vec::new(),
            current_function: FunctionKind::None,
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }
}

/// Resolve every local reference in `program`
pub fn resolve(program: &Program) -> Resolution {
    let mut resolver = Resolver::default();
    let mut ctx = ResolveContext::new();

    for stmt in &program.statements {
        resolver.resolve_statement(&mut ctx, stmt);
    }

    tracing::debug!(
        locals = resolver.resolution.locals.len(),
        errors = resolver.resolution.errors.len(),
        "resolution complete"
    );
    resolver.resolution
}

#[derive(Default)]
struct Resolver {
    resolution: Resolution,
}

impl Resolver {
    fn error(&mut self, token: &Token, message: &str) {
        self.resolution
            .errors
            .push(LoxError::at_token(ErrorPhase::Resolution, token, message));
    }

    /// Reserve `name` in the innermost scope; globals are not tracked
    fn declare(&mut self, ctx: &mut ResolveContext, name: &Token) {
        let Some(scope) = ctx.scopes.last_mut() else {
            return;
        };

        if scope.contains_key(&name.lexeme) {
            self.error(name, "Already a variable with this name in this scope.");
            return;
        }
        scope.insert(name.lexeme.clone(), BindingState::Declared);
    }

    fn define(&mut self, ctx: &mut ResolveContext, name: &Token) {
        if let Some(scope) = ctx.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), BindingState::Defined);
        }
    }

    fn resolve_local(&mut self, ctx: &ResolveContext, id: ExprId, name: &Token) {
        if let Some(distance) = ctx
            .scopes
            .iter()
            .rev()
            .position(|scope| scope.contains_key(&name.lexeme))
        {
            self.resolution.locals.insert(id, distance);
            if ctx.current_function == FunctionKind::None {
                self.resolution.top_level.push(id);
            }
        }
    }

    fn resolve_block(&mut self, ctx: &mut ResolveContext, statements: &[Stmt]) {
        for stmt in statements {
            self.resolve_statement(ctx, stmt);
        }
    }

    fn resolve_function(
        &mut self,
        ctx: &mut ResolveContext,
        declaration: &FunctionDecl,
        kind: FunctionKind,
    ) {
        let enclosing = std::mem::replace(&mut ctx.current_function, kind);
        ctx.begin_scope();

        for param in &declaration.params {
            self.declare(ctx, param);
            self.define(ctx, param);
        }
        self.resolve_block(ctx, &declaration.body);

        ctx.end_scope();
        ctx.current_function = enclosing;
    }

    fn resolve_statement(&mut self, ctx: &mut ResolveContext, stmt: &Stmt) {
        ensure_sufficient_stack(|| match stmt {
            Stmt::Block(statements) => {
                ctx.begin_scope();
                self.resolve_block(ctx, statements);
                ctx.end_scope();
            }
            Stmt::Var { name, initializer } => {
                self.declare(ctx, name);
                if let Some(init) = initializer {
                    self.resolve_expression(ctx, init);
                }
                self.define(ctx, name);
            }
            Stmt::Function(declaration) => {
                self.declare(ctx, &declaration.name);
                self.define(ctx, &declaration.name);
                self.resolve_function(ctx, declaration, FunctionKind::Function);
            }
            Stmt::Expression(expr) => self.resolve_expression(ctx, expr),
            Stmt::Print { value, .. } => self.resolve_expression(ctx, value),
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expression(ctx, condition);
                self.resolve_statement(ctx, then_branch);
                if let Some(else_branch) = else_branch {
                    self.resolve_statement(ctx, else_branch);
                }
            }
            Stmt::While { condition, body } => {
                self.resolve_expression(ctx, condition);
                self.resolve_statement(ctx, body);
            }
            Stmt::Return { keyword, value } => {
                if ctx.current_function == FunctionKind::None {
                    self.error(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    self.resolve_expression(ctx, value);
                }
            }
        })
    }

    fn resolve_expression(&mut self, ctx: &mut ResolveContext, expr: &Expr) {
        ensure_sufficient_stack(|| match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(inner) => self.resolve_expression(ctx, inner),
            Expr::Unary { operand, .. } => self.resolve_expression(ctx, operand),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                self.resolve_expression(ctx, left);
                self.resolve_expression(ctx, right);
            }
            Expr::Variable { id, name } => {
                let in_own_initializer = ctx
                    .scopes
                    .last()
                    .and_then(|scope| scope.get(&name.lexeme))
                    == Some(&BindingState::Declared);
                if in_own_initializer {
                    self.error(name, "Can't read local variable in its own initializer.");
                }
                self.resolve_local(ctx, *id, name);
            }
            Expr::Assign { id, name, value } => {
                self.resolve_expression(ctx, value);
                self.resolve_local(ctx, *id, name);
            }
            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expression(ctx, callee);
                for argument in arguments {
                    self.resolve_expression(ctx, argument);
                }
            }
        })
    }
}
