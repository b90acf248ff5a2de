use crate::parser::lexer::Token;
use crate::stack::ensure_sufficient_stack;
use crate::types::Value;
use std::fmt;
use std::mem;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_EXPR_ID: AtomicUsize = AtomicUsize::new(0);

/// Identity of a variable-referencing expression node.
///
/// Ids are unique for the lifetime of the process, so resolution maps built
/// for separately parsed programs (e.g. successive REPL lines) never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ExprId(usize);

impl ExprId {
    pub fn fresh() -> Self {
        ExprId(NEXT_EXPR_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Expression nodes
#[derive(Debug, Clone)]
pub enum Expr {
    /// nil, true, 1.5, "text"
    Literal(Value),

    /// ( expr )
    Grouping(Box<Expr>),

    /// !x, -x
    Unary { operator: Token, operand: Box<Expr> },

    /// Arithmetic, comparison and equality operators
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Short-circuiting `and` / `or`
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// Variable read
    Variable { id: ExprId, name: Token },

    /// name = value
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// callee(arguments...), `paren` is the closing parenthesis
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    pub fn unary(operator: Token, operand: Expr) -> Self {
        Expr::Unary {
            operator,
            operand: Box::new(operand),
        }
    }

    pub fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn logical(left: Expr, operator: Token, right: Expr) -> Self {
        Expr::Logical {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn variable(name: Token) -> Self {
        Expr::Variable {
            id: ExprId::fresh(),
            name,
        }
    }

    pub fn assign(name: Token, value: Expr) -> Self {
        Expr::Assign {
            id: ExprId::fresh(),
            name,
            value: Box::new(value),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Expr::Literal(value) => write!(f, "{}", value),
            Expr::Grouping(inner) => write!(f, "(group {})", inner),
            Expr::Unary { operator, operand } => write!(f, "({} {})", operator.lexeme, operand),
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => write!(f, "({} {} {})", operator.lexeme, left, right),
            Expr::Variable { name, .. } => write!(f, "{}", name.lexeme),
            Expr::Assign { name, value, .. } => write!(f, "(= {} {})", name.lexeme, value),
            Expr::Call {
                callee, arguments, ..
            } => {
                write!(f, "(call {}", callee)?;
                for arg in arguments {
                    write!(f, " {}", arg)?;
                }
                write!(f, ")")
            }
        })
    }
}

impl Expr {
    /// Move this node's sub-expressions into `out`, leaving leaves behind
    fn detach_children(&mut self, out: &mut Vec<Expr>) {
        fn take(slot: &mut Expr) -> Expr {
            mem::replace(slot, Expr::Literal(Value::Nil))
        }

        match self {
            Expr::Literal(_) | Expr::Variable { .. } => {}
            Expr::Grouping(inner) => out.push(take(inner)),
            Expr::Unary { operand, .. } => out.push(take(operand)),
            Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
                out.push(take(left));
                out.push(take(right));
            }
            Expr::Assign { value, .. } => out.push(take(value)),
            Expr::Call {
                callee, arguments, ..
            } => {
                out.push(take(callee));
                out.append(arguments);
            }
        }
    }
}

// Freed through a heap worklist; parsed trees can nest deeper than the native
// stack allows.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}

/// A named function declaration, shared by every function value created from it
#[derive(Debug)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Statement nodes
#[derive(Debug, Clone)]
pub enum Stmt {
    Expression(Expr),

    Print { keyword: Token, value: Expr },

    Var {
        name: Token,
        initializer: Option<Expr>,
    },

    Block(Vec<Stmt>),

    /// A missing `else` is `None`
    If {
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },

    While { condition: Expr, body: Box<Stmt> },

    Function(Rc<FunctionDecl>),

    Return { keyword: Token, value: Option<Expr> },
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Stmt::Expression(expr) => write!(f, "(; {})", expr),
            Stmt::Print { value, .. } => write!(f, "(print {})", value),
            Stmt::Var {
                name,
                initializer: Some(init),
            } => write!(f, "(var {} {})", name.lexeme, init),
            Stmt::Var { name, .. } => write!(f, "(var {})", name.lexeme),
            Stmt::Block(statements) => {
                write!(f, "(block")?;
                for stmt in statements {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => {
                    write!(f, "(if {} {} {})", condition, then_branch, else_branch)
                }
                None => write!(f, "(if {} {})", condition, then_branch),
            },
            Stmt::While { condition, body } => write!(f, "(while {} {})", condition, body),
            Stmt::Function(decl) => {
                let params: Vec<&str> = decl.params.iter().map(|p| p.lexeme.as_str()).collect();
                write!(f, "(fun {} ({})", decl.name.lexeme, params.join(" "))?;
                for stmt in &decl.body {
                    write!(f, " {}", stmt)?;
                }
                write!(f, ")")
            }
            Stmt::Return { value: Some(value), .. } => write!(f, "(return {})", value),
            Stmt::Return { .. } => write!(f, "(return)"),
        })
    }
}

impl Stmt {
    /// Move nested statements into `out`; expressions free themselves
    fn detach_children(&mut self, out: &mut Vec<Stmt>) {
        fn take(slot: &mut Stmt) -> Stmt {
            mem::replace(slot, Stmt::Block(Vec::new()))
        }

        match self {
            Stmt::Block(statements) => out.append(statements),
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => {
                out.push(take(then_branch));
                if let Some(else_branch) = else_branch.take() {
                    out.push(*else_branch);
                }
            }
            Stmt::While { body, .. } => out.push(take(body)),
            // Only the last owner of a declaration releases its body
            Stmt::Function(decl) => {
                if let Some(decl) = Rc::get_mut(decl) {
                    out.append(&mut decl.body);
                }
            }
            Stmt::Expression(_) | Stmt::Print { .. } | Stmt::Var { .. } | Stmt::Return { .. } => {}
        }
    }
}

impl Drop for Stmt {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut stmt) = pending.pop() {
            stmt.detach_children(&mut pending);
        }
    }
}

/// A parsed program (sequence of statements)
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program {
            statements: Vec::new(),
        }
    }

    pub fn push(&mut self, stmt: Stmt) {
        self.statements.push(stmt);
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::TokenKind;

    fn token(kind: TokenKind, lexeme: &str) -> Token {
        Token::new(kind, lexeme, None, 1)
    }

    #[test]
    fn test_expr_display() {
        let expr = Expr::binary(
            Expr::unary(token(TokenKind::Minus, "-"), Expr::Literal(Value::Number(123.0))),
            token(TokenKind::Star, "*"),
            Expr::Grouping(Box::new(Expr::Literal(Value::Number(45.67)))),
        );
        assert_eq!(expr.to_string(), "(* (- 123) (group 45.67))");
    }

    #[test]
    fn test_call_and_assign_display() {
        let call = Expr::Call {
            callee: Box::new(Expr::variable(token(TokenKind::Identifier, "f"))),
            paren: token(TokenKind::RightParen, ")"),
            arguments: vec![Expr::Literal(Value::Number(1.0)), Expr::Literal(Value::Nil)],
        };
        assert_eq!(call.to_string(), "(call f 1 nil)");

        let assign = Expr::assign(token(TokenKind::Identifier, "a"), call);
        assert_eq!(assign.to_string(), "(= a (call f 1 nil))");
    }

    #[test]
    fn test_stmt_display() {
        let decl = FunctionDecl {
            name: token(TokenKind::Identifier, "id"),
            params: vec![token(TokenKind::Identifier, "x")],
            body: vec![Stmt::Return {
                keyword: token(TokenKind::Return, "return"),
                value: Some(Expr::variable(token(TokenKind::Identifier, "x"))),
            }],
        };
        assert_eq!(
            Stmt::Function(Rc::new(decl)).to_string(),
            "(fun id (x) (return x))"
        );

        let stmt = Stmt::If {
            condition: Expr::Literal(Value::Bool(true)),
            then_branch: Box::new(Stmt::Block(vec![Stmt::Var {
                name: token(TokenKind::Identifier, "a"),
                initializer: None,
            }])),
            else_branch: None,
        };
        assert_eq!(stmt.to_string(), "(if true (block (var a)))");
    }

    #[test]
    fn test_expr_ids_are_unique() {
        let a = Expr::variable(token(TokenKind::Identifier, "a"));
        let b = Expr::variable(token(TokenKind::Identifier, "a"));
        match (a, b) {
            (Expr::Variable { id: first, .. }, Expr::Variable { id: second, .. }) => {
                assert_ne!(first, second)
            }
            _ => panic!("Expected variables"),
        }
    }
}
