//! Expression evaluation

use crate::parser::ast::{Expr, ExprId};
use crate::parser::environment::Environment;
use crate::parser::error::LoxError;
use crate::parser::interpreter::Interpreter;
use crate::parser::lexer::{Token, TokenKind};
use crate::stack::ensure_sufficient_stack;
use crate::types::Value;

impl Interpreter {
    /// Evaluate an expression against the current environment
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, LoxError> {
        ensure_sufficient_stack(|| match expr {
            Expr::Literal(value) => Ok(value.clone()),

            Expr::Grouping(inner) => self.evaluate(inner),

            Expr::Unary { operator, operand } => {
                let value = self.evaluate(operand)?;
                match operator.kind {
                    TokenKind::Bang => Ok(Value::Bool(!value.is_truthy())),
                    TokenKind::Minus => match value {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(LoxError::runtime(operator, "Operand must be a number.")),
                    },
                    _ => Err(LoxError::runtime(operator, "Unknown unary operator.")),
                }
            }

            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let right = self.evaluate(right)?;
                binary_operation(operator, left, right)
            }

            Expr::Logical {
                left,
                operator,
                right,
            } => {
                let left = self.evaluate(left)?;
                let decided = match operator.kind {
                    TokenKind::Or => left.is_truthy(),
                    _ => !left.is_truthy(),
                };
                if decided {
                    Ok(left)
                } else {
                    self.evaluate(right)
                }
            }

            Expr::Variable { id, name } => self.look_up_variable(*id, name),

            Expr::Assign { id, name, value } => {
                let value = self.evaluate(value)?;
                self.assign_variable(*id, name, value.clone())?;
                Ok(value)
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args = Vec::with_capacity(arguments.len());
                for argument in arguments {
                    args.push(self.evaluate(argument)?);
                }

                let Value::Callable(callable) = callee else {
                    return Err(LoxError::runtime(
                        paren,
                        "Can only call functions and classes.",
                    ));
                };

                if args.len() != callable.arity() {
                    return Err(LoxError::runtime(
                        paren,
                        format!(
                            "Expected {} arguments but got {}.",
                            callable.arity(),
                            args.len()
                        ),
                    ));
                }

                callable.call(self, args, paren)
            }
        })
    }

    /// Resolved references read the exact frame; the rest read globals
    fn look_up_variable(&self, id: ExprId, name: &Token) -> Result<Value, LoxError> {
        let value = match self.locals.get(&id) {
            Some(distance) => Environment::get_at(&self.environment, *distance, &name.lexeme),
            None => self.globals.borrow().get(&name.lexeme),
        };

        value.ok_or_else(|| {
            LoxError::runtime(name, format!("Undefined variable '{}'.", name.lexeme))
        })
    }

    fn assign_variable(&mut self, id: ExprId, name: &Token, value: Value) -> Result<(), LoxError> {
        let result = match self.locals.get(&id) {
            Some(distance) => {
                Environment::assign_at(&self.environment, *distance, &name.lexeme, value)
            }
            None => self.globals.borrow_mut().assign(&name.lexeme, value),
        };

        result.map_err(|message| LoxError::runtime(name, message))
    }
}

fn binary_operation(operator: &Token, left: Value, right: Value) -> Result<Value, LoxError> {
    match operator.kind {
        TokenKind::EqualEqual => Ok(Value::Bool(left == right)),
        TokenKind::BangEqual => Ok(Value::Bool(left != right)),

        TokenKind::Plus => match (left, right) {
            (Value::Number(a), Value::Number(b)) => Ok(Value::Number(a + b)),
            (Value::Str(a), Value::Str(b)) => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(&a);
                joined.push_str(&b);
                Ok(Value::string(&joined))
            }
            _ => Err(LoxError::runtime(
                operator,
                "Operands must be two numbers or two strings.",
            )),
        },

        _ => {
            let (Value::Number(a), Value::Number(b)) = (left, right) else {
                return Err(LoxError::runtime(operator, "Operands must be numbers."));
            };

            match operator.kind {
                TokenKind::Minus => Ok(Value::Number(a - b)),
                TokenKind::Star => Ok(Value::Number(a * b)),
                TokenKind::Slash => Ok(Value::Number(a / b)),
                TokenKind::Greater => Ok(Value::Bool(a > b)),
                TokenKind::GreaterEqual => Ok(Value::Bool(a >= b)),
                TokenKind::Less => Ok(Value::Bool(a < b)),
                TokenKind::LessEqual => Ok(Value::Bool(a <= b)),
                _ => Err(LoxError::runtime(operator, "Unknown binary operator.")),
            }
        }
    }
}
