use crate::parser::lexer::{Token, TokenKind};
use std::fmt;

/// Pipeline stage that produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPhase {
    Lexical,
    Syntax,
    Resolution,
    Runtime,
}

impl ErrorPhase {
    /// Compile-time phases are recovered from; runtime errors abort the run
    pub fn is_compile_time(&self) -> bool {
        !matches!(self, ErrorPhase::Runtime)
    }
}

/// Where on the reported line the error points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorLocation {
    /// Line only (lexical errors)
    None,
    /// At the end of input
    End,
    /// At a specific lexeme
    Lexeme(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoxError {
    pub phase: ErrorPhase,
    pub message: String,
    pub line: usize,
    pub location: ErrorLocation,
}

impl LoxError {
    pub fn new(
        phase: ErrorPhase,
        message: impl Into<String>,
        line: usize,
        location: ErrorLocation,
    ) -> Self {
        Self {
            phase,
            message: message.into(),
            line,
            location,
        }
    }

    pub fn lexical(line: usize, message: impl Into<String>) -> Self {
        Self::new(ErrorPhase::Lexical, message, line, ErrorLocation::None)
    }

    /// Error pointing at a token; end-of-input tokens render as "at end"
    pub fn at_token(phase: ErrorPhase, token: &Token, message: impl Into<String>) -> Self {
        let location = if token.kind == TokenKind::Eof {
            ErrorLocation::End
        } else {
            ErrorLocation::Lexeme(token.lexeme.clone())
        };
        Self::new(phase, message, token.line, location)
    }

    pub fn runtime(token: &Token, message: impl Into<String>) -> Self {
        Self::at_token(ErrorPhase::Runtime, token, message)
    }
}

impl fmt::Display for LoxError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.phase == ErrorPhase::Runtime {
            return write!(f, "{}\n[line {}]", self.message, self.line);
        }
        match &self.location {
            ErrorLocation::None => write!(f, "[line {}] Error: {}", self.line, self.message),
            ErrorLocation::End => write!(f, "[line {}] Error at end: {}", self.line, self.message),
            ErrorLocation::Lexeme(lexeme) => write!(
                f,
                "[line {}] Error at '{}': {}",
                self.line, lexeme, self.message
            ),
        }
    }
}

impl std::error::Error for LoxError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(kind: TokenKind, lexeme: &str, line: usize) -> Token {
        Token::new(kind, lexeme, None, line)
    }

    #[test]
    fn test_lexical_display() {
        let err = LoxError::lexical(3, "Unterminated string.");
        assert_eq!(err.to_string(), "[line 3] Error: Unterminated string.");
    }

    #[test]
    fn test_syntax_error_at_lexeme() {
        let err = LoxError::at_token(
            ErrorPhase::Syntax,
            &token(TokenKind::Equal, "=", 1),
            "Invalid assignment target.",
        );
        assert_eq!(
            err.to_string(),
            "[line 1] Error at '=': Invalid assignment target."
        );
    }

    #[test]
    fn test_syntax_error_at_end() {
        let err = LoxError::at_token(
            ErrorPhase::Syntax,
            &token(TokenKind::Eof, "", 7),
            "Expect ';' after value.",
        );
        assert_eq!(err.location, ErrorLocation::End);
        assert_eq!(err.to_string(), "[line 7] Error at end: Expect ';' after value.");
    }

    #[test]
    fn test_runtime_display() {
        let err = LoxError::runtime(&token(TokenKind::Plus, "+", 2), "Operands must be numbers.");
        assert!(!err.phase.is_compile_time());
        assert_eq!(err.to_string(), "Operands must be numbers.\n[line 2]");
    }
}
