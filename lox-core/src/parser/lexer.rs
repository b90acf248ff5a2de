use crate::parser::error::LoxError;
use std::fmt;

/// Lexeme categories of the Lox language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Single-character punctuation
    LeftParen,
    RightParen,
    LeftBrace,
    RightBrace,
    Comma,
    Dot,
    Minus,
    Plus,
    Semicolon,
    Slash,
    Star,

    // One or two character operators
    Bang,
    BangEqual,
    Equal,
    EqualEqual,
    Greater,
    GreaterEqual,
    Less,
    LessEqual,

    // Literals
    Identifier,
    String,
    Number,

    // Reserved words
    And,
    Class,
    Else,
    False,
    For,
    Fun,
    If,
    Nil,
    Or,
    Print,
    Return,
    Super,
    This,
    True,
    Var,
    While,

    // End of input
    Eof,
}

impl TokenKind {
    /// Look up a reserved word
    pub fn keyword(text: &str) -> Option<TokenKind> {
        use TokenKind::*;
        match text {
            "and" => Some(And),
            "class" => Some(Class),
            "else" => Some(Else),
            "false" => Some(False),
            "for" => Some(For),
            "fun" => Some(Fun),
            "if" => Some(If),
            "nil" => Some(Nil),
            "or" => Some(Or),
            "print" => Some(Print),
            "return" => Some(Return),
            "super" => Some(Super),
            "this" => Some(This),
            "true" => Some(True),
            "var" => Some(Var),
            "while" => Some(While),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let text = match self {
            LeftParen => "LEFT_PAREN",
            RightParen => "RIGHT_PAREN",
            LeftBrace => "LEFT_BRACE",
            RightBrace => "RIGHT_BRACE",
            Comma => "COMMA",
            Dot => "DOT",
            Minus => "MINUS",
            Plus => "PLUS",
            Semicolon => "SEMICOLON",
            Slash => "SLASH",
            Star => "STAR",
            Bang => "BANG",
            BangEqual => "BANG_EQUAL",
            Equal => "EQUAL",
            EqualEqual => "EQUAL_EQUAL",
            Greater => "GREATER",
            GreaterEqual => "GREATER_EQUAL",
            Less => "LESS",
            LessEqual => "LESS_EQUAL",
            Identifier => "IDENTIFIER",
            String => "STRING",
            Number => "NUMBER",
            And => "AND",
            Class => "CLASS",
            Else => "ELSE",
            False => "FALSE",
            For => "FOR",
            Fun => "FUN",
            If => "IF",
            Nil => "NIL",
            Or => "OR",
            Print => "PRINT",
            Return => "RETURN",
            Super => "SUPER",
            This => "THIS",
            True => "TRUE",
            Var => "VAR",
            While => "WHILE",
            Eof => "EOF",
        };
        write!(f, "{}", text)
    }
}

/// Literal payload carried by number and string tokens
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Number(f64),
    Str(String),
}

/// A classified lexeme with its source line
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub literal: Option<Literal>,
    pub line: usize,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        lexeme: impl Into<String>,
        literal: Option<Literal>,
        line: usize,
    ) -> Self {
        Token {
            kind,
            lexeme: lexeme.into(),
            literal,
            line,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.literal {
            Some(Literal::Number(n)) => write!(f, "{} {} {:?}", self.kind, self.lexeme, n),
            Some(Literal::Str(s)) => write!(f, "{} {} {}", self.kind, self.lexeme, s),
            None => write!(f, "{} {} null", self.kind, self.lexeme),
        }
    }
}

/// Tokens produced by a full pass, plus every lexical error met on the way
#[derive(Debug, Clone)]
pub struct LexOutput {
    pub tokens: Vec<Token>,
    pub errors: Vec<LoxError>,
}

/// Tokenizes source text into tokens
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    line: usize,
}

impl Lexer {
    /// Create a new lexer for the given input
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            current_char,
            line: 1,
        }
    }

    /// Advance to the next character, counting lines as newlines are passed
    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
        }
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    /// Peek at the character after the current one
    fn peek(&self) -> Option<char> {
        self.input.get(self.position + 1).copied()
    }

    /// Consume the current character if it is `expected`
    fn match_char(&mut self, expected: char) -> bool {
        if self.current_char == Some(expected) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Skip whitespace and `//` line comments
    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.current_char {
            if matches!(ch, ' ' | '\r' | '\t' | '\n') {
                self.advance();
            } else if ch == '/' && self.peek() == Some('/') {
                while let Some(ch) = self.current_char {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else {
                break;
            }
        }
    }

    fn lexeme(&self, start: usize) -> String {
        self.input[start..self.position].iter().collect()
    }

    fn make_token(&self, kind: TokenKind, start: usize) -> Token {
        Token::new(kind, self.lexeme(start), None, self.line)
    }

    /// Read a string literal; the opening quote is already consumed
    fn read_string(&mut self, start: usize) -> Result<Token, LoxError> {
        while let Some(ch) = self.current_char {
            if ch == '"' {
                break;
            }
            self.advance();
        }

        if self.current_char.is_none() {
            return Err(LoxError::lexical(self.line, "Unterminated string."));
        }

        // closing quote
        self.advance();

        let value: String = self.input[start + 1..self.position - 1].iter().collect();
        Ok(Token::new(
            TokenKind::String,
            self.lexeme(start),
            Some(Literal::Str(value)),
            self.line,
        ))
    }

    /// Read a number; a '.' is only part of it when a digit follows
    fn read_number(&mut self, start: usize) -> Result<Token, LoxError> {
        while matches!(self.current_char, Some(ch) if ch.is_ascii_digit()) {
            self.advance();
        }

        if self.current_char == Some('.') && matches!(self.peek(), Some(ch) if ch.is_ascii_digit())
        {
            self.advance();
            while matches!(self.current_char, Some(ch) if ch.is_ascii_digit()) {
                self.advance();
            }
        }

        let text = self.lexeme(start);
        let value = text
            .parse::<f64>()
            .map_err(|_| LoxError::lexical(self.line, format!("Invalid number '{}'.", text)))?;
        Ok(Token::new(
            TokenKind::Number,
            text,
            Some(Literal::Number(value)),
            self.line,
        ))
    }

    /// Read an identifier or reserved word
    fn read_identifier(&mut self, start: usize) -> Token {
        while matches!(self.current_char, Some(ch) if is_identifier_char(ch)) {
            self.advance();
        }

        let text = self.lexeme(start);
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        Token::new(kind, text, None, self.line)
    }

    /// Get the next token, or the lexical error for the characters just consumed
    pub fn next_token(&mut self) -> Result<Token, LoxError> {
        use TokenKind::*;

        self.skip_whitespace();

        let start = self.position;
        let ch = match self.current_char {
            None => return Ok(Token::new(Eof, "", None, self.line)),
            Some(ch) => ch,
        };
        self.advance();

        let kind = match ch {
            '(' => LeftParen,
            ')' => RightParen,
            '{' => LeftBrace,
            '}' => RightBrace,
            ',' => Comma,
            '.' => Dot,
            '-' => Minus,
            '+' => Plus,
            ';' => Semicolon,
            '*' => Star,
            '/' => Slash,
            '!' => {
                if self.match_char('=') {
                    BangEqual
                } else {
                    Bang
                }
            }
            '=' => {
                if self.match_char('=') {
                    EqualEqual
                } else {
                    Equal
                }
            }
            '<' => {
                if self.match_char('=') {
                    LessEqual
                } else {
                    Less
                }
            }
            '>' => {
                if self.match_char('=') {
                    GreaterEqual
                } else {
                    Greater
                }
            }
            '"' => return self.read_string(start),
            c if c.is_ascii_digit() => return self.read_number(start),
            c if is_identifier_start(c) => return Ok(self.read_identifier(start)),
            other => {
                return Err(LoxError::lexical(
                    self.line,
                    format!("Unexpected character '{}'.", other),
                ))
            }
        };

        Ok(self.make_token(kind, start))
    }

    /// Tokenize the entire input, continuing past lexical errors
    pub fn tokenize(&mut self) -> LexOutput {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            match self.next_token() {
                Ok(token) => {
                    let is_eof = token.kind == TokenKind::Eof;
                    tokens.push(token);
                    if is_eof {
                        break;
                    }
                }
                Err(err) => errors.push(err),
            }
        }

        tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexing complete");
        LexOutput { tokens, errors }
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_'
}

fn is_identifier_char(ch: char) -> bool {
    is_identifier_start(ch) || ch.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        Lexer::new(input)
            .tokenize()
            .tokens
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("(){},.-+;*/"),
            vec![
                LeftParen, RightParen, LeftBrace, RightBrace, Comma, Dot, Minus, Plus,
                Semicolon, Star, Slash, Eof,
            ]
        );
    }

    #[test]
    fn test_two_character_operators() {
        use TokenKind::*;
        assert_eq!(
            kinds("! != = == < <= > >= ==="),
            vec![
                Bang, BangEqual, Equal, EqualEqual, Less, LessEqual, Greater, GreaterEqual,
                EqualEqual, Equal, Eof,
            ]
        );
    }

    #[test]
    fn test_numbers() {
        let output = Lexer::new("12 3.25").tokenize();
        assert!(output.errors.is_empty());
        assert_eq!(output.tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(output.tokens[1].literal, Some(Literal::Number(3.25)));
        assert_eq!(output.tokens[1].lexeme, "3.25");
    }

    #[test]
    fn test_trailing_dot_is_separate_token() {
        let output = Lexer::new("1234.").tokenize();
        let tokens = output.tokens;
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].kind, TokenKind::Number);
        assert_eq!(tokens[0].lexeme, "1234");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].kind, TokenKind::Eof);
    }

    #[test]
    fn test_keywords_and_identifiers() {
        use TokenKind::*;
        assert_eq!(
            kinds("var fun_ly orchid or nil _x1 class"),
            vec![Var, Identifier, Identifier, Or, Nil, Identifier, Class, Eof]
        );
    }

    #[test]
    fn test_string_literal() {
        let tokens = Lexer::new("\"hello world\"").tokenize().tokens;
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].lexeme, "\"hello world\"");
        assert_eq!(tokens[0].literal, Some(Literal::Str("hello world".to_string())));
    }

    #[test]
    fn test_multiline_string_counts_lines() {
        let tokens = Lexer::new("\"a\nb\" x").tokenize().tokens;
        assert_eq!(tokens[0].literal, Some(Literal::Str("a\nb".to_string())));
        assert_eq!(tokens[0].line, 2);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn test_comments_are_discarded() {
        use TokenKind::*;
        assert_eq!(
            kinds("a // comment ( ) {\n/ b"),
            vec![Identifier, Slash, Identifier, Eof]
        );
    }

    #[test]
    fn test_line_numbers() {
        let tokens = Lexer::new("a\n\nb\n").tokenize().tokens;
        assert_eq!(tokens[0].line, 1);
        assert_eq!(tokens[1].line, 3);
        assert_eq!(tokens[2].line, 4);
    }

    #[test]
    fn test_unterminated_string_is_reported() {
        let output = Lexer::new("print 1;\n\"oops").tokenize();
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.errors[0].message, "Unterminated string.");
        assert_eq!(output.errors[0].line, 2);
        assert_eq!(output.tokens.last().map(|t| t.kind), Some(TokenKind::Eof));
    }

    #[test]
    fn test_invalid_character_continues_scanning() {
        use TokenKind::*;
        let output = Lexer::new("a @ b # c").tokenize();
        assert_eq!(output.errors.len(), 2);
        assert!(output.errors[0].message.contains("Unexpected character '@'"));
        let kinds: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Identifier, Identifier, Identifier, Eof]);
    }

    #[test]
    fn test_only_ascii_whitespace_separates_tokens() {
        use TokenKind::*;
        let output = Lexer::new("a\u{a0}b\u{2003}c\t\r\nd").tokenize();
        assert_eq!(output.errors.len(), 2);
        assert!(output.errors[0].message.contains("Unexpected character '\u{a0}'"));
        let kinds: Vec<_> = output.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Identifier, Identifier, Identifier, Identifier, Eof]);
        assert_eq!(output.tokens[3].line, 2);
    }

    #[test]
    fn test_token_display() {
        let tokens = Lexer::new("x 12 \"hi\"").tokenize().tokens;
        assert_eq!(tokens[0].to_string(), "IDENTIFIER x null");
        assert_eq!(tokens[1].to_string(), "NUMBER 12 12.0");
        assert_eq!(tokens[2].to_string(), "STRING \"hi\" hi");
        assert_eq!(tokens[3].to_string(), "EOF  null");
    }
}
