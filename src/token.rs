use std::fmt;
use std::mem;

/// Every token kind the scanner can emit. Number and string literals carry
/// their parsed value directly in the kind.
#[allow(non_camel_case_types)]
#[derive(Debug, Clone)]
pub enum TokenType {
    // Single-character tokens.
    LEFT_PAREN,
    RIGHT_PAREN,
    LEFT_BRACE,
    RIGHT_BRACE,
    LEFT_BRACKET,
    RIGHT_BRACKET,
    COMMA,
    DOT,
    SEMICOLON,
    PERCENT,

    // One or two character tokens.
    MINUS,
    MINUS_EQUAL,
    MINUS_MINUS,
    PLUS,
    PLUS_EQUAL,
    PLUS_PLUS,
    SLASH,
    SLASH_EQUAL,
    STAR,
    STAR_EQUAL,
    BANG,
    BANG_EQUAL,
    EQUAL,
    EQUAL_EQUAL,
    GREATER,
    GREATER_EQUAL,
    LESS,
    LESS_EQUAL,

    // Literals.
    IDENTIFIER,
    STRING(String),
    NUMBER(f64),

    // Keywords.
    AND,
    OR,
    BREAK,
    CONTINUE,
    IF,
    ELSE,
    ELSE_IF,
    FOR,
    WHILE,
    FUN,
    CLASS,
    INHERITS,
    THIS,
    SUPER,
    RETURN,
    TRUE,
    FALSE,
    NIL,
    PRINT,
    VAR,

    // Special Characters
    EOF,
}

/// Kinds compare by discriminant only; literal payloads are ignored, so the
/// parser can check for "any number" with `TokenType::NUMBER(0.0)`.
impl PartialEq for TokenType {
    fn eq(&self, other: &Self) -> bool {
        mem::discriminant(self) == mem::discriminant(other)
    }
}

impl Eq for TokenType {}

#[derive(Debug, Clone)]
pub struct Token {
    pub token_type: TokenType,
    pub lexeme: String,

    /// 1-based source line.
    pub line: usize,

    /// 0-based column of the first character of the lexeme on its line.
    pub column: usize,
}

impl Token {
    pub fn new(token_type: TokenType, lexeme: String, line: usize, column: usize) -> Self {
        Self {
            token_type,
            lexeme,
            line,
            column,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tmp: String = format!("{:?}", self.token_type);
        let type_name: &str = tmp.split('(').next().unwrap_or(&tmp);

        match &self.token_type {
            TokenType::STRING(literal) => write!(f, "{} {} {}", type_name, self.lexeme, literal),

            TokenType::NUMBER(literal) => write!(f, "{} {} {}", type_name, self.lexeme, literal),

            _ => write!(f, "{} {} null", type_name, self.lexeme),
        }
    }
}
