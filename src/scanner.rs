use log::{debug, info};
use phf::phf_map;

use crate::error::QuillError;
use crate::reporter::Reporter;
use crate::token::{Token, TokenType};

static KEYWORDS: phf::Map<&'static [u8], TokenType> = phf_map! {
    b"and" => TokenType::AND,
    b"or" => TokenType::OR,
    b"not" => TokenType::BANG,
    b"break" => TokenType::BREAK,
    b"continue" => TokenType::CONTINUE,
    b"if" => TokenType::IF,
    b"else" => TokenType::ELSE,
    b"elif" => TokenType::ELSE_IF,
    b"for" => TokenType::FOR,
    b"while" => TokenType::WHILE,
    b"fun" => TokenType::FUN,
    b"class" => TokenType::CLASS,
    b"inherits" => TokenType::INHERITS,
    b"this" => TokenType::THIS,
    b"super" => TokenType::SUPER,
    b"return" => TokenType::RETURN,
    b"true" => TokenType::TRUE,
    b"false" => TokenType::FALSE,
    b"nil" => TokenType::NIL,
    b"print" => TokenType::PRINT,
    b"let" => TokenType::VAR,
};

/// Converts source text into a token stream terminated by one EOF token.
///
/// Lexical errors are pushed into the [`Reporter`] and scanning continues,
/// so a single pass surfaces every bad character in the input.
#[derive(Debug)]
pub struct Scanner {
    source: Vec<u8>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,

    /// Byte index of the first character of the current line; token columns
    /// are measured from it.
    line_start: usize,

    /// Position of the token currently being scanned, captured before the
    /// first character is consumed so multi-line strings keep their start.
    token_line: usize,
    token_column: usize,
}

impl Scanner {
    pub fn new(source: &str) -> Self {
        info!("Initializing Scanner with {} bytes", source.len());

        Self {
            source: source.as_bytes().to_vec(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
            line_start: 0,
            token_line: 1,
            token_column: 0,
        }
    }

    /// Scan the whole source, reporting lexical errors as they are found.
    pub fn scan_tokens(mut self, reporter: &mut Reporter) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.token_line = self.line;
            self.token_column = self.start - self.line_start;

            if let Err(error) = self.scan_token() {
                reporter.report(error.diagnostic);
            }
        }

        self.token_line = self.line;
        self.token_column = self.current.saturating_sub(self.line_start);
        self.tokens.push(Token::new(
            TokenType::EOF,
            String::new(),
            self.token_line,
            self.token_column,
        ));

        info!("Scanned {} token(s)", self.tokens.len());

        self.tokens
    }

    fn scan_token(&mut self) -> Result<(), QuillError> {
        let byte: u8 = self.advance();

        match byte {
            b'(' => self.add_token(TokenType::LEFT_PAREN),

            b')' => self.add_token(TokenType::RIGHT_PAREN),

            b'{' => self.add_token(TokenType::LEFT_BRACE),

            b'}' => self.add_token(TokenType::RIGHT_BRACE),

            b'[' => self.add_token(TokenType::LEFT_BRACKET),

            b']' => self.add_token(TokenType::RIGHT_BRACKET),

            b',' => self.add_token(TokenType::COMMA),

            b'.' => self.add_token(TokenType::DOT),

            b';' => self.add_token(TokenType::SEMICOLON),

            b'%' => self.add_token(TokenType::PERCENT),

            b'-' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::MINUS_EQUAL
                } else if self.match_byte(b'-') {
                    TokenType::MINUS_MINUS
                } else {
                    TokenType::MINUS
                };
                self.add_token(token_type);
            }

            b'+' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::PLUS_EQUAL
                } else if self.match_byte(b'+') {
                    TokenType::PLUS_PLUS
                } else {
                    TokenType::PLUS
                };
                self.add_token(token_type);
            }

            b'*' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::STAR_EQUAL
                } else {
                    TokenType::STAR
                };
                self.add_token(token_type);
            }

            b'!' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::BANG_EQUAL
                } else {
                    TokenType::BANG
                };
                self.add_token(token_type);
            }

            b'=' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::EQUAL_EQUAL
                } else {
                    TokenType::EQUAL
                };
                self.add_token(token_type);
            }

            b'<' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::LESS_EQUAL
                } else {
                    TokenType::LESS
                };
                self.add_token(token_type);
            }

            b'>' => {
                let token_type: TokenType = if self.match_byte(b'=') {
                    TokenType::GREATER_EQUAL
                } else {
                    TokenType::GREATER
                };
                self.add_token(token_type);
            }

            // A lone '&' or '|' is silently skipped.
            b'&' => {
                if self.match_byte(b'&') {
                    self.add_token(TokenType::AND);
                }
            }

            b'|' => {
                if self.match_byte(b'|') {
                    self.add_token(TokenType::OR);
                }
            }

            b'/' => {
                if self.match_byte(b'/') {
                    debug!("Found comment, skipping until newline");
                    while self.peek() != b'\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else if self.match_byte(b'=') {
                    self.add_token(TokenType::SLASH_EQUAL);
                } else {
                    self.add_token(TokenType::SLASH);
                }
            }

            b' ' | b'\r' | b'\t' => {}

            b'\n' => {
                self.line += 1;
                self.line_start = self.current;
            }

            b'"' => {
                self.scan_string()?;
            }

            b'0'..=b'9' => {
                self.scan_number();
            }

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => {
                self.scan_identifier();
            }

            _ => {
                debug!(
                    "Unexpected character '{}' at line {}",
                    byte as char, self.token_line
                );

                return Err(QuillError::lex(
                    self.token_line,
                    self.token_column,
                    "Unexpected character.",
                ));
            }
        }

        Ok(())
    }

    /// Scan a string literal. Escape sequences are not decoded: a backslash
    /// only shields the next character from terminating the literal, and
    /// both characters pass through into the value verbatim.
    fn scan_string(&mut self) -> Result<(), QuillError> {
        while !self.is_at_end() && self.peek() != b'"' {
            match self.peek() {
                b'\n' => {
                    self.line += 1;
                    self.advance();
                    self.line_start = self.current;
                }

                b'\\' => {
                    self.advance();
                    if !self.is_at_end() {
                        self.advance();
                    }
                }

                _ => {
                    self.advance();
                }
            }
        }

        if self.is_at_end() {
            debug!("Unterminated string starting at line {}", self.token_line);

            return Err(QuillError::lex(
                self.token_line,
                self.token_column,
                "Unterminated string.",
            ));
        }

        // The closing quote.
        self.advance();

        let literal: String =
            String::from_utf8_lossy(&self.source[self.start + 1..self.current - 1]).into_owned();

        self.add_token(TokenType::STRING(literal));

        Ok(())
    }

    fn scan_number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A trailing '.' with no digit after it is left for the next token.
        if self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            self.advance();

            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let text: String =
            String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned();

        let number: f64 = text.parse().unwrap_or(0.0);

        self.add_token(TokenType::NUMBER(number));
    }

    fn scan_identifier(&mut self) {
        while self.peek().is_ascii_alphanumeric() || self.peek() == b'_' {
            self.advance();
        }

        let text: &[u8] = &self.source[self.start..self.current];

        match KEYWORDS.get(text) {
            Some(token_type) => {
                self.add_token(token_type.clone());
            }

            None => {
                self.add_token(TokenType::IDENTIFIER);
            }
        }
    }

    fn add_token(&mut self, token_type: TokenType) {
        let lexeme: String =
            String::from_utf8_lossy(&self.source[self.start..self.current]).into_owned();

        debug!(
            "Emitting token: type={:?}, lexeme={}, line={}, column={}",
            token_type, lexeme, self.token_line, self.token_column
        );

        self.tokens.push(Token::new(
            token_type,
            lexeme,
            self.token_line,
            self.token_column,
        ));
    }

    #[inline]
    fn advance(&mut self) -> u8 {
        let byte: u8 = self.source[self.current];

        self.current += 1;

        byte
    }

    #[inline]
    fn match_byte(&mut self, expected: u8) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.current += 1;

            true
        }
    }

    #[inline]
    fn peek(&self) -> u8 {
        if self.is_at_end() {
            0
        } else {
            self.source[self.current]
        }
    }

    #[inline]
    fn peek_next(&self) -> u8 {
        if self.current + 1 >= self.source.len() {
            0
        } else {
            self.source[self.current + 1]
        }
    }

    #[inline]
    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }
}
