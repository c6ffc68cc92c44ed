//! Centralised error type for the **Quill interpreter**.
//!
//! All phases (scanner, parser, resolver, evaluator) convert their failure
//! modes into a [`QuillError`] wrapping a phase-tagged [`Diagnostic`]. This
//! enables a uniform `Result<T>` alias throughout the crate while preserving
//! the source position and lexeme for rendering.
//!
//! The module does not print diagnostics itself.

use thiserror::Error;

use log::info;

use crate::reporter::{Diagnostic, Phase};
use crate::token::Token;

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{diagnostic}")]
pub struct QuillError {
    pub diagnostic: Diagnostic,
}

impl QuillError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, column: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lexical error: line={}, msg={}", line, message);

        QuillError {
            diagnostic: Diagnostic {
                phase: Phase::Lexical,
                message,
                line,
                column,
                lexeme: None,
            },
        }
    }

    /// Helper constructor for the **parser**.
    pub fn syntax<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Syntax error: line={}, msg={}", token.line, message);

        QuillError {
            diagnostic: Diagnostic {
                phase: Phase::Syntax,
                message,
                line: token.line,
                column: token.column,
                lexeme: Some(token.lexeme.clone()),
            },
        }
    }

    /// Helper constructor for the **resolver**. Static errors share the
    /// `Runtime` phase tag.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Resolve error: line={}, msg={}",
            token.line, message
        );

        QuillError {
            diagnostic: Diagnostic {
                phase: Phase::Runtime,
                message,
                line: token.line,
                column: token.column,
                lexeme: Some(token.lexeme.clone()),
            },
        }
    }

    /// Helper constructor for the **evaluator**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!(
            "Creating Runtime error: line={}, msg={}",
            token.line, message
        );

        QuillError {
            diagnostic: Diagnostic {
                phase: Phase::Runtime,
                message,
                line: token.line,
                column: token.column,
                lexeme: Some(token.lexeme.clone()),
            },
        }
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, QuillError>;
