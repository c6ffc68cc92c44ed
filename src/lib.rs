//! # Quill
//!
//! A tree-walking interpreter for the Quill scripting language: first-class
//! functions with closures, single-inheritance classes, arrays and C-style
//! control flow over a small dynamically-typed core.
//!
//! Execution is a linear four-phase pipeline. The scanner turns source text
//! into tokens, the parser builds the AST, the resolver computes a lexical
//! binding distance for every variable use, and the interpreter walks the
//! tree. `print` output is captured into an ordered log rather than written
//! to the host's stdout, and diagnostics from every phase are collected with
//! their source positions, so the whole pipeline is embeddable through the
//! single [`run`] entry point.

pub mod callable;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use log::info;

use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::reporter::{Diagnostic, Reporter};
use crate::resolver::Resolver;
use crate::scanner::Scanner;
use crate::stmt::Stmt;
use crate::token::Token;

/// The result of running one source program.
#[derive(Debug)]
pub struct RunResult {
    pub succeeded: bool,
    pub errors: Vec<Diagnostic>,
    pub output: Vec<String>,
}

/// Execute a source program front to back.
///
/// Errors from any phase halt the pipeline and come back in `errors`: the
/// scanner may report several, the later phases stop at their first. Output
/// produced before a runtime error is preserved.
pub fn run(source: &str) -> RunResult {
    info!("Running {} byte(s) of source", source.len());

    let mut reporter: Reporter = Reporter::new();

    let tokens: Vec<Token> = Scanner::new(source).scan_tokens(&mut reporter);

    if reporter.had_error() {
        return finish(reporter);
    }

    let statements: Vec<Stmt> = match Parser::new(tokens).parse() {
        Ok(statements) => statements,

        Err(error) => {
            reporter.report(error.diagnostic);
            return finish(reporter);
        }
    };

    let mut interpreter: Interpreter = Interpreter::new(reporter);

    if let Err(error) = Resolver::new(&mut interpreter).resolve(&statements) {
        let mut reporter: Reporter = interpreter.into_reporter();
        reporter.report(error.diagnostic);
        return finish(reporter);
    }

    let result = interpreter.interpret(&statements);

    let mut reporter: Reporter = interpreter.into_reporter();

    if let Err(error) = result {
        reporter.report(error.diagnostic);
    }

    finish(reporter)
}

fn finish(reporter: Reporter) -> RunResult {
    let succeeded: bool = !reporter.had_error();
    let (errors, output) = reporter.into_parts();

    RunResult {
        succeeded,
        errors,
        output,
    }
}
