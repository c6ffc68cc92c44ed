//! Diagnostic and output collection shared by every phase.
//!
//! The scanner pushes lexical diagnostics here and keeps going; the later
//! phases stop at their first error, which the embedding entry records here
//! as well. `print` statements append to the output log in execution order.

use std::fmt;

use log::info;

/// Which phase produced a diagnostic.
///
/// Static errors found by the resolver are reported with the `Runtime` phase
/// to keep the diagnostic taxonomy stable for embedders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Lexical,
    Syntax,
    Runtime,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Lexical => write!(f, "Lexical"),
            Phase::Syntax => write!(f, "Syntax"),
            Phase::Runtime => write!(f, "Runtime"),
        }
    }
}

/// A single error pinned to a source position.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub phase: Phase,
    pub message: String,

    /// 1-based line.
    pub line: usize,

    /// 0-based column.
    pub column: usize,

    /// The offending lexeme, when a token was attached.
    pub lexeme: Option<String>,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{} Error] on line {} at column {}",
            self.phase, self.line, self.column
        )?;

        if let Some(lexeme) = self.lexeme.as_deref() {
            if !lexeme.is_empty() {
                write!(f, " (at '{}')", lexeme)?;
            }
        }

        write!(f, ": {}", self.message)
    }
}

/// Collects diagnostics and the ordered output log for one run.
#[derive(Debug, Default)]
pub struct Reporter {
    diagnostics: Vec<Diagnostic>,
    output: Vec<String>,
}

impl Reporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, diagnostic: Diagnostic) {
        info!("Reporting diagnostic: {}", diagnostic);

        self.diagnostics.push(diagnostic);
    }

    /// Append one line to the output log.
    pub fn print(&mut self, line: String) {
        self.output.push(line);
    }

    pub fn had_error(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<String>) {
        (self.diagnostics, self.output)
    }
}
