//! Error handling for the wcc compiler
//!
//! This module defines the compiler-wide error type and the diagnostic
//! reporter used to collect warnings alongside a successful run.

use crate::source_loc::SourceSpan;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Main compiler error type. Every error is fatal to the current
/// compilation; there is no recovery and no partial output.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompilerError {
    #[error("{span}: {message}")]
    ProcessingError { span: SourceSpan, message: String },

    #[error("IO error: {message}")]
    IoError { message: String },

    #[error("Internal compiler error: {message}")]
    InternalError { message: String },
}

impl CompilerError {
    /// Create a processing error anchored at an AST node's span
    pub fn processing(message: String, span: SourceSpan) -> Self {
        CompilerError::ProcessingError { span, message }
    }

    /// The bare message, without position rendering
    pub fn message(&self) -> &str {
        match self {
            CompilerError::ProcessingError { message, .. }
            | CompilerError::IoError { message }
            | CompilerError::InternalError { message } => message,
        }
    }
}

impl From<std::io::Error> for CompilerError {
    fn from(err: std::io::Error) -> Self {
        CompilerError::IoError {
            message: err.to_string(),
        }
    }
}

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with position and severity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub span: SourceSpan,
}

impl Diagnostic {
    pub fn error(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Error,
            message,
            span,
        }
    }

    pub fn warning(message: String, span: SourceSpan) -> Self {
        Self {
            severity: Severity::Warning,
            message,
            span,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.span, self.severity, self.message)
    }
}

/// Collects diagnostics produced during processing. Warnings never abort;
/// they ride along with the produced IR.
#[derive(Debug, Clone, Default)]
pub struct ErrorReporter {
    diagnostics: Vec<Diagnostic>,
    error_count: usize,
    warning_count: usize,
}

impl ErrorReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error diagnostic
    pub fn error(&mut self, message: String, span: SourceSpan) {
        self.diagnostics.push(Diagnostic::error(message, span));
        self.error_count += 1;
    }

    /// Record a warning diagnostic
    pub fn warning(&mut self, message: String, span: SourceSpan) {
        self.diagnostics.push(Diagnostic::warning(message, span));
        self.warning_count += 1;
    }

    pub fn has_errors(&self) -> bool {
        self.error_count > 0
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }

    pub fn warning_count(&self) -> usize {
        self.warning_count
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Drain collected diagnostics, leaving the reporter empty
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.error_count = 0;
        self.warning_count = 0;
        std::mem::take(&mut self.diagnostics)
    }

    /// Print all diagnostics to stderr
    pub fn print_diagnostics(&self) {
        for diagnostic in &self.diagnostics {
            eprintln!("{}", diagnostic);
        }
    }

    /// Create a summary string
    pub fn summary(&self) -> String {
        match (self.error_count, self.warning_count) {
            (0, 0) => "No errors or warnings".to_string(),
            (0, w) => format!("{} warning{}", w, if w == 1 { "" } else { "s" }),
            (e, 0) => format!("{} error{}", e, if e == 1 { "" } else { "s" }),
            (e, w) => format!(
                "{} error{} and {} warning{}",
                e,
                if e == 1 { "" } else { "s" },
                w,
                if w == 1 { "" } else { "s" }
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source_loc::SourceLocation;

    fn span() -> SourceSpan {
        SourceSpan::new(SourceLocation::new(1, 1, 0), SourceLocation::new(1, 5, 4))
    }

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error("bad".to_string(), span());
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "bad");
        assert_eq!(diag.span, span());
    }

    #[test]
    fn test_error_reporter_counts() {
        let mut reporter = ErrorReporter::new();
        assert!(!reporter.has_errors());

        reporter.error("broken".to_string(), span());
        reporter.warning("iffy".to_string(), span());

        assert!(reporter.has_errors());
        assert_eq!(reporter.error_count(), 1);
        assert_eq!(reporter.warning_count(), 1);
        assert_eq!(reporter.diagnostics().len(), 2);
    }

    #[test]
    fn test_take_diagnostics_resets() {
        let mut reporter = ErrorReporter::new();
        reporter.warning("iffy".to_string(), span());

        let taken = reporter.take_diagnostics();
        assert_eq!(taken.len(), 1);
        assert_eq!(reporter.warning_count(), 0);
        assert!(reporter.diagnostics().is_empty());
    }

    #[test]
    fn test_summary() {
        let mut reporter = ErrorReporter::new();
        assert_eq!(reporter.summary(), "No errors or warnings");

        reporter.error("e1".to_string(), span());
        assert_eq!(reporter.summary(), "1 error");

        reporter.error("e2".to_string(), span());
        assert_eq!(reporter.summary(), "2 errors");

        reporter.warning("w1".to_string(), span());
        assert_eq!(reporter.summary(), "2 errors and 1 warning");
    }

    #[test]
    fn test_error_message_accessor() {
        let err = CompilerError::processing("redeclaration of 'x'".to_string(), span());
        assert_eq!(err.message(), "redeclaration of 'x'");
        assert_eq!(err.to_string(), "1:1-1:5: redeclaration of 'x'");
    }
}
