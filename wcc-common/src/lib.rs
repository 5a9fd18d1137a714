//! wcc C-to-WebAssembly compiler - Common Types and Utilities
//!
//! This crate contains shared types, error definitions, and diagnostics
//! used across all components of the wcc compiler.

pub mod error;
pub mod source_loc;

pub use error::{CompilerError, Diagnostic, ErrorReporter, Severity};
pub use source_loc::{SourceLocation, SourceSpan};
