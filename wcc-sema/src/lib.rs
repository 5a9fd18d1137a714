//! wcc C-to-WebAssembly compiler - Semantic Analysis and Lowering
//!
//! This crate is the processor at the heart of the compiler. It consumes
//! the parsed AST and produces the typed, memory-addressed IR:
//! - Type utilities: sizes, unpacking, compatibility, conversions
//! - Compile-time evaluation: constant folding and type resolution
//! - Symbol table: scopes, tags, the data segment, the function table
//! - Initializer unpacking: nested braces to stores or bytes
//! - Expression processing: typed scalar bundles with explicit conversions
//! - Statement processing: blocks, selection, iteration, jumps
//! - The driver walk over top-level items

pub mod constfold;
pub mod errors;
pub mod expressions;
pub mod initializer;
pub mod modules;
pub mod processor;
pub mod statements;
pub mod symbols;
pub mod types;

pub use constfold::{Constant, Evaluator};
pub use errors::ProcessingError;
pub use modules::{ModuleFunction, ModuleRepository, ModuleSignatures};
pub use processor::{ProcessedOutput, Processor};
pub use symbols::{SymbolEntry, SymbolTable};
