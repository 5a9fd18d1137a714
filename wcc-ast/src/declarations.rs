//! Declarations, initializers, and the translation-unit root

use crate::expressions::Expression;
use crate::statements::BlockItem;
use crate::types::{DataType, EnumMember};
use serde::{Deserialize, Serialize};
use std::fmt;
use wcc_common::SourceSpan;

/// Storage class specifiers as written in the source; the processor rejects
/// more than one per declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageClassSpecifier {
    Typedef,
    Extern,
    Static,
    Auto,
    Register,
}

impl fmt::Display for StorageClassSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageClassSpecifier::Typedef => "typedef",
            StorageClassSpecifier::Extern => "extern",
            StorageClassSpecifier::Static => "static",
            StorageClassSpecifier::Auto => "auto",
            StorageClassSpecifier::Register => "register",
        };
        write!(f, "{}", name)
    }
}

/// A declaration as parsed: raw specifier list plus zero or more declarators.
/// A declaration with no declarators may still define a struct or enum tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Declaration {
    pub storage_classes: Vec<StorageClassSpecifier>,
    /// The written base type; `None` when the source omitted a type specifier
    pub type_specifier: Option<DataType>,
    pub declarators: Vec<InitDeclarator>,
    pub span: SourceSpan,
}

impl Declaration {
    /// A plain single-variable declaration, for synthesized nodes and tests
    pub fn variable(name: &str, data_type: DataType, initializer: Option<Initializer>) -> Self {
        Self {
            storage_classes: Vec::new(),
            type_specifier: Some(data_type.clone()),
            declarators: vec![InitDeclarator {
                name: name.to_string(),
                data_type,
                initializer,
                span: SourceSpan::dummy(),
            }],
            span: SourceSpan::dummy(),
        }
    }
}

/// One declarator with its fully derived type and optional initializer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitDeclarator {
    pub name: String,
    pub data_type: DataType,
    pub initializer: Option<Initializer>,
    pub span: SourceSpan,
}

/// A parsed initializer: a single expression or a brace-enclosed list,
/// nested arbitrarily
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Initializer {
    Single(Box<Expression>),
    List(Vec<Initializer>),
}

/// A named function parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: Option<String>,
    pub data_type: DataType,
    pub span: SourceSpan,
}

/// A function definition (prototypes are ordinary declarations with a
/// function-typed declarator)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub return_type: DataType,
    pub parameters: Vec<Parameter>,
    pub body: Vec<BlockItem>,
    pub span: SourceSpan,
}

/// A standalone enum declaration, `enum tag { ... };`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumDeclaration {
    pub tag: Option<String>,
    pub members: Vec<EnumMember>,
    pub span: SourceSpan,
}

/// A top-level item of the translation unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TopLevelItem {
    Function(FunctionDefinition),
    Declaration(Declaration),
    EnumDeclaration(EnumDeclaration),
}

/// The root the parser hands to the processor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Modules named by the flat include list of the source file
    pub included_modules: Vec<String>,
    pub items: Vec<TopLevelItem>,
}

impl TranslationUnit {
    pub fn new(items: Vec<TopLevelItem>) -> Self {
        Self {
            included_modules: Vec::new(),
            items,
        }
    }

    pub fn with_modules(mut self, modules: Vec<String>) -> Self {
        self.included_modules = modules;
        self
    }
}
