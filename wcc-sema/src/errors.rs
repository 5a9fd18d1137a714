//! Processing error definitions
//!
//! Every diagnostic the processor can raise. The rendered phrasings are load
//! bearing: the test suite asserts on them verbatim. Internal functions
//! return these without positions; the statement and declaration layers call
//! [`ProcessingError::at`] where the current AST node is known.

use thiserror::Error;
use wcc_common::{CompilerError, SourceSpan};

/// Which kind of tag a struct/enum name was bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Struct,
    Enum,
}

impl std::fmt::Display for TagKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagKind::Struct => write!(f, "struct"),
            TagKind::Enum => write!(f, "enum"),
        }
    }
}

/// Errors raised while processing the AST. All are fatal; there is no
/// recovery and no partial IR.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProcessingError {
    // Declarations and scoping
    #[error("redeclaration of '{name}'")]
    Redeclaration { name: String },

    #[error("redefinition of '{kind} {tag}'")]
    TagRedefinition { kind: TagKind, tag: String },

    #[error("redefinition of '{tag}' as wrong kind of tag")]
    WrongKindOfTag { tag: String },

    #[error("redefinition of parameter '{name}'")]
    ParameterRedefinition { name: String },

    #[error("parameter name omitted in function definition")]
    ParameterNameOmitted,

    #[error("'{name}' undeclared")]
    Undeclared { name: String },

    #[error("at least 1 type specifier required in declaration of '{name}'")]
    MissingTypeSpecifier { name: String },

    #[error("useless storage class qualifier in empty declaration")]
    UselessStorageClass,

    #[error("empty declaration")]
    EmptyDeclaration,

    #[error("multiple storage class specifiers: '{first}' and '{second}'")]
    MultipleStorageClasses { first: String, second: String },

    #[error("struct has no members")]
    StructNoMembers,

    #[error("'{name}' is an incomplete type")]
    IncompleteType { name: String },

    #[error("variable or field '{name}' declared void")]
    DeclaredVoid { name: String },

    // Function calls
    #[error("number of arguments provided to function call does not match number of parameters specfied in prototype")]
    ArgumentCount,

    #[error("cannot assign function call argument to parameter")]
    ArgumentType,

    #[error("called object is not a function or function pointer")]
    NotCallable,

    // Operand types
    #[error("invalid operands to binary '{op}' (have '{lhs}' and '{rhs}')")]
    InvalidBinaryOperands {
        op: String,
        lhs: String,
        rhs: String,
    },

    #[error("wrong type argument to unary '{op}' (have '{operand}')")]
    InvalidUnaryOperand { op: String, operand: String },

    #[error("used '{data_type}' where scalar is required")]
    ScalarRequired { data_type: String },

    #[error("cannot dereference non-pointer type")]
    DereferenceNonPointer,

    #[error("array subscript is not an integer")]
    SubscriptNotInteger,

    #[error("type mismatch in conditional expression")]
    ConditionalTypeMismatch,

    #[error("void value not ignored as it should be")]
    VoidValue,

    #[error("conversion to non-scalar type requested")]
    CastToNonScalar,

    #[error("cannot convert between pointer and floating types in cast")]
    PointerFloatCast,

    // Lvalues
    #[error("lvalue required")]
    NotAnLvalue,

    #[error("lvalue required for unary '&' operand")]
    AddressOfNonLvalue,

    #[error("argument to increment is not a modifiable lvalue")]
    IncrementNonLvalue,

    #[error("argument to decrement is not a modifiable lvalue")]
    DecrementNonLvalue,

    #[error("assignment to non-modifiable lvalue with type '{data_type}'")]
    AssignToNonModifiable { data_type: String },

    #[error("assignment to expression with type '{data_type}'")]
    AssignToExpression { data_type: String },

    #[error("incompatible types when assigning to type '{lhs}' from type '{rhs}'")]
    AssignTypeMismatch { lhs: String, rhs: String },

    // Sizeof
    #[error("invalid application of 'sizeof' to function type")]
    SizeofFunction,

    #[error("invalid application of 'sizeof' to incomplete type")]
    SizeofIncomplete,

    // Member access
    #[error("struct {tag} has no member named '{field}'")]
    NoSuchMember { tag: String, field: String },

    #[error("request for member '{field}' in something that is not a structure")]
    MemberOfNonStruct { field: String },

    // Initializers
    #[error("excess elements in initializer")]
    ExcessInitializers,

    #[error("incompatible types when initializing type '{lhs}' using type '{rhs}'")]
    IncompatibleInitializer { lhs: String, rhs: String },

    #[error("function '{name}' is initialized like a variable")]
    FunctionInitialized { name: String },

    #[error("initializer element is not constant")]
    NonConstantInitializer,

    // Statements
    #[error("switch quantity is not an integer")]
    SwitchNotInteger,

    #[error("case value not an integer constant expression")]
    CaseNotConstant,

    #[error("duplicate case value")]
    DuplicateCaseValue,

    #[error("continue statement not within a loop body")]
    ContinueOutsideLoop,

    #[error("break statement not within a switch or loop body")]
    BreakOutsideLoopOrSwitch,

    #[error("incompatible types when returning type '{rhs}' but '{lhs}' was expected")]
    ReturnTypeMismatch { lhs: String, rhs: String },

    // Constant evaluation
    #[error("expression is not a compile-time constant")]
    NotCompileTimeConstant,

    #[error("division by zero in constant expression")]
    ConstantDivisionByZero,

    #[error("Variable Length Arrays not supported")]
    VariableLengthArray,

    #[error("size of array is negative")]
    NegativeArraySize,

    // Top level
    #[error("main function not defined")]
    MainNotDefined,

    #[error("{message}")]
    Internal { message: String },
}

impl ProcessingError {
    /// Internal invariant violation; these indicate a processor bug, not a
    /// source program error
    pub fn internal(message: impl Into<String>) -> Self {
        ProcessingError::Internal {
            message: message.into(),
        }
    }

    /// Attach a source position, producing the compiler-wide error type
    pub fn at(self, span: &SourceSpan) -> CompilerError {
        CompilerError::processing(self.to_string(), span.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_phrasings() {
        assert_eq!(
            ProcessingError::Redeclaration {
                name: "x".to_string()
            }
            .to_string(),
            "redeclaration of 'x'"
        );
        assert_eq!(
            ProcessingError::TagRedefinition {
                kind: TagKind::Enum,
                tag: "x".to_string()
            }
            .to_string(),
            "redefinition of 'enum x'"
        );
        assert_eq!(
            ProcessingError::WrongKindOfTag {
                tag: "X".to_string()
            }
            .to_string(),
            "redefinition of 'X' as wrong kind of tag"
        );
        assert_eq!(
            ProcessingError::ArgumentCount.to_string(),
            "number of arguments provided to function call does not match \
             number of parameters specfied in prototype"
        );
        assert_eq!(
            ProcessingError::InvalidBinaryOperands {
                op: "<".to_string(),
                lhs: "struct X".to_string(),
                rhs: "signed int".to_string()
            }
            .to_string(),
            "invalid operands to binary '<' (have 'struct X' and 'signed int')"
        );
        assert_eq!(
            ProcessingError::MainNotDefined.to_string(),
            "main function not defined"
        );
    }

    #[test]
    fn test_at_attaches_span() {
        let err = ProcessingError::EmptyDeclaration.at(&SourceSpan::dummy());
        assert_eq!(err.message(), "empty declaration");
    }
}
