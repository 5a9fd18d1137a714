//! The C data-type algebra
//!
//! Types form a closed sum shared between the parsed AST and the processor.
//! Struct and enum types written as bare tag references carry `None` bodies
//! and are resolved against the tag namespace during processing; array
//! lengths are arbitrary expressions until the processor folds them.

use crate::expressions::Expression;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The primary (scalar) C types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryType {
    SignedChar,
    UnsignedChar,
    SignedShort,
    UnsignedShort,
    SignedInt,
    UnsignedInt,
    SignedLong,
    UnsignedLong,
    Float,
    Double,
}

impl PrimaryType {
    /// Object size in bytes
    pub fn size_in_bytes(&self) -> u32 {
        match self {
            PrimaryType::SignedChar | PrimaryType::UnsignedChar => 1,
            PrimaryType::SignedShort | PrimaryType::UnsignedShort => 2,
            PrimaryType::SignedInt | PrimaryType::UnsignedInt | PrimaryType::Float => 4,
            PrimaryType::SignedLong | PrimaryType::UnsignedLong | PrimaryType::Double => 8,
        }
    }

    pub fn is_integer(&self) -> bool {
        !self.is_float()
    }

    pub fn is_float(&self) -> bool {
        matches!(self, PrimaryType::Float | PrimaryType::Double)
    }

    /// Signedness of the integer kinds; floats report signed
    pub fn is_signed(&self) -> bool {
        !matches!(
            self,
            PrimaryType::UnsignedChar
                | PrimaryType::UnsignedShort
                | PrimaryType::UnsignedInt
                | PrimaryType::UnsignedLong
        )
    }

    /// The unsigned integer type of the same width
    pub fn to_unsigned(&self) -> PrimaryType {
        match self {
            PrimaryType::SignedChar => PrimaryType::UnsignedChar,
            PrimaryType::SignedShort => PrimaryType::UnsignedShort,
            PrimaryType::SignedInt => PrimaryType::UnsignedInt,
            PrimaryType::SignedLong => PrimaryType::UnsignedLong,
            other => *other,
        }
    }

    /// Conversion rank per C17 6.3.1.1 (floats are above every integer)
    pub fn rank(&self) -> u32 {
        match self {
            PrimaryType::SignedChar | PrimaryType::UnsignedChar => 1,
            PrimaryType::SignedShort | PrimaryType::UnsignedShort => 2,
            PrimaryType::SignedInt | PrimaryType::UnsignedInt => 3,
            PrimaryType::SignedLong | PrimaryType::UnsignedLong => 4,
            PrimaryType::Float => 5,
            PrimaryType::Double => 6,
        }
    }
}

impl fmt::Display for PrimaryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimaryType::SignedChar => "signed char",
            PrimaryType::UnsignedChar => "unsigned char",
            PrimaryType::SignedShort => "signed short",
            PrimaryType::UnsignedShort => "unsigned short",
            PrimaryType::SignedInt => "signed int",
            PrimaryType::UnsignedInt => "unsigned int",
            PrimaryType::SignedLong => "signed long",
            PrimaryType::UnsignedLong => "unsigned long",
            PrimaryType::Float => "float",
            PrimaryType::Double => "double",
        };
        write!(f, "{}", name)
    }
}

/// A named struct field. The type may be `StructSelfPointer`, standing for
/// "pointer to the enclosing struct".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub name: String,
    pub data_type: DataType,
}

/// An enum member; the value expression is optional and defaults to one past
/// the previous member (starting at zero).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<Expression>,
}

/// C data types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DataType {
    /// Scalar type with an optional const qualifier
    Primary {
        primary: PrimaryType,
        is_const: bool,
    },

    /// Pointer to another type; the pointee may be `Void`
    Pointer {
        pointee: Box<DataType>,
        is_const: bool,
    },

    /// Array with an element count expression; the processor folds the count
    /// to a non-negative integer constant
    Array {
        element: Box<DataType>,
        length: Box<Expression>,
        is_const: bool,
    },

    /// Struct; `fields: None` is a bare tag reference to be resolved
    Struct {
        tag: Option<String>,
        fields: Option<Vec<StructField>>,
    },

    /// Pointer to the enclosing struct, valid only inside a struct's own
    /// field list
    StructSelfPointer,

    /// Enum; `members: None` is a bare tag reference to be resolved
    Enum {
        tag: Option<String>,
        members: Option<Vec<EnumMember>>,
    },

    /// Function type; the return type may be `Void`
    Function {
        return_type: Box<DataType>,
        parameters: Vec<DataType>,
    },

    /// Typedef reference, resolved by the processor
    Named(String),

    Void,
}

impl DataType {
    /// Unqualified primary type
    pub fn primary(primary: PrimaryType) -> Self {
        DataType::Primary {
            primary,
            is_const: false,
        }
    }

    /// Unqualified pointer to `pointee`
    pub fn pointer_to(pointee: DataType) -> Self {
        DataType::Pointer {
            pointee: Box::new(pointee),
            is_const: false,
        }
    }

    /// Array of `element` with a literal length
    pub fn array_of(element: DataType, length: u32) -> Self {
        DataType::Array {
            element: Box::new(element),
            length: Box::new(Expression::int_const(i128::from(length))),
            is_const: false,
        }
    }

    /// The primary kind, if this is a primary type
    pub fn as_primary(&self) -> Option<PrimaryType> {
        match self {
            DataType::Primary { primary, .. } => Some(*primary),
            _ => None,
        }
    }

    /// Arithmetic types: primaries and enums
    pub fn is_arithmetic(&self) -> bool {
        matches!(self, DataType::Primary { .. } | DataType::Enum { .. })
    }

    /// Integer types: integral primaries and enums
    pub fn is_integer(&self) -> bool {
        match self {
            DataType::Primary { primary, .. } => primary.is_integer(),
            DataType::Enum { .. } => true,
            _ => false,
        }
    }

    /// Scalar types: arithmetic plus pointers
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            DataType::Primary { .. }
                | DataType::Pointer { .. }
                | DataType::Enum { .. }
                | DataType::StructSelfPointer
        )
    }

    /// Aggregate types: arrays and structs
    pub fn is_aggregate(&self) -> bool {
        matches!(self, DataType::Array { .. } | DataType::Struct { .. })
    }

    pub fn is_pointer(&self) -> bool {
        matches!(self, DataType::Pointer { .. } | DataType::StructSelfPointer)
    }

    pub fn is_void_pointer(&self) -> bool {
        matches!(self, DataType::Pointer { pointee, .. } if **pointee == DataType::Void)
    }

    pub fn is_function(&self) -> bool {
        matches!(self, DataType::Function { .. })
    }

    /// The const qualifier carried by this type, where one can be carried
    pub fn is_const(&self) -> bool {
        match self {
            DataType::Primary { is_const, .. }
            | DataType::Pointer { is_const, .. }
            | DataType::Array { is_const, .. } => *is_const,
            _ => false,
        }
    }

    /// A copy with the const qualifier stripped
    pub fn without_const(&self) -> DataType {
        let mut copy = self.clone();
        match &mut copy {
            DataType::Primary { is_const, .. }
            | DataType::Pointer { is_const, .. }
            | DataType::Array { is_const, .. } => *is_const = false,
            _ => {}
        }
        copy
    }

    /// A copy with the const qualifier set
    pub fn with_const(&self) -> DataType {
        let mut copy = self.clone();
        match &mut copy {
            DataType::Primary { is_const, .. }
            | DataType::Pointer { is_const, .. }
            | DataType::Array { is_const, .. } => *is_const = true,
            _ => {}
        }
        copy
    }

    /// Folded array length, once the processor has rewritten it to a literal
    pub fn folded_length(&self) -> Option<u32> {
        match self {
            DataType::Array { length, .. } => {
                length.as_integer_constant().and_then(|v| u32::try_from(v).ok())
            }
            _ => None,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Primary { primary, is_const } => {
                if *is_const {
                    write!(f, "const ")?;
                }
                write!(f, "{}", primary)
            }
            DataType::Pointer { pointee, is_const } => {
                write!(f, "{} *", pointee)?;
                if *is_const {
                    write!(f, "const")?;
                }
                Ok(())
            }
            DataType::Array { element, length, .. } => {
                match length.as_integer_constant() {
                    Some(n) => write!(f, "{} [{}]", element, n),
                    None => write!(f, "{} []", element),
                }
            }
            DataType::Struct { tag: Some(tag), .. } => write!(f, "struct {}", tag),
            DataType::Struct { tag: None, .. } => write!(f, "struct <anonymous>"),
            DataType::StructSelfPointer => write!(f, "struct *"),
            DataType::Enum { tag: Some(tag), .. } => write!(f, "enum {}", tag),
            DataType::Enum { tag: None, .. } => write!(f, "enum <anonymous>"),
            DataType::Function {
                return_type,
                parameters,
            } => {
                write!(f, "{} (", return_type)?;
                for (i, param) in parameters.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", param)?;
                }
                write!(f, ")")
            }
            DataType::Named(name) => write!(f, "{}", name),
            DataType::Void => write!(f, "void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_sizes() {
        assert_eq!(PrimaryType::SignedChar.size_in_bytes(), 1);
        assert_eq!(PrimaryType::UnsignedShort.size_in_bytes(), 2);
        assert_eq!(PrimaryType::SignedInt.size_in_bytes(), 4);
        assert_eq!(PrimaryType::UnsignedLong.size_in_bytes(), 8);
        assert_eq!(PrimaryType::Float.size_in_bytes(), 4);
        assert_eq!(PrimaryType::Double.size_in_bytes(), 8);
    }

    #[test]
    fn test_primary_signedness() {
        assert!(PrimaryType::SignedChar.is_signed());
        assert!(!PrimaryType::UnsignedLong.is_signed());
        assert_eq!(PrimaryType::SignedInt.to_unsigned(), PrimaryType::UnsignedInt);
        assert_eq!(PrimaryType::UnsignedInt.to_unsigned(), PrimaryType::UnsignedInt);
    }

    #[test]
    fn test_predicates() {
        let int = DataType::primary(PrimaryType::SignedInt);
        let ptr = DataType::pointer_to(int.clone());
        let arr = DataType::array_of(int.clone(), 4);

        assert!(int.is_arithmetic());
        assert!(int.is_scalar());
        assert!(!int.is_aggregate());

        assert!(ptr.is_scalar());
        assert!(ptr.is_pointer());
        assert!(!ptr.is_arithmetic());

        assert!(arr.is_aggregate());
        assert!(!arr.is_scalar());
        assert_eq!(arr.folded_length(), Some(4));

        assert!(DataType::pointer_to(DataType::Void).is_void_pointer());
        assert!(!ptr.is_void_pointer());
    }

    #[test]
    fn test_const_qualifier() {
        let t = DataType::primary(PrimaryType::SignedInt).with_const();
        assert!(t.is_const());
        assert!(!t.without_const().is_const());

        // Structs carry no qualifier of their own
        let s = DataType::Struct {
            tag: Some("S".to_string()),
            fields: Some(Vec::new()),
        };
        assert!(!s.with_const().is_const());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            DataType::primary(PrimaryType::SignedInt).to_string(),
            "signed int"
        );
        assert_eq!(
            DataType::primary(PrimaryType::UnsignedChar).with_const().to_string(),
            "const unsigned char"
        );
        assert_eq!(
            DataType::pointer_to(DataType::primary(PrimaryType::Double)).to_string(),
            "double *"
        );
        assert_eq!(
            DataType::array_of(DataType::primary(PrimaryType::SignedLong), 5).to_string(),
            "signed long [5]"
        );
        assert_eq!(
            DataType::Struct {
                tag: Some("X".to_string()),
                fields: None,
            }
            .to_string(),
            "struct X"
        );
        assert_eq!(
            DataType::Function {
                return_type: Box::new(DataType::Void),
                parameters: vec![DataType::primary(PrimaryType::SignedInt)],
            }
            .to_string(),
            "void (signed int)"
        );
    }
}
