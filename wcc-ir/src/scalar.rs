//! Machine scalar types
//!
//! The closed vocabulary of value widths the emitter has to deal with.
//! Pointers and enums have already been lowered (to `U32` and `I32`) by the
//! time IR is produced.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A machine-level scalar: signed/unsigned integers of 1-8 bytes and the
/// two IEEE-754 widths
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScalarType {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarType {
    pub fn size_in_bytes(&self) -> u32 {
        match self {
            ScalarType::I8 | ScalarType::U8 => 1,
            ScalarType::I16 | ScalarType::U16 => 2,
            ScalarType::I32 | ScalarType::U32 | ScalarType::F32 => 4,
            ScalarType::I64 | ScalarType::U64 | ScalarType::F64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, ScalarType::F32 | ScalarType::F64)
    }

    pub fn is_signed(&self) -> bool {
        matches!(
            self,
            ScalarType::I8 | ScalarType::I16 | ScalarType::I32 | ScalarType::I64
        )
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::I8 => "i8",
            ScalarType::U8 => "u8",
            ScalarType::I16 => "i16",
            ScalarType::U16 => "u16",
            ScalarType::I32 => "i32",
            ScalarType::U32 => "u32",
            ScalarType::I64 => "i64",
            ScalarType::U64 => "u64",
            ScalarType::F32 => "f32",
            ScalarType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizes() {
        assert_eq!(ScalarType::I8.size_in_bytes(), 1);
        assert_eq!(ScalarType::U16.size_in_bytes(), 2);
        assert_eq!(ScalarType::F32.size_in_bytes(), 4);
        assert_eq!(ScalarType::U64.size_in_bytes(), 8);
    }

    #[test]
    fn test_classification() {
        assert!(ScalarType::I64.is_signed());
        assert!(!ScalarType::U32.is_signed());
        assert!(ScalarType::F64.is_float());
        assert!(!ScalarType::F32.is_signed());
    }
}
