//! IR expression nodes
//!
//! Expressions are pure scalar computations except for the two sequencing
//! forms, which carry statements that must execute before or after the
//! value is produced (increment operators and calls lower through these).

use crate::scalar::ScalarType;
use crate::statements::Statement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A memory address the emitter can resolve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Address {
    /// Frame-pointer relative; parameters are non-negative, locals negative
    Local { offset: i32 },

    /// Absolute offset into the data segment
    Data { offset: u32 },

    /// A function's slot in the indirect-call table
    FunctionTable { index: u32 },

    /// Offset into the return area shared by callee stores and caller loads
    Return { offset: u32 },
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Local { offset } => write!(f, "local[{}]", offset),
            Address::Data { offset } => write!(f, "data[{}]", offset),
            Address::FunctionTable { index } => write!(f, "table[{}]", index),
            Address::Return { offset } => write!(f, "ret[{}]", offset),
        }
    }
}

/// Binary operations. Signedness and width come from the operand scalar
/// type; comparisons produce an `I32` in {0, 1}.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    /// Comparisons produce `I32` regardless of operand type
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            BinaryOp::Add => "add",
            BinaryOp::Sub => "sub",
            BinaryOp::Mul => "mul",
            BinaryOp::Div => "div",
            BinaryOp::Rem => "rem",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
            BinaryOp::Xor => "xor",
            BinaryOp::Shl => "shl",
            BinaryOp::Shr => "shr",
            BinaryOp::Eq => "eq",
            BinaryOp::Ne => "ne",
            BinaryOp::Lt => "lt",
            BinaryOp::Le => "le",
            BinaryOp::Gt => "gt",
            BinaryOp::Ge => "ge",
        };
        write!(f, "{}", op_str)
    }
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    BitNot,
    /// 1 if the operand is zero, else 0; produces `I32`
    Eqz,
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op_str = match self {
            UnaryOp::Neg => "neg",
            UnaryOp::BitNot => "bitnot",
            UnaryOp::Eqz => "eqz",
        };
        write!(f, "{}", op_str)
    }
}

/// An IR expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Integer constant; `bits` is the two's-complement bit pattern in the
    /// low bytes of the scalar width
    IntConstant { bits: u64, scalar_type: ScalarType },

    FloatConstant { value: f64, scalar_type: ScalarType },

    /// An address used as a value (always a `U32`)
    AddressOf(Address),

    MemoryLoad {
        address: Box<Expression>,
        scalar_type: ScalarType,
    },

    Binary {
        op: BinaryOp,
        scalar_type: ScalarType,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        scalar_type: ScalarType,
        operand: Box<Expression>,
    },

    /// Explicit scalar conversion, so the emitter never re-derives one
    Convert {
        from: ScalarType,
        to: ScalarType,
        operand: Box<Expression>,
    },

    /// Value selection with only the taken branch evaluated
    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
        scalar_type: ScalarType,
    },

    /// Statements executed before the value is produced
    PreStatements {
        statements: Vec<Statement>,
        expr: Box<Expression>,
    },

    /// Statements executed after the value is captured
    PostStatements {
        expr: Box<Expression>,
        statements: Vec<Statement>,
    },
}

impl Expression {
    /// Integer constant truncated to the scalar width
    pub fn int_const(value: i128, scalar_type: ScalarType) -> Self {
        let bits = scalar_type.size_in_bytes() * 8;
        let mask: u128 = if bits == 64 {
            u128::from(u64::MAX)
        } else {
            (1u128 << bits) - 1
        };
        Expression::IntConstant {
            bits: ((value as u128) & mask) as u64,
            scalar_type,
        }
    }

    /// Float constant, rounded to `f32` when the scalar type is `F32`
    pub fn float_const(value: f64, scalar_type: ScalarType) -> Self {
        let value = if scalar_type == ScalarType::F32 {
            f64::from(value as f32)
        } else {
            value
        };
        Expression::FloatConstant { value, scalar_type }
    }

    /// The scalar type this expression evaluates to
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Expression::IntConstant { scalar_type, .. }
            | Expression::FloatConstant { scalar_type, .. }
            | Expression::MemoryLoad { scalar_type, .. }
            | Expression::Unary { scalar_type, .. }
            | Expression::Conditional { scalar_type, .. } => *scalar_type,
            Expression::AddressOf(_) => ScalarType::U32,
            Expression::Binary {
                op, scalar_type, ..
            } => {
                if op.is_comparison() {
                    ScalarType::I32
                } else {
                    *scalar_type
                }
            }
            Expression::Convert { to, .. } => *to,
            Expression::PreStatements { expr, .. } | Expression::PostStatements { expr, .. } => {
                expr.scalar_type()
            }
        }
    }

    /// Signed reading of an integer constant, sign-extended from its width
    pub fn signed_value(bits: u64, scalar_type: ScalarType) -> i64 {
        let width = scalar_type.size_in_bytes() * 8;
        if width == 64 {
            bits as i64
        } else {
            let shift = 64 - width;
            ((bits << shift) as i64) >> shift
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::IntConstant { bits, scalar_type } => {
                if scalar_type.is_signed() {
                    write!(
                        f,
                        "const.{} {}",
                        scalar_type,
                        Expression::signed_value(*bits, *scalar_type)
                    )
                } else {
                    write!(f, "const.{} {}", scalar_type, bits)
                }
            }
            Expression::FloatConstant { value, scalar_type } => {
                write!(f, "const.{} {}", scalar_type, value)
            }
            Expression::AddressOf(address) => write!(f, "{}", address),
            Expression::MemoryLoad {
                address,
                scalar_type,
            } => write!(f, "load.{} ({})", scalar_type, address),
            Expression::Binary {
                op,
                scalar_type,
                lhs,
                rhs,
            } => write!(f, "({}.{} {}, {})", op, scalar_type, lhs, rhs),
            Expression::Unary {
                op,
                scalar_type,
                operand,
            } => write!(f, "({}.{} {})", op, scalar_type, operand),
            Expression::Convert { from, to, operand } => {
                write!(f, "(convert.{}.{} {})", from, to, operand)
            }
            Expression::Conditional {
                condition,
                then_expr,
                else_expr,
                ..
            } => write!(f, "({} ? {} : {})", condition, then_expr, else_expr),
            Expression::PreStatements { statements, expr } => {
                write!(f, "(do [")?;
                for (i, stmt) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", stmt)?;
                }
                write!(f, "] then {})", expr)
            }
            Expression::PostStatements { expr, statements } => {
                write!(f, "({} before [", expr)?;
                for (i, stmt) in statements.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    write!(f, "{}", stmt)?;
                }
                write!(f, "])")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_const_truncates_to_width() {
        // -10 as unsigned int keeps only the low 32 bits
        let e = Expression::int_const(-10, ScalarType::U32);
        assert_eq!(
            e,
            Expression::IntConstant {
                bits: 0xffff_fff6,
                scalar_type: ScalarType::U32
            }
        );

        // 2^32 as signed long survives intact
        let e = Expression::int_const(4_294_967_296, ScalarType::I64);
        assert_eq!(
            e,
            Expression::IntConstant {
                bits: 1 << 32,
                scalar_type: ScalarType::I64
            }
        );
    }

    #[test]
    fn test_signed_value_sign_extends() {
        assert_eq!(Expression::signed_value(0xff, ScalarType::I8), -1);
        assert_eq!(Expression::signed_value(0x7f, ScalarType::I8), 127);
        assert_eq!(Expression::signed_value(0xffff_fff6, ScalarType::I32), -10);
    }

    #[test]
    fn test_float_const_rounds_f32() {
        let e = Expression::float_const(1.1, ScalarType::F32);
        match e {
            Expression::FloatConstant { value, .. } => assert_eq!(value, f64::from(1.1f32)),
            _ => panic!("expected float constant"),
        }
    }

    #[test]
    fn test_scalar_type_of_comparison_is_i32() {
        let cmp = Expression::Binary {
            op: BinaryOp::Lt,
            scalar_type: ScalarType::F64,
            lhs: Box::new(Expression::float_const(1.0, ScalarType::F64)),
            rhs: Box::new(Expression::float_const(2.0, ScalarType::F64)),
        };
        assert_eq!(cmp.scalar_type(), ScalarType::I32);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Expression::int_const(-10, ScalarType::I32).to_string(),
            "const.i32 -10"
        );
        assert_eq!(
            Expression::int_const(-10, ScalarType::U32).to_string(),
            "const.u32 4294967286"
        );
        assert_eq!(
            Expression::MemoryLoad {
                address: Box::new(Expression::AddressOf(Address::Local { offset: -8 })),
                scalar_type: ScalarType::I32,
            }
            .to_string(),
            "load.i32 (local[-8])"
        );
    }
}
