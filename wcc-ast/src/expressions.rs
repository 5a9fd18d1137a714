//! Expression nodes
//!
//! Every operator form the parser recognizes. Expressions carry the source
//! span they were parsed from; the processor attaches it to diagnostics.

use crate::ops::{BinaryOp, UnaryOp};
use crate::types::DataType;
use serde::{Deserialize, Serialize};
use wcc_common::SourceSpan;

/// Suffix attached to an integer literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IntegerSuffix {
    None,
    Unsigned,
    Long,
    UnsignedLong,
}

/// An expression with its source span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub kind: ExpressionKind,
    pub span: SourceSpan,
}

/// Expression node kinds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ExpressionKind {
    /// Integer literal; `is_decimal` distinguishes decimal from hex/octal
    /// spellings for C17 constant typing
    IntegerConstant {
        value: i128,
        is_decimal: bool,
        suffix: IntegerSuffix,
    },

    /// Floating literal; `is_float` is set by the `f` suffix
    FloatConstant { value: f64, is_float: bool },

    /// Character literal, already reduced to its numeric value
    CharConstant(u8),

    /// String literal without the closing NUL
    StringLiteral(String),

    Identifier(String),

    Binary {
        op: BinaryOp,
        lhs: Box<Expression>,
        rhs: Box<Expression>,
    },

    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },

    /// Simple (`op: None`) or compound assignment
    Assignment {
        target: Box<Expression>,
        op: Option<BinaryOp>,
        value: Box<Expression>,
    },

    Conditional {
        condition: Box<Expression>,
        then_expr: Box<Expression>,
        else_expr: Box<Expression>,
    },

    FunctionCall {
        callee: Box<Expression>,
        arguments: Vec<Expression>,
    },

    /// `object.field`
    Member {
        object: Box<Expression>,
        field: String,
    },

    /// `object->field`
    Arrow {
        object: Box<Expression>,
        field: String,
    },

    /// `object[index]`
    Subscript {
        object: Box<Expression>,
        index: Box<Expression>,
    },

    Dereference(Box<Expression>),
    AddressOf(Box<Expression>),

    PreIncrement(Box<Expression>),
    PreDecrement(Box<Expression>),
    PostIncrement(Box<Expression>),
    PostDecrement(Box<Expression>),

    Cast {
        target: DataType,
        operand: Box<Expression>,
    },

    SizeofType(DataType),
    SizeofExpression(Box<Expression>),

    /// `left, right` - left is evaluated for effect, right is the value
    Comma {
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn new(kind: ExpressionKind, span: SourceSpan) -> Self {
        Self { kind, span }
    }

    /// A decimal integer literal with a dummy span, for synthesized nodes
    pub fn int_const(value: i128) -> Self {
        Self::new(
            ExpressionKind::IntegerConstant {
                value,
                is_decimal: true,
                suffix: IntegerSuffix::None,
            },
            SourceSpan::dummy(),
        )
    }

    /// An identifier reference with a dummy span
    pub fn ident(name: &str) -> Self {
        Self::new(
            ExpressionKind::Identifier(name.to_string()),
            SourceSpan::dummy(),
        )
    }

    /// The literal value, if this node is an integer constant
    pub fn as_integer_constant(&self) -> Option<i128> {
        match &self.kind {
            ExpressionKind::IntegerConstant { value, .. } => Some(*value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_const_helper() {
        let e = Expression::int_const(42);
        assert_eq!(e.as_integer_constant(), Some(42));
        assert!(matches!(
            e.kind,
            ExpressionKind::IntegerConstant {
                is_decimal: true,
                suffix: IntegerSuffix::None,
                ..
            }
        ));
    }

    #[test]
    fn test_as_integer_constant_rejects_other_kinds() {
        assert_eq!(Expression::ident("x").as_integer_constant(), None);

        let sum = Expression::new(
            ExpressionKind::Binary {
                op: BinaryOp::Add,
                lhs: Box::new(Expression::int_const(1)),
                rhs: Box::new(Expression::int_const(2)),
            },
            SourceSpan::dummy(),
        );
        assert_eq!(sum.as_integer_constant(), None);
    }
}
