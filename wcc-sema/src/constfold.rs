//! Compile-time expression evaluation
//!
//! Folds constant expressions over integers, floats, and data-segment
//! addresses. Used for array lengths, enum member values, case labels,
//! null-pointer-constant detection, and data-segment initializers. Integer
//! arithmetic wraps per the two's-complement width of the result type.
//!
//! Type resolution lives here too: folding an array length and resolving a
//! tag reference are mutually recursive, so the evaluator is the natural
//! owner of both.

use crate::errors::ProcessingError;
use crate::symbols::{SymbolEntry, SymbolTable};
use crate::types;
use wcc_ast::{
    BinaryOp, DataType, Expression, ExpressionKind, IntegerSuffix, PrimaryType, UnaryOp,
};

/// A folded constant
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Int { value: i128, primary: PrimaryType },
    Float { value: f64, primary: PrimaryType },
    /// The address of a data-segment object, treated as an opaque pointer
    DataAddress { offset: u32, data_type: DataType },
}

impl Constant {
    pub fn data_type(&self) -> DataType {
        match self {
            Constant::Int { primary, .. } | Constant::Float { primary, .. } => {
                DataType::primary(*primary)
            }
            Constant::DataAddress { data_type, .. } => data_type.clone(),
        }
    }

    /// An integer constant expression with value zero
    pub fn is_null_pointer_constant(&self) -> bool {
        matches!(self, Constant::Int { value: 0, primary } if primary.is_integer())
    }

    fn is_truthy(&self) -> bool {
        match self {
            Constant::Int { value, .. } => *value != 0,
            Constant::Float { value, .. } => *value != 0.0,
            Constant::DataAddress { offset, .. } => *offset != 0,
        }
    }
}

/// Reduce `value` to the representable range of `primary`, two's complement
pub fn wrap_integer(value: i128, primary: PrimaryType) -> i128 {
    let width = primary.size_in_bytes() * 8;
    let mask: u128 = if width == 64 {
        u128::from(u64::MAX)
    } else {
        (1u128 << width) - 1
    };
    let raw = (value as u128) & mask;
    if primary.is_signed() {
        let sign_bit = 1u128 << (width - 1);
        if raw & sign_bit != 0 {
            (raw as i128) - ((mask as i128) + 1)
        } else {
            raw as i128
        }
    } else {
        raw as i128
    }
}

/// The C17 type of an integer literal: the first of int, (unsigned int,)
/// long, unsigned long that can represent the value. Hex and octal
/// spellings admit the unsigned types; decimal without a `u` suffix does
/// not.
pub fn type_of_integer_literal(
    value: i128,
    is_decimal: bool,
    suffix: IntegerSuffix,
) -> PrimaryType {
    let fits_int = value <= i128::from(i32::MAX);
    let fits_uint = value <= i128::from(u32::MAX);
    let fits_long = value <= i128::from(i64::MAX);
    match suffix {
        IntegerSuffix::None => {
            if fits_int {
                PrimaryType::SignedInt
            } else if !is_decimal && fits_uint {
                PrimaryType::UnsignedInt
            } else if fits_long {
                PrimaryType::SignedLong
            } else {
                PrimaryType::UnsignedLong
            }
        }
        IntegerSuffix::Unsigned => {
            if fits_uint {
                PrimaryType::UnsignedInt
            } else {
                PrimaryType::UnsignedLong
            }
        }
        IntegerSuffix::Long => {
            if fits_long {
                PrimaryType::SignedLong
            } else {
                PrimaryType::UnsignedLong
            }
        }
        IntegerSuffix::UnsignedLong => PrimaryType::UnsignedLong,
    }
}

/// The compile-time evaluator. Holds the symbol table mutably: string
/// literals inside constant initializers are interned into the data
/// segment as they are encountered.
pub struct Evaluator<'a> {
    symbols: &'a mut SymbolTable,
}

impl<'a> Evaluator<'a> {
    pub fn new(symbols: &'a mut SymbolTable) -> Self {
        Self { symbols }
    }

    /// Fold `expr` or fail with "expression is not a compile-time constant"
    pub fn evaluate(&mut self, expr: &Expression) -> Result<Constant, ProcessingError> {
        match &expr.kind {
            ExpressionKind::IntegerConstant {
                value,
                is_decimal,
                suffix,
            } => {
                let primary = type_of_integer_literal(*value, *is_decimal, *suffix);
                Ok(Constant::Int {
                    value: wrap_integer(*value, primary),
                    primary,
                })
            }
            ExpressionKind::FloatConstant { value, is_float } => {
                if *is_float {
                    Ok(Constant::Float {
                        value: f64::from(*value as f32),
                        primary: PrimaryType::Float,
                    })
                } else {
                    Ok(Constant::Float {
                        value: *value,
                        primary: PrimaryType::Double,
                    })
                }
            }
            ExpressionKind::CharConstant(byte) => Ok(Constant::Int {
                value: i128::from(*byte),
                primary: PrimaryType::SignedInt,
            }),
            ExpressionKind::StringLiteral(text) => {
                let offset = self.intern_string(text);
                Ok(Constant::DataAddress {
                    offset,
                    data_type: DataType::pointer_to(DataType::primary(PrimaryType::SignedChar)),
                })
            }
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(SymbolEntry::Enumerator { value }) => Ok(Constant::Int {
                    value: *value,
                    primary: PrimaryType::SignedInt,
                }),
                Some(SymbolEntry::DataVariable { data_type, offset })
                    if matches!(data_type, DataType::Array { .. }) =>
                {
                    // An array name decays to the address of its first element
                    let element = match data_type {
                        DataType::Array { element, .. } => (**element).clone(),
                        _ => unreachable!(),
                    };
                    Ok(Constant::DataAddress {
                        offset: *offset,
                        data_type: DataType::pointer_to(element),
                    })
                }
                _ => Err(ProcessingError::NotCompileTimeConstant),
            },
            ExpressionKind::AddressOf(inner) => {
                let (offset, object_type) = self.evaluate_address(inner)?;
                Ok(Constant::DataAddress {
                    offset,
                    data_type: DataType::pointer_to(object_type),
                })
            }
            ExpressionKind::Unary { op, operand } => {
                let value = self.evaluate(operand)?;
                self.apply_unary(*op, value)
            }
            ExpressionKind::Binary { op, lhs, rhs } => self.apply_binary(*op, lhs, rhs),
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => {
                let condition = self.evaluate(condition)?;
                if condition.is_truthy() {
                    self.evaluate(then_expr)
                } else {
                    self.evaluate(else_expr)
                }
            }
            ExpressionKind::Cast { target, operand } => {
                let target = self.resolve_type(target)?;
                let value = self.evaluate(operand)?;
                self.apply_cast(&target, value)
            }
            ExpressionKind::SizeofType(data_type) => {
                let resolved = self.resolve_type(data_type).map_err(|err| match err {
                    ProcessingError::IncompleteType { .. } => ProcessingError::SizeofIncomplete,
                    other => other,
                })?;
                if resolved.is_function() {
                    return Err(ProcessingError::SizeofFunction);
                }
                Ok(Constant::Int {
                    value: i128::from(types::size_of(&resolved)?),
                    primary: PrimaryType::UnsignedLong,
                })
            }
            ExpressionKind::SizeofExpression(operand) => {
                let data_type = self.type_of_constant_operand(operand)?;
                if data_type.is_function() {
                    return Err(ProcessingError::SizeofFunction);
                }
                Ok(Constant::Int {
                    value: i128::from(types::size_of(&data_type)?),
                    primary: PrimaryType::UnsignedLong,
                })
            }
            _ => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    /// Fold to an integer, rejecting floats and addresses
    pub fn evaluate_integer(
        &mut self,
        expr: &Expression,
    ) -> Result<(i128, PrimaryType), ProcessingError> {
        match self.evaluate(expr)? {
            Constant::Int { value, primary } => Ok((value, primary)),
            _ => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    /// Whether `expr` is an integer constant expression with value zero
    pub fn is_null_pointer_constant(&mut self, expr: &Expression) -> bool {
        self.evaluate(expr)
            .map(|constant| constant.is_null_pointer_constant())
            .unwrap_or(false)
    }

    /// Append a NUL-terminated string to the data segment
    pub fn intern_string(&mut self, text: &str) -> u32 {
        let mut bytes = text.as_bytes().to_vec();
        bytes.push(0);
        self.symbols.allocate_data(&bytes)
    }

    /// Resolve a parsed type for processing: look up tag references and
    /// typedefs, fold array lengths to literals, and validate struct
    /// bodies. The result is safe for every query in [`crate::types`].
    pub fn resolve_type(&mut self, data_type: &DataType) -> Result<DataType, ProcessingError> {
        match data_type {
            DataType::Primary { .. } | DataType::Void | DataType::StructSelfPointer => {
                Ok(data_type.clone())
            }
            DataType::Named(name) => match self.symbols.lookup(name) {
                Some(SymbolEntry::Typedef { data_type }) => {
                    let aliased = data_type.clone();
                    self.resolve_type(&aliased)
                }
                _ => Err(ProcessingError::Undeclared { name: name.clone() }),
            },
            DataType::Pointer { pointee, is_const } => Ok(DataType::Pointer {
                pointee: Box::new(self.resolve_type(pointee)?),
                is_const: *is_const,
            }),
            DataType::Array {
                element,
                length,
                is_const,
            } => {
                let element = self.resolve_type(element)?;
                let count = match self.evaluate_integer(length) {
                    Ok((value, _)) => value,
                    Err(_) => return Err(ProcessingError::VariableLengthArray),
                };
                if count < 0 {
                    return Err(ProcessingError::NegativeArraySize);
                }
                let count =
                    u32::try_from(count).map_err(|_| ProcessingError::VariableLengthArray)?;
                Ok(DataType::Array {
                    element: Box::new(element),
                    length: Box::new(Expression::int_const(i128::from(count))),
                    is_const: *is_const,
                })
            }
            DataType::Struct {
                tag,
                fields: Some(fields),
            } => {
                if fields.is_empty() {
                    return Err(ProcessingError::StructNoMembers);
                }
                let mut resolved = Vec::with_capacity(fields.len());
                for field in fields {
                    resolved.push(wcc_ast::StructField {
                        name: field.name.clone(),
                        data_type: self.resolve_type(&field.data_type)?,
                    });
                }
                Ok(DataType::Struct {
                    tag: tag.clone(),
                    fields: Some(resolved),
                })
            }
            DataType::Struct { tag, fields: None } => {
                let name = tag.clone().unwrap_or_else(|| "<anonymous>".to_string());
                match tag.as_ref().and_then(|t| self.symbols.lookup_tag(t)) {
                    Some(found @ DataType::Struct { .. }) => Ok(found.clone()),
                    _ => Err(ProcessingError::IncompleteType { name }),
                }
            }
            DataType::Enum {
                members: Some(_), ..
            } => Ok(data_type.clone()),
            DataType::Enum { tag, members: None } => {
                let name = tag.clone().unwrap_or_else(|| "<anonymous>".to_string());
                match tag.as_ref().and_then(|t| self.symbols.lookup_tag(t)) {
                    Some(found @ DataType::Enum { .. }) => Ok(found.clone()),
                    _ => Err(ProcessingError::IncompleteType { name }),
                }
            }
            DataType::Function {
                return_type,
                parameters,
            } => {
                let return_type = self.resolve_type(return_type)?;
                let parameters = parameters
                    .iter()
                    .map(|p| self.resolve_type(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DataType::Function {
                    return_type: Box::new(return_type),
                    parameters,
                })
            }
        }
    }

    /// The address of a constant-addressable object: a data-segment
    /// variable, or a member/element of one reached by constant steps
    fn evaluate_address(&mut self, expr: &Expression) -> Result<(u32, DataType), ProcessingError> {
        match &expr.kind {
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(SymbolEntry::DataVariable { data_type, offset }) => {
                    Ok((*offset, data_type.clone()))
                }
                Some(_) => Err(ProcessingError::NotCompileTimeConstant),
                None => Err(ProcessingError::Undeclared { name: name.clone() }),
            },
            ExpressionKind::Subscript { object, index } => {
                let (base, object_type) = self.evaluate_address(object)?;
                let element = match &object_type {
                    DataType::Array { element, .. } => (**element).clone(),
                    _ => return Err(ProcessingError::NotCompileTimeConstant),
                };
                let (index, _) = self.evaluate_integer(index)?;
                let index = u32::try_from(index)
                    .map_err(|_| ProcessingError::NotCompileTimeConstant)?;
                Ok((base + index * types::size_of(&element)?, element))
            }
            ExpressionKind::Member { object, field } => {
                let (base, object_type) = self.evaluate_address(object)?;
                let fields = match &object_type {
                    DataType::Struct {
                        fields: Some(fields),
                        ..
                    } => fields.clone(),
                    _ => return Err(ProcessingError::NotCompileTimeConstant),
                };
                match types::field_offset(&fields, field)? {
                    Some((offset, field_type)) => Ok((base + offset, field_type)),
                    None => Err(ProcessingError::NotCompileTimeConstant),
                }
            }
            ExpressionKind::Dereference(inner) => match self.evaluate(inner)? {
                Constant::DataAddress { offset, data_type } => match data_type {
                    DataType::Pointer { pointee, .. } => Ok((offset, *pointee)),
                    _ => Err(ProcessingError::NotCompileTimeConstant),
                },
                _ => Err(ProcessingError::NotCompileTimeConstant),
            },
            _ => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    /// The declared type of a sizeof operand, without evaluating it
    fn type_of_constant_operand(
        &mut self,
        expr: &Expression,
    ) -> Result<DataType, ProcessingError> {
        match &expr.kind {
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name) {
                Some(entry) => {
                    let declared = entry.data_type();
                    self.resolve_type(&declared)
                }
                None => Err(ProcessingError::Undeclared { name: name.clone() }),
            },
            ExpressionKind::StringLiteral(text) => Ok(DataType::array_of(
                DataType::primary(PrimaryType::SignedChar),
                text.len() as u32 + 1,
            )),
            _ => Ok(self.evaluate(expr)?.data_type()),
        }
    }

    fn apply_unary(&mut self, op: UnaryOp, value: Constant) -> Result<Constant, ProcessingError> {
        match (op, value) {
            (UnaryOp::Plus, Constant::Int { value, primary }) if primary.is_integer() => {
                let promoted = types::promote(primary);
                Ok(Constant::Int {
                    value: wrap_integer(value, promoted),
                    primary: promoted,
                })
            }
            (UnaryOp::Plus, constant @ Constant::Float { .. }) => Ok(constant),
            (UnaryOp::Minus, Constant::Int { value, primary }) if primary.is_integer() => {
                let promoted = types::promote(primary);
                Ok(Constant::Int {
                    value: wrap_integer(value.wrapping_neg(), promoted),
                    primary: promoted,
                })
            }
            (UnaryOp::Minus, Constant::Float { value, primary }) => Ok(Constant::Float {
                value: -value,
                primary,
            }),
            (UnaryOp::BitNot, Constant::Int { value, primary }) if primary.is_integer() => {
                let promoted = types::promote(primary);
                Ok(Constant::Int {
                    value: wrap_integer(!value, promoted),
                    primary: promoted,
                })
            }
            (UnaryOp::LogicalNot, value) => Ok(Constant::Int {
                value: i128::from(!value.is_truthy()),
                primary: PrimaryType::SignedInt,
            }),
            _ => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    fn apply_binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expression,
        rhs: &Expression,
    ) -> Result<Constant, ProcessingError> {
        // Logical operators short-circuit: the unreached side need not be
        // (or even be able to be) folded
        if op == BinaryOp::LogicalAnd {
            let lhs = self.evaluate(lhs)?;
            let truth = if !lhs.is_truthy() {
                false
            } else {
                self.evaluate(rhs)?.is_truthy()
            };
            return Ok(Constant::Int {
                value: i128::from(truth),
                primary: PrimaryType::SignedInt,
            });
        }
        if op == BinaryOp::LogicalOr {
            let lhs = self.evaluate(lhs)?;
            let truth = if lhs.is_truthy() {
                true
            } else {
                self.evaluate(rhs)?.is_truthy()
            };
            return Ok(Constant::Int {
                value: i128::from(truth),
                primary: PrimaryType::SignedInt,
            });
        }

        let lhs = self.evaluate(lhs)?;
        let rhs = self.evaluate(rhs)?;

        // Opaque pointer constants: comparison and element-scaled offsets
        match (&lhs, &rhs) {
            (
                Constant::DataAddress { offset: a, .. },
                Constant::DataAddress { offset: b, .. },
            ) => return self.fold_address_pair(op, lhs.clone(), *a, *b),
            (Constant::DataAddress { .. }, Constant::Int { .. })
            | (Constant::Int { .. }, Constant::DataAddress { .. }) => {
                return self.fold_address_offset(op, lhs, rhs)
            }
            _ => {}
        }

        if matches!(op, BinaryOp::LeftShift | BinaryOp::RightShift) {
            return self.fold_shift(op, lhs, rhs);
        }

        let (a, b) = (self.as_primary(&lhs)?, self.as_primary(&rhs)?);
        let common = types::usual_arithmetic_conversion(a, b);
        if common.is_float() {
            let x = self.to_f64(&lhs);
            let y = self.to_f64(&rhs);
            return self.fold_float(op, x, y, common);
        }
        let x = wrap_integer(self.to_i128(&lhs), common);
        let y = wrap_integer(self.to_i128(&rhs), common);
        self.fold_int(op, x, y, common)
    }

    fn fold_int(
        &self,
        op: BinaryOp,
        x: i128,
        y: i128,
        common: PrimaryType,
    ) -> Result<Constant, ProcessingError> {
        let value = match op {
            BinaryOp::Add => x.wrapping_add(y),
            BinaryOp::Sub => x.wrapping_sub(y),
            BinaryOp::Mul => x.wrapping_mul(y),
            BinaryOp::Div => {
                if y == 0 {
                    return Err(ProcessingError::ConstantDivisionByZero);
                }
                x.wrapping_div(y)
            }
            BinaryOp::Mod => {
                if y == 0 {
                    return Err(ProcessingError::ConstantDivisionByZero);
                }
                x.wrapping_rem(y)
            }
            BinaryOp::BitAnd => x & y,
            BinaryOp::BitOr => x | y,
            BinaryOp::BitXor => x ^ y,
            comparison => {
                let truth = match comparison {
                    BinaryOp::Equal => x == y,
                    BinaryOp::NotEqual => x != y,
                    BinaryOp::Less => x < y,
                    BinaryOp::Greater => x > y,
                    BinaryOp::LessEqual => x <= y,
                    BinaryOp::GreaterEqual => x >= y,
                    _ => return Err(ProcessingError::NotCompileTimeConstant),
                };
                return Ok(Constant::Int {
                    value: i128::from(truth),
                    primary: PrimaryType::SignedInt,
                });
            }
        };
        Ok(Constant::Int {
            value: wrap_integer(value, common),
            primary: common,
        })
    }

    fn fold_float(
        &self,
        op: BinaryOp,
        x: f64,
        y: f64,
        common: PrimaryType,
    ) -> Result<Constant, ProcessingError> {
        let round = |v: f64| {
            if common == PrimaryType::Float {
                f64::from(v as f32)
            } else {
                v
            }
        };
        let value = match op {
            BinaryOp::Add => round(x + y),
            BinaryOp::Sub => round(x - y),
            BinaryOp::Mul => round(x * y),
            BinaryOp::Div => {
                if y == 0.0 {
                    return Err(ProcessingError::ConstantDivisionByZero);
                }
                round(x / y)
            }
            comparison => {
                let truth = match comparison {
                    BinaryOp::Equal => x == y,
                    BinaryOp::NotEqual => x != y,
                    BinaryOp::Less => x < y,
                    BinaryOp::Greater => x > y,
                    BinaryOp::LessEqual => x <= y,
                    BinaryOp::GreaterEqual => x >= y,
                    _ => return Err(ProcessingError::NotCompileTimeConstant),
                };
                return Ok(Constant::Int {
                    value: i128::from(truth),
                    primary: PrimaryType::SignedInt,
                });
            }
        };
        Ok(Constant::Float {
            value,
            primary: common,
        })
    }

    fn fold_shift(
        &self,
        op: BinaryOp,
        lhs: Constant,
        rhs: Constant,
    ) -> Result<Constant, ProcessingError> {
        let (Constant::Int { value: x, primary: a }, Constant::Int { value: y, .. }) = (&lhs, &rhs)
        else {
            return Err(ProcessingError::NotCompileTimeConstant);
        };
        if !a.is_integer() {
            return Err(ProcessingError::NotCompileTimeConstant);
        }
        // Each operand promotes on its own; the result takes the left type
        let result = types::promote(*a);
        let x = wrap_integer(*x, result);
        let shift = (*y as u32) & 63;
        let value = match op {
            BinaryOp::LeftShift => x.wrapping_shl(shift),
            _ => x.wrapping_shr(shift),
        };
        Ok(Constant::Int {
            value: wrap_integer(value, result),
            primary: result,
        })
    }

    fn fold_address_pair(
        &self,
        op: BinaryOp,
        lhs: Constant,
        a: u32,
        b: u32,
    ) -> Result<Constant, ProcessingError> {
        if op == BinaryOp::Sub {
            let Constant::DataAddress { data_type, .. } = &lhs else {
                unreachable!()
            };
            let element = match data_type {
                DataType::Pointer { pointee, .. } => (**pointee).clone(),
                _ => return Err(ProcessingError::NotCompileTimeConstant),
            };
            let stride = i128::from(types::size_of(&element)?);
            return Ok(Constant::Int {
                value: (i128::from(a) - i128::from(b)) / stride,
                primary: PrimaryType::SignedLong,
            });
        }
        let truth = match op {
            BinaryOp::Equal => a == b,
            BinaryOp::NotEqual => a != b,
            BinaryOp::Less => a < b,
            BinaryOp::Greater => a > b,
            BinaryOp::LessEqual => a <= b,
            BinaryOp::GreaterEqual => a >= b,
            _ => return Err(ProcessingError::NotCompileTimeConstant),
        };
        Ok(Constant::Int {
            value: i128::from(truth),
            primary: PrimaryType::SignedInt,
        })
    }

    fn fold_address_offset(
        &self,
        op: BinaryOp,
        lhs: Constant,
        rhs: Constant,
    ) -> Result<Constant, ProcessingError> {
        let (address, index, index_on_left) = match (&lhs, &rhs) {
            (Constant::DataAddress { .. }, Constant::Int { value, .. }) => {
                (lhs.clone(), *value, false)
            }
            (Constant::Int { value, .. }, Constant::DataAddress { .. }) => {
                (rhs.clone(), *value, true)
            }
            _ => return Err(ProcessingError::NotCompileTimeConstant),
        };
        let Constant::DataAddress { offset, data_type } = address else {
            unreachable!()
        };
        let element = match &data_type {
            DataType::Pointer { pointee, .. } => (**pointee).clone(),
            _ => return Err(ProcessingError::NotCompileTimeConstant),
        };
        let stride = i128::from(types::size_of(&element)?);
        let moved = match op {
            BinaryOp::Add => i128::from(offset) + index * stride,
            BinaryOp::Sub if !index_on_left => i128::from(offset) - index * stride,
            _ => return Err(ProcessingError::NotCompileTimeConstant),
        };
        let offset =
            u32::try_from(moved).map_err(|_| ProcessingError::NotCompileTimeConstant)?;
        Ok(Constant::DataAddress { offset, data_type })
    }

    fn apply_cast(
        &mut self,
        target: &DataType,
        value: Constant,
    ) -> Result<Constant, ProcessingError> {
        if !target.is_scalar() {
            return Err(ProcessingError::CastToNonScalar);
        }
        match target {
            DataType::Primary { primary, .. } if primary.is_integer() => {
                let raw = match value {
                    Constant::Int { value, .. } => value,
                    Constant::Float { value, .. } => value as i128,
                    Constant::DataAddress { offset, .. } => i128::from(offset),
                };
                Ok(Constant::Int {
                    value: wrap_integer(raw, *primary),
                    primary: *primary,
                })
            }
            DataType::Primary { primary, .. } => {
                let raw = match value {
                    Constant::Int { value, .. } => value as f64,
                    Constant::Float { value, .. } => value,
                    Constant::DataAddress { .. } => {
                        return Err(ProcessingError::NotCompileTimeConstant)
                    }
                };
                let rounded = if *primary == PrimaryType::Float {
                    f64::from(raw as f32)
                } else {
                    raw
                };
                Ok(Constant::Float {
                    value: rounded,
                    primary: *primary,
                })
            }
            DataType::Enum { .. } => {
                let raw = match value {
                    Constant::Int { value, .. } => value,
                    Constant::Float { value, .. } => value as i128,
                    Constant::DataAddress { .. } => {
                        return Err(ProcessingError::NotCompileTimeConstant)
                    }
                };
                Ok(Constant::Int {
                    value: wrap_integer(raw, PrimaryType::SignedInt),
                    primary: PrimaryType::SignedInt,
                })
            }
            DataType::Pointer { .. } => match value {
                Constant::Int { value, .. } => Ok(Constant::DataAddress {
                    offset: wrap_integer(value, PrimaryType::UnsignedInt) as u32,
                    data_type: target.clone(),
                }),
                Constant::DataAddress { offset, .. } => Ok(Constant::DataAddress {
                    offset,
                    data_type: target.clone(),
                }),
                Constant::Float { .. } => Err(ProcessingError::NotCompileTimeConstant),
            },
            _ => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    fn as_primary(&self, constant: &Constant) -> Result<PrimaryType, ProcessingError> {
        match constant {
            Constant::Int { primary, .. } | Constant::Float { primary, .. } => Ok(*primary),
            Constant::DataAddress { .. } => Err(ProcessingError::NotCompileTimeConstant),
        }
    }

    fn to_i128(&self, constant: &Constant) -> i128 {
        match constant {
            Constant::Int { value, .. } => *value,
            Constant::Float { value, .. } => *value as i128,
            Constant::DataAddress { offset, .. } => i128::from(*offset),
        }
    }

    fn to_f64(&self, constant: &Constant) -> f64 {
        match constant {
            Constant::Int { value, .. } => *value as f64,
            Constant::Float { value, .. } => *value,
            Constant::DataAddress { offset, .. } => f64::from(*offset),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbols::SymbolTable;
    use wcc_common::SourceSpan;

    fn eval(expr: &Expression) -> Result<Constant, ProcessingError> {
        let mut symbols = SymbolTable::new();
        Evaluator::new(&mut symbols).evaluate(expr)
    }

    fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
        Expression::new(
            ExpressionKind::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
            SourceSpan::dummy(),
        )
    }

    fn unary(op: UnaryOp, operand: Expression) -> Expression {
        Expression::new(
            ExpressionKind::Unary {
                op,
                operand: Box::new(operand),
            },
            SourceSpan::dummy(),
        )
    }

    #[test]
    fn test_integer_literal_typing() {
        use PrimaryType::*;
        assert_eq!(
            type_of_integer_literal(10, true, IntegerSuffix::None),
            SignedInt
        );
        assert_eq!(
            type_of_integer_literal(i128::from(i32::MAX) + 1, true, IntegerSuffix::None),
            SignedLong
        );
        // Hex spellings admit unsigned int before long
        assert_eq!(
            type_of_integer_literal(i128::from(i32::MAX) + 1, false, IntegerSuffix::None),
            UnsignedInt
        );
        assert_eq!(
            type_of_integer_literal(i128::from(u64::MAX), true, IntegerSuffix::None),
            UnsignedLong
        );
        assert_eq!(
            type_of_integer_literal(1, true, IntegerSuffix::Unsigned),
            UnsignedInt
        );
    }

    #[test]
    fn test_wrap_integer() {
        assert_eq!(wrap_integer(-10, PrimaryType::UnsignedInt), 4_294_967_286);
        assert_eq!(wrap_integer(256, PrimaryType::UnsignedChar), 0);
        assert_eq!(wrap_integer(128, PrimaryType::SignedChar), -128);
        assert_eq!(wrap_integer(4_294_967_296, PrimaryType::SignedLong), 4_294_967_296);
    }

    #[test]
    fn test_arithmetic_folding() {
        let sum = binary(
            BinaryOp::Add,
            Expression::int_const(10),
            Expression::int_const(20),
        );
        assert_eq!(
            eval(&sum),
            Ok(Constant::Int {
                value: 30,
                primary: PrimaryType::SignedInt
            })
        );
    }

    #[test]
    fn test_overflow_wraps_to_result_width() {
        // INT_MAX + 1 wraps in signed int arithmetic
        let sum = binary(
            BinaryOp::Add,
            Expression::int_const(i128::from(i32::MAX)),
            Expression::int_const(1),
        );
        assert_eq!(
            eval(&sum),
            Ok(Constant::Int {
                value: i128::from(i32::MIN),
                primary: PrimaryType::SignedInt
            })
        );
    }

    #[test]
    fn test_division_by_zero_rejected() {
        for op in [BinaryOp::Div, BinaryOp::Mod] {
            let expr = binary(op, Expression::int_const(1), Expression::int_const(0));
            assert_eq!(eval(&expr), Err(ProcessingError::ConstantDivisionByZero));
        }
    }

    #[test]
    fn test_logical_short_circuit_skips_unfoldable_side() {
        // 0 && f() folds even though f() is not constant
        let call = Expression::new(
            ExpressionKind::FunctionCall {
                callee: Box::new(Expression::ident("f")),
                arguments: Vec::new(),
            },
            SourceSpan::dummy(),
        );
        let expr = binary(BinaryOp::LogicalAnd, Expression::int_const(0), call);
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: 0,
                primary: PrimaryType::SignedInt
            })
        );
    }

    #[test]
    fn test_conditional_picks_branch() {
        let expr = Expression::new(
            ExpressionKind::Conditional {
                condition: Box::new(Expression::int_const(1)),
                then_expr: Box::new(Expression::int_const(5)),
                else_expr: Box::new(Expression::ident("not_constant")),
            },
            SourceSpan::dummy(),
        );
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: 5,
                primary: PrimaryType::SignedInt
            })
        );
    }

    #[test]
    fn test_unary_folding() {
        let expr = unary(UnaryOp::Minus, Expression::int_const(12));
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: -12,
                primary: PrimaryType::SignedInt
            })
        );

        let expr = unary(UnaryOp::BitNot, Expression::int_const(0));
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: -1,
                primary: PrimaryType::SignedInt
            })
        );

        let expr = unary(UnaryOp::LogicalNot, Expression::int_const(3));
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: 0,
                primary: PrimaryType::SignedInt
            })
        );
    }

    #[test]
    fn test_cast_folding() {
        let expr = Expression::new(
            ExpressionKind::Cast {
                target: DataType::primary(PrimaryType::UnsignedChar),
                operand: Box::new(Expression::int_const(300)),
            },
            SourceSpan::dummy(),
        );
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: 44,
                primary: PrimaryType::UnsignedChar
            })
        );
    }

    #[test]
    fn test_sizeof_type() {
        let expr = Expression::new(
            ExpressionKind::SizeofType(DataType::array_of(
                DataType::primary(PrimaryType::SignedLong),
                5,
            )),
            SourceSpan::dummy(),
        );
        assert_eq!(
            eval(&expr),
            Ok(Constant::Int {
                value: 40,
                primary: PrimaryType::UnsignedLong
            })
        );
    }

    #[test]
    fn test_sizeof_function_type_rejected() {
        let expr = Expression::new(
            ExpressionKind::SizeofType(DataType::Function {
                return_type: Box::new(DataType::Void),
                parameters: Vec::new(),
            }),
            SourceSpan::dummy(),
        );
        assert_eq!(eval(&expr), Err(ProcessingError::SizeofFunction));
    }

    #[test]
    fn test_enumerator_reference() {
        let mut symbols = SymbolTable::new();
        symbols
            .declare("A", SymbolEntry::Enumerator { value: 7 })
            .unwrap();
        let constant = Evaluator::new(&mut symbols)
            .evaluate(&Expression::ident("A"))
            .unwrap();
        assert_eq!(
            constant,
            Constant::Int {
                value: 7,
                primary: PrimaryType::SignedInt
            }
        );
    }

    #[test]
    fn test_data_address_is_opaque_constant() {
        let mut symbols = SymbolTable::new();
        symbols.allocate_data(&[0; 16]);
        symbols
            .declare(
                "g",
                SymbolEntry::DataVariable {
                    data_type: DataType::primary(PrimaryType::SignedInt),
                    offset: 12,
                },
            )
            .unwrap();
        let expr = Expression::new(
            ExpressionKind::AddressOf(Box::new(Expression::ident("g"))),
            SourceSpan::dummy(),
        );
        let constant = Evaluator::new(&mut symbols).evaluate(&expr).unwrap();
        assert_eq!(
            constant,
            Constant::DataAddress {
                offset: 12,
                data_type: DataType::pointer_to(DataType::primary(PrimaryType::SignedInt)),
            }
        );
    }

    #[test]
    fn test_non_constant_rejected() {
        assert_eq!(
            eval(&Expression::ident("x")),
            Err(ProcessingError::NotCompileTimeConstant)
        );
    }

    #[test]
    fn test_null_pointer_constant_detection() {
        let mut symbols = SymbolTable::new();
        let mut evaluator = Evaluator::new(&mut symbols);
        assert!(evaluator.is_null_pointer_constant(&Expression::int_const(0)));
        let folded_zero = binary(
            BinaryOp::Sub,
            Expression::int_const(3),
            Expression::int_const(3),
        );
        assert!(evaluator.is_null_pointer_constant(&folded_zero));
        assert!(!evaluator.is_null_pointer_constant(&Expression::int_const(1)));
        assert!(!evaluator.is_null_pointer_constant(&Expression::ident("x")));
    }

    #[test]
    fn test_resolve_type_folds_array_length() {
        let mut symbols = SymbolTable::new();
        let unfolded = DataType::Array {
            element: Box::new(DataType::primary(PrimaryType::SignedInt)),
            length: Box::new(binary(
                BinaryOp::Mul,
                Expression::int_const(2),
                Expression::int_const(3),
            )),
            is_const: false,
        };
        let resolved = Evaluator::new(&mut symbols).resolve_type(&unfolded).unwrap();
        assert_eq!(resolved.folded_length(), Some(6));
    }

    #[test]
    fn test_resolve_type_rejects_vla() {
        let mut symbols = SymbolTable::new();
        let vla = DataType::Array {
            element: Box::new(DataType::primary(PrimaryType::SignedInt)),
            length: Box::new(Expression::ident("n")),
            is_const: false,
        };
        assert_eq!(
            Evaluator::new(&mut symbols).resolve_type(&vla),
            Err(ProcessingError::VariableLengthArray)
        );
    }

    #[test]
    fn test_resolve_tag_reference() {
        let mut symbols = SymbolTable::new();
        symbols
            .declare_tag(
                "node",
                DataType::Struct {
                    tag: Some("node".to_string()),
                    fields: Some(vec![wcc_ast::StructField {
                        name: "next".to_string(),
                        data_type: DataType::StructSelfPointer,
                    }]),
                },
            )
            .unwrap();
        let reference = DataType::Struct {
            tag: Some("node".to_string()),
            fields: None,
        };
        let resolved = Evaluator::new(&mut symbols).resolve_type(&reference).unwrap();
        assert!(matches!(resolved, DataType::Struct { fields: Some(f), .. } if f.len() == 1));

        let missing = DataType::Struct {
            tag: Some("ghost".to_string()),
            fields: None,
        };
        assert_eq!(
            Evaluator::new(&mut symbols).resolve_type(&missing),
            Err(ProcessingError::IncompleteType {
                name: "ghost".to_string()
            })
        );
    }
}
