//! Initializer unpacking
//!
//! One recursive walk over (type, initializer) drives both variants: local
//! objects become memory-store statements, data-segment objects become a
//! byte image. The walk follows brace structure with a cursor per list:
//! scalars consume one element (peeling redundant single-element braces),
//! aggregate sub-objects either recurse into a nested list with a fresh
//! cursor, consume a whole compatible aggregate value, or keep consuming at
//! the current level. Unmentioned trailing sub-objects are zeroed.

use crate::constfold::{wrap_integer, Constant, Evaluator};
use crate::errors::ProcessingError;
use crate::expressions::{addr_add, convert_scalar};
use crate::processor::Processor;
use crate::types;
use wcc_ast::{DataType, Expression, ExpressionKind, Initializer, PrimaryType};
use wcc_ir as ir;

/// Where unpacked scalars land
pub(crate) enum InitTarget<'a> {
    /// Stores relative to a local object's base address
    Local {
        base: ir::Expression,
        statements: &'a mut Vec<ir::Statement>,
    },
    /// A pre-zeroed byte image of the whole object; every scalar must be a
    /// compile-time constant
    Data { bytes: &'a mut Vec<u8> },
}

impl Processor {
    /// Unpack a local variable's initializer into store statements
    pub(crate) fn unpack_local_initializer(
        &mut self,
        data_type: &DataType,
        base: ir::Expression,
        initializer: &Initializer,
        statements: &mut Vec<ir::Statement>,
    ) -> Result<(), ProcessingError> {
        let mut target = InitTarget::Local { base, statements };
        self.unpack_value(data_type, initializer, &mut target, 0)
    }

    /// Produce the byte image of a data-segment object. A missing
    /// initializer yields all zeroes (tentative definition).
    pub(crate) fn unpack_data_initializer(
        &mut self,
        data_type: &DataType,
        initializer: Option<&Initializer>,
    ) -> Result<Vec<u8>, ProcessingError> {
        let size = types::size_of(data_type)? as usize;
        let mut bytes = vec![0u8; size];
        if let Some(initializer) = initializer {
            let mut target = InitTarget::Data { bytes: &mut bytes };
            self.unpack_value(data_type, initializer, &mut target, 0)?;
        }
        Ok(bytes)
    }

    /// Unpack one whole object from one initializer node
    fn unpack_value(
        &mut self,
        data_type: &DataType,
        initializer: &Initializer,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        match initializer {
            Initializer::Single(expr) => {
                if data_type.is_aggregate() {
                    self.consume_whole_aggregate(data_type, expr, target, offset)
                } else {
                    self.emit_scalar(data_type, expr, target, offset)
                }
            }
            Initializer::List(items) => {
                let mut cursor = 0;
                self.unpack_list(data_type, items, &mut cursor, target, offset)?;
                if cursor < items.len() {
                    return Err(ProcessingError::ExcessInitializers);
                }
                Ok(())
            }
        }
    }

    /// Unpack an object from the current position of a brace list
    fn unpack_list(
        &mut self,
        data_type: &DataType,
        items: &[Initializer],
        cursor: &mut usize,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        match data_type {
            scalar if scalar.is_scalar() => {
                if *cursor >= items.len() {
                    return self.emit_zero(scalar, target, offset);
                }
                let mut item = &items[*cursor];
                // Peel redundant single-element braces around a scalar
                loop {
                    match item {
                        Initializer::Single(expr) => {
                            self.emit_scalar(scalar, expr, target, offset)?;
                            break;
                        }
                        Initializer::List(sub) => {
                            if sub.is_empty() {
                                self.emit_zero(scalar, target, offset)?;
                                break;
                            }
                            if sub.len() > 1 {
                                return Err(ProcessingError::ExcessInitializers);
                            }
                            item = &sub[0];
                        }
                    }
                }
                *cursor += 1;
                Ok(())
            }
            DataType::Array { element, .. } => {
                let count = data_type
                    .folded_length()
                    .ok_or(ProcessingError::VariableLengthArray)?;
                let stride = types::size_of(element)?;
                for i in 0..count {
                    self.unpack_sub_object(element, items, cursor, target, offset + i * stride)?;
                }
                Ok(())
            }
            DataType::Struct {
                fields: Some(fields),
                ..
            } => {
                let enclosing = data_type.clone();
                let mut field_offset = offset;
                for field in fields.clone() {
                    let field_type = if field.data_type == DataType::StructSelfPointer {
                        DataType::pointer_to(enclosing.clone())
                    } else {
                        field.data_type.clone()
                    };
                    self.unpack_sub_object(&field_type, items, cursor, target, field_offset)?;
                    field_offset += types::size_of(&field.data_type)?;
                }
                Ok(())
            }
            other => Err(ProcessingError::internal(format!(
                "cannot unpack initializer against '{}'",
                other
            ))),
        }
    }

    /// Unpack one sub-object (array element or struct field) of an
    /// enclosing aggregate from its list
    fn unpack_sub_object(
        &mut self,
        element: &DataType,
        items: &[Initializer],
        cursor: &mut usize,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        if element.is_scalar() {
            return self.unpack_list(element, items, cursor, target, offset);
        }
        if *cursor >= items.len() {
            return self.emit_zero(element, target, offset);
        }
        match &items[*cursor] {
            Initializer::List(_) => {
                let item = items[*cursor].clone();
                self.unpack_value(element, &item, target, offset)?;
                *cursor += 1;
                Ok(())
            }
            Initializer::Single(expr) => {
                // A whole aggregate value of the right shape fills the
                // sub-object and consumes one slot; anything else feeds the
                // sub-object's scalars from the current level. String
                // literals are always scalar material here.
                let consumes_whole = !matches!(expr.kind, ExpressionKind::StringLiteral(_)) && {
                    let probed = self.process_value(expr)?;
                    probed.data_type.is_aggregate()
                        && types::is_compatible(element, &probed.data_type, true)
                };
                if consumes_whole {
                    let expr = expr.clone();
                    self.consume_whole_aggregate(element, &expr, target, offset)?;
                    *cursor += 1;
                    Ok(())
                } else {
                    self.unpack_list(element, items, cursor, target, offset)
                }
            }
        }
    }

    /// Initialize an aggregate object from a single expression of a
    /// compatible aggregate type, one store per unpacked scalar
    fn consume_whole_aggregate(
        &mut self,
        data_type: &DataType,
        expr: &Expression,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        let value = self.process_value(expr)?;
        if !value.data_type.is_aggregate()
            || !types::is_compatible(data_type, &value.data_type, true)
        {
            return Err(ProcessingError::IncompatibleInitializer {
                lhs: data_type.to_string(),
                rhs: value.data_type.to_string(),
            });
        }
        match target {
            InitTarget::Local { base, statements } => {
                let address = addr_add(base.clone(), offset);
                statements.extend(self.store_object(data_type, &address, value)?);
                Ok(())
            }
            // Aggregate values are runtime loads, never constants
            InitTarget::Data { .. } => Err(ProcessingError::NonConstantInitializer),
        }
    }

    /// Emit one scalar of the object
    fn emit_scalar(
        &mut self,
        data_type: &DataType,
        expr: &Expression,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        match target {
            InitTarget::Local { base, statements } => {
                let value = self.process_decayed(expr)?;
                let null = data_type.is_pointer()
                    && value.data_type.is_integer()
                    && self.is_null_constant(expr);
                if !types::can_assign(data_type, &value.data_type, null) {
                    return Err(ProcessingError::IncompatibleInitializer {
                        lhs: data_type.to_string(),
                        rhs: value.data_type.to_string(),
                    });
                }
                let scalar_type = types::scalar_type_of(data_type)?;
                let scalar = convert_scalar(value.into_scalar()?, scalar_type);
                statements.push(ir::Statement::MemoryStore {
                    address: addr_add(base.clone(), offset),
                    value: scalar,
                    scalar_type,
                });
                Ok(())
            }
            InitTarget::Data { bytes } => {
                let constant = Evaluator::new(&mut self.symbols)
                    .evaluate(expr)
                    .map_err(|err| match err {
                        ProcessingError::NotCompileTimeConstant => {
                            ProcessingError::NonConstantInitializer
                        }
                        other => other,
                    })?;
                let null = constant.is_null_pointer_constant();
                if !types::can_assign(data_type, &constant.data_type(), null) {
                    return Err(ProcessingError::IncompatibleInitializer {
                        lhs: data_type.to_string(),
                        rhs: constant.data_type().to_string(),
                    });
                }
                let encoded = encode_constant(&constant, data_type)?;
                let start = offset as usize;
                bytes[start..start + encoded.len()].copy_from_slice(&encoded);
                Ok(())
            }
        }
    }

    /// Zero an object: stores of zero for locals, nothing for the
    /// pre-zeroed data image
    fn emit_zero(
        &mut self,
        data_type: &DataType,
        target: &mut InitTarget<'_>,
        offset: u32,
    ) -> Result<(), ProcessingError> {
        match target {
            InitTarget::Data { .. } => Ok(()),
            InitTarget::Local { base, statements } => {
                for (field_offset, scalar_type) in types::unpack(data_type)? {
                    let zero = if scalar_type.is_float() {
                        ir::Expression::float_const(0.0, scalar_type)
                    } else {
                        ir::Expression::int_const(0, scalar_type)
                    };
                    statements.push(ir::Statement::MemoryStore {
                        address: addr_add(base.clone(), offset + field_offset),
                        value: zero,
                        scalar_type,
                    });
                }
                Ok(())
            }
        }
    }
}

/// Little-endian encoding of one constant scalar as the target type
fn encode_constant(
    constant: &Constant,
    target: &DataType,
) -> Result<Vec<u8>, ProcessingError> {
    match target {
        DataType::Primary { primary, .. } if primary.is_integer() => {
            let raw = match constant {
                Constant::Int { value, .. } => *value,
                Constant::Float { value, .. } => *value as i128,
                Constant::DataAddress { offset, .. } => i128::from(*offset),
            };
            let wrapped = wrap_integer(raw, *primary) as i64;
            let size = primary.size_in_bytes() as usize;
            Ok(wrapped.to_le_bytes()[..size].to_vec())
        }
        DataType::Primary { primary, .. } => {
            let raw = match constant {
                Constant::Int { value, .. } => *value as f64,
                Constant::Float { value, .. } => *value,
                Constant::DataAddress { .. } => {
                    return Err(ProcessingError::NonConstantInitializer)
                }
            };
            if *primary == PrimaryType::Float {
                Ok((raw as f32).to_le_bytes().to_vec())
            } else {
                Ok(raw.to_le_bytes().to_vec())
            }
        }
        DataType::Enum { .. } => {
            let raw = match constant {
                Constant::Int { value, .. } => *value,
                _ => return Err(ProcessingError::NonConstantInitializer),
            };
            let wrapped = wrap_integer(raw, PrimaryType::SignedInt) as i32;
            Ok(wrapped.to_le_bytes().to_vec())
        }
        DataType::Pointer { .. } | DataType::StructSelfPointer => {
            let raw = match constant {
                Constant::DataAddress { offset, .. } => *offset,
                Constant::Int { value, .. } => {
                    wrap_integer(*value, PrimaryType::UnsignedInt) as u32
                }
                Constant::Float { .. } => {
                    return Err(ProcessingError::NonConstantInitializer)
                }
            };
            Ok(raw.to_le_bytes().to_vec())
        }
        other => Err(ProcessingError::internal(format!(
            "cannot encode a scalar constant as '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_integer_little_endian() {
        let ten = Constant::Int {
            value: 10,
            primary: PrimaryType::SignedInt,
        };
        assert_eq!(
            encode_constant(&ten, &DataType::primary(PrimaryType::SignedInt)).unwrap(),
            vec![0x0a, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_wraps_negative_into_unsigned() {
        let minus_ten = Constant::Int {
            value: -10,
            primary: PrimaryType::SignedInt,
        };
        assert_eq!(
            encode_constant(&minus_ten, &DataType::primary(PrimaryType::UnsignedInt)).unwrap(),
            vec![0xf6, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn test_encode_long() {
        let big = Constant::Int {
            value: 4_294_967_296,
            primary: PrimaryType::SignedLong,
        };
        assert_eq!(
            encode_constant(&big, &DataType::primary(PrimaryType::SignedLong)).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_pointer() {
        let address = Constant::DataAddress {
            offset: 0x0102,
            data_type: DataType::pointer_to(DataType::primary(PrimaryType::SignedChar)),
        };
        assert_eq!(
            encode_constant(
                &address,
                &DataType::pointer_to(DataType::primary(PrimaryType::SignedChar))
            )
            .unwrap(),
            vec![0x02, 0x01, 0x00, 0x00]
        );
    }

    #[test]
    fn test_encode_float() {
        let half = Constant::Float {
            value: 0.5,
            primary: PrimaryType::Double,
        };
        assert_eq!(
            encode_constant(&half, &DataType::primary(PrimaryType::Float)).unwrap(),
            0.5f32.to_le_bytes().to_vec()
        );
        assert_eq!(
            encode_constant(&half, &DataType::primary(PrimaryType::Double)).unwrap(),
            0.5f64.to_le_bytes().to_vec()
        );
    }
}
