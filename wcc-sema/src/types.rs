//! Type utilities
//!
//! Size and layout queries, unpacking of composite types into primary
//! scalars, compatibility, assignability, decay, and the C17 conversion
//! rules. Everything here is pure and assumes resolved types: tag
//! references looked up and array lengths folded to literals (the processor
//! resolves types once, at declaration boundaries).

use crate::errors::ProcessingError;
use wcc_ast::{DataType, PrimaryType};
use wcc_ir::ScalarType;

/// Pointer size on wasm32
pub const POINTER_SIZE: u32 = 4;

/// Size of a data type in bytes. Struct layout is packed in declaration
/// order; no padding is ever inserted.
pub fn size_of(data_type: &DataType) -> Result<u32, ProcessingError> {
    match data_type {
        DataType::Primary { primary, .. } => Ok(primary.size_in_bytes()),
        DataType::Pointer { .. } | DataType::StructSelfPointer => Ok(POINTER_SIZE),
        DataType::Array { element, .. } => {
            let count = data_type
                .folded_length()
                .ok_or(ProcessingError::VariableLengthArray)?;
            Ok(size_of(element)? * count)
        }
        DataType::Struct {
            fields: Some(fields),
            ..
        } => {
            let mut total = 0;
            for field in fields {
                total += size_of(&field.data_type)?;
            }
            Ok(total)
        }
        DataType::Struct { tag, fields: None } => Err(ProcessingError::IncompleteType {
            name: tag.clone().unwrap_or_else(|| "<anonymous>".to_string()),
        }),
        DataType::Enum { .. } => Ok(PrimaryType::SignedInt.size_in_bytes()),
        DataType::Function { .. } => Err(ProcessingError::SizeofFunction),
        DataType::Void => Err(ProcessingError::VoidValue),
        DataType::Named(name) => Err(ProcessingError::internal(format!(
            "unresolved typedef '{}' reached layout",
            name
        ))),
    }
}

/// The machine scalar of one primary type
pub fn primary_scalar(primary: PrimaryType) -> ScalarType {
    match primary {
        PrimaryType::SignedChar => ScalarType::I8,
        PrimaryType::UnsignedChar => ScalarType::U8,
        PrimaryType::SignedShort => ScalarType::I16,
        PrimaryType::UnsignedShort => ScalarType::U16,
        PrimaryType::SignedInt => ScalarType::I32,
        PrimaryType::UnsignedInt => ScalarType::U32,
        PrimaryType::SignedLong => ScalarType::I64,
        PrimaryType::UnsignedLong => ScalarType::U64,
        PrimaryType::Float => ScalarType::F32,
        PrimaryType::Double => ScalarType::F64,
    }
}

/// The machine scalar a scalar C type lowers to
pub fn scalar_type_of(data_type: &DataType) -> Result<ScalarType, ProcessingError> {
    match data_type {
        DataType::Primary { primary, .. } => Ok(primary_scalar(*primary)),
        DataType::Pointer { .. } | DataType::StructSelfPointer => Ok(ScalarType::U32),
        DataType::Enum { .. } => Ok(ScalarType::I32),
        DataType::Void => Err(ProcessingError::VoidValue),
        other => Err(ProcessingError::internal(format!(
            "no machine scalar for '{}'",
            other
        ))),
    }
}

/// Unpack a type into its primary scalars: one `(byte offset, scalar)` pair
/// per primary field, in layout order
pub fn unpack(data_type: &DataType) -> Result<Vec<(u32, ScalarType)>, ProcessingError> {
    match data_type {
        DataType::Primary { .. }
        | DataType::Pointer { .. }
        | DataType::StructSelfPointer
        | DataType::Enum { .. } => Ok(vec![(0, scalar_type_of(data_type)?)]),
        DataType::Array { element, .. } => {
            let count = data_type
                .folded_length()
                .ok_or(ProcessingError::VariableLengthArray)?;
            let element_size = size_of(element)?;
            let inner = unpack(element)?;
            let mut slots = Vec::with_capacity(inner.len() * count as usize);
            for i in 0..count {
                for (offset, scalar) in &inner {
                    slots.push((i * element_size + offset, *scalar));
                }
            }
            Ok(slots)
        }
        DataType::Struct {
            fields: Some(fields),
            ..
        } => {
            let mut slots = Vec::new();
            let mut base = 0;
            for field in fields {
                for (offset, scalar) in unpack(&field.data_type)? {
                    slots.push((base + offset, scalar));
                }
                base += size_of(&field.data_type)?;
            }
            Ok(slots)
        }
        DataType::Struct { tag, fields: None } => Err(ProcessingError::IncompleteType {
            name: tag.clone().unwrap_or_else(|| "<anonymous>".to_string()),
        }),
        DataType::Function { .. } => Err(ProcessingError::SizeofFunction),
        DataType::Void => Err(ProcessingError::VoidValue),
        DataType::Named(name) => Err(ProcessingError::internal(format!(
            "unresolved typedef '{}' reached unpacking",
            name
        ))),
    }
}

/// Byte offset of a named struct field and its type, or `None` when the
/// struct has no such field
pub fn field_offset(
    fields: &[wcc_ast::StructField],
    name: &str,
) -> Result<Option<(u32, DataType)>, ProcessingError> {
    let mut offset = 0;
    for field in fields {
        if field.name == name {
            return Ok(Some((offset, field.data_type.clone())));
        }
        offset += size_of(&field.data_type)?;
    }
    Ok(None)
}

/// Type compatibility. Symmetric and reflexive; `ignore_qualifiers` drops
/// the const comparison at the outermost level of each recursion step.
pub fn is_compatible(a: &DataType, b: &DataType, ignore_qualifiers: bool) -> bool {
    if !ignore_qualifiers && a.is_const() != b.is_const() {
        return false;
    }
    match (a, b) {
        (
            DataType::Primary { primary: pa, .. },
            DataType::Primary { primary: pb, .. },
        ) => pa == pb,
        (DataType::Pointer { pointee: ta, .. }, DataType::Pointer { pointee: tb, .. }) => {
            if **ta == DataType::Void && **tb == DataType::Void {
                true
            } else {
                is_compatible(ta, tb, ignore_qualifiers)
            }
        }
        (
            DataType::Array {
                element: ea,
                ..
            },
            DataType::Array {
                element: eb,
                ..
            },
        ) => {
            a.folded_length().is_some()
                && a.folded_length() == b.folded_length()
                && is_compatible(ea, eb, ignore_qualifiers)
        }
        (
            DataType::Struct {
                tag: ta,
                fields: Some(fa),
            },
            DataType::Struct {
                tag: tb,
                fields: Some(fb),
            },
        ) => {
            // Matching tags also cover self-pointer fields: a self pointer
            // is only ever compatible with the self pointer of the same tag
            ta == tb
                && fa.len() == fb.len()
                && fa.iter().zip(fb.iter()).all(|(x, y)| {
                    x.name == y.name && is_compatible(&x.data_type, &y.data_type, ignore_qualifiers)
                })
        }
        (DataType::StructSelfPointer, DataType::StructSelfPointer) => true,
        (DataType::Enum { .. }, DataType::Enum { .. }) => true,
        (
            DataType::Function {
                return_type: ra,
                parameters: pa,
            },
            DataType::Function {
                return_type: rb,
                parameters: pb,
            },
        ) => {
            let returns_match = match (ra.as_ref(), rb.as_ref()) {
                (DataType::Void, DataType::Void) => true,
                (DataType::Void, _) | (_, DataType::Void) => false,
                (x, y) => is_compatible(x, y, ignore_qualifiers),
            };
            returns_match
                && pa.len() == pb.len()
                && pa
                    .iter()
                    .zip(pb.iter())
                    .all(|(x, y)| is_compatible(x, y, ignore_qualifiers))
        }
        (DataType::Void, DataType::Void) => true,
        _ => false,
    }
}

/// Array-to-pointer and function-to-pointer decay; other types pass
/// through. Idempotent.
pub fn decay(data_type: &DataType) -> DataType {
    match data_type {
        DataType::Array { element, .. } => DataType::pointer_to((**element).clone()),
        DataType::Function { .. } => DataType::pointer_to(data_type.clone()),
        other => other.clone(),
    }
}

/// Assignability per C17 6.5.16.1. `rvalue_is_null_constant` marks an
/// integer constant expression with value zero.
pub fn can_assign(lvalue: &DataType, rvalue: &DataType, rvalue_is_null_constant: bool) -> bool {
    if lvalue.is_arithmetic() && rvalue.is_arithmetic() {
        return true;
    }
    if lvalue.is_pointer() && rvalue.is_arithmetic() && rvalue_is_null_constant {
        return true;
    }
    match (lvalue, rvalue) {
        (DataType::Struct { .. }, DataType::Struct { .. }) => {
            is_compatible(lvalue, rvalue, true)
        }
        (DataType::Pointer { pointee: lp, .. }, DataType::Pointer { pointee: rp, .. }) => {
            let pointees_agree = **lp == DataType::Void
                || **rp == DataType::Void
                || is_compatible(lp, rp, true);
            // The left pointee must carry every qualifier of the right one
            let qualifiers_agree = !rp.is_const() || lp.is_const();
            pointees_agree && qualifiers_agree
        }
        _ => false,
    }
}

/// The promoted type of an arithmetic operand (enums count as signed int)
pub fn arithmetic_primary(data_type: &DataType) -> Option<PrimaryType> {
    match data_type {
        DataType::Primary { primary, .. } => Some(*primary),
        DataType::Enum { .. } => Some(PrimaryType::SignedInt),
        _ => None,
    }
}

/// Integer promotion per C17 6.3.1.1: every type of rank below int goes to
/// signed int (int can represent all their values), others are unchanged
pub fn promote(primary: PrimaryType) -> PrimaryType {
    match primary {
        PrimaryType::SignedChar
        | PrimaryType::UnsignedChar
        | PrimaryType::SignedShort
        | PrimaryType::UnsignedShort => PrimaryType::SignedInt,
        other => other,
    }
}

/// Usual arithmetic conversions per C17 6.3.1.8, yielding the common type
/// of a binary operation
pub fn usual_arithmetic_conversion(a: PrimaryType, b: PrimaryType) -> PrimaryType {
    if a == PrimaryType::Double || b == PrimaryType::Double {
        return PrimaryType::Double;
    }
    if a == PrimaryType::Float || b == PrimaryType::Float {
        return PrimaryType::Float;
    }
    let a = promote(a);
    let b = promote(b);
    if a == b {
        return a;
    }
    if a.is_signed() == b.is_signed() {
        return if a.rank() >= b.rank() { a } else { b };
    }
    let (signed, unsigned) = if a.is_signed() { (a, b) } else { (b, a) };
    if unsigned.rank() >= signed.rank() {
        unsigned
    } else {
        // The signed type has higher rank; signed long represents every
        // unsigned int, so it wins - otherwise its unsigned counterpart does
        if signed == PrimaryType::SignedLong && unsigned == PrimaryType::UnsignedInt {
            signed
        } else {
            signed.to_unsigned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcc_ast::StructField;

    fn int() -> DataType {
        DataType::primary(PrimaryType::SignedInt)
    }

    fn pair_struct(tag: &str) -> DataType {
        DataType::Struct {
            tag: Some(tag.to_string()),
            fields: Some(vec![
                StructField {
                    name: "x".to_string(),
                    data_type: DataType::primary(PrimaryType::SignedChar),
                },
                StructField {
                    name: "y".to_string(),
                    data_type: DataType::primary(PrimaryType::SignedLong),
                },
            ]),
        }
    }

    #[test]
    fn test_size_of_scalars() {
        assert_eq!(size_of(&int()), Ok(4));
        assert_eq!(size_of(&DataType::pointer_to(DataType::Void)), Ok(4));
        assert_eq!(
            size_of(&DataType::Enum {
                tag: None,
                members: Some(Vec::new())
            }),
            Ok(4)
        );
        assert_eq!(size_of(&DataType::Void), Err(ProcessingError::VoidValue));
    }

    #[test]
    fn test_size_of_aggregates_is_packed() {
        // 1 + 8 with no padding
        assert_eq!(size_of(&pair_struct("p")), Ok(9));
        assert_eq!(size_of(&DataType::array_of(pair_struct("p"), 3)), Ok(27));
    }

    #[test]
    fn test_size_matches_unpacked_sum() {
        for data_type in [
            int(),
            pair_struct("p"),
            DataType::array_of(DataType::primary(PrimaryType::UnsignedShort), 5),
            DataType::pointer_to(int()),
        ] {
            let total: u32 = unpack(&data_type)
                .unwrap()
                .iter()
                .map(|(_, scalar)| scalar.size_in_bytes())
                .sum();
            assert_eq!(size_of(&data_type), Ok(total));
        }
    }

    #[test]
    fn test_unpack_offsets_monotonic() {
        let slots = unpack(&DataType::array_of(pair_struct("p"), 2)).unwrap();
        assert_eq!(slots.len(), 4);
        assert_eq!(slots[0], (0, ScalarType::I8));
        assert_eq!(slots[1], (1, ScalarType::I64));
        assert_eq!(slots[2], (9, ScalarType::I8));
        assert_eq!(slots[3], (10, ScalarType::I64));
        assert!(slots.windows(2).all(|w| w[0].0 <= w[1].0));
    }

    #[test]
    fn test_field_offset() {
        let DataType::Struct {
            fields: Some(fields),
            ..
        } = pair_struct("p")
        else {
            unreachable!()
        };
        assert_eq!(
            field_offset(&fields, "y").unwrap(),
            Some((1, DataType::primary(PrimaryType::SignedLong)))
        );
        assert_eq!(field_offset(&fields, "z").unwrap(), None);
    }

    #[test]
    fn test_compatibility_reflexive_symmetric() {
        let types = [
            int(),
            DataType::pointer_to(int()),
            pair_struct("p"),
            DataType::array_of(int(), 3),
        ];
        for a in &types {
            assert!(is_compatible(a, a, false));
            for b in &types {
                assert_eq!(is_compatible(a, b, false), is_compatible(b, a, false));
            }
        }
    }

    #[test]
    fn test_compatibility_qualifiers() {
        let const_int = int().with_const();
        assert!(!is_compatible(&int(), &const_int, false));
        assert!(is_compatible(&int(), &const_int, true));
    }

    #[test]
    fn test_struct_compatibility_requires_tag() {
        assert!(is_compatible(&pair_struct("a"), &pair_struct("a"), false));
        assert!(!is_compatible(&pair_struct("a"), &pair_struct("b"), false));
    }

    #[test]
    fn test_array_compatibility_requires_length() {
        let a3 = DataType::array_of(int(), 3);
        let a4 = DataType::array_of(int(), 4);
        assert!(is_compatible(&a3, &a3, false));
        assert!(!is_compatible(&a3, &a4, false));
    }

    #[test]
    fn test_void_pointers_compatible() {
        let vp = DataType::pointer_to(DataType::Void);
        assert!(is_compatible(&vp, &vp, false));
        assert!(!is_compatible(&vp, &DataType::pointer_to(int()), false));
    }

    #[test]
    fn test_decay_idempotent() {
        let arr = DataType::array_of(int(), 8);
        let decayed = decay(&arr);
        assert_eq!(decayed, DataType::pointer_to(int()));
        assert_eq!(decay(&decayed), decayed);

        let func = DataType::Function {
            return_type: Box::new(DataType::Void),
            parameters: Vec::new(),
        };
        let fp = decay(&func);
        assert!(matches!(&fp, DataType::Pointer { pointee, .. } if pointee.is_function()));
        assert_eq!(decay(&fp), fp);
    }

    #[test]
    fn test_can_assign_arithmetic() {
        assert!(can_assign(
            &int(),
            &DataType::primary(PrimaryType::Double),
            false
        ));
    }

    #[test]
    fn test_can_assign_null_pointer_constant() {
        for pointee in [int(), DataType::Void, pair_struct("p")] {
            assert!(can_assign(&DataType::pointer_to(pointee), &int(), true));
        }
        assert!(!can_assign(&DataType::pointer_to(int()), &int(), false));
    }

    #[test]
    fn test_can_assign_pointer_qualifiers() {
        let int_ptr = DataType::pointer_to(int());
        let const_int_ptr = DataType::pointer_to(int().with_const());
        // Adding const on the left pointee is fine, dropping it is not
        assert!(can_assign(&const_int_ptr, &int_ptr, false));
        assert!(!can_assign(&int_ptr, &const_int_ptr, false));
        // Either side being void* is fine
        assert!(can_assign(&DataType::pointer_to(DataType::Void), &int_ptr, false));
        assert!(can_assign(&int_ptr, &DataType::pointer_to(DataType::Void), false));
    }

    #[test]
    fn test_promotion() {
        assert_eq!(promote(PrimaryType::SignedChar), PrimaryType::SignedInt);
        assert_eq!(promote(PrimaryType::UnsignedShort), PrimaryType::SignedInt);
        assert_eq!(promote(PrimaryType::UnsignedInt), PrimaryType::UnsignedInt);
        assert_eq!(promote(PrimaryType::SignedLong), PrimaryType::SignedLong);
    }

    #[test]
    fn test_usual_arithmetic_conversions() {
        use PrimaryType::*;
        assert_eq!(usual_arithmetic_conversion(SignedInt, Double), Double);
        assert_eq!(usual_arithmetic_conversion(Float, SignedLong), Float);
        assert_eq!(usual_arithmetic_conversion(SignedChar, SignedShort), SignedInt);
        assert_eq!(usual_arithmetic_conversion(SignedInt, UnsignedInt), UnsignedInt);
        assert_eq!(usual_arithmetic_conversion(UnsignedInt, SignedLong), SignedLong);
        assert_eq!(usual_arithmetic_conversion(SignedLong, UnsignedLong), UnsignedLong);
    }
}
