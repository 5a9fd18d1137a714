//! Expression processing
//!
//! Types every expression, inserts implicit conversions as explicit IR
//! convert nodes, and lowers to flat scalar bundles: a [`TypedExpr`] carries
//! one IR expression per unpacked primary of its C type, in layout order.
//! Scalar expressions have exactly one; struct values have one per field;
//! void has none (side effects ride in `effects`).

use crate::constfold::{type_of_integer_literal, Evaluator};
use crate::errors::ProcessingError;
use crate::processor::Processor;
use crate::symbols::SymbolEntry;
use crate::types;
use wcc_ast::{BinaryOp, DataType, Expression, ExpressionKind, PrimaryType};
use wcc_ir as ir;
use wcc_ir::{Address, ScalarType};

/// A processed expression: its C type and its unpacked scalar lowering
#[derive(Debug, Clone, PartialEq)]
pub struct TypedExpr {
    pub data_type: DataType,
    pub scalars: Vec<ir::Expression>,
    /// Statements carrying the side effects of a valueless (void)
    /// expression; empty whenever `scalars` is non-empty
    pub effects: Vec<ir::Statement>,
}

impl TypedExpr {
    pub(crate) fn scalar(data_type: DataType, expr: ir::Expression) -> Self {
        Self {
            data_type,
            scalars: vec![expr],
            effects: Vec::new(),
        }
    }

    pub(crate) fn void(effects: Vec<ir::Statement>) -> Self {
        Self {
            data_type: DataType::Void,
            scalars: Vec::new(),
            effects,
        }
    }

    /// The single scalar of a scalar-typed value
    pub(crate) fn into_scalar(mut self) -> Result<ir::Expression, ProcessingError> {
        match self.scalars.len() {
            1 => Ok(self.scalars.remove(0)),
            0 => Err(ProcessingError::VoidValue),
            _ => Err(ProcessingError::internal(
                "aggregate value used where a scalar was expected",
            )),
        }
    }
}

/// A designated object: where it lives, what it is, whether it may be
/// written
#[derive(Debug, Clone)]
pub struct LvalueRef {
    pub data_type: DataType,
    pub address: ir::Expression,
    pub modifiable: bool,
}

/// Modifiable lvalues exclude arrays, functions, and const objects
fn is_modifiable(data_type: &DataType) -> bool {
    !data_type.is_const()
        && !matches!(data_type, DataType::Array { .. } | DataType::Function { .. })
}

/// Offset an address value by a byte constant, folding into direct
/// addresses where possible
pub(crate) fn addr_add(base: ir::Expression, delta: u32) -> ir::Expression {
    if delta == 0 {
        return base;
    }
    match base {
        ir::Expression::AddressOf(Address::Local { offset }) => {
            ir::Expression::AddressOf(Address::Local {
                offset: offset + delta as i32,
            })
        }
        ir::Expression::AddressOf(Address::Data { offset }) => {
            ir::Expression::AddressOf(Address::Data {
                offset: offset + delta,
            })
        }
        ir::Expression::AddressOf(Address::Return { offset }) => {
            ir::Expression::AddressOf(Address::Return {
                offset: offset + delta,
            })
        }
        other => ir::Expression::Binary {
            op: ir::BinaryOp::Add,
            scalar_type: ScalarType::U32,
            lhs: Box::new(other),
            rhs: Box::new(ir::Expression::int_const(i128::from(delta), ScalarType::U32)),
        },
    }
}

/// Convert a scalar to another machine type, folding constants so the
/// emitter sees literals of the final width
pub(crate) fn convert_scalar(expr: ir::Expression, to: ScalarType) -> ir::Expression {
    let from = expr.scalar_type();
    if from == to {
        return expr;
    }
    match expr {
        ir::Expression::IntConstant { bits, scalar_type } => {
            let value = if scalar_type.is_signed() {
                i128::from(ir::Expression::signed_value(bits, scalar_type))
            } else {
                i128::from(bits)
            };
            if to.is_float() {
                ir::Expression::float_const(value as f64, to)
            } else {
                ir::Expression::int_const(value, to)
            }
        }
        ir::Expression::FloatConstant { value, .. } => {
            if to.is_float() {
                ir::Expression::float_const(value, to)
            } else {
                ir::Expression::int_const(value as i128, to)
            }
        }
        other => ir::Expression::Convert {
            from,
            to,
            operand: Box::new(other),
        },
    }
}

/// Prepend statements to a value so they execute before it is read
pub(crate) fn with_pre_statements(
    mut typed: TypedExpr,
    statements: Vec<ir::Statement>,
) -> TypedExpr {
    if statements.is_empty() {
        return typed;
    }
    if typed.scalars.is_empty() {
        let mut effects = statements;
        effects.append(&mut typed.effects);
        typed.effects = effects;
        return typed;
    }
    let first = typed.scalars.remove(0);
    typed.scalars.insert(
        0,
        ir::Expression::PreStatements {
            statements,
            expr: Box::new(first),
        },
    );
    typed
}

/// Extract the side-effect statements of a value whose result is discarded.
/// Pure subtrees vanish; a conditional whose branches carry effects lowers
/// to an `If` so only the taken branch runs.
pub(crate) fn effects_of(typed: TypedExpr) -> Vec<ir::Statement> {
    let mut statements = typed.effects;
    for scalar in typed.scalars {
        collect_effects(scalar, &mut statements);
    }
    statements
}

fn collect_effects(expr: ir::Expression, out: &mut Vec<ir::Statement>) {
    match expr {
        ir::Expression::PreStatements {
            statements,
            expr,
        } => {
            out.extend(statements);
            collect_effects(*expr, out);
        }
        ir::Expression::PostStatements { expr, statements } => {
            collect_effects(*expr, out);
            out.extend(statements);
        }
        ir::Expression::MemoryLoad { address, .. } => collect_effects(*address, out),
        ir::Expression::Binary { lhs, rhs, .. } => {
            collect_effects(*lhs, out);
            collect_effects(*rhs, out);
        }
        ir::Expression::Unary { operand, .. } | ir::Expression::Convert { operand, .. } => {
            collect_effects(*operand, out)
        }
        ir::Expression::Conditional {
            condition,
            then_expr,
            else_expr,
            ..
        } => {
            let mut then_statements = Vec::new();
            collect_effects(*then_expr, &mut then_statements);
            let mut else_statements = Vec::new();
            collect_effects(*else_expr, &mut else_statements);
            if then_statements.is_empty() && else_statements.is_empty() {
                collect_effects(*condition, out);
            } else {
                out.push(ir::Statement::If {
                    condition: *condition,
                    then_statements,
                    else_statements,
                });
            }
        }
        ir::Expression::IntConstant { .. }
        | ir::Expression::FloatConstant { .. }
        | ir::Expression::AddressOf(_) => {}
    }
}

fn ir_binary_op(op: BinaryOp) -> ir::BinaryOp {
    match op {
        BinaryOp::Add => ir::BinaryOp::Add,
        BinaryOp::Sub => ir::BinaryOp::Sub,
        BinaryOp::Mul => ir::BinaryOp::Mul,
        BinaryOp::Div => ir::BinaryOp::Div,
        BinaryOp::Mod => ir::BinaryOp::Rem,
        BinaryOp::BitAnd => ir::BinaryOp::And,
        BinaryOp::BitOr => ir::BinaryOp::Or,
        BinaryOp::BitXor => ir::BinaryOp::Xor,
        BinaryOp::LeftShift => ir::BinaryOp::Shl,
        BinaryOp::RightShift => ir::BinaryOp::Shr,
        BinaryOp::Equal => ir::BinaryOp::Eq,
        BinaryOp::NotEqual => ir::BinaryOp::Ne,
        BinaryOp::Less => ir::BinaryOp::Lt,
        BinaryOp::Greater => ir::BinaryOp::Gt,
        BinaryOp::LessEqual => ir::BinaryOp::Le,
        BinaryOp::GreaterEqual => ir::BinaryOp::Ge,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr => {
            unreachable!("logical operators lower through conditionals")
        }
    }
}

fn invalid_operands(op: BinaryOp, lhs: &TypedExpr, rhs: &TypedExpr) -> ProcessingError {
    ProcessingError::InvalidBinaryOperands {
        op: op.to_string(),
        lhs: lhs.data_type.to_string(),
        rhs: rhs.data_type.to_string(),
    }
}

impl Processor {
    /// Process an expression without applying decay (sizeof and unary `&`
    /// need the undecayed type)
    pub(crate) fn process_value(&mut self, expr: &Expression) -> Result<TypedExpr, ProcessingError> {
        match &expr.kind {
            ExpressionKind::IntegerConstant {
                value,
                is_decimal,
                suffix,
            } => {
                let primary = type_of_integer_literal(*value, *is_decimal, *suffix);
                Ok(TypedExpr::scalar(
                    DataType::primary(primary),
                    ir::Expression::int_const(*value, types::primary_scalar(primary)),
                ))
            }
            ExpressionKind::FloatConstant { value, is_float } => {
                let primary = if *is_float {
                    PrimaryType::Float
                } else {
                    PrimaryType::Double
                };
                Ok(TypedExpr::scalar(
                    DataType::primary(primary),
                    ir::Expression::float_const(*value, types::primary_scalar(primary)),
                ))
            }
            ExpressionKind::CharConstant(byte) => Ok(TypedExpr::scalar(
                DataType::primary(PrimaryType::SignedInt),
                ir::Expression::int_const(i128::from(*byte), ScalarType::I32),
            )),
            ExpressionKind::StringLiteral(text) => {
                let length = text.len() as u32 + 1;
                let offset = Evaluator::new(&mut self.symbols).intern_string(text);
                Ok(TypedExpr::scalar(
                    DataType::array_of(DataType::primary(PrimaryType::SignedChar), length),
                    ir::Expression::AddressOf(Address::Data { offset }),
                ))
            }
            ExpressionKind::Identifier(name) => self.process_identifier(name),
            ExpressionKind::Binary { op, lhs, rhs } => self.process_binary(*op, lhs, rhs),
            ExpressionKind::Unary { op, operand } => self.process_unary(*op, operand),
            ExpressionKind::Assignment { target, op, value } => {
                self.process_assignment(target, *op, value)
            }
            ExpressionKind::Conditional {
                condition,
                then_expr,
                else_expr,
            } => self.process_conditional(condition, then_expr, else_expr),
            ExpressionKind::FunctionCall { callee, arguments } => {
                self.process_call(callee, arguments)
            }
            ExpressionKind::Member { object, field } => self.process_member(expr, object, field),
            ExpressionKind::Arrow { .. }
            | ExpressionKind::Dereference(_)
            | ExpressionKind::Subscript { .. } => {
                let place = self.lvalue(expr)?;
                self.load_object(&place.data_type, place.address)
            }
            ExpressionKind::AddressOf(operand) => self.process_address_of(operand),
            ExpressionKind::PreIncrement(operand) => self.process_step(operand, true, true),
            ExpressionKind::PreDecrement(operand) => self.process_step(operand, false, true),
            ExpressionKind::PostIncrement(operand) => self.process_step(operand, true, false),
            ExpressionKind::PostDecrement(operand) => self.process_step(operand, false, false),
            ExpressionKind::Cast { target, operand } => self.process_cast(target, operand),
            ExpressionKind::SizeofType(data_type) => {
                let resolved = self.resolve_type(data_type).map_err(|err| match err {
                    ProcessingError::IncompleteType { .. } => ProcessingError::SizeofIncomplete,
                    other => other,
                })?;
                self.sizeof_value(&resolved)
            }
            ExpressionKind::SizeofExpression(operand) => {
                // The operand is typed, never evaluated, and never decayed
                let value = self.process_value(operand)?;
                self.sizeof_value(&value.data_type)
            }
            ExpressionKind::Comma { left, right } => {
                let left = self.process_value(left)?;
                let effects = effects_of(left);
                let right = self.process_decayed(right)?;
                Ok(with_pre_statements(right, effects))
            }
        }
    }

    /// Process an expression in a value position: arrays decay to element
    /// pointers and function designators to function pointers
    pub(crate) fn process_decayed(
        &mut self,
        expr: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        let typed = self.process_value(expr)?;
        Ok(Self::decay_typed(typed))
    }

    fn decay_typed(typed: TypedExpr) -> TypedExpr {
        match &typed.data_type {
            DataType::Array { .. } | DataType::Function { .. } => TypedExpr {
                data_type: types::decay(&typed.data_type),
                scalars: typed.scalars,
                effects: typed.effects,
            },
            _ => typed,
        }
    }

    /// Designate the object an expression names; fails with `NotAnLvalue`
    /// when the expression does not name one
    pub(crate) fn lvalue(&mut self, expr: &Expression) -> Result<LvalueRef, ProcessingError> {
        match &expr.kind {
            ExpressionKind::Identifier(name) => match self.symbols.lookup(name).cloned() {
                Some(SymbolEntry::LocalVariable { data_type, offset }) => Ok(LvalueRef {
                    modifiable: is_modifiable(&data_type),
                    address: ir::Expression::AddressOf(Address::Local { offset }),
                    data_type,
                }),
                Some(SymbolEntry::DataVariable { data_type, offset }) => Ok(LvalueRef {
                    modifiable: is_modifiable(&data_type),
                    address: ir::Expression::AddressOf(Address::Data { offset }),
                    data_type,
                }),
                Some(_) => Err(ProcessingError::NotAnLvalue),
                None => Err(ProcessingError::Undeclared { name: name.clone() }),
            },
            ExpressionKind::Dereference(inner) => {
                let value = self.process_decayed(inner)?;
                let pointee = match &value.data_type {
                    DataType::Pointer { pointee, .. } => (**pointee).clone(),
                    _ => return Err(ProcessingError::DereferenceNonPointer),
                };
                if pointee == DataType::Void {
                    return Err(ProcessingError::VoidValue);
                }
                Ok(LvalueRef {
                    modifiable: is_modifiable(&pointee),
                    address: value.into_scalar()?,
                    data_type: pointee,
                })
            }
            ExpressionKind::Subscript { object, index } => {
                let object = self.process_decayed(object)?;
                let element = match &object.data_type {
                    DataType::Pointer { pointee, .. } => (**pointee).clone(),
                    _ => return Err(ProcessingError::DereferenceNonPointer),
                };
                let index = self.process_decayed(index)?;
                if !index.data_type.is_integer() {
                    return Err(ProcessingError::SubscriptNotInteger);
                }
                let address =
                    Self::element_address(object.into_scalar()?, index.into_scalar()?, &element)?;
                Ok(LvalueRef {
                    modifiable: is_modifiable(&element),
                    address,
                    data_type: element,
                })
            }
            ExpressionKind::Member { object, field } => {
                let base = self.lvalue(object)?;
                let (offset, field_type) = Self::struct_field(&base.data_type, field)?;
                Ok(LvalueRef {
                    modifiable: base.modifiable && is_modifiable(&field_type),
                    address: addr_add(base.address, offset),
                    data_type: field_type,
                })
            }
            ExpressionKind::Arrow { object, field } => {
                let object = self.process_decayed(object)?;
                let pointee = match &object.data_type {
                    DataType::Pointer { pointee, .. } => (**pointee).clone(),
                    _ => {
                        return Err(ProcessingError::MemberOfNonStruct {
                            field: field.clone(),
                        })
                    }
                };
                let (offset, field_type) = Self::struct_field(&pointee, field)?;
                Ok(LvalueRef {
                    modifiable: is_modifiable(&field_type),
                    address: addr_add(object.into_scalar()?, offset),
                    data_type: field_type,
                })
            }
            _ => Err(ProcessingError::NotAnLvalue),
        }
    }

    /// Locate a field in a struct type, resolving a self-pointer field to a
    /// pointer to the enclosing struct
    fn struct_field(
        data_type: &DataType,
        field: &str,
    ) -> Result<(u32, DataType), ProcessingError> {
        let (tag, fields) = match data_type {
            DataType::Struct {
                tag,
                fields: Some(fields),
            } => (tag, fields),
            _ => {
                return Err(ProcessingError::MemberOfNonStruct {
                    field: field.to_string(),
                })
            }
        };
        match types::field_offset(fields, field)? {
            Some((offset, field_type)) => {
                let field_type = if field_type == DataType::StructSelfPointer {
                    DataType::pointer_to(data_type.clone())
                } else {
                    field_type
                };
                Ok((offset, field_type))
            }
            None => Err(ProcessingError::NoSuchMember {
                tag: tag.clone().unwrap_or_else(|| "<anonymous>".to_string()),
                field: field.to_string(),
            }),
        }
    }

    /// Loads for an object at `base`: one per primary for scalars and
    /// structs; arrays stand as their address and decay later
    pub(crate) fn load_object(
        &self,
        data_type: &DataType,
        base: ir::Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        if matches!(data_type, DataType::Array { .. }) {
            return Ok(TypedExpr::scalar(data_type.clone(), base));
        }
        let slots = types::unpack(data_type)?;
        let scalars = slots
            .into_iter()
            .map(|(offset, scalar_type)| ir::Expression::MemoryLoad {
                address: Box::new(addr_add(base.clone(), offset)),
                scalar_type,
            })
            .collect();
        Ok(TypedExpr {
            data_type: data_type.clone(),
            scalars,
            effects: Vec::new(),
        })
    }

    /// Stores writing `value` into the object at `address`, one per scalar
    pub(crate) fn store_object(
        &self,
        data_type: &DataType,
        address: &ir::Expression,
        value: TypedExpr,
    ) -> Result<Vec<ir::Statement>, ProcessingError> {
        let slots = types::unpack(data_type)?;
        if slots.len() != value.scalars.len() {
            return Err(ProcessingError::internal(
                "scalar count mismatch between store target and value",
            ));
        }
        Ok(slots
            .into_iter()
            .zip(value.scalars)
            .map(|((offset, scalar_type), scalar)| ir::Statement::MemoryStore {
                address: addr_add(address.clone(), offset),
                value: convert_scalar(scalar, scalar_type),
                scalar_type,
            })
            .collect())
    }

    fn process_identifier(&mut self, name: &str) -> Result<TypedExpr, ProcessingError> {
        match self.symbols.lookup(name).cloned() {
            Some(SymbolEntry::LocalVariable { data_type, offset }) => self.load_object(
                &data_type,
                ir::Expression::AddressOf(Address::Local { offset }),
            ),
            Some(SymbolEntry::DataVariable { data_type, offset }) => self.load_object(
                &data_type,
                ir::Expression::AddressOf(Address::Data { offset }),
            ),
            Some(SymbolEntry::Function { data_type, .. }) => {
                let index = self.symbols.function_table_index(name);
                Ok(TypedExpr::scalar(
                    data_type,
                    ir::Expression::AddressOf(Address::FunctionTable { index }),
                ))
            }
            Some(SymbolEntry::Enumerator { value }) => Ok(TypedExpr::scalar(
                DataType::primary(PrimaryType::SignedInt),
                ir::Expression::int_const(value, ScalarType::I32),
            )),
            Some(SymbolEntry::Typedef { .. }) | None => Err(ProcessingError::Undeclared {
                name: name.to_string(),
            }),
        }
    }

    fn process_member(
        &mut self,
        whole: &Expression,
        object: &Expression,
        field: &str,
    ) -> Result<TypedExpr, ProcessingError> {
        match self.lvalue(whole) {
            Ok(place) => self.load_object(&place.data_type, place.address),
            // A struct rvalue (call result, assignment value): slice the
            // field's scalars out of the flat bundle by index
            Err(ProcessingError::NotAnLvalue) => {
                let object = self.process_value(object)?;
                let fields = match &object.data_type {
                    DataType::Struct {
                        fields: Some(fields),
                        ..
                    } => fields.clone(),
                    _ => {
                        return Err(ProcessingError::MemberOfNonStruct {
                            field: field.to_string(),
                        })
                    }
                };
                let mut start = 0usize;
                for candidate in &fields {
                    if candidate.name == field {
                        let (_, field_type) = Self::struct_field(&object.data_type, field)?;
                        if matches!(field_type, DataType::Array { .. }) {
                            return Err(ProcessingError::NotAnLvalue);
                        }
                        let count = types::unpack(&field_type)?.len();
                        let mut scalars = object.scalars;
                        let tail = scalars.split_off(start + count);
                        let selected = scalars.split_off(start);
                        // Keep the effects of the scalars we are dropping
                        // (the call producing the struct rides on the first)
                        let mut dropped = Vec::new();
                        for scalar in scalars.into_iter().chain(tail) {
                            collect_effects(scalar, &mut dropped);
                        }
                        return Ok(with_pre_statements(
                            TypedExpr {
                                data_type: field_type,
                                scalars: selected,
                                effects: Vec::new(),
                            },
                            dropped,
                        ));
                    }
                    start += types::unpack(&candidate.data_type)?.len();
                }
                let tag = match &object.data_type {
                    DataType::Struct { tag, .. } => {
                        tag.clone().unwrap_or_else(|| "<anonymous>".to_string())
                    }
                    _ => "<anonymous>".to_string(),
                };
                Err(ProcessingError::NoSuchMember {
                    tag,
                    field: field.to_string(),
                })
            }
            Err(other) => Err(other),
        }
    }

    fn process_address_of(&mut self, operand: &Expression) -> Result<TypedExpr, ProcessingError> {
        // A function designator: its address is its table slot
        if let ExpressionKind::Identifier(name) = &operand.kind {
            if let Some(SymbolEntry::Function { data_type, .. }) =
                self.symbols.lookup(name).cloned()
            {
                let index = self.symbols.function_table_index(name);
                return Ok(TypedExpr::scalar(
                    DataType::pointer_to(data_type),
                    ir::Expression::AddressOf(Address::FunctionTable { index }),
                ));
            }
        }
        match self.lvalue(operand) {
            Ok(place) => Ok(TypedExpr::scalar(
                DataType::pointer_to(place.data_type),
                place.address,
            )),
            Err(ProcessingError::NotAnLvalue) => Err(ProcessingError::AddressOfNonLvalue),
            Err(other) => Err(other),
        }
    }

    fn process_unary(
        &mut self,
        op: wcc_ast::UnaryOp,
        operand: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        use wcc_ast::UnaryOp;
        let value = self.process_decayed(operand)?;
        let wrong_type = |value: &TypedExpr| ProcessingError::InvalidUnaryOperand {
            op: op.to_string(),
            operand: value.data_type.to_string(),
        };
        match op {
            UnaryOp::Plus | UnaryOp::Minus => {
                let Some(primary) = types::arithmetic_primary(&value.data_type) else {
                    return Err(wrong_type(&value));
                };
                let promoted = types::promote(primary);
                let scalar_type = types::primary_scalar(promoted);
                let operand = convert_scalar(value.into_scalar()?, scalar_type);
                let expr = if op == UnaryOp::Minus {
                    ir::Expression::Unary {
                        op: ir::UnaryOp::Neg,
                        scalar_type,
                        operand: Box::new(operand),
                    }
                } else {
                    operand
                };
                Ok(TypedExpr::scalar(DataType::primary(promoted), expr))
            }
            UnaryOp::BitNot => {
                let Some(primary) = types::arithmetic_primary(&value.data_type) else {
                    return Err(wrong_type(&value));
                };
                if !primary.is_integer() {
                    return Err(wrong_type(&value));
                }
                let promoted = types::promote(primary);
                let scalar_type = types::primary_scalar(promoted);
                let operand = convert_scalar(value.into_scalar()?, scalar_type);
                Ok(TypedExpr::scalar(
                    DataType::primary(promoted),
                    ir::Expression::Unary {
                        op: ir::UnaryOp::BitNot,
                        scalar_type,
                        operand: Box::new(operand),
                    },
                ))
            }
            UnaryOp::LogicalNot => {
                if !value.data_type.is_scalar() {
                    return Err(wrong_type(&value));
                }
                let operand = value.into_scalar()?;
                let scalar_type = operand.scalar_type();
                let expr = if scalar_type.is_float() {
                    ir::Expression::Binary {
                        op: ir::BinaryOp::Eq,
                        scalar_type,
                        lhs: Box::new(operand),
                        rhs: Box::new(ir::Expression::float_const(0.0, scalar_type)),
                    }
                } else {
                    ir::Expression::Unary {
                        op: ir::UnaryOp::Eqz,
                        scalar_type,
                        operand: Box::new(operand),
                    }
                };
                Ok(TypedExpr::scalar(
                    DataType::primary(PrimaryType::SignedInt),
                    expr,
                ))
            }
        }
    }

    fn process_step(
        &mut self,
        operand: &Expression,
        is_increment: bool,
        is_prefix: bool,
    ) -> Result<TypedExpr, ProcessingError> {
        let failure = if is_increment {
            ProcessingError::IncrementNonLvalue
        } else {
            ProcessingError::DecrementNonLvalue
        };
        let place = match self.lvalue(operand) {
            Ok(place) => place,
            Err(ProcessingError::NotAnLvalue) => return Err(failure),
            Err(other) => return Err(other),
        };
        if !place.modifiable {
            return Err(failure);
        }
        let step: ir::Expression;
        let scalar_type;
        match &place.data_type {
            DataType::Pointer { pointee, .. } => {
                scalar_type = ScalarType::U32;
                let stride = types::size_of(pointee)?;
                step = ir::Expression::int_const(i128::from(stride), scalar_type);
            }
            arithmetic if arithmetic.is_arithmetic() => {
                scalar_type = types::scalar_type_of(arithmetic)?;
                step = if scalar_type.is_float() {
                    ir::Expression::float_const(1.0, scalar_type)
                } else {
                    ir::Expression::int_const(1, scalar_type)
                };
            }
            other => {
                return Err(ProcessingError::InvalidUnaryOperand {
                    op: if is_increment { "++" } else { "--" }.to_string(),
                    operand: other.to_string(),
                })
            }
        }
        let load = ir::Expression::MemoryLoad {
            address: Box::new(place.address.clone()),
            scalar_type,
        };
        let updated = ir::Expression::Binary {
            op: if is_increment {
                ir::BinaryOp::Add
            } else {
                ir::BinaryOp::Sub
            },
            scalar_type,
            lhs: Box::new(load.clone()),
            rhs: Box::new(step),
        };
        let store = ir::Statement::MemoryStore {
            address: place.address,
            value: updated,
            scalar_type,
        };
        let expr = if is_prefix {
            ir::Expression::PreStatements {
                statements: vec![store],
                expr: Box::new(load),
            }
        } else {
            ir::Expression::PostStatements {
                expr: Box::new(load),
                statements: vec![store],
            }
        };
        Ok(TypedExpr::scalar(place.data_type, expr))
    }

    fn process_binary(
        &mut self,
        op: BinaryOp,
        lhs_ast: &Expression,
        rhs_ast: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        if op.is_logical() {
            return self.process_logical(op, lhs_ast, rhs_ast);
        }
        let lhs = self.process_decayed(lhs_ast)?;
        let rhs = self.process_decayed(rhs_ast)?;
        let lhs_null = rhs.data_type.is_pointer()
            && lhs.data_type.is_integer()
            && self.is_null_constant(lhs_ast);
        let rhs_null = lhs.data_type.is_pointer()
            && rhs.data_type.is_integer()
            && self.is_null_constant(rhs_ast);
        self.binary_typed(op, lhs, rhs, lhs_null, rhs_null)
    }

    /// The non-logical binary operators over already-processed operands;
    /// compound assignment reuses this with a loaded left side
    pub(crate) fn binary_typed(
        &mut self,
        op: BinaryOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
        lhs_null: bool,
        rhs_null: bool,
    ) -> Result<TypedExpr, ProcessingError> {
        use BinaryOp::*;
        match op {
            Add => {
                if lhs.data_type.is_pointer() && rhs.data_type.is_integer() {
                    self.pointer_offset(op, lhs, rhs, false)
                } else if lhs.data_type.is_integer() && rhs.data_type.is_pointer() {
                    self.pointer_offset(op, rhs, lhs, false)
                } else {
                    self.arithmetic_binary(op, lhs, rhs, false)
                }
            }
            Sub => {
                if lhs.data_type.is_pointer() && rhs.data_type.is_integer() {
                    self.pointer_offset(op, lhs, rhs, true)
                } else if lhs.data_type.is_pointer() && rhs.data_type.is_pointer() {
                    self.pointer_difference(op, lhs, rhs)
                } else {
                    self.arithmetic_binary(op, lhs, rhs, false)
                }
            }
            Mul | Div => self.arithmetic_binary(op, lhs, rhs, false),
            Mod | BitAnd | BitOr | BitXor => self.arithmetic_binary(op, lhs, rhs, true),
            LeftShift | RightShift => self.shift_binary(op, lhs, rhs),
            Equal | NotEqual | Less | Greater | LessEqual | GreaterEqual => {
                self.comparison_binary(op, lhs, rhs, lhs_null, rhs_null)
            }
            LogicalAnd | LogicalOr => {
                unreachable!("logical operators lower through conditionals")
            }
        }
    }

    fn arithmetic_binary(
        &mut self,
        op: BinaryOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
        integer_only: bool,
    ) -> Result<TypedExpr, ProcessingError> {
        let (Some(a), Some(b)) = (
            types::arithmetic_primary(&lhs.data_type),
            types::arithmetic_primary(&rhs.data_type),
        ) else {
            return Err(invalid_operands(op, &lhs, &rhs));
        };
        if integer_only && !(a.is_integer() && b.is_integer()) {
            return Err(invalid_operands(op, &lhs, &rhs));
        }
        let common = types::usual_arithmetic_conversion(a, b);
        let scalar_type = types::primary_scalar(common);
        let left = convert_scalar(lhs.into_scalar()?, scalar_type);
        let right = convert_scalar(rhs.into_scalar()?, scalar_type);
        let expr = ir::Expression::Binary {
            op: ir_binary_op(op),
            scalar_type,
            lhs: Box::new(left),
            rhs: Box::new(right),
        };
        let result_type = if op.is_comparison() {
            DataType::primary(PrimaryType::SignedInt)
        } else {
            DataType::primary(common)
        };
        Ok(TypedExpr::scalar(result_type, expr))
    }

    fn shift_binary(
        &mut self,
        op: BinaryOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
    ) -> Result<TypedExpr, ProcessingError> {
        let (Some(a), Some(b)) = (
            types::arithmetic_primary(&lhs.data_type),
            types::arithmetic_primary(&rhs.data_type),
        ) else {
            return Err(invalid_operands(op, &lhs, &rhs));
        };
        if !a.is_integer() || !b.is_integer() {
            return Err(invalid_operands(op, &lhs, &rhs));
        }
        // Each operand promotes on its own; the result takes the left type.
        // The emitter wants matching operand widths, so the count is
        // brought to the left width after its own promotion.
        let promoted = types::promote(a);
        let scalar_type = types::primary_scalar(promoted);
        let left = convert_scalar(lhs.into_scalar()?, scalar_type);
        let right = convert_scalar(
            convert_scalar(rhs.into_scalar()?, types::primary_scalar(types::promote(b))),
            scalar_type,
        );
        Ok(TypedExpr::scalar(
            DataType::primary(promoted),
            ir::Expression::Binary {
                op: ir_binary_op(op),
                scalar_type,
                lhs: Box::new(left),
                rhs: Box::new(right),
            },
        ))
    }

    fn comparison_binary(
        &mut self,
        op: BinaryOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
        lhs_null: bool,
        rhs_null: bool,
    ) -> Result<TypedExpr, ProcessingError> {
        let pointer_compare = |left: ir::Expression, right: ir::Expression| {
            TypedExpr::scalar(
                DataType::primary(PrimaryType::SignedInt),
                ir::Expression::Binary {
                    op: ir_binary_op(op),
                    scalar_type: ScalarType::U32,
                    lhs: Box::new(left),
                    rhs: Box::new(right),
                },
            )
        };
        if lhs.data_type.is_pointer() && rhs.data_type.is_pointer() {
            let compatible = match (&lhs.data_type, &rhs.data_type) {
                (
                    DataType::Pointer { pointee: a, .. },
                    DataType::Pointer { pointee: b, .. },
                ) => {
                    **a == DataType::Void
                        || **b == DataType::Void
                        || types::is_compatible(a, b, true)
                }
                _ => true,
            };
            if !compatible {
                return Err(invalid_operands(op, &lhs, &rhs));
            }
            return Ok(pointer_compare(lhs.into_scalar()?, rhs.into_scalar()?));
        }
        if lhs.data_type.is_pointer() && rhs_null {
            let left = lhs.into_scalar()?;
            let right = convert_scalar(rhs.into_scalar()?, ScalarType::U32);
            return Ok(pointer_compare(left, right));
        }
        if rhs.data_type.is_pointer() && lhs_null {
            let left = convert_scalar(lhs.into_scalar()?, ScalarType::U32);
            let right = rhs.into_scalar()?;
            return Ok(pointer_compare(left, right));
        }
        self.arithmetic_binary(op, lhs, rhs, false)
    }

    fn pointer_offset(
        &mut self,
        op: BinaryOp,
        pointer: TypedExpr,
        index: TypedExpr,
        negate: bool,
    ) -> Result<TypedExpr, ProcessingError> {
        let pointee = match &pointer.data_type {
            DataType::Pointer { pointee, .. } => (**pointee).clone(),
            _ => return Err(invalid_operands(op, &pointer, &index)),
        };
        let data_type = pointer.data_type.clone();
        let address = Self::element_address_signed(
            pointer.into_scalar()?,
            index.into_scalar()?,
            &pointee,
            negate,
        )?;
        Ok(TypedExpr::scalar(data_type, address))
    }

    fn pointer_difference(
        &mut self,
        op: BinaryOp,
        lhs: TypedExpr,
        rhs: TypedExpr,
    ) -> Result<TypedExpr, ProcessingError> {
        let (pointee_l, pointee_r) = match (&lhs.data_type, &rhs.data_type) {
            (DataType::Pointer { pointee: a, .. }, DataType::Pointer { pointee: b, .. }) => {
                ((**a).clone(), (**b).clone())
            }
            _ => return Err(invalid_operands(op, &lhs, &rhs)),
        };
        if !types::is_compatible(&pointee_l, &pointee_r, true) {
            return Err(invalid_operands(op, &lhs, &rhs));
        }
        let stride = types::size_of(&pointee_l)?;
        let left = convert_scalar(lhs.into_scalar()?, ScalarType::I64);
        let right = convert_scalar(rhs.into_scalar()?, ScalarType::I64);
        let difference = ir::Expression::Binary {
            op: ir::BinaryOp::Sub,
            scalar_type: ScalarType::I64,
            lhs: Box::new(left),
            rhs: Box::new(right),
        };
        Ok(TypedExpr::scalar(
            DataType::primary(PrimaryType::SignedLong),
            ir::Expression::Binary {
                op: ir::BinaryOp::Div,
                scalar_type: ScalarType::I64,
                lhs: Box::new(difference),
                rhs: Box::new(ir::Expression::int_const(i128::from(stride), ScalarType::I64)),
            },
        ))
    }

    fn element_address(
        base: ir::Expression,
        index: ir::Expression,
        element: &DataType,
    ) -> Result<ir::Expression, ProcessingError> {
        Self::element_address_signed(base, index, element, false)
    }

    fn element_address_signed(
        base: ir::Expression,
        index: ir::Expression,
        element: &DataType,
        negate: bool,
    ) -> Result<ir::Expression, ProcessingError> {
        let stride = types::size_of(element)?;
        let scaled = ir::Expression::Binary {
            op: ir::BinaryOp::Mul,
            scalar_type: ScalarType::U32,
            lhs: Box::new(convert_scalar(index, ScalarType::U32)),
            rhs: Box::new(ir::Expression::int_const(i128::from(stride), ScalarType::U32)),
        };
        Ok(ir::Expression::Binary {
            op: if negate {
                ir::BinaryOp::Sub
            } else {
                ir::BinaryOp::Add
            },
            scalar_type: ScalarType::U32,
            lhs: Box::new(base),
            rhs: Box::new(scaled),
        })
    }

    fn process_logical(
        &mut self,
        op: BinaryOp,
        lhs_ast: &Expression,
        rhs_ast: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        let lhs = self.process_decayed(lhs_ast)?;
        if !lhs.data_type.is_scalar() {
            return Err(ProcessingError::ScalarRequired {
                data_type: lhs.data_type.to_string(),
            });
        }
        let rhs = self.process_decayed(rhs_ast)?;
        if !rhs.data_type.is_scalar() {
            return Err(ProcessingError::ScalarRequired {
                data_type: rhs.data_type.to_string(),
            });
        }
        let left = Self::boolean_value(lhs)?;
        let right = Self::boolean_value(rhs)?;
        let (then_expr, else_expr) = if op == BinaryOp::LogicalAnd {
            (right, ir::Expression::int_const(0, ScalarType::I32))
        } else {
            (ir::Expression::int_const(1, ScalarType::I32), right)
        };
        Ok(TypedExpr::scalar(
            DataType::primary(PrimaryType::SignedInt),
            ir::Expression::Conditional {
                condition: Box::new(left),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
                scalar_type: ScalarType::I32,
            },
        ))
    }

    /// Normalize a scalar to an `I32` in {0, 1}
    pub(crate) fn boolean_value(typed: TypedExpr) -> Result<ir::Expression, ProcessingError> {
        let value = typed.into_scalar()?;
        let scalar_type = value.scalar_type();
        let zero = if scalar_type.is_float() {
            ir::Expression::float_const(0.0, scalar_type)
        } else {
            ir::Expression::int_const(0, scalar_type)
        };
        Ok(ir::Expression::Binary {
            op: ir::BinaryOp::Ne,
            scalar_type,
            lhs: Box::new(value),
            rhs: Box::new(zero),
        })
    }

    fn process_assignment(
        &mut self,
        target: &Expression,
        op: Option<BinaryOp>,
        value: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        let place = match self.lvalue(target) {
            Ok(place) => place,
            Err(ProcessingError::NotAnLvalue) => {
                let typed = self.process_value(target)?;
                return Err(ProcessingError::AssignToExpression {
                    data_type: typed.data_type.to_string(),
                });
            }
            Err(other) => return Err(other),
        };
        if !place.modifiable {
            return Err(ProcessingError::AssignToNonModifiable {
                data_type: place.data_type.to_string(),
            });
        }
        let stores = match op {
            None => {
                let rhs = self.process_decayed(value)?;
                let null = place.data_type.is_pointer()
                    && rhs.data_type.is_integer()
                    && self.is_null_constant(value);
                if !types::can_assign(&place.data_type, &rhs.data_type, null) {
                    return Err(ProcessingError::AssignTypeMismatch {
                        lhs: place.data_type.to_string(),
                        rhs: rhs.data_type.to_string(),
                    });
                }
                self.store_object(&place.data_type, &place.address, rhs)?
            }
            Some(op) => {
                let current = self.load_object(&place.data_type, place.address.clone())?;
                let rhs = self.process_decayed(value)?;
                let combined = self.binary_typed(op, current, rhs, false, false)?;
                if !types::can_assign(&place.data_type, &combined.data_type, false) {
                    return Err(ProcessingError::AssignTypeMismatch {
                        lhs: place.data_type.to_string(),
                        rhs: combined.data_type.to_string(),
                    });
                }
                self.store_object(&place.data_type, &place.address, combined)?
            }
        };
        let reloaded = self.load_object(&place.data_type, place.address)?;
        Ok(with_pre_statements(
            TypedExpr {
                data_type: place.data_type.without_const(),
                scalars: reloaded.scalars,
                effects: reloaded.effects,
            },
            stores,
        ))
    }

    fn process_conditional(
        &mut self,
        condition: &Expression,
        then_ast: &Expression,
        else_ast: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        let condition_typed = self.process_decayed(condition)?;
        if !condition_typed.data_type.is_scalar() {
            return Err(ProcessingError::ScalarRequired {
                data_type: condition_typed.data_type.to_string(),
            });
        }
        let test = Self::boolean_value(condition_typed)?;
        let then_value = self.process_decayed(then_ast)?;
        let else_value = self.process_decayed(else_ast)?;

        // Both arithmetic: converge on the common type
        if let (Some(a), Some(b)) = (
            types::arithmetic_primary(&then_value.data_type),
            types::arithmetic_primary(&else_value.data_type),
        ) {
            let common = types::usual_arithmetic_conversion(a, b);
            let scalar_type = types::primary_scalar(common);
            let then_expr = convert_scalar(then_value.into_scalar()?, scalar_type);
            let else_expr = convert_scalar(else_value.into_scalar()?, scalar_type);
            return Ok(TypedExpr::scalar(
                DataType::primary(common),
                ir::Expression::Conditional {
                    condition: Box::new(test),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    scalar_type,
                },
            ));
        }

        // Pointer pairs, or a pointer against a null constant
        let then_null = else_value.data_type.is_pointer()
            && then_value.data_type.is_integer()
            && self.is_null_constant(then_ast);
        let else_null = then_value.data_type.is_pointer()
            && else_value.data_type.is_integer()
            && self.is_null_constant(else_ast);
        if then_value.data_type.is_pointer() && else_value.data_type.is_pointer() {
            let result_type = match (&then_value.data_type, &else_value.data_type) {
                (DataType::Pointer { pointee: a, .. }, DataType::Pointer { pointee: b, .. }) => {
                    if **a == DataType::Void || **b == DataType::Void {
                        DataType::pointer_to(DataType::Void)
                    } else if types::is_compatible(a, b, true) {
                        then_value.data_type.clone()
                    } else {
                        return Err(ProcessingError::ConditionalTypeMismatch);
                    }
                }
                _ => then_value.data_type.clone(),
            };
            let then_expr = then_value.into_scalar()?;
            let else_expr = else_value.into_scalar()?;
            return Ok(TypedExpr::scalar(
                result_type,
                ir::Expression::Conditional {
                    condition: Box::new(test),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    scalar_type: ScalarType::U32,
                },
            ));
        }
        if then_value.data_type.is_pointer() && else_null {
            let result_type = then_value.data_type.clone();
            let then_expr = then_value.into_scalar()?;
            let else_expr = convert_scalar(else_value.into_scalar()?, ScalarType::U32);
            return Ok(TypedExpr::scalar(
                result_type,
                ir::Expression::Conditional {
                    condition: Box::new(test),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    scalar_type: ScalarType::U32,
                },
            ));
        }
        if else_value.data_type.is_pointer() && then_null {
            let result_type = else_value.data_type.clone();
            let then_expr = convert_scalar(then_value.into_scalar()?, ScalarType::U32);
            let else_expr = else_value.into_scalar()?;
            return Ok(TypedExpr::scalar(
                result_type,
                ir::Expression::Conditional {
                    condition: Box::new(test),
                    then_expr: Box::new(then_expr),
                    else_expr: Box::new(else_expr),
                    scalar_type: ScalarType::U32,
                },
            ));
        }

        // Compatible structs: select each scalar under the same test
        if matches!(then_value.data_type, DataType::Struct { .. })
            && types::is_compatible(&then_value.data_type, &else_value.data_type, true)
        {
            let data_type = then_value.data_type.clone();
            let scalars = then_value
                .scalars
                .into_iter()
                .zip(else_value.scalars)
                .map(|(then_expr, else_expr)| {
                    let scalar_type = then_expr.scalar_type();
                    ir::Expression::Conditional {
                        condition: Box::new(test.clone()),
                        then_expr: Box::new(then_expr),
                        else_expr: Box::new(else_expr),
                        scalar_type,
                    }
                })
                .collect();
            return Ok(TypedExpr {
                data_type,
                scalars,
                effects: Vec::new(),
            });
        }

        // Both void: only the side effects remain
        if then_value.data_type == DataType::Void && else_value.data_type == DataType::Void {
            return Ok(TypedExpr::void(vec![ir::Statement::If {
                condition: test,
                then_statements: effects_of(then_value),
                else_statements: effects_of(else_value),
            }]));
        }

        Err(ProcessingError::ConditionalTypeMismatch)
    }

    fn process_call(
        &mut self,
        callee: &Expression,
        arguments: &[Expression],
    ) -> Result<TypedExpr, ProcessingError> {
        // A plain function name calls directly, without touching the
        // function table
        if let ExpressionKind::Identifier(name) = &callee.kind {
            match self.symbols.lookup(name).cloned() {
                Some(SymbolEntry::Function { data_type, .. }) => {
                    let DataType::Function {
                        return_type,
                        parameters,
                    } = data_type
                    else {
                        return Err(ProcessingError::internal(
                            "function entry without function type",
                        ));
                    };
                    return self.finish_call(
                        ir::Callee::Named(name.clone()),
                        &return_type,
                        &parameters,
                        arguments,
                    );
                }
                None => {
                    return Err(ProcessingError::Undeclared {
                        name: name.to_string(),
                    })
                }
                Some(_) => {}
            }
        }
        let callee = self.process_decayed(callee)?;
        let (return_type, parameters) = match &callee.data_type {
            DataType::Pointer { pointee, .. } => match pointee.as_ref() {
                DataType::Function {
                    return_type,
                    parameters,
                } => ((**return_type).clone(), parameters.clone()),
                _ => return Err(ProcessingError::NotCallable),
            },
            _ => return Err(ProcessingError::NotCallable),
        };
        let signature = self.call_signature(&return_type, &parameters)?;
        let target = callee.into_scalar()?;
        self.finish_call(
            ir::Callee::Indirect {
                target: Box::new(target),
                signature,
            },
            &return_type,
            &parameters,
            arguments,
        )
    }

    pub(crate) fn call_signature(
        &self,
        return_type: &DataType,
        parameters: &[DataType],
    ) -> Result<ir::CallSignature, ProcessingError> {
        let mut parameter_scalars = Vec::new();
        for parameter in parameters {
            for (_, scalar_type) in types::unpack(parameter)? {
                parameter_scalars.push(scalar_type);
            }
        }
        let returns = if *return_type == DataType::Void {
            Vec::new()
        } else {
            types::unpack(return_type)?
                .into_iter()
                .map(|(_, scalar_type)| scalar_type)
                .collect()
        };
        Ok(ir::CallSignature {
            parameters: parameter_scalars,
            returns,
        })
    }

    fn finish_call(
        &mut self,
        callee: ir::Callee,
        return_type: &DataType,
        parameters: &[DataType],
        arguments: &[Expression],
    ) -> Result<TypedExpr, ProcessingError> {
        if arguments.len() != parameters.len() {
            return Err(ProcessingError::ArgumentCount);
        }
        let mut ir_arguments = Vec::new();
        for (argument_ast, parameter) in arguments.iter().zip(parameters) {
            let argument = self.process_decayed(argument_ast)?;
            let null = parameter.is_pointer()
                && argument.data_type.is_integer()
                && self.is_null_constant(argument_ast);
            if !types::can_assign(parameter, &argument.data_type, null) {
                return Err(ProcessingError::ArgumentType);
            }
            if parameter.is_scalar() {
                let scalar_type = types::scalar_type_of(parameter)?;
                ir_arguments.push(convert_scalar(argument.into_scalar()?, scalar_type));
            } else {
                ir_arguments.extend(argument.scalars);
            }
        }
        let call = ir::Statement::Call(ir::FunctionCall {
            callee,
            arguments: ir_arguments,
        });
        if *return_type == DataType::Void {
            return Ok(TypedExpr::void(vec![call]));
        }
        let slots = types::unpack(return_type)?;
        let mut scalars = Vec::with_capacity(slots.len());
        for (i, (offset, scalar_type)) in slots.into_iter().enumerate() {
            let load = ir::Expression::MemoryLoad {
                address: Box::new(ir::Expression::AddressOf(Address::Return { offset })),
                scalar_type,
            };
            if i == 0 {
                scalars.push(ir::Expression::PreStatements {
                    statements: vec![call.clone()],
                    expr: Box::new(load),
                });
            } else {
                scalars.push(load);
            }
        }
        Ok(TypedExpr {
            data_type: return_type.clone(),
            scalars,
            effects: Vec::new(),
        })
    }

    fn process_cast(
        &mut self,
        target: &DataType,
        operand: &Expression,
    ) -> Result<TypedExpr, ProcessingError> {
        let target = self.resolve_type(target)?;
        if target == DataType::Void {
            let value = self.process_decayed(operand)?;
            return Ok(TypedExpr::void(effects_of(value)));
        }
        if !target.is_scalar() {
            return Err(ProcessingError::CastToNonScalar);
        }
        let value = self.process_decayed(operand)?;
        if !value.data_type.is_scalar() {
            return Err(ProcessingError::ScalarRequired {
                data_type: value.data_type.to_string(),
            });
        }
        let float_pointer_mix = (target.is_pointer()
            && matches!(types::arithmetic_primary(&value.data_type), Some(p) if p.is_float()))
            || (value.data_type.is_pointer()
                && matches!(types::arithmetic_primary(&target), Some(p) if p.is_float()));
        if float_pointer_mix {
            return Err(ProcessingError::PointerFloatCast);
        }
        let scalar_type = types::scalar_type_of(&target)?;
        let expr = convert_scalar(value.into_scalar()?, scalar_type);
        Ok(TypedExpr::scalar(target, expr))
    }

    fn sizeof_value(&self, data_type: &DataType) -> Result<TypedExpr, ProcessingError> {
        if data_type.is_function() {
            return Err(ProcessingError::SizeofFunction);
        }
        let size = types::size_of(data_type).map_err(|err| match err {
            ProcessingError::IncompleteType { .. } => ProcessingError::SizeofIncomplete,
            other => other,
        })?;
        Ok(TypedExpr::scalar(
            DataType::primary(PrimaryType::UnsignedLong),
            ir::Expression::int_const(i128::from(size), ScalarType::U64),
        ))
    }

    /// An integer constant expression with value zero, per the null-pointer
    /// rules
    pub(crate) fn is_null_constant(&mut self, expr: &Expression) -> bool {
        Evaluator::new(&mut self.symbols).is_null_pointer_constant(expr)
    }
}
