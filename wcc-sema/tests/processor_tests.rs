//! End-to-end processor tests
//!
//! Drive whole translation units through the processor and check the
//! produced module, the data-segment image, and the exact diagnostic
//! phrasings.

use pretty_assertions::assert_eq;
use wcc_ast::{
    BinaryOp, BlockItem, DataType, Declaration, EnumDeclaration, EnumMember, Expression,
    ExpressionKind, FunctionDefinition, Initializer, Parameter, PrimaryType, Statement,
    StatementKind, StructField, SwitchCase, TopLevelItem, TranslationUnit, UnaryOp,
};
use wcc_common::{CompilerError, SourceSpan};
use wcc_ir as ir;
use wcc_sema::{ModuleFunction, ModuleRepository, ProcessedOutput, Processor};

fn sp() -> SourceSpan {
    SourceSpan::dummy()
}

fn int_t() -> DataType {
    DataType::primary(PrimaryType::SignedInt)
}

fn expr(kind: ExpressionKind) -> Expression {
    Expression::new(kind, sp())
}

fn stmt(kind: StatementKind) -> Statement {
    Statement::new(kind, sp())
}

fn single(e: Expression) -> Initializer {
    Initializer::Single(Box::new(e))
}

fn list(items: Vec<Initializer>) -> Initializer {
    Initializer::List(items)
}

fn binary(op: BinaryOp, lhs: Expression, rhs: Expression) -> Expression {
    expr(ExpressionKind::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    })
}

fn neg(e: Expression) -> Expression {
    expr(ExpressionKind::Unary {
        op: UnaryOp::Minus,
        operand: Box::new(e),
    })
}

fn call(name: &str, arguments: Vec<Expression>) -> Expression {
    expr(ExpressionKind::FunctionCall {
        callee: Box::new(Expression::ident(name)),
        arguments,
    })
}

fn var_decl(name: &str, data_type: DataType, initializer: Option<Initializer>) -> TopLevelItem {
    TopLevelItem::Declaration(Declaration::variable(name, data_type, initializer))
}

fn expression_statement(e: Expression) -> BlockItem {
    BlockItem::Statement(stmt(StatementKind::Expression(e)))
}

fn return_statement(e: Option<Expression>) -> BlockItem {
    BlockItem::Statement(stmt(StatementKind::Return(e)))
}

fn function(
    name: &str,
    return_type: DataType,
    parameters: Vec<(&str, DataType)>,
    body: Vec<BlockItem>,
) -> TopLevelItem {
    TopLevelItem::Function(FunctionDefinition {
        name: name.to_string(),
        return_type,
        parameters: parameters
            .into_iter()
            .map(|(name, data_type)| Parameter {
                name: Some(name.to_string()),
                data_type,
                span: sp(),
            })
            .collect(),
        body,
        span: sp(),
    })
}

fn main_with(mut body: Vec<BlockItem>) -> TopLevelItem {
    body.push(return_statement(Some(Expression::int_const(0))));
    function("main", int_t(), Vec::new(), body)
}

fn run(items: Vec<TopLevelItem>) -> Result<ProcessedOutput, CompilerError> {
    Processor::new(ModuleRepository::new()).run(&TranslationUnit::new(items))
}

fn run_with_stdio(items: Vec<TopLevelItem>) -> Result<ProcessedOutput, CompilerError> {
    let mut repository = ModuleRepository::new();
    repository.insert(
        "stdio",
        vec![ModuleFunction {
            name: "print_int".to_string(),
            data_type: DataType::Function {
                return_type: Box::new(DataType::Void),
                parameters: vec![int_t()],
            },
        }],
    );
    Processor::new(repository).run(&TranslationUnit::new(items).with_modules(vec!["stdio".to_string()]))
}

fn error_message(result: Result<ProcessedOutput, CompilerError>) -> String {
    match result {
        Err(error) => error.message().to_string(),
        Ok(_) => panic!("expected processing to fail"),
    }
}

fn struct_type(tag: &str, fields: Vec<(&str, DataType)>) -> DataType {
    DataType::Struct {
        tag: Some(tag.to_string()),
        fields: Some(
            fields
                .into_iter()
                .map(|(name, data_type)| StructField {
                    name: name.to_string(),
                    data_type,
                })
                .collect(),
        ),
    }
}

#[test]
fn test_two_ints_in_data_segment_and_imported_call() {
    let output = run_with_stdio(vec![
        var_decl("a", int_t(), Some(single(Expression::int_const(10)))),
        var_decl("b", int_t(), Some(single(Expression::int_const(20)))),
        main_with(vec![
            expression_statement(binary(
                BinaryOp::Add,
                Expression::ident("a"),
                Expression::ident("b"),
            )),
            expression_statement(call(
                "print_int",
                vec![binary(
                    BinaryOp::Add,
                    Expression::ident("a"),
                    Expression::ident("b"),
                )],
            )),
        ]),
    ])
    .unwrap();

    assert_eq!(output.module.data_segment_size, 8);
    assert_eq!(
        output.module.data_segment,
        "\\0a\\00\\00\\00\\14\\00\\00\\00"
    );
    assert_eq!(output.module.external_functions.len(), 1);
    assert_eq!(output.module.external_functions[0].name, "print_int");
    assert_eq!(output.module.external_functions[0].module, "stdio");

    // a+b; alone has no effect and is dropped with a warning; the call stays
    let main = &output.module.functions[0];
    let calls: Vec<_> = main
        .body
        .iter()
        .filter(|statement| {
            matches!(
                statement,
                ir::Statement::Call(ir::FunctionCall {
                    callee: ir::Callee::Named(name),
                    ..
                }) if name == "print_int"
            )
        })
        .collect();
    assert_eq!(calls.len(), 1);
    assert!(output
        .warnings
        .iter()
        .any(|w| w.message == "statement with no effect"));
}

#[test]
fn test_unsigned_initializer_wraps() {
    let output = run(vec![
        var_decl(
            "d",
            DataType::primary(PrimaryType::UnsignedInt),
            Some(single(neg(Expression::int_const(10)))),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    assert_eq!(output.module.data_segment, "\\f6\\ff\\ff\\ff");
}

#[test]
fn test_long_array_initializer_image() {
    let long_t = DataType::primary(PrimaryType::SignedLong);
    let output = run(vec![
        var_decl(
            "arr",
            DataType::array_of(long_t, 5),
            Some(list(vec![
                single(Expression::int_const(4_294_967_296)),
                single(neg(Expression::int_const(12))),
                single(Expression::int_const(123)),
                single(Expression::int_const(12)),
                single(Expression::int_const(32)),
            ])),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();

    assert_eq!(output.module.data_segment_size, 40);
    let encoded = &output.module.data_segment;
    assert!(encoded.starts_with("\\00\\00\\00\\00\\01\\00\\00\\00\\f4\\ff\\ff\\ff\\ff\\ff\\ff\\ff"));
    assert!(encoded.ends_with("\\20\\00\\00\\00\\00\\00\\00\\00"));
}

#[test]
fn test_string_literal_lands_before_pointer() {
    let output = run(vec![
        var_decl(
            "s",
            DataType::pointer_to(DataType::primary(PrimaryType::SignedChar)),
            Some(single(expr(ExpressionKind::StringLiteral("hi".to_string())))),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    // 'h' 'i' NUL, then the pointer to offset 0
    assert_eq!(output.module.data_segment_size, 7);
    assert_eq!(
        output.module.data_segment,
        "\\68\\69\\00\\00\\00\\00\\00"
    );
}

#[test]
fn test_enum_redefinition_message() {
    let enum_decl = |value| {
        TopLevelItem::EnumDeclaration(EnumDeclaration {
            tag: Some("x".to_string()),
            members: vec![EnumMember {
                name: format!("M{}", value),
                value: Some(Expression::int_const(value)),
            }],
            span: sp(),
        })
    };
    let message = error_message(run(vec![enum_decl(1), enum_decl(2), main_with(Vec::new())]));
    assert_eq!(message, "redefinition of 'enum x'");
}

#[test]
fn test_argument_count_message() {
    let items = vec![
        TopLevelItem::Declaration(Declaration::variable(
            "f",
            DataType::Function {
                return_type: Box::new(int_t()),
                parameters: vec![int_t()],
            },
            None,
        )),
        main_with(vec![expression_statement(call(
            "f",
            vec![Expression::int_const(1), Expression::int_const(2)],
        ))]),
    ];
    assert_eq!(
        error_message(run(items)),
        "number of arguments provided to function call does not match \
         number of parameters specfied in prototype"
    );
}

#[test]
fn test_struct_comparison_message() {
    let items = vec![
        var_decl("a", struct_type("A", vec![("x", int_t())]), None),
        main_with(vec![expression_statement(binary(
            BinaryOp::Less,
            Expression::ident("a"),
            Expression::int_const(1),
        ))]),
    ];
    assert_eq!(
        error_message(run(items)),
        "invalid operands to binary '<' (have 'struct A' and 'signed int')"
    );
}

#[test]
fn test_main_not_defined() {
    assert_eq!(error_message(run(Vec::new())), "main function not defined");
    let not_quite_main = vec![function("main_", int_t(), Vec::new(), Vec::new())];
    assert_eq!(
        error_message(run(not_quite_main)),
        "main function not defined"
    );
}

#[test]
fn test_undeclared_identifier_message() {
    let items = vec![main_with(vec![expression_statement(Expression::ident("x"))])];
    assert_eq!(error_message(run(items)), "'x' undeclared");
}

#[test]
fn test_local_redeclaration_message() {
    let items = vec![main_with(vec![
        BlockItem::Declaration(Declaration::variable("x", int_t(), None)),
        BlockItem::Declaration(Declaration::variable("x", int_t(), None)),
    ])];
    assert_eq!(error_message(run(items)), "redeclaration of 'x'");
}

#[test]
fn test_excess_initializer_message() {
    let items = vec![
        var_decl(
            "a",
            DataType::array_of(int_t(), 2),
            Some(list(vec![
                single(Expression::int_const(1)),
                single(Expression::int_const(2)),
                single(Expression::int_const(3)),
            ])),
        ),
        main_with(Vec::new()),
    ];
    assert_eq!(error_message(run(items)), "excess elements in initializer");
}

#[test]
fn test_non_constant_data_initializer_message() {
    let items = vec![
        var_decl("a", int_t(), Some(single(Expression::int_const(1)))),
        var_decl("b", int_t(), Some(single(Expression::ident("a")))),
        main_with(Vec::new()),
    ];
    assert_eq!(
        error_message(run(items)),
        "initializer element is not constant"
    );
}

#[test]
fn test_pointer_initializer_rules() {
    // A null pointer constant is assignable to any pointer
    let ok = run(vec![
        var_decl(
            "p",
            DataType::pointer_to(int_t()),
            Some(single(Expression::int_const(0))),
        ),
        main_with(Vec::new()),
    ]);
    assert!(ok.is_ok());

    // A nonzero integer is not
    let bad = run(vec![
        var_decl(
            "p",
            DataType::pointer_to(int_t()),
            Some(single(Expression::int_const(1))),
        ),
        main_with(Vec::new()),
    ]);
    assert_eq!(
        error_message(bad),
        "incompatible types when initializing type 'signed int *' using type 'signed int'"
    );
}

#[test]
fn test_local_struct_initializer_stores() {
    let pair = struct_type("Pair", vec![("x", int_t()), ("y", int_t())]);
    let output = run(vec![main_with(vec![BlockItem::Declaration(
        Declaration::variable(
            "p",
            pair,
            Some(list(vec![
                single(Expression::int_const(1)),
                single(Expression::int_const(2)),
            ])),
        ),
    )])])
    .unwrap();

    let main = &output.module.functions[0];
    assert_eq!(main.size_of_locals, 8);
    assert_eq!(
        main.body[0],
        ir::Statement::MemoryStore {
            address: ir::Expression::AddressOf(ir::Address::Local { offset: -8 }),
            value: ir::Expression::int_const(1, ir::ScalarType::I32),
            scalar_type: ir::ScalarType::I32,
        }
    );
    assert_eq!(
        main.body[1],
        ir::Statement::MemoryStore {
            address: ir::Expression::AddressOf(ir::Address::Local { offset: -4 }),
            value: ir::Expression::int_const(2, ir::ScalarType::I32),
            scalar_type: ir::ScalarType::I32,
        }
    );
}

#[test]
fn test_frame_size_counts_declarations_after_return() {
    let long_t = DataType::primary(PrimaryType::SignedLong);
    let output = run(vec![function(
        "main",
        int_t(),
        Vec::new(),
        vec![
            BlockItem::Declaration(Declaration::variable("x", int_t(), None)),
            return_statement(Some(Expression::int_const(0))),
            BlockItem::Declaration(Declaration::variable("y", long_t, None)),
        ],
    )])
    .unwrap();
    assert_eq!(output.module.functions[0].size_of_locals, 12);
}

#[test]
fn test_function_definition_layout_and_return() {
    let output = run(vec![
        function(
            "add",
            int_t(),
            vec![("a", int_t()), ("b", int_t())],
            vec![return_statement(Some(binary(
                BinaryOp::Add,
                Expression::ident("a"),
                Expression::ident("b"),
            )))],
        ),
        main_with(vec![expression_statement(call(
            "add",
            vec![Expression::int_const(1), Expression::int_const(2)],
        ))]),
    ])
    .unwrap();

    let add = &output.module.functions[0];
    assert_eq!(add.layout.size_of_parameters, 8);
    assert_eq!(add.layout.size_of_return, 4);
    assert_eq!(
        add.layout.parameter_scalars(),
        vec![ir::ScalarType::I32, ir::ScalarType::I32]
    );
    assert_eq!(add.size_of_locals, 0);

    // The body stores a+b (loads of the two parameters) into the return
    // area, then returns
    assert_eq!(add.body.len(), 2);
    assert_eq!(
        add.body[0],
        ir::Statement::MemoryStore {
            address: ir::Expression::AddressOf(ir::Address::Return { offset: 0 }),
            value: ir::Expression::Binary {
                op: ir::BinaryOp::Add,
                scalar_type: ir::ScalarType::I32,
                lhs: Box::new(ir::Expression::MemoryLoad {
                    address: Box::new(ir::Expression::AddressOf(ir::Address::Local { offset: 0 })),
                    scalar_type: ir::ScalarType::I32,
                }),
                rhs: Box::new(ir::Expression::MemoryLoad {
                    address: Box::new(ir::Expression::AddressOf(ir::Address::Local { offset: 4 })),
                    scalar_type: ir::ScalarType::I32,
                }),
            },
            scalar_type: ir::ScalarType::I32,
        }
    );
    assert_eq!(add.body[1], ir::Statement::Return);
}

#[test]
fn test_function_table_collects_name_as_value_uses() {
    let output = run(vec![
        function("helper", DataType::Void, Vec::new(), Vec::new()),
        main_with(vec![expression_statement(expr(ExpressionKind::AddressOf(
            Box::new(Expression::ident("helper")),
        )))]),
    ])
    .unwrap();
    assert_eq!(output.module.function_table, vec!["helper".to_string()]);
}

#[test]
fn test_plain_calls_stay_out_of_function_table() {
    let output = run(vec![
        function("helper", DataType::Void, Vec::new(), Vec::new()),
        main_with(vec![expression_statement(call("helper", Vec::new()))]),
    ])
    .unwrap();
    assert!(output.module.function_table.is_empty());
}

#[test]
fn test_break_and_continue_placement() {
    let break_items = vec![main_with(vec![BlockItem::Statement(stmt(
        StatementKind::Break,
    ))])];
    assert_eq!(
        error_message(run(break_items)),
        "break statement not within a switch or loop body"
    );

    let continue_items = vec![main_with(vec![BlockItem::Statement(stmt(
        StatementKind::Continue,
    ))])];
    assert_eq!(
        error_message(run(continue_items)),
        "continue statement not within a loop body"
    );
}

#[test]
fn test_duplicate_case_value_message() {
    let case = |value, body| SwitchCase {
        value: Expression::int_const(value),
        body,
        span: sp(),
    };
    let items = vec![main_with(vec![BlockItem::Statement(stmt(
        StatementKind::Switch {
            condition: Expression::int_const(1),
            cases: vec![case(1, Vec::new()), case(1, Vec::new())],
            default: None,
        },
    ))])];
    assert_eq!(error_message(run(items)), "duplicate case value");
}

#[test]
fn test_switch_quantity_message() {
    let items = vec![main_with(vec![BlockItem::Statement(stmt(
        StatementKind::Switch {
            condition: expr(ExpressionKind::FloatConstant {
                value: 1.5,
                is_float: false,
            }),
            cases: Vec::new(),
            default: None,
        },
    ))])];
    assert_eq!(error_message(run(items)), "switch quantity is not an integer");
}

#[test]
fn test_sizeof_in_data_initializer() {
    let output = run(vec![
        var_decl(
            "s",
            DataType::primary(PrimaryType::UnsignedLong),
            Some(single(expr(ExpressionKind::SizeofType(DataType::primary(
                PrimaryType::SignedLong,
            ))))),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    assert_eq!(
        output.module.data_segment,
        "\\08\\00\\00\\00\\00\\00\\00\\00"
    );
}

#[test]
fn test_enumerators_fold_into_initializers() {
    let output = run(vec![
        TopLevelItem::EnumDeclaration(EnumDeclaration {
            tag: Some("color".to_string()),
            members: vec![
                EnumMember {
                    name: "RED".to_string(),
                    value: None,
                },
                EnumMember {
                    name: "GREEN".to_string(),
                    value: None,
                },
                EnumMember {
                    name: "BLUE".to_string(),
                    value: Some(Expression::int_const(10)),
                },
            ],
            span: sp(),
        }),
        var_decl("c", int_t(), Some(single(Expression::ident("BLUE")))),
        var_decl("g", int_t(), Some(single(Expression::ident("GREEN")))),
        main_with(Vec::new()),
    ])
    .unwrap();
    assert_eq!(
        output.module.data_segment,
        "\\0a\\00\\00\\00\\01\\00\\00\\00"
    );
}

#[test]
fn test_typedef_resolution() {
    let mut typedef = Declaration::variable("word", int_t(), None);
    typedef
        .storage_classes
        .push(wcc_ast::StorageClassSpecifier::Typedef);
    let output = run(vec![
        TopLevelItem::Declaration(typedef),
        var_decl(
            "w",
            DataType::Named("word".to_string()),
            Some(single(Expression::int_const(3))),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    assert_eq!(output.module.data_segment, "\\03\\00\\00\\00");
}

#[test]
fn test_struct_self_pointer_declaration_and_null_init() {
    let node = DataType::Struct {
        tag: Some("node".to_string()),
        fields: Some(vec![
            StructField {
                name: "value".to_string(),
                data_type: int_t(),
            },
            StructField {
                name: "next".to_string(),
                data_type: DataType::StructSelfPointer,
            },
        ]),
    };
    let output = run(vec![
        var_decl(
            "head",
            node,
            Some(list(vec![
                single(Expression::int_const(7)),
                single(Expression::int_const(0)),
            ])),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    // 4 bytes of value, 4 bytes of null pointer, packed
    assert_eq!(output.module.data_segment, "\\07\\00\\00\\00\\00\\00\\00\\00");
}

#[test]
fn test_nested_brace_initializer_zero_fills() {
    let grid = DataType::array_of(DataType::array_of(int_t(), 2), 2);
    let output = run(vec![
        var_decl(
            "g",
            grid,
            Some(list(vec![
                list(vec![single(Expression::int_const(1))]),
                list(vec![single(Expression::int_const(2)), single(Expression::int_const(3))]),
            ])),
        ),
        main_with(Vec::new()),
    ])
    .unwrap();
    // {1, 0} then {2, 3}
    assert_eq!(
        output.module.data_segment,
        "\\01\\00\\00\\00\\00\\00\\00\\00\\02\\00\\00\\00\\03\\00\\00\\00"
    );
}
