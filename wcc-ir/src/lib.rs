//! wcc C-to-WebAssembly compiler - Intermediate Representation
//!
//! The typed, memory-addressed tree produced by the processor and consumed
//! by the WebAssembly emitter. Aggregate values never appear here: every
//! expression and store operates on one machine scalar, and composite C
//! objects have already been unpacked into flat sequences of scalars in
//! layout order.
//!
//! Memory contract: each function executes against a frame pointer. Its
//! parameters live at non-negative offsets in declaration order, its locals
//! are packed downward at negative offsets, and the return area sits
//! directly above the parameter area. A callee stores its return scalars to
//! the return area; the caller reads them back through `Address::Return`
//! immediately after the call statement.

pub mod expressions;
pub mod module;
pub mod scalar;
pub mod statements;

pub use expressions::{Address, BinaryOp, Expression, UnaryOp};
pub use module::{encode_data_segment, ExternalFunction, Function, FunctionLayout, Module, ScalarSlot};
pub use scalar::ScalarType;
pub use statements::{Callee, CallSignature, FunctionCall, Statement, SwitchArm};
