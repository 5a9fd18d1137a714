//! IR statement nodes

use crate::expressions::Expression;
use crate::scalar::ScalarType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// An IR statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// Store one scalar to memory
    MemoryStore {
        address: Expression,
        value: Expression,
        scalar_type: ScalarType,
    },

    If {
        condition: Expression,
        then_statements: Vec<Statement>,
        else_statements: Vec<Statement>,
    },

    /// Integer selection; `Break` exits the switch
    Switch {
        condition: Expression,
        cases: Vec<SwitchArm>,
        default: Vec<Statement>,
    },

    /// A loop; `step` runs after the body and on `continue`. When
    /// `check_condition_first` is false the first iteration skips the test
    /// (do-while).
    Loop {
        check_condition_first: bool,
        condition: Option<Expression>,
        body: Vec<Statement>,
        step: Vec<Statement>,
    },

    Break,
    Continue,

    /// Return to the caller; return scalars have already been stored to the
    /// return area
    Return,

    /// A call whose results (if any) are not read here
    Call(FunctionCall),
}

/// One arm of an IR switch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwitchArm {
    pub value: i64,
    pub body: Vec<Statement>,
}

/// The unpacked scalar shape of a call target, needed for indirect calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSignature {
    pub parameters: Vec<ScalarType>,
    pub returns: Vec<ScalarType>,
}

/// A call target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Callee {
    /// A function defined in this module or imported from an included module
    Named(String),

    /// A call through a function-table index computed at runtime
    Indirect {
        target: Box<Expression>,
        signature: CallSignature,
    },
}

/// A function call; `arguments` is the concatenation of every argument's
/// unpacked scalars in parameter layout order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub callee: Callee,
    pub arguments: Vec<Expression>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.callee {
            Callee::Named(name) => write!(f, "call {}(", name)?,
            Callee::Indirect { target, .. } => write!(f, "call_indirect {}(", target)?,
        }
        for (i, arg) in self.arguments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

impl Statement {
    fn fmt_block(f: &mut fmt::Formatter<'_>, statements: &[Statement]) -> fmt::Result {
        write!(f, "{{")?;
        for (i, stmt) in statements.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", stmt)?;
        }
        write!(f, "}}")
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::MemoryStore {
                address,
                value,
                scalar_type,
            } => write!(f, "store.{} ({}) <- {}", scalar_type, address, value),
            Statement::If {
                condition,
                then_statements,
                else_statements,
            } => {
                write!(f, "if {} ", condition)?;
                Statement::fmt_block(f, then_statements)?;
                if !else_statements.is_empty() {
                    write!(f, " else ")?;
                    Statement::fmt_block(f, else_statements)?;
                }
                Ok(())
            }
            Statement::Switch {
                condition,
                cases,
                default,
            } => {
                write!(f, "switch {} ", condition)?;
                write!(f, "{{")?;
                for arm in cases {
                    write!(f, "case {}: ", arm.value)?;
                    Statement::fmt_block(f, &arm.body)?;
                    write!(f, " ")?;
                }
                write!(f, "default: ")?;
                Statement::fmt_block(f, default)?;
                write!(f, "}}")
            }
            Statement::Loop {
                check_condition_first,
                condition,
                body,
                step,
            } => {
                let keyword = if *check_condition_first {
                    "loop"
                } else {
                    "do-loop"
                };
                match condition {
                    Some(cond) => write!(f, "{} while {} ", keyword, cond)?,
                    None => write!(f, "{} ", keyword)?,
                }
                Statement::fmt_block(f, body)?;
                if !step.is_empty() {
                    write!(f, " step ")?;
                    Statement::fmt_block(f, step)?;
                }
                Ok(())
            }
            Statement::Break => write!(f, "break"),
            Statement::Continue => write!(f, "continue"),
            Statement::Return => write!(f, "return"),
            Statement::Call(call) => write!(f, "{}", call),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expressions::Address;

    #[test]
    fn test_store_display() {
        let stmt = Statement::MemoryStore {
            address: Expression::AddressOf(Address::Local { offset: -4 }),
            value: Expression::int_const(7, ScalarType::I32),
            scalar_type: ScalarType::I32,
        };
        assert_eq!(stmt.to_string(), "store.i32 (local[-4]) <- const.i32 7");
    }

    #[test]
    fn test_call_display() {
        let call = FunctionCall {
            callee: Callee::Named("print_int".to_string()),
            arguments: vec![Expression::int_const(30, ScalarType::I32)],
        };
        assert_eq!(call.to_string(), "call print_int(const.i32 30)");
    }
}
