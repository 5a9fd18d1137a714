//! Module root: functions, layouts, imports, and the data segment

use crate::scalar::ScalarType;
use crate::statements::Statement;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One unpacked primary scalar within a parameter or return object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScalarSlot {
    /// Byte offset within the owning area (parameter area or return area)
    pub offset: u32,
    pub scalar_type: ScalarType,
}

/// The unpacked memory shape of a function's parameters and return object
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FunctionLayout {
    pub parameters: Vec<ScalarSlot>,
    pub returns: Vec<ScalarSlot>,
    pub size_of_parameters: u32,
    pub size_of_return: u32,
}

impl FunctionLayout {
    /// The parameter scalar types in layout order
    pub fn parameter_scalars(&self) -> Vec<ScalarType> {
        self.parameters.iter().map(|slot| slot.scalar_type).collect()
    }

    /// The return scalar types in layout order
    pub fn return_scalars(&self) -> Vec<ScalarType> {
        self.returns.iter().map(|slot| slot.scalar_type).collect()
    }
}

/// A processed function definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub layout: FunctionLayout,
    /// Total bytes of locals, packed downward from the frame pointer
    pub size_of_locals: u32,
    pub body: Vec<Statement>,
}

/// An imported function signature, copied from the module repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalFunction {
    pub module: String,
    pub name: String,
    pub layout: FunctionLayout,
}

/// The processed translation unit handed to the WebAssembly emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    /// Defined functions in source order
    pub functions: Vec<Function>,
    /// `\XX`-encoded initialized memory, little-endian per scalar
    pub data_segment: String,
    pub data_segment_size: u32,
    pub external_functions: Vec<ExternalFunction>,
    /// Functions referenced as values, in first-use order; the position is
    /// the indirect-call index
    pub function_table: Vec<String>,
}

/// Encode raw data-segment bytes as `\XX` pairs
pub fn encode_data_segment(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 3);
    for byte in bytes {
        encoded.push('\\');
        encoded.push_str(&format!("{:02x}", byte));
    }
    encoded
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "func {}(", self.name)?;
        for (i, slot) in self.layout.parameters.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}@{}", slot.scalar_type, slot.offset)?;
        }
        write!(f, ")")?;
        if !self.layout.returns.is_empty() {
            write!(f, " -> (")?;
            for (i, slot) in self.layout.returns.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}@{}", slot.scalar_type, slot.offset)?;
            }
            write!(f, ")")?;
        }
        writeln!(f, " locals={}", self.size_of_locals)?;
        for stmt in &self.body {
            writeln!(f, "  {}", stmt)?;
        }
        Ok(())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module")?;
        for ext in &self.external_functions {
            writeln!(
                f,
                "  import {}.{} ({} param bytes, {} return bytes)",
                ext.module, ext.name, ext.layout.size_of_parameters, ext.layout.size_of_return
            )?;
        }
        if !self.function_table.is_empty() {
            writeln!(f, "  table [{}]", self.function_table.join(", "))?;
        }
        writeln!(f, "  data ({} bytes) \"{}\"", self.data_segment_size, self.data_segment)?;
        for function in &self.functions {
            write!(f, "{}", function)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_data_segment() {
        assert_eq!(encode_data_segment(&[]), "");
        assert_eq!(
            encode_data_segment(&[0x0a, 0x00, 0x00, 0x00, 0x14, 0x00, 0x00, 0x00]),
            "\\0a\\00\\00\\00\\14\\00\\00\\00"
        );
        assert_eq!(encode_data_segment(&[0xf6, 0xff, 0xff, 0xff]), "\\f6\\ff\\ff\\ff");
    }

    #[test]
    fn test_layout_scalars() {
        let layout = FunctionLayout {
            parameters: vec![
                ScalarSlot {
                    offset: 0,
                    scalar_type: ScalarType::I32,
                },
                ScalarSlot {
                    offset: 4,
                    scalar_type: ScalarType::F64,
                },
            ],
            returns: vec![ScalarSlot {
                offset: 0,
                scalar_type: ScalarType::I32,
            }],
            size_of_parameters: 12,
            size_of_return: 4,
        };
        assert_eq!(
            layout.parameter_scalars(),
            vec![ScalarType::I32, ScalarType::F64]
        );
        assert_eq!(layout.return_scalars(), vec![ScalarType::I32]);
    }
}
