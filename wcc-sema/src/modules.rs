//! Module repository input
//!
//! The runtime-import catalog handed to the processor: for every module a
//! source file can include, the function signatures that module exports.
//! Recognized signatures are copied into the produced IR so the emitter can
//! generate imports.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use wcc_ast::DataType;

/// One exported function of a module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleFunction {
    pub name: String,
    /// Must be function-typed
    pub data_type: DataType,
}

/// The exports of one module, in declaration order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleSignatures {
    pub functions: Vec<ModuleFunction>,
}

/// All modules known to the host environment
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ModuleRepository {
    pub modules: HashMap<String, ModuleSignatures>,
}

impl ModuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&ModuleSignatures> {
        self.modules.get(name)
    }

    /// Register one module's exports, replacing any previous entry
    pub fn insert(&mut self, name: &str, functions: Vec<ModuleFunction>) {
        self.modules
            .insert(name.to_string(), ModuleSignatures { functions });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcc_ast::PrimaryType;

    #[test]
    fn test_repository_lookup() {
        let mut repository = ModuleRepository::new();
        repository.insert(
            "stdio",
            vec![ModuleFunction {
                name: "print_int".to_string(),
                data_type: DataType::Function {
                    return_type: Box::new(DataType::Void),
                    parameters: vec![DataType::primary(PrimaryType::SignedInt)],
                },
            }],
        );

        assert!(repository.get("stdio").is_some());
        assert!(repository.get("math").is_none());
        assert_eq!(repository.get("stdio").unwrap().functions.len(), 1);
    }
}
