//! Scoped symbol table
//!
//! Owns the identifier and tag namespaces, the frame-offset allocator for
//! the function being processed, the append-only data segment, and the
//! indirect-call function table. The root scope is created by the table and
//! never popped.

use crate::errors::{ProcessingError, TagKind};
use crate::types;
use std::collections::HashMap;
use wcc_ast::DataType;

/// What an identifier is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum SymbolEntry {
    /// A stack object; the offset is negative for locals and non-negative
    /// for parameters, measured from the frame pointer
    LocalVariable { data_type: DataType, offset: i32 },

    /// An object at an absolute offset in the data segment
    DataVariable { data_type: DataType, offset: u32 },

    Function {
        data_type: DataType,
        defined: bool,
        /// Imported from an included module rather than defined here
        external: bool,
    },

    Typedef { data_type: DataType },

    /// Enumerators are signed int constants
    Enumerator { value: i128 },
}

impl SymbolEntry {
    /// The declared type of this entry; enumerators read as signed int
    pub fn data_type(&self) -> DataType {
        match self {
            SymbolEntry::LocalVariable { data_type, .. }
            | SymbolEntry::DataVariable { data_type, .. }
            | SymbolEntry::Function { data_type, .. }
            | SymbolEntry::Typedef { data_type } => data_type.clone(),
            SymbolEntry::Enumerator { .. } => {
                DataType::primary(wcc_ast::PrimaryType::SignedInt)
            }
        }
    }
}

#[derive(Debug, Default)]
struct Scope {
    symbols: HashMap<String, SymbolEntry>,
    tags: HashMap<String, DataType>,
}

/// The lexically scoped symbol table
#[derive(Debug)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    data_segment: Vec<u8>,
    function_table: Vec<String>,
    /// Next free local offset, growing downward from the frame pointer
    next_local_offset: i32,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
            data_segment: Vec::new(),
            function_table: Vec::new(),
            next_local_offset: 0,
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        debug_assert!(self.scopes.len() > 1, "root scope is never popped");
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn declare_in(scope: &mut Scope, name: &str, entry: SymbolEntry) -> Result<(), ProcessingError> {
        match (scope.symbols.get_mut(name), &entry) {
            (None, _) => {
                scope.symbols.insert(name.to_string(), entry);
                Ok(())
            }
            (
                Some(SymbolEntry::Function {
                    data_type: existing,
                    defined: already_defined,
                    external,
                }),
                SymbolEntry::Function {
                    data_type: new_type,
                    defined,
                    ..
                },
            ) => {
                if !*external
                    && types::is_compatible(existing, new_type, false)
                    && !(*already_defined && *defined)
                {
                    *already_defined = *already_defined || *defined;
                    Ok(())
                } else {
                    Err(ProcessingError::Redeclaration {
                        name: name.to_string(),
                    })
                }
            }
            _ => Err(ProcessingError::Redeclaration {
                name: name.to_string(),
            }),
        }
    }

    /// Bind `name` in the current scope, enforcing the redeclaration
    /// policy: a function may be re-declared with a compatible signature
    /// (at most one definition); everything else conflicts.
    pub fn declare(&mut self, name: &str, entry: SymbolEntry) -> Result<(), ProcessingError> {
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        Self::declare_in(scope, name, entry)
    }

    /// Bind `name` in the root scope regardless of the current scope depth
    pub fn declare_global(&mut self, name: &str, entry: SymbolEntry) -> Result<(), ProcessingError> {
        let root = self.scopes.first_mut().expect("scope stack is never empty");
        Self::declare_in(root, name, entry)
    }

    /// Look `name` up, walking from the innermost scope outward
    pub fn lookup(&self, name: &str) -> Option<&SymbolEntry> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.symbols.get(name))
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Register a struct or enum tag in the current scope
    pub fn declare_tag(
        &mut self,
        tag: &str,
        data_type: DataType,
    ) -> Result<(), ProcessingError> {
        let kind = match &data_type {
            DataType::Struct { .. } => TagKind::Struct,
            DataType::Enum { .. } => TagKind::Enum,
            other => {
                return Err(ProcessingError::internal(format!(
                    "'{}' is not a tag type",
                    other
                )))
            }
        };
        let scope = self.scopes.last_mut().expect("scope stack is never empty");
        if let Some(existing) = scope.tags.get(tag) {
            let existing_kind = match existing {
                DataType::Struct { .. } => TagKind::Struct,
                _ => TagKind::Enum,
            };
            if existing_kind == kind {
                return Err(ProcessingError::TagRedefinition {
                    kind,
                    tag: tag.to_string(),
                });
            }
            return Err(ProcessingError::WrongKindOfTag {
                tag: tag.to_string(),
            });
        }
        scope.tags.insert(tag.to_string(), data_type);
        Ok(())
    }

    /// Look a tag up in its own namespace, walking outward
    pub fn lookup_tag(&self, tag: &str) -> Option<&DataType> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.tags.get(tag))
    }

    /// Reset the frame allocator at function entry
    pub fn begin_function(&mut self) {
        self.next_local_offset = 0;
    }

    /// Reserve `size` bytes for a local, packing downward with alignment 1.
    /// Returns the (negative) frame offset of the object's first byte.
    pub fn allocate_local(&mut self, size: u32) -> i32 {
        self.next_local_offset -= size as i32;
        self.next_local_offset
    }

    /// Bytes of locals allocated since `begin_function`
    pub fn size_of_locals(&self) -> u32 {
        (-self.next_local_offset) as u32
    }

    /// Append initialized bytes to the data segment, returning the absolute
    /// offset where they begin. Append-only; no back-patching.
    pub fn allocate_data(&mut self, bytes: &[u8]) -> u32 {
        let offset = self.data_segment.len() as u32;
        self.data_segment.extend_from_slice(bytes);
        offset
    }

    pub fn data_segment(&self) -> &[u8] {
        &self.data_segment
    }

    /// The indirect-call index of `name`, assigning the next slot on first
    /// use
    pub fn function_table_index(&mut self, name: &str) -> u32 {
        if let Some(index) = self.function_table.iter().position(|n| n == name) {
            return index as u32;
        }
        self.function_table.push(name.to_string());
        (self.function_table.len() - 1) as u32
    }

    pub fn function_table(&self) -> &[String] {
        &self.function_table
    }

    pub fn into_artifacts(self) -> (Vec<u8>, Vec<String>) {
        (self.data_segment, self.function_table)
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wcc_ast::PrimaryType;

    fn int() -> DataType {
        DataType::primary(PrimaryType::SignedInt)
    }

    fn local(data_type: DataType, offset: i32) -> SymbolEntry {
        SymbolEntry::LocalVariable { data_type, offset }
    }

    fn function(parameters: Vec<DataType>, defined: bool) -> SymbolEntry {
        SymbolEntry::Function {
            data_type: DataType::Function {
                return_type: Box::new(int()),
                parameters,
            },
            defined,
            external: false,
        }
    }

    #[test]
    fn test_scoped_lookup() {
        let mut table = SymbolTable::new();
        table.declare("g", local(int(), -4)).unwrap();

        table.push_scope();
        table.declare("l", local(int(), -8)).unwrap();
        assert!(table.has_symbol("g"));
        assert!(table.has_symbol("l"));

        // Shadowing in an inner scope is fine
        table.push_scope();
        table.declare("g", local(int(), -12)).unwrap();
        assert!(matches!(
            table.lookup("g"),
            Some(SymbolEntry::LocalVariable { offset: -12, .. })
        ));
        table.pop_scope();

        table.pop_scope();
        assert!(!table.has_symbol("l"));
        assert!(matches!(
            table.lookup("g"),
            Some(SymbolEntry::LocalVariable { offset: -4, .. })
        ));
    }

    #[test]
    fn test_variable_redeclaration_rejected() {
        let mut table = SymbolTable::new();
        table.declare("x", local(int(), -4)).unwrap();
        assert_eq!(
            table.declare("x", local(int(), -8)),
            Err(ProcessingError::Redeclaration {
                name: "x".to_string()
            })
        );
    }

    #[test]
    fn test_function_redeclaration_policy() {
        let mut table = SymbolTable::new();
        table.declare("f", function(vec![int()], false)).unwrap();
        // A compatible prototype is allowed, then the definition
        table.declare("f", function(vec![int()], false)).unwrap();
        table.declare("f", function(vec![int()], true)).unwrap();
        assert!(matches!(
            table.lookup("f"),
            Some(SymbolEntry::Function { defined: true, .. })
        ));
        // A second body conflicts
        assert!(table.declare("f", function(vec![int()], true)).is_err());
        // An incompatible signature conflicts
        assert!(table
            .declare("f", function(vec![int(), int()], false))
            .is_err());
    }

    #[test]
    fn test_mixed_kind_redeclaration_rejected() {
        let mut table = SymbolTable::new();
        table.declare("t", SymbolEntry::Typedef { data_type: int() }).unwrap();
        assert!(table.declare("t", local(int(), -4)).is_err());
    }

    #[test]
    fn test_tag_namespace_is_separate() {
        let mut table = SymbolTable::new();
        table.declare("x", local(int(), -4)).unwrap();
        table
            .declare_tag(
                "x",
                DataType::Enum {
                    tag: Some("x".to_string()),
                    members: Some(Vec::new()),
                },
            )
            .unwrap();
        assert!(table.lookup_tag("x").is_some());
    }

    #[test]
    fn test_tag_redefinition_errors() {
        let mut table = SymbolTable::new();
        let enum_x = DataType::Enum {
            tag: Some("x".to_string()),
            members: Some(Vec::new()),
        };
        let struct_x = DataType::Struct {
            tag: Some("x".to_string()),
            fields: Some(Vec::new()),
        };
        table.declare_tag("x", enum_x.clone()).unwrap();
        assert_eq!(
            table.declare_tag("x", enum_x).unwrap_err().to_string(),
            "redefinition of 'enum x'"
        );
        assert_eq!(
            table.declare_tag("x", struct_x).unwrap_err().to_string(),
            "redefinition of 'x' as wrong kind of tag"
        );
    }

    #[test]
    fn test_local_allocation_packs_downward() {
        let mut table = SymbolTable::new();
        table.begin_function();
        assert_eq!(table.allocate_local(4), -4);
        assert_eq!(table.allocate_local(1), -5);
        assert_eq!(table.allocate_local(8), -13);
        assert_eq!(table.size_of_locals(), 13);

        table.begin_function();
        assert_eq!(table.size_of_locals(), 0);
    }

    #[test]
    fn test_data_segment_appends() {
        let mut table = SymbolTable::new();
        assert_eq!(table.allocate_data(&[1, 2, 3, 4]), 0);
        assert_eq!(table.allocate_data(&[5, 6]), 4);
        assert_eq!(table.data_segment(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_function_table_indices_are_stable() {
        let mut table = SymbolTable::new();
        assert_eq!(table.function_table_index("f"), 0);
        assert_eq!(table.function_table_index("g"), 1);
        assert_eq!(table.function_table_index("f"), 0);
        assert_eq!(table.function_table(), &["f".to_string(), "g".to_string()]);
    }
}
