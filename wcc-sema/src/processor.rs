//! The processor: top-level driver and declaration handling
//!
//! A single synchronous pass over the parsed translation unit. One
//! `Processor` serves one compilation; `run` consumes it, so a second
//! invocation needs a fresh instance.

use crate::constfold::{wrap_integer, Evaluator};
use crate::errors::ProcessingError;
use crate::modules::ModuleRepository;
use crate::symbols::{SymbolEntry, SymbolTable};
use crate::types;
use log::{debug, trace};
use wcc_ast::{
    DataType, Declaration, EnumMember, FunctionDefinition, InitDeclarator, PrimaryType,
    StorageClassSpecifier, TopLevelItem, TranslationUnit,
};
use wcc_common::{CompilerError, Diagnostic, ErrorReporter, SourceSpan};
use wcc_ir as ir;
use wcc_ir::Address;

/// The produced IR together with the non-fatal diagnostics collected on
/// the way
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedOutput {
    pub module: ir::Module,
    pub warnings: Vec<Diagnostic>,
}

/// Processor state threaded through declaration, statement, and expression
/// handling
pub struct Processor {
    pub(crate) symbols: SymbolTable,
    pub(crate) modules: ModuleRepository,
    pub(crate) reporter: ErrorReporter,
    pub(crate) functions: Vec<ir::Function>,
    pub(crate) external_functions: Vec<ir::ExternalFunction>,
    /// Return type of the function being processed
    pub(crate) return_type: Option<DataType>,
    pub(crate) loop_depth: u32,
    pub(crate) switch_depth: u32,
}

impl Processor {
    pub fn new(modules: ModuleRepository) -> Self {
        Self {
            symbols: SymbolTable::new(),
            modules,
            reporter: ErrorReporter::new(),
            functions: Vec::new(),
            external_functions: Vec::new(),
            return_type: None,
            loop_depth: 0,
            switch_depth: 0,
        }
    }

    /// Process a translation unit into a module. Consumes the processor.
    pub fn run(mut self, root: &TranslationUnit) -> Result<ProcessedOutput, CompilerError> {
        self.register_included_modules(root)?;

        for item in &root.items {
            match item {
                TopLevelItem::Function(definition) => self.process_function(definition)?,
                TopLevelItem::Declaration(declaration) => {
                    self.process_declaration(declaration, None)?
                }
                TopLevelItem::EnumDeclaration(declaration) => self
                    .register_enum(declaration.tag.as_deref(), &declaration.members)
                    .map_err(|e| e.at(&declaration.span))?,
            }
        }

        let main_defined = matches!(
            self.symbols.lookup("main"),
            Some(SymbolEntry::Function {
                defined: true,
                external: false,
                ..
            })
        );
        if !main_defined {
            return Err(ProcessingError::MainNotDefined.at(&SourceSpan::dummy()));
        }

        let warnings = self.reporter.take_diagnostics();
        let (data, function_table) = self.symbols.into_artifacts();
        debug!(
            "processed {} function(s), {} data bytes, {} import(s)",
            self.functions.len(),
            data.len(),
            self.external_functions.len()
        );
        Ok(ProcessedOutput {
            module: ir::Module {
                functions: self.functions,
                data_segment: ir::encode_data_segment(&data),
                data_segment_size: data.len() as u32,
                external_functions: self.external_functions,
                function_table,
            },
            warnings,
        })
    }

    pub(crate) fn resolve_type(
        &mut self,
        data_type: &DataType,
    ) -> Result<DataType, ProcessingError> {
        Evaluator::new(&mut self.symbols).resolve_type(data_type)
    }

    /// Bind every function of every included module and record its import
    fn register_included_modules(&mut self, root: &TranslationUnit) -> Result<(), CompilerError> {
        for module_name in &root.included_modules {
            let Some(signatures) = self.modules.get(module_name).cloned() else {
                self.reporter.warning(
                    format!("unknown module '{}'", module_name),
                    SourceSpan::dummy(),
                );
                continue;
            };
            for function in signatures.functions {
                let resolved = self
                    .resolve_type(&function.data_type)
                    .map_err(|e| e.at(&SourceSpan::dummy()))?;
                let DataType::Function {
                    return_type,
                    parameters,
                } = &resolved
                else {
                    return Err(ProcessingError::internal(format!(
                        "module function '{}' is not function-typed",
                        function.name
                    ))
                    .at(&SourceSpan::dummy()));
                };
                let layout = self
                    .function_layout(return_type, parameters)
                    .map_err(|e| e.at(&SourceSpan::dummy()))?;
                self.symbols
                    .declare_global(
                        &function.name,
                        SymbolEntry::Function {
                            data_type: resolved.clone(),
                            defined: true,
                            external: true,
                        },
                    )
                    .map_err(|e| e.at(&SourceSpan::dummy()))?;
                trace!("imported {}.{}", module_name, function.name);
                self.external_functions.push(ir::ExternalFunction {
                    module: module_name.clone(),
                    name: function.name.clone(),
                    layout,
                });
            }
        }
        Ok(())
    }

    /// The unpacked parameter/return shape of a function type
    pub(crate) fn function_layout(
        &self,
        return_type: &DataType,
        parameters: &[DataType],
    ) -> Result<ir::FunctionLayout, ProcessingError> {
        let mut parameter_slots = Vec::new();
        let mut offset = 0;
        for parameter in parameters {
            for (field_offset, scalar_type) in types::unpack(parameter)? {
                parameter_slots.push(ir::ScalarSlot {
                    offset: offset + field_offset,
                    scalar_type,
                });
            }
            offset += types::size_of(parameter)?;
        }
        let (returns, size_of_return) = if *return_type == DataType::Void {
            (Vec::new(), 0)
        } else {
            let slots = types::unpack(return_type)?
                .into_iter()
                .map(|(field_offset, scalar_type)| ir::ScalarSlot {
                    offset: field_offset,
                    scalar_type,
                })
                .collect();
            (slots, types::size_of(return_type)?)
        };
        Ok(ir::FunctionLayout {
            parameters: parameter_slots,
            returns,
            size_of_parameters: offset,
            size_of_return,
        })
    }

    /// Process a declaration. `local_out` receives initializer stores for
    /// block-scope declarations; top-level objects go to the data segment.
    pub(crate) fn process_declaration(
        &mut self,
        declaration: &Declaration,
        mut local_out: Option<&mut Vec<ir::Statement>>,
    ) -> Result<(), CompilerError> {
        let span = &declaration.span;
        if declaration.storage_classes.len() > 1 {
            return Err(ProcessingError::MultipleStorageClasses {
                first: declaration.storage_classes[0].to_string(),
                second: declaration.storage_classes[1].to_string(),
            }
            .at(span));
        }

        if declaration.declarators.is_empty() {
            match &declaration.type_specifier {
                Some(DataType::Struct {
                    tag: Some(_),
                    fields: Some(_),
                })
                | Some(DataType::Enum {
                    members: Some(_), ..
                }) => {
                    if !declaration.storage_classes.is_empty() {
                        return Err(ProcessingError::UselessStorageClass.at(span));
                    }
                    return self
                        .register_specifier_tags(declaration)
                        .map_err(|e| e.at(span));
                }
                _ => {
                    if !declaration.storage_classes.is_empty() {
                        return Err(ProcessingError::UselessStorageClass.at(span));
                    }
                    return Err(ProcessingError::EmptyDeclaration.at(span));
                }
            }
        }

        if declaration.type_specifier.is_none() {
            return Err(ProcessingError::MissingTypeSpecifier {
                name: declaration.declarators[0].name.clone(),
            }
            .at(span));
        }
        self.register_specifier_tags(declaration)
            .map_err(|e| e.at(span))?;

        let is_typedef = declaration
            .storage_classes
            .contains(&StorageClassSpecifier::Typedef);
        for declarator in &declaration.declarators {
            self.process_declarator(declarator, is_typedef, local_out.as_deref_mut())
                .map_err(|e| e.at(&declarator.span))?;
        }
        Ok(())
    }

    /// Register the tags a declaration's type specifier defines (a struct
    /// body with a tag, or an enum body with its enumerators)
    fn register_specifier_tags(
        &mut self,
        declaration: &Declaration,
    ) -> Result<(), ProcessingError> {
        match &declaration.type_specifier {
            Some(
                specifier @ DataType::Struct {
                    tag: Some(tag),
                    fields: Some(_),
                },
            ) => {
                let resolved = self.resolve_type(specifier)?;
                self.symbols.declare_tag(tag, resolved)
            }
            Some(DataType::Enum {
                tag,
                members: Some(members),
            }) => {
                let tag = tag.clone();
                let members = members.clone();
                self.register_enum(tag.as_deref(), &members)
            }
            _ => Ok(()),
        }
    }

    /// Register an enum: its tag (when named) and its enumerators, with
    /// values defaulting to one past the previous member
    pub(crate) fn register_enum(
        &mut self,
        tag: Option<&str>,
        members: &[EnumMember],
    ) -> Result<(), ProcessingError> {
        let data_type = DataType::Enum {
            tag: tag.map(str::to_string),
            members: Some(members.to_vec()),
        };
        if let Some(tag) = tag {
            self.symbols.declare_tag(tag, data_type)?;
        }
        let mut next = 0i128;
        for member in members {
            let value = match &member.value {
                Some(expr) => {
                    let (value, _) = Evaluator::new(&mut self.symbols)
                        .evaluate_integer(expr)
                        .map_err(|err| match err {
                            ProcessingError::NotCompileTimeConstant => {
                                ProcessingError::CaseNotConstant
                            }
                            other => other,
                        })?;
                    wrap_integer(value, PrimaryType::SignedInt)
                }
                None => next,
            };
            self.symbols
                .declare(&member.name, SymbolEntry::Enumerator { value })?;
            next = wrap_integer(value + 1, PrimaryType::SignedInt);
        }
        Ok(())
    }

    fn process_declarator(
        &mut self,
        declarator: &InitDeclarator,
        is_typedef: bool,
        local_out: Option<&mut Vec<ir::Statement>>,
    ) -> Result<(), ProcessingError> {
        let name = &declarator.name;
        let resolved = self.resolve_type(&declarator.data_type)?;

        if is_typedef {
            return self
                .symbols
                .declare(name, SymbolEntry::Typedef { data_type: resolved });
        }

        match &resolved {
            DataType::Function { .. } => {
                if declarator.initializer.is_some() {
                    return Err(ProcessingError::FunctionInitialized { name: name.clone() });
                }
                self.symbols.declare(
                    name,
                    SymbolEntry::Function {
                        data_type: resolved,
                        defined: false,
                        external: false,
                    },
                )
            }
            DataType::Void => Err(ProcessingError::DeclaredVoid { name: name.clone() }),
            _ => match local_out {
                None => {
                    // Data-segment object: build the byte image first (any
                    // string literals inside the initializer land before
                    // the object itself), then bind the name
                    let bytes =
                        self.unpack_data_initializer(&resolved, declarator.initializer.as_ref())?;
                    let offset = self.symbols.allocate_data(&bytes);
                    trace!("data object '{}' at offset {}", name, offset);
                    self.symbols.declare(
                        name,
                        SymbolEntry::DataVariable {
                            data_type: resolved,
                            offset,
                        },
                    )
                }
                Some(out) => {
                    let size = types::size_of(&resolved)?;
                    let offset = self.symbols.allocate_local(size);
                    self.symbols.declare(
                        name,
                        SymbolEntry::LocalVariable {
                            data_type: resolved.clone(),
                            offset,
                        },
                    )?;
                    if let Some(initializer) = &declarator.initializer {
                        let base = ir::Expression::AddressOf(Address::Local { offset });
                        self.unpack_local_initializer(&resolved, base, initializer, out)?;
                    }
                    Ok(())
                }
            },
        }
    }

    fn process_function(&mut self, definition: &FunctionDefinition) -> Result<(), CompilerError> {
        let span = &definition.span;
        debug!("processing function '{}'", definition.name);
        let return_type = self
            .resolve_type(&definition.return_type)
            .map_err(|e| e.at(span))?;
        let mut parameter_types = Vec::with_capacity(definition.parameters.len());
        for parameter in &definition.parameters {
            parameter_types.push(
                self.resolve_type(&parameter.data_type)
                    .map_err(|e| e.at(&parameter.span))?,
            );
        }

        let function_type = DataType::Function {
            return_type: Box::new(return_type.clone()),
            parameters: parameter_types.clone(),
        };
        self.symbols
            .declare_global(
                &definition.name,
                SymbolEntry::Function {
                    data_type: function_type,
                    defined: true,
                    external: false,
                },
            )
            .map_err(|e| e.at(span))?;
        let layout = self
            .function_layout(&return_type, &parameter_types)
            .map_err(|e| e.at(span))?;

        self.symbols.push_scope();
        self.symbols.begin_function();
        let previous_return = self.return_type.replace(return_type);
        let result = self.process_function_body(definition, &parameter_types);
        self.return_type = previous_return;
        let size_of_locals = self.symbols.size_of_locals();
        self.symbols.pop_scope();
        let body = result?;

        self.functions.push(ir::Function {
            name: definition.name.clone(),
            layout,
            size_of_locals,
            body,
        });
        Ok(())
    }

    fn process_function_body(
        &mut self,
        definition: &FunctionDefinition,
        parameter_types: &[DataType],
    ) -> Result<Vec<ir::Statement>, CompilerError> {
        // Parameters sit at non-negative offsets, first parameter first
        let mut offset: i32 = 0;
        for (parameter, data_type) in definition.parameters.iter().zip(parameter_types) {
            let Some(name) = &parameter.name else {
                return Err(ProcessingError::ParameterNameOmitted.at(&parameter.span));
            };
            self.symbols
                .declare(
                    name,
                    SymbolEntry::LocalVariable {
                        data_type: data_type.clone(),
                        offset,
                    },
                )
                .map_err(|err| {
                    let err = match err {
                        ProcessingError::Redeclaration { name } => {
                            ProcessingError::ParameterRedefinition { name }
                        }
                        other => other,
                    };
                    err.at(&parameter.span)
                })?;
            offset += types::size_of(data_type).map_err(|e| e.at(&parameter.span))? as i32;
        }
        let mut body = Vec::new();
        self.process_block_items(&definition.body, &mut body)?;
        Ok(body)
    }
}
