//! Statement processing
//!
//! Lowers blocks, selection, iteration, and jumps. This layer owns source
//! positions: expression-level failures are attached to the span of the
//! statement being processed.

use crate::constfold::{wrap_integer, Evaluator};
use crate::errors::ProcessingError;
use crate::expressions::{convert_scalar, effects_of};
use crate::processor::Processor;
use crate::types;
use wcc_ast::{
    BlockItem, DataType, Expression, ForInit, PrimaryType, Statement, StatementKind, SwitchCase,
};
use wcc_common::CompilerError;
use wcc_ir as ir;
use wcc_ir::Address;

impl Processor {
    /// Process the items of a block into `out`. The caller owns the scope.
    pub(crate) fn process_block_items(
        &mut self,
        items: &[BlockItem],
        out: &mut Vec<ir::Statement>,
    ) -> Result<(), CompilerError> {
        for item in items {
            match item {
                BlockItem::Statement(statement) => self.process_statement(statement, out)?,
                BlockItem::Declaration(declaration) => {
                    self.process_declaration(declaration, Some(&mut *out))?
                }
            }
        }
        Ok(())
    }

    pub(crate) fn process_statement(
        &mut self,
        statement: &Statement,
        out: &mut Vec<ir::Statement>,
    ) -> Result<(), CompilerError> {
        let span = &statement.span;
        match &statement.kind {
            StatementKind::Compound(items) => {
                self.symbols.push_scope();
                let result = self.process_block_items(items, out);
                self.symbols.pop_scope();
                result
            }
            StatementKind::Expression(expr) => {
                let typed = self.process_value(expr).map_err(|e| e.at(span))?;
                let effects = effects_of(typed);
                if effects.is_empty() {
                    self.reporter
                        .warning("statement with no effect".to_string(), span.clone());
                }
                out.extend(effects);
                Ok(())
            }
            StatementKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let test = self.process_condition(condition).map_err(|e| e.at(span))?;
                let mut then_statements = Vec::new();
                self.process_statement(then_branch, &mut then_statements)?;
                let mut else_statements = Vec::new();
                if let Some(else_branch) = else_branch {
                    self.process_statement(else_branch, &mut else_statements)?;
                }
                out.push(ir::Statement::If {
                    condition: test,
                    then_statements,
                    else_statements,
                });
                Ok(())
            }
            StatementKind::Switch {
                condition,
                cases,
                default,
            } => self.process_switch(condition, cases, default.as_deref(), statement, out),
            StatementKind::While { condition, body } => {
                let test = self.process_condition(condition).map_err(|e| e.at(span))?;
                let body = self.process_loop_body(body)?;
                out.push(ir::Statement::Loop {
                    check_condition_first: true,
                    condition: Some(test),
                    body,
                    step: Vec::new(),
                });
                Ok(())
            }
            StatementKind::DoWhile { body, condition } => {
                let body = self.process_loop_body(body)?;
                let test = self.process_condition(condition).map_err(|e| e.at(span))?;
                out.push(ir::Statement::Loop {
                    check_condition_first: false,
                    condition: Some(test),
                    body,
                    step: Vec::new(),
                });
                Ok(())
            }
            StatementKind::For {
                init,
                condition,
                step,
                body,
            } => {
                // The initializer clause scopes over the whole loop
                self.symbols.push_scope();
                let result = self.process_for(init.as_ref(), condition.as_ref(), step.as_ref(), body, statement, out);
                self.symbols.pop_scope();
                result
            }
            StatementKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    return Err(ProcessingError::BreakOutsideLoopOrSwitch.at(span));
                }
                out.push(ir::Statement::Break);
                Ok(())
            }
            StatementKind::Continue => {
                if self.loop_depth == 0 {
                    return Err(ProcessingError::ContinueOutsideLoop.at(span));
                }
                out.push(ir::Statement::Continue);
                Ok(())
            }
            StatementKind::Return(expr) => self.process_return(expr.as_ref(), statement, out),
            StatementKind::Empty => Ok(()),
        }
    }

    /// A scalar condition, normalized to an `I32` truth value
    fn process_condition(&mut self, expr: &Expression) -> Result<ir::Expression, ProcessingError> {
        let typed = self.process_decayed(expr)?;
        if !typed.data_type.is_scalar() {
            return Err(ProcessingError::ScalarRequired {
                data_type: typed.data_type.to_string(),
            });
        }
        Self::boolean_value(typed)
    }

    fn process_loop_body(&mut self, body: &Statement) -> Result<Vec<ir::Statement>, CompilerError> {
        self.loop_depth += 1;
        self.symbols.push_scope();
        let mut statements = Vec::new();
        let result = self.process_statement(body, &mut statements);
        self.symbols.pop_scope();
        self.loop_depth -= 1;
        result.map(|()| statements)
    }

    fn process_for(
        &mut self,
        init: Option<&ForInit>,
        condition: Option<&Expression>,
        step: Option<&Expression>,
        body: &Statement,
        statement: &Statement,
        out: &mut Vec<ir::Statement>,
    ) -> Result<(), CompilerError> {
        let span = &statement.span;
        match init {
            Some(ForInit::Declaration(declaration)) => {
                self.process_declaration(declaration, Some(&mut *out))?;
            }
            Some(ForInit::Expression(expr)) => {
                let typed = self.process_value(expr).map_err(|e| e.at(span))?;
                out.extend(effects_of(typed));
            }
            None => {}
        }
        let test = condition
            .map(|c| self.process_condition(c))
            .transpose()
            .map_err(|e| e.at(span))?;
        let step_statements = match step {
            Some(expr) => {
                let typed = self.process_value(expr).map_err(|e| e.at(span))?;
                effects_of(typed)
            }
            None => Vec::new(),
        };
        let body = self.process_loop_body(body)?;
        out.push(ir::Statement::Loop {
            check_condition_first: true,
            condition: test,
            body,
            step: step_statements,
        });
        Ok(())
    }

    fn process_switch(
        &mut self,
        condition: &Expression,
        cases: &[SwitchCase],
        default: Option<&[BlockItem]>,
        statement: &Statement,
        out: &mut Vec<ir::Statement>,
    ) -> Result<(), CompilerError> {
        let span = &statement.span;
        let scrutinee = self.process_decayed(condition).map_err(|e| e.at(span))?;
        if !scrutinee.data_type.is_integer() {
            return Err(ProcessingError::SwitchNotInteger.at(span));
        }
        let primary = types::arithmetic_primary(&scrutinee.data_type)
            .ok_or_else(|| ProcessingError::SwitchNotInteger.at(span))?;
        let promoted = types::promote(primary);
        let scalar_type = types::primary_scalar(promoted);
        let value = convert_scalar(
            scrutinee.into_scalar().map_err(|e| e.at(span))?,
            scalar_type,
        );

        self.symbols.push_scope();
        self.switch_depth += 1;
        let result = self.process_switch_arms(cases, default, promoted);
        self.switch_depth -= 1;
        self.symbols.pop_scope();
        let (arms, default_statements) = result?;

        out.push(ir::Statement::Switch {
            condition: value,
            cases: arms,
            default: default_statements,
        });
        Ok(())
    }

    fn process_switch_arms(
        &mut self,
        cases: &[SwitchCase],
        default: Option<&[BlockItem]>,
        promoted: PrimaryType,
    ) -> Result<(Vec<ir::SwitchArm>, Vec<ir::Statement>), CompilerError> {
        let mut arms = Vec::with_capacity(cases.len());
        let mut seen = Vec::with_capacity(cases.len());
        for case in cases {
            let folded = Evaluator::new(&mut self.symbols)
                .evaluate_integer(&case.value)
                .map_err(|_| ProcessingError::CaseNotConstant.at(&case.span))?;
            let value = wrap_integer(folded.0, promoted) as i64;
            if seen.contains(&value) {
                return Err(ProcessingError::DuplicateCaseValue.at(&case.span));
            }
            seen.push(value);
            let mut body = Vec::new();
            self.process_block_items(&case.body, &mut body)?;
            arms.push(ir::SwitchArm { value, body });
        }
        let mut default_statements = Vec::new();
        if let Some(items) = default {
            self.process_block_items(items, &mut default_statements)?;
        }
        Ok((arms, default_statements))
    }

    fn process_return(
        &mut self,
        expr: Option<&Expression>,
        statement: &Statement,
        out: &mut Vec<ir::Statement>,
    ) -> Result<(), CompilerError> {
        let span = &statement.span;
        let return_type = self.return_type.clone().ok_or_else(|| {
            ProcessingError::internal("return statement outside a function").at(span)
        })?;
        let Some(expr) = expr else {
            if return_type != DataType::Void {
                self.reporter.warning(
                    "return with no value in function returning non-void".to_string(),
                    span.clone(),
                );
            }
            out.push(ir::Statement::Return);
            return Ok(());
        };
        if return_type == DataType::Void {
            let typed = self.process_value(expr).map_err(|e| e.at(span))?;
            if typed.data_type != DataType::Void {
                return Err(ProcessingError::ReturnTypeMismatch {
                    lhs: DataType::Void.to_string(),
                    rhs: typed.data_type.to_string(),
                }
                .at(span));
            }
            out.extend(effects_of(typed));
            out.push(ir::Statement::Return);
            return Ok(());
        }
        let value = self.process_decayed(expr).map_err(|e| e.at(span))?;
        let null = return_type.is_pointer()
            && value.data_type.is_integer()
            && self.is_null_constant(expr);
        if !types::can_assign(&return_type, &value.data_type, null) {
            return Err(ProcessingError::ReturnTypeMismatch {
                lhs: return_type.to_string(),
                rhs: value.data_type.to_string(),
            }
            .at(span));
        }
        let base = ir::Expression::AddressOf(Address::Return { offset: 0 });
        let stores = self
            .store_object(&return_type, &base, value)
            .map_err(|e| e.at(span))?;
        out.extend(stores);
        out.push(ir::Statement::Return);
        Ok(())
    }
}
