//! Undo outlining: `x = f(args);` where `f` only returns an expression over
//! its parameters and globals becomes `x = (expr[params := args]);`.
//!
//! Targeted scans only consider calls to injected functions.

use std::collections::HashMap;

use shader_ast::markers::is_injected_name;
use shader_ast::visit::VisitorMut;
use shader_ast::{AssignOp, Expr, ExprKind, FunctionDecl, NodeId, StmtKind, TranslationUnit};

use crate::analysis::{NameUsage, Substitute, is_pure, parenthesize, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct OutlinedStatementFinder;

#[derive(Debug, Clone)]
pub struct OutlinedStatementOpportunity {
    stmt: NodeId,
    call: NodeId,
    callee: String,
}

/// The returned expression of a function whose body is a single `return`.
fn returned_expr(function: &FunctionDecl) -> Option<&Expr> {
    match function.body.stmts.as_slice() {
        [stmt] => match &stmt.kind {
            StmtKind::Return(Some(value)) => Some(value),
            _ => None,
        },
        _ => None,
    }
}

impl OpportunityFinder for OutlinedStatementFinder {
    type Opportunity = OutlinedStatementOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::OutlinedStatement
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<OutlinedStatementOpportunity>> {
        let mut found = Vec::new();
        for caller in unit.functions() {
            let caller_names = NameUsage::of_function(caller);
            for list in stmt_lists(caller) {
                for stmt in list.stmts {
                    let StmtKind::Expr(expr) = &stmt.kind else {
                        continue;
                    };
                    let ExprKind::Assign {
                        op: AssignOp::Assign,
                        value,
                        ..
                    } = &expr.kind
                    else {
                        continue;
                    };
                    let Some((callee, args)) = value.as_call() else {
                        continue;
                    };
                    if !context.exhaustive_scan() && !is_injected_name(callee) {
                        continue;
                    }
                    let Some(outlined) = unit.find_function(callee) else {
                        continue;
                    };
                    let Some(body) = returned_expr(outlined) else {
                        continue;
                    };
                    if !is_pure(unit, body) || !args.iter().all(|arg| is_pure(unit, arg)) {
                        continue;
                    }
                    let body_names = NameUsage::of_expr(body);
                    let resolvable = body_names.referenced_names().all(|name| {
                        outlined.param_index(name).is_some()
                            || (unit.find_global(name).is_some()
                                && caller_names.declarations(name) == 0)
                    });
                    if resolvable {
                        found.push(OutlinedStatementOpportunity {
                            stmt: stmt.id,
                            call: value.id,
                            callee: callee.to_owned(),
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for OutlinedStatementOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(args) = unit
            .find_expr(self.call)
            .and_then(|call| call.as_call())
            .map(|(_, args)| args.to_vec())
        else {
            stale(OpportunityKind::OutlinedStatement, self.call);
            return;
        };
        let Some((params, body)) = unit.find_function(&self.callee).and_then(|function| {
            let params: Vec<String> = function.params.iter().map(|p| p.name.clone()).collect();
            Some((params, returned_expr(function)?.clone()))
        }) else {
            stale(OpportunityKind::OutlinedStatement, self.call);
            return;
        };

        let mut bindings = HashMap::new();
        for (param, arg) in params.iter().zip(args) {
            let arg = parenthesize(unit, arg);
            bindings.insert(param.as_str(), arg);
        }
        let mut inlined = body;
        Substitute {
            bindings: &bindings,
        }
        .visit_expr_mut(&mut inlined);
        let mut inlined = parenthesize(unit, inlined);
        unit.refresh_ids_expr(&mut inlined);
        unit.replace_expr(self.call, inlined);
    }

    fn describe(&self) -> String {
        format!(
            "inline outlined call to '{}' in statement {}",
            self.callee, self.stmt
        )
    }
}
