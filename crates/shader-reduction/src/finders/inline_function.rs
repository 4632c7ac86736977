//! Inline a call to a small function at a statement of the form `f(args);`
//! or `x = f(args);`. The statement becomes a block that declares each
//! parameter from its argument, runs the callee's body, and finishes with
//! the returned value.
//!
//! Only callees whose single `return` is their last statement qualify, and
//! only when none of the callee's own names already occur in the caller.
//! Targeted scans only inline calls to injected functions.

use shader_ast::markers::is_injected_name;
use shader_ast::validation::stmt_contains_return;
use shader_ast::{
    AssignOp, Block, Expr, ExprKind, FunctionDecl, NodeId, Stmt, StmtKind, TranslationUnit, Type,
    VariableDecl,
};

use crate::analysis::{NameUsage, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

const MAX_INLINED_STMTS: usize = 8;

pub struct InlineFunctionFinder;

#[derive(Debug, Clone)]
pub struct InlineFunctionOpportunity {
    stmt: NodeId,
    callee: String,
}

/// A call statement: the assignment target, if any, and the call.
fn call_site(stmt: &Stmt) -> Option<(Option<&Expr>, &Expr)> {
    let StmtKind::Expr(expr) = &stmt.kind else {
        return None;
    };
    match &expr.kind {
        ExprKind::Call { .. } => Some((None, expr)),
        ExprKind::Assign {
            op: AssignOp::Assign,
            target,
            value,
        } if value.as_call().is_some() => Some((Some(&**target), &**value)),
        _ => None,
    }
}

/// The callee's statements before its final `return`, and the returned value.
fn split_body(function: &FunctionDecl) -> Option<(&[Stmt], Option<&Expr>)> {
    let stmts = function.body.stmts.as_slice();
    let (body, returned) = match stmts.split_last() {
        Some((last, rest)) => match &last.kind {
            StmtKind::Return(value) => (rest, value.as_ref()),
            _ => (stmts, None),
        },
        None => (stmts, None),
    };
    if body.iter().any(stmt_contains_return) {
        return None;
    }
    if function.return_ty != Type::Void && returned.is_none() {
        return None;
    }
    Some((body, returned))
}

fn is_inlinable(
    unit: &TranslationUnit,
    caller: &FunctionDecl,
    stmt: &Stmt,
    callee: &FunctionDecl,
) -> bool {
    if callee.name == "main"
        || callee.name == caller.name
        || callee.body.stmts.len() > MAX_INLINED_STMTS
        || split_body(callee).is_none()
    {
        return false;
    }
    let caller_usage = NameUsage::of_function(caller);
    let callee_usage = NameUsage::of_function(callee);
    let own_names_free = callee_usage
        .declared_names()
        .filter(|name| *name != callee.name)
        .all(|name| !caller_usage.mentions(name));
    let outer_names_visible = callee_usage.referenced_names().all(|name| {
        callee_usage.declarations(name) > 0
            || unit.find_global(name).is_none()
            || caller_usage.declarations(name) == 0
    });
    let result_used = matches!(call_site(stmt), Some((Some(_), _)));
    own_names_free && outer_names_visible && (!result_used || callee.return_ty != Type::Void)
}

impl OpportunityFinder for InlineFunctionFinder {
    type Opportunity = InlineFunctionOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::InlineFunction
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<InlineFunctionOpportunity>> {
        let mut found = Vec::new();
        for caller in unit.functions() {
            for list in stmt_lists(caller) {
                for stmt in list.stmts {
                    let Some((callee, _)) = call_site(stmt).and_then(|(_, call)| call.as_call())
                    else {
                        continue;
                    };
                    if !context.exhaustive_scan() && !is_injected_name(callee) {
                        continue;
                    }
                    let Some(function) = unit.find_function(callee) else {
                        continue;
                    };
                    if is_inlinable(unit, caller, stmt, function) {
                        found.push(InlineFunctionOpportunity {
                            stmt: stmt.id,
                            callee: callee.to_owned(),
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl InlineFunctionOpportunity {
    /// The statements replacing the call, before fresh ids are assigned to
    /// the parts copied from the callee.
    fn inlined(&self, unit: &TranslationUnit) -> Option<(Vec<Stmt>, Vec<Stmt>, Option<Stmt>)> {
        let (target, call) = call_site(unit.find_stmt(self.stmt)?)?;
        let (_, args) = call.as_call()?;
        let function = unit.find_function(&self.callee)?;
        let (body, returned) = split_body(function)?;

        let params = function
            .params
            .iter()
            .zip(args)
            .map(|(param, arg)| {
                let decl = VariableDecl {
                    id: param.id,
                    qualifier: None,
                    ty: param.ty.clone(),
                    name: param.name.clone(),
                    init: Some(arg.clone()),
                };
                Stmt::new(param.id, StmtKind::Decl(decl))
            })
            .collect();
        let result = returned.map(|value| {
            let value = value.clone();
            let expr = match target {
                Some(target) => Expr::new(
                    call.id,
                    ExprKind::Assign {
                        op: AssignOp::Assign,
                        target: Box::new(target.clone()),
                        value: Box::new(value),
                    },
                ),
                None => value,
            };
            Stmt::new(call.id, StmtKind::Expr(expr))
        });
        Some((params, body.to_vec(), result))
    }
}

impl Opportunity for InlineFunctionOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some((params, body, result)) = self.inlined(unit) else {
            stale(OpportunityKind::InlineFunction, self.stmt);
            return;
        };
        let mut stmts = Vec::with_capacity(params.len() + body.len() + 1);
        stmts.extend(params);
        stmts.extend(body);
        stmts.extend(result);
        for stmt in &mut stmts {
            unit.refresh_ids_stmt(stmt);
        }
        let block = Block::new(unit.fresh_id(), stmts);
        unit.replace_stmt(self.stmt, Stmt::new(self.stmt, StmtKind::Block(block)));
    }

    fn describe(&self) -> String {
        format!(
            "inline call to '{}' in statement {}",
            self.callee, self.stmt
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "uniform float u;
        float _GLF_scale(float a) { float b = a * 2.0; return b + u; }
        void main() { float x = 1.0; x = _GLF_scale(x); gl_FragColor = vec4(x); }";

    #[test]
    fn test_call_becomes_block() {
        assert_eq!(describe_all(InlineFunctionFinder, SOURCE, false).len(), 1);
        insta::assert_snapshot!(apply_nth(InlineFunctionFinder, SOURCE, false, 0), @r"
        #version 100
        uniform float u;
        float _GLF_scale(float a) {
            float b = a * 2.0;
            return b + u;
        }
        void main() {
            float x = 1.0;
            {
                float a = x;
                float b = a * 2.0;
                x = b + u;
            }
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_void_call_statement() {
        let source = "void paint() { gl_FragColor = vec4(1.0); return; }
            void main() { paint(); }";
        assert!(describe_all(InlineFunctionFinder, source, false).is_empty());
        insta::assert_snapshot!(apply_nth(InlineFunctionFinder, source, true, 0), @r"
        #version 100
        void paint() {
            gl_FragColor = vec4(1.0);
            return;
        }
        void main() {
            {
                gl_FragColor = vec4(1.0);
            }
        }
        ");
    }

    #[test]
    fn test_name_clashes_and_early_returns_block_inlining() {
        let clash = SOURCE.replace("float x = 1.0;", "float b = 0.0; float x = b;");
        assert!(describe_all(InlineFunctionFinder, &clash, true).is_empty());

        let shadowed = SOURCE.replace("float x = 1.0;", "float u = 0.0; float x = u;");
        assert!(describe_all(InlineFunctionFinder, &shadowed, true).is_empty());

        let early = "float f(float a) { if (a > 0.0) { return a; } return 0.0; }
            void main() { float x = 0.0; x = f(1.0); gl_FragColor = vec4(x); }";
        assert!(describe_all(InlineFunctionFinder, early, true).is_empty());
    }
}
