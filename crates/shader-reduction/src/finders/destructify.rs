//! Replace a local whose type is a single-field struct with a variable of the
//! field's type, when the local is only ever used through that field.
//!
//! Targeted scans only consider injected structs and injected variables.

use shader_ast::markers::is_injected_name;
use shader_ast::{Expr, ExprKind, NodeId, StmtKind, TranslationUnit, Type};

use crate::analysis::{NameUsage, stale, stmt_lists, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct DestructifyFinder;

#[derive(Debug, Clone)]
pub struct DestructifyOpportunity {
    decl_stmt: NodeId,
    variable: String,
    struct_name: String,
    field: String,
    field_ty: Type,
    accesses: Vec<NodeId>,
}

impl OpportunityFinder for DestructifyFinder {
    type Opportunity = DestructifyOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Destructify
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<DestructifyOpportunity>> {
        let usage = NameUsage::of_unit(unit);
        let exprs = unit_exprs(unit);
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for stmt in list.stmts {
                    let StmtKind::Decl(var) = &stmt.kind else {
                        continue;
                    };
                    let Type::Struct(struct_name) = &var.ty else {
                        continue;
                    };
                    let Some(decl) = unit.find_struct(struct_name) else {
                        continue;
                    };
                    let [field] = decl.fields.as_slice() else {
                        continue;
                    };
                    if !context.exhaustive_scan()
                        && !is_injected_name(struct_name)
                        && !is_injected_name(&var.name)
                    {
                        continue;
                    }
                    if usage.declarations(&var.name) != 1 {
                        continue;
                    }
                    let accesses: Vec<NodeId> = exprs
                        .iter()
                        .filter(|expr| match &expr.kind {
                            ExprKind::Member { base, field: name } => {
                                base.as_var() == Some(var.name.as_str()) && *name == field.name
                            }
                            _ => false,
                        })
                        .map(|expr| expr.id)
                        .collect();
                    if accesses.len() != usage.references(&var.name) {
                        continue;
                    }
                    found.push(DestructifyOpportunity {
                        decl_stmt: stmt.id,
                        variable: var.name.clone(),
                        struct_name: struct_name.clone(),
                        field: field.name.clone(),
                        field_ty: field.ty.clone(),
                        accesses,
                    });
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for DestructifyOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let member_id = unit.fresh_id();
        let Some(stmt) = unit.find_stmt_mut(self.decl_stmt) else {
            stale(OpportunityKind::Destructify, self.decl_stmt);
            return;
        };
        let StmtKind::Decl(var) = &mut stmt.kind else {
            stale(OpportunityKind::Destructify, self.decl_stmt);
            return;
        };
        var.ty = self.field_ty.clone();
        var.init = var.init.take().map(|init| match init.kind {
            ExprKind::Call { callee, mut args }
                if callee == self.struct_name && args.len() == 1 =>
            {
                args.remove(0)
            }
            kind => Expr::new(
                member_id,
                ExprKind::Member {
                    base: Box::new(Expr::new(init.id, kind)),
                    field: self.field.clone(),
                },
            ),
        });
        for &access in &self.accesses {
            let replacement = Expr::new(unit.fresh_id(), ExprKind::Var(self.variable.clone()));
            unit.replace_expr(access, replacement);
        }
    }

    fn describe(&self) -> String {
        format!(
            "replace struct variable '{}' with its field '{}'",
            self.variable, self.field
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "struct _GLF_S { vec2 v; };
        void main() {
            _GLF_S s = _GLF_S(vec2(1.0));
            s.v.x = 2.0;
            gl_FragColor = vec4(s.v, 0.0, 1.0);
        }";

    #[test]
    fn test_single_field_local_becomes_field_variable() {
        assert_eq!(
            describe_all(DestructifyFinder, SOURCE, false),
            vec!["replace struct variable 's' with its field 'v'"]
        );
        insta::assert_snapshot!(apply_nth(DestructifyFinder, SOURCE, false, 0), @r"
        #version 100
        struct _GLF_S {
            vec2 v;
        };
        void main() {
            vec2 s = vec2(1.0);
            s.x = 2.0;
            gl_FragColor = vec4(s, 0.0, 1.0);
        }
        ");
    }

    #[test]
    fn test_non_constructor_initializer_is_projected() {
        let source = "struct S { float f; };
            S make() { return S(1.0); }
            void main() { S s = make(); gl_FragColor = vec4(s.f); }";
        insta::assert_snapshot!(apply_nth(DestructifyFinder, source, true, 0), @r"
        #version 100
        struct S {
            float f;
        };
        S make() {
            return S(1.0);
        }
        void main() {
            float s = make().f;
            gl_FragColor = vec4(s);
        }
        ");
    }

    #[test]
    fn test_whole_struct_use_blocks_the_edit() {
        let source = "struct S { float f; };
            void main() { S s = S(1.0); S t = s; gl_FragColor = vec4(t.f); }";
        assert_eq!(
            describe_all(DestructifyFinder, source, true),
            vec!["replace struct variable 't' with its field 'f'"]
        );
        assert!(describe_all(DestructifyFinder, source, false).is_empty());
    }
}
