//! Substitute a local variable's initializer for each of its references. The
//! declaration stays; once nothing refers to it the declaration finder can
//! remove it.
//!
//! The variable must never be written, its initializer must be pure, and
//! nothing the initializer reads may be written anywhere, so every
//! reference sees the value the initializer computed. Targeted scans only
//! consider injected variables.

use shader_ast::markers::is_injected_name;
use shader_ast::{Expr, NodeId, StmtKind, TranslationUnit};

use crate::analysis::{NameUsage, is_pure, parenthesize, stale, stmt_lists, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct InlineInitializerFinder;

#[derive(Debug, Clone)]
pub struct InlineInitializerOpportunity {
    decl: NodeId,
    name: String,
}

impl OpportunityFinder for InlineInitializerFinder {
    type Opportunity = InlineInitializerOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::InlineInitializer
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<InlineInitializerOpportunity>> {
        let usage = NameUsage::of_unit(unit);
        let stable = |name: &str| usage.declarations(name) <= 1 && !usage.is_assigned(name);
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for stmt in list.stmts {
                    let StmtKind::Decl(var) = &stmt.kind else {
                        continue;
                    };
                    let Some(init) = &var.init else {
                        continue;
                    };
                    if !context.exhaustive_scan() && !is_injected_name(&var.name) {
                        continue;
                    }
                    let inlinable = usage.declarations(&var.name) == 1
                        && !usage.is_assigned(&var.name)
                        && usage.references(&var.name) > 0
                        && is_pure(unit, init)
                        && NameUsage::of_expr(init).referenced_names().all(stable);
                    if inlinable {
                        found.push(InlineInitializerOpportunity {
                            decl: stmt.id,
                            name: var.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for InlineInitializerOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let init = match unit.find_stmt(self.decl).map(|stmt| &stmt.kind) {
            Some(StmtKind::Decl(var)) => var.init.clone(),
            _ => None,
        };
        let Some(init) = init else {
            stale(OpportunityKind::InlineInitializer, self.decl);
            return;
        };
        let references: Vec<NodeId> = unit_exprs(unit)
            .into_iter()
            .filter(|expr| expr.as_var() == Some(self.name.as_str()))
            .map(|expr| expr.id)
            .collect();
        for reference in references {
            let mut copy: Expr = init.clone();
            unit.refresh_ids_expr(&mut copy);
            let copy = parenthesize(unit, copy);
            unit.replace_expr(reference, copy);
        }
    }

    fn describe(&self) -> String {
        format!("inline the initializer of '{}' at its uses", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "uniform float u;
        void main() {
            float _GLF_t = u * 2.0;
            float x = _GLF_t + _GLF_t;
            gl_FragColor = vec4(x);
        }";

    #[test]
    fn test_initializer_replaces_references() {
        assert_eq!(
            describe_all(InlineInitializerFinder, SOURCE, false),
            vec!["inline the initializer of '_GLF_t' at its uses"]
        );
        assert_eq!(describe_all(InlineInitializerFinder, SOURCE, true).len(), 2);
        insta::assert_snapshot!(apply_nth(InlineInitializerFinder, SOURCE, false, 0), @r"
        #version 100
        uniform float u;
        void main() {
            float _GLF_t = u * 2.0;
            float x = (u * 2.0) + (u * 2.0);
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_written_values_are_not_inlined() {
        let source = "void main() {
                float a = 1.0;
                float b = a;
                a = 2.0;
                gl_FragColor = vec4(b);
            }";
        assert!(describe_all(InlineInitializerFinder, source, true).is_empty());
    }
}
