//! Remove variable declarations nothing refers to. A local whose initializer
//! has side effects keeps the initializer as an expression statement.
//!
//! Targeted scans only consider injected variables.

use shader_ast::markers::is_injected_name;
use shader_ast::{Decl, NodeId, StmtKind, StorageQualifier, TranslationUnit, VariableDecl};

use crate::analysis::{NameUsage, is_pure, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct DeclarationFinder;

#[derive(Debug, Clone)]
enum Site {
    Global(NodeId),
    Local { stmt: NodeId, keep_init: bool },
}

#[derive(Debug, Clone)]
pub struct DeclarationOpportunity {
    site: Site,
    name: String,
}

impl OpportunityFinder for DeclarationFinder {
    type Opportunity = DeclarationOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Declaration
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<DeclarationOpportunity>> {
        let usage = NameUsage::of_unit(unit);
        let unreferenced = |var: &VariableDecl| {
            usage.references(&var.name) == 0
                && (context.exhaustive_scan() || is_injected_name(&var.name))
        };
        let mut found = Vec::new();
        for decl in &unit.decls {
            match decl {
                Decl::Variable(var) => {
                    let removable = var.qualifier != Some(StorageQualifier::Out)
                        && var.init.as_ref().is_none_or(|init| is_pure(unit, init));
                    if removable && unreferenced(var) {
                        found.push(DeclarationOpportunity {
                            site: Site::Global(var.id),
                            name: var.name.clone(),
                        });
                    }
                }
                Decl::Function(function) => {
                    for list in stmt_lists(function) {
                        for stmt in list.stmts {
                            let StmtKind::Decl(var) = &stmt.kind else {
                                continue;
                            };
                            if !unreferenced(var) {
                                continue;
                            }
                            let keep_init =
                                var.init.as_ref().is_some_and(|init| !is_pure(unit, init));
                            if !keep_init && list.is_sole_body_stmt() {
                                continue;
                            }
                            found.push(DeclarationOpportunity {
                                site: Site::Local {
                                    stmt: stmt.id,
                                    keep_init,
                                },
                                name: var.name.clone(),
                            });
                        }
                    }
                }
                Decl::Precision(_) | Decl::Struct(_) => {}
            }
        }
        Ok(found)
    }
}

impl Opportunity for DeclarationOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        match self.site {
            Site::Global(id) => {
                if unit.remove_decl(id).is_none() {
                    stale(OpportunityKind::Declaration, id);
                }
            }
            Site::Local { stmt, keep_init } => {
                if keep_init {
                    let Some(target) = unit.find_stmt_mut(stmt) else {
                        stale(OpportunityKind::Declaration, stmt);
                        return;
                    };
                    if let StmtKind::Decl(var) = &mut target.kind
                        && let Some(init) = var.init.take()
                    {
                        target.kind = StmtKind::Expr(init);
                    }
                } else if !unit.remove_stmt(stmt) {
                    stale(OpportunityKind::Declaration, stmt);
                }
            }
        }
    }

    fn describe(&self) -> String {
        match self.site {
            Site::Global(_) => format!("remove unused global '{}'", self.name),
            Site::Local {
                keep_init: false, ..
            } => format!("remove unused declaration of '{}'", self.name),
            Site::Local {
                keep_init: true, ..
            } => format!(
                "remove unused declaration of '{}', keeping its initializer",
                self.name
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "uniform float _GLF_unused_u;
        float f() { return 1.0; }
        void main() {
            float _GLF_a = 1.0;
            float _GLF_b = f();
            float c = 2.0;
            float d = 3.0;
            gl_FragColor = vec4(c);
        }";

    #[test]
    fn test_targeted_and_exhaustive() {
        assert_eq!(
            describe_all(DeclarationFinder, SOURCE, false),
            vec![
                "remove unused global '_GLF_unused_u'",
                "remove unused declaration of '_GLF_a'",
                "remove unused declaration of '_GLF_b', keeping its initializer",
            ]
        );
        assert_eq!(describe_all(DeclarationFinder, SOURCE, true).len(), 4);
    }

    #[test]
    fn test_side_effecting_initializer_is_kept() {
        insta::assert_snapshot!(apply_nth(DeclarationFinder, SOURCE, false, 2), @r"
        #version 100
        uniform float _GLF_unused_u;
        float f() {
            return 1.0;
        }
        void main() {
            float _GLF_a = 1.0;
            f();
            float c = 2.0;
            float d = 3.0;
            gl_FragColor = vec4(c);
        }
        ");
    }

    #[test]
    fn test_sole_statement_is_kept() {
        assert!(describe_all(DeclarationFinder, "void main() { float x = 1.0; }", true).is_empty());
    }
}
