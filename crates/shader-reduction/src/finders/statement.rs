//! Delete statements. Declarations and control transfers (`break`,
//! `continue`, `return`) are never deleted, and neither is the last
//! statement of a function body or a statement holding a required `return`.
//!
//! Targeted scans only delete empty statements, statements that mention
//! injected code, and statements inside injected dead code.

use shader_ast::markers::mentions_injected;
use shader_ast::{NodeId, Stmt, StmtKind, TranslationUnit};

use crate::analysis::{InjectedRegions, holds_required_return, stale, stmt_exprs, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct StatementFinder;

#[derive(Debug, Clone)]
pub struct StatementOpportunity {
    stmt: NodeId,
}

fn is_deletable(stmt: &Stmt) -> bool {
    !matches!(
        stmt.kind,
        StmtKind::Decl(_)
            | StmtKind::Break
            | StmtKind::Continue
            | StmtKind::Return(_)
    )
}

impl OpportunityFinder for StatementFinder {
    type Opportunity = StatementOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Statement
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<StatementOpportunity>> {
        let regions = InjectedRegions::of_unit(unit);
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                if list.is_sole_body_stmt() {
                    continue;
                }
                for stmt in list.stmts {
                    if !is_deletable(stmt) || holds_required_return(function, stmt) {
                        continue;
                    }
                    let targeted = matches!(stmt.kind, StmtKind::Empty)
                        || regions.contains(stmt.id)
                        || stmt_exprs(stmt).into_iter().any(mentions_injected);
                    if context.exhaustive_scan() || targeted {
                        found.push(StatementOpportunity { stmt: stmt.id });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for StatementOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        if !unit.remove_stmt(self.stmt) {
            stale(OpportunityKind::Statement, self.stmt);
        }
    }

    fn describe(&self) -> String {
        format!("remove statement {}", self.stmt)
    }
}
