//! Merge two consecutive `for` loops that count one variable over adjacent
//! ranges with identical bodies, as left behind by loop splitting.

use std::slice;

use shader_ast::{
    BinaryOp, Expr, ExprKind, NodeId, Stmt, StmtKind, TranslationUnit, Type, UnaryOp,
};

use crate::analysis::{Jumps, NameUsage, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct LoopMergeFinder;

#[derive(Debug, Clone)]
pub struct LoopMergeOpportunity {
    first: NodeId,
    bound: NodeId,
    second: NodeId,
    counter: String,
    new_bound: i64,
}

/// `for (int i = start; i < end; i++) body` with a body that leaves `i` alone.
struct CountedLoop<'a> {
    id: NodeId,
    counter: &'a str,
    start: i64,
    end: i64,
    end_id: NodeId,
    body: &'a Stmt,
}

fn counted_loop(stmt: &Stmt) -> Option<CountedLoop<'_>> {
    let StmtKind::For {
        init: Some(init),
        cond: Some(cond),
        step: Some(step),
        body,
    } = &stmt.kind
    else {
        return None;
    };
    let StmtKind::Decl(var) = &init.kind else {
        return None;
    };
    let ExprKind::IntLit(start) = var.init.as_ref()?.kind else {
        return None;
    };
    if var.ty != Type::Int || var.qualifier.is_some() {
        return None;
    }
    let ExprKind::Binary {
        op: BinaryOp::Lt,
        lhs,
        rhs,
    } = &cond.kind
    else {
        return None;
    };
    let ExprKind::IntLit(end) = rhs.kind else {
        return None;
    };
    let ExprKind::Unary {
        op: UnaryOp::PostInc | UnaryOp::PreInc,
        operand,
    } = &step.kind
    else {
        return None;
    };
    if lhs.as_var() != Some(var.name.as_str()) || operand.as_var() != Some(var.name.as_str()) {
        return None;
    }
    if NameUsage::of_stmts(slice::from_ref(body)).is_assigned(&var.name)
        || Jumps::of_stmt(body).breaks > 0
    {
        return None;
    }
    Some(CountedLoop {
        id: stmt.id,
        counter: &var.name,
        start,
        end,
        end_id: rhs.id,
        body,
    })
}

impl OpportunityFinder for LoopMergeFinder {
    type Opportunity = LoopMergeOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::LoopMerge
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        _context: &ScanContext,
    ) -> ReductionResult<Vec<LoopMergeOpportunity>> {
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for pair in list.stmts.windows(2) {
                    let (Some(first), Some(second)) =
                        (counted_loop(&pair[0]), counted_loop(&pair[1]))
                    else {
                        continue;
                    };
                    let mergeable = first.counter == second.counter
                        && first.start <= first.end
                        && first.end == second.start
                        && second.start <= second.end
                        && shader_ast::print_stmt(first.body)
                            == shader_ast::print_stmt(second.body);
                    if mergeable {
                        found.push(LoopMergeOpportunity {
                            first: first.id,
                            bound: first.end_id,
                            second: second.id,
                            counter: first.counter.to_owned(),
                            new_bound: second.end,
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for LoopMergeOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        if unit.find_stmt(self.second).is_none() || unit.find_expr(self.bound).is_none() {
            stale(OpportunityKind::LoopMerge, self.first);
            return;
        }
        let bound = Expr::new(unit.fresh_id(), ExprKind::IntLit(self.new_bound));
        unit.replace_expr(self.bound, bound);
        unit.remove_stmt(self.second);
    }

    fn describe(&self) -> String {
        format!(
            "merge loops {} and {} over '{}'",
            self.first, self.second, self.counter
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SPLIT: &str = "void main() {
        float x = 0.0;
        for (int i = 0; i < 2; i++) { x += 1.0; }
        for (int i = 2; i < 5; i++) { x += 1.0; }
        gl_FragColor = vec4(x);
    }";

    #[test]
    fn test_merges_adjacent_ranges() {
        assert_eq!(describe_all(LoopMergeFinder, SPLIT, false).len(), 1);
        insta::assert_snapshot!(apply_nth(LoopMergeFinder, SPLIT, false, 0), @r"
        #version 100
        void main() {
            float x = 0.0;
            for (int i = 0; i < 5; i++) {
                x += 1.0;
            }
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_requires_equal_bodies_and_contiguous_ranges() {
        let different_bodies = SPLIT.replace(
            "i < 5; i++) { x += 1.0; }",
            "i < 5; i++) { x += 2.0; }",
        );
        assert!(describe_all(LoopMergeFinder, &different_bodies, true).is_empty());

        let gap = SPLIT.replace("int i = 2;", "int i = 3;");
        assert!(describe_all(LoopMergeFinder, &gap, true).is_empty());
    }

    #[test]
    fn test_early_exit_blocks_merge() {
        let source = "void main() {
            float x = 0.0;
            for (int i = 0; i < 2; i++) { if (x > 1.0) break; }
            for (int i = 2; i < 4; i++) { if (x > 1.0) break; }
            gl_FragColor = vec4(x);
        }";
        assert!(describe_all(LoopMergeFinder, source, true).is_empty());
    }
}
