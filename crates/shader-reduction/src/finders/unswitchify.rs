//! Replace a `switch` without fall-through by an equivalent `if` chain.
//!
//! Targeted scans only consider switches whose selector is wrapped in
//! `_GLF_SWITCH`; the marker is dropped from the conditions.

use shader_ast::markers::Marker;
use shader_ast::{
    BinaryOp, Block, CaseLabel, Expr, ExprKind, NodeId, Stmt, StmtKind, SwitchCase,
    TranslationUnit,
};

use crate::analysis::{Jumps, NameUsage, is_pure, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct UnswitchifyFinder;

#[derive(Debug, Clone)]
pub struct UnswitchifyOpportunity {
    stmt: NodeId,
}

/// Consecutive labels sharing one body, with the body's trailing `break`
/// stripped.
struct Arm<'a> {
    labels: Vec<CaseLabel>,
    body: &'a [Stmt],
}

impl Arm<'_> {
    fn is_default(&self) -> bool {
        self.labels.contains(&CaseLabel::Default)
    }
}

/// Group the cases of a switch into arms, or `None` if control can fall
/// from one arm into the next or leave an arm other than at its end.
fn arms(cases: &[SwitchCase]) -> Option<Vec<Arm<'_>>> {
    let mut arms = Vec::new();
    let mut labels = Vec::new();
    for (index, case) in cases.iter().enumerate() {
        labels.push(case.label);
        let is_last = index + 1 == cases.len();
        if case.body.is_empty() && !is_last {
            continue;
        }
        let body = match case.body.split_last() {
            Some((last, rest)) if matches!(last.kind, StmtKind::Break) => rest,
            _ if is_last => case.body.as_slice(),
            _ => return None,
        };
        if Jumps::of_stmts(body).breaks > 0 {
            return None;
        }
        arms.push(Arm {
            labels: std::mem::take(&mut labels),
            body,
        });
    }
    Some(arms)
}

/// Arms share one scope inside a switch but each gets its own block after
/// the rewrite, so no arm may use a name declared by another.
fn arms_are_independent(arms: &[Arm<'_>]) -> bool {
    arms.iter().enumerate().all(|(index, arm)| {
        arm.body.iter().all(|stmt| match &stmt.kind {
            StmtKind::Decl(var) => arms
                .iter()
                .enumerate()
                .filter(|(other, _)| *other != index)
                .all(|(_, other)| !NameUsage::of_stmts(other.body).mentions(&var.name)),
            _ => true,
        })
    })
}

/// The selector compared against the labels, without `_GLF_SWITCH`.
fn compared_selector(selector: &Expr) -> &Expr {
    match selector.without_parens().as_call() {
        Some((callee, [inner])) if Marker::from_name(callee) == Some(Marker::Switch) => inner,
        _ => selector,
    }
}

impl OpportunityFinder for UnswitchifyFinder {
    type Opportunity = UnswitchifyOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Unswitchify
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<UnswitchifyOpportunity>> {
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for stmt in list.stmts {
                    let StmtKind::Switch { selector, cases } = &stmt.kind else {
                        continue;
                    };
                    if !context.exhaustive_scan() && Marker::of(selector) != Some(Marker::Switch)
                    {
                        continue;
                    }
                    if !is_pure(unit, compared_selector(selector)) {
                        continue;
                    }
                    if arms(cases).is_some_and(|arms| arms_are_independent(&arms)) {
                        found.push(UnswitchifyOpportunity { stmt: stmt.id });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl UnswitchifyOpportunity {
    fn block(unit: &mut TranslationUnit, body: &[Stmt]) -> Stmt {
        let block = Block::new(unit.fresh_id(), body.to_vec());
        Stmt::new(unit.fresh_id(), StmtKind::Block(block))
    }

    /// `selector == a || selector == b || ...` for the case labels of an arm.
    fn condition(
        unit: &mut TranslationUnit,
        selector: &Expr,
        labels: &[CaseLabel],
    ) -> Option<Expr> {
        let mut cond: Option<Expr> = None;
        for label in labels {
            let CaseLabel::Case(value) = *label else {
                continue;
            };
            let mut lhs = selector.clone();
            unit.refresh_ids_expr(&mut lhs);
            let rhs = Expr::new(unit.fresh_id(), ExprKind::IntLit(value));
            let test = Expr::new(
                unit.fresh_id(),
                ExprKind::Binary {
                    op: BinaryOp::Eq,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
            );
            cond = Some(match cond {
                None => test,
                Some(previous) => Expr::new(
                    unit.fresh_id(),
                    ExprKind::Binary {
                        op: BinaryOp::Or,
                        lhs: Box::new(previous),
                        rhs: Box::new(test),
                    },
                ),
            });
        }
        cond
    }
}

impl Opportunity for UnswitchifyOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(stmt) = unit.find_stmt(self.stmt).cloned() else {
            stale(OpportunityKind::Unswitchify, self.stmt);
            return;
        };
        let StmtKind::Switch { selector, cases } = &stmt.kind else {
            stale(OpportunityKind::Unswitchify, self.stmt);
            return;
        };
        let Some(arms) = arms(cases) else {
            stale(OpportunityKind::Unswitchify, self.stmt);
            return;
        };
        let selector = compared_selector(selector);

        let mut chain: Option<Stmt> = arms
            .iter()
            .find(|arm| arm.is_default())
            .map(|arm| Self::block(unit, arm.body));
        for arm in arms.iter().rev().filter(|arm| !arm.is_default()) {
            let Some(cond) = Self::condition(unit, selector, &arm.labels) else {
                continue;
            };
            let then_branch = Self::block(unit, arm.body);
            chain = Some(Stmt::new(
                unit.fresh_id(),
                StmtKind::If {
                    cond,
                    then_branch: Box::new(then_branch),
                    else_branch: chain.map(Box::new),
                },
            ));
        }
        let replacement = match chain {
            Some(chain) => Stmt::new(self.stmt, chain.kind),
            None => Stmt::new(self.stmt, StmtKind::Empty),
        };
        unit.replace_stmt(self.stmt, replacement);
    }

    fn describe(&self) -> String {
        format!("replace switch {} with if statements", self.stmt)
    }
}
