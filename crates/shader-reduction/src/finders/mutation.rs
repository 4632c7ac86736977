//! Undo value-preserving mutations: arithmetic and logical identities such
//! as `e + 0.0`, `e * 1`, `e && true`, double negation, ternaries on a
//! literal condition, and parentheses around primary expressions.
//!
//! These rewrites only shrink the program, so targeted and exhaustive scans
//! find the same set.

use shader_ast::{
    BinaryOp, Expr, ExprKind, NodeId, TranslationUnit, TypeTable, UnaryOp, print_expr,
};

use crate::analysis::{expression_types, rvalues, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct MutationFinder;

#[derive(Debug, Clone)]
pub struct MutationOpportunity {
    expr: NodeId,
    kept: NodeId,
    before: String,
    after: String,
}

fn is_zero(expr: &Expr) -> bool {
    match expr.without_parens().kind {
        ExprKind::IntLit(value) => value == 0,
        ExprKind::FloatLit(value) => value == 0.0,
        _ => false,
    }
}

fn is_one(expr: &Expr) -> bool {
    match expr.without_parens().kind {
        ExprKind::IntLit(value) => value == 1,
        ExprKind::FloatLit(value) => value == 1.0,
        _ => false,
    }
}

fn is_bool(expr: &Expr, expected: bool) -> bool {
    matches!(expr.without_parens().kind, ExprKind::BoolLit(value) if value == expected)
}

fn is_primary(expr: &Expr) -> bool {
    matches!(
        expr.kind,
        ExprKind::Var(_)
            | ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Paren(_)
            | ExprKind::Call { .. }
            | ExprKind::Member { .. }
            | ExprKind::Index { .. }
    )
}

fn negated(expr: &Expr, op: UnaryOp) -> Option<&Expr> {
    match &expr.without_parens().kind {
        ExprKind::Unary { op: inner, operand } if *inner == op => Some(&**operand),
        _ => None,
    }
}

/// The operand `expr` reduces to, if `expr` is an identity over it.
fn simplified<'a>(types: &TypeTable, expr: &'a Expr) -> Option<&'a Expr> {
    let kept: &Expr = match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            let (lhs, rhs) = (&**lhs, &**rhs);
            match op {
                BinaryOp::Add if is_zero(rhs) => lhs,
                BinaryOp::Add if is_zero(lhs) => rhs,
                BinaryOp::Sub if is_zero(rhs) => lhs,
                BinaryOp::Mul if is_one(rhs) => lhs,
                BinaryOp::Mul if is_one(lhs) => rhs,
                BinaryOp::Div if is_one(rhs) => lhs,
                BinaryOp::And if is_bool(rhs, true) => lhs,
                BinaryOp::And if is_bool(lhs, true) => rhs,
                BinaryOp::Or if is_bool(rhs, false) => lhs,
                BinaryOp::Or if is_bool(lhs, false) => rhs,
                _ => return None,
            }
        }
        ExprKind::Unary {
            op: op @ (UnaryOp::Neg | UnaryOp::Not),
            operand,
        } => negated(operand, *op)?,
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            if is_bool(cond, true) {
                &**then_expr
            } else if is_bool(cond, false) {
                &**else_expr
            } else {
                return None;
            }
        }
        ExprKind::Paren(inner) if is_primary(inner) => &**inner,
        _ => return None,
    };
    let same_type = types.get(kept.id).is_some() && types.get(kept.id) == types.get(expr.id);
    same_type.then_some(kept)
}

impl OpportunityFinder for MutationFinder {
    type Opportunity = MutationOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Mutation
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<MutationOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        Ok(rvalues(unit)
            .into_iter()
            .filter_map(|expr| {
                let kept = simplified(&types, expr)?;
                Some(MutationOpportunity {
                    expr: expr.id,
                    kept: kept.id,
                    before: print_expr(expr),
                    after: print_expr(kept),
                })
            })
            .collect())
    }
}

impl Opportunity for MutationOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(kept) = unit
            .find_expr(self.expr)
            .and_then(|expr| expr.find_descendant(self.kept))
            .cloned()
        else {
            stale(OpportunityKind::Mutation, self.kept);
            return;
        };
        if !unit.replace_expr(self.expr, kept) {
            stale(OpportunityKind::Mutation, self.expr);
        }
    }

    fn describe(&self) -> String {
        format!("simplify '{}' to '{}'", self.before, self.after)
    }
}
