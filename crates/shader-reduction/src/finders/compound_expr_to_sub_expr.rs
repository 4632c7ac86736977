//! Replace a compound expression with one of its operands of the same type,
//! e.g. `a + b` with `a`, `c ? x : y` with `y`, or `_GLF_IDENTITY(e, ..)`
//! with `e`.
//!
//! Targeted scans consider identity and fuzzed markers anywhere, plus any
//! compound expression inside injected code.

use shader_ast::markers::Marker;
use shader_ast::{Expr, ExprKind, NodeId, TranslationUnit, Type, TypeTable, UnaryOp};

use crate::analysis::{InjectedRegions, expression_types, rvalues, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct CompoundExprToSubExprFinder;

#[derive(Debug, Clone)]
pub struct CompoundExprToSubExprOpportunity {
    expr: NodeId,
    sub_expr: NodeId,
}

/// Operands of `expr` that could stand in for it.
fn replacements<'a>(unit: &TranslationUnit, types: &TypeTable, expr: &'a Expr) -> Vec<&'a Expr> {
    let same_type = |child: &&Expr| {
        types.get(child.id).is_some() && types.get(child.id) == types.get(expr.id)
    };
    match &expr.kind {
        ExprKind::Binary { lhs, rhs, .. } => {
            [&**lhs, &**rhs].into_iter().filter(same_type).collect()
        }
        ExprKind::Unary {
            op: UnaryOp::Neg | UnaryOp::Not,
            operand,
        } => vec![&**operand],
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => [&**cond, &**then_expr, &**else_expr]
            .into_iter()
            .filter(same_type)
            .collect(),
        ExprKind::Call { callee, args } => match Marker::from_name(callee) {
            Some(Marker::Identity | Marker::Fuzzed) => args.first().into_iter().collect(),
            Some(_) => Vec::new(),
            None if unit.find_function(callee).is_some() => Vec::new(),
            None => args.iter().filter(same_type).collect(),
        },
        _ => Vec::new(),
    }
}

impl OpportunityFinder for CompoundExprToSubExprFinder {
    type Opportunity = CompoundExprToSubExprOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::CompoundExprToSubExpr
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<CompoundExprToSubExprOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        let regions = InjectedRegions::of_unit(unit);
        let mut found = Vec::new();
        for expr in rvalues(unit) {
            if matches!(types.get(expr.id), None | Some(Type::Void)) {
                continue;
            }
            let targeted = regions.contains(expr.id)
                || matches!(Marker::of(expr), Some(Marker::Identity | Marker::Fuzzed));
            if !context.exhaustive_scan() && !targeted {
                continue;
            }
            found.extend(
                replacements(unit, &types, expr)
                    .into_iter()
                    .map(|sub_expr| CompoundExprToSubExprOpportunity {
                        expr: expr.id,
                        sub_expr: sub_expr.id,
                    }),
            );
        }
        Ok(found)
    }
}

impl Opportunity for CompoundExprToSubExprOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(sub_expr) = unit
            .find_expr(self.expr)
            .and_then(|expr| expr.find_descendant(self.sub_expr))
            .cloned()
        else {
            stale(OpportunityKind::CompoundExprToSubExpr, self.sub_expr);
            return;
        };
        if !unit.replace_expr(self.expr, sub_expr) {
            stale(OpportunityKind::CompoundExprToSubExpr, self.expr);
        }
    }

    fn describe(&self) -> String {
        format!(
            "replace expression {} with its sub-expression {}",
            self.expr, self.sub_expr
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "uniform float u;
        void main() {
            float y = u;
            float x = _GLF_IDENTITY(y, y * 1.0) + 2.0;
            gl_FragColor = vec4(x);
        }";

    #[test]
    fn test_identity_marker_is_targeted() {
        assert_eq!(
            describe_all(CompoundExprToSubExprFinder, SOURCE, false).len(),
            1
        );
        assert_eq!(
            describe_all(CompoundExprToSubExprFinder, SOURCE, true).len(),
            5
        );
        insta::assert_snapshot!(apply_nth(CompoundExprToSubExprFinder, SOURCE, false, 0), @r"
        #version 100
        uniform float u;
        void main() {
            float y = u;
            float x = y + 2.0;
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_operand_types_must_match() {
        let source = "uniform vec2 v;
            void main() { gl_FragColor = vec4(v * 2.0, 0.0, 1.0); }";
        assert_eq!(
            describe_all(CompoundExprToSubExprFinder, source, true).len(),
            1,
            "only 'v' can replace 'v * 2.0'"
        );
    }

    #[test]
    fn test_ternary_keeps_a_branch() {
        let source = "uniform bool b;
            void main() { gl_FragColor = b ? vec4(1.0) : vec4(0.0); }";
        insta::assert_snapshot!(apply_nth(CompoundExprToSubExprFinder, source, true, 1), @r"
        #version 100
        uniform bool b;
        void main() {
            gl_FragColor = vec4(0.0);
        }
        ");
    }
}
