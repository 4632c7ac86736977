//! Replace a scalar or vector expression with a constant of the same type:
//! `1`, `1.0`, `true`, or a splat such as `vec3(1.0)`.
//!
//! Literals and constructors of literals are already as small as they get
//! and are left alone, as are assignments, increments and anything written
//! to. Targeted scans only touch expressions inside injected code.

use shader_ast::{Expr, ExprKind, NodeId, TranslationUnit, Type};

use crate::analysis::{InjectedRegions, expression_types, rvalues, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct ExprToConstantFinder;

#[derive(Debug, Clone)]
pub struct ExprToConstantOpportunity {
    expr: NodeId,
    ty: Type,
}

fn is_constant(expr: &Expr) -> bool {
    let expr = expr.without_parens();
    expr.is_literal()
        || expr.as_call().is_some_and(|(callee, args)| {
            Type::from_keyword(callee).is_some()
                && args.iter().all(|arg| arg.without_parens().is_literal())
        })
}

fn has_effect(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Assign { .. } => true,
        ExprKind::Unary { op, .. } => op.is_increment(),
        _ => false,
    }
}

fn scalar_one(scalar: &Type) -> Option<ExprKind> {
    match scalar {
        Type::Int => Some(ExprKind::IntLit(1)),
        Type::Float => Some(ExprKind::FloatLit(1.0)),
        Type::Bool => Some(ExprKind::BoolLit(true)),
        _ => None,
    }
}

impl OpportunityFinder for ExprToConstantFinder {
    type Opportunity = ExprToConstantOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::ExprToConstant
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<ExprToConstantOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        let regions = InjectedRegions::of_unit(unit);
        Ok(rvalues(unit)
            .into_iter()
            .filter(|expr| context.exhaustive_scan() || regions.contains(expr.id))
            .filter(|expr| !has_effect(expr) && !is_constant(expr))
            .filter_map(|expr| {
                let ty = types.get(expr.id)?;
                (ty.is_scalar() || ty.is_vector()).then(|| ExprToConstantOpportunity {
                    expr: expr.id,
                    ty: ty.clone(),
                })
            })
            .collect())
    }
}

impl Opportunity for ExprToConstantOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(one) = self.ty.scalar().as_ref().and_then(scalar_one) else {
            stale(OpportunityKind::ExprToConstant, self.expr);
            return;
        };
        let constant = if self.ty.is_vector() {
            let splat = Expr::new(unit.fresh_id(), one);
            Expr::new(
                self.expr,
                ExprKind::Call {
                    callee: self.ty.to_string(),
                    args: vec![splat],
                },
            )
        } else {
            Expr::new(self.expr, one)
        };
        if !unit.replace_expr(self.expr, constant) {
            stale(OpportunityKind::ExprToConstant, self.expr);
        }
    }

    fn describe(&self) -> String {
        format!(
            "replace expression {} with a constant {}",
            self.expr, self.ty
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "void main() {
            float x = _GLF_FUZZED(sin(2.0) + 3.0);
            gl_FragColor = vec4(x);
        }";

    #[test]
    fn test_targeted_scan_stays_inside_fuzzed_code() {
        assert_eq!(describe_all(ExprToConstantFinder, SOURCE, false).len(), 2);
        assert_eq!(describe_all(ExprToConstantFinder, SOURCE, true).len(), 5);
    }

    #[test]
    fn test_fuzzed_expression_becomes_constant() {
        insta::assert_snapshot!(apply_nth(ExprToConstantFinder, SOURCE, false, 0), @r"
        #version 100
        void main() {
            float x = _GLF_FUZZED(1.0);
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_vector_becomes_splat() {
        let source = "uniform vec2 u; void main() { vec2 v = u * 2.0; gl_FragColor = vec4(v, v); }";
        let described = describe_all(ExprToConstantFinder, source, true);
        assert!(described.iter().all(|d| d.ends_with("vec2") || d.ends_with("vec4")));
        insta::assert_snapshot!(apply_nth(ExprToConstantFinder, source, true, 0), @r"
        #version 100
        uniform vec2 u;
        void main() {
            vec2 v = vec2(1.0);
            gl_FragColor = vec4(v, v);
        }
        ");
    }

    #[test]
    fn test_constants_and_targets_are_skipped() {
        let source = "void main() { float x; x = 2.0; gl_FragColor = vec4(1.0); }";
        assert!(describe_all(ExprToConstantFinder, source, true).is_empty());
    }
}
