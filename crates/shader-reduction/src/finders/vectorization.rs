//! Split a vector local that is only ever used one component at a time into
//! one scalar local per component.
//!
//! Targeted scans only consider injected variables.

use shader_ast::markers::is_injected_name;
use shader_ast::{Expr, ExprKind, NodeId, Stmt, StmtKind, TranslationUnit, VariableDecl};

use crate::analysis::{NameUsage, expression_types, stale, stmt_lists, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct VectorizationFinder;

const COMPONENT_SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];
const COMPONENT_NAMES: [&str; 4] = ["x", "y", "z", "w"];

#[derive(Debug, Clone)]
pub struct VectorizationOpportunity {
    decl_stmt: NodeId,
    variable: String,
    components: usize,
    accesses: Vec<(NodeId, usize)>,
}

/// Index of a single-component swizzle such as `y` or `g`.
fn component(field: &str) -> Option<usize> {
    let mut chars = field.chars();
    let (Some(letter), None) = (chars.next(), chars.next()) else {
        return None;
    };
    COMPONENT_SETS.iter().find_map(|set| set.find(letter))
}

fn scalar_name(variable: &str, index: usize) -> String {
    format!("{variable}_{}", COMPONENT_NAMES[index])
}

impl OpportunityFinder for VectorizationFinder {
    type Opportunity = VectorizationOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Vectorization
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<VectorizationOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        let usage = NameUsage::of_unit(unit);
        let exprs = unit_exprs(unit);
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for stmt in list.stmts {
                    let StmtKind::Decl(var) = &stmt.kind else {
                        continue;
                    };
                    if !var.ty.is_vector() || var.qualifier.is_some() {
                        continue;
                    }
                    if !context.exhaustive_scan() && !is_injected_name(&var.name) {
                        continue;
                    }
                    let Some(count) = var.ty.components().map(usize::from) else {
                        continue;
                    };
                    let Some((_, args)) = var.init.as_ref().and_then(Expr::as_call) else {
                        continue;
                    };
                    let per_component = args.len() == count
                        && args
                            .iter()
                            .all(|arg| types.get(arg.id).is_some_and(|ty| ty.is_scalar()));
                    if !per_component || usage.declarations(&var.name) != 1 {
                        continue;
                    }
                    if (0..count).any(|index| usage.mentions(&scalar_name(&var.name, index))) {
                        continue;
                    }
                    let accesses: Vec<(NodeId, usize)> = exprs
                        .iter()
                        .filter_map(|expr| match &expr.kind {
                            ExprKind::Member { base, field }
                                if base.as_var() == Some(var.name.as_str()) =>
                            {
                                component(field)
                                    .filter(|&index| index < count)
                                    .map(|index| (expr.id, index))
                            }
                            _ => None,
                        })
                        .collect();
                    if accesses.len() == usage.references(&var.name) {
                        found.push(VectorizationOpportunity {
                            decl_stmt: stmt.id,
                            variable: var.name.clone(),
                            components: count,
                            accesses,
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for VectorizationOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let decl = unit
            .find_stmt(self.decl_stmt)
            .and_then(|stmt| match &stmt.kind {
                StmtKind::Decl(var) => Some(var.clone()),
                _ => None,
            });
        let Some((scalar, args)) = decl.and_then(|var| {
            let scalar = var.ty.scalar()?;
            let (_, args) = var.init.as_ref()?.as_call()?;
            Some((scalar, args.to_vec()))
        }) else {
            stale(OpportunityKind::Vectorization, self.decl_stmt);
            return;
        };

        let scalars: Vec<Stmt> = args
            .into_iter()
            .enumerate()
            .map(|(index, arg)| {
                let var = VariableDecl {
                    id: unit.fresh_id(),
                    qualifier: None,
                    ty: scalar.clone(),
                    name: scalar_name(&self.variable, index),
                    init: Some(arg),
                };
                Stmt::new(unit.fresh_id(), StmtKind::Decl(var))
            })
            .collect();
        unit.replace_stmt_with(self.decl_stmt, scalars);

        for &(access, index) in &self.accesses {
            let name = scalar_name(&self.variable, index);
            let replacement = Expr::new(unit.fresh_id(), ExprKind::Var(name));
            unit.replace_expr(access, replacement);
        }
    }

    fn describe(&self) -> String {
        format!(
            "split vector '{}' into {} scalars",
            self.variable, self.components
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "void main() {
            vec3 _GLF_merged = vec3(1.0, 2.0, 3.0);
            _GLF_merged.y = _GLF_merged.x + _GLF_merged.b;
            gl_FragColor = vec4(_GLF_merged.y);
        }";

    #[test]
    fn test_component_wise_vector_is_split() {
        assert_eq!(
            describe_all(VectorizationFinder, SOURCE, false),
            vec!["split vector '_GLF_merged' into 3 scalars"]
        );
        insta::assert_snapshot!(apply_nth(VectorizationFinder, SOURCE, false, 0), @r"
        #version 100
        void main() {
            float _GLF_merged_x = 1.0;
            float _GLF_merged_y = 2.0;
            float _GLF_merged_z = 3.0;
            _GLF_merged_y = _GLF_merged_x + _GLF_merged_z;
            gl_FragColor = vec4(_GLF_merged_y);
        }
        ");
    }

    #[test]
    fn test_whole_vector_use_blocks_the_split() {
        let source = "void main() {
            vec2 v = vec2(1.0, 2.0);
            v.x = 3.0;
            gl_FragColor = vec4(v, 0.0, 1.0);
        }";
        assert!(describe_all(VectorizationFinder, source, true).is_empty());
    }

    #[test]
    fn test_single_component_swizzles() {
        assert_eq!(component("y"), Some(1));
        assert_eq!(component("b"), Some(2));
        assert_eq!(component("q"), Some(3));
        assert_eq!(component("xy"), None);
    }
}
