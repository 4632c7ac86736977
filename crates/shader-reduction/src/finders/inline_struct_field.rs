//! Flatten a field of nested struct type into its parent: `o.f.g` becomes
//! `o.f_g` and constructor arguments are spliced in.
//!
//! Targeted scans only consider edits where the parent or the nested struct
//! is injected.

use std::collections::HashMap;

use shader_ast::markers::is_injected_name;
use shader_ast::{ExprKind, NodeId, StructField, TranslationUnit, Type};

use crate::analysis::{expression_types, stale, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct InlineStructFieldFinder;

#[derive(Debug, Clone)]
pub struct InlineStructFieldOpportunity {
    outer: String,
    inner: String,
    field: NodeId,
    field_name: String,
    index: usize,
    constructors: Vec<NodeId>,
    accesses: Vec<NodeId>,
}

impl OpportunityFinder for InlineStructFieldFinder {
    type Opportunity = InlineStructFieldOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::InlineStructField
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<InlineStructFieldOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        let exprs = unit_exprs(unit);

        // Accesses `x.f` with `x` of struct type, keyed by (struct, field),
        // and the subset that is immediately projected again as `x.f.g`.
        let mut field_reads: HashMap<(&str, &str), usize> = HashMap::new();
        let mut projections: HashMap<(&str, &str), Vec<NodeId>> = HashMap::new();
        for expr in &exprs {
            let ExprKind::Member { base, field } = &expr.kind else {
                continue;
            };
            if let Some(Type::Struct(name)) = types.get(base.id) {
                let key = (name.as_str(), field.as_str());
                *field_reads.entry(key).or_default() += 1;
            }
            if let ExprKind::Member {
                base: inner_base,
                field: inner_field,
            } = &base.kind
                && let Some(Type::Struct(name)) = types.get(inner_base.id)
            {
                projections
                    .entry((name.as_str(), inner_field.as_str()))
                    .or_default()
                    .push(expr.id);
            }
        }

        let mut found = Vec::new();
        for outer in unit.structs() {
            for (index, field) in outer.fields.iter().enumerate() {
                let Type::Struct(inner_name) = &field.ty else {
                    continue;
                };
                let Some(inner) = unit.find_struct(inner_name) else {
                    continue;
                };
                if !context.exhaustive_scan()
                    && !is_injected_name(&outer.name)
                    && !is_injected_name(inner_name)
                {
                    continue;
                }
                let collides = inner.fields.iter().any(|nested| {
                    let flattened = format!("{}_{}", field.name, nested.name);
                    outer.fields.iter().any(|other| other.name == flattened)
                });
                if collides {
                    continue;
                }
                let key = (outer.name.as_str(), field.name.as_str());
                let accesses = projections.get(&key).cloned().unwrap_or_default();
                if field_reads.get(&key).copied().unwrap_or(0) != accesses.len() {
                    continue;
                }
                let constructors: Vec<_> = exprs
                    .iter()
                    .filter_map(|expr| {
                        let (callee, args) = expr.as_call()?;
                        (callee == outer.name).then_some((expr.id, args))
                    })
                    .collect();
                let spliceable = constructors.iter().all(|(_, args)| {
                    args.get(index)
                        .and_then(|arg| arg.as_call())
                        .is_some_and(|(callee, nested)| {
                            callee == inner.name && nested.len() == inner.fields.len()
                        })
                });
                if !spliceable {
                    continue;
                }
                found.push(InlineStructFieldOpportunity {
                    outer: outer.name.clone(),
                    inner: inner.name.clone(),
                    field: field.id,
                    field_name: field.name.clone(),
                    index,
                    constructors: constructors.into_iter().map(|(id, _)| id).collect(),
                    accesses,
                });
            }
        }
        Ok(found)
    }
}

impl Opportunity for InlineStructFieldOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(inner_fields) = unit
            .find_struct(&self.inner)
            .map(|decl| decl.fields.clone())
        else {
            stale(OpportunityKind::InlineStructField, self.field);
            return;
        };
        let flattened: Vec<StructField> = inner_fields
            .into_iter()
            .map(|nested| StructField {
                id: unit.fresh_id(),
                ty: nested.ty,
                name: format!("{}_{}", self.field_name, nested.name),
            })
            .collect();
        let Some(outer) = unit.find_struct_mut(&self.outer) else {
            stale(OpportunityKind::InlineStructField, self.field);
            return;
        };
        if outer.fields.get(self.index).map(|field| field.id) != Some(self.field) {
            stale(OpportunityKind::InlineStructField, self.field);
            return;
        }
        outer.fields.splice(self.index..=self.index, flattened);

        for &id in &self.constructors {
            let Some(expr) = unit.find_expr_mut(id) else {
                continue;
            };
            let ExprKind::Call { args, .. } = &mut expr.kind else {
                continue;
            };
            if self.index >= args.len() {
                continue;
            }
            let nested = args.remove(self.index);
            if let ExprKind::Call { args: nested, .. } = nested.kind {
                args.splice(self.index..self.index, nested);
            }
        }

        for &id in &self.accesses {
            let Some(expr) = unit.find_expr_mut(id) else {
                continue;
            };
            let ExprKind::Member { base, field } = &mut expr.kind else {
                continue;
            };
            let ExprKind::Member {
                base: inner_base,
                field: inner_field,
            } = &base.kind
            else {
                continue;
            };
            let name = format!("{inner_field}_{field}");
            let projected = (**inner_base).clone();
            *base = Box::new(projected);
            *field = name;
        }
    }

    fn describe(&self) -> String {
        format!(
            "inline field '{}' of struct '{}'",
            self.field_name, self.outer
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "struct Inner { float a; int b; };
        struct Outer { Inner f; float c; };
        void main() {
            Outer o = Outer(Inner(1.0, 2), 3.0);
            o.f.a = o.c;
            gl_FragColor = vec4(o.f.a, float(o.f.b), 0.0, 1.0);
        }";

    #[test]
    fn test_nested_field_is_flattened() {
        assert_eq!(
            describe_all(InlineStructFieldFinder, SOURCE, true),
            vec!["inline field 'f' of struct 'Outer'"]
        );
        assert!(describe_all(InlineStructFieldFinder, SOURCE, false).is_empty());
        insta::assert_snapshot!(apply_nth(InlineStructFieldFinder, SOURCE, true, 0), @r"
        #version 100
        struct Inner {
            float a;
            int b;
        };
        struct Outer {
            float f_a;
            int f_b;
            float c;
        };
        void main() {
            Outer o = Outer(1.0, 2, 3.0);
            o.f_a = o.c;
            gl_FragColor = vec4(o.f_a, float(o.f_b), 0.0, 1.0);
        }
        ");
    }

    #[test]
    fn test_whole_field_read_blocks_the_edit() {
        let source = SOURCE.replace("o.f.a = o.c;", "Inner i = o.f;");
        assert!(describe_all(InlineStructFieldFinder, &source, true).is_empty());
    }

    #[test]
    fn test_constructor_argument_must_be_spliceable() {
        let source = "struct Inner { float a; };
            struct _GLF_Outer { Inner f; };
            void main() {
                Inner i = Inner(1.0);
                _GLF_Outer o = _GLF_Outer(i);
                gl_FragColor = vec4(o.f.a);
            }";
        assert!(describe_all(InlineStructFieldFinder, source, false).is_empty());
    }
}
