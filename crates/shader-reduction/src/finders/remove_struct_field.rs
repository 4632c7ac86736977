//! Remove a struct field that is never accessed, together with the matching
//! argument of every constructor call.
//!
//! Targeted scans only consider fields of injected structs and injected
//! fields.

use std::collections::HashSet;

use shader_ast::markers::is_injected_name;
use shader_ast::{ExprKind, NodeId, TranslationUnit, Type};

use crate::analysis::{expression_types, stale, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct RemoveStructFieldFinder;

#[derive(Debug, Clone)]
pub struct RemoveStructFieldOpportunity {
    struct_name: String,
    field: NodeId,
    field_name: String,
    index: usize,
    constructors: Vec<NodeId>,
}

impl OpportunityFinder for RemoveStructFieldFinder {
    type Opportunity = RemoveStructFieldOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::RemoveStructField
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<RemoveStructFieldOpportunity>> {
        let types = expression_types(unit, context, self.kind())?;
        let exprs = unit_exprs(unit);

        let mut accessed = HashSet::new();
        for expr in &exprs {
            if let ExprKind::Member { base, field } = &expr.kind
                && let Some(Type::Struct(name)) = types.get(base.id)
            {
                accessed.insert((name.as_str(), field.as_str()));
            }
        }

        let mut found = Vec::new();
        for decl in unit.structs() {
            if decl.fields.len() < 2 {
                continue;
            }
            let constructors: Vec<NodeId> = exprs
                .iter()
                .filter(|expr| matches!(expr.as_call(), Some((callee, _)) if callee == decl.name))
                .map(|expr| expr.id)
                .collect();
            for (index, field) in decl.fields.iter().enumerate() {
                if accessed.contains(&(decl.name.as_str(), field.name.as_str())) {
                    continue;
                }
                let injected = is_injected_name(&decl.name) || is_injected_name(&field.name);
                if !context.exhaustive_scan() && !injected {
                    continue;
                }
                found.push(RemoveStructFieldOpportunity {
                    struct_name: decl.name.clone(),
                    field: field.id,
                    field_name: field.name.clone(),
                    index,
                    constructors: constructors.clone(),
                });
            }
        }
        Ok(found)
    }
}

impl Opportunity for RemoveStructFieldOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(decl) = unit.find_struct_mut(&self.struct_name) else {
            stale(OpportunityKind::RemoveStructField, self.field);
            return;
        };
        let Some(position) = decl.fields.iter().position(|field| field.id == self.field) else {
            stale(OpportunityKind::RemoveStructField, self.field);
            return;
        };
        decl.fields.remove(position);
        for &id in &self.constructors {
            if let Some(expr) = unit.find_expr_mut(id)
                && let ExprKind::Call { args, .. } = &mut expr.kind
                && self.index < args.len()
            {
                args.remove(self.index);
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "remove field '{}' of struct '{}'",
            self.field_name, self.struct_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "struct S { float a; float b; };
        void main() { S s = S(1.0, 2.0); gl_FragColor = vec4(s.a); }";

    #[test]
    fn test_unaccessed_field_is_removed_with_its_argument() {
        assert_eq!(
            describe_all(RemoveStructFieldFinder, SOURCE, true),
            vec!["remove field 'b' of struct 'S'"]
        );
        insta::assert_snapshot!(apply_nth(RemoveStructFieldFinder, SOURCE, true, 0), @r"
        #version 100
        struct S {
            float a;
        };
        void main() {
            S s = S(1.0);
            gl_FragColor = vec4(s.a);
        }
        ");
    }

    #[test]
    fn test_targeted_scan_needs_injected_names() {
        assert!(describe_all(RemoveStructFieldFinder, SOURCE, false).is_empty());
        let injected = "struct S { float a; int _GLF_pad; };
            void main() { S s = S(1.0, 2); gl_FragColor = vec4(s.a); }";
        assert_eq!(
            describe_all(RemoveStructFieldFinder, injected, false),
            vec!["remove field '_GLF_pad' of struct 'S'"]
        );
    }

    #[test]
    fn test_last_field_is_kept() {
        let source = "struct S { float a; }; void main() { S s = S(1.0); }";
        assert!(describe_all(RemoveStructFieldFinder, source, true).is_empty());
    }

    #[test]
    fn test_ill_typed_input_fails_the_scan() {
        let unit = shader_ast::parse("void main() { x = 1.0; }").unwrap();
        let err = RemoveStructFieldFinder
            .find_opportunities(&unit, &ScanContext::everywhere(unit.version))
            .unwrap_err();
        assert_eq!(
            err.opportunity_kind(),
            Some(OpportunityKind::RemoveStructField)
        );
    }
}
