//! Remove a function parameter its body never reads, together with the
//! matching argument at every call.
//!
//! Targeted scans only consider injected parameters.

use shader_ast::markers::is_injected_name;
use shader_ast::{ExprKind, NodeId, TranslationUnit};

use crate::analysis::{NameUsage, stale, unit_exprs};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct UnusedParamFinder;

#[derive(Debug, Clone)]
pub struct UnusedParamOpportunity {
    function: String,
    param: String,
    id: NodeId,
}

impl OpportunityFinder for UnusedParamFinder {
    type Opportunity = UnusedParamOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::UnusedParam
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<UnusedParamOpportunity>> {
        let mut found = Vec::new();
        for function in unit.functions().filter(|function| function.name != "main") {
            let usage = NameUsage::of_function(function);
            found.extend(
                function
                    .params
                    .iter()
                    .filter(|param| context.exhaustive_scan() || is_injected_name(&param.name))
                    .filter(|param| usage.references(&param.name) == 0)
                    .map(|param| UnusedParamOpportunity {
                        function: function.name.clone(),
                        param: param.name.clone(),
                        id: param.id,
                    }),
            );
        }
        Ok(found)
    }
}

impl Opportunity for UnusedParamOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(index) = unit.find_function_mut(&self.function).and_then(|function| {
            let index = function.param_index(&self.param)?;
            function.params.remove(index);
            Some(index)
        }) else {
            stale(OpportunityKind::UnusedParam, self.id);
            return;
        };
        let calls: Vec<NodeId> = unit_exprs(unit)
            .into_iter()
            .filter(|expr| matches!(expr.as_call(), Some((callee, _)) if callee == self.function))
            .map(|expr| expr.id)
            .collect();
        for call in calls {
            if let Some(ExprKind::Call { args, .. }) =
                unit.find_expr_mut(call).map(|expr| &mut expr.kind)
                && index < args.len()
            {
                args.remove(index);
            }
        }
    }

    fn describe(&self) -> String {
        format!(
            "remove unused parameter '{}' of '{}'",
            self.param, self.function
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "float _GLF_f(float a, float _GLF_unused) { return a; }
        float g(float a, float b) { return a; }
        void main() { gl_FragColor = vec4(_GLF_f(1.0, 2.0) + g(1.0, 2.0)); }";

    #[test]
    fn test_unread_parameters() {
        assert_eq!(
            describe_all(UnusedParamFinder, SOURCE, false),
            vec!["remove unused parameter '_GLF_unused' of '_GLF_f'"]
        );
        assert_eq!(
            describe_all(UnusedParamFinder, SOURCE, true),
            vec![
                "remove unused parameter '_GLF_unused' of '_GLF_f'",
                "remove unused parameter 'b' of 'g'",
            ]
        );
    }

    #[test]
    fn test_parameter_and_arguments_are_removed() {
        insta::assert_snapshot!(apply_nth(UnusedParamFinder, SOURCE, false, 0), @r"
        #version 100
        float _GLF_f(float a) {
            return a;
        }
        float g(float a, float b) {
            return a;
        }
        void main() {
            gl_FragColor = vec4(_GLF_f(1.0) + g(1.0, 2.0));
        }
        ");
    }
}
