//! Remove functions, other than `main`, that nothing calls.
//!
//! Targeted scans only consider injected functions.

use shader_ast::markers::is_injected_name;
use shader_ast::{NodeId, TranslationUnit};

use crate::analysis::{NameUsage, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct FunctionFinder;

#[derive(Debug, Clone)]
pub struct FunctionOpportunity {
    decl: NodeId,
    name: String,
}

impl OpportunityFinder for FunctionFinder {
    type Opportunity = FunctionOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Function
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<FunctionOpportunity>> {
        let usage = NameUsage::of_unit(unit);
        Ok(unit
            .functions()
            .filter(|function| function.name != "main")
            .filter(|function| context.exhaustive_scan() || is_injected_name(&function.name))
            .filter(|function| usage.calls(&function.name) == 0)
            .map(|function| FunctionOpportunity {
                decl: function.id,
                name: function.name.clone(),
            })
            .collect())
    }
}

impl Opportunity for FunctionOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        if unit.remove_decl(self.decl).is_none() {
            stale(OpportunityKind::Function, self.decl);
        }
    }

    fn describe(&self) -> String {
        format!("remove unused function '{}'", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "float _GLF_helper() { return 1.0; }
        float unused(float a) { return a; }
        float used() { return 2.0; }
        void main() { gl_FragColor = vec4(used()); }";

    #[test]
    fn test_uncalled_functions() {
        assert_eq!(
            describe_all(FunctionFinder, SOURCE, false),
            vec!["remove unused function '_GLF_helper'"]
        );
        assert_eq!(
            describe_all(FunctionFinder, SOURCE, true),
            vec![
                "remove unused function '_GLF_helper'",
                "remove unused function 'unused'",
            ]
        );
        insta::assert_snapshot!(apply_nth(FunctionFinder, SOURCE, true, 1), @r"
        #version 100
        float _GLF_helper() {
            return 1.0;
        }
        float used() {
            return 2.0;
        }
        void main() {
            gl_FragColor = vec4(used());
        }
        ");
    }

    #[test]
    fn test_targeted_scan_skips_plain_functions() {
        let source = "float unused() { return 1.0; }
            void main() { gl_FragColor = vec4(1.0); }";
        assert!(describe_all(FunctionFinder, source, false).is_empty());
        assert_eq!(
            describe_all(FunctionFinder, source, true),
            vec!["remove unused function 'unused'"]
        );
    }

    #[test]
    fn test_entry_point_and_called_functions_are_kept() {
        let source = "float _GLF_inner() { return 1.0; }
            float _GLF_outer() { return _GLF_inner(); }
            void main() { gl_FragColor = vec4(_GLF_outer()); }";
        assert!(describe_all(FunctionFinder, source, true).is_empty());

        let only_main = "void main() { gl_FragColor = vec4(1.0); }";
        assert!(describe_all(FunctionFinder, only_main, true).is_empty());
    }
}
