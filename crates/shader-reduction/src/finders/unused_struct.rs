//! Remove struct declarations that no type or constructor refers to.
//!
//! Targeted scans only consider injected structs.

use shader_ast::markers::is_injected_name;
use shader_ast::{NodeId, TranslationUnit};

use crate::analysis::{NameUsage, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct UnusedStructFinder;

#[derive(Debug, Clone)]
pub struct UnusedStructOpportunity {
    decl: NodeId,
    name: String,
}

impl OpportunityFinder for UnusedStructFinder {
    type Opportunity = UnusedStructOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::UnusedStruct
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<UnusedStructOpportunity>> {
        let usage = NameUsage::of_unit(unit);
        Ok(unit
            .structs()
            .filter(|decl| context.exhaustive_scan() || is_injected_name(&decl.name))
            .filter(|decl| usage.type_uses(&decl.name) == 0 && usage.calls(&decl.name) == 0)
            .map(|decl| UnusedStructOpportunity {
                decl: decl.id,
                name: decl.name.clone(),
            })
            .collect())
    }
}

impl Opportunity for UnusedStructOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        if unit.remove_decl(self.decl).is_none() {
            stale(OpportunityKind::UnusedStruct, self.decl);
        }
    }

    fn describe(&self) -> String {
        format!("remove unused struct '{}'", self.name)
    }
}
