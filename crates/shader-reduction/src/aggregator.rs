//! Runs every registered finder and collects one worklist.

use shader_ast::TranslationUnit;
use tracing::{debug, debug_span, trace};

use crate::checked::{ValidityCheck, validity_checked};
use crate::context::ScanContext;
use crate::error::{ReductionError, ReductionResult};
use crate::opportunity::{Opportunity, OpportunityKind};
use crate::registry::FinderRegistry;

/// One entry of the worklist returned by discovery.
#[derive(Debug)]
pub struct Proposal {
    pub kind: OpportunityKind,
    /// Whether the edit was verified against a copy of the tree.
    pub validated: bool,
    pub opportunity: Box<dyn Opportunity>,
}

impl Opportunity for Proposal {
    fn apply(&self, unit: &mut TranslationUnit) {
        self.opportunity.apply(unit)
    }

    fn describe(&self) -> String {
        self.opportunity.describe()
    }
}

#[derive(Debug)]
pub struct OpportunityAggregator {
    registry: FinderRegistry,
}

impl Default for OpportunityAggregator {
    fn default() -> Self {
        Self::new(FinderRegistry::standard())
    }
}

impl OpportunityAggregator {
    pub fn new(registry: FinderRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &FinderRegistry {
        &self.registry
    }

    /// Concatenate the results of every finder, in registry order.
    ///
    /// With `check` enabled each opportunity is first applied to a copy of
    /// `unit`; one that breaks the tree aborts discovery with
    /// [`ReductionErrorKind::InvalidOpportunity`](crate::ReductionErrorKind).
    /// Any finder error aborts discovery as well, and so does an invalid
    /// `unit` when checking is enabled.
    pub fn discover(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
        check: ValidityCheck,
    ) -> ReductionResult<Vec<Proposal>> {
        let validated = check.is_enabled();
        if validated {
            shader_ast::validate(unit, context.language_version())
                .map_err(ReductionError::invalid_input)?;
        }
        let mut proposals = Vec::new();
        for finder in self.registry.iter() {
            let kind = finder.kind();
            let span = debug_span!("find_opportunities", %kind);
            let _guard = span.enter();

            let found = finder.find_boxed(unit, context)?;
            debug!(count = found.len(), "scan finished");

            let check_one = validity_checked(unit, context.language_version(), kind);
            for opportunity in found {
                let opportunity: Box<dyn Opportunity> = if validated {
                    Box::new(check_one(opportunity)?)
                } else {
                    opportunity
                };
                trace!(description = %opportunity.describe(), "proposed");
                proposals.push(Proposal {
                    kind,
                    validated,
                    opportunity,
                });
            }
        }
        debug!(total = proposals.len(), "discovery finished");
        Ok(proposals)
    }
}

/// Discover opportunities with the standard registry.
pub fn discover(
    unit: &TranslationUnit,
    context: &ScanContext,
    validity_check: bool,
) -> ReductionResult<Vec<Proposal>> {
    OpportunityAggregator::default().discover(unit, context, validity_check.into())
}
