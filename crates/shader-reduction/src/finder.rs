use shader_ast::TranslationUnit;

use crate::context::ScanContext;
use crate::error::ReductionResult;
use crate::opportunity::{Opportunity, OpportunityKind};

/// A scanning strategy for one kind of opportunity.
///
/// Finders are pure: they read the tree and the context, never modify either,
/// and keep no state between calls. Opportunities come back in a
/// deterministic order.
pub trait OpportunityFinder: Send + Sync {
    type Opportunity: Opportunity + 'static;

    fn kind(&self) -> OpportunityKind;

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<Self::Opportunity>>;
}

/// Object-safe view of an [`OpportunityFinder`], used by the registry.
pub trait DynFinder: Send + Sync {
    fn kind(&self) -> OpportunityKind;

    fn find_boxed(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<Box<dyn Opportunity>>>;
}

impl<F: OpportunityFinder> DynFinder for F {
    fn kind(&self) -> OpportunityKind {
        OpportunityFinder::kind(self)
    }

    fn find_boxed(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<Box<dyn Opportunity>>> {
        let found = self.find_opportunities(unit, context)?;
        Ok(found
            .into_iter()
            .map(|opportunity| Box::new(opportunity) as Box<dyn Opportunity>)
            .collect())
    }
}
