use std::fmt;

use crate::finder::{DynFinder, OpportunityFinder};
use crate::finders::*;
use crate::opportunity::OpportunityKind;

/// An ordered list of finders. Discovery runs them in insertion order.
#[derive(Default)]
pub struct FinderRegistry {
    finders: Vec<Box<dyn DynFinder>>,
}

impl FinderRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every finder, in the order their kinds are declared.
    pub fn standard() -> Self {
        Self::new()
            .with(LoopMergeFinder)
            .with(RemoveStructFieldFinder)
            .with(DestructifyFinder)
            .with(UnusedStructFinder)
            .with(InlineStructFieldFinder)
            .with(OutlinedStatementFinder)
            .with(DeclarationFinder)
            .with(UnwrapFinder)
            .with(UnswitchifyFinder)
            .with(VectorizationFinder)
            .with(FunctionFinder)
            .with(StatementFinder)
            .with(ExprToConstantFinder)
            .with(CompoundExprToSubExprFinder)
            .with(MutationFinder)
            .with(CompoundToBlockFinder)
            .with(InlineInitializerFinder)
            .with(InlineFunctionFinder)
            .with(LiveFragColorWriteFinder)
            .with(UnusedParamFinder)
    }

    /// Append a finder.
    pub fn with<F: OpportunityFinder + 'static>(mut self, finder: F) -> Self {
        self.finders.push(Box::new(finder));
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn DynFinder> {
        self.finders.iter().map(|finder| finder.as_ref())
    }

    pub fn kinds(&self) -> Vec<OpportunityKind> {
        self.iter().map(|finder| finder.kind()).collect()
    }

    pub fn len(&self) -> usize {
        self.finders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finders.is_empty()
    }
}

impl fmt::Debug for FinderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_order() {
        let registry = FinderRegistry::standard();
        assert_eq!(registry.kinds(), OpportunityKind::ALL.to_vec());
    }

    #[test]
    fn test_custom_registry() {
        let registry = FinderRegistry::new()
            .with(MutationFinder)
            .with(LoopMergeFinder);
        assert_eq!(
            registry.kinds(),
            vec![OpportunityKind::Mutation, OpportunityKind::LoopMerge]
        );
        assert!(FinderRegistry::new().is_empty());
    }
}
