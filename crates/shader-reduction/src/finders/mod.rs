//! The standard finders, one module per kind of edit.

mod compound_expr_to_sub_expr;
mod compound_to_block;
mod declaration;
mod destructify;
mod expr_to_constant;
mod function;
mod inline_function;
mod inline_initializer;
mod inline_struct_field;
mod live_frag_color_write;
mod loop_merge;
mod mutation;
mod outlined_statement;
mod remove_struct_field;
mod statement;
mod unswitchify;
mod unused_param;
mod unused_struct;
mod unwrap;
mod vectorization;

pub use compound_expr_to_sub_expr::{
    CompoundExprToSubExprFinder, CompoundExprToSubExprOpportunity,
};
pub use compound_to_block::{CompoundToBlockFinder, CompoundToBlockOpportunity};
pub use declaration::{DeclarationFinder, DeclarationOpportunity};
pub use destructify::{DestructifyFinder, DestructifyOpportunity};
pub use expr_to_constant::{ExprToConstantFinder, ExprToConstantOpportunity};
pub use function::{FunctionFinder, FunctionOpportunity};
pub use inline_function::{InlineFunctionFinder, InlineFunctionOpportunity};
pub use inline_initializer::{InlineInitializerFinder, InlineInitializerOpportunity};
pub use inline_struct_field::{InlineStructFieldFinder, InlineStructFieldOpportunity};
pub use live_frag_color_write::{LiveFragColorWriteFinder, LiveFragColorWriteOpportunity};
pub use loop_merge::{LoopMergeFinder, LoopMergeOpportunity};
pub use mutation::{MutationFinder, MutationOpportunity};
pub use outlined_statement::{OutlinedStatementFinder, OutlinedStatementOpportunity};
pub use remove_struct_field::{RemoveStructFieldFinder, RemoveStructFieldOpportunity};
pub use statement::{StatementFinder, StatementOpportunity};
pub use unswitchify::{UnswitchifyFinder, UnswitchifyOpportunity};
pub use unused_param::{UnusedParamFinder, UnusedParamOpportunity};
pub use unused_struct::{UnusedStructFinder, UnusedStructOpportunity};
pub use unwrap::{UnwrapFinder, UnwrapOpportunity};
pub use vectorization::{VectorizationFinder, VectorizationOpportunity};

#[cfg(test)]
pub(crate) mod testing {
    use shader_ast::{TranslationUnit, parse, print, validate};

    use crate::{Opportunity, OpportunityFinder, ScanContext};

    fn scan<F: OpportunityFinder>(
        finder: &F,
        source: &str,
        everywhere: bool,
    ) -> (TranslationUnit, Vec<F::Opportunity>) {
        let unit = parse(source).expect("test source should parse");
        let context = ScanContext::new(unit.version).with_exhaustive_scan(everywhere);
        let found = finder
            .find_opportunities(&unit, &context)
            .expect("scan should succeed");
        (unit, found)
    }

    /// Descriptions of everything `finder` proposes for `source`.
    pub fn describe_all<F: OpportunityFinder>(
        finder: F,
        source: &str,
        everywhere: bool,
    ) -> Vec<String> {
        let (_, found) = scan(&finder, source, everywhere);
        found.iter().map(Opportunity::describe).collect()
    }

    /// Apply the `index`th proposal to `source` and print the result, which
    /// must still pass the checker.
    pub fn apply_nth<F: OpportunityFinder>(
        finder: F,
        source: &str,
        everywhere: bool,
        index: usize,
    ) -> String {
        let (unit, found) = scan(&finder, source, everywhere);
        let opportunity = found
            .get(index)
            .unwrap_or_else(|| panic!("only {} opportunities found", found.len()));
        let mut edited = unit.clone();
        opportunity.apply(&mut edited);
        if let Err(errors) = validate(&edited, edited.version) {
            panic!(
                "'{}' produced an invalid program:\n{}\n{errors}",
                opportunity.describe(),
                print(&edited)
            );
        }
        print(&edited)
    }
}
