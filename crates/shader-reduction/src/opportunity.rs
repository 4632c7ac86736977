use std::fmt;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use shader_ast::TranslationUnit;

/// An atomic simplifying edit discovered on a tree.
///
/// `apply` assumes the tree is still in the state the opportunity was
/// discovered in. Applying a stale opportunity does nothing.
pub trait Opportunity: fmt::Debug + Send + Sync {
    fn apply(&self, unit: &mut TranslationUnit);

    /// Stable, human-readable identification of the edit.
    fn describe(&self) -> String;
}

impl<O: Opportunity + ?Sized> Opportunity for Box<O> {
    fn apply(&self, unit: &mut TranslationUnit) {
        (**self).apply(unit)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// The kinds of edit, in the order the standard registry runs their finders.
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum OpportunityKind {
    #[display("loop-merge")]
    LoopMerge,
    #[display("remove-struct-field")]
    RemoveStructField,
    #[display("destructify")]
    Destructify,
    #[display("unused-struct")]
    UnusedStruct,
    #[display("inline-struct-field")]
    InlineStructField,
    #[display("outlined-statement")]
    OutlinedStatement,
    #[display("declaration")]
    Declaration,
    #[display("unwrap")]
    Unwrap,
    #[display("unswitchify")]
    Unswitchify,
    #[display("vectorization")]
    Vectorization,
    #[display("function")]
    Function,
    #[display("statement")]
    Statement,
    #[display("expression-to-constant")]
    ExprToConstant,
    #[display("compound-expression-to-sub-expression")]
    CompoundExprToSubExpr,
    #[display("mutation")]
    Mutation,
    #[display("compound-to-block")]
    CompoundToBlock,
    #[display("inline-initializer")]
    InlineInitializer,
    #[display("inline-function")]
    InlineFunction,
    #[display("live-fragment-colour-write")]
    LiveFragColorWrite,
    #[display("unused-parameter")]
    UnusedParam,
}

impl OpportunityKind {
    pub const ALL: [OpportunityKind; 20] = [
        OpportunityKind::LoopMerge,
        OpportunityKind::RemoveStructField,
        OpportunityKind::Destructify,
        OpportunityKind::UnusedStruct,
        OpportunityKind::InlineStructField,
        OpportunityKind::OutlinedStatement,
        OpportunityKind::Declaration,
        OpportunityKind::Unwrap,
        OpportunityKind::Unswitchify,
        OpportunityKind::Vectorization,
        OpportunityKind::Function,
        OpportunityKind::Statement,
        OpportunityKind::ExprToConstant,
        OpportunityKind::CompoundExprToSubExpr,
        OpportunityKind::Mutation,
        OpportunityKind::CompoundToBlock,
        OpportunityKind::InlineInitializer,
        OpportunityKind::InlineFunction,
        OpportunityKind::LiveFragColorWrite,
        OpportunityKind::UnusedParam,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_distinct() {
        let mut names: Vec<String> = OpportunityKind::ALL
            .iter()
            .map(ToString::to_string)
            .collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), OpportunityKind::ALL.len());
    }

    #[test]
    fn test_all_follows_declaration_order() {
        let kinds = OpportunityKind::ALL;
        assert!(kinds.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
