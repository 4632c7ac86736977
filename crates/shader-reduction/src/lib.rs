//! Reduction-opportunity discovery for shader test cases.
//!
//! A reducer shrinks a failing shader by repeatedly applying small edits that
//! keep the failure alive. This crate finds those edits: each
//! [`OpportunityFinder`] scans a [`TranslationUnit`](shader_ast::TranslationUnit)
//! for one kind of edit, and [`discover`] runs the standard
//! [`FinderRegistry`] in a fixed order, optionally verifying each edit
//! against a copy of the tree.

mod aggregator;
mod analysis;
mod checked;
mod context;
mod error;
mod finder;
pub mod finders;
mod opportunity;
mod registry;

pub use aggregator::{OpportunityAggregator, Proposal, discover};
pub use checked::{Checked, ValidityCheck, validity_checked};
pub use context::ScanContext;
pub use error::{ReductionError, ReductionErrorKind, ReductionResult};
pub use finder::{DynFinder, OpportunityFinder};
pub use opportunity::{Opportunity, OpportunityKind};
pub use registry::FinderRegistry;
