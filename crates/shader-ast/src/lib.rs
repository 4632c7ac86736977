//! Program tree for shader test cases.
//!
//! This crate provides the tree the reducer works on: parsing, canonical
//! printing, traversal, id-addressed editing, and the structural-invariant
//! checker that every accepted tree must pass.

pub mod ast;
mod lookup;
pub mod markers;
mod parser;
mod printer;
pub mod validation;
pub mod version;
pub mod visit;

pub use ast::*;
pub use markers::{INJECTED_PREFIX, Marker};
pub use parser::{ParseError, parse};
pub use printer::{format_float, print, print_expr, print_stmt};
pub use validation::{TypeTable, ValidationError, ValidationErrors, validate};
pub use version::{ShadingLanguageVersion, UnknownVersion};
pub use visit::{Visitor, VisitorMut};
