use std::fmt::Display;

use derive_more::{Display, From};

use crate::opportunity::OpportunityKind;

/// Fatal failure of opportunity discovery.
#[derive(Clone, Display, Debug, From, PartialEq)]
#[display("{kind}")]
pub struct ReductionError {
    #[from]
    kind: Box<ReductionErrorKind>,
}

impl From<ReductionErrorKind> for ReductionError {
    fn from(kind: ReductionErrorKind) -> Self {
        Box::new(kind).into()
    }
}

impl ReductionError {
    /// A finder proposed an edit that leaves the tree structurally invalid.
    pub fn invalid_opportunity(
        kind: OpportunityKind,
        description: impl Into<String>,
        reason: impl Display,
    ) -> Self {
        ReductionErrorKind::InvalidOpportunity {
            kind,
            description: description.into(),
            reason: reason.to_string(),
        }
        .into()
    }

    pub fn scan_failed(kind: OpportunityKind, reason: impl Display) -> Self {
        ReductionErrorKind::ScanFailed {
            kind,
            reason: reason.to_string(),
        }
        .into()
    }

    /// The program handed to discovery was already invalid.
    pub fn invalid_input(reason: impl Display) -> Self {
        ReductionErrorKind::InvalidInput {
            reason: reason.to_string(),
        }
        .into()
    }

    pub fn kind(&self) -> &ReductionErrorKind {
        &self.kind
    }

    /// The finder that produced this error, if a finder did.
    pub fn opportunity_kind(&self) -> Option<OpportunityKind> {
        match &*self.kind {
            ReductionErrorKind::InvalidOpportunity { kind, .. }
            | ReductionErrorKind::ScanFailed { kind, .. } => Some(*kind),
            ReductionErrorKind::InvalidInput { .. } => None,
        }
    }
}

impl std::error::Error for ReductionError {}

#[derive(Clone, Display, Debug, PartialEq)]
pub enum ReductionErrorKind {
    #[display("{kind} finder proposed an invalid opportunity '{description}': {reason}")]
    InvalidOpportunity {
        kind: OpportunityKind,
        description: String,
        reason: String,
    },
    #[display("{kind} finder failed: {reason}")]
    ScanFailed {
        kind: OpportunityKind,
        reason: String,
    },
    #[display("input program is invalid: {reason}")]
    InvalidInput { reason: String },
}

pub type ReductionResult<T> = Result<T, ReductionError>;
