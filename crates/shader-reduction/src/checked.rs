//! Speculative validity checking of proposed edits.

use serde::{Deserialize, Serialize};
use shader_ast::{ShadingLanguageVersion, TranslationUnit};

use crate::error::{ReductionError, ReductionResult};
use crate::opportunity::{Opportunity, OpportunityKind};

/// Whether discovery verifies each opportunity before returning it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValidityCheck {
    #[default]
    Disabled,
    Enabled,
}

impl ValidityCheck {
    pub fn is_enabled(self) -> bool {
        self == ValidityCheck::Enabled
    }
}

impl From<bool> for ValidityCheck {
    fn from(enabled: bool) -> Self {
        if enabled {
            ValidityCheck::Enabled
        } else {
            ValidityCheck::Disabled
        }
    }
}

/// An opportunity known to leave the tree it was discovered on valid.
#[derive(Debug)]
pub struct Checked<O> {
    inner: O,
    kind: OpportunityKind,
}

impl<O: Opportunity> Checked<O> {
    /// Apply `inner` to a private copy of `unit` and run the structural
    /// checker on the result. A failure is a finder bug and is reported as
    /// [`ReductionErrorKind::InvalidOpportunity`](crate::ReductionErrorKind).
    pub fn validate(
        inner: O,
        unit: &TranslationUnit,
        version: ShadingLanguageVersion,
        kind: OpportunityKind,
    ) -> ReductionResult<Self> {
        let mut trial = unit.clone();
        inner.apply(&mut trial);
        match shader_ast::validate(&trial, version) {
            Ok(_) => Ok(Self { inner, kind }),
            Err(errors) => {
                let description = inner.describe();
                tracing::error!(
                    %kind,
                    %description,
                    %errors,
                    "opportunity leaves the tree invalid"
                );
                Err(ReductionError::invalid_opportunity(kind, description, errors))
            }
        }
    }

    pub fn kind(&self) -> OpportunityKind {
        self.kind
    }

    pub fn inner(&self) -> &O {
        &self.inner
    }

    pub fn into_inner(self) -> O {
        self.inner
    }
}

impl<O: Opportunity> Opportunity for Checked<O> {
    fn apply(&self, unit: &mut TranslationUnit) {
        self.inner.apply(unit)
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

/// A wrapping step bound to one tree, for use while mapping over a finder's
/// results.
pub fn validity_checked<O: Opportunity>(
    unit: &TranslationUnit,
    version: ShadingLanguageVersion,
    kind: OpportunityKind,
) -> impl Fn(O) -> ReductionResult<Checked<O>> + '_ {
    move |opportunity| Checked::validate(opportunity, unit, version, kind)
}
