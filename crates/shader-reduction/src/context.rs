use serde::{Deserialize, Serialize};
use shader_ast::ShadingLanguageVersion;

/// Read-only parameters shared by every finder during one discovery pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanContext {
    language_version: ShadingLanguageVersion,
    exhaustive_scan: bool,
}

impl ScanContext {
    /// A targeted scan: finders only propose edits to injected code.
    pub fn new(language_version: ShadingLanguageVersion) -> Self {
        Self {
            language_version,
            exhaustive_scan: false,
        }
    }

    /// A scan that considers every structurally eligible site.
    pub fn everywhere(language_version: ShadingLanguageVersion) -> Self {
        Self::new(language_version).with_exhaustive_scan(true)
    }

    pub fn with_exhaustive_scan(mut self, exhaustive_scan: bool) -> Self {
        self.exhaustive_scan = exhaustive_scan;
        self
    }

    pub fn language_version(&self) -> ShadingLanguageVersion {
        self.language_version
    }

    pub fn exhaustive_scan(&self) -> bool {
        self.exhaustive_scan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let targeted = ScanContext::new(ShadingLanguageVersion::Essl300);
        assert!(!targeted.exhaustive_scan());
        assert_eq!(targeted.language_version(), ShadingLanguageVersion::Essl300);

        let everywhere = ScanContext::everywhere(ShadingLanguageVersion::Essl100);
        assert!(everywhere.exhaustive_scan());
        assert_eq!(
            everywhere.with_exhaustive_scan(false),
            ScanContext::new(ShadingLanguageVersion::Essl100)
        );
    }
}
