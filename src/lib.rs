//! Command-line front end for shader reduction-opportunity discovery.
//!
//! The binary parses a shader, runs the standard finders over it and either
//! lists what it found or applies one proposal and prints the result. The
//! functions here take and return text so they can be driven without a
//! terminal.

mod error;

use shader_ast::{ShadingLanguageVersion, TranslationUnit, parse, print, validate};
use shader_reduction::{Opportunity, Proposal, ScanContext, discover};
use tracing::info;

pub use error::{AppError, AppResult};

/// How a shader is scanned.
#[derive(Clone, Copy, Debug, Default)]
pub struct ScanOptions {
    /// Overrides the program's own `#version`.
    pub language_version: Option<ShadingLanguageVersion>,
    /// Consider every eligible site rather than only injected code.
    pub everywhere: bool,
    /// Verify each proposal against a copy of the program.
    pub check: bool,
}

impl ScanOptions {
    fn version_of(&self, unit: &TranslationUnit) -> ShadingLanguageVersion {
        self.language_version.unwrap_or(unit.version)
    }

    fn context(&self, unit: &TranslationUnit) -> ScanContext {
        ScanContext::new(self.version_of(unit)).with_exhaustive_scan(self.everywhere)
    }
}

fn proposals(unit: &TranslationUnit, options: &ScanOptions) -> AppResult<Vec<Proposal>> {
    let context = options.context(unit);
    let found = discover(unit, &context, options.check)?;
    info!(
        count = found.len(),
        version = %context.language_version(),
        everywhere = options.everywhere,
        "discovery finished"
    );
    Ok(found)
}

/// Parse and check a program, summarising it on success.
pub fn check(source: &str, options: &ScanOptions) -> AppResult<String> {
    let unit = parse(source)?;
    let version = options.version_of(&unit);
    validate(&unit, version)?;
    Ok(format!("ok: {} declarations, version {version}", unit.decls.len()))
}

/// One line per proposal: its index, kind and description.
pub fn list(source: &str, options: &ScanOptions) -> AppResult<Vec<String>> {
    let unit = parse(source)?;
    Ok(proposals(&unit, options)?
        .iter()
        .enumerate()
        .map(|(index, proposal)| format!("{index}\t{}\t{}", proposal.kind, proposal.describe()))
        .collect())
}

/// Apply the `index`th proposal and print the edited program.
pub fn apply(source: &str, index: usize, options: &ScanOptions) -> AppResult<String> {
    let mut unit = parse(source)?;
    let found = proposals(&unit, options)?;
    let proposal = found.get(index).ok_or(AppError::NoSuchOpportunity {
        index,
        available: found.len(),
    })?;
    info!(kind = %proposal.kind, description = %proposal.describe(), "applying");
    proposal.apply(&mut unit);
    Ok(print(&unit))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "float _GLF_unused() { return 1.0; }
        void main() {
            float x = 1.0;
            if (_GLF_DEAD(false)) { x = 2.0; }
            gl_FragColor = vec4(x);
        }";

    #[test]
    fn test_check_summary() {
        insta::assert_snapshot!(
            check(SOURCE, &ScanOptions::default()).unwrap(),
            @"ok: 2 declarations, version 100"
        );
    }

    #[test]
    fn test_check_reports_errors() {
        let error = check("void main() { x = 1.0; }", &ScanOptions::default()).unwrap_err();
        assert!(matches!(error, AppError::Invalid(_)));
        assert!(error.to_string().starts_with("undeclared identifier 'x'"));
    }

    #[test]
    fn test_list_lines() {
        let options = ScanOptions {
            check: true,
            ..ScanOptions::default()
        };
        let lines = list(SOURCE, &options).unwrap();
        assert!(!lines.is_empty());
        assert!(lines.iter().all(|line| line.split('\t').count() == 3));
        assert!(lines.iter().any(|line| line.contains("remove unused function '_GLF_unused'")));
    }

    #[test]
    fn test_apply_out_of_range() {
        let error = apply(SOURCE, 1000, &ScanOptions::default()).unwrap_err();
        assert!(matches!(error, AppError::NoSuchOpportunity { index: 1000, .. }));
    }
}
