//! Shading language versions and the features they gate.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};

/// A `#version` the program targets.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
)]
pub enum ShadingLanguageVersion {
    /// GLSL ES 1.00, the version implied by a missing directive.
    #[default]
    #[display("100")]
    Essl100,
    #[display("300 es")]
    Essl300,
    #[display("310 es")]
    Essl310,
    #[display("320 es")]
    Essl320,
    #[display("130")]
    Glsl130,
    #[display("330")]
    Glsl330,
    #[display("440")]
    Glsl440,
    #[display("450")]
    Glsl450,
}

#[derive(Clone, Debug, Display, Error, PartialEq, Eq)]
#[display("unknown shading language version '{_0}'")]
pub struct UnknownVersion(#[error(not(source))] pub String);

impl ShadingLanguageVersion {
    pub const ALL: [ShadingLanguageVersion; 8] = [
        ShadingLanguageVersion::Essl100,
        ShadingLanguageVersion::Essl300,
        ShadingLanguageVersion::Essl310,
        ShadingLanguageVersion::Essl320,
        ShadingLanguageVersion::Glsl130,
        ShadingLanguageVersion::Glsl330,
        ShadingLanguageVersion::Glsl440,
        ShadingLanguageVersion::Glsl450,
    ];

    /// Resolve the text following `#version`, e.g. `300 es`.
    pub fn from_directive(text: &str) -> Option<Self> {
        let normalized = text.split_whitespace().collect::<Vec<_>>().join(" ");
        Self::ALL
            .into_iter()
            .find(|version| version.to_string() == normalized)
    }

    pub fn is_es(self) -> bool {
        matches!(
            self,
            Self::Essl100 | Self::Essl300 | Self::Essl310 | Self::Essl320
        )
    }

    pub fn supports_switch(self) -> bool {
        self != Self::Essl100
    }

    /// Whether the fragment colour is written through `gl_FragColor`.
    pub fn supports_gl_frag_color(self) -> bool {
        matches!(self, Self::Essl100 | Self::Glsl130)
    }

    /// Whether global `in`/`out` variables are allowed.
    pub fn supports_in_out_globals(self) -> bool {
        self != Self::Essl100
    }
}

impl std::str::FromStr for ShadingLanguageVersion {
    type Err = UnknownVersion;

    /// Accepts directive text (`300 es`) as well as the compact `300es`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let spaced = match s.trim().strip_suffix("es") {
            Some(number) if !number.ends_with(' ') => format!("{number} es"),
            _ => s.to_owned(),
        };
        Self::from_directive(&spaced).ok_or_else(|| UnknownVersion(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parsing() {
        assert_eq!(
            ShadingLanguageVersion::from_directive("300 es"),
            Some(ShadingLanguageVersion::Essl300)
        );
        assert_eq!(
            ShadingLanguageVersion::from_directive("  310   es "),
            Some(ShadingLanguageVersion::Essl310)
        );
        assert_eq!(
            ShadingLanguageVersion::from_directive("100"),
            Some(ShadingLanguageVersion::Essl100)
        );
        assert_eq!(ShadingLanguageVersion::from_directive("300"), None);
    }

    #[test]
    fn test_from_str_accepts_compact_form() {
        assert_eq!(
            "300es".parse::<ShadingLanguageVersion>(),
            Ok(ShadingLanguageVersion::Essl300)
        );
        assert_eq!(
            "450".parse::<ShadingLanguageVersion>(),
            Ok(ShadingLanguageVersion::Glsl450)
        );
        assert!("999".parse::<ShadingLanguageVersion>().is_err());
    }

    #[test]
    fn test_feature_gates() {
        assert!(!ShadingLanguageVersion::Essl100.supports_switch());
        assert!(ShadingLanguageVersion::Essl300.supports_switch());
        assert!(ShadingLanguageVersion::Essl100.supports_gl_frag_color());
        assert!(!ShadingLanguageVersion::Essl300.supports_gl_frag_color());
        assert!(ShadingLanguageVersion::Glsl450.supports_in_out_globals());
    }
}
