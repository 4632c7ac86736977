//! Provenance markers left behind by the fuzzer.
//!
//! Transformed programs wrap injected code in calls to a fixed set of marker
//! functions and prefix injected identifiers with [`INJECTED_PREFIX`]. The
//! checker types the markers like builtins; the reducer uses them to find
//! injected code.

use crate::ast::{Expr, ExprKind};

/// Prefix shared by every identifier the fuzzer introduces.
pub const INJECTED_PREFIX: &str = "_GLF_";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Marker {
    /// `_GLF_IDENTITY(original, transformed)`
    Identity,
    /// `_GLF_FUZZED(expr)`
    Fuzzed,
    /// `_GLF_DEAD(cond)`, the condition of injected dead code.
    Dead,
    /// `_GLF_WRAPPED_IF_TRUE(cond)`
    WrappedIfTrue,
    /// `_GLF_WRAPPED_IF_FALSE(cond)`
    WrappedIfFalse,
    /// `_GLF_WRAPPED_LOOP(cond)`
    WrappedLoop,
    /// `_GLF_SWITCH(selector)`
    Switch,
}

impl Marker {
    pub const ALL: [Marker; 7] = [
        Marker::Identity,
        Marker::Fuzzed,
        Marker::Dead,
        Marker::WrappedIfTrue,
        Marker::WrappedIfFalse,
        Marker::WrappedLoop,
        Marker::Switch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Marker::Identity => "_GLF_IDENTITY",
            Marker::Fuzzed => "_GLF_FUZZED",
            Marker::Dead => "_GLF_DEAD",
            Marker::WrappedIfTrue => "_GLF_WRAPPED_IF_TRUE",
            Marker::WrappedIfFalse => "_GLF_WRAPPED_IF_FALSE",
            Marker::WrappedLoop => "_GLF_WRAPPED_LOOP",
            Marker::Switch => "_GLF_SWITCH",
        }
    }

    pub fn from_name(name: &str) -> Option<Marker> {
        Self::ALL.into_iter().find(|marker| marker.name() == name)
    }

    /// Number of arguments the marker takes.
    pub fn arity(self) -> usize {
        match self {
            Marker::Identity => 2,
            _ => 1,
        }
    }

    /// The marker this expression is a call to, looking through parentheses.
    pub fn of(expr: &Expr) -> Option<Marker> {
        match &expr.without_parens().kind {
            ExprKind::Call { callee, .. } => Marker::from_name(callee),
            _ => None,
        }
    }
}

pub fn is_injected_name(name: &str) -> bool {
    name.starts_with(INJECTED_PREFIX)
}

/// Whether any identifier or call in `expr` comes from the fuzzer.
pub fn mentions_injected(expr: &Expr) -> bool {
    let own = match &expr.kind {
        ExprKind::Var(name) => is_injected_name(name),
        ExprKind::Call { callee, .. } => is_injected_name(callee),
        _ => false,
    };
    own || expr.children().into_iter().any(mentions_injected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::NodeId;

    fn expr(kind: ExprKind) -> Expr {
        Expr::new(NodeId::from_raw(0), kind)
    }

    #[test]
    fn test_marker_names_round_trip() {
        for marker in Marker::ALL {
            assert_eq!(Marker::from_name(marker.name()), Some(marker));
        }
        assert_eq!(Marker::from_name("sin"), None);
    }

    #[test]
    fn test_marker_of_looks_through_parens() {
        let call = expr(ExprKind::Call {
            callee: "_GLF_DEAD".into(),
            args: vec![expr(ExprKind::BoolLit(false))],
        });
        let wrapped = expr(ExprKind::Paren(Box::new(call)));
        assert_eq!(Marker::of(&wrapped), Some(Marker::Dead));
    }

    #[test]
    fn test_mentions_injected() {
        let plain = expr(ExprKind::Var("color".into()));
        let injected = expr(ExprKind::Binary {
            op: crate::ast::BinaryOp::Add,
            lhs: Box::new(plain.clone()),
            rhs: Box::new(expr(ExprKind::Var("_GLF_x".into()))),
        });
        assert!(!mentions_injected(&plain));
        assert!(mentions_injected(&injected));
    }
}
