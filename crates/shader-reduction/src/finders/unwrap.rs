//! Replace a wrapper statement with the statements it wraps, spliced into the
//! enclosing list.
//!
//! Wrappers are plain blocks, `if` statements (keeping the branch that is
//! taken) and loops whose body cannot exit early. Targeted scans only unwrap
//! conditions the fuzzer introduced: `_GLF_WRAPPED_IF_TRUE`,
//! `_GLF_WRAPPED_IF_FALSE` and `_GLF_WRAPPED_LOOP`. Exhaustive scans also
//! unwrap plain blocks, any `if` without `else`, and any qualifying loop.

use std::slice;

use shader_ast::markers::Marker;
use shader_ast::{FunctionDecl, NodeId, Stmt, StmtKind, TranslationUnit};

use crate::analysis::{Jumps, NameUsage, holds_required_return, stale, stmt_lists};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct UnwrapFinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kept {
    Block,
    Then,
    Else,
    LoopBody,
}

#[derive(Debug, Clone)]
pub struct UnwrapOpportunity {
    stmt: NodeId,
    kept: Kept,
    wrapper: &'static str,
}

/// Which part of `stmt` survives, and the part that is dropped with it.
fn unwrappable(stmt: &Stmt, exhaustive: bool) -> Option<(Kept, &'static str, Option<&Stmt>)> {
    match &stmt.kind {
        StmtKind::Block(_) if exhaustive => Some((Kept::Block, "block", None)),
        StmtKind::If {
            cond,
            else_branch: None,
            ..
        } => (exhaustive || Marker::of(cond) == Some(Marker::WrappedIfTrue))
            .then_some((Kept::Then, "if", None)),
        StmtKind::If {
            cond,
            then_branch,
            else_branch: Some(else_branch),
        } => match Marker::of(cond) {
            Some(Marker::WrappedIfTrue) => Some((Kept::Then, "if", Some(&**else_branch))),
            Some(Marker::WrappedIfFalse) => Some((Kept::Else, "if", Some(&**then_branch))),
            _ => None,
        },
        StmtKind::While { cond, body } => {
            let wrapped = Marker::of(cond) == Some(Marker::WrappedLoop);
            ((exhaustive || wrapped) && !Jumps::of_stmt(body).escape_loop())
                .then_some((Kept::LoopBody, "while loop", None))
        }
        StmtKind::For {
            init, cond, body, ..
        } => {
            let wrapped = cond
                .as_ref()
                .is_some_and(|cond| Marker::of(cond) == Some(Marker::WrappedLoop));
            let body_usage = NameUsage::of_stmts(slice::from_ref(&**body));
            let init_ok = match init.as_deref().map(|init| &init.kind) {
                None => true,
                Some(StmtKind::Decl(var)) => body_usage.references(&var.name) == 0,
                Some(_) => false,
            };
            ((exhaustive || wrapped) && init_ok && !Jumps::of_stmt(body).escape_loop())
                .then_some((Kept::LoopBody, "for loop", None))
        }
        _ => None,
    }
}

/// The statements that replace `stmt`.
fn kept_stmts(stmt: &Stmt, kept: Kept) -> Option<Vec<Stmt>> {
    let body = match (&stmt.kind, kept) {
        (StmtKind::Block(block), Kept::Block) => return Some(block.stmts.clone()),
        (StmtKind::If { then_branch, .. }, Kept::Then) => then_branch,
        (
            StmtKind::If {
                else_branch: Some(else_branch),
                ..
            },
            Kept::Else,
        ) => else_branch,
        (StmtKind::While { body, .. } | StmtKind::For { body, .. }, Kept::LoopBody) => body,
        _ => return None,
    };
    Some(match &body.kind {
        StmtKind::Block(block) => block.stmts.clone(),
        _ => vec![(**body).clone()],
    })
}

/// Declarations spliced into the enclosing scope must not clash with or
/// capture any other use of their names in the function.
fn splice_is_hygienic(function: &FunctionDecl, spliced: &[Stmt]) -> bool {
    let function_usage = NameUsage::of_function(function);
    let spliced_usage = NameUsage::of_stmts(spliced);
    spliced.iter().all(|stmt| match &stmt.kind {
        StmtKind::Decl(var) => {
            function_usage.declarations(&var.name) == 1
                && function_usage.references(&var.name) == spliced_usage.references(&var.name)
        }
        _ => true,
    })
}

impl OpportunityFinder for UnwrapFinder {
    type Opportunity = UnwrapOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::Unwrap
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<UnwrapOpportunity>> {
        let mut found = Vec::new();
        for function in unit.functions() {
            for list in stmt_lists(function) {
                for stmt in list.stmts {
                    let Some((kept, wrapper, dropped)) =
                        unwrappable(stmt, context.exhaustive_scan())
                    else {
                        continue;
                    };
                    if dropped.is_some_and(|dropped| holds_required_return(function, dropped)) {
                        continue;
                    }
                    let Some(spliced) = kept_stmts(stmt, kept) else {
                        continue;
                    };
                    if spliced.is_empty() && list.is_sole_body_stmt() {
                        continue;
                    }
                    if splice_is_hygienic(function, &spliced) {
                        found.push(UnwrapOpportunity {
                            stmt: stmt.id,
                            kept,
                            wrapper,
                        });
                    }
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for UnwrapOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        match unit
            .find_stmt(self.stmt)
            .and_then(|stmt| kept_stmts(stmt, self.kept))
        {
            Some(spliced) => {
                unit.replace_stmt_with(self.stmt, spliced);
            }
            None => stale(OpportunityKind::Unwrap, self.stmt),
        }
    }

    fn describe(&self) -> String {
        let part = match self.kept {
            Kept::Block | Kept::LoopBody => "body",
            Kept::Then => "then branch",
            Kept::Else => "else branch",
        };
        format!("unwrap {} {} to its {part}", self.wrapper, self.stmt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "void main() {
            float x = 0.0;
            if (_GLF_WRAPPED_IF_TRUE(true)) { x = 1.0; }
            if (_GLF_WRAPPED_IF_FALSE(false)) { x = 2.0; } else { x = 3.0; }
            for (int _GLF_i = 0; _GLF_WRAPPED_LOOP(_GLF_i < 1); _GLF_i++) { x += 1.0; }
            { x = 4.0; }
            gl_FragColor = vec4(x);
        }";

    #[test]
    fn test_targeted_scan_unwraps_injected_wrappers() {
        assert_eq!(describe_all(UnwrapFinder, SOURCE, false).len(), 3);
        assert_eq!(describe_all(UnwrapFinder, SOURCE, true).len(), 4);
        insta::assert_snapshot!(apply_nth(UnwrapFinder, SOURCE, false, 1), @r"
        #version 100
        void main() {
            float x = 0.0;
            if (_GLF_WRAPPED_IF_TRUE(true)) {
                x = 1.0;
            }
            x = 3.0;
            for (int _GLF_i = 0; _GLF_WRAPPED_LOOP(_GLF_i < 1); _GLF_i++) {
                x += 1.0;
            }
            {
                x = 4.0;
            }
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_loop_body_is_spliced() {
        insta::assert_snapshot!(apply_nth(UnwrapFinder, SOURCE, false, 2), @r"
        #version 100
        void main() {
            float x = 0.0;
            if (_GLF_WRAPPED_IF_TRUE(true)) {
                x = 1.0;
            }
            if (_GLF_WRAPPED_IF_FALSE(false)) {
                x = 2.0;
            } else {
                x = 3.0;
            }
            x += 1.0;
            {
                x = 4.0;
            }
            gl_FragColor = vec4(x);
        }
        ");
    }

    #[test]
    fn test_clashing_declarations_are_not_spliced() {
        let source = "void main() {
            float x = 1.0;
            { float y = 2.0; x = y; }
            { float y = 3.0; x += y; }
            gl_FragColor = vec4(x);
        }";
        assert!(describe_all(UnwrapFinder, source, true).is_empty());
    }

    #[test]
    fn test_loop_using_its_counter_is_kept() {
        let source = "void main() {
            float x = 0.0;
            for (int i = 0; i < 3; i++) { x += float(i); }
            gl_FragColor = vec4(x);
        }";
        assert!(describe_all(UnwrapFinder, source, true).is_empty());
    }
}
