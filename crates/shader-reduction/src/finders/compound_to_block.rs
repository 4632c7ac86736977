//! Replace an `if`, `while` or `for` statement with a block holding one of
//! its bodies. Unlike unwrapping, the block keeps its own scope, so nested
//! statements qualify wherever they appear.
//!
//! Targeted scans only consider statements whose condition mentions
//! injected code.

use std::slice;

use shader_ast::markers::mentions_injected;
use shader_ast::visit::{Visitor, walk_stmt};
use shader_ast::{Block, Expr, FunctionDecl, NodeId, Stmt, StmtKind, TranslationUnit};

use crate::analysis::{Jumps, NameUsage, holds_required_return, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct CompoundToBlockFinder;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Body {
    Then,
    Else,
    Loop,
}

#[derive(Debug, Clone)]
pub struct CompoundToBlockOpportunity {
    stmt: NodeId,
    body: Body,
    compound: &'static str,
}

#[derive(Default)]
struct Compounds<'a>(Vec<&'a Stmt>);

impl<'a> Visitor<'a> for Compounds<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if matches!(
            stmt.kind,
            StmtKind::If { .. } | StmtKind::While { .. } | StmtKind::For { .. }
        ) {
            self.0.push(stmt);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, _expr: &'a Expr) {}
}

/// The bodies of `stmt` that may replace it.
fn candidates(function: &FunctionDecl, stmt: &Stmt) -> Vec<(Body, &'static str)> {
    match &stmt.kind {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            let mut bodies = Vec::new();
            match else_branch {
                None => bodies.push((Body::Then, "if")),
                Some(else_branch) => {
                    if !holds_required_return(function, else_branch) {
                        bodies.push((Body::Then, "if"));
                    }
                    if !holds_required_return(function, then_branch) {
                        bodies.push((Body::Else, "if"));
                    }
                }
            }
            bodies
        }
        StmtKind::While { body, .. } if !Jumps::of_stmt(body).escape_loop() => {
            vec![(Body::Loop, "while loop")]
        }
        StmtKind::For { init, body, .. } if !Jumps::of_stmt(body).escape_loop() => {
            let init_unused = match init.as_deref().map(|init| &init.kind) {
                Some(StmtKind::Decl(var)) => {
                    NameUsage::of_stmts(slice::from_ref(&**body)).references(&var.name) == 0
                }
                _ => true,
            };
            if init_unused {
                vec![(Body::Loop, "for loop")]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn condition(stmt: &Stmt) -> Option<&Expr> {
    match &stmt.kind {
        StmtKind::If { cond, .. } | StmtKind::While { cond, .. } => Some(cond),
        StmtKind::For { cond, .. } => cond.as_ref(),
        _ => None,
    }
}

fn kept_body(stmt: &Stmt, body: Body) -> Option<&Stmt> {
    match (&stmt.kind, body) {
        (StmtKind::If { then_branch, .. }, Body::Then) => Some(&**then_branch),
        (StmtKind::If { else_branch, .. }, Body::Else) => else_branch.as_deref(),
        (StmtKind::While { body, .. } | StmtKind::For { body, .. }, Body::Loop) => Some(&**body),
        _ => None,
    }
}

impl OpportunityFinder for CompoundToBlockFinder {
    type Opportunity = CompoundToBlockOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::CompoundToBlock
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        context: &ScanContext,
    ) -> ReductionResult<Vec<CompoundToBlockOpportunity>> {
        let mut found = Vec::new();
        for function in unit.functions() {
            let mut compounds = Compounds::default();
            compounds.visit_block(&function.body);
            for stmt in compounds.0 {
                if !context.exhaustive_scan() && !condition(stmt).is_some_and(mentions_injected) {
                    continue;
                }
                found.extend(candidates(function, stmt).into_iter().map(|(body, compound)| {
                    CompoundToBlockOpportunity {
                        stmt: stmt.id,
                        body,
                        compound,
                    }
                }));
            }
        }
        Ok(found)
    }
}

impl Opportunity for CompoundToBlockOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        let Some(kept) = unit
            .find_stmt(self.stmt)
            .and_then(|stmt| kept_body(stmt, self.body))
            .cloned()
        else {
            stale(OpportunityKind::CompoundToBlock, self.stmt);
            return;
        };
        let block = match kept.kind {
            StmtKind::Block(block) => block,
            _ => Block::new(unit.fresh_id(), vec![kept]),
        };
        unit.replace_stmt(self.stmt, Stmt::new(self.stmt, StmtKind::Block(block)));
    }

    fn describe(&self) -> String {
        let part = match self.body {
            Body::Then => "then branch",
            Body::Else => "else branch",
            Body::Loop => "body",
        };
        format!(
            "replace {} {} with its {part} as a block",
            self.compound, self.stmt
        )
    }
}
