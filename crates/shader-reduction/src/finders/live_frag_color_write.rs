//! Remove injected live writes to the colour output. The fuzzer wraps such a
//! write in a block that backs the output up first and restores it last:
//!
//! ```text
//! {
//!     vec4 _GLF_backup = gl_FragColor;
//!     gl_FragColor = ...;
//!     gl_FragColor = _GLF_backup;
//! }
//! ```
//!
//! The output is `gl_FragColor` on versions that have it and otherwise any
//! global `out vec4`. The block becomes an empty statement.

use shader_ast::markers::is_injected_name;
use shader_ast::visit::{Visitor, walk_stmt};
use shader_ast::{
    AssignOp, Expr, ExprKind, NodeId, Stmt, StmtKind, StorageQualifier, TranslationUnit, Type,
};

use crate::analysis::{holds_required_return, stale};
use crate::{Opportunity, OpportunityFinder, OpportunityKind, ReductionResult, ScanContext};

pub struct LiveFragColorWriteFinder;

#[derive(Debug, Clone)]
pub struct LiveFragColorWriteOpportunity {
    block: NodeId,
    output: String,
}

#[derive(Default)]
struct Blocks<'a>(Vec<&'a Stmt>);

impl<'a> Visitor<'a> for Blocks<'a> {
    fn visit_stmt(&mut self, stmt: &'a Stmt) {
        if matches!(stmt.kind, StmtKind::Block(_)) {
            self.0.push(stmt);
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, _expr: &'a Expr) {}
}

/// Names that can hold the fragment colour under this unit's version.
fn colour_outputs(unit: &TranslationUnit) -> Vec<&str> {
    if unit.version.supports_gl_frag_color() {
        return vec!["gl_FragColor"];
    }
    unit.globals()
        .filter(|var| var.qualifier == Some(StorageQualifier::Out) && var.ty == Type::Vec(4))
        .map(|var| var.name.as_str())
        .collect()
}

/// The output a block backs up and restores, if it has that shape.
fn guarded_output<'a>(stmts: &'a [Stmt], outputs: &[&str]) -> Option<&'a str> {
    let [first, .., last] = stmts else {
        return None;
    };
    let StmtKind::Decl(backup) = &first.kind else {
        return None;
    };
    let output = backup.init.as_ref()?.as_var()?;
    if backup.ty != Type::Vec(4) || !is_injected_name(&backup.name) || !outputs.contains(&output) {
        return None;
    }
    let StmtKind::Expr(Expr {
        kind:
            ExprKind::Assign {
                op: AssignOp::Assign,
                target,
                value,
            },
        ..
    }) = &last.kind
    else {
        return None;
    };
    (target.as_var() == Some(output) && value.as_var() == Some(backup.name.as_str()))
        .then_some(output)
}

impl OpportunityFinder for LiveFragColorWriteFinder {
    type Opportunity = LiveFragColorWriteOpportunity;

    fn kind(&self) -> OpportunityKind {
        OpportunityKind::LiveFragColorWrite
    }

    fn find_opportunities(
        &self,
        unit: &TranslationUnit,
        _context: &ScanContext,
    ) -> ReductionResult<Vec<LiveFragColorWriteOpportunity>> {
        let outputs = colour_outputs(unit);
        let mut found = Vec::new();
        for function in unit.functions() {
            let mut blocks = Blocks::default();
            blocks.visit_block(&function.body);
            for stmt in blocks.0 {
                let StmtKind::Block(block) = &stmt.kind else {
                    continue;
                };
                if holds_required_return(function, stmt) {
                    continue;
                }
                if let Some(output) = guarded_output(&block.stmts, &outputs) {
                    found.push(LiveFragColorWriteOpportunity {
                        block: stmt.id,
                        output: output.to_owned(),
                    });
                }
            }
        }
        Ok(found)
    }
}

impl Opportunity for LiveFragColorWriteOpportunity {
    fn apply(&self, unit: &mut TranslationUnit) {
        if !unit.replace_stmt(self.block, Stmt::new(self.block, StmtKind::Empty)) {
            stale(OpportunityKind::LiveFragColorWrite, self.block);
        }
    }

    fn describe(&self) -> String {
        format!(
            "remove live write to '{}' in block {}",
            self.output, self.block
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finders::testing::{apply_nth, describe_all};

    const SOURCE: &str = "void main() {
            gl_FragColor = vec4(0.0);
            {
                vec4 _GLF_gl_FragColor_backup = gl_FragColor;
                gl_FragColor = vec4(1.0, 0.0, 0.0, 1.0);
                gl_FragColor = _GLF_gl_FragColor_backup;
            }
        }";

    #[test]
    fn test_backed_up_write_is_removed() {
        assert_eq!(
            describe_all(LiveFragColorWriteFinder, SOURCE, false).len(),
            1
        );
        assert_eq!(
            describe_all(LiveFragColorWriteFinder, SOURCE, true).len(),
            1
        );
        insta::assert_snapshot!(apply_nth(LiveFragColorWriteFinder, SOURCE, false, 0), @r"
        #version 100
        void main() {
            gl_FragColor = vec4(0.0);
            ;
        }
        ");
    }

    #[test]
    fn test_user_output_on_later_versions() {
        let source = "#version 300 es
            precision mediump float;
            out vec4 color;
            void main() {
                color = vec4(0.0);
                {
                    vec4 _GLF_color_backup = color;
                    color = vec4(1.0);
                    color = _GLF_color_backup;
                }
            }";
        let described = describe_all(LiveFragColorWriteFinder, source, false);
        assert_eq!(described.len(), 1);
        assert!(described[0].starts_with("remove live write to 'color'"));
    }

    #[test]
    fn test_backup_must_be_injected() {
        let source = SOURCE.replace("_GLF_gl_FragColor_backup", "saved");
        assert!(describe_all(LiveFragColorWriteFinder, &source, true).is_empty());
    }
}
