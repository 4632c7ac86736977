//! Id assignment and id-addressed edits on a translation unit.

use crate::ast::*;
use crate::visit::{
    Visitor, VisitorMut, walk_block_mut, walk_decl_mut, walk_expr, walk_expr_mut,
    walk_function_mut, walk_stmt, walk_stmt_mut, walk_struct_mut, walk_switch_case_mut,
    walk_var_decl_mut,
};

/// Gives every node it visits the next id from a shared counter.
struct IdAssigner<'a> {
    next: &'a mut u32,
}

impl IdAssigner<'_> {
    fn fresh(&mut self) -> NodeId {
        let id = NodeId::from_raw(*self.next);
        *self.next += 1;
        id
    }
}

impl VisitorMut for IdAssigner<'_> {
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        if let Decl::Precision(precision) = decl {
            precision.id = self.fresh();
        }
        walk_decl_mut(self, decl);
    }

    fn visit_struct_mut(&mut self, decl: &mut StructDecl) {
        decl.id = self.fresh();
        walk_struct_mut(self, decl);
    }

    fn visit_field_mut(&mut self, field: &mut StructField) {
        field.id = self.fresh();
    }

    fn visit_function_mut(&mut self, function: &mut FunctionDecl) {
        function.id = self.fresh();
        walk_function_mut(self, function);
    }

    fn visit_param_mut(&mut self, param: &mut Param) {
        param.id = self.fresh();
    }

    fn visit_var_decl_mut(&mut self, var: &mut VariableDecl) {
        var.id = self.fresh();
        walk_var_decl_mut(self, var);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        block.id = self.fresh();
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        stmt.id = self.fresh();
        walk_stmt_mut(self, stmt);
    }

    fn visit_switch_case_mut(&mut self, case: &mut SwitchCase) {
        case.id = self.fresh();
        walk_switch_case_mut(self, case);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        expr.id = self.fresh();
        walk_expr_mut(self, expr);
    }
}

struct ExprFinder<'ast> {
    target: NodeId,
    found: Option<&'ast Expr>,
}

impl<'ast> Visitor<'ast> for ExprFinder<'ast> {
    fn visit_expr(&mut self, expr: &'ast Expr) {
        if self.found.is_some() {
            return;
        }
        if expr.id == self.target {
            self.found = Some(expr);
        } else {
            walk_expr(self, expr);
        }
    }
}

struct StmtFinder<'ast> {
    target: NodeId,
    found: Option<&'ast Stmt>,
}

impl<'ast> Visitor<'ast> for StmtFinder<'ast> {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if self.found.is_some() {
            return;
        }
        if stmt.id == self.target {
            self.found = Some(stmt);
        } else {
            walk_stmt(self, stmt);
        }
    }
}

impl TranslationUnit {
    pub(crate) fn assign_ids_decl(&mut self, decl: &mut Decl) {
        IdAssigner {
            next: &mut self.next_id,
        }
        .visit_decl_mut(decl);
    }

    /// Give a detached expression (typically a clone of an existing one) ids
    /// that are unused in this unit.
    pub fn refresh_ids_expr(&mut self, expr: &mut Expr) {
        IdAssigner {
            next: &mut self.next_id,
        }
        .visit_expr_mut(expr);
    }

    /// Statement counterpart of [`TranslationUnit::refresh_ids_expr`].
    pub fn refresh_ids_stmt(&mut self, stmt: &mut Stmt) {
        IdAssigner {
            next: &mut self.next_id,
        }
        .visit_stmt_mut(stmt);
    }

    pub fn find_expr(&self, id: NodeId) -> Option<&Expr> {
        let mut finder = ExprFinder {
            target: id,
            found: None,
        };
        crate::visit::walk_unit(&mut finder, self);
        finder.found
    }

    pub fn find_stmt(&self, id: NodeId) -> Option<&Stmt> {
        let mut finder = StmtFinder {
            target: id,
            found: None,
        };
        crate::visit::walk_unit(&mut finder, self);
        finder.found
    }

    /// The function whose body contains the node with the given id.
    pub fn enclosing_function(&self, id: NodeId) -> Option<&FunctionDecl> {
        self.functions().find(|function| {
            if function.body.id == id {
                return true;
            }
            let mut exprs = ExprFinder {
                target: id,
                found: None,
            };
            exprs.visit_block(&function.body);
            if exprs.found.is_some() {
                return true;
            }
            let mut stmts = StmtFinder {
                target: id,
                found: None,
            };
            stmts.visit_block(&function.body);
            stmts.found.is_some()
        })
    }

    pub fn find_expr_mut(&mut self, id: NodeId) -> Option<&mut Expr> {
        self.decls.iter_mut().find_map(|decl| match decl {
            Decl::Variable(var) => var.init.as_mut().and_then(|e| expr_in_expr_mut(e, id)),
            Decl::Function(function) => function
                .body
                .stmts
                .iter_mut()
                .find_map(|stmt| expr_in_stmt_mut(stmt, id)),
            Decl::Precision(_) | Decl::Struct(_) => None,
        })
    }

    pub fn find_stmt_mut(&mut self, id: NodeId) -> Option<&mut Stmt> {
        self.bodies_mut()
            .find_map(|body| body.stmts.iter_mut().find_map(|s| stmt_in_stmt_mut(s, id)))
    }

    /// Find the local variable declaration with the given id.
    pub fn find_var_decl_mut(&mut self, id: NodeId) -> Option<&mut VariableDecl> {
        let stmt_id = self.decl_stmt_id(id)?;
        match &mut self.find_stmt_mut(stmt_id)?.kind {
            StmtKind::Decl(var) => Some(var),
            _ => None,
        }
    }

    fn decl_stmt_id(&self, var_id: NodeId) -> Option<NodeId> {
        struct DeclStmtFinder {
            target: NodeId,
            found: Option<NodeId>,
        }
        impl<'ast> Visitor<'ast> for DeclStmtFinder {
            fn visit_stmt(&mut self, stmt: &'ast Stmt) {
                if let StmtKind::Decl(var) = &stmt.kind
                    && var.id == self.target
                {
                    self.found = Some(stmt.id);
                }
                walk_stmt(self, stmt);
            }
        }
        let mut finder = DeclStmtFinder {
            target: var_id,
            found: None,
        };
        crate::visit::walk_unit(&mut finder, self);
        finder.found
    }

    /// Find the statement list that directly holds the statement with the
    /// given id, along with its position in that list.
    pub fn find_stmt_list_mut(&mut self, id: NodeId) -> Option<(&mut Vec<Stmt>, usize)> {
        self.bodies_mut()
            .find_map(|body| list_in_stmts_mut(&mut body.stmts, id))
    }

    /// Replace the expression with the given id. Returns `false` if no such
    /// expression exists.
    pub fn replace_expr(&mut self, id: NodeId, replacement: Expr) -> bool {
        match self.find_expr_mut(id) {
            Some(target) => {
                *target = replacement;
                true
            }
            None => false,
        }
    }

    pub fn replace_stmt(&mut self, id: NodeId, replacement: Stmt) -> bool {
        match self.find_stmt_mut(id) {
            Some(target) => {
                *target = replacement;
                true
            }
            None => false,
        }
    }

    /// Remove a statement. A statement that is not held in a list (the body
    /// of an `if` or loop) is replaced with an empty statement instead.
    pub fn remove_stmt(&mut self, id: NodeId) -> bool {
        if let Some((list, index)) = self.find_stmt_list_mut(id) {
            list.remove(index);
            return true;
        }
        match self.find_stmt_mut(id) {
            Some(stmt) => {
                stmt.kind = StmtKind::Empty;
                true
            }
            None => false,
        }
    }

    /// Splice `replacement` in place of the statement with the given id. When
    /// the statement is not held in a list it becomes a block of the
    /// replacement statements.
    pub fn replace_stmt_with(&mut self, id: NodeId, replacement: Vec<Stmt>) -> bool {
        if let Some((list, index)) = self.find_stmt_list_mut(id) {
            list.splice(index..=index, replacement);
            return true;
        }
        let block_id = self.fresh_id();
        match self.find_stmt_mut(id) {
            Some(stmt) => {
                stmt.kind = StmtKind::Block(Block::new(block_id, replacement));
                true
            }
            None => false,
        }
    }

    fn bodies_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.decls.iter_mut().filter_map(|decl| match decl {
            Decl::Function(function) => Some(&mut function.body),
            _ => None,
        })
    }
}

fn expr_in_expr_mut(expr: &mut Expr, id: NodeId) -> Option<&mut Expr> {
    if expr.id == id {
        return Some(expr);
    }
    expr.children_mut()
        .into_iter()
        .find_map(|child| expr_in_expr_mut(child, id))
}

fn expr_in_stmt_mut(stmt: &mut Stmt, id: NodeId) -> Option<&mut Expr> {
    let (exprs, stmts) = split_stmt_mut(stmt);
    exprs
        .into_iter()
        .find_map(|expr| expr_in_expr_mut(expr, id))
        .or_else(|| stmts.into_iter().find_map(|s| expr_in_stmt_mut(s, id)))
}

fn stmt_in_stmt_mut(stmt: &mut Stmt, id: NodeId) -> Option<&mut Stmt> {
    if stmt.id == id {
        return Some(stmt);
    }
    let (_, stmts) = split_stmt_mut(stmt);
    stmts.into_iter().find_map(|s| stmt_in_stmt_mut(s, id))
}

fn list_in_stmts_mut(stmts: &mut Vec<Stmt>, id: NodeId) -> Option<(&mut Vec<Stmt>, usize)> {
    if let Some(index) = stmts.iter().position(|stmt| stmt.id == id) {
        return Some((stmts, index));
    }
    stmts.iter_mut().find_map(|stmt| list_in_stmt_mut(stmt, id))
}

fn list_in_stmt_mut(stmt: &mut Stmt, id: NodeId) -> Option<(&mut Vec<Stmt>, usize)> {
    match &mut stmt.kind {
        StmtKind::Block(block) => list_in_stmts_mut(&mut block.stmts, id),
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => list_in_stmt_mut(then_branch, id).or_else(|| {
            else_branch
                .as_deref_mut()
                .and_then(|branch| list_in_stmt_mut(branch, id))
        }),
        StmtKind::For { body, .. } | StmtKind::While { body, .. } => list_in_stmt_mut(body, id),
        StmtKind::Switch { cases, .. } => cases
            .iter_mut()
            .find_map(|case| list_in_stmts_mut(&mut case.body, id)),
        _ => None,
    }
}

/// Direct sub-expressions and sub-statements of a statement.
fn split_stmt_mut(stmt: &mut Stmt) -> (Vec<&mut Expr>, Vec<&mut Stmt>) {
    match &mut stmt.kind {
        StmtKind::Decl(var) => (var.init.iter_mut().collect(), Vec::new()),
        StmtKind::Expr(expr) => (vec![expr], Vec::new()),
        StmtKind::Block(block) => (Vec::new(), block.stmts.iter_mut().collect()),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            let mut stmts = vec![&mut **then_branch];
            stmts.extend(else_branch.as_deref_mut());
            (vec![cond], stmts)
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            let mut exprs = Vec::new();
            exprs.extend(cond.as_mut());
            exprs.extend(step.as_mut());
            let mut stmts = Vec::new();
            stmts.extend(init.as_deref_mut());
            stmts.push(&mut **body);
            (exprs, stmts)
        }
        StmtKind::While { cond, body } => (vec![cond], vec![&mut **body]),
        StmtKind::Switch { selector, cases } => (
            vec![selector],
            cases
                .iter_mut()
                .flat_map(|case| case.body.iter_mut())
                .collect(),
        ),
        StmtKind::Return(value) => (value.iter_mut().collect(), Vec::new()),
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {
            (Vec::new(), Vec::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parse;

    const SOURCE: &str = "void main() { int x = 1; if (x > 0) x = 2; { x = 3; } }";

    fn stmt_id_of(unit: &crate::TranslationUnit, text: &str) -> crate::NodeId {
        use crate::visit::{Visitor, walk_stmt};
        struct ByText<'a> {
            text: &'a str,
            found: Option<crate::NodeId>,
        }
        impl<'ast> Visitor<'ast> for ByText<'_> {
            fn visit_stmt(&mut self, stmt: &'ast crate::Stmt) {
                if self.found.is_none() && crate::print_stmt(stmt).trim() == self.text {
                    self.found = Some(stmt.id);
                }
                walk_stmt(self, stmt);
            }
        }
        let mut finder = ByText { text, found: None };
        crate::visit::walk_unit(&mut finder, unit);
        finder.found.unwrap()
    }

    #[test]
    fn test_ids_are_unique_and_survive_clone() {
        let unit = parse(SOURCE).unwrap();
        let copy = unit.clone();
        let id = stmt_id_of(&unit, "x = 3;");
        assert_eq!(
            crate::print_stmt(copy.find_stmt(id).unwrap()).trim(),
            "x = 3;"
        );
    }

    #[test]
    fn test_remove_stmt_in_list() {
        let mut unit = parse(SOURCE).unwrap();
        let id = stmt_id_of(&unit, "x = 3;");
        assert!(unit.remove_stmt(id));
        assert!(unit.find_stmt(id).is_none());
    }

    #[test]
    fn test_remove_branch_body_leaves_empty_statement() {
        let mut unit = parse(SOURCE).unwrap();
        let id = stmt_id_of(&unit, "x = 2;");
        assert!(unit.remove_stmt(id));
        insta::assert_snapshot!(crate::print(&unit), @r"
        #version 100
        void main() {
            int x = 1;
            if (x > 0)
                ;
            {
                x = 3;
            }
        }
        ");
    }

    #[test]
    fn test_fresh_ids_do_not_collide() {
        let mut unit = parse(SOURCE).unwrap();
        let existing = stmt_id_of(&unit, "x = 3;");
        let mut copy = unit.find_stmt(existing).unwrap().clone();
        unit.refresh_ids_stmt(&mut copy);
        assert_ne!(copy.id, existing);
        assert!(unit.find_stmt(copy.id).is_none());
    }
}
