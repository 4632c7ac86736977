//! Recursive traversal of the program tree.
//!
//! [`Visitor`] walks a tree by shared reference, [`VisitorMut`] by mutable
//! reference. Override a `visit_*` method to intercept a node kind and call the
//! matching `walk_*` function to continue into its children.

use crate::ast::*;

pub trait Visitor<'ast>: Sized {
    fn visit_decl(&mut self, decl: &'ast Decl) {
        walk_decl(self, decl);
    }

    fn visit_struct(&mut self, _decl: &'ast StructDecl) {}

    fn visit_function(&mut self, function: &'ast FunctionDecl) {
        walk_function(self, function);
    }

    fn visit_var_decl(&mut self, var: &'ast VariableDecl) {
        walk_var_decl(self, var);
    }

    fn visit_block(&mut self, block: &'ast Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_switch_case(&mut self, case: &'ast SwitchCase) {
        walk_switch_case(self, case);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_unit<'ast, V: Visitor<'ast>>(visitor: &mut V, unit: &'ast TranslationUnit) {
    for decl in &unit.decls {
        visitor.visit_decl(decl);
    }
}

pub fn walk_decl<'ast, V: Visitor<'ast>>(visitor: &mut V, decl: &'ast Decl) {
    match decl {
        Decl::Precision(_) => {}
        Decl::Struct(decl) => visitor.visit_struct(decl),
        Decl::Variable(var) => visitor.visit_var_decl(var),
        Decl::Function(function) => visitor.visit_function(function),
    }
}

pub fn walk_function<'ast, V: Visitor<'ast>>(visitor: &mut V, function: &'ast FunctionDecl) {
    visitor.visit_block(&function.body);
}

pub fn walk_var_decl<'ast, V: Visitor<'ast>>(visitor: &mut V, var: &'ast VariableDecl) {
    if let Some(init) = &var.init {
        visitor.visit_expr(init);
    }
}

pub fn walk_block<'ast, V: Visitor<'ast>>(visitor: &mut V, block: &'ast Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_switch_case<'ast, V: Visitor<'ast>>(visitor: &mut V, case: &'ast SwitchCase) {
    for stmt in &case.body {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<'ast, V: Visitor<'ast>>(visitor: &mut V, stmt: &'ast Stmt) {
    match &stmt.kind {
        StmtKind::Decl(var) => visitor.visit_var_decl(var),
        StmtKind::Expr(expr) => visitor.visit_expr(expr),
        StmtKind::Block(block) => visitor.visit_block(block),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt(else_branch);
            }
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = cond {
                visitor.visit_expr(cond);
            }
            if let Some(step) = step {
                visitor.visit_expr(step);
            }
            visitor.visit_stmt(body);
        }
        StmtKind::While { cond, body } => {
            visitor.visit_expr(cond);
            visitor.visit_stmt(body);
        }
        StmtKind::Switch { selector, cases } => {
            visitor.visit_expr(selector);
            for case in cases {
                visitor.visit_switch_case(case);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr(value);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {}
    }
}

pub fn walk_expr<'ast, V: Visitor<'ast>>(visitor: &mut V, expr: &'ast Expr) {
    for child in expr.children() {
        visitor.visit_expr(child);
    }
}

pub trait VisitorMut: Sized {
    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_struct_mut(&mut self, decl: &mut StructDecl) {
        walk_struct_mut(self, decl);
    }

    fn visit_field_mut(&mut self, _field: &mut StructField) {}

    fn visit_function_mut(&mut self, function: &mut FunctionDecl) {
        walk_function_mut(self, function);
    }

    fn visit_param_mut(&mut self, _param: &mut Param) {}

    fn visit_var_decl_mut(&mut self, var: &mut VariableDecl) {
        walk_var_decl_mut(self, var);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_switch_case_mut(&mut self, case: &mut SwitchCase) {
        walk_switch_case_mut(self, case);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_unit_mut<V: VisitorMut>(visitor: &mut V, unit: &mut TranslationUnit) {
    for decl in &mut unit.decls {
        visitor.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitorMut>(visitor: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Precision(_) => {}
        Decl::Struct(decl) => visitor.visit_struct_mut(decl),
        Decl::Variable(var) => visitor.visit_var_decl_mut(var),
        Decl::Function(function) => visitor.visit_function_mut(function),
    }
}

pub fn walk_struct_mut<V: VisitorMut>(visitor: &mut V, decl: &mut StructDecl) {
    for field in &mut decl.fields {
        visitor.visit_field_mut(field);
    }
}

pub fn walk_function_mut<V: VisitorMut>(visitor: &mut V, function: &mut FunctionDecl) {
    for param in &mut function.params {
        visitor.visit_param_mut(param);
    }
    visitor.visit_block_mut(&mut function.body);
}

pub fn walk_var_decl_mut<V: VisitorMut>(visitor: &mut V, var: &mut VariableDecl) {
    if let Some(init) = &mut var.init {
        visitor.visit_expr_mut(init);
    }
}

pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        visitor.visit_stmt_mut(stmt);
    }
}

pub fn walk_switch_case_mut<V: VisitorMut>(visitor: &mut V, case: &mut SwitchCase) {
    for stmt in &mut case.body {
        visitor.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
    match &mut stmt.kind {
        StmtKind::Decl(var) => visitor.visit_var_decl_mut(var),
        StmtKind::Expr(expr) => visitor.visit_expr_mut(expr),
        StmtKind::Block(block) => visitor.visit_block_mut(block),
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            visitor.visit_expr_mut(cond);
            visitor.visit_stmt_mut(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_stmt_mut(else_branch);
            }
        }
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            if let Some(init) = init {
                visitor.visit_stmt_mut(init);
            }
            if let Some(cond) = cond {
                visitor.visit_expr_mut(cond);
            }
            if let Some(step) = step {
                visitor.visit_expr_mut(step);
            }
            visitor.visit_stmt_mut(body);
        }
        StmtKind::While { cond, body } => {
            visitor.visit_expr_mut(cond);
            visitor.visit_stmt_mut(body);
        }
        StmtKind::Switch { selector, cases } => {
            visitor.visit_expr_mut(selector);
            for case in cases {
                visitor.visit_switch_case_mut(case);
            }
        }
        StmtKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_expr_mut(value);
            }
        }
        StmtKind::Break | StmtKind::Continue | StmtKind::Discard | StmtKind::Empty => {}
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::BoolLit(_) | ExprKind::Var(_) => {}
        ExprKind::Unary { operand, .. } => visitor.visit_expr_mut(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            visitor.visit_expr_mut(lhs);
            visitor.visit_expr_mut(rhs);
        }
        ExprKind::Assign { target, value, .. } => {
            visitor.visit_expr_mut(target);
            visitor.visit_expr_mut(value);
        }
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            visitor.visit_expr_mut(cond);
            visitor.visit_expr_mut(then_expr);
            visitor.visit_expr_mut(else_expr);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                visitor.visit_expr_mut(arg);
            }
        }
        ExprKind::Member { base, .. } => visitor.visit_expr_mut(base),
        ExprKind::Index { base, index } => {
            visitor.visit_expr_mut(base);
            visitor.visit_expr_mut(index);
        }
        ExprKind::Paren(inner) => visitor.visit_expr_mut(inner),
    }
}
