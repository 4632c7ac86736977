//! Analyses shared by several finders.
//!
//! Names are resolved textually. Finders that rewrite references first check
//! that the names involved are declared exactly once, which makes textual
//! resolution exact for the program at hand.

use std::collections::{HashMap, HashSet};

use shader_ast::markers::Marker;
use shader_ast::visit::{
    Visitor, VisitorMut, walk_expr, walk_expr_mut, walk_function, walk_stmt, walk_unit,
    walk_var_decl,
};
use shader_ast::{
    Expr, ExprKind, FunctionDecl, NodeId, Stmt, StmtKind, StructDecl, TranslationUnit, Type,
    TypeTable, VariableDecl,
};
use tracing::debug;

use crate::context::ScanContext;
use crate::error::{ReductionError, ReductionResult};
use crate::opportunity::OpportunityKind;

/// Type every expression of `unit`. Finders that reason about types can only
/// scan trees the checker accepts.
pub(crate) fn expression_types(
    unit: &TranslationUnit,
    context: &ScanContext,
    kind: OpportunityKind,
) -> ReductionResult<TypeTable> {
    shader_ast::validate(unit, context.language_version())
        .map_err(|errors| ReductionError::scan_failed(kind, errors))
}

/// Log an opportunity whose target no longer exists.
pub(crate) fn stale(kind: OpportunityKind, id: NodeId) {
    debug!(%kind, node = %id, "target is gone; opportunity not applied");
}

/// The variable an l-value ultimately writes, e.g. `v` for `v.x[i]`.
pub(crate) fn root_var(expr: &Expr) -> Option<&str> {
    match &expr.kind {
        ExprKind::Var(name) => Some(name),
        ExprKind::Member { base, .. } | ExprKind::Index { base, .. } | ExprKind::Paren(base) => {
            root_var(base)
        }
        _ => None,
    }
}

/// No writes and no calls to user functions.
pub(crate) fn is_pure(unit: &TranslationUnit, expr: &Expr) -> bool {
    let own = match &expr.kind {
        ExprKind::Assign { .. } => false,
        ExprKind::Unary { op, .. } => !op.is_increment(),
        ExprKind::Call { callee, .. } => unit.find_function(callee).is_none(),
        _ => true,
    };
    let children = expr.children();
    own && children.into_iter().all(|child| is_pure(unit, child))
}

/// Declarations, references, writes and calls by name within a subtree.
#[derive(Debug, Default)]
pub(crate) struct NameUsage {
    declarations: HashMap<String, usize>,
    references: HashMap<String, usize>,
    assigned: HashSet<String>,
    calls: HashMap<String, usize>,
    type_uses: HashMap<String, usize>,
}

impl NameUsage {
    pub fn of_unit(unit: &TranslationUnit) -> Self {
        let mut usage = Self::default();
        walk_unit(&mut usage, unit);
        usage
    }

    pub fn of_function(function: &FunctionDecl) -> Self {
        let mut usage = Self::default();
        usage.visit_function(function);
        usage
    }

    pub fn of_stmts(stmts: &[Stmt]) -> Self {
        let mut usage = Self::default();
        for stmt in stmts {
            usage.visit_stmt(stmt);
        }
        usage
    }

    pub fn of_expr(expr: &Expr) -> Self {
        let mut usage = Self::default();
        usage.visit_expr(expr);
        usage
    }

    /// Variables, parameters, functions and structs declared with `name`.
    pub fn declarations(&self, name: &str) -> usize {
        self.declarations.get(name).copied().unwrap_or(0)
    }

    pub fn references(&self, name: &str) -> usize {
        self.references.get(name).copied().unwrap_or(0)
    }

    pub fn is_assigned(&self, name: &str) -> bool {
        self.assigned.contains(name)
    }

    /// Calls naming `name`, including struct constructors.
    pub fn calls(&self, name: &str) -> usize {
        self.calls.get(name).copied().unwrap_or(0)
    }

    /// Variables, parameters, fields and return types of the named struct type.
    pub fn type_uses(&self, name: &str) -> usize {
        self.type_uses.get(name).copied().unwrap_or(0)
    }

    /// Whether `name` occurs at all, as a declaration, reference or callee.
    pub fn mentions(&self, name: &str) -> bool {
        self.declarations(name) > 0 || self.references(name) > 0 || self.calls(name) > 0
    }

    pub fn referenced_names(&self) -> impl Iterator<Item = &str> {
        self.references.keys().map(String::as_str)
    }

    pub fn declared_names(&self) -> impl Iterator<Item = &str> {
        self.declarations.keys().map(String::as_str)
    }

    fn declare(&mut self, name: &str) {
        *self.declarations.entry(name.to_owned()).or_default() += 1;
    }

    fn note_type(&mut self, ty: &Type) {
        if let Type::Struct(name) = ty {
            *self.type_uses.entry(name.clone()).or_default() += 1;
        }
    }
}

impl<'ast> Visitor<'ast> for NameUsage {
    fn visit_struct(&mut self, decl: &'ast StructDecl) {
        self.declare(&decl.name);
        for field in &decl.fields {
            self.note_type(&field.ty);
        }
    }

    fn visit_function(&mut self, function: &'ast FunctionDecl) {
        self.declare(&function.name);
        self.note_type(&function.return_ty);
        for param in &function.params {
            self.declare(&param.name);
            self.note_type(&param.ty);
        }
        walk_function(self, function);
    }

    fn visit_var_decl(&mut self, var: &'ast VariableDecl) {
        self.declare(&var.name);
        self.note_type(&var.ty);
        walk_var_decl(self, var);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        match &expr.kind {
            ExprKind::Var(name) => *self.references.entry(name.clone()).or_default() += 1,
            ExprKind::Assign { target, .. } => {
                if let Some(root) = root_var(target) {
                    self.assigned.insert(root.to_owned());
                }
            }
            ExprKind::Unary { op, operand } if op.is_increment() => {
                if let Some(root) = root_var(operand) {
                    self.assigned.insert(root.to_owned());
                }
            }
            ExprKind::Call { callee, .. } => {
                *self.calls.entry(callee.clone()).or_default() += 1;
            }
            _ => {}
        }
        walk_expr(self, expr);
    }
}

/// Counts `break` and `continue` statements that leave the statements being
/// scanned rather than a loop or switch nested inside them.
#[derive(Debug, Default)]
pub(crate) struct Jumps {
    loops: usize,
    switches: usize,
    pub breaks: usize,
    pub continues: usize,
}

impl Jumps {
    pub fn of_stmt(stmt: &Stmt) -> Self {
        let mut jumps = Self::default();
        jumps.visit_stmt(stmt);
        jumps
    }

    pub fn of_stmts(stmts: &[Stmt]) -> Self {
        let mut jumps = Self::default();
        for stmt in stmts {
            jumps.visit_stmt(stmt);
        }
        jumps
    }

    /// Whether a loop with this body could be exited or restarted early.
    pub fn escape_loop(&self) -> bool {
        self.breaks > 0 || self.continues > 0
    }
}

impl<'ast> Visitor<'ast> for Jumps {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        match &stmt.kind {
            StmtKind::Break if self.loops == 0 && self.switches == 0 => self.breaks += 1,
            StmtKind::Continue if self.loops == 0 => self.continues += 1,
            StmtKind::For { .. } | StmtKind::While { .. } => {
                self.loops += 1;
                walk_stmt(self, stmt);
                self.loops -= 1;
                return;
            }
            StmtKind::Switch { .. } => {
                self.switches += 1;
                walk_stmt(self, stmt);
                self.switches -= 1;
                return;
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, _expr: &'ast Expr) {}
}

/// Nodes inside injected code: the guarded branch of `if (_GLF_DEAD(..))`
/// and the argument of `_GLF_FUZZED(..)`.
#[derive(Debug, Default)]
pub(crate) struct InjectedRegions {
    nodes: HashSet<NodeId>,
    depth: usize,
}

impl InjectedRegions {
    pub fn of_unit(unit: &TranslationUnit) -> Self {
        let mut regions = Self::default();
        walk_unit(&mut regions, unit);
        regions
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(&id)
    }
}

impl<'ast> Visitor<'ast> for InjectedRegions {
    fn visit_stmt(&mut self, stmt: &'ast Stmt) {
        if self.depth > 0 {
            self.nodes.insert(stmt.id);
        }
        if let StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } = &stmt.kind
            && Marker::of(cond) == Some(Marker::Dead)
        {
            self.visit_expr(cond);
            self.depth += 1;
            self.visit_stmt(then_branch);
            self.depth -= 1;
            if let Some(else_branch) = else_branch {
                self.visit_stmt(else_branch);
            }
            return;
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &'ast Expr) {
        if self.depth > 0 {
            self.nodes.insert(expr.id);
        }
        if let ExprKind::Call { callee, args } = &expr.kind
            && Marker::from_name(callee) == Some(Marker::Fuzzed)
        {
            self.depth += 1;
            for arg in args {
                self.visit_expr(arg);
            }
            self.depth -= 1;
            return;
        }
        walk_expr(self, expr);
    }
}

/// A statement list: a function body, a nested block, or a switch arm.
#[derive(Debug, Clone, Copy)]
pub(crate) struct StmtList<'a> {
    pub stmts: &'a [Stmt],
    pub is_function_body: bool,
}

impl StmtList<'_> {
    /// Whether removing one statement from this list could leave a function
    /// with an empty body.
    pub fn is_sole_body_stmt(&self) -> bool {
        self.is_function_body && self.stmts.len() == 1
    }
}

/// Every statement list of `function`, body first, then nested lists in
/// source order.
pub(crate) fn stmt_lists(function: &FunctionDecl) -> Vec<StmtList<'_>> {
    struct Lists<'a>(Vec<StmtList<'a>>);

    impl<'a> Visitor<'a> for Lists<'a> {
        fn visit_stmt(&mut self, stmt: &'a Stmt) {
            match &stmt.kind {
                StmtKind::Block(block) => self.0.push(StmtList {
                    stmts: &block.stmts,
                    is_function_body: false,
                }),
                StmtKind::Switch { cases, .. } => {
                    self.0.extend(cases.iter().map(|case| StmtList {
                        stmts: &case.body,
                        is_function_body: false,
                    }))
                }
                _ => {}
            }
            walk_stmt(self, stmt);
        }

        fn visit_expr(&mut self, _expr: &'a Expr) {}
    }

    let mut lists = Lists(vec![StmtList {
        stmts: &function.body.stmts,
        is_function_body: true,
    }]);
    for stmt in &function.body.stmts {
        lists.visit_stmt(stmt);
    }
    lists.0
}

/// Replace every reference to a variable in `bindings` with a copy of the
/// bound expression.
pub(crate) struct Substitute<'a> {
    pub bindings: &'a HashMap<&'a str, Expr>,
}

impl VisitorMut for Substitute<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let ExprKind::Var(name) = &expr.kind
            && let Some(replacement) = self.bindings.get(name.as_str())
        {
            *expr = replacement.clone();
            return;
        }
        walk_expr_mut(self, expr);
    }
}

/// Wrap `expr` in parentheses under a fresh id.
pub(crate) fn parenthesize(unit: &mut TranslationUnit, expr: Expr) -> Expr {
    Expr::new(unit.fresh_id(), ExprKind::Paren(Box::new(expr)))
}

/// Whether the statement could remove the last `return` of a non-void
/// function if it were deleted.
pub(crate) fn holds_required_return(function: &FunctionDecl, stmt: &Stmt) -> bool {
    function.return_ty != Type::Void && shader_ast::validation::stmt_contains_return(stmt)
}

struct ExprCollector<'a>(Vec<&'a Expr>);

impl<'a> Visitor<'a> for ExprCollector<'a> {
    fn visit_expr(&mut self, expr: &'a Expr) {
        self.0.push(expr);
        walk_expr(self, expr);
    }
}

/// Every expression of a statement subtree, outermost first.
pub(crate) fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    let mut exprs = ExprCollector(Vec::new());
    exprs.visit_stmt(stmt);
    exprs.0
}

/// Every expression of the unit, in source order, outermost first.
pub(crate) fn unit_exprs(unit: &TranslationUnit) -> Vec<&Expr> {
    let mut exprs = ExprCollector(Vec::new());
    walk_unit(&mut exprs, unit);
    exprs.0
}

/// Every expression of the unit that is evaluated for its value, in source
/// order, outermost first. Assignment targets and increment operands are
/// skipped, though index expressions inside them are not.
pub(crate) fn rvalues(unit: &TranslationUnit) -> Vec<&Expr> {
    fn value<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
        out.push(expr);
        match &expr.kind {
            ExprKind::Assign {
                target,
                value: assigned,
                ..
            } => {
                location(target, out);
                value(assigned, out);
            }
            ExprKind::Unary { op, operand } if op.is_increment() => location(operand, out),
            _ => {
                for child in expr.children() {
                    value(child, out);
                }
            }
        }
    }

    fn location<'a>(expr: &'a Expr, out: &mut Vec<&'a Expr>) {
        match &expr.kind {
            ExprKind::Member { base, .. } | ExprKind::Paren(base) => location(base, out),
            ExprKind::Index { base, index } => {
                location(base, out);
                value(index, out);
            }
            _ => {}
        }
    }

    struct Roots<'a>(Vec<&'a Expr>);

    impl<'a> Visitor<'a> for Roots<'a> {
        fn visit_expr(&mut self, expr: &'a Expr) {
            value(expr, &mut self.0);
        }
    }

    let mut roots = Roots(Vec::new());
    walk_unit(&mut roots, unit);
    roots.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use shader_ast::parse;

    #[test]
    fn test_name_usage() {
        let unit = parse(
            "struct S { float a; };
             uniform float u;
             float f(float p) { return p * u; }
             void main() { S s = S(1.0); float x = f(s.a); x += 1.0; }",
        )
        .unwrap();
        let usage = NameUsage::of_unit(&unit);
        assert_eq!(usage.declarations("x"), 1);
        assert_eq!(usage.references("u"), 1);
        assert_eq!(usage.references("x"), 1);
        assert!(usage.is_assigned("x"));
        assert!(!usage.is_assigned("s"));
        assert_eq!(usage.calls("f"), 1);
        assert_eq!(usage.calls("S"), 1);
        assert_eq!(usage.type_uses("S"), 1);
        assert!(usage.mentions("p"));
    }

    #[test]
    fn test_purity() {
        let unit = parse(
            "float f() { return 1.0; }
             void main() { float x = 1.0; x = sin(x) + f(); }",
        )
        .unwrap();
        let main = unit.find_function("main").unwrap();
        let StmtKind::Expr(assign) = &main.body.stmts[1].kind else {
            panic!("expected an expression statement");
        };
        assert!(!is_pure(&unit, assign));
        let ExprKind::Assign { value, .. } = &assign.kind else {
            panic!("expected an assignment");
        };
        let ExprKind::Binary { lhs, rhs, .. } = &value.kind else {
            panic!("expected a sum");
        };
        assert!(is_pure(&unit, lhs));
        assert!(!is_pure(&unit, rhs));
    }

    #[test]
    fn test_jumps_ignore_nested_loops() {
        let unit = parse(
            "#version 300 es
             void main() {
                 for (int i = 0; i < 2; i++) {
                     for (int j = 0; j < 2; j++) { break; }
                     switch (i) { case 0: break; default: break; }
                     if (i == 1) { continue; }
                 }
             }",
        )
        .unwrap();
        let main = unit.find_function("main").unwrap();
        let StmtKind::For { body, .. } = &main.body.stmts[0].kind else {
            panic!("expected a loop");
        };
        let jumps = Jumps::of_stmt(body);
        assert_eq!(jumps.breaks, 0);
        assert_eq!(jumps.continues, 1);
        assert!(jumps.escape_loop());
    }

    #[test]
    fn test_injected_regions() {
        let unit = parse(
            "void main() {
                 float x = _GLF_FUZZED(1.0 + 2.0);
                 if (_GLF_DEAD(false)) { x = 3.0; }
                 x = 4.0;
             }",
        )
        .unwrap();
        let regions = InjectedRegions::of_unit(&unit);
        let main = unit.find_function("main").unwrap();
        let dead = &main.body.stmts[1];
        let StmtKind::If { then_branch, .. } = &dead.kind else {
            panic!("expected an if");
        };
        assert!(!regions.contains(dead.id));
        assert!(regions.contains(then_branch.id));
        assert!(!regions.contains(main.body.stmts[2].id));
        let StmtKind::Decl(var) = &main.body.stmts[0].kind else {
            panic!("expected a declaration");
        };
        let fuzzed = var.init.as_ref().unwrap();
        assert!(!regions.contains(fuzzed.id));
        assert!(regions.contains(fuzzed.children()[0].id));
    }

    #[test]
    fn test_stmt_lists_order() {
        let unit = parse(
            "void main() { int x = 0; { x = 1; } if (x > 0) { x = 2; { x = 3; } } }",
        )
        .unwrap();
        let lists = stmt_lists(unit.find_function("main").unwrap());
        let sizes: Vec<(usize, bool)> = lists
            .iter()
            .map(|list| (list.stmts.len(), list.is_function_body))
            .collect();
        assert_eq!(sizes, vec![(3, true), (1, false), (2, false), (1, false)]);
    }

    #[test]
    fn test_rvalues_skip_assignment_targets() {
        let unit = parse("void main() { vec2 v = vec2(0.0); int i = 0; v[i] = 1.0; i++; }");
        let printed: Vec<String> = rvalues(&unit.unwrap())
            .into_iter()
            .map(shader_ast::print_expr)
            .collect();
        assert_eq!(
            printed,
            vec!["vec2(0.0)", "0.0", "0", "v[i] = 1.0", "i", "1.0", "i++"]
        );
    }
}
