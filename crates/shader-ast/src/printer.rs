//! Pretty printer producing canonical shader text.
//!
//! Output is deterministic: four-space indentation, braces on the header line,
//! and parentheses only where precedence requires them or where the tree holds
//! an explicit [`ExprKind::Paren`]. Printing is also used to compare
//! subtrees structurally, since node ids make derived equality too strict.

use std::fmt::Write;

use crate::ast::*;

const INDENT: &str = "    ";

const PREC_ASSIGN: u8 = 1;
const PREC_TERNARY: u8 = 2;
const PREC_LOGICAL_OR: u8 = 3;
const PREC_PREFIX: u8 = 10;
const PREC_POSTFIX: u8 = 11;
const PREC_PRIMARY: u8 = 12;

/// Print a whole translation unit.
pub fn print(unit: &TranslationUnit) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "#version {}", unit.version);
    for decl in &unit.decls {
        write_decl(&mut out, decl);
    }
    out
}

/// Print one statement at indentation level zero, including the trailing
/// newline.
pub fn print_stmt(stmt: &Stmt) -> String {
    let mut out = String::new();
    write_stmt(&mut out, stmt, 0);
    out
}

pub fn print_expr(expr: &Expr) -> String {
    let mut out = String::new();
    write_expr(&mut out, expr, PREC_ASSIGN);
    out
}

fn pad(out: &mut String, level: usize) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn write_decl(out: &mut String, decl: &Decl) {
    match decl {
        Decl::Precision(decl) => {
            let _ = writeln!(out, "precision {} {};", decl.precision.keyword(), decl.ty);
        }
        Decl::Struct(decl) => {
            let _ = writeln!(out, "struct {} {{", decl.name);
            for field in &decl.fields {
                let _ = writeln!(out, "{INDENT}{} {};", field.ty, field.name);
            }
            out.push_str("};\n");
        }
        Decl::Variable(var) => {
            write_var_decl(out, var);
            out.push('\n');
        }
        Decl::Function(function) => {
            let params: Vec<String> = function
                .params
                .iter()
                .map(|param| format!("{} {}", param.ty, param.name))
                .collect();
            let _ = write!(
                out,
                "{} {}({})",
                function.return_ty,
                function.name,
                params.join(", ")
            );
            write_braced(out, &function.body, 0);
            out.push('\n');
        }
    }
}

fn write_var_decl(out: &mut String, var: &VariableDecl) {
    if let Some(qualifier) = var.qualifier {
        out.push_str(qualifier.keyword());
        out.push(' ');
    }
    let _ = write!(out, "{} {}", var.ty, var.name);
    if let Some(init) = &var.init {
        out.push_str(" = ");
        write_expr(out, init, PREC_ASSIGN);
    }
    out.push(';');
}

/// ` {`, the block's statements one level deeper, then `}` without a newline.
fn write_braced(out: &mut String, block: &Block, level: usize) {
    out.push_str(" {\n");
    for stmt in &block.stmts {
        write_stmt(out, stmt, level + 1);
    }
    pad(out, level);
    out.push('}');
}

/// Write the body of a compound statement after its header. Returns whether
/// the body ended with a closing brace (and so still needs its newline).
fn write_body(out: &mut String, body: &Stmt, level: usize) -> bool {
    match &body.kind {
        StmtKind::Block(block) => {
            write_braced(out, block, level);
            true
        }
        _ => {
            out.push('\n');
            write_stmt(out, body, level + 1);
            false
        }
    }
}

/// A `for` initialiser, inline and including its `;`.
fn write_inline_stmt(out: &mut String, stmt: &Stmt) {
    match &stmt.kind {
        StmtKind::Decl(var) => write_var_decl(out, var),
        StmtKind::Expr(expr) => {
            write_expr(out, expr, PREC_ASSIGN);
            out.push(';');
        }
        _ => out.push(';'),
    }
}

fn write_if(
    out: &mut String,
    cond: &Expr,
    then_branch: &Stmt,
    else_branch: Option<&Stmt>,
    level: usize,
) {
    out.push_str("if (");
    write_expr(out, cond, PREC_ASSIGN);
    out.push(')');
    let braced = write_body(out, then_branch, level);
    let Some(else_branch) = else_branch else {
        if braced {
            out.push('\n');
        }
        return;
    };
    if braced {
        out.push_str(" else");
    } else {
        pad(out, level);
        out.push_str("else");
    }
    match &else_branch.kind {
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => {
            out.push(' ');
            write_if(out, cond, then_branch, else_branch.as_deref(), level);
        }
        _ => {
            if write_body(out, else_branch, level) {
                out.push('\n');
            }
        }
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, level: usize) {
    pad(out, level);
    match &stmt.kind {
        StmtKind::Decl(var) => {
            write_var_decl(out, var);
            out.push('\n');
        }
        StmtKind::Expr(expr) => {
            write_expr(out, expr, PREC_ASSIGN);
            out.push_str(";\n");
        }
        StmtKind::Block(block) => {
            out.push('{');
            out.push('\n');
            for stmt in &block.stmts {
                write_stmt(out, stmt, level + 1);
            }
            pad(out, level);
            out.push_str("}\n");
        }
        StmtKind::If {
            cond,
            then_branch,
            else_branch,
        } => write_if(out, cond, then_branch, else_branch.as_deref(), level),
        StmtKind::For {
            init,
            cond,
            step,
            body,
        } => {
            out.push_str("for (");
            match init {
                Some(init) => write_inline_stmt(out, init),
                None => out.push(';'),
            }
            if let Some(cond) = cond {
                out.push(' ');
                write_expr(out, cond, PREC_ASSIGN);
            }
            out.push(';');
            if let Some(step) = step {
                out.push(' ');
                write_expr(out, step, PREC_ASSIGN);
            }
            out.push(')');
            if write_body(out, body, level) {
                out.push('\n');
            }
        }
        StmtKind::While { cond, body } => {
            out.push_str("while (");
            write_expr(out, cond, PREC_ASSIGN);
            out.push(')');
            if write_body(out, body, level) {
                out.push('\n');
            }
        }
        StmtKind::Switch { selector, cases } => {
            out.push_str("switch (");
            write_expr(out, selector, PREC_ASSIGN);
            out.push_str(") {\n");
            for case in cases {
                pad(out, level + 1);
                match case.label {
                    CaseLabel::Case(value) => {
                        let _ = writeln!(out, "case {value}:");
                    }
                    CaseLabel::Default => out.push_str("default:\n"),
                }
                for stmt in &case.body {
                    write_stmt(out, stmt, level + 2);
                }
            }
            pad(out, level);
            out.push_str("}\n");
        }
        StmtKind::Return(None) => out.push_str("return;\n"),
        StmtKind::Return(Some(value)) => {
            out.push_str("return ");
            write_expr(out, value, PREC_ASSIGN);
            out.push_str(";\n");
        }
        StmtKind::Break => out.push_str("break;\n"),
        StmtKind::Continue => out.push_str("continue;\n"),
        StmtKind::Discard => out.push_str("discard;\n"),
        StmtKind::Empty => out.push_str(";\n"),
    }
}

/// Format a float so that it always reads back as a float.
pub fn format_float(value: f64) -> String {
    let text = format!("{value:?}");
    if text.contains(['.', 'e', 'E']) || !value.is_finite() {
        text
    } else {
        format!("{text}.0")
    }
}

fn precedence(expr: &Expr) -> u8 {
    match &expr.kind {
        ExprKind::IntLit(value) if *value < 0 => PREC_PREFIX,
        ExprKind::FloatLit(value) if value.is_sign_negative() => PREC_PREFIX,
        ExprKind::IntLit(_)
        | ExprKind::FloatLit(_)
        | ExprKind::BoolLit(_)
        | ExprKind::Var(_)
        | ExprKind::Paren(_) => PREC_PRIMARY,
        ExprKind::Unary { op, .. } if op.is_postfix() => PREC_POSTFIX,
        ExprKind::Unary { .. } => PREC_PREFIX,
        ExprKind::Binary { op, .. } => op.precedence(),
        ExprKind::Assign { .. } => PREC_ASSIGN,
        ExprKind::Ternary { .. } => PREC_TERNARY,
        ExprKind::Call { .. } | ExprKind::Member { .. } | ExprKind::Index { .. } => PREC_POSTFIX,
    }
}

/// Write `expr`, parenthesised if it binds looser than `min`.
fn write_expr(out: &mut String, expr: &Expr, min: u8) {
    if precedence(expr) < min {
        out.push('(');
        write_expr_unwrapped(out, expr);
        out.push(')');
    } else {
        write_expr_unwrapped(out, expr);
    }
}

fn write_expr_unwrapped(out: &mut String, expr: &Expr) {
    match &expr.kind {
        ExprKind::IntLit(value) => {
            let _ = write!(out, "{value}");
        }
        ExprKind::FloatLit(value) => out.push_str(&format_float(*value)),
        ExprKind::BoolLit(value) => {
            let _ = write!(out, "{value}");
        }
        ExprKind::Var(name) => out.push_str(name),
        ExprKind::Unary { op, operand } if op.is_postfix() => {
            write_expr(out, operand, PREC_POSTFIX);
            out.push_str(op.symbol());
        }
        ExprKind::Unary { op, operand } => {
            out.push_str(op.symbol());
            let mut text = String::new();
            write_expr(&mut text, operand, PREC_PREFIX);
            // `- -x` must not print as `--x`.
            if op.symbol().ends_with('-') && text.starts_with('-') {
                let _ = write!(out, "({text})");
            } else {
                out.push_str(&text);
            }
        }
        ExprKind::Binary { op, lhs, rhs } => {
            write_expr(out, lhs, op.precedence());
            let _ = write!(out, " {} ", op.symbol());
            write_expr(out, rhs, op.precedence() + 1);
        }
        ExprKind::Assign { op, target, value } => {
            write_expr(out, target, PREC_PREFIX);
            let _ = write!(out, " {} ", op.symbol());
            write_expr(out, value, PREC_ASSIGN);
        }
        ExprKind::Ternary {
            cond,
            then_expr,
            else_expr,
        } => {
            write_expr(out, cond, PREC_LOGICAL_OR);
            out.push_str(" ? ");
            write_expr(out, then_expr, PREC_ASSIGN);
            out.push_str(" : ");
            write_expr(out, else_expr, PREC_TERNARY);
        }
        ExprKind::Call { callee, args } => {
            out.push_str(callee);
            out.push('(');
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, arg, PREC_ASSIGN);
            }
            out.push(')');
        }
        ExprKind::Member { base, field } => {
            write_expr(out, base, PREC_POSTFIX);
            out.push('.');
            out.push_str(field);
        }
        ExprKind::Index { base, index } => {
            write_expr(out, base, PREC_POSTFIX);
            out.push('[');
            write_expr(out, index, PREC_ASSIGN);
            out.push(']');
        }
        ExprKind::Paren(inner) => {
            out.push('(');
            write_expr(out, inner, PREC_ASSIGN);
            out.push(')');
        }
    }
}
