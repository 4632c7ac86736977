//! Expression typing.

use crate::ast::*;
use crate::markers::Marker;

use super::{Checker, builtins};

/// Component index of a swizzle letter, if it belongs to `set`.
fn swizzle_component(set: &str, letter: char) -> Option<usize> {
    set.find(letter)
}

/// Parse a swizzle against a vector with `size` components, returning the
/// selected component indices.
fn swizzle_indices(field: &str, size: u8) -> Option<Vec<usize>> {
    if field.is_empty() || field.len() > 4 {
        return None;
    }
    let first = field.chars().next()?;
    let set = ["xyzw", "rgba", "stpq"]
        .into_iter()
        .find(|set| set.contains(first))?;
    field
        .chars()
        .map(|letter| swizzle_component(set, letter).filter(|&i| i < usize::from(size)))
        .collect()
}

impl<'a> Checker<'a> {
    /// Type `expr`, record it, and report any violation found. `None` means
    /// the expression is ill-typed and an error has already been reported.
    pub(super) fn type_of(&mut self, expr: &'a Expr) -> Option<Type> {
        self.note_id(expr.id);
        let ty = self.compute_type(expr)?;
        self.types.insert(expr.id, ty.clone());
        Some(ty)
    }

    fn compute_type(&mut self, expr: &'a Expr) -> Option<Type> {
        match &expr.kind {
            ExprKind::IntLit(_) => Some(Type::Int),
            ExprKind::FloatLit(_) => Some(Type::Float),
            ExprKind::BoolLit(_) => Some(Type::Bool),
            ExprKind::Var(name) => match self.lookup(name) {
                Some(binding) => Some(binding.ty.clone()),
                None => {
                    self.error(expr.id, format!("undeclared identifier '{name}'"));
                    None
                }
            },
            ExprKind::Paren(inner) => self.type_of(inner),
            ExprKind::Unary { op, operand } => self.unary_type(expr.id, *op, operand),
            ExprKind::Binary { op, lhs, rhs } => {
                let lhs_ty = self.type_of(lhs);
                let rhs_ty = self.type_of(rhs);
                self.binary_type(expr.id, *op, &lhs_ty?, &rhs_ty?)
            }
            ExprKind::Assign { op, target, value } => {
                let target_ty = self.type_of(target);
                let value_ty = self.type_of(value);
                let (target_ty, value_ty) = (target_ty?, value_ty?);
                if !self.check_lvalue(target) {
                    return None;
                }
                let result = match op.binary() {
                    None => Some(value_ty.clone()),
                    Some(bin) => self.binary_type(expr.id, bin, &target_ty, &value_ty),
                }?;
                if result != target_ty {
                    self.error(
                        expr.id,
                        format!("cannot assign a value of type '{value_ty}' to '{target_ty}'"),
                    );
                    return None;
                }
                Some(target_ty)
            }
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => {
                let cond_ty = self.type_of(cond);
                let then_ty = self.type_of(then_expr);
                let else_ty = self.type_of(else_expr);
                let (cond_ty, then_ty, else_ty) = (cond_ty?, then_ty?, else_ty?);
                if cond_ty != Type::Bool {
                    self.error(
                        cond.id,
                        format!("ternary condition must be 'bool', found '{cond_ty}'"),
                    );
                    return None;
                }
                if then_ty != else_ty {
                    self.error(
                        expr.id,
                        format!(
                            "ternary branches have different types '{}' and '{}'",
                            then_ty, else_ty
                        ),
                    );
                    return None;
                }
                Some(then_ty)
            }
            ExprKind::Call { callee, args } => self.call_type(expr.id, callee, args),
            ExprKind::Member { base, field } => {
                let base_ty = self.type_of(base)?;
                self.member_type(expr.id, &base_ty, field)
            }
            ExprKind::Index { base, index } => {
                let base_ty = self.type_of(base);
                let index_ty = self.type_of(index);
                let (base_ty, index_ty) = (base_ty?, index_ty?);
                if index_ty != Type::Int {
                    self.error(index.id, format!("index must be 'int', found '{index_ty}'"));
                    return None;
                }
                if !base_ty.is_vector() {
                    self.error(expr.id, format!("cannot index a value of type '{base_ty}'"));
                    return None;
                }
                base_ty.scalar()
            }
        }
    }

    fn unary_type(&mut self, id: NodeId, op: UnaryOp, operand: &'a Expr) -> Option<Type> {
        let ty = self.type_of(operand)?;
        match op {
            UnaryOp::Not if ty == Type::Bool => Some(ty),
            UnaryOp::Not => {
                self.error(id, format!("'!' needs a 'bool' operand, found '{ty}'"));
                None
            }
            _ if !ty.is_numeric() => {
                self.error(
                    id,
                    format!("'{}' needs a numeric operand, found '{ty}'", op.symbol()),
                );
                None
            }
            UnaryOp::Neg => Some(ty),
            _ => self.check_lvalue(operand).then_some(ty),
        }
    }

    pub(super) fn binary_type(
        &mut self,
        id: NodeId,
        op: BinaryOp,
        lhs: &Type,
        rhs: &Type,
    ) -> Option<Type> {
        let result = match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let operands_ok = if op == BinaryOp::Rem {
                    matches!(lhs.scalar(), Some(Type::Int))
                } else {
                    lhs.is_numeric()
                };
                if !operands_ok || lhs.scalar() != rhs.scalar() {
                    None
                } else if lhs == rhs || rhs.is_scalar() {
                    Some(lhs.clone())
                } else if lhs.is_scalar() {
                    Some(rhs.clone())
                } else {
                    None
                }
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                (lhs == rhs && lhs.is_scalar() && lhs.is_numeric()).then_some(Type::Bool)
            }
            BinaryOp::Eq | BinaryOp::Ne => (lhs == rhs && *lhs != Type::Void).then_some(Type::Bool),
            BinaryOp::And | BinaryOp::Or | BinaryOp::Xor => {
                (*lhs == Type::Bool && *rhs == Type::Bool).then_some(Type::Bool)
            }
        };
        if result.is_none() {
            self.error(
                id,
                format!(
                    "operator '{}' cannot be applied to '{lhs}' and '{rhs}'",
                    op.symbol()
                ),
            );
        }
        result
    }

    fn member_type(&mut self, id: NodeId, base: &Type, field: &str) -> Option<Type> {
        if let Type::Struct(name) = base {
            let field_ty = self
                .structs
                .get(name.as_str())
                .and_then(|decl| decl.field(field))
                .map(|field| field.ty.clone());
            if field_ty.is_none() {
                self.error(id, format!("struct '{name}' has no field '{field}'"));
            }
            return field_ty;
        }
        let swizzled = match (base.scalar(), base.components()) {
            (Some(scalar), Some(size)) if base.is_vector() => swizzle_indices(field, size)
                .and_then(|indices| Type::with_components(&scalar, indices.len() as u8)),
            _ => None,
        };
        if swizzled.is_none() {
            self.error(id, format!("invalid swizzle '{field}' on '{base}'"));
        }
        swizzled
    }

    /// Whether `expr` denotes a writable location. Reports when it does not.
    pub(super) fn check_lvalue(&mut self, expr: &Expr) -> bool {
        let writable = match &expr.kind {
            ExprKind::Var(name) => self.lookup(name).is_some_and(|binding| binding.writable),
            ExprKind::Paren(inner) => return self.check_lvalue(inner),
            ExprKind::Index { base, .. } => return self.check_lvalue(base),
            ExprKind::Member { base, field } => {
                let repeats = self.types.get(&base.id).is_some_and(Type::is_vector) && {
                    let mut seen = Vec::new();
                    field.chars().any(|c| {
                        let repeated = seen.contains(&c);
                        seen.push(c);
                        repeated
                    })
                };
                if repeats {
                    false
                } else {
                    return self.check_lvalue(base);
                }
            }
            _ => false,
        };
        if !writable {
            self.error(expr.id, "expression is not assignable");
        }
        writable
    }

    fn call_type(&mut self, id: NodeId, callee: &'a str, args: &'a [Expr]) -> Option<Type> {
        let mut arg_types = Vec::with_capacity(args.len());
        for arg in args {
            arg_types.push(self.type_of(arg));
        }
        let arg_types: Vec<Type> = arg_types.into_iter().collect::<Option<_>>()?;

        if let Some(target) = Type::from_keyword(callee) {
            return self.report(id, builtins::construct(&target, &arg_types));
        }
        if let Some(decl) = self.structs.get(callee).copied() {
            let field_types: Vec<&Type> = decl.fields.iter().map(|f| &f.ty).collect();
            if field_types.len() != arg_types.len()
                || field_types.iter().zip(&arg_types).any(|(f, a)| *f != a)
            {
                self.error(
                    id,
                    format!("arguments do not match the fields of struct '{callee}'"),
                );
                return None;
            }
            return Some(Type::Struct(callee.to_owned()));
        }
        if let Some(marker) = Marker::from_name(callee) {
            return self.marker_type(id, marker, &arg_types);
        }
        if let Some(function) = self.functions.get(callee).copied() {
            let params: Vec<&Type> = function.params.iter().map(|p| &p.ty).collect();
            if params.len() != arg_types.len() {
                self.error(
                    id,
                    format!(
                        "'{callee}' takes {} argument(s) but {} were supplied",
                        params.len(),
                        arg_types.len()
                    ),
                );
                return None;
            }
            if let Some((param, arg)) = params.iter().zip(&arg_types).find(|(p, a)| **p != *a) {
                self.error(
                    id,
                    format!("'{callee}' expects an argument of type '{param}', found '{arg}'"),
                );
                return None;
            }
            return Some(function.return_ty.clone());
        }
        if builtins::is_builtin(callee) {
            return self.report(id, builtins::call(callee, &arg_types));
        }
        self.error(id, format!("no function named '{callee}'"));
        None
    }

    fn marker_type(&mut self, id: NodeId, marker: Marker, args: &[Type]) -> Option<Type> {
        let name = marker.name();
        if args.len() != marker.arity() {
            self.error(id, format!("'{name}' takes {} argument(s)", marker.arity()));
            return None;
        }
        let expected = match marker {
            Marker::Identity => {
                if args[0] != args[1] {
                    self.error(id, format!("'{name}' arguments must have the same type"));
                    return None;
                }
                return Some(args[0].clone());
            }
            Marker::Fuzzed => return Some(args[0].clone()),
            Marker::Switch => Type::Int,
            Marker::Dead | Marker::WrappedIfTrue | Marker::WrappedIfFalse | Marker::WrappedLoop => {
                Type::Bool
            }
        };
        if args[0] != expected {
            self.error(
                id,
                format!(
                    "'{name}' expects an argument of type '{expected}', found '{}'",
                    args[0]
                ),
            );
            return None;
        }
        Some(expected)
    }

    fn report(&mut self, id: NodeId, result: Result<Type, String>) -> Option<Type> {
        result.map_err(|message| self.error(id, message)).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_swizzle_indices() {
        assert_eq!(swizzle_indices("xy", 2), Some(vec![0, 1]));
        assert_eq!(swizzle_indices("bgr", 3), Some(vec![2, 1, 0]));
        assert_eq!(swizzle_indices("xz", 2), None);
        assert_eq!(swizzle_indices("xr", 4), None);
        assert_eq!(swizzle_indices("xyzwx", 4), None);
    }
}
