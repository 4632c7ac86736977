//! Signatures of builtin functions and type constructors.

use crate::ast::Type;

fn is_gen_float(ty: &Type) -> bool {
    matches!(ty, Type::Float | Type::Vec(_))
}

fn is_gen_int(ty: &Type) -> bool {
    matches!(ty, Type::Int | Type::IVec(_))
}

const FLOAT_UNARY: &[&str] = &[
    "radians",
    "degrees",
    "sin",
    "cos",
    "tan",
    "asin",
    "acos",
    "exp",
    "log",
    "exp2",
    "log2",
    "sqrt",
    "inversesqrt",
    "floor",
    "ceil",
    "fract",
    "normalize",
];

pub(super) fn is_builtin(name: &str) -> bool {
    FLOAT_UNARY.contains(&name)
        || matches!(
            name,
            "atan"
                | "abs"
                | "sign"
                | "pow"
                | "mod"
                | "min"
                | "max"
                | "step"
                | "clamp"
                | "mix"
                | "smoothstep"
                | "length"
                | "distance"
                | "dot"
                | "cross"
                | "reflect"
        )
}

/// `second` is either the same genType as `first` or its scalar.
fn same_or_scalar(first: &Type, second: &Type) -> bool {
    second == first || first.scalar().as_ref() == Some(second)
}

/// Result type of a builtin call, or a description of the mismatch.
pub(super) fn call(name: &str, args: &[Type]) -> Result<Type, String> {
    let mismatch = || {
        let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
        format!("no overload of '{name}' takes ({})", rendered.join(", "))
    };
    let ok = match (name, args) {
        (_, [x]) if FLOAT_UNARY.contains(&name) && is_gen_float(x) => x.clone(),
        ("atan", [x]) if is_gen_float(x) => x.clone(),
        ("atan" | "pow", [y, x]) if is_gen_float(y) && y == x => y.clone(),
        ("abs" | "sign", [x]) if is_gen_float(x) || is_gen_int(x) => x.clone(),
        ("mod", [x, y]) if is_gen_float(x) && same_or_scalar(x, y) => x.clone(),
        ("min" | "max", [x, y])
            if (is_gen_float(x) || is_gen_int(x)) && same_or_scalar(x, y) =>
        {
            x.clone()
        }
        ("step", [edge, x]) if is_gen_float(x) && same_or_scalar(x, edge) => x.clone(),
        ("clamp", [x, lo, hi])
            if (is_gen_float(x) || is_gen_int(x))
                && ((lo == x && hi == x) || (same_or_scalar(x, lo) && lo == hi)) =>
        {
            x.clone()
        }
        ("mix", [x, y, a]) if is_gen_float(x) && x == y && same_or_scalar(x, a) => x.clone(),
        ("smoothstep", [lo, hi, x])
            if is_gen_float(x) && ((lo == x && hi == x) || (same_or_scalar(x, lo) && lo == hi)) =>
        {
            x.clone()
        }
        ("length", [x]) if is_gen_float(x) => Type::Float,
        ("distance" | "dot", [x, y]) if is_gen_float(x) && x == y => Type::Float,
        ("cross", [Type::Vec(3), Type::Vec(3)]) => Type::Vec(3),
        ("reflect", [i, n]) if is_gen_float(i) && i == n => i.clone(),
        _ => return Err(mismatch()),
    };
    Ok(ok)
}

/// Result type of a scalar or vector constructor call `target(args)`.
pub(super) fn construct(target: &Type, args: &[Type]) -> Result<Type, String> {
    let Some(count) = target.components() else {
        return Err(format!("'{target}' cannot be constructed"));
    };
    if args.is_empty() {
        return Err(format!("constructor '{target}' needs at least one argument"));
    }
    let mut sizes = Vec::with_capacity(args.len());
    for arg in args {
        match arg.components() {
            Some(size) => sizes.push(usize::from(size)),
            None => return Err(format!("cannot construct '{target}' from '{arg}'")),
        }
    }
    let count = usize::from(count);
    match sizes.as_slice() {
        // Conversion, splat, or truncation of a single value.
        [size] if count == 1 || *size == 1 || *size >= count => Ok(target.clone()),
        [_] => Err(format!("too few components to construct '{target}'")),
        _ if count == 1 => Err(format!("too many arguments to construct '{target}'")),
        _ => {
            let total: usize = sizes.iter().sum();
            let before_last = total - sizes[sizes.len() - 1];
            if total < count {
                Err(format!("too few components to construct '{target}'"))
            } else if before_last >= count {
                Err(format!("too many arguments to construct '{target}'"))
            } else {
                Ok(target.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_type_functions() {
        assert_eq!(call("sin", &[Type::Vec(3)]), Ok(Type::Vec(3)));
        assert_eq!(call("max", &[Type::Vec(2), Type::Float]), Ok(Type::Vec(2)));
        assert_eq!(call("dot", &[Type::Vec(4), Type::Vec(4)]), Ok(Type::Float));
        assert!(call("sin", &[Type::Int]).is_err());
        assert!(call("cross", &[Type::Vec(2), Type::Vec(2)]).is_err());
    }

    #[test]
    fn test_vector_constructors() {
        assert_eq!(construct(&Type::Vec(4), &[Type::Float]), Ok(Type::Vec(4)));
        assert_eq!(
            construct(&Type::Vec(4), &[Type::Vec(2), Type::Float, Type::Float]),
            Ok(Type::Vec(4))
        );
        assert_eq!(construct(&Type::Vec(2), &[Type::Vec(4)]), Ok(Type::Vec(2)));
        assert!(construct(&Type::Vec(4), &[Type::Vec(2)]).is_err());
        assert!(construct(&Type::Vec(2), &[Type::Float, Type::Float, Type::Float]).is_err());
        assert_eq!(construct(&Type::Int, &[Type::Float]), Ok(Type::Int));
    }
}
