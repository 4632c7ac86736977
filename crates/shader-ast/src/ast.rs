//! Program tree for shader translation units.
//!
//! Every declaration, statement and expression carries a [`NodeId`] that is
//! unique within its [`TranslationUnit`]. Edits address nodes by id, so an
//! edit recorded against one tree applies identically to a deep copy of it.

use serde::{Deserialize, Serialize};

use crate::version::ShadingLanguageVersion;

/// Unique identifier for a node within one translation unit.
///
/// Ids survive `Clone`, which is what lets an edit discovered on one tree be
/// replayed on a private copy of that tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(u32);

impl NodeId {
    /// Placeholder used by the parser before ids are assigned.
    pub(crate) const UNASSIGNED: NodeId = NodeId(u32::MAX);

    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Types expressible in the supported shader subset.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Type {
    Void,
    Bool,
    Int,
    Float,
    /// `vec2` .. `vec4`
    Vec(u8),
    /// `ivec2` .. `ivec4`
    IVec(u8),
    /// `bvec2` .. `bvec4`
    BVec(u8),
    Struct(String),
}

impl Type {
    /// Resolve a builtin type keyword.
    pub fn from_keyword(name: &str) -> Option<Type> {
        let ty = match name {
            "void" => Type::Void,
            "bool" => Type::Bool,
            "int" => Type::Int,
            "float" => Type::Float,
            "vec2" => Type::Vec(2),
            "vec3" => Type::Vec(3),
            "vec4" => Type::Vec(4),
            "ivec2" => Type::IVec(2),
            "ivec3" => Type::IVec(3),
            "ivec4" => Type::IVec(4),
            "bvec2" => Type::BVec(2),
            "bvec3" => Type::BVec(3),
            "bvec4" => Type::BVec(4),
            _ => return None,
        };
        Some(ty)
    }

    /// Parse a type name, treating anything that is not a keyword as a struct.
    pub fn from_name(name: &str) -> Type {
        Type::from_keyword(name).unwrap_or_else(|| Type::Struct(name.to_owned()))
    }

    /// Build the scalar or vector type with `count` components of `scalar`.
    pub fn with_components(scalar: &Type, count: u8) -> Option<Type> {
        match (scalar, count) {
            (Type::Bool | Type::Int | Type::Float, 1) => Some(scalar.clone()),
            (Type::Float, 2..=4) => Some(Type::Vec(count)),
            (Type::Int, 2..=4) => Some(Type::IVec(count)),
            (Type::Bool, 2..=4) => Some(Type::BVec(count)),
            _ => None,
        }
    }

    /// The component type of a scalar or vector type.
    pub fn scalar(&self) -> Option<Type> {
        match self {
            Type::Bool | Type::BVec(_) => Some(Type::Bool),
            Type::Int | Type::IVec(_) => Some(Type::Int),
            Type::Float | Type::Vec(_) => Some(Type::Float),
            Type::Void | Type::Struct(_) => None,
        }
    }

    /// Number of components for scalar and vector types.
    pub fn components(&self) -> Option<u8> {
        match self {
            Type::Bool | Type::Int | Type::Float => Some(1),
            Type::Vec(n) | Type::IVec(n) | Type::BVec(n) => Some(*n),
            Type::Void | Type::Struct(_) => None,
        }
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, Type::Bool | Type::Int | Type::Float)
    }

    pub fn is_vector(&self) -> bool {
        matches!(self, Type::Vec(_) | Type::IVec(_) | Type::BVec(_))
    }

    /// Scalar or vector of `int` or `float`.
    pub fn is_numeric(&self) -> bool {
        matches!(self.scalar(), Some(Type::Int | Type::Float))
    }

    pub fn struct_name(&self) -> Option<&str> {
        match self {
            Type::Struct(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Void => write!(f, "void"),
            Type::Bool => write!(f, "bool"),
            Type::Int => write!(f, "int"),
            Type::Float => write!(f, "float"),
            Type::Vec(n) => write!(f, "vec{n}"),
            Type::IVec(n) => write!(f, "ivec{n}"),
            Type::BVec(n) => write!(f, "bvec{n}"),
            Type::Struct(name) => write!(f, "{name}"),
        }
    }
}

/// Root of a shader program.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TranslationUnit {
    /// Version named by the `#version` directive (ESSL 100 when absent).
    pub version: ShadingLanguageVersion,
    pub decls: Vec<Decl>,
    pub(crate) next_id: u32,
}

impl TranslationUnit {
    /// Build a unit and number every node in source order.
    pub fn new(version: ShadingLanguageVersion, decls: Vec<Decl>) -> Self {
        let mut unit = Self {
            version,
            decls,
            next_id: 0,
        };
        unit.renumber();
        unit
    }

    /// Allocate an id that no node of this unit uses yet.
    pub fn fresh_id(&mut self) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        id
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Function(function) => Some(function),
            _ => None,
        })
    }

    pub fn structs(&self) -> impl Iterator<Item = &StructDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Struct(decl) => Some(decl),
            _ => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &VariableDecl> {
        self.decls.iter().filter_map(|decl| match decl {
            Decl::Variable(var) => Some(var),
            _ => None,
        })
    }

    pub fn find_function(&self, name: &str) -> Option<&FunctionDecl> {
        self.functions().find(|function| function.name == name)
    }

    pub fn find_function_mut(&mut self, name: &str) -> Option<&mut FunctionDecl> {
        self.decls.iter_mut().find_map(|decl| match decl {
            Decl::Function(function) if function.name == name => Some(function),
            _ => None,
        })
    }

    pub fn find_struct(&self, name: &str) -> Option<&StructDecl> {
        self.structs().find(|decl| decl.name == name)
    }

    pub fn find_struct_mut(&mut self, name: &str) -> Option<&mut StructDecl> {
        self.decls.iter_mut().find_map(|decl| match decl {
            Decl::Struct(decl) if decl.name == name => Some(decl),
            _ => None,
        })
    }

    pub fn find_global(&self, name: &str) -> Option<&VariableDecl> {
        self.globals().find(|var| var.name == name)
    }

    /// Remove the top-level declaration with the given id.
    pub fn remove_decl(&mut self, id: NodeId) -> Option<Decl> {
        let index = self.decls.iter().position(|decl| decl.id() == id)?;
        Some(self.decls.remove(index))
    }

    fn renumber(&mut self) {
        let mut decls = std::mem::take(&mut self.decls);
        for decl in &mut decls {
            self.assign_ids_decl(decl);
        }
        self.decls = decls;
    }
}

/// Top-level declaration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Decl {
    Precision(PrecisionDecl),
    Struct(StructDecl),
    Variable(VariableDecl),
    Function(FunctionDecl),
}

impl Decl {
    pub fn id(&self) -> NodeId {
        match self {
            Decl::Precision(decl) => decl.id,
            Decl::Struct(decl) => decl.id,
            Decl::Variable(decl) => decl.id,
            Decl::Function(decl) => decl.id,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Precision {
    Low,
    Medium,
    High,
}

impl Precision {
    pub fn keyword(self) -> &'static str {
        match self {
            Precision::Low => "lowp",
            Precision::Medium => "mediump",
            Precision::High => "highp",
        }
    }
}

/// `precision mediump float;`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrecisionDecl {
    pub id: NodeId,
    pub precision: Precision,
    pub ty: Type,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructDecl {
    pub id: NodeId,
    pub name: String,
    pub fields: Vec<StructField>,
}

impl StructDecl {
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.fields.iter().find(|field| field.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructField {
    pub id: NodeId,
    pub ty: Type,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageQualifier {
    Const,
    Uniform,
    In,
    Out,
}

impl StorageQualifier {
    pub fn keyword(self) -> &'static str {
        match self {
            StorageQualifier::Const => "const",
            StorageQualifier::Uniform => "uniform",
            StorageQualifier::In => "in",
            StorageQualifier::Out => "out",
        }
    }
}

/// A single-declarator variable declaration, global or local.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VariableDecl {
    pub id: NodeId,
    pub qualifier: Option<StorageQualifier>,
    pub ty: Type,
    pub name: String,
    pub init: Option<Expr>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub id: NodeId,
    pub return_ty: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
}

impl FunctionDecl {
    pub fn param_index(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|param| param.name == name)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Param {
    pub id: NodeId,
    pub ty: Type,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: NodeId,
    pub stmts: Vec<Stmt>,
}

impl Block {
    pub fn new(id: NodeId, stmts: Vec<Stmt>) -> Self {
        Self { id, stmts }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stmt {
    pub id: NodeId,
    pub kind: StmtKind,
}

impl Stmt {
    pub fn new(id: NodeId, kind: StmtKind) -> Self {
        Self { id, kind }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum StmtKind {
    Decl(VariableDecl),
    Expr(Expr),
    Block(Block),
    If {
        cond: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    While {
        cond: Expr,
        body: Box<Stmt>,
    },
    Switch {
        selector: Expr,
        cases: Vec<SwitchCase>,
    },
    Return(Option<Expr>),
    Break,
    Continue,
    Discard,
    Empty,
}

/// One `case`/`default` label and the statements up to the next label.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwitchCase {
    pub id: NodeId,
    pub label: CaseLabel,
    pub body: Vec<Stmt>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseLabel {
    Case(i64),
    Default,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expr {
    pub id: NodeId,
    pub kind: ExprKind,
}

impl Expr {
    pub fn new(id: NodeId, kind: ExprKind) -> Self {
        Self { id, kind }
    }

    /// The variable name if this is a plain variable reference.
    pub fn as_var(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Var(name) => Some(name),
            _ => None,
        }
    }

    /// The callee and arguments if this is a call.
    pub fn as_call(&self) -> Option<(&str, &[Expr])> {
        match &self.kind {
            ExprKind::Call { callee, args } => Some((callee, args)),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn without_parens(&self) -> &Expr {
        match &self.kind {
            ExprKind::Paren(inner) => inner.without_parens(),
            _ => self,
        }
    }

    /// Immediate sub-expressions, in evaluation order.
    pub fn children(&self) -> Vec<&Expr> {
        match &self.kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Var(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![&**operand],
            ExprKind::Binary { lhs, rhs, .. } => vec![&**lhs, &**rhs],
            ExprKind::Assign { target, value, .. } => vec![&**target, &**value],
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => vec![&**cond, &**then_expr, &**else_expr],
            ExprKind::Call { args, .. } => args.iter().collect(),
            ExprKind::Member { base, .. } => vec![&**base],
            ExprKind::Index { base, index } => vec![&**base, &**index],
            ExprKind::Paren(inner) => vec![&**inner],
        }
    }

    pub fn children_mut(&mut self) -> Vec<&mut Expr> {
        match &mut self.kind {
            ExprKind::IntLit(_)
            | ExprKind::FloatLit(_)
            | ExprKind::BoolLit(_)
            | ExprKind::Var(_) => Vec::new(),
            ExprKind::Unary { operand, .. } => vec![&mut **operand],
            ExprKind::Binary { lhs, rhs, .. } => vec![&mut **lhs, &mut **rhs],
            ExprKind::Assign { target, value, .. } => vec![&mut **target, &mut **value],
            ExprKind::Ternary {
                cond,
                then_expr,
                else_expr,
            } => vec![&mut **cond, &mut **then_expr, &mut **else_expr],
            ExprKind::Call { args, .. } => args.iter_mut().collect(),
            ExprKind::Member { base, .. } => vec![&mut **base],
            ExprKind::Index { base, index } => vec![&mut **base, &mut **index],
            ExprKind::Paren(inner) => vec![&mut **inner],
        }
    }

    /// Whether this is a literal of any scalar type.
    pub fn is_literal(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::IntLit(_) | ExprKind::FloatLit(_) | ExprKind::BoolLit(_)
        )
    }

    /// Find a node with the given id in this subtree.
    pub fn find_descendant(&self, id: NodeId) -> Option<&Expr> {
        if self.id == id {
            return Some(self);
        }
        self.children()
            .into_iter()
            .find_map(|child| child.find_descendant(id))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExprKind {
    IntLit(i64),
    FloatLit(f64),
    BoolLit(bool),
    Var(String),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Assign {
        op: AssignOp,
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Ternary {
        cond: Box<Expr>,
        then_expr: Box<Expr>,
        else_expr: Box<Expr>,
    },
    /// User function, builtin function, or type/struct constructor.
    Call {
        callee: String,
        args: Vec<Expr>,
    },
    /// Struct field access or vector swizzle.
    Member {
        base: Box<Expr>,
        field: String,
    },
    Index {
        base: Box<Expr>,
        index: Box<Expr>,
    },
    Paren(Box<Expr>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    Neg,
    Not,
    PreInc,
    PreDec,
    PostInc,
    PostDec,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::PreInc | UnaryOp::PostInc => "++",
            UnaryOp::PreDec | UnaryOp::PostDec => "--",
        }
    }

    pub fn is_postfix(self) -> bool {
        matches!(self, UnaryOp::PostInc | UnaryOp::PostDec)
    }

    /// Whether the operator writes its operand.
    pub fn is_increment(self) -> bool {
        matches!(
            self,
            UnaryOp::PreInc | UnaryOp::PreDec | UnaryOp::PostInc | UnaryOp::PostDec
        )
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Xor,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Xor => "^^",
        }
    }

    /// Binding strength; larger binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 3,
            BinaryOp::Xor => 4,
            BinaryOp::And => 5,
            BinaryOp::Eq | BinaryOp::Ne => 6,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => 7,
            BinaryOp::Add | BinaryOp::Sub => 8,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => 9,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignOp {
    Assign,
    Add,
    Sub,
    Mul,
    Div,
}

impl AssignOp {
    pub fn symbol(self) -> &'static str {
        match self {
            AssignOp::Assign => "=",
            AssignOp::Add => "+=",
            AssignOp::Sub => "-=",
            AssignOp::Mul => "*=",
            AssignOp::Div => "/=",
        }
    }

    /// The arithmetic operator a compound assignment applies.
    pub fn binary(self) -> Option<BinaryOp> {
        match self {
            AssignOp::Assign => None,
            AssignOp::Add => Some(BinaryOp::Add),
            AssignOp::Sub => Some(BinaryOp::Sub),
            AssignOp::Mul => Some(BinaryOp::Mul),
            AssignOp::Div => Some(BinaryOp::Div),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_display() {
        assert_eq!(NodeId::from_raw(12).to_string(), "#12");
    }

    #[test]
    fn test_type_keywords_round_trip() {
        for name in ["void", "bool", "int", "float", "vec3", "ivec2", "bvec4"] {
            let ty = Type::from_keyword(name).unwrap();
            assert_eq!(ty.to_string(), name);
        }
        assert_eq!(Type::from_name("Light"), Type::Struct("Light".to_owned()));
    }

    #[test]
    fn test_type_components() {
        assert_eq!(Type::Vec(3).scalar(), Some(Type::Float));
        assert_eq!(Type::IVec(2).components(), Some(2));
        assert_eq!(Type::with_components(&Type::Bool, 3), Some(Type::BVec(3)));
        assert_eq!(Type::with_components(&Type::Float, 1), Some(Type::Float));
        assert_eq!(Type::with_components(&Type::Float, 5), None);
        assert!(!Type::Struct("S".into()).is_numeric());
    }
}
