//! Winnow parser for the supported shader subset.
//!
//! Nodes are built with placeholder ids; [`parse`] numbers them once the whole
//! unit is available.

use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt, separated};
use winnow::error::{ContextError, ErrMode, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{literal, one_of, take, take_till, take_until, take_while};

use crate::ast::*;
use crate::version::ShadingLanguageVersion;

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub offset: usize,
    /// 1-based line of `offset`.
    pub line: usize,
    /// 1-based column of `offset`.
    pub column: usize,
}

impl ParseError {
    fn at(source: &str, offset: usize, message: impl Into<String>) -> Self {
        let consumed = &source[..offset.min(source.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed.len() - consumed.rfind('\n').map_or(0, |i| i + 1) + 1;
        Self {
            message: message.into(),
            offset,
            line,
            column,
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "parse error at {}:{}: {}",
            self.line, self.column, self.message
        )
    }
}

impl std::error::Error for ParseError {}

fn describe(err: ErrMode<ContextError>) -> String {
    match err {
        ErrMode::Backtrack(e) | ErrMode::Cut(e) => {
            let text = e.to_string();
            if text.is_empty() {
                "unexpected input".to_owned()
            } else {
                text
            }
        }
        ErrMode::Incomplete(_) => "unexpected end of input".to_owned(),
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Parse a complete translation unit.
pub fn parse(source: &str) -> Result<TranslationUnit, ParseError> {
    let mut remaining = source;
    let offset = |remaining: &str| source.len() - remaining.len();

    let version = match version_directive(&mut remaining)
        .map_err(|e| ParseError::at(source, offset(remaining), describe(e)))?
    {
        None => ShadingLanguageVersion::default(),
        Some(text) => ShadingLanguageVersion::from_directive(text).ok_or_else(|| {
            ParseError::at(
                source,
                offset(remaining),
                format!("unsupported #version '{}'", text.trim()),
            )
        })?,
    };

    let mut decls = Vec::new();
    loop {
        ws(&mut remaining)
            .map_err(|e| ParseError::at(source, offset(remaining), describe(e)))?;
        if remaining.is_empty() {
            break;
        }
        if remaining.starts_with('#') {
            return Err(ParseError::at(
                source,
                offset(remaining),
                "unsupported preprocessor directive",
            ));
        }
        let start = remaining;
        match declaration(&mut remaining) {
            Ok(decl) => decls.push(decl),
            Err(e) => {
                let at = if remaining.len() < start.len() {
                    offset(remaining)
                } else {
                    offset(start)
                };
                return Err(ParseError::at(source, at, describe(e)));
            }
        }
    }

    Ok(TranslationUnit::new(version, decls))
}

// ============================================================================
// Lexical helpers
// ============================================================================

const RESERVED: &[&str] = &[
    "if",
    "else",
    "for",
    "while",
    "do",
    "switch",
    "case",
    "default",
    "return",
    "break",
    "continue",
    "discard",
    "struct",
    "const",
    "uniform",
    "in",
    "out",
    "inout",
    "precision",
    "lowp",
    "mediump",
    "highp",
    "true",
    "false",
];

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn node(kind: ExprKind) -> Expr {
    Expr::new(NodeId::UNASSIGNED, kind)
}

fn stmt(kind: StmtKind) -> Stmt {
    Stmt::new(NodeId::UNASSIGNED, kind)
}

fn backtrack<T>() -> ModalResult<T> {
    Err(ErrMode::Backtrack(ContextError::new()))
}

/// Skip whitespace and comments.
fn ws(input: &mut &str) -> ModalResult<()> {
    loop {
        take_while(0.., |c: char| c.is_ascii_whitespace())
            .void()
            .parse_next(input)?;
        if input.starts_with("//") {
            take_till(0.., |c: char| c == '\n')
                .void()
                .parse_next(input)?;
        } else if input.starts_with("/*") {
            ("/*", take_until(0.., "*/"), "*/")
                .void()
                .context(StrContext::Label("block comment"))
                .parse_next(input)?;
        } else {
            return Ok(());
        }
    }
}

/// A raw identifier-shaped word, reserved or not.
fn word<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    ws(input)?;
    (
        one_of(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., is_ident_char),
    )
        .take()
        .parse_next(input)
}

/// An identifier that names a variable, function, field or struct.
fn ident(input: &mut &str) -> ModalResult<String> {
    let checkpoint = *input;
    let name = word(input)?;
    if RESERVED.contains(&name) || Type::from_keyword(name).is_some() {
        *input = checkpoint;
        return backtrack();
    }
    Ok(name.to_owned())
}

/// A builtin type keyword or a struct name.
fn type_name(input: &mut &str) -> ModalResult<Type> {
    let checkpoint = *input;
    let name = word(input)?;
    if RESERVED.contains(&name) {
        *input = checkpoint;
        return backtrack();
    }
    Ok(Type::from_name(name))
}

fn peek_keyword(input: &str, kw: &str) -> bool {
    input
        .strip_prefix(kw)
        .is_some_and(|rest| !rest.starts_with(is_ident_char))
}

fn keyword(input: &mut &str, kw: &'static str) -> ModalResult<()> {
    ws(input)?;
    if !peek_keyword(input, kw) {
        return backtrack();
    }
    take(kw.len()).void().parse_next(input)
}

/// Expect a punctuation token.
fn punct(input: &mut &str, text: &'static str) -> ModalResult<()> {
    ws(input)?;
    literal(text)
        .context(StrContext::Expected(StrContextValue::StringLiteral(text)))
        .void()
        .parse_next(input)
}

fn peek_punct(input: &mut &str, text: &str) -> ModalResult<bool> {
    ws(input)?;
    Ok(input.starts_with(text))
}

// ============================================================================
// Declarations
// ============================================================================

/// The text following `#version`, if the unit starts with the directive.
fn version_directive<'a>(input: &mut &'a str) -> ModalResult<Option<&'a str>> {
    ws(input)?;
    if !input.starts_with("#version") {
        return Ok(None);
    }
    literal("#version").void().parse_next(input)?;
    take_till(0.., |c: char| c == '\n')
        .map(Some)
        .parse_next(input)
}

fn declaration(input: &mut &str) -> ModalResult<Decl> {
    ws(input)?;
    if peek_keyword(input, "precision") {
        return precision_decl(input).map(Decl::Precision);
    }
    if peek_keyword(input, "struct") {
        return struct_decl(input).map(Decl::Struct);
    }

    let qualifier = storage_qualifier(input)?;
    let ty = type_name(input)?;
    let name = ident(input)?;

    if qualifier.is_none() && peek_punct(input, "(")? {
        return function_rest(input, ty, name).map(Decl::Function);
    }
    variable_rest(input, qualifier, ty, name).map(Decl::Variable)
}

fn precision_decl(input: &mut &str) -> ModalResult<PrecisionDecl> {
    keyword(input, "precision")?;
    ws(input)?;
    let precision = if peek_keyword(input, "lowp") {
        keyword(input, "lowp")?;
        Precision::Low
    } else if peek_keyword(input, "mediump") {
        keyword(input, "mediump")?;
        Precision::Medium
    } else {
        keyword(input, "highp")?;
        Precision::High
    };
    let ty = type_name(input)?;
    punct(input, ";")?;
    Ok(PrecisionDecl {
        id: NodeId::UNASSIGNED,
        precision,
        ty,
    })
}

fn struct_decl(input: &mut &str) -> ModalResult<StructDecl> {
    keyword(input, "struct")?;
    let name = ident(input)?;
    punct(input, "{")?;
    let mut fields = Vec::new();
    while !peek_punct(input, "}")? {
        let ty = type_name(input)?;
        let field = ident(input)?;
        punct(input, ";")?;
        fields.push(StructField {
            id: NodeId::UNASSIGNED,
            ty,
            name: field,
        });
    }
    punct(input, "}")?;
    punct(input, ";")?;
    Ok(StructDecl {
        id: NodeId::UNASSIGNED,
        name,
        fields,
    })
}

fn storage_qualifier(input: &mut &str) -> ModalResult<Option<StorageQualifier>> {
    ws(input)?;
    for qualifier in [
        StorageQualifier::Const,
        StorageQualifier::Uniform,
        StorageQualifier::In,
        StorageQualifier::Out,
    ] {
        if peek_keyword(input, qualifier.keyword()) {
            keyword(input, qualifier.keyword())?;
            return Ok(Some(qualifier));
        }
    }
    Ok(None)
}

fn function_rest(input: &mut &str, return_ty: Type, name: String) -> ModalResult<FunctionDecl> {
    punct(input, "(")?;
    ws(input)?;
    let params: Vec<Param> = if peek_keyword(input, "void") {
        keyword(input, "void")?;
        Vec::new()
    } else {
        separated(0.., param, (ws, ',')).parse_next(input)?
    };
    punct(input, ")")?;
    let body = block(input)?;
    Ok(FunctionDecl {
        id: NodeId::UNASSIGNED,
        return_ty,
        name,
        params,
        body,
    })
}

fn param(input: &mut &str) -> ModalResult<Param> {
    ws(input)?;
    if peek_keyword(input, "in") {
        keyword(input, "in")?;
    }
    let ty = type_name(input)?;
    let name = ident(input)?;
    Ok(Param {
        id: NodeId::UNASSIGNED,
        ty,
        name,
    })
}

fn variable_rest(
    input: &mut &str,
    qualifier: Option<StorageQualifier>,
    ty: Type,
    name: String,
) -> ModalResult<VariableDecl> {
    let init = if peek_punct(input, "=")? {
        punct(input, "=")?;
        Some(assignment(input)?)
    } else {
        None
    };
    punct(input, ";")?;
    Ok(VariableDecl {
        id: NodeId::UNASSIGNED,
        qualifier,
        ty,
        name,
        init,
    })
}

// ============================================================================
// Statements
// ============================================================================

fn block(input: &mut &str) -> ModalResult<Block> {
    punct(input, "{")?;
    let mut stmts = Vec::new();
    while !peek_punct(input, "}")? {
        stmts.push(statement(input)?);
    }
    punct(input, "}")?;
    Ok(Block::new(NodeId::UNASSIGNED, stmts))
}

fn statement(input: &mut &str) -> ModalResult<Stmt> {
    ws(input)?;
    if input.starts_with('{') {
        return block(input).map(|b| stmt(StmtKind::Block(b)));
    }
    if input.starts_with(';') {
        punct(input, ";")?;
        return Ok(stmt(StmtKind::Empty));
    }
    if peek_keyword(input, "if") {
        return if_stmt(input);
    }
    if peek_keyword(input, "for") {
        return for_stmt(input);
    }
    if peek_keyword(input, "while") {
        return while_stmt(input);
    }
    if peek_keyword(input, "switch") {
        return switch_stmt(input);
    }
    if peek_keyword(input, "return") {
        keyword(input, "return")?;
        let value = if peek_punct(input, ";")? {
            None
        } else {
            Some(expression(input)?)
        };
        punct(input, ";")?;
        return Ok(stmt(StmtKind::Return(value)));
    }
    for (kw, kind) in [
        ("break", StmtKind::Break),
        ("continue", StmtKind::Continue),
        ("discard", StmtKind::Discard),
    ] {
        if peek_keyword(input, kw) {
            keyword(input, kw)?;
            punct(input, ";")?;
            return Ok(stmt(kind));
        }
    }
    alt((decl_stmt, expr_stmt)).parse_next(input)
}

fn decl_stmt(input: &mut &str) -> ModalResult<Stmt> {
    ws(input)?;
    let qualifier = if peek_keyword(input, "const") {
        keyword(input, "const")?;
        Some(StorageQualifier::Const)
    } else {
        None
    };
    let ty = type_name(input)?;
    let name = ident(input)?;
    let var = variable_rest(input, qualifier, ty, name)?;
    Ok(stmt(StmtKind::Decl(var)))
}

fn expr_stmt(input: &mut &str) -> ModalResult<Stmt> {
    let expr = expression(input)?;
    punct(input, ";")?;
    Ok(stmt(StmtKind::Expr(expr)))
}

fn if_stmt(input: &mut &str) -> ModalResult<Stmt> {
    keyword(input, "if")?;
    punct(input, "(")?;
    let cond = expression(input)?;
    punct(input, ")")?;
    let then_branch = Box::new(statement(input)?);
    ws(input)?;
    let else_branch = if peek_keyword(input, "else") {
        keyword(input, "else")?;
        Some(Box::new(statement(input)?))
    } else {
        None
    };
    Ok(stmt(StmtKind::If {
        cond,
        then_branch,
        else_branch,
    }))
}

fn for_stmt(input: &mut &str) -> ModalResult<Stmt> {
    keyword(input, "for")?;
    punct(input, "(")?;
    let init = if peek_punct(input, ";")? {
        punct(input, ";")?;
        None
    } else {
        Some(Box::new(alt((decl_stmt, expr_stmt)).parse_next(input)?))
    };
    let cond = if peek_punct(input, ";")? {
        None
    } else {
        Some(expression(input)?)
    };
    punct(input, ";")?;
    let step = if peek_punct(input, ")")? {
        None
    } else {
        Some(expression(input)?)
    };
    punct(input, ")")?;
    let body = Box::new(statement(input)?);
    Ok(stmt(StmtKind::For {
        init,
        cond,
        step,
        body,
    }))
}

fn while_stmt(input: &mut &str) -> ModalResult<Stmt> {
    keyword(input, "while")?;
    punct(input, "(")?;
    let cond = expression(input)?;
    punct(input, ")")?;
    let body = Box::new(statement(input)?);
    Ok(stmt(StmtKind::While { cond, body }))
}

fn switch_stmt(input: &mut &str) -> ModalResult<Stmt> {
    keyword(input, "switch")?;
    punct(input, "(")?;
    let selector = expression(input)?;
    punct(input, ")")?;
    punct(input, "{")?;
    let mut cases = Vec::new();
    while !peek_punct(input, "}")? {
        let label = case_label(input)?;
        let mut body = Vec::new();
        loop {
            ws(input)?;
            if input.is_empty()
                || input.starts_with('}')
                || peek_keyword(input, "case")
                || peek_keyword(input, "default")
            {
                break;
            }
            body.push(statement(input)?);
        }
        cases.push(SwitchCase {
            id: NodeId::UNASSIGNED,
            label,
            body,
        });
    }
    punct(input, "}")?;
    Ok(stmt(StmtKind::Switch { selector, cases }))
}

fn case_label(input: &mut &str) -> ModalResult<CaseLabel> {
    ws(input)?;
    let label = if peek_keyword(input, "default") {
        keyword(input, "default")?;
        CaseLabel::Default
    } else {
        keyword(input, "case")?;
        ws(input)?;
        let negative = opt('-').parse_next(input)?.is_some();
        ws(input)?;
        let digits = digit1.parse_next(input)?;
        let value: i64 = match digits.parse() {
            Ok(value) => value,
            Err(_) => return backtrack(),
        };
        CaseLabel::Case(if negative { -value } else { value })
    };
    punct(input, ":")?;
    Ok(label)
}

// ============================================================================
// Expressions
// ============================================================================

/// Full expression (assignment level).
pub(crate) fn expression(input: &mut &str) -> ModalResult<Expr> {
    assignment(input)
}

fn assignment(input: &mut &str) -> ModalResult<Expr> {
    let target = ternary(input)?;
    ws(input)?;
    let op = [
        ("+=", AssignOp::Add),
        ("-=", AssignOp::Sub),
        ("*=", AssignOp::Mul),
        ("/=", AssignOp::Div),
    ]
    .into_iter()
    .find(|(text, _)| input.starts_with(text))
    .or_else(|| {
        (input.starts_with('=') && !input.starts_with("==")).then_some(("=", AssignOp::Assign))
    });
    let Some((text, op)) = op else {
        return Ok(target);
    };
    take(text.len()).void().parse_next(input)?;
    let value = assignment(input)?;
    Ok(node(ExprKind::Assign {
        op,
        target: Box::new(target),
        value: Box::new(value),
    }))
}

fn ternary(input: &mut &str) -> ModalResult<Expr> {
    let cond = binary(input, 0)?;
    if !peek_punct(input, "?")? {
        return Ok(cond);
    }
    punct(input, "?")?;
    let then_expr = expression(input)?;
    punct(input, ":")?;
    let else_expr = assignment(input)?;
    Ok(node(ExprKind::Ternary {
        cond: Box::new(cond),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    }))
}

/// Recognise a binary operator at the start of `input`.
fn binary_op(input: &str) -> Option<BinaryOp> {
    const TWO_CHAR: [(&str, BinaryOp); 7] = [
        ("||", BinaryOp::Or),
        ("^^", BinaryOp::Xor),
        ("&&", BinaryOp::And),
        ("==", BinaryOp::Eq),
        ("!=", BinaryOp::Ne),
        ("<=", BinaryOp::Le),
        (">=", BinaryOp::Ge),
    ];
    if let Some((_, op)) = TWO_CHAR.iter().find(|(text, _)| input.starts_with(text)) {
        return Some(*op);
    }
    let mut chars = input.chars();
    let first = chars.next()?;
    let next = chars.next();
    if next == Some('=') || next == Some(first) {
        return None;
    }
    match first {
        '<' => Some(BinaryOp::Lt),
        '>' => Some(BinaryOp::Gt),
        '+' => Some(BinaryOp::Add),
        '-' => Some(BinaryOp::Sub),
        '*' => Some(BinaryOp::Mul),
        '/' => Some(BinaryOp::Div),
        '%' => Some(BinaryOp::Rem),
        _ => None,
    }
}

/// Precedence climbing over the binary operators.
fn binary(input: &mut &str, min_precedence: u8) -> ModalResult<Expr> {
    let mut lhs = unary(input)?;
    loop {
        let checkpoint = *input;
        ws(input)?;
        let Some(op) = binary_op(input).filter(|op| op.precedence() >= min_precedence) else {
            *input = checkpoint;
            return Ok(lhs);
        };
        take(op.symbol().len()).void().parse_next(input)?;
        let rhs = binary(input, op.precedence() + 1)?;
        lhs = node(ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        });
    }
}

fn unary(input: &mut &str) -> ModalResult<Expr> {
    ws(input)?;
    let prefix = [
        ("++", Some(UnaryOp::PreInc)),
        ("--", Some(UnaryOp::PreDec)),
        ("-", Some(UnaryOp::Neg)),
        ("!", Some(UnaryOp::Not)),
        ("+", None),
    ]
    .into_iter()
    .find(|(text, _)| input.starts_with(text));
    match prefix {
        Some((text, op)) => {
            take(text.len()).void().parse_next(input)?;
            let operand = unary(input)?;
            Ok(match op {
                Some(op) => node(ExprKind::Unary {
                    op,
                    operand: Box::new(operand),
                }),
                None => operand,
            })
        }
        None => postfix(input),
    }
}

fn postfix(input: &mut &str) -> ModalResult<Expr> {
    let mut expr = primary(input)?;
    loop {
        let checkpoint = *input;
        ws(input)?;
        let member = input.starts_with('.')
            && input[1..].starts_with(|c: char| c.is_ascii_alphabetic() || c == '_');
        if member {
            take(1usize).void().parse_next(input)?;
            let field = word(input)?.to_owned();
            expr = node(ExprKind::Member {
                base: Box::new(expr),
                field,
            });
        } else if input.starts_with('[') {
            punct(input, "[")?;
            let index = expression(input)?;
            punct(input, "]")?;
            expr = node(ExprKind::Index {
                base: Box::new(expr),
                index: Box::new(index),
            });
        } else if input.starts_with("++") || input.starts_with("--") {
            let op = if input.starts_with("++") {
                UnaryOp::PostInc
            } else {
                UnaryOp::PostDec
            };
            take(2usize).void().parse_next(input)?;
            expr = node(ExprKind::Unary {
                op,
                operand: Box::new(expr),
            });
        } else {
            *input = checkpoint;
            return Ok(expr);
        }
    }
}

fn primary(input: &mut &str) -> ModalResult<Expr> {
    ws(input)?;
    if input.starts_with('(') {
        punct(input, "(")?;
        let inner = expression(input)?;
        punct(input, ")")?;
        return Ok(node(ExprKind::Paren(Box::new(inner))));
    }
    if input.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return number(input).map(node);
    }
    if peek_keyword(input, "true") {
        keyword(input, "true")?;
        return Ok(node(ExprKind::BoolLit(true)));
    }
    if peek_keyword(input, "false") {
        keyword(input, "false")?;
        return Ok(node(ExprKind::BoolLit(false)));
    }

    let checkpoint = *input;
    let name = word(input)?;
    if peek_punct(input, "(")? {
        if RESERVED.contains(&name) {
            *input = checkpoint;
            return backtrack();
        }
        let callee = name.to_owned();
        punct(input, "(")?;
        ws(input)?;
        let args: Vec<Expr> = if input.starts_with(')') || peek_keyword(input, "void") {
            if peek_keyword(input, "void") {
                keyword(input, "void")?;
            }
            Vec::new()
        } else {
            separated(1.., assignment, (ws, ',')).parse_next(input)?
        };
        punct(input, ")")?;
        return Ok(node(ExprKind::Call { callee, args }));
    }
    if RESERVED.contains(&name) || Type::from_keyword(name).is_some() {
        *input = checkpoint;
        return backtrack();
    }
    Ok(node(ExprKind::Var(name.to_owned())))
}

fn exponent<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)
        .take()
        .parse_next(input)
}

fn number(input: &mut &str) -> ModalResult<ExprKind> {
    let text: &str = alt((
        (digit1, '.', digit0, opt(exponent)).take(),
        ('.', digit1, opt(exponent)).take(),
        (digit1, exponent).take(),
        digit1,
    ))
    .parse_next(input)?;
    if text.contains(['.', 'e', 'E']) {
        match text.parse::<f64>() {
            Ok(value) => Ok(ExprKind::FloatLit(value)),
            Err(_) => backtrack(),
        }
    } else {
        match text.parse::<i64>() {
            Ok(value) => Ok(ExprKind::IntLit(value)),
            Err(_) => backtrack(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_expr(source: &str) -> Expr {
        let mut input = source;
        let expr = expression(&mut input).unwrap();
        ws(&mut input).unwrap();
        assert!(input.is_empty(), "trailing input: {input:?}");
        expr
    }

    #[test]
    fn test_version_directive() {
        let unit = parse("#version 300 es\nvoid main() { }").unwrap();
        assert_eq!(unit.version, ShadingLanguageVersion::Essl300);
        let unit = parse("void main() { }").unwrap();
        assert_eq!(unit.version, ShadingLanguageVersion::Essl100);
    }

    #[test]
    fn test_unknown_version_is_rejected() {
        assert!(parse("#version 999\nvoid main() { }").is_err());
    }

    #[test]
    fn test_other_directives_are_rejected() {
        let err = parse("#define X 1\nvoid main() { }").unwrap_err();
        assert_eq!(err.message, "unsupported preprocessor directive");
        assert_eq!((err.line, err.column), (1, 1));
    }

    #[test]
    fn test_binary_precedence() {
        let expr = parse_expr("a + b * c");
        let ExprKind::Binary { op, rhs, .. } = &expr.kind else {
            panic!("expected binary, got {expr:?}");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            rhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn test_left_associativity() {
        let expr = parse_expr("a - b - c");
        let ExprKind::Binary { lhs, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert!(matches!(
            lhs.kind,
            ExprKind::Binary {
                op: BinaryOp::Sub,
                ..
            }
        ));
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let expr = parse_expr("a = b += 1");
        let ExprKind::Assign { op, value, .. } = &expr.kind else {
            panic!("expected assignment");
        };
        assert_eq!(*op, AssignOp::Assign);
        assert!(matches!(
            value.kind,
            ExprKind::Assign {
                op: AssignOp::Add,
                ..
            }
        ));
    }

    #[test]
    fn test_postfix_chain() {
        let expr = parse_expr("s.v[1].x");
        assert!(matches!(expr.kind, ExprKind::Member { ref field, .. } if field == "x"));
    }

    #[test]
    fn test_literals() {
        assert_eq!(parse_expr("42").kind, ExprKind::IntLit(42));
        assert_eq!(parse_expr("1.5").kind, ExprKind::FloatLit(1.5));
        assert_eq!(parse_expr("2.").kind, ExprKind::FloatLit(2.0));
        assert_eq!(parse_expr(".25").kind, ExprKind::FloatLit(0.25));
        assert_eq!(parse_expr("1e2").kind, ExprKind::FloatLit(100.0));
        assert_eq!(parse_expr("true").kind, ExprKind::BoolLit(true));
    }

    #[test]
    fn test_constructor_call() {
        let expr = parse_expr("vec4(1.0, x, 0.0, 1.0)");
        let (callee, args) = expr.as_call().unwrap();
        assert_eq!(callee, "vec4");
        assert_eq!(args.len(), 4);
    }

    #[test]
    fn test_declaration_versus_expression_statement() {
        let unit =
            parse("struct S { float f; }; void main() { S s = S(1.0); s.f = 2.0; }").unwrap();
        let main = unit.find_function("main").unwrap();
        assert!(matches!(main.body.stmts[0].kind, StmtKind::Decl(_)));
        assert!(matches!(main.body.stmts[1].kind, StmtKind::Expr(_)));
    }

    #[test]
    fn test_switch_cases() {
        let unit = parse(
            "#version 300 es\nvoid main() { switch (1) { case 0: case -1: break; default: ; } }",
        )
        .unwrap();
        let main = unit.find_function("main").unwrap();
        let StmtKind::Switch { cases, .. } = &main.body.stmts[0].kind else {
            panic!("expected switch");
        };
        let labels: Vec<_> = cases.iter().map(|case| case.label).collect();
        assert_eq!(
            labels,
            vec![CaseLabel::Case(0), CaseLabel::Case(-1), CaseLabel::Default]
        );
        assert!(cases[0].body.is_empty());
    }

    #[test]
    fn test_comments_are_skipped() {
        let unit = parse("// leading\nvoid main() { /* inner */ }").unwrap();
        assert_eq!(unit.functions().count(), 1);
    }

    #[test]
    fn test_error_position() {
        let err = parse("void main() {\n    int x = ;\n}").unwrap_err();
        assert!(err.line <= 2);
        assert!(!err.message.is_empty());
    }
}
