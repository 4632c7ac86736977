//! Structural-invariant checker for translation units.
//!
//! [`validate`] is the same check a freshly parsed unit must pass: names
//! resolve to declarations visible at the point of use, expressions are
//! well typed, and every function and statement is syntactically complete. On
//! success it returns the type of every expression, keyed by node id.

mod builtins;
mod expr;

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::ast::*;
use crate::version::ShadingLanguageVersion;

/// One violated invariant.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// The node the violation was found at, when there is one.
    pub node: Option<NodeId>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.node {
            Some(node) => write!(f, "{} (at {})", self.message, node),
            None => write!(f, "{}", self.message),
        }
    }
}

impl fmt::Debug for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Every violation found in a unit, in traversal order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidationErrors {
    pub errors: Vec<ValidationError>,
}

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [] => write!(f, "validation passed"),
            [only] => write!(f, "{only}"),
            errors => {
                write!(f, "{} validation errors found:", errors.len())?;
                for err in errors {
                    write!(f, "\n  - {err}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ValidationErrors {}

/// Expression types computed by a successful [`validate`].
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    types: HashMap<NodeId, Type>,
}

impl TypeTable {
    pub fn get(&self, id: NodeId) -> Option<&Type> {
        self.types.get(&id)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Check `unit` against every structural invariant for `version`.
pub fn validate(
    unit: &TranslationUnit,
    version: ShadingLanguageVersion,
) -> Result<TypeTable, ValidationErrors> {
    let mut checker = Checker::new(version);
    checker.check_unit(unit);
    if checker.errors.is_empty() {
        Ok(TypeTable {
            types: checker.types,
        })
    } else {
        Err(ValidationErrors {
            errors: checker.errors,
        })
    }
}

/// What a name in scope refers to.
#[derive(Clone, Debug)]
struct Binding {
    ty: Type,
    writable: bool,
}

struct Checker<'a> {
    version: ShadingLanguageVersion,
    structs: HashMap<&'a str, &'a StructDecl>,
    /// Functions whose definitions have been fully checked; a function is
    /// not visible inside its own body.
    functions: HashMap<&'a str, &'a FunctionDecl>,
    /// Innermost scope last. The first scope holds globals.
    scopes: Vec<HashMap<&'a str, Binding>>,
    top_level_names: HashSet<&'a str>,
    return_ty: Option<Type>,
    loop_depth: usize,
    switch_depth: usize,
    seen_ids: HashSet<NodeId>,
    types: HashMap<NodeId, Type>,
    errors: Vec<ValidationError>,
}

impl<'a> Checker<'a> {
    fn new(version: ShadingLanguageVersion) -> Self {
        let mut globals = HashMap::new();
        globals.insert(
            "gl_FragCoord",
            Binding {
                ty: Type::Vec(4),
                writable: false,
            },
        );
        if version.supports_gl_frag_color() {
            globals.insert(
                "gl_FragColor",
                Binding {
                    ty: Type::Vec(4),
                    writable: true,
                },
            );
        }
        Self {
            version,
            structs: HashMap::new(),
            functions: HashMap::new(),
            scopes: vec![globals],
            top_level_names: HashSet::new(),
            return_ty: None,
            loop_depth: 0,
            switch_depth: 0,
            seen_ids: HashSet::new(),
            types: HashMap::new(),
            errors: Vec::new(),
        }
    }

    fn error(&mut self, node: NodeId, message: impl Into<String>) {
        self.errors.push(ValidationError {
            message: message.into(),
            node: Some(node),
        });
    }

    fn note_id(&mut self, id: NodeId) {
        if !self.seen_ids.insert(id) {
            self.error(id, format!("node id {id} is used more than once"));
        }
    }

    fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    fn declare(&mut self, id: NodeId, name: &'a str, binding: Binding) {
        if name.starts_with("gl_") {
            self.error(
                id,
                format!("identifier '{name}' uses the reserved gl_ prefix"),
            );
            return;
        }
        let Some(scope) = self.scopes.last_mut() else {
            return;
        };
        if scope.insert(name, binding).is_some() {
            self.error(id, format!("'{name}' is already declared in this scope"));
        }
    }

    /// Resolve a declared type, reporting unknown structs.
    fn check_type(&mut self, id: NodeId, ty: &Type, allow_void: bool) -> bool {
        match ty {
            Type::Void if !allow_void => {
                self.error(id, "'void' is not a valid variable type");
                false
            }
            Type::Struct(name) if !self.structs.contains_key(name.as_str()) => {
                self.error(id, format!("unknown type '{name}'"));
                false
            }
            _ => true,
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn check_unit(&mut self, unit: &'a TranslationUnit) {
        for decl in &unit.decls {
            self.note_id(decl.id());
            match decl {
                Decl::Precision(decl) => {
                    if !matches!(decl.ty, Type::Float | Type::Int) {
                        self.error(
                            decl.id,
                            format!("precision cannot be set for '{}'", decl.ty),
                        );
                    }
                }
                Decl::Struct(decl) => self.check_struct(decl),
                Decl::Variable(var) => self.check_global(var),
                Decl::Function(function) => self.check_function(function),
            }
        }

        let mains: Vec<_> = unit.functions().filter(|f| f.name == "main").collect();
        match mains.as_slice() {
            [] => self.errors.push(ValidationError {
                message: "no 'main' function".to_owned(),
                node: None,
            }),
            [main] => {
                if main.return_ty != Type::Void || !main.params.is_empty() {
                    self.error(main.id, "'main' must be declared as 'void main()'");
                }
            }
            _ => {}
        }
    }

    fn claim_top_level_name(&mut self, id: NodeId, name: &'a str) -> bool {
        if !self.top_level_names.insert(name) {
            self.error(id, format!("'{name}' is already declared"));
            return false;
        }
        true
    }

    fn check_struct(&mut self, decl: &'a StructDecl) {
        if !self.claim_top_level_name(decl.id, &decl.name) {
            return;
        }
        if decl.fields.is_empty() {
            self.error(decl.id, format!("struct '{}' has no fields", decl.name));
        }
        let mut names = HashSet::new();
        for field in &decl.fields {
            self.note_id(field.id);
            self.check_type(field.id, &field.ty, false);
            if !names.insert(field.name.as_str()) {
                self.error(
                    field.id,
                    format!(
                        "struct '{}' has duplicate field '{}'",
                        decl.name, field.name
                    ),
                );
            }
        }
        self.structs.insert(&decl.name, decl);
    }

    fn check_global(&mut self, var: &'a VariableDecl) {
        if !self.claim_top_level_name(var.id, &var.name) {
            return;
        }
        match var.qualifier {
            Some(StorageQualifier::In | StorageQualifier::Out)
                if !self.version.supports_in_out_globals() =>
            {
                self.error(
                    var.id,
                    format!(
                        "global in/out variables are not supported in version {}",
                        self.version
                    ),
                );
            }
            Some(StorageQualifier::Uniform | StorageQualifier::In) if var.init.is_some() => {
                self.error(var.id, format!("'{}' cannot have an initializer", var.name));
            }
            _ => {}
        }
        self.check_var_decl(var);
    }

    /// Shared by globals and locals: type, initializer, then the binding.
    fn check_var_decl(&mut self, var: &'a VariableDecl) {
        let type_ok = self.check_type(var.id, &var.ty, false);
        if var.qualifier == Some(StorageQualifier::Const) && var.init.is_none() {
            self.error(
                var.id,
                format!("const variable '{}' needs an initializer", var.name),
            );
        }
        if let Some(init) = &var.init
            && let Some(init_ty) = self.type_of(init)
            && type_ok
            && init_ty != var.ty
        {
            self.error(
                init.id,
                format!(
                    "cannot initialize '{}' of type '{}' with a value of type '{}'",
                    var.name, var.ty, init_ty
                ),
            );
        }
        let writable = !matches!(
            var.qualifier,
            Some(StorageQualifier::Const | StorageQualifier::Uniform | StorageQualifier::In)
        );
        self.declare(
            var.id,
            &var.name,
            Binding {
                ty: var.ty.clone(),
                writable,
            },
        );
    }

    fn check_function(&mut self, function: &'a FunctionDecl) {
        let name_ok = self.claim_top_level_name(function.id, &function.name);
        if function.name.starts_with("gl_") {
            self.error(
                function.id,
                "function names may not use the reserved gl_ prefix",
            );
        }
        self.check_type(function.id, &function.return_ty, true);

        self.push_scope();
        for param in &function.params {
            self.note_id(param.id);
            self.check_type(param.id, &param.ty, false);
            self.declare(
                param.id,
                &param.name,
                Binding {
                    ty: param.ty.clone(),
                    writable: true,
                },
            );
        }
        self.return_ty = Some(function.return_ty.clone());
        self.note_id(function.body.id);
        if function.body.stmts.is_empty() {
            self.error(
                function.id,
                format!("function '{}' has an empty body", function.name),
            );
        }
        for stmt in &function.body.stmts {
            self.check_stmt(stmt);
        }
        if function.return_ty != Type::Void && !block_contains_return(&function.body) {
            self.error(
                function.id,
                format!(
                    "non-void function '{}' has no return statement",
                    function.name
                ),
            );
        }
        self.return_ty = None;
        self.pop_scope();

        if name_ok {
            self.functions.insert(&function.name, function);
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn check_block_in_current_scope(&mut self, block: &'a Block) {
        self.note_id(block.id);
        for stmt in &block.stmts {
            self.check_stmt(stmt);
        }
    }

    /// A loop or branch body; blocks open their own scope unless `shared`.
    fn check_body(&mut self, body: &'a Stmt, shared: bool) {
        match &body.kind {
            StmtKind::Block(block) if shared => {
                self.note_id(body.id);
                self.check_block_in_current_scope(block);
            }
            _ => {
                self.push_scope();
                self.check_stmt(body);
                self.pop_scope();
            }
        }
    }

    fn check_condition(&mut self, cond: &'a Expr, what: &str) {
        if let Some(ty) = self.type_of(cond)
            && ty != Type::Bool
        {
            self.error(
                cond.id,
                format!("{what} condition must be 'bool', found '{ty}'"),
            );
        }
    }

    fn check_stmt(&mut self, stmt: &'a Stmt) {
        self.note_id(stmt.id);
        match &stmt.kind {
            StmtKind::Decl(var) => {
                self.note_id(var.id);
                if matches!(
                    var.qualifier,
                    Some(StorageQualifier::Uniform | StorageQualifier::In | StorageQualifier::Out)
                ) {
                    self.error(var.id, "local variables may only be qualified with 'const'");
                }
                self.check_var_decl(var);
            }
            StmtKind::Expr(expr) => {
                self.type_of(expr);
            }
            StmtKind::Block(block) => {
                self.push_scope();
                self.check_block_in_current_scope(block);
                self.pop_scope();
            }
            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.check_condition(cond, "if");
                self.check_body(then_branch, false);
                if let Some(else_branch) = else_branch {
                    self.check_body(else_branch, false);
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                self.push_scope();
                if let Some(init) = init {
                    match &init.kind {
                        StmtKind::Decl(_) | StmtKind::Expr(_) => self.check_stmt(init),
                        _ => self.error(init.id, "invalid for-loop initializer"),
                    }
                }
                if let Some(cond) = cond {
                    self.check_condition(cond, "loop");
                }
                if let Some(step) = step {
                    self.type_of(step);
                }
                self.loop_depth += 1;
                self.check_body(body, true);
                self.loop_depth -= 1;
                self.pop_scope();
            }
            StmtKind::While { cond, body } => {
                self.check_condition(cond, "loop");
                self.loop_depth += 1;
                self.check_body(body, false);
                self.loop_depth -= 1;
            }
            StmtKind::Switch { selector, cases } => self.check_switch(stmt.id, selector, cases),
            StmtKind::Return(value) => self.check_return(stmt.id, value.as_ref()),
            StmtKind::Break => {
                if self.loop_depth == 0 && self.switch_depth == 0 {
                    self.error(stmt.id, "'break' outside of a loop or switch");
                }
            }
            StmtKind::Continue => {
                if self.loop_depth == 0 {
                    self.error(stmt.id, "'continue' outside of a loop");
                }
            }
            StmtKind::Discard | StmtKind::Empty => {}
        }
    }

    fn check_switch(&mut self, id: NodeId, selector: &'a Expr, cases: &'a [SwitchCase]) {
        if !self.version.supports_switch() {
            self.error(
                id,
                format!("'switch' is not supported in version {}", self.version),
            );
        }
        if let Some(ty) = self.type_of(selector)
            && ty != Type::Int
        {
            self.error(
                selector.id,
                format!("switch selector must be 'int', found '{ty}'"),
            );
        }
        if cases.is_empty() {
            self.error(id, "'switch' has no case labels");
        }
        let mut labels = HashSet::new();
        // Enclosing loops stay visible to `continue`, so only the switch depth changes.
        self.switch_depth += 1;
        self.push_scope();
        for case in cases {
            self.note_id(case.id);
            if !labels.insert(case.label) {
                let label = match case.label {
                    CaseLabel::Case(value) => format!("case {value}"),
                    CaseLabel::Default => "default".to_owned(),
                };
                self.error(case.id, format!("duplicate '{label}' label in switch"));
            }
            for stmt in &case.body {
                self.check_stmt(stmt);
            }
        }
        self.pop_scope();
        self.switch_depth -= 1;
    }

    fn check_return(&mut self, id: NodeId, value: Option<&'a Expr>) {
        let Some(expected) = self.return_ty.clone() else {
            self.error(id, "'return' outside of a function");
            return;
        };
        match value {
            None if expected != Type::Void => {
                self.error(
                    id,
                    format!("function returning '{expected}' must return a value"),
                );
            }
            None => {}
            Some(value) => {
                let Some(actual) = self.type_of(value) else {
                    return;
                };
                if expected == Type::Void {
                    self.error(id, "void function cannot return a value");
                } else if actual != expected {
                    self.error(
                        value.id,
                        format!("returning '{actual}' from a function returning '{expected}'"),
                    );
                }
            }
        }
    }
}

/// Whether a `return` statement occurs anywhere in the block.
pub fn block_contains_return(block: &Block) -> bool {
    block.stmts.iter().any(stmt_contains_return)
}

/// Whether `stmt` is or contains a `return` statement.
pub fn stmt_contains_return(stmt: &Stmt) -> bool {
    use crate::visit::{Visitor, walk_stmt};

    struct Finder(bool);
    impl<'ast> Visitor<'ast> for Finder {
        fn visit_stmt(&mut self, stmt: &'ast Stmt) {
            if matches!(stmt.kind, StmtKind::Return(_)) {
                self.0 = true;
            } else if !self.0 {
                walk_stmt(self, stmt);
            }
        }
        fn visit_expr(&mut self, _expr: &'ast Expr) {}
    }

    let mut finder = Finder(false);
    finder.visit_stmt(stmt);
    finder.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    fn check(source: &str) -> Result<TypeTable, ValidationErrors> {
        let unit = parse(source).unwrap();
        validate(&unit, unit.version)
    }

    fn errors(source: &str) -> Vec<String> {
        match check(source) {
            Ok(_) => Vec::new(),
            Err(errors) => errors.errors.into_iter().map(|e| e.message).collect(),
        }
    }

    #[test]
    fn test_valid_program_has_types() {
        let source = "precision mediump float;\nuniform vec2 resolution;\n\
            void main() { vec2 uv = gl_FragCoord.xy / resolution; \
            gl_FragColor = vec4(uv, 0.0, 1.0); }";
        let table = check(source).unwrap();
        assert!(!table.is_empty());
    }

    #[test]
    fn test_expression_types_are_recorded() {
        let unit = parse("void main() { float x = 1.0; gl_FragColor = vec4(x); }").unwrap();
        let table = validate(&unit, unit.version).unwrap();
        let main = unit.find_function("main").unwrap();
        let StmtKind::Expr(assign) = &main.body.stmts[1].kind else {
            panic!("expected expression statement");
        };
        assert_eq!(table.get(assign.id), Some(&Type::Vec(4)));
    }

    #[test]
    fn test_empty_main_is_rejected() {
        assert_eq!(
            errors("void main() { }"),
            vec!["function 'main' has an empty body"]
        );
    }

    #[test]
    fn test_missing_main() {
        assert_eq!(errors("void f() { return; }"), vec!["no 'main' function"]);
    }

    #[test]
    fn test_undeclared_variable() {
        assert_eq!(
            errors("void main() { x = 1; }"),
            vec!["undeclared identifier 'x'"]
        );
    }

    #[test]
    fn test_use_before_declaration_of_function() {
        let errs = errors("void main() { f(); }\nvoid f() { return; }");
        assert_eq!(errs, vec!["no function named 'f'"]);
    }

    #[test]
    fn test_recursion_is_rejected() {
        let errs = errors("int f(int x) { return f(x); }\nvoid main() { f(1); }");
        assert_eq!(errs, vec!["no function named 'f'"]);
    }

    #[test]
    fn test_block_scoping() {
        let errs = errors("void main() { { int x = 1; } x = 2; }");
        assert_eq!(errs, vec!["undeclared identifier 'x'"]);
    }

    #[test]
    fn test_for_init_scope() {
        assert!(check("void main() { for (int i = 0; i < 2; i++) { int j = i; } }").is_ok());
        let errs = errors("void main() { for (int i = 0; i < 2; i++) { int i = 1; } }");
        assert_eq!(errs, vec!["'i' is already declared in this scope"]);
    }

    #[test]
    fn test_type_mismatch() {
        let errs = errors("void main() { float x = 1; }");
        assert_eq!(
            errs,
            vec!["cannot initialize 'x' of type 'float' with a value of type 'int'"]
        );
    }

    #[test]
    fn test_non_void_function_needs_return() {
        let errs = errors("float f() { float x = 1.0; }\nvoid main() { f(); }");
        assert_eq!(errs, vec!["non-void function 'f' has no return statement"]);
    }

    #[test]
    fn test_break_outside_loop() {
        assert_eq!(
            errors("void main() { break; }"),
            vec!["'break' outside of a loop or switch"]
        );
    }

    #[test]
    fn test_switch_requires_version() {
        let errs = errors("void main() { switch (1) { default: break; } }");
        assert_eq!(errs, vec!["'switch' is not supported in version 100"]);
        let source = "#version 300 es\nout vec4 c;\n\
            void main() { switch (1) { case 0: c = vec4(1.0); break; default: break; } }";
        assert!(check(source).is_ok());
    }

    #[test]
    fn test_duplicate_case_labels() {
        let errs = errors(
            "#version 300 es\nvoid main() { switch (1) { case 0: break; case 0: break; } }",
        );
        assert_eq!(errs, vec!["duplicate 'case 0' label in switch"]);
    }

    #[test]
    fn test_gl_frag_color_gated_by_version() {
        let errs = errors("#version 300 es\nvoid main() { gl_FragColor = vec4(1.0); }");
        assert_eq!(errs, vec!["undeclared identifier 'gl_FragColor'"]);
    }

    #[test]
    fn test_struct_constructor_and_field() {
        let source = "struct S { float a; int b; };\n\
            void main() { S s = S(1.0, 2); float x = s.a; }";
        assert!(check(source).is_ok());
        let errs = errors("struct S { float a; };\nvoid main() { S s = S(1.0); int x = s.c; }");
        assert_eq!(errs, vec!["struct 'S' has no field 'c'"]);
    }

    #[test]
    fn test_swizzles() {
        assert!(check("void main() { vec4 v = vec4(1.0); vec2 w = v.zx; v.xy = w; }").is_ok());
        let errs = errors("void main() { vec2 v = vec2(1.0); float z = v.z; }");
        assert_eq!(errs, vec!["invalid swizzle 'z' on 'vec2'"]);
        let errs = errors("void main() { vec2 v = vec2(1.0); v.xx = vec2(0.0); }");
        assert_eq!(errs, vec!["expression is not assignable"]);
    }

    #[test]
    fn test_uniform_is_read_only() {
        let errs = errors("uniform float t;\nvoid main() { t = 1.0; }");
        assert_eq!(errs, vec!["expression is not assignable"]);
    }

    #[test]
    fn test_markers_are_typed() {
        let source = "void main() { if (_GLF_DEAD(false)) { discard; } \
            float x = _GLF_IDENTITY(1.0, 1.0 * 1.0); }";
        assert!(check(source).is_ok());
        let errs = errors("void main() { if (_GLF_DEAD(1)) { discard; } }");
        assert_eq!(
            errs,
            vec!["'_GLF_DEAD' expects an argument of type 'bool', found 'int'"]
        );
    }

    #[test]
    fn test_duplicate_node_ids_are_rejected() {
        let mut unit = parse("void main() { float x = 1.0; x = 2.0; }").unwrap();
        let Decl::Function(main) = &mut unit.decls[0] else {
            panic!("expected function");
        };
        let first = main.body.stmts[0].id;
        main.body.stmts[1].id = first;
        let err = validate(&unit, unit.version).unwrap_err();
        assert!(err.iter().any(|e| e.message.contains("used more than once")));
    }

    #[test]
    fn test_errors_display() {
        let err = check("void main() { }").unwrap_err();
        let node = err.errors[0].node.unwrap();
        assert_eq!(
            err.to_string(),
            format!("function 'main' has an empty body (at {node})")
        );
    }
}
