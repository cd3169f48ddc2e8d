//! Type Checking Pass (Pass 2) - compute and check the type of every expression.
//!
//! This pass reads the annotations left by scope resolution and never looks
//! at scopes itself. It computes a type for every expression, records the
//! type of identifier uses, calls and instantiations, and checks every
//! declaration against its annotation.
//!
//! ## Error recovery
//!
//! A failing declaration is reported and skipped; the remaining declarations
//! of the same scope and the body are still checked. A node that scope
//! resolution left unresolved makes its subtree *incomplete*: the subtree is
//! abandoned without a diagnostic, since the binding error was already
//! reported.

use foolc_ast::{
    BinaryExpr, BinaryOp, ClassDecl, Decl, Expr, FunDecl, LiteralKind, MethodDecl, NodeId, Program,
    VarDecl,
};
use foolc_core::{Span, SymbolKind, Type, TypeError};
use rustc_hash::FxHashMap;

use crate::binding::{BindingEntry, Bindings, Use};
use crate::hierarchy::ClassHierarchy;
use crate::lattice::SubtypeLattice;
use crate::type_resolver::lower;

/// Output of the type checking pass.
#[derive(Debug, Default)]
pub struct TypeCheckOutput {
    /// Type of the program body, if it could be computed.
    pub program_type: Option<Type>,
    /// Types of identifier uses, calls, qualified calls and instantiations.
    pub types: FxHashMap<NodeId, Type>,
    /// Collected errors.
    pub errors: Vec<TypeError>,
}

impl TypeCheckOutput {
    pub fn type_of(&self, node: NodeId) -> Option<&Type> {
        self.types.get(&node)
    }
}

/// Why checking a subtree stopped.
#[derive(Debug)]
enum CheckError {
    /// The subtree refers to something scope resolution could not resolve.
    Incomplete,
    Type(TypeError),
}

impl From<TypeError> for CheckError {
    fn from(error: TypeError) -> Self {
        CheckError::Type(error)
    }
}

type CheckResult<T> = Result<T, CheckError>;

/// Pass 2: type check a resolved program.
pub struct TypeChecker<'a> {
    bindings: &'a Bindings,
    lattice: SubtypeLattice<'a>,
    types: FxHashMap<NodeId, Type>,
    errors: Vec<TypeError>,
}

impl<'a> TypeChecker<'a> {
    /// Create a new type checker over the output of scope resolution.
    pub fn new(bindings: &'a Bindings, hierarchy: &'a ClassHierarchy) -> Self {
        Self {
            bindings,
            lattice: SubtypeLattice::new(hierarchy),
            types: FxHashMap::default(),
            errors: Vec::new(),
        }
    }

    /// Run the pass over a whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'_>) -> TypeCheckOutput {
        tracing::debug!("type checking start");

        for class in program.classes {
            self.check_class(class);
        }
        for decl in program.decls {
            let result = self.check_decl(decl);
            self.recover(result);
        }

        let program_type = match self.check_expr(program.body) {
            Ok(ty) => Some(ty),
            Err(error) => {
                self.recover(Err(error));
                None
            }
        };

        tracing::debug!(
            program_type = ?program_type,
            errors = self.errors.len(),
            "type checking done"
        );

        TypeCheckOutput {
            program_type,
            types: self.types,
            errors: self.errors,
        }
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    /// Record a failed subtree and carry on.
    fn recover(&mut self, result: CheckResult<()>) {
        match result {
            Ok(()) => {}
            Err(CheckError::Incomplete) => tracing::trace!("skipping incomplete subtree"),
            Err(CheckError::Type(error)) => {
                tracing::trace!(%error, "type error");
                self.errors.push(error);
            }
        }
    }

    fn is_subtype(&self, a: &Type, b: &Type) -> bool {
        self.lattice.is_subtype(a, b)
    }

    fn resolved(&self, node: NodeId) -> CheckResult<(Use, &'a BindingEntry)> {
        let bindings = self.bindings;
        let resolved = bindings.use_of(node).copied().ok_or(CheckError::Incomplete)?;
        let entry = bindings
            .get_entry(resolved.entry)
            .ok_or(CheckError::Incomplete)?;
        Ok((resolved, entry))
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn check_decl(&mut self, decl: &Decl<'_>) -> CheckResult<()> {
        match decl {
            Decl::Var(var) => self.check_var(var),
            Decl::Fun(fun) => self.check_fun(fun),
        }
    }

    fn check_var(&mut self, var: &VarDecl<'_>) -> CheckResult<()> {
        let found = self.check_expr(var.init)?;
        let expected = lower(&var.ty);
        if !self.is_subtype(&found, &expected) {
            return Err(TypeError::IncompatibleInitializer {
                name: var.name.name.to_string(),
                expected,
                found,
                span: var.span,
            }
            .into());
        }
        Ok(())
    }

    fn check_fun(&mut self, fun: &FunDecl<'_>) -> CheckResult<()> {
        for decl in fun.decls {
            let result = self.check_decl(decl);
            self.recover(result);
        }
        let found = self.check_expr(fun.body)?;
        let expected = lower(&fun.ret);
        if !self.is_subtype(&found, &expected) {
            return Err(TypeError::WrongReturnType {
                kind: SymbolKind::Function,
                name: fun.name.name.to_string(),
                expected,
                found,
                span: fun.span,
            }
            .into());
        }
        Ok(())
    }

    fn check_method(&mut self, method: &MethodDecl<'_>) -> CheckResult<()> {
        for decl in method.decls {
            let result = self.check_decl(decl);
            self.recover(result);
        }
        let found = self.check_expr(method.body)?;
        let expected = lower(&method.ret);
        if !self.is_subtype(&found, &expected) {
            return Err(TypeError::WrongReturnType {
                kind: SymbolKind::Method,
                name: method.name.name.to_string(),
                expected,
                found,
                span: method.span,
            }
            .into());
        }
        Ok(())
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    fn check_class(&mut self, class: &ClassDecl<'_>) {
        for method in class.methods {
            let result = self.check_method(method);
            self.recover(result);
        }
        self.check_overrides(class);
    }

    /// Every member sitting in an inherited position must be a subtype of the
    /// member it replaces.
    fn check_overrides(&mut self, class: &ClassDecl<'_>) {
        let bindings = self.bindings;
        let Some(binding) = bindings.class(class.id) else {
            return;
        };
        let Some(parent) = binding
            .superclass
            .as_deref()
            .and_then(|name| bindings.class_record(name))
            .and_then(|record| bindings.get_entry(record.entry))
            .and_then(|entry| entry.ty.as_class())
        else {
            return;
        };
        let Some(own) = bindings
            .get_entry(binding.entry)
            .and_then(|entry| entry.ty.as_class())
        else {
            return;
        };

        for field in class.fields {
            let Some(entry) = bindings
                .declaration(field.id)
                .and_then(|id| bindings.get_entry(id))
            else {
                continue;
            };
            let position = (-entry.offset - 1) as usize;
            if let (Some(new), Some(old)) = (own.fields.get(position), parent.fields.get(position))
            {
                if !self.is_subtype(new, old) {
                    self.errors.push(TypeError::IncompatibleFieldOverride {
                        class: class.name.name.to_string(),
                        field: field.name.name.to_string(),
                        span: field.span,
                    });
                }
            }
        }

        for method in class.methods {
            let Some(slot) = bindings.method_slot(method.id) else {
                continue;
            };
            let position = slot.slot as usize;
            if let (Some(new), Some(old)) =
                (own.methods.get(position), parent.methods.get(position))
            {
                if !self.lattice.is_subtype_arrow(new, old) {
                    self.errors.push(TypeError::IncompatibleMethodOverride {
                        class: class.name.name.to_string(),
                        method: method.name.name.to_string(),
                        span: method.span,
                    });
                }
            }
        }
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn check_expr(&mut self, expr: &Expr<'_>) -> CheckResult<Type> {
        let ty = self.compute(expr)?;
        if let Some(id) = expr.id() {
            self.types.insert(id, ty.clone());
        }
        Ok(ty)
    }

    fn compute(&mut self, expr: &Expr<'_>) -> CheckResult<Type> {
        match expr {
            Expr::Literal(literal) => Ok(match literal.kind {
                LiteralKind::Int(_) => Type::Int,
                LiteralKind::Bool(_) => Type::Bool,
                LiteralKind::Null => Type::Empty,
            }),

            Expr::Ident(ident) => {
                let (_, entry) = self.resolved(ident.id)?;
                let kind = match entry.ty {
                    Type::Arrow(_) => Some(SymbolKind::Function),
                    Type::Method(_) => Some(SymbolKind::Method),
                    Type::Class(_) => Some(SymbolKind::Class),
                    _ => None,
                };
                match kind {
                    Some(kind) => Err(TypeError::InvalidIdentifierUse {
                        kind,
                        name: ident.ident.name.to_string(),
                        span: ident.span,
                    }
                    .into()),
                    None => Ok(entry.ty.clone()),
                }
            }

            Expr::Binary(binary) => self.check_binary(binary),

            Expr::Not(not) => {
                let found = self.check_expr(not.operand)?;
                if !self.is_subtype(&found, &Type::Bool) {
                    return Err(TypeError::IncompatibleNegation {
                        found,
                        span: not.span,
                    }
                    .into());
                }
                Ok(Type::Bool)
            }

            Expr::If(if_expr) => {
                let condition = self.check_expr(if_expr.condition)?;
                if !self.is_subtype(&condition, &Type::Bool) {
                    return Err(TypeError::NonBooleanCondition {
                        found: condition,
                        span: if_expr.condition.span(),
                    }
                    .into());
                }
                let then_type = self.check_expr(if_expr.then_expr)?;
                let else_type = self.check_expr(if_expr.else_expr)?;
                match self.lattice.lowest_common_ancestor(&then_type, &else_type) {
                    Some(ty) => Ok(ty),
                    None => Err(TypeError::IncompatibleBranches {
                        then_type,
                        else_type,
                        span: if_expr.span,
                    }
                    .into()),
                }
            }

            Expr::Print(print) => self.check_expr(print.expr),

            Expr::Call(call) => {
                let (_, entry) = self.resolved(call.id)?;
                let Some(arrow) = entry.ty.as_arrow() else {
                    return Err(TypeError::NotCallable {
                        name: call.callee.name.to_string(),
                        span: call.span,
                    }
                    .into());
                };
                self.check_args(call.callee.name, &arrow.params, call.args, call.span)?;
                Ok((*arrow.ret).clone())
            }

            Expr::MethodCall(call) => {
                let bindings = self.bindings;
                let binding = bindings
                    .method_call(call.id)
                    .ok_or(CheckError::Incomplete)?;
                let entry = bindings
                    .get_entry(binding.method)
                    .ok_or(CheckError::Incomplete)?;
                let callee = format!("{}.{}", call.receiver.name, call.method.name);
                let Some(arrow) = entry.ty.as_arrow() else {
                    return Err(TypeError::NotCallable {
                        name: callee,
                        span: call.span,
                    }
                    .into());
                };
                self.check_args(&callee, &arrow.params, call.args, call.span)?;
                Ok((*arrow.ret).clone())
            }

            Expr::New(new) => {
                let (_, entry) = self.resolved(new.id)?;
                let Some(class) = entry.ty.as_class() else {
                    return Err(TypeError::NotAClass {
                        name: new.class.name.to_string(),
                        span: new.span,
                    }
                    .into());
                };
                self.check_args(new.class.name, &class.fields, new.args, new.span)?;
                Ok(Type::reference(new.class.name))
            }
        }
    }

    fn check_binary(&mut self, binary: &BinaryExpr<'_>) -> CheckResult<Type> {
        let left = self.check_expr(binary.left)?;
        let right = self.check_expr(binary.right)?;

        let (operand, result) = match binary.op {
            BinaryOp::Equal => {
                if left.is_callable() || right.is_callable() {
                    return Err(TypeError::FunctionComparison { span: binary.span }.into());
                }
                if self.is_subtype(&left, &right) || self.is_subtype(&right, &left) {
                    return Ok(Type::Bool);
                }
                return Err(self.incompatible(binary, left, right));
            }
            BinaryOp::LessEqual | BinaryOp::GreaterEqual => (Type::Int, Type::Bool),
            BinaryOp::And | BinaryOp::Or => (Type::Bool, Type::Bool),
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => (Type::Int, Type::Int),
        };

        if self.is_subtype(&left, &operand) && self.is_subtype(&right, &operand) {
            Ok(result)
        } else {
            Err(self.incompatible(binary, left, right))
        }
    }

    fn incompatible(&self, binary: &BinaryExpr<'_>, left: Type, right: Type) -> CheckError {
        TypeError::IncompatibleOperands {
            op: binary.op.as_str(),
            left,
            right,
            span: binary.span,
        }
        .into()
    }

    /// Arity first, then each argument against its parameter, left to right.
    fn check_args(
        &mut self,
        callee: &str,
        expected: &[Type],
        args: &[Expr<'_>],
        span: Span,
    ) -> CheckResult<()> {
        if expected.len() != args.len() {
            return Err(TypeError::ArgumentCount {
                callee: callee.to_string(),
                expected: expected.len(),
                found: args.len(),
                span,
            }
            .into());
        }
        for (position, (arg, param)) in args.iter().zip(expected).enumerate() {
            let found = self.check_expr(arg)?;
            if !self.is_subtype(&found, param) {
                return Err(TypeError::ArgumentType {
                    callee: callee.to_string(),
                    position: position + 1,
                    expected: param.clone(),
                    found,
                    span: arg.span(),
                }
                .into());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::ScopeResolver;
    use bumpalo::Bump;
    use foolc_ast::AstBuilder;

    fn check(program: &Program<'_>) -> TypeCheckOutput {
        let resolved = ScopeResolver::new().run(program);
        TypeChecker::new(&resolved.bindings, &resolved.hierarchy).run(program)
    }

    #[test]
    fn let_in_program_is_int() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.var("x", b.int_type(), b.int(5));
        let program = b.program(&[], &[x], b.add(b.name("x"), b.int(1)));

        let output = check(&program);
        assert!(output.errors.is_empty());
        assert_eq!(output.program_type, Some(Type::Int));
    }

    #[test]
    fn conditionals_take_common_ancestor() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.if_else(b.bool(true), b.bool(false), b.int(3)));
        assert_eq!(check(&program).program_type, Some(Type::Int));

        let program = b.program(&[], &[], b.if_else(b.int(1), b.int(2), b.int(3)));
        let output = check(&program);
        assert!(matches!(output.errors[..], [TypeError::NonBooleanCondition { .. }]));
        assert_eq!(output.program_type, None);
    }

    #[test]
    fn sibling_classes_meet_at_parent() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let shape = b.class("Shape", None, &[], &[]);
        let square = b.class("Square", Some("Shape"), &[], &[]);
        let circle = b.class("Circle", Some("Shape"), &[], &[]);
        let body = b.if_else(
            b.bool(true),
            b.new_object("Square", &[]),
            b.new_object("Circle", &[]),
        );
        let program = b.program(&[shape, square, circle], &[], body);

        let output = check(&program);
        assert!(output.errors.is_empty());
        assert_eq!(output.program_type, Some(Type::reference("Shape")));
    }

    #[test]
    fn null_fits_class_references() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let node = b.class("Node", None, &[b.field("v", b.int_type())], &[]);
        let empty = b.var("empty", b.class_type("Node"), b.null());
        let body = b.if_else(b.eq(b.name("empty"), b.null()), b.null(), b.name("empty"));
        let program = b.program(&[node], &[empty], body);

        let output = check(&program);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.program_type, Some(Type::reference("Node")));
    }

    #[test]
    fn operator_rules() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let cases = [
            (b.le(b.bool(true), b.int(1)), true),
            (b.and(b.int(1), b.bool(true)), false),
            (b.or(b.bool(false), b.bool(true)), true),
            (b.mul(b.bool(true), b.int(2)), true),
            (b.eq(b.bool(true), b.int(1)), true),
            (b.not(b.int(0)), false),
        ];
        for (expr, ok) in cases {
            let program = b.program(&[], &[], expr);
            let output = check(&program);
            assert_eq!(output.errors.is_empty(), ok, "{expr:?}: {:?}", output.errors);
        }
    }

    #[test]
    fn reference_and_int_do_not_compare() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let a = b.class("A", None, &[], &[]);
        let program = b.program(&[a], &[], b.eq(b.new_object("A", &[]), b.int(1)));
        let output = check(&program);
        match &output.errors[..] {
            [TypeError::IncompatibleOperands { op, .. }] => assert_eq!(*op, "=="),
            other => panic!("unexpected errors {other:?}"),
        }
    }

    #[test]
    fn call_errors() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let p = b.param("n", b.int_type());
        let f = b.fun("f", b.int_type(), &[p], &[], b.name("n"));
        let v = b.var("v", b.int_type(), b.int(1));

        let arity = b.var("a", b.int_type(), b.call("f", &[]));
        let arg = b.var("c", b.int_type(), b.call("f", &[b.new_object("K", &[])]));
        let value = b.var("d", b.int_type(), b.call("v", &[]));
        let program = b.program(&[], &[f, v, arity, arg, value], b.call("f", &[b.bool(true)]));

        let output = check(&program);
        // `K` is undeclared, so that argument is incomplete and silent.
        assert!(matches!(
            output.errors[..],
            [
                TypeError::ArgumentCount {
                    expected: 1,
                    found: 0,
                    ..
                },
                TypeError::NotCallable { .. }
            ]
        ));
        assert_eq!(output.program_type, Some(Type::Int));
    }

    #[test]
    fn function_names_are_not_values() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let f = b.fun("f", b.int_type(), &[], &[], b.int(0));
        let program = b.program(&[], &[f], b.name("f"));
        let output = check(&program);
        assert!(matches!(
            output.errors[..],
            [TypeError::InvalidIdentifierUse {
                kind: SymbolKind::Function,
                ..
            }]
        ));
    }

    #[test]
    fn declarations_are_checked_against_annotations() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let bad_var = b.var("x", b.bool_type(), b.int(1));
        let bad_fun = b.fun("f", b.bool_type(), &[], &[], b.int(1));
        let good = b.var("y", b.int_type(), b.bool(true));
        let program = b.program(&[], &[bad_var, bad_fun, good], b.name("y"));

        let output = check(&program);
        assert!(matches!(
            output.errors[..],
            [
                TypeError::IncompatibleInitializer { .. },
                TypeError::WrongReturnType {
                    kind: SymbolKind::Function,
                    ..
                }
            ]
        ));
        assert_eq!(output.program_type, Some(Type::Int));
    }

    #[test]
    fn nested_declarations_recover_independently() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let bad = b.var("x", b.bool_type(), b.int(1));
        let good = b.var("y", b.int_type(), b.int(1));
        let f = b.fun("f", b.int_type(), &[], &[bad, good], b.name("y"));
        let program = b.program(&[], &[f], b.call("f", &[]));

        let output = check(&program);
        assert_eq!(output.errors.len(), 1);
        assert_eq!(output.program_type, Some(Type::Int));
    }

    #[test]
    fn unresolved_names_are_silent() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.add(b.name("ghost"), b.bool(true)));
        let output = check(&program);
        assert!(output.errors.is_empty());
        assert_eq!(output.program_type, None);
    }

    #[test]
    fn constructors_check_field_types() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let point = b.class(
            "Point",
            None,
            &[b.field("x", b.int_type()), b.field("visible", b.bool_type())],
            &[],
        );
        let ok = b.var(
            "p",
            b.class_type("Point"),
            b.new_object("Point", &[b.int(1), b.bool(true)]),
        );
        let short = b.var("q", b.class_type("Point"), b.new_object("Point", &[b.int(1)]));
        let wrong = b.var("r", b.class_type("Point"), b.new_object("Point", &[b.int(1), b.int(2)]));
        let program = b.program(&[point], &[ok, short, wrong], b.int(0));

        let output = check(&program);
        assert!(matches!(
            output.errors[..],
            [
                TypeError::ArgumentCount { .. },
                TypeError::ArgumentType { position: 2, .. }
            ]
        ));
    }

    #[test]
    fn method_calls_return_declared_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let getter = b.method("get", b.bool_type(), &[], &[], b.name("flag"));
        let class = b.class("Flag", None, &[b.field("flag", b.bool_type())], &[getter]);
        let obj = b.var("f", b.class_type("Flag"), b.new_object("Flag", &[b.bool(true)]));
        let call = b.method_call("f", "get", &[]);
        let program = b.program(&[class], &[obj], call);

        let output = check(&program);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        assert_eq!(output.program_type, Some(Type::Bool));
        assert_eq!(output.type_of(call.id().unwrap()), Some(&Type::Bool));
    }

    #[test]
    fn overrides_must_be_subtypes() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let base = b.class(
            "Base",
            None,
            &[b.field("a", b.bool_type()), b.field("n", b.int_type())],
            &[
                b.method("m", b.int_type(), &[], &[], b.int(0)),
                b.method("k", b.bool_type(), &[], &[], b.bool(true)),
            ],
        );
        let derived = b.class(
            "Derived",
            Some("Base"),
            &[b.field("a", b.int_type()), b.field("n", b.bool_type())],
            &[
                b.method("m", b.bool_type(), &[], &[], b.bool(true)),
                b.method("k", b.int_type(), &[], &[], b.int(1)),
            ],
        );
        let program = b.program(&[base, derived], &[], b.int(0));

        let output = check(&program);
        let names: Vec<_> = output
            .errors
            .iter()
            .map(|e| match e {
                TypeError::IncompatibleFieldOverride { field, .. } => format!("field {field}"),
                TypeError::IncompatibleMethodOverride { method, .. } => format!("method {method}"),
                other => format!("{other}"),
            })
            .collect();
        // int overriding bool is rejected; bool overriding int is fine.
        assert_eq!(names, ["field a", "method k"]);
    }

    #[test]
    fn contravariant_override_is_accepted() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let animal = b.class("Animal", None, &[], &[]);
        let dog = b.class("Dog", Some("Animal"), &[], &[]);
        let p = b.param("d", b.class_type("Dog"));
        let handler = b.class(
            "Handler",
            None,
            &[],
            &[b.method("handle", b.class_type("Animal"), &[p], &[], b.name("d"))],
        );
        let q = b.param("a", b.class_type("Animal"));
        let special = b.class(
            "Special",
            Some("Handler"),
            &[],
            &[b.method("handle", b.class_type("Dog"), &[q], &[], b.null())],
        );
        let program = b.program(&[animal, dog, handler, special], &[], b.int(0));

        let output = check(&program);
        assert!(output.errors.is_empty(), "{:?}", output.errors);
    }
}
