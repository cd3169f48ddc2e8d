//! Scope Resolution Pass (Pass 1) - bind every name to its declaration.
//!
//! This pass walks the program once, maintaining a stack of frames, and
//! records in [`Bindings`] what each identifier, call, qualified call and
//! instantiation refers to. It also assigns every declaration its frame
//! offset and builds the virtual table of every class.
//!
//! ## Responsibilities
//!
//! - Offsets: declarations -2, -3, ... and parameters 1, 2, ... per frame
//! - Classes: inherit the superclass's virtual table, place new fields below
//!   the inherited ones and new methods after them, reuse slots on override
//! - Uses: innermost-first lookup, recording the use-site nesting level
//! - The class hierarchy consumed by the subtype lattice
//!
//! ## Class resolution
//!
//! ```text
//! headers  for each class: virtual table, class type, class entry
//!    │
//!    ▼
//! bodies   for each class: frame seeded with the virtual table,
//!          every method body resolved inside it
//!    │
//!    ▼
//! decls + body of the program
//! ```
//!
//! Because every header is built before any method body is visited, a method
//! may call a sibling method declared after it and may instantiate any class
//! of the program.
//!
//! Errors are accumulated; an unresolved node simply gets no annotation.

use foolc_ast::{
    ClassDecl, Decl, Expr, FunDecl, Ident, MethodDecl, NodeId, Param, Program, TypeExpr, VarDecl,
};
use foolc_core::{ArrowType, BindingError, ClassType, SymbolKind, Type};
use rustc_hash::FxHashSet;

use crate::binding::{
    BindingEntry, Bindings, ClassBinding, ClassRecord, Frame, MethodCallBinding, MethodSlot, Use,
};
use crate::hierarchy::ClassHierarchy;
use crate::scope::ScopeStack;
use crate::type_resolver::{TypeResolver, lower};

/// Output of the scope resolution pass.
#[derive(Debug, Default)]
pub struct ResolveOutput {
    /// Annotations consumed by the later passes.
    pub bindings: Bindings,
    /// Superclass relation of the program's classes.
    pub hierarchy: ClassHierarchy,
    /// Collected errors.
    pub errors: Vec<BindingError>,
}

impl ResolveOutput {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Pass 1: resolve scopes and bindings.
pub struct ScopeResolver {
    scopes: ScopeStack,
    bindings: Bindings,
    hierarchy: ClassHierarchy,
    class_names: FxHashSet<String>,
    errors: Vec<BindingError>,
}

impl Default for ScopeResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeResolver {
    /// Create a new scope resolver.
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            bindings: Bindings::new(),
            hierarchy: ClassHierarchy::new(),
            class_names: FxHashSet::default(),
            errors: Vec::new(),
        }
    }

    /// Run the pass over a whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'_>) -> ResolveOutput {
        tracing::debug!(
            classes = program.classes.len(),
            decls = program.decls.len(),
            "scope resolution start"
        );

        self.class_names = program
            .classes
            .iter()
            .map(|class| class.name.name.to_string())
            .collect();

        self.scopes.push_frame();

        let tables: Vec<Frame> = program
            .classes
            .iter()
            .map(|class| self.visit_class_header(class))
            .collect();
        for (class, table) in program.classes.iter().zip(tables) {
            self.visit_class_body(class, table);
        }

        for decl in program.decls {
            self.visit_decl(decl);
        }
        self.visit_expr(program.body);

        self.scopes.pop_frame();

        tracing::debug!(
            entries = self.bindings.entry_count(),
            uses = self.bindings.use_count(),
            errors = self.errors.len(),
            "scope resolution done"
        );

        ResolveOutput {
            bindings: self.bindings,
            hierarchy: self.hierarchy,
            errors: self.errors,
        }
    }

    // ==========================================================================
    // Helpers
    // ==========================================================================

    fn error(&mut self, error: BindingError) {
        tracing::trace!(%error, "binding error");
        self.errors.push(error);
    }

    /// Lower an annotation, reporting undeclared class names.
    fn resolve_type(&mut self, ty: &TypeExpr<'_>) -> Type {
        match TypeResolver::new(&self.class_names).resolve(ty) {
            Ok(resolved) => resolved,
            Err(error) => {
                self.error(error);
                lower(ty)
            }
        }
    }

    fn resolve_arrow(&mut self, params: &[Param<'_>], ret: &TypeExpr<'_>) -> ArrowType {
        let params = params.iter().map(|p| self.resolve_type(&p.ty)).collect();
        ArrowType::new(params, self.resolve_type(ret))
    }

    /// Create an entry at the current level and bind it in the current frame.
    fn declare(&mut self, node: NodeId, name: Ident<'_>, kind: SymbolKind, ty: Type, offset: i32) {
        let entry = BindingEntry::new(self.scopes.nesting_level(), ty, offset);
        tracing::trace!(name = name.name, %kind, level = entry.nesting_level, offset, "declare");

        let id = self.bindings.add_entry(entry);
        self.bindings.record_declaration(node, id);
        if !self.scopes.declare(name.name, id) {
            self.error(BindingError::DuplicateDeclaration {
                kind,
                name: name.name.to_string(),
                span: name.span,
            });
        }
    }

    /// Look a name up and build the annotation for a use at the current level.
    fn lookup(&self, name: &str) -> Option<Use> {
        let found = self.scopes.lookup(name)?;
        tracing::trace!(name, declared_at = found.level, "lookup");
        Some(Use {
            entry: found.entry,
            nesting_level: self.scopes.nesting_level(),
        })
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn visit_decl(&mut self, decl: &Decl<'_>) {
        match decl {
            Decl::Var(var) => self.visit_var(var),
            Decl::Fun(fun) => self.visit_fun(fun),
        }
    }

    fn visit_var(&mut self, var: &VarDecl<'_>) {
        // The initializer cannot see the variable it initializes.
        self.visit_expr(var.init);
        let ty = self.resolve_type(&var.ty);
        let offset = self.scopes.next_decl_offset();
        self.declare(var.id, var.name, SymbolKind::Variable, ty, offset);
    }

    fn visit_fun(&mut self, fun: &FunDecl<'_>) {
        let arrow = self.resolve_arrow(fun.params, &fun.ret);
        let offset = self.scopes.next_decl_offset();
        // Bound before the body so the function can call itself.
        self.declare(fun.id, fun.name, SymbolKind::Function, Type::Arrow(arrow), offset);
        self.visit_callable(fun.params, fun.decls, fun.body);
    }

    /// Own frame, parameters, local declarations and body of a function or
    /// method.
    ///
    /// Parameter annotations were already checked when the callable's entry
    /// was built, so they are only lowered here.
    fn visit_callable(&mut self, params: &[Param<'_>], decls: &[Decl<'_>], body: &Expr<'_>) {
        self.scopes.push_frame();

        for param in params {
            let ty = lower(&param.ty);
            let offset = self.scopes.next_param_offset();
            self.declare(param.id, param.name, SymbolKind::Parameter, ty, offset);
        }
        for decl in decls {
            self.visit_decl(decl);
        }
        self.visit_expr(body);

        self.scopes.pop_frame();
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    /// Build the virtual table and class type of `class` and declare it.
    ///
    /// Returns the virtual table, which seeds the class body frame.
    fn visit_class_header(&mut self, class: &ClassDecl<'_>) -> Frame {
        let name = class.name.name;
        let class_level = self.scopes.nesting_level() + 1;
        let offset = self.scopes.next_decl_offset();

        let mut table = Frame::default();
        let mut class_type = ClassType::default();
        let mut superclass = None;

        if let Some(parent) = class.superclass {
            let inherited = self.bindings.class_record(parent.name).map(|record| {
                let parent_type = self
                    .bindings
                    .entry(record.entry)
                    .ty
                    .as_class()
                    .cloned()
                    .unwrap_or_default();
                (record.virtual_table.clone(), parent_type)
            });
            match inherited {
                Some((parent_table, parent_type)) => {
                    table = parent_table;
                    class_type = parent_type;
                    superclass = Some(parent.name.to_string());
                    self.hierarchy.set_superclass(name, parent.name);
                }
                None => self.error(BindingError::UnknownSuperclass {
                    class: name.to_string(),
                    superclass: parent.name.to_string(),
                    span: parent.span,
                }),
            }
        }

        if self.scopes.is_declared_locally(name) {
            self.error(BindingError::DuplicateDeclaration {
                kind: SymbolKind::Class,
                name: name.to_string(),
                span: class.name.span,
            });
        }

        self.visit_fields(class, class_level, &mut table, &mut class_type);
        self.visit_method_headers(class, class_level, &mut table, &mut class_type);

        tracing::trace!(
            class = name,
            fields = class_type.fields.len(),
            methods = class_type.methods.len(),
            "class layout"
        );

        let entry = BindingEntry::new(self.scopes.nesting_level(), Type::Class(class_type), offset);
        let id = self.bindings.add_entry(entry);
        self.bindings.record_declaration(class.id, id);
        self.scopes.declare(name, id);
        self.bindings.record_class(
            class.id,
            ClassBinding {
                entry: id,
                superclass,
            },
        );
        self.bindings.register_class(
            name,
            ClassRecord {
                entry: id,
                virtual_table: table.clone(),
            },
        );

        table
    }

    fn visit_fields(
        &mut self,
        class: &ClassDecl<'_>,
        class_level: u32,
        table: &mut Frame,
        class_type: &mut ClassType,
    ) {
        let class_name = class.name.name;
        let mut next_offset = -(class_type.fields.len() as i32) - 1;
        let mut seen = FxHashSet::default();

        for field in class.fields {
            let name = field.name.name;
            let ty = self.resolve_type(&field.ty);

            if !seen.insert(name) {
                self.error(BindingError::DuplicateMember {
                    kind: SymbolKind::Field,
                    class: class_name.to_string(),
                    name: name.to_string(),
                    span: field.name.span,
                });
                continue;
            }

            let inherited = table.get(name).map(|&id| self.bindings.entry(id).clone());
            let offset = match inherited {
                Some(existing) if existing.is_method() => {
                    self.error(BindingError::FieldOverridesMethod {
                        class: class_name.to_string(),
                        name: name.to_string(),
                        span: field.name.span,
                    });
                    continue;
                }
                Some(existing) => {
                    let position = (-existing.offset - 1) as usize;
                    if let Some(slot) = class_type.fields.get_mut(position) {
                        *slot = ty.clone();
                    }
                    existing.offset
                }
                None => {
                    class_type.fields.push(ty.clone());
                    let offset = next_offset;
                    next_offset -= 1;
                    offset
                }
            };

            let id = self
                .bindings
                .add_entry(BindingEntry::new(class_level, ty, offset));
            self.bindings.record_declaration(field.id, id);
            table.insert(name.to_string(), id);
        }
    }

    fn visit_method_headers(
        &mut self,
        class: &ClassDecl<'_>,
        class_level: u32,
        table: &mut Frame,
        class_type: &mut ClassType,
    ) {
        let class_name = class.name.name;
        let mut next_slot = class_type.methods.len() as u32;
        let mut seen = FxHashSet::default();

        for method in class.methods {
            let name = method.name.name;
            let arrow = self.resolve_arrow(method.params, &method.ret);

            if !seen.insert(name) {
                self.error(BindingError::DuplicateMember {
                    kind: SymbolKind::Method,
                    class: class_name.to_string(),
                    name: name.to_string(),
                    span: method.name.span,
                });
                continue;
            }

            let inherited = table.get(name).map(|&id| self.bindings.entry(id).clone());
            let slot = match inherited {
                Some(existing) if !existing.is_method() => {
                    self.error(BindingError::MethodOverridesField {
                        class: class_name.to_string(),
                        name: name.to_string(),
                        span: method.name.span,
                    });
                    continue;
                }
                Some(existing) => {
                    let slot = existing.offset as u32;
                    if let Some(inherited_arrow) = class_type.methods.get_mut(slot as usize) {
                        *inherited_arrow = arrow.clone();
                    }
                    MethodSlot {
                        slot,
                        overrides: true,
                    }
                }
                None => {
                    class_type.methods.push(arrow.clone());
                    let slot = next_slot;
                    next_slot += 1;
                    MethodSlot {
                        slot,
                        overrides: false,
                    }
                }
            };

            tracing::trace!(
                class = class_name,
                method = name,
                slot = slot.slot,
                overrides = slot.overrides,
                "method slot"
            );

            let entry = BindingEntry::new(class_level, Type::Method(arrow), slot.slot as i32);
            let id = self.bindings.add_entry(entry);
            self.bindings.record_declaration(method.id, id);
            self.bindings.record_method_slot(method.id, slot);
            table.insert(name.to_string(), id);
        }
    }

    /// Resolve every method body inside the class frame.
    fn visit_class_body(&mut self, class: &ClassDecl<'_>, table: Frame) {
        self.scopes.push_seeded(table);
        for method in class.methods {
            self.visit_method(method);
        }
        self.scopes.pop_frame();
    }

    fn visit_method(&mut self, method: &MethodDecl<'_>) {
        self.visit_callable(method.params, method.decls, method.body);
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn visit_expr(&mut self, expr: &Expr<'_>) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Ident(ident) => match self.lookup(ident.ident.name) {
                Some(resolved) => self.bindings.record_use(ident.id, resolved),
                None => self.error(BindingError::Undeclared {
                    kind: SymbolKind::Variable,
                    name: ident.ident.name.to_string(),
                    span: ident.span,
                }),
            },
            Expr::Binary(binary) => {
                self.visit_expr(binary.left);
                self.visit_expr(binary.right);
            }
            Expr::Not(not) => self.visit_expr(not.operand),
            Expr::If(if_expr) => {
                self.visit_expr(if_expr.condition);
                self.visit_expr(if_expr.then_expr);
                self.visit_expr(if_expr.else_expr);
            }
            Expr::Print(print) => self.visit_expr(print.expr),
            Expr::Call(call) => {
                match self.lookup(call.callee.name) {
                    Some(resolved) => self.bindings.record_use(call.id, resolved),
                    None => self.error(BindingError::Undeclared {
                        kind: SymbolKind::Function,
                        name: call.callee.name.to_string(),
                        span: call.callee.span,
                    }),
                }
                self.visit_args(call.args);
            }
            Expr::MethodCall(call) => {
                self.visit_method_call(call.id, call.receiver, call.method);
                self.visit_args(call.args);
            }
            Expr::New(new) => {
                match self.bindings.class_record(new.class.name) {
                    Some(record) => {
                        let resolved = Use {
                            entry: record.entry,
                            nesting_level: self.scopes.nesting_level(),
                        };
                        self.bindings.record_use(new.id, resolved);
                    }
                    None => self.error(BindingError::UnknownClass {
                        name: new.class.name.to_string(),
                        span: new.class.span,
                    }),
                }
                self.visit_args(new.args);
            }
        }
    }

    fn visit_args(&mut self, args: &[Expr<'_>]) {
        for arg in args {
            self.visit_expr(arg);
        }
    }

    fn visit_method_call(&mut self, node: NodeId, receiver: Ident<'_>, method: Ident<'_>) {
        let Some(resolved) = self.lookup(receiver.name) else {
            self.error(BindingError::Undeclared {
                kind: SymbolKind::Variable,
                name: receiver.name.to_string(),
                span: receiver.span,
            });
            return;
        };

        let receiver_type = &self.bindings.entry(resolved.entry).ty;
        let Some(class) = receiver_type.class_name().map(str::to_string) else {
            self.error(BindingError::NotAReference {
                name: receiver.name.to_string(),
                span: receiver.span,
            });
            return;
        };

        // A reference to an undeclared class was already reported at its
        // annotation.
        let Some(record) = self.bindings.class_record(&class) else {
            return;
        };

        match record.virtual_table.get(method.name).copied() {
            Some(method_entry) => self.bindings.record_method_call(
                node,
                MethodCallBinding {
                    receiver: resolved,
                    method: method_entry,
                },
            ),
            None => self.error(BindingError::UnknownMethod {
                class,
                method: method.name.to_string(),
                span: method.span,
            }),
        }
    }
}
