//! Code Generation Pass (Pass 3) - translate a checked program to stack machine assembly.
//!
//! The generator trusts the analysis passes completely: it only reads the
//! bindings and never validates anything. It must only be run on programs
//! that resolved and type checked without errors.
//!
//! ## Runtime layout
//!
//! - The stack grows downwards from the top of memory, the heap upwards from 0.
//! - A frame holds, from `fp` upwards, the access link and the parameters;
//!   below `fp` the saved return address and then the local declarations.
//! - A function value is the address of its code. A method's access link is
//!   the object it was invoked on.
//! - An object is a pointer to a word holding its dispatch table address;
//!   fields sit below it, the first field at `-1`.
//! - Dispatch tables are laid out on the heap before the main program runs.

use foolc_ast::{BinaryExpr, BinaryOp, ClassDecl, Decl, Expr, LiteralKind, NodeId, Program};
use foolc_core::{CodegenError, Span};
use rustc_hash::FxHashMap;

use crate::binding::{BindingEntry, Bindings, Use};
use crate::bytecode::{Assembly, Instruction, Label};
use crate::emit::CodeEmitter;
use crate::hierarchy::ClassHierarchy;
use crate::options::CompilerOptions;

type Result<T> = std::result::Result<T, CodegenError>;

/// Pass 3: generate assembly for a checked program.
pub struct CodeGenerator<'a> {
    bindings: &'a Bindings,
    hierarchy: &'a ClassHierarchy,
    options: &'a CompilerOptions,
    emitter: CodeEmitter,
    /// Method labels of every generated class, by dispatch slot.
    dispatch_tables: FxHashMap<String, Vec<Label>>,
}

impl<'a> CodeGenerator<'a> {
    pub fn new(
        bindings: &'a Bindings,
        hierarchy: &'a ClassHierarchy,
        options: &'a CompilerOptions,
    ) -> Self {
        Self {
            bindings,
            hierarchy,
            options,
            emitter: CodeEmitter::new(),
            dispatch_tables: FxHashMap::default(),
        }
    }

    /// Generate the whole program.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(mut self, program: &Program<'_>) -> Result<Assembly> {
        tracing::debug!("code generation start");

        if program.has_declarations() {
            // Slot -1 of the global frame, where a function would keep its
            // return address.
            self.emitter.emit(Instruction::push(0));
            for class in program.classes {
                self.gen_class(class)?;
            }
            for decl in program.decls {
                self.gen_decl(decl)?;
            }
        }
        self.gen_expr(program.body)?;
        self.emitter.emit(Instruction::Halt);

        let assembly = self.emitter.finish();
        tracing::debug!(
            instructions = assembly.instruction_count(),
            classes = self.dispatch_tables.len(),
            "code generation done"
        );
        Ok(assembly)
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    fn resolved(&self, node: NodeId, name: &str, span: Span) -> Result<(Use, &'a BindingEntry)> {
        let bindings = self.bindings;
        bindings
            .use_of(node)
            .and_then(|resolved| Some((*resolved, bindings.get_entry(resolved.entry)?)))
            .ok_or_else(|| missing(name, span))
    }

    fn declared(&self, node: NodeId, name: &str, span: Span) -> Result<&'a BindingEntry> {
        let bindings = self.bindings;
        bindings
            .declaration(node)
            .and_then(|id| bindings.get_entry(id))
            .ok_or_else(|| missing(name, span))
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    fn gen_decl(&mut self, decl: &Decl<'_>) -> Result<()> {
        match decl {
            Decl::Var(var) => self.gen_expr(var.init),
            Decl::Fun(fun) => {
                let label = self.gen_callable(fun.params.len(), fun.decls, fun.body)?;
                self.emitter.emit(Instruction::push_label(label));
                Ok(())
            }
        }
    }

    /// Generate the block of a function or method and return its label.
    ///
    /// Entry: the caller has pushed its frame pointer, the arguments (last
    /// first) and the access link. Exit: all of that is gone and the result is
    /// on top of the stack.
    fn gen_callable(
        &mut self,
        param_count: usize,
        decls: &[Decl<'_>],
        body: &Expr<'_>,
    ) -> Result<Label> {
        self.emitter.begin_function();
        self.emitter.emit_all([Instruction::CopyFp, Instruction::LoadRa]);
        for decl in decls {
            self.gen_decl(decl)?;
        }
        let label = self.emitter.fresh_function_label();
        self.gen_expr(body)?;

        self.emitter.emit(Instruction::StoreTm);
        self.emitter.emit_repeated(Instruction::Pop, decls.len());
        self.emitter.emit_all([Instruction::StoreRa, Instruction::Pop]);
        self.emitter.emit_repeated(Instruction::Pop, param_count);
        self.emitter.emit_all([
            Instruction::StoreFp,
            Instruction::LoadTm,
            Instruction::LoadRa,
            Instruction::JumpSubroutine,
        ]);
        self.emitter.end_function(label);
        Ok(label)
    }

    // ==========================================================================
    // Classes
    // ==========================================================================

    /// Generate the methods of a class and lay its dispatch table out on the heap.
    fn gen_class(&mut self, class: &ClassDecl<'_>) -> Result<()> {
        let name = class.name.name;
        let mut table = match self.hierarchy.superclass(name) {
            Some(superclass) => self
                .dispatch_tables
                .get(superclass)
                .cloned()
                .ok_or_else(|| CodegenError::MissingDispatchTable {
                    class: superclass.to_string(),
                    span: class.span,
                })?,
            None => Vec::new(),
        };

        for method in class.methods {
            let slot = self
                .bindings
                .method_slot(method.id)
                .ok_or_else(|| missing(method.name.name, method.span))?
                .slot as usize;
            let label = self.gen_callable(method.params.len(), method.decls, method.body)?;
            match table.get_mut(slot) {
                Some(inherited) => *inherited = label,
                None => table.push(label),
            }
        }

        tracing::trace!(class = name, slots = table.len(), "dispatch table");

        self.emitter.emit(Instruction::LoadHp);
        for &label in &table {
            self.emitter.emit(Instruction::push_label(label));
            self.emitter.emit_all([Instruction::LoadHp, Instruction::StoreWord]);
            self.bump_heap_pointer();
        }
        self.dispatch_tables.entry(name.to_string()).or_insert(table);
        Ok(())
    }

    fn bump_heap_pointer(&mut self) {
        self.emitter.emit_all([
            Instruction::LoadHp,
            Instruction::push(1),
            Instruction::Add,
            Instruction::StoreHp,
        ]);
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    fn gen_expr(&mut self, expr: &Expr<'_>) -> Result<()> {
        match expr {
            Expr::Literal(literal) => {
                let value = match literal.kind {
                    LiteralKind::Int(n) => n,
                    LiteralKind::Bool(b) => i64::from(b),
                    LiteralKind::Null => -1,
                };
                self.emitter.emit(Instruction::push(value));
            }

            Expr::Ident(ident) => {
                let (resolved, entry) = self.resolved(ident.id, ident.ident.name, ident.span)?;
                self.load_frame(resolved.hops(entry));
                self.emitter.emit_all([
                    Instruction::push(entry.offset.into()),
                    Instruction::Add,
                    Instruction::LoadWord,
                ]);
            }

            Expr::Binary(binary) => self.gen_binary(binary)?,

            Expr::Not(not) => {
                self.gen_expr(not.operand)?;
                self.emitter.emit_all([
                    Instruction::push(-1),
                    Instruction::Mult,
                    Instruction::push(1),
                    Instruction::Add,
                ]);
            }

            Expr::If(if_expr) => {
                let then_label = self.emitter.fresh_label();
                let end_label = self.emitter.fresh_label();
                self.gen_expr(if_expr.condition)?;
                self.emitter
                    .emit_all([Instruction::push(1), Instruction::BranchEq(then_label)]);
                self.gen_expr(if_expr.else_expr)?;
                self.emitter.emit(Instruction::Branch(end_label));
                self.emitter.place_label(then_label);
                self.gen_expr(if_expr.then_expr)?;
                self.emitter.place_label(end_label);
            }

            Expr::Print(print) => {
                self.gen_expr(print.expr)?;
                self.emitter.emit(Instruction::Print);
            }

            Expr::Call(call) => {
                let (resolved, entry) = self.resolved(call.id, call.callee.name, call.span)?;
                self.emitter.emit(Instruction::LoadFp);
                self.gen_args(call.args)?;
                // Access link: the frame (or object) the callee was declared in.
                self.load_frame(resolved.hops(entry));
                self.emitter.emit_all([
                    Instruction::StoreTm,
                    Instruction::LoadTm,
                    Instruction::LoadTm,
                ]);
                if entry.is_method() {
                    self.emitter.emit(Instruction::LoadWord);
                }
                self.emitter.emit_all([
                    Instruction::push(entry.offset.into()),
                    Instruction::Add,
                    Instruction::LoadWord,
                    Instruction::JumpSubroutine,
                ]);
            }

            Expr::MethodCall(call) => {
                let bindings = self.bindings;
                let binding = bindings
                    .method_call(call.id)
                    .ok_or_else(|| missing(call.method.name, call.span))?;
                let receiver = bindings
                    .get_entry(binding.receiver.entry)
                    .ok_or_else(|| missing(call.receiver.name, call.span))?;
                let method = bindings
                    .get_entry(binding.method)
                    .ok_or_else(|| missing(call.method.name, call.span))?;

                self.emitter.emit(Instruction::LoadFp);
                self.gen_args(call.args)?;
                self.load_frame(binding.receiver.hops(receiver));
                self.emitter.emit_all([
                    Instruction::push(receiver.offset.into()),
                    Instruction::Add,
                    Instruction::LoadWord,
                    Instruction::StoreTm,
                    Instruction::LoadTm,
                    Instruction::LoadTm,
                    Instruction::LoadWord,
                    Instruction::push(method.offset.into()),
                    Instruction::Add,
                    Instruction::LoadWord,
                    Instruction::JumpSubroutine,
                ]);
            }

            Expr::New(new) => {
                let (_, class) = self.resolved(new.id, new.class.name, new.span)?;
                for arg in new.args {
                    self.gen_expr(arg)?;
                }
                for _ in new.args {
                    self.emitter.emit_all([Instruction::LoadHp, Instruction::StoreWord]);
                    self.bump_heap_pointer();
                }
                // Class entries live in the global frame, whose frame pointer
                // is the top of memory.
                let table_slot = self.options.memory_size + i64::from(class.offset);
                self.emitter.emit_all([
                    Instruction::push(table_slot),
                    Instruction::LoadWord,
                    Instruction::LoadHp,
                    Instruction::StoreWord,
                    Instruction::LoadHp,
                ]);
                self.bump_heap_pointer();
            }
        }
        Ok(())
    }

    fn gen_binary(&mut self, binary: &BinaryExpr<'_>) -> Result<()> {
        match binary.op {
            BinaryOp::Equal => {
                self.gen_comparison(binary.left, binary.right, Instruction::BranchEq)
            }
            BinaryOp::LessEqual => {
                self.gen_comparison(binary.left, binary.right, Instruction::BranchLessEq)
            }
            BinaryOp::GreaterEqual => {
                self.gen_comparison(binary.right, binary.left, Instruction::BranchLessEq)
            }
            BinaryOp::And => self.gen_arithmetic(binary, Instruction::Mult),
            BinaryOp::Or => {
                let false_label = self.emitter.fresh_label();
                let end_label = self.emitter.fresh_label();
                self.gen_expr(binary.left)?;
                self.gen_expr(binary.right)?;
                self.emitter.emit_all([
                    Instruction::Add,
                    Instruction::push(0),
                    Instruction::BranchEq(false_label),
                    Instruction::push(1),
                    Instruction::Branch(end_label),
                ]);
                self.emitter.place_label(false_label);
                self.emitter.emit(Instruction::push(0));
                self.emitter.place_label(end_label);
                Ok(())
            }
            BinaryOp::Add => self.gen_arithmetic(binary, Instruction::Add),
            BinaryOp::Sub => self.gen_arithmetic(binary, Instruction::Sub),
            BinaryOp::Mul => self.gen_arithmetic(binary, Instruction::Mult),
            BinaryOp::Div => self.gen_arithmetic(binary, Instruction::Div),
        }
    }

    fn gen_arithmetic(&mut self, binary: &BinaryExpr<'_>, op: Instruction) -> Result<()> {
        self.gen_expr(binary.left)?;
        self.gen_expr(binary.right)?;
        self.emitter.emit(op);
        Ok(())
    }

    /// Push 1 if `branch` jumps on (`first`, `second`), 0 otherwise.
    fn gen_comparison(
        &mut self,
        first: &Expr<'_>,
        second: &Expr<'_>,
        branch: fn(Label) -> Instruction,
    ) -> Result<()> {
        let true_label = self.emitter.fresh_label();
        let end_label = self.emitter.fresh_label();
        self.gen_expr(first)?;
        self.gen_expr(second)?;
        self.emitter.emit_all([
            branch(true_label),
            Instruction::push(0),
            Instruction::Branch(end_label),
        ]);
        self.emitter.place_label(true_label);
        self.emitter.emit(Instruction::push(1));
        self.emitter.place_label(end_label);
        Ok(())
    }

    /// Arguments are pushed last first, so the first one ends up at offset 1.
    fn gen_args(&mut self, args: &[Expr<'_>]) -> Result<()> {
        for arg in args.iter().rev() {
            self.gen_expr(arg)?;
        }
        Ok(())
    }

    /// Push the frame pointer `hops` access links up from the current frame.
    fn load_frame(&mut self, hops: u32) {
        self.emitter.emit(Instruction::LoadFp);
        self.emitter.emit_repeated(Instruction::LoadWord, hops as usize);
    }
}

fn missing(name: &str, span: Span) -> CodegenError {
    CodegenError::MissingBinding {
        name: name.to_string(),
        span,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passes::ScopeResolver;
    use bumpalo::Bump;
    use foolc_ast::AstBuilder;

    fn generate(program: &Program<'_>) -> Assembly {
        let resolved = ScopeResolver::new().run(program);
        assert!(resolved.errors.is_empty(), "{:?}", resolved.errors);
        let options = CompilerOptions::default();
        CodeGenerator::new(&resolved.bindings, &resolved.hierarchy, &options)
            .run(program)
            .unwrap()
    }

    fn lines(text: &str) -> Vec<&str> {
        text.lines().collect()
    }

    #[test]
    fn bare_expression() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.print(b.mul(b.int(6), b.bool(true))));
        assert_eq!(
            generate(&program).to_text(),
            "push 6\npush 1\nmult\nprint\nhalt\n"
        );
    }

    #[test]
    fn global_variable_access() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let x = b.var("x", b.int_type(), b.int(5));
        let program = b.program(&[], &[x], b.add(b.name("x"), b.int(1)));
        assert_eq!(
            lines(&generate(&program).to_text()),
            [
                "push 0", "push 5", "lfp", "push -2", "add", "lw", "push 1", "add", "halt"
            ]
        );
    }

    #[test]
    fn conditional_layout() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.if_else(b.bool(true), b.int(1), b.int(2)));
        assert_eq!(
            lines(&generate(&program).to_text()),
            [
                "push 1", "push 1", "beq label0", "push 2", "b label1", "label0:", "push 1",
                "label1:", "halt"
            ]
        );
    }

    #[test]
    fn greater_equal_swaps_operands() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.ge(b.int(3), b.int(4)));
        assert_eq!(
            lines(&generate(&program).to_text()),
            [
                "push 4", "push 3", "bleq label0", "push 0", "b label1", "label0:", "push 1",
                "label1:", "halt"
            ]
        );
    }

    #[test]
    fn function_call_and_block() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let p = b.param("n", b.int_type());
        let f = b.fun("inc", b.int_type(), &[p], &[], b.add(b.name("n"), b.int(1)));
        let program = b.program(&[], &[f], b.call("inc", &[b.int(41)]));

        assert_eq!(
            lines(&generate(&program).to_text()),
            [
                "push 0",
                "push function0",
                // call site
                "lfp",
                "push 41",
                "lfp",
                "stm",
                "ltm",
                "ltm",
                "push -2",
                "add",
                "lw",
                "js",
                "halt",
                // callee
                "function0:",
                "cfp",
                "lra",
                "lfp",
                "push 1",
                "add",
                "lw",
                "push 1",
                "add",
                "stm",
                "sra",
                "pop",
                "pop",
                "sfp",
                "ltm",
                "lra",
                "js",
            ]
        );
    }

    #[test]
    fn nested_blocks_come_first() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let inner = b.fun("inner", b.int_type(), &[], &[], b.int(1));
        let outer = b.fun("outer", b.int_type(), &[], &[inner], b.call("inner", &[]));
        let program = b.program(&[], &[outer], b.call("outer", &[]));

        let text = generate(&program).to_text();
        let inner_at = text.find("function0:").unwrap();
        let outer_at = text.find("function1:").unwrap();
        assert!(inner_at < outer_at);
        // One local declaration to pop in the outer block.
        assert!(text[outer_at..].contains("stm\npop\nsra\npop\nsfp"));
    }

    #[test]
    fn dispatch_tables_keep_inherited_slots() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let base = b.class(
            "Base",
            None,
            &[],
            &[
                b.method("f", b.int_type(), &[], &[], b.int(1)),
                b.method("g", b.int_type(), &[], &[], b.int(2)),
            ],
        );
        let derived = b.class(
            "Derived",
            Some("Base"),
            &[],
            &[
                b.method("g", b.int_type(), &[], &[], b.int(3)),
                b.method("h", b.int_type(), &[], &[], b.int(4)),
            ],
        );
        let program = b.program(&[base, derived], &[], b.int(0));

        let resolved = ScopeResolver::new().run(&program);
        let options = CompilerOptions::default();
        let mut generator = CodeGenerator::new(&resolved.bindings, &resolved.hierarchy, &options);
        for class in program.classes {
            generator.gen_class(class).unwrap();
        }

        assert_eq!(
            generator.dispatch_tables["Base"],
            [Label::function(0), Label::function(1)]
        );
        assert_eq!(
            generator.dispatch_tables["Derived"],
            [Label::function(0), Label::function(2), Label::function(3)]
        );
    }

    #[test]
    fn instantiation_uses_absolute_class_slot() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let pair = b.class(
            "Pair",
            None,
            &[b.field("a", b.int_type()), b.field("b", b.int_type())],
            &[],
        );
        let program = b.program(&[pair], &[], b.new_object("Pair", &[b.int(1), b.int(2)]));
        let text = generate(&program).to_text();

        let expected = [
            "push 1", "push 2", "lhp", "sw", "lhp", "push 1", "add", "shp", "lhp", "sw", "lhp",
            "push 1", "add", "shp", "push 9998", "lw", "lhp", "sw", "lhp", "lhp", "push 1",
            "add", "shp", "halt",
        ]
        .join("\n");
        assert!(text.ends_with(&format!("{expected}\n")), "{text}");
    }

    #[test]
    fn unresolved_tree_is_an_error() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let program = b.program(&[], &[], b.name("ghost"));
        let resolved = ScopeResolver::new().run(&program);
        let options = CompilerOptions::default();
        let result =
            CodeGenerator::new(&resolved.bindings, &resolved.hierarchy, &options).run(&program);
        assert!(matches!(result, Err(CodegenError::MissingBinding { .. })));
    }
}
