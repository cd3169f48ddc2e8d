//! Programmatic construction of arena-allocated trees.
//!
//! Front ends (and tests) build programs through [`AstBuilder`], which copies
//! names and child slices into the arena, hands out unique [`NodeId`]s and
//! stamps every node with the current source line.
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use foolc_ast::AstBuilder;
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let x = b.var("x", b.int_type(), b.int(5));
//! let program = b.program(&[], &[x], b.add(b.name("x"), b.int(1)));
//! assert_eq!(program.decls.len(), 1);
//! ```

use std::cell::Cell;

use bumpalo::Bump;
use foolc_core::Span;

use crate::{
    ArrowTypeExpr, BinaryExpr, BinaryOp, CallExpr, ClassDecl, Decl, Expr, FieldDecl, FunDecl,
    Ident, IdentExpr, IfExpr, LiteralExpr, LiteralKind, MethodCallExpr, MethodDecl, NewExpr,
    NodeId, NotExpr, Param, PrintExpr, Program, TypeExpr, VarDecl,
};

/// Allocates AST nodes in a `bumpalo` arena.
pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    next_id: Cell<u32>,
    line: Cell<u32>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            next_id: Cell::new(0),
            line: Cell::new(1),
        }
    }

    /// Set the source line stamped on subsequently built nodes.
    pub fn set_line(&self, line: u32) {
        self.line.set(line);
    }

    /// Number of node ids handed out so far.
    pub fn node_count(&self) -> u32 {
        self.next_id.get()
    }

    fn span(&self) -> Span {
        Span::line(self.line.get())
    }

    fn fresh_id(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn ident(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(name), self.span())
    }

    fn expr(&self, expr: Expr<'ast>) -> &'ast Expr<'ast> {
        self.arena.alloc(expr)
    }

    fn exprs(&self, exprs: &[Expr<'ast>]) -> &'ast [Expr<'ast>] {
        self.arena.alloc_slice_copy(exprs)
    }

    // ==========================================================================
    // Types
    // ==========================================================================

    pub fn int_type(&self) -> TypeExpr<'ast> {
        TypeExpr::Int(self.span())
    }

    pub fn bool_type(&self) -> TypeExpr<'ast> {
        TypeExpr::Bool(self.span())
    }

    pub fn class_type(&self, name: &str) -> TypeExpr<'ast> {
        TypeExpr::Named(self.ident(name))
    }

    pub fn arrow_type(&self, params: &[TypeExpr<'ast>], ret: TypeExpr<'ast>) -> TypeExpr<'ast> {
        TypeExpr::Arrow(self.arena.alloc(ArrowTypeExpr {
            params: self.arena.alloc_slice_copy(params),
            ret,
            span: self.span(),
        }))
    }

    // ==========================================================================
    // Expressions
    // ==========================================================================

    pub fn int(&self, value: i64) -> Expr<'ast> {
        self.literal(LiteralKind::Int(value))
    }

    pub fn bool(&self, value: bool) -> Expr<'ast> {
        self.literal(LiteralKind::Bool(value))
    }

    pub fn null(&self) -> Expr<'ast> {
        self.literal(LiteralKind::Null)
    }

    fn literal(&self, kind: LiteralKind) -> Expr<'ast> {
        Expr::Literal(LiteralExpr {
            kind,
            span: self.span(),
        })
    }

    /// An identifier used as a value.
    pub fn name(&self, name: &str) -> Expr<'ast> {
        Expr::Ident(IdentExpr {
            id: self.fresh_id(),
            ident: self.ident(name),
            span: self.span(),
        })
    }

    pub fn binary(&self, left: Expr<'ast>, op: BinaryOp, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            left: self.expr(left),
            op,
            right: self.expr(right),
            span: self.span(),
        }))
    }

    pub fn add(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Add, right)
    }

    pub fn sub(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Sub, right)
    }

    pub fn mul(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Mul, right)
    }

    pub fn div(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Div, right)
    }

    pub fn eq(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Equal, right)
    }

    pub fn le(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::LessEqual, right)
    }

    pub fn ge(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::GreaterEqual, right)
    }

    pub fn and(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::And, right)
    }

    pub fn or(&self, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        self.binary(left, BinaryOp::Or, right)
    }

    pub fn not(&self, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Not(self.arena.alloc(NotExpr {
            operand: self.expr(operand),
            span: self.span(),
        }))
    }

    pub fn if_else(
        &self,
        condition: Expr<'ast>,
        then_expr: Expr<'ast>,
        else_expr: Expr<'ast>,
    ) -> Expr<'ast> {
        Expr::If(self.arena.alloc(IfExpr {
            condition: self.expr(condition),
            then_expr: self.expr(then_expr),
            else_expr: self.expr(else_expr),
            span: self.span(),
        }))
    }

    pub fn call(&self, callee: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Call(self.arena.alloc(CallExpr {
            id: self.fresh_id(),
            callee: self.ident(callee),
            args: self.exprs(args),
            span: self.span(),
        }))
    }

    pub fn method_call(&self, receiver: &str, method: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::MethodCall(self.arena.alloc(MethodCallExpr {
            id: self.fresh_id(),
            receiver: self.ident(receiver),
            method: self.ident(method),
            args: self.exprs(args),
            span: self.span(),
        }))
    }

    pub fn new_object(&self, class: &str, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::New(self.arena.alloc(NewExpr {
            id: self.fresh_id(),
            class: self.ident(class),
            args: self.exprs(args),
            span: self.span(),
        }))
    }

    pub fn print(&self, expr: Expr<'ast>) -> Expr<'ast> {
        Expr::Print(self.arena.alloc(PrintExpr {
            expr: self.expr(expr),
            span: self.span(),
        }))
    }

    // ==========================================================================
    // Declarations
    // ==========================================================================

    pub fn var(&self, name: &str, ty: TypeExpr<'ast>, init: Expr<'ast>) -> Decl<'ast> {
        Decl::Var(self.arena.alloc(VarDecl {
            id: self.fresh_id(),
            name: self.ident(name),
            ty,
            init: self.expr(init),
            span: self.span(),
        }))
    }

    pub fn param(&self, name: &str, ty: TypeExpr<'ast>) -> Param<'ast> {
        Param {
            id: self.fresh_id(),
            name: self.ident(name),
            ty,
            span: self.span(),
        }
    }

    pub fn fun(
        &self,
        name: &str,
        ret: TypeExpr<'ast>,
        params: &[Param<'ast>],
        decls: &[Decl<'ast>],
        body: Expr<'ast>,
    ) -> Decl<'ast> {
        Decl::Fun(self.arena.alloc(FunDecl {
            id: self.fresh_id(),
            name: self.ident(name),
            params: self.arena.alloc_slice_copy(params),
            ret,
            decls: self.arena.alloc_slice_copy(decls),
            body: self.expr(body),
            span: self.span(),
        }))
    }

    pub fn field(&self, name: &str, ty: TypeExpr<'ast>) -> FieldDecl<'ast> {
        FieldDecl {
            id: self.fresh_id(),
            name: self.ident(name),
            ty,
            span: self.span(),
        }
    }

    pub fn method(
        &self,
        name: &str,
        ret: TypeExpr<'ast>,
        params: &[Param<'ast>],
        decls: &[Decl<'ast>],
        body: Expr<'ast>,
    ) -> MethodDecl<'ast> {
        MethodDecl {
            id: self.fresh_id(),
            name: self.ident(name),
            params: self.arena.alloc_slice_copy(params),
            ret,
            decls: self.arena.alloc_slice_copy(decls),
            body: self.expr(body),
            span: self.span(),
        }
    }

    pub fn class(
        &self,
        name: &str,
        superclass: Option<&str>,
        fields: &[FieldDecl<'ast>],
        methods: &[MethodDecl<'ast>],
    ) -> ClassDecl<'ast> {
        ClassDecl {
            id: self.fresh_id(),
            name: self.ident(name),
            superclass: superclass.map(|s| self.ident(s)),
            fields: self.arena.alloc_slice_copy(fields),
            methods: self.arena.alloc_slice_copy(methods),
            span: self.span(),
        }
    }

    pub fn program(
        &self,
        classes: &[ClassDecl<'ast>],
        decls: &[Decl<'ast>],
        body: Expr<'ast>,
    ) -> Program<'ast> {
        Program {
            classes: self.arena.alloc_slice_copy(classes),
            decls: self.arena.alloc_slice_copy(decls),
            body: self.expr(body),
            span: self.span(),
        }
    }
}
