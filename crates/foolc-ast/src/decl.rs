//! Declaration AST nodes.

use foolc_core::Span;

use crate::{Expr, Ident, NodeId, TypeExpr};

/// A whole program: `let <classes> <decls> in <body>;` or a bare `<body>;`.
///
/// Classes may only be declared here, at the outermost level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Program<'ast> {
    pub classes: &'ast [ClassDecl<'ast>],
    pub decls: &'ast [Decl<'ast>],
    pub body: &'ast Expr<'ast>,
    pub span: Span,
}

impl<'ast> Program<'ast> {
    /// Whether the program opens a `let ... in` block.
    pub fn has_declarations(&self) -> bool {
        !self.classes.is_empty() || !self.decls.is_empty()
    }
}

/// A local declaration, allowed in `let` blocks of programs, functions and methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decl<'ast> {
    Var(&'ast VarDecl<'ast>),
    Fun(&'ast FunDecl<'ast>),
}

impl<'ast> Decl<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Decl::Var(d) => d.span,
            Decl::Fun(d) => d.span,
        }
    }

    pub fn name(&self) -> Ident<'ast> {
        match self {
            Decl::Var(d) => d.name,
            Decl::Fun(d) => d.name,
        }
    }
}

/// `var x : T = e;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VarDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub init: &'ast Expr<'ast>,
    pub span: Span,
}

/// `fun f : R (params) let decls in body;`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub ret: TypeExpr<'ast>,
    pub decls: &'ast [Decl<'ast>],
    pub body: &'ast Expr<'ast>,
    pub span: Span,
}

/// A formal parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

/// `class C extends B (fields) { methods }`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub superclass: Option<Ident<'ast>>,
    pub fields: &'ast [FieldDecl<'ast>],
    pub methods: &'ast [MethodDecl<'ast>],
    pub span: Span,
}

/// A field in a class header. Fields are initialised by `new` in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub ty: TypeExpr<'ast>,
    pub span: Span,
}

/// A method. Same shape as a function, dispatched through the class's table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodDecl<'ast> {
    pub id: NodeId,
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub ret: TypeExpr<'ast>,
    pub decls: &'ast [Decl<'ast>],
    pub body: &'ast Expr<'ast>,
    pub span: Span,
}
