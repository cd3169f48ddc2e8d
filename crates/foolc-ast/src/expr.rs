//! Expression AST nodes.
//!
//! Everything in FOOL is an expression: conditionals, calls and object
//! creation all produce a value. Nodes that the analysis passes annotate
//! (identifier uses, calls, instantiations) carry a [`NodeId`].

use foolc_core::Span;

use crate::{Ident, NodeId};

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(LiteralExpr),
    /// Identifier reference
    Ident(IdentExpr<'ast>),
    /// Binary operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Logical negation
    Not(&'ast NotExpr<'ast>),
    /// `if c then { a } else { b }`
    If(&'ast IfExpr<'ast>),
    /// Unqualified call `f(args)`
    Call(&'ast CallExpr<'ast>),
    /// Qualified call `obj.m(args)`
    MethodCall(&'ast MethodCallExpr<'ast>),
    /// Object instantiation `new C(args)`
    New(&'ast NewExpr<'ast>),
    /// `print(e)`
    Print(&'ast PrintExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Ident(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Not(e) => e.span,
            Self::If(e) => e.span,
            Self::Call(e) => e.span,
            Self::MethodCall(e) => e.span,
            Self::New(e) => e.span,
            Self::Print(e) => e.span,
        }
    }

    /// The node id, for the expression kinds that have one.
    pub fn id(&self) -> Option<NodeId> {
        match self {
            Self::Ident(e) => Some(e.id),
            Self::Call(e) => Some(e.id),
            Self::MethodCall(e) => Some(e.id),
            Self::New(e) => Some(e.id),
            _ => None,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiteralExpr {
    pub kind: LiteralKind,
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int(i64),
    Bool(bool),
    /// The empty object reference.
    Null,
}

/// An identifier used as a value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentExpr<'ast> {
    pub id: NodeId,
    pub ident: Ident<'ast>,
    pub span: Span,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Equal,
    LessEqual,
    GreaterEqual,
    And,
    Or,
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Equal => "==",
            BinaryOp::LessEqual => "<=",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// A binary operation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub left: &'ast Expr<'ast>,
    pub op: BinaryOp,
    pub right: &'ast Expr<'ast>,
    pub span: Span,
}

/// `!e`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NotExpr<'ast> {
    pub operand: &'ast Expr<'ast>,
    pub span: Span,
}

/// A conditional expression. Both branches are mandatory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfExpr<'ast> {
    pub condition: &'ast Expr<'ast>,
    pub then_expr: &'ast Expr<'ast>,
    pub else_expr: &'ast Expr<'ast>,
    pub span: Span,
}

/// A call to a function, or to a method of the enclosing class.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub id: NodeId,
    pub callee: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// A call through an object reference held by a variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MethodCallExpr<'ast> {
    pub id: NodeId,
    pub receiver: Ident<'ast>,
    pub method: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Object instantiation. Arguments initialise the fields in order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewExpr<'ast> {
    pub id: NodeId,
    pub class: Ident<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

/// Prints a value and yields it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrintExpr<'ast> {
    pub expr: &'ast Expr<'ast>,
    pub span: Span,
}
