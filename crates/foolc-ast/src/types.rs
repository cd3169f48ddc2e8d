//! Type annotations as written in declarations.

use foolc_core::Span;

use crate::Ident;

/// A syntactic type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeExpr<'ast> {
    /// `int`
    Int(Span),
    /// `bool`
    Bool(Span),
    /// A class name.
    Named(Ident<'ast>),
    /// `(T1, T2) -> R`, for higher-order parameters.
    Arrow(&'ast ArrowTypeExpr<'ast>),
}

impl<'ast> TypeExpr<'ast> {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Int(span) | TypeExpr::Bool(span) => *span,
            TypeExpr::Named(ident) => ident.span,
            TypeExpr::Arrow(arrow) => arrow.span,
        }
    }
}

/// A function type annotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrowTypeExpr<'ast> {
    pub params: &'ast [TypeExpr<'ast>],
    pub ret: TypeExpr<'ast>,
    pub span: Span,
}
