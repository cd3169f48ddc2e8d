//! Type resolution for converting AST type expressions to semantic types.
//!
//! [`TypeResolver`] lowers a [`TypeExpr`] to a [`Type`] and checks that every
//! class name it mentions is declared somewhere in the program. Class names
//! are collected before resolution starts, so an annotation may name a class
//! declared further down.

use foolc_ast::TypeExpr;
use foolc_core::{ArrowType, BindingError, Type};
use rustc_hash::FxHashSet;

/// Lower an annotation without checking class names.
pub fn lower(ty: &TypeExpr<'_>) -> Type {
    match ty {
        TypeExpr::Int(_) => Type::Int,
        TypeExpr::Bool(_) => Type::Bool,
        TypeExpr::Named(ident) => Type::reference(ident.name),
        TypeExpr::Arrow(arrow) => Type::Arrow(lower_arrow(arrow.params, &arrow.ret)),
    }
}

/// Lower parameter annotations and a return annotation to an arrow.
pub fn lower_arrow(params: &[TypeExpr<'_>], ret: &TypeExpr<'_>) -> ArrowType {
    ArrowType::new(params.iter().map(lower).collect(), lower(ret))
}

/// Resolves annotations against the set of declared class names.
pub struct TypeResolver<'a> {
    class_names: &'a FxHashSet<String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(class_names: &'a FxHashSet<String>) -> Self {
        Self { class_names }
    }

    /// Resolve an annotation, failing on the first undeclared class name.
    pub fn resolve(&self, ty: &TypeExpr<'_>) -> Result<Type, BindingError> {
        self.check(ty)?;
        Ok(lower(ty))
    }

    fn check(&self, ty: &TypeExpr<'_>) -> Result<(), BindingError> {
        match ty {
            TypeExpr::Int(_) | TypeExpr::Bool(_) => Ok(()),
            TypeExpr::Named(ident) => {
                if self.class_names.contains(ident.name) {
                    Ok(())
                } else {
                    Err(BindingError::UnknownClass {
                        name: ident.name.to_string(),
                        span: ident.span,
                    })
                }
            }
            TypeExpr::Arrow(arrow) => {
                for param in arrow.params {
                    self.check(param)?;
                }
                self.check(&arrow.ret)
            }
        }
    }
}
