//! Error types for the analysis passes.
//!
//! ## Error Hierarchy
//!
//! ```text
//! CompileError (top-level wrapper)
//! ├── BindingError - scope resolution (duplicates, undeclared names, bad overrides)
//! ├── TypeError    - type checking (mismatches, arity, illegal overrides)
//! └── CodegenError - code generation over a tree that was not fully resolved
//! ```
//!
//! Both analysis passes accumulate errors instead of stopping at the first
//! one, so a single run reports every independent problem it can find.

use std::fmt;

use thiserror::Error;

use crate::{Span, Type};

/// What kind of named entity a diagnostic is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Variable,
    Function,
    Parameter,
    Class,
    Field,
    Method,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Variable => "variable",
            SymbolKind::Function => "function",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Class => "class",
            SymbolKind::Field => "field",
            SymbolKind::Method => "method",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Binding Errors
// ============================================================================

/// Errors detected while resolving scopes and bindings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindingError {
    /// A name was declared twice in the same scope.
    #[error("at {span}: {kind} '{name}' already declared")]
    DuplicateDeclaration {
        kind: SymbolKind,
        name: String,
        span: Span,
    },

    /// A name was used without a visible declaration.
    #[error("at {span}: {kind} '{name}' not declared")]
    Undeclared {
        kind: SymbolKind,
        name: String,
        span: Span,
    },

    /// A class extends a class that does not exist.
    #[error("at {span}: superclass '{superclass}' of class '{class}' not declared")]
    UnknownSuperclass {
        class: String,
        superclass: String,
        span: Span,
    },

    /// A class name used in `new` or in a type annotation does not exist.
    #[error("at {span}: class '{name}' not declared")]
    UnknownClass { name: String, span: Span },

    /// The receiver of a method call is not an object reference.
    #[error("at {span}: '{name}' is not an object reference")]
    NotAReference { name: String, span: Span },

    /// A qualified call names a method the receiver's class does not have.
    #[error("at {span}: class '{class}' has no method '{method}'")]
    UnknownMethod {
        class: String,
        method: String,
        span: Span,
    },

    /// A field tries to override an inherited method.
    #[error("at {span}: field '{name}' of class '{class}' cannot override a method")]
    FieldOverridesMethod {
        class: String,
        name: String,
        span: Span,
    },

    /// A method tries to override a field.
    #[error("at {span}: method '{name}' of class '{class}' cannot override a field")]
    MethodOverridesField {
        class: String,
        name: String,
        span: Span,
    },

    /// The same member name appears twice in one class body.
    #[error("at {span}: {kind} '{name}' defined more than once in class '{class}'")]
    DuplicateMember {
        kind: SymbolKind,
        class: String,
        name: String,
        span: Span,
    },
}

impl BindingError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            BindingError::DuplicateDeclaration { span, .. } => *span,
            BindingError::Undeclared { span, .. } => *span,
            BindingError::UnknownSuperclass { span, .. } => *span,
            BindingError::UnknownClass { span, .. } => *span,
            BindingError::NotAReference { span, .. } => *span,
            BindingError::UnknownMethod { span, .. } => *span,
            BindingError::FieldOverridesMethod { span, .. } => *span,
            BindingError::MethodOverridesField { span, .. } => *span,
            BindingError::DuplicateMember { span, .. } => *span,
        }
    }
}

// ============================================================================
// Type Errors
// ============================================================================

/// Errors detected while type checking.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// The condition of an `if` is not a boolean.
    #[error("at {span}: non boolean condition in if (found '{found}')")]
    NonBooleanCondition { found: Type, span: Span },

    /// The branches of an `if` have no common type.
    #[error("at {span}: incompatible types in then-else branches ('{then_type}' and '{else_type}')")]
    IncompatibleBranches {
        then_type: Type,
        else_type: Type,
        span: Span,
    },

    /// A function value appears as an operand of `==`.
    #[error("at {span}: functions cannot be compared for equality")]
    FunctionComparison { span: Span },

    /// The operands of an operator have unsuitable types.
    #[error("at {span}: incompatible operand types for '{op}' ('{left}' and '{right}')")]
    IncompatibleOperands {
        op: &'static str,
        left: Type,
        right: Type,
        span: Span,
    },

    /// The operand of `!` is not a boolean.
    #[error("at {span}: incompatible operand type for '!' ('{found}')")]
    IncompatibleNegation { found: Type, span: Span },

    /// Something that is not a function is invoked.
    #[error("at {span}: invocation of non-function '{name}'")]
    NotCallable { name: String, span: Span },

    /// A call passes the wrong number of arguments.
    #[error("at {span}: wrong number of arguments in the invocation of {callee} (expected {expected}, found {found})")]
    ArgumentCount {
        callee: String,
        expected: usize,
        found: usize,
        span: Span,
    },

    /// An argument is not a subtype of the parameter it is bound to.
    #[error("at {span}: wrong type for argument {position} in the invocation of {callee} (expected '{expected}', found '{found}')")]
    ArgumentType {
        callee: String,
        position: usize,
        expected: Type,
        found: Type,
        span: Span,
    },

    /// A function, method or class name is used as a value.
    #[error("at {span}: wrong usage of {kind} identifier '{name}'")]
    InvalidIdentifierUse {
        kind: SymbolKind,
        name: String,
        span: Span,
    },

    /// `new` names something whose binding is not a class.
    #[error("at {span}: '{name}' is not a class")]
    NotAClass { name: String, span: Span },

    /// A variable's initializer does not fit its declared type.
    #[error("at {span}: incompatible value for variable '{name}' (expected '{expected}', found '{found}')")]
    IncompatibleInitializer {
        name: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    /// A function or method body does not fit the declared return type.
    #[error("at {span}: wrong return type for {kind} '{name}' (expected '{expected}', found '{found}')")]
    WrongReturnType {
        kind: SymbolKind,
        name: String,
        expected: Type,
        found: Type,
        span: Span,
    },

    /// An overriding field's type is not a subtype of the inherited one.
    #[error("at {span}: incompatible type for field '{field}' overridden in class '{class}'")]
    IncompatibleFieldOverride {
        class: String,
        field: String,
        span: Span,
    },

    /// An overriding method's signature is not a subtype of the inherited one.
    #[error("at {span}: incompatible signature for method '{method}' overridden in class '{class}'")]
    IncompatibleMethodOverride {
        class: String,
        method: String,
        span: Span,
    },
}

impl TypeError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            TypeError::NonBooleanCondition { span, .. } => *span,
            TypeError::IncompatibleBranches { span, .. } => *span,
            TypeError::FunctionComparison { span } => *span,
            TypeError::IncompatibleOperands { span, .. } => *span,
            TypeError::IncompatibleNegation { span, .. } => *span,
            TypeError::NotCallable { span, .. } => *span,
            TypeError::ArgumentCount { span, .. } => *span,
            TypeError::ArgumentType { span, .. } => *span,
            TypeError::InvalidIdentifierUse { span, .. } => *span,
            TypeError::NotAClass { span, .. } => *span,
            TypeError::IncompatibleInitializer { span, .. } => *span,
            TypeError::WrongReturnType { span, .. } => *span,
            TypeError::IncompatibleFieldOverride { span, .. } => *span,
            TypeError::IncompatibleMethodOverride { span, .. } => *span,
        }
    }
}

// ============================================================================
// Code Generation Errors
// ============================================================================

/// Errors raised by the code generator.
///
/// The generator performs no validation of its own; these only fire when it
/// is handed a tree the analysis passes did not annotate completely.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodegenError {
    #[error("at {span}: no binding recorded for '{name}'")]
    MissingBinding { name: String, span: Span },

    #[error("at {span}: no dispatch table for class '{class}'")]
    MissingDispatchTable { class: String, span: Span },
}

impl CodegenError {
    pub fn span(&self) -> Span {
        match self {
            CodegenError::MissingBinding { span, .. } => *span,
            CodegenError::MissingDispatchTable { span, .. } => *span,
        }
    }
}

// ============================================================================
// Top-level
// ============================================================================

/// Any diagnostic produced by the analysis passes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("binding error {0}")]
    Binding(#[from] BindingError),

    #[error("type error {0}")]
    Type(#[from] TypeError),

    #[error("code generation error {0}")]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    pub fn span(&self) -> Span {
        match self {
            CompileError::Binding(e) => e.span(),
            CompileError::Type(e) => e.span(),
            CompileError::Codegen(e) => e.span(),
        }
    }

    /// The source line, for reporters that only show lines.
    pub fn line(&self) -> u32 {
        self.span().line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_error_message() {
        let err = BindingError::Undeclared {
            kind: SymbolKind::Variable,
            name: "x".into(),
            span: Span::line(4),
        };
        assert_eq!(err.to_string(), "at line 4: variable 'x' not declared");
    }

    #[test]
    fn compile_error_wraps_and_keeps_span() {
        let err: CompileError = TypeError::NotCallable {
            name: "y".into(),
            span: Span::new(2, 9),
        }
        .into();
        assert_eq!(err.line(), 2);
        assert!(err.to_string().starts_with("type error at line 2:9"));
    }

    #[test]
    fn type_error_mentions_types() {
        let err = TypeError::IncompatibleBranches {
            then_type: Type::Int,
            else_type: Type::reference("Node"),
            span: Span::line(1),
        };
        assert!(err.to_string().contains("'int' and 'Node'"));
    }
}
