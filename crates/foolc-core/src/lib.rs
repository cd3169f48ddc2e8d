//! Shared vocabulary of the FOOL compiler: source spans, semantic types and
//! the diagnostic taxonomy.

pub mod error;
pub mod span;
pub mod types;

pub use error::{BindingError, CodegenError, CompileError, SymbolKind, TypeError};
pub use span::Span;
pub use types::{ArrowType, ClassType, Type};
