//! Compiler passes.
//!
//! - [`resolve`]: Pass 1 - bind every name to its declaration and lay out frames and objects
//! - [`typeck`]: Pass 2 - compute and check the type of every expression
//! - [`codegen`]: Pass 3 - generate stack machine assembly

pub mod codegen;
pub mod resolve;
pub mod typeck;

pub use codegen::CodeGenerator;
pub use resolve::{ResolveOutput, ScopeResolver};
pub use typeck::{TypeCheckOutput, TypeChecker};
