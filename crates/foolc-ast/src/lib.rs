//! Abstract syntax tree for FOOL.
//!
//! All nodes are allocated in a `bumpalo` arena and borrow from it for `'ast`.
//! There is no parser in this workspace: trees are built with [`AstBuilder`].

mod builder;
pub mod decl;
pub mod expr;
pub mod node;
pub mod types;

pub use builder::AstBuilder;
pub use decl::*;
pub use expr::*;
pub use node::*;
pub use types::*;
