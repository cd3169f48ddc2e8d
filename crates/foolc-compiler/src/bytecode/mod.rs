//! Output types of code generation.
//!
//! - [`Instruction`] - the stack machine instruction set
//! - [`Label`] - branch and function labels
//! - [`Assembly`] - a complete generated program

mod assembly;
mod instruction;

pub use assembly::{Assembly, Line};
pub use instruction::{Instruction, Label, LabelKind, Operand};
