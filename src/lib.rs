//! FOOL compiler toolchain.
//!
//! Re-exports the workspace crates and ties them together: build a program
//! with [`ast::AstBuilder`], compile it with [`Compiler`], run the assembly on
//! the reference [`Machine`]. [`compile_and_run`] does all of it in one call.

pub use foolc_ast as ast;
pub use foolc_compiler as compiler;
pub use foolc_core as diagnostics;
pub use foolc_vm as vm;

pub use foolc_compiler::{Assembly, CompilationResult, Compiler, CompilerOptions};
pub use foolc_core::{BindingError, CodegenError, CompileError, Span, Type, TypeError};
pub use foolc_vm::{Machine, MachineConfig, Outcome, VmError};

use foolc_ast::Program;
use thiserror::Error;

// Re-export main types
pub mod prelude {
    pub use crate::{RunError, Running, compile_and_run};
    pub use foolc_ast::{AstBuilder, Program};
    pub use foolc_compiler::{Compiler, CompilerOptions};
    pub use foolc_core::{CompileError, Type};
    pub use foolc_vm::{MachineConfig, Outcome};
}

/// Why [`compile_and_run`] failed.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("compilation failed with {} error(s)", .0.len())]
    Compile(Vec<CompileError>),

    #[error("runtime error: {0}")]
    Vm(#[from] VmError),
}

/// A compiled and executed program.
#[derive(Debug)]
pub struct Running {
    pub assembly: Assembly,
    pub program_type: Option<Type>,
    pub outcome: Outcome,
}

/// Compile `program` and run it on a machine sized to match `options`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_and_run(
    program: &Program<'_>,
    options: CompilerOptions,
) -> Result<Running, RunError> {
    let config = MachineConfig::new().with_memory_size(options.memory_size);
    let result = Compiler::new(options).compile(program);
    let Some(assembly) = result.assembly else {
        return Err(RunError::Compile(result.errors));
    };

    let outcome = foolc_vm::run_assembly(&assembly.to_text(), config)?;
    Ok(Running {
        assembly,
        program_type: result.program_type,
        outcome,
    })
}
