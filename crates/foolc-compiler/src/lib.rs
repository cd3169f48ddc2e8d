//! FOOL Compiler
//!
//! Middle and back end of the FOOL compiler: takes a parsed program, binds
//! names, type checks it and generates assembly for the FOOL stack machine.
//!
//! ## Architecture
//!
//! - **Pass 1 (Scope resolution)**: Bind every name to its declaration, assign frame offsets,
//!   field offsets and dispatch slots, build the class hierarchy
//! - **Pass 2 (Type checking)**: Compute the type of every expression against the subtype lattice
//! - **Pass 3 (Code generation)**: Emit stack machine assembly, only for error-free programs
//!
//! ## Modules
//!
//! - [`binding`]: Binding entries and the side tables the passes share
//! - [`bytecode`]: Instructions, labels and assembled listings
//! - [`emit`]: Instruction emitter with function blocks and label generation
//! - [`hierarchy`]: Superclass relation between class names
//! - [`lattice`]: Subtyping and lowest common ancestors
//! - [`options`]: Compiler options
//! - [`passes`]: The three passes
//! - [`scope`]: Scope stack used during resolution
//! - [`type_resolver`]: Lowering of type annotations to semantic types

pub mod binding;
pub mod bytecode;
pub mod emit;
pub mod hierarchy;
pub mod lattice;
pub mod options;
pub mod passes;
pub mod scope;
pub mod type_resolver;

pub use binding::{BindingEntry, Bindings, EntryId};
pub use bytecode::{Assembly, Instruction, Label};
pub use hierarchy::ClassHierarchy;
pub use lattice::SubtypeLattice;
pub use options::{CompilerOptions, DEFAULT_MEMORY_SIZE};
pub use passes::{CodeGenerator, ResolveOutput, ScopeResolver, TypeCheckOutput, TypeChecker};

// Re-export the diagnostic types from core for convenience
pub use foolc_core::{BindingError, CodegenError, CompileError, TypeError};

use foolc_ast::Program;
use foolc_core::Type;

/// Result of compilation.
#[derive(Debug)]
pub struct CompilationResult {
    /// Generated assembly; present only when there were no errors.
    pub assembly: Option<Assembly>,
    /// Type of the program body, when type checking got that far.
    pub program_type: Option<Type>,
    /// Every diagnostic, binding errors first.
    pub errors: Vec<CompileError>,
}

impl CompilationResult {
    /// Check if compilation succeeded (no errors).
    pub fn is_success(&self) -> bool {
        self.errors.is_empty() && self.assembly.is_some()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

/// The main compiler entry point.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    options: CompilerOptions,
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    /// Run all passes over a program.
    ///
    /// Type checking still runs after binding errors unless the options turn
    /// that off; code is generated only when both analyses are clean.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compile(&self, program: &Program<'_>) -> CompilationResult {
        let resolved = ScopeResolver::new().run(program);
        let mut errors: Vec<CompileError> = resolved
            .errors
            .iter()
            .cloned()
            .map(CompileError::from)
            .collect();

        let mut program_type = None;
        if errors.is_empty() || self.options.typecheck_after_binding_errors {
            let checked = TypeChecker::new(&resolved.bindings, &resolved.hierarchy).run(program);
            program_type = checked.program_type;
            errors.extend(checked.errors.into_iter().map(CompileError::from));
        }

        if !errors.is_empty() {
            tracing::debug!(errors = errors.len(), "skipping code generation");
            return CompilationResult {
                assembly: None,
                program_type,
                errors,
            };
        }

        let assembly =
            match CodeGenerator::new(&resolved.bindings, &resolved.hierarchy, &self.options)
                .run(program)
            {
                Ok(assembly) => Some(assembly),
                Err(error) => {
                    errors.push(error.into());
                    None
                }
            };

        CompilationResult {
            assembly,
            program_type,
            errors,
        }
    }
}
