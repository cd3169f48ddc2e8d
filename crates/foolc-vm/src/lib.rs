//! Reference stack machine for FOOL assembly.
//!
//! [`assemble`] turns the textual format the compiler produces into code
//! words; [`Machine`] runs them.
//!
//! # Example
//!
//! ```
//! use foolc_vm::{Machine, MachineConfig, assemble};
//!
//! let code = assemble("push 2\npush 3\nmult\nprint\nhalt\n")?;
//! let outcome = Machine::new(MachineConfig::default()).run(&code)?;
//! assert_eq!(outcome.output, [6]);
//! # Ok::<(), foolc_vm::VmError>(())
//! ```

mod assembler;
mod error;
mod machine;
pub mod opcode;

pub use assembler::assemble;
pub use error::VmError;
pub use machine::{DEFAULT_MEMORY_SIZE, Machine, MachineConfig, Outcome};
pub use opcode::Opcode;

/// Assemble `source` and run it on a fresh machine.
pub fn run_assembly(source: &str, config: MachineConfig) -> Result<Outcome, VmError> {
    let code = assemble(source)?;
    Machine::new(config).run(&code)
}
