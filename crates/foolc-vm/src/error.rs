//! Errors raised while assembling or running a program.

use thiserror::Error;

/// Errors from the assembler or the machine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VmError {
    #[error("line {line}: unknown instruction '{mnemonic}'")]
    UnknownMnemonic { mnemonic: String, line: usize },

    #[error("label '{label}' is never defined")]
    UndefinedLabel { label: String },

    #[error("line {line}: bad operand for '{mnemonic}'")]
    BadOperand { mnemonic: String, line: usize },

    #[error("invalid opcode {word} at {address}")]
    InvalidOpcode { word: i64, address: i64 },

    #[error("out of memory (sp {sp}, hp {hp})")]
    OutOfMemory { sp: i64, hp: i64 },

    #[error("address {address} out of range")]
    AddressOutOfRange { address: i64 },

    #[error("division by zero at {address}")]
    DivisionByZero { address: i64 },

    #[error("step limit of {limit} exceeded")]
    StepLimit { limit: u64 },
}
