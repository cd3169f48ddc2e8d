//! Machine operation codes.
//!
//! Code is a sequence of words: an opcode, followed by one operand word for
//! the instructions that take one.

use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Stack machine operation codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i64)]
pub enum Opcode {
    // =========================================================================
    // Stack and Arithmetic
    // =========================================================================
    /// Push the operand.
    Push = 0,
    Pop,
    Add,
    Sub,
    Mult,
    /// Integer division, truncating.
    Div,

    // =========================================================================
    // Memory
    // =========================================================================
    /// Pop an address, then a value, and store the value there.
    StoreWord,
    /// Replace the address on top with the word it points to.
    LoadWord,

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// Jump to the operand.
    Branch,
    /// Pop two values and jump to the operand if they are equal.
    BranchEq,
    /// Pop `b`, then `a`, and jump to the operand if `a <= b`.
    BranchLessEq,
    /// Pop an address, save the return address in `ra` and jump.
    JumpSubroutine,

    // =========================================================================
    // Registers
    // =========================================================================
    LoadRa,
    StoreRa,
    LoadTm,
    StoreTm,
    LoadFp,
    StoreFp,
    /// Set `fp` to `sp`.
    CopyFp,
    LoadHp,
    StoreHp,

    // =========================================================================
    // Misc
    // =========================================================================
    /// Output the top of the stack without popping it.
    Print,
    Halt,
}

impl Opcode {
    /// Look up an assembly mnemonic.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
        Some(match mnemonic {
            "push" => Opcode::Push,
            "pop" => Opcode::Pop,
            "add" => Opcode::Add,
            "sub" => Opcode::Sub,
            "mult" => Opcode::Mult,
            "div" => Opcode::Div,
            "sw" => Opcode::StoreWord,
            "lw" => Opcode::LoadWord,
            "b" => Opcode::Branch,
            "beq" => Opcode::BranchEq,
            "bleq" => Opcode::BranchLessEq,
            "js" => Opcode::JumpSubroutine,
            "lra" => Opcode::LoadRa,
            "sra" => Opcode::StoreRa,
            "ltm" => Opcode::LoadTm,
            "stm" => Opcode::StoreTm,
            "lfp" => Opcode::LoadFp,
            "sfp" => Opcode::StoreFp,
            "cfp" => Opcode::CopyFp,
            "lhp" => Opcode::LoadHp,
            "shp" => Opcode::StoreHp,
            "print" => Opcode::Print,
            "halt" => Opcode::Halt,
            _ => return None,
        })
    }

    /// Whether the opcode is followed by an operand word.
    pub fn has_operand(self) -> bool {
        matches!(
            self,
            Opcode::Push | Opcode::Branch | Opcode::BranchEq | Opcode::BranchLessEq
        )
    }

    /// Whether the operand must be a label rather than a number.
    pub fn takes_label(self) -> bool {
        matches!(
            self,
            Opcode::Branch | Opcode::BranchEq | Opcode::BranchLessEq
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_round_trip() {
        let word: i64 = Opcode::BranchLessEq.into();
        assert_eq!(word, 10);
        assert_eq!(Opcode::try_from(word), Ok(Opcode::BranchLessEq));
        assert!(Opcode::try_from(99).is_err());
        assert_eq!(Opcode::try_from(0), Ok(Opcode::Push));
    }

    #[test]
    fn mnemonics() {
        assert_eq!(Opcode::from_mnemonic("sw"), Some(Opcode::StoreWord));
        assert_eq!(Opcode::from_mnemonic("cfp"), Some(Opcode::CopyFp));
        assert_eq!(Opcode::from_mnemonic("jump"), None);
        assert!(Opcode::Push.has_operand());
        assert!(!Opcode::Push.takes_label());
        assert!(!Opcode::Halt.has_operand());
    }
}
