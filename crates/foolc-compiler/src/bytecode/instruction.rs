//! Stack machine instructions.
//!
//! This module defines the instruction set of the FOOL stack machine. The
//! textual form produced by `Display` is the exchange format with the
//! interpreter: one instruction per line, operands separated by a space.

use std::fmt;

/// Which label family a label belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelKind {
    /// Branch target inside a block, printed `label<n>`.
    Branch,
    /// Entry point of a function or method body, printed `function<n>`.
    Function,
}

/// A code label. Labels are never reused within one compilation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label {
    pub kind: LabelKind,
    pub index: u32,
}

impl Label {
    pub fn branch(index: u32) -> Self {
        Self {
            kind: LabelKind::Branch,
            index,
        }
    }

    pub fn function(index: u32) -> Self {
        Self {
            kind: LabelKind::Function,
            index,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            LabelKind::Branch => write!(f, "label{}", self.index),
            LabelKind::Function => write!(f, "function{}", self.index),
        }
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

/// Operand of `push`: an integer or the address a label resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    Int(i64),
    Label(Label),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Int(value) => write!(f, "{value}"),
            Operand::Label(label) => write!(f, "{label}"),
        }
    }
}

/// Stack machine instructions.
///
/// Binary operations pop the right operand first, then the left one, and
/// push the result. `sw` pops the address, then the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Instruction {
    /// Push an integer or a label address.
    Push(Operand),
    /// Discard the top of the stack.
    Pop,
    Add,
    Sub,
    Mult,
    Div,
    /// `memory[pop] = pop`
    StoreWord,
    /// `push(memory[pop])`
    LoadWord,
    /// Unconditional jump.
    Branch(Label),
    /// Jump if the two popped values are equal.
    BranchEq(Label),
    /// Jump if left <= right.
    BranchLessEq(Label),
    /// Pop an address, save the next instruction in `$ra`, jump.
    JumpSubroutine,
    /// Push `$ra`.
    LoadRa,
    /// Pop into `$ra`.
    StoreRa,
    /// Push `$tm`.
    LoadTm,
    /// Pop into `$tm`.
    StoreTm,
    /// Push `$fp`.
    LoadFp,
    /// Pop into `$fp`.
    StoreFp,
    /// `$fp = $sp`
    CopyFp,
    /// Push `$hp`.
    LoadHp,
    /// Pop into `$hp`.
    StoreHp,
    /// Print the top of the stack without popping it.
    Print,
    Halt,
}

impl Instruction {
    /// `push <value>`
    pub fn push(value: i64) -> Self {
        Instruction::Push(Operand::Int(value))
    }

    /// `push <label>`
    pub fn push_label(label: Label) -> Self {
        Instruction::Push(Operand::Label(label))
    }

    /// The mnemonic used in the textual format.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Instruction::Push(_) => "push",
            Instruction::Pop => "pop",
            Instruction::Add => "add",
            Instruction::Sub => "sub",
            Instruction::Mult => "mult",
            Instruction::Div => "div",
            Instruction::StoreWord => "sw",
            Instruction::LoadWord => "lw",
            Instruction::Branch(_) => "b",
            Instruction::BranchEq(_) => "beq",
            Instruction::BranchLessEq(_) => "bleq",
            Instruction::JumpSubroutine => "js",
            Instruction::LoadRa => "lra",
            Instruction::StoreRa => "sra",
            Instruction::LoadTm => "ltm",
            Instruction::StoreTm => "stm",
            Instruction::LoadFp => "lfp",
            Instruction::StoreFp => "sfp",
            Instruction::CopyFp => "cfp",
            Instruction::LoadHp => "lhp",
            Instruction::StoreHp => "shp",
            Instruction::Print => "print",
            Instruction::Halt => "halt",
        }
    }

    /// The label this instruction refers to, if any.
    pub fn target(&self) -> Option<Label> {
        match self {
            Instruction::Push(Operand::Label(label))
            | Instruction::Branch(label)
            | Instruction::BranchEq(label)
            | Instruction::BranchLessEq(label) => Some(*label),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Push(operand) => write!(f, "push {operand}"),
            Instruction::Branch(label)
            | Instruction::BranchEq(label)
            | Instruction::BranchLessEq(label) => write!(f, "{} {label}", self.mnemonic()),
            _ => f.write_str(self.mnemonic()),
        }
    }
}
