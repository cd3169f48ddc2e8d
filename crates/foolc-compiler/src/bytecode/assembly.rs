//! Generated program text.
//!
//! An [`Assembly`] is the main instruction sequence followed by every
//! function and method block, each introduced by its label line.

use std::fmt;

use super::{Instruction, Label};

/// One line of output: a label definition or an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    Label(Label),
    Instr(Instruction),
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Line::Label(label) => write!(f, "{label}:"),
            Line::Instr(instr) => write!(f, "{instr}"),
        }
    }
}

/// A complete generated program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assembly {
    lines: Vec<Line>,
}

impl Assembly {
    pub fn new(lines: Vec<Line>) -> Self {
        Self { lines }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Instructions only, label lines skipped.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.lines.iter().filter_map(|line| match line {
            Line::Instr(instr) => Some(instr),
            Line::Label(_) => None,
        })
    }

    /// Labels defined in this program, in order of appearance.
    pub fn labels(&self) -> impl Iterator<Item = Label> + '_ {
        self.lines.iter().filter_map(|line| match line {
            Line::Label(label) => Some(*label),
            Line::Instr(_) => None,
        })
    }

    /// Number of instructions, label lines excluded.
    pub fn instruction_count(&self) -> usize {
        self.instructions().count()
    }

    /// The textual program, one line per instruction or label.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_has_one_line_each() {
        let assembly = Assembly::new(vec![
            Line::Instr(Instruction::push(1)),
            Line::Label(Label::branch(0)),
            Line::Instr(Instruction::Halt),
        ]);
        assert_eq!(assembly.to_text(), "push 1\nlabel0:\nhalt\n");
        assert_eq!(assembly.instruction_count(), 2);
        assert_eq!(assembly.labels().collect::<Vec<_>>(), [Label::branch(0)]);
    }
}
