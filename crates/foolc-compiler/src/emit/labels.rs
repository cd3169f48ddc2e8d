//! Fresh label allocation.
//!
//! Branch labels and function labels are numbered independently. Numbers only
//! ever grow, so every label handed out during one compilation is unique.

use crate::bytecode::Label;

/// Allocates fresh branch and function labels.
#[derive(Debug, Default)]
pub struct LabelGenerator {
    next_branch: u32,
    next_function: u32,
}

impl LabelGenerator {
    /// Create a new generator starting at `label0` / `function0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a branch target label.
    pub fn fresh_branch(&mut self) -> Label {
        let label = Label::branch(self.next_branch);
        self.next_branch += 1;
        label
    }

    /// Allocate a label for a function or method block.
    pub fn fresh_function(&mut self) -> Label {
        let label = Label::function(self.next_function);
        self.next_function += 1;
        label
    }

    /// Number of branch labels handed out so far.
    pub fn branch_count(&self) -> u32 {
        self.next_branch
    }

    /// Number of function labels handed out so far.
    pub fn function_count(&self) -> u32 {
        self.next_function
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_labels_are_sequential() {
        let mut labels = LabelGenerator::new();
        assert_eq!(labels.fresh_branch().to_string(), "label0");
        assert_eq!(labels.fresh_branch().to_string(), "label1");
        assert_eq!(labels.branch_count(), 2);
    }

    #[test]
    fn families_are_independent() {
        let mut labels = LabelGenerator::new();
        labels.fresh_branch();
        labels.fresh_branch();
        assert_eq!(labels.fresh_function().to_string(), "function0");
        assert_eq!(labels.fresh_branch().to_string(), "label2");
        assert_eq!(labels.function_count(), 1);
    }
}
