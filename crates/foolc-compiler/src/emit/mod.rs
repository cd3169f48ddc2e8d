//! Instruction emitter for the FOOL code generator.
//!
//! The [`CodeEmitter`] collects the main instruction sequence and one block
//! per function or method body. Blocks are opened with
//! [`begin_function`](CodeEmitter::begin_function) and closed with
//! [`end_function`](CodeEmitter::end_function); while a block is open every
//! emitted instruction goes into it. Closed blocks are appended after the main
//! sequence in the order they were closed, so a nested function's block comes
//! before the block of the function that declares it.
//!
//! # Example
//!
//! ```
//! use foolc_compiler::bytecode::Instruction;
//! use foolc_compiler::emit::CodeEmitter;
//!
//! let mut emitter = CodeEmitter::new();
//! emitter.emit(Instruction::push(1));
//! emitter.emit(Instruction::Print);
//! emitter.emit(Instruction::Halt);
//!
//! let assembly = emitter.finish();
//! assert_eq!(assembly.to_text(), "push 1\nprint\nhalt\n");
//! ```

mod labels;

pub use labels::LabelGenerator;

use crate::bytecode::{Assembly, Instruction, Label, Line};

/// Emits instructions into the main sequence or the innermost open block.
#[derive(Debug, Default)]
pub struct CodeEmitter {
    /// Main program sequence
    main: Vec<Line>,

    /// Function blocks being generated (innermost last)
    open: Vec<Vec<Line>>,

    /// Finished function blocks
    functions: Vec<Line>,

    labels: LabelGenerator,
}

impl CodeEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    fn current(&mut self) -> &mut Vec<Line> {
        match self.open.last_mut() {
            Some(block) => block,
            None => &mut self.main,
        }
    }

    // ==========================================================================
    // Basic Emission
    // ==========================================================================

    /// Emit a single instruction.
    pub fn emit(&mut self, instr: Instruction) {
        self.current().push(Line::Instr(instr));
    }

    /// Emit several instructions in order.
    pub fn emit_all(&mut self, instrs: impl IntoIterator<Item = Instruction>) {
        for instr in instrs {
            self.emit(instr);
        }
    }

    /// Emit `instr` `count` times.
    pub fn emit_repeated(&mut self, instr: Instruction, count: usize) {
        for _ in 0..count {
            self.emit(instr);
        }
    }

    /// Define `label` at the current position.
    pub fn place_label(&mut self, label: Label) {
        self.current().push(Line::Label(label));
    }

    // ==========================================================================
    // Labels
    // ==========================================================================

    pub fn fresh_label(&mut self) -> Label {
        self.labels.fresh_branch()
    }

    pub fn fresh_function_label(&mut self) -> Label {
        self.labels.fresh_function()
    }

    // ==========================================================================
    // Function Blocks
    // ==========================================================================

    /// Start collecting a function block.
    pub fn begin_function(&mut self) {
        self.open.push(Vec::new());
    }

    /// Close the innermost block and file it under `label`.
    pub fn end_function(&mut self, label: Label) {
        let body = self.open.pop().unwrap_or_default();
        self.functions.push(Line::Label(label));
        self.functions.extend(body);
    }

    /// Whether a function block is currently open.
    pub fn in_function(&self) -> bool {
        !self.open.is_empty()
    }

    /// Finish emission: main sequence followed by every closed block.
    pub fn finish(mut self) -> Assembly {
        // Blocks left open are flushed into the main sequence.
        while let Some(block) = self.open.pop() {
            self.main.extend(block);
        }
        self.main.extend(self.functions);
        Assembly::new(self.main)
    }
}
