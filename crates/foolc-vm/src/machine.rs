//! The stack machine interpreter.
//!
//! Memory is a single array of words. The stack starts at the top and grows
//! downwards; the heap starts at 0 and grows upwards. Registers: `ip`, `sp`,
//! `fp`, `hp`, plus `ra` (return address) and `tm` (temporary).

use crate::error::VmError;
use crate::opcode::Opcode;

/// Default memory size, in words.
pub const DEFAULT_MEMORY_SIZE: i64 = 10_000;

/// Machine parameters. `memory_size` must match the one the program was
/// compiled for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    pub memory_size: i64,
    /// Abort after this many executed instructions.
    pub max_steps: Option<u64>,
}

impl MachineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory_size(mut self, memory_size: i64) -> Self {
        self.memory_size = memory_size;
        self
    }

    pub fn with_max_steps(mut self, max_steps: Option<u64>) -> Self {
        self.max_steps = max_steps;
        self
    }
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: DEFAULT_MEMORY_SIZE,
            max_steps: Some(10_000_000),
        }
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outcome {
    /// Values printed, in order.
    pub output: Vec<i64>,
    /// Top of the stack at `halt`, if the stack was not empty.
    pub result: Option<i64>,
    pub steps: u64,
}

/// The stack machine.
#[derive(Debug)]
pub struct Machine {
    config: MachineConfig,
    memory: Vec<i64>,
    ip: i64,
    sp: i64,
    fp: i64,
    hp: i64,
    ra: i64,
    tm: i64,
}

impl Machine {
    pub fn new(config: MachineConfig) -> Self {
        let size = config.memory_size.max(0);
        Self {
            memory: vec![0; size as usize],
            ip: 0,
            sp: size,
            fp: size,
            hp: 0,
            ra: 0,
            tm: 0,
            config,
        }
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Run `code` from its first word until `halt`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run(&mut self, code: &[i64]) -> Result<Outcome, VmError> {
        let mut outcome = Outcome::default();

        loop {
            if self.sp <= self.hp {
                return Err(VmError::OutOfMemory {
                    sp: self.sp,
                    hp: self.hp,
                });
            }
            if let Some(limit) = self.config.max_steps {
                if outcome.steps >= limit {
                    return Err(VmError::StepLimit { limit });
                }
            }
            outcome.steps += 1;

            let address = self.ip;
            let word = fetch(code, address)?;
            let opcode = Opcode::try_from(word)
                .map_err(|_| VmError::InvalidOpcode { word, address })?;
            self.ip += 1;

            match opcode {
                Opcode::Push => {
                    let value = fetch(code, self.ip)?;
                    self.ip += 1;
                    self.push(value)?;
                }
                Opcode::Pop => {
                    self.pop()?;
                }
                Opcode::Add => self.binary(|a, b| Ok(a.wrapping_add(b)))?,
                Opcode::Sub => self.binary(|a, b| Ok(a.wrapping_sub(b)))?,
                Opcode::Mult => self.binary(|a, b| Ok(a.wrapping_mul(b)))?,
                Opcode::Div => self.binary(|a, b| {
                    a.checked_div(b)
                        .ok_or(VmError::DivisionByZero { address })
                })?,
                Opcode::StoreWord => {
                    let target = self.pop()?;
                    let value = self.pop()?;
                    *self.slot(target)? = value;
                }
                Opcode::LoadWord => {
                    let source = self.pop()?;
                    let value = *self.slot(source)?;
                    self.push(value)?;
                }
                Opcode::Branch => {
                    self.ip = fetch(code, self.ip)?;
                }
                Opcode::BranchEq | Opcode::BranchLessEq => {
                    let target = fetch(code, self.ip)?;
                    self.ip += 1;
                    let right = self.pop()?;
                    let left = self.pop()?;
                    let taken = match opcode {
                        Opcode::BranchEq => left == right,
                        _ => left <= right,
                    };
                    if taken {
                        self.ip = target;
                    }
                }
                Opcode::JumpSubroutine => {
                    let target = self.pop()?;
                    self.ra = self.ip;
                    self.ip = target;
                }
                Opcode::LoadRa => self.push(self.ra)?,
                Opcode::StoreRa => self.ra = self.pop()?,
                Opcode::LoadTm => self.push(self.tm)?,
                Opcode::StoreTm => self.tm = self.pop()?,
                Opcode::LoadFp => self.push(self.fp)?,
                Opcode::StoreFp => self.fp = self.pop()?,
                Opcode::CopyFp => self.fp = self.sp,
                Opcode::LoadHp => self.push(self.hp)?,
                Opcode::StoreHp => self.hp = self.pop()?,
                Opcode::Print => match self.top() {
                    Some(value) => {
                        tracing::debug!(value, "print");
                        outcome.output.push(value);
                    }
                    None => tracing::debug!("print on empty stack"),
                },
                Opcode::Halt => {
                    outcome.result = self.top();
                    tracing::debug!(steps = outcome.steps, result = ?outcome.result, "halted");
                    return Ok(outcome);
                }
            }
        }
    }

    // ==========================================================================
    // Stack
    // ==========================================================================

    fn top(&self) -> Option<i64> {
        if self.sp < self.config.memory_size {
            self.memory.get(self.sp as usize).copied()
        } else {
            None
        }
    }

    fn push(&mut self, value: i64) -> Result<(), VmError> {
        let address = self.sp - 1;
        *self.slot(address)? = value;
        self.sp = address;
        Ok(())
    }

    fn pop(&mut self) -> Result<i64, VmError> {
        let value = *self.slot(self.sp)?;
        self.sp += 1;
        Ok(value)
    }

    /// Pop `b`, then `a`, push `op(a, b)`.
    fn binary(&mut self, op: impl FnOnce(i64, i64) -> Result<i64, VmError>) -> Result<(), VmError> {
        let b = self.pop()?;
        let a = self.pop()?;
        self.push(op(a, b)?)
    }

    fn slot(&mut self, address: i64) -> Result<&mut i64, VmError> {
        usize::try_from(address)
            .ok()
            .and_then(|index| self.memory.get_mut(index))
            .ok_or(VmError::AddressOutOfRange { address })
    }
}

fn fetch(code: &[i64], address: i64) -> Result<i64, VmError> {
    usize::try_from(address)
        .ok()
        .and_then(|index| code.get(index).copied())
        .ok_or(VmError::AddressOutOfRange { address })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;

    fn run(source: &str) -> Result<Outcome, VmError> {
        let code = assemble(source)?;
        Machine::new(MachineConfig::default()).run(&code)
    }

    #[test]
    fn operands_keep_their_order() {
        let outcome = run("push 10\npush 3\nsub\nprint\npush 2\ndiv\nhalt\n").unwrap();
        assert_eq!(outcome.output, [7]);
        assert_eq!(outcome.result, Some(3));
    }

    #[test]
    fn less_equal_branch() {
        let source = "push 2\npush 5\nbleq yes\npush 0\nb end\nyes:\npush 1\nend:\nhalt\n";
        assert_eq!(run(source).unwrap().result, Some(1));
    }

    #[test]
    fn heap_store_and_load() {
        let source = "push 42\nlhp\nsw\nlhp\npush 1\nadd\nshp\nlhp\npush -1\nadd\nlw\nhalt\n";
        assert_eq!(run(source).unwrap().result, Some(42));
    }

    #[test]
    fn subroutine_round_trip() {
        let source = "push f\njs\nhalt\nf:\npush 9\nlra\njs\n";
        let outcome = run(source).unwrap();
        assert_eq!(outcome.result, Some(9));
    }

    #[test]
    fn empty_stack_at_halt() {
        assert_eq!(run("print\nhalt\n").unwrap(), Outcome {
            output: vec![],
            result: None,
            steps: 2,
        });
    }

    #[test]
    fn runtime_errors() {
        assert_eq!(
            run("push 1\npush 0\ndiv\nhalt\n"),
            Err(VmError::DivisionByZero { address: 4 })
        );
        assert_eq!(
            run("push -1\nlw\nhalt\n"),
            Err(VmError::AddressOutOfRange { address: -1 })
        );
        assert_eq!(run("pop\nhalt\n"), Err(VmError::AddressOutOfRange { address: 10_000 }));
        assert_eq!(
            Machine::new(MachineConfig::default()).run(&[77]),
            Err(VmError::InvalidOpcode { word: 77, address: 0 })
        );
    }

    #[test]
    fn heap_meeting_stack_is_out_of_memory() {
        let config = MachineConfig::new().with_memory_size(4);
        let code = assemble("push 3\nshp\npush 1\nhalt\n").unwrap();
        assert!(matches!(
            Machine::new(config).run(&code),
            Err(VmError::OutOfMemory { .. })
        ));
    }

    #[test]
    fn step_limit() {
        let config = MachineConfig::new().with_max_steps(Some(100));
        let code = assemble("loop:\nb loop\n").unwrap();
        assert_eq!(
            Machine::new(config).run(&code),
            Err(VmError::StepLimit { limit: 100 })
        );
    }
}
