//! Assembler for the textual instruction format.
//!
//! One instruction per line: a mnemonic, optionally followed by an operand.
//! A token ending in `:` defines a label at the next instruction. `push`
//! takes a number or a label; branches take a label.

use rustc_hash::FxHashMap;

use crate::error::VmError;
use crate::opcode::Opcode;

/// Translate assembly text to code words, resolving every label.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn assemble(source: &str) -> Result<Vec<i64>, VmError> {
    let mut code = Vec::new();
    let mut labels: FxHashMap<&str, i64> = FxHashMap::default();
    let mut fixups: Vec<(usize, &str)> = Vec::new();

    for (index, line) in source.lines().enumerate() {
        let line_number = index + 1;
        let mut tokens = line.split_whitespace().peekable();

        while let Some(label) = tokens.peek().and_then(|t| t.strip_suffix(':')) {
            labels.entry(label).or_insert(code.len() as i64);
            tokens.next();
        }

        let Some(mnemonic) = tokens.next() else {
            continue;
        };
        let opcode = Opcode::from_mnemonic(mnemonic).ok_or_else(|| VmError::UnknownMnemonic {
            mnemonic: mnemonic.to_string(),
            line: line_number,
        })?;
        code.push(i64::from(opcode));

        let bad_operand = || VmError::BadOperand {
            mnemonic: mnemonic.to_string(),
            line: line_number,
        };
        match (opcode.has_operand(), tokens.next()) {
            (false, None) => {}
            (true, Some(operand)) => match operand.parse::<i64>() {
                Ok(value) if !opcode.takes_label() => code.push(value),
                Ok(_) => return Err(bad_operand()),
                Err(_) => {
                    fixups.push((code.len(), operand));
                    code.push(0);
                }
            },
            _ => return Err(bad_operand()),
        }
        if tokens.next().is_some() {
            return Err(bad_operand());
        }
    }

    for (position, label) in fixups {
        let address = labels
            .get(label)
            .ok_or_else(|| VmError::UndefinedLabel {
                label: label.to_string(),
            })?;
        code[position] = *address;
    }

    tracing::debug!(words = code.len(), labels = labels.len(), "assembled");
    Ok(code)
}
