//! Mnemonic table used by the assembler.

use crate::cpu::{AddressingMode, Opcode};
use std::collections::HashMap;

/// One row of the instruction set: how a mnemonic is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionEntry {
    pub mnemonic: &'static str,
    pub opcode: Opcode,
    pub mode: AddressingMode,
}

/// Immutable mnemonic table, keyed by lowercase mnemonic.
#[derive(Debug, Clone)]
pub struct InstructionSet {
    entries: HashMap<&'static str, InstructionEntry>,
}

impl InstructionSet {
    /// Build the table holding all 20 RISC-AR5 instructions.
    pub fn new() -> Self {
        let entries = Opcode::ALL
            .iter()
            .map(|&opcode| {
                let entry = InstructionEntry {
                    mnemonic: opcode.mnemonic(),
                    opcode,
                    mode: opcode.mode(),
                };
                (entry.mnemonic, entry)
            })
            .collect();
        Self { entries }
    }

    /// Look up a mnemonic, ignoring case.
    pub fn get(&self, mnemonic: &str) -> Option<&InstructionEntry> {
        self.entries.get(mnemonic.to_ascii_lowercase().as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, ordered by opcode.
    pub fn entries(&self) -> impl Iterator<Item = &InstructionEntry> {
        let mut entries: Vec<_> = self.entries.values().collect();
        entries.sort_by_key(|e| e.opcode.code());
        entries.into_iter()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::new()
    }
}
