//! Test Utilities
//!
//! Word builders and in-memory host services shared by the integration tests.

#![allow(dead_code)]

use ee_cop2_core::{Cop2Error, Cop2Result, MemoryReader};

/// COP2 macro-op prefix (`010010 1` in the top seven bits).
pub const COP2_BASE: u32 = 0x4A00_0000;

/// Build a COP2 word. `fd` is ignored for extended (11-bit) opcodes, whose
/// function code overlaps the fd field.
pub fn cop2_word(opcode: u16, dest: u32, ft: u32, fs: u32, fd: u32) -> u32 {
    let fields = ((dest & 0xF) << 21) | ((ft & 0x1F) << 16) | ((fs & 0x1F) << 11);
    if opcode & 0x3C == 0x3C {
        COP2_BASE | fields | u32::from(opcode)
    } else {
        COP2_BASE | fields | ((fd & 0x1F) << 6) | u32::from(opcode)
    }
}

/// Build a branch-on-flag word.
pub fn bc0_word(condition: u32, displacement: u16) -> u32 {
    0x4100_0000 | ((condition & 3) << 16) | u32::from(displacement)
}

/// Build a cache word.
pub fn cache_word(function: u32, base: u32, offset: u16) -> u32 {
    (0x2F << 26) | ((base & 0x1F) << 21) | ((function & 0x1F) << 16) | u32::from(offset)
}

/// Little word-addressed memory image.
pub struct MockMemory {
    pub base: u32,
    pub words: Vec<u32>,
}

impl MockMemory {
    pub fn new(base: u32, words: &[u32]) -> Self {
        Self {
            base,
            words: words.to_vec(),
        }
    }
}

impl MemoryReader for MockMemory {
    fn read_word(&self, address: u32) -> Cop2Result<u32> {
        address
            .checked_sub(self.base)
            .map(|offset| (offset / 4) as usize)
            .and_then(|index| self.words.get(index).copied())
            .ok_or(Cop2Error::UnmappedAddress { address })
    }
}
