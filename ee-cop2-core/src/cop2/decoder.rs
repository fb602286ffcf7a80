//! COP2 Instruction Decoder
//!
//! Turns a classified 32-bit word into a [`DecodedInstruction`]: the instruction kind,
//! up to three typed operands and the byte length (always 4).
//!
//! # Decoding Algorithm
//! 1. Classify the word by its top bits ([`classify_word`])
//! 2. COP2 path: look the opcode key up in the [`OpcodeTable`], run the format's extractor
//!    and attach the format's operand roles to the register slots
//! 3. Branch-on-flag path: compute the branch target from the 16-bit displacement
//! 4. Cache path: capture the function selector and the base+offset operand
//!
//! All state lives in the read-only tables built by [`Cop2Decoder::new`]; decoding the
//! same word at the same address always yields an identical result.
//!
//! # Memory Optimizations
//! - Operands are kept in a `SmallVec<[Operand; 3]>`, no instruction has more than three
//! - Definitions are `&'static` references into the opcode table, never copied

use crate::cop2::classify::{classify_word, WordShape};
use crate::cop2::error::{Cop2Error, Cop2Result};
use crate::cop2::formats::{Component, FormatRegistry, OperandRole, Register, Slot};
use crate::cop2::opcodes::{InstructionDefinition, OpcodeTable};
use serde::Serialize;
use smallvec::{smallvec, SmallVec};

/// Size of every instruction handled here, in bytes.
pub const INSTRUCTION_SIZE: u32 = 4;

/// Condition tested by the branch-on-flag family, from bits 16-17.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum FlagCondition {
    /// Branch if the flag is clear
    False = 0,
    /// Branch if the flag is set
    True = 1,
    /// Branch if clear, likely (delay slot nullified when not taken)
    FalseLikely = 2,
    /// Branch if set, likely
    TrueLikely = 3,
}

impl FlagCondition {
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => FlagCondition::False,
            1 => FlagCondition::True,
            2 => FlagCondition::FalseLikely,
            _ => FlagCondition::TrueLikely,
        }
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            FlagCondition::False => "bc0f",
            FlagCondition::True => "bc0t",
            FlagCondition::FalseLikely => "bc0fl",
            FlagCondition::TrueLikely => "bc0tl",
        }
    }
}

/// Which table entry or side format produced an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstructionKind {
    /// COP2 macro instruction from the opcode table
    Table(&'static InstructionDefinition),
    /// Branch on COP0 condition flag
    BranchOnFlag(FlagCondition),
    /// Cache management operation
    Cache,
}

/// 4-bit destination component mask (bits 21-24), x is the most significant bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DestMask(pub u8);

impl DestMask {
    #[inline]
    pub fn from_word(word: u32) -> Self {
        DestMask(((word >> 21) & 0xF) as u8)
    }

    /// Mnemonic suffix, e.g. `0b1010` -> `".xz"`. An empty mask still yields `"."`.
    pub fn suffix(self) -> String {
        let mut suffix = String::with_capacity(5);
        suffix.push('.');
        for (bit, letter) in [(3, 'x'), (2, 'y'), (1, 'z'), (0, 'w')] {
            if (self.0 >> bit) & 1 != 0 {
                suffix.push(letter);
            }
        }
        suffix
    }
}

/// Decoded operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Operand {
    /// Register with the role that governs its rendering
    Register {
        role: OperandRole,
        register: Register,
        field: Option<Component>,
    },
    /// Unsigned immediate (5-bit for viaddi)
    Immediate(u32),
    /// vcallms target in 8-byte units; the VU0 byte address is `value << 3`
    MicroAddress(u16),
    /// Branch target
    NearAddress(u32),
    /// 5-bit cache function selector
    CacheFunction(u8),
    /// Base GPR plus raw 16-bit offset
    Displacement { base: u8, offset: u16 },
}

/// Decoded instruction with raw word and address for reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedInstruction {
    pub kind: InstructionKind,
    /// Address of the first byte
    pub address: u32,
    /// Raw instruction word
    pub raw: u32,
    /// Consumed bytes, always [`INSTRUCTION_SIZE`]
    pub size: u32,
    /// Destination mask, present only for definitions with `has_dest`
    pub dest: Option<DestMask>,
    pub operands: SmallVec<[Operand; 3]>,
}

impl DecodedInstruction {
    /// Table definition, `None` for the side formats.
    pub fn definition(&self) -> Option<&'static InstructionDefinition> {
        match self.kind {
            InstructionKind::Table(definition) => Some(definition),
            _ => None,
        }
    }

    /// Taken-branch target of a branch-on-flag instruction.
    pub fn branch_target(&self) -> Option<u32> {
        match (self.kind, self.operands.first()) {
            (InstructionKind::BranchOnFlag(_), Some(Operand::NearAddress(target))) => Some(*target),
            _ => None,
        }
    }
}

/// Target of a branch-on-flag instruction at `address` with 16-bit displacement `field`.
///
/// Non-negative displacements count words from the delay slot (`address + 4`).
/// Negative ones are taken as the one's complement word count back from `address`,
/// which lands on the same target.
#[inline]
pub fn branch_target(address: u32, field: u16) -> u32 {
    if field > 0x7FFF {
        let back = u32::from(!field) << 2;
        address.wrapping_sub(back)
    } else {
        address
            .wrapping_add(u32::from(field) << 2)
            .wrapping_add(INSTRUCTION_SIZE)
    }
}

/// Classification of a word against the opcode table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Table(&'static InstructionDefinition),
    BranchOnFlag,
    Cache,
}

/// COP2 decoder holding the opcode table and format registry.
#[derive(Debug, Clone)]
pub struct Cop2Decoder {
    table: OpcodeTable,
    formats: FormatRegistry,
}

impl Cop2Decoder {
    /// Build the opcode table and format registry.
    ///
    /// # Errors
    /// Any table invariant violation; callers treat this as fatal.
    pub fn new() -> Cop2Result<Self> {
        Self::with_table(OpcodeTable::new()?)
    }

    /// Build a decoder around a custom table.
    pub fn with_table(table: OpcodeTable) -> Cop2Result<Self> {
        let formats = FormatRegistry::new()?;
        for definition in table.iter() {
            if formats.get(definition.format).is_none() {
                return Err(Cop2Error::MissingFormat {
                    mnemonic: definition.mnemonic,
                    format: definition.format,
                });
            }
        }
        Ok(Self { table, formats })
    }

    pub fn table(&self) -> &OpcodeTable {
        &self.table
    }

    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Classify a word, resolving COP2 words against the opcode table.
    ///
    /// Exactly one table lookup happens per call.
    pub fn classify(&self, word: u32) -> Option<Classification> {
        match classify_word(word)? {
            WordShape::Cop2 { key } => {
                let found = self.table.lookup(key);
                if found.is_none() {
                    log::debug!("COP2 word 0x{:08X}: opcode 0x{:03X} not in table", word, key);
                }
                found.map(Classification::Table)
            }
            WordShape::BranchOnFlag => Some(Classification::BranchOnFlag),
            WordShape::Cache => Some(Classification::Cache),
        }
    }

    /// Decode `word` located at `address`.
    ///
    /// Returns `None` when the word is not handled here (zero bytes consumed).
    #[inline]
    pub fn decode(&self, word: u32, address: u32) -> Option<DecodedInstruction> {
        let decoded = match self.classify(word)? {
            Classification::Table(definition) => self.decode_table(definition, word, address)?,
            Classification::BranchOnFlag => decode_branch_on_flag(word, address),
            Classification::Cache => decode_cache(word, address),
        };
        log::trace!("0x{:08X}: 0x{:08X} -> {:?}", address, word, decoded.kind);
        Some(decoded)
    }

    /// Description of the table definition behind `insn`, for auto-comments.
    pub fn auto_comment(&self, insn: &DecodedInstruction) -> Option<&'static str> {
        insn.definition().map(|definition| definition.description)
    }

    fn decode_table(
        &self,
        definition: &'static InstructionDefinition,
        word: u32,
        address: u32,
    ) -> Option<DecodedInstruction> {
        let descriptor = self.formats.get(definition.format)?;
        let mut roles = descriptor.roles.iter().copied();
        let mut operands: SmallVec<[Operand; 3]> = SmallVec::new();

        for slot in descriptor.extract(word) {
            let operand = match slot {
                Slot::Register(register, field) => Operand::Register {
                    role: roles.next()?,
                    register,
                    field,
                },
                Slot::Immediate(value) => Operand::Immediate(value),
                Slot::MicroAddress(value) => Operand::MicroAddress(value),
            };
            operands.push(operand);
        }

        Some(DecodedInstruction {
            kind: InstructionKind::Table(definition),
            address,
            raw: word,
            size: INSTRUCTION_SIZE,
            dest: definition.has_dest.then(|| DestMask::from_word(word)),
            operands,
        })
    }
}

fn decode_branch_on_flag(word: u32, address: u32) -> DecodedInstruction {
    let condition = FlagCondition::from_bits(word >> 16);
    let target = branch_target(address, (word & 0xFFFF) as u16);
    DecodedInstruction {
        kind: InstructionKind::BranchOnFlag(condition),
        address,
        raw: word,
        size: INSTRUCTION_SIZE,
        dest: None,
        operands: smallvec![Operand::NearAddress(target)],
    }
}

fn decode_cache(word: u32, address: u32) -> DecodedInstruction {
    DecodedInstruction {
        kind: InstructionKind::Cache,
        address,
        raw: word,
        size: INSTRUCTION_SIZE,
        dest: None,
        operands: smallvec![
            Operand::CacheFunction(((word >> 16) & 0x1F) as u8),
            Operand::Displacement {
                base: ((word >> 21) & 0x1F) as u8,
                offset: (word & 0xFFFF) as u16,
            },
        ],
    }
}
