//! Opcode Table
//!
//! Static catalog of the COP2 macro-mode instructions, keyed by the 11-bit function
//! code of the instruction word.
//!
//! # Lookup Algorithm
//! The opcode space is sparse and clustered: extended opcodes only ever occupy the
//! `0x100`, `0x200`, `0x300` and `0x400` ranges (`opcode & 0xF00`). The table is sorted
//! once at construction and remembers where each cluster starts, so a lookup scans
//! linearly from the first entry of its cluster instead of from index 0.
//!
//! A miss is not an error. It means the word is not a COP2 instruction and the host
//! decoder should handle it.

use crate::cop2::error::{Cop2Error, Cop2Result};
use crate::cop2::formats::FormatId;
use bitvec::prelude::*;
use serde::Serialize;

/// Number of distinct 11-bit opcodes.
const OPCODE_SPACE: usize = 0x800;

/// Cluster masks with a recorded start index.
const CLUSTERS: [u16; 4] = [0x100, 0x200, 0x300, 0x400];

/// One instruction definition of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct InstructionDefinition {
    /// 11-bit function code
    pub opcode: u16,
    /// Lowercase display name
    pub mnemonic: &'static str,
    /// Format registry entry used to extract operands
    pub format: FormatId,
    /// Whether the x/y/z/w destination mask is decoded and appended to the mnemonic
    pub has_dest: bool,
    /// One-line explanation, only used for comments
    pub description: &'static str,
}

const fn def(
    opcode: u16,
    mnemonic: &'static str,
    format: FormatId,
    has_dest: bool,
    description: &'static str,
) -> InstructionDefinition {
    InstructionDefinition {
        opcode,
        mnemonic,
        format,
        has_dest,
        description,
    }
}

/// Every COP2 macro instruction, grouped by family.
pub static DEFINITIONS: &[InstructionDefinition] = &[
    // Floating-point arithmetic
    def(0x1FD, "vabs", 1, true, "Absolute"),
    def(0x028, "vadd", 2, true, "Addition"),
    def(0x022, "vaddi", 3, true, "ADD broadcast I register"),
    def(0x020, "vaddq", 4, true, "ADD broadcast Q register"),
    def(0x000, "vaddx", 23, true, "ADD broadcast bc field"),
    def(0x001, "vaddy", 23, true, "ADD broadcast bc field"),
    def(0x002, "vaddz", 23, true, "ADD broadcast bc field"),
    def(0x003, "vaddw", 23, true, "ADD broadcast bc field"),
    def(0x2BC, "vadda", 5, true, "ADD output to ACC"),
    def(0x23E, "vaddai", 6, true, "ADD output to ACC broadcast I register"),
    def(0x23C, "vaddaq", 7, true, "ADD output to ACC broadcast Q register"),
    def(0x03C, "vaddax", 8, true, "ADD output to ACC broadcast bc field"),
    def(0x03D, "vadday", 8, true, "ADD output to ACC broadcast bc field"),
    def(0x03E, "vaddaz", 8, true, "ADD output to ACC broadcast bc field"),
    def(0x03F, "vaddaw", 8, true, "ADD output to ACC broadcast bc field"),
    def(0x02C, "vsub", 2, true, "Subtraction"),
    def(0x026, "vsubi", 3, true, "SUB broadcast I register"),
    def(0x024, "vsubq", 4, true, "SUB broadcast Q register"),
    def(0x004, "vsubx", 23, true, "SUB broadcast bc field"),
    def(0x005, "vsuby", 23, true, "SUB broadcast bc field"),
    def(0x006, "vsubz", 23, true, "SUB broadcast bc field"),
    def(0x007, "vsubw", 23, true, "SUB broadcast bc field"),
    def(0x2FC, "vsuba", 5, true, "SUB output to ACC"),
    def(0x27E, "vsubai", 6, true, "SUB output to ACC broadcast I register"),
    def(0x27C, "vsubaq", 7, true, "SUB output to ACC broadcast Q register"),
    def(0x07C, "vsubax", 8, true, "SUB output to ACC broadcast bc field"),
    def(0x07D, "vsubay", 8, true, "SUB output to ACC broadcast bc field"),
    def(0x07E, "vsubaz", 8, true, "SUB output to ACC broadcast bc field"),
    def(0x07F, "vsubaw", 8, true, "SUB output to ACC broadcast bc field"),
    def(0x02A, "vmul", 2, true, "Multiply"),
    def(0x01E, "vmuli", 3, true, "MUL broadcast I register"),
    def(0x01C, "vmulq", 4, true, "MUL broadcast Q register"),
    def(0x018, "vmulx", 23, true, "MUL broadcast bc field"),
    def(0x019, "vmuly", 23, true, "MUL broadcast bc field"),
    def(0x01A, "vmulz", 23, true, "MUL broadcast bc field"),
    def(0x01B, "vmulw", 23, true, "MUL broadcast bc field"),
    def(0x2BE, "vmula", 5, true, "MUL output to ACC"),
    def(0x1FE, "vmulai", 6, true, "MUL output to ACC broadcast I register"),
    def(0x1FC, "vmulaq", 7, true, "MUL output to ACC broadcast Q register"),
    def(0x1BC, "vmulax", 8, true, "MUL output to ACC broadcast bc field"),
    def(0x1BD, "vmulay", 8, true, "MUL output to ACC broadcast bc field"),
    def(0x1BE, "vmulaz", 8, true, "MUL output to ACC broadcast bc field"),
    def(0x1BF, "vmulaw", 8, true, "MUL output to ACC broadcast bc field"),
    def(0x029, "vmadd", 2, true, "MUL and ADD"),
    def(0x023, "vmaddi", 3, true, "MUL and ADD broadcast I register"),
    def(0x021, "vmaddq", 4, true, "MUL and ADD broadcast Q register"),
    def(0x008, "vmaddx", 23, true, "MUL and ADD broadcast bc field"),
    def(0x009, "vmaddy", 23, true, "MUL and ADD broadcast bc field"),
    def(0x00A, "vmaddz", 23, true, "MUL and ADD broadcast bc field"),
    def(0x00B, "vmaddw", 23, true, "MUL and ADD broadcast bc field"),
    def(0x2BD, "vmadda", 5, true, "MUL and ADD output to ACC"),
    def(0x23F, "vmaddai", 6, true, "MUL and ADD output to ACC broadcast I register"),
    def(0x23D, "vmaddaq", 7, true, "MUL and ADD output to ACC broadcast Q register"),
    def(0x0BC, "vmaddax", 8, true, "MUL and ADD output to ACC broadcast bc field"),
    def(0x0BD, "vmadday", 8, true, "MUL and ADD output to ACC broadcast bc field"),
    def(0x0BE, "vmaddaz", 8, true, "MUL and ADD output to ACC broadcast bc field"),
    def(0x0BF, "vmaddaw", 8, true, "MUL and ADD output to ACC broadcast bc field"),
    def(0x02D, "vmsub", 2, true, "MUL and SUB"),
    def(0x027, "vmsubi", 3, true, "MUL and SUB broadcast I register"),
    def(0x025, "vmsubq", 4, true, "MUL and SUB broadcast Q register"),
    def(0x00C, "vmsubx", 23, true, "MUL and SUB broadcast bc field"),
    def(0x00D, "vmsuby", 23, true, "MUL and SUB broadcast bc field"),
    def(0x00E, "vmsubz", 23, true, "MUL and SUB broadcast bc field"),
    def(0x00F, "vmsubw", 23, true, "MUL and SUB broadcast bc field"),
    def(0x2FD, "vmsuba", 5, true, "MUL and SUB output to ACC"),
    def(0x27F, "vmsubai", 6, true, "MUL and SUB output to ACC broadcast I register"),
    def(0x27D, "vmsubaq", 7, true, "MUL and SUB output to ACC broadcast Q register"),
    def(0x0FC, "vmsubax", 8, true, "MUL and SUB output to ACC broadcast bc field"),
    def(0x0FD, "vmsubay", 8, true, "MUL and SUB output to ACC broadcast bc field"),
    def(0x0FE, "vmsubaz", 8, true, "MUL and SUB output to ACC broadcast bc field"),
    def(0x0FF, "vmsubaw", 8, true, "MUL and SUB output to ACC broadcast bc field"),
    // Min/max
    def(0x02B, "vmax", 2, true, "Maximum"),
    def(0x01D, "vmaxi", 3, true, "Maximum broadcast I register"),
    def(0x010, "vmaxx", 23, true, "Maximum broadcast bc field"),
    def(0x011, "vmaxy", 23, true, "Maximum broadcast bc field"),
    def(0x012, "vmaxz", 23, true, "Maximum broadcast bc field"),
    def(0x013, "vmaxw", 23, true, "Maximum broadcast bc field"),
    def(0x02F, "vmini", 2, true, "Minimum"),
    def(0x01F, "vminii", 3, true, "Minimum broadcast I register"),
    def(0x014, "vminix", 23, true, "Minimum broadcast bc field"),
    def(0x015, "vminiy", 23, true, "Minimum broadcast bc field"),
    def(0x016, "vminiz", 23, true, "Minimum broadcast bc field"),
    def(0x017, "vminiw", 23, true, "Minimum broadcast bc field"),
    // Outer product and misc
    def(0x2FE, "vopmula", 9, false, "Outer product MULA"),
    def(0x02E, "vopmsub", 10, false, "Outer product MSUB"),
    def(0x2FF, "vnop", 0, false, "No operation"),
    // Conversions
    def(0x17C, "vftoi0", 1, true, "Float to integer, fixed point 0 bit"),
    def(0x17D, "vftoi4", 1, true, "Float to integer, fixed point 4 bits"),
    def(0x17E, "vftoi12", 1, true, "Float to integer, fixed point 12 bits"),
    def(0x17F, "vftoi15", 1, true, "Float to integer, fixed point 15 bits"),
    def(0x13C, "vitof0", 1, true, "Integer to float, fixed point 0 bit"),
    def(0x13D, "vitof4", 1, true, "Integer to float, fixed point 4 bits"),
    def(0x13E, "vitof12", 1, true, "Integer to float, fixed point 12 bits"),
    def(0x13F, "vitof15", 1, true, "Integer to float, fixed point 15 bits"),
    // Clipping, divide and square root
    def(0x1FF, "vclip", 11, false, "Clipping"),
    def(0x3BC, "vdiv", 12, false, "Floating divide"),
    def(0x3BD, "vsqrt", 13, false, "Floating square-root"),
    def(0x3BE, "vrsqrt", 12, false, "Floating reciprocal square-root"),
    // Integer arithmetic
    def(0x030, "viadd", 14, false, "Integer ADD"),
    def(0x032, "viaddi", 15, false, "Integer ADD immediate"),
    def(0x034, "viand", 14, false, "Integer AND"),
    def(0x035, "vior", 14, false, "Integer OR"),
    def(0x031, "visub", 14, false, "Integer SUB"),
    // Register transfer
    def(0x33C, "vmove", 16, true, "Move floating register"),
    def(0x3FD, "vmfir", 17, true, "Move from integer register"),
    def(0x3FC, "vmtir", 18, false, "Move to integer register"),
    def(0x33D, "vmr32", 16, true, "Rotate right 32 bits"),
    // Load/store
    def(0x37E, "vlqd", 26, true, "Load quadword with pre-decrement"),
    def(0x37C, "vlqi", 25, true, "Load quadword with post-increment"),
    def(0x37F, "vsqd", 24, true, "Store quadword with pre-decrement"),
    def(0x37D, "vsqi", 19, true, "Store quadword with post-increment"),
    def(0x3FE, "vilwr", 20, true, "Integer load word register"),
    def(0x3FF, "viswr", 20, true, "Integer store word register"),
    // Random unit
    def(0x43E, "vrinit", 21, false, "Random-unit init R register"),
    def(0x43D, "vrget", 22, true, "Random-unit get R register"),
    def(0x43C, "vrnext", 22, true, "Random-unit next M sequence"),
    def(0x43F, "vrxor", 21, false, "Random-unit XOR R register"),
    // Synchronization and micro-subroutines
    def(0x3BF, "vwaitq", 0, false, "Wait Q register"),
    def(0x038, "vcallms", 27, false, "Start Micro Sub-Routine"),
    def(0x039, "vcallmsr", 0, false, "Start Micro Sub-Routine by Register"),
];

/// Sorted opcode table with cluster start indices.
#[derive(Debug, Clone)]
pub struct OpcodeTable {
    entries: Vec<&'static InstructionDefinition>,
    /// First index of each of the `0x100..=0x400` clusters, or `entries.len()` when empty
    cluster_starts: [usize; 4],
}

impl OpcodeTable {
    /// Build the table from [`DEFINITIONS`].
    pub fn new() -> Cop2Result<Self> {
        Self::from_definitions(DEFINITIONS)
    }

    /// Build a table from an arbitrary definition list.
    ///
    /// # Errors
    /// Returns [`Cop2Error::OpcodeOutOfRange`] for an opcode wider than 11 bits and
    /// [`Cop2Error::DuplicateOpcode`] when two definitions share an opcode.
    pub fn from_definitions(definitions: &'static [InstructionDefinition]) -> Cop2Result<Self> {
        let mut seen: BitVec = bitvec![0; OPCODE_SPACE];
        let mut owners: Vec<Option<&'static str>> = vec![None; OPCODE_SPACE];

        for definition in definitions {
            let slot = usize::from(definition.opcode);
            if slot >= OPCODE_SPACE {
                return Err(Cop2Error::OpcodeOutOfRange {
                    opcode: definition.opcode,
                    mnemonic: definition.mnemonic,
                });
            }
            if seen[slot] {
                return Err(Cop2Error::DuplicateOpcode {
                    opcode: definition.opcode,
                    first: owners[slot].unwrap_or("?"),
                    second: definition.mnemonic,
                });
            }
            seen.set(slot, true);
            owners[slot] = Some(definition.mnemonic);
        }

        let mut entries: Vec<&'static InstructionDefinition> = definitions.iter().collect();
        entries.sort_by_key(|definition| definition.opcode);

        let mut cluster_starts = [entries.len(); 4];
        for (start, mask) in cluster_starts.iter_mut().zip(CLUSTERS) {
            if let Some(index) = entries.iter().position(|d| d.opcode & 0xF00 == mask) {
                *start = index;
            }
        }

        log::debug!(
            "Opcode table built: {} entries, cluster starts {:?}",
            entries.len(),
            cluster_starts
        );

        Ok(Self {
            entries,
            cluster_starts,
        })
    }

    /// Index where the scan for `opcode` begins.
    #[inline]
    pub fn cluster_start(&self, opcode: u16) -> usize {
        CLUSTERS
            .iter()
            .position(|&mask| opcode & 0xF00 == mask)
            .map_or(0, |cluster| self.cluster_starts[cluster])
    }

    /// Position of `opcode` in the sorted table.
    #[inline]
    pub fn position(&self, opcode: u16) -> Option<usize> {
        let start = self.cluster_start(opcode);
        self.entries[start..]
            .iter()
            .take_while(|definition| definition.opcode <= opcode)
            .position(|definition| definition.opcode == opcode)
            .map(|offset| start + offset)
    }

    /// Find the definition with exactly this opcode.
    #[inline]
    pub fn lookup(&self, opcode: u16) -> Option<&'static InstructionDefinition> {
        self.position(opcode).map(|index| self.entries[index])
    }

    /// Definition at a table index.
    pub fn get(&self, index: usize) -> Option<&'static InstructionDefinition> {
        self.entries.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Definitions in ascending opcode order.
    pub fn iter(&self) -> impl Iterator<Item = &'static InstructionDefinition> + '_ {
        self.entries.iter().copied()
    }
}
