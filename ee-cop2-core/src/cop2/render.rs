//! Text Renderer
//!
//! Turns a [`DecodedInstruction`] into mnemonic and operand text.
//!
//! # Mnemonic Rules
//! 1. Branch-on-flag: `bc0f`, `bc0t`, `bc0fl` or `bc0tl`
//! 2. Cache: `cache`, plus an automatic comment naming the operation when the address
//!    has no comment yet
//! 3. Table instructions: the definition's name, followed by the destination suffix
//!    (`.xyzw`) when the definition has a destination field
//!
//! Host instructions that need fixing up (`cfc2`/`ctc2`/`qmfc2`/`qmtc2` interlock,
//! `sync.p`, COP2 operand names) are rendered in [`crate::cop2::fixups`].
//!
//! # Operand Rules
//! | Role / operand             | Text                    |
//! |----------------------------|-------------------------|
//! | vector register            | `vf3`                   |
//! | integer register           | `vi3`, `STATUS`, ...    |
//! | post-increment             | `(vi3++)`               |
//! | pre-decrement              | `(--vi3)`               |
//! | field select               | `vf3.y`                 |
//! | broadcast                  | `vf3y`                  |
//! | control register           | `I`, `Q`, `R`           |
//! | accumulator                | `ACC`                   |
//! | micro-subroutine address   | `0x10 # VU0 address: 0x80` |
//! | cache function             | `ixin`                  |
//! | displacement               | `-0x10($a0)`            |

use crate::cop2::cache::{cache_function_comment, cache_function_name};
use crate::cop2::decoder::{DecodedInstruction, InstructionKind, Operand};
use crate::cop2::formats::{Component, OperandRole, Register};
use crate::host::CommentStore;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Rendering options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    /// Column width the mnemonic is padded to
    pub mnemonic_width: usize,
    /// Render the cache offset as a signed 16-bit value
    pub signed_cache_offset: bool,
    /// Attach the table description as a comment when none exists
    pub auto_comments: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mnemonic_width: 13,
            signed_cache_offset: true,
            auto_comments: false,
        }
    }
}

/// Fully rendered instruction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedInstruction {
    pub address: u32,
    pub mnemonic: String,
    pub operands: Vec<String>,
    /// Comment stored at the address, if any
    pub comment: Option<String>,
}

impl RenderedInstruction {
    /// Mnemonic padded to `width`, then the operands separated by `", "`.
    ///
    /// At least one space always separates the mnemonic from its operands, even when
    /// the mnemonic is as wide as the column.
    pub fn line(&self, width: usize) -> String {
        if self.operands.is_empty() {
            return self.mnemonic.clone();
        }
        let width = width.max(self.mnemonic.len() + 1);
        format!(
            "{:<width$}{}",
            self.mnemonic,
            self.operands.join(", "),
            width = width
        )
    }
}

/// Name of integer register `index`.
///
/// vi0-vi15 are general integer registers; the upper half holds the control registers.
pub fn integer_register_name(index: u8) -> Cow<'static, str> {
    match index {
        0..=15 => Cow::Owned(format!("vi{}", index)),
        16 => Cow::Borrowed("STATUS"),
        17 => Cow::Borrowed("MAC"),
        18 => Cow::Borrowed("CLIP"),
        20 => Cow::Borrowed("R"),
        21 => Cow::Borrowed("I"),
        22 => Cow::Borrowed("Q"),
        26 => Cow::Borrowed("TPC"),
        27 => Cow::Borrowed("CMSAR0"),
        28 => Cow::Borrowed("FBRST"),
        29 => Cow::Borrowed("VPU-STAT"),
        31 => Cow::Borrowed("CMSAR1"),
        _ => Cow::Borrowed("UNK VI"),
    }
}

static GPR_NAMES: [&str; 32] = [
    "$zero", "$at", "$v0", "$v1", "$a0", "$a1", "$a2", "$a3", "$t0", "$t1", "$t2", "$t3", "$t4",
    "$t5", "$t6", "$t7", "$s0", "$s1", "$s2", "$s3", "$s4", "$s5", "$s6", "$s7", "$t8", "$t9",
    "$k0", "$k1", "$gp", "$sp", "$fp", "$ra",
];

/// Conventional name of general-purpose register `index`.
pub fn gpr_name(index: u8) -> &'static str {
    GPR_NAMES.get(usize::from(index)).copied().unwrap_or("$r?")
}

fn pseudo_name(register: Register) -> &'static str {
    match register {
        Register::I => "I",
        Register::Q => "Q",
        Register::R => "R",
        _ => "UNK",
    }
}

/// Text of a register operand according to its role.
pub fn register_text(role: OperandRole, register: Register, field: Option<Component>) -> String {
    let letter = field.map(Component::letter);
    match (role, register) {
        (OperandRole::VectorRegister, Register::Vector(index)) => format!("vf{}", index),
        (OperandRole::IntegerRegister, Register::Integer(index)) => {
            integer_register_name(index).into_owned()
        }
        (OperandRole::IntegerRegisterPostIncrement, Register::Integer(index)) => {
            format!("(vi{}++)", index)
        }
        (OperandRole::IntegerRegisterPreDecrement, Register::Integer(index)) => {
            format!("(--vi{})", index)
        }
        (OperandRole::VectorFieldSelect, Register::Vector(index)) => match letter {
            Some(letter) => format!("vf{}.{}", index, letter),
            None => format!("vf{}", index),
        },
        (OperandRole::VectorBroadcast, Register::Vector(index)) => match letter {
            Some(letter) => format!("vf{}{}", index, letter),
            None => format!("vf{}", index),
        },
        (OperandRole::ControlRegister, Register::I | Register::Q | Register::R) => {
            pseudo_name(register).to_string()
        }
        (OperandRole::Accumulator, _) => "ACC".to_string(),
        _ => "UNK".to_string(),
    }
}

fn immediate_text(value: u32) -> String {
    if value < 10 {
        value.to_string()
    } else {
        format!("0x{:X}", value)
    }
}

/// Text renderer.
#[derive(Debug, Clone, Default)]
pub struct TextRenderer {
    options: RenderOptions,
}

impl TextRenderer {
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Mnemonic text of `insn`.
    ///
    /// For cache operations this also stores a comment describing the operation at the
    /// instruction's address, unless one is already present.
    pub fn mnemonic(&self, insn: &DecodedInstruction, comments: &mut dyn CommentStore) -> String {
        match insn.kind {
            InstructionKind::BranchOnFlag(condition) => condition.mnemonic().to_string(),
            InstructionKind::Cache => {
                if comments.comment(insn.address).is_none() {
                    if let Some(Operand::CacheFunction(code)) = insn.operands.first() {
                        comments.set_comment(insn.address, cache_function_comment(*code).to_string());
                    }
                }
                "cache".to_string()
            }
            InstructionKind::Table(definition) => match insn.dest {
                Some(dest) => format!("{}{}", definition.mnemonic, dest.suffix()),
                None => definition.mnemonic.to_string(),
            },
        }
    }

    /// Text of a single operand.
    pub fn operand(&self, operand: &Operand) -> String {
        match *operand {
            Operand::Register {
                role,
                register,
                field,
            } => register_text(role, register, field),
            Operand::Immediate(value) => immediate_text(value),
            Operand::MicroAddress(value) => format!(
                "0x{:X} # VU0 address: 0x{:X}",
                value,
                u32::from(value) << 3
            ),
            Operand::NearAddress(target) => format!("0x{:08X}", target),
            Operand::CacheFunction(code) => cache_function_name(code).to_string(),
            // The base is a general-purpose register, so it takes the MIPS ABI name
            // (`$a0`) rather than the `vi` naming of COP2 integer registers.
            Operand::Displacement { base, offset } => {
                let offset = if self.options.signed_cache_offset && offset > 0x7FFF {
                    format!("-0x{:X}", 0x1_0000 - u32::from(offset))
                } else {
                    format!("0x{:X}", offset)
                };
                format!("{}({})", offset, gpr_name(base))
            }
        }
    }

    /// Texts of all operands of `insn`.
    pub fn operands(&self, insn: &DecodedInstruction) -> Vec<String> {
        insn.operands.iter().map(|operand| self.operand(operand)).collect()
    }

    /// Render mnemonic, operands and comment.
    ///
    /// With `auto_comments` enabled, the table description is stored as the comment of
    /// addresses that have none.
    pub fn render(
        &self,
        insn: &DecodedInstruction,
        comments: &mut dyn CommentStore,
    ) -> RenderedInstruction {
        let mnemonic = self.mnemonic(insn, comments);
        if self.options.auto_comments && comments.comment(insn.address).is_none() {
            if let Some(definition) = insn.definition() {
                comments.set_comment(insn.address, definition.description.to_string());
            }
        }
        RenderedInstruction {
            address: insn.address,
            mnemonic,
            operands: self.operands(insn),
            comment: comments.comment(insn.address),
        }
    }

    /// Render `insn` as a single listing line.
    pub fn render_line(&self, insn: &DecodedInstruction, comments: &mut dyn CommentStore) -> String {
        self.render(insn, comments).line(self.options.mnemonic_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_register_names() {
        assert_eq!(integer_register_name(0), "vi0");
        assert_eq!(integer_register_name(15), "vi15");
        assert_eq!(integer_register_name(16), "STATUS");
        assert_eq!(integer_register_name(29), "VPU-STAT");
        assert_eq!(integer_register_name(31), "CMSAR1");
        for unknown in [19, 23, 24, 25, 30] {
            assert_eq!(integer_register_name(unknown), "UNK VI");
        }
    }

    #[test]
    fn test_register_roles() {
        use OperandRole::*;
        assert_eq!(register_text(VectorRegister, Register::Vector(4), None), "vf4");
        assert_eq!(register_text(IntegerRegisterPostIncrement, Register::Integer(2), None), "(vi2++)");
        assert_eq!(register_text(IntegerRegisterPreDecrement, Register::Integer(2), None), "(--vi2)");
        assert_eq!(
            register_text(VectorFieldSelect, Register::Vector(7), Some(Component::W)),
            "vf7.w"
        );
        assert_eq!(
            register_text(VectorBroadcast, Register::Vector(7), Some(Component::Y)),
            "vf7y"
        );
        assert_eq!(register_text(ControlRegister, Register::Q, None), "Q");
        assert_eq!(register_text(ControlRegister, Register::R, None), "R");
        assert_eq!(register_text(Accumulator, Register::Accumulator, None), "ACC");
    }

    #[test]
    fn test_line_padding() {
        let rendered = RenderedInstruction {
            address: 0,
            mnemonic: "vadd.xyz".to_string(),
            operands: vec!["vf1".to_string(), "vf2".to_string(), "vf3".to_string()],
            comment: None,
        };
        assert_eq!(rendered.line(13), "vadd.xyz     vf1, vf2, vf3");
        let bare = RenderedInstruction {
            operands: Vec::new(),
            mnemonic: "vnop".to_string(),
            ..rendered
        };
        assert_eq!(bare.line(13), "vnop");
    }

    #[test]
    fn test_line_keeps_separator_when_column_is_narrow() {
        let rendered = RenderedInstruction {
            address: 0,
            mnemonic: "vadd.xyz".to_string(),
            operands: vec!["vf1".to_string()],
            comment: None,
        };
        assert_eq!(rendered.line(8), "vadd.xyz vf1");
        assert_eq!(rendered.line(0), "vadd.xyz vf1");
        assert_eq!(rendered.line(9), "vadd.xyz vf1");
        assert_eq!(rendered.line(10), "vadd.xyz  vf1");
    }
}
