//! Host Instruction Fixups
//!
//! A handful of standard R5900 instructions are decoded by the host, but rendered
//! incorrectly for COP2 use:
//! - `cfc2`/`ctc2`/`qmfc2`/`qmtc2` carry an interlock bit that should read as a `.i`
//!   mnemonic suffix rather than a third operand
//! - `sync` carries an stype operand; bit 4 selects `sync.p`
//! - COP2 register operands are shown as general registers instead of `vfN`/`viN`
//!
//! The host hands the core a [`HostInstruction`] with its own mnemonic and operand
//! texts, and the core overrides only what needs fixing.

use crate::cop2::render::{integer_register_name, RenderedInstruction, TextRenderer};
use serde::Serialize;
use smallvec::SmallVec;

/// Host instruction identity, as far as the fixups care.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum HostKind {
    Cfc2 = 0,
    Ctc2 = 1,
    Qmfc2 = 2,
    Qmtc2 = 3,
    Lqc2 = 4,
    Sqc2 = 5,
    Sync = 6,
    /// Anything else; rendered exactly as the host does
    Other = 7,
}

impl HostKind {
    /// The four COP2 move instructions with an interlock bit.
    pub fn has_interlock(self) -> bool {
        matches!(
            self,
            HostKind::Cfc2 | HostKind::Ctc2 | HostKind::Qmfc2 | HostKind::Qmtc2
        )
    }
}

/// Host operand: raw value (register index or immediate) and the host's own text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostOperand {
    pub value: u32,
    pub text: String,
}

impl HostOperand {
    pub fn new(value: u32, text: impl Into<String>) -> Self {
        Self {
            value,
            text: text.into(),
        }
    }
}

/// Instruction decoded by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HostInstruction {
    pub address: u32,
    pub kind: HostKind,
    /// Host mnemonic, e.g. `"qmfc2"`
    pub mnemonic: String,
    pub operands: SmallVec<[HostOperand; 3]>,
}

impl HostInstruction {
    /// Interlock bit is set on one of the COP2 move instructions.
    fn interlocked(&self) -> bool {
        self.kind.has_interlock() && self.operands.get(2).map_or(false, |op| op.value == 1)
    }

    fn prefetch_sync(&self) -> bool {
        self.operands.first().map_or(false, |op| op.value & 0x10 == 0x10)
    }

    /// Whether operand `n` is folded into the mnemonic and not displayed.
    pub fn is_hidden(&self, n: usize) -> bool {
        match self.kind {
            HostKind::Sync => n == 0,
            _ => n == 2 && self.interlocked(),
        }
    }
}

impl TextRenderer {
    /// Mnemonic of a host instruction, with `.i` / `.p` fixups applied.
    pub fn host_mnemonic(&self, insn: &HostInstruction) -> String {
        if insn.interlocked() {
            return format!("{}.i", insn.mnemonic);
        }
        if insn.kind == HostKind::Sync && insn.prefetch_sync() {
            return format!("{}.p", insn.mnemonic);
        }
        insn.mnemonic.clone()
    }

    /// Text of host operand `n`, `None` when hidden or absent.
    pub fn host_operand(&self, insn: &HostInstruction, n: usize) -> Option<String> {
        let operand = insn.operands.get(n)?;
        if insn.is_hidden(n) {
            return None;
        }
        let text = match (insn.kind, n) {
            (HostKind::Cfc2 | HostKind::Ctc2, 1) => {
                integer_register_name(operand.value as u8).into_owned()
            }
            (HostKind::Qmfc2 | HostKind::Qmtc2, 1) | (HostKind::Lqc2 | HostKind::Sqc2, 0) => {
                format!("vf{}", operand.value)
            }
            _ => operand.text.clone(),
        };
        Some(text)
    }

    /// Render a host instruction with all fixups applied.
    pub fn render_host(&self, insn: &HostInstruction, comment: Option<String>) -> RenderedInstruction {
        RenderedInstruction {
            address: insn.address,
            mnemonic: self.host_mnemonic(insn),
            operands: (0..insn.operands.len())
                .filter_map(|n| self.host_operand(insn, n))
                .collect(),
            comment,
        }
    }
}
