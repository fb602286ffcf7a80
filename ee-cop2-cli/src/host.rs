//! Fallback R5900 Decoder
//!
//! The smallest host decoder that exercises the COP2 fixups. It recognizes the COP2
//! register moves (`qmfc2`, `cfc2`, `qmtc2`, `ctc2`), the quadword loads and stores
//! (`lqc2`, `sqc2`) and `sync`. Every other word is emitted as `.word`.
//!
//! Operand texts are what a generic MIPS host would print: GPR names for every register
//! field and the raw stype of `sync`. The core then rewrites what is COP2-specific.

use ee_cop2_core::cop2::render::gpr_name;
use ee_cop2_core::{HostInstruction, HostKind, HostOperand};
use smallvec::{smallvec, SmallVec};

const OP_COP2: u32 = 0x12;
const OP_LQC2: u32 = 0x36;
const OP_SQC2: u32 = 0x3E;

#[inline]
fn rs(word: u32) -> u32 {
    (word >> 21) & 0x1F
}

#[inline]
fn rt(word: u32) -> u32 {
    (word >> 16) & 0x1F
}

#[inline]
fn rd(word: u32) -> u32 {
    (word >> 11) & 0x1F
}

fn register(index: u32) -> HostOperand {
    HostOperand::new(index, gpr_name(index as u8))
}

fn offset_text(offset: u16) -> String {
    let value = offset as i16;
    if value < 0 {
        format!("-0x{:X}", -i32::from(value))
    } else {
        format!("0x{:X}", value)
    }
}

fn stype_text(stype: u32) -> String {
    if stype < 10 {
        stype.to_string()
    } else {
        format!("0x{:X}", stype)
    }
}

fn instruction(
    address: u32,
    kind: HostKind,
    mnemonic: &str,
    operands: SmallVec<[HostOperand; 3]>,
) -> HostInstruction {
    HostInstruction {
        address,
        kind,
        mnemonic: mnemonic.to_string(),
        operands,
    }
}

/// Decode `word` the way the host would, before any COP2 fixup.
pub fn decode_host(word: u32, address: u32) -> HostInstruction {
    let opcode = word >> 26;

    if opcode == OP_COP2 {
        let (kind, mnemonic) = match rs(word) {
            0x01 => (HostKind::Qmfc2, "qmfc2"),
            0x02 => (HostKind::Cfc2, "cfc2"),
            0x05 => (HostKind::Qmtc2, "qmtc2"),
            0x06 => (HostKind::Ctc2, "ctc2"),
            _ => return raw_word(word, address),
        };
        let interlock = word & 1;
        return instruction(
            address,
            kind,
            mnemonic,
            smallvec![
                register(rt(word)),
                register(rd(word)),
                HostOperand::new(interlock, interlock.to_string()),
            ],
        );
    }

    if opcode == OP_LQC2 || opcode == OP_SQC2 {
        let (kind, mnemonic) = if opcode == OP_LQC2 {
            (HostKind::Lqc2, "lqc2")
        } else {
            (HostKind::Sqc2, "sqc2")
        };
        let offset = (word & 0xFFFF) as u16;
        let base = gpr_name(rs(word) as u8);
        return instruction(
            address,
            kind,
            mnemonic,
            smallvec![
                register(rt(word)),
                HostOperand::new(u32::from(offset), format!("{}({})", offset_text(offset), base)),
            ],
        );
    }

    if word & 0xFFFF_F83F == 0x0000_000F {
        let stype = (word >> 6) & 0x1F;
        return instruction(
            address,
            HostKind::Sync,
            "sync",
            smallvec![HostOperand::new(stype, stype_text(stype))],
        );
    }

    raw_word(word, address)
}

fn raw_word(word: u32, address: u32) -> HostInstruction {
    instruction(
        address,
        HostKind::Other,
        ".word",
        smallvec![HostOperand::new(word, format!("0x{:08X}", word))],
    )
}
