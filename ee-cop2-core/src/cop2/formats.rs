//! Format Registry
//!
//! Maps a decode format id (0-27) to the ordered operand roles of that format and a
//! pure extraction function `(word) -> slots`.
//!
//! # Instruction Word Layout
//! ```text
//!  31    25 24 23 22 21 20    16 15    11 10     6 5      0
//! | 010010 1 | dest (4 bits) |   ft    |   fs    |   fd    | funct  |
//!            | ftf | fsf     |
//! ```
//! - `ft` = bits 16-20, `fs` = bits 11-15, `fd` = bits 6-10
//! - `fsf` = bits 21-22, `ftf` = bits 23-24 (component selects for div/sqrt style ops)
//! - `bc` = bits 0-1 (broadcast component for the `x/y/z/w` variants)
//!
//! Pseudo-registers (`I`, `Q`, `R` and the accumulator) are never encoded in the word;
//! formats that use them insert a fixed [`Register`] variant instead.

use crate::cop2::error::{Cop2Error, Cop2Result};
use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

/// Decode format id.
pub type FormatId = u8;

/// Number of formats in the registry.
pub const FORMAT_COUNT: usize = 28;

/// How a register operand is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum OperandRole {
    /// `vfN`
    VectorRegister = 0,
    /// `viN` or a named control register
    IntegerRegister = 1,
    /// `(viN++)`
    IntegerRegisterPostIncrement = 2,
    /// `(--viN)`
    IntegerRegisterPreDecrement = 3,
    /// `vfN.c`, component taken from a dedicated field of the word
    VectorFieldSelect = 4,
    /// `vfNc`, broadcast component taken from the low two bits of the word
    VectorBroadcast = 5,
    /// `I`, `Q` or `R`
    ControlRegister = 6,
    /// `ACC`
    Accumulator = 7,
}

/// Register referenced by an operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Register {
    /// Floating-point vector register vf0-vf31
    Vector(u8),
    /// Integer register vi0-vi31 (16 and above are control registers)
    Integer(u8),
    /// Immediate register
    I,
    /// Quotient register
    Q,
    /// Random number register
    R,
    /// Accumulator
    Accumulator,
}

impl Register {
    /// Numeric index for `Vector`/`Integer`, `None` for pseudo-registers.
    pub fn index(&self) -> Option<u8> {
        match self {
            Register::Vector(index) | Register::Integer(index) => Some(*index),
            _ => None,
        }
    }
}

/// Vector component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}

impl Component {
    /// Component from the low two bits of `bits`.
    #[inline]
    pub fn from_bits(bits: u32) -> Self {
        match bits & 3 {
            0 => Component::X,
            1 => Component::Y,
            2 => Component::Z,
            _ => Component::W,
        }
    }

    pub fn letter(self) -> char {
        match self {
            Component::X => 'x',
            Component::Y => 'y',
            Component::Z => 'z',
            Component::W => 'w',
        }
    }
}

/// Raw value produced by a format extractor, before a role is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Register(Register, Option<Component>),
    /// 5-bit unsigned immediate
    Immediate(u32),
    /// 15-bit micro-subroutine address, in 8-byte units
    MicroAddress(u16),
}

/// Extraction function of a format.
pub type Extractor = fn(u32) -> SmallVec<[Slot; 3]>;

/// One registry entry.
#[derive(Clone, Copy)]
pub struct FormatDescriptor {
    pub id: FormatId,
    /// Roles of the register slots, in operand order
    pub roles: &'static [OperandRole],
    extract: Extractor,
}

impl FormatDescriptor {
    /// Pull this format's operand slots out of `word`.
    #[inline]
    pub fn extract(&self, word: u32) -> SmallVec<[Slot; 3]> {
        (self.extract)(word)
    }
}

impl std::fmt::Debug for FormatDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormatDescriptor")
            .field("id", &self.id)
            .field("roles", &self.roles)
            .finish()
    }
}

// Field accessors

#[inline]
fn ft(word: u32) -> u8 {
    ((word >> 16) & 0x1F) as u8
}

#[inline]
fn fs(word: u32) -> u8 {
    ((word >> 11) & 0x1F) as u8
}

#[inline]
fn fd(word: u32) -> u8 {
    ((word >> 6) & 0x1F) as u8
}

#[inline]
fn fsf(word: u32) -> Component {
    Component::from_bits(word >> 21)
}

#[inline]
fn ftf(word: u32) -> Component {
    Component::from_bits(word >> 23)
}

#[inline]
fn bc(word: u32) -> Component {
    Component::from_bits(word)
}

#[inline]
fn vf(index: u8) -> Slot {
    Slot::Register(Register::Vector(index), None)
}

#[inline]
fn vi(index: u8) -> Slot {
    Slot::Register(Register::Integer(index), None)
}

#[inline]
fn pseudo(register: Register) -> Slot {
    Slot::Register(register, None)
}

// Extractors

fn no_operands(_: u32) -> SmallVec<[Slot; 3]> {
    SmallVec::new()
}

fn ft_fs(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(ft(word)), vf(fs(word))]
}

fn fs_ft(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(fs(word)), vf(ft(word))]
}

fn fd_fs_ft(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(fd(word)), vf(fs(word)), vf(ft(word))]
}

fn fd_fs_i(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(fd(word)), vf(fs(word)), pseudo(Register::I)]
}

fn fd_fs_q(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(fd(word)), vf(fs(word)), pseudo(Register::Q)]
}

fn fd_fs_ftbc(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        vf(fd(word)),
        vf(fs(word)),
        Slot::Register(Register::Vector(ft(word)), Some(bc(word))),
    ]
}

fn acc_fs_ft(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![pseudo(Register::Accumulator), vf(fs(word)), vf(ft(word))]
}

fn acc_fs_i(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![pseudo(Register::Accumulator), vf(fs(word)), pseudo(Register::I)]
}

fn acc_fs_q(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![pseudo(Register::Accumulator), vf(fs(word)), pseudo(Register::Q)]
}

fn acc_fs_ftbc(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        pseudo(Register::Accumulator),
        vf(fs(word)),
        Slot::Register(Register::Vector(ft(word)), Some(bc(word))),
    ]
}

fn q_fsf_ftf(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        pseudo(Register::Q),
        Slot::Register(Register::Vector(fs(word)), Some(fsf(word))),
        Slot::Register(Register::Vector(ft(word)), Some(ftf(word))),
    ]
}

fn q_ftf(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        pseudo(Register::Q),
        Slot::Register(Register::Vector(ft(word)), Some(ftf(word))),
    ]
}

fn integer_fd_fs_ft(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vi(fd(word)), vi(fs(word)), vi(ft(word))]
}

fn integer_ft_fs_imm5(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vi(ft(word)), vi(fs(word)), Slot::Immediate((word >> 6) & 0x1F)]
}

fn integer_ft_fs(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vi(ft(word)), vi(fs(word))]
}

/// vmfir: vector destination, integer source.
fn vector_ft_integer_fs(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(ft(word)), vi(fs(word))]
}

/// vmtir: integer destination, single vector component source.
fn integer_ft_vector_fsf(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        vi(ft(word)),
        Slot::Register(Register::Vector(fs(word)), Some(fsf(word))),
    ]
}

/// Quad stores: data register in fs, address register in ft.
fn store_fs_ft(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(fs(word)), vi(ft(word))]
}

/// Quad loads: data register in ft, address register in fs.
fn load_ft_fs(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(ft(word)), vi(fs(word))]
}

fn r_fsf(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![
        pseudo(Register::R),
        Slot::Register(Register::Vector(fs(word)), Some(fsf(word))),
    ]
}

fn ft_r(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![vf(ft(word)), pseudo(Register::R)]
}

fn micro_address(word: u32) -> SmallVec<[Slot; 3]> {
    smallvec![Slot::MicroAddress(((word >> 6) & 0x7FFF) as u16)]
}

use OperandRole::{
    Accumulator as ACC, ControlRegister as CTL, IntegerRegister as VI,
    IntegerRegisterPostIncrement as VI_INC, IntegerRegisterPreDecrement as VI_DEC,
    VectorBroadcast as VF_BC, VectorFieldSelect as VF_SEL, VectorRegister as VF,
};

const fn format(id: FormatId, roles: &'static [OperandRole], extract: Extractor) -> FormatDescriptor {
    FormatDescriptor { id, roles, extract }
}

static FORMATS: [FormatDescriptor; FORMAT_COUNT] = [
    format(0, &[], no_operands),
    format(1, &[VF, VF], ft_fs),
    format(2, &[VF, VF, VF], fd_fs_ft),
    format(3, &[VF, VF, CTL], fd_fs_i),
    format(4, &[VF, VF, CTL], fd_fs_q),
    format(5, &[ACC, VF, VF], acc_fs_ft),
    format(6, &[ACC, VF, CTL], acc_fs_i),
    format(7, &[ACC, VF, CTL], acc_fs_q),
    format(8, &[ACC, VF, VF_BC], acc_fs_ftbc),
    format(9, &[ACC, VF, VF], acc_fs_ft),
    format(10, &[VF, VF, VF], fd_fs_ft),
    format(11, &[VF, VF], fs_ft),
    format(12, &[CTL, VF_SEL, VF_SEL], q_fsf_ftf),
    format(13, &[CTL, VF_SEL], q_ftf),
    format(14, &[VI, VI, VI], integer_fd_fs_ft),
    format(15, &[VI, VI], integer_ft_fs_imm5),
    format(16, &[VF, VF], ft_fs),
    format(17, &[VF, VI], vector_ft_integer_fs),
    format(18, &[VI, VF_SEL], integer_ft_vector_fsf),
    format(19, &[VF, VI_INC], store_fs_ft),
    format(20, &[VI, VI], integer_ft_fs),
    format(21, &[CTL, VF_SEL], r_fsf),
    format(22, &[VF, CTL], ft_r),
    format(23, &[VF, VF, VF_BC], fd_fs_ftbc),
    format(24, &[VF, VI_DEC], store_fs_ft),
    format(25, &[VF, VI_INC], load_ft_fs),
    format(26, &[VF, VI_DEC], load_ft_fs),
    format(27, &[], micro_address),
];

/// Registry of all decode formats.
#[derive(Debug, Clone, Copy)]
pub struct FormatRegistry {
    formats: &'static [FormatDescriptor; FORMAT_COUNT],
}

impl FormatRegistry {
    /// Build the registry and check that every role list matches its extractor.
    ///
    /// # Errors
    /// Returns [`Cop2Error::FormatArity`] when a format declares a different number of
    /// roles than the register slots it extracts.
    pub fn new() -> Cop2Result<Self> {
        for descriptor in FORMATS.iter() {
            // Slot shape does not depend on the word, so any word works here.
            let registers = descriptor
                .extract(0)
                .iter()
                .filter(|slot| matches!(slot, Slot::Register(..)))
                .count();
            if registers != descriptor.roles.len() {
                return Err(Cop2Error::FormatArity {
                    format: descriptor.id,
                    roles: descriptor.roles.len(),
                    registers,
                });
            }
        }
        Ok(Self { formats: &FORMATS })
    }

    /// Descriptor for `id`, `None` past the last format.
    #[inline]
    pub fn get(&self, id: FormatId) -> Option<&'static FormatDescriptor> {
        self.formats.get(usize::from(id))
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
