//! Error Handling
//!
//! Error types for the COP2 decoder using `thiserror`.
//!
//! # Error Categories
//! - **Table errors**: the opcode table or format registry violates an invariant.
//!   These are fatal and only surface while the decoder is being built.
//! - **Host errors**: memory reads outside the loaded image, malformed executables.
//!
//! Per-word decode failures are not errors: an unrecognized word decodes to `None`
//! and the host falls back to its own decoder.

use thiserror::Error;

/// COP2 decoder error types.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Cop2Error {
    /// Two table entries share the same 11-bit opcode.
    #[error("Duplicate opcode 0x{opcode:03X} ({first} and {second})\nSuggestion: every table entry needs a unique opcode")]
    DuplicateOpcode {
        opcode: u16,
        first: &'static str,
        second: &'static str,
    },

    /// The opcode does not fit in the 11-bit function field.
    #[error("Opcode 0x{opcode:03X} of {mnemonic} does not fit in 11 bits")]
    OpcodeOutOfRange { opcode: u16, mnemonic: &'static str },

    /// A definition references a format id with no registry entry.
    #[error("{mnemonic} uses format {format} which has no registry entry")]
    MissingFormat { mnemonic: &'static str, format: u8 },

    /// A format's role list disagrees with the registers its extractor produces.
    #[error("Format {format} declares {roles} operand roles but extracts {registers} registers")]
    FormatArity {
        format: u8,
        roles: usize,
        registers: usize,
    },

    /// Memory read outside the host image.
    #[error("Memory access error: address 0x{address:08X} is not mapped\nSuggestion: check the base address of the image")]
    UnmappedAddress { address: u32 },

    /// The executable image could not be loaded.
    #[error("Invalid image: {message}")]
    InvalidImage { message: String },
}

impl Cop2Error {
    /// Create an image error with context.
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage {
            message: message.into(),
        }
    }
}

/// Convenience alias used across the crate.
pub type Cop2Result<T> = Result<T, Cop2Error>;
