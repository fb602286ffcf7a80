//! Word Classifier
//!
//! Decides from the top bits of a raw word which decode path applies:
//!
//! | Test            | Path                                  |
//! |-----------------|---------------------------------------|
//! | `W >> 25 == 0x25`  | COP2 macro op (opcode table lookup) |
//! | `W >> 21 == 0x208` | `bc0f`/`bc0t`/`bc0fl`/`bc0tl`       |
//! | `W >> 26 == 0x2F`  | `cache`                             |
//!
//! The three tests are mutually exclusive. Anything else belongs to the host decoder.

use serde::Serialize;

/// Decode path selected by the top bits of a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WordShape {
    /// COP2 macro-mode operation, carrying the opcode key to look up
    Cop2 { key: u16 },
    /// Branch on COP0 condition flag
    BranchOnFlag,
    /// Cache management operation
    Cache,
}

/// Classify a raw instruction word.
///
/// Returns `None` when none of the three paths apply.
#[inline]
pub fn classify_word(word: u32) -> Option<WordShape> {
    if word >> 25 == 0x25 {
        Some(WordShape::Cop2 {
            key: opcode_key(word),
        })
    } else if word >> 21 == 0x208 {
        Some(WordShape::BranchOnFlag)
    } else if word >> 26 == 0x2F {
        Some(WordShape::Cache)
    } else {
        None
    }
}

/// Table key of a COP2 word.
///
/// Function codes `0x3C..=0x3F` select the extended encoding, whose key is the
/// 11-bit field `W & 0x7FF`; all other words use the 6-bit function `W & 0x3F`.
#[inline]
pub fn opcode_key(word: u32) -> u16 {
    if word & 0x3C == 0x3C {
        (word & 0x7FF) as u16
    } else {
        (word & 0x3F) as u16
    }
}
