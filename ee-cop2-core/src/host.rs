//! Host Interfaces
//!
//! Services the decoder needs from the disassembly environment it is embedded in:
//! raw memory reads, the persistent comment store and the cross-reference sink.
//! Endianness is resolved by the host before a word reaches the core.

use crate::cop2::control_flow::ControlFlowEdge;
use crate::cop2::error::Cop2Result;
use std::collections::{BTreeMap, HashMap};

/// Raw memory access.
pub trait MemoryReader {
    /// Read the 32-bit instruction word at `address`.
    ///
    /// # Errors
    /// [`crate::Cop2Error::UnmappedAddress`] when the address is outside the image.
    fn read_word(&self, address: u32) -> Cop2Result<u32>;
}

/// Persistent per-address comments.
pub trait CommentStore {
    fn comment(&self, address: u32) -> Option<String>;
    fn set_comment(&mut self, address: u32, text: String);
}

/// Cross-reference graph of the host.
pub trait XrefSink {
    fn add_edge(&mut self, edge: ControlFlowEdge);
}

impl CommentStore for HashMap<u32, String> {
    fn comment(&self, address: u32) -> Option<String> {
        self.get(&address).cloned()
    }

    fn set_comment(&mut self, address: u32, text: String) {
        self.insert(address, text);
    }
}

impl CommentStore for BTreeMap<u32, String> {
    fn comment(&self, address: u32) -> Option<String> {
        self.get(&address).cloned()
    }

    fn set_comment(&mut self, address: u32, text: String) {
        self.insert(address, text);
    }
}

impl XrefSink for Vec<ControlFlowEdge> {
    fn add_edge(&mut self, edge: ControlFlowEdge) {
        self.push(edge);
    }
}
