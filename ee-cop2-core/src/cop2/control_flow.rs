//! Control-Flow Resolver
//!
//! Successor edges of decoded instructions:
//! - every COP2 table instruction flows to `address + 4`
//! - a branch-on-flag instruction flows to `address + 4` and also branches to its target
//!
//! Cache operations and everything else are left to the host's own flow analysis.
//! Branch direction is never resolved statically, both edges are always emitted.

use crate::cop2::decoder::{DecodedInstruction, InstructionKind};
use crate::host::XrefSink;
use serde::Serialize;
use smallvec::SmallVec;

/// Kind of a successor edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum EdgeKind {
    /// Fallthrough to the next instruction
    OrdinaryFlow = 0,
    /// Conditional branch, taken path
    TakenBranch = 1,
}

/// Edge from an instruction to one of its successors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ControlFlowEdge {
    pub source: u32,
    pub target: u32,
    pub kind: EdgeKind,
}

/// Edges of `insn`; empty when the host owns its flow.
pub fn resolve_edges(insn: &DecodedInstruction) -> SmallVec<[ControlFlowEdge; 2]> {
    let mut edges = SmallVec::new();
    let fallthrough = ControlFlowEdge {
        source: insn.address,
        target: insn.address.wrapping_add(insn.size),
        kind: EdgeKind::OrdinaryFlow,
    };

    match insn.kind {
        InstructionKind::Table(_) => edges.push(fallthrough),
        InstructionKind::BranchOnFlag(_) => {
            edges.push(fallthrough);
            if let Some(target) = insn.branch_target() {
                edges.push(ControlFlowEdge {
                    source: insn.address,
                    target,
                    kind: EdgeKind::TakenBranch,
                });
            }
        }
        InstructionKind::Cache => {}
    }
    edges
}

/// Send the edges of `insn` to the host's cross-reference sink.
///
/// Returns `false` when nothing was emitted and the host should run its own analysis.
pub fn emit_edges(insn: &DecodedInstruction, sink: &mut dyn XrefSink) -> bool {
    let edges = resolve_edges(insn);
    for edge in &edges {
        sink.add_edge(*edge);
    }
    !edges.is_empty()
}
