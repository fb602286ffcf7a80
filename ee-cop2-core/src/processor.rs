//! Processor Shim
//!
//! Thin adapter between a host disassembler and the decode core. It mirrors the
//! three per-instruction hooks a host calls:
//! - **analyze**: read and decode the word at an address
//! - **emulate**: emit cross-references for a decoded instruction
//! - **output**: render the instruction text
//!
//! The shim only activates for the R5900 (little-endian) processor module.

use crate::cop2::control_flow::emit_edges;
use crate::cop2::decoder::{Cop2Decoder, DecodedInstruction};
use crate::cop2::error::Cop2Result;
use crate::cop2::fixups::HostInstruction;
use crate::cop2::render::{RenderOptions, RenderedInstruction, TextRenderer};
use crate::host::{CommentStore, MemoryReader, XrefSink};

/// Processor name the shim activates for.
pub const TARGET_PROCESSOR: &str = "r5900l";

/// Activated COP2 decoder attached to a host.
#[derive(Debug)]
pub struct Cop2Processor {
    decoder: Cop2Decoder,
    renderer: TextRenderer,
}

impl Cop2Processor {
    /// Activate for `processor`.
    ///
    /// Returns `Ok(None)` when the host runs a different processor module.
    ///
    /// # Errors
    /// Table construction failures, which are fatal configuration errors.
    pub fn activate(processor: &str, options: RenderOptions) -> Cop2Result<Option<Self>> {
        if processor != TARGET_PROCESSOR {
            log::warn!(
                "COP2 decoder not activated: processor is {:?}, expected {:?}",
                processor,
                TARGET_PROCESSOR
            );
            return Ok(None);
        }
        let decoder = Cop2Decoder::new()?;
        log::info!(
            "PS2 Emotion Engine COP2 decoder loaded ({} instructions)",
            decoder.table().len()
        );
        Ok(Some(Self {
            decoder,
            renderer: TextRenderer::new(options),
        }))
    }

    pub fn decoder(&self) -> &Cop2Decoder {
        &self.decoder
    }

    pub fn renderer(&self) -> &TextRenderer {
        &self.renderer
    }

    /// Decode the instruction at `address`; `None` means the host decodes it.
    pub fn analyze(
        &self,
        memory: &dyn MemoryReader,
        address: u32,
    ) -> Cop2Result<Option<DecodedInstruction>> {
        let word = memory.read_word(address)?;
        Ok(self.decoder.decode(word, address))
    }

    /// Emit control-flow edges; `false` means the host keeps its own analysis.
    pub fn emulate(&self, insn: &DecodedInstruction, xrefs: &mut dyn XrefSink) -> bool {
        emit_edges(insn, xrefs)
    }

    /// Render a decoded instruction.
    pub fn output(
        &self,
        insn: &DecodedInstruction,
        comments: &mut dyn CommentStore,
    ) -> RenderedInstruction {
        self.renderer.render(insn, comments)
    }

    /// Render an instruction the host decoded itself.
    pub fn output_host(
        &self,
        insn: &HostInstruction,
        comments: &dyn CommentStore,
    ) -> RenderedInstruction {
        self.renderer.render_host(insn, comments.comment(insn.address))
    }
}

impl Drop for Cop2Processor {
    fn drop(&mut self) {
        log::info!("PS2 Emotion Engine COP2 decoder unloaded");
    }
}
