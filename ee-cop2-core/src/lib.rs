//! Emotion Engine COP2 Decoder
//!
//! Decoder and disassembler for the PS2 Emotion Engine's COP2 (VU0 macro mode)
//! instruction extension. Given a raw 32-bit word and its address, the core classifies
//! it, decodes it into typed operands, computes its control-flow successors and renders
//! it as assembly text.
//!
//! Besides the COP2 macro instructions it handles the `bc0*` branch-on-flag family and
//! `cache`, and fixes up the rendering of a few host-decoded instructions.
//!
//! ```rust
//! use ee_cop2_core::{Cop2Decoder, TextRenderer};
//! use std::collections::HashMap;
//!
//! let decoder = Cop2Decoder::new().unwrap();
//! let insn = decoder.decode(0x4A80_8000, 0x0010_0000).unwrap();
//! let mut comments: HashMap<u32, String> = HashMap::new();
//! let line = TextRenderer::default().render_line(&insn, &mut comments);
//! assert_eq!(line, "vaddx.y      vf0, vf16, vf0x");
//! ```

pub mod cop2;
pub mod host;
pub mod processor;

pub use cop2::control_flow::{resolve_edges, ControlFlowEdge, EdgeKind};
pub use cop2::decoder::{
    branch_target, Classification, Cop2Decoder, DecodedInstruction, DestMask, FlagCondition,
    InstructionKind, Operand, INSTRUCTION_SIZE,
};
pub use cop2::error::{Cop2Error, Cop2Result};
pub use cop2::fixups::{HostInstruction, HostKind, HostOperand};
pub use cop2::formats::{Component, OperandRole, Register};
pub use cop2::opcodes::{InstructionDefinition, OpcodeTable};
pub use cop2::render::{RenderOptions, RenderedInstruction, TextRenderer};
pub use host::{CommentStore, MemoryReader, XrefSink};
pub use processor::{Cop2Processor, TARGET_PROCESSOR};
