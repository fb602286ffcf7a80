pub mod cache;
pub mod classify;
pub mod control_flow;
pub mod decoder;
pub mod error;
pub mod fixups;
pub mod formats;
pub mod opcodes;
pub mod render;
