//! Reference host for the COP2 decoder: image loading, a minimal R5900 fallback
//! decoder, listing generation and persisted settings.

pub mod commands;
pub mod config;
pub mod host;
pub mod image;
