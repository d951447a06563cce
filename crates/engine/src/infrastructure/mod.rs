//! Infrastructure implementations.
//!
//! Contains port trait implementations for external dependencies.

pub mod clock;
pub mod gemini;
pub mod imagen;
pub mod ports;
pub mod save_files;
pub mod settings;
