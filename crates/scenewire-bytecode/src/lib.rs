//! Metafile opcode programs.
//!
//! This crate contains:
//! - The opcode set and its fixed little-endian payload layouts
//! - [`ProgramWriter`], the embedded compiler appending opcode records
//! - Typed array batches with strict size validation
//! - [`replay`], the interpreter that walks a sealed program

pub mod arrays;
pub mod container;
pub mod opcode;
pub mod replay;
pub mod writer;

#[cfg(test)]
mod replay_tests;

// Re-export commonly used items at crate root
pub use arrays::{ArrayBatch, ArrayError, ArrayKind};
pub use container::{MetafileContainer, Program};
pub use opcode::{MATRIX_FULL, MATRIX_IDENTITY, Opcode};
pub use replay::{OpVisitor, ProgramError, replay};
pub use writer::{ProgramWriter, WriteError};
