//! # Bytecode
//!
//! This crate defines the portable bytecode module format (BBX) that the
//! translator emits and the sandbox runtime executes.
//!
//! ## Philosophy
//!
//! - **Validate at the boundary**: a parsed module is a safe module; every
//!   branch target and operand is checked before execution begins.
//! - **Position-independent**: branches carry absolute instruction indices,
//!   so a module can be copied byte-for-byte into any execution context.
//! - **Simple to parse**: fixed-width instructions, little-endian fields.
//!
//! ## Format
//!
//! - Magic number: 0x4D584242 ("BBXM")
//! - Version: u32
//! - Entry point: u32 (instruction index)
//! - Tape hint: u32 (initial tape length in cells, non-zero)
//! - Instruction count: u32
//! - For each instruction: opcode u8, operand u32

pub mod module;
pub mod ops;

pub use module::{ModuleError, ModuleImage, MODULE_MAGIC, MODULE_VERSION};
pub use ops::Op;
