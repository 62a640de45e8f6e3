//! # Sandbox Runtime
//!
//! This crate runs one compiled module to completion inside an isolated
//! execution context, emulating the two host-call primitives the module
//! expects: read one byte of input, write one byte of output.
//!
//! ## Philosophy
//!
//! - **Per-run state, no globals**: the input cursor and the transfer cell
//!   are fields of one runtime instance, built fresh for every run and
//!   destroyed with its context.
//! - **A narrow ABI, stated plainly**: host calls move exactly one byte
//!   through a fixed transfer cell (the single-byte transfer convention);
//!   there is no buffer-pointer or length parameter to honor.
//! - **Stream, never buffer**: every output byte is forwarded the moment
//!   the module produces it.
//!
//! ## Key Types
//!
//! - [`InputCursor`] / [`TransferCell`] / [`HostTable`]: the host side
//! - [`Instance`]: a module instantiated against a host table
//! - [`run_worker`]: serves one execution request over a byte stream pair

pub mod host;
pub mod instance;
pub mod worker;

pub use host::{HostTable, InputCursor, OutputSink, SandboxIo, TransferCell, EOF_SENTINEL};
pub use instance::{Instance, TrapError};
pub use worker::run_worker;
