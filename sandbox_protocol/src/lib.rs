//! # Sandbox Protocol
//!
//! This crate defines the message schema spoken between the controller and
//! a sandboxed execution context.
//!
//! ## Philosophy
//!
//! - **Messages, not shared memory**: the context is reachable only
//!   through an ordered byte stream; every interaction is a typed message.
//! - **One request, many events**: a context receives exactly one
//!   [`ExecutionRequest`] and answers with a stream of [`RunEvent`]s,
//!   ending with exactly one terminal event unless it is killed first.
//! - **Self-describing frames**: newline-delimited JSON, so a stalled or
//!   half-written frame can never be confused with a complete one.

pub mod framing;
pub mod message;

pub use framing::{read_message, write_message, ProtocolError};
pub use message::{ExecutionRequest, RunEvent};
