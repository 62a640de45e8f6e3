//! # Core Types
//!
//! This crate defines the fundamental types used throughout Bytebox.
//!
//! ## Philosophy
//!
//! - **Explicit over implicit**: Runs and execution contexts are named by
//!   typed identifiers that cannot be confused with each other.
//! - **No ambient state**: Identifiers are values, never globals.
//!
//! ## Key Types
//!
//! - [`RunId`]: Unique identifier for one run attempt
//! - [`ExecutionId`]: Unique identifier for one spawned execution context

pub mod ids;

pub use ids::{ExecutionId, RunId};
