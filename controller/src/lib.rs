//! # Controller
//!
//! This crate orchestrates one run from source text to a terminal state:
//! translate, compile, spawn an isolated execution context, stream events
//! out of it, and tear it down on completion, fault, timeout, or abort.
//!
//! ## Philosophy
//!
//! - **One live context at a time**: a controller never has two runs in
//!   flight; a terminal state re-enables starting.
//! - **Hard kill, no handshake**: aborting terminates the context
//!   outright. The context owns nothing but its memory and its channel,
//!   and both die with it.
//! - **Absence of completion is a failure, not a mystery**: faults arrive
//!   as explicit events, and a policy-chosen deadline turns a silent hang
//!   into a terminal outcome.
//!
//! ## Key Types
//!
//! - [`Translator`]: the external translator boundary
//! - [`RunController`]: the lifecycle orchestrator
//! - [`RunState`] / [`RunOutcome`]: observable lifecycle and results

pub mod boundary;
pub mod manager;
pub mod state;

pub use boundary::{TranslationError, Translator};
pub use manager::{
    ControllerConfig, NotRunningError, RunController, RunOutcome, StartError, StepEvent,
    WorkerCommand,
};
pub use state::RunState;
