//! # Bridge Contract Tests
//!
//! This crate pins the observable contracts of the execution bridge so
//! they don't drift accidentally over time.
//!
//! ## Philosophy
//!
//! - **Properties, not implementations**: each module asserts a promise a
//!   component makes to its peers, independent of how it is kept.
//! - **In-process where possible**: everything here runs without spawning
//!   contexts; the process-level behavior is covered by the daemon's own
//!   integration tests.
//!
//! ## Structure
//!
//! - [`host_calls`]: input cursor and single-byte transfer contracts
//! - [`event_stream`]: ordering and terminal-event contracts
//! - [`protocol`]: the frozen wire shapes
//! - [`scenarios`]: whole-program runs through translator and runtime

pub mod event_stream;
pub mod host_calls;
pub mod protocol;
pub mod scenarios;

/// Common helpers for driving whole programs in-process
pub mod test_helpers {
    use bytecode::ModuleImage;
    use sandbox_runtime::{Instance, SandboxIo, TrapError};

    /// Translates source text and runs it against an input buffer,
    /// collecting output in memory
    pub fn run_source(source: &str, input: &[u8]) -> (Vec<u8>, Result<(), TrapError>) {
        let image = translator::translate(source).expect("source should translate");
        let module = ModuleImage::parse(&image).expect("translated image should parse");
        let io = SandboxIo::new(input.to_vec(), Vec::new());
        let mut instance = Instance::new(&module, io);
        let result = instance.run();
        (instance.into_host().into_sink(), result)
    }

    /// Runs source text that is expected to complete normally
    pub fn run_source_ok(source: &str, input: &[u8]) -> Vec<u8> {
        let (output, result) = run_source(source, input);
        result.expect("program should complete without a trap");
        output
    }
}
