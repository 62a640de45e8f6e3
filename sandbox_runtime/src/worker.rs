//! Worker entry point: serves one execution request over a stream pair.
//!
//! The controller spawns an isolated context whose stdin carries exactly
//! one [`ExecutionRequest`] and whose stdout carries the event stream
//! back. The context exits after its single run; it is killed from the
//! outside if the run never ends.

use crate::host::{OutputSink, SandboxIo};
use crate::instance::Instance;
use bytecode::ModuleImage;
use sandbox_protocol::{read_message, write_message, ExecutionRequest, ProtocolError, RunEvent};
use std::io::{BufRead, Write};
use std::time::Instant;

/// Output sink that frames each byte onto the stream as it is produced
struct StreamSink<W: Write> {
    writer: W,
    failed: bool,
}

impl<W: Write> StreamSink<W> {
    fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }
}

impl<W: Write> OutputSink for StreamSink<W> {
    fn emit(&mut self, byte: u8) {
        if self.failed {
            return;
        }
        if let Err(err) = write_message(&mut self.writer, &RunEvent::Output { out: byte }) {
            // the peer is gone; remaining output has nowhere to go
            log::warn!("event stream lost mid-run: {}", err);
            self.failed = true;
        }
    }
}

/// Serves one execution request
///
/// Reads the request from `input`, executes the module, and frames output
/// events plus exactly one terminal event onto `output`. Module parse
/// failures and execution traps become [`RunEvent::Fault`] rather than a
/// silent stall.
pub fn run_worker(mut input: impl BufRead, mut output: impl Write) -> Result<(), ProtocolError> {
    let request: ExecutionRequest = match read_message(&mut input)? {
        Some(request) => request,
        // peer closed the stream without sending a request
        None => return Ok(()),
    };

    log::debug!(
        "execution request: {} module bytes, {} input bytes",
        request.module.len(),
        request.input.len()
    );

    let module = match ModuleImage::parse(&request.module) {
        Ok(module) => module,
        Err(err) => {
            write_message(&mut output, &RunEvent::Fault {
                error: err.to_string(),
            })?;
            return Ok(());
        }
    };

    let io = SandboxIo::new(request.input, StreamSink::new(&mut output));
    let mut instance = Instance::new(&module, io);

    let start = Instant::now();
    let result = instance.run();
    let exec_time = start.elapsed();
    drop(instance);

    match result {
        Ok(()) => write_message(&mut output, &RunEvent::Completed { exec_time })?,
        Err(trap) => write_message(&mut output, &RunEvent::Fault {
            error: trap.to_string(),
        })?,
    }

    Ok(())
}
