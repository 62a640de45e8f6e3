//! Newline-delimited JSON framing over byte streams.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{self, BufRead, Write};
use thiserror::Error;

/// Errors that can occur while framing messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Underlying stream failed
    #[error("stream error: {0}")]
    Io(#[from] io::Error),

    /// Frame was not a valid message
    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),
}

/// Writes one message as a single line and flushes
///
/// Flushing per message is what makes output streaming: a byte written by
/// the module is visible to the controller before the next host call runs.
pub fn write_message<T: Serialize>(writer: &mut impl Write, message: &T) -> Result<(), ProtocolError> {
    serde_json::to_writer(&mut *writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Reads the next message, skipping blank lines
///
/// Returns `Ok(None)` once the stream is closed, which is how a reader
/// learns the peer is gone.
pub fn read_message<T: DeserializeOwned>(
    reader: &mut impl BufRead,
) -> Result<Option<T>, ProtocolError> {
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let frame = line.trim();
        if frame.is_empty() {
            continue;
        }
        return Ok(Some(serde_json::from_str(frame)?));
    }
}
