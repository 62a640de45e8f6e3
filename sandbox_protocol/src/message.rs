//! Message types exchanged over the execution boundary.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The single request a controller sends into an execution context
///
/// Ownership of the input buffer's read cursor logically transfers with
/// this message; the controller never re-reads or mutates the buffer for
/// the duration of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Binary module image to execute
    pub module: Vec<u8>,
    /// Input buffer the module may consume one byte at a time
    pub input: Vec<u8>,
}

/// One message from an execution context back to its controller
///
/// Output events arrive in emission order. `Completed` and `Fault` are
/// terminal: each run produces at most one of them, always last.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunEvent {
    /// One output byte, forwarded as soon as the module produced it
    Output {
        /// Byte value, 0–255
        out: u8,
    },
    /// Normal entry-point return, with the measured execution duration
    Completed {
        /// Wall-clock time spent inside the module's entry point
        exec_time: Duration,
    },
    /// Module failed to instantiate or trapped mid-execution
    Fault {
        /// Human-readable description of the fault
        error: String,
    },
}

impl RunEvent {
    /// Checks if this event ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunEvent::Completed { .. } | RunEvent::Fault { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_event_wire_shape() {
        let json = serde_json::to_string(&RunEvent::Output { out: 97 }).unwrap();
        assert_eq!(json, r#"{"out":97}"#);
    }

    #[test]
    fn test_completed_event_round_trip() {
        let event = RunEvent::Completed {
            exec_time: Duration::from_millis(42),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_fault_event_round_trip() {
        let event = RunEvent::Fault {
            error: "pointer moved below the tape".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: RunEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn test_event_variants_deserialize_unambiguously() {
        let output: RunEvent = serde_json::from_str(r#"{"out":255}"#).unwrap();
        assert_eq!(output, RunEvent::Output { out: 255 });

        let fault: RunEvent = serde_json::from_str(r#"{"error":"bad module"}"#).unwrap();
        assert!(fault.is_terminal());
    }

    #[test]
    fn test_terminal_classification() {
        assert!(!RunEvent::Output { out: 0 }.is_terminal());
        assert!(RunEvent::Completed {
            exec_time: Duration::ZERO
        }
        .is_terminal());
    }

    #[test]
    fn test_request_round_trip() {
        let request = ExecutionRequest {
            module: vec![1, 2, 3],
            input: b"abc".to_vec(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: ExecutionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
