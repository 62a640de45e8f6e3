//! Run lifecycle state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of one run
///
/// ```text
/// Idle → Translating → Compiling → Running → Completed
///             ↓            ↓          ↓    ↘ Aborted
///           Failed       Failed     Failed
/// ```
///
/// `Running` is the only state in which output events are valid. Every
/// terminal state re-enables starting a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    /// No run has started yet
    Idle,
    /// The translator is producing a module from source text
    Translating,
    /// The module image is being compiled/validated
    Compiling,
    /// An execution context is live
    Running,
    /// The context reported normal completion
    Completed,
    /// The user killed the context mid-run
    Aborted,
    /// Translation, compilation, or execution failed
    Failed,
}

impl RunState {
    /// Checks if the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Completed | RunState::Aborted | RunState::Failed
        )
    }

    /// Checks if a new run may start from this state
    pub fn can_start(&self) -> bool {
        matches!(self, RunState::Idle) || self.is_terminal()
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunState::Idle => "idle",
            RunState::Translating => "translating",
            RunState::Compiling => "compiling",
            RunState::Running => "running",
            RunState::Completed => "completed",
            RunState::Aborted => "aborted",
            RunState::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}
