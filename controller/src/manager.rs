//! Run manager: spawning, event consumption, abort, and teardown.

use crate::boundary::{TranslationError, Translator};
use crate::state::RunState;
use bytecode::{ModuleError, ModuleImage};
use core_types::{ExecutionId, RunId};
use sandbox_protocol::{read_message, write_message, ExecutionRequest, ProtocolError, RunEvent};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Command line used to spawn an execution context
#[derive(Debug, Clone)]
pub struct WorkerCommand {
    /// Program to execute
    pub program: PathBuf,
    /// Arguments passed before the context starts serving
    pub args: Vec<String>,
}

impl WorkerCommand {
    /// Creates a worker command with no arguments
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends an argument
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }
}

/// Controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How to spawn an execution context
    pub worker: WorkerCommand,
    /// Wall-clock budget for one execution; `None` waits forever
    pub timeout: Option<Duration>,
}

impl ControllerConfig {
    /// Creates a configuration with no timeout
    pub fn new(worker: WorkerCommand) -> Self {
        Self {
            worker,
            timeout: None,
        }
    }

    /// Sets the execution timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Errors that can occur while starting a run
#[derive(Debug, Error)]
pub enum StartError {
    /// A context is already live
    #[error("a run is already in progress")]
    RunInProgress,

    /// The translator rejected the source text
    #[error(transparent)]
    Translation(#[from] TranslationError),

    /// The translated module failed compilation
    #[error("module rejected: {0}")]
    Compile(#[from] ModuleError),

    /// The execution context could not be spawned
    #[error("failed to spawn execution context: {0}")]
    Spawn(#[from] io::Error),

    /// The request could not be delivered to the context
    #[error("failed to send execution request: {0}")]
    Send(#[from] ProtocolError),
}

/// Returned when an operation needs a live run and there is none
#[derive(Debug, Error, PartialEq, Eq)]
#[error("no run in progress")]
pub struct NotRunningError;

/// Terminal result of one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Entry point returned normally
    Completed {
        /// Translation + compilation time, measured by the controller
        translate_time: Duration,
        /// Execution time, reported by the context
        exec_time: Duration,
    },
    /// The context reported an instantiation or execution fault
    Fault {
        /// The fault description, verbatim from the context
        error: String,
    },
    /// The execution deadline expired and the context was killed
    TimedOut,
    /// The user killed the context
    Aborted,
    /// The context died without reporting a terminal event
    ContextLost,
}

/// One observable step of a live run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// The module emitted one output byte
    Output(u8),
    /// The run reached a terminal state
    Finished(RunOutcome),
}

struct ActiveRun {
    run_id: RunId,
    execution_id: ExecutionId,
    child: Child,
    events: Receiver<RunEvent>,
    pump: Option<JoinHandle<()>>,
    translate_time: Duration,
    deadline: Option<Instant>,
}

/// Orchestrates runs, one live execution context at a time
pub struct RunController {
    config: ControllerConfig,
    state: RunState,
    output: Vec<u8>,
    active: Option<ActiveRun>,
    last_outcome: Option<RunOutcome>,
}

impl RunController {
    /// Creates an idle controller
    pub fn new(config: ControllerConfig) -> Self {
        Self {
            config,
            state: RunState::Idle,
            output: Vec::new(),
            active: None,
            last_outcome: None,
        }
    }

    /// Returns the current lifecycle state
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Returns the ID of the live run, if any
    pub fn current_run(&self) -> Option<RunId> {
        self.active.as_ref().map(|active| active.run_id)
    }

    /// Returns the bytes the current or most recent run has emitted
    pub fn output_bytes(&self) -> &[u8] {
        &self.output
    }

    /// Returns the output record with each byte as its character
    pub fn output_text(&self) -> String {
        self.output.iter().map(|&byte| char::from(byte)).collect()
    }

    /// Returns the terminal outcome of the most recent run
    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    /// Starts a run: translate, compile, spawn a context, send the request
    ///
    /// Translation and compilation failures are terminal for this attempt
    /// only; the controller stays usable and the next `start_run` begins
    /// from scratch.
    pub fn start_run<T: Translator>(
        &mut self,
        translator: &T,
        source: &str,
        input: &[u8],
    ) -> Result<RunId, StartError> {
        if !self.state.can_start() {
            return Err(StartError::RunInProgress);
        }

        self.output.clear();
        self.last_outcome = None;

        let clock = Instant::now();

        self.state = RunState::Translating;
        let module_bytes = match translator.translate(source) {
            Ok(bytes) => bytes,
            Err(err) => {
                self.state = RunState::Failed;
                return Err(err.into());
            }
        };

        self.state = RunState::Compiling;
        if let Err(err) = ModuleImage::parse(&module_bytes) {
            self.state = RunState::Failed;
            return Err(err.into());
        }
        let translate_time = clock.elapsed();

        match self.spawn_context(module_bytes, input, translate_time) {
            Ok(run_id) => {
                self.state = RunState::Running;
                Ok(run_id)
            }
            Err(err) => {
                self.state = RunState::Failed;
                Err(err)
            }
        }
    }

    fn spawn_context(
        &mut self,
        module: Vec<u8>,
        input: &[u8],
        translate_time: Duration,
    ) -> Result<RunId, StartError> {
        let mut child = Command::new(&self.config.worker.program)
            .args(&self.config.worker.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()?;

        let (mut stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(StartError::Spawn(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "context pipes missing",
                )));
            }
        };

        let request = ExecutionRequest {
            module,
            input: input.to_vec(),
        };
        if let Err(err) = write_message(&mut stdin, &request) {
            let _ = child.kill();
            let _ = child.wait();
            return Err(err.into());
        }
        // close the request channel; the context gets exactly one request
        drop(stdin);

        let (sender, receiver) = mpsc::channel();
        let reader = BufReader::new(stdout);
        let pump = thread::spawn(move || pump_events(reader, sender));

        let run_id = RunId::new();
        let execution_id = ExecutionId::new();
        log::info!(
            "{} running in context {} ({} module bytes, {} input bytes)",
            run_id,
            execution_id,
            request.module.len(),
            request.input.len()
        );

        self.active = Some(ActiveRun {
            run_id,
            execution_id,
            child,
            events: receiver,
            pump: Some(pump),
            translate_time,
            deadline: self.config.timeout.map(|timeout| Instant::now() + timeout),
        });
        Ok(run_id)
    }

    /// Blocks until the next observable step of the live run
    ///
    /// Output bytes are appended to the output record in arrival order.
    /// A terminal step tears the context down before returning, so once
    /// `Finished` is observed no further event from that context exists.
    pub fn next_event(&mut self) -> Result<StepEvent, NotRunningError> {
        let active = self.active.as_mut().ok_or(NotRunningError)?;

        let received = match active.deadline {
            None => active
                .events
                .recv()
                .map_err(|_| RecvTimeoutError::Disconnected),
            Some(deadline) => {
                let now = Instant::now();
                if now >= deadline {
                    Err(RecvTimeoutError::Timeout)
                } else {
                    active.events.recv_timeout(deadline - now)
                }
            }
        };

        match received {
            Ok(RunEvent::Output { out }) => {
                self.output.push(out);
                Ok(StepEvent::Output(out))
            }
            Ok(RunEvent::Completed { exec_time }) => {
                let translate_time = active.translate_time;
                Ok(self.finish(
                    RunState::Completed,
                    RunOutcome::Completed {
                        translate_time,
                        exec_time,
                    },
                ))
            }
            Ok(RunEvent::Fault { error }) => {
                Ok(self.finish(RunState::Failed, RunOutcome::Fault { error }))
            }
            Err(RecvTimeoutError::Timeout) => {
                log::warn!("{} exceeded its deadline, killing context", active.run_id);
                Ok(self.finish(RunState::Failed, RunOutcome::TimedOut))
            }
            Err(RecvTimeoutError::Disconnected) => {
                log::warn!("{} lost its context without a terminal event", active.run_id);
                Ok(self.finish(RunState::Failed, RunOutcome::ContextLost))
            }
        }
    }

    /// Drives the live run to its terminal outcome
    pub fn run_to_completion(
        &mut self,
        mut on_output: impl FnMut(u8),
    ) -> Result<RunOutcome, NotRunningError> {
        loop {
            match self.next_event()? {
                StepEvent::Output(byte) => on_output(byte),
                StepEvent::Finished(outcome) => return Ok(outcome),
            }
        }
    }

    /// Unconditionally terminates the live run
    ///
    /// There is no shutdown handshake: the context is killed, its channel
    /// dies with it, and any event still in flight is discarded unread.
    pub fn abort_run(&mut self) -> Result<(), NotRunningError> {
        let active = self.active.take().ok_or(NotRunningError)?;
        log::info!("{} aborted by user", active.run_id);
        teardown(active);
        self.state = RunState::Aborted;
        self.last_outcome = Some(RunOutcome::Aborted);
        Ok(())
    }

    fn finish(&mut self, state: RunState, outcome: RunOutcome) -> StepEvent {
        if let Some(active) = self.active.take() {
            log::debug!("{} finished: context {} torn down", active.run_id, active.execution_id);
            teardown(active);
        }
        self.state = state;
        self.last_outcome = Some(outcome.clone());
        StepEvent::Finished(outcome)
    }
}

/// Kills the context and reclaims its channel and pump thread
fn teardown(mut active: ActiveRun) {
    if let Err(err) = active.child.kill() {
        log::debug!("context {} already gone: {}", active.execution_id, err);
    }
    let _ = active.child.wait();
    if let Some(pump) = active.pump.take() {
        let _ = pump.join();
    }
    // receiver drops here with any queued events unread
}

/// Forwards framed events into the controller's queue, in order
fn pump_events(mut reader: impl BufRead, sender: mpsc::Sender<RunEvent>) {
    loop {
        let message: Result<Option<RunEvent>, ProtocolError> = read_message(&mut reader);
        match message {
            Ok(Some(event)) => {
                let terminal = event.is_terminal();
                if sender.send(event).is_err() || terminal {
                    return;
                }
            }
            Ok(None) => return,
            Err(err) => {
                log::debug!("event stream ended: {}", err);
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedTranslator(Vec<u8>);

    impl Translator for FixedTranslator {
        fn translate(&self, _source: &str) -> Result<Vec<u8>, TranslationError> {
            Ok(self.0.clone())
        }
    }

    struct RejectingTranslator;

    impl Translator for RejectingTranslator {
        fn translate(&self, _source: &str) -> Result<Vec<u8>, TranslationError> {
            Err(TranslationError::new("unmatched '[' at byte 2"))
        }
    }

    fn sleep_config() -> ControllerConfig {
        ControllerConfig::new(WorkerCommand::new("sleep").arg("30"))
    }

    fn valid_module_bytes() -> Vec<u8> {
        ModuleImage::new(vec![bytecode::Op::Read], 4).to_bytes()
    }

    #[test]
    fn test_translation_error_fails_run_without_spawn() {
        let mut controller = RunController::new(sleep_config());
        let err = controller
            .start_run(&RejectingTranslator, "++[", b"")
            .unwrap_err();

        assert!(matches!(err, StartError::Translation(_)));
        assert_eq!(err.to_string(), "unmatched '[' at byte 2");
        assert_eq!(controller.state(), RunState::Failed);
        assert!(controller.current_run().is_none());
    }

    #[test]
    fn test_compile_error_fails_run_without_spawn() {
        let mut controller = RunController::new(sleep_config());
        let err = controller
            .start_run(&FixedTranslator(vec![0xBA, 0xD0]), "", b"")
            .unwrap_err();

        assert!(matches!(err, StartError::Compile(_)));
        assert_eq!(controller.state(), RunState::Failed);
        assert!(controller.current_run().is_none());
    }

    #[test]
    fn test_spawn_failure_fails_run() {
        let config =
            ControllerConfig::new(WorkerCommand::new("/nonexistent/bytebox-worker-binary"));
        let mut controller = RunController::new(config);
        let err = controller
            .start_run(&FixedTranslator(valid_module_bytes()), "", b"")
            .unwrap_err();

        assert!(matches!(err, StartError::Spawn(_)));
        assert_eq!(controller.state(), RunState::Failed);
    }

    #[test]
    fn test_failed_run_reenables_start() {
        let mut controller = RunController::new(sleep_config());
        let _ = controller.start_run(&RejectingTranslator, "", b"");
        assert_eq!(controller.state(), RunState::Failed);
        assert!(controller.state().can_start());
    }

    #[test]
    fn test_second_start_rejected_while_running() {
        let mut controller = RunController::new(sleep_config());
        controller
            .start_run(&FixedTranslator(valid_module_bytes()), "", b"")
            .unwrap();
        assert_eq!(controller.state(), RunState::Running);

        let err = controller
            .start_run(&FixedTranslator(valid_module_bytes()), "", b"")
            .unwrap_err();
        assert!(matches!(err, StartError::RunInProgress));

        controller.abort_run().unwrap();
    }

    #[test]
    fn test_abort_transitions_to_aborted() {
        let mut controller = RunController::new(sleep_config());
        controller
            .start_run(&FixedTranslator(valid_module_bytes()), "", b"")
            .unwrap();

        controller.abort_run().unwrap();
        assert_eq!(controller.state(), RunState::Aborted);
        assert_eq!(controller.last_outcome(), Some(&RunOutcome::Aborted));
        assert!(controller.output_bytes().is_empty());

        // no further events can be observed for the killed context
        assert_eq!(controller.next_event(), Err(NotRunningError));
    }

    #[test]
    fn test_abort_without_run_is_rejected() {
        let mut controller = RunController::new(sleep_config());
        assert_eq!(controller.abort_run(), Err(NotRunningError));
    }

    #[test]
    fn test_output_text_maps_bytes_to_chars() {
        let mut controller = RunController::new(sleep_config());
        controller.output = vec![104, 105, 33];
        assert_eq!(controller.output_text(), "hi!");
    }
}
