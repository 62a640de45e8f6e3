//! # Bytebox Host Daemon
//!
//! One-shot front end for the sandboxed execution bridge: translate a
//! source file, run it in an isolated context against an input buffer,
//! stream the output, and report timings.
//!
//! The same executable doubles as the execution context: spawned with
//! `--worker`, it serves a single execution request over stdin/stdout.

use controller::{
    ControllerConfig, NotRunningError, RunController, RunOutcome, StartError, TranslationError,
    Translator, WorkerCommand,
};
use sandbox_protocol::ProtocolError;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Flag that switches the executable into execution-context mode
pub const WORKER_FLAG: &str = "--worker";

/// Which role this invocation plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DaemonMode {
    /// Run one source file to a terminal state
    #[default]
    Run,
    /// Serve one execution request over stdin/stdout
    Worker,
}

/// Daemon configuration assembled from the command line
#[derive(Debug, Clone, Default)]
pub struct DaemonConfig {
    /// Role of this invocation
    pub mode: DaemonMode,
    /// Source file to translate and run
    pub source: Option<PathBuf>,
    /// Inline input text
    pub input: Option<String>,
    /// File to read the input buffer from
    pub input_file: Option<PathBuf>,
    /// Execution deadline in milliseconds
    pub timeout_ms: Option<u64>,
}

/// Errors surfaced to the daemon's caller
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Run mode started without a source file
    #[error("no source file given")]
    MissingSource,

    /// Inline input and input file are mutually exclusive
    #[error("--input and --input-file are mutually exclusive")]
    ConflictingInput,

    /// A configured file could not be read
    #[error("failed to read {}: {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The daemon's own executable path could not be determined
    #[error("cannot locate worker executable: {0}")]
    WorkerPath(io::Error),

    /// Starting the run failed (translation, compilation, or spawn)
    #[error(transparent)]
    Start(#[from] StartError),

    /// The run ended in an execution fault
    #[error("execution fault: {0}")]
    Fault(String),

    /// The run exceeded its deadline and was killed
    #[error("execution timed out")]
    TimedOut,

    /// The run was aborted before completing
    #[error("run aborted")]
    Aborted,

    /// The execution context died without reporting a result
    #[error("execution context lost")]
    ContextLost,

    /// Streaming output to stdout failed
    #[error("failed to write output: {0}")]
    OutputFailed(io::Error),

    /// Worker mode lost its event stream
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The controller was asked about a run that does not exist
    #[error(transparent)]
    NotRunning(#[from] NotRunningError),
}

/// Translator boundary implementation backed by the in-tree translator
pub struct SourceTranslator;

impl Translator for SourceTranslator {
    fn translate(&self, source: &str) -> Result<Vec<u8>, TranslationError> {
        translator::translate(source).map_err(|err| TranslationError::new(err.to_string()))
    }
}

/// The host daemon
pub struct Daemon {
    config: DaemonConfig,
}

impl Daemon {
    /// Validates a configuration and creates the daemon
    pub fn new(config: DaemonConfig) -> Result<Self, DaemonError> {
        if config.mode == DaemonMode::Run {
            if config.source.is_none() {
                return Err(DaemonError::MissingSource);
            }
            if config.input.is_some() && config.input_file.is_some() {
                return Err(DaemonError::ConflictingInput);
            }
        }
        Ok(Self { config })
    }

    /// Runs the configured role to completion
    pub fn run(&mut self) -> Result<(), DaemonError> {
        match self.config.mode {
            DaemonMode::Worker => self.run_worker_mode(),
            DaemonMode::Run => self.run_once(),
        }
    }

    fn run_worker_mode(&self) -> Result<(), DaemonError> {
        log::debug!("execution context serving one request");
        let stdin = io::stdin();
        let stdout = io::stdout();
        sandbox_runtime::run_worker(stdin.lock(), stdout.lock())?;
        Ok(())
    }

    fn run_once(&self) -> Result<(), DaemonError> {
        let source_path = self.config.source.as_ref().ok_or(DaemonError::MissingSource)?;
        let source = fs::read_to_string(source_path).map_err(|err| DaemonError::ReadFailed {
            path: source_path.clone(),
            source: err,
        })?;
        let input = self.resolve_input()?;

        let worker = WorkerCommand::new(env::current_exe().map_err(DaemonError::WorkerPath)?)
            .arg(WORKER_FLAG);
        let mut config = ControllerConfig::new(worker);
        if let Some(ms) = self.config.timeout_ms {
            config = config.with_timeout(Duration::from_millis(ms));
        }

        let mut controller = RunController::new(config);
        controller.start_run(&SourceTranslator, &source, &input)?;

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let mut write_error: Option<io::Error> = None;
        let outcome = controller.run_to_completion(|byte| {
            if write_error.is_none() {
                let result = out.write_all(&[byte]).and_then(|_| out.flush());
                if let Err(err) = result {
                    write_error = Some(err);
                }
            }
        })?;
        if let Some(err) = write_error {
            return Err(DaemonError::OutputFailed(err));
        }

        match outcome {
            RunOutcome::Completed {
                translate_time,
                exec_time,
            } => {
                eprintln!(
                    "Translate: {:.3} ms Execution: {:.3} ms",
                    translate_time.as_secs_f64() * 1e3,
                    exec_time.as_secs_f64() * 1e3
                );
                Ok(())
            }
            RunOutcome::Fault { error } => Err(DaemonError::Fault(error)),
            RunOutcome::TimedOut => Err(DaemonError::TimedOut),
            RunOutcome::Aborted => Err(DaemonError::Aborted),
            RunOutcome::ContextLost => Err(DaemonError::ContextLost),
        }
    }

    fn resolve_input(&self) -> Result<Vec<u8>, DaemonError> {
        if let Some(text) = &self.config.input {
            return Ok(text.clone().into_bytes());
        }
        if let Some(path) = &self.config.input_file {
            return fs::read(path).map_err(|err| DaemonError::ReadFailed {
                path: path.clone(),
                source: err,
            });
        }
        Ok(Vec::new())
    }
}
