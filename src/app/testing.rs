//! Scripted stand-ins for the OS and for whole backends.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::app::backend::runner::{CommandOutput, ShellLauncher};
use crate::app::backend::Backend;
use crate::app::error::AppError;
use crate::app::models::{AvailabilityState, BackendKind, CommandOutcome, CommandRequest, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCall {
    pub program: String,
    pub args: Vec<String>,
    pub stdin: Option<String>,
}

impl LaunchCall {
    pub fn argv(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

type Responder = dyn Fn(&LaunchCall) -> Result<CommandOutput, AppError> + Send + Sync;

pub struct ScriptedLauncher {
    calls: Mutex<Vec<LaunchCall>>,
    responder: Box<Responder>,
}

impl ScriptedLauncher {
    pub fn new(
        responder: impl Fn(&LaunchCall) -> Result<CommandOutput, AppError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Box::new(responder),
        }
    }

    pub fn calls(&self) -> Vec<LaunchCall> {
        self.calls.lock().expect("calls").clone()
    }
}

impl ShellLauncher for ScriptedLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        _trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        let call = LaunchCall {
            program: program.to_string(),
            args: args.to_vec(),
            stdin: stdin.map(str::to_string),
        };
        self.calls.lock().expect("calls").push(call.clone());
        (self.responder)(&call)
    }
}

pub fn exit_with(code: i32, stdout: &str, stderr: &str) -> Result<CommandOutput, AppError> {
    Ok(CommandOutput {
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        exit_code: Some(code),
    })
}

/// Shared, ordered log of probe/run calls across several fake backends.
pub type Journal = Arc<Mutex<Vec<String>>>;

pub fn journal() -> Journal {
    Arc::new(Mutex::new(Vec::new()))
}

pub struct FakeBackend {
    kind: BackendKind,
    availability: Mutex<AvailabilityState>,
    outcomes: Mutex<VecDeque<CommandOutcome>>,
    fallback: Mutex<CommandOutcome>,
    commands: Mutex<Vec<String>>,
    journal: Journal,
}

impl FakeBackend {
    /// Available backends succeed with `"<label> ok"`; unavailable ones fail.
    pub fn new(kind: BackendKind, available: bool, journal: Journal) -> Arc<Self> {
        let fallback = if available {
            CommandOutcome::ok(format!("{} ok", kind.label()))
        } else {
            CommandOutcome::failed(ErrorKind::CommandFailed, format!("{} failed", kind.label()))
        };
        let availability = if available {
            AvailabilityState::usable()
        } else {
            AvailabilityState::unreachable()
        };
        Arc::new(Self {
            kind,
            availability: Mutex::new(availability),
            outcomes: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            commands: Mutex::new(Vec::new()),
            journal,
        })
    }

    pub fn set_availability(&self, state: AvailabilityState) {
        *self.availability.lock().expect("availability") = state;
    }

    pub fn set_outcome(&self, outcome: CommandOutcome) {
        *self.fallback.lock().expect("fallback") = outcome;
    }

    /// Outcomes returned once each, in order, before falling back to the default.
    pub fn push_outcome(&self, outcome: CommandOutcome) {
        self.outcomes.lock().expect("outcomes").push_back(outcome);
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().expect("commands").clone()
    }
}

impl Backend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn probe(&self, _trace_id: &str) -> AvailabilityState {
        self.journal
            .lock()
            .expect("journal")
            .push(format!("probe:{}", self.kind.label()));
        *self.availability.lock().expect("availability")
    }

    fn run(&self, request: &CommandRequest, _trace_id: &str) -> CommandOutcome {
        self.journal
            .lock()
            .expect("journal")
            .push(format!("run:{}", self.kind.label()));
        self.commands
            .lock()
            .expect("commands")
            .push(request.command.clone());
        if let Some(next) = self.outcomes.lock().expect("outcomes").pop_front() {
            return next;
        }
        self.fallback.lock().expect("fallback").clone()
    }
}
