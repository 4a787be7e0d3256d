use std::sync::Arc;

use tracing::debug;

use crate::app::backend::runner::{CommandOutput, ShellLauncher};
use crate::app::backend::{outcome_from_output, Backend};
use crate::app::error::AppError;
use crate::app::models::{AvailabilityState, BackendKind, CommandOutcome, CommandRequest, ErrorKind};

pub const BROKER_NOT_RUNNING: &str = "Shizuku not running. Please start the Shizuku app.";
pub const BROKER_NOT_AUTHORIZED: &str =
    "Shizuku permission not granted. Please authorize this app in Shizuku.";

/// Connection to a separately running privileged broker (Shizuku).
///
/// Reachability and authorization are separate questions: the broker can be
/// up while this app has not been granted access yet.
pub trait BrokerClient: Send + Sync {
    fn ping(&self, trace_id: &str) -> bool;

    fn has_permission(&self, trace_id: &str) -> bool;

    fn execute(&self, command: &str, trace_id: &str) -> Result<CommandOutput, AppError>;
}

/// Talks to Shizuku through its `rish` shell bridge.
pub struct RishBroker {
    launcher: Arc<dyn ShellLauncher>,
    rish_program: String,
    server_process: String,
}

impl RishBroker {
    pub fn new(
        launcher: Arc<dyn ShellLauncher>,
        rish_program: impl Into<String>,
        server_process: impl Into<String>,
    ) -> Self {
        Self {
            launcher,
            rish_program: rish_program.into(),
            server_process: server_process.into(),
        }
    }
}

impl BrokerClient for RishBroker {
    fn ping(&self, trace_id: &str) -> bool {
        match self
            .launcher
            .launch("pidof", &[self.server_process.clone()], None, trace_id)
        {
            Ok(output) => output.succeeded() && !output.stdout.trim().is_empty(),
            Err(err) => {
                debug!(trace_id = %trace_id, error = %err, "broker ping failed");
                false
            }
        }
    }

    fn has_permission(&self, trace_id: &str) -> bool {
        let args = vec!["-c".to_string(), "id".to_string()];
        match self.launcher.launch(&self.rish_program, &args, None, trace_id) {
            Ok(output) => output.succeeded(),
            Err(err) => {
                debug!(trace_id = %trace_id, error = %err, "broker permission check failed");
                false
            }
        }
    }

    fn execute(&self, command: &str, trace_id: &str) -> Result<CommandOutput, AppError> {
        let args = vec!["-c".to_string(), command.to_string()];
        self.launcher.launch(&self.rish_program, &args, None, trace_id)
    }
}

pub struct BrokerBackend {
    client: Arc<dyn BrokerClient>,
}

impl BrokerBackend {
    pub fn new(client: Arc<dyn BrokerClient>) -> Self {
        Self { client }
    }
}

impl Backend for BrokerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::DelegatedBroker
    }

    fn probe(&self, trace_id: &str) -> AvailabilityState {
        let reachable = self.client.ping(trace_id);
        let authorized = reachable && self.client.has_permission(trace_id);
        AvailabilityState {
            reachable,
            authorized,
        }
    }

    fn run(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome {
        if !self.client.ping(trace_id) {
            return CommandOutcome::failed(ErrorKind::BrokerUnavailable, BROKER_NOT_RUNNING);
        }
        if !self.client.has_permission(trace_id) {
            return CommandOutcome::failed(ErrorKind::PermissionDenied, BROKER_NOT_AUTHORIZED);
        }
        outcome_from_output(self.client.execute(&request.command, trace_id))
    }
}
