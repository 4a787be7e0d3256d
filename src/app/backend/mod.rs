//! Privilege-escalation backends.
//!
//! Every backend exposes the same two calls: a side-effect-free `probe` and a
//! `run` that never panics on I/O and never leaks a platform error. All
//! failures come back as `CommandOutcome::Failed`.

pub mod broker;
pub mod capability;
pub mod debug_bridge;
pub mod elevated;
pub mod parse;
pub mod platform;
pub mod runner;

use crate::app::error::AppError;
use crate::app::models::{AvailabilityState, BackendKind, CommandOutcome, CommandRequest, ErrorKind};

use self::runner::CommandOutput;

pub use broker::{BrokerBackend, BrokerClient, RishBroker};
pub use capability::CapabilityBackend;
pub use debug_bridge::DebugBridgeBackend;
pub use elevated::ElevatedBackend;
pub use platform::{AndroidPlatform, PlatformActions};
pub use runner::{ShellLauncher, SystemLauncher};

pub trait Backend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn probe(&self, trace_id: &str) -> AvailabilityState;

    fn run(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome;
}

/// Maps a finished shell invocation onto the shared success/failure shape.
pub(crate) fn outcome_from_output(result: Result<CommandOutput, AppError>) -> CommandOutcome {
    match result {
        Ok(output) if output.succeeded() => CommandOutcome::ok(output.stdout),
        Ok(output) => {
            let stderr = output.stderr.trim();
            let detail = if stderr.is_empty() { "Unknown error" } else { stderr };
            let exit = output
                .exit_code
                .map(|code| code.to_string())
                .unwrap_or_else(|| "signal".to_string());
            CommandOutcome::failed(
                ErrorKind::CommandFailed,
                format!("Command failed (exit {exit}): {detail}"),
            )
        }
        Err(err) => CommandOutcome::failed(ErrorKind::CommandFailed, err.error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_zero_exit_maps_to_command_failed_with_stderr() {
        let outcome = outcome_from_output(Ok(CommandOutput {
            stdout: String::new(),
            stderr: "svc: permission denied\n".to_string(),
            exit_code: Some(255),
        }));
        assert_eq!(
            outcome,
            CommandOutcome::failed(
                ErrorKind::CommandFailed,
                "Command failed (exit 255): svc: permission denied"
            )
        );
    }

    #[test]
    fn empty_stderr_reads_unknown_error() {
        let outcome = outcome_from_output(Ok(CommandOutput {
            stdout: String::new(),
            stderr: String::new(),
            exit_code: None,
        }));
        assert_eq!(
            outcome,
            CommandOutcome::failed(ErrorKind::CommandFailed, "Command failed (exit signal): Unknown error")
        );
    }

    #[test]
    fn spawn_errors_become_command_failed() {
        let outcome = outcome_from_output(Err(AppError::dependency("Failed to spawn su", "t")));
        assert_eq!(outcome.failure_kind(), Some(ErrorKind::CommandFailed));
    }
}
