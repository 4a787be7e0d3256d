use std::sync::{Arc, OnceLock};

use regex::Regex;
use tracing::debug;

use crate::app::backend::runner::ShellLauncher;
use crate::app::backend::{outcome_from_output, Backend};
use crate::app::models::{AvailabilityState, BackendKind, CommandOutcome, CommandRequest};

const SESSION_TERMINATOR: &str = "exit\n";

/// Superuser session backend (`su`).
pub struct ElevatedBackend {
    launcher: Arc<dyn ShellLauncher>,
    su_program: String,
}

impl ElevatedBackend {
    pub fn new(launcher: Arc<dyn ShellLauncher>, su_program: impl Into<String>) -> Self {
        Self {
            launcher,
            su_program: su_program.into(),
        }
    }

    fn session_script(command: &str) -> String {
        format!("{}\n{SESSION_TERMINATOR}", command.trim_end())
    }
}

impl Backend for ElevatedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ElevatedSession
    }

    fn probe(&self, trace_id: &str) -> AvailabilityState {
        let script = Self::session_script("id");
        match self
            .launcher
            .launch(&self.su_program, &[], Some(&script), trace_id)
        {
            Ok(output) if output.succeeded() && parse_uid(&output.stdout) == Some(0) => {
                AvailabilityState::usable()
            }
            Ok(output) => {
                debug!(
                    trace_id = %trace_id,
                    exit_code = ?output.exit_code,
                    "superuser session did not report uid 0"
                );
                // su exists but refused us, or handed back an unprivileged identity.
                AvailabilityState {
                    reachable: true,
                    authorized: false,
                }
            }
            Err(err) => {
                debug!(trace_id = %trace_id, error = %err, "superuser session unavailable");
                AvailabilityState::unreachable()
            }
        }
    }

    fn run(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome {
        let script = Self::session_script(&request.command);
        outcome_from_output(
            self.launcher
                .launch(&self.su_program, &[], Some(&script), trace_id),
        )
    }
}

/// Extracts the numeric uid from `id` output (`uid=0(root) gid=0(root) ...`).
pub fn parse_uid(output: &str) -> Option<u32> {
    static UID_RE: OnceLock<Regex> = OnceLock::new();
    let re = UID_RE.get_or_init(|| Regex::new(r"\buid=(\d+)").expect("uid regex"));
    re.captures(output)
        .and_then(|caps| caps.get(1))
        .and_then(|value| value.as_str().parse::<u32>().ok())
}
