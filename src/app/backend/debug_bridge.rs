use std::sync::Arc;

use crate::app::backend::runner::ShellLauncher;
use crate::app::backend::{outcome_from_output, Backend};
use crate::app::models::{AvailabilityState, BackendKind, CommandOutcome, CommandRequest};

/// Local debug shell. `sh -c <command>` by default; `adb shell <command>` when
/// pointed at a host-side bridge.
pub struct DebugBridgeBackend {
    launcher: Arc<dyn ShellLauncher>,
    program: String,
    args: Vec<String>,
}

impl DebugBridgeBackend {
    pub fn new(launcher: Arc<dyn ShellLauncher>, program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            launcher,
            program: program.into(),
            args,
        }
    }

    fn invoke(&self, command: &str, trace_id: &str) -> CommandOutcome {
        let mut args = self.args.clone();
        args.push(command.to_string());
        outcome_from_output(self.launcher.launch(&self.program, &args, None, trace_id))
    }
}

impl Backend for DebugBridgeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::LocalDebugBridge
    }

    // The bridge has no handshake; the only way to probe it is to run something.
    fn probe(&self, trace_id: &str) -> AvailabilityState {
        if self.invoke("true", trace_id).is_ok() {
            AvailabilityState::usable()
        } else {
            AvailabilityState::unreachable()
        }
    }

    fn run(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome {
        self.invoke(&request.command, trace_id)
    }
}
