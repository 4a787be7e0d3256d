//! Named device operations on top of the backend coordinator.
//!
//! Each operation validates and clamps its input, renders one or more
//! `CommandRequest`s, and drives the shared `StatusBoard` through
//! `Executing*` to `Success` or `Error`.

mod device;
mod files;
mod packages;


use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::app::backend::parse::parse_getprop_map;
use crate::app::coordinator::BackendCoordinator;
use crate::app::models::{
    CommandFailure, CommandOutcome, CommandRequest, ErrorKind, OperationStatus, StatusEvent,
    SystemInfo,
};
use crate::app::status::StatusBoard;
use crate::app::trace::resolve_trace_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Normal,
    Critical,
}

/// Publishes the terminal status for one operation. Dropping it unfinished
/// (a panic inside dispatch) reports the operation as aborted.
struct StatusScope<'a> {
    board: &'a StatusBoard,
    label: String,
    trace_id: String,
    finished: bool,
}

impl StatusScope<'_> {
    fn finish(mut self, outcome: &CommandOutcome) {
        self.finished = true;
        match outcome {
            CommandOutcome::Ok { .. } => self.board.publish(OperationStatus::Success, &self.trace_id),
            CommandOutcome::Failed { detail, .. } => self
                .board
                .publish(OperationStatus::Error(detail.clone()), &self.trace_id),
        }
    }
}

impl Drop for StatusScope<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.board.publish(
                OperationStatus::Error(format!("Operation aborted: {}", self.label)),
                &self.trace_id,
            );
        }
    }
}

pub struct SystemOrchestrator {
    coordinator: Arc<BackendCoordinator>,
    status: Arc<StatusBoard>,
    trace_id: Option<String>,
}

impl SystemOrchestrator {
    pub fn new(coordinator: Arc<BackendCoordinator>) -> Self {
        Self {
            coordinator,
            status: Arc::new(StatusBoard::new()),
            trace_id: None,
        }
    }

    /// A handle sharing this orchestrator's coordinator and status board whose
    /// operations all log and publish under `trace_id`. `None` or a blank id
    /// keeps the default of a fresh id per operation.
    pub fn with_trace_id(&self, trace_id: Option<String>) -> Self {
        Self {
            coordinator: Arc::clone(&self.coordinator),
            status: Arc::clone(&self.status),
            trace_id,
        }
    }

    fn operation_trace_id(&self) -> String {
        resolve_trace_id(self.trace_id.clone())
    }

    pub fn coordinator(&self) -> &Arc<BackendCoordinator> {
        &self.coordinator
    }

    pub fn current_status(&self) -> OperationStatus {
        self.status.current_status()
    }

    pub fn subscribe(&self) -> Receiver<StatusEvent> {
        self.status.subscribe()
    }

    fn begin(&self, label: &str, severity: Severity, trace_id: &str) -> StatusScope<'_> {
        info!(
            trace_id = %trace_id,
            label = %label,
            critical = severity == Severity::Critical,
            "operation started"
        );
        let status = match severity {
            Severity::Normal => OperationStatus::Executing(label.to_string()),
            Severity::Critical => OperationStatus::ExecutingCritical(label.to_string()),
        };
        self.status.publish(status, trace_id);
        StatusScope {
            board: &self.status,
            label: label.to_string(),
            trace_id: trace_id.to_string(),
            finished: false,
        }
    }

    /// Sequential dispatch; the first failure wins, otherwise outputs are
    /// joined with newlines.
    fn dispatch_all(&self, requests: &[CommandRequest], trace_id: &str) -> CommandOutcome {
        let mut outputs = Vec::with_capacity(requests.len());
        for request in requests {
            match self.coordinator.dispatch(request, trace_id) {
                CommandOutcome::Ok { output } => outputs.push(output),
                failed => return failed,
            }
        }
        CommandOutcome::ok(outputs.join("\n"))
    }

    fn run_requests(
        &self,
        label: &str,
        severity: Severity,
        requests: Vec<CommandRequest>,
    ) -> CommandOutcome {
        let trace_id = self.operation_trace_id();
        let scope = self.begin(label, severity, &trace_id);
        let outcome = self.dispatch_all(&requests, &trace_id);
        if let CommandOutcome::Failed { kind, detail } = &outcome {
            warn!(trace_id = %trace_id, label = %label, kind = kind.code(), detail = %detail, "operation failed");
        }
        scope.finish(&outcome);
        outcome
    }

    fn run(&self, label: &str, request: CommandRequest) -> CommandOutcome {
        self.run_requests(label, Severity::Normal, vec![request])
    }

    fn run_shell(&self, label: &str, command: impl Into<String>) -> CommandOutcome {
        self.run(label, CommandRequest::shell(command))
    }

    fn run_checked(
        &self,
        label: &str,
        severity: Severity,
        build: impl FnOnce() -> Result<Vec<CommandRequest>, String>,
    ) -> CommandOutcome {
        match build() {
            Ok(requests) => self.run_requests(label, severity, requests),
            Err(detail) => self.reject(label, detail),
        }
    }

    fn reject(&self, label: &str, detail: String) -> CommandOutcome {
        let trace_id = self.operation_trace_id();
        let scope = self.begin(label, Severity::Normal, &trace_id);
        warn!(trace_id = %trace_id, label = %label, detail = %detail, "operation rejected");
        let outcome = CommandOutcome::failed(ErrorKind::InvalidArgument, detail);
        scope.finish(&outcome);
        outcome
    }

    fn query<T>(
        &self,
        label: &str,
        build: impl FnOnce() -> Result<CommandRequest, String>,
        parse: impl FnOnce(&str) -> T,
    ) -> Result<T, CommandFailure> {
        let output = self
            .run_checked(label, Severity::Normal, || build().map(|request| vec![request]))
            .into_result()?;
        Ok(parse(&output))
    }

    /// Free-form command; the status label is the command itself.
    pub fn execute_system_command(&self, command: &str) -> CommandOutcome {
        let trimmed = command.trim();
        self.run_checked(trimmed, Severity::Normal, || {
            if trimmed.is_empty() {
                return Err("command is required".to_string());
            }
            Ok(vec![CommandRequest::shell(trimmed)])
        })
    }

    /// Device properties are required; battery and memory dumps degrade to
    /// empty strings when they cannot be read.
    pub fn get_system_info(&self) -> Result<SystemInfo, CommandFailure> {
        let trace_id = self.operation_trace_id();
        let scope = self.begin("Collecting system info", Severity::Normal, &trace_id);

        let props = self
            .coordinator
            .dispatch(&CommandRequest::shell("getprop"), &trace_id)
            .into_result();
        let device: HashMap<String, String> = match props {
            Ok(output) => parse_getprop_map(&output),
            Err(failure) => {
                scope.finish(&CommandOutcome::failed(failure.kind, failure.detail.clone()));
                return Err(failure);
            }
        };
        let battery = self
            .coordinator
            .dispatch(&CommandRequest::shell("dumpsys battery"), &trace_id);
        let memory = self
            .coordinator
            .dispatch(&CommandRequest::shell("dumpsys meminfo"), &trace_id);

        let info = SystemInfo {
            device,
            battery: battery.output().unwrap_or_default().to_string(),
            memory: memory.output().unwrap_or_default().to_string(),
            timestamp: Utc::now().to_rfc3339(),
        };
        scope.finish(&CommandOutcome::ok(String::new()));
        Ok(info)
    }
}
