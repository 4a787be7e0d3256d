//! Backend selection and fallback.
//!
//! Every dispatch walks the same fixed chain: delegated broker, elevated
//! session, local debug bridge, capability probe. Nothing about the previous
//! call is trusted; a broker that answered a second ago may have been killed
//! since, so gated backends are probed again before each attempt.

mod remediation;


use std::sync::{Arc, PoisonError, RwLock};
use std::thread::JoinHandle;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::app::backend::Backend;
use crate::app::models::{
    AvailabilityState, BackendKind, CommandOutcome, CommandRequest, ErrorKind,
};
use crate::app::scheduler::{lock_ignoring_poison, TaskScheduler};
use crate::app::trace::new_trace_id;

pub use remediation::{classify, remediation_message, CommandFamily};

/// The four adapters, one per slot of the fallback chain.
pub struct Backends {
    pub broker: Arc<dyn Backend>,
    pub elevated: Arc<dyn Backend>,
    pub debug_bridge: Arc<dyn Backend>,
    pub capability: Arc<dyn Backend>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    /// Attempt only when a fresh probe reports reachable and authorized.
    Probe,
    /// Attempt unconditionally; the run itself is the probe.
    Direct,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BackendAvailability {
    pub kind: BackendKind,
    pub availability: AvailabilityState,
}

pub struct BackendCoordinator {
    backends: Backends,
    scheduler: Arc<TaskScheduler>,
    current: RwLock<BackendKind>,
}

impl BackendCoordinator {
    pub fn new(backends: Backends, scheduler: Arc<TaskScheduler>) -> Self {
        let coordinator = Self {
            backends,
            scheduler,
            current: RwLock::new(BackendKind::None),
        };
        coordinator.refresh(&new_trace_id());
        coordinator
    }

    fn chain(&self) -> [(&Arc<dyn Backend>, Gate); 4] {
        [
            (&self.backends.broker, Gate::Probe),
            (&self.backends.elevated, Gate::Probe),
            (&self.backends.debug_bridge, Gate::Direct),
            (&self.backends.capability, Gate::Direct),
        ]
    }

    fn record(&self, kind: BackendKind) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = kind;
    }

    fn probe_locked(&self, backend: &Arc<dyn Backend>, trace_id: &str) -> AvailabilityState {
        let lock = self.scheduler.backend_lock(backend.kind());
        let _guard = lock_ignoring_poison(&lock);
        backend.probe(trace_id)
    }

    /// Re-detects the preferred backend without running anything. Falls back to
    /// `CapabilityProbe` (limited access) when neither gated backend is usable.
    pub fn refresh(&self, trace_id: &str) -> BackendKind {
        let detected = if self.probe_locked(&self.backends.broker, trace_id).is_usable() {
            BackendKind::DelegatedBroker
        } else if self.probe_locked(&self.backends.elevated, trace_id).is_usable() {
            BackendKind::ElevatedSession
        } else {
            BackendKind::CapabilityProbe
        };
        info!(trace_id = %trace_id, backend = %detected, "detected execution backend");
        self.record(detected);
        detected
    }

    /// Probes all four backends in chain order.
    pub fn availability(&self, trace_id: &str) -> Vec<BackendAvailability> {
        self.chain()
            .iter()
            .map(|(backend, _)| BackendAvailability {
                kind: backend.kind(),
                availability: self.probe_locked(backend, trace_id),
            })
            .collect()
    }

    pub fn dispatch(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome {
        for (backend, gate) in self.chain() {
            let kind = backend.kind();
            let lock = self.scheduler.backend_lock(kind);
            let _guard = lock_ignoring_poison(&lock);

            if gate == Gate::Probe {
                let state = backend.probe(trace_id);
                if !state.is_usable() {
                    debug!(
                        trace_id = %trace_id,
                        backend = %kind,
                        reachable = state.reachable,
                        authorized = state.authorized,
                        "backend skipped"
                    );
                    continue;
                }
            }

            match backend.run(request, trace_id) {
                CommandOutcome::Ok { output } => {
                    self.record(kind);
                    info!(trace_id = %trace_id, backend = %kind, "command dispatched");
                    return CommandOutcome::Ok { output };
                }
                CommandOutcome::Failed {
                    kind: failure,
                    detail,
                } => {
                    warn!(
                        trace_id = %trace_id,
                        backend = %kind,
                        kind = failure.code(),
                        detail = %detail,
                        "backend attempt failed"
                    );
                }
            }
        }

        self.record(BackendKind::None);
        warn!(trace_id = %trace_id, command = %request.command, "no backend could run command");
        CommandOutcome::failed(
            ErrorKind::NoBackendAvailable,
            remediation_message(&request.command),
        )
    }

    pub fn dispatch_command(&self, command: &str, trace_id: &str) -> CommandOutcome {
        self.dispatch(&CommandRequest::shell(command), trace_id)
    }

    /// Runs `dispatch` on a scheduler thread so the caller never blocks on a session.
    pub fn spawn_dispatch(
        self: &Arc<Self>,
        request: CommandRequest,
        trace_id: String,
    ) -> JoinHandle<CommandOutcome> {
        let coordinator = Arc::clone(self);
        self.scheduler
            .spawn(move || coordinator.dispatch(&request, &trace_id))
    }

    /// Best-effort: the backend recorded by the most recent detection or dispatch.
    pub fn current_backend(&self) -> BackendKind {
        *self.current.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn has_elevated_access(&self) -> bool {
        !matches!(
            self.current_backend(),
            BackendKind::None | BackendKind::CapabilityProbe
        )
    }

    pub fn status_message(&self) -> &'static str {
        match self.current_backend() {
            BackendKind::DelegatedBroker => "Connected via Shizuku (Full access)",
            BackendKind::ElevatedSession => "Connected via Root (Full access)",
            BackendKind::LocalDebugBridge => "Connected via ADB (Full access)",
            BackendKind::CapabilityProbe => "Limited access - Using Android APIs only",
            BackendKind::None => "No privileged access available",
        }
    }
}
