pub mod app;

use std::sync::Arc;

use app::backend::{
    AndroidPlatform, BrokerBackend, CapabilityBackend, DebugBridgeBackend, ElevatedBackend,
    RishBroker, ShellLauncher, SystemLauncher,
};
use app::config::AppConfig;
use app::coordinator::{BackendCoordinator, Backends};
use app::orchestrator::SystemOrchestrator;
use app::scheduler::TaskScheduler;

/// Wires the production adapters around one process launcher. Construction
/// probes the broker and elevated session once to pick the initial backend.
pub fn build_coordinator(config: &AppConfig) -> Arc<BackendCoordinator> {
    let launcher: Arc<dyn ShellLauncher> = Arc::new(SystemLauncher::new(config.command.timeout()));

    let broker = RishBroker::new(
        Arc::clone(&launcher),
        config.broker.rish_program.as_str(),
        config.broker.server_process.as_str(),
    );
    let platform = AndroidPlatform::new(
        Arc::clone(&launcher),
        config.platform.power_supply_dir.as_str(),
        config.platform.data_dir.as_str(),
    );
    let backends = Backends {
        broker: Arc::new(BrokerBackend::new(Arc::new(broker))),
        elevated: Arc::new(ElevatedBackend::new(
            Arc::clone(&launcher),
            config.elevated.su_program.as_str(),
        )),
        debug_bridge: Arc::new(DebugBridgeBackend::new(
            Arc::clone(&launcher),
            config.debug_bridge.program.as_str(),
            config.debug_bridge.args.clone(),
        )),
        capability: Arc::new(CapabilityBackend::new(Arc::new(platform))),
    };

    Arc::new(BackendCoordinator::new(
        backends,
        Arc::new(TaskScheduler::new(config.command.max_parallel)),
    ))
}

pub fn build_orchestrator(config: &AppConfig) -> SystemOrchestrator {
    SystemOrchestrator::new(build_coordinator(config))
}
