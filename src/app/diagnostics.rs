use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::info;

use crate::app::coordinator::{BackendAvailability, BackendCoordinator};
use crate::app::error::AppError;
use crate::app::models::BackendKind;

#[derive(Debug, Serialize)]
pub struct ReportManifest {
    pub app_version: &'static str,
    pub os: &'static str,
    pub arch: &'static str,
    pub timestamp_utc: String,
    pub trace_id: String,
}

#[derive(Debug, Serialize)]
pub struct BackendReport {
    pub manifest: ReportManifest,
    pub backends: Vec<BackendAvailability>,
    pub current_backend: BackendKind,
    pub has_elevated_access: bool,
    pub status_message: String,
}

/// Probes every backend and re-detects the preferred one.
pub fn collect_backend_report(coordinator: &BackendCoordinator, trace_id: &str) -> BackendReport {
    let backends = coordinator.availability(trace_id);
    let current_backend = coordinator.refresh(trace_id);
    BackendReport {
        manifest: ReportManifest {
            app_version: env!("CARGO_PKG_VERSION"),
            os: std::env::consts::OS,
            arch: std::env::consts::ARCH,
            timestamp_utc: Utc::now().to_rfc3339(),
            trace_id: trace_id.to_string(),
        },
        backends,
        current_backend,
        has_elevated_access: coordinator.has_elevated_access(),
        status_message: coordinator.status_message().to_string(),
    }
}

/// Writes `backend_report_<timestamp>_<trace>.json` into `output_dir`.
pub fn write_backend_report(
    report: &BackendReport,
    output_dir: &Path,
    trace_id: &str,
) -> Result<PathBuf, AppError> {
    fs::create_dir_all(output_dir).map_err(|err| {
        AppError::system(format!("Failed to create output dir: {err}"), trace_id)
    })?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S").to_string();
    let trace_short = trace_id
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>();
    let path = output_dir.join(format!("backend_report_{timestamp}_{trace_short}.json"));

    let payload = serde_json::to_string_pretty(report)
        .map_err(|err| AppError::system(format!("Failed to serialize report: {err}"), trace_id))?;
    fs::write(&path, payload)
        .map_err(|err| AppError::system(format!("Failed to write report: {err}"), trace_id))?;

    info!(trace_id = %trace_id, path = %path.display(), "backend report written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::app::coordinator::Backends;
    use crate::app::scheduler::TaskScheduler;
    use crate::app::testing::{journal, FakeBackend};

    fn coordinator(broker: bool) -> BackendCoordinator {
        let journal = journal();
        BackendCoordinator::new(
            Backends {
                broker: FakeBackend::new(BackendKind::DelegatedBroker, broker, journal.clone()),
                elevated: FakeBackend::new(BackendKind::ElevatedSession, false, journal.clone()),
                debug_bridge: FakeBackend::new(BackendKind::LocalDebugBridge, false, journal.clone()),
                capability: FakeBackend::new(BackendKind::CapabilityProbe, true, journal),
            },
            Arc::new(TaskScheduler::new(1)),
        )
    }

    #[test]
    fn report_lists_every_backend() {
        let report = collect_backend_report(&coordinator(true), "trace-1");

        assert_eq!(report.backends.len(), 4);
        assert_eq!(report.current_backend, BackendKind::DelegatedBroker);
        assert!(report.has_elevated_access);
        assert_eq!(report.status_message, "Connected via Shizuku (Full access)");
        assert_eq!(report.manifest.trace_id, "trace-1");
    }

    #[test]
    fn report_serializes_snake_case_kinds() {
        let report = collect_backend_report(&coordinator(false), "t");
        let value = serde_json::to_value(&report).expect("json");

        assert_eq!(value["current_backend"], "capability_probe");
        assert_eq!(value["backends"][1]["kind"], "elevated_session");
        assert_eq!(value["backends"][1]["availability"]["reachable"], false);
    }

    #[test]
    fn writes_report_file() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let report = collect_backend_report(&coordinator(false), "abc-123");

        let path = write_backend_report(&report, &tmp.path().join("out"), "abc-123").expect("write");

        assert!(path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("backend_report_") && name.ends_with("_abc123.json")));
        let text = fs::read_to_string(path).expect("read");
        assert!(text.contains("\"status_message\""));
    }
}
