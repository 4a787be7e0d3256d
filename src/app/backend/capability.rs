use std::sync::Arc;

use tracing::debug;

use crate::app::backend::platform::PlatformActions;
use crate::app::backend::Backend;
use crate::app::error::AppError;
use crate::app::models::{
    AvailabilityState, BackendKind, BatteryInfo, CommandOutcome, CommandRequest, DeviceProfile,
    ErrorKind, SettingsPanel, StorageInfo,
};

/// The fixed vocabulary this backend understands. Anything else is refused;
/// the backend never executes caller-provided shell text.
#[derive(Debug, Clone, PartialEq, Eq)]
enum CapabilityCommand {
    OpenPanel(SettingsPanel),
    OpenSettings(Option<String>),
    OpenApp(Option<String>),
    Battery,
    Device,
    Storage,
}

impl CapabilityCommand {
    fn parse(request: &CommandRequest) -> Option<Self> {
        let command = match request.command.trim().to_lowercase().as_str() {
            "wifi" => CapabilityCommand::OpenPanel(SettingsPanel::Wifi),
            "bluetooth" | "bt" => CapabilityCommand::OpenPanel(SettingsPanel::Bluetooth),
            "airplane" | "airplanemode" => CapabilityCommand::OpenPanel(SettingsPanel::AirplaneMode),
            "brightness" => CapabilityCommand::OpenPanel(SettingsPanel::Display),
            "location" => CapabilityCommand::OpenPanel(SettingsPanel::Location),
            "volume" => CapabilityCommand::OpenPanel(SettingsPanel::Sound),
            "developermode" | "devmode" => CapabilityCommand::OpenPanel(SettingsPanel::Developer),
            "settings" => CapabilityCommand::OpenSettings(request.param("type").map(str::to_string)),
            "open" => CapabilityCommand::OpenApp(
                request
                    .param("app")
                    .map(str::trim)
                    .filter(|app| !app.is_empty())
                    .map(str::to_string),
            ),
            "battery" => CapabilityCommand::Battery,
            "device" => CapabilityCommand::Device,
            "storage" => CapabilityCommand::Storage,
            _ => return None,
        };
        Some(command)
    }
}

fn panel_for_type(kind: Option<&str>) -> SettingsPanel {
    match kind.map(str::to_lowercase).as_deref() {
        Some("wifi") => SettingsPanel::Wifi,
        Some("bluetooth") | Some("bt") => SettingsPanel::Bluetooth,
        Some("location") => SettingsPanel::Location,
        Some("display") | Some("brightness") => SettingsPanel::Display,
        Some("sound") | Some("volume") => SettingsPanel::Sound,
        Some("apps") => SettingsPanel::Apps,
        Some("storage") => SettingsPanel::Storage,
        Some("battery") => SettingsPanel::Battery,
        Some("network") => SettingsPanel::Network,
        Some("developer") | Some("dev") => SettingsPanel::Developer,
        _ => SettingsPanel::Main,
    }
}

fn panel_title(panel: SettingsPanel) -> &'static str {
    match panel {
        SettingsPanel::Wifi => "WiFi",
        SettingsPanel::Bluetooth => "Bluetooth",
        SettingsPanel::AirplaneMode => "Airplane mode",
        SettingsPanel::Display => "Display",
        SettingsPanel::Location => "Location",
        SettingsPanel::Sound => "Sound",
        SettingsPanel::Developer => "Developer",
        SettingsPanel::Apps => "Apps",
        SettingsPanel::Storage => "Storage",
        SettingsPanel::Battery => "Battery",
        SettingsPanel::Network => "Network",
        SettingsPanel::Main => "main",
    }
}

/// Always-available fallback built on unprivileged platform actions.
pub struct CapabilityBackend {
    platform: Arc<dyn PlatformActions>,
}

impl CapabilityBackend {
    pub fn new(platform: Arc<dyn PlatformActions>) -> Self {
        Self { platform }
    }

    fn execute(&self, command: CapabilityCommand, trace_id: &str) -> Result<String, AppError> {
        match command {
            CapabilityCommand::OpenPanel(panel) => {
                self.platform.open_settings(panel, trace_id)?;
                Ok(format!("Opened {} settings", panel_title(panel)))
            }
            CapabilityCommand::OpenSettings(kind) => {
                let panel = panel_for_type(kind.as_deref());
                self.platform.open_settings(panel, trace_id)?;
                Ok(format!("Opened {} settings", kind.as_deref().unwrap_or("main")))
            }
            CapabilityCommand::OpenApp(Some(app)) => {
                if !app.contains('.') {
                    return Err(AppError::validation(format!("App not found: {app}"), trace_id));
                }
                self.platform.launch_app(&app, trace_id)?;
                Ok(format!("Opened {app}"))
            }
            CapabilityCommand::OpenApp(None) => {
                Err(AppError::validation("App name required", trace_id))
            }
            CapabilityCommand::Battery => Ok(format_battery(&self.platform.battery_info(trace_id)?)),
            CapabilityCommand::Device => Ok(format_device(&self.platform.device_profile(trace_id)?)),
            CapabilityCommand::Storage => Ok(format_storage(&self.platform.storage_info(trace_id)?)),
        }
    }
}

impl Backend for CapabilityBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CapabilityProbe
    }

    fn probe(&self, _trace_id: &str) -> AvailabilityState {
        AvailabilityState::usable()
    }

    fn run(&self, request: &CommandRequest, trace_id: &str) -> CommandOutcome {
        let Some(command) = CapabilityCommand::parse(request) else {
            let name = request.command.trim();
            return CommandOutcome::failed(
                ErrorKind::Unsupported,
                format!("Command '{name}' requires Shizuku/Root. Try: open settings for {name}"),
            );
        };
        if command == CapabilityCommand::OpenApp(None) {
            return CommandOutcome::failed(ErrorKind::Unsupported, "App name required");
        }
        match self.execute(command, trace_id) {
            Ok(output) => CommandOutcome::ok(output),
            Err(err) => {
                debug!(trace_id = %trace_id, error = %err, "platform action failed");
                CommandOutcome::failed(ErrorKind::CommandFailed, err.error)
            }
        }
    }
}

fn format_battery(info: &BatteryInfo) -> String {
    let mut lines = vec!["Battery Status:".to_string()];
    match info.level {
        Some(level) => lines.push(format!("  Level: {level}%")),
        None => lines.push("  Level: unknown".to_string()),
    }
    lines.push(format!("  Status: {}", info.status));
    if let Some(temp) = info.temperature_c {
        lines.push(format!("  Temperature: {temp:.1}°C"));
    }
    if let Some(voltage) = info.voltage_v {
        lines.push(format!("  Voltage: {voltage:.3}V"));
    }
    lines.push(format!("  Health: {}", info.health));
    lines.join("\n")
}

fn format_device(profile: &DeviceProfile) -> String {
    let field = |value: &Option<String>| value.clone().unwrap_or_else(|| "unknown".to_string());
    [
        "Device Information:".to_string(),
        format!("  Manufacturer: {}", field(&profile.manufacturer)),
        format!("  Model: {}", field(&profile.model)),
        format!("  Device: {}", field(&profile.device)),
        format!("  Product: {}", field(&profile.product)),
        format!("  Android Version: {}", field(&profile.android_version)),
        format!("  SDK Level: {}", field(&profile.sdk_level)),
        format!("  Build ID: {}", field(&profile.build_id)),
    ]
    .join("\n")
}

fn format_storage(info: &StorageInfo) -> String {
    let gb = |bytes: u64| bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    let used_percent = if info.total_bytes == 0 {
        0
    } else {
        u128::from(info.used_bytes) * 100 / u128::from(info.total_bytes)
    };
    [
        "Storage Information:".to_string(),
        format!("  Total: {:.2} GB", gb(info.total_bytes)),
        format!("  Used: {:.2} GB ({used_percent}%)", gb(info.used_bytes)),
        format!("  Available: {:.2} GB", gb(info.available_bytes)),
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingPlatform {
        opened: Mutex<Vec<SettingsPanel>>,
        launched: Mutex<Vec<String>>,
    }

    impl PlatformActions for RecordingPlatform {
        fn open_settings(&self, panel: SettingsPanel, _trace_id: &str) -> Result<(), AppError> {
            self.opened.lock().expect("opened").push(panel);
            Ok(())
        }

        fn launch_app(&self, package_name: &str, _trace_id: &str) -> Result<(), AppError> {
            self.launched
                .lock()
                .expect("launched")
                .push(package_name.to_string());
            Ok(())
        }

        fn battery_info(&self, _trace_id: &str) -> Result<BatteryInfo, AppError> {
            Ok(BatteryInfo {
                level: Some(55),
                status: "Discharging".to_string(),
                temperature_c: Some(30.5),
                voltage_v: None,
                health: "Good".to_string(),
            })
        }

        fn device_profile(&self, trace_id: &str) -> Result<DeviceProfile, AppError> {
            Err(AppError::dependency("getprop unavailable", trace_id))
        }

        fn storage_info(&self, _trace_id: &str) -> Result<StorageInfo, AppError> {
            Ok(StorageInfo {
                total_bytes: 4 * 1024 * 1024 * 1024,
                used_bytes: 1024 * 1024 * 1024,
                available_bytes: 3 * 1024 * 1024 * 1024,
            })
        }
    }

    fn backend() -> (Arc<RecordingPlatform>, CapabilityBackend) {
        let platform = Arc::new(RecordingPlatform::default());
        (platform.clone(), CapabilityBackend::new(platform))
    }

    #[test]
    fn wifi_opens_wifi_settings() {
        let (platform, backend) = backend();
        assert_eq!(
            backend.run(&CommandRequest::shell("wifi"), "t"),
            CommandOutcome::ok("Opened WiFi settings")
        );
        assert_eq!(*platform.opened.lock().expect("opened"), vec![SettingsPanel::Wifi]);
    }

    #[test]
    fn vocabulary_is_case_insensitive_with_aliases() {
        let (platform, backend) = backend();
        assert_eq!(
            backend.run(&CommandRequest::shell("  BT "), "t"),
            CommandOutcome::ok("Opened Bluetooth settings")
        );
        assert_eq!(
            backend.run(&CommandRequest::shell("AirplaneMode"), "t"),
            CommandOutcome::ok("Opened Airplane mode settings")
        );
        assert_eq!(
            *platform.opened.lock().expect("opened"),
            vec![SettingsPanel::Bluetooth, SettingsPanel::AirplaneMode]
        );
    }

    #[test]
    fn reboot_is_outside_the_vocabulary() {
        let (_platform, backend) = backend();
        let outcome = backend.run(&CommandRequest::shell("reboot"), "t");
        assert_eq!(
            outcome,
            CommandOutcome::failed(
                ErrorKind::Unsupported,
                "Command 'reboot' requires Shizuku/Root. Try: open settings for reboot"
            )
        );
    }

    #[test]
    fn shell_text_is_never_interpreted() {
        let (platform, backend) = backend();
        let outcome = backend.run(&CommandRequest::shell("wifi; reboot"), "t");
        assert_eq!(outcome.failure_kind(), Some(ErrorKind::Unsupported));
        assert!(platform.opened.lock().expect("opened").is_empty());
    }

    #[test]
    fn settings_type_selects_panel() {
        let (platform, backend) = backend();
        let request = CommandRequest::shell("settings").with_param("type", "storage");
        assert_eq!(backend.run(&request, "t"), CommandOutcome::ok("Opened storage settings"));
        assert_eq!(
            backend.run(&CommandRequest::shell("settings"), "t"),
            CommandOutcome::ok("Opened main settings")
        );
        assert_eq!(
            *platform.opened.lock().expect("opened"),
            vec![SettingsPanel::Storage, SettingsPanel::Main]
        );
    }

    #[test]
    fn open_requires_a_package_id() {
        let (platform, backend) = backend();
        assert_eq!(
            backend.run(&CommandRequest::shell("open"), "t"),
            CommandOutcome::failed(ErrorKind::Unsupported, "App name required")
        );
        assert_eq!(
            backend.run(&CommandRequest::shell("open").with_param("app", "camera"), "t"),
            CommandOutcome::failed(ErrorKind::CommandFailed, "App not found: camera")
        );
        assert_eq!(
            backend.run(
                &CommandRequest::shell("open").with_param("app", "com.android.camera2"),
                "t"
            ),
            CommandOutcome::ok("Opened com.android.camera2")
        );
        assert_eq!(
            *platform.launched.lock().expect("launched"),
            vec!["com.android.camera2".to_string()]
        );
    }

    #[test]
    fn info_queries_format_reports() {
        let (_platform, backend) = backend();
        let battery = backend.run(&CommandRequest::shell("battery"), "t");
        let text = battery.output().expect("battery output");
        assert!(text.starts_with("Battery Status:"));
        assert!(text.contains("Level: 55%"));
        assert!(text.contains("Temperature: 30.5°C"));
        assert!(!text.contains("Voltage"));

        let storage = backend.run(&CommandRequest::shell("storage"), "t");
        let text = storage.output().expect("storage output");
        assert!(text.contains("Total: 4.00 GB"));
        assert!(text.contains("Used: 1.00 GB (25%)"));
    }

    #[test]
    fn storage_percentage_survives_huge_volumes() {
        let text = format_storage(&StorageInfo {
            total_bytes: u64::MAX,
            used_bytes: u64::MAX / 2,
            available_bytes: u64::MAX / 2,
        });
        assert!(text.contains("(49%)"));
    }

    #[test]
    fn platform_errors_become_command_failed() {
        let (_platform, backend) = backend();
        assert_eq!(
            backend.run(&CommandRequest::shell("device"), "t"),
            CommandOutcome::failed(ErrorKind::CommandFailed, "getprop unavailable")
        );
    }

    #[test]
    fn always_probes_usable() {
        let (_platform, backend) = backend();
        assert!(backend.probe("t").is_usable());
    }
}
