use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Which backend served (or could serve) the most recent request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    CapabilityProbe,
    ElevatedSession,
    DelegatedBroker,
    LocalDebugBridge,
    None,
}

impl BackendKind {
    pub fn label(self) -> &'static str {
        match self {
            BackendKind::CapabilityProbe => "capability_probe",
            BackendKind::ElevatedSession => "elevated_session",
            BackendKind::DelegatedBroker => "delegated_broker",
            BackendKind::LocalDebugBridge => "local_debug_bridge",
            BackendKind::None => "none",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandRequest {
    pub command: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

impl CommandRequest {
    pub fn shell(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// `settings put <namespace> <key> <value>`
    pub fn settings_put(namespace: &str, key: &str, value: impl fmt::Display) -> Self {
        let value = value.to_string();
        Self::shell(format!("settings put {namespace} {key} {value}"))
            .with_param("namespace", namespace)
            .with_param("key", key)
            .with_param("value", value)
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Unsupported,
    PermissionDenied,
    BrokerUnavailable,
    CommandFailed,
    NoBackendAvailable,
    InvalidArgument,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Unsupported => "ERR_UNSUPPORTED",
            ErrorKind::PermissionDenied => "ERR_PERMISSION_DENIED",
            ErrorKind::BrokerUnavailable => "ERR_BROKER_UNAVAILABLE",
            ErrorKind::CommandFailed => "ERR_COMMAND_FAILED",
            ErrorKind::NoBackendAvailable => "ERR_NO_BACKEND",
            ErrorKind::InvalidArgument => "ERR_INVALID_ARGUMENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CommandOutcome {
    Ok { output: String },
    Failed { kind: ErrorKind, detail: String },
}

impl CommandOutcome {
    pub fn ok(output: impl Into<String>) -> Self {
        CommandOutcome::Ok {
            output: output.into(),
        }
    }

    pub fn failed(kind: ErrorKind, detail: impl Into<String>) -> Self {
        CommandOutcome::Failed {
            kind,
            detail: detail.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, CommandOutcome::Ok { .. })
    }

    pub fn output(&self) -> Option<&str> {
        match self {
            CommandOutcome::Ok { output } => Some(output),
            CommandOutcome::Failed { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<ErrorKind> {
        match self {
            CommandOutcome::Ok { .. } => None,
            CommandOutcome::Failed { kind, .. } => Some(*kind),
        }
    }

    pub fn into_result(self) -> Result<String, CommandFailure> {
        match self {
            CommandOutcome::Ok { output } => Ok(output),
            CommandOutcome::Failed { kind, detail } => Err(CommandFailure { kind, detail }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandFailure {
    pub kind: ErrorKind,
    pub detail: String,
}

impl fmt::Display for CommandFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.detail, self.kind.code())
    }
}

impl std::error::Error for CommandFailure {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityState {
    pub reachable: bool,
    pub authorized: bool,
}

impl AvailabilityState {
    pub fn usable() -> Self {
        Self {
            reachable: true,
            authorized: true,
        }
    }

    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn is_usable(&self) -> bool {
        self.reachable && self.authorized
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum OperationStatus {
    Idle,
    Executing(String),
    ExecutingCritical(String),
    Success,
    Error(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEvent {
    pub status: OperationStatus,
    pub trace_id: String,
    pub timestamp: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebootMode {
    Normal,
    Recovery,
    Bootloader,
    SafeMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkMode {
    LteOnly,
    Lte3g,
    WcdmaOnly,
    GsmOnly,
}

impl NetworkMode {
    pub fn setting_value(self) -> u8 {
        match self {
            NetworkMode::LteOnly => 9,
            NetworkMode::Lte3g => 0,
            NetworkMode::WcdmaOnly => 2,
            NetworkMode::GsmOnly => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioStream {
    Music,
    Ring,
    Notification,
    Alarm,
    VoiceCall,
}

impl AudioStream {
    pub fn stream_id(self) -> u8 {
        match self {
            AudioStream::Music => 3,
            AudioStream::Ring => 2,
            AudioStream::Notification => 5,
            AudioStream::Alarm => 4,
            AudioStream::VoiceCall => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceMode {
    HighPerformance,
    Balanced,
    PowerSave,
}

/// Settings screens reachable without privileges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingsPanel {
    Main,
    Wifi,
    Bluetooth,
    AirplaneMode,
    Display,
    Location,
    Sound,
    Apps,
    Storage,
    Battery,
    Network,
    Developer,
}

impl SettingsPanel {
    pub fn intent_action(self) -> &'static str {
        match self {
            SettingsPanel::Main => "android.settings.SETTINGS",
            SettingsPanel::Wifi => "android.settings.WIFI_SETTINGS",
            SettingsPanel::Bluetooth => "android.settings.BLUETOOTH_SETTINGS",
            SettingsPanel::AirplaneMode => "android.settings.AIRPLANE_MODE_SETTINGS",
            SettingsPanel::Display => "android.settings.DISPLAY_SETTINGS",
            SettingsPanel::Location => "android.settings.LOCATION_SOURCE_SETTINGS",
            SettingsPanel::Sound => "android.settings.SOUND_SETTINGS",
            SettingsPanel::Apps => "android.settings.APPLICATION_SETTINGS",
            SettingsPanel::Storage => "android.settings.INTERNAL_STORAGE_SETTINGS",
            SettingsPanel::Battery => "android.settings.BATTERY_SAVER_SETTINGS",
            SettingsPanel::Network => "android.settings.WIRELESS_SETTINGS",
            SettingsPanel::Developer => "android.settings.APPLICATION_DEVELOPMENT_SETTINGS",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    pub package_name: String,
    pub apk_path: Option<String>,
    pub is_system: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceFileEntry {
    pub name: String,
    pub path: String,
    pub is_dir: bool,
    pub size_bytes: Option<u64>,
    pub modified_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessEntry {
    pub user: String,
    pub pid: u32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryInfo {
    pub level: Option<u8>,
    pub status: String,
    pub temperature_c: Option<f64>,
    pub voltage_v: Option<f64>,
    pub health: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub device: Option<String>,
    pub product: Option<String>,
    pub android_version: Option<String>,
    pub sdk_level: Option<String>,
    pub build_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageInfo {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub device: HashMap<String, String>,
    pub battery: String,
    pub memory: String,
    pub timestamp: String,
}
