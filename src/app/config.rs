use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::app::error::AppError;

pub const CONFIG_PATH_ENV: &str = "SHELLGATE_CONFIG_PATH";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ElevatedSettings {
    pub su_program: String,
}

impl Default for ElevatedSettings {
    fn default() -> Self {
        Self {
            su_program: "su".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BrokerSettings {
    pub rish_program: String,
    pub server_process: String,
}

impl Default for BrokerSettings {
    fn default() -> Self {
        Self {
            rish_program: "rish".to_string(),
            server_process: "shizuku_server".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DebugBridgeSettings {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for DebugBridgeSettings {
    fn default() -> Self {
        Self {
            program: "sh".to_string(),
            args: vec!["-c".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSettings {
    /// Per-process timeout; 0 waits for the child indefinitely.
    pub timeout_secs: u64,
    pub max_parallel: usize,
}

impl Default for CommandSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 0,
            max_parallel: 4,
        }
    }
}

impl CommandSettings {
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlatformSettings {
    pub power_supply_dir: String,
    pub data_dir: String,
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            power_supply_dir: "/sys/class/power_supply/battery".to_string(),
            data_dir: "/data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub elevated: ElevatedSettings,
    #[serde(default)]
    pub broker: BrokerSettings,
    #[serde(default)]
    pub debug_bridge: DebugBridgeSettings,
    #[serde(default)]
    pub command: CommandSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
    #[serde(default)]
    pub platform: PlatformSettings,
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    home_dir().join(".shellgate_config.json")
}

/// Sits next to the active config: `<name>.backup.json`.
pub fn backup_config_path() -> PathBuf {
    config_path().with_extension("backup.json")
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

pub fn load_config(trace_id: &str) -> Result<AppConfig, AppError> {
    load_config_from_path(&config_path(), trace_id)
}

pub fn save_config(config: &AppConfig, trace_id: &str) -> Result<(), AppError> {
    save_config_to_path(config, &config_path(), &backup_config_path(), trace_id)
}

pub fn load_config_from_path(path: &Path, trace_id: &str) -> Result<AppConfig, AppError> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .map_err(|err| AppError::system(format!("Failed to read config: {err}"), trace_id))?;
    let config: AppConfig = serde_json::from_str(&raw)
        .map_err(|err| AppError::validation(format!("Failed to parse config: {err}"), trace_id))?;
    Ok(validate_config(config))
}

pub fn save_config_to_path(
    config: &AppConfig,
    path: &Path,
    backup_path: &Path,
    trace_id: &str,
) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if path.exists() {
        let _ = fs::copy(path, backup_path);
    }
    let payload = serde_json::to_string_pretty(config)
        .map_err(|err| AppError::system(format!("Failed to serialize config: {err}"), trace_id))?;
    fs::write(path, payload)
        .map_err(|err| AppError::system(format!("Failed to write config: {err}"), trace_id))?;
    Ok(())
}

fn validate_config(mut config: AppConfig) -> AppConfig {
    let defaults = AppConfig::default();
    if config.elevated.su_program.trim().is_empty() {
        config.elevated.su_program = defaults.elevated.su_program;
    }
    if config.broker.rish_program.trim().is_empty() {
        config.broker.rish_program = defaults.broker.rish_program;
    }
    if config.broker.server_process.trim().is_empty() {
        config.broker.server_process = defaults.broker.server_process;
    }
    if config.debug_bridge.program.trim().is_empty() {
        config.debug_bridge = defaults.debug_bridge;
    }
    if config.command.max_parallel == 0 {
        config.command.max_parallel = defaults.command.max_parallel;
    }
    if config.logging.level.trim().is_empty() {
        config.logging.level = defaults.logging.level;
    }
    config
}
