use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::app::backend::parse::{build_device_profile, parse_df_kb, parse_getprop_map};
use crate::app::backend::runner::ShellLauncher;
use crate::app::error::AppError;
use crate::app::models::{BatteryInfo, DeviceProfile, SettingsPanel, StorageInfo};

/// Unprivileged platform operations available to every app.
pub trait PlatformActions: Send + Sync {
    fn open_settings(&self, panel: SettingsPanel, trace_id: &str) -> Result<(), AppError>;

    fn launch_app(&self, package_name: &str, trace_id: &str) -> Result<(), AppError>;

    fn battery_info(&self, trace_id: &str) -> Result<BatteryInfo, AppError>;

    fn device_profile(&self, trace_id: &str) -> Result<DeviceProfile, AppError>;

    fn storage_info(&self, trace_id: &str) -> Result<StorageInfo, AppError>;
}

/// Default platform: fixed `am`/`monkey`/`getprop`/`df` invocations plus sysfs reads.
/// None of these take caller-provided shell text.
pub struct AndroidPlatform {
    launcher: Arc<dyn ShellLauncher>,
    power_supply_dir: PathBuf,
    data_dir: String,
}

impl AndroidPlatform {
    pub fn new(
        launcher: Arc<dyn ShellLauncher>,
        power_supply_dir: impl Into<PathBuf>,
        data_dir: impl Into<String>,
    ) -> Self {
        Self {
            launcher,
            power_supply_dir: power_supply_dir.into(),
            data_dir: data_dir.into(),
        }
    }

    fn launch_checked(&self, program: &str, args: Vec<String>, trace_id: &str) -> Result<String, AppError> {
        let output = self.launcher.launch(program, &args, None, trace_id)?;
        if !output.succeeded() {
            let stderr = output.stderr.trim();
            return Err(AppError::system(
                format!(
                    "{program} exited with {:?}: {}",
                    output.exit_code,
                    if stderr.is_empty() { "no output" } else { stderr }
                ),
                trace_id,
            ));
        }
        Ok(output.stdout)
    }
}

impl PlatformActions for AndroidPlatform {
    fn open_settings(&self, panel: SettingsPanel, trace_id: &str) -> Result<(), AppError> {
        let args = vec![
            "start".to_string(),
            "-a".to_string(),
            panel.intent_action().to_string(),
        ];
        self.launch_checked("am", args, trace_id).map(|_| ())
    }

    fn launch_app(&self, package_name: &str, trace_id: &str) -> Result<(), AppError> {
        let args = vec![
            "-p".to_string(),
            package_name.to_string(),
            "-c".to_string(),
            "android.intent.category.LAUNCHER".to_string(),
            "1".to_string(),
        ];
        self.launch_checked("monkey", args, trace_id).map(|_| ())
    }

    fn battery_info(&self, trace_id: &str) -> Result<BatteryInfo, AppError> {
        read_power_supply(&self.power_supply_dir, trace_id)
    }

    fn device_profile(&self, trace_id: &str) -> Result<DeviceProfile, AppError> {
        let output = self.launch_checked("getprop", Vec::new(), trace_id)?;
        Ok(build_device_profile(&parse_getprop_map(&output)))
    }

    fn storage_info(&self, trace_id: &str) -> Result<StorageInfo, AppError> {
        let output = self.launch_checked("df", vec!["-k".to_string(), self.data_dir.clone()], trace_id)?;
        parse_df_kb(&output).ok_or_else(|| {
            AppError::system(format!("Unrecognized df output for {}", self.data_dir), trace_id)
        })
    }
}

fn read_power_supply(dir: &Path, trace_id: &str) -> Result<BatteryInfo, AppError> {
    let read = |name: &str| {
        fs::read_to_string(dir.join(name))
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    let level = read("capacity").and_then(|value| value.parse::<u8>().ok());
    let status = read("status");
    if level.is_none() && status.is_none() {
        return Err(AppError::dependency(
            format!("Battery information unavailable at {}", dir.display()),
            trace_id,
        ));
    }
    // sysfs reports tenths of a degree and microvolts.
    let temperature_c = read("temp")
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| *value > 0.0)
        .map(|value| value / 10.0);
    let voltage_v = read("voltage_now")
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| *value > 0.0)
        .map(|value| value / 1_000_000.0);
    Ok(BatteryInfo {
        level,
        status: status.unwrap_or_else(|| "Unknown".to_string()),
        temperature_c,
        voltage_v,
        health: read("health").unwrap_or_else(|| "Unknown".to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::testing::{exit_with, ScriptedLauncher};

    fn platform_with(launcher: Arc<ScriptedLauncher>, dir: &Path) -> AndroidPlatform {
        AndroidPlatform::new(launcher, dir, "/data")
    }

    #[test]
    fn open_settings_starts_intent_action() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let launcher = Arc::new(ScriptedLauncher::new(|_call| exit_with(0, "Starting: Intent", "")));
        let platform = platform_with(launcher.clone(), tmp.path());

        platform
            .open_settings(SettingsPanel::Wifi, "t")
            .expect("open");
        assert_eq!(
            launcher.calls()[0].argv(),
            "am start -a android.settings.WIFI_SETTINGS"
        );
    }

    #[test]
    fn reads_battery_from_sysfs() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        fs::write(tmp.path().join("capacity"), "87\n").expect("capacity");
        fs::write(tmp.path().join("status"), "Charging\n").expect("status");
        fs::write(tmp.path().join("temp"), "312\n").expect("temp");
        fs::write(tmp.path().join("voltage_now"), "4200000\n").expect("voltage");
        fs::write(tmp.path().join("health"), "Good\n").expect("health");
        let launcher = Arc::new(ScriptedLauncher::new(|_call| exit_with(0, "", "")));
        let platform = platform_with(launcher, tmp.path());

        let info = platform.battery_info("t").expect("battery");
        assert_eq!(info.level, Some(87));
        assert_eq!(info.status, "Charging");
        assert_eq!(info.temperature_c, Some(31.2));
        assert_eq!(info.voltage_v, Some(4.2));
        assert_eq!(info.health, "Good");
    }

    #[test]
    fn missing_power_supply_is_an_error() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let launcher = Arc::new(ScriptedLauncher::new(|_call| exit_with(0, "", "")));
        let platform = platform_with(launcher, &tmp.path().join("absent"));
        let err = platform.battery_info("t").expect_err("err");
        assert_eq!(err.code, "ERR_DEPENDENCY");
    }

    #[test]
    fn storage_info_uses_df_on_data_dir() {
        let tmp = tempfile::TempDir::new().expect("tmp");
        let launcher = Arc::new(ScriptedLauncher::new(|_call| {
            exit_with(
                0,
                "Filesystem 1K-blocks Used Available Use% Mounted on\n/dev/block/dm-5 1000 400 600 40% /data\n",
                "",
            )
        }));
        let platform = platform_with(launcher.clone(), tmp.path());
        let info = platform.storage_info("t").expect("storage");
        assert_eq!(info.available_bytes, 600 * 1024);
        assert_eq!(launcher.calls()[0].argv(), "df -k /data");
    }
}
