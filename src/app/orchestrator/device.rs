use crate::app::models::{
    AudioStream, CommandOutcome, CommandRequest, NetworkMode, PerformanceMode, RebootMode,
};
use crate::app::validate::{shell_quote, validate_token};

use super::{Severity, SystemOrchestrator};

pub const BRIGHTNESS_MAX: i32 = 255;
pub const VOLUME_MAX: i32 = 15;
pub const ANIMATION_SCALE_MAX: f32 = 10.0;

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "enable"
    } else {
        "disable"
    }
}

fn flag(enabled: bool) -> u8 {
    u8::from(enabled)
}

fn enabled_label(enabled: bool, what: &str) -> String {
    format!("{} {what}", if enabled { "Enabling" } else { "Disabling" })
}

impl SystemOrchestrator {
    // Power

    pub fn shutdown(&self) -> CommandOutcome {
        self.run_requests(
            "Shutting down system...",
            Severity::Critical,
            vec![CommandRequest::shell("reboot -p")],
        )
    }

    pub fn reboot(&self, mode: RebootMode) -> CommandOutcome {
        let requests = match mode {
            RebootMode::Normal => vec![CommandRequest::shell("reboot")],
            RebootMode::Recovery => vec![CommandRequest::shell("reboot recovery")],
            RebootMode::Bootloader => vec![CommandRequest::shell("reboot bootloader")],
            RebootMode::SafeMode => vec![
                CommandRequest::shell("setprop persist.sys.safemode 1"),
                CommandRequest::shell("reboot"),
            ],
        };
        self.run_requests("Rebooting system...", Severity::Critical, requests)
    }

    pub fn lock_screen(&self) -> CommandOutcome {
        self.run_shell("Locking screen", "input keyevent 26")
    }

    pub fn sleep(&self) -> CommandOutcome {
        self.run_shell("Putting device to sleep", "input keyevent KEYCODE_SLEEP")
    }

    // Radios

    pub fn set_wifi_enabled(&self, enabled: bool) -> CommandOutcome {
        self.run_shell(
            &enabled_label(enabled, "WiFi"),
            format!("svc wifi {}", on_off(enabled)),
        )
    }

    pub fn set_mobile_data_enabled(&self, enabled: bool) -> CommandOutcome {
        self.run_shell(
            &enabled_label(enabled, "mobile data"),
            format!("svc data {}", on_off(enabled)),
        )
    }

    pub fn set_airplane_mode_enabled(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "airplane mode"),
            CommandRequest::settings_put("global", "airplane_mode_on", flag(enabled)),
        )
    }

    pub fn set_bluetooth_enabled(&self, enabled: bool) -> CommandOutcome {
        self.run_shell(
            &enabled_label(enabled, "Bluetooth"),
            format!("svc bluetooth {}", on_off(enabled)),
        )
    }

    pub fn set_network_mode(&self, mode: NetworkMode) -> CommandOutcome {
        self.run(
            "Setting network mode",
            CommandRequest::settings_put("global", "preferred_network_mode", mode.setting_value()),
        )
    }

    // Display

    /// Out-of-range levels are clamped to `[0, 255]`.
    pub fn set_brightness(&self, level: i32) -> CommandOutcome {
        let level = level.clamp(0, BRIGHTNESS_MAX);
        self.run(
            &format!("Setting brightness to {level}"),
            CommandRequest::settings_put("system", "screen_brightness", level),
        )
    }

    pub fn set_auto_brightness(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "auto brightness"),
            CommandRequest::settings_put("system", "screen_brightness_mode", flag(enabled)),
        )
    }

    pub fn set_screen_timeout(&self, timeout_ms: u32) -> CommandOutcome {
        self.run(
            &format!("Setting screen timeout to {timeout_ms} ms"),
            CommandRequest::settings_put("system", "screen_off_timeout", timeout_ms),
        )
    }

    pub fn set_screen_state(&self, on: bool) -> CommandOutcome {
        let (label, key) = if on {
            ("Turning screen on", "KEYCODE_WAKEUP")
        } else {
            ("Turning screen off", "KEYCODE_SLEEP")
        };
        self.run_shell(label, format!("input keyevent {key}"))
    }

    // Audio

    /// Out-of-range levels are clamped to `[0, 15]`.
    pub fn set_volume(&self, stream: AudioStream, level: i32) -> CommandOutcome {
        let level = level.clamp(0, VOLUME_MAX);
        self.run_shell(
            &format!("Setting volume to {level}"),
            format!("media volume --stream {} --set {level}", stream.stream_id()),
        )
    }

    pub fn set_mute_all(&self, mute: bool) -> CommandOutcome {
        let (label, level) = if mute {
            ("Muting audio", 0)
        } else {
            ("Unmuting audio", 7)
        };
        self.run_shell(
            label,
            format!("media volume --show --stream 3 --set {level}"),
        )
    }

    // Time

    pub fn set_system_time(&self, epoch_ms: i64) -> CommandOutcome {
        self.run_checked("Setting system time", Severity::Normal, || {
            if epoch_ms < 0 {
                return Err(format!("Invalid epoch time: {epoch_ms}"));
            }
            Ok(vec![CommandRequest::shell(format!(
                "date -s @{}",
                epoch_ms / 1000
            ))])
        })
    }

    pub fn set_timezone(&self, timezone: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Setting timezone to {}", timezone.trim()),
            Severity::Normal,
            || {
                let timezone = validate_token(timezone, "timezone")?;
                Ok(vec![CommandRequest::settings_put("global", "time_zone", timezone)])
            },
        )
    }

    pub fn set_auto_time(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "automatic time"),
            CommandRequest::settings_put("global", "auto_time", flag(enabled)),
        )
    }

    pub fn set_auto_timezone(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "automatic timezone"),
            CommandRequest::settings_put("global", "auto_time_zone", flag(enabled)),
        )
    }

    // Settings

    pub fn set_developer_mode(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "developer mode"),
            CommandRequest::settings_put("global", "development_settings_enabled", flag(enabled)),
        )
    }

    pub fn set_usb_debugging(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "USB debugging"),
            CommandRequest::settings_put("global", "adb_enabled", flag(enabled)),
        )
    }

    pub fn set_stay_awake(&self, enabled: bool) -> CommandOutcome {
        self.run(
            &enabled_label(enabled, "stay awake"),
            CommandRequest::settings_put("global", "stay_on_while_plugged_in", flag(enabled)),
        )
    }

    /// Clamped to `[0.0, 10.0]`; NaN is rejected.
    pub fn set_animation_scale(&self, scale: f32) -> CommandOutcome {
        self.run_checked("Setting animation scale", Severity::Normal, || {
            if scale.is_nan() {
                return Err("Animation scale must be a number".to_string());
            }
            let scale = scale.clamp(0.0, ANIMATION_SCALE_MAX);
            Ok(vec![CommandRequest::settings_put(
                "global",
                "animator_duration_scale",
                scale,
            )])
        })
    }

    pub fn set_location_enabled(&self, enabled: bool) -> CommandOutcome {
        let mode = if enabled { 3 } else { 0 };
        self.run(
            &enabled_label(enabled, "location"),
            CommandRequest::settings_put("secure", "location_mode", mode),
        )
    }

    pub fn get_setting(&self, namespace: &str, key: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Reading setting {}", key.trim()),
            Severity::Normal,
            || {
                let namespace = match namespace.trim() {
                    ns @ ("system" | "secure" | "global") => ns,
                    other => return Err(format!("Unknown settings namespace: {other}")),
                };
                let key = validate_token(key, "key")?;
                Ok(vec![CommandRequest::shell(format!(
                    "settings get {namespace} {key}"
                ))])
            },
        )
    }

    // Performance

    pub fn set_performance_mode(&self, mode: PerformanceMode) -> CommandOutcome {
        let value = match mode {
            PerformanceMode::HighPerformance => 0,
            PerformanceMode::Balanced => 1,
            PerformanceMode::PowerSave => 2,
        };
        self.run_shell(
            "Setting performance mode",
            format!("cmd power set-mode {value}"),
        )
    }

    pub fn set_battery_saver(&self, enabled: bool) -> CommandOutcome {
        self.run_shell(
            &enabled_label(enabled, "battery saver"),
            format!("cmd battery set battery-saver {}", flag(enabled)),
        )
    }

    pub fn clear_ram(&self) -> CommandOutcome {
        self.run_shell("Clearing background processes", "am kill-all")
    }

    // Notifications

    pub fn send_notification(&self, title: &str, message: &str) -> CommandOutcome {
        self.run_shell(
            "Sending notification",
            format!(
                "am broadcast -a android.intent.action.NOTIFICATION --es title {} --es message {}",
                shell_quote(title),
                shell_quote(message)
            ),
        )
    }

    pub fn set_do_not_disturb(&self, enabled: bool) -> CommandOutcome {
        self.run_shell(
            &enabled_label(enabled, "Do Not Disturb"),
            format!("cmd notification set_dnd {}", flag(enabled)),
        )
    }
}
