use std::sync::OnceLock;

use regex::Regex;

use crate::app::backend::parse::{parse_ls_la, parse_ps_output};
use crate::app::models::{
    CommandFailure, CommandOutcome, CommandRequest, DeviceFileEntry, ProcessEntry,
};
use crate::app::validate::{shell_quote, validate_device_path, validate_token};

use super::{Severity, SystemOrchestrator};

pub const SCREEN_RECORD_MAX_SECS: u32 = 180;
pub const LOGCAT_MAX_LINES: u32 = 10_000;

fn mode_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[0-7]{3,4}$").expect("mode regex"))
}

fn quoted_path(path: &str) -> Result<String, String> {
    validate_device_path(path).map(shell_quote)
}

impl SystemOrchestrator {
    // Storage

    pub fn mount_storage(&self, volume: &str, mount: bool) -> CommandOutcome {
        let (label, verb) = if mount {
            ("Mounting", "mount")
        } else {
            ("Unmounting", "unmount")
        };
        self.run_checked(
            &format!("{label} {}", volume.trim()),
            Severity::Normal,
            || {
                let volume = validate_token(volume, "volume")?;
                Ok(vec![CommandRequest::shell(format!("sm {verb} {volume}"))])
            },
        )
    }

    pub fn format_storage(&self, volume: &str) -> CommandOutcome {
        self.run_checked("Formatting storage...", Severity::Critical, || {
            let volume = validate_token(volume, "volume")?;
            Ok(vec![CommandRequest::shell(format!("sm format {volume}"))])
        })
    }

    // Files

    pub fn list_directory(&self, path: &str) -> Result<Vec<DeviceFileEntry>, CommandFailure> {
        let dir = path.trim().to_string();
        self.query(
            &format!("Listing {dir}"),
            || Ok(CommandRequest::shell(format!("ls -la {}", quoted_path(path)?))),
            |output| parse_ls_la(&dir, output),
        )
    }

    pub fn read_file(&self, path: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Reading {}", path.trim()),
            Severity::Normal,
            || Ok(vec![CommandRequest::shell(format!("cat {}", quoted_path(path)?))]),
        )
    }

    pub fn write_file(&self, path: &str, content: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Writing {}", path.trim()),
            Severity::Normal,
            || {
                Ok(vec![CommandRequest::shell(format!(
                    "printf '%s' {} > {}",
                    shell_quote(content),
                    quoted_path(path)?
                ))])
            },
        )
    }

    pub fn copy_file(&self, source: &str, destination: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Copying {}", source.trim()),
            Severity::Normal,
            || {
                Ok(vec![CommandRequest::shell(format!(
                    "cp -r {} {}",
                    quoted_path(source)?,
                    quoted_path(destination)?
                ))])
            },
        )
    }

    pub fn move_file(&self, source: &str, destination: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Moving {}", source.trim()),
            Severity::Normal,
            || {
                Ok(vec![CommandRequest::shell(format!(
                    "mv {} {}",
                    quoted_path(source)?,
                    quoted_path(destination)?
                ))])
            },
        )
    }

    pub fn delete_file(&self, path: &str, recursive: bool) -> CommandOutcome {
        let flags = if recursive { "-rf" } else { "-f" };
        self.run_checked(
            &format!("Deleting {}", path.trim()),
            Severity::Normal,
            || {
                Ok(vec![CommandRequest::shell(format!(
                    "rm {flags} {}",
                    quoted_path(path)?
                ))])
            },
        )
    }

    pub fn create_directory(&self, path: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Creating {}", path.trim()),
            Severity::Normal,
            || Ok(vec![CommandRequest::shell(format!("mkdir -p {}", quoted_path(path)?))]),
        )
    }

    /// `mode` is octal, e.g. `644` or `0755`.
    pub fn chmod(&self, path: &str, mode: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Changing permissions of {}", path.trim()),
            Severity::Normal,
            || {
                let mode = mode.trim();
                if !mode_regex().is_match(mode) {
                    return Err(format!("Invalid file mode: {mode}"));
                }
                Ok(vec![CommandRequest::shell(format!(
                    "chmod {mode} {}",
                    quoted_path(path)?
                ))])
            },
        )
    }

    pub fn file_info(&self, path: &str) -> CommandOutcome {
        self.run_checked(
            &format!("Inspecting {}", path.trim()),
            Severity::Normal,
            || Ok(vec![CommandRequest::shell(format!("stat {}", quoted_path(path)?))]),
        )
    }

    // Capture

    pub fn take_screenshot(&self, path: &str) -> CommandOutcome {
        self.run_checked("Taking screenshot", Severity::Normal, || {
            Ok(vec![CommandRequest::shell(format!(
                "screencap -p {}",
                quoted_path(path)?
            ))])
        })
    }

    /// Duration is clamped to `[1, 180]` seconds.
    pub fn record_screen(&self, path: &str, duration_secs: u32) -> CommandOutcome {
        let secs = duration_secs.clamp(1, SCREEN_RECORD_MAX_SECS);
        self.run_checked(
            &format!("Recording screen for {secs}s"),
            Severity::Normal,
            || {
                Ok(vec![CommandRequest::shell(format!(
                    "screenrecord --time-limit {secs} {}",
                    quoted_path(path)?
                ))])
            },
        )
    }

    // Diagnostics

    pub fn battery_stats(&self) -> CommandOutcome {
        self.run_shell("Reading battery stats", "dumpsys battery")
    }

    pub fn network_stats(&self) -> CommandOutcome {
        self.run_shell("Reading network stats", "dumpsys netstats")
    }

    pub fn memory_info(&self) -> CommandOutcome {
        self.run_shell("Reading memory info", "dumpsys meminfo")
    }

    pub fn list_processes(&self) -> Result<Vec<ProcessEntry>, CommandFailure> {
        self.query(
            "Listing processes",
            || Ok(CommandRequest::shell("ps -A")),
            parse_ps_output,
        )
    }

    pub fn kill_process(&self, pid: u32) -> CommandOutcome {
        self.run_checked(
            &format!("Killing process {pid}"),
            Severity::Normal,
            || {
                if pid == 0 {
                    return Err("pid must be positive".to_string());
                }
                Ok(vec![CommandRequest::shell(format!("kill -9 {pid}"))])
            },
        )
    }

    /// Line count is clamped to `[1, 10000]`.
    pub fn get_logcat(&self, max_lines: u32) -> CommandOutcome {
        let lines = max_lines.clamp(1, LOGCAT_MAX_LINES);
        self.run_shell("Reading logcat", format!("logcat -d -t {lines}"))
    }

    pub fn clear_logcat(&self) -> CommandOutcome {
        self.run_shell("Clearing logcat", "logcat -c")
    }
}
