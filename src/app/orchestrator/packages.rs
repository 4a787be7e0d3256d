use crate::app::backend::parse::parse_pm_list_packages_output;
use crate::app::models::{CommandFailure, CommandOutcome, CommandRequest, PackageEntry};
use crate::app::validate::{shell_quote, validate_device_path, validate_package_name, validate_token};

use super::{Severity, SystemOrchestrator};

impl SystemOrchestrator {
    /// Runs `<prefix> <package>` once the package id is validated.
    fn run_package(&self, label: &str, package_name: &str, prefix: &str) -> CommandOutcome {
        let label = format!("{label} {}", package_name.trim());
        self.run_checked(&label, Severity::Normal, || {
            let pkg = validate_package_name(package_name)?;
            Ok(vec![CommandRequest::shell(format!("{prefix} {pkg}"))])
        })
    }

    pub fn freeze_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Freezing", package_name, "pm disable-user --user 0")
    }

    pub fn unfreeze_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Unfreezing", package_name, "pm enable")
    }

    pub fn hide_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Hiding", package_name, "pm suspend")
    }

    pub fn unhide_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Unhiding", package_name, "pm unsuspend")
    }

    pub fn set_default_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package(
            "Setting default home to",
            package_name,
            "cmd package set-home-activity",
        )
    }

    pub fn uninstall_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Uninstalling", package_name, "pm uninstall")
    }

    pub fn clear_app_data(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Clearing data for", package_name, "pm clear")
    }

    pub fn force_stop_app(&self, package_name: &str) -> CommandOutcome {
        self.run_package("Force stopping", package_name, "am force-stop")
    }

    pub fn trim_all_caches(&self) -> CommandOutcome {
        self.run_shell("Trimming app caches", "pm trim-caches 9999999999")
    }

    pub fn install_app(&self, apk_path: &str) -> CommandOutcome {
        self.run_checked("Installing app", Severity::Normal, || {
            let path = validate_device_path(apk_path)?;
            if !path.to_ascii_lowercase().ends_with(".apk") {
                return Err(format!("Not an APK file: {path}"));
            }
            Ok(vec![CommandRequest::shell(format!(
                "pm install -r {}",
                shell_quote(path)
            ))])
        })
    }

    pub fn grant_permission(&self, package_name: &str, permission: &str) -> CommandOutcome {
        self.run_permission("grant", "Granting", package_name, permission)
    }

    pub fn revoke_permission(&self, package_name: &str, permission: &str) -> CommandOutcome {
        self.run_permission("revoke", "Revoking", package_name, permission)
    }

    fn run_permission(
        &self,
        verb: &str,
        label: &str,
        package_name: &str,
        permission: &str,
    ) -> CommandOutcome {
        let label = format!("{label} {} for {}", permission.trim(), package_name.trim());
        self.run_checked(&label, Severity::Normal, || {
            let pkg = validate_package_name(package_name)?;
            let permission = validate_token(permission, "permission")?;
            Ok(vec![CommandRequest::shell(format!(
                "pm {verb} {pkg} {permission}"
            ))])
        })
    }

    pub fn start_activity(&self, package_name: &str, activity: &str) -> CommandOutcome {
        let label = format!("Starting {}", package_name.trim());
        self.run_checked(&label, Severity::Normal, || {
            let pkg = validate_package_name(package_name)?;
            let activity = validate_token(activity, "activity")?;
            Ok(vec![CommandRequest::shell(format!(
                "am start -n {pkg}/{activity}"
            ))])
        })
    }

    pub fn send_broadcast(&self, action: &str) -> CommandOutcome {
        let label = format!("Broadcasting {}", action.trim());
        self.run_checked(&label, Severity::Normal, || {
            let action = validate_token(action, "action")?;
            Ok(vec![CommandRequest::shell(format!(
                "am broadcast -a {action}"
            ))])
        })
    }

    pub fn list_packages(&self) -> Result<Vec<PackageEntry>, CommandFailure> {
        self.query(
            "Listing packages",
            || Ok(CommandRequest::shell("pm list packages -f")),
            parse_pm_list_packages_output,
        )
    }
}
