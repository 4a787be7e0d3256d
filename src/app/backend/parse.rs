use std::collections::HashMap;

use crate::app::models::{DeviceFileEntry, DeviceProfile, PackageEntry, ProcessEntry, StorageInfo};

pub fn parse_getprop_map(output: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in output.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with('[') {
            continue;
        }
        let Some((key_part, value_part)) = trimmed.split_once("]: [") else {
            continue;
        };
        let key = key_part.trim_start_matches('[').trim();
        let value = value_part.trim_end_matches(']').trim();
        if !key.is_empty() {
            map.insert(key.to_string(), value.to_string());
        }
    }
    map
}

pub fn build_device_profile(getprop_map: &HashMap<String, String>) -> DeviceProfile {
    let get = |key: &str| getprop_map.get(key).filter(|v| !v.is_empty()).cloned();
    DeviceProfile {
        manufacturer: get("ro.product.manufacturer"),
        model: get("ro.product.model"),
        device: get("ro.product.device"),
        product: get("ro.product.name"),
        android_version: get("ro.build.version.release"),
        sdk_level: get("ro.build.version.sdk"),
        build_id: get("ro.build.id"),
    }
}

/// Reads the data row of `df -k <path>` (1K blocks).
pub fn parse_df_kb(output: &str) -> Option<StorageInfo> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with("Filesystem"))
        .find_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 4 {
                return None;
            }
            let bytes = |token: &str| token.parse::<u64>().ok()?.checked_mul(1024);
            Some(StorageInfo {
                total_bytes: bytes(tokens[1])?,
                used_bytes: bytes(tokens[2])?,
                available_bytes: bytes(tokens[3])?,
            })
        })
}

pub fn parse_pm_list_packages_output(output: &str) -> Vec<PackageEntry> {
    let mut apps = Vec::new();
    for raw in output.lines() {
        let line = raw.trim();
        let Some(payload) = line.strip_prefix("package:") else {
            continue;
        };
        match payload.rsplit_once('=') {
            Some((apk_path, pkg)) => {
                let pkg = pkg.trim();
                if pkg.is_empty() {
                    continue;
                }
                let apk_path = apk_path.trim().to_string();
                apps.push(PackageEntry {
                    package_name: pkg.to_string(),
                    is_system: is_system_path(&apk_path),
                    apk_path: Some(apk_path),
                });
            }
            None if !payload.trim().is_empty() => apps.push(PackageEntry {
                package_name: payload.trim().to_string(),
                apk_path: None,
                is_system: false,
            }),
            None => {}
        }
    }
    apps
}

fn is_system_path(path: &str) -> bool {
    path.starts_with("/system/")
        || path.starts_with("/product/")
        || path.starts_with("/vendor/")
        || path.starts_with("/system_ext/")
}

pub fn parse_ls_la(path: &str, output: &str) -> Vec<DeviceFileEntry> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter(|line| !line.trim_start().starts_with("total"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 8 {
                return None;
            }
            let is_dir = tokens[0].starts_with('d');
            let size_bytes = tokens.get(4).and_then(|value| value.parse::<u64>().ok());
            // toybox prints `YYYY-MM-DD HH:MM name`; busybox prints `Mon DD HH:MM name`.
            let (modified_at, name_start) = if tokens.len() >= 9 && !tokens[5].contains('-') {
                (format!("{} {} {}", tokens[5], tokens[6], tokens[7]), 8usize)
            } else {
                (format!("{} {}", tokens[5], tokens[6]), 7usize)
            };
            let name = tokens[name_start..].join(" ");
            // Symlinks render as `name -> target`.
            let name = name
                .split_once(" -> ")
                .map(|(link, _)| link.to_string())
                .unwrap_or(name);
            if name.is_empty() || name == "." || name == ".." {
                return None;
            }
            Some(DeviceFileEntry {
                path: format!("{}/{}", path.trim_end_matches('/'), name),
                name,
                is_dir,
                size_bytes,
                modified_at: Some(modified_at),
            })
        })
        .collect()
}

/// Parses `ps -A` (toybox) output: `USER PID PPID VSZ RSS WCHAN ADDR S NAME`.
pub fn parse_ps_output(output: &str) -> Vec<ProcessEntry> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("USER"))
        .filter_map(|line| {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            if tokens.len() < 3 {
                return None;
            }
            let pid = tokens[1].parse::<u32>().ok()?;
            let name = tokens.last()?.to_string();
            Some(ProcessEntry {
                user: tokens[0].to_string(),
                pid,
                name,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_getprop_map() {
        let output = "[ro.product.brand]: [google]\n[ro.product.model]: [Pixel 7]\nnoise\n";
        let map = parse_getprop_map(output);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("ro.product.model").map(String::as_str), Some("Pixel 7"));
    }

    #[test]
    fn builds_device_profile_skipping_blank_props() {
        let output = "[ro.product.manufacturer]: [Google]\n[ro.build.version.sdk]: [34]\n[ro.build.id]: []\n";
        let profile = build_device_profile(&parse_getprop_map(output));
        assert_eq!(profile.manufacturer.as_deref(), Some("Google"));
        assert_eq!(profile.sdk_level.as_deref(), Some("34"));
        assert_eq!(profile.build_id, None);
    }

    #[test]
    fn parses_df_data_row() {
        let output = "Filesystem      1K-blocks     Used Available Use% Mounted on\n/dev/block/dm-5 115000000 46000000  69000000  40% /data\n";
        let info = parse_df_kb(output).expect("row");
        assert_eq!(info.total_bytes, 115_000_000 * 1024);
        assert_eq!(info.used_bytes, 46_000_000 * 1024);
        assert_eq!(info.available_bytes, 69_000_000 * 1024);
    }

    #[test]
    fn df_row_too_large_for_bytes_is_skipped() {
        let output = "Filesystem 1K-blocks Used Available Use% Mounted on\n/dev/x 18014398509481985 1 1 1% /data\n";
        assert_eq!(parse_df_kb(output), None);
    }

    #[test]
    fn parses_pm_list_packages() {
        let output = "package:/data/app/com.example/base.apk=com.example\npackage:/system/app/Sys.apk=com.android.sys\npackage:com.bare\n";
        let items = parse_pm_list_packages_output(output);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].package_name, "com.example");
        assert!(!items[0].is_system);
        assert!(items[1].is_system);
        assert_eq!(items[2].apk_path, None);
    }

    #[test]
    fn parses_ls_la_toybox_listing() {
        let output = "total 8\ndrwxr-xr-x 2 root root 4096 2024-01-01 12:00 Download\n-rw-r--r-- 1 root root 123 2024-01-01 12:00 my file.txt\nlrwxrwxrwx 1 root root 21 2024-01-01 12:00 sdcard -> /storage/self/primary\n";
        let entries = parse_ls_la("/sdcard/", output);
        assert_eq!(entries.len(), 3);
        assert!(entries[0].is_dir);
        assert_eq!(entries[1].name, "my file.txt");
        assert_eq!(entries[1].path, "/sdcard/my file.txt");
        assert_eq!(entries[1].size_bytes, Some(123));
        assert_eq!(entries[2].name, "sdcard");
    }

    #[test]
    fn parses_ps_output() {
        let output = "USER           PID  PPID     VSZ    RSS WCHAN            ADDR S NAME\nroot             1     0 1234567   4321 0                   0 S init\nu0_a123       4242   800 9876543  65432 0                   0 S com.example.app\n";
        let processes = parse_ps_output(output);
        assert_eq!(processes.len(), 2);
        assert_eq!(processes[1].pid, 4242);
        assert_eq!(processes[1].name, "com.example.app");
        assert_eq!(processes[1].user, "u0_a123");
    }
}
