use std::sync::OnceLock;

use regex::Regex;

fn package_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\.[A-Za-z0-9_]+)+$").expect("package regex")
    })
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z0-9_.:/@+-]+$").expect("token regex"))
}

/// Returns the trimmed path when it is an absolute, non-root device path.
pub fn validate_device_path(path: &str) -> Result<&str, String> {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return Err("device_path is required".to_string());
    }
    if !trimmed.starts_with('/') {
        return Err("device_path must be an absolute device path starting with '/'".to_string());
    }
    if trimmed.contains('\0') {
        return Err("device_path contains invalid characters".to_string());
    }
    if trimmed.trim_end_matches('/').is_empty() {
        return Err("device_path must not be root".to_string());
    }
    if trimmed.split('/').any(|segment| segment == "..") {
        return Err("device_path must not contain '..' segments".to_string());
    }
    Ok(trimmed)
}

pub fn validate_package_name(package_name: &str) -> Result<&str, String> {
    let trimmed = package_name.trim();
    if trimmed.is_empty() {
        return Err("package_name is required".to_string());
    }
    if !package_regex().is_match(trimmed) {
        return Err(format!("Invalid package name: {trimmed}"));
    }
    Ok(trimmed)
}

/// Single words passed to the shell unquoted: setting keys, permissions,
/// activity names, intent actions, volume ids.
pub fn validate_token<'a>(value: &'a str, field: &str) -> Result<&'a str, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{field} is required"));
    }
    if !token_regex().is_match(trimmed) {
        return Err(format!("{field} contains invalid characters: {trimmed}"));
    }
    Ok(trimmed)
}

/// POSIX single-quoting; embedded quotes become `'\''`.
pub fn shell_quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_path_requires_absolute_non_root() {
        assert!(validate_device_path("").is_err());
        assert!(validate_device_path("sdcard/file.txt").is_err());
        assert!(validate_device_path("/").is_err());
        assert!(validate_device_path("//").is_err());
        assert_eq!(
            validate_device_path(" /sdcard/file.txt "),
            Ok("/sdcard/file.txt")
        );
    }

    #[test]
    fn device_path_blocks_dotdot_and_nul() {
        assert!(validate_device_path("/sdcard/../etc/passwd").is_err());
        assert!(validate_device_path("/sdcard/..").is_err());
        assert!(validate_device_path("/sdcard/a\0b").is_err());
        assert!(validate_device_path("/sdcard/..hidden").is_ok());
    }

    #[test]
    fn package_names_need_a_dotted_identifier() {
        assert!(validate_package_name("com.example.app").is_ok());
        assert!(validate_package_name("com.example_1.App2").is_ok());
        assert!(validate_package_name("").is_err());
        assert!(validate_package_name("example").is_err());
        assert!(validate_package_name("1com.example").is_err());
        assert!(validate_package_name("com.example; reboot").is_err());
    }

    #[test]
    fn tokens_reject_shell_metacharacters() {
        assert_eq!(
            validate_token("android.permission.CAMERA", "permission"),
            Ok("android.permission.CAMERA")
        );
        assert!(validate_token("a b", "key").is_err());
        assert!(validate_token("x;rm", "key").is_err());
        assert!(validate_token("$(id)", "key").is_err());
    }

    #[test]
    fn shell_quote_escapes_single_quotes() {
        assert_eq!(shell_quote("/sdcard/My File"), "'/sdcard/My File'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }
}
