/// Why a command needs elevation, judged from its keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandFamily {
    Power,
    Radio,
    Display,
    Generic,
}

pub fn classify(command: &str) -> CommandFamily {
    let cmd = command.to_lowercase();
    if cmd.contains("reboot") || cmd.contains("shutdown") {
        CommandFamily::Power
    } else if cmd.contains("wifi") || cmd.contains("bluetooth") || cmd.contains("airplane") {
        CommandFamily::Radio
    } else if cmd.contains("brightness") {
        CommandFamily::Display
    } else {
        CommandFamily::Generic
    }
}

/// Message returned when every backend failed, naming what the user can enable.
pub fn remediation_message(command: &str) -> String {
    let trimmed = command.trim();
    let lowered = trimmed.to_lowercase();
    match classify(trimmed) {
        CommandFamily::Power => [
            "Power commands require elevated privileges.",
            "",
            "Options:",
            "1. Install Shizuku (recommended): Play Store -> Shizuku",
            "2. Root your device (advanced users only)",
            "3. Use 'settings power' to access the power menu",
        ]
        .join("\n"),
        CommandFamily::Radio => format!(
            "Network commands need privileges to change state.\n\nTry: 'open {lowered}' to access {lowered} settings instead.\nOr install Shizuku for full control."
        ),
        CommandFamily::Display => [
            "Direct brightness control requires privileges.",
            "",
            "Try: 'open brightness' to access display settings.",
            "Or install Shizuku for direct brightness control.",
        ]
        .join("\n"),
        CommandFamily::Generic => format!(
            "Command '{trimmed}' requires elevated privileges.\n\nSolutions:\n1. Install Shizuku from Play Store (recommended)\n2. Root your device (advanced)\n3. Use 'open settings' for manual control\n\nType 'help' to see commands that work without privileges."
        ),
    }
}
