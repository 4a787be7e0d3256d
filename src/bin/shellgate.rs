//! shellgate CLI
//!
//! Runs device operations through the best available privileged backend.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use shellgate_lib::app::config::{
    load_config, load_config_from_path, save_config, save_config_to_path, AppConfig,
};
use shellgate_lib::app::diagnostics::{collect_backend_report, write_backend_report};
use shellgate_lib::app::error::AppError;
use shellgate_lib::app::logging::init_logging;
use shellgate_lib::app::models::{AudioStream, CommandOutcome, RebootMode};
use shellgate_lib::app::trace::new_trace_id;
use shellgate_lib::build_orchestrator;

#[derive(Debug, Parser)]
#[command(name = "shellgate")]
#[command(about = "Privileged command dispatch for Android devices", long_about = None)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (defaults to $SHELLGATE_CONFIG_PATH or ~/.shellgate_config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show or reset the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Probe every backend and report the active one
    Status {
        /// Also write the report as JSON into this directory
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Run a raw shell command
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Reboot the device
    Reboot {
        #[arg(long, value_enum, default_value_t = RebootArg::Normal)]
        mode: RebootArg,
    },
    /// Turn WiFi on or off
    Wifi { state: Toggle },
    /// Turn Bluetooth on or off
    Bluetooth { state: Toggle },
    /// Set screen brightness (clamped to 0-255)
    Brightness {
        #[arg(allow_hyphen_values = true)]
        level: i32,
    },
    /// Set a stream volume (clamped to 0-15)
    Volume {
        #[arg(allow_hyphen_values = true)]
        level: i32,
        #[arg(long, value_enum, default_value_t = StreamArg::Music)]
        stream: StreamArg,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the effective config
    Show,
    /// Write defaults, keeping a backup of the previous file
    Reset,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl Toggle {
    fn enabled(self) -> bool {
        matches!(self, Toggle::On)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum RebootArg {
    Normal,
    Recovery,
    Bootloader,
    SafeMode,
}

impl From<RebootArg> for RebootMode {
    fn from(value: RebootArg) -> Self {
        match value {
            RebootArg::Normal => RebootMode::Normal,
            RebootArg::Recovery => RebootMode::Recovery,
            RebootArg::Bootloader => RebootMode::Bootloader,
            RebootArg::SafeMode => RebootMode::SafeMode,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StreamArg {
    Music,
    Ring,
    Notification,
    Alarm,
    VoiceCall,
}

impl From<StreamArg> for AudioStream {
    fn from(value: StreamArg) -> Self {
        match value {
            StreamArg::Music => AudioStream::Music,
            StreamArg::Ring => AudioStream::Ring,
            StreamArg::Notification => AudioStream::Notification,
            StreamArg::Alarm => AudioStream::Alarm,
            StreamArg::VoiceCall => AudioStream::VoiceCall,
        }
    }
}

fn resolve_config(path: Option<&PathBuf>, trace_id: &str) -> Result<AppConfig, AppError> {
    match path {
        Some(path) => load_config_from_path(path, trace_id),
        None => load_config(trace_id),
    }
}

fn reset_config(path: Option<&PathBuf>, trace_id: &str) -> Result<(), AppError> {
    let defaults = AppConfig::default();
    match path {
        Some(path) => save_config_to_path(
            &defaults,
            path,
            &path.with_extension("backup.json"),
            trace_id,
        ),
        None => save_config(&defaults, trace_id),
    }
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(err) => eprintln!("Error: failed to serialize output: {err}"),
    }
}

fn report_outcome(outcome: CommandOutcome, json: bool) -> ExitCode {
    if json {
        let ok = outcome.is_ok();
        print_json(&outcome);
        return if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE };
    }
    match outcome.into_result() {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{}", output.trim_end());
            }
            ExitCode::SUCCESS
        }
        Err(failure) => {
            eprintln!("Error: {failure}");
            ExitCode::FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let trace_id = new_trace_id();

    let config = match resolve_config(cli.config.as_ref(), &trace_id) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::from(2);
        }
    };
    init_logging(&config.logging);

    if let Commands::Config { action } = &cli.command {
        return match action {
            ConfigAction::Show => {
                print_json(&config);
                ExitCode::SUCCESS
            }
            ConfigAction::Reset => match reset_config(cli.config.as_ref(), &trace_id) {
                Ok(()) => ExitCode::SUCCESS,
                Err(err) => {
                    eprintln!("Error: {err}");
                    ExitCode::FAILURE
                }
            },
        };
    }

    let orchestrator = build_orchestrator(&config).with_trace_id(Some(trace_id.clone()));

    match cli.command {
        Commands::Config { .. } => ExitCode::SUCCESS,
        Commands::Status { out_dir } => {
            let report = collect_backend_report(orchestrator.coordinator(), &trace_id);
            if cli.json {
                print_json(&report);
            } else {
                println!("{}", report.status_message);
                for entry in &report.backends {
                    println!(
                        "  {:<20} reachable={} authorized={}",
                        entry.kind.label(),
                        entry.availability.reachable,
                        entry.availability.authorized
                    );
                }
            }
            if let Some(dir) = out_dir {
                match write_backend_report(&report, &dir, &trace_id) {
                    Ok(path) => eprintln!("Report written to {}", path.display()),
                    Err(err) => {
                        eprintln!("Error: {err}");
                        return ExitCode::FAILURE;
                    }
                }
            }
            ExitCode::SUCCESS
        }
        Commands::Exec { command } => {
            report_outcome(orchestrator.execute_system_command(&command.join(" ")), cli.json)
        }
        Commands::Reboot { mode } => report_outcome(orchestrator.reboot(mode.into()), cli.json),
        Commands::Wifi { state } => {
            report_outcome(orchestrator.set_wifi_enabled(state.enabled()), cli.json)
        }
        Commands::Bluetooth { state } => {
            report_outcome(orchestrator.set_bluetooth_enabled(state.enabled()), cli.json)
        }
        Commands::Brightness { level } => {
            report_outcome(orchestrator.set_brightness(level), cli.json)
        }
        Commands::Volume { level, stream } => {
            report_outcome(orchestrator.set_volume(stream.into(), level), cli.json)
        }
    }
}
