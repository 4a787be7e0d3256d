use std::io::{Read, Write};
use std::process::{Child, Command, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::app::error::AppError;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Spawns a program and returns its exit status and captured streams.
///
/// Backends only talk to the OS through this seam, so tests can script it.
pub trait ShellLauncher: Send + Sync {
    fn launch(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError>;
}

/// Runs real processes on the host.
#[derive(Debug, Clone, Default)]
pub struct SystemLauncher {
    timeout: Option<Duration>,
}

impl SystemLauncher {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }
}

impl ShellLauncher for SystemLauncher {
    fn launch(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
        trace_id: &str,
    ) -> Result<CommandOutput, AppError> {
        run_command(program, args, stdin, self.timeout, trace_id)
    }
}

pub fn run_command(
    program: &str,
    args: &[String],
    stdin: Option<&str>,
    timeout: Option<Duration>,
    trace_id: &str,
) -> Result<CommandOutput, AppError> {
    debug!(trace_id = %trace_id, program = %program, "spawning process");
    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| AppError::dependency(format!("Failed to spawn {program}: {err}"), trace_id))?;

    // Drain both pipes before waiting; a chatty child blocks once a pipe buffer fills.
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stdout", trace_id))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| AppError::system("Failed to capture stderr", trace_id))?;
    let stdout_handle = drain(stdout);
    let stderr_handle = drain(stderr);

    if let Some(input) = stdin {
        // A session that exits early (denied su prompt) closes its end; its exit status still counts.
        let written = write_stdin(&mut child, input)
            .or_else(|err| match err.kind() {
                std::io::ErrorKind::BrokenPipe => Ok(()),
                _ => Err(err),
            });
        if let Err(err) = written {
            let _ = child.kill();
            let _ = child.wait();
            let _ = stdout_handle.join();
            let _ = stderr_handle.join();
            return Err(AppError::system(
                format!("Failed to write session input: {err}"),
                trace_id,
            ));
        }
    }

    let exit_code = match wait_for_exit(&mut child, timeout) {
        Ok(code) => code,
        // Drain threads are left detached: a grandchild may still hold the pipes open.
        Err(err) => {
            return Err(match err {
                WaitError::TimedOut => AppError::timeout("Command timed out", trace_id),
                WaitError::Poll(err) => {
                    AppError::system(format!("Failed to poll command: {err}"), trace_id)
                }
            });
        }
    };

    let stdout_bytes = stdout_handle.join().unwrap_or_default();
    let stderr_bytes = stderr_handle.join().unwrap_or_default();

    Ok(CommandOutput {
        stdout: String::from_utf8_lossy(&stdout_bytes).to_string(),
        stderr: String::from_utf8_lossy(&stderr_bytes).to_string(),
        exit_code,
    })
}

fn drain<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buffer = Vec::<u8>::new();
        let mut temp = [0u8; 4096];
        loop {
            match reader.read(&mut temp) {
                Ok(0) => break,
                Ok(count) => buffer.extend_from_slice(&temp[..count]),
                Err(_) => break,
            }
        }
        buffer
    })
}

fn write_stdin(child: &mut Child, input: &str) -> std::io::Result<()> {
    // Dropping the handle closes the pipe so the session sees EOF after the terminator.
    let Some(mut pipe) = child.stdin.take() else {
        return Err(std::io::Error::other("stdin not piped"));
    };
    pipe.write_all(input.as_bytes())?;
    pipe.flush()
}

enum WaitError {
    TimedOut,
    Poll(std::io::Error),
}

fn wait_for_exit(child: &mut Child, timeout: Option<Duration>) -> Result<Option<i32>, WaitError> {
    let Some(timeout) = timeout else {
        return child.wait().map(|status| status.code()).map_err(WaitError::Poll);
    };
    let start = Instant::now();
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Ok(status.code()),
            Ok(None) => {
                if start.elapsed() > timeout {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(WaitError::TimedOut);
                }
                std::thread::sleep(Duration::from_millis(50));
            }
            Err(err) => return Err(WaitError::Poll(err)),
        }
    }
}
