//! Subprocess execution behind a trait seam.
//!
//! Every external tool invocation goes through [`CommandRunner`] so the
//! pipeline can be exercised end to end with a scripted runner in tests,
//! without the docking engine or conversion tool installed.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting on a child with a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Error)]
pub enum EngineFailure {
    #[error("Failed to launch '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("'{program}' exited with status {status}: {stderr}")]
    Failed {
        program: String,
        status: i32,
        stderr: String,
    },
    #[error("'{program}' did not finish within {timeout:?} and was killed")]
    TimedOut { program: String, timeout: Duration },
    #[error("I/O error while running '{program}': {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// A fully specified invocation of an external tool.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub current_dir: Option<PathBuf>,
    pub timeout: Option<Duration>,
}

impl CommandSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            current_dir: None,
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

/// Captured result of a finished invocation that exited with status zero.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion, enforcing the spec's timeout.
    /// A nonzero exit status is an error.
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EngineFailure>;
}

/// Runner backed by real subprocesses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, EngineFailure> {
        let program = spec.program_name();
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.current_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| EngineFailure::Spawn {
            program: program.clone(),
            source,
        })?;

        // Pipes are drained on dedicated threads so a chatty child cannot
        // fill the kernel buffer and deadlock against our wait loop.
        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let stdout_thread = thread::spawn(move || drain(stdout_pipe));
        let stderr_thread = thread::spawn(move || drain(stderr_pipe));

        let status = match spec.timeout {
            None => child.wait().map_err(|source| EngineFailure::Io {
                program: program.clone(),
                source,
            })?,
            Some(timeout) => {
                let deadline = Instant::now() + timeout;
                loop {
                    match child.try_wait().map_err(|source| EngineFailure::Io {
                        program: program.clone(),
                        source,
                    })? {
                        Some(status) => break status,
                        None if Instant::now() >= deadline => {
                            let _ = child.kill();
                            let _ = child.wait();
                            let _ = stdout_thread.join();
                            let _ = stderr_thread.join();
                            return Err(EngineFailure::TimedOut { program, timeout });
                        }
                        None => thread::sleep(POLL_INTERVAL),
                    }
                }
            }
        };

        let stdout = stdout_thread.join().unwrap_or_default();
        let stderr = stderr_thread.join().unwrap_or_default();

        if status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            Err(EngineFailure::Failed {
                program,
                status: status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            })
        }
    }
}

fn drain(pipe: Option<impl Read>) -> String {
    let mut buffer = String::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_string(&mut buffer);
    }
    buffer
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successful_command_captures_stdout() {
        let spec = CommandSpec::new("echo").arg("hello");
        let output = SystemRunner.run(&spec).unwrap();
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[test]
    fn nonzero_exit_is_reported_with_status() {
        let spec = CommandSpec::new("sh").arg("-c").arg("echo oops >&2; exit 3");
        match SystemRunner.run(&spec) {
            Err(EngineFailure::Failed { status, stderr, .. }) => {
                assert_eq!(status, 3);
                assert_eq!(stderr, "oops");
            }
            other => panic!("expected failure, got {other:?}"),
        }
    }

    #[test]
    fn missing_binary_is_a_spawn_error() {
        let spec = CommandSpec::new("definitely-not-a-real-binary");
        assert!(matches!(
            SystemRunner.run(&spec),
            Err(EngineFailure::Spawn { .. })
        ));
    }

    #[test]
    fn deadline_kills_the_child() {
        let spec = CommandSpec::new("sleep")
            .arg("30")
            .timeout(Some(Duration::from_millis(120)));
        let start = Instant::now();
        assert!(matches!(
            SystemRunner.run(&spec),
            Err(EngineFailure::TimedOut { .. })
        ));
        assert!(start.elapsed() < Duration::from_secs(5));
    }
}
