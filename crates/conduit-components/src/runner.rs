//! Subprocess execution for the external package manager
//!
//! Commands are always spawned from an explicit argument vector; nothing is
//! ever handed to a shell. On unix each command leads its own process group
//! so a timeout can take down every helper it started along with it.

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// How long to keep draining output pipes once the child is gone
const PIPE_DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Structured result of one subprocess invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutcome {
    pub succeeded: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl ProcessOutcome {
    /// A failed outcome that never reached the process
    pub fn failed(stderr: impl Into<String>) -> Self {
        Self {
            succeeded: false,
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: None,
        }
    }

    /// Advisory guidance for well-known package manager failures
    pub fn failure_hint(&self) -> Option<&'static str> {
        if self.succeeded {
            None
        } else {
            failure_hint(&self.stderr)
        }
    }
}

/// Advisory guidance for package manager stderr
///
/// Presentation only. Callers must not branch lifecycle decisions on it.
pub fn failure_hint(stderr: &str) -> Option<&'static str> {
    let stderr = stderr.to_lowercase();
    if stderr.contains("could not be found") || stderr.contains("not found") {
        Some("The package may not be published yet or the name is misspelled")
    } else if stderr.contains("version constraint") {
        Some("Check that the package supports your installed framework and PHP versions")
    } else if stderr.contains("timed out") || stderr.contains("timeout") {
        Some("The package manager timed out. Check your network connection and retry")
    } else {
        None
    }
}

/// Runs an external program and captures its result
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, argv: &[String], working_dir: &Path, timeout: Duration)
        -> ProcessOutcome;
}

/// `tokio::process` backed runner
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ProcessRunner for CommandRunner {
    async fn run(
        &self,
        argv: &[String],
        working_dir: &Path,
        timeout: Duration,
    ) -> ProcessOutcome {
        let Some((program, args)) = argv.split_first() else {
            return ProcessOutcome::failed("no command given");
        };

        debug!("Running {} {:?} in {}", program, args, working_dir.display());

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        cmd.process_group(0);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to spawn {}: {}", program, e);
                return ProcessOutcome::failed(format!("failed to start '{}': {}", program, e));
            }
        };

        let group = child.id();

        // Drain both pipes concurrently so a chatty child never blocks on a full pipe
        let stdout_task = child.stdout.take().map(|mut out| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = out.read_to_end(&mut buf).await;
                buf
            })
        });
        let stderr_task = child.stderr.take().map(|mut err| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = err.read_to_end(&mut buf).await;
                buf
            })
        });

        let status = match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) => Some(status),
            Ok(Err(e)) => {
                warn!("Failed to wait for {}: {}", program, e);
                terminate(&mut child).await;
                abort(stdout_task);
                abort(stderr_task);
                return ProcessOutcome::failed(format!("failed to wait for '{}': {}", program, e));
            }
            Err(_) => {
                warn!("{} timed out after {}s, terminating", program, timeout.as_secs());
                terminate(&mut child).await;
                None
            }
        };

        let stdout = collect(stdout_task, group).await;
        let mut stderr = collect(stderr_task, group).await;

        match status {
            Some(status) => ProcessOutcome {
                succeeded: status.success(),
                stdout,
                stderr,
                exit_code: status.code(),
            },
            None => {
                if !stderr.is_empty() && !stderr.ends_with('\n') {
                    stderr.push('\n');
                }
                stderr.push_str(&format!(
                    "'{}' timed out after {}s",
                    program,
                    timeout.as_secs()
                ));
                ProcessOutcome {
                    succeeded: false,
                    stdout,
                    stderr,
                    exit_code: None,
                }
            }
        }
    }
}

/// SIGKILL every process in the group led by `pid`
fn kill_group(pid: Option<u32>) {
    #[cfg(unix)]
    {
        use nix::{
            sys::signal::{killpg, Signal},
            unistd::Pid,
        };

        if let Some(pid) = pid {
            if let Err(e) = killpg(Pid::from_raw(pid as i32), Signal::SIGKILL) {
                debug!("Failed to signal process group {}: {}", pid, e);
            }
        }
    }
    #[cfg(not(unix))]
    let _ = pid;
}

/// Kill the child's whole process group, then reap the child
async fn terminate(child: &mut tokio::process::Child) {
    kill_group(child.id());
    let _ = child.start_kill();
    let _ = child.wait().await;
}

fn abort(task: Option<JoinHandle<Vec<u8>>>) {
    if let Some(handle) = task {
        handle.abort();
    }
}

/// Wait for a pipe reader to reach EOF
///
/// A helper left behind by the child can keep the pipe open. After a grace
/// period the group is killed so the reader sees EOF, and a reader that still
/// does not finish is abandoned.
async fn collect(task: Option<JoinHandle<Vec<u8>>>, group: Option<u32>) -> String {
    let Some(mut handle) = task else {
        return String::new();
    };

    let bytes = match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut handle).await {
        Ok(result) => result.ok(),
        Err(_) => {
            debug!("Output pipe still held open after exit, killing leftover helpers");
            kill_group(group);
            match tokio::time::timeout(PIPE_DRAIN_GRACE, &mut handle).await {
                Ok(result) => result.ok(),
                Err(_) => {
                    handle.abort();
                    None
                }
            }
        }
    };

    bytes
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
