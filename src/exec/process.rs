// src/exec/process.rs

//! One live OS process for a [`Command`].
//!
//! Children are started in their own process group (on unix) so termination
//! reaches anything they spawn, e.g. the binary started by `go run`.

use std::process::Stdio;
use std::time::Duration;

use tokio::process::{Child, Command as ProcessCommand};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::errors::{Result, WatchpipeError};
use crate::pipeline::{Command, CommandOutcome, CommandState};

const GROUP_POLL_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Debug)]
pub struct ProcessHandle {
    label: String,
    child: Child,
    /// Leader pid, which is also the process group id. Kept after the
    /// leader has been reaped.
    pid: Option<u32>,
    state: CommandState,
}

impl ProcessHandle {
    pub(crate) fn spawn(command: &Command) -> Result<Self> {
        let label = command.label();

        let mut cmd = ProcessCommand::new(command.application());
        cmd.args(command.arguments())
            .current_dir(command.directory())
            .envs(command.environment())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd.spawn().map_err(|source| WatchpipeError::Launch {
            command: label.clone(),
            source,
        })?;

        trace!(command = %label, pid = ?child.id(), "spawned process");

        Ok(Self {
            label,
            pid: child.id(),
            child,
            state: CommandState::Running,
        })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Process group of the command; outlives the leader's exit.
    pub fn group_id(&self) -> Option<u32> {
        self.pid
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn state(&self) -> &CommandState {
        &self.state
    }

    /// Wait for the process to exit.
    ///
    /// Returns [`WatchpipeError::Runtime`] for a non-zero exit. A process that
    /// was terminated by [`ProcessHandle::terminate`] reports `Ok(())`.
    ///
    /// Cancel safe: dropping the future before the process exits leaves the
    /// handle `Running`.
    pub async fn wait(&mut self) -> Result<()> {
        if self.state.is_running() {
            let status = self.child.wait().await?;
            self.state = CommandState::Finished(CommandOutcome::Exited(status.code().unwrap_or(-1)));
        }

        match &self.state {
            CommandState::Finished(CommandOutcome::Exited(code)) if *code != 0 => {
                Err(WatchpipeError::Runtime {
                    command: self.label.clone(),
                    code: *code,
                })
            }
            _ => Ok(()),
        }
    }

    /// Ask the process group to stop, killing it after `grace`.
    ///
    /// The whole group gets `grace` to exit, not just the leader: members
    /// still alive at the deadline are killed even if the leader is gone.
    /// No-op if the process already exited.
    pub async fn terminate(&mut self, grace: Duration) -> Result<()> {
        if !self.state.is_running() {
            return Ok(());
        }

        if let Some(status) = self.child.try_wait()? {
            self.state = CommandState::Finished(CommandOutcome::Exited(status.code().unwrap_or(-1)));
            return Ok(());
        }

        debug!(command = %self.label, pid = ?self.child.id(), "sending termination signal");
        self.signal_terminate();

        let deadline = Instant::now() + grace;
        match tokio::time::timeout_at(deadline, self.child.wait()).await {
            Ok(status) => {
                status?;
                self.reap_group(deadline).await;
            }
            Err(_) => {
                warn!(
                    command = %self.label,
                    grace_ms = grace.as_millis() as u64,
                    "process did not exit within grace period; killing"
                );
                self.signal_kill();
                self.child.wait().await?;
            }
        }

        self.state = CommandState::Finished(CommandOutcome::Terminated);
        Ok(())
    }

    #[cfg(unix)]
    async fn reap_group(&self, deadline: Instant) {
        while self.group_alive() {
            if Instant::now() >= deadline {
                warn!(command = %self.label, "process group outlived its leader; killing");
                self.signal_group(nix::sys::signal::Signal::SIGKILL);
                return;
            }
            tokio::time::sleep(GROUP_POLL_INTERVAL).await;
        }
    }

    #[cfg(not(unix))]
    async fn reap_group(&self, _deadline: Instant) {}

    #[cfg(unix)]
    fn group_alive(&self) -> bool {
        use nix::errno::Errno;
        use nix::sys::signal::{Signal, killpg};
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return false;
        };
        matches!(killpg(Pid::from_raw(pid as i32), None::<Signal>), Ok(()) | Err(Errno::EPERM))
    }

    #[cfg(unix)]
    fn signal_terminate(&mut self) {
        self.signal_group(nix::sys::signal::Signal::SIGTERM);
    }

    #[cfg(not(unix))]
    fn signal_terminate(&mut self) {
        if let Err(e) = self.child.start_kill() {
            debug!(command = %self.label, error = %e, "failed to stop process");
        }
    }

    #[cfg(unix)]
    fn signal_kill(&mut self) {
        self.signal_group(nix::sys::signal::Signal::SIGKILL);
        if let Err(e) = self.child.start_kill() {
            debug!(command = %self.label, error = %e, "failed to kill process");
        }
    }

    #[cfg(not(unix))]
    fn signal_kill(&mut self) {
        self.signal_terminate();
    }

    #[cfg(unix)]
    fn signal_group(&self, signal: nix::sys::signal::Signal) {
        use nix::errno::Errno;
        use nix::sys::signal::killpg;
        use nix::unistd::Pid;

        let Some(pid) = self.pid else {
            return;
        };
        match killpg(Pid::from_raw(pid as i32), signal) {
            Ok(()) | Err(Errno::ESRCH) => {}
            Err(e) => warn!(command = %self.label, pid, ?signal, error = %e, "failed to signal process group"),
        }
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // kill_on_drop only reaches the group leader.
        #[cfg(unix)]
        if self.state.is_running() {
            self.signal_group(nix::sys::signal::Signal::SIGKILL);
        }
    }
}
