//! cec-client subprocess lifecycle

use std::process::Stdio;

use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{info, warn};

use crate::error::{CecError, CecResult};

/// Running adapter subprocess
///
/// The child is killed when this value is dropped.
pub struct AdapterProcess {
    program: String,
    child: Child,
}

impl AdapterProcess {
    /// Spawn the adapter with piped stdin/stdout
    pub fn spawn(program: &str, args: &[String]) -> CecResult<Self> {
        info!(program, ?args, "Spawning CEC adapter");

        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| CecError::Spawn {
                program: program.to_string(),
                source,
            })?;

        if let Some(pid) = child.id() {
            info!(pid, "CEC adapter running");
        }

        Ok(Self {
            program: program.to_string(),
            child,
        })
    }

    /// Take the adapter's stdout and stdin; only succeeds once
    pub fn take_pipes(&mut self) -> CecResult<(ChildStdout, ChildStdin)> {
        let stdout = self
            .child
            .stdout
            .take()
            .ok_or(CecError::MissingPipe("stdout"))?;
        let stdin = self
            .child
            .stdin
            .take()
            .ok_or(CecError::MissingPipe("stdin"))?;
        Ok((stdout, stdin))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Kill the adapter and reap it
    pub async fn stop(mut self) {
        match self.child.try_wait() {
            Ok(Some(status)) => {
                info!(program = %self.program, %status, "CEC adapter already exited");
                return;
            }
            Ok(None) => {}
            Err(e) => warn!("Failed to query CEC adapter status: {}", e),
        }

        if let Err(e) = self.child.kill().await {
            warn!("Failed to stop CEC adapter: {}", e);
        } else {
            info!(program = %self.program, "CEC adapter stopped");
        }
    }
}
