//! Adapter session: owns the reader, writer and poll tasks for one adapter
//!
//! Built once at startup from the adapter's pipes. External callers talk to
//! the TV through [`CecSession::machine`].

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::adapter::{command_channel, run_reader, run_writer};
use crate::cec::LineParser;
use crate::error::CecResult;
use crate::poll::{run_poller, DEFAULT_POLL_INTERVAL};
use crate::state::{TvStateMachine, DEFAULT_DEBOUNCE_WINDOW};

/// How long shutdown waits for the adapter to close its output
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Timing knobs that can change while the session runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionTiming {
    pub poll_interval: Duration,
    pub debounce_window: Duration,
}

impl Default for SessionTiming {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
        }
    }
}

type TaskHandle = JoinHandle<CecResult<()>>;

enum Finished {
    Reader(Result<CecResult<()>, tokio::task::JoinError>),
    Writer(Result<CecResult<()>, tokio::task::JoinError>),
}

/// Running CEC session
pub struct CecSession {
    machine: Arc<TvStateMachine>,
    poll_interval_tx: watch::Sender<Duration>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    reader: Option<TaskHandle>,
    writer: Option<TaskHandle>,
    poller: TaskHandle,
}

impl CecSession {
    /// Start the session tasks on the current runtime
    ///
    /// `reader` is the adapter's output, `writer` its command input.
    pub fn start<R, W>(reader: R, writer: W, timing: SessionTiming) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (commands, command_rx) = command_channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (poll_interval_tx, poll_interval_rx) = watch::channel(timing.poll_interval);

        let machine = Arc::new(TvStateMachine::new(
            commands.clone(),
            timing.debounce_window,
        ));

        let writer = tokio::spawn(run_writer(command_rx, writer, shutdown_rx));
        let reader = tokio::spawn(run_reader(reader, LineParser::new(), machine.clone()));
        let poller = tokio::spawn(run_poller(commands, poll_interval_rx));

        info!(
            poll_interval_ms = timing.poll_interval.as_millis() as u64,
            debounce_window_ms = timing.debounce_window.as_millis() as u64,
            "CEC session started"
        );

        Self {
            machine,
            poll_interval_tx,
            shutdown_tx: Some(shutdown_tx),
            reader: Some(reader),
            writer: Some(writer),
            poller,
        }
    }

    /// State machine shared with external callers
    pub fn machine(&self) -> Arc<TvStateMachine> {
        self.machine.clone()
    }

    /// Apply new timing without restarting the session
    pub fn update_timing(&self, timing: SessionTiming) {
        self.poll_interval_tx.send_replace(timing.poll_interval);
        self.machine.set_debounce_window(timing.debounce_window);
        debug!(?timing, "Session timing updated");
    }

    /// Wait until the adapter output ends or the writer stops
    ///
    /// End-of-stream resolves to `Ok(())`. A write failure resolves to the
    /// error so the owner of the adapter process can react. Cancel safe.
    pub async fn wait(&mut self) -> CecResult<()> {
        let (Some(reader), Some(writer)) = (self.reader.as_mut(), self.writer.as_mut()) else {
            return Ok(());
        };

        let finished = tokio::select! {
            res = reader => Finished::Reader(res),
            res = writer => Finished::Writer(res),
        };

        match finished {
            Finished::Reader(res) => {
                self.reader = None;
                debug!("CEC reader finished");
                res?
            }
            Finished::Writer(res) => {
                self.writer = None;
                debug!("CEC writer finished");
                res?
            }
        }
    }

    /// Stop polling, close the command channel and wait for the tasks
    ///
    /// Commands already queued are still written. The reader is given a
    /// short grace period to see end-of-stream before it is aborted.
    pub async fn shutdown(mut self) -> CecResult<()> {
        info!("Shutting down CEC session");
        self.poller.abort();

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        let mut result = Ok(());
        if let Some(writer) = self.writer.take() {
            result = writer.await?;
        }

        if let Some(mut reader) = self.reader.take() {
            match tokio::time::timeout(SHUTDOWN_GRACE, &mut reader).await {
                Ok(res) => {
                    if let Err(e) = res? {
                        warn!("CEC reader ended with error: {}", e);
                    }
                }
                Err(_) => {
                    debug!("CEC adapter output still open, aborting reader");
                    reader.abort();
                }
            }
        }

        info!("CEC session stopped");
        result
    }
}
