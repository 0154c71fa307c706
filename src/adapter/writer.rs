//! Outbound command channel and the single writer task
//!
//! Every producer (reader replies, poll timer, external set/get calls) sends
//! through a [`CommandSender`]; only the writer task touches the adapter's
//! stdin, so writes are serialized without a lock.

use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, trace};

use crate::cec::CecCommand;
use crate::error::{CecError, CecResult};

/// Receiving half of the command channel, owned by the writer task
pub type CommandReceiver = mpsc::UnboundedReceiver<CecCommand>;

/// Cloneable handle for queueing outbound commands
#[derive(Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<CecCommand>,
}

impl CommandSender {
    /// Queue a command for the writer task
    ///
    /// Fire-and-forget: returns once queued. Fails only when the writer has
    /// stopped, which means the adapter is gone.
    pub fn send(&self, command: CecCommand) -> CecResult<()> {
        trace!(%command, "Queueing command");
        self.tx.send(command).map_err(|_| CecError::AdapterClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Create the outbound command channel
pub fn command_channel() -> (CommandSender, CommandReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (CommandSender { tx }, rx)
}

/// Drain the command channel into the adapter until shutdown or failure
///
/// A write error ends the task with the error; dropping the receiver closes
/// the channel so later sends report [`CecError::AdapterClosed`]. On
/// shutdown the channel is closed, already queued commands are still
/// written, and the writer is shut down (closing the adapter's stdin).
pub async fn run_writer<W>(
    mut rx: CommandReceiver,
    mut writer: W,
    mut shutdown: oneshot::Receiver<()>,
) -> CecResult<()>
where
    W: AsyncWrite + Unpin,
{
    debug!("Command writer started");

    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(command) => write_command(&mut writer, command).await?,
                None => break,
            },
            _ = &mut shutdown => {
                debug!("Command writer shutting down");
                rx.close();
                while let Some(command) = rx.recv().await {
                    write_command(&mut writer, command).await?;
                }
                break;
            }
        }
    }

    writer.shutdown().await?;
    debug!("Command writer stopped");
    Ok(())
}

async fn write_command<W>(writer: &mut W, command: CecCommand) -> CecResult<()>
where
    W: AsyncWrite + Unpin,
{
    debug!(%command, "Writing command to adapter");

    write_line(writer, &command.to_line()).await.map_err(|e| {
        error!(%command, "Failed to write to CEC adapter: {}", e);
        CecError::Io(e)
    })
}

async fn write_line<W>(writer: &mut W, line: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
