//! Reader task: adapter output → parser → state machine

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::cec::{FrameAction, LineParser};
use crate::error::CecResult;
use crate::state::TvStateMachine;

/// Consume adapter output until end-of-stream
///
/// Lines are handled strictly in arrival order. OSD replies are queued
/// before the next frame is looked at. End-of-stream is a normal exit;
/// only read errors and a closed command channel are reported.
pub async fn run_reader<R>(
    reader: R,
    parser: LineParser,
    machine: Arc<TvStateMachine>,
) -> CecResult<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut lines = 0u64;

    debug!("CEC reader started");

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        lines += 1;

        // cec-client occasionally prints non-UTF-8 OSD strings
        let line = String::from_utf8_lossy(&buf);
        trace!(traffic = %line.trim_end(), "CEC traffic");

        for action in parser.parse(&line) {
            match action {
                FrameAction::Event(event) => {
                    machine.handle_event(event, Instant::now());
                }
                FrameAction::Reply(command) => {
                    debug!(%command, "Answering adapter frame");
                    machine.commands().send(command)?;
                }
            }
        }
    }

    info!(lines, "CEC adapter output closed");
    Ok(())
}
