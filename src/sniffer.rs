//! CEC traffic sniffer for debugging and development
//!
//! Prints every frame the adapter reports together with what the gateway
//! would make of it. Nothing is written back to the adapter.

use chrono::{DateTime, Local};
use colored::*;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::cec::{frames, Direction, FrameAction, LineParser, RawFrame};
use crate::error::CecResult;

/// One decoded frame, as printed by the sniffer
#[derive(Debug, Clone, Serialize)]
pub struct SnifferRecord {
    pub timestamp: DateTime<Local>,
    pub direction: Direction,
    /// Colon-separated hex, as on the wire
    pub frame: String,
    pub action: Option<FrameAction>,
}

impl SnifferRecord {
    pub fn new(frame: &RawFrame, action: Option<FrameAction>, timestamp: DateTime<Local>) -> Self {
        Self {
            timestamp,
            direction: frame.direction,
            frame: frame.hex(),
            action,
        }
    }

    /// Human readable description of the action
    pub fn describe(&self) -> String {
        match self.action {
            Some(FrameAction::Event(event)) => format!("{:?}", event),
            Some(FrameAction::Reply(command)) => format!("reply: {}", command),
            None => "-".to_string(),
        }
    }

    fn render(&self) -> String {
        let direction = match self.direction {
            Direction::Received => "IN ".green(),
            Direction::Sent => "OUT".red(),
        };
        let action = match self.action {
            Some(FrameAction::Event(_)) => self.describe().bright_white().bold(),
            Some(FrameAction::Reply(_)) => self.describe().yellow(),
            None => self.describe().dimmed(),
        };

        format!(
            "{} {} {:<32} {}",
            self.timestamp.format("%H:%M:%S%.3f").to_string().dimmed(),
            direction,
            self.frame.cyan(),
            action
        )
    }
}

/// Decode every frame in one line of adapter output
pub fn records(parser: &LineParser, line: &str, timestamp: DateTime<Local>) -> Vec<SnifferRecord> {
    frames(line)
        .map(|frame| {
            let action = parser.classify(&frame);
            SnifferRecord::new(&frame, action, timestamp)
        })
        .collect()
}

/// Print decoded traffic until the adapter output ends
///
/// Returns the number of frames seen.
pub async fn run_sniffer<R>(reader: R, json: bool) -> CecResult<u64>
where
    R: AsyncRead + Unpin,
{
    let parser = LineParser::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(256);
    let mut count = 0u64;

    if !json {
        println!("{}", "=== CEC Sniffer ===".bold().cyan());
        println!("Press Ctrl+C to exit\n");
    }

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = String::from_utf8_lossy(&buf);

        for record in records(&parser, &line, Local::now()) {
            count += 1;
            if json {
                match serde_json::to_string(&record) {
                    Ok(s) => println!("{}", s),
                    Err(e) => tracing::warn!("Failed to serialize sniffer record: {}", e),
                }
            } else {
                println!("{}", record.render());
            }
        }
    }

    if !json {
        println!("\n{} {} frames", "Adapter closed after".bold(), count);
    }

    Ok(count)
}
