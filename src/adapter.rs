//! cec-client adapter boundary
//!
//! The adapter is a long-lived subprocess speaking a line protocol: we write
//! `tx <hex>` commands to its stdin and read bus traffic from its stdout.

pub mod process;
pub mod reader;
pub mod writer;

pub use process::AdapterProcess;
pub use reader::run_reader;
pub use writer::{command_channel, run_writer, CommandReceiver, CommandSender};
