//! CEC traffic model: frames, semantic events and outbound commands
//!
//! Only power and input-routing opcodes are interpreted. Everything else
//! the adapter prints is treated as noise.

pub mod encoder;
pub mod frame;
pub mod parser;

use serde::Serialize;

pub use encoder::CecCommand;
pub use frame::{frames, Direction, RawFrame};
pub use parser::{FrameAction, LineParser};

/// Semantic event decoded from a single frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "port", rename_all = "snake_case")]
pub enum SemanticEvent {
    PowerOn,
    /// Broadcast standby (`0f:36`)
    PowerOff,
    PowerStandby,
    /// Active source moved to the given 1-based physical input
    InputSwitched(u8),
}

impl SemanticEvent {
    /// Power events go through the debounce window; input switches do not
    pub fn is_power(&self) -> bool {
        !matches!(self, SemanticEvent::InputSwitched(_))
    }
}
