//! Observable TV state and change notifications

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// Power state as seen from outside
///
/// CEC standby and broadcast-off both map to `Off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerState {
    #[default]
    Unknown,
    On,
    Off,
}

impl PowerState {
    /// `Some(true)` for on, `Some(false)` for off, `None` while unknown
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PowerState::On => Some(true),
            PowerState::Off => Some(false),
            PowerState::Unknown => None,
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PowerState::Unknown => "unknown",
            PowerState::On => "on",
            PowerState::Off => "off",
        };
        f.write_str(s)
    }
}

/// Outward notification emitted after an accepted event is applied
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum StateChange {
    Power(PowerState),
    Input(u8),
}

/// Listener callback for state changes
///
/// Invoked synchronously from the task that applied the event, outside the
/// state lock. Must not block.
pub type StateListener = Arc<dyn Fn(StateChange) + Send + Sync>;

/// Copy of the externally observable state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TvSnapshot {
    pub power: PowerState,
    /// 1-based active input, `None` until one is observed
    pub input: Option<u8>,
}
