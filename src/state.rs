//! State management module - TV power/input tracking
//!
//! This module holds the observable TV state, the debounce window that keeps
//! our own command echoes from being read back as external changes, and the
//! listener plumbing used to push changes outward.

pub mod debounce;
mod machine;
mod types;

pub use debounce::{DebounceCoordinator, DebounceWindow, DEFAULT_DEBOUNCE_WINDOW};
pub use machine::TvStateMachine;
pub use types::{PowerState, StateChange, StateListener, TvSnapshot};
