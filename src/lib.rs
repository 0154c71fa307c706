//! CEC TV GW - bridge between cec-client traffic and a TV power/input model
//!
//! The adapter's free-text output is parsed into semantic events, power
//! transitions are debounced against our own echoes, and the resulting
//! state is exposed through [`TvStateMachine`].

pub mod adapter;
pub mod cec;
pub mod config;
pub mod error;
pub mod poll;
pub mod session;
pub mod sniffer;
pub mod state;

pub use cec::{CecCommand, FrameAction, LineParser, SemanticEvent};
pub use error::{CecError, CecResult};
pub use session::{CecSession, SessionTiming};
pub use state::{PowerState, StateChange, StateListener, TvSnapshot, TvStateMachine};
