//! TV state machine
//!
//! Owns the power/input pair and the debounce window behind one lock.
//! Reads are answered from the last known state; writes are fire-and-forget
//! commands whose bus echo eventually updates the state.

use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::{debug, info};

use super::debounce::DebounceCoordinator;
use super::types::{PowerState, StateChange, StateListener, TvSnapshot};
use crate::adapter::CommandSender;
use crate::cec::{CecCommand, SemanticEvent};
use crate::error::CecResult;

struct Inner {
    snapshot: TvSnapshot,
    debounce: DebounceCoordinator,
}

/// Power/input state shared between the reader task and external callers
pub struct TvStateMachine {
    inner: Mutex<Inner>,
    listeners: RwLock<Vec<StateListener>>,
    commands: CommandSender,
}

impl TvStateMachine {
    pub fn new(commands: CommandSender, debounce_window: Duration) -> Self {
        Self {
            inner: Mutex::new(Inner {
                snapshot: TvSnapshot::default(),
                debounce: DebounceCoordinator::new(debounce_window),
            }),
            listeners: RwLock::new(Vec::new()),
            commands,
        }
    }

    /// Request a fresh power status and return the last known one
    ///
    /// The returned value never reflects the query just sent; the answer
    /// arrives later through the event pipeline.
    pub fn get_power(&self) -> CecResult<PowerState> {
        debug!("Checking TV power status");
        self.commands.send(CecCommand::PowerQuery)?;
        Ok(self.power())
    }

    /// Ask the TV to switch on or go to standby
    ///
    /// Switching on while already on sends nothing. Standby is always sent.
    /// Success only means the command was queued.
    pub fn set_power(&self, on: bool) -> CecResult<()> {
        let current = self.power();
        info!(current = %current, "Turning TV {}", if on { "on" } else { "off" });

        if on && current == PowerState::On {
            debug!("TV is already on");
            return Ok(());
        }

        self.commands.send(CecCommand::for_power(on))
    }

    /// Run an event observed at `now` through debounce and apply it
    ///
    /// Returns whether the event was applied.
    pub fn handle_event(&self, event: SemanticEvent, now: Instant) -> bool {
        let change = {
            let mut inner = self.inner.lock();
            if event.is_power() && !inner.debounce.admit(now) {
                debug!(?event, "Power event suppressed by debounce window");
                return false;
            }
            Self::apply_locked(&mut inner, event)
        };

        self.notify(change);
        true
    }

    /// Apply an accepted event and notify listeners, bypassing debounce
    pub fn apply(&self, event: SemanticEvent) {
        let change = Self::apply_locked(&mut self.inner.lock(), event);
        self.notify(change);
    }

    fn apply_locked(inner: &mut Inner, event: SemanticEvent) -> StateChange {
        match event {
            SemanticEvent::PowerOn => {
                inner.snapshot.power = PowerState::On;
                StateChange::Power(PowerState::On)
            }
            SemanticEvent::PowerOff | SemanticEvent::PowerStandby => {
                inner.snapshot.power = PowerState::Off;
                StateChange::Power(PowerState::Off)
            }
            SemanticEvent::InputSwitched(port) => {
                inner.snapshot.input = Some(port);
                StateChange::Input(port)
            }
        }
    }

    fn notify(&self, change: StateChange) {
        match change {
            StateChange::Power(power) => info!(%power, "CEC: TV power changed"),
            StateChange::Input(port) => info!("CEC: Input switched to HDMI{}", port),
        }

        for listener in self.listeners.read().iter() {
            listener(change);
        }
    }

    /// Register a listener for state changes, returning its index
    pub fn subscribe(&self, listener: StateListener) -> usize {
        let mut listeners = self.listeners.write();
        listeners.push(listener);
        let id = listeners.len() - 1;
        debug!(subscriber_id = id, "Added state listener");
        id
    }

    pub fn power(&self) -> PowerState {
        self.inner.lock().snapshot.power
    }

    pub fn active_input(&self) -> Option<u8> {
        self.inner.lock().snapshot.input
    }

    pub fn snapshot(&self) -> TvSnapshot {
        self.inner.lock().snapshot
    }

    /// Retune the debounce window (config reload)
    pub fn set_debounce_window(&self, window: Duration) {
        self.inner.lock().debounce.set_window(window);
    }

    /// Sender used for outbound commands
    pub fn commands(&self) -> &CommandSender {
        &self.commands
    }
}
