//! Debounce coordinator for power transitions
//!
//! Every power command we send comes back as an echo on the bus. After a
//! transition is accepted, further power events are suppressed until the
//! quiet window has elapsed, regardless of their direction.

use std::time::Duration;

use tokio::time::Instant;

/// Default quiet window after an accepted power transition
pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(5000);

/// Single-slot window state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebounceWindow {
    Idle,
    Suppressing { expires_at: Instant },
}

/// Decides which power events reach the state machine
#[derive(Debug, Clone)]
pub struct DebounceCoordinator {
    window: Duration,
    state: DebounceWindow,
}

impl DebounceCoordinator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            state: DebounceWindow::Idle,
        }
    }

    /// Decide whether a power event observed at `now` is forwarded
    ///
    /// A forwarded event re-arms the window from `now`. Suppressed events
    /// leave the expiry untouched.
    pub fn admit(&mut self, now: Instant) -> bool {
        if let DebounceWindow::Suppressing { expires_at } = self.state {
            if now < expires_at {
                return false;
            }
        }

        self.state = DebounceWindow::Suppressing {
            expires_at: now + self.window,
        };
        true
    }

    /// Whether an event at `now` would be suppressed
    pub fn is_suppressing(&self, now: Instant) -> bool {
        matches!(self.state, DebounceWindow::Suppressing { expires_at } if now < expires_at)
    }

    pub fn state(&self) -> DebounceWindow {
        self.state
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the window length; an in-flight window keeps its expiry
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }
}

impl Default for DebounceCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_WINDOW)
    }
}
