//! Power status poll scheduler
//!
//! The bus can stay silent for long periods, and frames can be missed. A
//! periodic power query makes the TV report its state again; the answer
//! flows through the normal reader pipeline, debounce included.

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::adapter::CommandSender;
use crate::cec::CecCommand;
use crate::error::CecResult;

/// Default delay between power status queries
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(2500);

/// Issue a power query every interval until the interval sender is dropped
///
/// The first query is sent one interval after start. A new interval
/// published on `interval_rx` restarts the cadence from that moment.
pub async fn run_poller(
    commands: CommandSender,
    mut interval_rx: watch::Receiver<Duration>,
) -> CecResult<()> {
    let mut period = sanitize(*interval_rx.borrow_and_update());
    let mut ticker = make_interval(period);

    debug!(interval_ms = period.as_millis() as u64, "Poll scheduler started");

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                trace!("Polling TV power status");
                commands.send(CecCommand::PowerQuery)?;
            }
            changed = interval_rx.changed() => {
                if changed.is_err() {
                    debug!("Poll scheduler stopped");
                    return Ok(());
                }
                let next = sanitize(*interval_rx.borrow_and_update());
                if next != period {
                    info!(interval_ms = next.as_millis() as u64, "Poll interval changed");
                    period = next;
                    ticker = make_interval(period);
                }
            }
        }
    }
}

fn sanitize(period: Duration) -> Duration {
    if period.is_zero() {
        DEFAULT_POLL_INTERVAL
    } else {
        period
    }
}

fn make_interval(period: Duration) -> Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{command_channel, CommandReceiver};
    use crate::error::CecError;

    fn count_queries(rx: &mut CommandReceiver) -> usize {
        let mut count = 0;
        while let Ok(cmd) = rx.try_recv() {
            assert_eq!(cmd, CecCommand::PowerQuery);
            count += 1;
        }
        count
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_interval() {
        let (tx, mut rx) = command_channel();
        let (_interval_tx, interval_rx) = watch::channel(DEFAULT_POLL_INTERVAL);
        let poller = tokio::spawn(run_poller(tx, interval_rx));

        tokio::time::sleep(Duration::from_millis(2400)).await;
        assert_eq!(count_queries(&mut rx), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(count_queries(&mut rx), 1);

        tokio::time::sleep(Duration::from_millis(5000)).await;
        assert_eq!(count_queries(&mut rx), 2);

        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_interval_change_restarts_cadence() {
        let (tx, mut rx) = command_channel();
        let (interval_tx, interval_rx) = watch::channel(Duration::from_millis(1000));
        let poller = tokio::spawn(run_poller(tx, interval_rx));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(count_queries(&mut rx), 1);

        interval_tx.send(Duration::from_millis(200)).unwrap();
        tokio::time::sleep(Duration::from_millis(1050)).await;
        assert_eq!(count_queries(&mut rx), 5);

        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_uses_default() {
        let (tx, mut rx) = command_channel();
        let (_interval_tx, interval_rx) = watch::channel(Duration::ZERO);
        let poller = tokio::spawn(run_poller(tx, interval_rx));

        tokio::time::sleep(Duration::from_millis(2600)).await;
        assert_eq!(count_queries(&mut rx), 1);

        poller.abort();
    }

    #[tokio::test(start_paused = true)]
    async fn test_stops_when_interval_sender_dropped() {
        let (tx, _rx) = command_channel();
        let (interval_tx, interval_rx) = watch::channel(DEFAULT_POLL_INTERVAL);
        let poller = tokio::spawn(run_poller(tx, interval_rx));

        drop(interval_tx);
        assert!(poller.await.unwrap().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fails_when_adapter_closed() {
        let (tx, rx) = command_channel();
        let (_interval_tx, interval_rx) = watch::channel(DEFAULT_POLL_INTERVAL);
        drop(rx);

        let result = run_poller(tx, interval_rx).await;
        assert!(matches!(result, Err(CecError::AdapterClosed)));
    }
}
