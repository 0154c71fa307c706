//! Session tests against a simulated cec-client over in-memory pipes

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

use cec_tv_gw::{CecSession, PowerState, SessionTiming, StateChange};

struct FakeAdapter {
    output: DuplexStream,
    input: Lines<BufReader<DuplexStream>>,
}

fn start(timing: SessionTiming) -> (CecSession, FakeAdapter, Arc<Mutex<Vec<StateChange>>>) {
    let (output, our_in) = tokio::io::duplex(1024);
    let (our_out, input) = tokio::io::duplex(1024);
    let session = CecSession::start(our_in, our_out, timing);

    let changes = Arc::new(Mutex::new(Vec::new()));
    let sink = changes.clone();
    session
        .machine()
        .subscribe(Arc::new(move |change| sink.lock().push(change)));

    let adapter = FakeAdapter {
        output,
        input: BufReader::new(input).lines(),
    };
    (session, adapter, changes)
}

fn no_polling() -> SessionTiming {
    SessionTiming {
        poll_interval: Duration::from_secs(3600),
        ..SessionTiming::default()
    }
}

#[tokio::test]
async fn power_on_frame_updates_state_once() {
    let (mut session, mut adapter, changes) = start(no_polling());

    adapter.output.write_all(b">> 01:90:00\n").await.unwrap();
    drop(adapter.output);
    session.wait().await.unwrap();

    let machine = session.machine();
    assert_eq!(machine.power(), PowerState::On);
    assert_eq!(*changes.lock(), vec![StateChange::Power(PowerState::On)]);
}

#[tokio::test]
async fn routing_change_sets_active_input() {
    let (mut session, mut adapter, changes) = start(no_polling());

    adapter
        .output
        .write_all(b"TRAFFIC: [ 1234] >> 0f:80:10:00:20:00\n")
        .await
        .unwrap();
    drop(adapter.output);
    session.wait().await.unwrap();

    assert_eq!(session.machine().active_input(), Some(2));
    assert_eq!(session.machine().power(), PowerState::Unknown);
    assert_eq!(*changes.lock(), vec![StateChange::Input(2)]);
}

#[tokio::test]
async fn echoed_power_frames_are_debounced() {
    let (mut session, mut adapter, changes) = start(no_polling());

    adapter.output.write_all(b">> 01:90:00\n").await.unwrap();
    adapter.output.write_all(b">> 01:90:00\n").await.unwrap();
    adapter.output.write_all(b">> 0f:36\n").await.unwrap();
    drop(adapter.output);
    session.wait().await.unwrap();

    assert_eq!(session.machine().power(), PowerState::On);
    assert_eq!(changes.lock().len(), 1);
}

#[tokio::test]
async fn input_changes_bypass_debounce() {
    let (mut session, mut adapter, changes) = start(no_polling());

    adapter
        .output
        .write_all(b">> 01:90:00 >> 0f:86:30:00 >> 0f:86:10:00\n")
        .await
        .unwrap();
    drop(adapter.output);
    session.wait().await.unwrap();

    assert_eq!(session.machine().active_input(), Some(1));
    assert_eq!(
        *changes.lock(),
        vec![
            StateChange::Power(PowerState::On),
            StateChange::Input(3),
            StateChange::Input(1),
        ]
    );
}

#[tokio::test]
async fn osd_name_request_is_answered() {
    let (session, mut adapter, changes) = start(no_polling());

    adapter.output.write_all(b"<< 10:47:43:45:43\n").await.unwrap();

    let reply = adapter.input.next_line().await.unwrap().unwrap();
    assert_eq!(reply, "tx 10:47:52:50:69");
    assert!(changes.lock().is_empty());

    drop(adapter.output);
    session.shutdown().await.unwrap();
    assert_eq!(adapter.input.next_line().await.unwrap(), None);
}

#[tokio::test]
async fn set_power_is_optimistic() {
    let (session, mut adapter, _changes) = start(no_polling());
    let machine = session.machine();

    machine.set_power(true).unwrap();
    assert_eq!(
        adapter.input.next_line().await.unwrap().unwrap(),
        "tx 01:90:00"
    );

    adapter.output.write_all(b">> 01:90:00\n").await.unwrap();
    while machine.power() != PowerState::On {
        tokio::task::yield_now().await;
    }

    // Already on: nothing is sent
    machine.set_power(true).unwrap();
    machine.set_power(false).unwrap();
    assert_eq!(
        adapter.input.next_line().await.unwrap().unwrap(),
        "tx 01:90:01"
    );

    drop(adapter.output);
    session.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn poller_queries_power_status() {
    let (session, mut adapter, _changes) = start(SessionTiming {
        poll_interval: Duration::from_millis(2500),
        ..SessionTiming::default()
    });

    assert_eq!(adapter.input.next_line().await.unwrap().unwrap(), "tx 10:8f");
    assert_eq!(adapter.input.next_line().await.unwrap().unwrap(), "tx 10:8f");

    drop(adapter.output);
    session.shutdown().await.unwrap();
}
