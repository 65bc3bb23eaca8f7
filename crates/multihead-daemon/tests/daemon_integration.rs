//! Integration tests exercising the full daemon event loop with mock
//! collaborators.

use std::sync::Arc;
use std::time::Duration;

use multihead_daemon::{Config, Daemon, DaemonError, DaemonEvent, DaemonStatus};
use multihead_input::mock::{HostCall, MockBackend, MockHost, MockHostHandle, MockSource};
use multihead_input::Dispatch;
use multihead_types::{
    ButtonState, CanonicalEvent, DeviceId, GroupId, MotionSample, MotionType, RawEvent,
    RawEventKind, ScanCode, SourceEvent,
};
use tokio::sync::{mpsc, watch};
use tracing_subscriber::EnvFilter;

const KEYBOARD: DeviceId = DeviceId(1);
const POINTER: DeviceId = DeviceId(2);
const STYLUS: DeviceId = DeviceId(3);
const REMOTE: DeviceId = DeviceId(4);

const CODE_A: u32 = 8;
const CODE_CTRL: u32 = 9;
const CODE_ALT: u32 = 10;
const CODE_Q: u32 = 11;
const CODE_F2: u32 = 12;

const CONFIG: &str = r#"
core_pointer = 2
core_keyboard = 1

[daemon]
log_level = "debug"

[[screens]]
width = 100
height = 100

[[screens]]
origin_x = 100
width = 100
height = 100

[[groups]]
name = "console"

[[groups.devices]]
id = 1
name = "keyboard"

[[groups.devices]]
id = 2
name = "mouse"

[[groups.devices]]
id = 3
name = "stylus"
role = "extension"
valuator_mode = "absolute"

[[groups]]
name = "remote"

[[groups.devices]]
id = 4
name = "remote pointer"

[[keymaps]]
device = 1
groups = [[0x61, 0xffe3, 0xffe9, 0x71, 0xffbf]]
"#;

/// Everything needed to drive one daemon.
#[allow(dead_code)]
struct Harness {
    feed: mpsc::Sender<SourceEvent>,
    events: mpsc::Sender<DaemonEvent>,
    status: watch::Receiver<DaemonStatus>,
    host: MockHostHandle,
    remote_backend: MockBackend,
    handle: tokio::task::JoinHandle<Result<(), DaemonError>>,
}

impl Harness {
    async fn feed(&self, event: SourceEvent) {
        self.feed.send(event).await.unwrap();
    }

    async fn key(&self, code: u32) {
        let event = RawEvent::new(
            KEYBOARD,
            RawEventKind::KeyPress {
                code: ScanCode(code),
            },
        );
        self.feed(SourceEvent::Event(event)).await;
    }

    async fn pointer_to(&self, device: DeviceId, values: Vec<i32>) {
        self.feed(SourceEvent::Motion(MotionSample {
            device_id: device,
            first_axis: 0,
            values,
            motion: MotionType::Absolute,
        }))
        .await;
    }

    async fn processed(&mut self, count: u64) -> DaemonStatus {
        wait_for_status(&mut self.status, Duration::from_secs(5), |s| {
            s.events_processed >= count
        })
        .await
        .expect("daemon should process events")
    }

    async fn shutdown(self) {
        let _ = self.events.send(DaemonEvent::Shutdown).await;
        let _ = tokio::time::timeout(Duration::from_secs(5), self.handle).await;
    }
}

fn start() -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();

    let config: Config = toml::from_str(CONFIG).unwrap();
    let (host, host_handle) = MockHost::new();
    let (source, feed) = MockSource::new();
    let remote_backend = MockBackend::new(true);

    let mut daemon = Daemon::new(&config, host).unwrap();
    daemon.add_source(Box::new(source));
    daemon
        .attach_backend(REMOTE, Arc::new(remote_backend.clone()))
        .unwrap();
    let status = daemon.status_receiver();
    let events = daemon.event_sender();

    let handle = tokio::spawn(async move { daemon.run().await });

    Harness {
        feed,
        events,
        status,
        host: host_handle,
        remote_backend,
        handle,
    }
}

/// Wait for a condition on a status receiver with timeout.
async fn wait_for_status(
    rx: &mut watch::Receiver<DaemonStatus>,
    timeout: Duration,
    pred: impl Fn(&DaemonStatus) -> bool,
) -> Result<DaemonStatus, &'static str> {
    tokio::time::timeout(timeout, async {
        loop {
            {
                let status = rx.borrow_and_update().clone();
                if pred(&status) {
                    return Ok(status);
                }
            }
            if rx.changed().await.is_err() {
                return Err("watch closed");
            }
        }
    })
    .await
    .map_err(|_| "timeout")?
}

#[tokio::test]
async fn test_motion_crosses_screens() {
    let mut h = start();

    h.pointer_to(POINTER, vec![150, 20]).await;
    let status = h.processed(1).await;

    assert_eq!(status.cursor, (150, 20));
    assert!(status.cursor_valid);
    assert_eq!(status.pointer_screen, Some(1));
    assert_eq!(
        h.host.calls(),
        vec![
            HostCall::Flush,
            HostCall::SetPointerScreen {
                screen: 1,
                x: 50,
                y: 20
            },
            HostCall::Queue(CanonicalEvent::Motion {
                device: POINTER,
                screen: true,
                valuators: multihead_types::ValuatorMask::new(0, vec![50, 20]),
            }),
        ]
    );
    assert_eq!(h.remote_backend.positions(), vec![(150, 20)]);

    h.shutdown().await;
}

#[tokio::test]
async fn test_keys_reach_host() {
    let mut h = start();

    h.key(CODE_A).await;
    let status = h.processed(1).await;

    assert_eq!(status.last_dispatch, Some(Dispatch::Queued));
    assert_eq!(
        h.host.events(),
        vec![CanonicalEvent::Key {
            device: KEYBOARD,
            state: ButtonState::Pressed,
            code: ScanCode(CODE_A),
        }]
    );

    h.shutdown().await;
}

#[tokio::test]
async fn test_vt_switch_is_reported() {
    let mut h = start();

    h.key(CODE_CTRL).await;
    h.key(CODE_ALT).await;
    h.key(CODE_F2).await;
    let status = h.processed(3).await;

    assert_eq!(status.vt_switch, Some(2));
    assert_eq!(status.last_dispatch, Some(Dispatch::Consumed));
    assert!(status.running);
    assert_eq!(h.host.events().len(), 2);

    h.shutdown().await;
}

#[tokio::test]
async fn test_terminate_stops_loop() {
    let mut h = start();

    h.key(CODE_CTRL).await;
    h.key(CODE_ALT).await;
    h.key(CODE_Q).await;

    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| !s.running && s.terminate_requested)
        .await
        .expect("daemon should stop on termination request");
    assert_eq!(status.events_processed, 3);

    let result = tokio::time::timeout(Duration::from_secs(5), h.handle)
        .await
        .expect("run should return")
        .unwrap();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_detached_group_misses_updates() {
    let mut h = start();

    h.pointer_to(POINTER, vec![10, 10]).await;
    h.processed(1).await;
    assert_eq!(h.remote_backend.positions(), vec![(10, 10)]);

    h.events.send(DaemonEvent::Detach(GroupId(1))).await.unwrap();
    h.pointer_to(POINTER, vec![20, 20]).await;
    let status = h.processed(2).await;
    assert_eq!(status.detached_groups, vec![GroupId(1)]);
    assert_eq!(h.remote_backend.positions(), vec![(10, 10)]);

    // Reattaching forces the unchanged position through again.
    h.events.send(DaemonEvent::Attach(GroupId(1))).await.unwrap();
    h.pointer_to(POINTER, vec![20, 20]).await;
    let status = h.processed(3).await;
    assert!(status.detached_groups.is_empty());
    assert_eq!(h.remote_backend.positions(), vec![(10, 10), (20, 20)]);

    h.shutdown().await;
}

#[tokio::test]
async fn test_extension_motion_is_packed() {
    let mut h = start();

    h.pointer_to(STYLUS, (0..8).collect()).await;
    h.processed(1).await;

    let events = h.host.events();
    let [CanonicalEvent::DeviceMotion { device, records }] = events.as_slice() else {
        panic!("expected one device motion, got {events:?}");
    };
    assert_eq!(*device, STYLUS);
    assert_eq!(records.iter().map(|r| r.count()).collect::<Vec<_>>(), vec![6, 2]);
    // Extension motion leaves the global cursor alone.
    assert!(!h.status.borrow().cursor_valid);

    h.shutdown().await;
}

#[tokio::test]
async fn test_unknown_device_is_discarded() {
    let mut h = start();

    h.pointer_to(DeviceId(99), vec![1, 1]).await;
    let status = h.processed(1).await;
    assert_eq!(status.last_dispatch, Some(Dispatch::Discarded));
    assert!(h.host.calls().is_empty());

    h.shutdown().await;
}

#[tokio::test]
async fn test_shutdown_event_stops_loop() {
    let mut h = start();
    wait_for_status(&mut h.status, Duration::from_secs(5), |s| s.running)
        .await
        .expect("daemon should start");

    h.events.send(DaemonEvent::Shutdown).await.unwrap();
    let status = wait_for_status(&mut h.status, Duration::from_secs(5), |s| !s.running)
        .await
        .expect("daemon should stop");
    assert!(!status.terminate_requested);
}
