//! Mock collaborators for testing.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use multihead_types::{CanonicalEvent, SourceEvent};
use tokio::sync::mpsc;

use crate::error::InputError;
use crate::functions::DeviceFunction;
use crate::lock::InputLock;
use crate::{DeviceBackend, HostQueue, RawEventSource};

// ---------------------------------------------------------------------------
// MockSource
// ---------------------------------------------------------------------------

/// Mock raw event source for testing.
///
/// Returns a `mpsc::Sender<SourceEvent>` that tests use to inject events.
/// When `start()` is called, it spawns a task that forwards injected events
/// to the daemon's source channel.
pub struct MockSource {
    feed_rx: Option<mpsc::Receiver<SourceEvent>>,
    shutdown: Arc<AtomicBool>,
}

impl MockSource {
    /// Create a new mock source and a sender for injecting events.
    pub fn new() -> (Self, mpsc::Sender<SourceEvent>) {
        let (feed_tx, feed_rx) = mpsc::channel(1024);
        let source = Self {
            feed_rx: Some(feed_rx),
            shutdown: Arc::new(AtomicBool::new(false)),
        };
        (source, feed_tx)
    }

    /// Check if `shutdown()` was called.
    pub fn was_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RawEventSource for MockSource {
    async fn start(&mut self, tx: mpsc::Sender<SourceEvent>) -> Result<(), InputError> {
        let mut feed_rx = self
            .feed_rx
            .take()
            .ok_or_else(|| InputError::Other(anyhow::anyhow!("MockSource already started")))?;
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            while let Some(event) = feed_rx.recv().await {
                if shutdown.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(())
    }

    async fn shutdown(&mut self) -> Result<(), InputError> {
        self.shutdown.store(true, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockHost
// ---------------------------------------------------------------------------

/// One call made on the host queue, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Queue(CanonicalEvent),
    Flush,
    SetPointerScreen { screen: usize, x: i32, y: i32 },
    ProcessInputEvents,
}

/// Shared state for observing what `MockHost` did.
#[derive(Debug, Default)]
struct MockHostState {
    calls: Vec<HostCall>,
    pointer_screen: Option<usize>,
    lock: Option<InputLock>,
    queued_under_lock: Vec<bool>,
}

/// Mock host event queue for testing.
pub struct MockHost {
    state: Arc<Mutex<MockHostState>>,
}

impl MockHost {
    /// Create a new mock host and a handle for observing it.
    pub fn new() -> (Self, MockHostHandle) {
        let state = Arc::new(Mutex::new(MockHostState::default()));
        let handle = MockHostHandle {
            state: Arc::clone(&state),
        };
        (Self { state }, handle)
    }
}

impl HostQueue for MockHost {
    fn queue(&mut self, event: CanonicalEvent) {
        let mut state = self.state.lock().unwrap();
        let locked = state.lock.as_ref().is_some_and(InputLock::is_held);
        state.queued_under_lock.push(locked);
        state.calls.push(HostCall::Queue(event));
    }

    fn pointer_screen(&self) -> Option<usize> {
        self.state.lock().unwrap().pointer_screen
    }

    fn set_pointer_screen(&mut self, screen: usize, x: i32, y: i32) {
        let mut state = self.state.lock().unwrap();
        state.pointer_screen = Some(screen);
        state.calls.push(HostCall::SetPointerScreen { screen, x, y });
    }

    fn flush(&mut self) {
        self.state.lock().unwrap().calls.push(HostCall::Flush);
    }

    fn process_input_events(&mut self) {
        self.state
            .lock()
            .unwrap()
            .calls
            .push(HostCall::ProcessInputEvents);
    }
}

/// Clonable observer handle for `MockHost`.
#[derive(Clone)]
pub struct MockHostHandle {
    state: Arc<Mutex<MockHostState>>,
}

impl MockHostHandle {
    /// Every call made on the host, in order.
    pub fn calls(&self) -> Vec<HostCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Only the queued events.
    pub fn events(&self) -> Vec<CanonicalEvent> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                HostCall::Queue(event) => Some(event.clone()),
                _ => None,
            })
            .collect()
    }

    /// Place the host pointer without recording a call.
    pub fn set_pointer_screen(&self, screen: Option<usize>) {
        self.state.lock().unwrap().pointer_screen = screen;
    }

    pub fn pointer_screen(&self) -> Option<usize> {
        self.state.lock().unwrap().pointer_screen
    }

    /// Record, for every queued event, whether `lock` was held.
    pub fn watch_lock(&self, lock: InputLock) {
        self.state.lock().unwrap().lock = Some(lock);
    }

    pub fn queued_under_lock(&self) -> Vec<bool> {
        self.state.lock().unwrap().queued_under_lock.clone()
    }
}

// ---------------------------------------------------------------------------
// MockBackend
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct MockBackendState {
    positions: Vec<(i32, i32)>,
    functions: Vec<DeviceFunction>,
}

/// Mock device backend. Clones share state.
#[derive(Debug, Clone)]
pub struct MockBackend {
    handles_functions: bool,
    state: Arc<Mutex<MockBackendState>>,
}

impl MockBackend {
    /// `handles_functions` decides what `apply_function` reports.
    pub fn new(handles_functions: bool) -> Self {
        Self {
            handles_functions,
            state: Arc::new(Mutex::new(MockBackendState::default())),
        }
    }

    /// Positions pushed by the translator.
    pub fn positions(&self) -> Vec<(i32, i32)> {
        self.state.lock().unwrap().positions.clone()
    }

    /// Functions requested, handled or not.
    pub fn functions(&self) -> Vec<DeviceFunction> {
        self.state.lock().unwrap().functions.clone()
    }
}

impl DeviceBackend for MockBackend {
    fn update_position(&self, x: i32, y: i32) {
        self.state.lock().unwrap().positions.push((x, y));
    }

    fn apply_function(&self, function: DeviceFunction) -> bool {
        self.state.lock().unwrap().functions.push(function);
        self.handles_functions
    }
}
