//! Console collaborators for replaying scripted input.

use multihead_input::{DeviceBackend, DeviceFunction, HostQueue};
use multihead_types::{CanonicalEvent, SourceEvent};
use serde::Deserialize;
use tracing::info;

/// Host queue that prints every call to stdout.
#[derive(Debug, Default)]
pub struct ConsoleHost {
    pointer_screen: Option<usize>,
    queued: usize,
}

impl ConsoleHost {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HostQueue for ConsoleHost {
    fn queue(&mut self, event: CanonicalEvent) {
        self.queued += 1;
        println!("queue #{:<4} {event:?}", self.queued);
    }

    fn pointer_screen(&self) -> Option<usize> {
        self.pointer_screen
    }

    fn set_pointer_screen(&mut self, screen: usize, x: i32, y: i32) {
        println!("screen     -> {screen} at ({x}, {y})");
        self.pointer_screen = Some(screen);
    }

    fn flush(&mut self) {
        println!("flush");
    }

    fn process_input_events(&mut self) {
        println!("process pending input (off-canvas)");
    }
}

/// Backend that logs what it is asked to do and acknowledges everything.
#[derive(Debug)]
pub struct LogBackend {
    name: String,
}

impl LogBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl DeviceBackend for LogBackend {
    fn update_position(&self, x: i32, y: i32) {
        info!(backend = %self.name, x, y, "position update");
    }

    fn apply_function(&self, function: DeviceFunction) -> bool {
        info!(backend = %self.name, ?function, "device function");
        true
    }
}

/// A replay script: `[[events]]` tables, each a source event.
#[derive(Debug, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub events: Vec<SourceEvent>,
}
