//! Input-event normalization core for multihead.
//!
//! Raw events from many transports, each bound to one of several displays,
//! are reconciled into one logical pointer and keyboard and re-emitted as
//! canonical events. The collaborators this core talks to are expressed as
//! traits: [`HostQueue`] (the window system's event queue), [`KeyboardState`]
//! (per-device keymaps and group state), [`DeviceBackend`] (the driver behind
//! a logical device) and [`RawEventSource`] (a per-transport producer).

use async_trait::async_trait;
use multihead_types::{CanonicalEvent, DeviceId, KeySym, ScanCode, SourceEvent};
use tokio::sync::mpsc;

pub mod cursor;
pub mod error;
pub mod extension;
pub mod forward;
pub mod functions;
pub mod keymap;
pub mod lock;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod motion;
pub mod registry;
pub mod signals;
pub mod special;
pub mod translate;

pub use cursor::GlobalCursor;
pub use error::InputError;
pub use forward::FrameForwarder;
pub use functions::DeviceFunction;
pub use keymap::{Keymap, StaticKeymaps};
pub use lock::{Block, InputLock};
pub use motion::{clamp_to_canvas, Boundary};
pub use registry::{DeviceRegistry, InputGroup, LogicalDevice};
pub use signals::ControlSignals;
pub use special::{ModifierTracker, SpecialKeyAction};
pub use translate::{Dispatch, EventTranslator, InputContext};

/// The host window system's input event queue.
///
/// Calls arrive from the single event-processing path; mutation of the
/// queue itself may additionally be serialized through an [`InputLock`]
/// shared with the host's own thread.
pub trait HostQueue: Send + 'static {
    /// Append a canonical event.
    fn queue(&mut self, event: CanonicalEvent);

    /// Index of the screen the host pointer is currently on.
    fn pointer_screen(&self) -> Option<usize>;

    /// Move the host pointer to `screen` at screen-local `(x, y)`.
    fn set_pointer_screen(&mut self, screen: usize, x: i32, y: i32);

    /// Drain events already sitting in the queue.
    fn flush(&mut self);

    /// Run the host's generic pending-input processing.
    fn process_input_events(&mut self);
}

/// Keyboard state machine of the host, queried per device.
pub trait KeyboardState: Send + 'static {
    /// Whether the device has a keyboard at all.
    fn has_keyboard(&self, device: DeviceId) -> bool;

    /// Active group (layout) for `code`, or `None` if there is none.
    fn effective_group(&self, device: DeviceId, code: ScanCode) -> Option<usize>;

    /// Symbol bound to `code` in `group`, first shift level.
    fn symbol(&self, device: DeviceId, code: ScanCode, group: usize) -> KeySym;

    /// Inclusive scan-code range covered by the device's map.
    fn code_range(&self, device: DeviceId) -> Option<(ScanCode, ScanCode)>;
}

/// Driver behind a logical device.
///
/// Both hooks are optional; a backend that ignores a function reports it as
/// unhandled.
pub trait DeviceBackend: Send + Sync {
    /// The global cursor moved; keep the backend's own cursor in step.
    fn update_position(&self, _x: i32, _y: i32) {}

    /// Perform an administrative function. Returns whether it was handled.
    fn apply_function(&self, _function: DeviceFunction) -> bool {
        false
    }
}

/// A per-transport producer of raw events.
///
/// Implementations read their transport on their own task and forward
/// everything through the channel; the translator runs on the receiving end.
#[async_trait]
pub trait RawEventSource: Send + 'static {
    /// Start producing, sending events to `tx`.
    async fn start(&mut self, tx: mpsc::Sender<SourceEvent>) -> Result<(), InputError>;

    /// Stop producing and release the transport.
    async fn shutdown(&mut self) -> Result<(), InputError>;
}
