//! Central dispatch from raw events to canonical events.

use std::sync::Arc;

use multihead_types::{
    ButtonState, CanonicalEvent, DeviceId, KeySym, Proximity, RawEvent, RawEventKind, ScanCode,
    ScreenLayout, SourceEvent, ValuatorMask, AXES_PER_RECORD,
};
use tracing::{debug, info, warn};

use crate::cursor::GlobalCursor;
use crate::keymap;
use crate::lock::{Block, InputLock};
use crate::registry::{DeviceRegistry, LogicalDevice};
use crate::signals::ControlSignals;
use crate::special::{ModifierTracker, SpecialKeyAction};
use crate::{HostQueue, KeyboardState};

/// State shared by every stage of the pipeline.
///
/// There is one per process; it is passed around explicitly so tests can
/// build isolated instances.
#[derive(Debug)]
pub struct InputContext {
    pub cursor: GlobalCursor,
    pub layout: ScreenLayout,
    pub registry: DeviceRegistry,
    pub modifiers: ModifierTracker,
    pub signals: Arc<ControlSignals>,
}

impl InputContext {
    pub fn new(layout: ScreenLayout, registry: DeviceRegistry) -> Self {
        Self {
            cursor: GlobalCursor::new(),
            layout,
            registry,
            modifiers: ModifierTracker::default(),
            signals: Arc::new(ControlSignals::new()),
        }
    }

    #[must_use]
    pub fn with_modifiers(mut self, modifiers: ModifierTracker) -> Self {
        self.modifiers = modifiers;
        self
    }

    #[must_use]
    pub fn with_signals(mut self, signals: Arc<ControlSignals>) -> Self {
        self.signals = signals;
        self
    }
}

/// What became of an event handed to the translator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// A canonical event was queued (or global state updated).
    Queued,
    /// A reserved key combination consumed it.
    Consumed,
    /// Deliberately not forwarded.
    Swallowed,
    /// No logical device matched.
    Discarded,
    /// Not understood; logged and dropped.
    Unhandled,
}

/// Owns the pipeline state and the host collaborators.
pub struct EventTranslator<H, K> {
    pub(crate) ctx: InputContext,
    pub(crate) host: H,
    pub(crate) keyboard: K,
    pub(crate) lock: InputLock,
}

impl<H: HostQueue, K: KeyboardState> EventTranslator<H, K> {
    pub fn new(ctx: InputContext, host: H, keyboard: K) -> Self {
        Self {
            ctx,
            host,
            keyboard,
            lock: InputLock::new(),
        }
    }

    /// Share the queue lock with the host's event thread.
    #[must_use]
    pub fn with_lock(mut self, lock: InputLock) -> Self {
        self.lock = lock;
        self
    }

    pub fn context(&self) -> &InputContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut InputContext {
        &mut self.ctx
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn keyboard(&self) -> &K {
        &self.keyboard
    }

    pub fn keyboard_mut(&mut self) -> &mut K {
        &mut self.keyboard
    }

    pub fn lock(&self) -> &InputLock {
        &self.lock
    }

    /// The pointer position in the global coordinate space.
    pub fn global_position(&self) -> (i32, i32) {
        self.ctx.cursor.read()
    }

    /// Force the next core motion through.
    pub fn invalidate_position(&mut self) {
        self.ctx.cursor.invalidate();
    }

    /// Route anything a transport produced.
    ///
    /// Key presses from core devices are offered to the special-key
    /// interceptor first, as a driver would.
    pub fn handle(&mut self, event: &SourceEvent, block: Block) -> Dispatch {
        match event {
            SourceEvent::Motion(sample) => self.motion(
                sample.device_id,
                &sample.values,
                sample.first_axis,
                sample.motion,
                block,
            ),
            SourceEvent::Event(raw) => {
                if matches!(raw.kind, RawEventKind::KeyPress { .. })
                    && self.special_keys(raw) != SpecialKeyAction::None
                {
                    return Dispatch::Consumed;
                }
                self.enqueue(raw, block)
            }
        }
    }

    /// Run the special-key interceptor for a key event.
    pub fn special_keys(&mut self, event: &RawEvent) -> SpecialKeyAction {
        let (RawEventKind::KeyPress { code } | RawEventKind::KeyRelease { code }) = event.kind else {
            return SpecialKeyAction::None;
        };
        let keysym = self.resolve_keysym(event.device_id, code, event.keysym);
        self.ctx.check_special_keys(event.device_id, keysym)
    }

    /// Translate one raw event and queue its canonical form.
    pub fn enqueue(&mut self, event: &RawEvent, block: Block) -> Dispatch {
        let Some(device) = self.ctx.registry.device(event.device_id) else {
            debug!(device = %event.device_id, kind = event.kind.name(), "no logical device, discarding");
            return Dispatch::Discarded;
        };
        let id = device.id;
        let sends_core = device.sends_core();
        debug!(device = %id, kind = event.kind.name(), "enqueueing");

        match &event.kind {
            RawEventKind::KeyPress { code } => {
                self.enqueue_key(id, sends_core, ButtonState::Pressed, *code, event.keysym, block)
            }
            RawEventKind::KeyRelease { code } => {
                self.enqueue_key(id, sends_core, ButtonState::Released, *code, event.keysym, block)
            }
            RawEventKind::ButtonPress { button } => {
                let button = button_mapping(device, *button);
                self.enqueue_button(id, ButtonState::Pressed, button, block)
            }
            RawEventKind::ButtonRelease { button } => {
                let button = button_mapping(device, *button);
                self.enqueue_button(id, ButtonState::Released, button, block)
            }
            RawEventKind::Motion { x, y, state } => {
                self.emit(
                    CanonicalEvent::Motion {
                        device: id,
                        screen: true,
                        valuators: ValuatorMask::new(0, vec![*x, *y, *state]),
                    },
                    block,
                );
                Dispatch::Queued
            }
            // The host synthesizes these itself, and mapping changes were
            // made by this layer.
            RawEventKind::EnterNotify
            | RawEventKind::LeaveNotify
            | RawEventKind::KeymapNotify
            | RawEventKind::MappingNotify => Dispatch::Swallowed,
            // Only the extension path carries proximity for other devices.
            RawEventKind::ProximityIn { .. } | RawEventKind::ProximityOut { .. } => {
                if sends_core {
                    return Dispatch::Swallowed;
                }
                debug!(device = %id, kind = event.kind.name(), "base-range proximity, not queued");
                Dispatch::Unhandled
            }
            RawEventKind::Extension(ext) => match self.translate_extension(id, ext, block) {
                Ok(dispatch) => dispatch,
                Err(e) => {
                    info!(device = %id, remote_type = ext.remote_type, error = %e, "unhandled extension event");
                    Dispatch::Unhandled
                }
            },
            RawEventKind::Other { code } => {
                info!(device = %id, code, "unhandled event");
                Dispatch::Unhandled
            }
        }
    }

    fn resolve_keysym(&self, device: DeviceId, code: ScanCode, keysym: Option<KeySym>) -> KeySym {
        keysym
            .filter(|k| !k.is_none())
            .unwrap_or_else(|| keymap::code_to_symbol(&self.keyboard, device, code))
    }

    fn enqueue_key(
        &mut self,
        device: DeviceId,
        sends_core: bool,
        state: ButtonState,
        code: ScanCode,
        keysym: Option<KeySym>,
        block: Block,
    ) -> Dispatch {
        let keysym = self.resolve_keysym(device, code, keysym);
        if self.ctx.check_function_keys(device, state, keysym) {
            return Dispatch::Consumed;
        }

        let code = match self.ctx.registry.core_keyboard() {
            Some(core) if sends_core && core != device => {
                keymap::fixup(&self.keyboard, device, core, code, Some(keysym))
            }
            _ => code,
        };
        self.emit(CanonicalEvent::Key { device, state, code }, block);
        Dispatch::Queued
    }

    fn enqueue_button(
        &mut self,
        device: DeviceId,
        state: ButtonState,
        button: u32,
        block: Block,
    ) -> Dispatch {
        self.emit(
            CanonicalEvent::Button {
                device,
                state,
                button,
                valuators: ValuatorMask::empty(),
            },
            block,
        );
        Dispatch::Queued
    }

    pub(crate) fn enqueue_proximity(
        &mut self,
        device: DeviceId,
        state: Proximity,
        first_axis: u8,
        axes: &[i32],
        block: Block,
    ) {
        let values = axes.iter().copied().take(AXES_PER_RECORD).collect();
        self.emit(
            CanonicalEvent::Proximity {
                device,
                state,
                valuators: ValuatorMask::new(first_axis, values),
            },
            block,
        );
    }

    /// Queue one event, under the input lock if asked.
    pub(crate) fn emit(&mut self, event: CanonicalEvent, block: Block) {
        let _guard = self.lock.acquire(block);
        self.host.queue(event);
    }
}

/// Map a button through the device's button map.
///
/// A button beyond the declared count indicates a driver defect; it is
/// logged and passed through unchanged.
pub fn button_mapping(device: &LogicalDevice, button: u32) -> u32 {
    device.buttons.lookup(button).unwrap_or_else(|| {
        warn!(
            device = %device.id,
            button,
            buttons = device.buttons.count(),
            "button pressed beyond declared button count"
        );
        button
    })
}
