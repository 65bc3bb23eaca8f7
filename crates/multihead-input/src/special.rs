//! Reserved modifier+key combinations.
//!
//! Two interceptors share one [`ModifierTracker`]. The function-key
//! interceptor runs inside the translator for every key event and handles
//! grab, fine-motion and terminate. The special-key interceptor is consulted
//! by drivers of core keyboards before dispatch and handles VT switching
//! and termination.

use multihead_types::{ButtonState, DeviceId, KeySym};
use tracing::info;

use crate::functions::{apply_functions, DeviceFunction};
use crate::translate::InputContext;

/// Tracks whether the two reserved modifiers are held.
///
/// This is kept independently of the host's modifier state so that a device
/// with inconsistent state cannot wedge the reserved combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierTracker {
    first: KeySym,
    second: KeySym,
    first_held: bool,
    second_held: bool,
}

impl Default for ModifierTracker {
    fn default() -> Self {
        Self::new(KeySym::CONTROL_L, KeySym::ALT_L)
    }
}

impl ModifierTracker {
    pub fn new(first: KeySym, second: KeySym) -> Self {
        Self {
            first,
            second,
            first_held: false,
            second_held: false,
        }
    }

    /// Record a key transition.
    pub fn observe(&mut self, state: ButtonState, keysym: KeySym) {
        let held = state == ButtonState::Pressed;
        if keysym == self.first {
            self.first_held = held;
        } else if keysym == self.second {
            self.second_held = held;
        }
    }

    pub fn both_held(&self) -> bool {
        self.first_held && self.second_held
    }
}

/// Outcome of the special-key interceptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialKeyAction {
    None,
    /// Switch to the given (1-based) virtual terminal.
    SwitchVt(u8),
    Terminate,
}

impl SpecialKeyAction {
    /// Driver-facing code: 0 for nothing, the VT number, or -1.
    pub fn code(self) -> i32 {
        match self {
            Self::None => 0,
            Self::SwitchVt(vt) => i32::from(vt),
            Self::Terminate => -1,
        }
    }
}

impl InputContext {
    /// Function-key interceptor. Returns whether the key was consumed.
    ///
    /// Only fires while both tracked modifiers are held. Releases are
    /// consumed but inert.
    pub fn check_function_keys(
        &mut self,
        device: DeviceId,
        state: ButtonState,
        keysym: KeySym,
    ) -> bool {
        self.modifiers.observe(state, keysym);
        if !self.modifiers.both_held() {
            return false;
        }

        let function = match keysym {
            KeySym::LOWER_G => DeviceFunction::Grab,
            KeySym::LOWER_F => DeviceFunction::Fine,
            KeySym::LOWER_Q => DeviceFunction::Terminate,
            _ => return false,
        };
        if state != ButtonState::Pressed {
            return true;
        }

        let Some(group) = self
            .registry
            .locate(device)
            .and_then(|id| self.registry.group(id))
        else {
            return true;
        };
        let sends_core = group.find(device).is_some_and(|d| d.sends_core());

        match function {
            DeviceFunction::Terminate => {
                if sends_core && apply_functions(group, function) > 0 {
                    info!(%device, "user request for termination");
                    self.signals.request_terminate();
                }
            }
            DeviceFunction::Grab | DeviceFunction::Fine => {
                apply_functions(group, function);
            }
        }
        true
    }

    /// Special-key interceptor for core devices.
    ///
    /// F1..F12 request a VT switch, recorded as pending on the device's
    /// group; q, BackSpace and Delete request termination.
    pub fn check_special_keys(&mut self, device: DeviceId, keysym: KeySym) -> SpecialKeyAction {
        let Some(group_id) = self.registry.locate(device) else {
            return SpecialKeyAction::None;
        };
        let sends_core = self
            .registry
            .device(device)
            .is_some_and(|d| d.sends_core());
        if !sends_core || !self.modifiers.both_held() {
            return SpecialKeyAction::None;
        }

        if let Some(vt) = keysym.function_key_number() {
            info!(%device, vt, "request to switch to VT");
            if let Some(group) = self.registry.group_mut(group_id) {
                group.vt_switch_pending = Some(vt);
            }
            self.signals.request_vt_switch(vt);
            return SpecialKeyAction::SwitchVt(vt);
        }

        match keysym {
            KeySym::LOWER_Q | KeySym::BACKSPACE | KeySym::DELETE | KeySym::KP_DELETE => {
                info!(%device, "user request for termination");
                self.signals.request_terminate();
                SpecialKeyAction::Terminate
            }
            _ => SpecialKeyAction::None,
        }
    }
}
