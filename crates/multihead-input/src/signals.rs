//! Process-wide flags raised by the special-key interceptors.
//!
//! They are consumed by whatever handles shutdown and console switching.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

#[derive(Debug, Default)]
pub struct ControlSignals {
    terminate: AtomicBool,
    vt_switch: AtomicU8,
}

impl ControlSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_terminate(&self) {
        self.terminate.store(true, Ordering::SeqCst);
    }

    pub fn terminate_requested(&self) -> bool {
        self.terminate.load(Ordering::SeqCst)
    }

    pub fn request_vt_switch(&self, vt: u8) {
        self.vt_switch.store(vt, Ordering::SeqCst);
    }

    /// Take the pending VT switch, clearing it.
    pub fn take_vt_switch(&self) -> Option<u8> {
        match self.vt_switch.swap(0, Ordering::SeqCst) {
            0 => None,
            vt => Some(vt),
        }
    }

    pub fn pending_vt_switch(&self) -> Option<u8> {
        match self.vt_switch.load(Ordering::SeqCst) {
            0 => None,
            vt => Some(vt),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vt_switch_is_taken_once() {
        let signals = ControlSignals::new();
        assert_eq!(signals.take_vt_switch(), None);
        signals.request_vt_switch(3);
        assert_eq!(signals.pending_vt_switch(), Some(3));
        assert_eq!(signals.take_vt_switch(), Some(3));
        assert_eq!(signals.take_vt_switch(), None);
    }

    #[test]
    fn terminate_latches() {
        let signals = ControlSignals::new();
        assert!(!signals.terminate_requested());
        signals.request_terminate();
        assert!(signals.terminate_requested());
    }
}
