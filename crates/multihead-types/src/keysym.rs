//! Symbolic key identities and hardware scan-codes.

use serde::{Deserialize, Serialize};

/// A symbolic key identity, numbered like X11 keysyms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySym(pub u32);

impl KeySym {
    /// No symbol is bound.
    pub const NONE: Self = Self(0);

    pub const BACKSPACE: Self = Self(0xff08);
    pub const DELETE: Self = Self(0xffff);
    pub const KP_DELETE: Self = Self(0xff9f);

    pub const F1: Self = Self(0xffbe);
    pub const F10: Self = Self(0xffc7);
    pub const F11: Self = Self(0xffc8);
    pub const F12: Self = Self(0xffc9);

    pub const CONTROL_L: Self = Self(0xffe3);
    pub const CONTROL_R: Self = Self(0xffe4);
    pub const ALT_L: Self = Self(0xffe9);
    pub const ALT_R: Self = Self(0xffea);

    pub const LOWER_F: Self = Self(0x0066);
    pub const LOWER_G: Self = Self(0x0067);
    pub const LOWER_Q: Self = Self(0x0071);

    #[must_use]
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    /// Virtual terminal number (1-based) for F1..F12, if this is one.
    #[must_use]
    pub fn function_key_number(self) -> Option<u8> {
        if (Self::F1.0..=Self::F12.0).contains(&self.0) {
            u8::try_from(self.0 - Self::F1.0 + 1).ok()
        } else {
            None
        }
    }
}

impl std::fmt::Display for KeySym {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:04x}", self.0)
    }
}

/// A device scan-code (X keycode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanCode(pub u32);

impl std::fmt::Display for ScanCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
