//! Translation between symbolic key identity and scan-codes.
//!
//! Several physical keyboards can emulate the one core keyboard. Their
//! scan-codes are rewritten into the canonical keyboard's code space by
//! going through the symbol each key produces.

use std::collections::HashMap;

use multihead_types::{DeviceId, KeySym, ScanCode};
use tracing::{debug, warn};

use crate::KeyboardState;

/// Resolve the symbol `code` produces on `device` in its active group.
///
/// Returns [`KeySym::NONE`] when the device has no keyboard or no active
/// group.
pub fn code_to_symbol<K>(keyboard: &K, device: DeviceId, code: ScanCode) -> KeySym
where
    K: KeyboardState + ?Sized,
{
    if !keyboard.has_keyboard(device) {
        return KeySym::NONE;
    }
    let Some(group) = keyboard.effective_group(device, code) else {
        return KeySym::NONE;
    };
    let keysym = keyboard.symbol(device, code, group);
    debug!(%device, %code, %keysym, "translated scan-code to symbol");
    keysym
}

/// Find the scan-code producing `symbol` on the canonical keyboard.
///
/// `preferred` is tried first since layouts are usually near-identical.
/// Returns `ScanCode(0)` when nothing in range maps to the symbol.
pub fn symbol_to_code<K>(
    keyboard: &K,
    canonical: DeviceId,
    symbol: KeySym,
    preferred: ScanCode,
) -> ScanCode
where
    K: KeyboardState + ?Sized,
{
    let Some((min, max)) = keyboard.code_range(canonical) else {
        return ScanCode(0);
    };

    if (min..=max).contains(&preferred) && keyboard.symbol(canonical, preferred, 0) == symbol {
        return preferred;
    }

    match (min.0..=max.0)
        .map(ScanCode)
        .find(|code| keyboard.symbol(canonical, *code, 0) == symbol)
    {
        Some(code) => {
            debug!(%symbol, %code, "translated symbol to canonical scan-code");
            code
        }
        None => ScanCode(0),
    }
}

/// Rewrite `code` from `device` into the canonical keyboard's code space.
///
/// Anything that cannot be resolved passes the original code through.
pub fn fixup<K>(
    keyboard: &K,
    device: DeviceId,
    canonical: DeviceId,
    code: ScanCode,
    keysym: Option<KeySym>,
) -> ScanCode
where
    K: KeyboardState + ?Sized,
{
    if !keyboard.has_keyboard(device) {
        warn!(%device, "key fixup requested for a device without a keyboard");
        return code;
    }
    let keysym = keysym
        .filter(|k| !k.is_none())
        .unwrap_or_else(|| code_to_symbol(keyboard, device, code));
    if keysym.is_none() {
        return code;
    }
    match symbol_to_code(keyboard, canonical, keysym, code) {
        ScanCode(0) => code,
        mapped => mapped,
    }
}

/// A fixed keymap: one symbol per code per group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap {
    pub min_code: ScanCode,
    /// Symbols per group, indexed by `code - min_code`.
    pub groups: Vec<Vec<KeySym>>,
    pub active_group: usize,
}

impl Keymap {
    /// Single-group keymap.
    pub fn new(min_code: ScanCode, symbols: Vec<KeySym>) -> Self {
        Self {
            min_code,
            groups: vec![symbols],
            active_group: 0,
        }
    }

    fn width(&self) -> u32 {
        let width = self.groups.iter().map(Vec::len).max().unwrap_or(0);
        u32::try_from(width).unwrap_or(u32::MAX)
    }

    fn max_code(&self) -> Option<ScanCode> {
        let last = self.width().checked_sub(1)?;
        self.min_code.0.checked_add(last).map(ScanCode)
    }

    fn index(&self, code: ScanCode) -> Option<usize> {
        let offset = code.0.checked_sub(self.min_code.0)?;
        usize::try_from(offset).ok()
    }
}

/// [`KeyboardState`] over fixed per-device keymaps.
#[derive(Debug, Clone, Default)]
pub struct StaticKeymaps {
    maps: HashMap<DeviceId, Keymap>,
}

impl StaticKeymaps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, device: DeviceId, keymap: Keymap) {
        self.maps.insert(device, keymap);
    }

    #[must_use]
    pub fn with(mut self, device: DeviceId, keymap: Keymap) -> Self {
        self.insert(device, keymap);
        self
    }

    /// Change the active group of a device, as a group-latch key would.
    pub fn set_active_group(&mut self, device: DeviceId, group: usize) {
        if let Some(map) = self.maps.get_mut(&device) {
            map.active_group = group;
        }
    }
}

impl KeyboardState for StaticKeymaps {
    fn has_keyboard(&self, device: DeviceId) -> bool {
        self.maps.contains_key(&device)
    }

    fn effective_group(&self, device: DeviceId, code: ScanCode) -> Option<usize> {
        let map = self.maps.get(&device)?;
        let max = map.max_code()?;
        if code < map.min_code || code > max || map.groups.is_empty() {
            return None;
        }
        // Out-of-range groups wrap.
        Some(map.active_group % map.groups.len())
    }

    fn symbol(&self, device: DeviceId, code: ScanCode, group: usize) -> KeySym {
        self.maps
            .get(&device)
            .and_then(|map| {
                let index = map.index(code)?;
                map.groups.get(group)?.get(index).copied()
            })
            .unwrap_or(KeySym::NONE)
    }

    fn code_range(&self, device: DeviceId) -> Option<(ScanCode, ScanCode)> {
        let map = self.maps.get(&device)?;
        Some((map.min_code, map.max_code()?))
    }
}
