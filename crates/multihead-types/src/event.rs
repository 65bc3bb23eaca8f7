//! Raw events coming in from transports and canonical events going out to
//! the host queue.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::device::{DeviceId, MotionType};
use crate::keysym::{KeySym, ScanCode};
use crate::wire::MotionRecord;

/// Press or release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ButtonState {
    Pressed,
    Released,
}

/// Proximity in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Proximity {
    In,
    Out,
}

/// A raw event as delivered by a transport.
///
/// `device_id` is the identity the transport reported, which for
/// multiplexed transports may be the first device on it rather than the
/// true origin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub device_id: DeviceId,
    /// Symbol already resolved by the driver, if any.
    #[serde(default)]
    pub keysym: Option<KeySym>,
    pub kind: RawEventKind,
}

impl RawEvent {
    #[must_use]
    pub fn new(device_id: DeviceId, kind: RawEventKind) -> Self {
        Self {
            device_id,
            keysym: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_keysym(mut self, keysym: KeySym) -> Self {
        self.keysym = Some(keysym);
        self
    }
}

/// Type tag and payload of a raw event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum RawEventKind {
    KeyPress {
        code: ScanCode,
    },
    KeyRelease {
        code: ScanCode,
    },
    ButtonPress {
        button: u32,
    },
    ButtonRelease {
        button: u32,
    },
    /// Absolute, screen-relative pointer motion with the modifier state.
    Motion {
        x: i32,
        y: i32,
        #[serde(default)]
        state: i32,
    },
    EnterNotify,
    LeaveNotify,
    KeymapNotify,
    MappingNotify,
    ProximityIn {
        #[serde(default)]
        first_axis: u8,
        #[serde(default)]
        axes: Vec<i32>,
    },
    ProximityOut {
        #[serde(default)]
        first_axis: u8,
        #[serde(default)]
        axes: Vec<i32>,
    },
    /// An event numbered beyond the base protocol range.
    Extension(ExtensionEvent),
    /// A base-range event this layer has no handling for.
    Other {
        code: u16,
    },
}

impl RawEventKind {
    /// Short name for log lines.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::KeyPress { .. } => "KeyPress",
            Self::KeyRelease { .. } => "KeyRelease",
            Self::ButtonPress { .. } => "ButtonPress",
            Self::ButtonRelease { .. } => "ButtonRelease",
            Self::Motion { .. } => "MotionNotify",
            Self::EnterNotify => "EnterNotify",
            Self::LeaveNotify => "LeaveNotify",
            Self::KeymapNotify => "KeymapNotify",
            Self::MappingNotify => "MappingNotify",
            Self::ProximityIn { .. } => "ProximityIn",
            Self::ProximityOut { .. } => "ProximityOut",
            Self::Extension(_) => "Extension",
            Self::Other { .. } => "Unknown",
        }
    }
}

/// Payload of an input-extension event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtensionEvent {
    /// Event number as assigned by the remote transport.
    pub remote_type: u16,
    /// Device the event really belongs to.
    pub device_id: DeviceId,
    /// Key code or button number.
    #[serde(default)]
    pub detail: u32,
    #[serde(default)]
    pub first_axis: u8,
    #[serde(default)]
    pub axes: Vec<i32>,
}

/// Input-extension event sub-types, in protocol numbering order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtSubtype {
    DeviceValuator,
    DeviceKeyPress,
    DeviceKeyRelease,
    DeviceButtonPress,
    DeviceButtonRelease,
    DeviceMotionNotify,
    DeviceFocusIn,
    DeviceFocusOut,
    ProximityIn,
    ProximityOut,
    DeviceStateNotify,
    DeviceMappingNotify,
    ChangeDeviceNotify,
    DeviceKeystateNotify,
    DeviceButtonstateNotify,
}

impl ExtSubtype {
    pub const ALL: [Self; 15] = [
        Self::DeviceValuator,
        Self::DeviceKeyPress,
        Self::DeviceKeyRelease,
        Self::DeviceButtonPress,
        Self::DeviceButtonRelease,
        Self::DeviceMotionNotify,
        Self::DeviceFocusIn,
        Self::DeviceFocusOut,
        Self::ProximityIn,
        Self::ProximityOut,
        Self::DeviceStateNotify,
        Self::DeviceMappingNotify,
        Self::ChangeDeviceNotify,
        Self::DeviceKeystateNotify,
        Self::DeviceButtonstateNotify,
    ];
}

/// Maps a transport's remote extension event numbers to sub-types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtTypeMap(HashMap<u16, ExtSubtype>);

impl ExtTypeMap {
    /// Sub-types numbered consecutively from `base`, as the extension
    /// assigns them.
    #[must_use]
    pub fn from_base(base: u16) -> Self {
        let map = ExtSubtype::ALL
            .iter()
            .zip(base..)
            .map(|(sub, code)| (code, *sub))
            .collect();
        Self(map)
    }

    pub fn insert(&mut self, remote_type: u16, subtype: ExtSubtype) {
        self.0.insert(remote_type, subtype);
    }

    #[must_use]
    pub fn lookup(&self, remote_type: u16) -> Option<ExtSubtype> {
        self.0.get(&remote_type).copied()
    }
}

/// A run of valuator values starting at `first`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuatorMask {
    pub first: u8,
    pub values: Vec<i32>,
}

impl ValuatorMask {
    #[must_use]
    pub fn new(first: u8, values: Vec<i32>) -> Self {
        Self { first, values }
    }

    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Canonical event handed to the host event queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanonicalEvent {
    Key {
        device: DeviceId,
        state: ButtonState,
        code: ScanCode,
    },
    Button {
        device: DeviceId,
        state: ButtonState,
        button: u32,
        valuators: ValuatorMask,
    },
    /// Absolute pointer motion. `screen` marks coordinates local to the
    /// active pointer screen.
    Motion {
        device: DeviceId,
        screen: bool,
        valuators: ValuatorMask,
    },
    /// Absolute, device-local motion packed into chained records.
    DeviceMotion {
        device: DeviceId,
        records: Vec<MotionRecord>,
    },
    Proximity {
        device: DeviceId,
        state: Proximity,
        valuators: ValuatorMask,
    },
}

/// Anything a per-transport producer can hand to the translator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source")]
pub enum SourceEvent {
    /// A discrete event for the event translator.
    Event(RawEvent),
    /// Valuator motion reported by a low-level driver.
    Motion(MotionSample),
}

/// A multi-axis motion sample from a driver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionSample {
    pub device_id: DeviceId,
    #[serde(default)]
    pub first_axis: u8,
    pub values: Vec<i32>,
    pub motion: MotionType,
}
