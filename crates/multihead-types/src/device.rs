//! Device descriptor types.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Identity of a logical input device, as reported by its transport.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Encode, Decode,
)]
#[serde(transparent)]
pub struct DeviceId(pub u32);

impl std::fmt::Display for DeviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "dev{}", self.0)
    }
}

/// Index of an input group (one physical transport) in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub usize);

/// How a device's valuators report motion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValuatorMode {
    #[default]
    Relative,
    Absolute,
}

/// What a logical device stands in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceRole {
    /// Masquerades as the single canonical pointer/keyboard; motion is in
    /// the global coordinate space.
    Core,
    /// Reported in its own device-local space.
    Extension { mode: ValuatorMode },
}

impl DeviceRole {
    #[must_use]
    pub fn sends_core(self) -> bool {
        matches!(self, Self::Core)
    }
}

/// Kind of motion sample a driver hands over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MotionType {
    Relative,
    Absolute,
    /// Absolute, but the pointer may not leave the global canvas.
    AbsoluteConfined,
}

/// Per-device logical-to-physical button permutation (1-based).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonMap(Vec<u32>);

impl ButtonMap {
    /// Identity map for `count` buttons.
    #[must_use]
    pub fn identity(count: u32) -> Self {
        Self((1..=count).collect())
    }

    #[must_use]
    pub fn from_map(map: Vec<u32>) -> Self {
        Self(map)
    }

    /// Number of buttons the device declares.
    #[must_use]
    pub fn count(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }

    /// Map a physical button through the permutation.
    ///
    /// Returns `None` when the button exceeds the declared count. Button 0
    /// is not a real button and maps to itself.
    #[must_use]
    pub fn lookup(&self, button: u32) -> Option<u32> {
        if button > self.count() {
            return None;
        }
        if button == 0 {
            return Some(0);
        }
        self.0.get(usize::try_from(button - 1).ok()?).copied()
    }
}
