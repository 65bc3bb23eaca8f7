//! Daemon configuration loaded from TOML.

use multihead_types::{DeviceId, KeySym, ValuatorMode};
use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Device standing in for the canonical pointer.
    #[serde(default)]
    pub core_pointer: Option<DeviceId>,
    /// Device standing in for the canonical keyboard.
    #[serde(default)]
    pub core_keyboard: Option<DeviceId>,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub hotkeys: HotkeyConfig,
    #[serde(default)]
    pub canvas: Option<CanvasConfig>,
    #[serde(default)]
    pub screens: Vec<ScreenConfig>,
    #[serde(default)]
    pub groups: Vec<GroupConfig>,
    #[serde(default)]
    pub keymaps: Vec<KeymapConfig>,
}

/// Runtime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Take the input lock around queue mutation.
    #[serde(default = "default_true")]
    pub blocking: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            channel_capacity: default_channel_capacity(),
            blocking: true,
        }
    }
}

/// The two modifiers that gate the reserved key combinations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HotkeyConfig {
    #[serde(default = "default_modifiers")]
    pub modifiers: [KeySym; 2],
}

impl Default for HotkeyConfig {
    fn default() -> Self {
        Self {
            modifiers: default_modifiers(),
        }
    }
}

/// Explicit global canvas size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasConfig {
    pub width: i32,
    pub height: i32,
}

/// One physical display. Its index is its position in the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenConfig {
    #[serde(default)]
    pub origin_x: i32,
    #[serde(default)]
    pub origin_y: i32,
    pub width: u32,
    pub height: u32,
}

/// Logical devices behind one transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub name: String,
    /// First remote event number of the input extension on this transport.
    #[serde(default)]
    pub ext_event_base: Option<u16>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleConfig {
    #[default]
    Core,
    Extension,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub id: DeviceId,
    pub name: String,
    #[serde(default)]
    pub role: RoleConfig,
    /// Only meaningful for extension devices.
    #[serde(default)]
    pub valuator_mode: ValuatorMode,
    /// Devices, starting with this one, that share a backend.
    #[serde(default = "default_binding")]
    pub binding: usize,
    /// Logical-to-physical button map, 1-based.
    #[serde(default = "default_buttons")]
    pub buttons: Vec<u32>,
}

/// A fixed keymap for one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeymapConfig {
    pub device: DeviceId,
    #[serde(default = "default_min_code")]
    pub min_code: u32,
    /// Symbols per group, group 0 first.
    #[serde(default)]
    pub groups: Vec<Vec<KeySym>>,
    #[serde(default)]
    pub active_group: usize,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_true() -> bool {
    true
}

fn default_modifiers() -> [KeySym; 2] {
    [KeySym::CONTROL_L, KeySym::ALT_L]
}

fn default_binding() -> usize {
    1
}

fn default_buttons() -> Vec<u32> {
    vec![1, 2, 3, 4, 5]
}

fn default_min_code() -> u32 {
    8
}
