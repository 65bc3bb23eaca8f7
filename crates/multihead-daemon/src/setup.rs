//! Config loading and construction of the input context from config.

use std::path::PathBuf;

use multihead_input::{
    DeviceRegistry, InputContext, InputGroup, Keymap, LogicalDevice, ModifierTracker,
    StaticKeymaps,
};
use multihead_types::{
    ButtonMap, DeviceRole, ExtTypeMap, ScanCode, ScreenDescriptor, ScreenLayout,
};
use tracing::{info, warn};

use crate::config::{Config, DeviceConfig, RoleConfig};
use crate::error::DaemonError;

/// Load configuration from the given path, or the default location.
pub fn load_config(path: Option<&str>) -> Result<Config, DaemonError> {
    let config_path = match path {
        Some(p) => PathBuf::from(p),
        None => default_config_path(),
    };

    if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| DaemonError::Config(format!("failed to read config: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DaemonError::Config(format!("failed to parse config: {e}")))?;
        info!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        info!("no config file found, using defaults");
        Ok(Config::default())
    }
}

/// Get the default config directory path.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("multihead")
}

/// Get the default config file path.
pub fn default_config_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Screen registry and global canvas.
pub fn build_layout(config: &Config) -> ScreenLayout {
    let screens: Vec<ScreenDescriptor> = config
        .screens
        .iter()
        .enumerate()
        .map(|(index, s)| ScreenDescriptor::new(index, s.origin_x, s.origin_y, s.width, s.height))
        .collect();
    if screens.is_empty() {
        warn!("no screens configured, all motion will be off-canvas");
    }
    match config.canvas {
        Some(canvas) => ScreenLayout::with_canvas(screens, canvas.width, canvas.height),
        None => ScreenLayout::new(screens),
    }
}

fn build_device(device: &DeviceConfig) -> LogicalDevice {
    let role = match device.role {
        RoleConfig::Core => DeviceRole::Core,
        RoleConfig::Extension => DeviceRole::Extension {
            mode: device.valuator_mode,
        },
    };
    LogicalDevice::new(device.id, device.name.clone(), role)
        .with_binding(device.binding)
        .with_buttons(ButtonMap::from_map(device.buttons.clone()))
}

/// Input groups and the canonical devices.
pub fn build_registry(config: &Config) -> Result<DeviceRegistry, DaemonError> {
    let mut registry = DeviceRegistry::new();
    for group in &config.groups {
        let mut input_group = InputGroup::new(group.name.clone());
        if let Some(base) = group.ext_event_base {
            input_group = input_group.with_ext_types(ExtTypeMap::from_base(base));
        }
        for device in &group.devices {
            input_group = input_group.with_device(build_device(device));
        }
        let id = registry.add_group(input_group)?;
        info!(group = %group.name, index = id.0, devices = group.devices.len(), "registered input group");
    }

    if let Some(id) = config.core_pointer {
        registry.set_core_pointer(id)?;
    }
    if let Some(id) = config.core_keyboard {
        registry.set_core_keyboard(id)?;
    }
    Ok(registry)
}

/// Per-device keymaps.
pub fn build_keymaps(config: &Config) -> StaticKeymaps {
    config
        .keymaps
        .iter()
        .fold(StaticKeymaps::new(), |maps, keymap| {
            maps.with(
                keymap.device,
                Keymap {
                    min_code: ScanCode(keymap.min_code),
                    groups: keymap.groups.clone(),
                    active_group: keymap.active_group,
                },
            )
        })
}

/// Everything the translator needs except its host.
pub fn build_context(config: &Config) -> Result<InputContext, DaemonError> {
    let [first, second] = config.hotkeys.modifiers;
    Ok(
        InputContext::new(build_layout(config), build_registry(config)?)
            .with_modifiers(ModifierTracker::new(first, second)),
    )
}
