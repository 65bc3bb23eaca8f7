//! Logical devices, the input groups that share a transport, and the
//! registry of all groups.

use std::sync::Arc;

use multihead_types::{ButtonMap, DeviceId, DeviceRole, ExtTypeMap, GroupId};

use crate::error::InputError;
use crate::DeviceBackend;

/// One input endpoint exposed to the rest of the system.
pub struct LogicalDevice {
    pub id: DeviceId,
    pub name: String,
    pub role: DeviceRole,
    /// Number of logical devices, starting with this one, that share a
    /// backend. Iteration over bindings skips the rest.
    pub binding: usize,
    pub buttons: ButtonMap,
    /// Running absolute position for relative devices that report
    /// absolute samples.
    pub(crate) last_x: i32,
    pub(crate) last_y: i32,
    pub(crate) has_baseline: bool,
    backend: Option<Arc<dyn DeviceBackend>>,
}

impl std::fmt::Debug for LogicalDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogicalDevice")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("role", &self.role)
            .field("binding", &self.binding)
            .field("last", &(self.last_x, self.last_y))
            .field("backend", &self.backend.is_some())
            .finish_non_exhaustive()
    }
}

impl LogicalDevice {
    pub fn new(id: DeviceId, name: impl Into<String>, role: DeviceRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            binding: 1,
            buttons: ButtonMap::default(),
            last_x: 0,
            last_y: 0,
            has_baseline: false,
            backend: None,
        }
    }

    #[must_use]
    pub fn with_binding(mut self, binding: usize) -> Self {
        self.binding = binding;
        self
    }

    #[must_use]
    pub fn with_buttons(mut self, buttons: ButtonMap) -> Self {
        self.buttons = buttons;
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: Arc<dyn DeviceBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn set_backend(&mut self, backend: Arc<dyn DeviceBackend>) {
        self.backend = Some(backend);
    }

    pub fn backend(&self) -> Option<&Arc<dyn DeviceBackend>> {
        self.backend.as_ref()
    }

    pub fn sends_core(&self) -> bool {
        self.role.sends_core()
    }

    /// Running absolute position used to synthesize relative deltas.
    pub fn last_position(&self) -> (i32, i32) {
        (self.last_x, self.last_y)
    }
}

/// Logical devices sharing one physical transport.
#[derive(Debug, Default)]
pub struct InputGroup {
    pub name: String,
    devices: Vec<LogicalDevice>,
    pub detached: bool,
    /// VT the user asked to switch to from this group.
    pub vt_switch_pending: Option<u8>,
    /// Remote extension event numbering of this transport.
    pub ext_types: ExtTypeMap,
}

impl InputGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_device(mut self, device: LogicalDevice) -> Self {
        self.devices.push(device);
        self
    }

    #[must_use]
    pub fn with_ext_types(mut self, ext_types: ExtTypeMap) -> Self {
        self.ext_types = ext_types;
        self
    }

    pub fn devices(&self) -> &[LogicalDevice] {
        &self.devices
    }

    pub fn find(&self, id: DeviceId) -> Option<&LogicalDevice> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn find_mut(&mut self, id: DeviceId) -> Option<&mut LogicalDevice> {
        self.devices.iter_mut().find(|d| d.id == id)
    }

    /// One device per backend: the first of each binding.
    pub fn bindings(&self) -> Bindings<'_> {
        Bindings {
            devices: &self.devices,
            pos: 0,
        }
    }
}

/// Iterator over the first device of each binding in a group.
pub struct Bindings<'a> {
    devices: &'a [LogicalDevice],
    pos: usize,
}

impl<'a> Iterator for Bindings<'a> {
    type Item = &'a LogicalDevice;

    fn next(&mut self) -> Option<Self::Item> {
        let device = self.devices.get(self.pos)?;
        self.pos += device.binding.max(1);
        Some(device)
    }
}

/// All input groups plus the identities of the canonical devices.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    groups: Vec<InputGroup>,
    core_pointer: Option<DeviceId>,
    core_keyboard: Option<DeviceId>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group. Device ids must be unique across the registry.
    pub fn add_group(&mut self, group: InputGroup) -> Result<GroupId, InputError> {
        for device in group.devices() {
            if self.locate(device.id).is_some()
                || group.devices().iter().filter(|d| d.id == device.id).count() > 1
            {
                return Err(InputError::DuplicateDevice(device.id));
            }
        }
        self.groups.push(group);
        Ok(GroupId(self.groups.len() - 1))
    }

    pub fn groups(&self) -> &[InputGroup] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&InputGroup> {
        self.groups.get(id.0)
    }

    pub fn group_mut(&mut self, id: GroupId) -> Option<&mut InputGroup> {
        self.groups.get_mut(id.0)
    }

    /// Group holding the device.
    pub fn locate(&self, id: DeviceId) -> Option<GroupId> {
        self.groups
            .iter()
            .position(|g| g.find(id).is_some())
            .map(GroupId)
    }

    pub fn device(&self, id: DeviceId) -> Option<&LogicalDevice> {
        self.groups.iter().find_map(|g| g.find(id))
    }

    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut LogicalDevice> {
        self.groups.iter_mut().find_map(|g| g.find_mut(id))
    }

    pub fn set_core_pointer(&mut self, id: DeviceId) -> Result<(), InputError> {
        self.check_core(id)?;
        self.core_pointer = Some(id);
        Ok(())
    }

    pub fn set_core_keyboard(&mut self, id: DeviceId) -> Result<(), InputError> {
        self.check_core(id)?;
        self.core_keyboard = Some(id);
        Ok(())
    }

    pub fn core_pointer(&self) -> Option<DeviceId> {
        self.core_pointer
    }

    pub fn core_keyboard(&self) -> Option<DeviceId> {
        self.core_keyboard
    }

    fn check_core(&self, id: DeviceId) -> Result<(), InputError> {
        let device = self.device(id).ok_or(InputError::UnknownDevice(id))?;
        if device.sends_core() {
            Ok(())
        } else {
            Err(InputError::NotCore(id))
        }
    }

    /// Core-emulating bindings of every attached group.
    pub fn core_bindings(&self) -> impl Iterator<Item = &LogicalDevice> {
        self.groups
            .iter()
            .filter(|g| !g.detached)
            .flat_map(InputGroup::bindings)
            .filter(|d| d.sends_core())
    }
}

#[cfg(test)]
mod tests {
    use multihead_types::ValuatorMode;

    use super::*;

    fn ext() -> DeviceRole {
        DeviceRole::Extension {
            mode: ValuatorMode::Absolute,
        }
    }

    #[test]
    fn bindings_skip_multiplexed_devices() {
        let group = InputGroup::new("backend")
            .with_device(LogicalDevice::new(DeviceId(1), "kbd+mouse", DeviceRole::Core).with_binding(2))
            .with_device(LogicalDevice::new(DeviceId(2), "mouse half", DeviceRole::Core))
            .with_device(LogicalDevice::new(DeviceId(3), "tablet", ext()));

        let ids: Vec<DeviceId> = group.bindings().map(|d| d.id).collect();
        assert_eq!(ids, vec![DeviceId(1), DeviceId(3)]);
    }

    #[test]
    fn zero_binding_still_advances() {
        let group = InputGroup::new("g")
            .with_device(LogicalDevice::new(DeviceId(1), "a", DeviceRole::Core).with_binding(0))
            .with_device(LogicalDevice::new(DeviceId(2), "b", DeviceRole::Core));
        assert_eq!(group.bindings().count(), 2);
    }

    #[test]
    fn duplicate_ids_rejected() {
        let mut registry = DeviceRegistry::new();
        registry
            .add_group(InputGroup::new("a").with_device(LogicalDevice::new(DeviceId(1), "x", ext())))
            .unwrap();
        let err = registry
            .add_group(InputGroup::new("b").with_device(LogicalDevice::new(DeviceId(1), "y", ext())))
            .unwrap_err();
        assert!(matches!(err, InputError::DuplicateDevice(DeviceId(1))));

        let err = registry
            .add_group(
                InputGroup::new("c")
                    .with_device(LogicalDevice::new(DeviceId(5), "p", ext()))
                    .with_device(LogicalDevice::new(DeviceId(5), "q", ext())),
            )
            .unwrap_err();
        assert!(matches!(err, InputError::DuplicateDevice(DeviceId(5))));
    }

    #[test]
    fn canonical_devices_must_be_core() {
        let mut registry = DeviceRegistry::new();
        registry
            .add_group(
                InputGroup::new("console")
                    .with_device(LogicalDevice::new(DeviceId(1), "kbd", DeviceRole::Core))
                    .with_device(LogicalDevice::new(DeviceId(2), "pen", ext())),
            )
            .unwrap();

        registry.set_core_keyboard(DeviceId(1)).unwrap();
        assert_eq!(registry.core_keyboard(), Some(DeviceId(1)));
        assert!(matches!(
            registry.set_core_pointer(DeviceId(2)),
            Err(InputError::NotCore(DeviceId(2)))
        ));
        assert!(matches!(
            registry.set_core_pointer(DeviceId(9)),
            Err(InputError::UnknownDevice(DeviceId(9)))
        ));
    }

    #[test]
    fn core_bindings_skip_detached_groups() {
        let mut registry = DeviceRegistry::new();
        registry
            .add_group(InputGroup::new("a").with_device(LogicalDevice::new(DeviceId(1), "a", DeviceRole::Core)))
            .unwrap();
        let b = registry
            .add_group(
                InputGroup::new("b")
                    .with_device(LogicalDevice::new(DeviceId(2), "b", DeviceRole::Core))
                    .with_device(LogicalDevice::new(DeviceId(3), "c", ext())),
            )
            .unwrap();

        let ids: Vec<DeviceId> = registry.core_bindings().map(|d| d.id).collect();
        assert_eq!(ids, vec![DeviceId(1), DeviceId(2)]);

        registry.group_mut(b).unwrap().detached = true;
        let ids: Vec<DeviceId> = registry.core_bindings().map(|d| d.id).collect();
        assert_eq!(ids, vec![DeviceId(1)]);
    }

    #[test]
    fn locate_finds_group() {
        let mut registry = DeviceRegistry::new();
        registry
            .add_group(InputGroup::new("a").with_device(LogicalDevice::new(DeviceId(1), "a", ext())))
            .unwrap();
        registry
            .add_group(InputGroup::new("b").with_device(LogicalDevice::new(DeviceId(7), "b", ext())))
            .unwrap();
        assert_eq!(registry.locate(DeviceId(7)), Some(GroupId(1)));
        assert_eq!(registry.locate(DeviceId(8)), None);
    }
}
