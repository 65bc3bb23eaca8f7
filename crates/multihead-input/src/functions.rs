//! Administrative functions broadcast to device backends.

use tracing::debug;

use crate::registry::InputGroup;

/// An administrative action a backend may implement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceFunction {
    /// Toggle the backend's input grab.
    Grab,
    /// Toggle fine-grained motion.
    Fine,
    /// Shut the backend down.
    Terminate,
}

/// Send `function` to every backend bound in `group`.
///
/// Returns how many backends handled it.
pub fn apply_functions(group: &InputGroup, function: DeviceFunction) -> usize {
    let handled = group
        .bindings()
        .filter_map(|device| device.backend())
        .filter(|backend| backend.apply_function(function))
        .count();
    debug!(group = %group.name, ?function, handled, "applied device function");
    handled
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use multihead_types::{DeviceId, DeviceRole};

    use super::*;
    use crate::mock::MockBackend;
    use crate::registry::LogicalDevice;

    #[test]
    fn counts_handling_backends_once_per_binding() {
        let handles = MockBackend::new(true);
        let refuses = MockBackend::new(false);
        let group = InputGroup::new("backend")
            .with_device(
                LogicalDevice::new(DeviceId(1), "kbd", DeviceRole::Core)
                    .with_binding(2)
                    .with_backend(Arc::new(handles.clone())),
            )
            .with_device(
                LogicalDevice::new(DeviceId(2), "mouse", DeviceRole::Core)
                    .with_backend(Arc::new(handles.clone())),
            )
            .with_device(
                LogicalDevice::new(DeviceId(3), "console", DeviceRole::Core)
                    .with_backend(Arc::new(refuses.clone())),
            )
            .with_device(LogicalDevice::new(DeviceId(4), "bare", DeviceRole::Core));

        assert_eq!(apply_functions(&group, DeviceFunction::Grab), 1);
        assert_eq!(handles.functions(), vec![DeviceFunction::Grab]);
        assert_eq!(refuses.functions(), vec![DeviceFunction::Grab]);
    }
}
