//! Input-extension event translation.
//!
//! A transport may multiplex several devices over one reporting device, so
//! the device named inside the payload is re-resolved within the reporting
//! device's group before anything is queued.

use multihead_types::{
    ButtonState, CanonicalEvent, DeviceId, ExtSubtype, ExtensionEvent, MotionType, Proximity,
    ScanCode, ValuatorMask, AXES_PER_RECORD,
};
use tracing::{debug, warn};

use crate::error::InputError;
use crate::lock::Block;
use crate::translate::{button_mapping, Dispatch, EventTranslator};
use crate::{HostQueue, KeyboardState};

impl<H: HostQueue, K: KeyboardState> EventTranslator<H, K> {
    pub(crate) fn translate_extension(
        &mut self,
        reported: DeviceId,
        ext: &ExtensionEvent,
        block: Block,
    ) -> Result<Dispatch, InputError> {
        let group = self
            .ctx
            .registry
            .locate(reported)
            .and_then(|id| self.ctx.registry.group(id))
            .ok_or(InputError::UnknownDevice(reported))?;
        let device = group
            .find(ext.device_id)
            .ok_or(InputError::UnknownDevice(ext.device_id))?;
        let subtype = group
            .ext_types
            .lookup(ext.remote_type)
            .ok_or(InputError::UnmappedExtension(ext.remote_type))?;
        let id = device.id;
        debug!(%reported, device = %id, ?subtype, "extension event");

        match subtype {
            ExtSubtype::DeviceKeyPress | ExtSubtype::DeviceKeyRelease => {
                let state = if subtype == ExtSubtype::DeviceKeyPress {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                self.emit(
                    CanonicalEvent::Key {
                        device: id,
                        state,
                        code: ScanCode(ext.detail),
                    },
                    block,
                );
            }
            ExtSubtype::DeviceButtonPress | ExtSubtype::DeviceButtonRelease => {
                let state = if subtype == ExtSubtype::DeviceButtonPress {
                    ButtonState::Pressed
                } else {
                    ButtonState::Released
                };
                let button = button_mapping(device, ext.detail);
                let axes = ext.axes.iter().copied().take(AXES_PER_RECORD).collect();
                let valuators = ValuatorMask::new(ext.first_axis, axes);
                self.emit(
                    CanonicalEvent::Button {
                        device: id,
                        state,
                        button,
                        valuators,
                    },
                    block,
                );
            }
            ExtSubtype::ProximityIn => {
                self.enqueue_proximity(id, Proximity::In, ext.first_axis, &ext.axes, block);
            }
            ExtSubtype::ProximityOut => {
                self.enqueue_proximity(id, Proximity::Out, ext.first_axis, &ext.axes, block);
            }
            ExtSubtype::DeviceMotionNotify => {
                self.ext_motion(id, &ext.axes, ext.first_axis, MotionType::Absolute, block);
            }
            ExtSubtype::DeviceFocusIn
            | ExtSubtype::DeviceFocusOut
            | ExtSubtype::DeviceStateNotify
            | ExtSubtype::DeviceMappingNotify
            | ExtSubtype::ChangeDeviceNotify
            | ExtSubtype::DeviceKeystateNotify
            | ExtSubtype::DeviceButtonstateNotify => return Ok(Dispatch::Swallowed),
            ExtSubtype::DeviceValuator => {
                // Valuator continuations should have been folded into the
                // event they follow by the transport.
                warn!(device = %id, remote_type = ext.remote_type, "stray device valuator event");
                return Err(InputError::UnsupportedExtension {
                    remote_type: ext.remote_type,
                });
            }
        }
        Ok(Dispatch::Queued)
    }
}
