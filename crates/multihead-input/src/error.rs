//! Input subsystem errors.

use multihead_types::{DeviceId, WireError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("no logical device matches {0}")]
    UnknownDevice(DeviceId),

    #[error("device {0} registered twice")]
    DuplicateDevice(DeviceId),

    #[error("device {0} is not a core device")]
    NotCore(DeviceId),

    #[error("no extension mapping for remote event type {0}")]
    UnmappedExtension(u16),

    #[error("extension event (remote={remote_type}) not supported yet")]
    UnsupportedExtension { remote_type: u16 },

    #[error("frame encoding failed: {0}")]
    Wire(#[from] WireError),

    #[error("frame sink failed: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
