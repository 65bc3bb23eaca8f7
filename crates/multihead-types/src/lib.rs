//! Shared types for multihead.
//!
//! This crate contains the types shared across the multihead workspace:
//! screen geometry and the global canvas, device descriptors, key symbols,
//! raw and canonical input events, and packed device-motion records.

pub mod device;
pub mod error;
pub mod event;
pub mod keysym;
pub mod screen;
pub mod wire;

pub use device::{ButtonMap, DeviceId, DeviceRole, GroupId, MotionType, ValuatorMode};
pub use error::WireError;
pub use event::{
    ButtonState, CanonicalEvent, ExtSubtype, ExtTypeMap, ExtensionEvent, MotionSample, Proximity,
    RawEvent, RawEventKind, SourceEvent, ValuatorMask,
};
pub use keysym::{KeySym, ScanCode};
pub use screen::{ScreenDescriptor, ScreenLayout};
pub use wire::{
    decode_frames, encode_frame, pack_valuators, MotionRecord, AXES_PER_RECORD, MAX_AXES,
};
