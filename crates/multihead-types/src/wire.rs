//! Device motion records and their framed wire encoding.
//!
//! A device-local motion of N axes is carried as a chain of records, each
//! holding at most [`AXES_PER_RECORD`] values. Every record except the last
//! is marked `more`, so a receiver knows to keep reading.
//!
//! Framed on the wire as:
//!   [4 bytes big-endian length][bincode v2 payload: Vec<MotionRecord>]

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::error::WireError;

/// Values carried by one record.
pub const AXES_PER_RECORD: usize = 6;

/// Axes beyond this are dropped.
pub const MAX_AXES: usize = 32;

/// Maximum frame payload. Prevents allocation bombs.
pub const MAX_FRAME_SIZE: u32 = 64 * 1024;

/// One chunk of a device motion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct MotionRecord {
    pub device_id: DeviceId,
    /// Axis number of `values[0]`.
    pub first_axis: u8,
    pub values: Vec<i32>,
    /// Another record of the same motion follows.
    pub more: bool,
}

impl MotionRecord {
    /// Number of axis values carried.
    #[must_use]
    pub fn count(&self) -> usize {
        self.values.len()
    }
}

/// Split axis values into chained records of at most six values each.
///
/// Values past [`MAX_AXES`] are dropped. An empty slice yields no records.
#[must_use]
pub fn pack_valuators(device_id: DeviceId, first_axis: u8, values: &[i32]) -> Vec<MotionRecord> {
    let values = &values[..values.len().min(MAX_AXES)];
    let chunks = values.len().div_ceil(AXES_PER_RECORD);

    values
        .chunks(AXES_PER_RECORD)
        .enumerate()
        .map(|(i, chunk)| {
            let offset = u8::try_from(i * AXES_PER_RECORD).unwrap_or(u8::MAX);
            MotionRecord {
                device_id,
                first_axis: first_axis.saturating_add(offset),
                values: chunk.to_vec(),
                more: i + 1 < chunks,
            }
        })
        .collect()
}

/// Encode a record chain to a length-prefixed frame.
pub fn encode_frame(records: &[MotionRecord]) -> Result<Vec<u8>, WireError> {
    let config = bincode::config::standard();
    let payload = bincode::encode_to_vec(records, config)
        .map_err(|e| WireError::Serialization(e.to_string()))?;

    let len = u32::try_from(payload.len())
        .ok()
        .filter(|len| *len <= MAX_FRAME_SIZE)
        .ok_or(WireError::FrameTooLarge(payload.len()))?;

    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&len.to_be_bytes());
    buf.extend_from_slice(&payload);
    Ok(buf)
}

/// Decode a buffer of back-to-back frames into their record chains.
pub fn decode_frames(mut buf: &[u8]) -> Result<Vec<Vec<MotionRecord>>, WireError> {
    let mut chains = Vec::new();
    while !buf.is_empty() {
        let (records, rest) = split_frame(buf)?;
        chains.push(records);
        buf = rest;
    }
    Ok(chains)
}

/// Decode the first frame, returning what follows it.
fn split_frame(frame: &[u8]) -> Result<(Vec<MotionRecord>, &[u8]), WireError> {
    let prefix: [u8; 4] = frame
        .get(..4)
        .and_then(|p| p.try_into().ok())
        .ok_or(WireError::Truncated)?;
    let len = u32::from_be_bytes(prefix);
    if len > MAX_FRAME_SIZE {
        return Err(WireError::FrameTooLarge(len as usize));
    }
    let end = 4 + len as usize;
    let payload = frame.get(4..end).ok_or(WireError::Truncated)?;

    let config = bincode::config::standard();
    let (records, _) = bincode::decode_from_slice(payload, config)
        .map_err(|e| WireError::Deserialization(e.to_string()))?;
    Ok((records, &frame[end..]))
}
