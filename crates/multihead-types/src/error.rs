//! Wire encoding errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("serialisation error: {0}")]
    Serialization(String),

    #[error("deserialisation error: {0}")]
    Deserialization(String),

    #[error("frame of {0} bytes exceeds the maximum")]
    FrameTooLarge(usize),

    #[error("frame truncated")]
    Truncated,
}
