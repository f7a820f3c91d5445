//! Arena-specific error types.

use std::error::Error;
use std::fmt;

/// Errors that can occur during arena operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArenaError {
    /// No free chunk is large enough for the request. The arena is left
    /// unchanged and the caller may retry with a smaller request.
    OutOfMemory {
        /// Number of payload bytes requested.
        requested: u32,
        /// Alignment after coercion to a word multiple.
        alignment: u32,
        /// Total arena capacity in bytes.
        capacity: u32,
    },
    /// A pointer that does not refer to a live allocation in this arena.
    /// The operation was skipped.
    InvalidPointer {
        /// Payload offset carried by the pointer.
        offset: u32,
        /// Total arena capacity in bytes.
        capacity: u32,
    },
    /// Backing storage for the arena could not be acquired.
    InitFailed {
        /// Requested capacity in bytes.
        capacity: u32,
    },
    /// The arena configuration is unusable.
    InvalidConfig {
        /// Human-readable explanation.
        reason: String,
    },
    /// An integrity check found malformed chunk metadata.
    Corrupted {
        /// Byte offset of the offending chunk header.
        offset: u32,
        /// What was wrong with it.
        reason: String,
    },
}

impl fmt::Display for ArenaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory {
                requested,
                alignment,
                capacity,
            } => {
                write!(
                    f,
                    "out of arena memory: requested {requested} bytes aligned to {alignment}, \
                     capacity {capacity} bytes"
                )
            }
            Self::InvalidPointer { offset, capacity } => {
                write!(
                    f,
                    "invalid arena pointer at offset {offset:#010x} \
                     (arena capacity {capacity} bytes)"
                )
            }
            Self::InitFailed { capacity } => {
                write!(f, "failed to acquire {capacity} bytes of arena storage")
            }
            Self::InvalidConfig { reason } => {
                write!(f, "invalid arena config: {reason}")
            }
            Self::Corrupted { offset, reason } => {
                write!(f, "arena corrupted at offset {offset:#010x}: {reason}")
            }
        }
    }
}

impl Error for ArenaError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_memory_message_names_request() {
        let err = ArenaError::OutOfMemory {
            requested: 2048,
            alignment: 8,
            capacity: 1024,
        };
        let msg = err.to_string();
        assert!(msg.contains("2048"));
        assert!(msg.contains("1024"));
    }

    #[test]
    fn invalid_pointer_message_is_hex() {
        let err = ArenaError::InvalidPointer {
            offset: 0x40,
            capacity: 1024,
        };
        assert!(err.to_string().contains("0x00000040"));
    }
}
