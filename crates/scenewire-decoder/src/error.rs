//! Decode error taxonomy.
//!
//! Every violation surfaces as a typed, recoverable error from the decode
//! step. The input is an untrusted external stream, so nothing here is a
//! debug-only assertion. Decoding stops at the first error; consumer calls
//! already dispatched stay in effect.

use scenewire_core::{IdError, PathKey, WireType};

/// Error returned by one decode step.
///
/// `position` is the running count of events the decoder has accepted,
/// including the failing one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// Begin/end mismatch, double-open, or a field referencing an
    /// unopened definition.
    #[error("structural error on {key:?} at event {position}: {detail}")]
    Structural {
        key: PathKey,
        position: u64,
        detail: &'static str,
    },

    /// A must-be-new key already exists, or a must-exist key was never
    /// introduced.
    #[error("identifier error on {key:?} at event {position}: {source}")]
    Identifier {
        key: PathKey,
        position: u64,
        source: IdError,
    },

    /// No handler registered for this (path key, wire type) pair.
    #[error("no {wire_type} handler for {key:?} at event {position}")]
    Schema {
        key: PathKey,
        position: u64,
        wire_type: WireType,
    },

    /// Payload length disagrees with the declared element count.
    #[error("size error on {key:?} at event {position}: expected length {expected}, got {actual}")]
    Size {
        key: PathKey,
        position: u64,
        expected: usize,
        actual: usize,
    },
}

impl DecodeError {
    /// The path key the failing event carried.
    pub fn key(&self) -> PathKey {
        match self {
            Self::Structural { key, .. }
            | Self::Identifier { key, .. }
            | Self::Schema { key, .. }
            | Self::Size { key, .. } => *key,
        }
    }

    /// The event position at which decoding stopped.
    pub fn position(&self) -> u64 {
        match self {
            Self::Structural { position, .. }
            | Self::Identifier { position, .. }
            | Self::Schema { position, .. }
            | Self::Size { position, .. } => *position,
        }
    }
}
