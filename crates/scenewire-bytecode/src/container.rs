//! Sealed metafile containers.

use std::ops::Deref;

use crate::arrays::ArrayBatch;

/// A sealed opcode program. Byte-for-byte replayable; order is significant.
#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct Program(Vec<u8>);

impl Program {
    pub(crate) fn from_vec(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Deref for Program {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A compiled metafile: one sealed program plus its typed array table.
///
/// Attached to the owning definition when its end event fires, and carried
/// to the consumer inside the finalized record.
#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MetafileContainer {
    pub program: Program,
    /// Array table; `DrawElements` names entries by slot index.
    pub arrays: Vec<ArrayBatch>,
}
