//! Typed array batches.
//!
//! Vertex-like data referenced by draw opcodes lives outside the opcode
//! buffer, in the container's array table. A batch is declared (kind plus
//! element count) before its payload arrives; the payload length must equal
//! `count * element width` exactly.

/// Kind of a typed array batch (one byte on the wire).
#[derive(Clone, Copy, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum ArrayKind {
    /// 3×f32 positions.
    Vertex = 0,
    /// 3×f32 normals.
    Normal = 1,
    /// 4×u8 RGBA per element.
    Color = 2,
    /// 2×f32 texture coordinates.
    TexCoord = 3,
    /// f32 depth per element.
    Depth = 4,
    /// u16 index per element.
    Index = 5,
    /// u64 selection marker per element.
    Marker = 6,
}

impl ArrayKind {
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0 => Self::Vertex,
            1 => Self::Normal,
            2 => Self::Color,
            3 => Self::TexCoord,
            4 => Self::Depth,
            5 => Self::Index,
            6 => Self::Marker,
            _ => return None,
        })
    }

    /// Bytes per element.
    pub fn element_width(self) -> usize {
        match self {
            Self::Vertex | Self::Normal => 12,
            Self::Color => 4,
            Self::TexCoord => 8,
            Self::Depth => 4,
            Self::Index => 2,
            Self::Marker => 8,
        }
    }

    /// Whether a uniform 3-component offset applies during ingestion.
    pub fn is_vertex_like(self) -> bool {
        matches!(self, Self::Vertex)
    }
}

/// Batch ingestion errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArrayError {
    /// Payload length disagrees with the declared element count.
    #[error("{kind:?} array payload is {actual} bytes, declared count {count} needs {expected}")]
    SizeMismatch {
        kind: ArrayKind,
        count: u32,
        expected: usize,
        actual: usize,
    },

    /// Unknown array kind byte.
    #[error("unknown array kind {0}")]
    UnknownKind(u8),
}

/// A validated typed array batch.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ArrayBatch {
    pub kind: ArrayKind,
    /// Declared element count; `data.len() == count * element_width`.
    pub count: u32,
    /// Raw little-endian payload.
    pub data: Vec<u8>,
}

impl ArrayBatch {
    /// Validate a declared batch against its payload and store it.
    ///
    /// `offset` applies only to vertex-like kinds; it is a pure transform,
    /// the input buffer is consumed and a freshly offset buffer stored.
    pub fn ingest(
        kind: ArrayKind,
        count: u32,
        data: Vec<u8>,
        offset: Option<[f32; 3]>,
    ) -> Result<Self, ArrayError> {
        let expected = count as usize * kind.element_width();
        if data.len() != expected {
            return Err(ArrayError::SizeMismatch {
                kind,
                count,
                expected,
                actual: data.len(),
            });
        }
        let data = match offset {
            Some(delta) if kind.is_vertex_like() => apply_offset(&data, delta),
            _ => data,
        };
        Ok(Self { kind, count, data })
    }
}

/// Add a uniform 3-component offset to a buffer of f32 triples,
/// producing a new buffer.
fn apply_offset(data: &[u8], delta: [f32; 3]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    for (i, chunk) in data.chunks_exact(4).enumerate() {
        let raw: [u8; 4] = chunk.try_into().unwrap();
        let shifted = f32::from_le_bytes(raw) + delta[i % 3];
        out.extend_from_slice(&shifted.to_le_bytes());
    }
    out
}
