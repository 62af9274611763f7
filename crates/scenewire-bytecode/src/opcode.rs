//! Opcode tags and payload sizing.
//!
//! Every record in a metafile program is one opcode byte followed by a
//! fixed little-endian payload. Two opcodes (`Stipple`, `UserEntry`) carry
//! a length-prefixed tail; everything else is fully fixed.

/// PushMatrix mode byte: identity, no floats follow.
pub const MATRIX_IDENTITY: u8 = 0;
/// PushMatrix mode byte: full 3×3 transform, nine f32 follow.
pub const MATRIX_FULL: u8 = 1;

/// Opcode tags (one byte on the wire).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[repr(u8)]
pub enum Opcode {
    PushMatrix = 0x01,
    PopMatrix = 0x02,
    Color = 0x03,
    SetMaterial = 0x04,
    UnsetMaterial = 0x05,
    SetTexture = 0x06,
    UnsetTexture = 0x07,
    LineStyle = 0x08,
    LineWeight = 0x09,
    GeometryMarker = 0x0A,
    SelectionMarker = 0x0B,
    SelectionFlags = 0x0C,
    VPoint = 0x0D,
    VLine = 0x0E,
    IPoint = 0x0F,
    ILine = 0x10,
    EnableArray = 0x11,
    DisableArray = 0x12,
    DrawArrays = 0x13,
    DrawElements = 0x14,
    CullFace = 0x15,
    Stipple = 0x16,
    HlrStencil = 0x17,
    ShadingEnable = 0x18,
    ShadingDisable = 0x19,
    Program = 0x1A,
    BindVisualStyle = 0x1B,
    UserEntry = 0x1C,
}

impl Opcode {
    /// Decode a tag byte. The program buffer is produced in-process, but
    /// consumers may replay buffers they received elsewhere, so unknown
    /// tags are an error, not a panic.
    pub fn from_u8(v: u8) -> Option<Self> {
        Some(match v {
            0x01 => Self::PushMatrix,
            0x02 => Self::PopMatrix,
            0x03 => Self::Color,
            0x04 => Self::SetMaterial,
            0x05 => Self::UnsetMaterial,
            0x06 => Self::SetTexture,
            0x07 => Self::UnsetTexture,
            0x08 => Self::LineStyle,
            0x09 => Self::LineWeight,
            0x0A => Self::GeometryMarker,
            0x0B => Self::SelectionMarker,
            0x0C => Self::SelectionFlags,
            0x0D => Self::VPoint,
            0x0E => Self::VLine,
            0x0F => Self::IPoint,
            0x10 => Self::ILine,
            0x11 => Self::EnableArray,
            0x12 => Self::DisableArray,
            0x13 => Self::DrawArrays,
            0x14 => Self::DrawElements,
            0x15 => Self::CullFace,
            0x16 => Self::Stipple,
            0x17 => Self::HlrStencil,
            0x18 => Self::ShadingEnable,
            0x19 => Self::ShadingDisable,
            0x1A => Self::Program,
            0x1B => Self::BindVisualStyle,
            0x1C => Self::UserEntry,
            _ => return None,
        })
    }

    /// Fixed payload size in bytes, excluding the tag byte.
    ///
    /// `None` for the variable-size opcodes (`PushMatrix`, `Stipple`,
    /// `UserEntry`), whose size follows from their mode byte or length
    /// prefix.
    pub fn fixed_payload(self) -> Option<usize> {
        match self {
            Self::PushMatrix | Self::Stipple | Self::UserEntry => None,
            Self::PopMatrix | Self::UnsetMaterial | Self::UnsetTexture | Self::ShadingEnable
            | Self::ShadingDisable => Some(0),
            Self::LineStyle | Self::SelectionFlags | Self::EnableArray | Self::DisableArray
            | Self::CullFace | Self::HlrStencil => Some(1),
            Self::Color | Self::SetMaterial | Self::SetTexture | Self::LineWeight
            | Self::IPoint | Self::Program | Self::BindVisualStyle => Some(4),
            Self::GeometryMarker | Self::SelectionMarker | Self::ILine => Some(8),
            Self::DrawArrays | Self::DrawElements => Some(9),
            Self::VPoint => Some(12),
            Self::VLine => Some(24),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Opcode;

    #[test]
    fn tag_round_trip() {
        for tag in 0x01..=0x1C {
            let op = Opcode::from_u8(tag).unwrap();
            assert_eq!(op as u8, tag);
        }
        assert_eq!(Opcode::from_u8(0x00), None);
        assert_eq!(Opcode::from_u8(0x1D), None);
        assert_eq!(Opcode::from_u8(0xFF), None);
    }

    #[test]
    fn fixed_payload_sizes() {
        assert_eq!(Opcode::PopMatrix.fixed_payload(), Some(0));
        assert_eq!(Opcode::Color.fixed_payload(), Some(4));
        assert_eq!(Opcode::VPoint.fixed_payload(), Some(12));
        assert_eq!(Opcode::VLine.fixed_payload(), Some(24));
        assert_eq!(Opcode::DrawArrays.fixed_payload(), Some(9));
        assert_eq!(Opcode::PushMatrix.fixed_payload(), None);
        assert_eq!(Opcode::UserEntry.fixed_payload(), None);
    }
}
