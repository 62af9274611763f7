//! Replay interpreter for sealed programs.
//!
//! Walks a program buffer record by record and invokes one visitor method
//! per opcode with decoded arguments. Replay order is the compile order.

use scenewire_core::{Matrix3, ObjectId, Rgba};

use crate::arrays::ArrayKind;
use crate::opcode::{MATRIX_FULL, MATRIX_IDENTITY, Opcode};

/// Replay errors. Programs produced by [`crate::ProgramWriter`] never
/// trigger these; buffers received from elsewhere may.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgramError {
    #[error("unknown opcode tag 0x{tag:02X} at byte {at}")]
    UnknownOpcode { tag: u8, at: usize },

    #[error("program truncated inside {op:?} at byte {at}")]
    Truncated { op: Opcode, at: usize },

    #[error("unknown matrix mode {mode} at byte {at}")]
    BadMatrixMode { mode: u8, at: usize },

    #[error("unknown array kind {kind} at byte {at}")]
    BadArrayKind { kind: u8, at: usize },
}

/// One method per opcode. All methods default to no-ops, so an empty impl
/// is the no-op interpreter used to validate a program.
#[allow(unused_variables)]
pub trait OpVisitor {
    fn push_matrix(&mut self, m: Matrix3) {}
    fn push_identity(&mut self) {}
    fn pop_matrix(&mut self) {}
    fn color(&mut self, c: Rgba) {}
    fn set_material(&mut self, id: ObjectId) {}
    fn unset_material(&mut self) {}
    fn set_texture(&mut self, id: ObjectId) {}
    fn unset_texture(&mut self) {}
    fn line_style(&mut self, style: u8) {}
    fn line_weight(&mut self, weight: f32) {}
    fn geometry_marker(&mut self, marker: u64) {}
    fn selection_marker(&mut self, marker: u64) {}
    fn selection_flags(&mut self, flags: u8) {}
    fn vpoint(&mut self, p: [f32; 3]) {}
    fn vline(&mut self, from: [f32; 3], to: [f32; 3]) {}
    fn ipoint(&mut self, index: u32) {}
    fn iline(&mut self, from: u32, to: u32) {}
    fn enable_array(&mut self, kind: ArrayKind) {}
    fn disable_array(&mut self, kind: ArrayKind) {}
    fn draw_arrays(&mut self, mode: u8, first: u32, count: u32) {}
    fn draw_elements(&mut self, mode: u8, count: u32, slot: u32) {}
    fn cull_face(&mut self, mode: u8) {}
    fn stipple(&mut self, pattern: &[u8]) {}
    fn hlr_stencil(&mut self, state: u8) {}
    fn shading(&mut self, enabled: bool) {}
    fn program(&mut self, id: u32) {}
    fn bind_visual_style(&mut self, id: ObjectId) {}
    fn user_entry(&mut self, data: &[u8]) {}
}

/// Byte cursor over a program buffer.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize, op: Opcode) -> Result<&'a [u8], ProgramError> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        let Some(end) = end else {
            return Err(ProgramError::Truncated { op, at: self.pos });
        };
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn u8(&mut self, op: Opcode) -> Result<u8, ProgramError> {
        Ok(self.take(1, op)?[0])
    }

    fn u16(&mut self, op: Opcode) -> Result<u16, ProgramError> {
        let b = self.take(2, op)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self, op: Opcode) -> Result<u32, ProgramError> {
        let b = self.take(4, op)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self, op: Opcode) -> Result<u64, ProgramError> {
        let b = self.take(8, op)?;
        Ok(u64::from_le_bytes(b.try_into().unwrap()))
    }

    fn f32(&mut self, op: Opcode) -> Result<f32, ProgramError> {
        Ok(f32::from_bits(self.u32(op)?))
    }

    fn point(&mut self, op: Opcode) -> Result<[f32; 3], ProgramError> {
        Ok([self.f32(op)?, self.f32(op)?, self.f32(op)?])
    }

    fn array_kind(&mut self, op: Opcode) -> Result<ArrayKind, ProgramError> {
        let at = self.pos;
        let kind = self.u8(op)?;
        ArrayKind::from_u8(kind).ok_or(ProgramError::BadArrayKind { kind, at })
    }
}

/// Replay a sealed program through `visitor`, reproducing the exact call
/// sequence and arguments it was compiled from.
pub fn replay<V: OpVisitor>(program: &[u8], visitor: &mut V) -> Result<(), ProgramError> {
    let mut cur = Cursor {
        data: program,
        pos: 0,
    };

    while cur.pos < program.len() {
        let at = cur.pos;
        let tag = program[cur.pos];
        cur.pos += 1;
        let op = Opcode::from_u8(tag).ok_or(ProgramError::UnknownOpcode { tag, at })?;

        match op {
            Opcode::PushMatrix => {
                let mode_at = cur.pos;
                match cur.u8(op)? {
                    MATRIX_IDENTITY => visitor.push_identity(),
                    MATRIX_FULL => {
                        let mut m = [0.0f32; 9];
                        for v in &mut m {
                            *v = cur.f32(op)?;
                        }
                        visitor.push_matrix(Matrix3(m));
                    }
                    mode => return Err(ProgramError::BadMatrixMode { mode, at: mode_at }),
                }
            }
            Opcode::PopMatrix => visitor.pop_matrix(),
            Opcode::Color => {
                let b = cur.take(4, op)?;
                visitor.color(Rgba::new(b[0], b[1], b[2], b[3]));
            }
            Opcode::SetMaterial => {
                let id = cur.u32(op)?;
                visitor.set_material(ObjectId(id));
            }
            Opcode::UnsetMaterial => visitor.unset_material(),
            Opcode::SetTexture => {
                let id = cur.u32(op)?;
                visitor.set_texture(ObjectId(id));
            }
            Opcode::UnsetTexture => visitor.unset_texture(),
            Opcode::LineStyle => {
                let style = cur.u8(op)?;
                visitor.line_style(style);
            }
            Opcode::LineWeight => {
                let weight = cur.f32(op)?;
                visitor.line_weight(weight);
            }
            Opcode::GeometryMarker => {
                let marker = cur.u64(op)?;
                visitor.geometry_marker(marker);
            }
            Opcode::SelectionMarker => {
                let marker = cur.u64(op)?;
                visitor.selection_marker(marker);
            }
            Opcode::SelectionFlags => {
                let flags = cur.u8(op)?;
                visitor.selection_flags(flags);
            }
            Opcode::VPoint => {
                let p = cur.point(op)?;
                visitor.vpoint(p);
            }
            Opcode::VLine => {
                let from = cur.point(op)?;
                let to = cur.point(op)?;
                visitor.vline(from, to);
            }
            Opcode::IPoint => {
                let index = cur.u32(op)?;
                visitor.ipoint(index);
            }
            Opcode::ILine => {
                let from = cur.u32(op)?;
                let to = cur.u32(op)?;
                visitor.iline(from, to);
            }
            Opcode::EnableArray => {
                let kind = cur.array_kind(op)?;
                visitor.enable_array(kind);
            }
            Opcode::DisableArray => {
                let kind = cur.array_kind(op)?;
                visitor.disable_array(kind);
            }
            Opcode::DrawArrays => {
                let mode = cur.u8(op)?;
                let first = cur.u32(op)?;
                let count = cur.u32(op)?;
                visitor.draw_arrays(mode, first, count);
            }
            Opcode::DrawElements => {
                let mode = cur.u8(op)?;
                let count = cur.u32(op)?;
                let slot = cur.u32(op)?;
                visitor.draw_elements(mode, count, slot);
            }
            Opcode::CullFace => {
                let mode = cur.u8(op)?;
                visitor.cull_face(mode);
            }
            Opcode::Stipple => {
                let len = cur.u16(op)? as usize;
                let pattern = cur.take(len, op)?;
                visitor.stipple(pattern);
            }
            Opcode::HlrStencil => {
                let state = cur.u8(op)?;
                visitor.hlr_stencil(state);
            }
            Opcode::ShadingEnable => visitor.shading(true),
            Opcode::ShadingDisable => visitor.shading(false),
            Opcode::Program => {
                let id = cur.u32(op)?;
                visitor.program(id);
            }
            Opcode::BindVisualStyle => {
                let id = cur.u32(op)?;
                visitor.bind_visual_style(ObjectId(id));
            }
            Opcode::UserEntry => {
                let len = cur.u32(op)? as usize;
                let data = cur.take(len, op)?;
                visitor.user_entry(data);
            }
        }
    }

    Ok(())
}
