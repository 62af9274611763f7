//! The embedded compiler: appends fixed-layout opcode records.
//!
//! Exactly one writer is open per currently-open Metafile or Background
//! definition. Opcodes are appended in event order; [`ProgramWriter::finish`]
//! seals the buffer into a [`MetafileContainer`].

use scenewire_core::{Matrix3, ObjectId, Rgba};

use crate::arrays::{ArrayBatch, ArrayError, ArrayKind};
use crate::container::{MetafileContainer, Program};
use crate::opcode::{MATRIX_FULL, MATRIX_IDENTITY, Opcode};

/// Errors from appending variable-length records.
///
/// Length prefixes are fixed-width; payloads that do not fit are rejected,
/// never truncated. The input comes from an untrusted stream, so this is a
/// recoverable error rather than an assertion.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// Stipple pattern longer than the u16 length prefix can carry.
    #[error("stipple pattern is {actual} bytes, limit {limit}")]
    PatternTooLong { actual: usize, limit: usize },

    /// User entry longer than the u32 length prefix can carry.
    #[error("user entry is {actual} bytes, limit {limit}")]
    EntryTooLong { actual: usize, limit: usize },
}

/// Appends opcode records to one metafile program under construction.
#[derive(Debug, Default)]
pub struct ProgramWriter {
    buf: Vec<u8>,
    arrays: Vec<ArrayBatch>,
}

impl ProgramWriter {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn op(&mut self, op: Opcode) -> &mut Self {
        self.buf.push(op as u8);
        self
    }

    #[inline]
    fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    #[inline]
    fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    #[inline]
    fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    #[inline]
    fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    #[inline]
    fn f32(&mut self, v: f32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Push a full 3×3 transform. Identity values are not compressed: the
    /// wire carried a full matrix, the program keeps one.
    pub fn push_matrix(&mut self, m: &Matrix3) {
        self.op(Opcode::PushMatrix).u8(MATRIX_FULL);
        for v in m.0 {
            self.f32(v);
        }
    }

    /// Push the identity transform without matrix payload.
    pub fn push_identity(&mut self) {
        self.op(Opcode::PushMatrix).u8(MATRIX_IDENTITY);
    }

    pub fn pop_matrix(&mut self) {
        self.op(Opcode::PopMatrix);
    }

    pub fn color(&mut self, c: Rgba) {
        self.op(Opcode::Color);
        self.buf.extend_from_slice(&c.to_bytes());
    }

    pub fn set_material(&mut self, id: ObjectId) {
        self.op(Opcode::SetMaterial).u32(id.raw());
    }

    pub fn unset_material(&mut self) {
        self.op(Opcode::UnsetMaterial);
    }

    pub fn set_texture(&mut self, id: ObjectId) {
        self.op(Opcode::SetTexture).u32(id.raw());
    }

    pub fn unset_texture(&mut self) {
        self.op(Opcode::UnsetTexture);
    }

    pub fn line_style(&mut self, style: u8) {
        self.op(Opcode::LineStyle).u8(style);
    }

    pub fn line_weight(&mut self, weight: f32) {
        self.op(Opcode::LineWeight).f32(weight);
    }

    pub fn geometry_marker(&mut self, marker: u64) {
        self.op(Opcode::GeometryMarker).u64(marker);
    }

    pub fn selection_marker(&mut self, marker: u64) {
        self.op(Opcode::SelectionMarker).u64(marker);
    }

    pub fn selection_flags(&mut self, flags: u8) {
        self.op(Opcode::SelectionFlags).u8(flags);
    }

    pub fn vpoint(&mut self, p: [f32; 3]) {
        self.op(Opcode::VPoint);
        for v in p {
            self.f32(v);
        }
    }

    pub fn vline(&mut self, from: [f32; 3], to: [f32; 3]) {
        self.op(Opcode::VLine);
        for v in from.into_iter().chain(to) {
            self.f32(v);
        }
    }

    pub fn ipoint(&mut self, index: u32) {
        self.op(Opcode::IPoint).u32(index);
    }

    pub fn iline(&mut self, from: u32, to: u32) {
        self.op(Opcode::ILine).u32(from).u32(to);
    }

    pub fn enable_array(&mut self, kind: ArrayKind) {
        self.op(Opcode::EnableArray).u8(kind as u8);
    }

    pub fn disable_array(&mut self, kind: ArrayKind) {
        self.op(Opcode::DisableArray).u8(kind as u8);
    }

    pub fn draw_arrays(&mut self, mode: u8, first: u32, count: u32) {
        self.op(Opcode::DrawArrays).u8(mode).u32(first).u32(count);
    }

    pub fn draw_elements(&mut self, mode: u8, count: u32, slot: u32) {
        self.op(Opcode::DrawElements).u8(mode).u32(count).u32(slot);
    }

    pub fn cull_face(&mut self, mode: u8) {
        self.op(Opcode::CullFace).u8(mode);
    }

    /// Stipple pattern bytes. Pattern length is capped by the u16 prefix.
    pub fn stipple(&mut self, pattern: &[u8]) -> Result<(), WriteError> {
        if pattern.len() > u16::MAX as usize {
            return Err(WriteError::PatternTooLong {
                actual: pattern.len(),
                limit: u16::MAX as usize,
            });
        }
        self.op(Opcode::Stipple).u16(pattern.len() as u16);
        self.buf.extend_from_slice(pattern);
        Ok(())
    }

    pub fn hlr_stencil(&mut self, state: u8) {
        self.op(Opcode::HlrStencil).u8(state);
    }

    pub fn shading(&mut self, enabled: bool) {
        self.op(if enabled {
            Opcode::ShadingEnable
        } else {
            Opcode::ShadingDisable
        });
    }

    pub fn program(&mut self, id: u32) {
        self.op(Opcode::Program).u32(id);
    }

    pub fn bind_visual_style(&mut self, id: ObjectId) {
        self.op(Opcode::BindVisualStyle).u32(id.raw());
    }

    /// Opaque user-entry escape, passed through verbatim on replay.
    pub fn user_entry(&mut self, data: &[u8]) -> Result<(), WriteError> {
        if data.len() > u32::MAX as usize {
            return Err(WriteError::EntryTooLong {
                actual: data.len(),
                limit: u32::MAX as usize,
            });
        }
        self.op(Opcode::UserEntry).u32(data.len() as u32);
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Validate and store one typed array batch, returning its table slot.
    pub fn push_array(
        &mut self,
        kind: ArrayKind,
        count: u32,
        data: Vec<u8>,
        offset: Option<[f32; 3]>,
    ) -> Result<u32, ArrayError> {
        let batch = ArrayBatch::ingest(kind, count, data, offset)?;
        self.arrays.push(batch);
        Ok((self.arrays.len() - 1) as u32)
    }

    /// Bytes emitted so far. Exposed for tests and diagnostics.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Seal the buffer and array table into a container.
    pub fn finish(self) -> MetafileContainer {
        MetafileContainer {
            program: Program::from_vec(self.buf),
            arrays: self.arrays,
        }
    }
}
