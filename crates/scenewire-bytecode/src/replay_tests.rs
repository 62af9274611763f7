//! Round-trip tests: compile a call sequence, replay it, compare.

use scenewire_core::{Matrix3, ObjectId, Rgba};

use crate::arrays::ArrayKind;
use crate::replay::{OpVisitor, ProgramError, replay};
use crate::writer::ProgramWriter;

/// Records every visited opcode as a comparable event.
#[derive(Default)]
struct RecordingVisitor {
    events: Vec<String>,
}

impl OpVisitor for RecordingVisitor {
    fn push_matrix(&mut self, m: Matrix3) {
        self.events.push(format!("push_matrix {:?}", m.0));
    }
    fn push_identity(&mut self) {
        self.events.push("push_identity".into());
    }
    fn pop_matrix(&mut self) {
        self.events.push("pop_matrix".into());
    }
    fn color(&mut self, c: Rgba) {
        self.events
            .push(format!("color {},{},{},{}", c.r, c.g, c.b, c.a));
    }
    fn set_material(&mut self, id: ObjectId) {
        self.events.push(format!("set_material {id}"));
    }
    fn unset_material(&mut self) {
        self.events.push("unset_material".into());
    }
    fn set_texture(&mut self, id: ObjectId) {
        self.events.push(format!("set_texture {id}"));
    }
    fn line_style(&mut self, style: u8) {
        self.events.push(format!("line_style {style}"));
    }
    fn line_weight(&mut self, weight: f32) {
        self.events.push(format!("line_weight {weight}"));
    }
    fn selection_marker(&mut self, marker: u64) {
        self.events.push(format!("selection_marker {marker}"));
    }
    fn vpoint(&mut self, p: [f32; 3]) {
        self.events.push(format!("vpoint {p:?}"));
    }
    fn vline(&mut self, from: [f32; 3], to: [f32; 3]) {
        self.events.push(format!("vline {from:?} {to:?}"));
    }
    fn iline(&mut self, from: u32, to: u32) {
        self.events.push(format!("iline {from} {to}"));
    }
    fn enable_array(&mut self, kind: ArrayKind) {
        self.events.push(format!("enable_array {kind:?}"));
    }
    fn disable_array(&mut self, kind: ArrayKind) {
        self.events.push(format!("disable_array {kind:?}"));
    }
    fn draw_elements(&mut self, mode: u8, count: u32, slot: u32) {
        self.events
            .push(format!("draw_elements {mode} {count} {slot}"));
    }
    fn stipple(&mut self, pattern: &[u8]) {
        self.events.push(format!("stipple {pattern:?}"));
    }
    fn shading(&mut self, enabled: bool) {
        self.events.push(format!("shading {enabled}"));
    }
    fn user_entry(&mut self, data: &[u8]) {
        self.events.push(format!("user_entry {data:?}"));
    }
}

#[test]
fn round_trip_reproduces_call_sequence() {
    let mut w = ProgramWriter::new();
    w.color(Rgba::new(10, 20, 30, 255));
    w.push_matrix(&Matrix3([1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 6.0, 1.0]));
    w.set_material(ObjectId(101));
    w.line_style(3);
    w.line_weight(1.5);
    w.vpoint([1.0, 2.0, 3.0]);
    w.vline([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
    w.iline(4, 7);
    w.enable_array(ArrayKind::Vertex);
    w.draw_elements(2, 3, 0);
    w.disable_array(ArrayKind::Vertex);
    w.stipple(&[0xF0, 0x0F]).unwrap();
    w.selection_marker(42);
    w.shading(false);
    w.user_entry(&[9, 9, 9]).unwrap();
    w.push_identity();
    w.pop_matrix();
    w.unset_material();
    let container = w.finish();

    let mut v = RecordingVisitor::default();
    replay(&container.program, &mut v).unwrap();

    assert_eq!(
        v.events,
        vec![
            "color 10,20,30,255",
            "push_matrix [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 5.0, 6.0, 1.0]",
            "set_material #101",
            "line_style 3",
            "line_weight 1.5",
            "vpoint [1.0, 2.0, 3.0]",
            "vline [0.0, 0.0, 0.0] [1.0, 1.0, 1.0]",
            "iline 4 7",
            "enable_array Vertex",
            "draw_elements 2 3 0",
            "disable_array Vertex",
            "stipple [240, 15]",
            "selection_marker 42",
            "shading false",
            "user_entry [9, 9, 9]",
            "push_identity",
            "pop_matrix",
            "unset_material",
        ]
    );
}

/// The no-op interpreter: every visitor method defaulted.
struct NoopVisitor;
impl OpVisitor for NoopVisitor {}

#[test]
fn noop_interpreter_accepts_every_opcode() {
    let mut w = ProgramWriter::new();
    w.push_matrix(&Matrix3::IDENTITY);
    w.push_identity();
    w.pop_matrix();
    w.color(Rgba::new(1, 2, 3, 4));
    w.set_material(ObjectId(101));
    w.unset_material();
    w.set_texture(ObjectId(102));
    w.unset_texture();
    w.line_style(1);
    w.line_weight(0.5);
    w.geometry_marker(7);
    w.selection_marker(8);
    w.selection_flags(0b101);
    w.vpoint([0.0; 3]);
    w.vline([0.0; 3], [1.0; 3]);
    w.ipoint(0);
    w.iline(0, 1);
    w.enable_array(ArrayKind::Marker);
    w.disable_array(ArrayKind::Marker);
    w.draw_arrays(0, 0, 3);
    w.draw_elements(1, 3, 0);
    w.cull_face(2);
    w.stipple(&[]).unwrap();
    w.hlr_stencil(1);
    w.shading(true);
    w.program(55);
    w.bind_visual_style(ObjectId(103));
    w.user_entry(&[]).unwrap();
    let container = w.finish();

    replay(&container.program, &mut NoopVisitor).unwrap();
}

#[test]
fn unknown_tag_is_an_error() {
    let err = replay(&[0xFF], &mut NoopVisitor).unwrap_err();
    assert_eq!(err, ProgramError::UnknownOpcode { tag: 0xFF, at: 0 });
}

#[test]
fn truncated_payload_is_an_error() {
    let mut w = ProgramWriter::new();
    w.vpoint([1.0, 2.0, 3.0]);
    let container = w.finish();
    let bytes = container.program.as_bytes();

    let err = replay(&bytes[..bytes.len() - 1], &mut NoopVisitor).unwrap_err();
    assert!(matches!(err, ProgramError::Truncated { .. }));
}

#[test]
fn bad_matrix_mode_is_an_error() {
    let err = replay(&[0x01, 9], &mut NoopVisitor).unwrap_err();
    assert_eq!(err, ProgramError::BadMatrixMode { mode: 9, at: 1 });
}

#[test]
fn bad_array_kind_is_an_error() {
    let err = replay(&[0x11, 200], &mut NoopVisitor).unwrap_err();
    assert_eq!(err, ProgramError::BadArrayKind { kind: 200, at: 1 });
}

#[test]
fn empty_program_replays_cleanly() {
    replay(&[], &mut NoopVisitor).unwrap();
}
