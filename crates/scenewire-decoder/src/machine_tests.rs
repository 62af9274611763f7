use scenewire_bytecode::{ArrayKind, MATRIX_FULL, Opcode};
use scenewire_core::{BASE_ID, Category, IdError, Matrix3, ObjectId, PathKey, Rgba, Value};

use crate::error::DecodeError;
use crate::machine::Decoder;
use crate::records::{
    BackgroundDef, HlBranchDef, LightsDef, MaterialDef, MetafileDef, OverlayDef, StyleProperty,
    ViewportDef, VisualStyleDef,
};
use crate::RenditionConsumer;

#[derive(Debug, Default)]
struct Recorder {
    events: Vec<String>,
    materials: Vec<MaterialDef>,
    metafiles: Vec<MetafileDef>,
    viewports: Vec<ViewportDef>,
    styles: Vec<VisualStyleDef>,
    overlays: Vec<OverlayDef>,
    branches: Vec<HlBranchDef>,
    lights: Vec<LightsDef>,
    backgrounds: Vec<BackgroundDef>,
}

impl RenditionConsumer for Recorder {
    fn material_added(&mut self, material: MaterialDef) {
        self.events.push(format!("material_added {}", material.id));
        self.materials.push(material);
    }

    fn material_modified(&mut self, material: MaterialDef) {
        self.events.push(format!("material_modified {}", material.id));
        self.materials.push(material);
    }

    fn overlay_added(&mut self, overlay: OverlayDef) {
        self.events.push(format!("overlay_added {}", overlay.id));
        self.overlays.push(overlay);
    }

    fn viewport_added(&mut self, viewport: ViewportDef) {
        self.events.push(format!("viewport_added {}", viewport.id));
        self.viewports.push(viewport);
    }

    fn visual_style_added(&mut self, style: VisualStyleDef) {
        self.events.push(format!("visual_style_added {}", style.id));
        self.styles.push(style);
    }

    fn metafile_added(&mut self, metafile: MetafileDef) {
        self.events.push(format!("metafile_added {}", metafile.id));
        self.metafiles.push(metafile);
    }

    fn hl_branch_added(&mut self, branch: HlBranchDef) {
        self.events.push(format!("hl_branch_added {}", branch.id));
        self.branches.push(branch);
    }

    fn hl_branch_attached(&mut self, metafile: ObjectId, branch: ObjectId) {
        self.events
            .push(format!("hl_branch_attached {metafile} {branch}"));
    }

    fn lights_changed(&mut self, lights: LightsDef) {
        self.events.push(format!("lights_changed {}", lights.viewport));
        self.lights.push(lights);
    }

    fn background_changed(&mut self, background: BackgroundDef) {
        self.events
            .push(format!("background_changed {}", background.id));
        self.backgrounds.push(background);
    }
}

// ----------------------------------------------------------------------
// Record finalization
// ----------------------------------------------------------------------

#[test]
fn material_added_finalizes_once() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    d.set_field(
        PathKey::AmbientColor,
        Value::F32Array(vec![0.1, 0.2, 0.3]),
    )
    .unwrap();
    d.end(PathKey::MaterialAdded).unwrap();

    let (recorder, ids) = d.finish().unwrap();
    assert_eq!(recorder.events, vec![format!("material_added #{BASE_ID}")]);
    let m = &recorder.materials[0];
    assert_eq!(m.id, ObjectId(BASE_ID));
    assert_eq!(m.ambient, [0.1, 0.2, 0.3]);
    // Untouched fields keep their declared defaults.
    assert_eq!(m.opacity, 1.0);
    assert!(m.diffuse_texture.is_none());
    assert_eq!(ids.lookup_existing("5", Category::Material), Ok(ObjectId(BASE_ID)));
}

#[test]
fn partial_record_delivers_defaults() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::OverlayAdded).unwrap();
    d.set_field(PathKey::OverlayId, Value::Id("1".into())).unwrap();
    d.end(PathKey::OverlayAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let o = &recorder.overlays[0];
    assert!(o.visible);
    assert_eq!(o.render_order, 0);
    assert!(o.viewport.is_none());
}

#[test]
fn reserved_zero_key_means_no_object() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::OverlayAdded).unwrap();
    d.set_field(PathKey::OverlayId, Value::Id("9".into())).unwrap();
    d.set_field(PathKey::ViewportId, Value::Id("0".into())).unwrap();
    d.end(PathKey::OverlayAdded).unwrap();

    let (recorder, ids) = d.finish().unwrap();
    assert_eq!(recorder.overlays[0].viewport, ObjectId::NONE);
    // The reserved key is never memoized.
    assert!(ids.is_empty(Category::Viewport));
}

// ----------------------------------------------------------------------
// Metafile streams
// ----------------------------------------------------------------------

#[test]
fn metafile_stream_compiles_to_program() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("7".into())).unwrap();
    d.set_field(PathKey::OwnerId, Value::OwnerRef("entity-12".into()))
        .unwrap();
    d.begin(PathKey::MetafileStream).unwrap();
    d.set_field(PathKey::StreamColor, Value::Color(Rgba::new(255, 0, 0, 255)))
        .unwrap();
    d.set_field(PathKey::PushMatrix, Value::Matrix(Matrix3::IDENTITY))
        .unwrap();
    d.set_field(PathKey::VPoint, Value::F32Array(vec![1.0, 2.0, 3.0]))
        .unwrap();
    d.end(PathKey::MetafileStream).unwrap();
    d.end(PathKey::MetafileAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    assert_eq!(recorder.events, vec![format!("metafile_added #{BASE_ID}")]);
    let mf = &recorder.metafiles[0];
    assert_eq!(mf.owner, "entity-12");

    let mut expected = vec![Opcode::Color as u8, 255, 0, 0, 255];
    expected.push(Opcode::PushMatrix as u8);
    // Identity is not compressed: the wire carried a full matrix.
    expected.push(MATRIX_FULL);
    for v in Matrix3::IDENTITY.0 {
        expected.extend_from_slice(&v.to_le_bytes());
    }
    expected.push(Opcode::VPoint as u8);
    for v in [1.0f32, 2.0, 3.0] {
        expected.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(mf.container.program.as_bytes(), &expected[..]);
}

#[test]
fn array_batch_flows_into_container() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::MetafileStream).unwrap();
    d.begin(PathKey::Array).unwrap();
    d.set_field(PathKey::ArrayType, Value::U8(ArrayKind::Vertex as u8))
        .unwrap();
    d.set_field(PathKey::ArraySize, Value::U32(2)).unwrap();
    d.set_field(PathKey::ArrayData, Value::Bytes(vec![0; 24])).unwrap();
    d.end(PathKey::Array).unwrap();
    d.end(PathKey::MetafileStream).unwrap();
    d.end(PathKey::MetafileAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let arrays = &recorder.metafiles[0].container.arrays;
    assert_eq!(arrays.len(), 1);
    assert_eq!(arrays[0].kind, ArrayKind::Vertex);
    assert_eq!(arrays[0].count, 2);
}

#[test]
fn array_size_mismatch_is_rejected_at_close() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::MetafileStream).unwrap();
    d.begin(PathKey::Array).unwrap();
    d.set_field(PathKey::ArrayType, Value::U8(ArrayKind::Vertex as u8))
        .unwrap();
    d.set_field(PathKey::ArraySize, Value::U32(2)).unwrap();
    // One byte short of two 12-byte vertices.
    d.set_field(PathKey::ArrayData, Value::Bytes(vec![0; 23])).unwrap();
    let err = d.end(PathKey::Array).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Size {
            key: PathKey::Array,
            expected: 24,
            actual: 23,
            ..
        }
    ));
}

#[test]
fn background_stream_compiles_to_program() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::BackgroundChanged).unwrap();
    d.set_field(PathKey::BackgroundId, Value::Id("1".into())).unwrap();
    d.set_field(PathKey::BackgroundColor, Value::Color(Rgba::new(0, 0, 64, 255)))
        .unwrap();
    d.begin(PathKey::MetafileStream).unwrap();
    d.set_field(PathKey::StreamColor, Value::Color(Rgba::new(0, 255, 0, 255)))
        .unwrap();
    d.set_field(PathKey::VPoint, Value::F32Array(vec![4.0, 5.0, 6.0]))
        .unwrap();
    d.end(PathKey::MetafileStream).unwrap();
    d.end(PathKey::BackgroundChanged).unwrap();

    let (recorder, _) = d.finish().unwrap();
    assert_eq!(recorder.events, vec![format!("background_changed #{BASE_ID}")]);
    let bg = &recorder.backgrounds[0];
    assert_eq!(bg.color, Rgba::new(0, 0, 64, 255));

    let mut expected = vec![Opcode::Color as u8, 0, 255, 0, 255];
    expected.push(Opcode::VPoint as u8);
    for v in [4.0f32, 5.0, 6.0] {
        expected.extend_from_slice(&v.to_le_bytes());
    }
    assert_eq!(bg.container.program.as_bytes(), &expected[..]);
}

#[test]
fn oversize_stipple_surfaces_as_size_error() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::MetafileStream).unwrap();
    // One u16 length prefix cannot carry 70000 bytes.
    let err = d
        .set_field(PathKey::Stipple, Value::Bytes(vec![0xAB; 70_000]))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Size {
            key: PathKey::Stipple,
            expected: 65_535,
            actual: 70_000,
            ..
        }
    ));
}

#[test]
fn stream_field_outside_stream_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    let err = d
        .set_field(PathKey::VPoint, Value::F32Array(vec![0.0; 3]))
        .unwrap_err();
    assert!(matches!(err, DecodeError::Structural { key: PathKey::VPoint, .. }));
}

// ----------------------------------------------------------------------
// Identifier strictness
// ----------------------------------------------------------------------

#[test]
fn attach_to_unknown_metafile_dispatches_nothing() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileHlBranchAttached).unwrap();
    let err = d
        .set_field(PathKey::MetafileId, Value::Id("99".into()))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Identifier {
            key: PathKey::MetafileId,
            source: IdError::NeverIntroduced { .. },
            ..
        }
    ));
    assert!(d.consumer().events.is_empty());
}

#[test]
fn reintroducing_a_known_key_is_rejected() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    d.end(PathKey::MaterialAdded).unwrap();

    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d
        .set_field(PathKey::MaterialId, Value::Id("5".into()))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Identifier {
            source: IdError::AlreadyKnown { .. },
            ..
        }
    ));
}

#[test]
fn modifying_an_unknown_key_is_rejected() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialModified).unwrap();
    let err = d
        .set_field(PathKey::MaterialId, Value::Id("5".into()))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Identifier {
            source: IdError::NeverIntroduced { .. },
            ..
        }
    ));
}

#[test]
fn intra_record_reference_may_run_ahead() {
    // A metafile may name its layer before the layer record arrives.
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MetafileAdded).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("1".into())).unwrap();
    d.set_field(PathKey::LayerId, Value::Id("walls".into())).unwrap();
    d.end(PathKey::MetafileAdded).unwrap();

    let (recorder, ids) = d.finish().unwrap();
    let layer = recorder.metafiles[0].layer;
    assert_eq!(layer, ObjectId(BASE_ID));
    assert_eq!(ids.lookup_existing("walls", Category::Layer), Ok(layer));
}

#[test]
fn branch_owner_metafile_may_run_ahead() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::HlBranchAdded).unwrap();
    d.set_field(PathKey::HlBranchId, Value::Id("b1".into())).unwrap();
    d.set_field(PathKey::MetafileId, Value::Id("m1".into())).unwrap();
    d.set_field(PathKey::ChildBranchId, Value::Id("b2".into())).unwrap();
    d.set_field(PathKey::Marker, Value::U64(77)).unwrap();
    d.end(PathKey::HlBranchAdded).unwrap();

    let (recorder, ids) = d.finish().unwrap();
    let branch = &recorder.branches[0];
    assert_eq!(branch.owner, ObjectId(BASE_ID));
    assert_eq!(branch.children.len(), 1);
    assert_eq!(branch.markers, vec![77]);
    assert_eq!(ids.lookup_existing("m1", Category::Metafile), Ok(branch.owner));
}

#[test]
fn id_table_survives_across_decoders() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    d.end(PathKey::MaterialAdded).unwrap();
    let (_, ids) = d.finish().unwrap();

    let mut d = Decoder::new(Recorder::default()).with_ids(ids);
    d.begin(PathKey::MaterialModified).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    d.end(PathKey::MaterialModified).unwrap();
    let (recorder, _) = d.finish().unwrap();
    assert_eq!(recorder.events, vec![format!("material_modified #{BASE_ID}")]);
}

// ----------------------------------------------------------------------
// Scope discipline
// ----------------------------------------------------------------------

#[test]
fn two_open_records_are_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d.begin(PathKey::LayerAdded).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { key: PathKey::LayerAdded, .. }));
}

#[test]
fn mismatched_end_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d.end(PathKey::LayerAdded).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { .. }));
    assert!(d.consumer().events.is_empty());
}

#[test]
fn field_outside_any_scope_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    let err = d
        .set_field(PathKey::AmbientColor, Value::F32Array(vec![0.0; 3]))
        .unwrap_err();
    assert!(matches!(err, DecodeError::Structural { .. }));
}

#[test]
fn finish_with_open_record_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d.finish().unwrap_err();
    assert!(matches!(err, DecodeError::Structural { key: PathKey::MaterialAdded, .. }));
}

#[test]
fn nested_scope_requires_its_parent() {
    let mut d = Decoder::new(Recorder::default());
    let err = d.begin(PathKey::ViewParams).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { .. }));

    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d.begin(PathKey::MetafileStream).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { .. }));
}

#[test]
fn error_positions_count_events() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    let err = d.end(PathKey::LayerAdded).unwrap_err();
    assert_eq!(err.position(), 3);
    assert_eq!(err.key(), PathKey::LayerAdded);
}

// ----------------------------------------------------------------------
// Nested scope folding
// ----------------------------------------------------------------------

#[test]
fn view_params_fold_into_viewport() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::ViewportAdded).unwrap();
    d.set_field(PathKey::ViewportId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::ViewParams).unwrap();
    d.set_field(PathKey::ViewPosition, Value::F32Array(vec![0.0, 0.0, 5.0]))
        .unwrap();
    d.set_field(PathKey::Perspective, Value::Bool(true)).unwrap();
    d.set_field(PathKey::FieldWidth, Value::F64(2.5)).unwrap();
    d.end(PathKey::ViewParams).unwrap();
    d.end(PathKey::ViewportAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let view = &recorder.viewports[0].view;
    assert_eq!(view.position, [0.0, 0.0, 5.0]);
    assert!(view.perspective);
    assert_eq!(view.field_width, 2.5);
}

#[test]
fn properties_fold_into_visual_style() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::VisualStyleAdded).unwrap();
    d.set_field(PathKey::VisualStyleId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::Property).unwrap();
    d.set_field(PathKey::PropertyIndex, Value::U32(2)).unwrap();
    d.set_field(PathKey::PropertyDouble, Value::F64(0.5)).unwrap();
    d.end(PathKey::Property).unwrap();
    d.end(PathKey::VisualStyleAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let style = &recorder.styles[0];
    assert_eq!(style.properties.len(), 3);
    assert_eq!(style.properties[2], Some(StyleProperty::Double(0.5)));
}

#[test]
fn incomplete_property_scope_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::VisualStyleAdded).unwrap();
    d.set_field(PathKey::VisualStyleId, Value::Id("1".into())).unwrap();
    d.begin(PathKey::Property).unwrap();
    d.set_field(PathKey::PropertyIndex, Value::U32(0)).unwrap();
    let err = d.end(PathKey::Property).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { key: PathKey::Property, .. }));
}

// ----------------------------------------------------------------------
// Lights
// ----------------------------------------------------------------------

#[test]
fn light_entries_are_delimited_by_index() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::ViewportAdded).unwrap();
    d.set_field(PathKey::ViewportId, Value::Id("1".into())).unwrap();
    d.end(PathKey::ViewportAdded).unwrap();

    d.begin(PathKey::LightsListChanged).unwrap();
    d.set_field(PathKey::ViewportId, Value::Id("1".into())).unwrap();
    d.set_field(PathKey::LightIndex, Value::U32(0)).unwrap();
    d.set_field(PathKey::LightPosition, Value::F32Array(vec![1.0, 0.0, 0.0]))
        .unwrap();
    d.set_field(PathKey::LightIndex, Value::U32(1)).unwrap();
    d.set_field(PathKey::LightOn, Value::Bool(false)).unwrap();
    d.end(PathKey::LightsListChanged).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let lights = &recorder.lights[0].lights;
    assert_eq!(lights.len(), 2);
    assert_eq!(lights[0].position, [1.0, 0.0, 0.0]);
    assert!(lights[0].on);
    assert!(!lights[1].on);
    assert_eq!(lights[1].intensity, 1.0);
}

#[test]
fn light_field_before_any_index_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::LightsListChanged).unwrap();
    let err = d.set_field(PathKey::LightOn, Value::Bool(true)).unwrap_err();
    assert!(matches!(err, DecodeError::Structural { key: PathKey::LightOn, .. }));
}

#[test]
fn light_field_in_a_non_lights_record_is_structural() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d
        .set_field(PathKey::LightIntensity, Value::F32(0.5))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Structural {
            key: PathKey::LightIntensity,
            ..
        }
    ));
}

// ----------------------------------------------------------------------
// Wire type handling
// ----------------------------------------------------------------------

#[test]
fn doubles_demote_for_single_precision_fields() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    d.set_field(PathKey::MaterialId, Value::Id("5".into())).unwrap();
    d.set_field(PathKey::SpecularGloss, Value::F64(0.5)).unwrap();
    d.set_field(
        PathKey::DiffuseColor,
        Value::F64Array(vec![0.25, 0.5, 0.75]),
    )
    .unwrap();
    d.end(PathKey::MaterialAdded).unwrap();

    let (recorder, _) = d.finish().unwrap();
    let m = &recorder.materials[0];
    assert_eq!(m.specular_gloss, 0.5);
    assert_eq!(m.diffuse, [0.25, 0.5, 0.75]);
}

#[test]
fn unhandled_wire_type_is_a_schema_error() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d
        .set_field(PathKey::AmbientColor, Value::Bool(true))
        .unwrap_err();
    assert!(matches!(err, DecodeError::Schema { key: PathKey::AmbientColor, .. }));
}

#[test]
fn wrong_length_fixed_array_is_a_size_error() {
    let mut d = Decoder::new(Recorder::default());
    d.begin(PathKey::MaterialAdded).unwrap();
    let err = d
        .set_field(PathKey::AmbientColor, Value::F32Array(vec![0.0; 4]))
        .unwrap_err();
    assert!(matches!(
        err,
        DecodeError::Size {
            expected: 3,
            actual: 4,
            ..
        }
    ));
}
