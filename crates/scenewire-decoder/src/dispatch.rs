//! Typed field dispatch.
//!
//! Routes each `(PathKey, Value)` pair to the open builder that owns it and
//! coerces the wire value to the field's declared type. A key arriving with
//! a wire type no handler accepts is a [`DecodeError::Schema`]; a key whose
//! owning scope is not open is a [`DecodeError::Structural`].
//!
//! Doubles are demoted to f32 on arrival unless the field is one of the
//! few that keep full precision (view field extents, clip distances,
//! double-typed style properties, extents corners). Demotion is logged at
//! debug level, never silent.

use scenewire_bytecode::{ArrayKind, ProgramWriter, WriteError};
use scenewire_core::{Category, IdentityRegistry, ObjectId, PathKey, Rgba, Value, WireType};

use crate::consumer::RenditionConsumer;
use crate::error::DecodeError;
use crate::machine::{ArrayBuilder, Decoder, IdMode, PropertyBuilder, RecordBuilder, SubScope};
use crate::records::{Light, StyleProperty, ViewParams};

fn is_stream_key(key: PathKey) -> bool {
    use PathKey::*;
    matches!(
        key,
        StreamColor
            | PushMatrix
            | PopMatrix
            | VPoint
            | VLine
            | IPoint
            | ILine
            | LineStyle
            | LineWeight
            | GeometryMarker
            | SelectionMarker
            | SelectionFlags
            | EnableArray
            | DisableArray
            | DrawArrays
            | DrawElements
            | CullFace
            | Stipple
            | HlrStencil
            | Shading
            | Program
            | StreamVisualStyle
            | UserEntry
    )
}

fn is_array_key(key: PathKey) -> bool {
    use PathKey::*;
    matches!(key, ArrayType | ArraySize | ArrayData | ArrayOffset)
}

fn is_view_key(key: PathKey) -> bool {
    use PathKey::*;
    matches!(
        key,
        ViewPosition
            | ViewTarget
            | ViewUpVector
            | FieldWidth
            | FieldHeight
            | Perspective
            | FrontClip
            | BackClip
            | ClipEnabled
    )
}

fn is_property_key(key: PathKey) -> bool {
    use PathKey::*;
    matches!(
        key,
        PropertyIndex | PropertyBool | PropertyInt | PropertyDouble | PropertyColor
            | PropertyString
    )
}

/// A payload too long for its opcode's length prefix surfaces as a Size
/// error against the field that carried it.
fn oversize(key: PathKey, position: u64, err: WriteError) -> DecodeError {
    let (WriteError::PatternTooLong { actual, limit }
    | WriteError::EntryTooLong { actual, limit }) = err;
    DecodeError::Size {
        key,
        position,
        expected: limit,
        actual,
    }
}

fn demote(key: PathKey, v: f64) -> f32 {
    log::debug!("demoting f64 field {key:?} ({v}) to f32");
    v as f32
}

fn demote_all(key: PathKey, values: &[f64]) -> Vec<f32> {
    log::debug!(
        "demoting f64 array field {key:?} ({} elements) to f32",
        values.len()
    );
    values.iter().map(|&v| v as f32).collect()
}

/// How an identifier field resolves, given the record it appears in.
///
/// Subject keys of introducing records must be new; subject keys of
/// mutating records must exist; references to entities a record may
/// legitimately name before their own introduction are get-or-create.
fn id_mode(record_key: PathKey, key: PathKey) -> IdMode {
    use PathKey::*;
    match (record_key, key) {
        (MaterialAdded, MaterialId)
        | (TextureAdded, TextureId)
        | (OverlayAdded, OverlayId)
        | (ViewportAdded | ViewportInserted, ViewportId)
        | (VisualStyleAdded, VisualStyleId)
        | (LayerAdded, LayerId)
        | (MetafileAdded, MetafileId)
        | (HlBranchAdded, HlBranchId) => IdMode::New,
        (_, DiffuseTextureId | ChildBranchId | ParentBranchId) => IdMode::GetOrCreate,
        (OverlayAdded, ViewportId) => IdMode::GetOrCreate,
        (HlBranchAdded | HlBranchModified, MetafileId) => IdMode::GetOrCreate,
        (MetafileAdded, VisualStyleId | LayerId) => IdMode::GetOrCreate,
        (BackgroundChanged, BackgroundId) => IdMode::GetOrCreate,
        _ => IdMode::Existing,
    }
}

impl<C: RenditionConsumer, R: IdentityRegistry> Decoder<C, R> {
    /// Deliver one field value to the innermost open scope that owns it.
    pub fn set_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        self.position += 1;
        if key.is_scope() {
            return Err(self.structural(key, "scope key cannot carry a field value"));
        }
        if is_stream_key(key) {
            self.stream_field(key, value)
        } else if is_array_key(key) {
            self.array_field(key, value)
        } else if is_view_key(key) {
            self.view_field(key, value)
        } else if is_property_key(key) {
            self.property_field(key, value)
        } else {
            self.record_field(key, value)
        }
    }

    // ------------------------------------------------------------------
    // Scope accessors
    // ------------------------------------------------------------------

    fn builder_mut(&mut self, key: PathKey) -> Result<&mut RecordBuilder, DecodeError> {
        let position = self.position;
        match &mut self.open {
            Some(open) => Ok(&mut open.record),
            None => Err(DecodeError::Structural {
                key,
                position,
                detail: "field outside any open record",
            }),
        }
    }

    fn view_mut(&mut self, key: PathKey) -> Result<&mut ViewParams, DecodeError> {
        let position = self.position;
        match &mut self.sub {
            Some(SubScope::ViewParams(view)) => Ok(view),
            _ => Err(DecodeError::Structural {
                key,
                position,
                detail: "view field outside a view params scope",
            }),
        }
    }

    fn property_mut(&mut self, key: PathKey) -> Result<&mut PropertyBuilder, DecodeError> {
        let position = self.position;
        match &mut self.sub {
            Some(SubScope::Property(prop)) => Ok(prop),
            _ => Err(DecodeError::Structural {
                key,
                position,
                detail: "property field outside a property scope",
            }),
        }
    }

    fn array_mut(&mut self, key: PathKey) -> Result<&mut ArrayBuilder, DecodeError> {
        let position = self.position;
        match &mut self.sub {
            Some(SubScope::Array(array)) => Ok(array),
            _ => Err(DecodeError::Structural {
                key,
                position,
                detail: "array field outside an array scope",
            }),
        }
    }

    fn writer_mut(&mut self, key: PathKey) -> Result<&mut ProgramWriter, DecodeError> {
        let position = self.position;
        match &mut self.stream {
            Some(writer) => Ok(writer),
            None => Err(DecodeError::Structural {
                key,
                position,
                detail: "drawing field outside a metafile stream",
            }),
        }
    }

    fn wrong_record(&self, key: PathKey) -> DecodeError {
        self.structural(key, "field does not apply to the open record")
    }

    // ------------------------------------------------------------------
    // Value coercion
    // ------------------------------------------------------------------

    fn as_bool(&self, key: PathKey, value: Value) -> Result<bool, DecodeError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_color(&self, key: PathKey, value: Value) -> Result<Rgba, DecodeError> {
        match value {
            Value::Color(c) => Ok(c),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_u8(&self, key: PathKey, value: Value) -> Result<u8, DecodeError> {
        match value {
            Value::U8(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_u16(&self, key: PathKey, value: Value) -> Result<u16, DecodeError> {
        match value {
            Value::U16(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_u32(&self, key: PathKey, value: Value) -> Result<u32, DecodeError> {
        match value {
            Value::U32(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_u64(&self, key: PathKey, value: Value) -> Result<u64, DecodeError> {
        match value {
            Value::U64(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_i16(&self, key: PathKey, value: Value) -> Result<i16, DecodeError> {
        match value {
            Value::I16(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_i32(&self, key: PathKey, value: Value) -> Result<i32, DecodeError> {
        match value {
            Value::I32(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_f32(&self, key: PathKey, value: Value) -> Result<f32, DecodeError> {
        match value {
            Value::F32(v) => Ok(v),
            Value::F64(v) => Ok(demote(key, v)),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_f64(&self, key: PathKey, value: Value) -> Result<f64, DecodeError> {
        match value {
            Value::F64(v) => Ok(v),
            Value::F32(v) => Ok(f64::from(v)),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_bytes(&self, key: PathKey, value: Value) -> Result<Vec<u8>, DecodeError> {
        match value {
            Value::Bytes(v) => Ok(v),
            other => Err(self.schema(key, other.wire_type())),
        }
    }

    fn as_text(&self, key: PathKey, value: Value) -> Result<String, DecodeError> {
        let bytes = self.as_bytes(key, value)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn fixed_f32s<const N: usize>(
        &self,
        key: PathKey,
        value: Value,
    ) -> Result<[f32; N], DecodeError> {
        let floats: Vec<f32> = match value {
            Value::F32Array(v) => v,
            Value::F64Array(v) => demote_all(key, &v),
            other => return Err(self.schema(key, other.wire_type())),
        };
        let actual = floats.len();
        floats.try_into().map_err(|_| DecodeError::Size {
            key,
            position: self.position,
            expected: N,
            actual,
        })
    }

    fn fixed_f64s<const N: usize>(
        &self,
        key: PathKey,
        value: Value,
    ) -> Result<[f64; N], DecodeError> {
        let floats: Vec<f64> = match value {
            Value::F64Array(v) => v,
            Value::F32Array(v) => v.into_iter().map(f64::from).collect(),
            other => return Err(self.schema(key, other.wire_type())),
        };
        let actual = floats.len();
        floats.try_into().map_err(|_| DecodeError::Size {
            key,
            position: self.position,
            expected: N,
            actual,
        })
    }

    fn fixed_u16s<const N: usize>(
        &self,
        key: PathKey,
        value: Value,
    ) -> Result<[u16; N], DecodeError> {
        let words = match value {
            Value::U16Array(v) => v,
            other => return Err(self.schema(key, other.wire_type())),
        };
        let actual = words.len();
        words.try_into().map_err(|_| DecodeError::Size {
            key,
            position: self.position,
            expected: N,
            actual,
        })
    }

    fn array_kind(&self, key: PathKey, byte: u8) -> Result<ArrayKind, DecodeError> {
        ArrayKind::from_u8(byte).ok_or_else(|| self.structural(key, "unknown array kind byte"))
    }

    // ------------------------------------------------------------------
    // Record fields
    // ------------------------------------------------------------------

    fn record_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        let Some(record_key) = self.open.as_ref().map(|o| o.key) else {
            return Err(self.structural(key, "field outside any open record"));
        };
        match value {
            Value::Id(raw) => self.record_id_field(record_key, key, raw),
            Value::OwnerRef(owner) => self.record_owner_field(key, owner),
            value => self.record_plain_field(key, value),
        }
    }

    fn record_id_field(
        &mut self,
        record_key: PathKey,
        key: PathKey,
        raw: String,
    ) -> Result<(), DecodeError> {
        use PathKey::*;
        let category = match key {
            MaterialId => Category::Material,
            TextureId | DiffuseTextureId => Category::Texture,
            MetafileId => Category::Metafile,
            ViewportId | SourceViewportId => Category::Viewport,
            VisualStyleId => Category::VisualStyle,
            LayerId => Category::Layer,
            OverlayId => Category::Overlay,
            HlBranchId | ChildBranchId | ParentBranchId => Category::HlBranch,
            BackgroundId => Category::Background,
            _ => return Err(self.schema(key, WireType::Id)),
        };
        let mode = id_mode(record_key, key);
        let id = self.resolve_id(key, &raw, category, mode)?;
        self.store_id(key, id)
    }

    fn store_id(&mut self, key: PathKey, id: ObjectId) -> Result<(), DecodeError> {
        use PathKey::*;
        use RecordBuilder as B;
        match (self.builder_mut(key)?, key) {
            (B::Material(def), MaterialId) => def.id = id,
            (B::Material(def), DiffuseTextureId) => def.diffuse_texture = id,
            (B::Texture(def), TextureId) => def.id = id,
            (B::Overlay(def), OverlayId) => def.id = id,
            (B::Overlay(def), ViewportId) => def.viewport = id,
            (B::VpOverride(def), OverlayId) => def.overlay = id,
            (B::VpOverride(def), ViewportId) => def.viewport = id,
            (B::Viewport(def), ViewportId) => def.id = id,
            (B::VisualStyle(def), VisualStyleId) => def.id = id,
            (B::Layer(def), LayerId) => def.id = id,
            (B::LayerVpOverride(def), LayerId) => def.layer = id,
            (B::LayerVpOverride(def), ViewportId) => def.viewport = id,
            (B::Metafile(def), MetafileId) => def.id = id,
            (B::Metafile(def), LayerId) => def.layer = id,
            (B::Metafile(def), VisualStyleId) => def.visual_style = id,
            (B::HlBranch(def), HlBranchId) => def.id = id,
            (B::HlBranch(def), MetafileId) => def.owner = id,
            (B::HlBranch(def), ParentBranchId) => def.parent = id,
            (B::HlBranch(def), ChildBranchId) => def.children.push(id),
            (B::HlLink(def), MetafileId) => def.metafile = id,
            (B::HlLink(def), HlBranchId) => def.branch = id,
            (B::Extents(def), ViewportId) => def.viewport = id,
            (B::Order(def), ViewportId) => def.viewport = id,
            (B::Order(def), OverlayId) => def.overlay = id,
            (B::Order(def), MetafileId) => def.order.push(id),
            (B::OrderInheritance(def), ViewportId) => def.viewport = id,
            (B::OrderInheritance(def), SourceViewportId) => def.source_viewport = id,
            (B::OrderInheritance(def), OverlayId) => def.overlay = id,
            (B::Lights(def), ViewportId) => def.viewport = id,
            (B::Background(def), BackgroundId) => def.id = id,
            _ => return Err(self.wrong_record(key)),
        }
        Ok(())
    }

    fn record_owner_field(&mut self, key: PathKey, owner: String) -> Result<(), DecodeError> {
        if key != PathKey::OwnerId {
            return Err(self.schema(key, WireType::OwnerRef));
        }
        match self.builder_mut(key)? {
            RecordBuilder::Metafile(def) => def.owner = owner,
            _ => return Err(self.wrong_record(key)),
        }
        Ok(())
    }

    fn record_plain_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        use PathKey::*;
        use RecordBuilder as B;
        match key {
            AmbientColor | DiffuseColor | SpecularColor | EmissionColor => {
                let rgb = self.fixed_f32s::<3>(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Material(def), AmbientColor) => def.ambient = rgb,
                    (B::Material(def), DiffuseColor) => def.diffuse = rgb,
                    (B::Material(def), SpecularColor) => def.specular = rgb,
                    (B::Material(def), _) => def.emission = rgb,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            SpecularGloss | Opacity => {
                let v = self.as_f32(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Material(def), SpecularGloss) => def.specular_gloss = v,
                    (B::Material(def), _) => def.opacity = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            TextureWidth | TextureHeight => {
                let v = self.as_u32(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Texture(def), TextureWidth) => def.width = v,
                    (B::Texture(def), _) => def.height = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            TexturePixels => {
                let bytes = self.as_bytes(key, value)?;
                match self.builder_mut(key)? {
                    B::Texture(def) => def.pixels = bytes,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            BorderVisible => {
                let v = self.as_bool(key, value)?;
                match self.builder_mut(key)? {
                    B::Viewport(def) => def.border_visible = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            BorderColor => {
                let c = self.as_color(key, value)?;
                match self.builder_mut(key)? {
                    B::Viewport(def) => def.border_color = c,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            BorderWidth => {
                let v = self.as_u16(key, value)?;
                match self.builder_mut(key)? {
                    B::Viewport(def) => def.border_width = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            ViewportRect => {
                let rect = self.fixed_f32s::<4>(key, value)?;
                match self.builder_mut(key)? {
                    B::Viewport(def) => def.rect = rect,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            InsertIndex => {
                let v = self.as_u32(key, value)?;
                match self.builder_mut(key)? {
                    B::Viewport(def) => def.insert_index = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            OverlayVisible => {
                let v = self.as_bool(key, value)?;
                match self.builder_mut(key)? {
                    B::Overlay(def) => def.visible = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            OverlayRenderOrder => {
                let v = self.as_i16(key, value)?;
                match self.builder_mut(key)? {
                    B::Overlay(def) => def.render_order = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            OverlayFlags => {
                let v = self.as_u16(key, value)?;
                match self.builder_mut(key)? {
                    B::Overlay(def) => def.flags = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            LayerName => {
                let name = self.as_text(key, value)?;
                match self.builder_mut(key)? {
                    B::Layer(def) => def.name = name,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            LayerVisible | LayerFaded => {
                let v = self.as_bool(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Layer(def), LayerVisible) => def.visible = v,
                    (B::Layer(def), _) => def.faded = v,
                    (B::LayerVpOverride(def), LayerVisible) => def.visible = v,
                    (B::LayerVpOverride(def), _) => def.faded = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            MetafileFlags => {
                let v = self.as_u16(key, value)?;
                match self.builder_mut(key)? {
                    B::Metafile(def) => def.flags = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            MetafileVisible | MetafileHighlighted | MetafileFaded => {
                let v = self.as_bool(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Metafile(def), MetafileVisible) => def.visible = v,
                    (B::Metafile(def), MetafileHighlighted) => def.highlighted = v,
                    (B::Metafile(def), _) => def.faded = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            Marker => {
                let v = self.as_u64(key, value)?;
                match self.builder_mut(key)? {
                    B::HlBranch(def) => def.markers.push(v),
                    _ => return Err(self.wrong_record(key)),
                }
            }

            SurfaceWidth | SurfaceHeight => {
                let v = self.as_u32(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Surface(def), SurfaceWidth) => def.width = v,
                    (B::Surface(def), _) => def.height = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            SurfaceColor => {
                let c = self.as_color(key, value)?;
                match self.builder_mut(key)? {
                    B::Surface(def) => def.color = c,
                    _ => return Err(self.wrong_record(key)),
                }
            }
            DoubleBuffer => {
                let v = self.as_bool(key, value)?;
                match self.builder_mut(key)? {
                    B::Surface(def) => def.double_buffer = v,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            // Extents corners keep full f64 precision.
            ExtentsMin | ExtentsMax => {
                let corner = self.fixed_f64s::<3>(key, value)?;
                match (self.builder_mut(key)?, key) {
                    (B::Extents(def), ExtentsMin) => def.min = corner,
                    (B::Extents(def), _) => def.max = corner,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            LightIndex => {
                let index = self.as_u32(key, value)?;
                match self.builder_mut(key)? {
                    // Each index field opens a new light entry; the fields
                    // that follow apply to it until the next index.
                    B::Lights(def) => def.lights.push(Light::new(index)),
                    _ => return Err(self.wrong_record(key)),
                }
            }
            LightPosition => {
                let p = self.fixed_f32s::<3>(key, value)?;
                self.light_mut(key)?.position = p;
            }
            LightColor => {
                let c = self.as_color(key, value)?;
                self.light_mut(key)?.color = c;
            }
            LightType => {
                let v = self.as_u8(key, value)?;
                self.light_mut(key)?.kind = v;
            }
            LightIntensity => {
                let v = self.as_f32(key, value)?;
                self.light_mut(key)?.intensity = v;
            }
            LightOn => {
                let v = self.as_bool(key, value)?;
                self.light_mut(key)?.on = v;
            }

            BackgroundColor => {
                let c = self.as_color(key, value)?;
                match self.builder_mut(key)? {
                    B::Background(def) => def.color = c,
                    _ => return Err(self.wrong_record(key)),
                }
            }

            _ => return Err(self.schema(key, value.wire_type())),
        }
        Ok(())
    }

    fn light_mut(&mut self, key: PathKey) -> Result<&mut Light, DecodeError> {
        let position = self.position;
        let lights = match self.builder_mut(key)? {
            RecordBuilder::Lights(def) => &mut def.lights,
            // Inline error: the builder borrow lives as long as the
            // returned light, so no `self` method may run here.
            _ => {
                return Err(DecodeError::Structural {
                    key,
                    position,
                    detail: "field does not apply to the open record",
                });
            }
        };
        lights.last_mut().ok_or(DecodeError::Structural {
            key,
            position,
            detail: "light field before any light index",
        })
    }

    // ------------------------------------------------------------------
    // View params fields
    // ------------------------------------------------------------------

    fn view_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        use PathKey::*;
        match key {
            ViewPosition | ViewTarget | ViewUpVector => {
                let v = self.fixed_f32s::<3>(key, value)?;
                let view = self.view_mut(key)?;
                match key {
                    ViewPosition => view.position = v,
                    ViewTarget => view.target = v,
                    _ => view.up = v,
                }
            }
            // Full-precision fields: doubles pass through undemoted.
            FieldWidth => {
                let v = self.as_f64(key, value)?;
                self.view_mut(key)?.field_width = v;
            }
            FieldHeight => {
                let v = self.as_f64(key, value)?;
                self.view_mut(key)?.field_height = v;
            }
            FrontClip => {
                let v = self.as_f64(key, value)?;
                self.view_mut(key)?.front_clip = v;
            }
            BackClip => {
                let v = self.as_f64(key, value)?;
                self.view_mut(key)?.back_clip = v;
            }
            Perspective => {
                let v = self.as_bool(key, value)?;
                self.view_mut(key)?.perspective = v;
            }
            ClipEnabled => {
                let v = self.as_bool(key, value)?;
                self.view_mut(key)?.clip_enabled = v;
            }
            _ => unreachable!("not a view field: {key:?}"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Visual style property fields
    // ------------------------------------------------------------------

    fn property_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        use PathKey::*;
        match key {
            PropertyIndex => {
                let index = self.as_u32(key, value)?;
                self.property_mut(key)?.index = Some(index);
            }
            PropertyBool => {
                let v = self.as_bool(key, value)?;
                self.property_mut(key)?.value = Some(StyleProperty::Bool(v));
            }
            PropertyInt => {
                let v = self.as_i32(key, value)?;
                self.property_mut(key)?.value = Some(StyleProperty::Int(v));
            }
            PropertyDouble => {
                let v = self.as_f64(key, value)?;
                self.property_mut(key)?.value = Some(StyleProperty::Double(v));
            }
            PropertyColor => {
                let c = self.as_color(key, value)?;
                self.property_mut(key)?.value = Some(StyleProperty::Color(c));
            }
            PropertyString => {
                let text = self.as_text(key, value)?;
                self.property_mut(key)?.value = Some(StyleProperty::Text(text));
            }
            _ => unreachable!("not a property field: {key:?}"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Array fields
    // ------------------------------------------------------------------

    fn array_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        use PathKey::*;
        match key {
            ArrayType => {
                let byte = self.as_u8(key, value)?;
                let kind = self.array_kind(key, byte)?;
                self.array_mut(key)?.kind = Some(kind);
            }
            ArraySize => {
                let count = self.as_u32(key, value)?;
                self.array_mut(key)?.count = Some(count);
            }
            ArrayData => {
                let data = self.as_bytes(key, value)?;
                self.array_mut(key)?.data = Some(data);
            }
            ArrayOffset => {
                let offset = self.fixed_f32s::<3>(key, value)?;
                self.array_mut(key)?.offset = Some(offset);
            }
            _ => unreachable!("not an array field: {key:?}"),
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Metafile stream drawing fields
    // ------------------------------------------------------------------

    fn stream_field(&mut self, key: PathKey, value: Value) -> Result<(), DecodeError> {
        use PathKey::*;
        if self.sub.is_some() {
            return Err(self.structural(key, "drawing field inside an array scope"));
        }
        match key {
            StreamColor => {
                let c = self.as_color(key, value)?;
                self.writer_mut(key)?.color(c);
            }
            PushMatrix => {
                let wire_type = value.wire_type();
                let Value::Matrix(m) = value else {
                    return Err(self.schema(key, wire_type));
                };
                self.writer_mut(key)?.push_matrix(&m);
            }
            PopMatrix => {
                self.as_bool(key, value)?;
                self.writer_mut(key)?.pop_matrix();
            }
            VPoint => {
                let p = self.fixed_f32s::<3>(key, value)?;
                self.writer_mut(key)?.vpoint(p);
            }
            VLine => {
                let ends = self.fixed_f32s::<6>(key, value)?;
                let from = [ends[0], ends[1], ends[2]];
                let to = [ends[3], ends[4], ends[5]];
                self.writer_mut(key)?.vline(from, to);
            }
            IPoint => {
                let index = self.as_u32(key, value)?;
                self.writer_mut(key)?.ipoint(index);
            }
            ILine => {
                let ends = self.fixed_u16s::<2>(key, value)?;
                self.writer_mut(key)?
                    .iline(u32::from(ends[0]), u32::from(ends[1]));
            }
            LineStyle => {
                let style = self.as_u8(key, value)?;
                self.writer_mut(key)?.line_style(style);
            }
            LineWeight => {
                let weight = self.as_f32(key, value)?;
                self.writer_mut(key)?.line_weight(weight);
            }
            GeometryMarker => {
                let marker = self.as_u64(key, value)?;
                self.writer_mut(key)?.geometry_marker(marker);
            }
            SelectionMarker => {
                let marker = self.as_u64(key, value)?;
                self.writer_mut(key)?.selection_marker(marker);
            }
            SelectionFlags => {
                let flags = self.as_u8(key, value)?;
                self.writer_mut(key)?.selection_flags(flags);
            }
            EnableArray => {
                let byte = self.as_u8(key, value)?;
                let kind = self.array_kind(key, byte)?;
                self.writer_mut(key)?.enable_array(kind);
            }
            DisableArray => {
                let byte = self.as_u8(key, value)?;
                let kind = self.array_kind(key, byte)?;
                self.writer_mut(key)?.disable_array(kind);
            }
            DrawArrays => {
                // Wire form is three u16 words: mode, first, count.
                let words = self.fixed_u16s::<3>(key, value)?;
                self.writer_mut(key)?.draw_arrays(
                    words[0] as u8,
                    u32::from(words[1]),
                    u32::from(words[2]),
                );
            }
            DrawElements => {
                // Wire form is three u16 words: mode, count, array slot.
                let words = self.fixed_u16s::<3>(key, value)?;
                self.writer_mut(key)?.draw_elements(
                    words[0] as u8,
                    u32::from(words[1]),
                    u32::from(words[2]),
                );
            }
            CullFace => {
                let mode = self.as_u8(key, value)?;
                self.writer_mut(key)?.cull_face(mode);
            }
            Stipple => {
                let pattern = self.as_bytes(key, value)?;
                let position = self.position;
                self.writer_mut(key)?
                    .stipple(&pattern)
                    .map_err(|e| oversize(key, position, e))?;
            }
            HlrStencil => {
                let state = self.as_u8(key, value)?;
                self.writer_mut(key)?.hlr_stencil(state);
            }
            Shading => {
                let enabled = self.as_bool(key, value)?;
                self.writer_mut(key)?.shading(enabled);
            }
            Program => {
                let id = self.as_u32(key, value)?;
                self.writer_mut(key)?.program(id);
            }
            StreamVisualStyle => {
                let wire_type = value.wire_type();
                let Value::Id(raw) = value else {
                    return Err(self.schema(key, wire_type));
                };
                let id = self.resolve_id(key, &raw, Category::VisualStyle, IdMode::GetOrCreate)?;
                self.writer_mut(key)?.bind_visual_style(id);
            }
            UserEntry => {
                let data = self.as_bytes(key, value)?;
                let position = self.position;
                self.writer_mut(key)?
                    .user_entry(&data)
                    .map_err(|e| oversize(key, position, e))?;
            }
            _ => unreachable!("not a drawing field: {key:?}"),
        }
        Ok(())
    }
}
