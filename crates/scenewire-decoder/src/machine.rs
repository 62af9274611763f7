//! The record state machine.
//!
//! Owns the transient definition builders, routes scope events, and
//! dispatches exactly one consumer call per finalized record. The single
//! `Option<OpenScope>` slot makes simultaneously open records
//! unrepresentable; nested sub-scopes layer on top of it.

use scenewire_bytecode::{ArrayError, ArrayKind, ProgramWriter};
use scenewire_core::{
    Category, IdError, IdTable, IdentityRegistry, NullRegistry, ObjectId, PathKey, Scope,
    WireType,
};

use crate::consumer::RenditionConsumer;
use crate::error::DecodeError;
use crate::records::{
    BackgroundDef, ExtentsDef, HlBranchDef, HlLinkDef, LayerDef, LayerViewportOverrideDef,
    LightsDef, MaterialDef, MetafileDef, MetafileOrderDef, OrderInheritanceDef, OverlayDef,
    StyleProperty, SurfaceDef, TextureDef, ViewParams, ViewParamsOverrideDef, ViewportDef,
    VisualStyleDef,
};

/// The one definition currently under construction.
#[derive(Debug)]
pub(crate) enum RecordBuilder {
    Material(MaterialDef),
    Texture(TextureDef),
    Overlay(OverlayDef),
    Viewport(ViewportDef),
    VpOverride(ViewParamsOverrideDef),
    VisualStyle(VisualStyleDef),
    Layer(LayerDef),
    LayerVpOverride(LayerViewportOverrideDef),
    Metafile(MetafileDef),
    HlBranch(HlBranchDef),
    HlLink(HlLinkDef),
    Surface(SurfaceDef),
    Extents(ExtentsDef),
    Order(MetafileOrderDef),
    OrderInheritance(OrderInheritanceDef),
    Lights(LightsDef),
    Background(BackgroundDef),
}

impl RecordBuilder {
    /// Fresh builder with declared defaults for a record-scope key.
    fn for_record(key: PathKey) -> Self {
        use PathKey::*;
        match key {
            MaterialAdded | MaterialDeleted | MaterialModified => {
                Self::Material(MaterialDef::default())
            }
            TextureAdded | TextureDeleted | TextureModified => {
                Self::Texture(TextureDef::default())
            }
            OverlayAdded | OverlayDeleted | OverlayVisibilityChanged
            | OverlayRenderOrderChanged => Self::Overlay(OverlayDef::default()),
            OverlayViewParamsOverride => Self::VpOverride(ViewParamsOverrideDef::default()),
            ViewportAdded | ViewportDeleted | ViewportModified | ViewportInserted => {
                Self::Viewport(ViewportDef::default())
            }
            VisualStyleAdded | VisualStyleDeleted | VisualStyleModified => {
                Self::VisualStyle(VisualStyleDef::default())
            }
            LayerAdded | LayerDeleted | LayerModified => Self::Layer(LayerDef::default()),
            LayerViewportOverride => Self::LayerVpOverride(LayerViewportOverrideDef::default()),
            MetafileAdded | MetafileDeleted | MetafileVisibilityChanged
            | MetafileHighlightingChanged | MetafileFadingChanged => {
                Self::Metafile(MetafileDef::default())
            }
            HlBranchAdded | HlBranchModified | HlBranchDeleted => {
                Self::HlBranch(HlBranchDef::default())
            }
            MetafileHlBranchAttached | MetafileHlBranchDetached => {
                Self::HlLink(HlLinkDef::default())
            }
            SurfaceChanged => Self::Surface(SurfaceDef::default()),
            ExtentsChanged => Self::Extents(ExtentsDef::default()),
            MetafileOrderChanged => Self::Order(MetafileOrderDef::default()),
            MetafileOrderInheritance => Self::OrderInheritance(OrderInheritanceDef::default()),
            LightsListChanged => Self::Lights(LightsDef::default()),
            BackgroundChanged => Self::Background(BackgroundDef::default()),
            // `for_record` is only reached for Scope::Record keys.
            _ => unreachable!("not a record-scope key: {key:?}"),
        }
    }
}

/// An open top-level record scope.
#[derive(Debug)]
pub(crate) struct OpenScope {
    pub(crate) key: PathKey,
    pub(crate) record: RecordBuilder,
}

/// Builder for one visual style property sub-scope.
#[derive(Debug, Default)]
pub(crate) struct PropertyBuilder {
    pub(crate) index: Option<u32>,
    pub(crate) value: Option<StyleProperty>,
}

/// Builder for one typed array sub-scope.
#[derive(Debug, Default)]
pub(crate) struct ArrayBuilder {
    pub(crate) kind: Option<ArrayKind>,
    pub(crate) count: Option<u32>,
    pub(crate) data: Option<Vec<u8>>,
    pub(crate) offset: Option<[f32; 3]>,
}

/// Nested sub-scope layered on an open record.
#[derive(Debug)]
pub(crate) enum SubScope {
    ViewParams(ViewParams),
    Property(PropertyBuilder),
    Array(ArrayBuilder),
}

/// How an identifier field resolves against the interner.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum IdMode {
    /// Introducing record: the key must be new to its category.
    New,
    /// Referencing record: the key must already be known.
    Existing,
    /// Intra-record reference: forward references allowed.
    GetOrCreate,
}

/// Streaming decoder for the path-keyed scene-update protocol.
///
/// Drive it with `begin`/`set_field`/`end` in stream order and call
/// [`Decoder::finish`] at end of stream. Not safe for concurrent use.
pub struct Decoder<C, R = NullRegistry> {
    consumer: C,
    registry: R,
    ids: IdTable,
    pub(crate) open: Option<OpenScope>,
    /// Program writer of the currently-open metafile stream, if any.
    pub(crate) stream: Option<ProgramWriter>,
    pub(crate) sub: Option<SubScope>,
    /// Events accepted so far; carried in every error.
    pub(crate) position: u64,
}

impl<C: RenditionConsumer> Decoder<C> {
    /// Decoder with a fresh id table and a discarding identity registry.
    pub fn new(consumer: C) -> Self {
        Self::with_registry(consumer, NullRegistry)
    }
}

impl<C: RenditionConsumer, R: IdentityRegistry> Decoder<C, R> {
    pub fn with_registry(consumer: C, registry: R) -> Self {
        Self {
            consumer,
            registry,
            ids: IdTable::new(),
            open: None,
            stream: None,
            sub: None,
            position: 0,
        }
    }

    /// Reuse an id table from an earlier decode, keeping ids stable across
    /// repeated or partial replays.
    pub fn with_ids(mut self, ids: IdTable) -> Self {
        self.ids = ids;
        self
    }

    pub fn consumer(&self) -> &C {
        &self.consumer
    }

    pub fn consumer_mut(&mut self) -> &mut C {
        &mut self.consumer
    }

    // ------------------------------------------------------------------
    // Error constructors
    // ------------------------------------------------------------------

    pub(crate) fn structural(&self, key: PathKey, detail: &'static str) -> DecodeError {
        DecodeError::Structural {
            key,
            position: self.position,
            detail,
        }
    }

    pub(crate) fn identifier(&self, key: PathKey, source: IdError) -> DecodeError {
        DecodeError::Identifier {
            key,
            position: self.position,
            source,
        }
    }

    pub(crate) fn schema(&self, key: PathKey, wire_type: WireType) -> DecodeError {
        DecodeError::Schema {
            key,
            position: self.position,
            wire_type,
        }
    }

    // ------------------------------------------------------------------
    // Scope operations
    // ------------------------------------------------------------------

    /// Open a scope.
    pub fn begin(&mut self, key: PathKey) -> Result<(), DecodeError> {
        self.position += 1;
        match key.scope() {
            Scope::Record => {
                if self.open.is_some() {
                    return Err(self.structural(key, "another record is already open"));
                }
                self.open = Some(OpenScope {
                    key,
                    record: RecordBuilder::for_record(key),
                });
                Ok(())
            }
            Scope::Nested => self.begin_nested(key),
            Scope::Field => Err(self.structural(key, "field key cannot open a scope")),
        }
    }

    fn begin_nested(&mut self, key: PathKey) -> Result<(), DecodeError> {
        if key == PathKey::MetafileStream {
            let parent_ok = matches!(
                self.open,
                Some(OpenScope {
                    key: PathKey::MetafileAdded | PathKey::BackgroundChanged,
                    ..
                })
            );
            if !parent_ok {
                return Err(
                    self.structural(key, "metafile stream requires an open metafile or background")
                );
            }
            if self.stream.is_some() {
                return Err(self.structural(key, "a metafile stream is already open"));
            }
            self.stream = Some(ProgramWriter::new());
            return Ok(());
        }

        if self.sub.is_some() {
            return Err(self.structural(key, "another sub-scope is already open"));
        }
        let sub = match key {
            PathKey::ViewParams => {
                let parent_ok = matches!(
                    self.open,
                    Some(OpenScope {
                        key: PathKey::ViewportAdded
                            | PathKey::ViewportModified
                            | PathKey::ViewportInserted
                            | PathKey::OverlayViewParamsOverride,
                        ..
                    })
                );
                if !parent_ok {
                    return Err(self.structural(
                        key,
                        "view params require an open viewport or overlay override",
                    ));
                }
                SubScope::ViewParams(ViewParams::default())
            }
            PathKey::Property => {
                let parent_ok = matches!(
                    self.open,
                    Some(OpenScope {
                        key: PathKey::VisualStyleAdded | PathKey::VisualStyleModified,
                        ..
                    })
                );
                if !parent_ok {
                    return Err(
                        self.structural(key, "property scope requires an open visual style")
                    );
                }
                SubScope::Property(PropertyBuilder::default())
            }
            PathKey::Array => {
                if self.stream.is_none() {
                    return Err(
                        self.structural(key, "array scope requires an open metafile stream")
                    );
                }
                SubScope::Array(ArrayBuilder::default())
            }
            _ => unreachable!("not a nested-scope key: {key:?}"),
        };
        self.sub = Some(sub);
        Ok(())
    }

    /// Close a scope, finalizing it.
    pub fn end(&mut self, key: PathKey) -> Result<(), DecodeError> {
        self.position += 1;
        match key.scope() {
            Scope::Record => self.end_record(key),
            Scope::Nested => self.end_nested(key),
            Scope::Field => Err(self.structural(key, "field key cannot close a scope")),
        }
    }

    fn end_record(&mut self, key: PathKey) -> Result<(), DecodeError> {
        if self.sub.is_some() {
            return Err(self.structural(key, "record closed with a sub-scope still open"));
        }
        if self.stream.is_some() {
            return Err(self.structural(key, "record closed with its metafile stream still open"));
        }
        match self.open.take() {
            Some(open) if open.key == key => {
                log::debug!("finalizing {key:?}");
                self.dispatch(open);
                Ok(())
            }
            Some(open) => {
                // Put it back: the caller may inspect state after the error.
                let detail = "end does not match the open record";
                self.open = Some(open);
                Err(self.structural(key, detail))
            }
            None => Err(self.structural(key, "end without a matching begin")),
        }
    }

    fn end_nested(&mut self, key: PathKey) -> Result<(), DecodeError> {
        if key == PathKey::MetafileStream {
            if self.sub.is_some() {
                return Err(
                    self.structural(key, "metafile stream closed with an array scope still open")
                );
            }
            let Some(writer) = self.stream.take() else {
                return Err(self.structural(key, "end without a matching begin"));
            };
            let container = writer.finish();
            match &mut self.open {
                Some(OpenScope {
                    record: RecordBuilder::Metafile(def),
                    ..
                }) => def.container = container,
                Some(OpenScope {
                    record: RecordBuilder::Background(def),
                    ..
                }) => def.container = container,
                // begin_nested checked the parent; it cannot have changed.
                _ => unreachable!("stream without owning record"),
            }
            return Ok(());
        }

        let sub = self
            .sub
            .take()
            .ok_or_else(|| self.structural(key, "end without a matching begin"))?;
        match (key, sub) {
            (PathKey::ViewParams, SubScope::ViewParams(view)) => {
                match &mut self.open {
                    Some(OpenScope {
                        record: RecordBuilder::Viewport(def),
                        ..
                    }) => def.view = view,
                    Some(OpenScope {
                        record: RecordBuilder::VpOverride(def),
                        ..
                    }) => def.view = view,
                    _ => unreachable!("view params without owning record"),
                }
                Ok(())
            }
            (PathKey::Property, SubScope::Property(prop)) => {
                let (Some(index), Some(value)) = (prop.index, prop.value) else {
                    return Err(self.structural(key, "property scope closed incomplete"));
                };
                match &mut self.open {
                    Some(OpenScope {
                        record: RecordBuilder::VisualStyle(def),
                        ..
                    }) => def.set_property(index, value),
                    _ => unreachable!("property without owning visual style"),
                }
                Ok(())
            }
            (PathKey::Array, SubScope::Array(array)) => self.end_array(key, array),
            // Mismatched nested end: the open sub-scope was something else.
            (_, sub) => {
                self.sub = Some(sub);
                Err(self.structural(key, "end does not match the open sub-scope"))
            }
        }
    }

    fn end_array(&mut self, key: PathKey, array: ArrayBuilder) -> Result<(), DecodeError> {
        let ArrayBuilder {
            kind: Some(kind),
            count: Some(count),
            data: Some(data),
            offset,
        } = array
        else {
            return Err(self.structural(key, "array scope closed without kind, count, and data"));
        };
        let writer = self
            .stream
            .as_mut()
            .expect("array scope only opens inside a stream");
        match writer.push_array(kind, count, data, offset) {
            Ok(_slot) => Ok(()),
            Err(ArrayError::SizeMismatch {
                expected, actual, ..
            }) => Err(DecodeError::Size {
                key,
                position: self.position,
                expected,
                actual,
            }),
            // Kind bytes are validated when the ArrayType field arrives.
            Err(ArrayError::UnknownKind(_)) => unreachable!("kind validated at ingestion"),
        }
    }

    /// Terminal check at end of stream. Any open scope is a structural
    /// error; on success the id table is handed back for reuse.
    pub fn finish(self) -> Result<(C, IdTable), DecodeError> {
        if let Some(open) = &self.open {
            return Err(self.structural(open.key, "stream ended with a record still open"));
        }
        if self.stream.is_some() {
            return Err(
                self.structural(PathKey::MetafileStream, "stream ended inside a metafile stream")
            );
        }
        Ok((self.consumer, self.ids))
    }

    // ------------------------------------------------------------------
    // Identifier resolution
    // ------------------------------------------------------------------

    pub(crate) fn resolve_id(
        &mut self,
        key: PathKey,
        raw: &str,
        category: Category,
        mode: IdMode,
    ) -> Result<ObjectId, DecodeError> {
        let resolved = match mode {
            IdMode::New => self.ids.create_new(raw, category, &mut self.registry),
            IdMode::Existing => self.ids.lookup_existing(raw, category),
            IdMode::GetOrCreate => self.ids.get_or_create(raw, category, &mut self.registry),
        };
        resolved.map_err(|e| self.identifier(key, e))
    }

    // ------------------------------------------------------------------
    // Finalization
    // ------------------------------------------------------------------

    /// Exactly one consumer call per finalized record.
    fn dispatch(&mut self, open: OpenScope) {
        use PathKey::*;
        let c = &mut self.consumer;
        match open.record {
            RecordBuilder::Material(def) => match open.key {
                MaterialAdded => c.material_added(def),
                MaterialDeleted => c.material_deleted(def.id),
                _ => c.material_modified(def),
            },
            RecordBuilder::Texture(def) => match open.key {
                TextureAdded => c.texture_added(def),
                TextureDeleted => c.texture_deleted(def.id),
                _ => c.texture_modified(def),
            },
            RecordBuilder::Overlay(def) => match open.key {
                OverlayAdded => c.overlay_added(def),
                OverlayDeleted => c.overlay_deleted(def.id),
                OverlayVisibilityChanged => c.overlay_visibility_changed(def.id, def.visible),
                _ => c.overlay_render_order_changed(def.id, def.render_order),
            },
            RecordBuilder::VpOverride(def) => c.overlay_view_params_overridden(def),
            RecordBuilder::Viewport(def) => match open.key {
                ViewportAdded => c.viewport_added(def),
                ViewportDeleted => c.viewport_deleted(def.id),
                ViewportModified => c.viewport_modified(def),
                _ => c.viewport_inserted(def),
            },
            RecordBuilder::VisualStyle(def) => match open.key {
                VisualStyleAdded => c.visual_style_added(def),
                VisualStyleDeleted => c.visual_style_deleted(def.id),
                _ => c.visual_style_modified(def),
            },
            RecordBuilder::Layer(def) => match open.key {
                LayerAdded => c.layer_added(def),
                LayerDeleted => c.layer_deleted(def.id),
                _ => c.layer_modified(def),
            },
            RecordBuilder::LayerVpOverride(def) => c.layer_viewport_overridden(def),
            RecordBuilder::Metafile(def) => match open.key {
                MetafileAdded => c.metafile_added(def),
                MetafileDeleted => c.metafile_deleted(def.id),
                MetafileVisibilityChanged => c.metafile_visibility_changed(def.id, def.visible),
                MetafileHighlightingChanged => {
                    c.metafile_highlighting_changed(def.id, def.highlighted);
                }
                _ => c.metafile_fading_changed(def.id, def.faded),
            },
            RecordBuilder::HlBranch(def) => match open.key {
                HlBranchAdded => c.hl_branch_added(def),
                HlBranchModified => c.hl_branch_modified(def),
                _ => c.hl_branch_deleted(def.id),
            },
            RecordBuilder::HlLink(def) => match open.key {
                MetafileHlBranchAttached => c.hl_branch_attached(def.metafile, def.branch),
                _ => c.hl_branch_detached(def.metafile, def.branch),
            },
            RecordBuilder::Surface(def) => c.surface_changed(def),
            RecordBuilder::Extents(def) => c.extents_changed(def),
            RecordBuilder::Order(def) => c.metafile_order_changed(def),
            RecordBuilder::OrderInheritance(def) => c.metafile_order_inheritance_changed(def),
            RecordBuilder::Lights(def) => c.lights_changed(def),
            RecordBuilder::Background(def) => c.background_changed(def),
        }
    }
}
