//! The rendition consumer seam.
//!
//! One method per finalized record kind. All methods default to no-ops so a
//! consumer implements only what it renders; the decoder guarantees exactly
//! one call per successfully finalized record.

use scenewire_core::ObjectId;

use crate::records::{
    BackgroundDef, ExtentsDef, HlBranchDef, LayerDef, LayerViewportOverrideDef, LightsDef,
    MaterialDef, MetafileDef, MetafileOrderDef, OrderInheritanceDef, OverlayDef, SurfaceDef,
    TextureDef, ViewParamsOverrideDef, ViewportDef, VisualStyleDef,
};

/// Receiver of finalized, semantically complete scene-mutation calls.
#[allow(unused_variables)]
pub trait RenditionConsumer {
    fn material_added(&mut self, material: MaterialDef) {}
    fn material_deleted(&mut self, id: ObjectId) {}
    fn material_modified(&mut self, material: MaterialDef) {}

    fn texture_added(&mut self, texture: TextureDef) {}
    fn texture_deleted(&mut self, id: ObjectId) {}
    fn texture_modified(&mut self, texture: TextureDef) {}

    fn overlay_added(&mut self, overlay: OverlayDef) {}
    fn overlay_deleted(&mut self, id: ObjectId) {}
    fn overlay_visibility_changed(&mut self, id: ObjectId, visible: bool) {}
    fn overlay_render_order_changed(&mut self, id: ObjectId, order: i16) {}
    fn overlay_view_params_overridden(&mut self, over: ViewParamsOverrideDef) {}

    fn viewport_added(&mut self, viewport: ViewportDef) {}
    fn viewport_deleted(&mut self, id: ObjectId) {}
    fn viewport_modified(&mut self, viewport: ViewportDef) {}
    fn viewport_inserted(&mut self, viewport: ViewportDef) {}

    fn visual_style_added(&mut self, style: VisualStyleDef) {}
    fn visual_style_deleted(&mut self, id: ObjectId) {}
    fn visual_style_modified(&mut self, style: VisualStyleDef) {}

    fn layer_added(&mut self, layer: LayerDef) {}
    fn layer_deleted(&mut self, id: ObjectId) {}
    fn layer_modified(&mut self, layer: LayerDef) {}
    fn layer_viewport_overridden(&mut self, over: LayerViewportOverrideDef) {}

    fn metafile_added(&mut self, metafile: MetafileDef) {}
    fn metafile_deleted(&mut self, id: ObjectId) {}
    fn metafile_visibility_changed(&mut self, id: ObjectId, visible: bool) {}
    fn metafile_highlighting_changed(&mut self, id: ObjectId, highlighted: bool) {}
    fn metafile_fading_changed(&mut self, id: ObjectId, faded: bool) {}

    fn hl_branch_added(&mut self, branch: HlBranchDef) {}
    fn hl_branch_modified(&mut self, branch: HlBranchDef) {}
    fn hl_branch_deleted(&mut self, id: ObjectId) {}
    fn hl_branch_attached(&mut self, metafile: ObjectId, branch: ObjectId) {}
    fn hl_branch_detached(&mut self, metafile: ObjectId, branch: ObjectId) {}

    fn surface_changed(&mut self, surface: SurfaceDef) {}
    fn extents_changed(&mut self, extents: ExtentsDef) {}
    fn metafile_order_changed(&mut self, order: MetafileOrderDef) {}
    fn metafile_order_inheritance_changed(&mut self, inheritance: OrderInheritanceDef) {}
    fn lights_changed(&mut self, lights: LightsDef) {}
    fn background_changed(&mut self, background: BackgroundDef) {}
}

/// Consumer that ignores everything. Useful for validation-only decoding.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullConsumer;

impl RenditionConsumer for NullConsumer {}
