//! Path keys: tags naming positions in the nested record schema.
//!
//! A path key is equality-only and externally produced; the tree-structured
//! carrier derives it from element nesting, the flat binary carrier reads it
//! as an explicit tag. The decoder never parses key names, it only matches
//! on the closed set below.

/// Where a path key may appear in the record schema.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Scope {
    /// Top-level record scope: `begin`/`end` delimit one finalized record.
    Record,
    /// Nested sub-scope opened inside a record scope.
    Nested,
    /// Field key: valid only inside an open scope, carries a wire value.
    Field,
}

/// Tag naming one position in the nested record schema.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
#[cfg_attr(test, derive(strum::EnumIter))]
pub enum PathKey {
    // ------------------------------------------------------------------
    // Record scopes
    // ------------------------------------------------------------------
    MaterialAdded,
    MaterialDeleted,
    MaterialModified,
    TextureAdded,
    TextureDeleted,
    TextureModified,
    OverlayAdded,
    OverlayDeleted,
    OverlayVisibilityChanged,
    OverlayRenderOrderChanged,
    OverlayViewParamsOverride,
    ViewportAdded,
    ViewportDeleted,
    ViewportModified,
    ViewportInserted,
    VisualStyleAdded,
    VisualStyleDeleted,
    VisualStyleModified,
    LayerAdded,
    LayerDeleted,
    LayerModified,
    LayerViewportOverride,
    MetafileAdded,
    MetafileDeleted,
    MetafileVisibilityChanged,
    MetafileHighlightingChanged,
    MetafileFadingChanged,
    HlBranchAdded,
    HlBranchModified,
    HlBranchDeleted,
    MetafileHlBranchAttached,
    MetafileHlBranchDetached,
    SurfaceChanged,
    ExtentsChanged,
    MetafileOrderChanged,
    MetafileOrderInheritance,
    LightsListChanged,
    BackgroundChanged,

    // ------------------------------------------------------------------
    // Nested sub-scopes
    // ------------------------------------------------------------------
    ViewParams,
    Property,
    Array,
    MetafileStream,

    // ------------------------------------------------------------------
    // Identifier fields
    // ------------------------------------------------------------------
    MaterialId,
    TextureId,
    MetafileId,
    ViewportId,
    VisualStyleId,
    LayerId,
    OverlayId,
    HlBranchId,
    BackgroundId,
    OwnerId,
    SourceViewportId,
    ChildBranchId,
    ParentBranchId,
    DiffuseTextureId,

    // ------------------------------------------------------------------
    // Material fields
    // ------------------------------------------------------------------
    AmbientColor,
    DiffuseColor,
    SpecularColor,
    EmissionColor,
    SpecularGloss,
    Opacity,

    // ------------------------------------------------------------------
    // Texture fields
    // ------------------------------------------------------------------
    TextureWidth,
    TextureHeight,
    TexturePixels,

    // ------------------------------------------------------------------
    // Viewport / ViewParams fields
    // ------------------------------------------------------------------
    BorderVisible,
    BorderColor,
    BorderWidth,
    ViewportRect,
    InsertIndex,
    ViewPosition,
    ViewTarget,
    ViewUpVector,
    FieldWidth,
    FieldHeight,
    Perspective,
    FrontClip,
    BackClip,
    ClipEnabled,

    // ------------------------------------------------------------------
    // Overlay fields
    // ------------------------------------------------------------------
    OverlayVisible,
    OverlayRenderOrder,
    OverlayFlags,

    // ------------------------------------------------------------------
    // Layer fields
    // ------------------------------------------------------------------
    LayerName,
    LayerVisible,
    LayerFaded,

    // ------------------------------------------------------------------
    // Visual style property fields
    // ------------------------------------------------------------------
    PropertyIndex,
    PropertyBool,
    PropertyInt,
    PropertyDouble,
    PropertyColor,
    PropertyString,

    // ------------------------------------------------------------------
    // Metafile fields
    // ------------------------------------------------------------------
    MetafileFlags,
    MetafileVisible,
    MetafileHighlighted,
    MetafileFaded,

    // ------------------------------------------------------------------
    // Highlight branch fields
    // ------------------------------------------------------------------
    Marker,

    // ------------------------------------------------------------------
    // Surface / extents fields
    // ------------------------------------------------------------------
    SurfaceWidth,
    SurfaceHeight,
    SurfaceColor,
    DoubleBuffer,
    ExtentsMin,
    ExtentsMax,

    // ------------------------------------------------------------------
    // Lights fields
    // ------------------------------------------------------------------
    LightIndex,
    LightPosition,
    LightColor,
    LightType,
    LightIntensity,
    LightOn,

    // ------------------------------------------------------------------
    // Background fields
    // ------------------------------------------------------------------
    BackgroundColor,

    // ------------------------------------------------------------------
    // Metafile stream drawing fields
    // ------------------------------------------------------------------
    StreamColor,
    PushMatrix,
    PopMatrix,
    VPoint,
    VLine,
    IPoint,
    ILine,
    LineStyle,
    LineWeight,
    GeometryMarker,
    SelectionMarker,
    SelectionFlags,
    EnableArray,
    DisableArray,
    DrawArrays,
    DrawElements,
    CullFace,
    Stipple,
    HlrStencil,
    Shading,
    Program,
    StreamVisualStyle,
    UserEntry,

    // ------------------------------------------------------------------
    // Array sub-scope fields
    // ------------------------------------------------------------------
    ArrayType,
    ArraySize,
    ArrayData,
    ArrayOffset,
}

impl PathKey {
    /// Classify where this key may appear.
    pub fn scope(self) -> Scope {
        use PathKey::*;
        match self {
            MaterialAdded | MaterialDeleted | MaterialModified | TextureAdded | TextureDeleted
            | TextureModified | OverlayAdded | OverlayDeleted | OverlayVisibilityChanged
            | OverlayRenderOrderChanged | OverlayViewParamsOverride | ViewportAdded
            | ViewportDeleted | ViewportModified | ViewportInserted | VisualStyleAdded
            | VisualStyleDeleted | VisualStyleModified | LayerAdded | LayerDeleted
            | LayerModified | LayerViewportOverride | MetafileAdded | MetafileDeleted
            | MetafileVisibilityChanged | MetafileHighlightingChanged | MetafileFadingChanged
            | HlBranchAdded | HlBranchModified | HlBranchDeleted | MetafileHlBranchAttached
            | MetafileHlBranchDetached | SurfaceChanged | ExtentsChanged | MetafileOrderChanged
            | MetafileOrderInheritance | LightsListChanged | BackgroundChanged => Scope::Record,
            ViewParams | Property | Array | MetafileStream => Scope::Nested,
            _ => Scope::Field,
        }
    }

    /// Whether this key opens or closes a scope (record or nested).
    #[inline]
    pub fn is_scope(self) -> bool {
        self.scope() != Scope::Field
    }
}
