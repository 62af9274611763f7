//! Definition builders: transient records accumulating fields between a
//! begin and its matching end event.
//!
//! All builders start from declared defaults; the state machine mutates
//! them field by field and transfers them to the consumer on finalize.

use scenewire_bytecode::MetafileContainer;
use scenewire_core::{ObjectId, Rgba};

/// Camera/view description, nested inside viewport records and overlay
/// view-param overrides.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ViewParams {
    pub position: [f32; 3],
    pub target: [f32; 3],
    pub up: [f32; 3],
    /// Field extents keep f64: they arrive on the wire as doubles and the
    /// precision is meaningful for large models.
    pub field_width: f64,
    pub field_height: f64,
    pub perspective: bool,
    pub front_clip: f64,
    pub back_clip: f64,
    pub clip_enabled: bool,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 1.0],
            target: [0.0; 3],
            up: [0.0, 1.0, 0.0],
            field_width: 1.0,
            field_height: 1.0,
            perspective: false,
            front_clip: 0.0,
            back_clip: 0.0,
            clip_enabled: false,
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct TextureDef {
    pub id: ObjectId,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct MaterialDef {
    pub id: ObjectId,
    pub ambient: [f32; 3],
    pub diffuse: [f32; 3],
    pub specular: [f32; 3],
    pub emission: [f32; 3],
    pub specular_gloss: f32,
    pub opacity: f32,
    /// Referenced texture, [`ObjectId::NONE`] when untextured.
    pub diffuse_texture: ObjectId,
}

impl Default for MaterialDef {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            ambient: [0.0; 3],
            diffuse: [0.0; 3],
            specular: [0.0; 3],
            emission: [0.0; 3],
            specular_gloss: 0.0,
            opacity: 1.0,
            diffuse_texture: ObjectId::NONE,
        }
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct ViewportDef {
    pub id: ObjectId,
    pub border_visible: bool,
    pub border_color: Rgba,
    pub border_width: u16,
    /// Device rect as x, y, width, height.
    pub rect: [f32; 4],
    /// Position in the viewport list; meaningful for insert records only.
    pub insert_index: u32,
    pub view: ViewParams,
}

impl Default for ViewportDef {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            border_visible: false,
            border_color: Rgba::default(),
            border_width: 1,
            rect: [0.0; 4],
            insert_index: 0,
            view: ViewParams::default(),
        }
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct OverlayDef {
    pub id: ObjectId,
    pub viewport: ObjectId,
    pub visible: bool,
    pub render_order: i16,
    pub flags: u16,
}

impl Default for OverlayDef {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            viewport: ObjectId::NONE,
            visible: true,
            render_order: 0,
            flags: 0,
        }
    }
}

/// Per-overlay view parameter override for one viewport.
#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ViewParamsOverrideDef {
    pub overlay: ObjectId,
    pub viewport: ObjectId,
    pub view: ViewParams,
}

/// One typed visual style property value.
#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub enum StyleProperty {
    Bool(bool),
    Int(i32),
    Double(f64),
    Color(Rgba),
    Text(String),
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct VisualStyleDef {
    pub id: ObjectId,
    /// Indexed property slots; unset slots stay `None`.
    pub properties: Vec<Option<StyleProperty>>,
}

impl VisualStyleDef {
    /// Store a property at its declared slot, growing the table as needed.
    pub fn set_property(&mut self, index: u32, value: StyleProperty) {
        let index = index as usize;
        if self.properties.len() <= index {
            self.properties.resize(index + 1, None);
        }
        self.properties[index] = Some(value);
    }
}

#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerDef {
    pub id: ObjectId,
    pub name: String,
    pub visible: bool,
    pub faded: bool,
}

impl Default for LayerDef {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            name: String::new(),
            visible: true,
            faded: false,
        }
    }
}

/// Per-viewport layer state override.
#[derive(Clone, PartialEq, Eq, Debug, serde::Serialize, serde::Deserialize)]
pub struct LayerViewportOverrideDef {
    pub layer: ObjectId,
    pub viewport: ObjectId,
    pub visible: bool,
    pub faded: bool,
}

impl Default for LayerViewportOverrideDef {
    fn default() -> Self {
        Self {
            layer: ObjectId::NONE,
            viewport: ObjectId::NONE,
            visible: true,
            faded: false,
        }
    }
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct MetafileDef {
    pub id: ObjectId,
    /// Owner reference, passed through uninterned.
    pub owner: String,
    pub layer: ObjectId,
    pub visual_style: ObjectId,
    pub flags: u16,
    pub visible: bool,
    pub highlighted: bool,
    pub faded: bool,
    /// Compiled program plus array table; empty unless the record carried
    /// a metafile stream.
    pub container: MetafileContainer,
}

impl Default for MetafileDef {
    fn default() -> Self {
        Self {
            id: ObjectId::NONE,
            owner: String::new(),
            layer: ObjectId::NONE,
            visual_style: ObjectId::NONE,
            flags: 0,
            visible: true,
            highlighted: false,
            faded: false,
            container: MetafileContainer::default(),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct HlBranchDef {
    pub id: ObjectId,
    /// Owning metafile, [`ObjectId::NONE`] when the record names none.
    pub owner: ObjectId,
    pub parent: ObjectId,
    pub children: Vec<ObjectId>,
    pub markers: Vec<u64>,
}

/// Attach/detach link between a metafile and a highlight branch.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct HlLinkDef {
    pub metafile: ObjectId,
    pub branch: ObjectId,
}

#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct SurfaceDef {
    pub width: u32,
    pub height: u32,
    pub color: Rgba,
    pub double_buffer: bool,
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ExtentsDef {
    pub viewport: ObjectId,
    pub min: [f64; 3],
    pub max: [f64; 3],
}

#[derive(Clone, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct MetafileOrderDef {
    pub viewport: ObjectId,
    pub overlay: ObjectId,
    /// Draw order; every id must already be known to the metafile category.
    pub order: Vec<ObjectId>,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct OrderInheritanceDef {
    pub viewport: ObjectId,
    pub source_viewport: ObjectId,
    pub overlay: ObjectId,
}

#[derive(Clone, PartialEq, Debug, serde::Serialize, serde::Deserialize)]
pub struct Light {
    pub index: u32,
    pub position: [f32; 3],
    pub color: Rgba,
    pub kind: u8,
    pub intensity: f32,
    pub on: bool,
}

impl Light {
    pub fn new(index: u32) -> Self {
        Self {
            index,
            position: [0.0; 3],
            color: Rgba::new(255, 255, 255, 255),
            kind: 0,
            intensity: 1.0,
            on: true,
        }
    }
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct LightsDef {
    pub viewport: ObjectId,
    pub lights: Vec<Light>,
}

#[derive(Clone, PartialEq, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct BackgroundDef {
    pub id: ObjectId,
    pub color: Rgba,
    /// Optional drawable background; empty unless the record carried a
    /// metafile stream.
    pub container: MetafileContainer,
}
