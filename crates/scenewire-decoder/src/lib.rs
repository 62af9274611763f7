//! Streaming decoder for the path-keyed scene-update protocol.
//!
//! This crate contains:
//! - the record state machine driven by `begin`/`set_field`/`end` events,
//! - typed field dispatch from wire values into definition builders,
//! - the [`RenditionConsumer`] seam delivering finalized records,
//! - the decode error taxonomy.
//!
//! Carrier parsing is out of scope: callers feed the decoder an already
//! tokenized event stream, one `(PathKey, Value)` pair per field.

pub mod consumer;
mod dispatch;
pub mod error;
pub mod machine;
pub mod records;

#[cfg(test)]
mod machine_tests;

pub use consumer::{NullConsumer, RenditionConsumer};
pub use error::DecodeError;
pub use machine::Decoder;
pub use records::{
    BackgroundDef, ExtentsDef, HlBranchDef, HlLinkDef, LayerDef, LayerViewportOverrideDef, Light,
    LightsDef, MaterialDef, MetafileDef, MetafileOrderDef, OrderInheritanceDef, OverlayDef,
    StyleProperty, SurfaceDef, TextureDef, ViewParams, ViewParamsOverrideDef, ViewportDef,
    VisualStyleDef,
};
