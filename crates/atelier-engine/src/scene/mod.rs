//! Scene document model: an element tree with styles, pages, and the change
//! machinery that keeps cached bboxes and repaint areas consistent.
//!
//! Responsibilities:
//! - element arena, hierarchy, and flags (`element`, `scene`)
//! - geometry/paint bbox caching and invalidation
//! - style compositing (`style`) and tree rendering (`render`)
//! - observable change events (`events`)

pub mod element;
pub mod events;
pub mod page;
pub mod render;
#[allow(clippy::module_inception)]
pub mod scene;
pub mod shapes;
pub mod style;

pub use element::{Element, ElementFlags, ElementId, ElementKind};
pub use events::SceneEvent;
pub use page::PageData;
pub use render::{BitmapSize, RatioMode, RenderConfig, RenderContext};
pub use scene::{
    COLLISION_GEOMETRY_BBOX, COLLISION_PAINT_BBOX, COLLISION_PARTIAL, HitResult, Scene,
    SceneConfig,
};
pub use shapes::{ImageShape, ImageStatus, PolygonShape, RectangleShape};
pub use style::{
    BlurFilter, EntryCategory, FillPaint, OffsetEffect, ShadowEffect, StrokePaint, Style,
    StyleEntry, StyleType,
};
pub use style::render::{render_style, render_style_preview};
