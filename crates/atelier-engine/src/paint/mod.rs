//! Paint model and software raster surface.
//!
//! Scope:
//! - document color/gradient/pattern values
//! - Porter-Duff compositing and CSS blend modes (premultiplied RGBA8)
//! - `Pixmap` (CPU raster buffer) and `Canvas` (transform/clip/compositing
//!   surface wrapper with offscreen allocation)
//! - vertex sources (renderer-agnostic path streams)
//!
//! Geometry types remain in `coords`.

pub mod blend;
pub mod canvas;
pub mod color;
pub mod gradient;
pub mod pattern;
pub mod pixmap;
pub mod vertex;

pub use blend::{BlendMode, CompositeMode, CompositeOperator};
pub use canvas::{Brush, Canvas, LineCap, LineJoin, RepeatMode};
pub use color::{Color, ColorModel};
pub use gradient::{Gradient, GradientKind, GradientStop};
pub use pattern::Pattern;
pub use pixmap::Pixmap;
pub use vertex::{PathVertex, VertexSource, flatten};
