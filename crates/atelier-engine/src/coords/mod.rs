//! Coordinate and geometry types shared across the scene document and views.
//!
//! Canonical space:
//! - World coordinates in logical pixels
//! - Origin top-left
//! - +X right, +Y down
//!
//! Views map world to device pixels through a scroll/zoom transform.

mod point;
mod rect;
mod transform;
mod viewport;

pub use point::Point;
pub use rect::Rect;
pub use transform::Transform;
pub use viewport::Viewport;

/// Epsilon used for comparing coordinates for equality.
///
/// Document mutations compare old/new values to skip redundant invalidation,
/// so tiny floating point drift must not count as a change.
pub const EPSILON: f32 = 1.0e-5;

/// Epsilon equality for scalars.
#[inline]
pub fn eq_eps(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}
