use crate::coords::{Point, Transform};
use crate::paint::PathVertex;

/// Rectangle shape. The base geometry is the unit square `[-1, 1]²`;
/// position and size come from the owning element's transform.
#[derive(Debug, Default)]
pub struct RectangleShape;

impl RectangleShape {
    /// Outline in shape-local space, transformed by `transform` when given.
    pub fn vertices(&self, transform: Option<Transform>) -> Vec<PathVertex> {
        let map = |x: f32, y: f32| match transform {
            Some(t) => t.map_point(Point::new(x, y)),
            None => Point::new(x, y),
        };
        vec![
            PathVertex::Move(map(-1.0, -1.0)),
            PathVertex::Line(map(1.0, -1.0)),
            PathVertex::Line(map(1.0, 1.0)),
            PathVertex::Line(map(-1.0, 1.0)),
            PathVertex::Close,
        ]
    }

    /// Transform mapping the unit square onto `(x, y, w, h)`.
    pub fn place(x: f32, y: f32, width: f32, height: f32) -> Transform {
        Transform::new(
            width / 2.0,
            0.0,
            0.0,
            height / 2.0,
            x + width / 2.0,
            y + height / 2.0,
        )
    }
}
