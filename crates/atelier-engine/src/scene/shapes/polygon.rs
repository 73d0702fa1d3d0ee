use crate::coords::{Point, Rect, Transform};
use crate::paint::PathVertex;

/// Star/polygon shape defined by an outer and an inner radius around a
/// center. With `inner_radius == outer_radius` this degenerates into a
/// regular polygon with `2 * points` corners.
#[derive(Debug, Clone)]
pub struct PolygonShape {
    /// Number of outer points (segments).
    pub points: u32,
    pub cx: f32,
    pub cy: f32,
    pub outer_radius: f32,
    pub inner_radius: f32,
    pub outer_angle: f32,
    pub inner_angle: f32,
}

impl Default for PolygonShape {
    fn default() -> Self {
        Self {
            points: 6,
            cx: 0.0,
            cy: 0.0,
            outer_radius: 0.0,
            inner_radius: 0.0,
            outer_angle: 0.0,
            inner_angle: std::f32::consts::TAU - std::f32::consts::FRAC_PI_3,
        }
    }
}

impl PolygonShape {
    /// Visits alternating outer/inner corner points, optionally mapped
    /// through `transform`. The callback receives the point and whether it
    /// lies on the inner radius.
    pub fn iterate_segments(
        &self,
        transform: Option<Transform>,
        mut visit: impl FnMut(Point, bool),
    ) {
        const ACC: f32 = 1.0e-6;
        let end_arc = self.outer_angle + std::f32::consts::TAU;
        let step_arc = std::f32::consts::TAU / self.points.max(1) as f32;
        let delta_arc = self.inner_angle - self.outer_angle;

        let mut arc = self.outer_angle;
        while arc < end_arc - ACC {
            let outer = Point::new(
                self.outer_radius * arc.cos() + self.cx,
                self.outer_radius * arc.sin() + self.cy,
            );
            visit(map(outer, transform), false);

            let inner_arc = arc + delta_arc;
            let inner = Point::new(
                self.inner_radius * inner_arc.cos() + self.cx,
                self.inner_radius * inner_arc.sin() + self.cy,
            );
            visit(map(inner, transform), true);

            arc += step_arc;
        }
    }

    /// Closed outline through the alternating corner points.
    pub fn vertices(&self, transform: Option<Transform>) -> Vec<PathVertex> {
        let mut verts = Vec::with_capacity(self.points as usize * 2 + 2);
        self.iterate_segments(transform, |p, _| {
            if verts.is_empty() {
                verts.push(PathVertex::Move(p));
            } else {
                verts.push(PathVertex::Line(p));
            }
        });
        verts.push(PathVertex::Close);
        verts
    }

    /// Tight bounds over the corner points.
    pub fn bounds(&self, transform: Option<Transform>) -> Option<Rect> {
        let mut bounds: Option<Rect> = None;
        self.iterate_segments(transform, |p, _| {
            let r = Rect::from_origin_size(p, Point::zero());
            bounds = Some(match bounds {
                Some(b) => b.united(r),
                None => r,
            });
        });
        bounds
    }
}

#[inline]
fn map(p: Point, transform: Option<Transform>) -> Point {
    match transform {
        Some(t) => t.map_point(p),
        None => p,
    }
}
