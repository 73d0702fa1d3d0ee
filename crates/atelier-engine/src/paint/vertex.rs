use crate::coords::{Point, Rect, Transform};

/// Single path command in user space.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PathVertex {
    Move(Point),
    Line(Point),
    Quad(Point, Point),
    Cubic(Point, Point, Point),
    Close,
}

/// Anything that can stream its outline as path vertices.
///
/// Shapes hand the renderer a vertex stream rather than a baked path so
/// the surface can transform and rasterize it however it likes.
pub trait VertexSource {
    fn vertices(&self) -> Vec<PathVertex>;
}

impl VertexSource for Vec<PathVertex> {
    fn vertices(&self) -> Vec<PathVertex> {
        self.clone()
    }
}

impl VertexSource for Rect {
    fn vertices(&self) -> Vec<PathVertex> {
        let r = self.normalized();
        vec![
            PathVertex::Move(r.min()),
            PathVertex::Line(Point::new(r.max().x, r.min().y)),
            PathVertex::Line(r.max()),
            PathVertex::Line(Point::new(r.min().x, r.max().y)),
            PathVertex::Close,
        ]
    }
}

/// Flattened path: polyline contours plus their bounds. `closed` marks
/// whether contours wrap around from their last point to their first.
#[derive(Debug, Clone, Default)]
pub struct FlatPath {
    pub contours: Vec<Vec<Point>>,
    pub bounds: Option<Rect>,
    pub closed: bool,
}

impl FlatPath {
    /// Nonzero-winding containment test.
    pub fn contains(&self, p: Point) -> bool {
        let mut winding = 0i32;
        for contour in &self.contours {
            let n = contour.len();
            if n < 2 {
                continue;
            }
            for i in 0..n {
                let a = contour[i];
                let b = contour[(i + 1) % n];
                if a.y <= p.y {
                    if b.y > p.y && cross(a, b, p) > 0.0 {
                        winding += 1;
                    }
                } else if b.y <= p.y && cross(a, b, p) < 0.0 {
                    winding -= 1;
                }
            }
        }
        winding != 0
    }
}

#[inline]
fn cross(a: Point, b: Point, p: Point) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (p.x - a.x) * (b.y - a.y)
}

/// Curve flattening tolerance in device pixels.
const FLATTEN_TOLERANCE: f32 = 0.25;

/// Flattens a vertex stream into closed polyline contours, applying the
/// given transform. Open subpaths are implicitly closed, matching the
/// fill rule used by the rasterizer.
pub fn flatten(vertices: &[PathVertex], transform: Transform) -> FlatPath {
    let mut contours: Vec<Vec<Point>> = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    let mut cursor = Point::zero();

    let mut close_current = |current: &mut Vec<Point>, contours: &mut Vec<Vec<Point>>| {
        if current.len() >= 3 {
            contours.push(std::mem::take(current));
        } else {
            current.clear();
        }
    };

    for vertex in vertices {
        match *vertex {
            PathVertex::Move(p) => {
                close_current(&mut current, &mut contours);
                cursor = transform.map_point(p);
                current.push(cursor);
            }
            PathVertex::Line(p) => {
                cursor = transform.map_point(p);
                current.push(cursor);
            }
            PathVertex::Quad(c, p) => {
                let c = transform.map_point(c);
                let to = transform.map_point(p);
                flatten_quad(cursor, c, to, &mut current, 0);
                cursor = to;
            }
            PathVertex::Cubic(c1, c2, p) => {
                let c1 = transform.map_point(c1);
                let c2 = transform.map_point(c2);
                let to = transform.map_point(p);
                flatten_cubic(cursor, c1, c2, to, &mut current, 0);
                cursor = to;
            }
            PathVertex::Close => {
                close_current(&mut current, &mut contours);
            }
        }
    }
    close_current(&mut current, &mut contours);

    let mut bounds: Option<Rect> = None;
    for contour in &contours {
        for p in contour {
            let r = Rect::from_origin_size(*p, Point::zero());
            bounds = Some(match bounds {
                Some(b) => b.united(r),
                None => r,
            });
        }
    }

    FlatPath { contours, bounds, closed: true }
}

const MAX_SUBDIVISION: u32 = 16;

fn flatten_quad(a: Point, c: Point, b: Point, out: &mut Vec<Point>, depth: u32) {
    let mid = Point::new(
        (a.x + 2.0 * c.x + b.x) / 4.0,
        (a.y + 2.0 * c.y + b.y) / 4.0,
    );
    let line_mid = Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);
    let err = (mid - line_mid).x.abs() + (mid - line_mid).y.abs();

    if err <= FLATTEN_TOLERANCE || depth >= MAX_SUBDIVISION {
        out.push(b);
        return;
    }

    let ac = midpoint(a, c);
    let cb = midpoint(c, b);
    flatten_quad(a, ac, mid, out, depth + 1);
    flatten_quad(mid, cb, b, out, depth + 1);
}

fn flatten_cubic(a: Point, c1: Point, c2: Point, b: Point, out: &mut Vec<Point>, depth: u32) {
    // Flatness: control-point distance from the chord.
    let d1 = (c1 - a).x.abs().max((c1 - a).y.abs());
    let d2 = (c2 - b).x.abs().max((c2 - b).y.abs());
    let chord = (b - a).x.abs().max((b - a).y.abs());

    if (d1.max(d2) <= FLATTEN_TOLERANCE.max(chord / 64.0)) || depth >= MAX_SUBDIVISION {
        out.push(b);
        return;
    }

    let ab = midpoint(a, c1);
    let bc = midpoint(c1, c2);
    let cd = midpoint(c2, b);
    let abc = midpoint(ab, bc);
    let bcd = midpoint(bc, cd);
    let mid = midpoint(abc, bcd);

    flatten_cubic(a, ab, abc, mid, out, depth + 1);
    flatten_cubic(mid, bcd, cd, b, out, depth + 1);
}

#[inline]
fn midpoint(a: Point, b: Point) -> Point {
    Point::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── flattening ────────────────────────────────────────────────────────

    #[test]
    fn rect_source_flattens_to_one_contour() {
        let flat = flatten(&Rect::new(0.0, 0.0, 10.0, 5.0).vertices(), Transform::identity());
        assert_eq!(flat.contours.len(), 1);
        assert_eq!(flat.contours[0].len(), 4);
        assert!(flat.bounds.unwrap().almost_eq(Rect::new(0.0, 0.0, 10.0, 5.0)));
    }

    #[test]
    fn transform_applies_to_contours() {
        let flat = flatten(
            &Rect::new(0.0, 0.0, 10.0, 10.0).vertices(),
            Transform::scaling(2.0, 2.0).translated(5.0, 0.0),
        );
        assert!(flat.bounds.unwrap().almost_eq(Rect::new(5.0, 0.0, 20.0, 20.0)));
    }

    #[test]
    fn curves_are_subdivided() {
        let verts = vec![
            PathVertex::Move(Point::new(0.0, 0.0)),
            PathVertex::Quad(Point::new(50.0, 100.0), Point::new(100.0, 0.0)),
            PathVertex::Close,
        ];
        let flat = flatten(&verts, Transform::identity());
        assert!(flat.contours[0].len() > 4);
        // Curve apex is the quad midpoint, y = 50.
        let max_y = flat.contours[0].iter().map(|p| p.y).fold(0.0, f32::max);
        assert!((max_y - 50.0).abs() < 2.0);
    }

    #[test]
    fn degenerate_subpath_is_dropped() {
        let verts = vec![
            PathVertex::Move(Point::new(0.0, 0.0)),
            PathVertex::Line(Point::new(1.0, 1.0)),
            PathVertex::Close,
        ];
        let flat = flatten(&verts, Transform::identity());
        assert!(flat.contours.is_empty());
    }

    // ── containment ───────────────────────────────────────────────────────

    #[test]
    fn nonzero_containment() {
        let flat = flatten(&Rect::new(0.0, 0.0, 10.0, 10.0).vertices(), Transform::identity());
        assert!(flat.contains(Point::new(5.0, 5.0)));
        assert!(!flat.contains(Point::new(15.0, 5.0)));
    }
}
