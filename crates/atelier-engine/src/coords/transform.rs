use super::{Point, Rect, eq_eps};

/// 2D affine transform.
///
/// Column-major 2x3 matrix mapping `(x, y)` to:
/// `(sx*x + shx*y + tx, shy*x + sy*y + ty)`.
///
/// Composition order follows the document convention: `a.multiplied(b)`
/// applies `a` first, then `b`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub sx: f32,
    pub shy: f32,
    pub shx: f32,
    pub sy: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for Transform {
    #[inline]
    fn default() -> Self {
        Self::identity()
    }
}

impl Transform {
    #[inline]
    pub const fn new(sx: f32, shy: f32, shx: f32, sy: f32, tx: f32, ty: f32) -> Self {
        Self { sx, shy, shx, sy, tx, ty }
    }

    #[inline]
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    #[inline]
    pub const fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    #[inline]
    pub const fn scaling(sx: f32, sy: f32) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    #[inline]
    pub fn is_identity(self) -> bool {
        self.almost_eq(Self::identity())
    }

    /// True when the transform only translates and/or scales (no shear).
    #[inline]
    pub fn is_axis_aligned(self) -> bool {
        eq_eps(self.shx, 0.0) && eq_eps(self.shy, 0.0)
    }

    #[inline]
    pub fn translation_part(self) -> Point {
        Point::new(self.tx, self.ty)
    }

    /// Returns this transform followed by a translation.
    #[inline]
    pub fn translated(self, tx: f32, ty: f32) -> Self {
        self.multiplied(Self::translation(tx, ty))
    }

    /// Returns this transform followed by a scaling.
    #[inline]
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        self.multiplied(Self::scaling(sx, sy))
    }

    /// Applies `self` first, then `other`.
    #[inline]
    pub fn multiplied(self, other: Transform) -> Self {
        Self::new(
            self.sx * other.sx + self.shy * other.shx,
            self.sx * other.shy + self.shy * other.sy,
            self.shx * other.sx + self.sy * other.shx,
            self.shx * other.shy + self.sy * other.sy,
            self.tx * other.sx + self.ty * other.shx + other.tx,
            self.tx * other.shy + self.ty * other.sy + other.ty,
        )
    }

    /// Applies `other` first, then `self`.
    #[inline]
    pub fn pre_multiplied(self, other: Transform) -> Self {
        other.multiplied(self)
    }

    #[inline]
    pub fn map_point(self, p: Point) -> Point {
        Point::new(
            self.sx * p.x + self.shx * p.y + self.tx,
            self.shy * p.x + self.sy * p.y + self.ty,
        )
    }

    /// Maps a rect and returns the axis-aligned bounds of the result.
    pub fn map_rect(self, r: Rect) -> Rect {
        let p0 = self.map_point(r.min());
        let p1 = self.map_point(Point::new(r.max().x, r.min().y));
        let p2 = self.map_point(r.max());
        let p3 = self.map_point(Point::new(r.min().x, r.max().y));

        let x0 = p0.x.min(p1.x).min(p2.x).min(p3.x);
        let y0 = p0.y.min(p1.y).min(p2.y).min(p3.y);
        let x1 = p0.x.max(p1.x).max(p2.x).max(p3.x);
        let y1 = p0.y.max(p1.y).max(p2.y).max(p3.y);

        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    #[inline]
    pub fn determinant(self) -> f32 {
        self.sx * self.sy - self.shx * self.shy
    }

    /// Returns the inverse transform, or `None` for a degenerate matrix.
    pub fn inverted(self) -> Option<Transform> {
        let det = self.determinant();
        if det.abs() <= f32::EPSILON {
            return None;
        }

        let inv = 1.0 / det;
        let sx = self.sy * inv;
        let shy = -self.shy * inv;
        let shx = -self.shx * inv;
        let sy = self.sx * inv;

        Some(Self::new(
            sx,
            shy,
            shx,
            sy,
            -(self.tx * sx + self.ty * shx),
            -(self.tx * shy + self.ty * sy),
        ))
    }

    /// Epsilon equality, component-wise.
    #[inline]
    pub fn almost_eq(self, other: Transform) -> bool {
        eq_eps(self.sx, other.sx)
            && eq_eps(self.shy, other.shy)
            && eq_eps(self.shx, other.shx)
            && eq_eps(self.sy, other.sy)
            && eq_eps(self.tx, other.tx)
            && eq_eps(self.ty, other.ty)
    }
}
