use super::Point;

/// Axis-aligned rectangle in logical pixels (top-left origin).
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Point,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Point::new(w, h),
        }
    }

    #[inline]
    pub const fn from_origin_size(origin: Point, size: Point) -> Self {
        Self { origin, size }
    }

    /// Tightest rect enclosing two corner points (any order).
    #[inline]
    pub fn from_points(a: Point, b: Point) -> Self {
        let x0 = a.x.min(b.x);
        let y0 = a.y.min(b.y);
        Rect::new(x0, y0, a.x.max(b.x) - x0, a.y.max(b.y) - y0)
    }

    #[inline]
    pub fn x(self) -> f32 {
        self.origin.x
    }

    #[inline]
    pub fn y(self) -> f32 {
        self.origin.y
    }

    #[inline]
    pub fn width(self) -> f32 {
        self.size.x
    }

    #[inline]
    pub fn height(self) -> f32 {
        self.size.y
    }

    #[inline]
    pub fn min(self) -> Point {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Point {
        Point::new(self.origin.x + self.size.x, self.origin.y + self.size.y)
    }

    #[inline]
    pub fn center(self) -> Point {
        Point::new(
            self.origin.x + self.size.x / 2.0,
            self.origin.y + self.size.y / 2.0,
        )
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    #[inline]
    pub fn is_finite(self) -> bool {
        self.origin.is_finite() && self.size.is_finite()
    }

    /// Normalizes the rectangle so width/height are non-negative.
    #[inline]
    pub fn normalized(self) -> Self {
        let mut x = self.origin.x;
        let mut y = self.origin.y;
        let mut w = self.size.x;
        let mut h = self.size.y;

        if w < 0.0 {
            x += w;
            w = -w;
        }
        if h < 0.0 {
            y += h;
            h = -h;
        }

        Rect::new(x, y, w, h)
    }

    /// Half-open containment: [min, max).
    #[inline]
    pub fn contains(self, p: Point) -> bool {
        let r = self.normalized();
        p.x >= r.origin.x
            && p.y >= r.origin.y
            && p.x < (r.origin.x + r.size.x)
            && p.y < (r.origin.y + r.size.y)
    }

    /// Closed containment of another rect.
    #[inline]
    pub fn contains_rect(self, other: Rect) -> bool {
        let a = self.normalized();
        let b = other.normalized();
        b.origin.x >= a.origin.x
            && b.origin.y >= a.origin.y
            && b.max().x <= a.max().x
            && b.max().y <= a.max().y
    }

    #[inline]
    pub fn intersects(self, other: Rect) -> bool {
        self.intersect(other).is_some()
    }

    #[inline]
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.max(b.origin.x);
        let y0 = a.origin.y.max(b.origin.y);
        let x1 = (a.origin.x + a.size.x).min(b.origin.x + b.size.x);
        let y1 = (a.origin.y + a.size.y).min(b.origin.y + b.size.y);

        let w = x1 - x0;
        let h = y1 - y0;

        if w <= 0.0 || h <= 0.0 {
            None
        } else {
            Some(Rect::new(x0, y0, w, h))
        }
    }

    /// Smallest rect enclosing both rects.
    #[inline]
    pub fn united(self, other: Rect) -> Rect {
        let a = self.normalized();
        let b = other.normalized();

        let x0 = a.origin.x.min(b.origin.x);
        let y0 = a.origin.y.min(b.origin.y);
        let x1 = a.max().x.max(b.max().x);
        let y1 = a.max().y.max(b.max().y);

        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Grows each side outward by the given amount (negative shrinks).
    #[inline]
    pub fn expanded(self, left: f32, top: f32, right: f32, bottom: f32) -> Rect {
        Rect::new(
            self.origin.x - left,
            self.origin.y - top,
            self.size.x + left + right,
            self.size.y + top + bottom,
        )
    }

    #[inline]
    pub fn expanded_uniform(self, d: f32) -> Rect {
        self.expanded(d, d, d, d)
    }

    #[inline]
    pub fn translated(self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.origin.x + dx, self.origin.y + dy, self.size.x, self.size.y)
    }

    /// Smallest integer-aligned rect fully enclosing this one.
    #[inline]
    pub fn aligned(self) -> Rect {
        let r = self.normalized();
        let x0 = r.origin.x.floor();
        let y0 = r.origin.y.floor();
        let x1 = r.max().x.ceil();
        let y1 = r.max().y.ceil();
        Rect::new(x0, y0, x1 - x0, y1 - y0)
    }

    /// Epsilon equality, side by side.
    #[inline]
    pub fn almost_eq(self, other: Rect) -> bool {
        self.origin.almost_eq(other.origin) && self.size.almost_eq(other.size)
    }

    /// Epsilon equality over optional rects; two `None`s compare equal.
    #[inline]
    pub fn almost_eq_opt(a: Option<Rect>, b: Option<Rect>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => a.almost_eq(b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect { Rect::new(x, y, w, h) }

    // ── normalized ────────────────────────────────────────────────────────

    #[test]
    fn normalized_positive_is_identity() {
        let rect = r(1.0, 2.0, 10.0, 20.0);
        assert_eq!(rect.normalized(), rect);
    }

    #[test]
    fn normalized_negative_width() {
        let rect = r(10.0, 0.0, -4.0, 5.0);
        let n = rect.normalized();
        assert_eq!(n.origin.x, 6.0);
        assert_eq!(n.size.x, 4.0);
    }

    // ── contains ──────────────────────────────────────────────────────────

    #[test]
    fn contains_interior_point() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Point::new(5.0, 5.0)));
    }

    #[test]
    fn contains_top_left_inclusive() {
        assert!(r(0.0, 0.0, 10.0, 10.0).contains(Point::new(0.0, 0.0)));
    }

    #[test]
    fn contains_bottom_right_exclusive() {
        // Half-open [min, max) — the max edge is not contained.
        assert!(!r(0.0, 0.0, 10.0, 10.0).contains(Point::new(10.0, 10.0)));
    }

    #[test]
    fn contains_rect_inside_and_outside() {
        let outer = r(0.0, 0.0, 100.0, 100.0);
        assert!(outer.contains_rect(r(10.0, 10.0, 20.0, 20.0)));
        assert!(!outer.contains_rect(r(90.0, 90.0, 20.0, 20.0)));
    }

    // ── intersect / united ────────────────────────────────────────────────

    #[test]
    fn intersect_overlapping() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersect(b).unwrap(), r(5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn intersect_touching_edge_returns_none() {
        // Rects share an edge — zero-width overlap is not a valid intersection.
        let a = r(0.0, 0.0, 10.0, 10.0);
        let b = r(10.0, 0.0, 10.0, 10.0);
        assert!(a.intersect(b).is_none());
    }

    #[test]
    fn united_encloses_both() {
        let u = r(0.0, 0.0, 10.0, 10.0).united(r(20.0, 5.0, 10.0, 10.0));
        assert_eq!(u, r(0.0, 0.0, 30.0, 15.0));
    }

    // ── expanded / aligned ────────────────────────────────────────────────

    #[test]
    fn expanded_grows_each_side() {
        let e = r(10.0, 10.0, 10.0, 10.0).expanded(1.0, 2.0, 3.0, 4.0);
        assert_eq!(e, r(9.0, 8.0, 14.0, 16.0));
    }

    #[test]
    fn aligned_snaps_outward() {
        let a = r(0.4, 0.6, 10.0, 10.0).aligned();
        assert_eq!(a, r(0.0, 0.0, 11.0, 11.0));
    }
}
