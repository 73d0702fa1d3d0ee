use std::sync::Arc;

use crate::coords::{Point, Rect, Transform};
use crate::paint::vertex::FlatPath;
use crate::paint::{
    Brush, Canvas, Color, CompositeMode, Gradient, GradientKind, LineCap, LineJoin, PathVertex,
    Pattern, Pixmap, RepeatMode,
};

/// Style-entry category. The bbox fold combines paddings per category:
/// vector effects additively, filters by absolute sum, effects and paints
/// by component-wise max.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum EntryCategory {
    Paint,
    Filter,
    Effect,
    VectorEffect,
}

/// One visual operation of a style.
#[derive(Debug, Clone)]
pub enum StyleEntry {
    Fill(FillPaint),
    Stroke(StrokePaint),
    Blur(BlurFilter),
    Shadow(ShadowEffect),
    Offset(OffsetEffect),
}

impl StyleEntry {
    #[inline]
    pub fn visible(&self) -> bool {
        match self {
            StyleEntry::Fill(e) => e.visible,
            StyleEntry::Stroke(e) => e.visible,
            StyleEntry::Blur(e) => e.visible,
            StyleEntry::Shadow(e) => e.visible,
            StyleEntry::Offset(e) => e.visible,
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        match self {
            StyleEntry::Fill(e) => e.visible = visible,
            StyleEntry::Stroke(e) => e.visible = visible,
            StyleEntry::Blur(e) => e.visible = visible,
            StyleEntry::Shadow(e) => e.visible = visible,
            StyleEntry::Offset(e) => e.visible = visible,
        }
    }

    #[inline]
    pub fn category(&self) -> EntryCategory {
        match self {
            StyleEntry::Fill(_) | StyleEntry::Stroke(_) => EntryCategory::Paint,
            StyleEntry::Blur(_) => EntryCategory::Filter,
            StyleEntry::Shadow(_) => EntryCategory::Effect,
            StyleEntry::Offset(_) => EntryCategory::VectorEffect,
        }
    }

    /// Pixel expansion `[left, top, right, bottom]` this entry contributes
    /// to the owning style's bbox, or `None` for no expansion.
    pub fn padding(&self) -> Option<[f32; 4]> {
        match self {
            StyleEntry::Fill(_) => None,
            StyleEntry::Stroke(e) => {
                let hw = e.width / 2.0;
                Some([hw, hw, hw, hw])
            }
            StyleEntry::Blur(e) => Some([e.radius, e.radius, e.radius, e.radius]),
            StyleEntry::Shadow(e) => Some([
                e.radius - e.dx,
                e.radius - e.dy,
                e.radius + e.dx,
                e.radius + e.dy,
            ]),
            StyleEntry::Offset(e) => Some([-e.dx, -e.dy, e.dx, e.dy]),
        }
    }

    /// Effects only: whether the effect output goes on top of the already
    /// composited contents (inner shadow) instead of underneath them.
    pub fn is_post(&self) -> bool {
        match self {
            StyleEntry::Shadow(e) => e.inner,
            _ => false,
        }
    }

    /// Paint entries only: the composite mode the paint draws with.
    pub fn paint_mode(&self) -> Option<CompositeMode> {
        match self {
            StyleEntry::Fill(e) => Some(e.mode),
            StyleEntry::Stroke(e) => Some(e.mode),
            _ => None,
        }
    }

    /// Raster effects: produce the effect output into `canvas` from the
    /// already rendered `contents` surface.
    pub fn render_effect(&self, canvas: &mut Canvas, contents: &Canvas, scale: f32) {
        if let StyleEntry::Shadow(e) = self {
            e.render(canvas, contents, scale);
        }
    }

    /// Filters: in-place pixel transform of the style surface.
    pub fn apply_filter(&self, canvas: &mut Canvas, scale: f32) {
        if let StyleEntry::Blur(e) = self {
            e.apply(canvas, scale);
        }
    }

    /// Vector effects: transform a vertex source.
    pub fn create_effect(&self, source: Vec<PathVertex>) -> Vec<PathVertex> {
        match self {
            StyleEntry::Offset(e) => e.create_effect(source),
            _ => source,
        }
    }

    /// Paint entries: draw the current canvas path.
    pub fn paint(&self, canvas: &mut Canvas, bbox: Rect) {
        match self {
            StyleEntry::Fill(e) => e.paint(canvas, bbox),
            StyleEntry::Stroke(e) => e.paint(canvas, bbox),
            _ => {}
        }
    }

    /// Paint entries: whether a location hits this entry's painted output.
    pub fn hit_test(&self, flat: &FlatPath, location: Point, tolerance: f32) -> bool {
        match self {
            StyleEntry::Fill(_) => {
                flat.contains(location)
                    || (tolerance > 0.0 && outline_distance(flat, location) <= tolerance)
            }
            StyleEntry::Stroke(e) => outline_distance(flat, location) <= e.width / 2.0 + tolerance,
            _ => false,
        }
    }
}

/// Minimum distance from a point to the contour segments of a flat path.
fn outline_distance(flat: &FlatPath, p: Point) -> f32 {
    let mut best = f32::INFINITY;
    for contour in &flat.contours {
        let n = contour.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            if i + 1 == n && !flat.closed {
                break;
            }
            let a = contour[i];
            let b = contour[(i + 1) % n];
            best = best.min(segment_distance(a, b, p));
        }
    }
    best
}

fn segment_distance(a: Point, b: Point, p: Point) -> f32 {
    let d = b - a;
    let len2 = d.x * d.x + d.y * d.y;
    let t = if len2 <= 0.0 {
        0.0
    } else {
        (((p.x - a.x) * d.x + (p.y - a.y) * d.y) / len2).clamp(0.0, 1.0)
    };
    let q = Point::new(a.x + d.x * t, a.y + d.y * t);
    let e = p - q;
    (e.x * e.x + e.y * e.y).sqrt()
}

/// Resolves a pattern into a brush for the given paint bbox. Gradients span
/// the bbox horizontally (linear) or radiate from its center (radial);
/// texture patterns need a resolved bitmap and yield `None` without one.
pub(crate) fn pattern_brush(pattern: &Pattern, bbox: Rect) -> Option<Brush> {
    match pattern {
        Pattern::Color(color) => Some(Brush::Solid(*color)),
        Pattern::Gradient(gradient) => Some(match gradient.kind() {
            GradientKind::Linear => Brush::LinearGradient {
                from: Point::new(bbox.x(), bbox.center().y),
                to: Point::new(bbox.max().x, bbox.center().y),
                gradient: gradient.clone(),
            },
            GradientKind::Radial => Brush::RadialGradient {
                center: bbox.center(),
                radius: bbox.width().max(bbox.height()) / 2.0,
                gradient: gradient.clone(),
            },
        }),
        Pattern::Texture(_) | Pattern::Noise => None,
    }
}

/// Area fill paint.
#[derive(Debug, Clone)]
pub struct FillPaint {
    pub visible: bool,
    pub pattern: Pattern,
    pub opacity: f32,
    pub mode: CompositeMode,
}

impl FillPaint {
    pub fn new(pattern: Pattern) -> Self {
        Self {
            visible: true,
            pattern,
            opacity: 1.0,
            mode: CompositeMode::default(),
        }
    }

    pub fn paint(&self, canvas: &mut Canvas, bbox: Rect) {
        if let Some(brush) = pattern_brush(&self.pattern, bbox) {
            canvas.fill_vertices(&brush, self.opacity, self.mode);
        }
    }
}

/// Center-aligned stroke paint.
#[derive(Debug, Clone)]
pub struct StrokePaint {
    pub visible: bool,
    pub pattern: Pattern,
    pub width: f32,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f32,
    pub opacity: f32,
    pub mode: CompositeMode,
}

impl StrokePaint {
    pub fn new(pattern: Pattern, width: f32) -> Self {
        Self {
            visible: true,
            pattern,
            width,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            opacity: 1.0,
            mode: CompositeMode::default(),
        }
    }

    pub fn paint(&self, canvas: &mut Canvas, bbox: Rect) {
        if let Some(brush) = pattern_brush(&self.pattern, bbox) {
            canvas.stroke_vertices(
                &brush,
                self.width,
                self.cap,
                self.join,
                self.miter_limit,
                self.opacity,
                self.mode,
            );
        }
    }
}

/// Gaussian-approximating blur filter.
#[derive(Debug, Clone)]
pub struct BlurFilter {
    pub visible: bool,
    pub radius: f32,
}

impl BlurFilter {
    pub fn new(radius: f32) -> Self {
        Self { visible: true, radius }
    }

    pub fn apply(&self, canvas: &mut Canvas, scale: f32) {
        blur_pixmap(canvas.pixmap_mut(), self.radius * scale);
    }
}

/// Three box passes approximate a Gaussian of the given radius.
pub(crate) fn blur_pixmap(pixmap: &mut Pixmap, radius: f32) {
    if radius <= 0.0 {
        return;
    }
    let r = (radius / 3.0).round().max(1.0) as u32;
    for _ in 0..3 {
        pixmap.box_blur(r);
    }
}

/// Drop or inner shadow effect.
#[derive(Debug, Clone)]
pub struct ShadowEffect {
    pub visible: bool,
    /// Inner shadow (post-content) instead of drop shadow.
    pub inner: bool,
    pub radius: f32,
    pub dx: f32,
    pub dy: f32,
    pub color: Color,
}

impl ShadowEffect {
    pub fn new(radius: f32, dx: f32, dy: f32, color: Color) -> Self {
        Self {
            visible: true,
            inner: false,
            radius,
            dx,
            dy,
            color,
        }
    }

    /// Fills the effect surface with the shadow color, then masks it by the
    /// contents: drop shadows keep the offset content silhouette and blur;
    /// inner shadows cut the offset silhouette out, blur, and re-mask to
    /// the contents.
    pub fn render(&self, canvas: &mut Canvas, contents: &Canvas, scale: f32) {
        use crate::paint::CompositeOperator::{DestinationIn, DestinationOut};

        canvas.fill_canvas(&Brush::Solid(self.color));

        let x = (self.dx * scale).round() as i32;
        let y = (self.dy * scale).round() as i32;
        let r = self.radius * scale;

        if self.inner {
            canvas.draw_canvas(contents, x, y, 1.0, DestinationOut.into(), false);
            blur_pixmap(canvas.pixmap_mut(), r);
            canvas.draw_canvas(contents, 0, 0, 1.0, DestinationIn.into(), false);
        } else {
            canvas.draw_canvas(contents, x, y, 1.0, DestinationIn.into(), false);
            blur_pixmap(canvas.pixmap_mut(), r);
        }
    }
}

/// Vector effect translating the source outline.
#[derive(Debug, Clone)]
pub struct OffsetEffect {
    pub visible: bool,
    pub dx: f32,
    pub dy: f32,
}

impl OffsetEffect {
    pub fn new(dx: f32, dy: f32) -> Self {
        Self { visible: true, dx, dy }
    }

    pub fn create_effect(&self, source: Vec<PathVertex>) -> Vec<PathVertex> {
        let t = Transform::translation(self.dx, self.dy);
        source
            .into_iter()
            .map(|v| match v {
                PathVertex::Move(p) => PathVertex::Move(t.map_point(p)),
                PathVertex::Line(p) => PathVertex::Line(t.map_point(p)),
                PathVertex::Quad(c, p) => PathVertex::Quad(t.map_point(c), t.map_point(p)),
                PathVertex::Cubic(c1, c2, p) => {
                    PathVertex::Cubic(t.map_point(c1), t.map_point(c2), t.map_point(p))
                }
                PathVertex::Close => PathVertex::Close,
            })
            .collect()
    }
}

/// Convenience constructor for a texture brush over a resolved bitmap,
/// used by previews and tests.
pub fn texture_brush(pixmap: Arc<Pixmap>) -> Brush {
    Brush::Texture {
        pixmap,
        repeat: RepeatMode::Both,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::{VertexSource, flatten};

    // ── padding ───────────────────────────────────────────────────────────

    #[test]
    fn fill_contributes_no_padding() {
        assert!(StyleEntry::Fill(FillPaint::new(Pattern::Color(Color::BLACK)))
            .padding()
            .is_none());
    }

    #[test]
    fn stroke_padding_is_half_width() {
        let e = StyleEntry::Stroke(StrokePaint::new(Pattern::Color(Color::BLACK), 6.0));
        assert_eq!(e.padding(), Some([3.0, 3.0, 3.0, 3.0]));
    }

    #[test]
    fn shadow_padding_accounts_for_offset() {
        let mut shadow = ShadowEffect::new(5.0, 2.0, -1.0, Color::BLACK);
        shadow.inner = false;
        let e = StyleEntry::Shadow(shadow);
        assert_eq!(e.padding(), Some([3.0, 6.0, 7.0, 4.0]));
    }

    #[test]
    fn inner_shadow_is_post() {
        let mut shadow = ShadowEffect::new(5.0, 0.0, 0.0, Color::BLACK);
        shadow.inner = true;
        assert!(StyleEntry::Shadow(shadow).is_post());
        assert!(!StyleEntry::Shadow(ShadowEffect::new(5.0, 0.0, 0.0, Color::BLACK)).is_post());
    }

    // ── vector effect ─────────────────────────────────────────────────────

    #[test]
    fn offset_effect_translates_source() {
        let e = OffsetEffect::new(10.0, 5.0);
        let source = vec![
            PathVertex::Move(Point::new(0.0, 0.0)),
            PathVertex::Line(Point::new(1.0, 1.0)),
            PathVertex::Close,
        ];
        let out = e.create_effect(source);
        assert_eq!(out[0], PathVertex::Move(Point::new(10.0, 5.0)));
        assert_eq!(out[1], PathVertex::Line(Point::new(11.0, 6.0)));
    }

    // ── hit testing ───────────────────────────────────────────────────────

    #[test]
    fn fill_hit_inside_only() {
        let flat = flatten(
            &Rect::new(0.0, 0.0, 10.0, 10.0).vertices(),
            Transform::identity(),
        );
        let e = StyleEntry::Fill(FillPaint::new(Pattern::Color(Color::BLACK)));
        assert!(e.hit_test(&flat, Point::new(5.0, 5.0), 0.0));
        assert!(!e.hit_test(&flat, Point::new(20.0, 5.0), 0.0));
    }

    #[test]
    fn stroke_hit_near_outline_only() {
        let flat = flatten(
            &Rect::new(0.0, 0.0, 10.0, 10.0).vertices(),
            Transform::identity(),
        );
        let e = StyleEntry::Stroke(StrokePaint::new(Pattern::Color(Color::BLACK), 4.0));
        assert!(e.hit_test(&flat, Point::new(0.5, 5.0), 0.0)); // within half width
        assert!(!e.hit_test(&flat, Point::new(5.0, 5.0), 0.0)); // interior, far from edges
    }

    // ── brushes ───────────────────────────────────────────────────────────

    #[test]
    fn texture_pattern_without_bitmap_yields_no_brush() {
        assert!(pattern_brush(&Pattern::Texture("x.png".into()), Rect::new(0.0, 0.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn gradient_pattern_spans_bbox() {
        let g = Pattern::Gradient(Gradient::default_stops(GradientKind::Linear));
        match pattern_brush(&g, Rect::new(10.0, 0.0, 20.0, 10.0)) {
            Some(Brush::LinearGradient { from, to, .. }) => {
                assert_eq!(from.x, 10.0);
                assert_eq!(to.x, 30.0);
            }
            other => panic!("unexpected brush {other:?}"),
        }
    }
}
