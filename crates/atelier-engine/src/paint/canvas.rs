use std::sync::Arc;

use super::blend::CompositeMode;
use super::color::Color;
use super::gradient::Gradient;
use super::pixmap::Pixmap;
use super::vertex::{FlatPath, VertexSource, flatten};
use crate::coords::{Point, Rect, Transform};

/// Texture tiling mode.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum RepeatMode {
    #[default]
    Both,
    Horizontal,
    Vertical,
    None,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LineCap {
    #[default]
    Butt,
    Round,
    Square,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum LineJoin {
    #[default]
    Miter,
    Round,
    Bevel,
}

/// Fill or stroke value resolved for painting. Brush geometry is given in
/// the user space active at the time of the paint call.
#[derive(Debug, Clone)]
pub enum Brush {
    Solid(Color),
    LinearGradient {
        from: Point,
        to: Point,
        gradient: Gradient,
    },
    RadialGradient {
        center: Point,
        radius: f32,
        gradient: Gradient,
    },
    Texture {
        pixmap: Arc<Pixmap>,
        repeat: RepeatMode,
    },
}

impl Brush {
    /// Premultiplied brush value at a user-space point.
    fn pixel(&self, p: Point) -> [f32; 4] {
        match self {
            Brush::Solid(color) => color.to_premul(),
            Brush::LinearGradient { from, to, gradient } => {
                let d = *to - *from;
                let len2 = d.x * d.x + d.y * d.y;
                let t = if len2 <= 0.0 {
                    0.0
                } else {
                    ((p.x - from.x) * d.x + (p.y - from.y) * d.y) / len2
                };
                premul(gradient.sample(t))
            }
            Brush::RadialGradient { center, radius, gradient } => {
                let d = p - *center;
                let dist = (d.x * d.x + d.y * d.y).sqrt();
                let t = if *radius <= 0.0 { 1.0 } else { dist / radius };
                premul(gradient.sample(t))
            }
            Brush::Texture { pixmap, repeat } => {
                let (w, h) = (pixmap.width() as f32, pixmap.height() as f32);
                if w <= 0.0 || h <= 0.0 {
                    return [0.0; 4];
                }
                let wrap = |v: f32, size: f32, tiled: bool| -> Option<i32> {
                    if tiled {
                        Some(v.rem_euclid(size) as i32)
                    } else if v < 0.0 || v >= size {
                        None
                    } else {
                        Some(v as i32)
                    }
                };
                let (tile_x, tile_y) = match repeat {
                    RepeatMode::Both => (true, true),
                    RepeatMode::Horizontal => (true, false),
                    RepeatMode::Vertical => (false, true),
                    RepeatMode::None => (false, false),
                };
                match (wrap(p.x, w, tile_x), wrap(p.y, h, tile_y)) {
                    (Some(x), Some(y)) => pixmap.pixel(x, y),
                    _ => [0.0; 4],
                }
            }
        }
    }
}

#[inline]
fn premul(c: [f32; 4]) -> [f32; 4] {
    [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]]
}

/// Raster drawing surface.
///
/// Wraps a [`Pixmap`] with a current transform (a local transform composed
/// with an origin translation and a scale), a clip stack, and a prepared
/// state that must bracket all drawing. Offscreen child surfaces created
/// through [`create_canvas`](Canvas::create_canvas) share the parent's
/// resolution and dirty areas, which is the mechanism behind style-level
/// offscreen compositing.
///
/// Invariant: `prepare` and `finish` calls are strictly paired, and every
/// `clip_rect` is popped by `reset_clip` before `finish`.
#[derive(Debug)]
pub struct Canvas {
    pixmap: Pixmap,
    transform: Transform,
    origin: Point,
    offset: Point,
    scale: f32,
    areas: Option<Vec<Rect>>,
    clip_stack: Vec<Rect>,
    path: FlatPath,
    prepared: bool,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            transform: Transform::identity(),
            origin: Point::zero(),
            offset: Point::zero(),
            scale: 1.0,
            areas: None,
            clip_stack: Vec::new(),
            path: FlatPath::default(),
            prepared: false,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    #[inline]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    #[inline]
    pub fn into_pixmap(self) -> Pixmap {
        self.pixmap
    }

    /// Direct pixel access for in-place filters.
    #[inline]
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Checkerboard tile pixmap used as the backdrop for transparency.
    pub fn chessboard(unit: u32, light: Color, dark: Color) -> Pixmap {
        let size = unit * 2;
        let mut pm = Pixmap::new(size, size);
        let light = light.to_premul();
        let dark = dark.to_premul();
        for y in 0..size {
            for x in 0..size {
                let odd = (x / unit + y / unit) % 2 == 1;
                pm.set_pixel(x as i32, y as i32, if odd { dark } else { light });
            }
        }
        pm
    }

    /// Reallocates the backing buffer; no-op when dimensions are unchanged.
    /// Non-positive dimensions are a caller contract violation.
    pub fn resize(&mut self, width: u32, height: u32) {
        debug_assert!(width > 0 && height > 0, "resize to empty surface");
        if width != self.pixmap.width() || height != self.pixmap.height() {
            self.pixmap = Pixmap::new(width, height);
        }
    }

    // ── transform state ───────────────────────────────────────────────────

    #[inline]
    pub fn offset(&self) -> Point {
        self.offset
    }

    #[inline]
    pub fn set_offset(&mut self, offset: Point) {
        self.offset = offset;
    }

    #[inline]
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn set_origin(&mut self, origin: Point) {
        if !origin.almost_eq(self.origin) {
            self.origin = origin;
        }
    }

    #[inline]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: f32) {
        if scale != self.scale {
            self.scale = scale;
        }
    }

    /// Current transform. The global transform composes the local one with
    /// the canvas scale and origin: local, then scale, then `-origin`.
    pub fn transform(&self, local: bool) -> Transform {
        if local {
            self.transform
        } else {
            self.transform.multiplied(
                Transform::scaling(self.scale, self.scale)
                    .translated(-self.origin.x, -self.origin.y),
            )
        }
    }

    /// Assigns a new local transform and returns the previous one.
    pub fn set_transform(&mut self, transform: Transform) -> Transform {
        std::mem::replace(&mut self.transform, transform)
    }

    /// Resets the local transform to identity, returning the previous one.
    #[inline]
    pub fn reset_transform(&mut self) -> Transform {
        self.set_transform(Transform::identity())
    }

    // ── prepare / finish ──────────────────────────────────────────────────

    /// Enters a paint pass. Resets transform/origin/scale, and when dirty
    /// `areas` are given clears and clips to them (intersected with the
    /// surface bounds); otherwise clears the whole surface. Areas should be
    /// integer-aligned to avoid rounding seams.
    pub fn prepare(&mut self, areas: Option<&[Rect]>) {
        debug_assert!(!self.prepared, "prepare without matching finish");
        self.prepared = true;

        self.transform = Transform::identity();
        self.origin = Point::zero();
        self.scale = 1.0;
        self.clip_stack.clear();

        match areas {
            Some(areas) if !areas.is_empty() => {
                let mut clipped = Vec::with_capacity(areas.len());
                for area in areas {
                    if let Some(r) = area.normalized().intersect(self.pixmap.bounds()) {
                        self.pixmap.clear_rect(r);
                        clipped.push(r);
                    }
                }
                self.areas = Some(clipped);
            }
            _ => {
                self.pixmap.clear();
                self.areas = None;
            }
        }
    }

    /// Leaves a paint pass, releasing per-prepare state.
    pub fn finish(&mut self) {
        debug_assert!(self.prepared, "finish without matching prepare");
        debug_assert!(self.clip_stack.is_empty(), "unbalanced clip_rect");
        self.prepared = false;
        self.transform = Transform::identity();
        self.origin = Point::zero();
        self.scale = 1.0;
        self.areas = None;
        self.path = FlatPath::default();
    }

    #[inline]
    pub fn dirty_areas(&self) -> Option<&[Rect]> {
        self.areas.as_deref()
    }

    // ── offscreen surfaces ────────────────────────────────────────────────

    /// Allocates a prepared child surface covering `extents` (user space)
    /// at this surface's resolution, clipped to this surface's bounds. The
    /// child's origin and scale are set so drawing in the same user space
    /// lands on the same device pixels; when `clip_dirty` is set the
    /// parent's dirty areas carry over, translated into the child.
    pub fn create_canvas(&self, extents: Rect, clip_dirty: bool) -> Canvas {
        let global = self.transform(false);

        let paint_extents = global.map_rect(extents);
        let mut left = paint_extents.x();
        let mut top = paint_extents.y();
        let mut width = paint_extents.width();
        let mut height = paint_extents.height();

        if top < 0.0 {
            height += top;
            top = 0.0;
        }
        if left < 0.0 {
            width += left;
            left = 0.0;
        }
        if left + width > self.width() as f32 {
            width = self.width() as f32 - left;
        }
        if top + height > self.height() as f32 {
            height = self.height() as f32 - top;
        }

        // Degenerate transforms never reach here; drawing is skipped earlier
        // for zero-scaled surfaces.
        let inverse = global.inverted().unwrap_or(Transform::identity());
        let scene_extents = inverse.map_rect(Rect::new(left, top, width, height));
        let final_extents = Rect::new(
            scene_extents.x() * self.scale,
            scene_extents.y() * self.scale,
            scene_extents.width() * self.scale,
            scene_extents.height() * self.scale,
        );

        let mut result = Canvas::new(
            (final_extents.width().ceil().max(1.0)) as u32,
            (final_extents.height().ceil().max(1.0)) as u32,
        );

        let areas: Option<Vec<Rect>> = if clip_dirty {
            self.areas
                .as_ref()
                .map(|areas| areas.iter().map(|a| a.translated(-left, -top)).collect())
        } else {
            None
        };
        result.prepare(areas.as_deref());

        let top_left = final_extents.min();
        result.set_origin(top_left);
        result.set_offset(top_left);
        result.set_scale(self.scale);

        result
    }

    /// Composites another surface onto this one at its recorded offset plus
    /// `(dx, dy)`, always at a 1:1 pixel mapping regardless of the other
    /// surface's scale. When `clear` is set the destination area is cleared
    /// first.
    pub fn draw_canvas(
        &mut self,
        canvas: &Canvas,
        dx: i32,
        dy: i32,
        opacity: f32,
        mode: CompositeMode,
        clear: bool,
    ) {
        let translation = self.transform.translation_part();
        let canvas_scale = if canvas.scale != 0.0 { canvas.scale } else { 1.0 };

        // Positions are pre-origin: the blit happens at 1:1 scale but the
        // surface origin translation still applies.
        let x = (canvas.offset.x + dx as f32 + translation.x * canvas_scale - self.origin.x).round()
            as i32;
        let y = (canvas.offset.y + dy as f32 + translation.y * canvas_scale - self.origin.y).round()
            as i32;
        let w = canvas.width();
        let h = canvas.height();

        if clear {
            self.pixmap
                .clear_rect(Rect::new(x as f32, y as f32, w as f32, h as f32));
        }

        if matters_on_empty(mode) {
            // Pixels outside the drawn area read as transparent and still
            // affect the destination, so cover the whole surface.
            for dy_ in 0..self.height() as i32 {
                for dx_ in 0..self.width() as i32 {
                    let px = canvas.pixmap.pixel(dx_ - x, dy_ - y);
                    self.put(dx_, dy_, scaled(px, opacity), mode);
                }
            }
            return;
        }

        for sy in 0..h as i32 {
            for sx in 0..w as i32 {
                let px = canvas.pixmap.pixel(sx, sy);
                if px[3] <= 0.0 {
                    continue;
                }
                self.put(x + sx, y + sy, scaled(px, opacity), mode);
            }
        }
    }

    // ── clipping ──────────────────────────────────────────────────────────

    /// Intersects the clip with a user-space rectangle. Paired with
    /// [`reset_clip`](Canvas::reset_clip).
    pub fn clip_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let device = self.transform(false).map_rect(Rect::new(x, y, width, height));
        self.clip_stack.push(device);
    }

    /// Pops the most recent clip rectangle.
    pub fn reset_clip(&mut self) {
        debug_assert!(!self.clip_stack.is_empty(), "reset_clip without clip_rect");
        self.clip_stack.pop();
    }

    fn clip_allows(&self, x: i32, y: i32) -> bool {
        let p = Point::new(x as f32 + 0.5, y as f32 + 0.5);
        if let Some(areas) = &self.areas {
            if !areas.iter().any(|a| a.contains(p)) {
                return false;
            }
        }
        self.clip_stack.iter().all(|c| c.contains(p))
    }

    #[inline]
    fn put(&mut self, x: i32, y: i32, src: [f32; 4], mode: CompositeMode) {
        if self.clip_allows(x, y) {
            self.pixmap.composite_pixel(x, y, src, mode);
        }
    }

    // ── vertices ──────────────────────────────────────────────────────────

    /// Loads a vertex source as the current path, replacing any previous
    /// one. Acts as the source for `fill_vertices` and `stroke_vertices`.
    pub fn put_vertices(&mut self, source: &dyn VertexSource) {
        self.path = flatten(&source.vertices(), self.transform(false));
    }

    /// Fills the current path with nonzero winding.
    pub fn fill_vertices(&mut self, brush: &Brush, opacity: f32, mode: CompositeMode) {
        let path = std::mem::take(&mut self.path);
        self.fill_flat_path(&path, brush, opacity, mode);
        self.path = path;
    }

    /// Strokes the current path. `width` is in user-space pixels and scales
    /// with the current transform.
    pub fn stroke_vertices(
        &mut self,
        brush: &Brush,
        width: f32,
        cap: LineCap,
        join: LineJoin,
        _miter_limit: f32,
        opacity: f32,
        mode: CompositeMode,
    ) {
        let path = std::mem::take(&mut self.path);
        let device_width = width * self.transform(false).determinant().abs().sqrt();
        let outline = stroke_outline(&path, device_width.max(1.0), cap, join);
        self.fill_flat_path(&outline, brush, opacity, mode);
        self.path = path;
    }

    fn fill_flat_path(&mut self, path: &FlatPath, brush: &Brush, opacity: f32, mode: CompositeMode) {
        let Some(bounds) = path.bounds else {
            return;
        };
        let Some(area) = bounds.aligned().intersect(self.pixmap.bounds()) else {
            return;
        };
        let inverse = match self.transform(false).inverted() {
            Some(t) => t,
            None => return,
        };

        let y0 = area.min().y as i32;
        let y1 = area.max().y.ceil() as i32;

        let mut crossings: Vec<(f32, i32)> = Vec::new();
        for y in y0..y1 {
            let yc = y as f32 + 0.5;
            crossings.clear();

            for contour in &path.contours {
                let n = contour.len();
                for i in 0..n {
                    let a = contour[i];
                    let b = contour[(i + 1) % n];
                    if (a.y <= yc) == (b.y <= yc) {
                        continue;
                    }
                    let x = a.x + (yc - a.y) * (b.x - a.x) / (b.y - a.y);
                    crossings.push((x, if b.y > a.y { 1 } else { -1 }));
                }
            }
            if crossings.is_empty() {
                continue;
            }
            crossings.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut winding = 0;
            for pair in 0..crossings.len() {
                let (x, dir) = crossings[pair];
                let prev = winding;
                winding += dir;
                if prev == 0 && winding != 0 {
                    continue;
                }
                if prev != 0 && winding == 0 {
                    // Close of a covered span, fill back to its start.
                    let start = span_start(&crossings, pair);
                    let x_begin = start.max(area.min().x) as i32;
                    let x_end = (x.min(area.max().x)).ceil() as i32;
                    for px in x_begin..x_end {
                        let center = Point::new(px as f32 + 0.5, yc);
                        if !within(center.x, start, x) {
                            continue;
                        }
                        let user = inverse.map_point(center);
                        self.put(px, y, scaled(brush.pixel(user), opacity), mode);
                    }
                }
            }
        }
    }

    // ── rect / line primitives ────────────────────────────────────────────

    /// Fills a user-space rectangle, source-over.
    pub fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32, brush: &Brush, opacity: f32) {
        self.put_vertices(&Rect::new(x, y, width, height));
        self.fill_vertices(brush, opacity, CompositeMode::default());
    }

    /// Strokes a user-space rectangle, source-over.
    pub fn stroke_rect(
        &mut self,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        stroke_width: f32,
        brush: &Brush,
        opacity: f32,
    ) {
        self.put_vertices(&Rect::new(x, y, width, height));
        self.stroke_vertices(
            brush,
            stroke_width,
            LineCap::Butt,
            LineJoin::Miter,
            10.0,
            opacity,
            CompositeMode::default(),
        );
    }

    /// Strokes a user-space line segment, source-over.
    pub fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, stroke_width: f32, brush: &Brush) {
        use super::vertex::PathVertex;
        let verts = vec![
            PathVertex::Move(Point::new(x1, y1)),
            PathVertex::Line(Point::new(x2, y2)),
            PathVertex::Line(Point::new(x2, y2)), // keep the open subpath alive
        ];
        self.path = open_polyline(&verts, self.transform(false));
        self.stroke_vertices(
            brush,
            stroke_width,
            LineCap::Butt,
            LineJoin::Miter,
            10.0,
            1.0,
            CompositeMode::default(),
        );
    }

    /// Fills the whole visible surface area with the given brush.
    pub fn fill_canvas(&mut self, brush: &Brush) {
        if let Some(inverse) = self.transform(false).inverted() {
            let r = inverse.map_rect(self.pixmap.bounds());
            self.fill_rect(r.x(), r.y(), r.width(), r.height(), brush, 1.0);
        }
    }

    /// Clears the whole surface to transparent, ignoring the clip.
    pub fn clear(&mut self) {
        self.pixmap.clear();
    }

    /// Draws an image with its top-left corner at user-space `(x, y)`,
    /// nearest-neighbor sampled through the current transform.
    pub fn draw_image(&mut self, image: &Pixmap, x: f32, y: f32, opacity: f32, mode: CompositeMode) {
        let global = self.transform(false);
        let user = Rect::new(x, y, image.width() as f32, image.height() as f32);
        let Some(area) = global.map_rect(user).aligned().intersect(self.pixmap.bounds()) else {
            return;
        };
        let Some(inverse) = global.inverted() else {
            return;
        };

        let y0 = area.min().y as i32;
        let y1 = area.max().y.ceil() as i32;
        let x0 = area.min().x as i32;
        let x1 = area.max().x.ceil() as i32;

        for dy in y0..y1 {
            for dx in x0..x1 {
                let user_p = inverse.map_point(Point::new(dx as f32 + 0.5, dy as f32 + 0.5));
                let sx = (user_p.x - x).floor() as i32;
                let sy = (user_p.y - y).floor() as i32;
                if sx < 0 || sy < 0 || sx as u32 >= image.width() || sy as u32 >= image.height() {
                    continue;
                }
                let px = image.pixel(sx, sy);
                if px[3] <= 0.0 && !matters_on_empty(mode) {
                    continue;
                }
                self.put(dx, dy, scaled(px, opacity), mode);
            }
        }
    }
}

/// True when a transparent source pixel still affects the destination.
#[inline]
fn matters_on_empty(mode: CompositeMode) -> bool {
    use super::blend::CompositeOperator as Op;
    matches!(
        mode,
        CompositeMode::Operator(
            Op::SourceIn | Op::SourceOut | Op::DestinationIn | Op::DestinationAtop | Op::Copy | Op::Darker
        )
    )
}

#[inline]
fn scaled(px: [f32; 4], opacity: f32) -> [f32; 4] {
    let o = opacity.clamp(0.0, 1.0);
    [px[0] * o, px[1] * o, px[2] * o, px[3] * o]
}

#[inline]
fn within(x: f32, lo: f32, hi: f32) -> bool {
    x >= lo && x < hi
}

fn span_start(crossings: &[(f32, i32)], close_index: usize) -> f32 {
    // Walk back to the crossing that opened the current covered span.
    let mut winding = 0;
    let mut start = crossings[close_index].0;
    for &(x, dir) in &crossings[..=close_index] {
        let prev = winding;
        winding += dir;
        if prev == 0 && winding != 0 {
            start = x;
        }
    }
    start
}

/// Builds the fill outline of a stroked path: one quad per segment plus cap
/// geometry, filled together with nonzero winding. Joins come out slightly
/// rounded by the overlapping segment quads.
fn stroke_outline(path: &FlatPath, width: f32, cap: LineCap, _join: LineJoin) -> FlatPath {
    let hw = width / 2.0;
    let mut contours: Vec<Vec<Point>> = Vec::new();

    for contour in &path.contours {
        let n = contour.len();
        if n < 2 {
            continue;
        }
        for i in 0..n {
            let a = contour[i];
            let b = contour[(i + 1) % n];
            if i + 1 == n && !path.closed {
                break;
            }
            if let Some(quad) = segment_quad(a, b, hw, cap, path.closed || (i > 0 && i + 1 < n)) {
                contours.push(quad);
            }
        }
        if cap == LineCap::Round && !path.closed {
            contours.push(octagon(contour[0], hw));
            contours.push(octagon(contour[n - 1], hw));
        }
    }

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

fn segment_quad(a: Point, b: Point, hw: f32, cap: LineCap, interior: bool) -> Option<Vec<Point>> {
    let d = b - a;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if len <= 0.0 {
        return None;
    }
    let dir = Point::new(d.x / len, d.y / len);
    let normal = Point::new(-dir.y * hw, dir.x * hw);

    let (a, b) = if cap == LineCap::Square && !interior {
        (a - dir * hw, b + dir * hw)
    } else {
        (a, b)
    };

    Some(vec![a + normal, b + normal, b - normal, a - normal])
}

fn octagon(center: Point, radius: f32) -> Vec<Point> {
    (0..8)
        .map(|i| {
            let angle = std::f32::consts::TAU * i as f32 / 8.0;
            Point::new(center.x + radius * angle.cos(), center.y + radius * angle.sin())
        })
        .collect()
}

/// Flattens an open polyline without implicit closing, for line strokes.
fn open_polyline(vertices: &[super::vertex::PathVertex], transform: Transform) -> FlatPath {
    use super::vertex::PathVertex;
    let mut points = Vec::new();
    for v in vertices {
        match v {
            PathVertex::Move(p) | PathVertex::Line(p) => points.push(transform.map_point(*p)),
            _ => {}
        }
    }
    points.dedup_by(|a, b| a.almost_eq(*b));

    let mut bounds: Option<Rect> = None;
    for p in &points {
        let r = Rect::from_origin_size(*p, Point::zero());
        bounds = Some(match bounds {
            Some(b) => b.united(r),
            None => r,
        });
    }

    FlatPath { contours: vec![points], bounds, closed: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::blend::CompositeOperator;

    fn red() -> Brush {
        Brush::Solid(Color::rgb(255.0, 0.0, 0.0))
    }

    fn prepared(width: u32, height: u32) -> Canvas {
        let mut c = Canvas::new(width, height);
        c.prepare(None);
        c
    }

    // ── prepare / finish ──────────────────────────────────────────────────

    #[test]
    fn prepare_with_areas_clears_and_clips() {
        let mut c = Canvas::new(10, 10);
        c.prepare(None);
        c.fill_rect(0.0, 0.0, 10.0, 10.0, &red(), 1.0);
        c.finish();

        c.prepare(Some(&[Rect::new(0.0, 0.0, 5.0, 5.0)]));
        // Cleared inside the area, untouched outside.
        assert_eq!(c.pixmap().pixel(2, 2), [0.0; 4]);
        assert!(c.pixmap().pixel(7, 7)[3] > 0.9);

        // Drawing is clipped to the area.
        c.fill_rect(0.0, 0.0, 10.0, 10.0, &red(), 1.0);
        assert!(c.pixmap().pixel(2, 2)[3] > 0.9);
        c.finish();
    }

    #[test]
    fn prepare_resets_transform_state() {
        let mut c = Canvas::new(4, 4);
        c.prepare(None);
        c.set_scale(3.0);
        c.set_origin(Point::new(5.0, 5.0));
        c.finish();
        c.prepare(None);
        assert_eq!(c.scale(), 1.0);
        assert!(c.transform(false).is_identity());
        c.finish();
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn set_transform_returns_previous() {
        let mut c = prepared(4, 4);
        let t = Transform::translation(2.0, 0.0);
        assert!(c.set_transform(t).is_identity());
        assert!(c.reset_transform().almost_eq(t));
        c.finish();
    }

    #[test]
    fn global_transform_composes_origin_and_scale() {
        let mut c = prepared(100, 100);
        c.set_scale(2.0);
        c.set_origin(Point::new(10.0, 0.0));
        // (5,0) user => scale 2 => (10,0) => minus origin => (0,0)
        let p = c.transform(false).map_point(Point::new(5.0, 0.0));
        assert!(p.almost_eq(Point::zero()));
        c.finish();
    }

    // ── fill ──────────────────────────────────────────────────────────────

    #[test]
    fn fill_rect_respects_transform() {
        let mut c = prepared(10, 10);
        c.set_transform(Transform::translation(5.0, 5.0));
        c.fill_rect(0.0, 0.0, 2.0, 2.0, &red(), 1.0);
        assert!(c.pixmap().pixel(5, 5)[0] > 0.9);
        assert_eq!(c.pixmap().pixel(2, 2), [0.0; 4]);
        c.finish();
    }

    #[test]
    fn fill_vertices_nonzero_winding() {
        let mut c = prepared(20, 20);
        c.put_vertices(&Rect::new(2.0, 2.0, 10.0, 10.0));
        c.fill_vertices(&red(), 1.0, CompositeMode::default());
        assert!(c.pixmap().pixel(7, 7)[0] > 0.9);
        assert_eq!(c.pixmap().pixel(15, 15), [0.0; 4]);
        c.finish();
    }

    #[test]
    fn fill_with_opacity_scales_alpha() {
        let mut c = prepared(4, 4);
        c.fill_rect(0.0, 0.0, 4.0, 4.0, &red(), 0.5);
        let p = c.pixmap().pixel(1, 1);
        assert!((p[3] - 0.5).abs() < 0.02);
        c.finish();
    }

    #[test]
    fn linear_gradient_ends() {
        let g = Gradient::default_stops(crate::paint::GradientKind::Linear);
        let brush = Brush::LinearGradient {
            from: Point::new(0.0, 0.0),
            to: Point::new(16.0, 0.0),
            gradient: g,
        };
        let mut c = prepared(16, 4);
        c.fill_rect(0.0, 0.0, 16.0, 4.0, &brush, 1.0);
        // Black end vs white end.
        assert!(c.pixmap().pixel(0, 1)[0] < 0.1);
        assert!(c.pixmap().pixel(15, 1)[0] > 0.9);
        c.finish();
    }

    #[test]
    fn texture_brush_tiles() {
        let mut tile = Pixmap::new(2, 2);
        tile.set_pixel(0, 0, [1.0, 0.0, 0.0, 1.0]);
        let brush = Brush::Texture { pixmap: Arc::new(tile), repeat: RepeatMode::Both };
        let mut c = prepared(8, 8);
        c.fill_rect(0.0, 0.0, 8.0, 8.0, &brush, 1.0);
        assert!(c.pixmap().pixel(0, 0)[0] > 0.9);
        assert!(c.pixmap().pixel(4, 4)[0] > 0.9); // repeated tile
        assert!(c.pixmap().pixel(1, 0)[0] < 0.1);
        c.finish();
    }

    // ── stroke ────────────────────────────────────────────────────────────

    #[test]
    fn stroke_line_covers_segment() {
        let mut c = prepared(20, 10);
        c.stroke_line(2.0, 5.0, 18.0, 5.0, 2.0, &red());
        assert!(c.pixmap().pixel(10, 5)[0] > 0.9);
        assert_eq!(c.pixmap().pixel(10, 1), [0.0; 4]);
        c.finish();
    }

    #[test]
    fn stroke_width_scales_with_transform() {
        let mut c = prepared(40, 40);
        c.set_transform(Transform::scaling(4.0, 4.0));
        c.stroke_line(0.0, 5.0, 10.0, 5.0, 2.0, &red());
        // 2 user pixels at 4x scale: 8 device pixels tall around y=20.
        assert!(c.pixmap().pixel(20, 17)[0] > 0.9);
        assert!(c.pixmap().pixel(20, 23)[0] > 0.9);
        c.finish();
    }

    // ── clip ──────────────────────────────────────────────────────────────

    #[test]
    fn clip_rect_restricts_drawing() {
        let mut c = prepared(10, 10);
        c.clip_rect(0.0, 0.0, 5.0, 5.0);
        c.fill_rect(0.0, 0.0, 10.0, 10.0, &red(), 1.0);
        c.reset_clip();
        assert!(c.pixmap().pixel(2, 2)[0] > 0.9);
        assert_eq!(c.pixmap().pixel(7, 7), [0.0; 4]);
        c.finish();
    }

    // ── offscreen ─────────────────────────────────────────────────────────

    #[test]
    fn create_canvas_matches_parent_resolution() {
        let mut parent = Canvas::new(100, 100);
        parent.prepare(None);
        parent.set_scale(2.0);
        let child = parent.create_canvas(Rect::new(10.0, 10.0, 20.0, 20.0), false);
        // 20 user units at scale 2 => 40 device pixels.
        assert_eq!(child.width(), 40);
        assert_eq!(child.height(), 40);
        assert_eq!(child.scale(), 2.0);
        assert!(child.origin().almost_eq(Point::new(20.0, 20.0)));
        parent.finish();
    }

    #[test]
    fn child_draws_back_aligned() {
        let mut parent = Canvas::new(50, 50);
        parent.prepare(None);

        let mut child = parent.create_canvas(Rect::new(10.0, 10.0, 10.0, 10.0), false);
        child.fill_rect(10.0, 10.0, 10.0, 10.0, &red(), 1.0);
        child.finish();

        parent.draw_canvas(&child, 0, 0, 1.0, CompositeMode::default(), false);
        assert!(parent.pixmap().pixel(15, 15)[0] > 0.9);
        assert_eq!(parent.pixmap().pixel(5, 5), [0.0; 4]);
        parent.finish();
    }

    #[test]
    fn draw_canvas_ignores_child_scale() {
        // A child made at 2x covers the same device area when drawn 1:1.
        let mut parent = Canvas::new(40, 40);
        parent.prepare(None);
        parent.set_scale(2.0);

        let mut child = parent.create_canvas(Rect::new(0.0, 0.0, 10.0, 10.0), false);
        child.fill_rect(0.0, 0.0, 10.0, 10.0, &red(), 1.0);
        child.finish();
        assert_eq!(child.width(), 20);

        parent.reset_transform();
        parent.set_scale(1.0);
        parent.draw_canvas(&child, 0, 0, 1.0, CompositeMode::default(), false);
        assert!(parent.pixmap().pixel(10, 10)[0] > 0.9);
        parent.finish();
    }

    #[test]
    fn draw_canvas_destination_in_masks() {
        let mut parent = prepared(4, 4);
        parent.fill_rect(0.0, 0.0, 4.0, 4.0, &red(), 1.0);

        let mut mask = Canvas::new(4, 4);
        mask.prepare(None);
        mask.fill_rect(0.0, 0.0, 2.0, 4.0, &Brush::Solid(Color::BLACK), 1.0);
        mask.finish();

        parent.draw_canvas(&mask, 0, 0, 1.0, CompositeOperator::DestinationIn.into(), false);
        assert!(parent.pixmap().pixel(1, 1)[3] > 0.9);
        assert_eq!(parent.pixmap().pixel(3, 1)[3], 0.0);
        parent.finish();
    }

    // ── misc ──────────────────────────────────────────────────────────────

    #[test]
    fn resize_is_noop_for_same_size() {
        let mut c = Canvas::new(8, 8);
        c.prepare(None);
        c.fill_rect(0.0, 0.0, 8.0, 8.0, &red(), 1.0);
        c.finish();
        c.resize(8, 8);
        assert!(c.pixmap().pixel(1, 1)[0] > 0.9);
        c.resize(16, 8);
        assert_eq!(c.pixmap().pixel(1, 1), [0.0; 4]);
    }

    #[test]
    fn chessboard_alternates() {
        let pm = Canvas::chessboard(2, Color::WHITE, Color::rgb(128.0, 128.0, 128.0));
        assert_eq!(pm.width(), 4);
        assert!(pm.pixel(0, 0)[0] > 0.9);
        assert!(pm.pixel(2, 0)[0] < 0.9);
        assert!(pm.pixel(2, 2)[0] > 0.9);
    }
}
