//! Scene rendering: walks the element tree onto a canvas, honoring dirty
//! areas, the clip area, page clipping, and master-page sharing.

use anyhow::Context as _;

use super::element::{Element, ElementFlags, ElementId, ElementKind};
use super::scene::Scene;
use super::shapes::ImageShape;
use super::style::render::{paint_entries, render_style};
use crate::coords::{Point, Rect, Transform};
use crate::paint::{Brush, Canvas, Color, CompositeMode, CompositeOperator, Pixmap};
use crate::view::dirty::DirtyMatcher;

/// Per-pass rendering options.
#[derive(Debug, Copy, Clone, Default)]
pub struct RenderConfig {
    /// Clip page contents to the page plus bleed even without a master.
    pub pages_clip: bool,
    /// World-space area outside of which elements are skipped entirely.
    pub clip_area: Option<Rect>,
}

/// State threaded through a render pass. The canvas is owned so style
/// compositing can swap offscreen surfaces in and out.
#[derive(Debug)]
pub struct RenderContext {
    pub canvas: Canvas,
    pub dirty: Option<DirtyMatcher>,
    pub config: RenderConfig,
}

impl RenderContext {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            canvas,
            dirty: None,
            config: RenderConfig::default(),
        }
    }

    #[inline]
    pub fn into_canvas(self) -> Canvas {
        self.canvas
    }
}

/// Bitmap export sizing per axis.
#[derive(Debug, Copy, Clone, Default)]
pub enum BitmapSize {
    /// Natural size of the painted area.
    #[default]
    Auto,
    /// Scale factor applied to the painted area.
    Scale(f32),
    /// Absolute size in pixels.
    Absolute(f32),
}

/// How to reconcile differing horizontal and vertical scales.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub enum RatioMode {
    /// Use the smaller scale for both axes.
    #[default]
    MinAspect,
    /// Use the larger scale for both axes.
    MaxAspect,
    /// Keep the requested extents and center the content.
    Centered,
}

impl Scene {
    /// Renders the whole scene.
    pub fn render(&self, ctx: &mut RenderContext) {
        self.render_element(self.root(), ctx);
    }

    /// Renders one element and its subtree.
    pub fn render_element(&self, id: ElementId, ctx: &mut RenderContext) {
        if !self.prepare_paint(id, ctx) {
            return;
        }
        let Some(element) = self.element(id) else {
            return;
        };

        let mut painted_styled = false;
        for (style_index, style) in element.styles.iter().enumerate() {
            if !style.visible {
                continue;
            }
            painted_styled = true;
            let geometry_bbox = self
                .geometry_bbox(id)
                .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
            render_style(
                ctx,
                style,
                element.kind().is_vertex_source(),
                geometry_bbox,
                &mut |ctx| self.paint(id, element, ctx, Some((style_index, style))),
            );
        }

        if !painted_styled {
            self.paint(id, element, ctx, None);
        }
    }

    /// Whether an element paints in this pass: not flagged no-paint, has a
    /// non-empty painted area, and that area is dirty and inside the clip.
    fn prepare_paint(&self, id: ElementId, ctx: &RenderContext) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if element.flags().has(ElementFlags::NO_PAINT) || !element.is_visible() {
            return false;
        }
        let Some(bbox) = self.paint_bbox(id) else {
            return false;
        };
        if bbox.is_empty() {
            return false;
        }
        if let Some(matcher) = &ctx.dirty {
            if !matcher.is_dirty(bbox) {
                return false;
            }
        }
        if let Some(clip) = ctx.config.clip_area {
            if !clip.intersects(bbox) {
                return false;
            }
        }
        true
    }

    fn paint(
        &self,
        id: ElementId,
        element: &Element,
        ctx: &mut RenderContext,
        style: Option<(usize, &super::style::Style)>,
    ) {
        match element.kind() {
            ElementKind::Group => self.render_children(element, ctx),
            ElementKind::Page(_) => self.paint_page(id, element, ctx),
            ElementKind::Image(shape) => {
                match style {
                    Some((style_index, style)) => {
                        self.paint_image_styled(id, element, shape, ctx, style, style_index);
                    }
                    None => paint_image(element, shape, &mut ctx.canvas, None),
                }
                self.render_children(element, ctx);
            }
            ElementKind::Rectangle(_) | ElementKind::Polygon(_) => {
                if let Some((_, style)) = style {
                    if let Some(vertices) = self.element_vertices(element) {
                        paint_entries(&mut ctx.canvas, style, &vertices);
                    }
                }
                self.render_children(element, ctx);
            }
        }
    }

    fn render_children(&self, element: &Element, ctx: &mut RenderContext) {
        for child in element.children() {
            self.render_element(*child, ctx);
        }
    }

    /// Pages clip their contents to their extents plus bleed (when shared
    /// through a master or configured to), render their master's contents
    /// translated into place, then their own children.
    fn paint_page(&self, id: ElementId, element: &Element, ctx: &mut RenderContext) {
        let ElementKind::Page(page) = element.kind() else {
            return;
        };
        let master = self.master_page(id);
        let has_contents = !element.children().is_empty();

        // Clip coordinates are device-aligned, independent of the current
        // local transform.
        let canvas_transform = ctx.canvas.reset_transform();
        let device_rect = canvas_transform.map_rect(page.bounds()).aligned();
        let (x, y) = (device_rect.x(), device_rect.y());
        let (w, h) = (device_rect.width(), device_rect.height());

        let mut clipped = false;
        if (has_contents && master.is_some()) || ctx.config.pages_clip || self.config().clip_pages {
            let bl = page.bleed.max(0.0);
            ctx.canvas
                .clip_rect(x - bl, y - bl, w + bl * 2.0, h + bl * 2.0);
            clipped = true;
        }
        ctx.canvas.set_transform(canvas_transform);

        if let Some(master_id) = master {
            if let Some(ElementKind::Page(master_page)) =
                self.element(master_id).map(|e| e.kind())
            {
                let (dx, dy) = (page.x - master_page.x, page.y - master_page.y);
                let local = ctx.canvas.transform(true);

                // Translate the canvas onto this page and counter-translate
                // the dirty areas into master space; restore in reverse.
                ctx.canvas
                    .set_transform(local.pre_multiplied(Transform::translation(dx, dy)));
                if let Some(matcher) = ctx.dirty.as_mut() {
                    matcher.transform(Transform::translation(-dx, -dy));
                }

                self.render_element(master_id, ctx);

                if let Some(matcher) = ctx.dirty.as_mut() {
                    matcher.transform(Transform::translation(dx, dy));
                }
                ctx.canvas.set_transform(local);
            }
        }

        if has_contents {
            self.render_children(element, ctx);
        }

        if clipped {
            ctx.canvas.reset_clip();
        }
    }

    /// Styled image painting: the style is rendered onto a scratch surface
    /// over the image contents, then clipped by the image alpha before
    /// compositing back.
    fn paint_image_styled(
        &self,
        id: ElementId,
        element: &Element,
        shape: &ImageShape,
        ctx: &mut RenderContext,
        style: &super::style::Style,
        style_index: usize,
    ) {
        use super::shapes::ImageStatus;

        let Some(vertices) = self.element_vertices(element) else {
            return;
        };

        if shape.status() == ImageStatus::Loaded {
            let geometry_bbox = self
                .geometry_bbox(id)
                .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
            let scratch = ctx.canvas.create_canvas(style.bbox(geometry_bbox), false);
            let source = std::mem::replace(&mut ctx.canvas, scratch);

            // Image contents go down once, under the first style.
            if style_index == 0 {
                paint_image(element, shape, &mut ctx.canvas, None);
            }
            paint_entries(&mut ctx.canvas, style, &vertices);
            paint_image(
                element,
                shape,
                &mut ctx.canvas,
                Some(CompositeOperator::DestinationIn.into()),
            );

            let mut scratch = std::mem::replace(&mut ctx.canvas, source);
            ctx.canvas
                .draw_canvas(&scratch, 0, 0, 1.0, CompositeMode::default(), false);
            scratch.finish();
        } else {
            paint_image(element, shape, &mut ctx.canvas, None);
            paint_entries(&mut ctx.canvas, style, &vertices);
        }
    }

    /// Renders an element into a standalone bitmap.
    pub fn to_bitmap(
        &self,
        id: ElementId,
        width: BitmapSize,
        height: BitmapSize,
        ratio: RatioMode,
    ) -> anyhow::Result<Pixmap> {
        let paint_area = self
            .paint_bbox(id)
            .filter(|b| !b.is_empty())
            .context("element has no painted area")?;

        let axis_scale = |size: BitmapSize, extent: f32| match size {
            BitmapSize::Auto => 1.0,
            BitmapSize::Scale(s) => s,
            BitmapSize::Absolute(px) => px / extent,
        };
        let scale_x = axis_scale(width, paint_area.width());
        let scale_y = axis_scale(height, paint_area.height());

        let (scale, canvas_w, canvas_h, delta_x, delta_y) = if scale_x != scale_y {
            match ratio {
                RatioMode::MinAspect => {
                    let s = scale_x.min(scale_y);
                    (s, paint_area.width() * s, paint_area.height() * s, 0.0, 0.0)
                }
                RatioMode::MaxAspect => {
                    let s = scale_x.max(scale_y);
                    (s, paint_area.width() * s, paint_area.height() * s, 0.0, 0.0)
                }
                RatioMode::Centered => {
                    let s = scale_x.min(scale_y);
                    let cw = paint_area.width() * scale_x;
                    let ch = paint_area.height() * scale_y;
                    let dx = (cw - paint_area.width() * s) / 2.0;
                    let dy = (ch - paint_area.height() * s) / 2.0;
                    (s, cw, ch, dx, dy)
                }
            }
        } else {
            let s = scale_x;
            (s, paint_area.width() * s, paint_area.height() * s, 0.0, 0.0)
        };

        anyhow::ensure!(
            scale.is_finite() && scale > 0.0,
            "invalid bitmap scale {scale}"
        );

        let mut canvas = Canvas::new(
            canvas_w.ceil().max(1.0) as u32,
            canvas_h.ceil().max(1.0) as u32,
        );
        canvas.prepare(None);
        canvas.set_origin(Point::new(
            paint_area.x() * scale - delta_x,
            paint_area.y() * scale - delta_y,
        ));
        canvas.set_scale(scale);

        let mut ctx = RenderContext::new(canvas);
        ctx.config.clip_area = Some(paint_area);
        self.render_element(id, &mut ctx);

        let mut canvas = ctx.into_canvas();
        canvas.finish();
        Ok(canvas.into_pixmap())
    }
}

/// Paints the raw image (or its placeholder) in shape-local space, with the
/// element transform composed onto the current canvas transform.
fn paint_image(
    element: &Element,
    shape: &ImageShape,
    canvas: &mut Canvas,
    mode: Option<CompositeMode>,
) {
    use super::shapes::ImageStatus;

    let local = canvas.transform(true);
    if let Some(trf) = element.transform() {
        canvas.set_transform(local.pre_multiplied(trf));
    }

    match (shape.status(), shape.bitmap()) {
        (ImageStatus::Loaded, Some(bitmap)) => {
            canvas.draw_image(bitmap, 0.0, 0.0, 1.0, mode.unwrap_or_default());
        }
        _ => {
            let (w, h) = (shape.width(), shape.height());
            canvas.fill_rect(
                0.0,
                0.0,
                w,
                h,
                &Brush::Solid(Color::rgb(240.0, 240.0, 240.0)),
                1.0,
            );
            if shape.status() == ImageStatus::Error {
                let red = Brush::Solid(Color::rgb(255.0, 0.0, 0.0));
                canvas.stroke_line(0.0, 0.0, w, h, 2.0, &red);
                canvas.stroke_line(w, 0.0, 0.0, h, 2.0, &red);
            }
        }
    }

    canvas.set_transform(local);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Pattern;
    use crate::scene::page::PageData;
    use crate::scene::shapes::RectangleShape;
    use crate::scene::style::{FillPaint, Style, StyleEntry};

    fn filled_rect(scene: &mut Scene, parent: ElementId, r: Rect, color: Color) -> ElementId {
        let id = scene.insert(parent, ElementKind::Rectangle(RectangleShape));
        scene.set_transform(
            id,
            Some(RectangleShape::place(r.x(), r.y(), r.width(), r.height())),
        );
        scene.set_styles(
            id,
            vec![Style::with_entries(vec![StyleEntry::Fill(FillPaint::new(
                Pattern::Color(color),
            ))])],
        );
        id
    }

    fn rendered(scene: &Scene, width: u32, height: u32) -> Pixmap {
        let mut canvas = Canvas::new(width, height);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        scene.render(&mut ctx);
        let mut canvas = ctx.into_canvas();
        canvas.finish();
        canvas.into_pixmap()
    }

    // ── element rendering ─────────────────────────────────────────────────

    #[test]
    fn filled_rectangle_renders() {
        let mut scene = Scene::new();
        let root = scene.root();
        filled_rect(
            &mut scene,
            root,
            Rect::new(4.0, 4.0, 8.0, 8.0),
            Color::rgb(255.0, 0.0, 0.0),
        );
        let pm = rendered(&scene, 16, 16);
        assert!(pm.pixel(8, 8)[0] > 0.9);
        assert_eq!(pm.pixel(1, 1), [0.0; 4]);
    }

    #[test]
    fn hidden_and_no_paint_elements_are_skipped() {
        let mut scene = Scene::new();
        let root = scene.root();
        let hidden = filled_rect(
            &mut scene,
            root,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Color::rgb(255.0, 0.0, 0.0),
        );
        let muted = filled_rect(
            &mut scene,
            root,
            Rect::new(8.0, 8.0, 8.0, 8.0),
            Color::rgb(0.0, 255.0, 0.0),
        );
        scene.set_flag(hidden, ElementFlags::HIDDEN, true);
        scene.set_flag(muted, ElementFlags::NO_PAINT, true);

        let pm = rendered(&scene, 16, 16);
        assert_eq!(pm.pixel(4, 4), [0.0; 4]);
        assert_eq!(pm.pixel(12, 12), [0.0; 4]);
    }

    #[test]
    fn dirty_matcher_prunes_clean_elements() {
        let mut scene = Scene::new();
        let root = scene.root();
        filled_rect(
            &mut scene,
            root,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Color::rgb(255.0, 0.0, 0.0),
        );
        filled_rect(
            &mut scene,
            root,
            Rect::new(20.0, 20.0, 8.0, 8.0),
            Color::rgb(0.0, 255.0, 0.0),
        );

        let mut canvas = Canvas::new(32, 32);
        canvas.prepare(Some(&[Rect::new(0.0, 0.0, 10.0, 10.0)]));
        let mut ctx = RenderContext::new(canvas);
        ctx.dirty = Some(DirtyMatcher::new(vec![Rect::new(0.0, 0.0, 10.0, 10.0)]));
        scene.render(&mut ctx);
        let mut canvas = ctx.into_canvas();

        assert!(canvas.pixmap().pixel(4, 4)[0] > 0.9);
        // The clean element was pruned, and the prepare clip would have
        // blocked it anyway.
        assert_eq!(canvas.pixmap().pixel(24, 24), [0.0; 4]);
        canvas.finish();
    }

    // ── pages ─────────────────────────────────────────────────────────────

    #[test]
    fn page_clips_contents_when_configured() {
        let mut scene = Scene::new();
        let page = scene.insert(
            scene.root(),
            ElementKind::Page(PageData::new(0.0, 0.0, 10.0, 10.0)),
        );
        // Contents poking out of the page.
        filled_rect(
            &mut scene,
            page,
            Rect::new(5.0, 5.0, 20.0, 4.0),
            Color::rgb(255.0, 0.0, 0.0),
        );

        let mut canvas = Canvas::new(32, 32);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        ctx.config.pages_clip = true;
        scene.render(&mut ctx);
        let mut canvas = ctx.into_canvas();

        assert!(canvas.pixmap().pixel(7, 6)[0] > 0.9);
        assert_eq!(canvas.pixmap().pixel(15, 6), [0.0; 4]);
        canvas.finish();
    }

    #[test]
    fn linked_page_renders_master_contents_translated() {
        let mut scene = Scene::new();
        scene.set_config(crate::scene::SceneConfig {
            clip_pages: false,
            single_page: false,
        });
        let master = scene.insert(
            scene.root(),
            ElementKind::Page(PageData::new(0.0, 0.0, 12.0, 12.0)),
        );
        let linked = scene.insert(
            scene.root(),
            ElementKind::Page(PageData::new(16.0, 0.0, 12.0, 12.0)),
        );
        scene.set_page_master(linked, Some(master));
        filled_rect(
            &mut scene,
            master,
            Rect::new(2.0, 2.0, 4.0, 4.0),
            Color::rgb(255.0, 0.0, 0.0),
        );

        let pm = rendered(&scene, 32, 16);
        // Master's own copy and the translated copy on the linked page.
        assert!(pm.pixel(4, 4)[0] > 0.9);
        assert!(pm.pixel(20, 4)[0] > 0.9);
    }

    // ── bitmap export ─────────────────────────────────────────────────────

    #[test]
    fn to_bitmap_covers_paint_area() {
        let mut scene = Scene::new();
        let root = scene.root();
        let id = filled_rect(
            &mut scene,
            root,
            Rect::new(10.0, 10.0, 8.0, 6.0),
            Color::rgb(0.0, 0.0, 255.0),
        );
        let pm = scene
            .to_bitmap(id, BitmapSize::Auto, BitmapSize::Auto, RatioMode::MinAspect)
            .unwrap();
        assert_eq!(pm.width(), 8);
        assert_eq!(pm.height(), 6);
        assert!(pm.pixel(4, 3)[2] > 0.9);
    }

    #[test]
    fn to_bitmap_scales() {
        let mut scene = Scene::new();
        let root = scene.root();
        let id = filled_rect(
            &mut scene,
            root,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Color::rgb(0.0, 0.0, 255.0),
        );
        let pm = scene
            .to_bitmap(
                id,
                BitmapSize::Scale(2.0),
                BitmapSize::Scale(2.0),
                RatioMode::MinAspect,
            )
            .unwrap();
        assert_eq!(pm.width(), 16);
        assert_eq!(pm.height(), 16);
        assert!(pm.pixel(8, 8)[2] > 0.9);
    }

    #[test]
    fn to_bitmap_of_hidden_element_fails() {
        let mut scene = Scene::new();
        let root = scene.root();
        let id = filled_rect(
            &mut scene,
            root,
            Rect::new(0.0, 0.0, 8.0, 8.0),
            Color::rgb(0.0, 0.0, 255.0),
        );
        scene.set_flag(id, ElementFlags::HIDDEN, true);
        assert!(scene
            .to_bitmap(id, BitmapSize::Auto, BitmapSize::Auto, RatioMode::MinAspect)
            .is_err());
    }
}
