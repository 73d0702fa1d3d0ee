//! Offscreen style compositing.
//!
//! A style whose output cannot be painted straight onto the target surface
//! (opacity, blending, masks, effects, filters) is rendered through a stack
//! of offscreen surfaces sharing the target's resolution, then composited
//! back in one blit.

use std::sync::Arc;

use super::{EntryCategory, Style, StyleEntry, StyleType};
use crate::coords::{Point, Rect, Transform};
use crate::paint::{
    BlendMode, Brush, Canvas, Color, CompositeMode, CompositeOperator, PathVertex, Pixmap,
    RepeatMode, flatten,
};
use crate::scene::render::RenderContext;
use crate::scene::shapes::RectangleShape;

/// Paint modes equal to plain source-over compositing.
#[inline]
fn is_default_paint_mode(mode: CompositeMode) -> bool {
    matches!(
        mode,
        CompositeMode::Operator(CompositeOperator::SourceOver)
            | CompositeMode::Blend(BlendMode::Normal)
    )
}

/// Renders one style of an element, routing through offscreen surfaces only
/// when the style demands it. `paint` draws the element contents for this
/// style onto whatever canvas the context currently holds.
///
/// `vertex_source` marks elements whose contents come from an outline; only
/// those force a separate surface for paint entries with a non-default
/// composite mode.
pub fn render_style(
    ctx: &mut RenderContext,
    style: &Style,
    vertex_source: bool,
    geometry_bbox: Rect,
    paint: &mut dyn FnMut(&mut RenderContext),
) {
    let knockout = style.style_type == StyleType::Knockout;
    let mut separate = style.opacity != 1.0
        || style.blend_mode != BlendMode::Normal
        || style.style_type == StyleType::Mask
        || style.style_type == StyleType::Background;

    let mut effects: Vec<&StyleEntry> = Vec::new();
    let mut filters: Vec<&StyleEntry> = Vec::new();
    for entry in style.visible_entries() {
        match entry.category() {
            EntryCategory::Effect => {
                effects.push(entry);
                separate = true;
            }
            EntryCategory::Filter => {
                filters.push(entry);
                separate = true;
            }
            EntryCategory::Paint => {
                if vertex_source
                    && entry.paint_mode().is_some_and(|m| !is_default_paint_mode(m))
                {
                    separate = true;
                }
            }
            EntryCategory::VectorEffect => {}
        }
    }

    if !separate {
        paint(ctx);
        return;
    }

    let paint_bbox = style.bbox(geometry_bbox);
    let mut style_canvas = ctx.canvas.create_canvas(paint_bbox, false);

    // Contents render onto their own surface; swap it into the context so
    // nested painting targets it.
    let contents_canvas = style_canvas.create_canvas(paint_bbox, false);
    let source_canvas = std::mem::replace(&mut ctx.canvas, contents_canvas);
    paint(ctx);
    let mut contents_canvas = std::mem::replace(&mut ctx.canvas, source_canvas);
    contents_canvas.finish();

    // Knockout styles never paint their own contents.
    let mut has_rendered_contents = knockout;

    if !effects.is_empty() {
        // Pre-effects go underneath the contents, post-effects on top.
        effects.sort_by_key(|e| e.is_post());

        let mut effect_canvas = style_canvas.create_canvas(paint_bbox, false);
        for (i, effect) in effects.iter().enumerate() {
            if i > 0 {
                effect_canvas.clear();
            }

            // Contents go down before the first post effect.
            if effect.is_post() && !has_rendered_contents {
                style_canvas.draw_canvas(&contents_canvas, 0, 0, 1.0, CompositeMode::default(), false);
                has_rendered_contents = true;
            }

            let scale = effect_canvas.scale();
            effect.render_effect(&mut effect_canvas, &contents_canvas, scale);
            style_canvas.draw_canvas(&effect_canvas, 0, 0, 1.0, CompositeMode::default(), false);
        }
        effect_canvas.finish();
    }

    if !has_rendered_contents {
        style_canvas.draw_canvas(&contents_canvas, 0, 0, 1.0, CompositeMode::default(), false);
    }

    for filter in &filters {
        let scale = style_canvas.scale();
        filter.apply_filter(&mut style_canvas, scale);
    }

    ctx.canvas.draw_canvas(
        &style_canvas,
        0,
        0,
        style.opacity,
        CompositeMode::Blend(style.blend_mode),
        false,
    );
    style_canvas.finish();
}

/// Puts the style-effected source as the current path and paints every
/// visible paint entry over it.
pub(crate) fn paint_entries(canvas: &mut Canvas, style: &Style, source: &[PathVertex]) {
    let effected = style.create_vertex_source(source.to_vec());
    let bbox = flatten(&effected, Transform::identity())
        .bounds
        .unwrap_or(Rect::new(0.0, 0.0, 0.0, 0.0));
    canvas.put_vertices(&effected);
    for entry in style.visible_entries() {
        if entry.category() == EntryCategory::Paint {
            entry.paint(canvas, bbox);
        }
    }
}

/// Renders a style preview: the style applied to a rectangle covering the
/// whole preview, over a chessboard backdrop, zoomed out so the style's
/// full bbox fits the preview exactly.
pub fn render_style_preview(style: &Style, width: u32, height: u32) -> Pixmap {
    let w = width as f32;
    let h = height as f32;
    let place = RectangleShape::place(0.0, 0.0, w, h);

    let mut canvas = Canvas::new(width, height);
    canvas.prepare(None);

    let chessboard = Canvas::chessboard(4, Color::WHITE, Color::rgb(185.0, 185.0, 185.0));
    canvas.fill_rect(
        0.0,
        0.0,
        w,
        h,
        &Brush::Texture {
            pixmap: Arc::new(chessboard),
            repeat: RepeatMode::Both,
        },
        1.0,
    );

    let bbox = style.bbox(Rect::new(0.0, 0.0, w, h));
    if bbox.width() > 0.0 && bbox.height() > 0.0 {
        // Zoom the canvas so the full style bbox maps onto the preview.
        let center = bbox.center();
        let scale_x = w / bbox.width();
        let scale_y = h / bbox.height();
        let matrix = Transform::translation(-center.x, -center.y)
            .scaled(scale_x, scale_y)
            .translated(w / 2.0, h / 2.0);
        canvas.set_origin(Point::new(-matrix.tx, -matrix.ty));
        canvas.set_scale(scale_x);
    }

    let source = RectangleShape.vertices(Some(place));
    let mut ctx = RenderContext::new(canvas);
    render_style(&mut ctx, style, true, Rect::new(0.0, 0.0, w, h), &mut |ctx| {
        paint_entries(&mut ctx.canvas, style, &source);
    });

    let mut canvas = ctx.into_canvas();
    canvas.finish();
    canvas.into_pixmap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::paint::Pattern;
    use crate::scene::style::{FillPaint, ShadowEffect, StrokePaint};

    fn fill(color: Color) -> StyleEntry {
        StyleEntry::Fill(FillPaint::new(Pattern::Color(color)))
    }

    fn rect_source(r: Rect) -> Vec<PathVertex> {
        use crate::paint::VertexSource;
        r.vertices()
    }

    fn paint_red_rect(ctx: &mut RenderContext, style: &Style) {
        let source = rect_source(Rect::new(4.0, 4.0, 8.0, 8.0));
        paint_entries(&mut ctx.canvas, style, &source);
    }

    // ── fast / slow path ──────────────────────────────────────────────────

    #[test]
    fn plain_style_paints_directly() {
        let style = Style::with_entries(vec![fill(Color::rgb(255.0, 0.0, 0.0))]);
        let mut canvas = Canvas::new(16, 16);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        render_style(&mut ctx, &style, true, Rect::new(4.0, 4.0, 8.0, 8.0), &mut |ctx| {
            let source = rect_source(Rect::new(4.0, 4.0, 8.0, 8.0));
            paint_entries(&mut ctx.canvas, &Style::with_entries(vec![fill(Color::rgb(255.0, 0.0, 0.0))]), &source);
        });
        let mut canvas = ctx.into_canvas();
        assert!(canvas.pixmap().pixel(8, 8)[0] > 0.9);
        canvas.finish();
    }

    #[test]
    fn opacity_routes_through_offscreen() {
        let mut style = Style::with_entries(vec![fill(Color::rgb(255.0, 0.0, 0.0))]);
        style.opacity = 0.5;

        let mut canvas = Canvas::new(16, 16);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        let painted = style.clone();
        render_style(&mut ctx, &style, true, Rect::new(4.0, 4.0, 8.0, 8.0), &mut |ctx| {
            paint_red_rect(ctx, &painted);
        });
        let mut canvas = ctx.into_canvas();
        let p = canvas.pixmap().pixel(8, 8);
        assert!((p[3] - 0.5).abs() < 0.05);
        canvas.finish();
    }

    #[test]
    fn slow_path_matches_fast_path_for_opaque_content() {
        // The same fill through the offscreen route must land on the same
        // pixels as the direct route.
        let style = Style::with_entries(vec![fill(Color::rgb(0.0, 255.0, 0.0))]);
        let mut forced = style.clone();
        forced.opacity = 0.999_999; // forces the separate surface

        let run = |s: &Style| {
            let mut canvas = Canvas::new(16, 16);
            canvas.prepare(None);
            let mut ctx = RenderContext::new(canvas);
            let painted = s.clone();
            render_style(&mut ctx, s, true, Rect::new(4.0, 4.0, 8.0, 8.0), &mut |ctx| {
                paint_red_rect(ctx, &painted);
            });
            let mut canvas = ctx.into_canvas();
            let inside = canvas.pixmap().pixel(8, 8);
            let outside = canvas.pixmap().pixel(1, 1);
            canvas.finish();
            (inside[1] > 0.9, outside[3] == 0.0)
        };

        assert_eq!(run(&style), run(&forced));
    }

    // ── effects ───────────────────────────────────────────────────────────

    #[test]
    fn drop_shadow_paints_outside_contents() {
        let shadow = ShadowEffect::new(2.0, 4.0, 4.0, Color::rgba(0.0, 0.0, 0.0, 100.0));
        let style = Style::with_entries(vec![
            fill(Color::rgb(255.0, 0.0, 0.0)),
            StyleEntry::Shadow(shadow),
        ]);

        let mut canvas = Canvas::new(32, 32);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        let painted = style.clone();
        render_style(&mut ctx, &style, true, Rect::new(8.0, 8.0, 8.0, 8.0), &mut |ctx| {
            let source = rect_source(Rect::new(8.0, 8.0, 8.0, 8.0));
            paint_entries(&mut ctx.canvas, &painted, &source);
        });
        let mut canvas = ctx.into_canvas();
        // Contents still opaque red.
        assert!(canvas.pixmap().pixel(12, 12)[0] > 0.8);
        // Shadow visible below-right of the contents.
        assert!(canvas.pixmap().pixel(18, 18)[3] > 0.1);
        canvas.finish();
    }

    #[test]
    fn knockout_skips_contents() {
        let shadow = ShadowEffect::new(1.0, 6.0, 6.0, Color::rgba(0.0, 0.0, 0.0, 100.0));
        let mut style = Style::with_entries(vec![
            fill(Color::rgb(255.0, 0.0, 0.0)),
            StyleEntry::Shadow(shadow),
        ]);
        style.style_type = StyleType::Knockout;

        let mut canvas = Canvas::new(32, 32);
        canvas.prepare(None);
        let mut ctx = RenderContext::new(canvas);
        let painted = style.clone();
        render_style(&mut ctx, &style, true, Rect::new(8.0, 8.0, 8.0, 8.0), &mut |ctx| {
            let source = rect_source(Rect::new(8.0, 8.0, 8.0, 8.0));
            paint_entries(&mut ctx.canvas, &painted, &source);
        });
        let mut canvas = ctx.into_canvas();
        // No red contents, only the offset shadow.
        assert!(canvas.pixmap().pixel(10, 10)[0] < 0.1);
        assert!(canvas.pixmap().pixel(18, 18)[3] > 0.1);
        canvas.finish();
    }

    // ── preview ───────────────────────────────────────────────────────────

    #[test]
    fn preview_covers_requested_size() {
        let style = Style::with_entries(vec![
            fill(Color::rgb(0.0, 0.0, 255.0)),
            StyleEntry::Stroke(StrokePaint::new(Pattern::Color(Color::BLACK), 2.0)),
        ]);
        let pm = render_style_preview(&style, 24, 24);
        assert_eq!(pm.width(), 24);
        assert_eq!(pm.height(), 24);
        // Center shows the blue fill.
        assert!(pm.pixel(12, 12)[2] > 0.5);
    }
}
