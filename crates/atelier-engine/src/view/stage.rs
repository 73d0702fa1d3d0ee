//! A stage owns one raster surface of a view and repaints it lazily.
//!
//! Invalidations only record dirty areas and request a frame from the
//! scheduler; the actual painting happens when the host drives `repaint`,
//! which hands a render context restricted to the dirty areas to a caller
//! supplied paint function.
//!
//! Invariant: at most one frame request is outstanding at a time; the
//! pending flag clears on repaint, even when nothing was dirty.

use log::trace;

use super::dirty::DirtyList;
use super::scheduler::FrameScheduler;
use crate::coords::Rect;
use crate::paint::Canvas;
use crate::scene::render::RenderContext;

pub struct Stage {
    canvas: Canvas,
    dirty: DirtyList,
    scheduler: Box<dyn FrameScheduler>,
    frame_pending: bool,
}

impl Stage {
    pub fn new(width: u32, height: u32, scheduler: Box<dyn FrameScheduler>) -> Self {
        let mut dirty = DirtyList::new();
        dirty.set_area(Some(Rect::new(0.0, 0.0, width as f32, height as f32)));
        Self {
            canvas: Canvas::new(width.max(1), height.max(1)),
            dirty,
            scheduler,
            frame_pending: false,
        }
    }

    #[inline]
    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.canvas.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.canvas.height()
    }

    /// Marks an area (or with `None` the whole stage) as needing repaint and
    /// requests a frame if one is not already pending. Returns whether any
    /// new area became dirty.
    pub fn invalidate(&mut self, area: Option<Rect>) -> bool {
        let dirtied = match area {
            Some(area) => self.dirty.dirty(area),
            None => {
                self.dirty.reset();
                match self.dirty.area() {
                    Some(all) => self.dirty.dirty(all),
                    None => false,
                }
            }
        };
        if dirtied && !self.frame_pending {
            self.frame_pending = true;
            self.scheduler.schedule_frame();
        }
        dirtied
    }

    /// Resizes the backing surface and invalidates everything.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == self.canvas.width() && height == self.canvas.height() {
            return;
        }
        self.canvas.resize(width.max(1), height.max(1));
        self.dirty
            .set_area(Some(Rect::new(0.0, 0.0, width as f32, height as f32)));
        self.invalidate(None);
    }

    /// Repaints the dirty areas. The paint function receives a context whose
    /// canvas is prepared and clipped to the dirty rectangles and whose
    /// matcher prunes clean subtrees. Returns whether anything was painted.
    pub fn repaint(&mut self, paint: impl FnOnce(&mut RenderContext)) -> bool {
        self.frame_pending = false;
        let Some(matcher) = self.dirty.flush() else {
            return false;
        };
        trace!(
            "stage repaint, {} dirty rect(s)",
            matcher.dirty_rectangles().len()
        );

        let mut canvas = std::mem::replace(&mut self.canvas, Canvas::new(1, 1));
        canvas.prepare(Some(matcher.dirty_rectangles()));
        let mut ctx = RenderContext::new(canvas);
        ctx.dirty = Some(matcher);
        paint(&mut ctx);
        let mut canvas = ctx.into_canvas();
        canvas.finish();
        self.canvas = canvas;
        true
    }
}
