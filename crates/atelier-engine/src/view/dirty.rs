//! Dirty-region accounting for incremental repaints.
//!
//! Responsibilities:
//! - `DirtyList` accumulates invalid world areas between frames, coalescing
//!   overlapping requests and clipping them to the presented area
//! - `DirtyMatcher` is the frozen per-frame snapshot the renderer queries
//!
//! Invariant: every rectangle handed out by `flush` is integer aligned and
//! lies inside the list's area at flush time.

use smallvec::SmallVec;

use crate::coords::{Rect, Transform};

/// Accumulates invalidated rectangles until the next repaint.
#[derive(Debug, Default)]
pub struct DirtyList {
    area: Option<Rect>,
    rects: SmallVec<[Rect; 8]>,
}

impl DirtyList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the clip area for incoming rectangles. Already recorded
    /// rectangles are re-clipped; ones that fall outside are dropped.
    pub fn set_area(&mut self, area: Option<Rect>) {
        self.area = area;
        if let Some(area) = area {
            self.rects.retain(|r| match r.intersect(area) {
                Some(clipped) if !clipped.is_empty() => {
                    *r = clipped;
                    true
                }
                _ => false,
            });
        }
    }

    #[inline]
    pub fn area(&self) -> Option<Rect> {
        self.area
    }

    /// Drops all recorded rectangles.
    pub fn reset(&mut self) {
        self.rects.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Records an invalid rectangle. Returns whether anything new became
    /// dirty. A rectangle already covered by a recorded one is absorbed;
    /// overlapping rectangles are unioned to keep the list short.
    pub fn dirty(&mut self, rect: Rect) -> bool {
        let mut rect = match self.area {
            Some(area) => match rect.intersect(area) {
                Some(clipped) => clipped,
                None => return false,
            },
            None => rect,
        };
        if rect.is_empty() {
            return false;
        }
        rect = rect.aligned();

        let mut i = 0;
        while i < self.rects.len() {
            let existing = self.rects[i];
            if existing.contains_rect(rect) {
                return false;
            }
            if rect.intersects(existing) || rect.contains_rect(existing) {
                // Merge and retry against the rest with the grown rectangle.
                rect = rect.united(existing);
                self.rects.swap_remove(i);
                i = 0;
                continue;
            }
            i += 1;
        }
        self.rects.push(rect);
        true
    }

    /// Takes the recorded rectangles as a per-frame matcher, leaving the
    /// list empty. Returns `None` when nothing was dirty.
    pub fn flush(&mut self) -> Option<DirtyMatcher> {
        if self.rects.is_empty() {
            return None;
        }
        Some(DirtyMatcher::new(
            std::mem::take(&mut self.rects).into_vec(),
        ))
    }
}

/// Frozen dirty-region snapshot queried during one render pass.
#[derive(Debug, Clone)]
pub struct DirtyMatcher {
    rects: Vec<Rect>,
}

impl DirtyMatcher {
    pub fn new(rects: Vec<Rect>) -> Self {
        Self { rects }
    }

    /// Whether an area intersects any dirty rectangle.
    pub fn is_dirty(&self, area: Rect) -> bool {
        self.rects.iter().any(|r| r.intersects(area))
    }

    /// Maps the dirty rectangles through a transform. Used when rendering
    /// shared contents at a translated position.
    pub fn transform(&mut self, transform: Transform) {
        for rect in &mut self.rects {
            *rect = transform.map_rect(*rect);
        }
    }

    #[inline]
    pub fn dirty_rectangles(&self) -> &[Rect] {
        &self.rects
    }
}
