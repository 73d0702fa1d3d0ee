//! Styles: ordered lists of paint, filter, and effect entries applied to an
//! element's vertex source.
//!
//! Responsibilities:
//! - Entry classification and padding (`entry`)
//! - Style-level bbox expansion, vector-effect folding, and hit testing
//! - Offscreen style compositing and previews (`render`)
//!
//! Invariant: `bbox` is a pure function of the source rectangle and the
//! visible entries; the renderer and the invalidation machinery rely on both
//! computing the same expansion.

pub mod entry;
pub mod render;

pub use entry::{
    BlurFilter, EntryCategory, FillPaint, OffsetEffect, ShadowEffect, StrokePaint, StyleEntry,
};

use crate::coords::{Point, Rect, Transform};
use crate::paint::{flatten, BlendMode, PathVertex};

/// How a style's output composites with the element's other styles.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum StyleType {
    /// Regular content rendering.
    #[default]
    Content,
    /// Contents are not painted, only the style's effects.
    Knockout,
    /// Style output masks the element.
    Mask,
    /// Style output goes underneath the element contents.
    Background,
}

/// An applied style: type, opacity, blend mode, and ordered entries.
#[derive(Debug, Clone)]
pub struct Style {
    pub visible: bool,
    pub style_type: StyleType,
    pub opacity: f32,
    pub blend_mode: BlendMode,
    pub entries: Vec<StyleEntry>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            visible: true,
            style_type: StyleType::Content,
            opacity: 1.0,
            blend_mode: BlendMode::Normal,
            entries: Vec::new(),
        }
    }
}

impl Style {
    pub fn with_entries(entries: Vec<StyleEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    /// Visible entries in document order.
    #[inline]
    pub fn visible_entries(&self) -> impl Iterator<Item = &StyleEntry> {
        self.entries.iter().filter(|e| e.visible())
    }

    /// Expands a source bbox by everything this style may paint outside it.
    ///
    /// Vector-effect paddings are additive, filter paddings sum absolutely,
    /// effect and paint paddings keep the component-wise largest. The result
    /// gains an extra half pixel on every side whose edge is not already
    /// pixel aligned.
    pub fn bbox(&self, source: Rect) -> Rect {
        let mut v_effect = [0.0f32; 4];
        let mut filter = [0.0f32; 4];
        let mut effect = [0.0f32; 4];
        let mut paint = [0.0f32; 4];

        for entry in self.visible_entries() {
            let Some(padding) = entry.padding() else {
                continue;
            };
            match entry.category() {
                EntryCategory::VectorEffect => {
                    for i in 0..4 {
                        v_effect[i] += padding[i];
                    }
                }
                EntryCategory::Filter => {
                    for i in 0..4 {
                        filter[i] += padding[i].abs();
                    }
                }
                EntryCategory::Effect => {
                    for i in 0..4 {
                        effect[i] = effect[i].max(padding[i]);
                    }
                }
                EntryCategory::Paint => {
                    for i in 0..4 {
                        paint[i] = paint[i].max(padding[i]);
                    }
                }
            }
        }

        let bbox = source.expanded(
            v_effect[0] + paint[0] + filter[0] + effect[0],
            v_effect[1] + paint[1] + filter[1] + effect[1],
            v_effect[2] + paint[2] + filter[2] + effect[2],
            v_effect[3] + paint[3] + filter[3] + effect[3],
        );

        // Pixel aligning may need an extra half pixel per side.
        let mut extra = [0.0f32; 4];
        if bbox.x() != bbox.x().floor() {
            extra[0] = 0.5;
        }
        if bbox.y() != bbox.y().floor() {
            extra[1] = 0.5;
        }
        let br = bbox.max();
        if br.x != br.x.ceil() {
            extra[2] = 0.5;
        }
        if br.y != br.y.ceil() {
            extra[3] = 0.5;
        }
        bbox.expanded(extra[0], extra[1], extra[2], extra[3])
    }

    /// Folds the visible vector effects over a vertex source.
    pub fn create_vertex_source(&self, mut source: Vec<PathVertex>) -> Vec<PathVertex> {
        for entry in self.visible_entries() {
            if entry.category() == EntryCategory::VectorEffect {
                source = entry.create_effect(source);
            }
        }
        source
    }

    /// Hit-tests the paint entries against a location. Vector effects are
    /// applied to the source first; paint entries are tested topmost first.
    /// Returns the index of the hit entry.
    pub fn hit_test(
        &self,
        source: &[PathVertex],
        location: Point,
        transform: Option<Transform>,
        tolerance: f32,
    ) -> Option<usize> {
        let effected = self.create_vertex_source(source.to_vec());
        let flat = flatten(&effected, transform.unwrap_or_else(Transform::identity));

        for (index, entry) in self.entries.iter().enumerate().rev() {
            if !entry.visible() || entry.category() != EntryCategory::Paint {
                continue;
            }
            if entry.hit_test(&flat, location, tolerance) {
                return Some(index);
            }
        }
        None
    }
}
