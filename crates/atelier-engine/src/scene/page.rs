use super::element::ElementId;
use crate::coords::Rect;

/// Page payload: position, size, bleed, print margins, and an optional
/// master-page reference.
///
/// The master reference is an id resolved through the owning scene's link
/// registry, never an owning pointer; a page whose master id equals its own
/// id resolves to no master.
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Extra paintable border outside the page bounds.
    pub bleed: f32,
    pub margin_left: f32,
    pub margin_top: f32,
    pub margin_right: f32,
    pub margin_bottom: f32,
    pub(crate) master: Option<ElementId>,
}

impl PageData {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            ..Self::default()
        }
    }

    #[inline]
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    /// Page bounds expanded by the bleed on every side: the clip box for
    /// page contents.
    #[inline]
    pub fn clip_box(&self) -> Rect {
        self.bounds().expanded_uniform(self.bleed.max(0.0))
    }

    #[inline]
    pub fn master(&self) -> Option<ElementId> {
        self.master
    }
}
