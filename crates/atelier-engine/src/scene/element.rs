use std::cell::Cell;

use super::page::PageData;
use super::shapes::{ImageShape, PolygonShape, RectangleShape};
use super::style::Style;
use crate::coords::{Rect, Transform};

/// Arena handle for a scene element: slot index plus generation. A handle
/// from a removed element never aliases a newer element in the same slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct ElementId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

/// Element flag bitset.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct ElementFlags(u32);

impl ElementFlags {
    pub const HIDDEN: ElementFlags = ElementFlags(1 << 0);
    pub const LOCKED: ElementFlags = ElementFlags(1 << 1);
    pub const NO_PAINT: ElementFlags = ElementFlags(1 << 2);
    pub const ACTIVE: ElementFlags = ElementFlags(1 << 3);
    pub const SELECTED: ElementFlags = ElementFlags(1 << 4);

    #[inline]
    pub fn has(self, flag: ElementFlags) -> bool {
        self.0 & flag.0 != 0
    }

    #[inline]
    pub fn set(&mut self, flag: ElementFlags) {
        self.0 |= flag.0;
    }

    #[inline]
    pub fn clear(&mut self, flag: ElementFlags) {
        self.0 &= !flag.0;
    }
}

/// Concrete element payload. Dispatch is by variant rather than by a class
/// hierarchy; shared node state lives on [`Element`].
#[derive(Debug)]
pub enum ElementKind {
    /// Plain container.
    Group,
    /// Unit square `[-1, 1]²`, positioned purely through the transform.
    Rectangle(RectangleShape),
    Polygon(PolygonShape),
    Image(ImageShape),
    Page(PageData),
}

impl ElementKind {
    #[inline]
    pub fn is_page(&self) -> bool {
        matches!(self, ElementKind::Page(_))
    }

    /// Whether this variant paints through a vertex source, which affects
    /// when a style needs an offscreen surface.
    #[inline]
    pub fn is_vertex_source(&self) -> bool {
        matches!(
            self,
            ElementKind::Rectangle(_) | ElementKind::Polygon(_) | ElementKind::Image(_)
        )
    }
}

/// Scene node: flags, tree links, optional transform, styles, and lazily
/// cached bounding boxes.
///
/// Invariant: the bbox caches are only mutated through the scene's
/// prepare/finish geometry protocol (or invalidated by it); queries fill
/// them lazily via interior mutability.
#[derive(Debug)]
pub struct Element {
    pub(crate) kind: ElementKind,
    pub(crate) flags: ElementFlags,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
    pub(crate) styles: Vec<Style>,
    pub(crate) transform: Option<Transform>,
    pub(crate) attached: bool,

    pub(crate) geometry_cache: Cell<Option<Rect>>,
    pub(crate) geometry_cached: Cell<bool>,
    pub(crate) paint_cache: Cell<Option<Rect>>,
    pub(crate) paint_cached: Cell<bool>,

    pub(crate) saved_paint_bbox: Option<Rect>,
    pub(crate) update_depth: u32,
}

impl Element {
    pub(crate) fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            flags: ElementFlags::default(),
            parent: None,
            children: Vec::new(),
            styles: Vec::new(),
            transform: None,
            attached: false,
            geometry_cache: Cell::new(None),
            geometry_cached: Cell::new(false),
            paint_cache: Cell::new(None),
            paint_cached: Cell::new(false),
            saved_paint_bbox: None,
            update_depth: 0,
        }
    }

    #[inline]
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    #[inline]
    pub fn flags(&self) -> ElementFlags {
        self.flags
    }

    #[inline]
    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    #[inline]
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    #[inline]
    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    #[inline]
    pub fn transform(&self) -> Option<Transform> {
        self.transform
    }

    #[inline]
    pub fn is_visible(&self) -> bool {
        !self.flags.has(ElementFlags::HIDDEN)
    }

    /// Drops both bbox caches, forcing lazy recomputation.
    pub(crate) fn invalidate_geometry(&self) {
        self.geometry_cache.set(None);
        self.geometry_cached.set(false);
        self.paint_cache.set(None);
        self.paint_cached.set(false);
    }
}
