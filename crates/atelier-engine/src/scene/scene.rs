//! Scene document: a generational element arena plus the geometry change
//! protocol that keeps bounding boxes and repaint areas consistent.
//!
//! Responsibilities:
//! - Element storage and tree structure (ids, never pointers)
//! - The prepare/finish geometry update protocol and its event emission
//! - Lazy geometry/paint bbox computation with style folding
//! - Invalidation propagation, including master-page fan-out
//! - Hit testing and area collision queries
//!
//! Invariant: every mutation that can change an element's painted extents
//! goes through `begin_update`/`end_update`, so the previously painted area
//! is captured before the change and invalidated after it.

use std::collections::VecDeque;

use log::warn;

use super::element::{Element, ElementFlags, ElementId, ElementKind};
use super::events::SceneEvent;
use super::shapes::{ImageStatus, decode_image};
use super::style::Style;
use crate::coords::{Point, Rect, Transform};
use crate::paint::{PathVertex, flatten};

/// Collide against geometry bboxes instead of paint bboxes.
pub const COLLISION_GEOMETRY_BBOX: u32 = 1 << 0;
/// Collide against paint bboxes.
pub const COLLISION_PAINT_BBOX: u32 = 1 << 1;
/// Accept partial overlap; otherwise the area must contain the bbox.
pub const COLLISION_PARTIAL: u32 = 1 << 2;

/// Scene-wide rendering/invalidation options.
#[derive(Debug, Copy, Clone)]
pub struct SceneConfig {
    /// Clip page contents to the page plus bleed even without a master.
    pub clip_pages: bool,
    /// Only one page is presented at a time; suppresses mirroring of
    /// invalidations from master pages into their linked pages.
    pub single_page: bool,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clip_pages: false,
            single_page: true,
        }
    }
}

/// A successful hit: the element, and for styled outline hits the style and
/// entry that were hit.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HitResult {
    pub element: ElementId,
    pub style_index: Option<usize>,
    pub entry_index: Option<usize>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    element: Option<Element>,
}

/// The scene document.
#[derive(Debug)]
pub struct Scene {
    slots: Vec<Slot>,
    free: Vec<u32>,
    root: ElementId,
    events: VecDeque<SceneEvent>,
    config: SceneConfig,
    restoring: bool,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let mut scene = Self {
            slots: Vec::new(),
            free: Vec::new(),
            root: ElementId { index: 0, generation: 0 },
            events: VecDeque::new(),
            config: SceneConfig::default(),
            restoring: false,
        };
        let mut root = Element::new(ElementKind::Group);
        root.attached = true;
        scene.root = scene.alloc(root);
        scene
    }

    #[inline]
    pub fn root(&self) -> ElementId {
        self.root
    }

    #[inline]
    pub fn config(&self) -> SceneConfig {
        self.config
    }

    pub fn set_config(&mut self, config: SceneConfig) {
        self.config = config;
    }

    /// Drains the queued change events in emission order.
    pub fn take_events(&mut self) -> Vec<SceneEvent> {
        self.events.drain(..).collect()
    }

    // ── arena ─────────────────────────────────────────────────────────────

    fn alloc(&mut self, element: Element) -> ElementId {
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.element = Some(element);
            ElementId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, element: Some(element) });
            ElementId { index, generation: 0 }
        }
    }

    fn dealloc(&mut self, id: ElementId) {
        if let Some(slot) = self.slots.get_mut(id.index as usize) {
            if slot.generation == id.generation && slot.element.is_some() {
                slot.element = None;
                slot.generation += 1;
                self.free.push(id.index);
            }
        }
    }

    /// Resolves an element id; stale ids from removed elements yield `None`.
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.element.as_ref())
    }

    pub(crate) fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.element.as_mut())
    }

    // ── tree structure ────────────────────────────────────────────────────

    /// Appends a new element under `parent` and returns its id.
    pub fn insert(&mut self, parent: ElementId, kind: ElementKind) -> ElementId {
        let attached = self.element(parent).is_some_and(|e| e.attached);

        let mut element = Element::new(kind);
        element.parent = Some(parent);
        element.attached = attached;

        // Attaching an image with a pending source kicks off resolution.
        if attached {
            if let ElementKind::Image(shape) = &mut element.kind {
                if shape.source.is_some() && shape.status == ImageStatus::Delayed {
                    shape.status = ImageStatus::Resolving;
                }
            }
        }

        let id = self.alloc(element);
        if let Some(parent_el) = self.element_mut(parent) {
            parent_el.children.push(id);
        }

        let resolving = matches!(
            self.element(id).map(|e| &e.kind),
            Some(ElementKind::Image(shape)) if shape.status == ImageStatus::Resolving
        );
        if resolving {
            self.events.push_back(SceneEvent::ImageStatus(id, ImageStatus::Resolving));
        }

        self.child_geometry_update(parent);
        self.request_invalidation(id);
        id
    }

    /// Removes an element and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: ElementId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.element(id).and_then(|e| e.parent) else {
            return;
        };

        // Repaint the area the subtree covered before it disappears.
        self.request_invalidation(id);

        if let Some(parent_el) = self.element_mut(parent) {
            parent_el.children.retain(|c| *c != id);
        }
        self.dealloc_subtree(id);
        self.child_geometry_update(parent);
    }

    fn dealloc_subtree(&mut self, id: ElementId) {
        let children = self
            .element(id)
            .map(|e| e.children.clone())
            .unwrap_or_default();
        for child in children {
            self.dealloc_subtree(child);
        }
        self.dealloc(id);
    }

    // ── geometry update protocol ──────────────────────────────────────────

    /// Opens a geometry transaction. Transactions nest; only the outermost
    /// one snapshots the painted area and emits events.
    pub fn begin_update(&mut self, id: ElementId) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        element.update_depth += 1;
        if element.update_depth == 1 {
            self.prepare_geometry_update(id);
        }
    }

    /// Closes a geometry transaction. With `invalidate` unset the cached
    /// bboxes survive, for mutations known not to move any geometry.
    pub fn end_update(&mut self, id: ElementId, invalidate: bool) {
        let Some(element) = self.element_mut(id) else {
            return;
        };
        debug_assert!(element.update_depth > 0, "end_update without begin_update");
        if element.update_depth == 0 {
            return;
        }
        element.update_depth -= 1;
        if element.update_depth == 0 {
            self.finish_geometry_update(id, invalidate);
        }
    }

    fn prepare_geometry_update(&mut self, id: ElementId) {
        if self.is_renderable(id) {
            if let Some(bbox) = self.paint_bbox(id) {
                if !bbox.is_empty() {
                    if let Some(element) = self.element_mut(id) {
                        element.saved_paint_bbox = Some(bbox);
                    }
                }
            }
        }
        if self.element(id).is_some_and(|e| e.is_visible()) {
            self.events.push_back(SceneEvent::GeometryBefore(id));
        }
    }

    fn finish_geometry_update(&mut self, id: ElementId, invalidate: bool) {
        let Some(element) = self.element(id) else {
            return;
        };
        if !element.is_visible() {
            if let Some(element) = self.element_mut(id) {
                element.saved_paint_bbox = None;
            }
            return;
        }

        if invalidate {
            element.invalidate_geometry();
        }

        if self.is_renderable(id) {
            let new_bbox = self.paint_bbox(id);
            let saved = self.element(id).and_then(|e| e.saved_paint_bbox);

            if !Rect::almost_eq_opt(new_bbox, saved) {
                if let Some(parent) = self.element(id).and_then(|e| e.parent) {
                    self.child_geometry_update(parent);
                }
                // Repaint the old area, then the new one.
                if let Some(old) = saved {
                    self.request_invalidation_area(id, old);
                }
                self.request_invalidation(id);
            } else {
                self.request_invalidation(id);
            }
        }

        self.events.push_back(SceneEvent::GeometryAfter(id));
        if let Some(element) = self.element_mut(id) {
            element.saved_paint_bbox = None;
        }
    }

    /// A descendant changed: drop cached bboxes and bubble to the parent.
    pub(crate) fn child_geometry_update(&mut self, id: ElementId) {
        let Some(element) = self.element(id) else {
            return;
        };
        if !element.is_visible() {
            return;
        }
        element.invalidate_geometry();
        self.events.push_back(SceneEvent::GeometryChild(id));
        if let Some(parent) = self.element(id).and_then(|e| e.parent) {
            self.child_geometry_update(parent);
        }
    }

    /// Requests a repaint of an element's painted area, expanded by a small
    /// margin for anti-aliased pixels.
    pub(crate) fn request_invalidation(&mut self, id: ElementId) {
        if !self.is_renderable(id) {
            return;
        }
        if let Some(area) = self.paint_bbox(id) {
            self.request_invalidation_area(id, area.expanded_uniform(2.0));
        }
    }

    /// Requests a repaint of a world-space area, mirroring it into pages
    /// linked to any master page on the ancestor chain.
    pub(crate) fn request_invalidation_area(&mut self, id: ElementId, area: Rect) {
        if !self.element(id).is_some_and(|e| e.attached) {
            return;
        }
        self.events.push_back(SceneEvent::InvalidateArea(area));

        let mut cursor = Some(id);
        while let Some(current) = cursor {
            self.mirror_into_linked_pages(current, area);
            cursor = self.element(current).and_then(|e| e.parent);
        }
    }

    fn mirror_into_linked_pages(&mut self, id: ElementId, area: Rect) {
        if self.config.single_page {
            return;
        }
        let Some(ElementKind::Page(page)) = self.element(id).map(|e| &e.kind) else {
            return;
        };
        let (x, y, clip) = (page.x, page.y, page.clip_box());
        if !area.intersects(clip) {
            return;
        }
        for linked in self.linked_pages(id) {
            if !self.is_renderable(linked) {
                continue;
            }
            let Some(ElementKind::Page(link)) = self.element(linked).map(|e| &e.kind) else {
                continue;
            };
            let (dx, dy) = (link.x - x, link.y - y);
            self.request_invalidation_area(linked, area.translated(dx, dy));
        }
    }

    /// Visible, and either attached below a parent or the root itself.
    pub fn is_renderable(&self, id: ElementId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        element.is_visible() && ((element.attached && element.parent.is_some()) || id == self.root)
    }

    // ── master pages ──────────────────────────────────────────────────────

    /// Pages referencing `master` as their master page, excluding itself.
    pub fn linked_pages(&self, master: ElementId) -> Vec<ElementId> {
        let mut result = Vec::new();
        self.visit(self.root, &mut |id, element| {
            if let ElementKind::Page(page) = &element.kind {
                if page.master == Some(master) && id != master {
                    result.push(id);
                }
            }
        });
        result
    }

    /// Whether any other page links to this one as its master.
    pub fn is_master_page(&self, id: ElementId) -> bool {
        !self.linked_pages(id).is_empty()
    }

    /// Resolves a page's master page; a self-reference resolves to none.
    pub fn master_page(&self, id: ElementId) -> Option<ElementId> {
        let ElementKind::Page(page) = &self.element(id)?.kind else {
            return None;
        };
        page.master
            .filter(|m| *m != id)
            .filter(|m| matches!(self.element(*m).map(|e| &e.kind), Some(ElementKind::Page(_))))
    }

    fn visit(&self, id: ElementId, f: &mut impl FnMut(ElementId, &Element)) {
        if let Some(element) = self.element(id) {
            f(id, element);
            for child in &element.children {
                self.visit(*child, f);
            }
        }
    }

    // ── mutators ──────────────────────────────────────────────────────────

    /// Replaces an element's transform.
    pub fn set_transform(&mut self, id: ElementId, transform: Option<Transform>) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            element.transform = transform;
        }
        self.end_update(id, true);
    }

    /// Right-multiplies a transform onto an element's existing one.
    pub fn apply_transform(&mut self, id: ElementId, transform: Transform) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            element.transform = Some(match element.transform {
                Some(t) => t.multiplied(transform),
                None => transform,
            });
        }
        self.end_update(id, true);
    }

    /// Replaces an element's style list.
    pub fn set_styles(&mut self, id: ElementId, styles: Vec<Style>) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            element.styles = styles;
        }
        self.end_update(id, true);
        self.events.push_back(SceneEvent::StyleChange(id));
    }

    /// Replaces a single style in place.
    pub fn set_style(&mut self, id: ElementId, index: usize, style: Style) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            if let Some(slot) = element.styles.get_mut(index) {
                *slot = style;
            }
        }
        self.end_update(id, true);
        self.events.push_back(SceneEvent::StyleChange(id));
    }

    /// Sets or clears a flag. Visibility and no-paint changes repaint the
    /// element's area on both sides of the change.
    pub fn set_flag(&mut self, id: ElementId, flag: ElementFlags, on: bool) {
        let Some(element) = self.element(id) else {
            return;
        };
        if element.flags.has(flag) == on {
            return;
        }

        let repaint = flag == ElementFlags::HIDDEN || flag == ElementFlags::NO_PAINT;
        if repaint {
            self.request_invalidation(id);
        }

        if let Some(element) = self.element_mut(id) {
            if on {
                element.flags.set(flag);
            } else {
                element.flags.clear(flag);
            }
        }

        if flag == ElementFlags::HIDDEN {
            if let Some(parent) = self.element(id).and_then(|e| e.parent) {
                self.child_geometry_update(parent);
            }
        }
        if repaint {
            self.request_invalidation(id);
        }
    }

    /// Moves a page. Its direct children travel with it, except while
    /// restoring persisted state.
    pub fn set_page_position(&mut self, id: ElementId, x: f32, y: f32) {
        let Some(ElementKind::Page(page)) = self.element(id).map(|e| &e.kind) else {
            return;
        };
        let (dx, dy) = (x - page.x, y - page.y);

        self.begin_update(id);
        if !self.restoring && (dx != 0.0 || dy != 0.0) {
            let children = self
                .element(id)
                .map(|e| e.children.clone())
                .unwrap_or_default();
            for child in children {
                self.apply_transform(child, Transform::translation(dx, dy));
            }
        }
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Page(page) = &mut element.kind {
                page.x = x;
                page.y = y;
            }
        }
        self.end_update(id, true);
    }

    /// Moves a page without translating its children, used when restoring
    /// persisted documents.
    pub fn restore_page_position(&mut self, id: ElementId, x: f32, y: f32) {
        self.restoring = true;
        self.set_page_position(id, x, y);
        self.restoring = false;
    }

    /// Rewrites page payload fields other than the position.
    pub fn update_page(&mut self, id: ElementId, f: impl FnOnce(&mut super::page::PageData)) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Page(page) = &mut element.kind {
                f(page);
            }
        }
        self.end_update(id, true);
    }

    /// Points a page at a new master page. A reference to itself is kept
    /// but resolves to no master.
    pub fn set_page_master(&mut self, id: ElementId, master: Option<ElementId>) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Page(page) = &mut element.kind {
                page.master = master;
            }
        }
        self.end_update(id, true);
    }

    /// Rewrites a polygon's shape parameters.
    pub fn update_polygon(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut super::shapes::PolygonShape),
    ) {
        self.begin_update(id);
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Polygon(shape) = &mut element.kind {
                f(shape);
            }
        }
        self.end_update(id, true);
    }

    // ── image loading ─────────────────────────────────────────────────────

    /// Points an image at a new source. Resolution starts immediately when
    /// attached and is delayed otherwise.
    pub fn set_image_source(&mut self, id: ElementId, source: Option<String>) {
        let attached = self.element(id).is_some_and(|e| e.attached);
        self.begin_update(id);
        let mut status = None;
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Image(shape) = &mut element.kind {
                shape.source = source;
                shape.bitmap = None;
                shape.status = if attached {
                    ImageStatus::Resolving
                } else {
                    ImageStatus::Delayed
                };
                status = Some(shape.status);
            }
        }
        self.end_update(id, true);
        if let Some(status) = status {
            self.events.push_back(SceneEvent::ImageStatus(id, status));
        }
    }

    /// Marks an image as loading. The caller fetches the data and reports
    /// back through [`complete_image_load`](Scene::complete_image_load).
    /// Opens the geometry transaction that the completion closes.
    pub fn begin_image_load(&mut self, id: ElementId) {
        let mut started = false;
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Image(shape) = &mut element.kind {
                shape.status = ImageStatus::Loading;
                started = true;
            }
        }
        if started {
            self.events.push_back(SceneEvent::ImageStatus(id, ImageStatus::Loading));
            self.request_invalidation(id);
            self.begin_update(id);
        }
    }

    /// Finishes an image load with the fetched bytes. A fetch or decode
    /// failure is absorbed into the error status; the image keeps rendering
    /// its placeholder.
    pub fn complete_image_load(&mut self, id: ElementId, data: anyhow::Result<Vec<u8>>) {
        let decoded = data.and_then(|bytes| decode_image(&bytes));
        let status = match decoded {
            Ok(pixmap) => {
                if let Some(element) = self.element_mut(id) {
                    if let ElementKind::Image(shape) = &mut element.kind {
                        shape.bitmap = Some(std::sync::Arc::new(pixmap));
                    }
                }
                ImageStatus::Loaded
            }
            Err(err) => {
                warn!("image load failed: {err:#}");
                ImageStatus::Error
            }
        };
        self.end_update(id, true);
        if let Some(element) = self.element_mut(id) {
            if let ElementKind::Image(shape) = &mut element.kind {
                shape.status = status;
            }
        }
        self.events.push_back(SceneEvent::ImageStatus(id, status));
    }

    // ── bounding boxes ────────────────────────────────────────────────────

    /// Geometry bbox: the element's own outline extents, cached lazily.
    /// Hidden elements have none.
    pub fn geometry_bbox(&self, id: ElementId) -> Option<Rect> {
        let element = self.element(id)?;
        if !element.is_visible() {
            return None;
        }
        if element.geometry_cached.get() {
            return element.geometry_cache.get();
        }
        let bbox = self.calculate_geometry_bbox(element);
        element.geometry_cache.set(bbox);
        element.geometry_cached.set(true);
        bbox
    }

    /// Paint bbox: geometry plus everything styles may paint around it,
    /// cached lazily. Hidden elements have none.
    pub fn paint_bbox(&self, id: ElementId) -> Option<Rect> {
        let element = self.element(id)?;
        if !element.is_visible() {
            return None;
        }
        if element.paint_cached.get() {
            return element.paint_cache.get();
        }
        let bbox = self.calculate_paint_bbox(element);
        element.paint_cache.set(bbox);
        element.paint_cached.set(true);
        bbox
    }

    /// United geometry bbox of a group of elements.
    pub fn group_geometry_bbox(&self, ids: &[ElementId]) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for id in ids {
            if let Some(bbox) = self.geometry_bbox(*id) {
                if !bbox.is_empty() {
                    result = Some(match result {
                        Some(r) => r.united(bbox),
                        None => bbox,
                    });
                }
            }
        }
        result
    }

    fn children_geometry_bbox(&self, element: &Element) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for child in &element.children {
            if let Some(bbox) = self.geometry_bbox(*child) {
                if !bbox.is_empty() {
                    result = Some(match result {
                        Some(r) => r.united(bbox),
                        None => bbox,
                    });
                }
            }
        }
        result
    }

    fn children_paint_bbox(&self, element: &Element) -> Option<Rect> {
        let mut result: Option<Rect> = None;
        for child in &element.children {
            if let Some(bbox) = self.paint_bbox(*child) {
                if !bbox.is_empty() {
                    result = Some(match result {
                        Some(r) => r.united(bbox),
                        None => bbox,
                    });
                }
            }
        }
        result
    }

    fn calculate_geometry_bbox(&self, element: &Element) -> Option<Rect> {
        match &element.kind {
            ElementKind::Group => self.children_geometry_bbox(element),
            ElementKind::Page(page) => Some(page.bounds()),
            _ => {
                let vertices = self.element_vertices(element)?;
                flatten(&vertices, Transform::identity()).bounds
            }
        }
    }

    fn calculate_paint_bbox(&self, element: &Element) -> Option<Rect> {
        match &element.kind {
            ElementKind::Group => {
                let children = self.children_paint_bbox(element)?;
                Some(style_set_bbox(&element.styles, children))
            }
            ElementKind::Page(page) => {
                let own = page.clip_box();
                let children = self
                    .children_paint_bbox(element)
                    .map(|c| style_set_bbox(&element.styles, c));
                Some(match children {
                    Some(c) => own.united(c),
                    None => own,
                })
            }
            _ => {
                let geometry = flatten(&self.element_vertices(element)?, Transform::identity())
                    .bounds?;
                let own = style_set_bbox(&element.styles, geometry);
                Some(match self.children_paint_bbox(element) {
                    Some(c) => own.united(c),
                    None => own,
                })
            }
        }
    }

    /// Outline of a vertex-source element in world space, transform applied.
    pub(crate) fn element_vertices(&self, element: &Element) -> Option<Vec<PathVertex>> {
        match &element.kind {
            ElementKind::Rectangle(shape) => Some(shape.vertices(element.transform)),
            ElementKind::Polygon(shape) => Some(shape.vertices(element.transform)),
            ElementKind::Image(shape) => Some(shape.vertices(element.transform)),
            _ => None,
        }
    }

    // ── hit testing ───────────────────────────────────────────────────────

    /// Hit-tests an element and its subtree, topmost first.
    ///
    /// `transform` maps world space to the space `location` lives in.
    /// `level` limits recursion: `-1` is unlimited, `0` skips children.
    /// With `stacked` every hit accumulates instead of only the topmost.
    /// The `acceptor` gates which elements may produce their own hit;
    /// children are searched regardless.
    #[allow(clippy::too_many_arguments)]
    pub fn hit_test(
        &self,
        id: ElementId,
        location: Point,
        transform: Option<Transform>,
        acceptor: Option<&dyn Fn(&Element) -> bool>,
        stacked: bool,
        level: i32,
        tolerance: f32,
        hits: &mut Vec<HitResult>,
    ) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        if !element.is_visible() {
            return false;
        }

        // Quick reject against the tolerance-expanded painted area.
        if let Some(bbox) = self.paint_bbox(id) {
            let mapped = match transform {
                Some(t) => t.map_rect(bbox),
                None => bbox,
            };
            if !mapped
                .expanded(tolerance, tolerance, tolerance, tolerance)
                .contains(location)
            {
                return false;
            }
        } else {
            return false;
        }

        let mut found = false;

        if level != 0 {
            let next_level = if level < 0 { -1 } else { level - 1 };
            for child in element.children.iter().rev() {
                if self.hit_test(
                    *child, location, transform, acceptor, stacked, next_level, tolerance, hits,
                ) {
                    found = true;
                    if !stacked {
                        return true;
                    }
                }
            }
        }

        if acceptor.map_or(true, |accept| accept(element)) {
            if let Some(hit) = self.detail_hit_test(id, element, location, transform, tolerance) {
                hits.push(hit);
                found = true;
            }
        }

        found
    }

    fn detail_hit_test(
        &self,
        id: ElementId,
        element: &Element,
        location: Point,
        transform: Option<Transform>,
        tolerance: f32,
    ) -> Option<HitResult> {
        match &element.kind {
            ElementKind::Page(page) => {
                let mapped = match transform {
                    Some(t) => t.map_rect(page.bounds()),
                    None => page.bounds(),
                };
                mapped
                    .expanded(tolerance, tolerance, tolerance, tolerance)
                    .contains(location)
                    .then_some(HitResult { element: id, style_index: None, entry_index: None })
            }
            ElementKind::Group => None,
            _ => {
                let vertices = self.element_vertices(element)?;
                // Topmost style wins.
                for (style_index, style) in element.styles.iter().enumerate().rev() {
                    if !style.visible {
                        continue;
                    }
                    if let Some(entry_index) =
                        style.hit_test(&vertices, location, transform, tolerance)
                    {
                        return Some(HitResult {
                            element: id,
                            style_index: Some(style_index),
                            entry_index: Some(entry_index),
                        });
                    }
                }
                None
            }
        }
    }

    /// Collects elements colliding with a world-space area, by bbox kind
    /// and containment mode (see the `COLLISION_*` flags).
    pub fn get_collisions(&self, id: ElementId, area: Rect, flags: u32, out: &mut Vec<ElementId>) {
        let Some(element) = self.element(id) else {
            return;
        };

        let bbox = if flags & COLLISION_GEOMETRY_BBOX != 0 {
            self.geometry_bbox(id)
        } else if flags & COLLISION_PAINT_BBOX != 0 {
            self.paint_bbox(id)
        } else {
            None
        };

        if let Some(bbox) = bbox {
            let collides = if flags & COLLISION_PARTIAL != 0 {
                area.intersects(bbox)
            } else {
                area.contains_rect(bbox)
            };
            if collides {
                out.push(id);
            }
        }

        for child in &element.children {
            self.get_collisions(*child, area, flags, out);
        }
    }
}

/// Folds a source bbox through every visible style, uniting the results.
pub(crate) fn style_set_bbox(styles: &[Style], source: Rect) -> Rect {
    let mut result: Option<Rect> = None;
    for style in styles.iter().filter(|s| s.visible) {
        let bbox = style.bbox(source);
        result = Some(match result {
            Some(r) => r.united(bbox),
            None => bbox,
        });
    }
    result.unwrap_or(source)
}
