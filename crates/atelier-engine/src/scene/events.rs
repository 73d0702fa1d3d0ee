use super::element::ElementId;
use super::shapes::ImageStatus;
use crate::coords::Rect;

/// Change notification emitted by scene mutations.
///
/// Mutations push events in protocol order (before, mutate, after, bubble)
/// onto a queue owned by the [`Scene`](super::Scene); the embedding layer
/// drains them with `take_events()` and routes `InvalidateArea` to its
/// stage. The queue order is the delivery contract.
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// An element's geometry is about to change.
    GeometryBefore(ElementId),
    /// An element's geometry finished changing.
    GeometryAfter(ElementId),
    /// A descendant of this element changed geometry or structure.
    GeometryChild(ElementId),
    /// An element's style list changed.
    StyleChange(ElementId),
    /// An image shape moved to a new status.
    ImageStatus(ElementId, ImageStatus),
    /// A world-space area needs repainting.
    InvalidateArea(Rect),
}
