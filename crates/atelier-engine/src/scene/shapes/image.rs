use std::sync::Arc;

use anyhow::Context as _;

use crate::coords::{Point, Transform};
use crate::paint::{PathVertex, Pixmap};

/// Fallback extents while no bitmap is available.
pub const NO_IMAGE_WIDTH: f32 = 100.0;
pub const NO_IMAGE_HEIGHT: f32 = 100.0;

/// Image shape loading status. Decode failure is a state, not an error;
/// the shape keeps rendering a placeholder.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum ImageStatus {
    Loaded,
    Resolving,
    Loading,
    /// Resolution is deferred because the shape is not attached to a scene.
    Delayed,
    Error,
}

/// Raster image shape: a bitmap drawn at its natural size, positioned by
/// the element transform.
#[derive(Debug)]
pub struct ImageShape {
    pub(crate) source: Option<String>,
    pub(crate) status: ImageStatus,
    pub(crate) bitmap: Option<Arc<Pixmap>>,
}

impl Default for ImageShape {
    fn default() -> Self {
        Self {
            source: None,
            status: ImageStatus::Delayed,
            bitmap: None,
        }
    }
}

impl ImageShape {
    #[inline]
    pub fn status(&self) -> ImageStatus {
        self.status
    }

    #[inline]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[inline]
    pub fn bitmap(&self) -> Option<&Arc<Pixmap>> {
        self.bitmap.as_ref()
    }

    /// Natural width, or the placeholder width while unloaded.
    #[inline]
    pub fn width(&self) -> f32 {
        self.bitmap
            .as_ref()
            .map_or(NO_IMAGE_WIDTH, |b| b.width() as f32)
    }

    /// Natural height, or the placeholder height while unloaded.
    #[inline]
    pub fn height(&self) -> f32 {
        self.bitmap
            .as_ref()
            .map_or(NO_IMAGE_HEIGHT, |b| b.height() as f32)
    }

    /// Outline of the image extents in shape-local space.
    pub fn vertices(&self, transform: Option<Transform>) -> Vec<PathVertex> {
        let (w, h) = (self.width(), self.height());
        let map = |x: f32, y: f32| match transform {
            Some(t) => t.map_point(Point::new(x, y)),
            None => Point::new(x, y),
        };
        vec![
            PathVertex::Move(map(0.0, 0.0)),
            PathVertex::Line(map(w, 0.0)),
            PathVertex::Line(map(w, h)),
            PathVertex::Line(map(0.0, h)),
            PathVertex::Close,
        ]
    }
}

/// Decodes encoded image bytes (PNG/JPEG) into a premultiplied pixmap.
pub(crate) fn decode_image(bytes: &[u8]) -> anyhow::Result<Pixmap> {
    let img = image::load_from_memory(bytes)
        .context("failed to decode image data")?
        .to_rgba8();
    Ok(Pixmap::from_rgba_image(&img))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coords::Rect;
    use crate::paint::flatten;

    #[test]
    fn placeholder_extents_without_bitmap() {
        let shape = ImageShape::default();
        assert_eq!(shape.width(), NO_IMAGE_WIDTH);
        assert_eq!(shape.height(), NO_IMAGE_HEIGHT);
    }

    #[test]
    fn vertices_cover_natural_size() {
        let mut shape = ImageShape::default();
        shape.bitmap = Some(Arc::new(Pixmap::new(32, 16)));
        let flat = flatten(&shape.vertices(None), Transform::identity());
        assert!(flat.bounds.unwrap().almost_eq(Rect::new(0.0, 0.0, 32.0, 16.0)));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_image(&[0, 1, 2, 3]).is_err());
    }
}
