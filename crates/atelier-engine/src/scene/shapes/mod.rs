//! Leaf shapes: vertex-source payloads for scene elements.

mod image;
mod polygon;
mod rectangle;

pub use image::{ImageShape, ImageStatus, NO_IMAGE_HEIGHT, NO_IMAGE_WIDTH};
pub(crate) use image::decode_image;
pub use polygon::PolygonShape;
pub use rectangle::RectangleShape;
