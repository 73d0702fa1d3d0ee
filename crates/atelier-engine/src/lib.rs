//! Atelier engine crate.
//!
//! This crate owns the scene document, the software paint surface and the
//! view/invalidation machinery used by higher layers (tools, panels, shell).

pub mod logging;
pub mod coords;
pub mod paint;
pub mod scene;
pub mod view;
