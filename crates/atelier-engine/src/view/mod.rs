//! Presentation layer: scroll/zoom views, dirty-region tracking, and lazily
//! repainted stages.

pub mod dirty;
pub mod scheduler;
pub mod stage;
#[allow(clippy::module_inception)]
pub mod view;

pub use dirty::{DirtyList, DirtyMatcher};
pub use scheduler::{FrameScheduler, ManualScheduler};
pub use stage::Stage;
pub use view::{View, ViewOptions};
