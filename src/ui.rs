//! Terminal UI for iaseek.
//!
//! [render] draws one frame from the [crate::app::AppState]. The download log panel is drawn
//! separately by the terminal monitor while a download runs.

pub mod overlays;
pub mod panes;
pub mod render;
pub mod widgets;

pub use render::render;
