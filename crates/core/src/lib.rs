//! PDF Viewer Core Library
//!
//! View state, page layout and the draw loop that keeps the render cache
//! filled for whatever part of the document is on screen.

pub mod layout;
pub mod surface;
pub mod view_state;
pub mod viewer;

pub use layout::{page_transform, resolve_fit_zooms, PageInfo, PageLayoutEngine};
pub use surface::{Blit, ImageSurface, Surface};
pub use view_state::{
    FitMode, ViewMode, ViewState, DEFAULT_DPI, DEFAULT_PAGE_INDENT, MAX_ZOOM, MIN_ZOOM,
};
pub use viewer::{DrawStats, PageView, DEFAULT_BACKGROUND};
