//! PDF Viewer Render Library
//!
//! Page geometry, page-to-device transforms, and per-page tile grids that
//! turn "a page at some zoom/rotation/DPI" into renderer requests.

pub mod geometry;
pub mod source;
pub mod synthetic;
pub mod tile;
pub mod transform;

pub use geometry::{rects_overlap, PageGeometry, PixelRect, Rotation};
pub use source::{
    render_region, Document, OptionalContentContext, RegionRequest, RenderError, Renderer,
};
pub use synthetic::{RenderCall, SolidRenderer, SyntheticDocument};
pub use tile::{Tile, TileCoordinate, TileGrid, DEFAULT_TILE_SIZE};
pub use transform::{PageTransform, Scale, PDF_UNITS_PER_INCH};

pub use image::{Rgba, RgbaImage};
pub use kurbo::{Affine, Point, Rect, Size, Vec2};
