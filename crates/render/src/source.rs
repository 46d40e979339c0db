//! Collaborators consumed by the page cache
//!
//! The cache never parses or rasterizes documents itself. It asks a
//! [`Document`] for page geometry and a [`Renderer`] for pixels.

use crate::geometry::PageGeometry;
use image::RgbaImage;
use kurbo::{Affine, Rect};
use std::collections::BTreeSet;

/// Errors reported by a renderer
///
/// The cache treats every variant as a transient failure: the affected tile
/// stays unloaded and is requested again the next time it becomes visible.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("renderer produced no pixels for page {page_index}")]
    Empty { page_index: usize },

    #[error(
        "renderer returned {actual_width}x{actual_height} pixels for a \
         {expected_width}x{expected_height} region on page {page_index}"
    )]
    SizeMismatch {
        page_index: usize,
        expected_width: u32,
        expected_height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    #[error("page {0} is out of range")]
    InvalidPage(usize),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Source of page geometry
pub trait Document {
    /// Number of pages
    fn page_count(&self) -> usize;

    /// Geometry of page `index`, or `None` if the index is out of range
    fn page(&self, index: usize) -> Option<PageGeometry>;
}

/// Which optional-content groups (layers) are hidden
///
/// Opaque to the cache: it is only compared by value to decide whether
/// rendered pixels are still valid, and handed through to the renderer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OptionalContentContext {
    hidden: BTreeSet<String>,
}

impl OptionalContentContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide the layer named `group`
    pub fn hide(mut self, group: impl Into<String>) -> Self {
        self.hidden.insert(group.into());
        self
    }

    /// Show the layer named `group`
    pub fn show(mut self, group: &str) -> Self {
        self.hidden.remove(group);
        self
    }

    pub fn is_visible(&self, group: &str) -> bool {
        !self.hidden.contains(group)
    }

    pub fn hidden_groups(&self) -> impl Iterator<Item = &str> {
        self.hidden.iter().map(String::as_str)
    }
}

/// One call into the renderer
#[derive(Debug, Clone, Copy)]
pub struct RegionRequest<'a> {
    /// Page to draw
    pub page_index: usize,

    /// Page space to output-pixel transform
    pub transform: Affine,

    /// Region of the page, in PDF units, that lands inside the output
    pub update_rect: Rect,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Layers to hide while drawing
    pub optional_content: &'a OptionalContentContext,
}

/// Rasterizer that draws a page region under a transform into a pixel buffer
///
/// Calls are synchronous. Implementations must return an image of exactly
/// `request.width x request.height` pixels or an error.
pub trait Renderer {
    fn draw_region(&mut self, request: &RegionRequest<'_>) -> Result<RgbaImage, RenderError>;
}

impl<R: Renderer + ?Sized> Renderer for Box<R> {
    fn draw_region(&mut self, request: &RegionRequest<'_>) -> Result<RgbaImage, RenderError> {
        (**self).draw_region(request)
    }
}

/// Call `renderer` and reject results that are empty or the wrong size
pub fn render_region<R: Renderer + ?Sized>(
    renderer: &mut R,
    request: &RegionRequest<'_>,
) -> Result<RgbaImage, RenderError> {
    let image = renderer.draw_region(request)?;

    if image.width() == 0 || image.height() == 0 {
        return Err(RenderError::Empty {
            page_index: request.page_index,
        });
    }

    if image.width() != request.width || image.height() != request.height {
        return Err(RenderError::SizeMismatch {
            page_index: request.page_index,
            expected_width: request.width,
            expected_height: request.height,
            actual_width: image.width(),
            actual_height: image.height(),
        });
    }

    Ok(image)
}
