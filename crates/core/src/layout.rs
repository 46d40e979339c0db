//! Page layout
//!
//! Pages are stacked top to bottom in canvas space (device pixels, y down)
//! with `page_indent` pixels before the first page and between neighbours.
//! The canvas is as wide as the widest page plus an indent on either side.
//! The view mode does not affect placement; single-page mode only narrows
//! which pages get drawn.

use crate::view_state::{FitMode, ViewState};
use pdf_viewer_render::{PageGeometry, PageTransform, Point, Rect, Scale, Size, Vec2};

/// Where a page sits on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageInfo {
    /// Page rectangle in canvas coordinates
    pub bounding_rect: Rect,
}

/// Page rectangles and per-page zoom factors for one set of view parameters
///
/// The whole layout is recomputed by [`PageLayoutEngine::relayout`]; entries
/// are never patched individually.
#[derive(Debug, Clone, Default)]
pub struct PageLayoutEngine {
    infos: Vec<PageInfo>,
    zooms: Vec<f64>,
    canvas_size: Size,
}

impl PageLayoutEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recompute every page rectangle and the canvas size
    pub fn relayout(&mut self, pages: &[PageGeometry], state: &ViewState) {
        self.zooms = resolve_fit_zooms(pages, state);
        self.infos.clear();

        if pages.is_empty() {
            self.canvas_size = Size::ZERO;
            return;
        }

        let indent = state.indent();
        let mut offset = indent;
        let mut max_width: f64 = 0.0;

        for (page, zoom) in pages.iter().zip(&self.zooms) {
            let size = page_transform(page, state, *zoom).device_size();

            self.infos.push(PageInfo {
                bounding_rect: Rect::from_origin_size(Point::new(0.0, offset), size),
            });

            offset += size.height + indent;
            max_width = max_width.max(size.width);
        }

        // No gap after the last page
        let total_height = offset - indent;

        let shift = Vec2::new(indent, 0.0);
        for info in &mut self.infos {
            info.bounding_rect = info.bounding_rect + shift;
        }

        self.canvas_size = Size::new(max_width + 2.0 * indent, total_height);
    }

    pub fn page_infos(&self) -> &[PageInfo] {
        &self.infos
    }

    pub fn page_count(&self) -> usize {
        self.infos.len()
    }

    /// Size of the scrollable canvas
    pub fn canvas_size(&self) -> Size {
        self.canvas_size
    }

    /// Zoom factor the page was laid out with
    pub fn page_zoom(&self, index: usize) -> Option<f64> {
        self.zooms.get(index).copied()
    }

    pub fn bounding_rect(&self, index: usize) -> Option<Rect> {
        self.infos.get(index).map(|info| info.bounding_rect)
    }

    /// First page whose vertical span contains canvas coordinate `y`
    pub fn page_by_y(&self, y: f64) -> Option<usize> {
        self.infos
            .iter()
            .position(|info| y >= info.bounding_rect.y0 && y < info.bounding_rect.y1)
    }

    /// First page containing canvas point `point`
    pub fn page_by_point(&self, point: Point) -> Option<usize> {
        self.infos
            .iter()
            .position(|info| info.bounding_rect.contains(point))
    }
}

/// Transform for `page` at `zoom` under the view's dpi and rotation
pub fn page_transform(page: &PageGeometry, state: &ViewState, zoom: f64) -> PageTransform {
    let scale = Scale::new(zoom, state.dpi_x, state.dpi_y);
    PageTransform::for_page(page, state.rotation, scale)
}

/// Per-page zoom factors for the current fit mode
///
/// Each page is measured once at zoom 1.0 against the viewport minus the
/// indent on either side, clamped to at least one pixel; the result is not
/// refined after relayout.
///
/// A viewport with zero width or height has nothing to fit against, so
/// every page keeps the explicit zoom instead of shrinking to one pixel.
/// Pages with no area and `FitMode::None` use the explicit zoom as well.
pub fn resolve_fit_zooms(pages: &[PageGeometry], state: &ViewState) -> Vec<f64> {
    let viewport = state.viewport;
    if state.fit == FitMode::None || !(viewport.width > 0.0 && viewport.height > 0.0) {
        return vec![state.zoom; pages.len()];
    }

    let indent = state.indent();
    let usable_width = (viewport.width - 2.0 * indent).max(1.0);
    let usable_height = (viewport.height - 2.0 * indent).max(1.0);

    pages
        .iter()
        .map(|page| {
            let size = page_transform(page, state, 1.0).device_size();
            if !(size.width > 0.0 && size.height > 0.0) {
                return state.zoom;
            }

            let x_ratio = usable_width / size.width;
            let y_ratio = usable_height / size.height;
            match state.fit {
                FitMode::FitWidth => x_ratio,
                FitMode::FitPage => x_ratio.min(y_ratio),
                FitMode::None => state.zoom,
            }
        })
        .collect()
}
