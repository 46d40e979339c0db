//! View parameters shared by layout, caching and drawing

use pdf_viewer_render::{OptionalContentContext, Rotation, Size, Vec2};

/// Smallest zoom factor a view accepts
pub const MIN_ZOOM: f64 = 0.01;

/// Largest zoom factor a view accepts
pub const MAX_ZOOM: f64 = 64.0;

/// Screen resolution assumed until the host reports its own
pub const DEFAULT_DPI: f64 = 96.0;

/// Gap around and between pages, in device pixels
pub const DEFAULT_PAGE_INDENT: f64 = 10.0;

/// How the zoom factor of each page is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FitMode {
    /// Every page uses the explicit zoom
    #[default]
    None,

    /// Each page is scaled so its width fills the viewport
    FitWidth,

    /// Each page is scaled so it fits the viewport entirely
    FitPage,
}

/// Page arrangement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ViewMode {
    /// All pages stacked vertically
    #[default]
    Continuous,

    /// Only the current page is shown
    SinglePage,
}

/// Everything the viewer knows about how pages should be presented
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub zoom: f64,
    pub fit: FitMode,
    pub page_indent: f64,
    pub view_mode: ViewMode,

    /// Offset of the viewport into the canvas, in device pixels
    pub scroll: Vec2,

    /// Current page index, or -1 when there is none
    pub current_page: i32,

    pub dpi_x: f64,
    pub dpi_y: f64,

    /// Rotation applied on top of every page's own rotation
    pub rotation: Rotation,

    pub optional_content: OptionalContentContext,

    /// Size of the visible area, used by the fit modes
    pub viewport: Size,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            fit: FitMode::None,
            page_indent: DEFAULT_PAGE_INDENT,
            view_mode: ViewMode::Continuous,
            scroll: Vec2::ZERO,
            current_page: -1,
            dpi_x: DEFAULT_DPI,
            dpi_y: DEFAULT_DPI,
            rotation: Rotation::None,
            optional_content: OptionalContentContext::default(),
            viewport: Size::ZERO,
        }
    }
}

impl ViewState {
    /// Page indent with negative or non-finite values treated as zero
    pub fn indent(&self) -> f64 {
        if self.page_indent.is_finite() {
            self.page_indent.max(0.0)
        } else {
            0.0
        }
    }

    pub fn is_single_page(&self) -> bool {
        self.view_mode == ViewMode::SinglePage
    }
}

/// Clamp a requested zoom into the supported range
pub fn clamp_zoom(zoom: f64) -> Option<f64> {
    zoom.is_finite().then(|| zoom.clamp(MIN_ZOOM, MAX_ZOOM))
}

/// Clamp a requested dpi; anything non-positive is rejected
pub fn clamp_dpi(dpi: f64) -> Option<f64> {
    (dpi.is_finite() && dpi > 0.0).then_some(dpi)
}
