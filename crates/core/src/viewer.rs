//! Page viewer
//!
//! Owns the view state, the page layout and the render cache, and draws the
//! visible part of a document into a [`Surface`]. Every setter that affects
//! how pages are rasterized marks the cache dirty and relayouts immediately,
//! so queries always see the current geometry. Bitmaps are only released
//! inside [`PageView::draw`].

use crate::layout::{self, PageInfo, PageLayoutEngine};
use crate::surface::Surface;
use crate::view_state::{clamp_dpi, clamp_zoom, FitMode, ViewMode, ViewState};
use log::{debug, warn};
use pdf_viewer_cache::{CacheConfig, CacheStats, RenderCache};
use pdf_viewer_render::{
    rects_overlap, Document, OptionalContentContext, PageGeometry, PageTransform, PixelRect,
    Point, Rect, Renderer, Rgba, Rotation, Size, Tile, TileGrid, Vec2,
};
use std::ops::Range;
use std::sync::Arc;

/// Color painted behind and between pages
pub const DEFAULT_BACKGROUND: Rgba<u8> = Rgba([0x80, 0x80, 0x80, 0xff]);

/// What a single [`PageView::draw`] call did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawStats {
    /// Whether the frame started by dropping a dirty cache
    pub invalidated: bool,

    /// Pages released by eviction before drawing
    pub pages_evicted: usize,

    /// Pages that intersected the clip rectangle
    pub pages_drawn: usize,

    pub full_bitmaps_blitted: usize,
    pub tiles_blitted: usize,

    /// Renderer calls, including failed ones
    pub render_calls: usize,
    pub render_failures: usize,
}

/// Document viewer drawing through a tiled render cache
pub struct PageView<R> {
    document: Option<Arc<dyn Document>>,
    pages: Vec<PageGeometry>,
    renderer: R,
    state: ViewState,
    layout: PageLayoutEngine,
    cache: RenderCache,
    background: Rgba<u8>,
}

impl<R: Renderer> PageView<R> {
    pub fn new(renderer: R) -> Self {
        Self::with_config(renderer, CacheConfig::default())
    }

    pub fn with_config(renderer: R, config: CacheConfig) -> Self {
        Self {
            document: None,
            pages: Vec::new(),
            renderer,
            state: ViewState::default(),
            layout: PageLayoutEngine::new(),
            cache: RenderCache::new(config),
            background: DEFAULT_BACKGROUND,
        }
    }

    // Document

    /// Show `document`, starting at its first page
    ///
    /// Page geometry is read once here; pages the document cannot describe
    /// are treated as empty.
    pub fn set_document(&mut self, document: Arc<dyn Document>) {
        let count = document.page_count();
        self.pages = (0..count)
            .map(|index| {
                document
                    .page(index)
                    .unwrap_or_else(|| PageGeometry::new(index, Rect::ZERO, Rotation::None))
            })
            .collect();
        self.document = Some(document);

        debug!("document set: {count} page(s)");
        self.cache.reset(count);
        self.state.current_page = if count == 0 { -1 } else { 0 };
        self.state.scroll = Vec2::ZERO;
        self.invalidate_layout();
    }

    pub fn close_document(&mut self) {
        self.document = None;
        self.pages.clear();
        self.cache.reset(0);
        self.state.current_page = -1;
        self.state.scroll = Vec2::ZERO;
        self.invalidate_layout();
    }

    pub fn document(&self) -> Option<&Arc<dyn Document>> {
        self.document.as_ref()
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    // Properties

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Set an explicit zoom factor, leaving any fit mode
    pub fn set_zoom(&mut self, zoom: f64) {
        let Some(zoom) = clamp_zoom(zoom) else {
            return;
        };
        if self.state.zoom == zoom && self.state.fit == FitMode::None {
            return;
        }
        self.state.zoom = zoom;
        self.state.fit = FitMode::None;
        self.invalidate_layout();
    }

    pub fn set_fit(&mut self, fit: FitMode) {
        if self.state.fit != fit {
            self.state.fit = fit;
            self.invalidate_layout();
        }
    }

    pub fn set_page_indent(&mut self, indent: f64) {
        if self.state.page_indent != indent {
            self.state.page_indent = indent;
            self.invalidate_layout();
        }
    }

    /// Switch between continuous and single-page display
    ///
    /// Page placement is the same in both modes; in single-page mode the
    /// host scrolls to the current page, e.g. with [`Self::scroll_to_page`].
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        if self.state.view_mode != mode {
            self.state.view_mode = mode;
            self.cache.invalidate();
        }
    }

    /// Set the screen resolution; non-positive values are ignored
    pub fn set_dpi(&mut self, dpi_x: f64, dpi_y: f64) {
        let (Some(dpi_x), Some(dpi_y)) = (clamp_dpi(dpi_x), clamp_dpi(dpi_y)) else {
            return;
        };
        if (self.state.dpi_x, self.state.dpi_y) != (dpi_x, dpi_y) {
            self.state.dpi_x = dpi_x;
            self.state.dpi_y = dpi_y;
            self.invalidate_layout();
        }
    }

    /// Rotate every page on top of its own rotation
    pub fn set_rotation(&mut self, rotation: Rotation) {
        if self.state.rotation != rotation {
            self.state.rotation = rotation;
            self.invalidate_layout();
        }
    }

    /// Change layer visibility; compared by value, not identity
    pub fn set_optional_content(&mut self, context: OptionalContentContext) {
        if self.state.optional_content != context {
            self.state.optional_content = context;
            self.cache.invalidate();
        }
    }

    /// Size of the visible area; only the fit modes depend on it
    pub fn set_viewport_size(&mut self, size: Size) {
        if self.state.viewport == size {
            return;
        }
        self.state.viewport = size;
        if self.state.fit == FitMode::None {
            self.relayout();
        } else {
            self.invalidate_layout();
        }
    }

    pub fn set_scroll(&mut self, scroll: Vec2) {
        self.state.scroll = scroll;
    }

    pub fn scroll_by(&mut self, delta: Vec2) {
        self.state.scroll += delta;
    }

    /// Scroll so page `index` sits at the top of the viewport and make it current
    pub fn scroll_to_page(&mut self, index: usize) {
        let Some(rect) = self.layout.bounding_rect(index) else {
            return;
        };
        self.state.scroll.y = (rect.y0 - self.state.indent()).max(0.0);
        self.set_current_page(index as i32);
    }

    /// Clamped into `-1..page_count`
    pub fn set_current_page(&mut self, page: i32) {
        let last = i32::try_from(self.pages.len()).unwrap_or(i32::MAX) - 1;
        self.state.current_page = page.clamp(-1, last);
    }

    pub fn current_page(&self) -> i32 {
        self.state.current_page
    }

    pub fn set_background(&mut self, color: Rgba<u8>) {
        self.background = color;
    }

    pub fn cache_config(&self) -> &CacheConfig {
        self.cache.config()
    }

    pub fn set_cache_config(&mut self, config: CacheConfig) {
        self.cache.set_config(config);
    }

    /// Drop every cached bitmap on the next draw
    pub fn invalidate_cache(&mut self) {
        self.cache.invalidate();
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    // Drawing

    /// Paint everything inside `clip`, given in viewport coordinates
    pub fn draw<S: Surface + ?Sized>(&mut self, surface: &mut S, clip: Rect) -> DrawStats {
        let mut stats = DrawStats::default();
        surface.fill(PixelRect::enclosing(clip), self.background);

        stats.invalidated = self.cache.clear_if_dirty();

        let scroll = self.state.scroll;
        let screen_rects: Vec<Rect> = self
            .layout
            .page_infos()
            .iter()
            .map(|info| info.bounding_rect - scroll)
            .collect();
        let range = self.visible_range();

        stats.pages_evicted = self.cache.evict_distant(&screen_rects, clip);

        for index in range {
            let Some(&screen) = screen_rects.get(index) else {
                break;
            };
            if rects_overlap(screen, clip) {
                self.draw_page(surface, index, screen, clip, &mut stats);
            }
        }

        stats
    }

    fn draw_page<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        index: usize,
        screen: Rect,
        clip: Rect,
        stats: &mut DrawStats,
    ) {
        let Some(transform) = self.page_transform(index) else {
            return;
        };
        let tile_max_size = self.cache.config().tile_max_size;
        let whole_page = self.cache.config().whole_page_fast_path;
        let fresh = !self.cache.contains(index);

        let Some(grid) = self
            .cache
            .get_or_insert_with(index, || TileGrid::partition(index, transform, tile_max_size))
        else {
            return;
        };
        if fresh {
            let (columns, rows) = (grid.columns(), grid.rows());
            debug!("page {index}: built {columns}x{rows} tile grid");
        }

        let renderer = &mut self.renderer;
        let optional_content = &self.state.optional_content;
        let origin_x = screen.x0.round() as i32;
        let origin_y = screen.y0.round() as i32;
        let mut outcomes = Vec::new();

        if fresh && whole_page && grid.fits_single_bitmap() {
            let result = grid.render_full_page(renderer, optional_content);
            if let Err(error) = &result {
                warn!("page {index}: whole-page render failed: {error}");
            }
            outcomes.push(result.is_ok());
        }

        if let Some(bitmap) = grid.full_bitmap() {
            surface.blit(bitmap, origin_x, origin_y);
            stats.full_bitmaps_blitted += 1;
        } else {
            let visible = clip.intersect(screen) - screen.origin().to_vec2();

            for coordinate in grid.tiles_overlapping(&PixelRect::enclosing(visible)) {
                if !grid.tile(coordinate).is_some_and(Tile::is_loaded) {
                    let result = grid.render_tile(coordinate, renderer, optional_content);
                    outcomes.push(result.is_ok());
                    if let Err(error) = result {
                        // Left unloaded; the next draw that needs it tries again
                        warn!(
                            "page {index}: tile ({}, {}) failed: {error}",
                            coordinate.x, coordinate.y
                        );
                        continue;
                    }
                }

                let (Some(tile), Some((dx, dy))) =
                    (grid.tile(coordinate), grid.tile_offset(coordinate))
                else {
                    continue;
                };
                if let Some(pixels) = tile.pixels() {
                    surface.blit(pixels, origin_x + dx, origin_y + dy);
                    stats.tiles_blitted += 1;
                }
            }
        }

        stats.pages_drawn += 1;
        for succeeded in outcomes {
            stats.render_calls += 1;
            stats.render_failures += usize::from(!succeeded);
            self.cache.record_render(succeeded);
        }
    }

    // Queries

    /// Zoom factor page `index` is displayed at
    pub fn page_zoom(&self, index: usize) -> Option<f64> {
        self.layout.page_zoom(index)
    }

    /// Displayed page size in device pixels
    pub fn page_view_size(&self, index: usize) -> Option<Size> {
        self.layout.bounding_rect(index).map(|rect| rect.size())
    }

    /// Page rectangle in viewport coordinates
    pub fn page_view_rect(&self, index: usize) -> Option<Rect> {
        self.layout
            .bounding_rect(index)
            .map(|rect| rect - self.state.scroll)
    }

    /// Page under a viewport point
    pub fn page_by_coord(&self, point: Point) -> Option<usize> {
        let canvas = point + self.state.scroll;
        if !self.state.is_single_page() {
            return self.layout.page_by_point(canvas);
        }
        let current = self.current_index()?;
        let rect = self.layout.bounding_rect(current)?;
        rect.contains(canvas).then_some(current)
    }

    /// Page whose vertical span contains viewport coordinate `y`
    pub fn page_by_y(&self, y: f64) -> Option<usize> {
        let canvas_y = y + self.state.scroll.y;
        if !self.state.is_single_page() {
            return self.layout.page_by_y(canvas_y);
        }
        let current = self.current_index()?;
        let rect = self.layout.bounding_rect(current)?;
        (canvas_y >= rect.y0 && canvas_y < rect.y1).then_some(current)
    }

    /// Page rectangles in canvas coordinates
    pub fn page_infos(&self) -> &[PageInfo] {
        self.layout.page_infos()
    }

    pub fn canvas_size(&self) -> Size {
        self.layout.canvas_size()
    }

    /// Pages drawn for the current scroll position and viewport
    pub fn visible_pages(&self) -> Vec<usize> {
        let viewport = Rect::from_origin_size(Point::ZERO, self.state.viewport);
        self.visible_range()
            .filter(|&index| {
                self.page_view_rect(index)
                    .is_some_and(|rect| rects_overlap(rect, viewport))
            })
            .collect()
    }

    /// Map a viewport point to PDF space on page `index`
    pub fn screen_to_pdf(&self, point: Point, index: usize) -> Option<Point> {
        let origin = self.page_view_rect(index)?.origin();
        Some(self.page_transform(index)?.screen_to_pdf(origin) * point)
    }

    /// Map a PDF point on page `index` to viewport coordinates
    pub fn pdf_to_screen(&self, point: Point, index: usize) -> Option<Point> {
        let origin = self.page_view_rect(index)?.origin();
        Some(self.page_transform(index)?.pdf_to_screen(origin) * point)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // Internals

    fn page_transform(&self, index: usize) -> Option<PageTransform> {
        let page = self.pages.get(index)?;
        let zoom = self.layout.page_zoom(index)?;
        Some(layout::page_transform(page, &self.state, zoom))
    }

    fn current_index(&self) -> Option<usize> {
        usize::try_from(self.state.current_page)
            .ok()
            .filter(|&index| index < self.pages.len())
    }

    fn visible_range(&self) -> Range<usize> {
        match self.state.view_mode {
            ViewMode::Continuous => 0..self.pages.len(),
            ViewMode::SinglePage => self.current_index().map_or(0..0, |index| index..index + 1),
        }
    }

    fn invalidate_layout(&mut self) {
        self.cache.invalidate();
        self.relayout();
    }

    fn relayout(&mut self) {
        self.layout.relayout(&self.pages, &self.state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::ImageSurface;
    use pdf_viewer_render::{SolidRenderer, SyntheticDocument};

    fn viewer(document: SyntheticDocument) -> PageView<SolidRenderer> {
        viewer_with_config(document, CacheConfig::default())
    }

    fn viewer_with_config(
        document: SyntheticDocument,
        config: CacheConfig,
    ) -> PageView<SolidRenderer> {
        let mut view = PageView::with_config(SolidRenderer::new(), config);
        view.set_dpi(72.0, 72.0);
        view.set_page_indent(10.0);
        view.set_document(Arc::new(document));
        view
    }

    fn clip(width: f64, height: f64) -> Rect {
        Rect::new(0.0, 0.0, width, height)
    }

    fn pixel(surface: &ImageSurface, x: u32, y: u32) -> Rgba<u8> {
        *surface.image().get_pixel(x, y)
    }

    #[test]
    fn test_draw_blits_visible_pages() {
        let mut view = viewer(SyntheticDocument::uniform(3, 100.0, 100.0));
        let mut surface = ImageSurface::new(200, 150);

        let stats = view.draw(&mut surface, clip(200.0, 150.0));

        assert!(stats.invalidated);
        assert_eq!(stats.pages_drawn, 2);
        assert_eq!(stats.full_bitmaps_blitted, 2);
        assert_eq!(stats.render_calls, 2);
        assert_eq!(pixel(&surface, 50, 50), SolidRenderer::page_color(0));
        assert_eq!(pixel(&surface, 50, 130), SolidRenderer::page_color(1));
        assert_eq!(pixel(&surface, 5, 5), DEFAULT_BACKGROUND);
        assert_eq!(pixel(&surface, 50, 115), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_large_page_renders_only_visible_tiles() {
        let config = CacheConfig::default().with_tile_max_size(100);
        let mut view = viewer_with_config(SyntheticDocument::uniform(1, 1000.0, 1000.0), config);
        let mut surface = ImageSurface::new(250, 250);

        let stats = view.draw(&mut surface, clip(250.0, 250.0));

        assert_eq!(stats.full_bitmaps_blitted, 0);
        assert_eq!(stats.render_calls, 9);
        assert_eq!(stats.tiles_blitted, 9);
        for call in view.renderer().calls() {
            assert_eq!((call.width, call.height), (100, 100));
        }
        assert!(surface
            .blits()
            .iter()
            .any(|blit| blit.rect == PixelRect::new(110, 110, 100, 100)));

        // Nothing new to render on a second frame
        let stats = view.draw(&mut surface, clip(250.0, 250.0));
        assert_eq!(stats.render_calls, 0);
        assert_eq!(stats.tiles_blitted, 9);
    }

    #[test]
    fn test_zoom_change_never_blits_stale_tiles() {
        let config = CacheConfig::default().with_tile_max_size(300);
        let mut view = viewer_with_config(SyntheticDocument::uniform(1, 500.0, 500.0), config);
        let mut surface = ImageSurface::new(400, 400);

        view.draw(&mut surface, clip(400.0, 400.0));
        assert_eq!(view.cache_stats().loaded_tiles, 4);

        view.set_zoom(2.0);
        surface.clear_blits();
        view.renderer_mut().clear_calls();

        let stats = view.draw(&mut surface, clip(400.0, 400.0));

        assert!(stats.invalidated);
        assert_eq!(stats.tiles_blitted, 4);
        assert_eq!(view.renderer().calls().len(), 4);
        // Every blit is a freshly rendered 300px tile of the 1000px page
        assert!(surface
            .blits()
            .iter()
            .all(|blit| (blit.rect.width, blit.rect.height) == (300, 300)));
        for call in view.renderer().calls() {
            assert!((call.update_rect.width() - 150.0).abs() < 1e-9);
        }
        assert_eq!(view.cache_stats().loaded_tiles, 4);
    }

    #[test]
    fn test_cached_pages_bounded_while_scrolling() {
        let mut view = viewer(SyntheticDocument::uniform(50, 612.0, 792.0));
        view.set_viewport_size(Size::new(800.0, 600.0));
        let mut surface = ImageSurface::new(800, 600);

        let canvas_height = view.canvas_size().height;
        let mut max_cached = 0usize;
        let mut y = 0.0;
        while y < canvas_height {
            view.set_scroll(Vec2::new(0.0, y));
            view.draw(&mut surface, clip(800.0, 600.0));
            max_cached = max_cached.max(view.cache_stats().cached_pages);
            y += 300.0;
        }

        let stats = view.cache_stats();
        assert!(max_cached <= 14, "{max_cached} pages cached");
        assert!(stats.evictions > 0);
        assert!(stats.cached_pages < 50);
        assert_eq!(stats.render_calls, 50);
    }

    #[test]
    fn test_hit_test_round_trip_for_every_rotation() {
        let document = SyntheticDocument::uniform(3, 612.0, 792.0)
            .with_rotation(1, Rotation::Degrees90);
        let mut view = viewer(document);
        view.set_zoom(1.3);
        view.set_scroll(Vec2::new(7.0, 500.0));

        let points = [
            Point::new(0.0, 0.0),
            Point::new(612.0, 792.0),
            Point::new(123.4, 567.8),
        ];
        let rotations = [
            Rotation::None,
            Rotation::Degrees90,
            Rotation::Degrees180,
            Rotation::Degrees270,
        ];
        for rotation in rotations {
            view.set_rotation(rotation);
            for page in 0..3 {
                for point in points {
                    let screen = view.pdf_to_screen(point, page).unwrap();
                    let back = view.screen_to_pdf(screen, page).unwrap();
                    assert!(
                        (back - point).hypot() < 1e-6,
                        "{rotation:?} page {page}: {back:?}"
                    );
                }
            }
        }
        assert_eq!(view.screen_to_pdf(Point::ZERO, 3), None);
    }

    #[test]
    fn test_top_left_of_page_maps_to_view_rect_origin() {
        let mut view = viewer(SyntheticDocument::uniform(2, 100.0, 200.0));
        view.set_scroll(Vec2::new(0.0, 50.0));

        let rect = view.page_view_rect(1).unwrap();
        assert_eq!(rect, Rect::new(10.0, 170.0, 110.0, 370.0));
        let screen = view.pdf_to_screen(Point::new(0.0, 200.0), 1).unwrap();
        assert!((screen - rect.origin()).hypot() < 1e-9);
    }

    #[test]
    fn test_single_page_mode_draws_current_page_only() {
        let config = CacheConfig::default().with_eviction_distance(50.0);
        let mut view = viewer_with_config(SyntheticDocument::uniform(3, 100.0, 100.0), config);
        view.set_view_mode(ViewMode::SinglePage);
        let mut surface = ImageSurface::new(200, 250);

        // All three pages overlap the clip; only the current one is drawn
        let stats = view.draw(&mut surface, clip(200.0, 250.0));
        assert_eq!(stats.pages_drawn, 1);
        assert_eq!(pixel(&surface, 50, 50), SolidRenderer::page_color(0));
        assert_eq!(pixel(&surface, 50, 150), DEFAULT_BACKGROUND);
        assert_eq!(view.page_by_coord(Point::new(50.0, 50.0)), Some(0));
        assert_eq!(view.page_by_coord(Point::new(50.0, 150.0)), None);

        // Pages keep their stacked positions
        view.scroll_to_page(2);
        assert_eq!(view.state().scroll.y, 220.0);
        let top = Rect::new(10.0, 10.0, 110.0, 110.0);
        assert_eq!(view.page_view_rect(2), Some(top));

        let stats = view.draw(&mut surface, clip(200.0, 250.0));
        assert!(!stats.invalidated);
        assert_eq!(stats.pages_drawn, 1);
        // Page 0 now ends 110px above the clip
        assert_eq!(stats.pages_evicted, 1);
        assert_eq!(view.cache_stats().cached_pages, 1);
        assert_eq!(pixel(&surface, 50, 50), SolidRenderer::page_color(2));
    }

    /// Draw one page, apply `change`, and draw again
    fn redraw_after(change: fn(&mut PageView<SolidRenderer>)) -> DrawStats {
        let mut view = viewer(SyntheticDocument::uniform(1, 100.0, 100.0));
        let mut surface = ImageSurface::new(400, 400);
        view.draw(&mut surface, clip(400.0, 400.0));
        view.renderer_mut().clear_calls();

        change(&mut view);
        let stats = view.draw(&mut surface, clip(400.0, 400.0));
        assert_eq!(stats.render_calls, view.renderer().calls().len());
        stats
    }

    #[test]
    fn test_rendering_setters_invalidate_cache() {
        let cases: [(&str, fn(&mut PageView<SolidRenderer>)); 10] = [
            ("zoom", |view| view.set_zoom(2.0)),
            ("fit", |view| view.set_fit(FitMode::FitPage)),
            ("page indent", |view| view.set_page_indent(20.0)),
            ("view mode", |view| view.set_view_mode(ViewMode::SinglePage)),
            ("dpi", |view| view.set_dpi(96.0, 96.0)),
            ("rotation", |view| view.set_rotation(Rotation::Degrees90)),
            ("optional content", |view| {
                view.set_optional_content(OptionalContentContext::new().hide("layer"))
            }),
            ("document", |view| {
                view.set_document(Arc::new(SyntheticDocument::uniform(1, 100.0, 100.0)))
            }),
            ("cache config", |view| {
                view.set_cache_config(CacheConfig::default().with_tile_max_size(512))
            }),
            ("explicit", |view| view.invalidate_cache()),
        ];

        for (name, change) in cases {
            let stats = redraw_after(change);
            assert!(stats.invalidated, "{name} should invalidate");
            assert_eq!(stats.render_calls, 1, "{name} should re-render the page");
        }
    }

    #[test]
    fn test_navigation_keeps_cache() {
        let cases: [(&str, fn(&mut PageView<SolidRenderer>)); 7] = [
            ("scroll", |view| view.set_scroll(Vec2::new(0.0, 5.0))),
            ("scroll by", |view| view.scroll_by(Vec2::new(3.0, 3.0))),
            ("current page", |view| view.set_current_page(-1)),
            ("viewport", |view| {
                view.set_viewport_size(Size::new(300.0, 300.0))
            }),
            ("background", |view| {
                view.set_background(Rgba([0, 0, 0, 0xff]))
            }),
            ("same zoom", |view| view.set_zoom(1.0)),
            ("same dpi", |view| view.set_dpi(72.0, 72.0)),
        ];

        for (name, change) in cases {
            let stats = redraw_after(change);
            assert!(!stats.invalidated, "{name} should not invalidate");
            assert_eq!(stats.render_calls, 0, "{name} should reuse the cached page");
            assert_eq!(stats.pages_drawn, 1, "{name}");
        }
    }

    #[test]
    fn test_failed_tiles_are_retried_on_next_draw() {
        let mut view = viewer(SyntheticDocument::uniform(1, 100.0, 100.0));
        *view.renderer_mut() = SolidRenderer::new().failing_on(0);
        let mut surface = ImageSurface::new(200, 200);

        // Whole-page attempt and the 1x1 tile fallback both fail
        let stats = view.draw(&mut surface, clip(200.0, 200.0));
        assert_eq!(stats.render_failures, 2);
        assert_eq!(stats.tiles_blitted + stats.full_bitmaps_blitted, 0);
        assert_eq!(pixel(&surface, 50, 50), DEFAULT_BACKGROUND);
        assert_eq!(view.cache_stats().cached_pages, 1);

        view.renderer_mut().recover(0);
        let stats = view.draw(&mut surface, clip(200.0, 200.0));
        assert_eq!(stats.render_calls, 1);
        assert_eq!(stats.tiles_blitted, 1);
        assert_eq!(pixel(&surface, 50, 50), SolidRenderer::page_color(0));

        let cache = view.cache_stats();
        assert_eq!(cache.render_calls, 3);
        assert_eq!(cache.render_failures, 2);
    }

    #[test]
    fn test_scroll_does_not_invalidate() {
        let mut view = viewer(SyntheticDocument::uniform(3, 100.0, 100.0));
        let mut surface = ImageSurface::new(200, 150);
        view.draw(&mut surface, clip(200.0, 150.0));

        view.set_scroll(Vec2::new(0.0, 100.0));
        let stats = view.draw(&mut surface, clip(200.0, 150.0));

        assert!(!stats.invalidated);
        // Pages 0 and 1 are already cached; only page 2 is new
        assert_eq!(stats.render_calls, 1);
        assert_eq!(stats.pages_drawn, 3);
    }

    #[test]
    fn test_optional_content_invalidates_by_value() {
        let mut view = viewer(SyntheticDocument::uniform(1, 100.0, 100.0));
        let mut surface = ImageSurface::new(200, 200);
        view.draw(&mut surface, clip(200.0, 200.0));

        let hidden = OptionalContentContext::new().hide("annotations");
        view.set_optional_content(hidden.clone());
        assert!(view.draw(&mut surface, clip(200.0, 200.0)).invalidated);

        view.set_optional_content(hidden);
        assert!(!view.draw(&mut surface, clip(200.0, 200.0)).invalidated);
    }

    #[test]
    fn test_fit_width_resolves_against_viewport() {
        let mut view = viewer(SyntheticDocument::uniform(2, 612.0, 792.0));
        view.set_viewport_size(Size::new(800.0, 600.0));
        view.set_fit(FitMode::FitWidth);

        let zoom = view.page_zoom(0).unwrap();
        assert!((zoom - 780.0 / 612.0).abs() < 1e-9);
        let width = view.page_view_size(1).unwrap().width;
        assert!((width - 780.0).abs() < 1e-9);

        // An explicit zoom leaves the fit mode
        view.set_zoom(1.0);
        assert_eq!(view.state().fit, FitMode::None);
        assert_eq!(view.page_zoom(0), Some(1.0));
    }

    #[test]
    fn test_current_page_is_clamped() {
        let mut view = viewer(SyntheticDocument::uniform(3, 100.0, 100.0));
        assert_eq!(view.current_page(), 0);

        view.set_current_page(100);
        assert_eq!(view.current_page(), 2);
        view.set_current_page(-7);
        assert_eq!(view.current_page(), -1);
    }

    #[test]
    fn test_page_lookup_accounts_for_scroll() {
        let mut view = viewer(SyntheticDocument::uniform(3, 100.0, 100.0));
        assert_eq!(view.page_by_coord(Point::new(50.0, 50.0)), Some(0));

        view.set_scroll(Vec2::new(0.0, 110.0));
        assert_eq!(view.page_by_coord(Point::new(50.0, 50.0)), Some(1));
        assert_eq!(view.page_by_y(5.0), None);
        assert_eq!(view.page_by_y(130.0), Some(2));
    }

    #[test]
    fn test_scroll_to_page() {
        let mut view = viewer(SyntheticDocument::uniform(5, 100.0, 100.0));
        view.set_viewport_size(Size::new(200.0, 150.0));
        view.scroll_to_page(3);

        assert_eq!(view.current_page(), 3);
        assert_eq!(view.state().scroll.y, 330.0);
        assert_eq!(view.visible_pages(), vec![3, 4]);
    }

    #[test]
    fn test_empty_document() {
        let mut view = viewer(SyntheticDocument::default());
        let mut surface = ImageSurface::new(50, 50);

        let stats = view.draw(&mut surface, clip(50.0, 50.0));
        assert_eq!(stats.pages_drawn, 0);
        assert_eq!(view.current_page(), -1);
        assert_eq!(view.canvas_size(), Size::ZERO);
        assert_eq!(view.page_zoom(0), None);
        assert_eq!(view.page_by_y(10.0), None);
        assert_eq!(pixel(&surface, 25, 25), DEFAULT_BACKGROUND);
    }

    #[test]
    fn test_oversized_clip_is_clamped() {
        let mut view = viewer(SyntheticDocument::uniform(1, 100.0, 100.0));
        let mut surface = ImageSurface::new(50, 50);

        let stats = view.draw(&mut surface, Rect::new(-1e12, -1e12, 1e12, 1e12));
        assert_eq!(stats.pages_drawn, 1);
        assert_eq!(stats.full_bitmaps_blitted, 1);
        assert_eq!(pixel(&surface, 5, 5), DEFAULT_BACKGROUND);
        assert_eq!(pixel(&surface, 20, 20), SolidRenderer::page_color(0));
    }

    #[test]
    fn test_zero_clip_draws_nothing() {
        let mut view = viewer(SyntheticDocument::uniform(1, 100.0, 100.0));
        let mut surface = ImageSurface::new(50, 50);

        let stats = view.draw(&mut surface, Rect::ZERO);
        assert_eq!(stats.pages_drawn, 0);
        assert_eq!(stats.render_calls, 0);
    }
}
