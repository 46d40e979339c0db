//! Tile grid for a single page
//!
//! Divides a page's device-space rectangle into tiles of at most
//! `tile_max_size` pixels per side. Small pages can instead be rendered once
//! into a single full-page bitmap, which then supersedes the tiles.

use crate::geometry::PixelRect;
use crate::source::{render_region, OptionalContentContext, RegionRequest, RenderError, Renderer};
use crate::transform::PageTransform;
use image::RgbaImage;
use kurbo::Rect;

/// Default maximum tile edge in pixels (1600x1600)
pub const DEFAULT_TILE_SIZE: u32 = 1600;

/// Tile position within a page's grid; (0, 0) is the top-left tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoordinate {
    /// Column
    pub x: u32,

    /// Row
    pub y: u32,
}

impl TileCoordinate {
    pub fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// One slice of a page
///
/// The rectangle is fixed when the grid is built; only the pixels change.
#[derive(Debug, Clone)]
pub struct Tile {
    rect: PixelRect,
    pixels: Option<RgbaImage>,
}

impl Tile {
    fn unloaded(rect: PixelRect) -> Self {
        Self { rect, pixels: None }
    }

    /// Rectangle in the page's device space
    pub fn rect(&self) -> PixelRect {
        self.rect
    }

    pub fn pixels(&self) -> Option<&RgbaImage> {
        self.pixels.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.pixels.is_some()
    }

    /// Bytes held by the tile's bitmap
    pub fn byte_size(&self) -> usize {
        self.pixels.as_ref().map_or(0, |pixels| pixels.len())
    }

    fn release(&mut self) {
        self.pixels = None;
    }
}

/// Cached rendering of one page at one zoom/rotation
#[derive(Debug, Clone)]
pub struct TileGrid {
    page_index: usize,
    transform: PageTransform,
    crop_rect: PixelRect,
    tile_max_size: u32,
    columns: u32,
    rows: u32,
    /// Row-major
    tiles: Vec<Tile>,
    full_bitmap: Option<RgbaImage>,
}

impl TileGrid {
    /// Partition the page's device rectangle into unloaded tiles
    ///
    /// Tiles are `tile_max_size` square except along the last row and column,
    /// which take whatever remains of the page.
    pub fn partition(page_index: usize, transform: PageTransform, tile_max_size: u32) -> Self {
        let crop_rect = transform.device_rect();
        let tile_max_size = tile_max_size.max(1);
        let columns = crop_rect.width.div_ceil(tile_max_size);
        let rows = crop_rect.height.div_ceil(tile_max_size);

        let mut tiles = Vec::with_capacity((columns * rows) as usize);
        for row in 0..rows {
            for column in 0..columns {
                let offset_x = column * tile_max_size;
                let offset_y = row * tile_max_size;
                tiles.push(Tile::unloaded(PixelRect::new(
                    crop_rect.x + offset_x as i32,
                    crop_rect.y + offset_y as i32,
                    tile_max_size.min(crop_rect.width - offset_x),
                    tile_max_size.min(crop_rect.height - offset_y),
                )));
            }
        }

        Self {
            page_index,
            transform,
            crop_rect,
            tile_max_size,
            columns,
            rows,
            tiles,
            full_bitmap: None,
        }
    }

    pub fn page_index(&self) -> usize {
        self.page_index
    }

    pub fn transform(&self) -> &PageTransform {
        &self.transform
    }

    /// Device rectangle covered by the grid
    pub fn crop_rect(&self) -> PixelRect {
        self.crop_rect
    }

    pub fn tile_max_size(&self) -> u32 {
        self.tile_max_size
    }

    pub fn columns(&self) -> u32 {
        self.columns
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    pub fn tile(&self, coordinate: TileCoordinate) -> Option<&Tile> {
        self.tile_index(coordinate).map(|index| &self.tiles[index])
    }

    /// All tiles in row-major order
    pub fn tiles(&self) -> impl Iterator<Item = (TileCoordinate, &Tile)> {
        let columns = self.columns.max(1);
        self.tiles
            .iter()
            .enumerate()
            .map(move |(i, tile)| {
                let i = i as u32;
                (TileCoordinate::new(i % columns, i / columns), tile)
            })
    }

    pub fn full_bitmap(&self) -> Option<&RgbaImage> {
        self.full_bitmap.as_ref()
    }

    /// Whether the page fits in a single tile
    pub fn fits_single_bitmap(&self) -> bool {
        !self.crop_rect.is_empty()
            && self.crop_rect.width <= self.tile_max_size
            && self.crop_rect.height <= self.tile_max_size
    }

    /// Render the whole page into one bitmap when it fits in a single tile
    ///
    /// Returns `Ok(false)` without calling the renderer for pages that are too
    /// large. On failure the grid is left as a plain 1x1 tile grid.
    pub fn render_full_page<R: Renderer + ?Sized>(
        &mut self,
        renderer: &mut R,
        optional_content: &OptionalContentContext,
    ) -> Result<bool, RenderError> {
        if !self.fits_single_bitmap() {
            return Ok(false);
        }
        if self.full_bitmap.is_some() {
            return Ok(true);
        }

        let request = self.region_request(self.crop_rect, optional_content);
        let bitmap = render_region(renderer, &request)?;
        self.full_bitmap = Some(bitmap);
        Ok(true)
    }

    /// Render one tile if it has no pixels yet
    pub fn render_tile<R: Renderer + ?Sized>(
        &mut self,
        coordinate: TileCoordinate,
        renderer: &mut R,
        optional_content: &OptionalContentContext,
    ) -> Result<(), RenderError> {
        let Some(index) = self.tile_index(coordinate) else {
            return Err(RenderError::Backend(format!(
                "tile ({}, {}) outside {}x{} grid on page {}",
                coordinate.x, coordinate.y, self.columns, self.rows, self.page_index
            )));
        };
        if self.tiles[index].is_loaded() {
            return Ok(());
        }

        let request = self.region_request(self.tiles[index].rect, optional_content);
        let pixels = render_region(renderer, &request)?;
        self.tiles[index].pixels = Some(pixels);
        Ok(())
    }

    /// Renderer request for the page region that maps onto `rect`
    ///
    /// The transform places `rect`'s top-left at output pixel (0, 0); the
    /// update rectangle is `rect` mapped back into PDF space.
    pub fn region_request<'a>(
        &self,
        rect: PixelRect,
        optional_content: &'a OptionalContentContext,
    ) -> RegionRequest<'a> {
        let transform = self.transform.tile_transform(&self.crop_rect, &rect);
        let local = Rect::new(0.0, 0.0, rect.width as f64, rect.height as f64);

        RegionRequest {
            page_index: self.page_index,
            transform,
            update_rect: transform.inverse().transform_rect_bbox(local),
            width: rect.width,
            height: rect.height,
            optional_content,
        }
    }

    /// Tiles that overlap `region`, given in the grid's device space
    pub fn tiles_overlapping(&self, region: &PixelRect) -> Vec<TileCoordinate> {
        let Some(visible) = self.crop_rect.intersect(region) else {
            return Vec::new();
        };

        let size = self.tile_max_size;
        let first_column = (visible.x - self.crop_rect.x) as u32 / size;
        let last_column = (visible.right() - self.crop_rect.x - 1) as u32 / size;
        let first_row = (visible.y - self.crop_rect.y) as u32 / size;
        let last_row = (visible.bottom() - self.crop_rect.y - 1) as u32 / size;

        let mut coordinates = Vec::new();
        for row in first_row..=last_row.min(self.rows.saturating_sub(1)) {
            for column in first_column..=last_column.min(self.columns.saturating_sub(1)) {
                coordinates.push(TileCoordinate::new(column, row));
            }
        }
        coordinates
    }

    /// Offset of a tile from the grid's top-left corner, in pixels
    pub fn tile_offset(&self, coordinate: TileCoordinate) -> Option<(i32, i32)> {
        self.tile(coordinate)
            .map(|tile| (tile.rect.x - self.crop_rect.x, tile.rect.y - self.crop_rect.y))
    }

    pub fn loaded_tile_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_loaded()).count()
    }

    /// Bytes held by the full-page bitmap and every loaded tile
    pub fn byte_size(&self) -> usize {
        let full = self.full_bitmap.as_ref().map_or(0, |bitmap| bitmap.len());
        full + self.tiles.iter().map(Tile::byte_size).sum::<usize>()
    }

    /// Drop every bitmap, keeping the grid shape
    pub fn release(&mut self) {
        self.full_bitmap = None;
        self.tiles.iter_mut().for_each(Tile::release);
    }

    fn tile_index(&self, coordinate: TileCoordinate) -> Option<usize> {
        if coordinate.x >= self.columns || coordinate.y >= self.rows {
            return None;
        }
        Some((coordinate.y * self.columns + coordinate.x) as usize)
    }
}
