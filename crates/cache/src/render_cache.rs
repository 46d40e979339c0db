//! Per-page render cache
//!
//! Holds at most one [`TileGrid`] per page in an index-addressed arena. Two
//! independent mechanisms bound what stays resident:
//!
//! 1. Global invalidation: any change that affects rendering marks the cache
//!    dirty, and the next frame releases every grid.
//! 2. Distance eviction: every frame, offscreen pages whose vertical gap to
//!    the clip rectangle exceeds the configured distance are released.
//!
//! Eviction is purely positional, not recency based, so no LRU queue is kept.

use crate::config::CacheConfig;
use log::debug;
use pdf_viewer_render::{rects_overlap, Rect, TileGrid};

/// Statistics about cache usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Pages that currently have a tile grid
    pub cached_pages: usize,

    /// Tiles holding pixels
    pub loaded_tiles: usize,

    /// Pages drawn from a single full-page bitmap
    pub full_bitmaps: usize,

    /// Bytes held by all bitmaps
    pub bytes: usize,

    /// Pages released by distance eviction
    pub evictions: u64,

    /// Number of times the whole cache was dropped
    pub invalidations: u64,

    /// Renderer calls made on behalf of the cache
    pub render_calls: u64,

    /// Renderer calls that produced no usable pixels
    pub render_failures: u64,
}

impl CacheStats {
    /// Fraction of renderer calls that failed (0.0 to 1.0)
    pub fn failure_rate(&self) -> f64 {
        if self.render_calls == 0 {
            0.0
        } else {
            self.render_failures as f64 / self.render_calls as f64
        }
    }
}

/// Cache of tile grids, one slot per page
#[derive(Debug)]
pub struct RenderCache {
    config: CacheConfig,
    entries: Vec<Option<TileGrid>>,
    dirty: bool,
    evictions: u64,
    invalidations: u64,
    render_calls: u64,
    render_failures: u64,
}

impl RenderCache {
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
            dirty: false,
            evictions: 0,
            invalidations: 0,
            render_calls: 0,
            render_failures: 0,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Replace the configuration; grids built under the old one are stale
    pub fn set_config(&mut self, config: CacheConfig) {
        if self.config != config {
            self.config = config;
            self.invalidate();
        }
    }

    /// Release everything and size the arena for a new document
    pub fn reset(&mut self, page_count: usize) {
        self.clear();
        self.entries = (0..page_count).map(|_| None).collect();
        self.dirty = false;
    }

    pub fn page_count(&self) -> usize {
        self.entries.len()
    }

    /// Mark every cached grid stale; they are dropped on the next frame
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Release every grid if the cache is dirty. Returns whether it was.
    pub fn clear_if_dirty(&mut self) -> bool {
        if !self.dirty {
            return false;
        }

        let released = self.clear();
        self.dirty = false;
        self.invalidations += 1;
        debug!("render cache invalidated, released {released} page(s)");
        true
    }

    /// Release every grid. Returns how many pages were cached.
    pub fn clear(&mut self) -> usize {
        (0..self.entries.len())
            .filter(|&index| self.release_page(index))
            .count()
    }

    /// Release the grid for one page. Returns whether it was cached.
    pub fn release_page(&mut self, index: usize) -> bool {
        match self.entries.get_mut(index).and_then(Option::take) {
            Some(mut grid) => {
                grid.release();
                true
            }
            None => false,
        }
    }

    pub fn get(&self, index: usize) -> Option<&TileGrid> {
        self.entries.get(index).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut TileGrid> {
        self.entries.get_mut(index).and_then(Option::as_mut)
    }

    pub fn contains(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Grid for `index`, building it first if the slot is empty
    ///
    /// Returns `None` for indices outside the arena.
    pub fn get_or_insert_with<F>(&mut self, index: usize, build: F) -> Option<&mut TileGrid>
    where
        F: FnOnce() -> TileGrid,
    {
        let slot = self.entries.get_mut(index)?;
        if slot.is_none() {
            *slot = Some(build());
        }
        slot.as_mut()
    }

    /// Store a grid, releasing whatever occupied the slot before
    pub fn insert(&mut self, index: usize, grid: TileGrid) -> bool {
        if index >= self.entries.len() {
            return false;
        }
        self.release_page(index);
        self.entries[index] = Some(grid);
        true
    }

    /// Release pages that are offscreen and far from `clip`
    ///
    /// `page_rects` holds every page's rectangle in the same coordinate space
    /// as `clip`, indexed by page. Returns the number of pages released.
    pub fn evict_distant(&mut self, page_rects: &[Rect], clip: Rect) -> usize {
        let threshold = self.config.eviction_distance;
        let mut released = 0;

        for (index, rect) in page_rects.iter().enumerate() {
            if !self.contains(index) || rects_overlap(*rect, clip) {
                continue;
            }

            let gap = vertical_gap(*rect, clip);
            if gap > threshold && self.release_page(index) {
                debug!("evicted page {index}: {gap:.0}px from viewport");
                released += 1;
            }
        }

        self.evictions += released as u64;
        released
    }

    /// Count a renderer call made while filling a grid
    pub fn record_render(&mut self, succeeded: bool) {
        self.render_calls += 1;
        if !succeeded {
            self.render_failures += 1;
        }
    }

    /// Indices of pages that currently have a grid
    pub fn cached_pages(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| entry.as_ref().map(|_| index))
    }

    pub fn stats(&self) -> CacheStats {
        let grids = self.entries.iter().flatten();

        let mut stats = CacheStats {
            evictions: self.evictions,
            invalidations: self.invalidations,
            render_calls: self.render_calls,
            render_failures: self.render_failures,
            ..CacheStats::default()
        };

        for grid in grids {
            stats.cached_pages += 1;
            stats.loaded_tiles += grid.loaded_tile_count();
            stats.full_bitmaps += usize::from(grid.full_bitmap().is_some());
            stats.bytes += grid.byte_size();
        }

        stats
    }
}

impl Default for RenderCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Vertical distance between two rectangles; zero when their spans overlap
pub fn vertical_gap(a: Rect, b: Rect) -> f64 {
    if a.y1 < b.y0 {
        b.y0 - a.y1
    } else if b.y1 < a.y0 {
        a.y0 - b.y1
    } else {
        0.0
    }
}
