//! In-memory document and renderer
//!
//! Stand-ins for a real PDF engine: a document made of plain page
//! geometries and a renderer that fills every request with a per-page solid
//! color while recording what it was asked for.

use crate::geometry::{PageGeometry, Rotation};
use crate::source::{Document, RegionRequest, RenderError, Renderer};
use image::{Rgba, RgbaImage};
use kurbo::Rect;
use std::collections::HashSet;

/// Document backed by a list of page geometries
#[derive(Debug, Clone, Default)]
pub struct SyntheticDocument {
    pages: Vec<PageGeometry>,
}

impl SyntheticDocument {
    /// `count` upright pages of `width x height` PDF units
    pub fn uniform(count: usize, width: f64, height: f64) -> Self {
        Self::from_sizes((0..count).map(|_| (width, height)))
    }

    /// One upright page per `(width, height)` pair
    pub fn from_sizes(sizes: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let pages = sizes
            .into_iter()
            .enumerate()
            .map(|(index, (width, height))| {
                PageGeometry::new(index, Rect::new(0.0, 0.0, width, height), Rotation::None)
            })
            .collect();
        Self { pages }
    }

    /// Set the rotation of page `index`
    pub fn with_rotation(mut self, index: usize, rotation: Rotation) -> Self {
        if let Some(page) = self.pages.get_mut(index) {
            page.rotation = rotation;
        }
        self
    }

    /// Replace the crop box of page `index`
    pub fn with_crop_box(mut self, index: usize, crop_box: Rect) -> Self {
        if let Some(page) = self.pages.get_mut(index) {
            page.crop_box = crop_box.abs();
        }
        self
    }
}

impl Document for SyntheticDocument {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page(&self, index: usize) -> Option<PageGeometry> {
        self.pages.get(index).copied()
    }
}

/// What a [`SolidRenderer`] was asked to draw
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderCall {
    pub page_index: usize,
    pub width: u32,
    pub height: u32,
    pub update_rect: Rect,
}

/// Renderer that fills each request with the page's color
#[derive(Debug, Clone, Default)]
pub struct SolidRenderer {
    calls: Vec<RenderCall>,
    failing_pages: HashSet<usize>,
}

impl SolidRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every request for page `index`
    pub fn failing_on(mut self, index: usize) -> Self {
        self.failing_pages.insert(index);
        self
    }

    /// Stop failing requests for page `index`
    pub fn recover(&mut self, index: usize) {
        self.failing_pages.remove(&index);
    }

    /// Every request received so far, including failed ones
    pub fn calls(&self) -> &[RenderCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    /// Fill color used for page `index`
    pub fn page_color(index: usize) -> Rgba<u8> {
        let index = index as u32;
        Rgba([
            (40 + index * 53 % 200) as u8,
            (90 + index * 29 % 160) as u8,
            (160 + index * 17 % 90) as u8,
            255,
        ])
    }
}

impl Renderer for SolidRenderer {
    fn draw_region(&mut self, request: &RegionRequest<'_>) -> Result<RgbaImage, RenderError> {
        self.calls.push(RenderCall {
            page_index: request.page_index,
            width: request.width,
            height: request.height,
            update_rect: request.update_rect,
        });

        if self.failing_pages.contains(&request.page_index) {
            return Err(RenderError::Empty {
                page_index: request.page_index,
            });
        }

        Ok(RgbaImage::from_pixel(
            request.width,
            request.height,
            Self::page_color(request.page_index),
        ))
    }
}
