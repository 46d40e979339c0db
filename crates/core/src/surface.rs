//! Drawing targets

use image::imageops;
use pdf_viewer_render::{PixelRect, Rgba, RgbaImage};

/// Target the viewer paints into
pub trait Surface {
    /// Fill `rect` with a solid color
    fn fill(&mut self, rect: PixelRect, color: Rgba<u8>);

    /// Copy `image` with its top-left corner at (`x`, `y`)
    fn blit(&mut self, image: &RgbaImage, x: i32, y: i32);
}

/// A blit as seen by an [`ImageSurface`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Blit {
    pub rect: PixelRect,
}

/// Surface backed by an in-memory RGBA image
///
/// Records every blit so callers can check what was drawn where.
#[derive(Debug, Clone)]
pub struct ImageSurface {
    image: RgbaImage,
    blits: Vec<Blit>,
}

impl ImageSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
            blits: Vec::new(),
        }
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn into_image(self) -> RgbaImage {
        self.image
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.image.width(), self.image.height())
    }

    pub fn blits(&self) -> &[Blit] {
        &self.blits
    }

    pub fn clear_blits(&mut self) {
        self.blits.clear();
    }
}

impl Surface for ImageSurface {
    fn fill(&mut self, rect: PixelRect, color: Rgba<u8>) {
        let Some(rect) = rect.intersect(&self.bounds()) else {
            return;
        };

        for y in rect.y..rect.bottom() {
            for x in rect.x..rect.right() {
                self.image.put_pixel(x as u32, y as u32, color);
            }
        }
    }

    fn blit(&mut self, image: &RgbaImage, x: i32, y: i32) {
        imageops::replace(&mut self.image, image, i64::from(x), i64::from(y));
        let rect = PixelRect::new(x, y, image.width(), image.height());
        self.blits.push(Blit { rect });
    }
}
