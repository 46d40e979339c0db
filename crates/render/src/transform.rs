//! Page-space to device-space transforms
//!
//! Every page-to-device matrix is composed the same way:
//!
//! ```text
//! translate(origin) * scale(sx, sy) * quarter_turn(rotation) * flip_y * translate(-anchor)
//! ```
//!
//! `anchor` is the crop box corner that ends up at the top-left of the rotated
//! page, so the visible page always occupies the positive quadrant starting
//! at `origin`. The device-to-page transform is the exact matrix inverse.

use crate::geometry::{PageGeometry, PixelRect, Rotation};
use kurbo::{Affine, Point, Rect, Size, Vec2};

/// PDF user space units per inch
pub const PDF_UNITS_PER_INCH: f64 = 72.0;

/// Device pixels per PDF unit along each axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

impl Scale {
    /// `zoom * dpi / 72` on each axis
    pub fn new(zoom: f64, dpi_x: f64, dpi_y: f64) -> Self {
        Self {
            x: zoom * dpi_x / PDF_UNITS_PER_INCH,
            y: zoom * dpi_y / PDF_UNITS_PER_INCH,
        }
    }
}

/// Coordinate transformer for one page at one zoom/rotation/DPI
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageTransform {
    crop_box: Rect,
    rotation: Rotation,
    scale: Scale,
}

impl PageTransform {
    pub fn new(crop_box: Rect, rotation: Rotation, scale: Scale) -> Self {
        Self {
            crop_box: crop_box.abs(),
            rotation,
            scale,
        }
    }

    /// Transform for `page` with an extra view rotation applied on top of its own
    pub fn for_page(page: &PageGeometry, view_rotation: Rotation, scale: Scale) -> Self {
        Self::new(page.crop_box, page.rotation.compose(view_rotation), scale)
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    /// Exact (unrounded) page size in device pixels
    pub fn device_size(&self) -> Size {
        let (width, height) = if self.rotation.is_sideways() {
            (self.crop_box.height(), self.crop_box.width())
        } else {
            (self.crop_box.width(), self.crop_box.height())
        };
        Size::new(width * self.scale.x, height * self.scale.y)
    }

    /// Page rectangle in whole device pixels, anchored at the device origin
    pub fn device_rect(&self) -> PixelRect {
        let size = self.device_size();
        PixelRect::new(
            0,
            0,
            round_extent(size.width),
            round_extent(size.height),
        )
    }

    /// Page space to device space, with the page's top-left corner at `origin`
    pub fn pdf_to_screen(&self, origin: Point) -> Affine {
        Affine::translate(origin.to_vec2())
            * Affine::scale_non_uniform(self.scale.x, self.scale.y)
            * quarter_turn(self.rotation)
            * Affine::FLIP_Y
            * Affine::translate(-self.anchor().to_vec2())
    }

    /// Device space to page space; the exact inverse of [`Self::pdf_to_screen`]
    pub fn screen_to_pdf(&self, origin: Point) -> Affine {
        self.pdf_to_screen(origin).inverse()
    }

    /// Page-to-tile transform: device space shifted so `tile`'s top-left is pixel (0, 0)
    pub fn tile_transform(&self, crop_rect: &PixelRect, tile: &PixelRect) -> Affine {
        let origin = Point::new(crop_rect.x as f64, crop_rect.y as f64);
        Affine::translate(-Vec2::new(tile.x as f64, tile.y as f64)) * self.pdf_to_screen(origin)
    }

    /// Crop box corner mapped to the device origin for the current rotation
    fn anchor(&self) -> Point {
        let crop = self.crop_box;
        match self.rotation {
            Rotation::None => Point::new(crop.x0, crop.y1),
            Rotation::Degrees90 => Point::new(crop.x0, crop.y0),
            Rotation::Degrees180 => Point::new(crop.x1, crop.y0),
            Rotation::Degrees270 => Point::new(crop.x1, crop.y1),
        }
    }
}

/// Clockwise quarter turn in y-down device space
fn quarter_turn(rotation: Rotation) -> Affine {
    match rotation {
        Rotation::None => Affine::IDENTITY,
        Rotation::Degrees90 => Affine::new([0.0, 1.0, -1.0, 0.0, 0.0, 0.0]),
        Rotation::Degrees180 => Affine::new([-1.0, 0.0, 0.0, -1.0, 0.0, 0.0]),
        Rotation::Degrees270 => Affine::new([0.0, -1.0, 1.0, 0.0, 0.0, 0.0]),
    }
}

fn round_extent(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROTATIONS: [Rotation; 4] = [
        Rotation::None,
        Rotation::Degrees90,
        Rotation::Degrees180,
        Rotation::Degrees270,
    ];

    fn letter_transform(rotation: Rotation, zoom: f64) -> PageTransform {
        PageTransform::new(
            Rect::new(10.0, 20.0, 622.0, 812.0),
            rotation,
            Scale::new(zoom, 96.0, 144.0),
        )
    }

    fn assert_close(a: Point, b: Point) {
        assert!(
            (a.x - b.x).abs() < 1e-6 && (a.y - b.y).abs() < 1e-6,
            "{a:?} != {b:?}"
        );
    }

    #[test]
    fn test_scale_from_zoom_and_dpi() {
        let scale = Scale::new(2.0, 72.0, 144.0);
        assert_eq!(scale.x, 2.0);
        assert_eq!(scale.y, 4.0);
    }

    #[test]
    fn test_round_trip_for_every_rotation() {
        let points = [
            Point::new(10.0, 20.0),
            Point::new(622.0, 812.0),
            Point::new(300.5, 411.25),
            Point::new(-50.0, 1000.0),
        ];

        for rotation in ROTATIONS {
            let transform = letter_transform(rotation, 1.75);
            let origin = Point::new(37.0, -1200.0);
            let forward = transform.pdf_to_screen(origin);
            let inverse = transform.screen_to_pdf(origin);

            for point in points {
                assert_close(inverse * (forward * point), point);
                assert_close(forward * (inverse * point), point);
            }
        }
    }

    #[test]
    fn test_page_occupies_positive_quadrant() {
        for rotation in ROTATIONS {
            let transform = letter_transform(rotation, 1.0);
            let origin = Point::new(5.0, 7.0);
            let bbox = transform
                .pdf_to_screen(origin)
                .transform_rect_bbox(transform.crop_box);
            let size = transform.device_size();

            assert!((bbox.x0 - 5.0).abs() < 1e-9, "{rotation:?}: {bbox:?}");
            assert!((bbox.y0 - 7.0).abs() < 1e-9, "{rotation:?}: {bbox:?}");
            assert!((bbox.width() - size.width).abs() < 1e-9);
            assert!((bbox.height() - size.height).abs() < 1e-9);
        }
    }

    #[test]
    fn test_unrotated_top_left_maps_to_origin() {
        let transform = letter_transform(Rotation::None, 1.0);
        let forward = transform.pdf_to_screen(Point::ZERO);
        assert_close(forward * Point::new(10.0, 812.0), Point::ZERO);
        // y grows downward on screen
        let below = forward * Point::new(10.0, 800.0);
        assert!(below.y > 0.0);
    }

    #[test]
    fn test_rotated_corners() {
        let crop = Rect::new(0.0, 0.0, 100.0, 200.0);
        let scale = Scale::new(1.0, 72.0, 72.0);

        // 90 clockwise: bottom-left lands top-left, top-left lands top-right
        let t90 = PageTransform::new(crop, Rotation::Degrees90, scale)
            .pdf_to_screen(Point::ZERO);
        assert_close(t90 * Point::new(0.0, 0.0), Point::new(0.0, 0.0));
        assert_close(t90 * Point::new(0.0, 200.0), Point::new(200.0, 0.0));

        // 180: bottom-right lands top-left
        let t180 = PageTransform::new(crop, Rotation::Degrees180, scale)
            .pdf_to_screen(Point::ZERO);
        assert_close(t180 * Point::new(100.0, 0.0), Point::new(0.0, 0.0));

        // 270: top-right lands top-left
        let t270 = PageTransform::new(crop, Rotation::Degrees270, scale)
            .pdf_to_screen(Point::ZERO);
        assert_close(t270 * Point::new(100.0, 200.0), Point::new(0.0, 0.0));
        assert_close(t270 * Point::new(0.0, 200.0), Point::new(0.0, 100.0));
    }

    #[test]
    fn test_device_rect_swaps_for_sideways_pages() {
        let crop = Rect::new(0.0, 0.0, 612.0, 792.0);
        let scale = Scale::new(1.0, 72.0, 72.0);
        assert_eq!(
            PageTransform::new(crop, Rotation::None, scale).device_rect(),
            PixelRect::new(0, 0, 612, 792)
        );
        assert_eq!(
            PageTransform::new(crop, Rotation::Degrees90, scale).device_rect(),
            PixelRect::new(0, 0, 792, 612)
        );
    }

    #[test]
    fn test_tile_transform_moves_tile_origin_to_zero() {
        let transform = letter_transform(Rotation::Degrees180, 1.0);
        let crop = transform.device_rect();
        let tile = PixelRect::new(400, 600, 200, 200);
        let to_tile = transform.tile_transform(&crop, &tile);
        let to_device = transform.pdf_to_screen(Point::ZERO);

        let pdf_point = to_device.inverse() * Point::new(400.0, 600.0);
        assert_close(to_tile * pdf_point, Point::ZERO);
    }

    #[test]
    fn test_for_page_composes_view_rotation() {
        let page = PageGeometry::new(0, Rect::new(0.0, 0.0, 100.0, 50.0), Rotation::Degrees90);
        let transform = PageTransform::for_page(
            &page,
            Rotation::Degrees90,
            Scale::new(1.0, 72.0, 72.0),
        );
        assert_eq!(transform.rotation(), Rotation::Degrees180);
        assert_eq!(transform.device_rect(), PixelRect::new(0, 0, 100, 50));
    }
}
