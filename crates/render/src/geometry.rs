//! Page geometry and device-pixel rectangles
//!
//! PDF space has its origin at the bottom-left of the page with the y-axis
//! pointing up, measured in points (1/72 inch). Device space has its origin
//! at the top-left with the y-axis pointing down, measured in pixels.

use kurbo::{Rect, Size};

/// Page rotation, restricted to clockwise quarter turns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Rotation {
    /// Upright
    #[default]
    None,

    /// 90 degrees clockwise
    Degrees90,

    /// Upside down
    Degrees180,

    /// 270 degrees clockwise
    Degrees270,
}

impl Rotation {
    /// Build a rotation from a degree value.
    ///
    /// Values are normalized into `0..360`; anything that is not a quarter
    /// turn falls back to `Rotation::None`.
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Degrees90,
            180 => Rotation::Degrees180,
            270 => Rotation::Degrees270,
            _ => Rotation::None,
        }
    }

    /// Rotation in degrees (0, 90, 180, 270)
    pub fn degrees(self) -> i32 {
        match self {
            Rotation::None => 0,
            Rotation::Degrees90 => 90,
            Rotation::Degrees180 => 180,
            Rotation::Degrees270 => 270,
        }
    }

    /// Apply `other` on top of this rotation
    pub fn compose(self, other: Rotation) -> Self {
        Self::from_degrees(self.degrees() + other.degrees())
    }

    /// Whether width and height trade places under this rotation
    pub fn is_sideways(self) -> bool {
        matches!(self, Rotation::Degrees90 | Rotation::Degrees270)
    }
}

/// Geometry of a single page as reported by the document
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    /// Page index (0-based)
    pub index: usize,

    /// Crop box in PDF units (`x0`/`y0` = left/bottom, `x1`/`y1` = right/top)
    pub crop_box: Rect,

    /// Rotation the page asks to be displayed with
    pub rotation: Rotation,
}

impl PageGeometry {
    /// Create page geometry; the crop box is normalized so `x0 <= x1` and `y0 <= y1`
    pub fn new(index: usize, crop_box: Rect, rotation: Rotation) -> Self {
        Self {
            index,
            crop_box: crop_box.abs(),
            rotation,
        }
    }

    /// Crop box width in PDF units
    pub fn width(&self) -> f64 {
        self.crop_box.width()
    }

    /// Crop box height in PDF units
    pub fn height(&self) -> f64 {
        self.crop_box.height()
    }

    /// Crop box size as seen after applying `rotation`, in PDF units
    pub fn rotated_size(&self, rotation: Rotation) -> Size {
        if rotation.is_sideways() {
            Size::new(self.height(), self.width())
        } else {
            Size::new(self.width(), self.height())
        }
    }
}

/// Integer rectangle in device pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`
    pub fn right(&self) -> i32 {
        self.x.saturating_add_unsigned(self.width)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`
    pub fn bottom(&self) -> i32 {
        self.y.saturating_add_unsigned(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Overlapping region, or `None` when the rectangles only touch or are disjoint
    pub fn intersect(&self, other: &PixelRect) -> Option<PixelRect> {
        let x0 = self.x.max(other.x);
        let y0 = self.y.max(other.y);
        let x1 = self.right().min(other.right());
        let y1 = self.bottom().min(other.bottom());

        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        Some(PixelRect::new(x0, y0, x1.abs_diff(x0), y1.abs_diff(y0)))
    }

    /// Smallest pixel rectangle covering a floating-point rectangle
    ///
    /// Coordinates outside the `i32` range are clamped to it.
    pub fn enclosing(rect: Rect) -> PixelRect {
        let rect = rect.abs();
        let x0 = rect.x0.floor() as i32;
        let y0 = rect.y0.floor() as i32;
        let x1 = (rect.x1.ceil() as i32).max(x0);
        let y1 = (rect.y1.ceil() as i32).max(y0);
        PixelRect::new(x0, y0, x1.abs_diff(x0), y1.abs_diff(y0))
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(
            self.x as f64,
            self.y as f64,
            self.right() as f64,
            self.bottom() as f64,
        )
    }
}

/// Whether two rectangles share interior area (touching edges do not count)
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}
