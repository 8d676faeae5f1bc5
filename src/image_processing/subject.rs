use image::{DynamicImage, GrayImage, Luma, RgbaImage};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::point::Point;

use super::presets::ALPHA_THRESHOLD;

/// Axis-aligned rectangle in source pixel coordinates
///
/// `x`/`y` are signed so that offsets such as the headroom shift can move the origin
/// above or left of the image before the rectangle is clipped for cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    pub fn new(x: i64, y: i64, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Same box moved up by `offset` pixels, keeping its size
    pub fn shifted_up(&self, offset: i64) -> Self {
        Self {
            y: self.y - offset,
            ..*self
        }
    }

    /// Intersection with a `width` x `height` image, or `None` when they do not overlap
    pub fn clip_to(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.max(0);
        let top = self.y.max(0);
        let right = (self.x + self.width as i64).min(width as i64);
        let bottom = (self.y + self.height as i64).min(height as i64);

        if right <= left || bottom <= top {
            return None;
        }

        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }
}

/// Locate the subject of a transparent-background portrait
///
/// Returns `None` when the image has no alpha channel or holds no foreground pixels.
pub fn locate_subject(img: &DynamicImage) -> Option<BoundingBox> {
    if !img.color().has_alpha() {
        return None;
    }
    locate_in_alpha(&img.to_rgba8())
}

/// Bounding box of the largest external contour of the alpha mask
pub fn locate_in_alpha(img: &RgbaImage) -> Option<BoundingBox> {
    // The tracer only opens an outer border after a background pixel, so the mask
    // gets a one-pixel background frame and the box is shifted back afterwards
    let mask = framed(&alpha_mask(img));

    let contours: Vec<Contour<i32>> = find_contours(&mask);

    // Outer borders with no parent are the external contours
    let largest = contours
        .iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .fold(None::<(&Contour<i32>, f64)>, |best, contour| {
            let area = contour_area(&contour.points);
            match best {
                Some((_, best_area)) if area <= best_area => best,
                _ => Some((contour, area)),
            }
        })?;

    let bbox = bounding_rect(&largest.0.points)?;
    Some(BoundingBox::new(bbox.x - 1, bbox.y - 1, bbox.width, bbox.height))
}

/// Copy of `mask` surrounded by a one-pixel background border
fn framed(mask: &GrayImage) -> GrayImage {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);
    padded
}

/// Binary mask: 255 where alpha exceeds the threshold, 0 elsewhere
pub fn alpha_mask(img: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(img.width(), img.height(), |x, y| {
        if img.get_pixel(x, y)[3] > ALPHA_THRESHOLD {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Polygon area enclosed by a traced contour (shoelace formula)
fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }

    let twice_area: i64 = points
        .iter()
        .zip(points.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    twice_area.abs() as f64 / 2.0
}

/// Inclusive bounding rectangle of a point set
fn bounding_rect(points: &[Point<i32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);

    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }

    Some(BoundingBox::new(
        min_x as i64,
        min_y as i64,
        (max_x - min_x + 1) as u32,
        (max_y - min_y + 1) as u32,
    ))
}
