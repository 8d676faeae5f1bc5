use anyhow::{Context, Result};
use image::{imageops, RgbaImage};

use super::resize::resize_image;
use super::subject::BoundingBox;

/// Crop `img` to `region` and rescale the crop to exactly `target_height` pixels tall
///
/// The region is clipped to the image first; a region that misses the image entirely is an
/// error. Width follows the aspect ratio of the clipped crop, not of the source.
pub fn crop_and_scale(img: &RgbaImage, region: &BoundingBox, target_height: u32) -> Result<RgbaImage> {
    if target_height == 0 {
        return Err(anyhow::anyhow!("Target height must be greater than 0"));
    }

    let (img_width, img_height) = img.dimensions();
    let (x, y, width, height) = region.clip_to(img_width, img_height).ok_or_else(|| {
        anyhow::anyhow!(
            "Crop region ({},{},{}x{}) lies outside the {}x{} image",
            region.x,
            region.y,
            region.width,
            region.height,
            img_width,
            img_height
        )
    })?;

    let cropped = imageops::crop_imm(img, x, y, width, height).to_image();

    let (new_width, new_height) = scaled_size(width, height, target_height);
    resize_image(&cropped, new_width, new_height)
        .with_context(|| format!("Failed to scale crop to height {}", target_height))
}

/// Size of a `width` x `height` crop scaled to `target_height`
pub fn scaled_size(width: u32, height: u32, target_height: u32) -> (u32, u32) {
    let scale_y = target_height as f64 / height as f64;
    let new_width = ((width as f64 * scale_y).round() as u32).max(1);
    (new_width, target_height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn create_test_image(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        })
    }

    #[test]
    fn test_output_height_is_exact() {
        let img = create_test_image(400, 300);
        for target in [155, 420, 1800, 2100] {
            let out = crop_and_scale(&img, &BoundingBox::new(50, 20, 123, 211), target).unwrap();
            assert_eq!(out.height(), target);
        }
    }

    #[test]
    fn test_width_follows_crop_aspect() {
        let img = create_test_image(400, 300);
        // 100x200 crop -> height 420 -> width 210
        let out = crop_and_scale(&img, &BoundingBox::new(10, 10, 100, 200), 420).unwrap();
        assert_eq!(out.dimensions(), (210, 420));
    }

    #[test]
    fn test_negative_origin_is_clipped() {
        let img = create_test_image(200, 200);
        // Headroom shift pushes y to -40; the crop keeps rows 0..60
        let region = BoundingBox::new(20, 0, 60, 100).shifted_up(40);
        let out = crop_and_scale(&img, &region, 120).unwrap();
        assert_eq!(out.dimensions(), (120, 120));
    }

    #[test]
    fn test_region_outside_image_fails() {
        let img = create_test_image(100, 100);
        let result = crop_and_scale(&img, &BoundingBox::new(150, 0, 10, 10), 100);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_target_height_fails() {
        let img = create_test_image(100, 100);
        assert!(crop_and_scale(&img, &BoundingBox::new(0, 0, 10, 10), 0).is_err());
    }

    #[test]
    fn test_scaled_size_rounds_width() {
        assert_eq!(scaled_size(333, 1000, 155), (52, 155));
        assert_eq!(scaled_size(1, 1000, 10), (1, 10));
    }
}
