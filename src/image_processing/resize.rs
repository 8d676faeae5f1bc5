use anyhow::{Context, Result};
use fast_image_resize::{images::Image, FilterType, PixelType, ResizeAlg, ResizeOptions, Resizer};
use image::RgbaImage;

use super::presets::ZOOM_PASSES;

/// Compute the largest size with the source aspect ratio that fits inside `max_width` x `max_height`
///
/// Scales up as well as down. Each side is rounded to the nearest pixel, never drops below 1,
/// and never exceeds its bound.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    let ratio_x = max_width as f64 / width as f64;
    let ratio_y = max_height as f64 / height as f64;
    let ratio = ratio_x.min(ratio_y);

    let new_width = ((width as f64 * ratio).round() as u32).clamp(1, max_width.max(1));
    let new_height = ((height as f64 * ratio).round() as u32).clamp(1, max_height.max(1));

    (new_width, new_height)
}

/// Proportionally scale an image so it fits inside the given bounds
pub fn scale_to_fit(img: &RgbaImage, max_width: u32, max_height: u32) -> Result<RgbaImage> {
    let (width, height) = img.dimensions();
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("Cannot scale an empty {}x{} image", width, height));
    }
    if max_width == 0 || max_height == 0 {
        return Err(anyhow::anyhow!(
            "Scale bounds must be non-zero, got {}x{}",
            max_width,
            max_height
        ));
    }

    let (new_width, new_height) = fit_dimensions(width, height, max_width, max_height);
    resize_image(img, new_width, new_height)
}

/// Uniformly enlarge an image by `zoom_factor` in successive Lanczos passes
///
/// The final size truncates (`floor(w * zoom)`). Intermediate passes step toward it with
/// geometrically spaced sizes so no single pass carries the whole enlargement.
pub fn zoom_image(img: &RgbaImage, zoom_factor: f32) -> Result<RgbaImage> {
    if !zoom_factor.is_finite() || zoom_factor <= 0.0 {
        return Err(anyhow::anyhow!("Invalid zoom factor: {}", zoom_factor));
    }

    let (width, height) = img.dimensions();
    let target_width = ((width as f64 * zoom_factor as f64) as u32).max(1);
    let target_height = ((height as f64 * zoom_factor as f64) as u32).max(1);

    let mut current = img.clone();
    for pass in 1..=ZOOM_PASSES {
        let (pass_width, pass_height) = if pass == ZOOM_PASSES {
            (target_width, target_height)
        } else {
            let t = pass as f64 / ZOOM_PASSES as f64;
            (
                step_toward(width, target_width, t),
                step_toward(height, target_height, t),
            )
        };

        if current.dimensions() != (pass_width, pass_height) {
            current = resize_image(&current, pass_width, pass_height)
                .with_context(|| format!("Zoom pass {} of {} failed", pass, ZOOM_PASSES))?;
        }
    }

    Ok(current)
}

/// Size at fraction `t` of a geometric progression from `from` to `to`
fn step_toward(from: u32, to: u32, t: f64) -> u32 {
    let ratio = to as f64 / from as f64;
    ((from as f64 * ratio.powf(t)).round() as u32).max(1)
}

/// Resize an image to exact dimensions using Lanczos3 convolution
pub fn resize_image(img: &RgbaImage, width: u32, height: u32) -> Result<RgbaImage> {
    let (src_width, src_height) = img.dimensions();

    if src_width == width && src_height == height {
        return Ok(img.clone());
    }
    if src_width == 0 || src_height == 0 {
        return Err(anyhow::anyhow!("Source image is empty"));
    }
    if width == 0 || height == 0 {
        return Err(anyhow::anyhow!("Target size {}x{} has a zero side", width, height));
    }

    let src_image = Image::from_vec_u8(src_width, src_height, img.as_raw().clone(), PixelType::U8x4)
        .context("Failed to wrap source pixels for resizing")?;
    let mut dst_image = Image::new(width, height, PixelType::U8x4);

    // Alpha-aware Lanczos: fast_image_resize premultiplies U8x4 before convolving
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(FilterType::Lanczos3));
    let mut resizer = Resizer::new();
    resizer
        .resize(&src_image, &mut dst_image, &options)
        .with_context(|| {
            format!(
                "Failed to resize {}x{} to {}x{}",
                src_width, src_height, width, height
            )
        })?;

    RgbaImage::from_raw(width, height, dst_image.buffer().to_vec())
        .ok_or_else(|| anyhow::anyhow!("Resized buffer does not match {}x{}", width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};

    fn create_test_image(width: u32, height: u32) -> RgbaImage {
        ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    #[test]
    fn test_fit_dimensions_respects_bounds_and_aspect() {
        let cases = [
            (4000, 3000, 4000, 4000),
            (1000, 3000, 4000, 4000),
            (640, 480, 4000, 4000),
            (123, 457, 300, 420),
            (2100, 1800, 120, 155),
            (7, 1, 50, 50),
        ];

        for (w, h, max_w, max_h) in cases {
            let (nw, nh) = fit_dimensions(w, h, max_w, max_h);
            assert!(nw <= max_w && nh <= max_h, "{}x{} -> {}x{}", w, h, nw, nh);
            assert!(nw == max_w || nh == max_h, "{}x{} -> {}x{} touches no bound", w, h, nw, nh);

            let before = w as f64 / h as f64;
            let after = nw as f64 / nh as f64;
            // One pixel of rounding on the short side bounds the aspect drift
            let tolerance = before / nh.min(nw) as f64 + 1e-9;
            assert!((before - after).abs() <= tolerance.max(0.02), "aspect drift {} vs {}", before, after);
        }
    }

    #[test]
    fn test_fit_dimensions_upscales_small_images() {
        assert_eq!(fit_dimensions(400, 300, 4000, 4000), (4000, 3000));
    }

    #[test]
    fn test_scale_to_fit() {
        let img = create_test_image(200, 100);
        let scaled = scale_to_fit(&img, 50, 50).unwrap();
        assert_eq!(scaled.dimensions(), (50, 25));
    }

    #[test]
    fn test_scale_to_fit_rejects_zero_bounds() {
        let img = create_test_image(20, 10);
        assert!(scale_to_fit(&img, 0, 10).is_err());
    }

    #[test]
    fn test_resize_image() {
        let img = create_test_image(100, 100);
        let resized = resize_image(&img, 50, 70).unwrap();
        assert_eq!(resized.dimensions(), (50, 70));
    }

    #[test]
    fn test_resize_preserves_transparency() {
        let img = RgbaImage::from_pixel(40, 40, Rgba([10, 20, 30, 0]));
        let resized = resize_image(&img, 13, 17).unwrap();
        assert!(resized.pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn test_zoom_truncates_target_size() {
        let img = create_test_image(101, 57);
        let zoomed = zoom_image(&img, 1.1).unwrap();
        assert_eq!(zoomed.dimensions(), (111, 62));

        let zoomed = zoom_image(&img, 1.2).unwrap();
        assert_eq!(zoomed.dimensions(), (121, 68));
    }

    #[test]
    fn test_zoom_rejects_bad_factor() {
        let img = create_test_image(10, 10);
        assert!(zoom_image(&img, 0.0).is_err());
        assert!(zoom_image(&img, f32::NAN).is_err());
    }

    #[test]
    fn test_step_toward_endpoints() {
        assert_eq!(step_toward(100, 133, 0.0), 100);
        assert_eq!(step_toward(100, 133, 1.0), 133);
        let mid = step_toward(100, 133, 0.5);
        assert!(mid > 100 && mid < 133);
    }
}
