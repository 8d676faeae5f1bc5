//! Horizontal face centering on a fixed-size white canvas
//!
//! The subject crop arrives already scaled to the canvas height. This stage optionally zooms
//! it, finds where its horizontal center should be (largest face, or the geometric middle),
//! translates it horizontally into a `canvas_width` x `canvas_height` frame, and flattens the
//! result over opaque white.

use anyhow::{Context, Result};
use image::{imageops, GrayImage, Rgba, RgbaImage, RgbImage};

use super::face_detection::{largest_face, FaceDetector};
use super::resize::zoom_image;

/// Canvas and framing parameters for one derivative
#[derive(Debug, Clone, Copy)]
pub struct CenterOptions {
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub target_dpi: u16,
    pub zoom: bool,
    pub zoom_factor: f32,
}

/// How the horizontal anchor was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CenterAnchor {
    Face,
    Geometric,
}

/// Opaque canvas ready for encoding
#[derive(Debug, Clone)]
pub struct CenteredImage {
    pub image: RgbImage,
    pub dpi: u16,
    pub anchor: CenterAnchor,
    /// Horizontal shift applied to the (zoomed) subject, in pixels
    pub translation_x: i64,
    /// Subject columns with visible pixels that fell outside the canvas
    pub clipped_columns: u32,
}

#[derive(Debug, Clone)]
pub enum CenterOutcome {
    Centered(CenteredImage),
    /// Face detection was requested and found nothing; the derivative needs a manual crop
    NoFace,
}

/// Center `subject` on a white canvas
///
/// With `detector` set, the largest detected face anchors the translation and an empty
/// detection yields [`CenterOutcome::NoFace`]. Without it, the subject's middle column is used.
pub fn center_on_canvas(
    subject: &RgbaImage,
    options: &CenterOptions,
    detector: Option<&dyn FaceDetector>,
) -> Result<CenterOutcome> {
    if options.canvas_width == 0 || options.canvas_height == 0 {
        return Err(anyhow::anyhow!(
            "Canvas size must be non-zero, got {}x{}",
            options.canvas_width,
            options.canvas_height
        ));
    }

    // Stage 1: optional zoom
    let image = if options.zoom {
        zoom_image(subject, options.zoom_factor).context("Failed to zoom subject")?
    } else {
        subject.clone()
    };

    // Stage 2: find the horizontal anchor
    let (anchor_x, anchor) = match detector {
        Some(detector) => {
            let gray = grayscale_over_white(&image);
            let faces = detector.detect(&gray).context("Face detection failed")?;
            match largest_face(&faces) {
                Some(face) => (face.center_x(), CenterAnchor::Face),
                None => return Ok(CenterOutcome::NoFace),
            }
        }
        None => ((image.width() / 2) as i64, CenterAnchor::Geometric),
    };

    // Stage 3: horizontal-only translation into the canvas frame
    let translation_x = (options.canvas_width / 2) as i64 - anchor_x;
    let clipped_columns = clipped_columns(&image, translation_x, options.canvas_width);
    let warped = translate_into_canvas(&image, translation_x, options.canvas_width, options.canvas_height);

    // Stage 4: flatten over opaque white
    let flattened = composite_on_white(&warped, options.canvas_width, options.canvas_height);

    Ok(CenterOutcome::Centered(CenteredImage {
        image: flattened,
        dpi: options.target_dpi,
        anchor,
        translation_x,
        clipped_columns,
    }))
}

/// Place `image` shifted by `translation_x` into a transparent canvas of fixed size
///
/// Pixels moved outside the canvas are dropped; uncovered canvas stays transparent.
pub fn translate_into_canvas(image: &RgbaImage, translation_x: i64, width: u32, height: u32) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    imageops::replace(&mut canvas, image, translation_x, 0);
    canvas
}

/// Alpha-composite `layer` onto a white canvas, centered by the size difference
pub fn composite_on_white(layer: &RgbaImage, width: u32, height: u32) -> RgbImage {
    let mut background = RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255]));

    let x = (width as i64 - layer.width() as i64) / 2;
    let y = (height as i64 - layer.height() as i64) / 2;
    imageops::overlay(&mut background, layer, x, y);

    image::DynamicImage::ImageRgba8(background).to_rgb8()
}

/// Grayscale view of the subject as it will appear on the white canvas
pub fn grayscale_over_white(image: &RgbaImage) -> GrayImage {
    let flattened = composite_on_white(image, image.width(), image.height());
    image::DynamicImage::ImageRgb8(flattened).to_luma8()
}

/// Count source columns holding visible pixels that land outside `[0, canvas_width)`
fn clipped_columns(image: &RgbaImage, translation_x: i64, canvas_width: u32) -> u32 {
    let (width, height) = image.dimensions();

    (0..width)
        .filter(|&x| {
            let dest = x as i64 + translation_x;
            dest < 0 || dest >= canvas_width as i64
        })
        .filter(|&x| (0..height).any(|y| image.get_pixel(x, y)[3] > 0))
        .count() as u32
}
