use anyhow::{Context, Result};
use image::codecs::jpeg::{JpegEncoder, PixelDensity};
use image::RgbImage;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::presets::JPEG_QUALITY;

/// Encode an opaque image as JPEG with the given resolution recorded in the JFIF header
pub fn encode_jpeg<W: Write>(writer: W, image: &RgbImage, dpi: u16) -> Result<()> {
    let mut encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    encoder.set_pixel_density(PixelDensity::dpi(dpi));
    encoder
        .encode_image(image)
        .context("Failed to encode JPEG")?;
    Ok(())
}

/// Write a derivative to `path`, creating its parent directory if needed
pub fn save_jpeg(image: &RgbImage, dpi: u16, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {}", parent.display()))?;
    }

    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    encode_jpeg(&mut writer, image, dpi)
        .with_context(|| format!("Failed to save JPEG: {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush JPEG: {}", path.display()))?;
    Ok(())
}

/// Resolution unit stored in a JFIF APP0 segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DensityUnit {
    AspectOnly,
    Inch,
    Centimeter,
}

/// Pixel density read back from a JPEG file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegDensity {
    pub x: u16,
    pub y: u16,
    pub unit: DensityUnit,
}

impl JpegDensity {
    /// Horizontal dots per inch, when the unit allows it
    pub fn dpi(&self) -> Option<u16> {
        match self.unit {
            DensityUnit::Inch => Some(self.x),
            DensityUnit::Centimeter => Some((self.x as f64 * 2.54).round() as u16),
            DensityUnit::AspectOnly => None,
        }
    }
}

/// Read the JFIF density from the start of a JPEG stream
///
/// Returns `None` when the data is not JPEG or carries no JFIF APP0 segment.
pub fn read_jfif_density(data: &[u8]) -> Option<JpegDensity> {
    if data.len() < 4 || data[0] != 0xFF || data[1] != 0xD8 {
        return None;
    }

    let mut pos = 2;
    while pos + 4 <= data.len() {
        if data[pos] != 0xFF {
            return None;
        }
        let marker = data[pos + 1];
        let length = u16::from_be_bytes([data[pos + 2], data[pos + 3]]) as usize;
        let segment_start = pos + 4;
        let segment_end = pos + 2 + length;
        if length < 2 || segment_end > data.len() {
            return None;
        }

        // APP0 with "JFIF\0": version(2) units(1) xdensity(2) ydensity(2)
        if marker == 0xE0 && length >= 14 && &data[segment_start..segment_start + 5] == b"JFIF\0" {
            let units = data[segment_start + 7];
            let x = u16::from_be_bytes([data[segment_start + 8], data[segment_start + 9]]);
            let y = u16::from_be_bytes([data[segment_start + 10], data[segment_start + 11]]);
            let unit = match units {
                1 => DensityUnit::Inch,
                2 => DensityUnit::Centimeter,
                _ => DensityUnit::AspectOnly,
            };
            return Some(JpegDensity { x, y, unit });
        }

        // Stop at start-of-scan; metadata segments all come before it
        if marker == 0xDA {
            return None;
        }
        pos = segment_end;
    }

    None
}

/// Dimensions and density of a JPEG file on disk
pub fn inspect_jpeg(path: &Path) -> Result<((u32, u32), Option<JpegDensity>)> {
    let data = std::fs::read(path)
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    let img = image::load_from_memory(&data)
        .with_context(|| format!("Failed to decode image: {}", path.display()))?;
    Ok(((img.width(), img.height()), read_jfif_density(&data)))
}
