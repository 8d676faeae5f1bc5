use anyhow::Result;
#[cfg(feature = "face-detection")]
use anyhow::Context;
use image::GrayImage;
#[cfg(feature = "face-detection")]
use std::path::Path;

/// Face candidate in the coordinates of the image handed to the detector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    /// Detector-specific score, higher is more confident
    pub score: f64,
}

impl FaceBox {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Horizontal center, rounded down
    pub fn center_x(&self) -> i64 {
        self.x as i64 + (self.width / 2) as i64
    }
}

/// Pluggable face detection backend
///
/// Implementations take a grayscale image and return every candidate they find; ranking
/// is done by the caller so backends can be swapped freely.
pub trait FaceDetector: Send + Sync {
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceBox>>;
}

/// Pick the largest candidate by area; the earliest wins a tie
pub fn largest_face(faces: &[FaceBox]) -> Option<FaceBox> {
    faces.iter().fold(None, |best: Option<FaceBox>, face| match best {
        Some(b) if face.area() <= b.area() => Some(b),
        _ => Some(*face),
    })
}

/// Tuning for the SeetaFace cascade, biased toward recall
#[cfg(feature = "face-detection")]
#[derive(Debug, Clone, Copy)]
struct SeetaParams {
    min_face_size: u32,
    score_thresh: f64,
    pyramid_scale_factor: f32,
    slide_window_step: (u32, u32),
}

#[cfg(feature = "face-detection")]
impl Default for SeetaParams {
    fn default() -> Self {
        Self {
            min_face_size: 20,
            score_thresh: 2.0,
            pyramid_scale_factor: 0.9,
            slide_window_step: (4, 4),
        }
    }
}

/// Frontal face detector backed by `rustface` (SeetaFace engine)
#[cfg(feature = "face-detection")]
pub struct RustfaceDetector {
    model: rustface::Model,
    params: SeetaParams,
}

#[cfg(feature = "face-detection")]
impl RustfaceDetector {
    /// Load a SeetaFace model file such as `seeta_fd_frontal_v1.0.bin`
    pub fn from_model_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open face model: {}", path.display()))?;
        let model = rustface::read_model(std::io::BufReader::new(file))
            .with_context(|| format!("Failed to parse face model: {}", path.display()))?;

        Ok(Self {
            model,
            params: SeetaParams::default(),
        })
    }
}

#[cfg(feature = "face-detection")]
impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &GrayImage) -> Result<Vec<FaceBox>> {
        // rustface detectors are stateful, so build one per call from the shared model
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.params.min_face_size);
        detector.set_score_thresh(self.params.score_thresh);
        detector.set_pyramid_scale_factor(self.params.pyramid_scale_factor);
        detector.set_slide_window_step(self.params.slide_window_step.0, self.params.slide_window_step.1);

        let (width, height) = gray.dimensions();
        let faces = detector.detect(&rustface::ImageData::new(gray.as_raw(), width, height));

        Ok(faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x(),
                    y: bbox.y(),
                    width: bbox.width(),
                    height: bbox.height(),
                    score: face.score(),
                }
            })
            .collect())
    }
}
