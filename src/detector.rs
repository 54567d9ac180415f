use image::{GrayImage, Luma};
use imageproc::contours::{BorderType, find_contours};

use crate::config::constants;
use crate::frame::Frame;

/// How the detector turns a binary bright-region mask into a confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceModel {
    /// Report a fixed estimate whenever at least one region is found.
    Fixed(f32),

    /// Report the fraction of the frame classified as foreground.
    ForegroundCoverage,
}

impl Default for ConfidenceModel {
    fn default() -> Self {
        ConfidenceModel::Fixed(constants::ASSUMED_CONFIDENCE)
    }
}

/// Bright-region fire heuristic.
///
/// Flags a frame when, after luma conversion, a 21x21 Gaussian blur and a hard
/// brightness cutoff, at least one external contour remains. Small specular
/// highlights are smoothed below the cutoff by the blur; a real flame or glow
/// saturates a large enough area to survive it.
///
/// The detector holds no mutable state, so a single instance can be shared
/// across threads and evaluating the same frame twice yields the same verdict.
#[derive(Debug, Clone, Default)]
pub struct FrameAnomalyDetector {
    confidence_model: ConfidenceModel,
}

impl FrameAnomalyDetector {
    /// Create a detector with the given confidence model.
    ///
    /// Fixed confidences are clamped to `0.0..=1.0`.
    pub fn new(confidence_model: ConfidenceModel) -> Self {
        let confidence_model = match confidence_model {
            ConfidenceModel::Fixed(value) => ConfidenceModel::Fixed(value.clamp(0.0, 1.0)),
            other => other,
        };
        Self { confidence_model }
    }

    pub fn confidence_model(&self) -> ConfidenceModel {
        self.confidence_model
    }

    /// Evaluate a single frame.
    ///
    /// A missing or empty frame is not an error; it yields [`Verdict::no_signal`]
    /// so that a flaky camera never interrupts the polling loop.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use fire_guard::{Frame, FrameAnomalyDetector};
    ///
    /// let detector = FrameAnomalyDetector::default();
    /// let dark = Frame::new(image::RgbImage::new(100, 100));
    /// assert!(!detector.evaluate(Some(&dark)).anomaly_detected);
    /// assert!(!detector.evaluate(None).anomaly_detected);
    /// ```
    pub fn evaluate(&self, frame: Option<&Frame>) -> Verdict {
        let Some(frame) = frame.filter(|f| !f.is_empty()) else {
            return Verdict::no_signal();
        };

        let mask = bright_mask(frame);
        let regions = external_regions(&mask);

        if regions.is_empty() {
            return Verdict::no_signal();
        }

        let confidence = match self.confidence_model {
            ConfidenceModel::Fixed(value) => value,
            ConfidenceModel::ForegroundCoverage => foreground_fraction(&mask),
        };

        Verdict {
            anomaly_detected: true,
            confidence: confidence.clamp(0.0, 1.0),
            regions,
        }
    }
}

/// Luma, blur and threshold a frame into a 0/255 mask.
fn bright_mask(frame: &Frame) -> GrayImage {
    let gray = image::imageops::grayscale(frame.pixels());
    let blurred = imageproc::filter::gaussian_blur_f32(&gray, constants::BLUR_SIGMA);

    GrayImage::from_fn(blurred.width(), blurred.height(), |x, y| {
        if blurred.get_pixel(x, y)[0] >= constants::BRIGHTNESS_CUTOFF {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Bounding boxes of the outermost borders in the mask; holes and anything
/// nested inside a hole are skipped.
///
/// The contour tracer misses borders lying on the first column, so the mask
/// is traced inside a one-pixel background frame and the coordinates are
/// shifted back afterwards.
fn external_regions(mask: &GrayImage) -> Vec<BrightRegion> {
    let mut padded = GrayImage::new(mask.width() + 2, mask.height() + 2);
    image::imageops::replace(&mut padded, mask, 1, 1);

    find_contours::<u32>(&padded)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .filter_map(|contour| {
            let min_x = contour.points.iter().map(|p| p.x).min()?;
            let max_x = contour.points.iter().map(|p| p.x).max()?;
            let min_y = contour.points.iter().map(|p| p.y).min()?;
            let max_y = contour.points.iter().map(|p| p.y).max()?;
            Some(BrightRegion {
                x: min_x.saturating_sub(1),
                y: min_y.saturating_sub(1),
                width: max_x - min_x + 1,
                height: max_y - min_y + 1,
            })
        })
        .collect()
}

fn foreground_fraction(mask: &GrayImage) -> f32 {
    let total = mask.width() as u64 * mask.height() as u64;
    if total == 0 {
        return 0.0;
    }
    let lit = mask.pixels().filter(|p| p[0] > 0).count() as u64;
    lit as f32 / total as f32
}

/// Result of evaluating one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether at least one bright region survived blur and threshold.
    pub anomaly_detected: bool,

    /// Confidence estimate from 0.0 to 1.0. Always 0.0 when nothing was detected.
    pub confidence: f32,

    /// Bounding boxes of the detected regions, in frame pixel coordinates.
    pub regions: Vec<BrightRegion>,
}

impl Verdict {
    /// The verdict for a frame that was absent or carried no usable signal.
    pub fn no_signal() -> Self {
        Self {
            anomaly_detected: false,
            confidence: 0.0,
            regions: Vec::new(),
        }
    }

    pub fn region_count(&self) -> usize {
        self.regions.len()
    }

    /// Get the confidence as a percentage.
    pub fn confidence_percent(&self) -> f32 {
        self.confidence * 100.0
    }

    /// True when an anomaly was detected and its confidence is at or above
    /// `sensitivity`.
    pub fn clears(&self, sensitivity: f32) -> bool {
        self.anomaly_detected && self.confidence >= sensitivity
    }
}

/// Axis-aligned bounding box of one bright region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl BrightRegion {
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}
