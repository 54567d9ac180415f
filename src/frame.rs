use anyhow::Result;
use image::RgbImage;

/// A single decoded webcam frame.
///
/// Samples are always stored in RGB order, 8 bits per channel. Frames are
/// produced by a [`FrameSource`](crate::image_fetcher::FrameSource), evaluated
/// once and then dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pixels: RgbImage,
}

impl Frame {
    /// Wrap an already decoded RGB raster.
    pub fn new(pixels: RgbImage) -> Self {
        Self { pixels }
    }

    /// Decode a frame from encoded image bytes (JPEG, PNG, ...).
    ///
    /// # Errors
    ///
    /// Returns an error if the format is not recognised or the payload is corrupted.
    pub fn decode(image_data: &[u8]) -> Result<Self> {
        let dynamic_image = image::load_from_memory(image_data)?;
        Ok(Self::new(dynamic_image.to_rgb8()))
    }

    /// Return a vertically flipped copy, for cameras mounted upside-down.
    pub fn flipped_vertical(&self) -> Self {
        Self::new(image::imageops::flip_vertical(&self.pixels))
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// True when the frame has no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Borrow the underlying RGB raster.
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}
