use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};

use crate::config::constants;
use crate::error::FrameError;
use crate::frame::Frame;

/// Supplies frames on demand.
///
/// Implementations absorb their own failures: a failed fetch or an
/// undecodable payload is logged and reported as `None`, never as an error.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<Frame>;
}

/// Fetches single snapshots from a webcam over HTTP.
///
/// One request per frame; there is no retry. A failed poll simply yields no
/// frame and the next poll tries again.
pub struct WebcamFetcher {
    webcam_url: String,
    flip_image: bool,
    consecutive_failures: u32,
}

impl WebcamFetcher {
    /// Create a new WebcamFetcher.
    ///
    /// # Arguments
    ///
    /// * `webcam_url` - Snapshot endpoint returning a JPEG or PNG
    /// * `flip_image` - Whether to flip every frame vertically
    pub fn new(webcam_url: String, flip_image: bool) -> Self {
        Self {
            webcam_url,
            flip_image,
            consecutive_failures: 0,
        }
    }

    pub fn webcam_url(&self) -> &str {
        &self.webcam_url
    }

    /// Number of failed fetches since the last successful one.
    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Download and decode one frame.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - HTTP request fails
    /// - Server returns non-success status
    /// - The payload is not a decodable image
    pub fn fetch_frame(&self) -> Result<Frame> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(constants::HTTP_TIMEOUT_SECONDS))
            .build()?;

        let download_failed = |reason: String| FrameError::DownloadFailed {
            url: self.webcam_url.clone(),
            reason,
        };

        let response = client
            .get(&self.webcam_url)
            .send()
            .map_err(|e| download_failed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(download_failed(format!("HTTP {}", response.status())).into());
        }

        let data = response
            .bytes()
            .map_err(|e| download_failed(e.to_string()))?;

        let frame = Frame::decode(&data).map_err(|e| FrameError::InvalidFormat {
            url: self.webcam_url.clone(),
            reason: e.to_string(),
        })?;

        Ok(apply_transformations(frame, self.flip_image))
    }
}

impl FrameSource for WebcamFetcher {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.fetch_frame() {
            Ok(frame) => {
                if self.consecutive_failures > 0 {
                    debug!(
                        "Webcam recovered after {} failed fetch(es)",
                        self.consecutive_failures
                    );
                }
                self.consecutive_failures = 0;
                Some(frame)
            }
            Err(e) => {
                self.consecutive_failures += 1;
                warn!(
                    "No frame available (attempt {}): {}",
                    self.consecutive_failures, e
                );
                None
            }
        }
    }
}

/// Apply configured orientation fixes to a freshly decoded frame.
pub fn apply_transformations(frame: Frame, flip_vertical: bool) -> Frame {
    if flip_vertical {
        frame.flipped_vertical()
    } else {
        frame
    }
}
