use std::time::Duration;

use anyhow::Result;
use log::{info, warn};

use crate::config::constants;
use crate::error::PrinterError;

/// Anything that can pause the active print.
pub trait PrintController {
    /// Pause the active print job, recording why.
    fn pause_print(&self, reason: &str) -> Result<()>;
}

/// Subset of Moonraker's printer status used to track activity.
#[derive(Debug, Clone, PartialEq)]
pub struct PrinterSnapshot {
    /// `print_stats.state`: standby, printing, paused, complete, cancelled or error.
    pub state: String,

    /// Extruder target temperature in °C; zero when the heater is off.
    pub extruder_target: f64,
}

impl PrinterSnapshot {
    /// Parse a Moonraker `printer/objects/query` response.
    pub fn from_status(status: &serde_json::Value) -> Self {
        let objects = &status["result"]["status"];
        Self {
            state: objects["print_stats"]["state"]
                .as_str()
                .unwrap_or("unknown")
                .to_string(),
            extruder_target: objects["extruder"]["target"].as_f64().unwrap_or(0.0),
        }
    }

    /// True while a job is printing or paused.
    pub fn has_active_job(&self) -> bool {
        matches!(self.state.as_str(), "printing" | "paused")
    }
}

/// Printer control service for interacting with the Moonraker API.
pub struct PrinterService {
    pub api_url: String,
}

impl PrinterService {
    /// Create a new PrinterService with the provided Moonraker API URL.
    ///
    /// # Arguments
    ///
    /// * `api_url` - Base URL for the Moonraker API (e.g., "http://printer.local:7125")
    ///
    pub fn new(api_url: String) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
        }
    }

    fn client() -> Result<reqwest::blocking::Client> {
        Ok(reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(constants::HTTP_TIMEOUT_SECONDS))
            .build()?)
    }

    /// Query the print state and extruder target.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The HTTP request fails
    /// - The Moonraker API returns an error status
    /// - JSON parsing fails
    pub fn get_printer_status(&self) -> Result<PrinterSnapshot> {
        let endpoint = format!("{}/printer/objects/query?print_stats&extruder", self.api_url);
        let response = Self::client()?
            .get(&endpoint)
            .send()
            .map_err(|e| PrinterError::ConnectionFailed {
                api_url: self.api_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PrinterError::ApiError {
                endpoint,
                status: response.status().as_u16(),
                message: "failed to query printer status".to_string(),
            }
            .into());
        }

        let status: serde_json::Value = response.json()?;
        Ok(PrinterSnapshot::from_status(&status))
    }
}

impl PrintController for PrinterService {
    /// Sends a pause command to Moonraker. Moonraker has no field for a pause
    /// reason, so the reason is logged locally.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Moonraker rejects it, e.g.
    /// because nothing is printing.
    fn pause_print(&self, reason: &str) -> Result<()> {
        let endpoint = format!("{}/printer/print/pause", self.api_url);
        let response = Self::client()?
            .post(&endpoint)
            .send()
            .map_err(|e| PrinterError::ConnectionFailed {
                api_url: self.api_url.clone(),
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            warn!("Pause request rejected with HTTP {}", status);
            return Err(PrinterError::ApiError {
                endpoint,
                status,
                message: "failed to pause print".to_string(),
            }
            .into());
        }

        info!("Print paused: {}", reason);
        Ok(())
    }
}
