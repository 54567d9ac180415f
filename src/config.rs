use std::str::FromStr;

use crate::detector::ConfidenceModel;
use crate::error::ConfigError;

/// Which channel fire alerts are delivered through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyChannel {
    Pushbullet,
    Discord,
    Email,
}

impl FromStr for NotifyChannel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pushbullet" => Ok(NotifyChannel::Pushbullet),
            "discord" => Ok(NotifyChannel::Discord),
            "email" | "smtp" => Ok(NotifyChannel::Email),
            other => Err(format!(
                "unknown channel '{}' (expected pushbullet, discord or email)",
                other
            )),
        }
    }
}

/// SMTP settings for the email channel.
///
/// Every field is optional at load time; a missing field is reported by the
/// email sink when an alert is about to be sent, not at startup.
#[derive(Debug, Clone, Default)]
pub struct SmtpSettings {
    pub server: Option<String>,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Configuration for the fire guard daemon loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Snapshot URL of the webcam watching the printer.
    /// Environment variable: `WEBCAM_URL`
    pub webcam_url: String,

    /// Moonraker API URL used to query printer state and pause prints.
    /// Environment variable: `MOONRAKER_API_URL`
    pub moonraker_api_url: String,

    /// Minimum verdict confidence required before notifying and pausing.
    ///
    /// This does not change how pixels are classified; see
    /// [`constants::BRIGHTNESS_CUTOFF`].
    /// Environment variable: `THRESHOLD_SENSITIVITY`
    pub threshold_sensitivity: f32,

    /// Environment variable: `NOTIFY_CHANNEL`
    pub notify_channel: NotifyChannel,

    /// Environment variable: `PUSHBULLET_API_KEY`
    pub pushbullet_api_key: Option<String>,

    /// Environment variable: `DISCORD_WEBHOOK`
    pub discord_webhook: Option<String>,

    /// Environment variables: `SMTP_SERVER`, `SMTP_PORT`, `SMTP_USERNAME`,
    /// `SMTP_PASSWORD`, `SMTP_FROM`, `SMTP_TO`
    pub smtp: SmtpSettings,

    /// Environment variable: `CONFIDENCE_MODEL` (`fixed` or `coverage`)
    pub confidence_model: ConfidenceModel,

    /// Seconds between polls.
    /// Environment variable: `POLL_INTERVAL_SECONDS`
    pub poll_interval_seconds: u64,

    /// Seconds during which a repeat detection is ignored after a trigger.
    /// Zero means every detecting poll triggers again.
    /// Environment variable: `COOLDOWN_SECONDS`
    pub cooldown_seconds: u64,

    /// Whether to flip webcam frames vertically.
    /// Environment variable: `FLIP_IMAGE`
    pub flip_image: bool,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `WEBCAM_URL` or `MOONRAKER_API_URL` is missing, or if
    /// any set variable cannot be parsed. `THRESHOLD_SENSITIVITY` must lie in
    /// `0.0..=1.0`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup.
    ///
    /// `load` uses the process environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnvVar {
                    var_name: key.to_string(),
                })
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let webcam_url = required("WEBCAM_URL")?;
        let moonraker_api_url = required("MOONRAKER_API_URL")?;

        let threshold_sensitivity: f32 = parse_or(&lookup, "THRESHOLD_SENSITIVITY", 0.5)?;
        if !(0.0..=1.0).contains(&threshold_sensitivity) {
            return Err(ConfigError::InvalidValue {
                field: "THRESHOLD_SENSITIVITY".to_string(),
                value: threshold_sensitivity.to_string(),
                reason: "must be between 0.0 and 1.0".to_string(),
            });
        }

        let notify_channel = parse_or(&lookup, "NOTIFY_CHANNEL", NotifyChannel::Pushbullet)?;

        let confidence_model = match optional("CONFIDENCE_MODEL")
            .map(|v| v.trim().to_ascii_lowercase())
            .as_deref()
        {
            None | Some("fixed") => ConfidenceModel::default(),
            Some("coverage") => ConfidenceModel::ForegroundCoverage,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    field: "CONFIDENCE_MODEL".to_string(),
                    value: other.to_string(),
                    reason: "expected 'fixed' or 'coverage'".to_string(),
                });
            }
        };

        let smtp = SmtpSettings {
            server: optional("SMTP_SERVER"),
            port: parse_or(&lookup, "SMTP_PORT", constants::DEFAULT_SMTP_PORT)?,
            username: optional("SMTP_USERNAME"),
            password: optional("SMTP_PASSWORD"),
            from: optional("SMTP_FROM"),
            to: optional("SMTP_TO"),
        };

        Ok(Config {
            webcam_url,
            moonraker_api_url,
            threshold_sensitivity,
            notify_channel,
            pushbullet_api_key: optional("PUSHBULLET_API_KEY"),
            discord_webhook: optional("DISCORD_WEBHOOK"),
            smtp,
            confidence_model,
            poll_interval_seconds: parse_or(
                &lookup,
                "POLL_INTERVAL_SECONDS",
                constants::DEFAULT_POLL_INTERVAL_SECONDS,
            )?,
            cooldown_seconds: parse_or(&lookup, "COOLDOWN_SECONDS", 0)?,
            flip_image: parse_or(&lookup, "FLIP_IMAGE", false)?,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue {
                field: key.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

/// Application constants used throughout the system.
pub mod constants {
    /// Luma value at or above which a blurred pixel counts as bright.
    ///
    /// Pixel classification always uses this fixed cutoff. The user-facing
    /// `THRESHOLD_SENSITIVITY` only gates whether a verdict is acted upon, so
    /// lowering it does not make the detector see more.
    pub const BRIGHTNESS_CUTOFF: u8 = 200;

    /// Side of the square smoothing kernel applied before thresholding.
    pub const BLUR_KERNEL_SIZE: u32 = 21;

    /// Gaussian sigma matching a `BLUR_KERNEL_SIZE` kernel
    /// (`0.3 * ((k - 1) / 2 - 1) + 0.8`).
    pub const BLUR_SIGMA: f32 = 0.3 * ((BLUR_KERNEL_SIZE as f32 - 1.0) * 0.5 - 1.0) + 0.8;

    /// Confidence reported with a detection under the fixed confidence model.
    pub const ASSUMED_CONFIDENCE: f32 = 0.7;

    /// Reason passed to the printer when pausing.
    pub const PAUSE_REASON: &str = "Fire detected!";

    /// Title of every fire alert.
    pub const ALERT_TITLE: &str = "Fire Detected!";

    pub const PUSHBULLET_API_URL: &str = "https://api.pushbullet.com/v2/pushes";

    pub const DEFAULT_POLL_INTERVAL_SECONDS: u64 = 5;

    pub const DEFAULT_SMTP_PORT: u16 = 587;

    /// Timeout for every outbound HTTP request (webcam, printer, alert sinks).
    pub const HTTP_TIMEOUT_SECONDS: u64 = 10;
}
