use std::fmt;

/// Error types for the fire guard.
///
/// Nothing here is fatal to the monitoring loop except configuration errors
/// at startup; the other kinds are logged where they occur and the loop
/// carries on.

/// Main error type for fire guard operations.
#[derive(Debug)]
pub enum FireGuardError {
    /// Errors related to fetching or decoding webcam frames.
    FrameError(FrameError),

    /// Errors related to printer control operations.
    PrinterError(PrinterError),

    /// Errors related to alert delivery.
    NotificationError(NotificationError),

    /// Configuration and setup errors.
    ConfigError(ConfigError),
}

/// Errors specific to frame acquisition.
#[derive(Debug)]
pub enum FrameError {
    /// The webcam request failed or returned a non-success status.
    DownloadFailed { url: String, reason: String },

    /// The payload could not be decoded as an image.
    InvalidFormat { url: String, reason: String },
}

/// Errors specific to printer control operations.
#[derive(Debug)]
pub enum PrinterError {
    /// Failed to connect to printer API.
    ConnectionFailed { api_url: String, reason: String },

    /// Printer API returned an error response.
    ApiError {
        endpoint: String,
        status: u16,
        message: String,
    },
}

/// Errors specific to alert delivery.
#[derive(Debug)]
pub enum NotificationError {
    /// A channel is selected but one of its settings is missing.
    IncompleteConfig { channel: String, missing: String },

    /// The channel rejected or failed to deliver the alert.
    DeliveryFailed { channel: String, reason: String },
}

/// Errors related to configuration and application setup.
#[derive(Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    MissingEnvVar { var_name: String },

    /// Invalid configuration values provided.
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

impl fmt::Display for FireGuardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FireGuardError::FrameError(e) => write!(f, "Frame error: {}", e),
            FireGuardError::PrinterError(e) => write!(f, "Printer error: {}", e),
            FireGuardError::NotificationError(e) => write!(f, "Notification error: {}", e),
            FireGuardError::ConfigError(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::DownloadFailed { url, reason } => {
                write!(f, "Failed to download frame from '{}': {}", url, reason)
            }
            FrameError::InvalidFormat { url, reason } => {
                write!(f, "Undecodable frame from '{}': {}", url, reason)
            }
        }
    }
}

impl fmt::Display for PrinterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrinterError::ConnectionFailed { api_url, reason } => {
                write!(
                    f,
                    "Failed to connect to printer at '{}': {}",
                    api_url, reason
                )
            }
            PrinterError::ApiError {
                endpoint,
                status,
                message,
            } => {
                write!(
                    f,
                    "Printer API error at '{}' (HTTP {}): {}",
                    endpoint, status, message
                )
            }
        }
    }
}

impl fmt::Display for NotificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationError::IncompleteConfig { channel, missing } => {
                write!(f, "{} channel is missing '{}'", channel, missing)
            }
            NotificationError::DeliveryFailed { channel, reason } => {
                write!(f, "{} delivery failed: {}", channel, reason)
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingEnvVar { var_name } => {
                write!(f, "Required environment variable '{}' is not set", var_name)
            }
            ConfigError::InvalidValue {
                field,
                value,
                reason,
            } => {
                write!(
                    f,
                    "Invalid value '{}' for field '{}': {}",
                    value, field, reason
                )
            }
        }
    }
}

impl std::error::Error for FireGuardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FireGuardError::FrameError(e) => Some(e),
            FireGuardError::PrinterError(e) => Some(e),
            FireGuardError::NotificationError(e) => Some(e),
            FireGuardError::ConfigError(e) => Some(e),
        }
    }
}

impl std::error::Error for FrameError {}
impl std::error::Error for PrinterError {}
impl std::error::Error for NotificationError {}
impl std::error::Error for ConfigError {}

impl From<FrameError> for FireGuardError {
    fn from(err: FrameError) -> Self {
        FireGuardError::FrameError(err)
    }
}

impl From<PrinterError> for FireGuardError {
    fn from(err: PrinterError) -> Self {
        FireGuardError::PrinterError(err)
    }
}

impl From<NotificationError> for FireGuardError {
    fn from(err: NotificationError) -> Self {
        FireGuardError::NotificationError(err)
    }
}

impl From<ConfigError> for FireGuardError {
    fn from(err: ConfigError) -> Self {
        FireGuardError::ConfigError(err)
    }
}
