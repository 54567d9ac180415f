//! Fire Guard - webcam-based fire detection for 3D printers.
//!
//! While the printer is printing or heating, webcam snapshots are checked for
//! large saturated bright regions. A hit is reported through a notification
//! channel and the print is paused.
//!
//! # Core Components
//!
//! * [`detector`] - Bright-region fire heuristic over a single frame
//! * [`frame`] - Decoded RGB webcam frames
//! * [`activity`] - Printing/heating flags and lifecycle events
//! * [`trigger`] - Cooldown gate between detections and pause requests
//! * [`image_fetcher`] - Webcam snapshot source
//! * [`alerts`] - Sensitivity-gated notifications (Pushbullet, Discord, email)
//! * [`printer`] - Moonraker API integration for printer control
//! * [`monitor`] - One poll cycle wiring all of the above
//! * [`config`] - Environment configuration and constants
//! * [`error`] - Error types
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::time::{Duration, Instant};
//! use fire_guard::*;
//!
//! let config = Config::load()?;
//! let notifier = Notifier::new(alerts::sink_from_config(&config), config.threshold_sensitivity);
//! let mut monitor = FireMonitor::new(
//!     FrameAnomalyDetector::new(config.confidence_model),
//!     notifier,
//!     WebcamFetcher::new(config.webcam_url.clone(), config.flip_image),
//!     PrinterService::new(config.moonraker_api_url.clone()),
//!     TriggerGate::new(Duration::from_secs(config.cooldown_seconds)),
//! );
//! monitor.handle_event(&PrinterEvent::PrintStarted);
//! let report = monitor.poll(Instant::now());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod activity;
pub mod alerts;
pub mod config;
pub mod detector;
pub mod error;
pub mod frame;
pub mod image_fetcher;
pub mod monitor;
pub mod printer;
pub mod trigger;

// Re-export commonly used types for convenience
pub use activity::{PrinterActivityState, PrinterEvent};
pub use alerts::{FireAlert, NotificationSink, Notifier, NotifyOutcome};
pub use config::Config;
pub use detector::{BrightRegion, ConfidenceModel, FrameAnomalyDetector, Verdict};
pub use error::FireGuardError;
pub use frame::Frame;
pub use image_fetcher::{FrameSource, WebcamFetcher};
pub use monitor::{FireMonitor, PollReport};
pub use printer::{PrintController, PrinterService, PrinterSnapshot};
pub use trigger::{TriggerAction, TriggerGate, TriggerState};
