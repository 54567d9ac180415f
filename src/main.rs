use anyhow::Result;
use log::{debug, info, warn};
use std::{
    thread,
    time::{Duration, Instant},
};

use fire_guard::alerts::{self, Notifier};
use fire_guard::{
    Config, FireGuardError, FireMonitor, FrameAnomalyDetector, PrinterService, TriggerGate,
    WebcamFetcher,
};

/// Fire Guard - webcam-based fire detection for 3D printers.
///
/// Polls Moonraker for the print state and, while the printer is printing or
/// its hotend was heating when it connected, evaluates webcam snapshots for
/// large saturated bright regions. A detection that clears
/// `THRESHOLD_SENSITIVITY` sends an alert and pauses the print.
///
/// # Environment Variables
///
/// Required:
/// * `WEBCAM_URL` - Webcam snapshot URL
/// * `MOONRAKER_API_URL` - Moonraker API endpoint for printer control
///
/// Optional (with defaults):
/// * `THRESHOLD_SENSITIVITY` - Confidence cutoff for acting on a detection (default: "0.5")
/// * `NOTIFY_CHANNEL` - `pushbullet`, `discord` or `email` (default: "pushbullet")
/// * `PUSHBULLET_API_KEY`, `DISCORD_WEBHOOK` - Channel credentials
/// * `SMTP_SERVER`, `SMTP_PORT` (587), `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM`, `SMTP_TO`
/// * `CONFIDENCE_MODEL` - `fixed` or `coverage` (default: "fixed")
/// * `POLL_INTERVAL_SECONDS` - Delay between polls (default: "5")
/// * `COOLDOWN_SECONDS` - Quiet period after a trigger (default: "0")
/// * `FLIP_IMAGE` - Flip frames vertically (default: "false")
///
/// # Usage
///
/// ```bash
/// export WEBCAM_URL="http://printer.local/webcam/?action=snapshot"
/// export MOONRAKER_API_URL="http://printer.local:7125"
/// export PUSHBULLET_API_KEY="o.xxxxxxxx"
/// ./fire-guard
/// ```
fn main() -> Result<()> {
    // Initialize logger to output to stdout, using RUST_LOG env var or info level by default
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Stdout)
        .filter_level(
            std::env::var("RUST_LOG")
                .ok()
                .and_then(|level| level.parse().ok())
                .unwrap_or(log::LevelFilter::Info),
        )
        .init();

    let config = Config::load().map_err(FireGuardError::from)?;

    info!("Fire Guard starting...");
    info!("Using Moonraker API URL: {}", config.moonraker_api_url);
    info!("Monitoring webcam: {}", config.webcam_url);
    info!(
        "Sensitivity {:.2}, confidence model {:?}, cooldown {}s",
        config.threshold_sensitivity, config.confidence_model, config.cooldown_seconds
    );

    let notifier = Notifier::new(
        alerts::sink_from_config(&config),
        config.threshold_sensitivity,
    );
    info!("Alerts will be sent via {}", notifier.channel_name());

    let mut monitor = FireMonitor::new(
        FrameAnomalyDetector::new(config.confidence_model),
        notifier,
        WebcamFetcher::new(config.webcam_url.clone(), config.flip_image),
        PrinterService::new(config.moonraker_api_url.clone()),
        TriggerGate::new(Duration::from_secs(config.cooldown_seconds)),
    );

    let poll_interval = Duration::from_secs(config.poll_interval_seconds);

    info!("Fire Guard initialized successfully. Starting monitoring loop...");

    loop {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");

        let snapshot = match monitor.printer().get_printer_status() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!("{}: Failed to get printer status: {}", timestamp, e);
                None
            }
        };

        for event in monitor.observe_snapshot(snapshot) {
            info!("{}: Printer event {:?}", timestamp, event);
        }

        let report = monitor.poll(Instant::now());
        if !report.evaluated {
            debug!("{}: Printer idle, skipping detection", timestamp);
        } else if report.paused {
            warn!("{}: Print paused after fire detection", timestamp);
        }

        thread::sleep(poll_interval);
    }
}
