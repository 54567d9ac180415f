use std::time::Duration;

use anyhow::Result;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use log::{error, info, warn};
use reqwest::blocking::multipart;
use serde_json::json;

use crate::config::{Config, NotifyChannel, SmtpSettings, constants};
use crate::detector::{BrightRegion, Verdict};
use crate::error::NotificationError;
use crate::frame::Frame;

/// A fire alert ready to be delivered.
#[derive(Debug, Clone)]
pub struct FireAlert {
    pub title: String,
    pub body: String,
    pub confidence: f32,
    /// Annotated JPEG snapshot, when one could be produced.
    pub image: Option<Vec<u8>>,
}

impl FireAlert {
    /// Build the alert text for a verdict.
    pub fn from_verdict(verdict: &Verdict, image: Option<Vec<u8>>) -> Self {
        Self {
            title: constants::ALERT_TITLE.to_string(),
            body: format!(
                "Fire detected with {:.2}% confidence.",
                verdict.confidence_percent()
            ),
            confidence: verdict.confidence,
            image,
        }
    }
}

/// A delivery channel for fire alerts.
pub trait NotificationSink {
    /// Short channel name used in log messages.
    fn channel_name(&self) -> &str;

    /// Check that every setting the channel needs is present.
    fn check_config(&self) -> Result<(), NotificationError>;

    /// Deliver one alert.
    fn dispatch(&self, alert: &FireAlert) -> Result<()>;
}

/// What happened to a verdict handed to the [`Notifier`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// The alert was delivered.
    Dispatched,
    /// No anomaly, or its confidence was under the sensitivity cutoff.
    BelowThreshold,
    /// The channel is missing settings; nothing was sent.
    IncompleteConfig,
    /// Delivery was attempted and failed.
    Failed,
}

/// Decides whether a verdict warrants an alert and sends it.
///
/// Delivery problems are logged and reported through [`NotifyOutcome`]; they
/// never propagate to the caller as errors.
pub struct Notifier {
    sink: Box<dyn NotificationSink>,
    sensitivity: f32,
}

impl Notifier {
    /// Create a notifier for a sink with a sensitivity cutoff (0.0 to 1.0).
    pub fn new(sink: Box<dyn NotificationSink>, sensitivity: f32) -> Self {
        Self {
            sink,
            sensitivity: sensitivity.clamp(0.0, 1.0),
        }
    }

    pub fn sensitivity(&self) -> f32 {
        self.sensitivity
    }

    pub fn channel_name(&self) -> &str {
        self.sink.channel_name()
    }

    /// Notify about a verdict if it clears the sensitivity cutoff.
    ///
    /// When `frame` is given, the alert carries a snapshot with the bright
    /// regions outlined.
    pub fn notify(&self, verdict: &Verdict, frame: Option<&Frame>) -> NotifyOutcome {
        if let Err(e) = self.sink.check_config() {
            error!("Cannot send fire alert: {}", e);
            return NotifyOutcome::IncompleteConfig;
        }

        if !verdict.clears(self.sensitivity) {
            info!("No fire detected or confidence below threshold.");
            return NotifyOutcome::BelowThreshold;
        }

        let image = frame.and_then(|frame| match annotate_frame(frame, &verdict.regions) {
            Ok(jpeg) => Some(jpeg),
            Err(e) => {
                warn!("Failed to annotate frame: {}", e);
                None
            }
        });

        let alert = FireAlert::from_verdict(verdict, image);
        match self.sink.dispatch(&alert) {
            Ok(()) => {
                info!("Notification sent successfully via {}.", self.channel_name());
                NotifyOutcome::Dispatched
            }
            Err(e) => {
                error!(
                    "Error sending notification via {}: {}",
                    self.channel_name(),
                    e
                );
                NotifyOutcome::Failed
            }
        }
    }
}

/// Build the sink selected by `NOTIFY_CHANNEL`.
pub fn sink_from_config(config: &Config) -> Box<dyn NotificationSink> {
    match config.notify_channel {
        NotifyChannel::Pushbullet => {
            Box::new(PushbulletSink::new(config.pushbullet_api_key.clone()))
        }
        NotifyChannel::Discord => Box::new(DiscordSink::new(config.discord_webhook.clone())),
        NotifyChannel::Email => Box::new(EmailSink::new(config.smtp.clone())),
    }
}

fn http_client() -> Result<reqwest::blocking::Client> {
    Ok(reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(constants::HTTP_TIMEOUT_SECONDS))
        .build()?)
}

fn missing(channel: &str, setting: &str) -> NotificationError {
    NotificationError::IncompleteConfig {
        channel: channel.to_string(),
        missing: setting.to_string(),
    }
}

/// Pushbullet push notifications, authenticated by an access token.
pub struct PushbulletSink {
    api_key: Option<String>,
    api_url: String,
}

impl PushbulletSink {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key,
            api_url: constants::PUSHBULLET_API_URL.to_string(),
        }
    }

    /// Point the sink at a different endpoint.
    pub fn with_api_url(mut self, api_url: String) -> Self {
        self.api_url = api_url;
        self
    }
}

impl NotificationSink for PushbulletSink {
    fn channel_name(&self) -> &str {
        "Pushbullet"
    }

    fn check_config(&self) -> Result<(), NotificationError> {
        match self.api_key {
            Some(_) => Ok(()),
            None => Err(missing(self.channel_name(), "PUSHBULLET_API_KEY")),
        }
    }

    fn dispatch(&self, alert: &FireAlert) -> Result<()> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            missing(self.channel_name(), "PUSHBULLET_API_KEY")
        })?;

        let push = json!({
            "type": "note",
            "title": alert.title,
            "body": alert.body,
        });

        let client = http_client()?;
        let response = client
            .post(&self.api_url)
            .header("Access-Token", api_key)
            .json(&push)
            .send()?;

        if !response.status().is_success() {
            return Err(NotificationError::DeliveryFailed {
                channel: self.channel_name().to_string(),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        Ok(())
    }
}

/// Discord webhook with a rich embed and the annotated snapshot attached.
pub struct DiscordSink {
    webhook_url: Option<String>,
}

impl DiscordSink {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self { webhook_url }
    }
}

impl NotificationSink for DiscordSink {
    fn channel_name(&self) -> &str {
        "Discord"
    }

    fn check_config(&self) -> Result<(), NotificationError> {
        match self.webhook_url {
            Some(_) => Ok(()),
            None => Err(missing(self.channel_name(), "DISCORD_WEBHOOK")),
        }
    }

    fn dispatch(&self, alert: &FireAlert) -> Result<()> {
        let webhook_url = self
            .webhook_url
            .as_deref()
            .ok_or_else(|| missing(self.channel_name(), "DISCORD_WEBHOOK"))?;

        let timestamp = chrono::Utc::now().to_rfc3339();
        let mut embed = json!({
            "title": format!("🔥 {}", alert.title),
            "description": alert.body,
            "color": 0xFF0000, // Red
            "timestamp": timestamp,
            "footer": {
                "text": "Fire Guard"
            }
        });

        let client = http_client()?;
        let response = match &alert.image {
            Some(image_data) => {
                let filename = format!("fire_{}.jpg", chrono::Utc::now().timestamp());
                embed["image"] = json!({ "url": format!("attachment://{}", filename) });
                let payload = json!({ "embeds": [embed] });

                let form = multipart::Form::new()
                    .text("payload_json", payload.to_string())
                    .part(
                        "files[0]",
                        multipart::Part::bytes(image_data.clone())
                            .file_name(filename)
                            .mime_str("image/jpeg")?,
                    );
                client.post(webhook_url).multipart(form).send()?
            }
            None => client
                .post(webhook_url)
                .json(&json!({ "embeds": [embed] }))
                .send()?,
        };

        if !response.status().is_success() {
            return Err(NotificationError::DeliveryFailed {
                channel: self.channel_name().to_string(),
                reason: format!("HTTP {}", response.status()),
            }
            .into());
        }

        Ok(())
    }
}

/// Plain-text email over SMTP.
///
/// Port 465 uses implicit TLS; any other port negotiates STARTTLS.
pub struct EmailSink {
    smtp: SmtpSettings,
}

impl EmailSink {
    pub fn new(smtp: SmtpSettings) -> Self {
        Self { smtp }
    }
}

impl NotificationSink for EmailSink {
    fn channel_name(&self) -> &str {
        "email"
    }

    fn check_config(&self) -> Result<(), NotificationError> {
        let required = [
            ("SMTP_SERVER", &self.smtp.server),
            ("SMTP_FROM", &self.smtp.from),
            ("SMTP_TO", &self.smtp.to),
        ];
        for (name, value) in required {
            if value.is_none() {
                return Err(missing(self.channel_name(), name));
            }
        }
        if self.smtp.username.is_some() != self.smtp.password.is_some() {
            return Err(missing(self.channel_name(), "SMTP_USERNAME/SMTP_PASSWORD pair"));
        }
        Ok(())
    }

    fn dispatch(&self, alert: &FireAlert) -> Result<()> {
        self.check_config()?;
        let (Some(server), Some(from), Some(to)) =
            (&self.smtp.server, &self.smtp.from, &self.smtp.to)
        else {
            return Err(missing(self.channel_name(), "SMTP_SERVER").into());
        };

        let email = Message::builder()
            .from(from.parse()?)
            .to(to.parse()?)
            .subject(alert.title.clone())
            .header(ContentType::TEXT_PLAIN)
            .body(alert.body.clone())?;

        let builder = if self.smtp.port == 465 {
            SmtpTransport::relay(server)?
        } else {
            SmtpTransport::starttls_relay(server)?
        };
        let builder = builder.port(self.smtp.port);
        let builder = match (&self.smtp.username, &self.smtp.password) {
            (Some(user), Some(pass)) => {
                builder.credentials(Credentials::new(user.clone(), pass.clone()))
            }
            _ => builder,
        };

        builder
            .build()
            .send(&email)
            .map_err(|e| NotificationError::DeliveryFailed {
                channel: self.channel_name().to_string(),
                reason: e.to_string(),
            })?;

        Ok(())
    }
}

/// Outline bright regions on a frame and encode it as JPEG.
///
/// # Errors
///
/// Returns an error if JPEG encoding fails.
pub fn annotate_frame(frame: &Frame, regions: &[BrightRegion]) -> Result<Vec<u8>> {
    let mut rgb_image = frame.pixels().clone();
    let (image_width, image_height) = rgb_image.dimensions();
    let red = image::Rgb([255, 0, 0]);

    for region in regions {
        // Thick border: grow the box outward by up to two pixels
        for thickness in 0..3u32 {
            let x = region.x.saturating_sub(thickness);
            let y = region.y.saturating_sub(thickness);
            let w = (region.width + 2 * thickness).min(image_width - x);
            let h = (region.height + 2 * thickness).min(image_height - y);
            if w == 0 || h == 0 {
                continue;
            }
            draw_hollow_rect_mut(&mut rgb_image, Rect::at(x as i32, y as i32).of_size(w, h), red);
        }
    }

    let dynamic_annotated = image::DynamicImage::ImageRgb8(rgb_image);
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    dynamic_annotated.write_to(&mut cursor, image::ImageFormat::Jpeg)?;

    Ok(buffer)
}
