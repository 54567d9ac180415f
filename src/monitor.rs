use std::time::Instant;

use log::{debug, error, info, warn};

use crate::activity::{PrinterActivityState, PrinterEvent, events_between};
use crate::alerts::{Notifier, NotifyOutcome};
use crate::config::constants;
use crate::detector::{FrameAnomalyDetector, Verdict};
use crate::image_fetcher::FrameSource;
use crate::printer::{PrintController, PrinterSnapshot};
use crate::trigger::{TriggerAction, TriggerGate};

/// Result of one poll.
#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    /// False when the printer was idle and no frame was requested.
    pub evaluated: bool,
    pub verdict: Verdict,
    /// Set when the gate fired and the notifier was consulted.
    pub notification: Option<NotifyOutcome>,
    /// Whether a pause request was accepted by the printer.
    pub paused: bool,
}

impl PollReport {
    fn idle() -> Self {
        Self {
            evaluated: false,
            verdict: Verdict::no_signal(),
            notification: None,
            paused: false,
        }
    }
}

/// Wires the detector to its collaborators.
///
/// Owns the activity flags and the trigger gate; the caller feeds it
/// lifecycle events (directly or as printer snapshots) and calls [`poll`]
/// on a timer.
///
/// [`poll`]: FireMonitor::poll
pub struct FireMonitor<S, P> {
    detector: FrameAnomalyDetector,
    notifier: Notifier,
    source: S,
    printer: P,
    activity: PrinterActivityState,
    gate: TriggerGate,
    last_snapshot: Option<PrinterSnapshot>,
}

impl<S: FrameSource, P: PrintController> FireMonitor<S, P> {
    pub fn new(
        detector: FrameAnomalyDetector,
        notifier: Notifier,
        source: S,
        printer: P,
        gate: TriggerGate,
    ) -> Self {
        Self {
            detector,
            notifier,
            source,
            printer,
            activity: PrinterActivityState::new(),
            gate,
            last_snapshot: None,
        }
    }

    pub fn activity(&self) -> PrinterActivityState {
        self.activity
    }

    pub fn printer(&self) -> &P {
        &self.printer
    }

    pub fn gate(&self) -> &TriggerGate {
        &self.gate
    }

    /// Apply one lifecycle event to the activity flags.
    pub fn handle_event(&mut self, event: &PrinterEvent) {
        let before = self.activity;
        self.activity.apply(event);
        if before != self.activity {
            info!(
                "{:?}: printing={} heaters_active={}",
                event, self.activity.printing, self.activity.heaters_active
            );
        }
    }

    /// Record the latest printer status (`None` when unreachable) and apply
    /// whatever lifecycle events it implies.
    pub fn observe_snapshot(&mut self, snapshot: Option<PrinterSnapshot>) -> Vec<PrinterEvent> {
        let events = events_between(self.last_snapshot.as_ref(), snapshot.as_ref());
        for event in &events {
            self.handle_event(event);
        }
        self.last_snapshot = snapshot;
        events
    }

    /// Run one detection cycle.
    ///
    /// Nothing is fetched while the printer is neither printing nor heating.
    /// Otherwise a frame is evaluated; if the verdict clears the sensitivity
    /// cutoff and the gate is not cooling down, the notifier is called and
    /// the print is paused.
    pub fn poll(&mut self, now: Instant) -> PollReport {
        if !self.activity.should_monitor() {
            self.gate.step(false, false, now);
            return PollReport::idle();
        }

        let frame = self.source.next_frame();
        let verdict = self.detector.evaluate(frame.as_ref());
        let actionable = verdict.clears(self.notifier.sensitivity());

        debug!(
            "Evaluated frame: anomaly={} regions={} confidence={:.2}",
            verdict.anomaly_detected,
            verdict.region_count(),
            verdict.confidence
        );

        let mut report = PollReport {
            evaluated: true,
            verdict,
            notification: None,
            paused: false,
        };

        match self.gate.step(true, actionable, now) {
            TriggerAction::Fire => {
                warn!(
                    "Possible fire: {} bright region(s), {:.2}% confidence",
                    report.verdict.region_count(),
                    report.verdict.confidence_percent()
                );
                report.notification = Some(self.notifier.notify(&report.verdict, frame.as_ref()));

                match self.printer.pause_print(constants::PAUSE_REASON) {
                    Ok(()) => report.paused = true,
                    Err(e) => error!("Failed to pause print: {}", e),
                }
            }
            TriggerAction::None if actionable => {
                info!("Detection suppressed during cooldown");
            }
            TriggerAction::None if report.verdict.anomaly_detected => {
                info!(
                    "Bright region seen but confidence {:.2} is below sensitivity {:.2}",
                    report.verdict.confidence,
                    self.notifier.sensitivity()
                );
            }
            TriggerAction::None => {}
        }

        report
    }
}
