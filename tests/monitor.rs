use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use anyhow::Result;
use fire_guard::error::NotificationError;
use fire_guard::{
    FireAlert, FireMonitor, Frame, FrameAnomalyDetector, FrameSource, NotificationSink, Notifier,
    NotifyOutcome, PrintController, PrinterEvent, PrinterSnapshot, TriggerGate,
};
use image::{Rgb, RgbImage};

struct StaticSource {
    frame: Option<Frame>,
    fetches: Rc<RefCell<u32>>,
}

impl FrameSource for StaticSource {
    fn next_frame(&mut self) -> Option<Frame> {
        *self.fetches.borrow_mut() += 1;
        self.frame.clone()
    }
}

struct RecordingPrinter {
    reasons: Rc<RefCell<Vec<String>>>,
    reject: bool,
}

impl PrintController for RecordingPrinter {
    fn pause_print(&self, reason: &str) -> Result<()> {
        if self.reject {
            anyhow::bail!("printer offline");
        }
        self.reasons.borrow_mut().push(reason.to_string());
        Ok(())
    }
}

struct CountingSink {
    sent: Rc<RefCell<u32>>,
}

impl NotificationSink for CountingSink {
    fn channel_name(&self) -> &str {
        "counting"
    }

    fn check_config(&self) -> Result<(), NotificationError> {
        Ok(())
    }

    fn dispatch(&self, _alert: &FireAlert) -> Result<()> {
        *self.sent.borrow_mut() += 1;
        Ok(())
    }
}

struct Harness {
    monitor: FireMonitor<StaticSource, RecordingPrinter>,
    fetches: Rc<RefCell<u32>>,
    pauses: Rc<RefCell<Vec<String>>>,
    alerts: Rc<RefCell<u32>>,
}

fn harness(frame: Option<Frame>, sensitivity: f32, cooldown: Duration, reject: bool) -> Harness {
    let fetches = Rc::new(RefCell::new(0));
    let pauses = Rc::new(RefCell::new(Vec::new()));
    let alerts = Rc::new(RefCell::new(0));

    let monitor = FireMonitor::new(
        FrameAnomalyDetector::default(),
        Notifier::new(
            Box::new(CountingSink {
                sent: Rc::clone(&alerts),
            }),
            sensitivity,
        ),
        StaticSource {
            frame,
            fetches: Rc::clone(&fetches),
        },
        RecordingPrinter {
            reasons: Rc::clone(&pauses),
            reject,
        },
        TriggerGate::new(cooldown),
    );

    Harness {
        monitor,
        fetches,
        pauses,
        alerts,
    }
}

fn bright_frame() -> Frame {
    let mut pixels = RgbImage::new(100, 100);
    for y in 35..65 {
        for x in 35..65 {
            pixels.put_pixel(x, y, Rgb([255, 255, 255]));
        }
    }
    Frame::new(pixels)
}

fn dark_frame() -> Frame {
    Frame::new(RgbImage::new(100, 100))
}

#[test]
fn idle_printer_is_not_watched() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::ZERO, false);
    let report = h.monitor.poll(Instant::now());

    assert!(!report.evaluated);
    assert_eq!(*h.fetches.borrow(), 0);
    assert!(h.pauses.borrow().is_empty());
}

#[test]
fn fire_while_printing_notifies_and_pauses() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let report = h.monitor.poll(Instant::now());

    assert!(report.evaluated);
    assert!(report.verdict.anomaly_detected);
    assert_eq!(report.notification, Some(NotifyOutcome::Dispatched));
    assert!(report.paused);
    assert_eq!(*h.pauses.borrow(), vec!["Fire detected!".to_string()]);
    assert_eq!(*h.alerts.borrow(), 1);
}

#[test]
fn dark_frame_does_nothing() {
    let mut h = harness(Some(dark_frame()), 0.5, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let report = h.monitor.poll(Instant::now());

    assert!(report.evaluated);
    assert!(!report.verdict.anomaly_detected);
    assert_eq!(report.notification, None);
    assert!(h.pauses.borrow().is_empty());
}

#[test]
fn missing_frame_does_nothing() {
    let mut h = harness(None, 0.5, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let report = h.monitor.poll(Instant::now());

    assert!(report.evaluated);
    assert!(!report.verdict.anomaly_detected);
    assert_eq!(*h.fetches.borrow(), 1);
    assert!(h.pauses.borrow().is_empty());
}

#[test]
fn detection_below_sensitivity_is_ignored() {
    let mut h = harness(Some(bright_frame()), 0.9, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let report = h.monitor.poll(Instant::now());

    assert!(report.verdict.anomaly_detected);
    assert_eq!(report.notification, None);
    assert!(h.pauses.borrow().is_empty());
    assert_eq!(*h.alerts.borrow(), 0);
}

#[test]
fn heating_after_connect_enables_watching() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::Connected {
        target_temperature: 210.0,
    });
    assert!(h.monitor.poll(Instant::now()).paused);

    h.monitor.handle_event(&PrinterEvent::Disconnected);
    assert!(!h.monitor.poll(Instant::now()).evaluated);
}

#[test]
fn zero_cooldown_pauses_on_every_detecting_poll() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::ZERO, false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let start = Instant::now();
    h.monitor.poll(start);
    h.monitor.poll(start + Duration::from_secs(5));

    assert_eq!(h.pauses.borrow().len(), 2);
}

#[test]
fn cooldown_suppresses_repeat_pauses() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::from_secs(60), false);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let start = Instant::now();

    assert!(h.monitor.poll(start).paused);
    assert!(!h.monitor.poll(start + Duration::from_secs(5)).paused);
    assert!(!h.monitor.poll(start + Duration::from_secs(30)).paused);
    assert!(h.monitor.poll(start + Duration::from_secs(61)).paused);

    assert_eq!(h.pauses.borrow().len(), 2);
    assert_eq!(*h.alerts.borrow(), 2);
}

#[test]
fn rejected_pause_still_notifies() {
    let mut h = harness(Some(bright_frame()), 0.5, Duration::ZERO, true);
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let report = h.monitor.poll(Instant::now());

    assert_eq!(report.notification, Some(NotifyOutcome::Dispatched));
    assert!(!report.paused);
}

#[test]
fn snapshots_drive_activity() {
    let mut h = harness(Some(dark_frame()), 0.5, Duration::ZERO, false);
    let printing = PrinterSnapshot {
        state: "printing".to_string(),
        extruder_target: 0.0,
    };

    let events = h.monitor.observe_snapshot(Some(printing.clone()));
    assert_eq!(
        events,
        vec![
            PrinterEvent::Connected {
                target_temperature: 0.0
            },
            PrinterEvent::PrintStarted
        ]
    );
    assert!(h.monitor.activity().printing);

    let complete = PrinterSnapshot {
        state: "complete".to_string(),
        extruder_target: 0.0,
    };
    assert_eq!(
        h.monitor.observe_snapshot(Some(complete)),
        vec![PrinterEvent::PrintDone]
    );
    assert!(!h.monitor.activity().should_monitor());
}

#[test]
fn huge_cooldown_does_not_crash_the_loop() {
    let mut h = harness(
        Some(bright_frame()),
        0.5,
        Duration::from_secs(u64::MAX),
        false,
    );
    h.monitor.handle_event(&PrinterEvent::PrintStarted);
    let start = Instant::now();

    assert!(h.monitor.poll(start).paused);
    assert!(!h.monitor.poll(start + Duration::from_secs(5)).paused);
    assert!(!h.monitor.poll(start + Duration::from_secs(86_400)).paused);
    assert_eq!(h.pauses.borrow().len(), 1);
}
