use crate::printer::PrinterSnapshot;

/// Printer lifecycle events that drive [`PrinterActivityState`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrinterEvent {
    PrintStarted,
    PrintDone,
    PrintFailed,
    PrintCancelled,
    /// The printer connected and reported this hotend target temperature.
    Connected { target_temperature: f64 },
    Disconnected,
}

/// Whether the printer is printing or heating.
///
/// Detection only runs while at least one flag is set. The two flags are
/// independent: a printer can heat without printing (preheat) and the
/// printing flag survives a disconnect until the print itself ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrinterActivityState {
    pub printing: bool,
    pub heaters_active: bool,
}

impl PrinterActivityState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_print_started(&mut self) {
        self.printing = true;
    }

    /// Print done, failed or cancelled.
    pub fn on_print_finished(&mut self) {
        self.printing = false;
    }

    pub fn on_connected(&mut self, target_temperature: f64) {
        self.heaters_active = target_temperature > 0.0;
    }

    pub fn on_disconnected(&mut self) {
        self.heaters_active = false;
    }

    pub fn apply(&mut self, event: &PrinterEvent) {
        match event {
            PrinterEvent::PrintStarted => self.on_print_started(),
            PrinterEvent::PrintDone | PrinterEvent::PrintFailed | PrinterEvent::PrintCancelled => {
                self.on_print_finished()
            }
            PrinterEvent::Connected { target_temperature } => {
                self.on_connected(*target_temperature)
            }
            PrinterEvent::Disconnected => self.on_disconnected(),
        }
    }

    /// True when frames should be evaluated.
    pub fn should_monitor(&self) -> bool {
        self.printing || self.heaters_active
    }
}

/// Derive lifecycle events from two consecutive printer status polls.
///
/// `None` means the printer could not be reached. Reaching it again after
/// that, or for the first time, counts as a connect carrying the current
/// extruder target.
pub fn events_between(
    previous: Option<&PrinterSnapshot>,
    current: Option<&PrinterSnapshot>,
) -> Vec<PrinterEvent> {
    let mut events = Vec::new();

    match (previous, current) {
        (None, None) => {}
        (Some(_), None) => events.push(PrinterEvent::Disconnected),
        (None, Some(now)) => {
            events.push(PrinterEvent::Connected {
                target_temperature: now.extruder_target,
            });
            if now.has_active_job() {
                events.push(PrinterEvent::PrintStarted);
            }
        }
        (Some(before), Some(now)) => {
            if !before.has_active_job() && now.has_active_job() {
                events.push(PrinterEvent::PrintStarted);
            } else if before.has_active_job() && !now.has_active_job() {
                events.push(match now.state.as_str() {
                    "complete" => PrinterEvent::PrintDone,
                    "error" => PrinterEvent::PrintFailed,
                    _ => PrinterEvent::PrintCancelled,
                });
            }
        }
    }

    events
}
