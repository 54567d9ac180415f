use std::time::{Duration, Instant};

/// Where the trigger gate currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerState {
    /// The printer is neither printing nor heating.
    Idle,
    /// Watching; the next actionable verdict will fire.
    Armed,
    /// Fired on the most recent poll.
    Triggered { at: Instant },
    /// Fired recently; actionable verdicts are ignored until `until`.
    /// `None` means the cooldown outlasts what `Instant` can represent.
    Cooldown { until: Option<Instant> },
}

/// What the caller should do after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    None,
    /// Notify and pause.
    Fire,
}

/// Debounce between actionable verdicts and pause requests.
///
/// With a zero cooldown every actionable verdict fires, one pause request
/// per detecting poll.
#[derive(Debug, Clone)]
pub struct TriggerGate {
    state: TriggerState,
    cooldown: Duration,
}

impl TriggerGate {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            state: TriggerState::Idle,
            cooldown,
        }
    }

    pub fn state(&self) -> TriggerState {
        self.state
    }

    /// Advance the gate by one poll.
    ///
    /// * `monitoring` - whether the printer is printing or heating
    /// * `actionable` - whether this poll's verdict cleared the sensitivity cutoff
    pub fn step(&mut self, monitoring: bool, actionable: bool, now: Instant) -> TriggerAction {
        let (next, action) = transition(self.state, self.cooldown, monitoring, actionable, now);
        self.state = next;
        action
    }
}

fn transition(
    state: TriggerState,
    cooldown: Duration,
    monitoring: bool,
    actionable: bool,
    now: Instant,
) -> (TriggerState, TriggerAction) {
    if !monitoring {
        return (TriggerState::Idle, TriggerAction::None);
    }

    match state {
        TriggerState::Idle | TriggerState::Armed => arm_or_fire(actionable, now),
        TriggerState::Triggered { at } => match at.checked_add(cooldown) {
            Some(until) if now >= until => arm_or_fire(actionable, now),
            until => (TriggerState::Cooldown { until }, TriggerAction::None),
        },
        TriggerState::Cooldown { until } => match until {
            Some(until) if now >= until => arm_or_fire(actionable, now),
            _ => (state, TriggerAction::None),
        },
    }
}

fn arm_or_fire(actionable: bool, now: Instant) -> (TriggerState, TriggerAction) {
    if actionable {
        (TriggerState::Triggered { at: now }, TriggerAction::Fire)
    } else {
        (TriggerState::Armed, TriggerAction::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_arms_when_monitoring_starts() {
        let now = Instant::now();
        let (next, action) = transition(TriggerState::Idle, Duration::ZERO, true, false, now);

        assert_eq!(next, TriggerState::Armed);
        assert_eq!(action, TriggerAction::None);
    }

    #[test]
    fn anything_returns_to_idle_when_monitoring_stops() {
        let now = Instant::now();
        let state = TriggerState::Cooldown {
            until: Some(now + Duration::from_secs(60)),
        };
        let (next, action) = transition(state, Duration::from_secs(60), false, true, now);

        assert_eq!(next, TriggerState::Idle);
        assert_eq!(action, TriggerAction::None);
    }

    #[test]
    fn zero_cooldown_fires_every_poll() {
        let start = Instant::now();
        let mut gate = TriggerGate::new(Duration::ZERO);

        assert_eq!(gate.step(true, true, start), TriggerAction::Fire);
        assert_eq!(
            gate.step(true, true, start + Duration::from_secs(1)),
            TriggerAction::Fire
        );
    }

    #[test]
    fn unrepresentable_cooldown_never_rearms() {
        let start = Instant::now();
        let mut gate = TriggerGate::new(Duration::from_secs(u64::MAX));

        assert_eq!(gate.step(true, true, start), TriggerAction::Fire);
        assert_eq!(
            gate.step(true, true, start + Duration::from_secs(1)),
            TriggerAction::None
        );
        assert_eq!(gate.state(), TriggerState::Cooldown { until: None });
        assert_eq!(
            gate.step(true, true, start + Duration::from_secs(3600)),
            TriggerAction::None
        );
    }
}
