use chrono::{DateTime, Utc};

use super::ProbeSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessStatus {
    Connected,
    Disconnected,
    Reconnecting,
    /// Terminal until the process is restarted.
    Exhausted,
}

/// What the supervisor should do after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Reconnect,
    /// Wake the machine with this ticket after the backoff delay.
    ScheduleRetry(u64),
    GiveUp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Step {
    pub transitions: Vec<(LivenessStatus, LivenessStatus)>,
    pub action: Action,
}

impl Step {
    fn idle() -> Self {
        Self {
            transitions: vec![],
            action: Action::None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LivenessState {
    pub status: LivenessStatus,
    pub consecutive_failures: u32,
    pub last_probe_at: Option<DateTime<Utc>>,
    pub last_success_at: Option<DateTime<Utc>>,
    pub max_retries: u32,
    reconnect_in_flight: bool,
    retry_pending: Option<u64>,
    next_ticket: u64,
}

impl LivenessState {
    pub fn new(max_retries: u32) -> Self {
        Self {
            status: LivenessStatus::Connected,
            consecutive_failures: 0,
            last_probe_at: None,
            last_success_at: None,
            max_retries: max_retries.max(1),
            reconnect_in_flight: false,
            retry_pending: None,
            next_ticket: 0,
        }
    }

    pub fn reconnect_in_flight(&self) -> bool {
        self.reconnect_in_flight
    }

    /// Feed a probe outcome. Only evidence about the gateway itself can end
    /// a reconnect cycle; a healthy loopback says nothing about it.
    pub fn observe(&mut self, source: ProbeSource, healthy: bool, now: DateTime<Utc>) -> Step {
        self.last_probe_at = Some(now);
        let mut step = Step::idle();

        match (self.status, healthy) {
            (LivenessStatus::Exhausted, _) => {}
            (LivenessStatus::Connected, true) => {
                self.last_success_at = Some(now);
                self.consecutive_failures = 0;
            }
            (_, true) if source.observes_gateway() => {
                self.last_success_at = Some(now);
                self.consecutive_failures = 0;
                self.retry_pending = None;
                self.move_to(LivenessStatus::Connected, &mut step);
            }
            (_, true) => {}
            (LivenessStatus::Connected, false) => {
                self.move_to(LivenessStatus::Disconnected, &mut step);
                self.move_to(LivenessStatus::Reconnecting, &mut step);
                step.action = self.begin_attempt();
            }
            (LivenessStatus::Disconnected, false) => {
                self.move_to(LivenessStatus::Reconnecting, &mut step);
                step.action = self.begin_attempt();
            }
            (LivenessStatus::Reconnecting, false) => {
                step.action = self.begin_attempt();
            }
        }

        step
    }

    pub fn reconnect_finished(&mut self, succeeded: bool, now: DateTime<Utc>) -> Step {
        self.reconnect_in_flight = false;
        let mut step = Step::idle();

        // a probe already settled things one way or the other
        if self.status != LivenessStatus::Reconnecting {
            return step;
        }

        if succeeded {
            self.consecutive_failures = 0;
            self.last_success_at = Some(now);
            self.move_to(LivenessStatus::Connected, &mut step);
            return step;
        }

        self.consecutive_failures += 1;
        if self.consecutive_failures >= self.max_retries {
            self.retry_pending = None;
            self.move_to(LivenessStatus::Exhausted, &mut step);
            step.action = Action::GiveUp;
        } else {
            self.next_ticket += 1;
            self.retry_pending = Some(self.next_ticket);
            step.action = Action::ScheduleRetry(self.next_ticket);
        }

        step
    }

    pub fn retry_due(&mut self, ticket: u64) -> Step {
        let mut step = Step::idle();
        if self.retry_pending != Some(ticket) {
            return step;
        }

        self.retry_pending = None;
        if self.status == LivenessStatus::Reconnecting {
            step.action = self.begin_attempt();
        }
        step
    }

    fn begin_attempt(&mut self) -> Action {
        if self.reconnect_in_flight || self.retry_pending.is_some() {
            return Action::None;
        }
        self.reconnect_in_flight = true;
        Action::Reconnect
    }

    fn move_to(&mut self, to: LivenessStatus, step: &mut Step) {
        if self.status != to {
            step.transitions.push((self.status, to));
            self.status = to;
        }
    }
}
