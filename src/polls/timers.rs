use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

/// Counts poll timers as they are armed and disarmed.
///
/// A timer is disarmed when its [`TimerGuard`] drops, whether it fired, was
/// stopped, or its task was aborted, so every armed timer is disarmed exactly
/// once.
#[derive(Debug, Clone, Default)]
pub struct TimerLedger {
    inner: Arc<Counts>,
}

#[derive(Debug, Default)]
struct Counts {
    armed: AtomicUsize,
    disarmed: AtomicUsize,
}

impl TimerLedger {
    pub fn arm(&self) -> TimerGuard {
        self.inner.armed.fetch_add(1, Ordering::SeqCst);
        TimerGuard {
            ledger: self.inner.clone(),
        }
    }

    pub fn armed(&self) -> usize {
        self.inner.armed.load(Ordering::SeqCst)
    }

    pub fn disarmed(&self) -> usize {
        self.inner.disarmed.load(Ordering::SeqCst)
    }

    pub fn active(&self) -> usize {
        self.armed().saturating_sub(self.disarmed())
    }
}

#[derive(Debug)]
pub struct TimerGuard {
    ledger: Arc<Counts>,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.ledger.disarmed.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropping_a_guard_disarms_once() {
        let ledger = TimerLedger::default();
        let first = ledger.arm();
        let second = ledger.arm();
        assert_eq!(ledger.active(), 2);

        drop(first);
        assert_eq!(ledger.active(), 1);
        drop(second);

        assert_eq!(ledger.armed(), 2);
        assert_eq!(ledger.disarmed(), 2);
        assert_eq!(ledger.active(), 0);
    }
}
