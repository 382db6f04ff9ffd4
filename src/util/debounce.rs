use std::time::{Duration, Instant};

/// Coalesces a burst of events into one notification after a quiet period.
///
/// Poll-driven so it fits an immediate-mode frame loop: call `notify` for
/// every event and `poll` once per frame. Each `notify` pushes the deadline
/// back, superseding the pending one.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records an event at `now`, rescheduling the pending notification
    pub fn notify(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    /// Returns true exactly once when the quiet period has elapsed
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time until the pending notification fires, for scheduling a repaint
    pub fn time_remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DELAY: Duration = Duration::from_millis(100);

    #[test]
    fn fires_once_after_quiet_period() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.notify(start);

        assert!(!debouncer.poll(start + Duration::from_millis(99)));
        assert!(debouncer.poll(start + DELAY));
        assert!(!debouncer.poll(start + Duration::from_millis(500)));
        assert!(!debouncer.is_pending());
    }

    #[test]
    fn new_event_supersedes_pending_deadline() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.notify(start);
        debouncer.notify(start + Duration::from_millis(80));

        assert!(!debouncer.poll(start + Duration::from_millis(120)));
        assert_eq!(
            debouncer.time_remaining(start + Duration::from_millis(120)),
            Some(Duration::from_millis(60))
        );
        assert!(debouncer.poll(start + Duration::from_millis(180)));
    }

    #[test]
    fn cancel_drops_pending_notification() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(DELAY);
        debouncer.notify(start);
        debouncer.cancel();
        assert!(!debouncer.poll(start + DELAY));
    }
}
