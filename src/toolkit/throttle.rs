use std::time::{Duration, Instant};

/// Time-based gate for window-resize relayouts
///
/// The first event in a burst passes; later events pass only once `interval`
/// has elapsed since the last accepted one.
#[derive(Debug, Clone)]
pub struct ResizeThrottle {
    interval: Duration,
    last: Option<Instant>,
}

impl ResizeThrottle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    pub fn ready(&mut self) -> bool {
        self.ready_at(Instant::now())
    }

    pub fn ready_at(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
