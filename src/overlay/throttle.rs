//! Coalescing of high-frequency input (pointer moves, resizes)

use std::time::{Duration, Instant};

/// Holds only the most recent value queued since the last take.
///
/// Pointer moves and resizes queue here; the frame handler takes the latest
/// one, so a burst of events costs one recomputation.
#[derive(Debug, Clone)]
pub struct Coalesced<T> {
    pending: Option<T>,
    superseded: u64,
}

impl<T> Default for Coalesced<T> {
    fn default() -> Self {
        Self {
            pending: None,
            superseded: 0,
        }
    }
}

impl<T> Coalesced<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `value`, replacing anything not yet taken
    pub fn queue(&mut self, value: T) {
        if self.pending.replace(value).is_some() {
            self.superseded += 1;
        }
    }

    pub fn take(&mut self) -> Option<T> {
        self.pending.take()
    }

    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    /// Values dropped because a newer one arrived first
    pub fn superseded(&self) -> u64 {
        self.superseded
    }
}

/// Limits work to once per frame interval
#[derive(Debug, Clone)]
pub struct FrameClock {
    interval: Duration,
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True if a frame is due at `now`; marks the frame as started
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Time left until the next frame is due
    pub fn until_next(&self, now: Instant) -> Duration {
        match self.last {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => Duration::ZERO,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}
