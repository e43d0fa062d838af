//! Screen-reader announcements (an ARIA-style live region)

use std::time::{Duration, Instant};

/// How urgently assistive technology should read the message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Politeness {
    /// Read when the user is idle
    Polite,
    /// Interrupt whatever is being read
    Assertive,
}

#[derive(Debug, Clone)]
pub struct Announcement {
    /// Position in the order the announcer issued messages
    pub sequence: u64,
    pub message: String,
    pub politeness: Politeness,
    pub created_at: Instant,
    pub expires_at: Instant,
}

impl Announcement {
    pub fn new(message: impl Into<String>, politeness: Politeness, duration: Duration) -> Self {
        let now = Instant::now();
        Self {
            sequence: 0,
            message: message.into(),
            politeness,
            created_at: now,
            expires_at: now + duration,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// Live region contents, newest first
#[derive(Debug)]
pub struct Announcer {
    announcements: Vec<Announcement>,
    default_duration: Duration,
    enabled: bool,
    issued: u64,
}

impl Default for Announcer {
    fn default() -> Self {
        Self::new()
    }
}

impl Announcer {
    pub fn new() -> Self {
        Self::with_default_duration(Duration::from_secs(5))
    }

    pub fn with_default_duration(default_duration: Duration) -> Self {
        Self {
            announcements: Vec::new(),
            default_duration,
            enabled: true,
            issued: 0,
        }
    }

    /// Queue a message. Returns false when announcements are off.
    pub fn announce(&mut self, message: impl Into<String>, politeness: Politeness) -> bool {
        if !self.enabled {
            return false;
        }
        self.issued += 1;
        let mut announcement = Announcement::new(message, politeness, self.default_duration);
        announcement.sequence = self.issued;
        self.announcements.insert(0, announcement);
        true
    }

    pub fn polite(&mut self, message: impl Into<String>) -> bool {
        self.announce(message, Politeness::Polite)
    }

    pub fn assertive(&mut self, message: impl Into<String>) -> bool {
        self.announce(message, Politeness::Assertive)
    }

    /// Remove expired announcements, returns true if any were removed
    pub fn update(&mut self) -> bool {
        let initial_len = self.announcements.len();
        self.announcements.retain(|a| !a.is_expired());
        self.announcements.len() != initial_len
    }

    pub fn current(&self) -> Option<&Announcement> {
        self.announcements.first()
    }

    pub fn all(&self) -> &[Announcement] {
        &self.announcements
    }

    pub fn clear(&mut self) {
        self.announcements.clear();
    }

    pub fn count(&self) -> usize {
        self.announcements.len()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Turning announcements off also empties the region
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.clear();
        }
    }
}
