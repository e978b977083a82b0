use crate::camera::alert_stream::RawEventRecord;
use std::time::{Duration, Instant};

/// Canonical tokens that never represent a person crossing.
pub const NOISE_TOKENS: [&str; 10] = [
    "VIDEOLOSS",
    "MOTION",
    "VMD",
    "SCENECHANGEDETECTION",
    "DEFOCUSDETECTION",
    "AUDIOEXCEPTION",
    "SHELTERALARM",
    "ALARMINPUT",
    "HOSTALARM",
    "VIDEOMISMATCH",
];

pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(500);

pub fn is_noise(token: &str) -> bool {
    NOISE_TOKENS.contains(&token)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Noise,
    Inactive,
    Debounced,
}

/// Minimum gap between two accepted detections of one camera.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Debouncer {
            window,
            last_accepted: None,
        }
    }

    /// Accepts and records `now` unless the previous acceptance is less than a window ago.
    pub fn accept_at(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Debouncer::new(DEBOUNCE_WINDOW)
    }
}

/// Per-camera relevance filter: noise and inactive states first, then the debounce.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    debouncer: Debouncer,
}

impl EventFilter {
    pub fn new(debounce: Duration) -> Self {
        EventFilter {
            debouncer: Debouncer::new(debounce),
        }
    }

    pub fn judge_at(&mut self, token: &str, record: &RawEventRecord, now: Instant) -> Verdict {
        if is_noise(token) {
            return Verdict::Noise;
        }
        if !record.is_active() {
            return Verdict::Inactive;
        }
        if !self.debouncer.accept_at(now) {
            return Verdict::Debounced;
        }
        Verdict::Accept
    }
}
