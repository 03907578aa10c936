// Client-side input rate limit. Coarse and non-authoritative.

use std::time::{Duration, Instant};

pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_millis(100);

/// Accepts at most one input event per `window`.
///
/// Timestamps come from the caller so the same event stream always produces
/// the same decisions.
#[derive(Debug, Clone)]
pub struct InputThrottle {
    window: Duration,
    last_accepted: Option<Instant>,
}

impl Default for InputThrottle {
    fn default() -> Self {
        Self::new(DEFAULT_THROTTLE_WINDOW)
    }
}

impl InputThrottle {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: None,
        }
    }

    /// Returns true and records `now` if the event falls outside the window.
    /// Rejected events leave the window where it was.
    pub fn try_accept(&mut self, now: Instant) -> bool {
        if let Some(last) = self.last_accepted {
            // Clock going backwards counts as "no time elapsed".
            if now.saturating_duration_since(last) < self.window {
                return false;
            }
        }
        self.last_accepted = Some(now);
        true
    }
}
