use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// How long an explicit "send anyway" stays valid.
pub const BYPASS_WINDOW: Duration = Duration::from_millis(900);

/// Time source for the bypass window.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock advanced by hand.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock()
    }
}

/// One-shot permission for the next guard trigger, valid until its expiry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BypassToken {
    expires_at: Option<Instant>,
}

impl BypassToken {
    pub fn arm(&mut self, now: Instant) {
        self.expires_at = Some(now + BYPASS_WINDOW);
    }

    pub fn is_armed(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now < at)
    }

    /// Consumes the token if it is still valid. An expired token is cleared
    /// and reports false.
    pub fn take(&mut self, now: Instant) -> bool {
        let valid = self.is_armed(now);
        self.expires_at = None;
        valid
    }

    pub fn clear(&mut self) {
        self.expires_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unarmed_token_does_not_bypass() {
        let clock = ManualClock::new();
        let mut token = BypassToken::default();
        assert!(!token.take(clock.now()));
    }

    #[test]
    fn armed_token_is_one_shot() {
        let clock = ManualClock::new();
        let mut token = BypassToken::default();
        token.arm(clock.now());
        clock.advance(Duration::from_millis(100));
        assert!(token.take(clock.now()));
        assert!(!token.take(clock.now()));
    }

    #[test]
    fn token_expires() {
        let clock = ManualClock::new();
        let mut token = BypassToken::default();
        token.arm(clock.now());
        clock.advance(BYPASS_WINDOW);
        assert!(!token.is_armed(clock.now()));
        assert!(!token.take(clock.now()));
        assert_eq!(token, BypassToken::default());
    }
}
