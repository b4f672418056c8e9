//! Input gating and visual feedback for mistyped characters.
//!
//! Both policies sit beside the error bookkeeping in the session: they can
//! reject a keystroke or light up a flash, but never change the error count.

use std::time::{Duration, Instant};

/// How the session reacts to a mistyped character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingPolicy {
    /// Reject further characters until a backspace clears the typo.
    pub block_on_typo: bool,
    /// Flash the display on a typo for `flash_duration`.
    pub typo_flash: bool,
    pub flash_duration: Duration,
}

impl Default for TypingPolicy {
    fn default() -> Self {
        Self {
            block_on_typo: false,
            typo_flash: false,
            flash_duration: Duration::from_millis(150),
        }
    }
}

/// Per-session typo feedback state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypoState {
    pub has_typo: bool,
    pub flash_started: Option<Instant>,
}

impl TypoState {
    /// Whether a character may be appended under `policy`.
    pub fn accepts_input(&self, policy: &TypingPolicy) -> bool {
        !(policy.block_on_typo && self.has_typo)
    }

    /// Record a mistyped character. Returns the delay after which the flash
    /// should be cleared, if flashing is enabled.
    pub fn on_mismatch(&mut self, policy: &TypingPolicy, now: Instant) -> Option<Duration> {
        self.has_typo = true;
        if policy.typo_flash {
            self.flash_started = Some(now);
            Some(policy.flash_duration)
        } else {
            None
        }
    }

    pub fn on_backspace(&mut self) {
        self.has_typo = false;
    }

    /// Clear the flash begun at `started`. A later typo restarts the flash,
    /// and the earlier typo's expiry must leave it running.
    pub fn clear_flash(&mut self, started: Instant) {
        if self.flash_started == Some(started) {
            self.flash_started = None;
        }
    }

    pub fn flash_active(&self, policy: &TypingPolicy, now: Instant) -> bool {
        match self.flash_started {
            Some(started) => now.saturating_duration_since(started) < policy.flash_duration,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blocking() -> TypingPolicy {
        TypingPolicy {
            block_on_typo: true,
            ..TypingPolicy::default()
        }
    }

    fn flashing(ms: u64) -> TypingPolicy {
        TypingPolicy {
            typo_flash: true,
            flash_duration: Duration::from_millis(ms),
            ..TypingPolicy::default()
        }
    }

    #[test]
    fn default_policy_never_blocks() {
        let mut state = TypoState::default();
        let policy = TypingPolicy::default();
        assert_eq!(state.on_mismatch(&policy, Instant::now()), None);
        assert!(state.accepts_input(&policy));
    }

    #[test]
    fn blocking_policy_rejects_until_backspace() {
        let mut state = TypoState::default();
        let policy = blocking();
        state.on_mismatch(&policy, Instant::now());
        assert!(!state.accepts_input(&policy));
        state.on_backspace();
        assert!(state.accepts_input(&policy));
    }

    #[test]
    fn flash_is_active_for_its_duration() {
        let mut state = TypoState::default();
        let policy = flashing(200);
        let t0 = Instant::now();

        assert_eq!(state.on_mismatch(&policy, t0), Some(Duration::from_millis(200)));
        assert!(state.flash_active(&policy, t0));
        assert!(state.flash_active(&policy, t0 + Duration::from_millis(199)));
        assert!(!state.flash_active(&policy, t0 + Duration::from_millis(200)));
    }

    #[test]
    fn clear_flash_resets_timestamp() {
        let mut state = TypoState::default();
        let policy = flashing(200);
        let t0 = Instant::now();
        state.on_mismatch(&policy, t0);
        state.clear_flash(t0);
        assert!(state.flash_started.is_none());
        assert!(!state.flash_active(&policy, t0));
    }

    #[test]
    fn clear_flash_ignores_an_older_start() {
        let mut state = TypoState::default();
        let policy = flashing(150);
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(100);
        state.on_mismatch(&policy, t0);
        state.on_mismatch(&policy, t1);

        state.clear_flash(t0);
        assert_eq!(state.flash_started, Some(t1));
        assert!(state.flash_active(&policy, t0 + Duration::from_millis(160)));
    }
}
