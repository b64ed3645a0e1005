/*!
Autosave scheduling: a cooperative, clockless timer.

The scheduler never performs a save itself; it only decides, per tick,
whether one is due. The owning orchestrator feeds it elapsed time and game
events and invokes the save path when a tick returns true. Keeping it
clockless makes the cadence fully deterministic under test.
*/

use std::time::Duration;
use tracing::debug;

/// Default delay between a game event and the autosave it requests,
/// coalescing bursts like a scene transition immediately followed by a
/// pause.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Discrete game events that request an autosave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutosaveTrigger {
    LevelUp,
    QuestCompleted,
    SceneTransition,
    Paused,
    FocusLost,
}

/// Accumulates elapsed time and trigger debounces; fires at most one save
/// decision per tick.
#[derive(Debug, Clone)]
pub struct AutosaveScheduler {
    enabled: bool,
    interval: Duration,
    debounce: Duration,
    elapsed: Duration,
    /// Remaining debounce countdown after a trigger, when armed
    pending: Option<Duration>,
}

impl AutosaveScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            enabled: true,
            interval,
            debounce: DEFAULT_DEBOUNCE,
            elapsed: Duration::ZERO,
            pending: None,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enable or disable both the interval and event-triggered paths.
    ///
    /// Disabling clears accumulated time and any armed debounce, but a save
    /// decision already returned by `tick` is not retracted; saves in flight
    /// are never cancelled.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.elapsed = Duration::ZERO;
            self.pending = None;
        }
    }

    /// Record a discrete trigger, (re)arming the debounce countdown.
    pub fn notify(&mut self, trigger: AutosaveTrigger) {
        if !self.enabled {
            return;
        }
        debug!(?trigger, "autosave trigger received");
        self.pending = Some(self.debounce);
    }

    /// Advance the scheduler by `dt`; returns true when a save is due now.
    ///
    /// A fire from either path resets the interval accumulator, so an
    /// event-triggered save pushes the next timed save a full interval out.
    pub fn tick(&mut self, dt: Duration) -> bool {
        if !self.enabled {
            return false;
        }

        if let Some(remaining) = self.pending {
            if remaining <= dt {
                self.pending = None;
                self.elapsed = Duration::ZERO;
                return true;
            }
            self.pending = Some(remaining - dt);
        }

        self.elapsed += dt;
        if self.elapsed >= self.interval {
            self.elapsed = Duration::ZERO;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TICK: Duration = Duration::from_millis(100);

    fn scheduler(interval_secs: u64) -> AutosaveScheduler {
        AutosaveScheduler::new(Duration::from_secs(interval_secs))
    }

    #[test]
    fn test_interval_fires_and_resets() {
        let mut s = scheduler(1);

        for _ in 0..9 {
            assert!(!s.tick(TICK));
        }
        assert!(s.tick(TICK));

        // Accumulator reset: another full interval before the next fire
        for _ in 0..9 {
            assert!(!s.tick(TICK));
        }
        assert!(s.tick(TICK));
    }

    #[test]
    fn test_trigger_fires_after_debounce() {
        let mut s = scheduler(3600).with_debounce(Duration::from_millis(250));

        s.notify(AutosaveTrigger::QuestCompleted);
        assert!(!s.tick(TICK));
        assert!(!s.tick(TICK));
        assert!(s.tick(TICK));
        // One-shot: nothing further pending
        assert!(!s.tick(TICK));
    }

    #[test]
    fn test_trigger_burst_coalesces() {
        let mut s = scheduler(3600).with_debounce(Duration::from_millis(200));

        s.notify(AutosaveTrigger::SceneTransition);
        assert!(!s.tick(TICK));
        // A second trigger mid-countdown re-arms the debounce
        s.notify(AutosaveTrigger::Paused);
        assert!(!s.tick(TICK));
        assert!(s.tick(TICK));
        assert!(!s.tick(TICK));
    }

    #[test]
    fn test_event_fire_resets_interval_accumulator() {
        let mut s = scheduler(1).with_debounce(Duration::ZERO);

        for _ in 0..5 {
            assert!(!s.tick(TICK));
        }
        s.notify(AutosaveTrigger::LevelUp);
        assert!(s.tick(TICK));

        // The timed path starts over from zero
        for _ in 0..9 {
            assert!(!s.tick(TICK));
        }
        assert!(s.tick(TICK));
    }

    #[test]
    fn test_disable_clears_both_paths() {
        let mut s = scheduler(1).with_debounce(Duration::from_millis(100));

        for _ in 0..9 {
            s.tick(TICK);
        }
        s.notify(AutosaveTrigger::FocusLost);
        s.set_enabled(false);

        assert!(!s.tick(TICK));
        assert!(!s.tick(Duration::from_secs(10)));

        s.notify(AutosaveTrigger::Paused);
        assert!(!s.tick(Duration::from_secs(10)));

        // Re-enabling starts from a clean accumulator
        s.set_enabled(true);
        assert!(!s.tick(TICK));
    }
}
