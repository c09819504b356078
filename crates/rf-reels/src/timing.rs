//! Timing profiles and the deferred action queue
//!
//! Nothing here blocks. "Wait two seconds" is a queued action that fires on
//! the first tick whose clock reaches its due time.

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Milliseconds covered by one tick unit at 60 Hz
pub const FRAME_MS_60HZ: f64 = 1000.0 / 60.0;

/// Timing profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimingProfile {
    /// Normal gameplay timing
    Normal,
    /// Fast/Turbo mode
    Turbo,
    /// Short spin with a gap between reel stops
    Studio,
    /// Hand-tuned values
    Custom,
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self::Normal
    }
}

/// Spin window and stop pacing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Profile type
    pub profile: TimingProfile,

    /// Time all reels spin freely before the stop phase begins (ms)
    pub spin_duration_ms: f64,

    /// Pause between reel N settling and reel N+1 receiving its target (ms)
    pub reel_stop_delay_ms: f64,

    /// Wall time represented by one tick unit (ms)
    pub frame_ms: f64,
}

impl TimingConfig {
    /// Normal gameplay timing
    pub fn normal() -> Self {
        Self {
            profile: TimingProfile::Normal,
            spin_duration_ms: 2000.0,
            reel_stop_delay_ms: 0.0,
            frame_ms: FRAME_MS_60HZ,
        }
    }

    /// Turbo mode
    pub fn turbo() -> Self {
        Self {
            profile: TimingProfile::Turbo,
            spin_duration_ms: 800.0,
            reel_stop_delay_ms: 0.0,
            frame_ms: FRAME_MS_60HZ,
        }
    }

    /// Studio mode (short spin, audible gap between reel stops)
    pub fn studio() -> Self {
        Self {
            profile: TimingProfile::Studio,
            spin_duration_ms: 600.0,
            reel_stop_delay_ms: 350.0,
            frame_ms: FRAME_MS_60HZ,
        }
    }

    /// Get config for profile
    pub fn from_profile(profile: TimingProfile) -> Self {
        match profile {
            TimingProfile::Normal => Self::normal(),
            TimingProfile::Turbo => Self::turbo(),
            TimingProfile::Studio => Self::studio(),
            TimingProfile::Custom => Self::normal(),
        }
    }

    /// Convert a tick delta into milliseconds
    pub fn tick_ms(&self, dt: f64) -> f64 {
        dt * self.frame_ms
    }

    pub fn validate(&self) -> ReelResult<()> {
        if !(self.spin_duration_ms.is_finite() && self.spin_duration_ms >= 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "spin duration must be non-negative, got {}",
                self.spin_duration_ms
            )));
        }
        if !(self.reel_stop_delay_ms.is_finite() && self.reel_stop_delay_ms >= 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "reel stop delay must be non-negative, got {}",
                self.reel_stop_delay_ms
            )));
        }
        if !(self.frame_ms.is_finite() && self.frame_ms > 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "frame length must be positive, got {}",
                self.frame_ms
            )));
        }
        Ok(())
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self::normal()
    }
}

#[derive(Debug, Clone)]
struct Deferred<T> {
    due_ms: f64,
    seq: u64,
    action: T,
}

/// Fire-after-duration queue on a monotonically advancing millisecond clock.
///
/// Actions due on the same tick fire in due-time order, ties broken by
/// scheduling order.
#[derive(Debug, Clone)]
pub struct DeferredQueue<T> {
    now_ms: f64,
    next_seq: u64,
    pending: Vec<Deferred<T>>,
}

impl<T> DeferredQueue<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0.0,
            next_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Current clock value
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    /// Queue `action` to fire once `delay_ms` has elapsed; returns its due time
    pub fn schedule(&mut self, delay_ms: f64, action: T) -> f64 {
        let due_ms = self.now_ms + delay_ms.max(0.0);
        self.pending.push(Deferred {
            due_ms,
            seq: self.next_seq,
            action,
        });
        self.next_seq += 1;
        due_ms
    }

    /// Advance the clock and return every action that became due
    pub fn advance(&mut self, elapsed_ms: f64) -> Vec<T> {
        self.now_ms += elapsed_ms.max(0.0);
        let now = self.now_ms;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|d| d.due_ms <= now);
        self.pending = pending;

        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.seq.cmp(&b.seq)));
        due.into_iter().map(|d| d.action).collect()
    }

    /// Number of actions still waiting
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_timing_profiles() {
        let normal = TimingConfig::normal();
        let turbo = TimingConfig::turbo();
        let studio = TimingConfig::studio();

        assert!(turbo.spin_duration_ms < normal.spin_duration_ms);
        assert!(studio.reel_stop_delay_ms > normal.reel_stop_delay_ms);
        assert_eq!(TimingConfig::from_profile(TimingProfile::Turbo), turbo);
        assert_relative_eq!(normal.tick_ms(60.0), 1000.0, epsilon = 1e-9);
    }

    #[test]
    fn test_deferred_fires_when_due() {
        let mut queue = DeferredQueue::new();
        queue.schedule(100.0, "late");
        queue.schedule(50.0, "early");
        assert_eq!(queue.len(), 2);

        assert!(queue.advance(40.0).is_empty());
        assert_eq!(queue.advance(10.0), vec!["early"]);
        assert_eq!(queue.advance(100.0), vec!["late"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_deferred_orders_same_tick() {
        let mut queue = DeferredQueue::new();
        queue.schedule(30.0, 3);
        queue.schedule(10.0, 1);
        queue.schedule(10.0, 2);
        queue.schedule(0.0, 0);
        assert_eq!(queue.advance(30.0), vec![0, 1, 2, 3]);
        assert_eq!(queue.now_ms(), 30.0);
    }
}
