//! Reel motion state machine
//!
//! ```text
//! Idle ──start_spin──> Spinning ──stop_spin──> Stopping ──snap──> Idle
//! ```
//!
//! While spinning every slot scrolls down by `speed * dt` per update. A slot
//! that passes the recycle threshold (one symbol below the viewport) jumps
//! back up by the full loop length and takes a new symbol: the next queued
//! target if a stop is in progress, random filler otherwise. The slot that
//! takes the last target is the settling slot; when it reaches row 0 the
//! whole reel is shifted rigidly so it lands exactly in register.

use std::collections::VecDeque;
use std::sync::Arc;

use rand::Rng;

use crate::config::{ReelPhysics, SlotConfig};
use crate::slot::SymbolSlot;
use crate::symbols::{SymbolAlphabet, SymbolId};

/// Reel motion state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReelState {
    /// At rest, window aligned
    Idle,
    /// Scrolling at spin speed with random filler
    Spinning,
    /// Decelerating while the target symbols emerge
    Stopping,
}

/// Completion signal returned by the update that snapped the reel
#[derive(Debug, Clone, PartialEq)]
pub struct ReelSettled {
    pub reel_index: usize,
    /// Visible window, top to bottom
    pub symbols: Vec<SymbolId>,
    /// Offset error removed by the final snap
    pub snap_error: f64,
}

/// A vertical strip of `rows + 2` recycled symbol slots
#[derive(Debug, Clone)]
pub struct Reel {
    index: usize,
    slots: Vec<SymbolSlot>,
    rows: usize,
    symbol_size: f64,
    physics: ReelPhysics,
    alphabet: Arc<SymbolAlphabet>,
    state: ReelState,
    speed: f64,
    /// Front = next symbol to emerge at the top of the loop
    pending: VecDeque<SymbolId>,
    /// Slot holding the last queued target
    settling: Option<usize>,
}

impl Reel {
    /// Create a reel at rest with random symbols, one buffer slot above the
    /// viewport and one below it
    pub fn new<R: Rng + ?Sized>(
        index: usize,
        config: &SlotConfig,
        alphabet: Arc<SymbolAlphabet>,
        rng: &mut R,
    ) -> Self {
        let rows = config.grid.rows as usize;
        let symbol_size = config.symbol_size;
        let slots = (0..config.grid.slots_per_reel())
            .map(|i| SymbolSlot::new(alphabet.random(rng), (i as f64 - 1.0) * symbol_size))
            .collect();

        Self {
            index,
            slots,
            rows,
            symbol_size,
            physics: config.physics,
            alphabet,
            state: ReelState::Idle,
            speed: 0.0,
            pending: VecDeque::new(),
            settling: None,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> ReelState {
        self.state
    }

    /// True from `start_spin` until the snap
    pub fn is_spinning(&self) -> bool {
        self.state != ReelState::Idle
    }

    pub fn is_stopping(&self) -> bool {
        self.state == ReelState::Stopping
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    pub fn slots(&self) -> &[SymbolSlot] {
        &self.slots
    }

    /// Targets not yet assigned to a slot
    pub fn pending_targets(&self) -> usize {
        self.pending.len()
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn symbol_size(&self) -> f64 {
        self.symbol_size
    }

    /// Height of the visible window
    pub fn view_height(&self) -> f64 {
        self.rows as f64 * self.symbol_size
    }

    /// Distance a slot travels before it wraps back to the top
    pub fn loop_length(&self) -> f64 {
        self.slots.len() as f64 * self.symbol_size
    }

    /// Offset at which a slot is recycled
    pub fn recycle_threshold(&self) -> f64 {
        self.view_height() + self.symbol_size
    }

    /// Symbols in the visible window, top to bottom.
    ///
    /// Exact once the reel is idle; mid-spin it reports the nearest rows.
    pub fn visible_symbols(&self) -> Vec<SymbolId> {
        let mut window: Vec<(i64, &SymbolSlot)> = self
            .slots
            .iter()
            .map(|s| (s.row(self.symbol_size), s))
            .filter(|(row, _)| *row >= 0 && (*row as usize) < self.rows)
            .collect();
        window.sort_by_key(|(row, _)| *row);
        window.into_iter().map(|(_, s)| s.symbol.clone()).collect()
    }

    /// Begin a spin cycle. Ignored unless idle.
    pub fn start_spin(&mut self) -> bool {
        if self.state != ReelState::Idle {
            log::debug!("reel {}: start_spin ignored in {:?}", self.index, self.state);
            return false;
        }

        self.state = ReelState::Spinning;
        self.pending.clear();
        self.settling = None;
        self.speed = self.physics.spin_speed;
        log::debug!("reel {}: spinning at {}", self.index, self.speed);
        true
    }

    /// Command the reel to land on `target` (top to bottom).
    ///
    /// Ignored unless spinning and not already stopping. A target whose
    /// length differs from the row count is logged and used as given.
    pub fn stop_spin(&mut self, target: &[SymbolId]) -> bool {
        if self.state != ReelState::Spinning {
            log::debug!("reel {}: stop_spin ignored in {:?}", self.index, self.state);
            return false;
        }

        if target.len() != self.rows {
            log::warn!(
                "reel {}: target length mismatch (expected {}, got {})",
                self.index,
                self.rows,
                target.len()
            );
        }
        if let Some(unknown) = target.iter().find(|s| !self.alphabet.contains(s)) {
            log::warn!("reel {}: target symbol {} is not in the alphabet", self.index, unknown);
        }

        // Slots enter from the top, so the bottom row has to be assigned first
        self.pending = target.iter().rev().cloned().collect();
        self.state = ReelState::Stopping;
        log::debug!("reel {}: stopping on {:?}", self.index, target);
        true
    }

    /// Advance motion by `dt` tick units.
    ///
    /// Returns the completion signal on the update that snaps the reel, once
    /// per accepted `stop_spin`.
    pub fn update<R: Rng + ?Sized>(&mut self, dt: f64, rng: &mut R) -> Option<ReelSettled> {
        if self.state == ReelState::Idle {
            return None;
        }

        if self.state == ReelState::Stopping {
            self.speed = (self.speed * self.physics.decay_rate).max(self.physics.min_speed);
        }

        let step = self.speed * dt.max(0.0);
        for slot in &mut self.slots {
            slot.offset += step;
        }

        self.recycle(rng);

        match self.settling {
            Some(idx) if self.slots[idx].offset >= 0.0 => Some(self.finalize(idx)),
            _ => None,
        }
    }

    fn recycle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let threshold = self.recycle_threshold();
        let loop_length = self.loop_length();

        // Deepest slot first: it crossed the threshold earliest
        while let Some(idx) = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.offset >= threshold)
            .max_by(|(_, a), (_, b)| a.offset.total_cmp(&b.offset))
            .map(|(i, _)| i)
        {
            self.slots[idx].offset -= loop_length;

            match self.pending.pop_front() {
                Some(symbol) => {
                    self.slots[idx].symbol = symbol;
                    if self.pending.is_empty() {
                        self.settling = Some(idx);
                    }
                }
                None if self.settling.is_none() => {
                    self.slots[idx].symbol = self.alphabet.random(rng);
                    // Empty target: settle on whatever emerges next
                    if self.state == ReelState::Stopping {
                        self.settling = Some(idx);
                    }
                }
                // Placed results stay put
                None => {}
            }
        }
    }

    fn finalize(&mut self, settling: usize) -> ReelSettled {
        let error = self.slots[settling].offset;
        let slot_count = self.slots.len() as i64;
        let size = self.symbol_size;
        for slot in &mut self.slots {
            slot.offset -= error;
            // Re-seat into [-size, loop - size); only moves anything when a
            // coarse tick carried the reel more than a row past the snap point
            let row = slot.row(size);
            let seated = (row + 1).rem_euclid(slot_count) - 1;
            slot.offset += (seated - row) as f64 * size;
        }

        self.state = ReelState::Idle;
        self.speed = 0.0;
        self.settling = None;

        let symbols = self.visible_symbols();
        log::debug!("reel {}: settled on {:?} (snap {:.3})", self.index, symbols, error);
        ReelSettled {
            reel_index: self.index,
            symbols,
            snap_error: error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn ids(symbols: &[&str]) -> Vec<SymbolId> {
        symbols.iter().map(|&s| SymbolId::from(s)).collect()
    }

    fn reel_with(config: &SlotConfig, rng: &mut ChaCha8Rng) -> Reel {
        let alphabet = Arc::new(config.alphabet().unwrap());
        Reel::new(0, config, alphabet, rng)
    }

    fn run_until_settled(reel: &mut Reel, dt: f64, rng: &mut ChaCha8Rng) -> ReelSettled {
        for _ in 0..10_000 {
            if let Some(settled) = reel.update(dt, rng) {
                return settled;
            }
        }
        panic!("reel never settled");
    }

    fn assert_rigid(reel: &Reel) {
        let mut offsets: Vec<f64> = reel.slots().iter().map(|s| s.offset).collect();
        offsets.sort_by(f64::total_cmp);
        for pair in offsets.windows(2) {
            assert_abs_diff_eq!(pair[1] - pair[0], reel.symbol_size(), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_initial_layout() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let config = SlotConfig::classic();
        let reel = reel_with(&config, &mut rng);

        assert_eq!(reel.slots().len(), 5);
        assert_eq!(reel.slots()[0].offset, -240.0);
        assert_eq!(reel.slots()[4].offset, 720.0);
        assert_eq!(reel.visible_symbols().len(), 3);
        assert_eq!(reel.recycle_threshold(), 960.0);
        assert_eq!(reel.loop_length(), 1200.0);
        assert_eq!(reel.state(), ReelState::Idle);
    }

    #[test]
    fn test_idle_update_is_noop() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let before = reel.slots().to_vec();

        assert!(reel.update(1.0, &mut rng).is_none());
        assert_eq!(reel.slots(), &before[..]);
    }

    #[test]
    fn test_start_spin_does_not_move_slots() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let before = reel.slots().to_vec();

        assert!(reel.start_spin());
        assert_eq!(reel.speed(), 25.0);
        assert_eq!(reel.slots(), &before[..]);

        reel.update(1.0, &mut rng);
        assert_abs_diff_eq!(reel.slots()[0].offset, before[0].offset + 25.0, epsilon = 1e-9);
    }

    #[test]
    fn test_lands_on_target() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let target = ids(&["Seven", "Cherry", "Bell"]);

        reel.start_spin();
        for _ in 0..37 {
            assert!(reel.update(1.0, &mut rng).is_none());
        }
        assert!(reel.stop_spin(&target));

        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols, target);
        assert_eq!(reel.visible_symbols(), target);
        assert_eq!(reel.state(), ReelState::Idle);
        assert_eq!(reel.speed(), 0.0);
        assert_rigid(&reel);
    }

    #[test]
    fn test_lands_on_target_with_coarse_ticks() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let config = SlotConfig::five_reel();
        let target = ids(&["Wild", "Wild", "Plum"]);

        // Large deltas cross several slots per update
        for dt in [3.7, 11.0, 40.0, 123.0] {
            let mut reel = reel_with(&config, &mut rng);
            reel.start_spin();
            reel.update(dt, &mut rng);
            reel.stop_spin(&target);
            let settled = run_until_settled(&mut reel, dt, &mut rng);
            assert_eq!(settled.symbols, target, "dt = {dt}");
            assert_rigid(&reel);
        }
    }

    #[test]
    fn test_snap_removes_overshoot() {
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        reel.start_spin();
        reel.stop_spin(&ids(&["Bar", "Bar", "Bar"]));
        let settled = run_until_settled(&mut reel, 1.0, &mut rng);

        assert!(settled.snap_error >= 0.0);
        assert!(settled.snap_error < reel.physics.spin_speed);
        let mut rows: Vec<f64> = reel.slots().iter().map(|s| s.offset / 240.0).collect();
        rows.sort_by(f64::total_cmp);
        for (expected, row) in (-1..=3).zip(rows) {
            assert_abs_diff_eq!(row, expected as f64, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_deceleration_is_floored() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        reel.start_spin();
        reel.stop_spin(&ids(&["Bar", "Bell", "Plum"]));
        reel.update(1.0, &mut rng);
        assert_abs_diff_eq!(reel.speed(), 24.0, epsilon = 1e-9);

        let mut last = reel.speed();
        while reel.is_spinning() {
            reel.update(1.0, &mut rng);
            if reel.is_spinning() {
                assert!(reel.speed() <= last);
                assert!(reel.speed() >= 15.0);
                last = reel.speed();
            }
        }
    }

    #[test]
    fn test_recycling_preserves_spacing() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let initial_spread = 4.0 * 240.0;

        reel.start_spin();
        for _ in 0..500 {
            reel.update(1.3, &mut rng);
            assert_eq!(reel.slots().len(), 5);
            assert_rigid(&reel);
            let min = reel.slots().iter().map(|s| s.offset).fold(f64::MAX, f64::min);
            let max = reel.slots().iter().map(|s| s.offset).fold(f64::MIN, f64::max);
            assert_abs_diff_eq!(max - min, initial_spread, epsilon = 1e-6);
            assert!(max < reel.recycle_threshold());
        }
    }

    #[test]
    fn test_settle_signal_fires_once() {
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        reel.start_spin();
        reel.stop_spin(&ids(&["Lemon", "Lemon", "Lemon"]));
        run_until_settled(&mut reel, 1.0, &mut rng);

        for _ in 0..200 {
            assert!(reel.update(1.0, &mut rng).is_none());
        }
    }

    #[test]
    fn test_guards_ignore_out_of_order_calls() {
        let mut rng = ChaCha8Rng::seed_from_u64(10);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let target = ids(&["Bar", "Bell", "Plum"]);

        assert!(!reel.stop_spin(&target));
        assert_eq!(reel.state(), ReelState::Idle);

        assert!(reel.start_spin());
        assert!(!reel.start_spin());
        assert!(reel.stop_spin(&target));
        assert!(!reel.stop_spin(&ids(&["Wild", "Wild", "Wild"])));
        assert!(!reel.start_spin());
        assert_eq!(reel.pending_targets(), 3);

        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols, target);
    }

    #[test]
    fn test_placed_results_are_not_overwritten() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut config = SlotConfig::classic();
        // Floor speed above one row per tick forces extra recycles after placement
        config.physics.min_speed = 300.0;
        config.physics.spin_speed = 300.0;
        let mut reel = reel_with(&config, &mut rng);
        let target = ids(&["Diamond", "Seven", "Diamond"]);

        reel.start_spin();
        reel.stop_spin(&target);
        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols, target);
    }

    #[test]
    fn test_short_target_still_settles() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        reel.start_spin();
        assert!(reel.stop_spin(&ids(&["Seven"])));
        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols.len(), 3);
        assert_eq!(settled.symbols[0], "Seven");
    }

    #[test]
    fn test_long_target_keeps_leading_rows() {
        let mut rng = ChaCha8Rng::seed_from_u64(13);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let target = ids(&["Bar", "Bell", "Plum", "Seven", "Lemon"]);

        reel.start_spin();
        reel.stop_spin(&target);
        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols, target[..3].to_vec());
    }

    #[test]
    fn test_foreign_symbol_is_placed_as_given() {
        let mut rng = ChaCha8Rng::seed_from_u64(16);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);
        let target = ids(&["Seven", "Joker", "Bell"]);

        reel.start_spin();
        assert!(reel.stop_spin(&target));
        assert_eq!(reel.pending_targets(), 3);

        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols, target);
        assert_eq!(reel.visible_symbols()[1], "Joker");
    }

    #[test]
    fn test_empty_target_settles_on_next_recycle() {
        let mut rng = ChaCha8Rng::seed_from_u64(14);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        reel.start_spin();
        assert!(reel.stop_spin(&[]));
        let settled = run_until_settled(&mut reel, 1.0, &mut rng);
        assert_eq!(settled.symbols.len(), 3);
        assert!(!reel.is_spinning());
    }

    #[test]
    fn test_reel_is_reusable() {
        let mut rng = ChaCha8Rng::seed_from_u64(15);
        let config = SlotConfig::classic();
        let mut reel = reel_with(&config, &mut rng);

        for target in [
            ids(&["Bar", "Bell", "Plum"]),
            ids(&["Wild", "Cherry", "Wild"]),
            ids(&["Seven", "Seven", "Seven"]),
        ] {
            assert!(reel.start_spin());
            for _ in 0..20 {
                reel.update(1.0, &mut rng);
            }
            reel.stop_spin(&target);
            assert_eq!(run_until_settled(&mut reel, 1.0, &mut rng).symbols, target);
        }
    }
}
