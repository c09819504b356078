//! Spin orchestration
//!
//! ```text
//! handle_spin ──> all reels start ──(spin_duration_ms)──> stop phase
//!   stop phase: generate TargetGrid, stop reel 0
//!   reel i settled ──(reel_stop_delay_ms)──> stop reel i+1
//!   last reel settled ──> SpinEnd, evaluate middle row
//! ```
//!
//! Everything runs inside `tick`. Deferred steps sit in a timer queue on
//! the machine clock; reel completion is consumed in the same tick it is
//! reported, before the next reel moves.

use std::collections::BTreeMap;
use std::sync::Arc;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SlotConfig;
use crate::error::ReelResult;
use crate::evaluate::{WinResult, evaluate};
use crate::outcome::{TargetGrid, generate};
use crate::reel::{Reel, ReelSettled};
use crate::stage::{Stage, StageEvent};
use crate::symbols::SymbolAlphabet;
use crate::timing::DeferredQueue;

/// Stage events retained between drains. When full, the oldest half is dropped.
pub const MAX_BUFFERED_EVENTS: usize = 1024;

/// Session statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub total_spins: u64,
    pub wins: u64,
    pub losses: u64,
    /// Spins whose outcome was forced to win
    pub forced_spins: u64,
    /// Wins keyed by matched symbol
    pub wins_by_symbol: BTreeMap<String, u64>,
}

impl SessionStats {
    /// Calculate hit rate (%)
    pub fn hit_rate(&self) -> f64 {
        if self.total_spins > 0 {
            (self.wins as f64 / self.total_spins as f64) * 100.0
        } else {
            0.0
        }
    }

    fn record(&mut self, result: &WinResult, forced: bool) {
        self.total_spins += 1;
        if forced {
            self.forced_spins += 1;
        }
        match (&result.matched_symbol, result.is_win) {
            (Some(symbol), true) => {
                self.wins += 1;
                *self.wins_by_symbol.entry(symbol.to_string()).or_default() += 1;
            }
            _ => self.losses += 1,
        }
    }
}

/// Deferred orchestration step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Deferred {
    /// Spin window elapsed: generate the outcome and stop reel 0
    StopPhase,
    /// Pause after the previous reel elapsed: stop this reel
    StopReel(usize),
}

/// The one in-flight spin cycle
#[derive(Debug, Clone, Default)]
struct SpinCycle {
    grid: Option<TargetGrid>,
    forced: bool,
    /// Reel currently decelerating toward its target
    stopping_reel: Option<usize>,
}

/// Slot machine: owns the reels and drives one spin cycle at a time
#[derive(Debug)]
pub struct SlotMachine {
    config: SlotConfig,
    alphabet: Arc<SymbolAlphabet>,
    reels: Vec<Reel>,
    rng: ChaCha8Rng,
    timers: DeferredQueue<Deferred>,
    cycle: Option<SpinCycle>,
    force_win: bool,
    events: Vec<StageEvent>,
    last_grid: Option<TargetGrid>,
    last_result: Option<WinResult>,
    stats: SessionStats,
    spin_count: u64,
}

impl SlotMachine {
    /// Create a machine seeded from the OS
    pub fn new(config: SlotConfig) -> ReelResult<Self> {
        Self::with_rng(config, ChaCha8Rng::from_os_rng())
    }

    /// Create a machine with reproducible reels and outcomes
    pub fn with_seed(config: SlotConfig, seed: u64) -> ReelResult<Self> {
        Self::with_rng(config, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(config: SlotConfig, mut rng: ChaCha8Rng) -> ReelResult<Self> {
        config.validate()?;
        let alphabet = Arc::new(config.alphabet()?);
        let reels = (0..config.grid.reels as usize)
            .map(|i| Reel::new(i, &config, Arc::clone(&alphabet), &mut rng))
            .collect();

        log::info!(
            "slot machine ready: {}x{} grid, {} symbols, wild {}",
            config.grid.reels,
            config.grid.rows,
            alphabet.len(),
            alphabet.wild()
        );

        Ok(Self {
            config,
            alphabet,
            reels,
            rng,
            timers: DeferredQueue::new(),
            cycle: None,
            force_win: false,
            events: Vec::new(),
            last_grid: None,
            last_result: None,
            stats: SessionStats::default(),
            spin_count: 0,
        })
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // STATE
    // ═══════════════════════════════════════════════════════════════════════════

    pub fn config(&self) -> &SlotConfig {
        &self.config
    }

    pub fn alphabet(&self) -> &SymbolAlphabet {
        &self.alphabet
    }

    pub fn reels(&self) -> &[Reel] {
        &self.reels
    }

    /// True from an accepted `handle_spin` until the last reel settles
    pub fn is_cycle_active(&self) -> bool {
        self.cycle.is_some()
    }

    /// Whether the spin trigger should be shown as enabled
    pub fn trigger_enabled(&self) -> bool {
        !self.is_cycle_active()
    }

    /// Target grid of the active cycle, once generated
    pub fn current_grid(&self) -> Option<&TargetGrid> {
        self.cycle.as_ref().and_then(|c| c.grid.as_ref())
    }

    /// Reel currently decelerating, if any
    pub fn stopping_reel(&self) -> Option<usize> {
        self.cycle.as_ref().and_then(|c| c.stopping_reel)
    }

    pub fn last_grid(&self) -> Option<&TargetGrid> {
        self.last_grid.as_ref()
    }

    pub fn last_result(&self) -> Option<&WinResult> {
        self.last_result.as_ref()
    }

    /// Win banner for the last completed cycle
    pub fn banner_text(&self) -> Option<String> {
        self.last_result.as_ref().and_then(WinResult::banner_text)
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Number of spin cycles accepted so far
    pub fn spin_count(&self) -> u64 {
        self.spin_count
    }

    /// Deferred steps waiting on the clock
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Machine clock (ms)
    pub fn now_ms(&self) -> f64 {
        self.timers.now_ms()
    }

    /// Events emitted since the last drain, oldest first
    pub fn events(&self) -> &[StageEvent] {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<StageEvent> {
        std::mem::take(&mut self.events)
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CONTROL
    // ═══════════════════════════════════════════════════════════════════════════

    /// Reseed the random source for reproducible outcomes
    pub fn seed(&mut self, seed: u64) {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
    }

    pub fn force_win_armed(&self) -> bool {
        self.force_win
    }

    /// Arm or disarm a forced win for the next generated outcome
    pub fn set_force_win(&mut self, armed: bool) {
        if self.force_win != armed {
            self.force_win = armed;
            log::info!("force win: {}", armed);
            self.emit(Stage::ForceWinArmed { armed });
        }
    }

    pub fn toggle_force_win(&mut self) -> bool {
        self.set_force_win(!self.force_win);
        self.force_win
    }

    /// Spin trigger. Ignored while a cycle is active.
    pub fn handle_spin(&mut self) -> bool {
        if self.cycle.is_some() {
            log::debug!("spin ignored: cycle {} still active", self.spin_count);
            return false;
        }

        self.spin_count += 1;
        self.cycle = Some(SpinCycle::default());
        self.emit(Stage::SpinStart);

        for i in 0..self.reels.len() {
            if self.reels[i].start_spin() {
                self.emit(Stage::ReelSpinning { reel_index: i as u8 });
            }
        }

        self.timers
            .schedule(self.config.timing.spin_duration_ms, Deferred::StopPhase);
        log::info!("spin {} started", self.spin_count);
        true
    }

    /// Advance the machine by `dt` tick units.
    ///
    /// Emitted stage events accumulate until `drain_events` is called; hosts
    /// should drain once per frame.
    pub fn tick(&mut self, dt: f64) {
        let dt = dt.max(0.0);
        let elapsed_ms = self.config.timing.tick_ms(dt);

        for action in self.timers.advance(elapsed_ms) {
            match action {
                Deferred::StopPhase => self.begin_stop_phase(),
                Deferred::StopReel(index) => self.stop_reel(index),
            }
        }

        for i in 0..self.reels.len() {
            if let Some(settled) = self.reels[i].update(dt, &mut self.rng) {
                self.on_reel_settled(settled);
            }
        }
    }

    /// Tick until the active cycle completes; `None` if it is still running
    /// after `max_ticks` or no cycle was active. Events are left buffered for
    /// the caller to drain.
    pub fn run_to_completion(&mut self, dt: f64, max_ticks: usize) -> Option<WinResult> {
        if !self.is_cycle_active() {
            return None;
        }
        for _ in 0..max_ticks {
            self.tick(dt);
            if !self.is_cycle_active() {
                return self.last_result.clone();
            }
        }
        log::warn!("spin {} still active after {} ticks", self.spin_count, max_ticks);
        None
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // CYCLE STEPS
    // ═══════════════════════════════════════════════════════════════════════════

    fn begin_stop_phase(&mut self) {
        if self.cycle.is_none() {
            return;
        }

        let forced = std::mem::take(&mut self.force_win);
        if forced {
            self.emit(Stage::ForceWinArmed { armed: false });
        }

        let grid = generate(
            &self.alphabet,
            self.config.grid.reels as usize,
            self.config.grid.rows as usize,
            forced,
            &mut self.rng,
        );

        if let Some(cycle) = self.cycle.as_mut() {
            cycle.grid = Some(grid);
            cycle.forced = forced;
        }
        self.stop_reel(0);
    }

    fn stop_reel(&mut self, index: usize) {
        let Some(target) = self
            .current_grid()
            .and_then(|grid| grid.column(index))
            .map(<[_]>::to_vec)
        else {
            log::warn!("no target for reel {}", index);
            return;
        };

        let Some(reel) = self.reels.get_mut(index) else {
            log::warn!("stop requested for missing reel {}", index);
            return;
        };

        if reel.stop_spin(&target) {
            if let Some(cycle) = self.cycle.as_mut() {
                cycle.stopping_reel = Some(index);
            }
            self.emit(Stage::ReelStopRequested {
                reel_index: index as u8,
                symbols: target,
            });
        }
    }

    fn on_reel_settled(&mut self, settled: ReelSettled) {
        let index = settled.reel_index;
        self.emit(Stage::ReelStop {
            reel_index: index as u8,
            symbols: settled.symbols,
        });
        if let Some(cycle) = self.cycle.as_mut() {
            cycle.stopping_reel = None;
        }

        let next = index + 1;
        if next < self.reels.len() {
            let delay = self.config.timing.reel_stop_delay_ms;
            if delay > 0.0 {
                self.timers.schedule(delay, Deferred::StopReel(next));
            } else {
                self.stop_reel(next);
            }
        } else {
            self.finish_cycle();
        }
    }

    fn finish_cycle(&mut self) {
        let Some(cycle) = self.cycle.take() else {
            return;
        };
        self.emit(Stage::SpinEnd);

        let Some(grid) = cycle.grid else {
            log::warn!("spin {} finished without an outcome", self.spin_count);
            return;
        };

        self.emit(Stage::EvaluateWins);
        let result = evaluate(&grid, self.alphabet.wild());
        self.stats.record(&result, cycle.forced);

        match (&result.matched_symbol, result.is_win) {
            (Some(symbol), true) => {
                log::info!("spin {}: WIN! {}", self.spin_count, symbol);
                self.emit(Stage::WinPresent {
                    symbol: symbol.clone(),
                });
            }
            _ => {
                log::info!("spin {}: no win", self.spin_count);
                self.emit(Stage::NoWin);
            }
        }

        self.last_grid = Some(grid);
        self.last_result = Some(result);
    }

    fn emit(&mut self, stage: Stage) {
        if self.events.len() >= MAX_BUFFERED_EVENTS {
            let dropped = MAX_BUFFERED_EVENTS / 2;
            self.events.drain(..dropped);
            log::debug!("event buffer full, dropped {} undrained events", dropped);
        }
        self.events
            .push(StageEvent::new(stage, self.timers.now_ms(), self.spin_count));
    }
}
