//! Stage events: what the presentation layer reacts to
//!
//! A stage is the semantic meaning of a moment in the spin cycle, not a
//! draw call. Renderers dim the trigger on `SpinStart`, release it on
//! `SpinEnd`, and show or clear the win banner on `WinPresent` / `NoWin`.

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// Canonical spin-cycle stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Stage {
    // ═══════════════════════════════════════════════════════════════════════
    // SPIN LIFECYCLE
    // ═══════════════════════════════════════════════════════════════════════
    /// Trigger accepted, cycle active
    SpinStart,

    /// Reel started scrolling
    ReelSpinning {
        /// Which reel (0-indexed)
        reel_index: u8,
    },

    /// Reel received its target and is decelerating
    ReelStopRequested {
        reel_index: u8,
        /// Commanded symbols (top to bottom)
        #[serde(default)]
        symbols: Vec<SymbolId>,
    },

    /// Reel snapped into register
    ReelStop {
        reel_index: u8,
        /// Visible symbols (top to bottom)
        #[serde(default)]
        symbols: Vec<SymbolId>,
    },

    /// All reels stopped, middle row being evaluated
    EvaluateWins,

    /// Middle row won
    WinPresent { symbol: SymbolId },

    /// Middle row lost; any previous banner is cleared
    NoWin,

    /// Cycle complete, trigger re-enabled
    SpinEnd,

    // ═══════════════════════════════════════════════════════════════════════
    // DEBUG
    // ═══════════════════════════════════════════════════════════════════════
    /// Force-win flag changed
    ForceWinArmed { armed: bool },
}

impl Stage {
    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        match self {
            Stage::SpinStart => "spin_start",
            Stage::ReelSpinning { .. } => "reel_spinning",
            Stage::ReelStopRequested { .. } => "reel_stop_requested",
            Stage::ReelStop { .. } => "reel_stop",
            Stage::EvaluateWins => "evaluate_wins",
            Stage::WinPresent { .. } => "win_present",
            Stage::NoWin => "no_win",
            Stage::SpinEnd => "spin_end",
            Stage::ForceWinArmed { .. } => "force_win_armed",
        }
    }

    /// Reel this stage concerns, if any
    pub fn reel_index(&self) -> Option<u8> {
        match self {
            Stage::ReelSpinning { reel_index }
            | Stage::ReelStopRequested { reel_index, .. }
            | Stage::ReelStop { reel_index, .. } => Some(*reel_index),
            _ => None,
        }
    }
}

/// A stage occurrence on the machine clock
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEvent {
    /// The canonical stage
    pub stage: Stage,

    /// Milliseconds since the machine was created
    pub timestamp_ms: f64,

    /// Spin cycle this event belongs to (0 before the first spin)
    #[serde(default)]
    pub spin_index: u64,
}

impl StageEvent {
    pub fn new(stage: Stage, timestamp_ms: f64, spin_index: u64) -> Self {
        Self {
            stage,
            timestamp_ms,
            spin_index,
        }
    }

    /// Get stage type name
    pub fn type_name(&self) -> &'static str {
        self.stage.type_name()
    }
}
