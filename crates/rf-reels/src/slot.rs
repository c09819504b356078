//! A single positioned symbol holder

use serde::{Deserialize, Serialize};

use crate::symbols::SymbolId;

/// One symbol slot on a reel.
///
/// `offset` grows downward from the top of the viewport; a slot at rest in
/// row `r` sits at `r * symbol_size`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolSlot {
    pub symbol: SymbolId,
    pub offset: f64,
}

impl SymbolSlot {
    pub fn new(symbol: SymbolId, offset: f64) -> Self {
        Self { symbol, offset }
    }

    /// Nearest row index for this offset (may be negative or past the window)
    pub fn row(&self, symbol_size: f64) -> i64 {
        (self.offset / symbol_size).round() as i64
    }
}
