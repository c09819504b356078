//! Win evaluation on the middle row

use serde::{Deserialize, Serialize};

use crate::outcome::TargetGrid;
use crate::symbols::SymbolId;

/// Outcome of evaluating a settled grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    pub is_win: bool,
    /// Matched symbol when winning; the wild itself for an all-wild row
    pub matched_symbol: Option<SymbolId>,
}

impl WinResult {
    pub fn win(symbol: SymbolId) -> Self {
        Self {
            is_win: true,
            matched_symbol: Some(symbol),
        }
    }

    pub fn no_win() -> Self {
        Self {
            is_win: false,
            matched_symbol: None,
        }
    }

    /// Banner text shown by the presentation layer
    pub fn banner_text(&self) -> Option<String> {
        match (&self.matched_symbol, self.is_win) {
            (Some(symbol), true) => Some(format!("WIN! {}", symbol)),
            _ => None,
        }
    }
}

/// Evaluate the middle row of `grid`.
///
/// The match symbol is the first non-wild symbol on the row (the wild if the
/// row is all wild). The row wins when every symbol is the match symbol or
/// wild. Grids with no reels, or a reel with no rows, never win.
pub fn evaluate(grid: &TargetGrid, wild: &SymbolId) -> WinResult {
    let line: Option<Vec<&SymbolId>> = grid.middle_row().into_iter().collect();
    match line {
        Some(line) => evaluate_line(&line, wild),
        None => WinResult::no_win(),
    }
}

/// Evaluate one line of symbols, left to right
pub fn evaluate_line(line: &[&SymbolId], wild: &SymbolId) -> WinResult {
    if line.is_empty() {
        return WinResult::no_win();
    }

    let match_symbol = line.iter().copied().find(|&s| s != wild).unwrap_or(wild);

    if line.iter().all(|&s| s == match_symbol || s == wild) {
        WinResult::win(match_symbol.clone())
    } else {
        WinResult::no_win()
    }
}
