//! Outcome generation: the symbols each reel is commanded to land on

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::symbols::{SymbolAlphabet, SymbolId};

/// Row evaluated for wins in a column of `rows` symbols
pub fn middle_row_index(rows: usize) -> usize {
    rows / 2
}

/// Commanded final window for every reel (reels × rows, each column top to
/// bottom). Produced once per spin cycle and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetGrid {
    columns: Vec<Vec<SymbolId>>,
}

impl TargetGrid {
    pub fn from_columns(columns: Vec<Vec<SymbolId>>) -> Self {
        Self { columns }
    }

    /// Build from string literals, mostly for tests and fixtures
    pub fn from_strs<C, S>(columns: C) -> Self
    where
        C: IntoIterator,
        C::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns
                .into_iter()
                .map(|col| col.into_iter().map(|s| SymbolId::new(s)).collect())
                .collect(),
        }
    }

    pub fn columns(&self) -> &[Vec<SymbolId>] {
        &self.columns
    }

    pub fn column(&self, reel: usize) -> Option<&[SymbolId]> {
        self.columns.get(reel).map(Vec::as_slice)
    }

    pub fn reels(&self) -> usize {
        self.columns.len()
    }

    /// Symbol at the middle of each column (row `len / 2`), `None` for an
    /// empty column
    pub fn middle_row(&self) -> Vec<Option<&SymbolId>> {
        self.columns.iter().map(|col| col.get(middle_row_index(col.len()))).collect()
    }

    /// One row across all reels
    pub fn row(&self, row: usize) -> Vec<Option<&SymbolId>> {
        self.columns.iter().map(|col| col.get(row)).collect()
    }
}

/// Generate the next target grid.
///
/// Every cell is an independent uniform draw from the alphabet. With
/// `force_win` one symbol is drawn up front and placed on the middle row of
/// every reel; the other rows stay random.
pub fn generate<R: Rng + ?Sized>(
    alphabet: &SymbolAlphabet,
    reels: usize,
    rows: usize,
    force_win: bool,
    rng: &mut R,
) -> TargetGrid {
    let win_symbol = force_win.then(|| alphabet.random(rng));
    let middle = middle_row_index(rows);

    let columns = (0..reels)
        .map(|_| {
            (0..rows)
                .map(|row| match &win_symbol {
                    Some(symbol) if row == middle => symbol.clone(),
                    _ => alphabet.random(rng),
                })
                .collect()
        })
        .collect();

    let grid = TargetGrid { columns };
    match &win_symbol {
        Some(symbol) => log::info!("forced win on {}: {:?}", symbol, grid.columns),
        None => log::debug!("outcome: {:?}", grid.columns),
    }
    grid
}
