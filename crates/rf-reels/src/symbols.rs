//! Symbol identifiers and the alphabet a machine draws from

use std::collections::HashSet;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};

/// Symbol identifier (e.g. "Cherry", "Wild")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SymbolId(String);

impl SymbolId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SymbolId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for SymbolId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PartialEq<str> for SymbolId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for SymbolId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Ordered set of distinct symbols with one designated wild.
///
/// Fixed for the lifetime of a machine and shared read-only by every reel.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolAlphabet {
    symbols: Vec<SymbolId>,
    wild_index: usize,
}

impl SymbolAlphabet {
    /// Build an alphabet, rejecting empty sets, duplicates and a foreign wild
    pub fn new<I, S>(symbols: I, wild: impl Into<String>) -> ReelResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let symbols: Vec<SymbolId> = symbols.into_iter().map(|s| SymbolId(s.into())).collect();
        if symbols.is_empty() {
            return Err(ReelError::EmptyAlphabet);
        }

        let mut seen = HashSet::with_capacity(symbols.len());
        for symbol in &symbols {
            if !seen.insert(symbol.as_str()) {
                return Err(ReelError::DuplicateSymbol(symbol.to_string()));
            }
        }

        let wild = wild.into();
        let wild_index = symbols
            .iter()
            .position(|s| s.as_str() == wild)
            .ok_or(ReelError::UnknownWild(wild))?;

        Ok(Self {
            symbols,
            wild_index,
        })
    }

    /// Classic fruit-machine set: seven regular symbols plus "Wild"
    pub fn classic() -> Self {
        Self {
            symbols: CLASSIC_SYMBOLS.iter().map(|&s| SymbolId::from(s)).collect(),
            wild_index: CLASSIC_SYMBOLS.len() - 1,
        }
    }

    pub fn symbols(&self) -> &[SymbolId] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Always false for a constructed alphabet
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn wild(&self) -> &SymbolId {
        &self.symbols[self.wild_index]
    }

    pub fn contains(&self, symbol: &SymbolId) -> bool {
        self.symbols.contains(symbol)
    }

    /// Uniform draw over every symbol, wild included
    pub fn random<R: Rng + ?Sized>(&self, rng: &mut R) -> SymbolId {
        self.symbols[rng.random_range(0..self.symbols.len())].clone()
    }
}

impl Default for SymbolAlphabet {
    fn default() -> Self {
        Self::classic()
    }
}

pub(crate) const CLASSIC_SYMBOLS: [&str; 8] = [
    "Bar", "Bell", "Cherry", "Diamond", "Lemon", "Plum", "Seven", "Wild",
];
