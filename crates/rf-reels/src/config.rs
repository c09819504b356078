//! Machine configuration

use serde::{Deserialize, Serialize};

use crate::error::{ReelError, ReelResult};
use crate::symbols::{CLASSIC_SYMBOLS, SymbolAlphabet};
use crate::timing::TimingConfig;

/// Grid specification (reels × rows)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    /// Number of reels (columns)
    pub reels: u8,
    /// Number of visible rows per reel
    pub rows: u8,
}

impl GridSpec {
    /// Classic 3×3
    pub fn classic_3x3() -> Self {
        Self { reels: 3, rows: 3 }
    }

    /// Standard 5×3
    pub fn standard_5x3() -> Self {
        Self { reels: 5, rows: 3 }
    }

    /// Slots per reel: visible rows plus one buffer slot above and below
    pub fn slots_per_reel(&self) -> usize {
        self.rows as usize + 2
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::classic_3x3()
    }
}

/// Reel motion parameters, in offset units per tick unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReelPhysics {
    /// Speed applied on `start_spin`
    pub spin_speed: f64,
    /// Floor while decelerating; keeps the reel moving toward the snap
    pub min_speed: f64,
    /// Per-tick speed multiplier while stopping
    pub decay_rate: f64,
}

impl ReelPhysics {
    pub fn classic() -> Self {
        Self {
            spin_speed: 25.0,
            min_speed: 15.0,
            decay_rate: 0.96,
        }
    }
}

impl Default for ReelPhysics {
    fn default() -> Self {
        Self::classic()
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotConfig {
    /// Grid layout
    #[serde(default)]
    pub grid: GridSpec,
    /// Symbol footprint (height of one row)
    pub symbol_size: f64,
    /// Ordered symbol identifiers
    pub alphabet: Vec<String>,
    /// Identifier of the wild symbol, must be in `alphabet`
    pub wild: String,
    /// Reel motion
    #[serde(default)]
    pub physics: ReelPhysics,
    /// Spin window and stop pacing
    #[serde(default)]
    pub timing: TimingConfig,
}

impl SlotConfig {
    /// Classic 3×3 fruit machine
    pub fn classic() -> Self {
        Self {
            grid: GridSpec::classic_3x3(),
            symbol_size: 240.0,
            alphabet: CLASSIC_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            wild: "Wild".into(),
            physics: ReelPhysics::classic(),
            timing: TimingConfig::normal(),
        }
    }

    /// Five reels, otherwise classic
    pub fn five_reel() -> Self {
        Self {
            grid: GridSpec::standard_5x3(),
            ..Self::classic()
        }
    }

    /// Validate everything the runtime relies on
    pub fn validate(&self) -> ReelResult<()> {
        if self.grid.reels == 0 {
            return Err(ReelError::InvalidConfig("reel count must be positive".into()));
        }
        if self.grid.rows == 0 {
            return Err(ReelError::InvalidConfig("row count must be positive".into()));
        }
        if !(self.symbol_size.is_finite() && self.symbol_size > 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "symbol size must be positive, got {}",
                self.symbol_size
            )));
        }

        let physics = &self.physics;
        if !(physics.spin_speed.is_finite() && physics.spin_speed > 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "spin speed must be positive, got {}",
                physics.spin_speed
            )));
        }
        if !(physics.min_speed.is_finite() && physics.min_speed > 0.0) {
            return Err(ReelError::InvalidConfig(format!(
                "min speed must be positive, got {}",
                physics.min_speed
            )));
        }
        if !(physics.decay_rate > 0.0 && physics.decay_rate <= 1.0) {
            return Err(ReelError::InvalidConfig(format!(
                "decay rate must be in (0, 1], got {}",
                physics.decay_rate
            )));
        }

        self.timing.validate()?;
        self.alphabet().map(|_| ())
    }

    /// Build the alphabet described by `alphabet` and `wild`
    pub fn alphabet(&self) -> ReelResult<SymbolAlphabet> {
        SymbolAlphabet::new(self.alphabet.iter().cloned(), self.wild.clone())
    }

    /// Import config from JSON, validating it
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Export config as pretty JSON
    pub fn to_json(&self) -> ReelResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for SlotConfig {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timing::TimingProfile;

    #[test]
    fn test_classic_is_valid() {
        let config = SlotConfig::classic();
        assert!(config.validate().is_ok());
        assert_eq!(config.grid.slots_per_reel(), 5);
    }

    #[test]
    fn test_validation_failures() {
        let mut config = SlotConfig::classic();
        config.grid.reels = 0;
        assert!(matches!(config.validate(), Err(ReelError::InvalidConfig(_))));

        let mut config = SlotConfig::classic();
        config.physics.min_speed = 0.0;
        assert!(matches!(config.validate(), Err(ReelError::InvalidConfig(_))));

        let mut config = SlotConfig::classic();
        config.physics.decay_rate = 1.5;
        assert!(matches!(config.validate(), Err(ReelError::InvalidConfig(_))));

        let mut config = SlotConfig::classic();
        config.wild = "Joker".into();
        assert_eq!(config.validate(), Err(ReelError::UnknownWild("Joker".into())));

        let mut config = SlotConfig::classic();
        config.alphabet.clear();
        assert_eq!(config.validate(), Err(ReelError::EmptyAlphabet));
    }

    #[test]
    fn test_json_roundtrip_keeps_custom_values() {
        let mut config = SlotConfig::five_reel();
        config.timing = TimingConfig::turbo();
        let json = config.to_json().unwrap();
        let parsed = SlotConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
        assert_eq!(parsed.timing.profile, TimingProfile::Turbo);
    }

    #[test]
    fn test_json_defaults_and_errors() {
        let json = r#"{ "symbol_size": 100.0, "alphabet": ["A", "W"], "wild": "W" }"#;
        let parsed = SlotConfig::from_json(json).unwrap();
        assert_eq!(parsed.grid, GridSpec::classic_3x3());
        assert_eq!(parsed.physics, ReelPhysics::classic());

        assert!(matches!(SlotConfig::from_json("{"), Err(ReelError::Json(_))));
        let bad_wild = r#"{ "symbol_size": 100.0, "alphabet": ["A"], "wild": "W" }"#;
        assert!(matches!(
            SlotConfig::from_json(bad_wild),
            Err(ReelError::UnknownWild(_))
        ));
    }
}
