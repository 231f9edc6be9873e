//! Tunable parameters of the rhythm passes
//!
//! Defaults match the values used on typical scanned scores. A YAML file may
//! override any subset of them:
//!
//! ```yaml
//! max_split_loops: 5
//! cost:
//!   staff_diff: 60
//! ```

use crate::errors::Result;
use crate::models::TimeSignature;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum number of beam group split rounds per measure
pub const DEFAULT_MAX_SPLIT_LOOPS: usize = 10;

/// Vertical gap (interline) between a chord tail and a foreign beam beyond
/// which the chord is considered outside the beam group
pub const DEFAULT_MAX_CHORD_DY: f64 = 0.5;

/// Minimum stem length (interline) between two split chords for the stem to
/// be considered physically cut
pub const DEFAULT_MIN_STEM_FRAGMENT: f64 = 1.0;

/// Cost of leaving a rookie chord unmatched
pub const DEFAULT_NO_LINK_COST: i64 = 20;

/// Cost of continuing a voice on another staff
pub const DEFAULT_STAFF_DIFF_COST: i64 = 40;

/// Cost of linking chords with different voices
pub const DEFAULT_INCOMPATIBLE_COST: i64 = 10_000;

/// Costs of the slot voice matching
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    pub no_link: i64,
    pub staff_diff: i64,
    pub incompatible: i64,
}

impl Default for CostConfig {
    fn default() -> Self {
        Self {
            no_link: DEFAULT_NO_LINK_COST,
            staff_diff: DEFAULT_STAFF_DIFF_COST,
            incompatible: DEFAULT_INCOMPATIBLE_COST,
        }
    }
}

/// Rhythm pass configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhythmConfig {
    /// Bound on beam group split rounds
    pub max_split_loops: usize,

    /// Tail to beam tolerance, in interline units
    pub max_chord_dy: f64,

    /// Stem cut threshold, in interline units
    pub min_stem_fragment: f64,

    /// Voice matching costs
    pub cost: CostConfig,

    /// Signature assumed when no declaration precedes a measure
    pub default_time_signature: TimeSignature,
}

impl Default for RhythmConfig {
    fn default() -> Self {
        Self {
            max_split_loops: DEFAULT_MAX_SPLIT_LOOPS,
            max_chord_dy: DEFAULT_MAX_CHORD_DY,
            min_stem_fragment: DEFAULT_MIN_STEM_FRAGMENT,
            cost: CostConfig::default(),
            default_time_signature: TimeSignature::default(),
        }
    }
}

impl RhythmConfig {
    /// Parse a YAML document; missing keys keep their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Load a YAML configuration file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_yaml_str(&text)?;
        log::info!("Loaded rhythm config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
