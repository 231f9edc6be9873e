//! Musical time values
//!
//! All durations and start times are exact rationals in whole-note units
//! (a quarter is 1/4, a dotted half is 3/4).

use num_rational::Rational32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Re-export Rational for duration calculations
pub type Rational = Rational32;

/// Rational zero
pub fn zero() -> Rational {
    Rational::from_integer(0)
}

/// Shorthand for `Rational::new(numer, denom)`
pub fn ratio(numer: i32, denom: i32) -> Rational {
    Rational::new(numer, denom)
}

/// Time signature governing a measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u32,
    pub denominator: u32,
}

impl TimeSignature {
    pub fn new(numerator: u32, denominator: u32) -> Self {
        TimeSignature {
            numerator,
            denominator,
        }
    }

    /// Expected measure duration, e.g. 3/4 → 3/4 of a whole note
    pub fn duration(&self) -> Rational {
        Rational::new(self.numerator as i32, self.denominator.max(1) as i32)
    }

    /// Signature made of `count` beats of `beat` each, keeping the beat's
    /// denominator (2 dotted quarters → 6/8, not 3/4)
    pub fn from_beats(count: u32, beat: Rational) -> Self {
        TimeSignature {
            numerator: count * (*beat.numer()).max(0) as u32,
            denominator: (*beat.denom()).max(1) as u32,
        }
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::new(4, 4)
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}
