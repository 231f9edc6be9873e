//! Measure-scoped identifiers
//!
//! Every entity of a measure lives in an arena owned by the `Measure`; the
//! identifiers below are the non-owning handles used for cross references
//! (chord → slot, beam → group, voice → chord, ...).
//!
//! Ids are 1-based and dense: the entity with id `n` is stored at index `n - 1`.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! measure_id {
    ($(#[$meta:meta])* $name:ident, $prefix:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u32);

        impl $name {
            /// Id for the arena slot at `index`
            pub fn from_index(index: usize) -> Self {
                $name(index as u32 + 1)
            }

            /// Arena index of this id
            pub fn index(self) -> usize {
                (self.0 as usize).saturating_sub(1)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $prefix, self.0)
            }
        }
    };
}

measure_id!(
    /// Chord handle
    ChordId,
    "Ch"
);
measure_id!(
    /// Beam handle
    BeamId,
    "B"
);
measure_id!(
    /// Beam group handle
    GroupId,
    "G"
);
measure_id!(
    /// Slot handle, ordered by abscissa
    SlotId,
    "S"
);
measure_id!(
    /// Slur handle
    SlurId,
    "Sl"
);

/// Note handle (unique within a measure, stable across chord splits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteId(pub u32);

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N#{}", self.0)
    }
}

/// Stem handle, shared by every chord hanging on the same physical stem
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StemId(pub u32);

impl fmt::Display for StemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "St#{}", self.0)
    }
}

/// Staff number within the part (1-based, top to bottom)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaffId(pub u32);

/// Stable voice handle
///
/// This is the arena index of the voice and never changes. The number shown
/// to users is `Voice::id`, which may be renumbered by a voice swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoiceRef(pub usize);

impl fmt::Display for VoiceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice@{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_index_round_trip() {
        let id = ChordId::from_index(4);
        assert_eq!(id, ChordId(5));
        assert_eq!(id.index(), 4);
    }

    #[test]
    fn test_id_display() {
        assert_eq!(ChordId(3).to_string(), "Ch#3");
        assert_eq!(GroupId(1).to_string(), "G#1");
        assert_eq!(NoteId(12).to_string(), "N#12");
    }
}
