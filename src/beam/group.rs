use crate::models::{BeamId, GroupId};
use serde::{Deserialize, Serialize};

/// Beams connected through shared chords
///
/// Only beams are stored; the chords of a group are always derived from its
/// beams (see `Measure::group_chords`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeamGroup {
    pub(crate) id: GroupId,
    /// Beams ordered by level, then abscissa
    pub(crate) beams: Vec<BeamId>,
}

impl BeamGroup {
    pub fn new(id: GroupId) -> Self {
        BeamGroup {
            id,
            beams: Vec::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn beams(&self) -> &[BeamId] {
        &self.beams
    }

    pub(crate) fn add_beam(&mut self, beam: BeamId) {
        if !self.beams.contains(&beam) {
            self.beams.push(beam);
        }
    }

    pub(crate) fn remove_beam(&mut self, beam: BeamId) {
        self.beams.retain(|b| *b != beam);
    }
}
