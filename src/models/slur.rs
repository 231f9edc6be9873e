//! Slurs and ties

use super::ids::{NoteId, SlurId};
use serde::{Deserialize, Serialize};

/// Slur curve with its resolved end notes
///
/// An end is `None` when the slur continues beyond the measure (or was not
/// connected by the recognition layer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slur {
    pub id: SlurId,
    pub left: Option<NoteId>,
    pub right: Option<NoteId>,
    /// Tie flag computed upstream from the curve shape
    pub tie: bool,
    /// Notes of the neighboring measures this slur reaches, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_extension: Option<NoteId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_extension: Option<NoteId>,
}

impl Slur {
    pub fn new(id: SlurId, left: Option<NoteId>, right: Option<NoteId>, tie: bool) -> Self {
        Slur {
            id,
            left,
            right,
            tie,
            left_extension: None,
            right_extension: None,
        }
    }

    /// End note on the requested side
    pub fn end(&self, side: Side) -> Option<NoteId> {
        match side {
            Side::Left => self.left,
            Side::Right => self.right,
        }
    }

    pub fn set_end(&mut self, side: Side, note: NoteId) {
        match side {
            Side::Left => self.left = Some(note),
            Side::Right => self.right = Some(note),
        }
    }
}

/// Horizontal side of a tie or beam
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}
