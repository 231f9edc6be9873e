//! Time slots
//!
//! A slot gathers the chords starting at the same abscissa. Its start time is
//! set once and broadcast to its chords by the measure.

use crate::models::{ChordId, Point, Rational, SlotId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slot {
    pub(crate) id: SlotId,
    /// Incoming chords, sorted by staff, head ordinate then id
    pub(crate) chords: Vec<ChordId>,
    /// Mean of member chord centers
    pub(crate) reference: Point,
    start_time: Option<Rational>,
}

impl Slot {
    pub(crate) fn new(id: SlotId, chords: Vec<ChordId>, reference: Point) -> Self {
        Slot {
            id,
            chords,
            reference,
            start_time: None,
        }
    }

    pub fn id(&self) -> SlotId {
        self.id
    }

    pub fn chords(&self) -> &[ChordId] {
        &self.chords
    }

    pub fn reference(&self) -> Point {
        self.reference
    }

    pub fn start_time(&self) -> Option<Rational> {
        self.start_time
    }

    /// Set the start time once; false if a value was already there
    pub(crate) fn set_start_time(&mut self, time: Rational) -> bool {
        match self.start_time {
            None => {
                self.start_time = Some(time);
                true
            }
            Some(current) => {
                if current != time {
                    log::warn!(
                        "{} start time already {}, ignoring {}",
                        self.id,
                        current,
                        time
                    );
                }
                false
            }
        }
    }
}
