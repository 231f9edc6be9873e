//! Chord split protocol
//!
//! Splitting hands a tail portion of a chord over to a new "alien" chord that
//! hangs on the same stem. Beam links are left untouched: callers reassign
//! them explicitly.

use super::Chord;
use crate::errors::{Result, RhythmError};
use crate::models::{ChordId, Note, NoteId, Scale};
use once_cell::unsync::OnceCell;

/// Where a chord is split
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitPoint {
    /// Notes from this one (inclusive) to the tail move to the alien chord
    FromNote(NoteId),
    /// The alien chord receives a copy of every note (shared heads)
    Mirror,
}

impl Chord {
    /// Split this chord, returning the alien chord
    ///
    /// `new_note_id` supplies ids for mirrored notes. When both chords keep a
    /// stem fragment longer than `min_fragment` (interline units), this
    /// chord's tail is shortened to the alien head.
    pub(crate) fn split(
        &mut self,
        point: SplitPoint,
        alien_id: ChordId,
        mut new_note_id: impl FnMut() -> NoteId,
        scale: &Scale,
        min_fragment: f64,
    ) -> Result<Chord> {
        let point = match point {
            SplitPoint::FromNote(note) => match self.note_index(note) {
                None => {
                    return Err(RhythmError::ForeignNote {
                        chord: self.id,
                        note,
                    })
                }
                // Moving every note would leave this chord empty
                Some(0) => SplitPoint::Mirror,
                Some(_) => point,
            },
            SplitPoint::Mirror => point,
        };

        let alien_notes: Vec<Note> = match point {
            SplitPoint::FromNote(note) => {
                let index = self.note_index(note).unwrap_or(self.notes.len());
                self.take_notes(index)
            }
            SplitPoint::Mirror => self
                .notes
                .iter()
                .map(|n| n.mirror(new_note_id()))
                .collect(),
        };

        let alien = Chord {
            id: alien_id,
            notes: alien_notes,
            stem: self.stem,
            stem_dir: self.stem_dir,
            beams: Vec::new(),
            slot: self.slot,
            start_time: self.start_time,
            tuplet_factor: self.tuplet_factor,
            dots: self.dots,
            flags: self.flags,
            voice: None,
            tail_cut: self.tail_cut,
            locations: OnceCell::new(),
        };
        self.invalidate();

        if self.stem.is_some() {
            let fragment =
                scale.to_interline((self.head_location().y - alien.head_location().y).abs());
            if fragment > min_fragment {
                self.cut_tail(alien.head_location().y);
            }
        }

        log::debug!(
            "Split {} into {} {:?} / {} {:?}",
            self.id,
            self.id,
            self.note_ids(),
            alien.id,
            alien.note_ids()
        );
        Ok(alien)
    }
}
