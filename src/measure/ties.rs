//! Tie consistency
//!
//! A chord may be tied, on each side, to a single other chord. A chord whose
//! ties on one side reach several chords actually gathers notes from several
//! voices and is split until every piece is unambiguous.

use super::Measure;
use crate::chord::SplitPoint;
use crate::config::RhythmConfig;
use crate::diagnostics::{self, Entity};
use crate::errors::Result;
use crate::models::{ChordId, NoteId, Side};
use std::collections::VecDeque;

/// One tie seen from a chord
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ChordTie {
    /// Index in `Measure::slurs`
    pub slur: usize,
    /// Tied note of the chord
    pub local: NoteId,
    /// Chord at the other end
    pub distant: ChordId,
}

impl Measure {
    /// Ties of a chord whose other end lies on `side`
    pub(crate) fn chord_ties(&self, chord: ChordId, side: Side) -> Vec<ChordTie> {
        let local_side = side.opposite();
        let c = self.chord(chord);
        self.slurs
            .iter()
            .enumerate()
            .filter(|(_, slur)| slur.tie)
            .filter_map(|(index, slur)| {
                let local = slur.end(local_side)?;
                if !c.contains_note(local) {
                    return None;
                }
                let far_note = slur.end(side)?;
                let distant = self.chord_of_note(far_note)?;
                if distant == chord {
                    return None;
                }
                if !c.note(local)?.same_pitch(self.note(far_note)?) {
                    return None;
                }
                Some(ChordTie {
                    slur: index,
                    local,
                    distant,
                })
            })
            .collect()
    }

    /// Chords tied to this one on either side
    pub fn tied_chords(&self, chord: ChordId) -> Vec<ChordId> {
        let mut chords: Vec<ChordId> = Vec::new();
        for side in [Side::Left, Side::Right] {
            for tie in self.chord_ties(chord, side) {
                if !chords.contains(&tie.distant) {
                    chords.push(tie.distant);
                }
            }
        }
        chords
    }

    /// True if a tie continues this chord into a later chord of the measure
    pub fn is_tied_forward(&self, chord: ChordId) -> bool {
        !self.chord_ties(chord, Side::Right).is_empty()
    }

    /// Split every chord tied to several chords on the same side
    pub fn check_tied_chords(&mut self, config: &RhythmConfig) {
        self.remove_degenerate_slurs();

        // Each split gives one more chord a tie end, two ends per tie
        let max_splits = 2 * self.slurs.iter().filter(|s| s.tie).count();
        let mut splits = 0;
        let mut queue: VecDeque<ChordId> =
            (0..self.chords.len()).map(ChordId::from_index).collect();

        while let Some(chord) = queue.pop_front() {
            for side in [Side::Left, Side::Right] {
                let ties = self.chord_ties(chord, side);
                let mut distant: Vec<ChordId> = Vec::new();
                for tie in &ties {
                    if !distant.contains(&tie.distant) {
                        distant.push(tie.distant);
                    }
                }
                if distant.len() < 2 {
                    continue;
                }
                if splits >= max_splits {
                    self.error(
                        Entity::Chord(chord),
                        diagnostics::SPLIT_FAILED,
                        format!("Tie split of {} does not converge", chord),
                    );
                    return;
                }
                splits += 1;

                distant.sort_by(|a, b| {
                    self.chord(*a)
                        .head_location()
                        .y
                        .total_cmp(&self.chord(*b).head_location().y)
                        .then(a.cmp(b))
                });
                match self.split_tied_chord(chord, side, &ties, &distant, config) {
                    Ok(alien) => {
                        queue.push_back(chord);
                        queue.push_back(alien);
                        // Their ties now reach two pieces
                        queue.extend(distant.iter().copied());
                    }
                    Err(err) => {
                        self.error(Entity::Chord(chord), diagnostics::SPLIT_FAILED, err.to_string())
                    }
                }
                break;
            }
        }
    }

    fn split_tied_chord(
        &mut self,
        chord: ChordId,
        side: Side,
        ties: &[ChordTie],
        distant: &[ChordId],
        config: &RhythmConfig,
    ) -> Result<ChordId> {
        let c = self.chord(chord);
        // A single head tied to several chords can only be duplicated
        let shared_head = ties.iter().any(|t| {
            ties.iter()
                .any(|u| u.local == t.local && u.distant != t.distant)
        });

        let point = if shared_head {
            SplitPoint::Mirror
        } else {
            // Tied note farthest from the head, the remainder is split again
            let split_index = ties
                .iter()
                .filter_map(|t| c.note_index(t.local))
                .max()
                .unwrap_or_default();
            SplitPoint::FromNote(c.notes()[split_index].id)
        };
        let beam_count = c.beams.len() as u8;

        let alien = self.split_chord(chord, point, config)?;
        // Beams stay on the original chord, the alien keeps the same value
        let flags = &mut self.chords[alien.index()].flags;
        *flags = flags.saturating_add(beam_count);

        if point == SplitPoint::Mirror {
            let keep = distant[0];
            let local_side = side.opposite();
            for tie in ties.iter().filter(|t| t.distant != keep) {
                let mirror = self
                    .chord(alien)
                    .notes()
                    .iter()
                    .find(|n| n.mirror_of == Some(tie.local))
                    .map(|n| n.id);
                if let Some(mirror) = mirror {
                    self.slurs[tie.slur].set_end(local_side, mirror);
                }
            }
        }

        log::info!(
            "M{} {} tied to {:?} on its {:?} side, split off {}",
            self.id,
            chord,
            distant,
            side,
            alien
        );
        Ok(alien)
    }

    /// Drop slurs starting and ending on the same chord
    fn remove_degenerate_slurs(&mut self) {
        let degenerate: Vec<usize> = self
            .slurs
            .iter()
            .enumerate()
            .filter(|(_, slur)| match (slur.left, slur.right) {
                (Some(left), Some(right)) => {
                    left == right || {
                        let l = self.chord_of_note(left);
                        l.is_some() && l == self.chord_of_note(right)
                    }
                }
                _ => false,
            })
            .map(|(index, _)| index)
            .collect();

        for index in degenerate.into_iter().rev() {
            let slur = self.slurs.remove(index);
            self.error(
                Entity::Slur(slur.id),
                diagnostics::DEGENERATE_TIE,
                format!("{} starts and ends on the same chord", slur.id),
            );
        }
    }
}
