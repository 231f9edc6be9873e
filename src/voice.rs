//! Voices: continuous lines of chords across the slots of a measure
//!
//! A voice either holds a single measure-long rest (`whole_chord`) or a slot
//! table recording, for each slot, the chord starting there (BEGIN) or still
//! sounding there (CONTINUE). The two are mutually exclusive.

use crate::chord::Chord;
use crate::models::{zero, ChordId, Rational, SlotId};
use crate::slot::Slot;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role of a chord in a slot of a voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Chord starts at this slot
    Begin,
    /// Chord started earlier and still sounds at this slot
    Continue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotVoice {
    pub chord: ChordId,
    pub status: Status,
}

/// Where a forward mark sits relative to its chord
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "side", content = "chord", rename_all = "lowercase")]
pub enum ForwardPosition {
    Before(ChordId),
    After(ChordId),
}

/// Filler duration keeping a voice timeline consistent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forward {
    pub position: ForwardPosition,
    pub duration: Rational,
}

#[derive(Debug, Clone)]
pub struct Voice {
    /// Displayed id, 1-based, may be renumbered
    pub(crate) id: u32,
    whole_chord: Option<ChordId>,
    slots: BTreeMap<SlotId, SlotVoice>,
    /// Final time minus expected measure duration, undefined for whole voices
    termination: Option<Rational>,
    forwards: Vec<Forward>,
}

impl Voice {
    pub fn new(id: u32) -> Self {
        Voice {
            id,
            whole_chord: None,
            slots: BTreeMap::new(),
            termination: None,
            forwards: Vec::new(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn whole_chord(&self) -> Option<ChordId> {
        self.whole_chord
    }

    pub fn is_whole(&self) -> bool {
        self.whole_chord.is_some()
    }

    pub fn slot_table(&self) -> &BTreeMap<SlotId, SlotVoice> {
        &self.slots
    }

    pub fn slot_info(&self, slot: SlotId) -> Option<&SlotVoice> {
        self.slots.get(&slot)
    }

    pub fn termination(&self) -> Option<Rational> {
        self.termination
    }

    pub fn forwards(&self) -> &[Forward] {
        &self.forwards
    }

    /// Mark the voice as holding a measure rest; refused once slots exist
    pub(crate) fn set_whole_chord(&mut self, chord: ChordId) -> bool {
        if !self.slots.is_empty() {
            return false;
        }
        self.whole_chord = Some(chord);
        true
    }

    /// Record a chord starting at a slot; refused for whole voices
    pub(crate) fn begin(&mut self, slot: SlotId, chord: ChordId) -> bool {
        if self.whole_chord.is_some() {
            return false;
        }
        self.slots.insert(
            slot,
            SlotVoice {
                chord,
                status: Status::Begin,
            },
        );
        true
    }

    /// Nothing starts nor sounds in this voice at the slot
    pub fn is_free(&self, slot: SlotId) -> bool {
        self.whole_chord.is_none() && !self.slots.contains_key(&slot)
    }

    /// Latest chord recorded before the slot
    pub fn chord_before(&self, slot: SlotId) -> Option<ChordId> {
        self.slots.range(..slot).next_back().map(|(_, info)| info.chord)
    }

    /// Chords in time order (the whole chord alone for whole voices)
    pub fn chords(&self) -> Vec<ChordId> {
        match self.whole_chord {
            Some(chord) => vec![chord],
            None => self
                .slots
                .values()
                .filter(|info| info.status == Status::Begin)
                .map(|info| info.chord)
                .collect(),
        }
    }

    pub fn first_chord(&self) -> Option<ChordId> {
        self.chords().first().copied()
    }

    pub fn last_chord(&self) -> Option<ChordId> {
        self.chords().last().copied()
    }

    /// Rest chords of the voice, in time order
    pub fn rests(&self, chords: &[Chord]) -> Vec<ChordId> {
        self.chords()
            .into_iter()
            .filter(|c| chords[c.index()].is_rest())
            .collect()
    }

    /// Add CONTINUE entries where the previous chord still sounds
    pub(crate) fn update_slot_table(&mut self, slots: &[Slot], chords: &[Chord]) {
        if self.whole_chord.is_some() {
            return;
        }
        let mut last: Option<ChordId> = None;
        for slot in slots {
            if let Some(info) = self.slots.get(&slot.id) {
                last = Some(info.chord);
                continue;
            }
            let (Some(start), Some(chord)) = (slot.start_time(), last) else {
                continue;
            };
            if let Some(end) = chords[chord.index()].end_time() {
                if end > start {
                    self.slots.insert(
                        slot.id,
                        SlotVoice {
                            chord,
                            status: Status::Continue,
                        },
                    );
                }
            }
        }
    }

    /// End time of the last chord
    pub fn duration(&self, chords: &[Chord]) -> Option<Rational> {
        let last = self.last_chord()?;
        chords[last.index()].end_time()
    }

    /// Walk BEGIN entries, insert forward marks and compute the termination
    ///
    /// Returns the excess when the voice is longer than `expected`.
    pub(crate) fn check_duration(
        &mut self,
        slots: &[Slot],
        chords: &[Chord],
        expected: Rational,
    ) -> Option<Rational> {
        self.forwards.clear();
        if self.whole_chord.is_some() {
            self.termination = None;
            return None;
        }

        let mut counter = zero();
        let mut last: Option<ChordId> = None;
        for (slot_id, info) in &self.slots {
            let chord = &chords[info.chord.index()];
            if info.status != Status::Begin || chord.is_whole_rest() {
                continue;
            }
            let start = slots[slot_id.index()].start_time().or(chord.start_time());
            if let Some(start) = start {
                if counter < start {
                    self.forwards.push(Forward {
                        position: ForwardPosition::Before(info.chord),
                        duration: start - counter,
                    });
                    counter = start;
                } else if counter > start {
                    log::debug!("V{} overlaps at {} ({} > {})", self.id, info.chord, counter, start);
                }
            }
            counter += chord.duration().unwrap_or_else(zero);
            last = Some(info.chord);
        }

        let delta = counter - expected;
        self.termination = Some(delta);
        if delta < zero() {
            if let Some(last) = last {
                self.forwards.push(Forward {
                    position: ForwardPosition::After(last),
                    duration: -delta,
                });
            }
            None
        } else if delta > zero() {
            Some(delta)
        } else {
            None
        }
    }

    /// Drop the closing forward of a pickup measure
    pub(crate) fn remove_final_forward(&mut self) {
        self.forwards
            .retain(|f| !matches!(f.position, ForwardPosition::After(_)));
    }

    /// One-line picture of the slot table
    pub fn strip(&self, slots: &[Slot]) -> String {
        let mut strip = format!("V{} ", self.id);
        if let Some(chord) = self.whole_chord {
            strip.push_str(&format!("|{} (whole)|", chord));
            return strip;
        }
        for slot in slots {
            match self.slots.get(&slot.id) {
                Some(SlotVoice {
                    chord,
                    status: Status::Begin,
                }) => strip.push_str(&format!("|{:<7}", chord.to_string())),
                Some(SlotVoice {
                    status: Status::Continue,
                    ..
                }) => strip.push_str("|======="),
                None => strip.push_str("|......."),
            }
        }
        strip.push('|');
        strip
    }
}
