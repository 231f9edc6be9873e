//! Slot-by-slot voice assignment
//!
//! Slots are visited left to right. At each slot, the chords ending there
//! release their voice (unless a beam or a tie carries it further), and the
//! incoming chords without a voice are matched to released voices by a
//! minimum-cost assignment. Chords left over take any free voice, or a new one.

use super::Measure;
use crate::assignment;
use crate::config::RhythmConfig;
use crate::diagnostics::{self, Entity};
use crate::models::{zero, ChordId, SlotId, VoiceRef};
use crate::voice::Voice;

impl Measure {
    /// Give a start time to every slot and a voice to every chord
    pub fn assign_slots(&mut self, config: &RhythmConfig) {
        let orphans: Vec<ChordId> = self
            .chords
            .iter()
            .filter(|c| c.slot.is_none() && !c.is_whole_rest())
            .map(|c| c.id)
            .collect();
        for chord in orphans {
            self.warning(
                Entity::Chord(chord),
                diagnostics::CHORD_WITHOUT_SLOT,
                format!("{} belongs to no slot", chord),
            );
        }

        // Measure rests last from the start, each in its own voice
        let mut actives: Vec<ChordId> = self
            .chords
            .iter()
            .filter(|c| c.slot.is_none() && c.is_whole_rest())
            .map(|c| c.id)
            .collect();
        for chord in actives.clone() {
            self.set_chord_start_time(chord, zero());
            if self.chord(chord).voice().is_none() {
                self.create_voice(chord);
            }
        }

        for index in 0..self.slots.len() {
            let slot = SlotId::from_index(index);
            self.sort_slot_chords(slot);

            let start = actives
                .iter()
                .map(|c| self.chord(*c))
                .filter(|c| !c.is_whole_rest())
                .filter_map(|c| c.end_time())
                .min()
                .unwrap_or_else(zero);
            self.set_slot_start_time(slot, start);

            let mut endings = Vec::new();
            let mut free_endings = Vec::new();
            for chord in &actives {
                let c = self.chord(*chord);
                if c.is_whole_rest() {
                    continue;
                }
                match c.end_time() {
                    Some(end) if end <= start => {
                        if self.carries_voice_forward(*chord) {
                            endings.push(*chord);
                        } else {
                            free_endings.push(*chord);
                        }
                    }
                    _ => {}
                }
            }
            log::debug!(
                "M{} {} at {} endings {:?} free {:?}",
                self.id,
                slot,
                start,
                endings,
                free_endings
            );

            self.build_slot_voices(slot, &free_endings, config);

            actives.retain(|c| !endings.contains(c) && !free_endings.contains(c));
            actives.extend(self.slots[index].chords.iter().copied());
        }
    }

    /// A chord inside a beam group or tied forward hands its voice over
    fn carries_voice_forward(&self, chord: ChordId) -> bool {
        if let Some(group) = self.group_of(chord) {
            if self.group_chords(group).last() != Some(&chord) {
                return true;
            }
        }
        self.is_tied_forward(chord)
    }

    /// Voice the incoming chords of a slot
    ///
    /// `free_endings` are chords ending at this slot whose voice may be
    /// reused by the slot's chords.
    pub(crate) fn build_slot_voices(
        &mut self,
        slot: SlotId,
        free_endings: &[ChordId],
        config: &RhythmConfig,
    ) {
        let incomings = self.slots[slot.index()].chords.clone();
        // Measure rests never continue a voice
        let rookies: Vec<ChordId> = incomings
            .iter()
            .copied()
            .filter(|c| self.chord(*c).voice().is_none() && !self.chord(*c).is_whole_rest())
            .collect();

        if !free_endings.is_empty() && !rookies.is_empty() {
            let columns = free_endings.len() + rookies.len();
            let assignment = assignment::solve(rookies.len(), columns, |row, col| {
                if col >= free_endings.len() {
                    config.cost.no_link
                } else {
                    self.voice_cost(rookies[row], free_endings[col], config)
                }
            });

            for (row, col) in assignment.into_iter().enumerate() {
                if col >= free_endings.len() {
                    continue;
                }
                let rookie = rookies[row];
                let Some(voice) = self.chord(free_endings[col]).voice() else {
                    continue;
                };
                // Propagation from an earlier rookie may have settled it
                if self.chord(rookie).voice().is_none() && self.voices[voice.0].is_free(slot) {
                    log::debug!(
                        "M{} {} continues V{} from {}",
                        self.id,
                        rookie,
                        self.voices[voice.0].id,
                        free_endings[col]
                    );
                    self.assign_voice(rookie, voice);
                }
            }
        }

        self.assign_free_voices(slot, &incomings, rookies.len());
    }

    /// Cost of continuing the voice of `ending` with `rookie`
    fn voice_cost(&self, rookie: ChordId, ending: ChordId, config: &RhythmConfig) -> i64 {
        let (r, e) = (self.chord(rookie), self.chord(ending));
        if let (Some(a), Some(b)) = (r.voice(), e.voice()) {
            if a != b {
                return config.cost.incompatible;
            }
        }
        if r.staff() != e.staff() {
            return config.cost.staff_diff;
        }
        let dy = self
            .scale
            .to_interline((r.head_location().y - e.head_location().y).abs())
            .floor() as i64;
        let d_stem = (r.stem_dir() - e.stem_dir()).abs() as i64;
        dy + 2 * d_stem
    }

    /// Give chords still without voice the first free voice, or a new one
    fn assign_free_voices(&mut self, slot: SlotId, incomings: &[ChordId], rookies: usize) {
        for chord in incomings {
            if self.chord(*chord).voice().is_some() {
                continue;
            }
            if self.chord(*chord).is_whole_rest() {
                self.create_voice(*chord);
                continue;
            }
            let staff = self.chord(*chord).staff();
            let candidate = self.voices.iter().position(|voice| {
                if !voice.is_free(slot) {
                    return false;
                }
                // Do not let a voice jump staves among several rookies
                if rookies > 1 {
                    if let Some(before) = voice.chord_before(slot) {
                        if self.chord(before).staff() != staff {
                            return false;
                        }
                    }
                }
                true
            });
            match candidate {
                Some(index) => self.assign_voice(*chord, VoiceRef(index)),
                None => {
                    self.create_voice(*chord);
                }
            }
        }
    }

    /// Open a new voice starting with this chord
    pub(crate) fn create_voice(&mut self, chord: ChordId) -> VoiceRef {
        let voice = VoiceRef(self.voices.len());
        let id = self.voices.len() as u32 + 1;
        self.voices.push(Voice::new(id));
        log::debug!("M{} new voice V{} for {}", self.id, id, chord);
        self.assign_voice(chord, voice);
        voice
    }

    /// Put a chord into a voice, then the chords bound to it
    ///
    /// The voice flows to the other chords of the beam group (and the rests
    /// interleaved in it) and to tied chords.
    pub(crate) fn assign_voice(&mut self, chord: ChordId, voice: VoiceRef) {
        let mut pending = vec![chord];
        while let Some(current) = pending.pop() {
            match self.chords[current.index()].set_voice(voice) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    self.error(Entity::Chord(current), diagnostics::VOICE_CONFLICT, err.to_string());
                    continue;
                }
            }

            let (slot, whole) = {
                let c = self.chord(current);
                (c.slot, c.is_whole_rest())
            };
            if whole {
                if !self.voices[voice.0].set_whole_chord(current) {
                    let id = self.voices[voice.0].id;
                    self.error(
                        Entity::Voice(id),
                        diagnostics::VOICE_CONFLICT,
                        format!("V{} already has slots, cannot hold measure rest {}", id, current),
                    );
                }
            } else if let Some(slot) = slot {
                self.voices[voice.0].begin(slot, current);
                self.voices[voice.0].update_slot_table(&self.slots, &self.chords);
            }

            if let Some(group) = self.group_of(current) {
                let chords = self.group_chords(group);
                for pair in chords.windows(2) {
                    if let Some(rest) = self.lookup_interleaved_rest(pair[0], pair[1]) {
                        pending.push(rest);
                    }
                }
                pending.extend(chords);
            }
            pending.extend(self.tied_chords(current));
        }
    }

    /// Renumber a voice; the voice already using `id`, if any, takes the
    /// old number of this one
    pub fn swap_voice_id(&mut self, voice: VoiceRef, id: u32) {
        let old = self.voices[voice.0].id;
        if old == id {
            return;
        }
        if let Some(owner) = self.voices.iter().position(|v| v.id == id) {
            self.voices[owner].id = old;
        }
        self.voices[voice.0].id = id;
        log::debug!("M{} voice V{} renumbered V{}", self.id, old, id);
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::add_up_chord;
    use super::*;
    use crate::models::{Pitch, Scale};

    #[test]
    fn test_swap_voice_id_two_parties() {
        let mut measure = Measure::new(1, Scale::new(20.0));
        let a = add_up_chord(&mut measure, 1, 1, 0.0, 100.0, 40.0, Pitch::new(0, 4));
        let b = add_up_chord(&mut measure, 2, 2, 0.0, 300.0, 240.0, Pitch::new(0, 3));
        measure.add_slot(&[a, b]);
        let va = measure.create_voice(a);
        let vb = measure.create_voice(b);
        assert_eq!(measure.voice(va).id(), 1);
        assert_eq!(measure.voice(vb).id(), 2);

        measure.swap_voice_id(va, 2);
        assert_eq!(measure.voice(va).id(), 2);
        assert_eq!(measure.voice(vb).id(), 1);
        assert_eq!(measure.voice_id_of(a), Some(2));

        // Unused id: plain renumbering
        measure.swap_voice_id(vb, 5);
        assert_eq!(measure.voice(vb).id(), 5);
        assert_eq!(measure.voice(va).id(), 2);
    }

    #[test]
    fn test_voice_cost() {
        let config = RhythmConfig::default();
        let mut measure = Measure::new(1, Scale::new(20.0));
        let a = add_up_chord(&mut measure, 1, 1, 0.0, 100.0, 40.0, Pitch::new(0, 4));
        let near = add_up_chord(&mut measure, 2, 1, 50.0, 130.0, 70.0, Pitch::new(0, 4));
        let other_staff = add_up_chord(&mut measure, 3, 2, 50.0, 300.0, 240.0, Pitch::new(0, 3));

        assert_eq!(measure.voice_cost(near, a, &config), 1);
        assert_eq!(measure.voice_cost(other_staff, a, &config), config.cost.staff_diff);

        let va = measure.create_voice(a);
        measure.create_voice(near);
        assert_eq!(va, VoiceRef(0));
        assert_eq!(measure.voice_cost(near, a, &config), config.cost.incompatible);
    }

    #[test]
    fn test_free_voice_does_not_jump_staves_among_rookies() {
        let config = RhythmConfig::default();
        let mut measure = Measure::new(1, Scale::new(20.0));
        let upper = add_up_chord(&mut measure, 1, 1, 0.0, 100.0, 40.0, Pitch::new(0, 4));
        let lower = add_up_chord(&mut measure, 2, 2, 0.0, 300.0, 240.0, Pitch::new(0, 3));
        let near = add_up_chord(&mut measure, 3, 1, 50.0, 100.0, 40.0, Pitch::new(0, 4));
        let far = add_up_chord(&mut measure, 4, 1, 56.0, 60.0, 0.0, Pitch::new(4, 4));
        measure.add_slot(&[upper, lower]);
        measure.add_slot(&[near, far]);

        measure.process(&config);

        assert_eq!(measure.chord(near).voice(), measure.chord(upper).voice());
        // The voice of the lower staff is free but stays there
        assert_ne!(measure.chord(far).voice(), measure.chord(lower).voice());
        assert_eq!(measure.voices().len(), 3);
    }

    #[test]
    fn test_conflicting_voice_is_reported() {
        let mut measure = Measure::new(1, Scale::new(20.0));
        let a = add_up_chord(&mut measure, 1, 1, 0.0, 100.0, 40.0, Pitch::new(0, 4));
        measure.add_slot(&[a]);
        let first = measure.create_voice(a);
        measure.create_voice(a);
        assert_eq!(measure.chord(a).voice(), Some(first));
        assert_eq!(measure.diagnostics().count(diagnostics::VOICE_CONFLICT), 1);
    }
}
