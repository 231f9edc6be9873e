//! Start time propagation
//!
//! A slot's time flows to its chords, and from the first chord of a beam
//! group to the following ones (through any interleaved rest).

use super::Measure;
use crate::diagnostics::{self, Entity};
use crate::models::{ChordId, GroupId, Rational, SlotId};

impl Measure {
    /// Set a chord start time, reporting a conflicting value
    pub(crate) fn set_chord_start_time(&mut self, chord: ChordId, time: Rational) -> bool {
        match self.chords[chord.index()].set_start_time(time) {
            Ok(changed) => changed,
            Err(err) => {
                self.error(Entity::Chord(chord), diagnostics::START_TIME_CONFLICT, err.to_string());
                false
            }
        }
    }

    /// Set a slot start time and broadcast it to its chords and their groups
    pub(crate) fn set_slot_start_time(&mut self, slot: SlotId, time: Rational) {
        if !self.slots[slot.index()].set_start_time(time)
            && self.slots[slot.index()].start_time() != Some(time)
        {
            self.error(
                Entity::Slot(slot),
                diagnostics::START_TIME_CONFLICT,
                format!("{} already starts elsewhere than {}", slot, time),
            );
        }
        let Some(time) = self.slots[slot.index()].start_time() else {
            return;
        };
        self.broadcast_slot_time(slot, time);
    }

    fn broadcast_slot_time(&mut self, slot: SlotId, time: Rational) {
        let chords = self.slots[slot.index()].chords.clone();
        let mut groups: Vec<GroupId> = Vec::new();
        for chord in chords {
            self.set_chord_start_time(chord, time);
            if let Some(group) = self.group_of(chord) {
                if !groups.contains(&group) {
                    groups.push(group);
                }
            }
        }
        for group in groups {
            self.compute_group_start_times(group);
        }
        self.refresh_voice_tables();
    }

    /// Chain start times along a beam group, from its first chord
    pub(crate) fn compute_group_start_times(&mut self, group: GroupId) {
        let chords = self.group_chords(group);
        let Some(first) = chords.first() else {
            return;
        };
        if self.chord(*first).start_time().is_none() {
            self.warning(
                Entity::Group(group),
                diagnostics::GROUP_TIME_UNSET,
                format!("First chord {} of {} has no start time", first, group),
            );
            return;
        }

        for pair in chords.windows(2) {
            let (prev, chord) = (pair[0], pair[1]);
            let Some(mut end) = self.chord(prev).end_time() else {
                return;
            };
            if let Some(rest) = self.lookup_interleaved_rest(prev, chord) {
                self.set_chord_start_time(rest, end);
                match self.chord(rest).end_time() {
                    Some(rest_end) => end = rest_end,
                    None => return,
                }
            }
            self.set_chord_start_time(chord, end);
        }
    }

    /// Add CONTINUE entries in every voice
    pub(crate) fn refresh_voice_tables(&mut self) {
        for voice in &mut self.voices {
            voice.update_slot_table(&self.slots, &self.chords);
        }
    }

    /// Push known times once more through slots and beam groups
    pub fn propagate_times(&mut self) {
        for index in 0..self.slots.len() {
            let slot = SlotId::from_index(index);
            if let Some(time) = self.slots[index].start_time() {
                self.broadcast_slot_time(slot, time);
            }
        }
        for index in 0..self.groups.len() {
            self.compute_group_start_times(GroupId::from_index(index));
        }
        self.refresh_voice_tables();
    }
}
